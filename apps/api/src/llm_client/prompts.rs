// Shared prompt fragments.
// Each feature that needs LLM calls defines its own prompts.rs alongside it.

/// Appended to system prompts whose answer is parsed as JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "You MUST respond with valid JSON only. \
    Do not include any text before or after the JSON. \
    Do not use markdown code fences.";

/// Guidelines shared by every resume bullet prompt.
pub const BULLET_GUIDELINES: &str = "\
- Use the STAR method (Situation, Task, Action, Result) implicitly
- Start with strong action verbs
- Include quantifiable achievements and metrics whenever possible
- Are directly relevant to the target job requirements
- Highlight transferable skills that match the job description
- Are concise but impactful (1-2 lines each)
- Avoid generic phrases and buzzwords without substance";

/// Guidelines shared by every cover letter prompt.
pub const COVER_LETTER_GUIDELINES: &str = "\
- Tailored specifically to the job description provided
- Highlight relevant experience and skills from the candidate's resume
- Show genuine enthusiasm for the role and company
- Use professional but engaging language
- Concise (approximately 300-400 words)
- Clear structure: opening hook, body paragraphs connecting experience to requirements, and a strong closing
- Avoid generic phrases and clichés
- Do not include placeholders like [Your Name] - write as if the letter is ready to send";
