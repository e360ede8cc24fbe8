// All LLM prompt constants for the text generation module.
// Reuses cross-cutting fragments from llm_client::prompts via `system_prompt`.

/// Cover letter system prompt. Replace `{guidelines}`.
pub const COVER_LETTER_SYSTEM_TEMPLATE: &str = "You are an expert career coach and \
professional cover letter writer. Your task is to create compelling, personalized cover \
letters that are:

{guidelines}

Format the cover letter professionally with proper salutations and closings.";

/// Cover letter prompt. Replace `{header}`, `{job_description}`, `{resume}`.
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"Please write a professional cover letter for the following position:

{header}

JOB DESCRIPTION:
{job_description}

CANDIDATE'S RESUME:
{resume}

Write a compelling cover letter that connects my experience to this specific role. Make it personal, engaging, and tailored to this opportunity."#;

/// Resume bullet system prompt. Replace `{guidelines}`, `{json_only}`.
pub const BULLETS_SYSTEM_TEMPLATE: &str = r#"You are an expert career coach and resume writer specializing in creating impactful resume bullet points. Your task is to analyze a job description and a candidate's resume, then generate powerful, tailored bullet points that:

{guidelines}

For each bullet point, also provide:
- A category (e.g., "Technical Skills", "Leadership", "Problem Solving", "Communication", "Project Management")
- A brief explanation of why this bullet is relevant to the job

{json_only}

Response format:
{
  "bullets": [
    {
      "bullet": "The bullet point text starting with an action verb",
      "category": "Category name",
      "relevance": "Brief explanation of why this is relevant to the job"
    }
  ]
}"#;

/// Resume bullet prompt. Replace `{header}`, `{job_description}`, `{resume}`.
pub const BULLETS_PROMPT_TEMPLATE: &str = r#"Analyze the following job description and resume, then generate 8-12 tailored resume bullet points that would be highly effective for this specific role.

{header}

JOB DESCRIPTION:
{job_description}

CANDIDATE'S RESUME:
{resume}

Generate bullet points that bridge the gap between the candidate's experience and the job requirements. Focus on achievements and skills that directly address what this employer is looking for.

Respond with valid JSON only."#;

/// Combined cover letter + bullets system prompt.
/// Replace `{json_only}`, `{cover_letter_guidelines}`, `{bullet_guidelines}`.
pub const SMART_APPLY_SYSTEM_TEMPLATE: &str = r#"You are an expert career coach, professional cover letter writer, and resume specialist. Your task is to analyze a job description and candidate's resume, then generate BOTH a tailored cover letter AND impactful resume bullet points.

{json_only}

Use this exact format:
{
  "coverLetter": "The full cover letter text...",
  "bullets": [
    {
      "bullet": "A resume bullet point starting with an action verb",
      "category": "Category name (e.g., Technical Skills, Leadership, Problem Solving)",
      "relevance": "Brief explanation of why this bullet is relevant"
    }
  ]
}

COVER LETTER GUIDELINES:
{cover_letter_guidelines}

RESUME BULLETS GUIDELINES (generate 8-12 bullet points):
{bullet_guidelines}"#;

/// Combined prompt. Replace `{company}`, `{job_title}`, `{job_description}`, `{resume}`.
pub const SMART_APPLY_PROMPT_TEMPLATE: &str = r#"Generate a tailored cover letter AND resume bullet points for this job application:

Company: {company}
Position: {job_title}

JOB DESCRIPTION:
{job_description}

CANDIDATE'S RESUME:
{resume}

Generate both materials that work together to present a compelling application. The cover letter should tell a story while the resume bullets provide concrete evidence of qualifications.

Respond with valid JSON only."#;
