// Text generation: cover letters, resume bullets, combined application package.
// All LLM calls go through llm_client; no direct Anthropic calls here.

pub mod handlers;
pub mod prompts;
pub mod writer;
