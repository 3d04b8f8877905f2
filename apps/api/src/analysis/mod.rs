// Career analysis: prompt construction, sectioning of model output, reply
// post-processing for chat, and the downloadable report.
// All inference goes through llm_client; nothing here talks to an endpoint directly.

pub mod handlers;
pub mod prompts;
pub mod reply;
pub mod report;
pub mod sections;
