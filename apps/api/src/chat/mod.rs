// Follow-up chat: transcript model and the chat endpoint.
// Prompts come from analysis::prompts; replies go through analysis::reply.

pub mod handlers;
pub mod transcript;
