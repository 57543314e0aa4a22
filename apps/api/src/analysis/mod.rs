// Resume analysis: prompt construction, the shared extract → prompt → AI →
// parse pipeline, and the single and bulk flows built on it.
// All AI calls go through ai_client; nothing here talks HTTP to the model.

pub mod bulk;
pub mod flow;
pub mod handlers;
pub mod mode;
pub mod models;
pub mod narrative;
pub mod parser;
pub mod prompts;
pub mod single;
