pub mod handlers;
pub mod models;
pub mod moderator;
pub mod prompt_builder;
pub mod prompts;
