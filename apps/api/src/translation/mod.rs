pub mod handlers;
pub mod jobs;
pub mod models;
pub mod prompt_builder;
pub mod prompts;
pub mod translator;
