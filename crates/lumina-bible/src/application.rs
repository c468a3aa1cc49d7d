//! Application services for the questionnaire.

mod prompts;
pub mod resolver;
