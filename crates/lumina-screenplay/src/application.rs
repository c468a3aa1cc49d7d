//! Application services for screenplay generation.

pub mod command_handlers;
pub mod content;
pub mod deps;
pub mod planner;
mod prompts;
pub mod query_handlers;
pub mod supervisor;

#[cfg(test)]
mod testing;
