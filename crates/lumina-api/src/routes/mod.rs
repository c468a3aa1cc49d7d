//! Route modules, one per resource.

pub mod ai_logs;
pub mod generation;
pub mod health;
pub mod interaction;
pub mod projects;
pub mod scenes;

#[cfg(test)]
mod testing;
