//! Domain types for screenplay generation.

pub mod commands;
pub mod target;
