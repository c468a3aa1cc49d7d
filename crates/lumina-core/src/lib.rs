//! Lumina Core — shared domain model and abstractions.
//!
//! This crate defines the records, status machines, and repository traits
//! that the questionnaire and screenplay contexts depend on. It contains no
//! infrastructure code.

pub mod bible;
pub mod clock;
pub mod error;
pub mod model;
pub mod repository;
pub mod usage;
