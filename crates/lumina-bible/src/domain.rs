//! Domain types for the questionnaire.

pub mod interaction;
pub mod steps;
