//! Lumina — story-bible questionnaire bounded context.
//!
//! Responsible for the ordered step catalog, deciding which question to ask
//! next, synthesizing context-aware options through the LLM gateway, and
//! recording answers.

pub mod application;
pub mod domain;
