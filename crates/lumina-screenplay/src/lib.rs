//! Lumina — screenplay generation bounded context.
//!
//! Responsible for the project lifecycle, planning the outline in batches,
//! writing scene content with a rolling context, and supervising the
//! background runs that do both.

pub mod application;
pub mod domain;
