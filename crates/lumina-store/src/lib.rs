//! Lumina Store — `PostgreSQL` implementations of the repository traits.

pub mod pg_ai_log_repository;
pub mod pg_project_repository;
pub mod pg_scene_repository;
mod rows;
pub mod schema;

pub use pg_ai_log_repository::PgAiLogRepository;
pub use pg_project_repository::PgProjectRepository;
pub use pg_scene_repository::PgSceneRepository;
pub use schema::run_migrations;
