//! Test repositories — in-memory and failing implementations of the
//! repository traits.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lumina_core::bible::StoryBible;
use lumina_core::error::DomainError;
use lumina_core::model::{
    AiLogEntry, CachedInteraction, ProcessingStatus, Project, ProjectType, Scene,
};
use lumina_core::repository::{
    AiLogRepository, ProjectDetails, ProjectRepository, SceneRepository,
};
use tokio::sync::Semaphore;
use uuid::Uuid;

/// A store that keeps projects, scenes, and AI logs in memory and
/// implements every repository trait. Writes are visible to the next read.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    projects: Mutex<HashMap<Uuid, Project>>,
    scenes: Mutex<Vec<Scene>>,
    ai_logs: Mutex<Vec<AiLogEntry>>,
    purge_gate: Option<Arc<Semaphore>>,
    purges: AtomicUsize,
    status_writes: AtomicUsize,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes each scene purge wait for a permit on `gate`, which the test
    /// releases.
    #[must_use]
    pub fn with_purge_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.purge_gate = Some(gate);
        self
    }

    /// Number of scene purges started, including ones still waiting on the
    /// purge gate.
    #[must_use]
    pub fn purges(&self) -> usize {
        self.purges.load(Ordering::SeqCst)
    }

    /// Inserts or replaces a project without going through the trait.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn seed_project(&self, project: Project) {
        self.projects.lock().unwrap().insert(project.id, project);
    }

    /// Inserts scenes without going through the trait.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn seed_scenes(&self, scenes: impl IntoIterator<Item = Scene>) {
        self.scenes.lock().unwrap().extend(scenes);
    }

    /// Returns a copy of a project.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn project(&self, project_id: Uuid) -> Option<Project> {
        self.projects.lock().unwrap().get(&project_id).cloned()
    }

    /// Returns a project's scenes ordered by index.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn scenes_of(&self, project_id: Uuid) -> Vec<Scene> {
        let mut scenes: Vec<Scene> = self
            .scenes
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.project_id == project_id)
            .cloned()
            .collect();
        scenes.sort_by_key(|s| s.scene_index);
        scenes
    }

    /// Returns every AI log entry in insertion order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn ai_logs(&self) -> Vec<AiLogEntry> {
        self.ai_logs.lock().unwrap().clone()
    }

    /// Synchronously overwrites a project's status, for tests that simulate
    /// an external cancellation from inside a transport callback.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn force_status(&self, project_id: Uuid, status: ProcessingStatus) {
        if let Some(project) = self.projects.lock().unwrap().get_mut(&project_id) {
            project.status = status;
        }
    }

    /// Number of project status writes made through the trait.
    #[must_use]
    pub fn status_writes(&self) -> usize {
        self.status_writes.load(Ordering::SeqCst)
    }

    /// Synchronously removes a project row, leaving its scenes, for tests
    /// that simulate a delete landing under a running loop.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn remove_project(&self, project_id: Uuid) {
        self.projects.lock().unwrap().remove(&project_id);
    }

    /// Synchronously removes every scene of a project, for tests that
    /// simulate rows vanishing under a running loop.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn remove_scenes(&self, project_id: Uuid) {
        self.scenes
            .lock()
            .unwrap()
            .retain(|s| s.project_id != project_id);
    }

    fn with_project<T>(&self, project_id: Uuid, f: impl FnOnce(&mut Project) -> T) -> Option<T> {
        self.projects.lock().unwrap().get_mut(&project_id).map(f)
    }

    fn with_scene(&self, scene_id: Uuid, f: impl FnOnce(&mut Scene)) -> Result<(), DomainError> {
        let mut scenes = self.scenes.lock().unwrap();
        let scene = scenes
            .iter_mut()
            .find(|s| s.id == scene_id)
            .ok_or_else(|| DomainError::Infrastructure(format!("no scene row {scene_id}")))?;
        f(scene);
        Ok(())
    }
}

#[async_trait]
impl ProjectRepository for InMemoryStore {
    async fn insert(&self, project: &Project) -> Result<(), DomainError> {
        self.projects
            .lock()
            .unwrap()
            .insert(project.id, project.clone());
        Ok(())
    }

    async fn find(&self, project_id: Uuid) -> Result<Option<Project>, DomainError> {
        Ok(self.project(project_id))
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Project>, DomainError> {
        let mut projects: Vec<Project> = self
            .projects
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(projects)
    }

    async fn update_details(
        &self,
        project_id: Uuid,
        details: &ProjectDetails,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        Ok(self
            .with_project(project_id, |p| {
                p.title.clone_from(&details.title);
                p.logline.clone_from(&details.logline);
                p.next_interaction = None;
                p.updated_at = now;
            })
            .is_some())
    }

    async fn save_context(
        &self,
        project_id: Uuid,
        project_type: ProjectType,
        answers: &StoryBible,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        Ok(self
            .with_project(project_id, |p| {
                p.project_type = project_type;
                p.answers = answers.clone();
                p.next_interaction = None;
                p.updated_at = now;
            })
            .is_some())
    }

    async fn cache_interaction(
        &self,
        project_id: Uuid,
        cached: &CachedInteraction,
    ) -> Result<(), DomainError> {
        self.with_project(project_id, |p| p.next_interaction = Some(cached.clone()));
        Ok(())
    }

    async fn set_style(&self, project_id: Uuid, style: &str) -> Result<(), DomainError> {
        self.with_project(project_id, |p| p.genre = Some(style.to_owned()));
        Ok(())
    }

    async fn status(&self, project_id: Uuid) -> Result<Option<ProcessingStatus>, DomainError> {
        Ok(self.with_project(project_id, |p| p.status))
    }

    async fn set_status(
        &self,
        project_id: Uuid,
        status: ProcessingStatus,
    ) -> Result<(), DomainError> {
        self.status_writes.fetch_add(1, Ordering::SeqCst);
        self.force_status(project_id, status);
        Ok(())
    }

    async fn add_tokens(&self, project_id: Uuid, tokens: i64) -> Result<(), DomainError> {
        self.with_project(project_id, |p| p.total_tokens += tokens);
        Ok(())
    }

    async fn delete(&self, project_id: Uuid) -> Result<bool, DomainError> {
        let removed = self.projects.lock().unwrap().remove(&project_id).is_some();
        self.scenes
            .lock()
            .unwrap()
            .retain(|s| s.project_id != project_id);
        Ok(removed)
    }
}

#[async_trait]
impl SceneRepository for InMemoryStore {
    async fn insert_many(&self, scenes: &[Scene]) -> Result<(), DomainError> {
        let mut stored = self.scenes.lock().unwrap();
        for scene in scenes {
            let taken = stored
                .iter()
                .any(|s| s.project_id == scene.project_id && s.scene_index == scene.scene_index);
            if taken {
                return Err(DomainError::Infrastructure(format!(
                    "duplicate scene index {} in project {}",
                    scene.scene_index, scene.project_id
                )));
            }
        }
        stored.extend(scenes.iter().cloned());
        Ok(())
    }

    async fn list(&self, project_id: Uuid) -> Result<Vec<Scene>, DomainError> {
        Ok(self.scenes_of(project_id))
    }

    async fn find(
        &self,
        project_id: Uuid,
        scene_index: i32,
    ) -> Result<Option<Scene>, DomainError> {
        Ok(self
            .scenes
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.project_id == project_id && s.scene_index == scene_index)
            .cloned())
    }

    async fn delete_for_project(&self, project_id: Uuid) -> Result<u64, DomainError> {
        self.purges.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.purge_gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|e| DomainError::Infrastructure(e.to_string()))?;
            permit.forget();
        }
        let mut scenes = self.scenes.lock().unwrap();
        let before = scenes.len();
        scenes.retain(|s| s.project_id != project_id);
        Ok((before - scenes.len()) as u64)
    }

    async fn set_status(
        &self,
        scene_id: Uuid,
        status: ProcessingStatus,
    ) -> Result<(), DomainError> {
        self.with_scene(scene_id, |s| s.status = status)
    }

    async fn complete(
        &self,
        scene_id: Uuid,
        content: &str,
        summary: Option<&str>,
    ) -> Result<(), DomainError> {
        self.with_scene(scene_id, |s| {
            s.content = Some(content.to_owned());
            s.summary = summary.map(str::to_owned);
            s.status = ProcessingStatus::Completed;
        })
    }

    async fn reset(&self, scene_id: Uuid) -> Result<(), DomainError> {
        self.with_scene(scene_id, |s| {
            s.content = None;
            s.summary = None;
            s.status = ProcessingStatus::Pending;
        })
    }
}

#[async_trait]
impl AiLogRepository for InMemoryStore {
    async fn append(&self, entry: &AiLogEntry) -> Result<(), DomainError> {
        self.ai_logs.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn list_for_project(
        &self,
        project_id: Uuid,
        limit: i64,
    ) -> Result<Vec<AiLogEntry>, DomainError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .ai_logs
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|e| e.project_id == project_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

/// A store whose every operation fails with an infrastructure error.
/// Useful for testing error-handling paths.
#[derive(Debug, Default)]
pub struct FailingStore;

fn refused<T>() -> Result<T, DomainError> {
    Err(DomainError::Infrastructure("connection refused".into()))
}

#[async_trait]
impl ProjectRepository for FailingStore {
    async fn insert(&self, _project: &Project) -> Result<(), DomainError> {
        refused()
    }

    async fn find(&self, _project_id: Uuid) -> Result<Option<Project>, DomainError> {
        refused()
    }

    async fn list_by_owner(&self, _owner_id: Uuid) -> Result<Vec<Project>, DomainError> {
        refused()
    }

    async fn update_details(
        &self,
        _project_id: Uuid,
        _details: &ProjectDetails,
        _now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        refused()
    }

    async fn save_context(
        &self,
        _project_id: Uuid,
        _project_type: ProjectType,
        _answers: &StoryBible,
        _now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        refused()
    }

    async fn cache_interaction(
        &self,
        _project_id: Uuid,
        _cached: &CachedInteraction,
    ) -> Result<(), DomainError> {
        refused()
    }

    async fn set_style(&self, _project_id: Uuid, _style: &str) -> Result<(), DomainError> {
        refused()
    }

    async fn status(&self, _project_id: Uuid) -> Result<Option<ProcessingStatus>, DomainError> {
        refused()
    }

    async fn set_status(
        &self,
        _project_id: Uuid,
        _status: ProcessingStatus,
    ) -> Result<(), DomainError> {
        refused()
    }

    async fn add_tokens(&self, _project_id: Uuid, _tokens: i64) -> Result<(), DomainError> {
        refused()
    }

    async fn delete(&self, _project_id: Uuid) -> Result<bool, DomainError> {
        refused()
    }
}

#[async_trait]
impl SceneRepository for FailingStore {
    async fn insert_many(&self, _scenes: &[Scene]) -> Result<(), DomainError> {
        refused()
    }

    async fn list(&self, _project_id: Uuid) -> Result<Vec<Scene>, DomainError> {
        refused()
    }

    async fn find(
        &self,
        _project_id: Uuid,
        _scene_index: i32,
    ) -> Result<Option<Scene>, DomainError> {
        refused()
    }

    async fn delete_for_project(&self, _project_id: Uuid) -> Result<u64, DomainError> {
        refused()
    }

    async fn set_status(
        &self,
        _scene_id: Uuid,
        _status: ProcessingStatus,
    ) -> Result<(), DomainError> {
        refused()
    }

    async fn complete(
        &self,
        _scene_id: Uuid,
        _content: &str,
        _summary: Option<&str>,
    ) -> Result<(), DomainError> {
        refused()
    }

    async fn reset(&self, _scene_id: Uuid) -> Result<(), DomainError> {
        refused()
    }
}

#[async_trait]
impl AiLogRepository for FailingStore {
    async fn append(&self, _entry: &AiLogEntry) -> Result<(), DomainError> {
        refused()
    }

    async fn list_for_project(
        &self,
        _project_id: Uuid,
        _limit: i64,
    ) -> Result<Vec<AiLogEntry>, DomainError> {
        refused()
    }
}
