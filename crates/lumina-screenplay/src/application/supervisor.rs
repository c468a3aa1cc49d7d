//! Supervision of background generation runs.
//!
//! Every planning or content run is a spawned task whose `JoinHandle` the
//! supervisor keeps. Runs for the same project hold that project's
//! execution token (a `tokio::sync::Mutex`) for their whole duration, so
//! they never interleave; runs for different projects proceed
//! concurrently, limited only by the gateway's admission gate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lumina_core::error::DomainError;
use lumina_core::model::ProcessingStatus;
use tokio::task::JoinHandle;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::application::content::{ContentGenerator, LoopOutcome};
use crate::application::deps::GenerationDeps;
use crate::application::planner::{OutlinePlanner, PlanOutcome};

const QUEUED: u8 = 0;
const RUNNING: u8 = 1;
const CANCELLED: u8 = 2;
const FINISHED: u8 = 3;

/// What a run does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunKind {
    /// Plan the outline, then write every scene.
    Generate {
        /// Style descriptor for the prompts.
        style: String,
        /// Units to plan.
        target: u32,
    },
    /// Write every pending scene.
    Content,
}

/// Result of handing work to the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// A new run was queued.
    Queued(Uuid),
    /// A run that will cover this work is already waiting; its ID is
    /// returned instead.
    Coalesced(Uuid),
}

impl Submission {
    /// ID of the run that will do the work.
    #[must_use]
    pub fn run_id(self) -> Uuid {
        match self {
            Self::Queued(id) | Self::Coalesced(id) => id,
        }
    }
}

#[derive(Debug)]
struct RunEntry {
    id: Uuid,
    state: Arc<AtomicU8>,
}

impl RunEntry {
    fn state(&self) -> u8 {
        self.state.load(Ordering::SeqCst)
    }

    fn is_live(&self) -> bool {
        matches!(self.state(), QUEUED | RUNNING)
    }
}

#[derive(Debug, Default)]
struct ProjectSlot {
    token: Arc<tokio::sync::Mutex<()>>,
    runs: Vec<RunEntry>,
    handles: Vec<JoinHandle<()>>,
}

impl ProjectSlot {
    fn prune(&mut self) {
        self.runs.retain(RunEntry::is_live);
        self.handles.retain(|h| !h.is_finished());
    }

    fn is_idle(&self) -> bool {
        self.runs.is_empty() && self.handles.is_empty()
    }
}

/// Spawns, serializes, and tracks generation runs.
#[derive(Debug)]
pub struct GenerationSupervisor {
    deps: GenerationDeps,
    batch_size: u32,
    slots: Mutex<HashMap<Uuid, ProjectSlot>>,
}

impl GenerationSupervisor {
    /// Creates a supervisor whose planner requests `batch_size` units per
    /// call.
    #[must_use]
    pub fn new(deps: GenerationDeps, batch_size: u32) -> Self {
        Self {
            deps,
            batch_size,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Queues a full run: plan `target` units, then write them.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_generation(&self, project_id: Uuid, style: String, target: u32) -> Submission {
        self.submit(project_id, RunKind::Generate { style, target })
    }

    /// Queues a content run, unless a run for the project is still waiting
    /// for its turn; that run will see the same pending scenes, so the
    /// request is coalesced into it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn resume_content(&self, project_id: Uuid) -> Submission {
        self.submit(project_id, RunKind::Content)
    }

    fn submit(&self, project_id: Uuid, kind: RunKind) -> Submission {
        let mut slots = self.slots();
        slots.retain(|_, slot| {
            slot.prune();
            !slot.is_idle()
        });
        let slot = slots.entry(project_id).or_default();

        if kind == RunKind::Content
            && let Some(waiting) = slot.runs.iter().find(|r| r.state() == QUEUED)
        {
            info!(%project_id, run_id = %waiting.id, "content run coalesced");
            return Submission::Coalesced(waiting.id);
        }

        let run_id = Uuid::now_v7();
        let state = Arc::new(AtomicU8::new(QUEUED));
        let span = info_span!("generation_run", %project_id, %run_id);
        let handle = tokio::spawn(
            execute(
                self.deps.clone(),
                self.batch_size,
                project_id,
                kind,
                Arc::clone(&slot.token),
                Arc::clone(&state),
            )
            .instrument(span),
        );
        slot.runs.push(RunEntry { id: run_id, state });
        slot.handles.push(handle);
        info!(%project_id, %run_id, "generation run queued");
        Submission::Queued(run_id)
    }

    /// Marks every run of the project that has not started yet as
    /// cancelled. A running run is stopped only through the project
    /// status. Returns how many runs were cancelled.
    pub fn cancel_queued(&self, project_id: Uuid) -> usize {
        let slots = self.slots();
        let Some(slot) = slots.get(&project_id) else {
            return 0;
        };
        let cancelled = slot
            .runs
            .iter()
            .filter(|r| {
                r.state
                    .compare_exchange(QUEUED, CANCELLED, Ordering::SeqCst, Ordering::SeqCst)
                    .is_ok()
            })
            .count();
        if cancelled > 0 {
            info!(%project_id, cancelled, "queued runs cancelled");
        }
        cancelled
    }

    /// Returns `true` while a run for the project is queued or running.
    #[must_use]
    pub fn is_active(&self, project_id: Uuid) -> bool {
        self.slots()
            .get(&project_id)
            .is_some_and(|slot| slot.runs.iter().any(RunEntry::is_live))
    }

    /// Waits until every run submitted for the project so far, and any
    /// submitted while waiting, has finished.
    pub async fn wait_idle(&self, project_id: Uuid) {
        loop {
            let handles = match self.slots().get_mut(&project_id) {
                Some(slot) => std::mem::take(&mut slot.handles),
                None => Vec::new(),
            };
            if handles.is_empty() {
                return;
            }
            join_all(handles).await;
        }
    }

    /// Cancels every queued run and waits for running ones to finish.
    pub async fn shutdown(&self) {
        let project_ids: Vec<Uuid> = self.slots().keys().copied().collect();
        for project_id in &project_ids {
            self.cancel_queued(*project_id);
        }
        info!(projects = project_ids.len(), "draining generation runs");
        for project_id in project_ids {
            self.wait_idle(project_id).await;
        }
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<Uuid, ProjectSlot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn join_all(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        if let Err(e) = handle.await {
            error!(error = %e, "generation task panicked");
        }
    }
}

async fn execute(
    deps: GenerationDeps,
    batch_size: u32,
    project_id: Uuid,
    kind: RunKind,
    token: Arc<tokio::sync::Mutex<()>>,
    state: Arc<AtomicU8>,
) {
    let _turn = token.lock().await;
    if state
        .compare_exchange(QUEUED, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        info!("run cancelled before it started");
        return;
    }

    let result = match kind {
        RunKind::Generate { style, target } => {
            generate(&deps, batch_size, project_id, &style, target).await
        }
        RunKind::Content => ContentGenerator::new(deps.clone())
            .run(project_id)
            .await
            .map(|outcome| log_content_outcome(&outcome)),
    };

    if let Err(e) = result {
        settle_failed_run(&deps, project_id, &e).await;
    }
    state.store(FINISHED, Ordering::SeqCst);
}

/// A project deleted under a running run makes its next write fail; that
/// run is treated as cancelled. Any other store error fails the project.
async fn settle_failed_run(deps: &GenerationDeps, project_id: Uuid, cause: &DomainError) {
    if let Ok(None) = deps.projects.status(project_id).await {
        info!(error = %cause, "project deleted during the run, stopping");
        return;
    }

    error!(error = %cause, "generation run failed");
    if let Err(e) = deps
        .projects
        .set_status(project_id, ProcessingStatus::Failed)
        .await
    {
        error!(error = %e, "could not mark project failed");
    }
}

async fn generate(
    deps: &GenerationDeps,
    batch_size: u32,
    project_id: Uuid,
    style: &str,
    target: u32,
) -> Result<(), DomainError> {
    let planner = OutlinePlanner::new(deps.clone(), batch_size);
    match planner.plan(project_id, style, target).await? {
        PlanOutcome::Completed { scenes } => {
            info!(scenes, "outline planned, writing scenes");
            let outcome = ContentGenerator::new(deps.clone()).run(project_id).await?;
            log_content_outcome(&outcome);
        }
        PlanOutcome::Cancelled { persisted } => {
            warn!(persisted, "outline planning stopped");
        }
    }
    Ok(())
}

fn log_content_outcome(outcome: &LoopOutcome) {
    match outcome {
        LoopOutcome::Completed {
            generated,
            failed,
            skipped,
        } => info!(generated, failed, skipped, "content run completed"),
        LoopOutcome::Cancelled { processed } => warn!(processed, "content run stopped"),
    }
}
