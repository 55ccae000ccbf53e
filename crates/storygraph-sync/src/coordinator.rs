//! Bulk synchronization jobs.
//!
//! Graph-to-script pushes every node's dialogue into its script file on
//! a blocking worker task; script-to-graph walks the scripts directory
//! and produces a rebuild plan the caller applies after confirmation.
//! One job runs at a time; cancellation is cooperative through a shared
//! flag checked before each item.

use crate::error::EditorError;
use crate::state::{validate_transition, SyncState};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use storygraph_core::GraphModel;
use storygraph_script::parse::ParsedNode;
use storygraph_script::{parse_file, update_say_statement, PLACEHOLDER_TEXT};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// One node's worth of work for a graph-to-script job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncItem {
    /// Scene identifier inside the script.
    pub scene_id: String,
    /// Absolute path of the script file.
    pub script_path: PathBuf,
    /// Speaker to write.
    pub speaker: String,
    /// Dialogue text to write.
    pub text: String,
}

/// Progress notification sent after each processed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncProgress {
    /// Items processed so far.
    pub completed: usize,
    /// Total items in the job.
    pub total: usize,
}

/// Outcome of a finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Items written successfully.
    pub synced: usize,
    /// Nodes skipped during collection (no script, placeholder text).
    pub skipped: usize,
    /// Per-item failures, `"<scene_id>: <message>"`.
    pub errors: Vec<String>,
    /// Terminal state the job ended in.
    pub state: SyncState,
}

/// Runs at most one bulk job at a time.
#[derive(Debug, Clone, Default)]
pub struct SyncCoordinator {
    state: Arc<Mutex<SyncState>>,
    cancel: Arc<AtomicBool>,
}

impl SyncCoordinator {
    /// Create an idle coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current job state.
    #[must_use]
    pub fn state(&self) -> SyncState {
        *self.state.lock()
    }

    /// Request cancellation of the running job. Idempotent; a no-op
    /// when nothing is running.
    pub fn cancel(&self) {
        if self.state() == SyncState::Running {
            info!("sync cancellation requested");
            self.cancel.store(true, Ordering::SeqCst);
        }
    }

    /// Collect sync items from the model.
    ///
    /// Nodes without a script path, and nodes whose text is empty or
    /// still the placeholder, are skipped and counted. `resolve` maps
    /// the stored (possibly relative) script path to an absolute one.
    #[must_use]
    pub fn collect_items(
        model: &GraphModel,
        resolve: impl Fn(&str) -> PathBuf,
    ) -> (Vec<SyncItem>, usize) {
        let mut items = Vec::new();
        let mut skipped = 0;

        let mut nodes: Vec<_> = model.nodes().map(|(_, data)| data).collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        for data in nodes {
            if data.script_path.is_empty() {
                skipped += 1;
                continue;
            }
            if data.dialogue_text.is_empty() || data.dialogue_text.trim() == PLACEHOLDER_TEXT {
                skipped += 1;
                continue;
            }
            items.push(SyncItem {
                scene_id: data.scene_id().to_string(),
                script_path: resolve(&data.script_path),
                speaker: data.speaker.clone(),
                text: data.dialogue_text.clone(),
            });
        }

        (items, skipped)
    }

    /// Start a graph-to-script job.
    ///
    /// The worker runs on a blocking task, checks the cancel flag
    /// before each item, reports progress after each item, and never
    /// aborts on a per-item failure. The job ends `Completed`,
    /// `Cancelled`, or `Failed` when every single item failed.
    ///
    /// # Errors
    ///
    /// [`EditorError::SyncBusy`] when a job is already running.
    pub fn start_graph_to_script(
        &self,
        items: Vec<SyncItem>,
        skipped: usize,
        progress: UnboundedSender<SyncProgress>,
    ) -> Result<JoinHandle<SyncReport>, EditorError> {
        {
            let mut state = self.state.lock();
            if *state == SyncState::Running {
                return Err(EditorError::SyncBusy);
            }
            if state.is_terminal() {
                validate_transition(*state, SyncState::Idle)?;
                *state = SyncState::Idle;
            }
            validate_transition(*state, SyncState::Running)?;
            *state = SyncState::Running;
        }
        self.cancel.store(false, Ordering::SeqCst);

        let state = Arc::clone(&self.state);
        let cancel = Arc::clone(&self.cancel);
        let total = items.len();
        info!(total, skipped, "graph-to-script sync started");

        Ok(tokio::task::spawn_blocking(move || {
            let mut synced = 0usize;
            let mut errors = Vec::new();
            let mut cancelled = false;

            for (i, item) in items.iter().enumerate() {
                if cancel.load(Ordering::SeqCst) {
                    errors.push("operation cancelled by user".to_string());
                    cancelled = true;
                    break;
                }

                match update_say_statement(
                    &item.script_path,
                    &item.scene_id,
                    &item.speaker,
                    &item.text,
                ) {
                    Ok(()) => synced += 1,
                    Err(e) => {
                        warn!(scene = %item.scene_id, error = %e, "sync item failed");
                        errors.push(format!("{}: {e}", item.scene_id));
                    }
                }

                let _ = progress.send(SyncProgress {
                    completed: i + 1,
                    total,
                });
            }

            let final_state = if cancelled {
                SyncState::Cancelled
            } else if synced == 0 && total > 0 {
                SyncState::Failed
            } else {
                SyncState::Completed
            };
            *state.lock() = final_state;
            info!(synced, errors = errors.len(), state = %final_state, "sync finished");

            SyncReport {
                synced,
                skipped,
                errors,
                state: final_state,
            }
        }))
    }

    /// Acknowledge a finished job, returning the coordinator to idle.
    ///
    /// # Errors
    ///
    /// [`EditorError::InvalidTransition`] while a job is running.
    pub fn reset(&self) -> Result<(), EditorError> {
        let mut state = self.state.lock();
        validate_transition(*state, SyncState::Idle)?;
        *state = SyncState::Idle;
        Ok(())
    }
}

/// One scene of a rebuild plan, tied back to the file it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedScene {
    /// The parsed scene.
    pub node: ParsedNode,
    /// Path of the script file that declared it.
    pub script_path: String,
}

/// A graph rebuild distilled from the project's script files.
///
/// Applying it is destructive (the model is cleared first), so the
/// plan is handed back for confirmation instead of being applied
/// directly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RebuildPlan {
    /// Scenes found, in file-then-declaration order.
    pub nodes: Vec<PlannedScene>,
    /// Distinct `(from, to)` connections.
    pub edges: Vec<(String, String)>,
    /// Entry point from the first file that declares one.
    pub entry: Option<String>,
    /// Collected problems, prefixed with the originating file.
    pub issues: Vec<String>,
}

/// Walk `scripts_dir` recursively and parse every `.nms` file into a
/// rebuild plan. Files are visited in sorted order so plans are
/// deterministic; per-file problems are collected, never fatal.
#[must_use]
pub fn plan_rebuild(scripts_dir: &Path) -> RebuildPlan {
    let mut plan = RebuildPlan::default();
    let mut seen_ids = std::collections::HashSet::new();

    let mut paths: Vec<PathBuf> = walkdir::WalkDir::new(scripts_dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "nms"))
        .map(|e| e.path().to_path_buf())
        .collect();
    paths.sort();

    for path in paths {
        let display = path
            .strip_prefix(scripts_dir)
            .unwrap_or(&path)
            .display()
            .to_string();

        let outcome = match parse_file(&path) {
            Ok(outcome) => outcome,
            Err(e) => {
                plan.issues.push(format!("{display}: {e}"));
                continue;
            }
        };

        for issue in &outcome.issues {
            plan.issues.push(format!("{display}: {issue}"));
        }

        for node in outcome.nodes {
            if !seen_ids.insert(node.id.clone()) {
                plan.issues
                    .push(format!("{display}: duplicate scene id across files: {}", node.id));
                continue;
            }
            plan.nodes.push(PlannedScene {
                node,
                script_path: path.display().to_string(),
            });
        }

        for edge in outcome.edges {
            if !plan.edges.contains(&edge) {
                plan.edges.push(edge);
            }
        }

        if plan.entry.is_none() {
            plan.entry = outcome.entry_point;
        }
    }

    info!(
        nodes = plan.nodes.len(),
        edges = plan.edges.len(),
        issues = plan.issues.len(),
        "rebuild plan ready"
    );
    plan
}
