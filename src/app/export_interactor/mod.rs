// Export interactor - Runs a batch of lossless cuts on a background task
//
// Items are processed strictly in snapshot order. A failing item is logged
// and skipped; only cancellation ends a run early, and it is only observed
// between items.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{info, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::Clip;
use crate::output::{output_path, MetadataHistory, DEFAULT_COMMENT, DEFAULT_CROP_SUFFIX};
use crate::planner::{TrimPlan, TrimPlanner};
use crate::ports::{CutJob, CutPort, ProbePort};
use crate::utils::time::format_timecode;

/// Lifecycle of a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

/// Severity of a pipeline log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
}

/// Notification sent to the caller while a run progresses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ExportEvent {
    /// Item `index` of `total` is about to be processed
    Progress {
        index: usize,
        total: usize,
        filename: String,
    },
    Log { level: LogLevel, message: String },
    /// Always the last event of a run
    Finished(ExportSummary),
}

/// Outcome of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub state: PipelineState,
    pub total: usize,
    pub exported: usize,
    pub skipped: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ExportSummary {
    /// Items never attempted because of cancellation
    pub fn not_attempted(&self) -> usize {
        self.total - self.exported - self.skipped
    }
}

/// Shared cooperative cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that no further item is started
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Export behaviour taken from settings
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub crop_suffix: String,
    pub comment: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            crop_suffix: DEFAULT_CROP_SUFFIX.to_string(),
            comment: DEFAULT_COMMENT.to_string(),
        }
    }
}

/// Caller side of a started run
pub struct ExportHandle {
    /// Progress, log and finished notifications in processing order
    pub events: UnboundedReceiver<ExportEvent>,
    cancellation: CancellationFlag,
    task: JoinHandle<ExportSummary>,
}

impl ExportHandle {
    /// Stop after the item currently being processed
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Flag shared with the worker, e.g. for a signal handler
    pub fn cancellation(&self) -> CancellationFlag {
        self.cancellation.clone()
    }

    /// Handle that stops the worker immediately, killing a running cut
    pub fn abort_handle(&self) -> AbortHandle {
        self.task.abort_handle()
    }

    /// Wait for the worker to finish
    pub async fn wait(self) -> Result<ExportSummary, DomainError> {
        self.task
            .await
            .map_err(|e| DomainError::WorkerFailed(e.to_string()))
    }
}

/// Sequential, cancellable batch exporter
#[derive(Clone)]
pub struct ExportPipeline {
    probe_port: Arc<dyn ProbePort>,
    cut_port: Arc<dyn CutPort>,
    options: ExportOptions,
    state: Arc<Mutex<PipelineState>>,
}

impl ExportPipeline {
    /// Create new pipeline with injected ports
    pub fn new(probe_port: Arc<dyn ProbePort>, cut_port: Arc<dyn CutPort>, options: ExportOptions) -> Self {
        Self {
            probe_port,
            cut_port,
            options,
            state: Arc::new(Mutex::new(PipelineState::Idle)),
        }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    pub fn state(&self) -> PipelineState {
        *lock(&self.state)
    }

    /// Start exporting `snapshot` into `destination` on a background task
    pub fn start(&self, snapshot: Vec<Clip>, destination: impl Into<PathBuf>) -> Result<ExportHandle, DomainError> {
        self.start_with(snapshot, destination, CancellationFlag::new())
    }

    /// Like `start`, with a caller supplied cancellation flag
    ///
    /// Fails with `ExportInProgress` while a previous run is still going.
    pub fn start_with(
        &self,
        snapshot: Vec<Clip>,
        destination: impl Into<PathBuf>,
        cancellation: CancellationFlag,
    ) -> Result<ExportHandle, DomainError> {
        {
            let mut state = lock(&self.state);
            if *state == PipelineState::Running {
                return Err(DomainError::ExportInProgress);
            }
            *state = PipelineState::Running;
        }

        let (sender, events) = mpsc::unbounded_channel();
        let pipeline = self.clone();
        let destination = destination.into();
        let flag = cancellation.clone();
        let task = tokio::spawn(async move {
            let mut guard = RunGuard::new(Arc::clone(&pipeline.state));
            let summary = pipeline.run(snapshot, &destination, &flag, &sender).await;
            guard.finished = true;
            summary
        });

        Ok(ExportHandle {
            events,
            cancellation,
            task,
        })
    }

    async fn run(
        &self,
        snapshot: Vec<Clip>,
        destination: &Path,
        cancellation: &CancellationFlag,
        events: &UnboundedSender<ExportEvent>,
    ) -> ExportSummary {
        let started_at = Utc::now();
        let total = snapshot.len();
        let mut exported = 0;
        let mut skipped = 0;
        let mut state = PipelineState::Completed;

        info!(total, destination = %destination.display(), "Export started");

        for (index, clip) in snapshot.iter().enumerate() {
            if cancellation.is_cancelled() {
                state = PipelineState::Cancelled;
                break;
            }

            let _ = events.send(ExportEvent::Progress {
                index,
                total,
                filename: clip.filename.clone(),
            });

            let target = output_path(&clip.path, destination, &self.options.crop_suffix);
            match self.export_one(clip, &target).await {
                Ok(plan) => {
                    exported += 1;
                    let name = target
                        .file_name()
                        .map(|name| name.to_string_lossy().to_string())
                        .unwrap_or_else(|| target.display().to_string());
                    info!(
                        index,
                        file = %clip.filename,
                        "Cut {} - {}",
                        format_timecode(plan.actual_start, clip.fps),
                        format_timecode(plan.actual_end, clip.fps)
                    );
                    emit(events, LogLevel::Info, format!("Saved: {}", name));
                }
                Err(e) => {
                    skipped += 1;
                    emit(events, LogLevel::Warn, skip_message(&clip.filename, &e));
                }
            }
        }

        let summary = ExportSummary {
            state,
            total,
            exported,
            skipped,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            exported,
            skipped,
            not_attempted = summary.not_attempted(),
            "Export {}",
            if state == PipelineState::Cancelled { "cancelled" } else { "completed" }
        );

        *lock(&self.state) = state;
        let _ = events.send(ExportEvent::Finished(summary.clone()));
        summary
    }

    /// Probe, plan and cut a single item
    async fn export_one(&self, clip: &Clip, target: &Path) -> Result<TrimPlan, DomainError> {
        let media = self.probe_port.probe(&clip.path).await;
        media.ensure_plannable(&clip.path)?;

        let clip = clip.refreshed(&media);
        let plan = TrimPlanner::plan(&clip)?;

        let record =
            MetadataHistory::next_record_for(self.probe_port.as_ref(), &clip.path, &plan, clip.duration).await;

        let job = CutJob {
            source: clip.path.clone(),
            destination: target.to_path_buf(),
            start: plan.actual_start,
            duration: plan.new_duration,
            tags: record.to_tags(&self.options.comment),
        };
        self.cut_port.cut(&job).await?;

        Ok(plan)
    }
}

fn emit(events: &UnboundedSender<ExportEvent>, level: LogLevel, message: String) {
    match level {
        LogLevel::Info => info!("{}", message),
        LogLevel::Warn => warn!("{}", message),
    }
    let _ = events.send(ExportEvent::Log { level, message });
}

fn skip_message(filename: &str, error: &DomainError) -> String {
    match error {
        DomainError::ProbeFailure { .. } => error.to_string(),
        DomainError::InvalidRange { .. } => format!("Video {} too short for trimming.", filename),
        other => format!("Error processing {}: {}", filename, other),
    }
}

/// Puts the pipeline back to `Idle` when a run ends without finishing,
/// i.e. a port panicked or the task was aborted
struct RunGuard {
    state: Arc<Mutex<PipelineState>>,
    finished: bool,
}

impl RunGuard {
    fn new(state: Arc<Mutex<PipelineState>>) -> Self {
        Self { state, finished: false }
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if !self.finished {
            warn!("Export worker stopped before finishing");
            *lock(&self.state) = PipelineState::Idle;
        }
    }
}

fn lock(state: &Mutex<PipelineState>) -> MutexGuard<'_, PipelineState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
