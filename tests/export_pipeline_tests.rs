//! Export pipeline behaviour against in-memory probe and cut ports

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;
use vtrim::app::{ExportHandle, ExportOptions, LogLevel};
use vtrim::ports::{CutJob, CutPort, ProbePort};
use vtrim::*;

fn media(duration: f64) -> MediaInfo {
    MediaInfo {
        fps: 25.0,
        duration,
        keyframes: (0..).map(|k| k as f64 * 2.0).take_while(|k| *k < duration).collect(),
    }
}

#[derive(Default)]
struct FakeProbe {
    media: HashMap<PathBuf, MediaInfo>,
    tags: HashMap<PathBuf, HashMap<String, String>>,
    probed: Mutex<Vec<PathBuf>>,
}

impl FakeProbe {
    fn probed(&self) -> Vec<PathBuf> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProbePort for FakeProbe {
    async fn probe(&self, path: &Path) -> MediaInfo {
        self.probed.lock().unwrap().push(path.to_path_buf());
        self.media.get(path).cloned().unwrap_or_default()
    }

    async fn read_format_tags(&self, path: &Path) -> Result<HashMap<String, String>, DomainError> {
        self.tags
            .get(path)
            .cloned()
            .ok_or_else(|| DomainError::MetadataReadFailure("no tags".to_string()))
    }
}

#[derive(Default)]
struct FakeCutter {
    jobs: Mutex<Vec<CutJob>>,
    fail_for: Option<PathBuf>,
    cancel_after: Option<(PathBuf, CancellationFlag)>,
    gate: Option<Arc<Semaphore>>,
    panics: bool,
}

impl FakeCutter {
    fn jobs(&self) -> Vec<CutJob> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl CutPort for FakeCutter {
    async fn cut(&self, job: &CutJob) -> Result<(), DomainError> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if self.panics {
            panic!("cut tool crashed on {}", job.source.display());
        }
        self.jobs.lock().unwrap().push(job.clone());
        if let Some((path, flag)) = &self.cancel_after {
            if *path == job.source {
                flag.cancel();
            }
        }
        if self.fail_for.as_deref() == Some(job.source.as_path()) {
            return Err(DomainError::CutFailure {
                path: job.source.display().to_string(),
                reason: "exit status: 1".to_string(),
            });
        }
        Ok(())
    }
}

fn source(name: &str) -> PathBuf {
    PathBuf::from("/videos").join(name)
}

fn ready_clip(id: u64, name: &str, start: f64, end: f64) -> Clip {
    let mut clip = Clip::new(ClipId(id), source(name), media(100.0));
    clip.start_marker = start;
    clip.end_marker = end;
    clip.ready = true;
    clip
}

fn probe_with(names: &[&str]) -> FakeProbe {
    FakeProbe {
        media: names.iter().map(|name| (source(name), media(100.0))).collect(),
        ..FakeProbe::default()
    }
}

fn pipeline(probe: &Arc<FakeProbe>, cutter: &Arc<FakeCutter>) -> ExportPipeline {
    ExportPipeline::new(
        Arc::clone(probe) as Arc<dyn ProbePort>,
        Arc::clone(cutter) as Arc<dyn CutPort>,
        ExportOptions::default(),
    )
}

async fn drain(mut handle: ExportHandle) -> (Vec<ExportEvent>, ExportSummary) {
    let mut events = Vec::new();
    while let Some(event) = handle.events.recv().await {
        events.push(event);
    }
    let summary = handle.wait().await.unwrap();
    (events, summary)
}

fn progress_indices(events: &[ExportEvent]) -> Vec<usize> {
    events
        .iter()
        .filter_map(|event| match event {
            ExportEvent::Progress { index, .. } => Some(*index),
            _ => None,
        })
        .collect()
}

fn log_lines(events: &[ExportEvent]) -> Vec<(LogLevel, String)> {
    events
        .iter()
        .filter_map(|event| match event {
            ExportEvent::Log { level, message } => Some((*level, message.clone())),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_cancel_after_third_item_stops_batch() {
    let names = ["c0.mp4", "c1.mp4", "c2.mp4", "c3.mp4", "c4.mp4"];
    let flag = CancellationFlag::new();
    let probe = Arc::new(probe_with(&names));
    let cutter = Arc::new(FakeCutter {
        cancel_after: Some((source("c2.mp4"), flag.clone())),
        ..FakeCutter::default()
    });
    let snapshot: Vec<Clip> = names
        .iter()
        .enumerate()
        .map(|(i, name)| ready_clip(i as u64, name, 5.0, 91.0))
        .collect();

    let handle = pipeline(&probe, &cutter)
        .start_with(snapshot, "/exports", flag)
        .unwrap();
    let (events, summary) = drain(handle).await;

    assert_eq!(progress_indices(&events), vec![0, 1, 2]);
    assert_eq!(cutter.jobs().len(), 3);
    assert!(!probe.probed().contains(&source("c3.mp4")));
    assert!(!probe.probed().contains(&source("c4.mp4")));

    let finished: Vec<_> = events
        .iter()
        .filter(|event| matches!(event, ExportEvent::Finished(_)))
        .collect();
    assert_eq!(finished.len(), 1);
    assert!(matches!(events.last(), Some(ExportEvent::Finished(s)) if *s == summary));

    assert_eq!(summary.state, PipelineState::Cancelled);
    assert_eq!(summary.total, 5);
    assert_eq!(summary.exported, 3);
    assert_eq!(summary.not_attempted(), 2);
}

#[tokio::test]
async fn test_bad_items_are_skipped_not_fatal() {
    let mut probe = probe_with(&["ok.mp4", "short.mp4", "broken_cut.mp4"]);
    probe.media.insert(
        source("nokeys.mp4"),
        MediaInfo {
            fps: 25.0,
            duration: 100.0,
            keyframes: Vec::new(),
        },
    );
    let probe = Arc::new(probe);
    let cutter = Arc::new(FakeCutter {
        fail_for: Some(source("broken_cut.mp4")),
        ..FakeCutter::default()
    });
    let snapshot = vec![
        ready_clip(1, "nokeys.mp4", 5.0, 91.0),
        ready_clip(2, "short.mp4", 5.0, 5.5),
        ready_clip(3, "broken_cut.mp4", 5.0, 91.0),
        ready_clip(4, "ok.mp4", 5.0, 91.0),
    ];

    let handle = pipeline(&probe, &cutter).start(snapshot, "/exports").unwrap();
    let (events, summary) = drain(handle).await;

    assert_eq!(progress_indices(&events), vec![0, 1, 2, 3]);
    assert_eq!(summary.state, PipelineState::Completed);
    assert_eq!(summary.exported, 1);
    assert_eq!(summary.skipped, 3);

    let logs = log_lines(&events);
    assert_eq!(logs.len(), 4);
    assert_eq!(logs[0].0, LogLevel::Warn);
    assert!(logs[0].1.starts_with("Failed to analyze"));
    assert_eq!(logs[1].1, "Video short.mp4 too short for trimming.");
    assert!(logs[2].1.starts_with("Error processing broken_cut.mp4"));
    assert_eq!(logs[3], (LogLevel::Info, "Saved: ok.mp4".to_string()));

    // no cut is attempted for items that fail planning
    let cut_sources: Vec<PathBuf> = cutter.jobs().into_iter().map(|job| job.source).collect();
    assert_eq!(cut_sources, vec![source("broken_cut.mp4"), source("ok.mp4")]);
}

#[tokio::test]
async fn test_cut_job_uses_snapped_points_and_next_history_slot() {
    let mut probe = probe_with(&["a.mp4"]);
    let mut tags = HashMap::new();
    tags.insert("trim_history_1_source_duration".to_string(), "140.000000".to_string());
    tags.insert("trim_history_2_source_duration".to_string(), "120.000000".to_string());
    probe.tags.insert(source("a.mp4"), tags);
    let probe = Arc::new(probe);
    let cutter = Arc::new(FakeCutter::default());

    let handle = pipeline(&probe, &cutter)
        .start(vec![ready_clip(1, "a.mp4", 5.0, 91.0)], "/exports")
        .unwrap();
    drain(handle).await;

    let jobs = cutter.jobs();
    assert_eq!(jobs.len(), 1);
    let job = &jobs[0];
    assert_eq!(job.destination, PathBuf::from("/exports/a.mp4"));
    assert_eq!(job.start, 4.0);
    assert_eq!(job.duration, 86.0);
    assert_eq!(job.tags[0], ("comment".to_string(), "Trimmed with vtrim".to_string()));

    let tags: HashMap<_, _> = job.tags.iter().cloned().collect();
    assert_eq!(tags["trim_history_3_source_duration"], "100.000000");
    assert_eq!(tags["trim_history_3_start_requested"], "5.000");
    assert_eq!(tags["trim_history_3_start_actual"], "4.000000");
    assert_eq!(tags["trim_history_3_end_requested"], "9.000");
    assert_eq!(tags["trim_history_3_end_actual"], "10.000000");
}

#[tokio::test]
async fn test_export_into_source_directory_adds_suffix() {
    let probe = Arc::new(probe_with(&["clip.mp4"]));
    let cutter = Arc::new(FakeCutter::default());

    let handle = pipeline(&probe, &cutter)
        .start(vec![ready_clip(1, "clip.mp4", 0.0, 50.0)], "/videos/./")
        .unwrap();
    let (events, _) = drain(handle).await;

    assert_eq!(cutter.jobs()[0].destination, PathBuf::from("/videos/./clip_crop.mp4"));
    assert!(log_lines(&events).contains(&(LogLevel::Info, "Saved: clip_crop.mp4".to_string())));
}

#[tokio::test]
async fn test_second_start_while_running_is_refused() {
    let probe = Arc::new(probe_with(&["a.mp4"]));
    let gate = Arc::new(Semaphore::new(0));
    let cutter = Arc::new(FakeCutter {
        gate: Some(Arc::clone(&gate)),
        ..FakeCutter::default()
    });
    let pipeline = pipeline(&probe, &cutter);

    let handle = pipeline
        .start(vec![ready_clip(1, "a.mp4", 5.0, 91.0)], "/exports")
        .unwrap();
    assert_eq!(pipeline.state(), PipelineState::Running);
    assert!(matches!(
        pipeline.start(vec![ready_clip(2, "a.mp4", 5.0, 91.0)], "/exports"),
        Err(DomainError::ExportInProgress)
    ));

    gate.add_permits(1);
    let (_, summary) = drain(handle).await;
    assert_eq!(summary.state, PipelineState::Completed);
    assert_eq!(pipeline.state(), PipelineState::Completed);

    gate.add_permits(1);
    let handle = pipeline
        .start(vec![ready_clip(3, "a.mp4", 5.0, 91.0)], "/exports")
        .unwrap();
    let (_, summary) = drain(handle).await;
    assert_eq!(summary.exported, 1);
}

#[tokio::test]
async fn test_empty_snapshot_only_finishes() {
    let probe = Arc::new(FakeProbe::default());
    let cutter = Arc::new(FakeCutter::default());

    let handle = pipeline(&probe, &cutter).start(Vec::new(), "/exports").unwrap();
    let (events, summary) = drain(handle).await;

    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], ExportEvent::Finished(_)));
    assert_eq!(summary.total, 0);
    assert_eq!(summary.state, PipelineState::Completed);
}

async fn wait_until_not_running(pipeline: &ExportPipeline) {
    for _ in 0..1000 {
        if pipeline.state() != PipelineState::Running {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("pipeline still running");
}

#[tokio::test]
async fn test_crashed_worker_releases_pipeline() {
    let probe = Arc::new(probe_with(&["a.mp4"]));
    let cutter = Arc::new(FakeCutter {
        panics: true,
        ..FakeCutter::default()
    });
    let pipeline = pipeline(&probe, &cutter);

    let mut handle = pipeline
        .start(vec![ready_clip(1, "a.mp4", 5.0, 91.0)], "/exports")
        .unwrap();
    let mut events = Vec::new();
    while let Some(event) = handle.events.recv().await {
        events.push(event);
    }
    assert!(!events.iter().any(|event| matches!(event, ExportEvent::Finished(_))));
    assert!(matches!(handle.wait().await, Err(DomainError::WorkerFailed(_))));
    assert_eq!(pipeline.state(), PipelineState::Idle);
}

#[tokio::test]
async fn test_dropped_handle_of_crashed_worker_does_not_block_next_run() {
    let probe = Arc::new(probe_with(&["a.mp4"]));
    let crashing = Arc::new(FakeCutter {
        panics: true,
        ..FakeCutter::default()
    });
    let pipeline = pipeline(&probe, &crashing);

    drop(
        pipeline
            .start(vec![ready_clip(1, "a.mp4", 5.0, 91.0)], "/exports")
            .unwrap(),
    );
    wait_until_not_running(&pipeline).await;
    assert_eq!(pipeline.state(), PipelineState::Idle);
    assert!(pipeline.start(Vec::new(), "/exports").is_ok());
}

#[tokio::test]
async fn test_abort_stops_running_cut_and_releases_pipeline() {
    let probe = Arc::new(probe_with(&["a.mp4", "b.mp4"]));
    let gate = Arc::new(Semaphore::new(0));
    let cutter = Arc::new(FakeCutter {
        gate: Some(Arc::clone(&gate)),
        ..FakeCutter::default()
    });
    let pipeline = pipeline(&probe, &cutter);

    let mut handle = pipeline
        .start(
            vec![ready_clip(1, "a.mp4", 5.0, 91.0), ready_clip(2, "b.mp4", 5.0, 91.0)],
            "/exports",
        )
        .unwrap();

    // wait until the first cut is blocked in the tool
    assert!(matches!(handle.events.recv().await, Some(ExportEvent::Progress { index: 0, .. })));
    handle.abort_handle().abort();

    while handle.events.recv().await.is_some() {}
    assert!(matches!(handle.wait().await, Err(DomainError::WorkerFailed(_))));
    assert!(cutter.jobs().is_empty());
    assert_eq!(pipeline.state(), PipelineState::Idle);
}
