//! Command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::app::{AppContainer, ExportEvent, ExportSummary, PipelineState};
use crate::cli::args::{ExportArgs, HistoryArgs, PlanArgs, ProbeArgs};
use crate::cli::session::Session;
use crate::domain::model::{Clip, MediaInfo};
use crate::output::{output_path, HistoryRecord, MetadataHistory};
use crate::planner::{KeyframeIndex, TrimPlan, TrimPlanner};
use crate::utils::time::{format_time, format_timecode};

/// Planned cut for one ready clip, or why it would be skipped
#[derive(Debug, Serialize)]
struct PlannedClip {
    file: PathBuf,
    output: Option<PathBuf>,
    plan: Option<TrimPlan>,
    skipped: Option<String>,
    previous_keyframe: Option<f64>,
    next_keyframe: Option<f64>,
}

/// Execute the probe command
pub async fn probe(container: &dyn AppContainer, args: ProbeArgs) -> Result<()> {
    if !args.file.is_file() {
        anyhow::bail!("Input file does not exist: {}", args.file.display());
    }

    let media = container.probe_port().probe(&args.file).await;

    if args.json {
        let json = serde_json::to_string_pretty(&media).context("Failed to serialize media info to JSON")?;
        println!("{}", json);
    } else {
        display_media_info(&args.file, &media);
    }

    if let Err(e) = media.ensure_plannable(&args.file) {
        warn!("{}", e);
    }
    Ok(())
}

/// Execute the plan command
pub async fn plan(container: &dyn AppContainer, args: PlanArgs) -> Result<()> {
    let session = Session::load(&args.session)?;
    let probe = container.probe_port();
    let catalog = session.build_catalog(probe.as_ref()).await?;
    let destination = session.output_dir();
    let pipeline = container.export_pipeline();
    let suffix = &pipeline.options().crop_suffix;

    let planned: Vec<PlannedClip> = catalog
        .ready_snapshot()
        .iter()
        .map(|clip| plan_clip(clip, destination.as_deref(), suffix))
        .collect();

    if !catalog.export_ready() {
        info!(
            "{} of {} clips have markers and would be exported",
            planned.len(),
            catalog.len()
        );
    }

    if args.json {
        let json = serde_json::to_string_pretty(&planned).context("Failed to serialize plan to JSON")?;
        println!("{}", json);
    } else {
        display_plan(&planned, &catalog.ready_snapshot());
    }
    Ok(())
}

/// Execute the export command
pub async fn export(container: &dyn AppContainer, args: ExportArgs) -> Result<()> {
    let session = Session::load(&args.session)?;
    let destination = args
        .out
        .clone()
        .or_else(|| session.output_dir())
        .context("No destination: pass --out or set output_dir in the session")?;

    std::fs::create_dir_all(&destination)
        .with_context(|| format!("Failed to create {}", destination.display()))?;

    let probe = container.probe_port();
    let catalog = session.build_catalog(probe.as_ref()).await?;
    let snapshot = catalog.ready_snapshot();
    if snapshot.is_empty() {
        warn!("No clip has markers, nothing to export");
    }

    let pipeline = container.export_pipeline();
    let mut handle = pipeline.start(snapshot, &destination)?;

    // first Ctrl-C lets the current file finish, a second one kills it
    let cancellation = handle.cancellation();
    let abort = handle.abort_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("Interrupted, stopping after the current file (press Ctrl-C again to abort)");
        cancellation.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted again, aborting the current file");
            abort.abort();
        }
    });

    while let Some(event) = handle.events.recv().await {
        if args.json {
            println!("{}", serde_json::to_string(&event)?);
        } else {
            display_event(&event);
        }
    }
    interrupt.abort();

    let summary = handle
        .wait()
        .await
        .context("Export aborted, the file being cut may be incomplete")?;
    if !args.json {
        display_summary(&summary, &destination);
    }
    Ok(())
}

/// Execute the history command
pub async fn history(container: &dyn AppContainer, args: HistoryArgs) -> Result<()> {
    if !args.file.is_file() {
        anyhow::bail!("Input file does not exist: {}", args.file.display());
    }

    let tags = container
        .probe_port()
        .read_format_tags(&args.file)
        .await
        .with_context(|| format!("Failed to read tags of {}", args.file.display()))?;
    let records = MetadataHistory::records(&tags);

    if args.json {
        let json = serde_json::to_string_pretty(&records).context("Failed to serialize history to JSON")?;
        println!("{}", json);
    } else {
        display_history(&args.file, tags.get("comment"), &records);
    }
    Ok(())
}

fn plan_clip(clip: &Clip, destination: Option<&Path>, suffix: &str) -> PlannedClip {
    let media = MediaInfo {
        fps: clip.fps,
        duration: clip.duration,
        keyframes: clip.keyframes.clone(),
    };
    let result = media
        .ensure_plannable(&clip.path)
        .and_then(|_| TrimPlanner::plan(clip));

    let index = KeyframeIndex::new(&clip.keyframes);
    let (plan, skipped) = match result {
        Ok(plan) => (Some(plan), None),
        Err(e) => (None, Some(e.to_string())),
    };
    let anchor = plan.as_ref().map_or(clip.start_marker, |plan| plan.actual_start);

    PlannedClip {
        file: clip.path.clone(),
        output: destination.map(|dir| output_path(&clip.path, dir, suffix)),
        previous_keyframe: index.prev_before(anchor),
        next_keyframe: index.next_after(anchor),
        plan,
        skipped,
    }
}

/// Display media information in human-readable format
fn display_media_info(path: &Path, media: &MediaInfo) {
    let index = KeyframeIndex::new(&media.keyframes);

    println!("Media Information");
    println!("=================");
    println!("File: {}", path.display());
    println!("Frame Rate: {:.3} fps", media.fps);
    println!("Duration: {} ({:.3}s)", format_time(media.duration), media.duration);
    println!("Keyframes: {}", index.len());
    if let Some(gop) = index.average_gop() {
        println!("Average GOP: {:.3}s", gop);
    }
    if !media.keyframes.is_empty() {
        let shown: Vec<String> = media
            .keyframes
            .iter()
            .take(8)
            .map(|k| format_timecode(*k, media.fps))
            .collect();
        let more = if media.keyframes.len() > shown.len() { ", ..." } else { "" };
        println!("First Keyframes: {}{}", shown.join(", "), more);
    }
}

fn display_plan(planned: &[PlannedClip], clips: &[Clip]) {
    println!("Trim Plan");
    println!("=========");
    if planned.is_empty() {
        println!("No clip has markers.");
        return;
    }

    for (entry, clip) in planned.iter().zip(clips) {
        println!("{}", clip.filename);
        match &entry.plan {
            Some(plan) => {
                println!(
                    "  Start: {} -> {}",
                    format_timecode(plan.requested_start, clip.fps),
                    format_timecode(plan.actual_start, clip.fps)
                );
                println!(
                    "  End:   {} -> {}",
                    format_timecode(plan.requested_end, clip.fps),
                    format_timecode(plan.actual_end, clip.fps)
                );
                println!("  Length: {}", format_time(plan.new_duration));
            }
            None => {
                println!("  Skipped: {}", entry.skipped.as_deref().unwrap_or("unknown reason"));
            }
        }
        if let Some(output) = &entry.output {
            println!("  Output: {}", output.display());
        }
    }
}

fn display_event(event: &ExportEvent) {
    match event {
        ExportEvent::Progress { index, total, filename } => {
            println!("[{}/{}] {}", index + 1, total, filename);
        }
        ExportEvent::Log { message, .. } => println!("  {}", message),
        ExportEvent::Finished(_) => {}
    }
}

fn display_summary(summary: &ExportSummary, destination: &Path) {
    let elapsed = summary.finished_at - summary.started_at;
    let outcome = match summary.state {
        PipelineState::Cancelled => "cancelled",
        _ => "finished",
    };
    println!(
        "Export {} in {:.1}s: {} saved, {} skipped, {} not attempted ({})",
        outcome,
        elapsed.num_milliseconds() as f64 / 1000.0,
        summary.exported,
        summary.skipped,
        summary.not_attempted(),
        destination.display()
    );
}

fn display_history(path: &Path, comment: Option<&String>, records: &[HistoryRecord]) {
    println!("Trim History");
    println!("============");
    println!("File: {}", path.display());
    if let Some(comment) = comment {
        println!("Comment: {}", comment);
    }
    if records.is_empty() {
        println!("No trim history.");
        return;
    }

    for record in records {
        println!("#{} source {:.3}s", record.index, record.source_duration);
        println!(
            "  Start: requested {:.3}s, cut at {:.3}s",
            record.start_requested, record.start_actual
        );
        println!(
            "  End:   requested -{:.3}s, cut -{:.3}s",
            record.end_requested, record.end_actual
        );
    }
}
