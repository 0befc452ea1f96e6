//! Catalog, marker synchronization and planning working together

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use vtrim::planner::snap;
use vtrim::ports::ProbePort;
use vtrim::*;

/// Probe reporting a duration encoded in the file stem, e.g. `cam_100.mp4`
struct StemDuration;

#[async_trait]
impl ProbePort for StemDuration {
    async fn probe(&self, path: &Path) -> MediaInfo {
        let duration = path
            .file_stem()
            .and_then(|stem| stem.to_string_lossy().rsplit('_').next().map(str::to_string))
            .and_then(|value| value.parse::<f64>().ok())
            .unwrap_or(0.0);
        MediaInfo {
            fps: 25.0,
            duration,
            keyframes: (0..).map(|k| k as f64 * 2.0).take_while(|k| *k < duration).collect(),
        }
    }

    async fn read_format_tags(&self, _path: &Path) -> Result<HashMap<String, String>, DomainError> {
        Ok(HashMap::new())
    }
}

#[tokio::test]
async fn test_group_edit_then_plan_every_clip() {
    let mut catalog = Catalog::new();
    let a = catalog.add_clip("/shoot/cam_100.mp4", &StemDuration).await;
    let b = catalog.add_clip("/shoot/mic_50.mp4", &StemDuration).await;
    let again = catalog.add_clip("/shoot/cam_100.mp4", &StemDuration).await;
    assert_eq!(a, again);
    assert_eq!(catalog.len(), 2);

    let group = catalog.group_selection(None, &[a, b]).unwrap();
    assert_eq!(catalog.group(group).unwrap().name, "Group 01");

    MarkerSynchronizer::set_marker(&mut catalog, NodeId::Clip(a), MarkerKind::End, 90.0).unwrap();
    MarkerSynchronizer::set_marker(&mut catalog, NodeId::Clip(b), MarkerKind::Start, 5.0).unwrap();
    assert!(catalog.export_ready());

    let group = catalog.group(group).unwrap();
    assert_eq!(group.start_marker, 5.0);
    assert_eq!(group.end_marker, 40.0);

    let plans: Vec<TrimPlan> = catalog
        .ready_snapshot()
        .iter()
        .map(|clip| TrimPlanner::plan(clip).unwrap())
        .collect();
    assert_eq!((plans[0].actual_start, plans[0].actual_end), (4.0, 90.0));
    assert_eq!((plans[1].actual_start, plans[1].actual_end), (4.0, 40.0));
}

#[tokio::test]
async fn test_ungrouped_clips_edit_independently() {
    let mut catalog = Catalog::new();
    let a = catalog.add_clip("/shoot/a_100.mp4", &StemDuration).await;
    let b = catalog.add_clip("/shoot/b_60.mp4", &StemDuration).await;
    let group = catalog.group_selection(Some("Pair"), &[a, b]).unwrap();

    MarkerSynchronizer::set_marker(&mut catalog, NodeId::Group(group), MarkerKind::End, 80.0).unwrap();
    assert_eq!(catalog.clip(b).unwrap().end_marker, 40.0);

    assert_eq!(catalog.ungroup(group).unwrap(), vec![a, b]);
    assert_eq!(catalog.parent_of(a), None);

    let touched =
        MarkerSynchronizer::set_marker(&mut catalog, NodeId::Clip(a), MarkerKind::End, 70.0).unwrap();
    assert_eq!(touched, vec![a]);
    assert_eq!(catalog.clip(a).unwrap().end_marker, 70.0);
    assert_eq!(catalog.clip(b).unwrap().end_marker, 40.0);
}

#[tokio::test]
async fn test_unprobeable_file_is_kept_but_cannot_be_planned() {
    let mut catalog = Catalog::new();
    let id = catalog.add_clip("/shoot/corrupt.mp4", &StemDuration).await;
    let clip = catalog.clip(id).unwrap();

    assert_eq!(clip.duration, 0.0);
    assert_eq!(clip.fps, 25.0);
    assert!(matches!(
        TrimPlanner::plan(clip),
        Err(DomainError::InvalidRange { .. })
    ));
}

#[test]
fn test_snap_is_greatest_keyframe_within_tolerance() {
    let keyframes: Vec<f64> = (0..60).map(|k| k as f64 * 1.5).collect();
    let tolerance = 0.04;

    for step in 0..400 {
        let target = step as f64 * 0.237;
        let snapped = snap(&keyframes, target, tolerance);
        let expected = keyframes
            .iter()
            .copied()
            .filter(|k| *k <= target + tolerance)
            .fold(0.0, f64::max);

        assert_eq!(snapped, expected, "target {target}");
        assert_eq!(snap(&keyframes, snapped, tolerance), snapped);
    }
}
