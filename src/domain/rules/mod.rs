// Domain rules - Marker propagation across groups

use tracing::debug;

use crate::domain::catalog::Catalog;
use crate::domain::errors::DomainError;
use crate::domain::model::{ClipId, Group, MarkerKind, NodeId};

/// Applies marker edits to clips and groups
///
/// Inside a group the two markers follow different laws. A start marker is
/// the same absolute instant on every clip. An end marker is turned into a
/// distance from the tail of the reference clip, and every sibling loses that
/// same number of seconds from its own tail.
pub struct MarkerSynchronizer;

impl MarkerSynchronizer {
    /// Apply one edit and return the clips it touched
    pub fn set_marker(
        catalog: &mut Catalog,
        target: NodeId,
        kind: MarkerKind,
        value: f64,
    ) -> Result<Vec<ClipId>, DomainError> {
        if !value.is_finite() || value < 0.0 {
            return Err(DomainError::InvalidMarker(value));
        }

        match target {
            NodeId::Clip(id) => match catalog.parent_of(id) {
                Some(group_id) => {
                    let group = catalog
                        .group_mut(group_id)
                        .ok_or(DomainError::UnknownGroup(group_id))?;
                    let reference = group.position(id).ok_or(DomainError::UnknownClip(id))?;
                    Ok(Self::broadcast(group, Some(reference), kind, value))
                }
                None => {
                    let clip = catalog.clip_mut(id).ok_or(DomainError::UnknownClip(id))?;
                    match kind {
                        MarkerKind::Start => clip.start_marker = value,
                        MarkerKind::End => clip.end_marker = value,
                    }
                    clip.ready = true;
                    debug!("{} {} marker set to {:.3}s", clip.filename, kind, value);
                    Ok(vec![id])
                }
            },
            NodeId::Group(group_id) => {
                let group = catalog
                    .group_mut(group_id)
                    .ok_or(DomainError::UnknownGroup(group_id))?;
                // a group edit is made while its first clip is loaded
                let reference = if group.clips.is_empty() { None } else { Some(0) };
                Ok(Self::broadcast(group, reference, kind, value))
            }
        }
    }

    /// Push an already marked child's state to the whole group
    ///
    /// Used when a group is formed around a clip that was marked earlier.
    pub fn adopt_master(group: &mut Group, master: usize) {
        let Some(clip) = group.clips.get(master) else {
            return;
        };
        let start = clip.start_marker;
        let end = clip.end_marker;

        Self::broadcast(group, Some(master), MarkerKind::Start, start);
        Self::broadcast(group, Some(master), MarkerKind::End, end);
    }

    fn broadcast(
        group: &mut Group,
        reference: Option<usize>,
        kind: MarkerKind,
        value: f64,
    ) -> Vec<ClipId> {
        let Some(reference) = reference.filter(|index| *index < group.clips.len()) else {
            match kind {
                MarkerKind::Start => group.start_marker = value,
                MarkerKind::End => group.end_marker = value,
            }
            group.ready = true;
            return Vec::new();
        };

        let offset = (group.clips[reference].duration - value).max(0.0);
        for clip in group.clips.iter_mut() {
            match kind {
                MarkerKind::Start => clip.start_marker = value,
                MarkerKind::End => clip.end_marker = (clip.duration - offset).max(0.0),
            }
            clip.ready = true;
        }

        let master = &group.clips[reference];
        group.start_marker = master.start_marker;
        group.end_marker = master.end_marker;
        group.ready = true;

        debug!(
            "{}: {} marker broadcast from {} to {} clips",
            group.name,
            kind,
            master.filename,
            group.clips.len()
        );
        group.clips.iter().map(|clip| clip.id).collect()
    }
}
