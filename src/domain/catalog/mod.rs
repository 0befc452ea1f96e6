//! Clip catalog
//!
//! The catalog owns every clip and group. The tree has exactly one level of
//! nesting: a root entry is either a clip or a group, and a group only holds
//! clips. Removing a clip drops it for good; ungrouping hands the children
//! back to the root with their markers untouched.

use std::path::Path;

use tracing::{debug, info};

use crate::domain::errors::DomainError;
use crate::domain::model::{Clip, ClipId, Group, GroupId, MediaInfo, Node};
use crate::domain::rules::MarkerSynchronizer;
use crate::ports::ProbePort;

/// Owner of the clip/group tree
#[derive(Debug, Default)]
pub struct Catalog {
    nodes: Vec<Node>,
    next_id: u64,
    group_counter: u32,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe a file once and add it at the root
    ///
    /// Adding a path that is already present returns the existing clip.
    pub async fn add_clip(&mut self, path: impl AsRef<Path>, probe: &dyn ProbePort) -> ClipId {
        let path = path.as_ref();
        if let Some(existing) = self.find_by_path(path) {
            debug!("{} already in catalog as {}", path.display(), existing);
            return existing;
        }

        let media = probe.probe(path).await;
        self.insert_clip(path, media)
    }

    /// Add an already probed file at the root
    pub fn insert_clip(&mut self, path: impl AsRef<Path>, media: MediaInfo) -> ClipId {
        let path = path.as_ref();
        if let Some(existing) = self.find_by_path(path) {
            return existing;
        }

        let id = ClipId(self.allocate_id());
        let clip = Clip::new(id, path, media);
        info!(
            "Added {} ({:.3}s, {:.3} fps, {} keyframes)",
            clip.filename,
            clip.duration,
            clip.fps,
            clip.keyframes.len()
        );
        self.nodes.push(Node::Clip(clip));
        id
    }

    /// Remove a clip from wherever it lives
    ///
    /// A group left empty by the removal stays in place.
    pub fn remove_clip(&mut self, id: ClipId) -> Result<Clip, DomainError> {
        let clip = self.take_clip(id).ok_or(DomainError::UnknownClip(id))?;
        info!("Removed {}", clip.filename);
        Ok(clip)
    }

    /// Move the selected clips into a new group appended to the root
    ///
    /// When `name` is `None` the group is named `Group NN` from a running
    /// counter. If one of the selected clips is already ready, the first such
    /// clip becomes the master and its markers are pushed to the siblings.
    pub fn group_selection(
        &mut self,
        name: Option<&str>,
        selection: &[ClipId],
    ) -> Result<GroupId, DomainError> {
        let mut ids: Vec<ClipId> = Vec::with_capacity(selection.len());
        for id in selection {
            if self.clip(*id).is_none() {
                return Err(DomainError::UnknownClip(*id));
            }
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        if ids.is_empty() {
            return Err(DomainError::EmptySelection);
        }

        let name = match name {
            Some(name) => name.to_string(),
            None => {
                self.group_counter += 1;
                format!("Group {:02}", self.group_counter)
            }
        };

        let mut group = Group::new(GroupId(self.allocate_id()), name);
        for id in ids {
            if let Some(clip) = self.take_clip(id) {
                group.clips.push(clip);
            }
        }

        if let Some(master) = group.clips.iter().position(|clip| clip.ready) {
            MarkerSynchronizer::adopt_master(&mut group, master);
        }

        info!("Created {} with {} clips", group.name, group.clips.len());
        let id = group.id;
        self.nodes.push(Node::Group(group));
        Ok(id)
    }

    /// Dissolve a group, returning its children to the root in order
    pub fn ungroup(&mut self, id: GroupId) -> Result<Vec<ClipId>, DomainError> {
        let index = self
            .nodes
            .iter()
            .position(|node| matches!(node, Node::Group(group) if group.id == id))
            .ok_or(DomainError::UnknownGroup(id))?;

        let Node::Group(group) = self.nodes.remove(index) else {
            return Err(DomainError::UnknownGroup(id));
        };

        info!("Ungrouped {} ({} clips)", group.name, group.clips.len());
        let ids = group.clips.iter().map(|clip| clip.id).collect();
        self.nodes.extend(group.clips.into_iter().map(Node::Clip));
        Ok(ids)
    }

    /// Rename a group
    pub fn rename_group(&mut self, id: GroupId, name: &str) -> Result<(), DomainError> {
        let group = self.group_mut(id).ok_or(DomainError::UnknownGroup(id))?;
        group.name = name.to_string();
        Ok(())
    }

    /// Drop every clip and group
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.group_counter = 0;
    }

    /// Root entries in order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Every clip in tree order
    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.nodes.iter().flat_map(|node| match node {
            Node::Clip(clip) => std::slice::from_ref(clip).iter(),
            Node::Group(group) => group.clips.iter(),
        })
    }

    /// Number of clips, grouped or not
    pub fn len(&self) -> usize {
        self.clips().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.clips().find(|clip| clip.id == id)
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.nodes.iter().find_map(|node| match node {
            Node::Group(group) if group.id == id => Some(group),
            _ => None,
        })
    }

    /// Look up a clip by the path it was added with
    pub fn find_by_path(&self, path: &Path) -> Option<ClipId> {
        self.clips().find(|clip| clip.path == path).map(|clip| clip.id)
    }

    /// Look up a group by name
    pub fn find_group_by_name(&self, name: &str) -> Option<GroupId> {
        self.nodes.iter().find_map(|node| match node {
            Node::Group(group) if group.name == name => Some(group.id),
            _ => None,
        })
    }

    /// Group holding the clip, `None` for root clips and unknown ids
    pub fn parent_of(&self, id: ClipId) -> Option<GroupId> {
        self.nodes.iter().find_map(|node| match node {
            Node::Group(group) if group.position(id).is_some() => Some(group.id),
            _ => None,
        })
    }

    /// True when there is at least one clip and every clip is ready
    pub fn export_ready(&self) -> bool {
        let mut clips = self.clips().peekable();
        clips.peek().is_some() && clips.all(|clip| clip.ready)
    }

    /// Owned copies of the ready clips in tree order
    pub fn ready_snapshot(&self) -> Vec<Clip> {
        self.clips().filter(|clip| clip.ready).cloned().collect()
    }

    pub(crate) fn clip_mut(&mut self, id: ClipId) -> Option<&mut Clip> {
        self.nodes.iter_mut().find_map(|node| match node {
            Node::Clip(clip) if clip.id == id => Some(clip),
            Node::Group(group) => group.clips.iter_mut().find(|clip| clip.id == id),
            _ => None,
        })
    }

    pub(crate) fn group_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.nodes.iter_mut().find_map(|node| match node {
            Node::Group(group) if group.id == id => Some(group),
            _ => None,
        })
    }

    fn take_clip(&mut self, id: ClipId) -> Option<Clip> {
        let mut root_index = None;
        for (index, node) in self.nodes.iter_mut().enumerate() {
            match node {
                Node::Clip(clip) if clip.id == id => {
                    root_index = Some(index);
                    break;
                }
                Node::Group(group) => {
                    if let Some(position) = group.position(id) {
                        return Some(group.clips.remove(position));
                    }
                }
                _ => {}
            }
        }

        match self.nodes.remove(root_index?) {
            Node::Clip(clip) => Some(clip),
            Node::Group(_) => None,
        }
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}
