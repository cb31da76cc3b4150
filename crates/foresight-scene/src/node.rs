use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::color::Rgb;
use crate::content::{
    MediaItem, MethodologyRecord, PillarRecord, RootRecord,
};
use crate::resources::{ResourceHandle, ResourceKind, ResourcePool};

const MEDIA_SEPARATOR: &str = "-media-";

/// String identity of a node, unique among live nodes.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Composite id of the `index`-th media leaf under `parent`.
    pub fn media(parent: &NodeId, index: usize) -> Self {
        Self(format!("{}{MEDIA_SEPARATOR}{index}", parent.0))
    }

    /// Split a composite media id back into `(parent, index)`.
    pub fn as_media(&self) -> Option<(NodeId, usize)> {
        let (parent, index) = self.0.rsplit_once(MEDIA_SEPARATOR)?;
        let index = index.parse().ok()?;
        Some((NodeId::new(parent), index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Depth of a node in the foresight hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    Center = 0,
    Pillar = 1,
    Methodology = 2,
    Media = 3,
}

impl Level {
    pub fn depth(self) -> usize {
        self as usize
    }

    pub fn child(self) -> Option<Level> {
        match self {
            Level::Center => Some(Level::Pillar),
            Level::Pillar => Some(Level::Methodology),
            Level::Methodology => Some(Level::Media),
            Level::Media => None,
        }
    }

    /// Sphere radius used for drawing and picking, before hover scaling.
    pub fn node_radius(self) -> f32 {
        match self {
            Level::Center => 4.0,
            Level::Pillar => 2.6,
            Level::Methodology => 1.5,
            Level::Media => 0.7,
        }
    }
}

/// Display data copied from the content source when a node is created.
#[derive(Debug, Clone, PartialEq)]
pub enum NodePayload {
    Center {
        label: String,
        media: Vec<MediaItem>,
    },
    Pillar {
        label: String,
        description: String,
        children: Vec<NodeId>,
        media: Vec<MediaItem>,
    },
    Methodology {
        label: String,
        description: String,
        media: Vec<MediaItem>,
        related: Vec<NodeId>,
    },
    Media(MediaItem),
}

impl NodePayload {
    pub fn label(&self) -> &str {
        match self {
            NodePayload::Center { label, .. }
            | NodePayload::Pillar { label, .. }
            | NodePayload::Methodology { label, .. } => label,
            NodePayload::Media(item) => &item.title,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            NodePayload::Center { .. } => None,
            NodePayload::Pillar { description, .. }
            | NodePayload::Methodology { description, .. } => {
                Some(description.as_str()).filter(|d| !d.is_empty())
            }
            NodePayload::Media(item) => item.description.as_deref(),
        }
    }

    pub fn media(&self) -> &[MediaItem] {
        match self {
            NodePayload::Center { media, .. }
            | NodePayload::Pillar { media, .. }
            | NodePayload::Methodology { media, .. } => media,
            NodePayload::Media(_) => &[],
        }
    }

    /// Methodologies in other pillars this node should be linked to while focused.
    pub fn related(&self) -> &[NodeId] {
        match self {
            NodePayload::Methodology { related, .. } => related,
            _ => &[],
        }
    }
}

impl From<&RootRecord> for NodePayload {
    fn from(r: &RootRecord) -> Self {
        NodePayload::Center {
            label: r.label.clone(),
            media: r.media.clone(),
        }
    }
}

impl From<&PillarRecord> for NodePayload {
    fn from(p: &PillarRecord) -> Self {
        NodePayload::Pillar {
            label: p.label.clone(),
            description: p.description.clone(),
            children: p.children.clone(),
            media: p.media.clone(),
        }
    }
}

impl From<&MethodologyRecord> for NodePayload {
    fn from(m: &MethodologyRecord) -> Self {
        NodePayload::Methodology {
            label: m.label.clone(),
            description: m.description.clone(),
            media: m.media.clone(),
            related: m.related.clone(),
        }
    }
}

/// Graphics resources owned by one node.
#[derive(Debug)]
pub struct NodeResources {
    mesh: ResourceHandle,
    material: ResourceHandle,
    label: ResourceHandle,
}

impl NodeResources {
    pub fn allocate(pool: &mut ResourcePool) -> Self {
        Self {
            mesh: pool.allocate(ResourceKind::Mesh),
            material: pool.allocate(ResourceKind::Material),
            label: pool.allocate(ResourceKind::LabelSprite),
        }
    }

    pub fn dispose(self, pool: &mut ResourcePool) {
        pool.release(self.mesh);
        pool.release(self.material);
        pool.release(self.label);
    }
}

/// Everything needed to insert a node; the store allocates its resources.
#[derive(Debug, Clone)]
pub struct NewNode {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub level: Level,
    pub position: Vec3,
    pub color: Rgb,
    pub payload: NodePayload,
}

/// A live vertex of the scene graph.
#[derive(Debug)]
pub struct SceneNode {
    pub id: NodeId,
    parent: Option<NodeId>,
    pub level: Level,
    pub position: Vec3,
    pub color: Rgb,
    pub payload: NodePayload,
    /// Current draw scale, eased toward `target_scale` each frame.
    pub scale: f32,
    pub target_scale: f32,
    resources: NodeResources,
}

impl SceneNode {
    pub(crate) fn materialize(
        node: NewNode,
        pool: &mut ResourcePool,
    ) -> Self {
        Self {
            id: node.id,
            parent: node.parent,
            level: node.level,
            position: node.position,
            color: node.color,
            payload: node.payload,
            scale: 1.0,
            target_scale: 1.0,
            resources: NodeResources::allocate(pool),
        }
    }

    /// Parent is fixed at creation, so only a getter is exposed.
    pub fn parent(&self) -> Option<&NodeId> {
        self.parent.as_ref()
    }

    pub fn label(&self) -> &str {
        self.payload.label()
    }

    pub fn pick_radius(&self) -> f32 {
        self.level.node_radius() * self.scale
    }

    pub(crate) fn dispose(self, pool: &mut ResourcePool) {
        self.resources.dispose(pool);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_ids_round_trip_through_composite_form() {
        let parent = NodeId::new("scenario-planning");
        let id = NodeId::media(&parent, 3);
        assert_eq!(id.as_str(), "scenario-planning-media-3");
        assert_eq!(id.as_media(), Some((parent, 3)));
        assert_eq!(NodeId::new("delphi").as_media(), None);
    }

    #[test]
    fn levels_chain_down_to_media() {
        assert_eq!(Level::Center.child(), Some(Level::Pillar));
        assert_eq!(Level::Methodology.child(), Some(Level::Media));
        assert_eq!(Level::Media.child(), None);
        assert_eq!(Level::Media.depth(), 3);
    }

    #[test]
    fn node_resources_are_released_on_dispose() {
        let mut pool = ResourcePool::new();
        let node = SceneNode::materialize(
            NewNode {
                id: "a".into(),
                parent: None,
                level: Level::Center,
                position: Vec3::ZERO,
                color: Rgb::CENTER,
                payload: NodePayload::Center {
                    label: "A".into(),
                    media: vec![],
                },
            },
            &mut pool,
        );
        assert_eq!(pool.live_count(), 3);
        node.dispose(&mut pool);
        assert_eq!(pool.live_count(), 0);
    }
}
