use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::color::Rgb;
use crate::node::{Level, NodeId};
use crate::tour::TourSegment;

// ------------------------------------------------------------------
// Records
// ------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
    Article,
    Document,
    Podcast,
}

impl MediaKind {
    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Video => "Video",
            MediaKind::Image => "Image",
            MediaKind::Article => "Article",
            MediaKind::Document => "Document",
            MediaKind::Podcast => "Podcast",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootRecord {
    pub id: NodeId,
    pub label: String,
    #[serde(default)]
    pub media: Vec<MediaItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillarRecord {
    pub id: NodeId,
    pub label: String,
    #[serde(default)]
    pub description: String,
    /// Methodology ids, in display order.
    #[serde(default)]
    pub children: Vec<NodeId>,
    /// Filled from the palette at load time when absent.
    #[serde(default)]
    pub color: Option<Rgb>,
    #[serde(default)]
    pub media: Vec<MediaItem>,
}

impl PillarRecord {
    pub fn color(&self) -> Rgb {
        self.color.unwrap_or(Rgb::WHITE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodologyRecord {
    pub id: NodeId,
    #[serde(alias = "parentId")]
    pub parent: NodeId,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub media: Vec<MediaItem>,
    /// Methodologies in other pillars shown as cross-pillar links.
    #[serde(default)]
    pub related: Vec<NodeId>,
}

/// The static, read-only content tree the scene is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub root: RootRecord,
    pub pillars: Vec<PillarRecord>,
    pub methodologies: Vec<MethodologyRecord>,
    #[serde(default)]
    pub tour: Vec<TourSegment>,
}

// ------------------------------------------------------------------
// Loading
// ------------------------------------------------------------------

impl Content {
    pub fn from_json_str(json: &str) -> Result<Self, ContentError> {
        let mut content: Content = serde_json::from_str(json)?;
        content.assign_palette();
        content.validate()?;
        Ok(content)
    }

    pub fn from_path(path: &Path) -> Result<Self, ContentError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    fn assign_palette(&mut self) {
        for (i, pillar) in self.pillars.iter_mut().enumerate() {
            pillar.color.get_or_insert_with(|| Rgb::palette(i));
        }
    }

    /// Reject content the scene cannot represent as a finite tree.
    pub fn validate(&self) -> Result<(), ContentError> {
        let mut seen = HashSet::new();
        let all_ids = std::iter::once(&self.root.id)
            .chain(self.pillars.iter().map(|p| &p.id))
            .chain(self.methodologies.iter().map(|m| &m.id));
        for id in all_ids {
            if !seen.insert(id) {
                return Err(ContentError::DuplicateId(id.clone()));
            }
        }

        self.check_acyclic()?;

        let methodologies: HashMap<&NodeId, &MethodologyRecord> = self
            .methodologies
            .iter()
            .map(|m| (&m.id, m))
            .collect();

        for pillar in &self.pillars {
            let mut listed = HashSet::new();
            for child in &pillar.children {
                if !listed.insert(child) {
                    return Err(ContentError::RepeatedChild {
                        pillar: pillar.id.clone(),
                        child: child.clone(),
                    });
                }
                let Some(record) = methodologies.get(child) else {
                    return Err(ContentError::UnknownChild {
                        pillar: pillar.id.clone(),
                        child: child.clone(),
                    });
                };
                if record.parent != pillar.id {
                    return Err(ContentError::ParentMismatch {
                        methodology: child.clone(),
                        listed_under: pillar.id.clone(),
                        parent: record.parent.clone(),
                    });
                }
            }
        }

        for m in &self.methodologies {
            if !seen.contains(&m.parent) {
                return Err(ContentError::UnknownParent {
                    methodology: m.id.clone(),
                    parent: m.parent.clone(),
                });
            }
            if self.pillar(&m.parent).is_none() {
                return Err(ContentError::ParentNotPillar {
                    methodology: m.id.clone(),
                    parent: m.parent.clone(),
                });
            }
            for related in &m.related {
                if !methodologies.contains_key(related) {
                    log::warn!(
                        "methodology `{}` relates to unknown `{related}`",
                        m.id
                    );
                }
            }
        }

        Ok(())
    }

    /// Parent links from every record must form a forest.
    fn check_acyclic(&self) -> Result<(), ContentError> {
        let mut g: DiGraph<&NodeId, ()> = DiGraph::new();
        let mut index: HashMap<&NodeId, NodeIndex> = HashMap::new();
        let ids = std::iter::once(&self.root.id)
            .chain(self.pillars.iter().map(|p| &p.id))
            .chain(self.methodologies.iter().flat_map(|m| [&m.id, &m.parent]));
        for id in ids {
            index.entry(id).or_insert_with(|| g.add_node(id));
        }

        let root = index[&self.root.id];
        for pillar in &self.pillars {
            g.add_edge(root, index[&pillar.id], ());
        }
        for m in &self.methodologies {
            g.add_edge(index[&m.parent], index[&m.id], ());
        }

        toposort(&g, None).map(|_| ()).map_err(|cycle| {
            ContentError::Cycle(g[cycle.node_id()].clone())
        })
    }
}

// ------------------------------------------------------------------
// Lookups
// ------------------------------------------------------------------

impl Content {
    pub fn pillar(&self, id: &NodeId) -> Option<&PillarRecord> {
        self.pillars.iter().find(|p| &p.id == id)
    }

    pub fn methodology(&self, id: &NodeId) -> Option<&MethodologyRecord> {
        self.methodologies.iter().find(|m| &m.id == id)
    }

    pub fn level_of(&self, id: &NodeId) -> Option<Level> {
        if id == &self.root.id {
            Some(Level::Center)
        } else if self.pillar(id).is_some() {
            Some(Level::Pillar)
        } else if self.methodology(id).is_some() {
            Some(Level::Methodology)
        } else {
            self.media_item(id).map(|_| Level::Media)
        }
    }

    pub fn media_item(&self, id: &NodeId) -> Option<&MediaItem> {
        let (parent, index) = id.as_media()?;
        let media = if parent == self.root.id {
            &self.root.media
        } else if let Some(p) = self.pillar(&parent) {
            &p.media
        } else {
            &self.methodology(&parent)?.media
        };
        media.get(index)
    }

    /// Ancestors of `id`, root first, not including `id` itself.
    pub fn lineage(&self, id: &NodeId) -> Option<Vec<NodeId>> {
        match self.level_of(id)? {
            Level::Center => Some(Vec::new()),
            Level::Pillar => Some(vec![self.root.id.clone()]),
            Level::Methodology => {
                let parent = &self.methodology(id)?.parent;
                Some(vec![self.root.id.clone(), parent.clone()])
            }
            Level::Media => {
                let (parent, _) = id.as_media()?;
                let mut chain = self.lineage(&parent)?;
                chain.push(parent);
                Some(chain)
            }
        }
    }

    /// Upper bound of nodes a fully expanded scene would hold.
    pub fn total_node_count(&self) -> usize {
        1 + self.pillars.len()
            + self.methodologies.len()
            + self
                .methodologies
                .iter()
                .map(|m| m.media.len())
                .sum::<usize>()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ContentError {
    #[error("failed to read content: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid content JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate node id `{0}`")]
    DuplicateId(NodeId),
    #[error("pillar `{pillar}` lists `{child}` more than once")]
    RepeatedChild { pillar: NodeId, child: NodeId },
    #[error("pillar `{pillar}` lists unknown methodology `{child}`")]
    UnknownChild { pillar: NodeId, child: NodeId },
    #[error(
        "methodology `{methodology}` is listed under `{listed_under}` but names `{parent}` as parent"
    )]
    ParentMismatch {
        methodology: NodeId,
        listed_under: NodeId,
        parent: NodeId,
    },
    #[error("methodology `{methodology}` has unknown parent `{parent}`")]
    UnknownParent { methodology: NodeId, parent: NodeId },
    #[error("methodology `{methodology}` must sit under a pillar, not `{parent}`")]
    ParentNotPillar { methodology: NodeId, parent: NodeId },
    #[error("parent chain through `{0}` forms a cycle")]
    Cycle(NodeId),
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE: &str = r##"{
        "root": { "id": "foresight", "label": "Strategic Foresight" },
        "pillars": [
            {
                "id": "scanning",
                "label": "Horizon Scanning",
                "children": ["signals", "trends"],
                "color": "#4e79a7"
            },
            {
                "id": "scenarios",
                "label": "Scenario Planning",
                "children": ["two-axes", "backcasting", "wind-tunnel"]
            }
        ],
        "methodologies": [
            {
                "id": "signals",
                "parentId": "scanning",
                "label": "Weak Signals",
                "related": ["wind-tunnel"],
                "media": [
                    { "type": "article", "title": "Signals 101", "url": "https://example.org/a" },
                    { "type": "video", "title": "Spotting change", "url": "https://example.org/b", "year": 2019 },
                    { "type": "podcast", "title": "Edges", "url": "https://example.org/c" },
                    { "type": "image", "title": "Radar", "url": "https://example.org/d" }
                ]
            },
            {
                "id": "trends",
                "parentId": "scanning",
                "label": "Trend Analysis",
                "media": [
                    { "type": "document", "title": "Megatrends", "url": "https://example.org/e", "source": "OECD" },
                    { "type": "article", "title": "S-curves", "url": "https://example.org/f" },
                    { "type": "article", "title": "Drivers", "url": "https://example.org/g" },
                    { "type": "video", "title": "STEEP", "url": "https://example.org/h" }
                ]
            },
            { "id": "two-axes", "parentId": "scenarios", "label": "2x2 Matrix" },
            { "id": "backcasting", "parentId": "scenarios", "label": "Backcasting" },
            { "id": "wind-tunnel", "parentId": "scenarios", "label": "Wind Tunnelling" }
        ]
    }"##;

    pub(crate) fn sample() -> Content {
        Content::from_json_str(SAMPLE).unwrap()
    }

    #[test]
    fn sample_loads_with_palette_fill() {
        let content = sample();
        assert_eq!(content.pillars.len(), 2);
        assert_eq!(content.pillars[0].color(), Rgb::new(0x4e, 0x79, 0xa7));
        assert_eq!(content.pillars[1].color(), Rgb::palette(1));
        assert_eq!(content.methodologies[1].media[0].source.as_deref(), Some("OECD"));
        assert_eq!(content.total_node_count(), 1 + 2 + 5 + 8);
    }

    #[test]
    fn lineage_resolves_media_through_composite_ids() {
        let content = sample();
        let media = NodeId::media(&"signals".into(), 2);
        assert_eq!(content.level_of(&media), Some(Level::Media));
        assert_eq!(
            content.lineage(&media).unwrap(),
            vec![
                NodeId::from("foresight"),
                NodeId::from("scanning"),
                NodeId::from("signals"),
            ]
        );
        assert_eq!(content.lineage(&"foresight".into()), Some(vec![]));
        assert!(content.lineage(&NodeId::media(&"signals".into(), 9)).is_none());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let json = SAMPLE.replace("\"id\": \"trends\"", "\"id\": \"signals\"");
        let err = Content::from_json_str(&json).unwrap_err();
        assert!(matches!(err, ContentError::DuplicateId(id) if id.as_str() == "signals"));
    }

    #[test]
    fn unknown_child_is_rejected() {
        let json = SAMPLE.replace("\"backcasting\", \"wind-tunnel\"", "\"nowhere\"");
        let err = Content::from_json_str(&json).unwrap_err();
        assert!(matches!(err, ContentError::UnknownChild { .. }));
    }

    #[test]
    fn repeated_child_is_rejected() {
        let json = SAMPLE.replace(
            "\"backcasting\", \"wind-tunnel\"",
            "\"backcasting\", \"backcasting\", \"wind-tunnel\"",
        );
        let err = Content::from_json_str(&json).unwrap_err();
        assert!(
            matches!(&err, ContentError::RepeatedChild { child, .. } if child.as_str() == "backcasting"),
            "got {err}"
        );
    }

    #[test]
    fn cyclic_parent_chain_is_rejected_at_load() {
        let json = r#"{
            "root": { "id": "r", "label": "R" },
            "pillars": [],
            "methodologies": [
                { "id": "a", "parentId": "b", "label": "A" },
                { "id": "b", "parentId": "a", "label": "B" }
            ]
        }"#;
        let err = Content::from_json_str(json).unwrap_err();
        assert!(matches!(err, ContentError::Cycle(_)), "got {err}");
    }

    #[test]
    fn methodology_under_methodology_is_rejected() {
        let json = SAMPLE.replace(
            "\"id\": \"backcasting\", \"parentId\": \"scenarios\"",
            "\"id\": \"backcasting\", \"parentId\": \"two-axes\"",
        );
        let err = Content::from_json_str(&json).unwrap_err();
        assert!(matches!(err, ContentError::ParentMismatch { .. }));
    }
}
