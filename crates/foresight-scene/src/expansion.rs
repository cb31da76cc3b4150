use std::collections::HashSet;

use glam::Vec3;

use crate::color::Rgb;
use crate::config::{LevelRadii, SceneConfig};
use crate::connections::{ConnectionError, ConnectionManager};
use crate::content::Content;
use crate::graph_store::{GraphError, NodeGraphStore};
use crate::layout::circle_positions;
use crate::node::{Level, NewNode, NodeId, NodePayload, SceneNode};

// ------------------------------------------------------------------
// Outcomes
// ------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Collapsed,
    Expanded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Warning,
    Error,
}

/// A non-fatal notice for the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Children materialized; `notice` is set when some were held back.
    Expanded {
        created: Vec<NodeId>,
        notice: Option<Toast>,
    },
    Collapsed {
        removed: Vec<NodeId>,
    },
    /// The node has nothing to expand.
    NoChildren,
    /// The node ceiling would be crossed; nothing changed.
    Refused(Toast),
}

/// Children a node would materialize, in payload order.
struct ChildPlan {
    nodes: Vec<NewNode>,
    held_back: usize,
}

// ------------------------------------------------------------------
// Controller
// ------------------------------------------------------------------

/// Tracks which nodes are expanded and mediates clicks against the
/// node store and the connection manager.
///
/// Every expansion is checked against the live-node ceiling before the
/// first mutation, so a refused request leaves no partial state behind.
#[derive(Debug)]
pub struct ExpansionController {
    expanded: HashSet<NodeId>,
    max_live_nodes: usize,
    max_media_per_node: Option<usize>,
    radii: LevelRadii,
    media_tint: f32,
}

impl ExpansionController {
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            expanded: HashSet::new(),
            max_live_nodes: config.max_live_nodes,
            max_media_per_node: config.max_media_per_node,
            radii: config.radii,
            media_tint: config.appearance.media_tint,
        }
    }

    pub fn ceiling(&self) -> usize {
        self.max_live_nodes
    }

    pub fn set_ceiling(&mut self, max_live_nodes: usize) {
        self.max_live_nodes = max_live_nodes;
    }

    pub fn state_of(&self, id: &NodeId) -> NodeState {
        if self.expanded.contains(id) {
            NodeState::Expanded
        } else {
            NodeState::Collapsed
        }
    }

    pub fn is_expanded(&self, id: &NodeId) -> bool {
        self.expanded.contains(id)
    }

    pub fn expanded(&self) -> impl Iterator<Item = &NodeId> + '_ {
        self.expanded.iter()
    }

    /// Reset the scene to the center node and its ring of pillars.
    ///
    /// Pillars are always present, so the ceiling is not applied here.
    pub fn bootstrap(
        &mut self,
        content: &Content,
        store: &mut NodeGraphStore,
        connections: &mut ConnectionManager,
    ) -> Result<(), ExpansionError> {
        store.clear();
        connections.clear();
        self.expanded.clear();

        let root = &content.root;
        store.add_node(NewNode {
            id: root.id.clone(),
            parent: None,
            level: Level::Center,
            position: Vec3::ZERO,
            color: Rgb::CENTER,
            payload: root.into(),
        })?;

        let opacity = connections.style().resting_opacity;
        let positions =
            circle_positions(Vec3::ZERO, self.radii.pillar, content.pillars.len());
        for (pillar, position) in content.pillars.iter().zip(positions) {
            store.add_node(NewNode {
                id: pillar.id.clone(),
                parent: Some(root.id.clone()),
                level: Level::Pillar,
                position,
                color: pillar.color(),
                payload: pillar.into(),
            })?;
            connections.create_connection(
                Vec3::ZERO,
                position,
                pillar.color(),
                opacity,
                root.id.clone(),
                pillar.id.clone(),
            )?;
        }

        if store.len() > self.max_live_nodes {
            log::warn!(
                "bootstrap already holds {} nodes, above the ceiling of {}",
                store.len(),
                self.max_live_nodes
            );
        }
        log::info!("scene bootstrapped with {} pillars", content.pillars.len());
        Ok(())
    }

    /// Toggle a node between collapsed and expanded.
    pub fn click(
        &mut self,
        id: &NodeId,
        content: &Content,
        store: &mut NodeGraphStore,
        connections: &mut ConnectionManager,
    ) -> Result<ClickOutcome, ExpansionError> {
        if !store.contains(id) {
            return Err(ExpansionError::UnknownNode(id.clone()));
        }
        if self.expanded.contains(id) {
            let removed = self.collapse(id, store, connections);
            return Ok(ClickOutcome::Collapsed { removed });
        }
        self.expand(id, content, store, connections)
    }

    /// Materialize the children of `id` that are not already live.
    pub fn expand(
        &mut self,
        id: &NodeId,
        content: &Content,
        store: &mut NodeGraphStore,
        connections: &mut ConnectionManager,
    ) -> Result<ClickOutcome, ExpansionError> {
        let parent = store
            .get(id)
            .ok_or_else(|| ExpansionError::UnknownNode(id.clone()))?;
        let plan = self.plan_children(content, parent);
        if plan.nodes.is_empty() {
            return Ok(ClickOutcome::NoChildren);
        }
        let parent_position = parent.position;
        let notice = (plan.held_back > 0).then(|| {
            Toast::warning(format!(
                "`{}` has {} more media items than can be shown",
                parent.label(),
                plan.held_back
            ))
        });

        let fresh: Vec<NewNode> = plan
            .nodes
            .into_iter()
            .filter(|n| !store.contains(&n.id))
            .collect();

        let live = store.len();
        if !fresh.is_empty()
            && (live >= self.max_live_nodes
                || live + fresh.len() > self.max_live_nodes)
        {
            log::warn!(
                "refused to expand `{id}`: {live} live + {} new exceeds {}",
                fresh.len(),
                self.max_live_nodes
            );
            return Ok(ClickOutcome::Refused(Toast::warning(format!(
                "Showing {} more nodes would pass the limit of {} ({live} on screen). \
                 Collapse a branch first.",
                fresh.len(),
                self.max_live_nodes
            ))));
        }

        if let Some(stale) = fresh.iter().find(|n| {
            connections.structural().iter().any(|c| c.child_id == n.id)
        }) {
            return Err(ConnectionError::DuplicateConnection {
                parent: id.clone(),
                child: stale.id.clone(),
            }
            .into());
        }

        let opacity = connections.style().resting_opacity;
        let mut created = Vec::with_capacity(fresh.len());
        for node in fresh {
            let child_id = node.id.clone();
            let (position, color) = (node.position, node.color);
            store.add_node(node)?;
            connections.create_connection(
                parent_position,
                position,
                color,
                opacity,
                id.clone(),
                child_id.clone(),
            )?;
            created.push(child_id);
        }

        self.expanded.insert(id.clone());
        log::debug!("expanded `{id}` with {} new nodes", created.len());
        Ok(ClickOutcome::Expanded { created, notice })
    }

    /// Dispose the whole subtree below `id`. A no-op when `id` is collapsed.
    pub fn collapse(
        &mut self,
        id: &NodeId,
        store: &mut NodeGraphStore,
        connections: &mut ConnectionManager,
    ) -> Vec<NodeId> {
        if !self.expanded.remove(id) {
            return Vec::new();
        }
        let removed = store.remove_subtree(id);
        let edges = connections.remove_connections_for_ids(&removed);
        for gone in &removed {
            self.expanded.remove(gone);
        }
        log::debug!(
            "collapsed `{id}`: {} nodes, {edges} connections",
            removed.len()
        );
        removed
    }

    /// Expand every ancestor of `target` so that it becomes live.
    ///
    /// Returns the notices produced on the way. The walk stops at the first
    /// refused expansion, so callers check the store to see whether the
    /// target made it.
    pub fn reveal(
        &mut self,
        target: &NodeId,
        content: &Content,
        store: &mut NodeGraphStore,
        connections: &mut ConnectionManager,
    ) -> Result<Vec<Toast>, ExpansionError> {
        let lineage = content
            .lineage(target)
            .ok_or_else(|| ExpansionError::UnknownNode(target.clone()))?;

        let mut toasts = Vec::new();
        for ancestor in lineage {
            if ancestor == content.root.id || self.expanded.contains(&ancestor) {
                continue;
            }
            match self.expand(&ancestor, content, store, connections)? {
                ClickOutcome::Refused(toast) => {
                    toasts.push(toast);
                    break;
                }
                ClickOutcome::Expanded {
                    notice: Some(toast),
                    ..
                } => toasts.push(toast),
                _ => {}
            }
        }
        Ok(toasts)
    }

    fn plan_children(&self, content: &Content, parent: &SceneNode) -> ChildPlan {
        let mut held_back = 0;
        let mut listed = HashSet::new();
        let entries: Vec<(NodeId, Level, Rgb, NodePayload)> = match &parent.payload {
            NodePayload::Pillar { children, .. } => children
                .iter()
                .filter(|child| {
                    let first = listed.insert(*child);
                    if !first {
                        log::warn!("pillar `{}` lists `{child}` twice", parent.id);
                    }
                    first
                })
                .filter_map(|child| {
                    let Some(record) = content.methodology(child) else {
                        log::warn!("pillar `{}` lists unknown `{child}`", parent.id);
                        return None;
                    };
                    Some((
                        record.id.clone(),
                        Level::Methodology,
                        parent.color,
                        NodePayload::from(record),
                    ))
                })
                .collect(),
            NodePayload::Methodology { media, .. } => {
                let limit = self.max_media_per_node.unwrap_or(usize::MAX);
                held_back = media.len().saturating_sub(limit);
                let tint = parent.color.lerp(Rgb::WHITE, self.media_tint);
                media
                    .iter()
                    .take(limit)
                    .enumerate()
                    .map(|(i, item)| {
                        (
                            NodeId::media(&parent.id, i),
                            Level::Media,
                            tint,
                            NodePayload::Media(item.clone()),
                        )
                    })
                    .collect()
            }
            NodePayload::Center { .. } | NodePayload::Media(_) => Vec::new(),
        };

        let Some(level) = parent.level.child() else {
            return ChildPlan {
                nodes: Vec::new(),
                held_back,
            };
        };
        let positions =
            circle_positions(parent.position, self.radii.for_level(level), entries.len());
        let nodes = entries
            .into_iter()
            .zip(positions)
            .map(|((id, level, color, payload), position)| NewNode {
                id,
                parent: Some(parent.id.clone()),
                level,
                position,
                color,
                payload,
            })
            .collect();

        ChildPlan { nodes, held_back }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ExpansionError {
    #[error("no live node `{0}`")]
    UnknownNode(NodeId),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::tests::sample;
    use crate::layout::ring_angle;
    use serde_json::json;

    struct World {
        content: Content,
        store: NodeGraphStore,
        connections: ConnectionManager,
        expansion: ExpansionController,
    }

    impl World {
        fn new(content: Content, config: SceneConfig) -> Self {
            let mut world = World {
                content,
                store: NodeGraphStore::new(),
                connections: ConnectionManager::new(config.connections),
                expansion: ExpansionController::new(&config),
            };
            world
                .expansion
                .bootstrap(&world.content, &mut world.store, &mut world.connections)
                .unwrap();
            world
        }

        fn click(&mut self, id: &str) -> ClickOutcome {
            let outcome = self
                .expansion
                .click(&id.into(), &self.content, &mut self.store, &mut self.connections)
                .unwrap();
            self.assert_invariants();
            outcome
        }

        fn assert_invariants(&self) {
            assert_eq!(self.connections.structural_count(), self.store.non_root_count());
            let unique: HashSet<&NodeId> = self.store.iter().map(|n| &n.id).collect();
            assert_eq!(unique.len(), self.store.len());
        }

        fn counts(&self) -> (usize, usize, usize, usize) {
            (
                self.store.len(),
                self.connections.structural_count(),
                self.store.resources().live_count(),
                self.connections.resources().live_count(),
            )
        }
    }

    fn created(outcome: ClickOutcome) -> Vec<NodeId> {
        match outcome {
            ClickOutcome::Expanded { created, .. } => created,
            other => panic!("expected expansion, got {other:?}"),
        }
    }

    #[test]
    fn bootstrap_places_center_and_pillars() {
        let world = World::new(sample(), SceneConfig::default());
        assert_eq!(world.store.len(), 3);
        assert_eq!(world.connections.structural_count(), 2);
        let scanning = world.store.get(&"scanning".into()).unwrap();
        assert!((scanning.position.length() - 40.0).abs() < 1e-4);
        assert_eq!(scanning.parent(), Some(&NodeId::from("foresight")));
        world.assert_invariants();
    }

    #[test]
    fn pillar_children_sit_at_thirds_around_the_parent() {
        let mut world = World::new(sample(), SceneConfig::default());
        let ids = created(world.click("scenarios"));
        assert_eq!(
            ids,
            vec![
                NodeId::from("two-axes"),
                NodeId::from("backcasting"),
                NodeId::from("wind-tunnel"),
            ]
        );

        let parent = world.store.get(&"scenarios".into()).unwrap().position;
        let angles: Vec<f32> = ids
            .iter()
            .map(|id| {
                let node = world.store.get(id).unwrap();
                assert!((node.position.distance(parent) - 14.0).abs() < 1e-3);
                ring_angle(parent, node.position).to_degrees()
            })
            .collect();
        for (got, want) in angles.iter().zip([0.0, 120.0, 240.0]) {
            assert!((got - want).abs() < 1e-2, "{got} vs {want}");
        }

        let edges: Vec<_> = world
            .connections
            .structural()
            .iter()
            .filter(|c| ids.contains(&c.child_id))
            .collect();
        assert_eq!(edges.len(), 3);
        assert!(edges.iter().all(|c| c.parent_id.as_str() == "scenarios"));
        assert_eq!(world.expansion.state_of(&"scenarios".into()), NodeState::Expanded);
    }

    #[test]
    fn ceiling_refuses_without_touching_the_scene() {
        let pillars: Vec<_> = (0..7)
            .map(|i| {
                let children = if i == 0 {
                    json!(["m0", "m1", "m2", "m3", "m4"])
                } else {
                    json!([])
                };
                json!({ "id": format!("p{i}"), "label": format!("P{i}"), "children": children })
            })
            .collect();
        let methodologies: Vec<_> = (0..5)
            .map(|i| json!({ "id": format!("m{i}"), "parentId": "p0", "label": format!("M{i}") }))
            .collect();
        let content = Content::from_json_str(
            &json!({
                "root": { "id": "r", "label": "R" },
                "pillars": pillars,
                "methodologies": methodologies,
            })
            .to_string(),
        )
        .unwrap();
        let config = SceneConfig {
            max_live_nodes: 10,
            ..SceneConfig::default()
        };

        let mut world = World::new(content, config);
        let before = world.counts();
        assert_eq!(before.0, 8);

        let outcome = world.click("p0");
        let ClickOutcome::Refused(toast) = outcome else {
            panic!("expected refusal, got {outcome:?}");
        };
        assert_eq!(toast.level, ToastLevel::Warning);
        assert_eq!(world.counts(), before);
        assert_eq!(world.expansion.state_of(&"p0".into()), NodeState::Collapsed);
    }

    #[test]
    fn children_listed_twice_are_created_once() {
        let mut content = sample();
        content.pillars[1].children = vec!["two-axes".into(), "two-axes".into()];
        let mut world = World::new(content, SceneConfig::default());

        let ids = created(world.click("scenarios"));
        assert_eq!(ids, vec![NodeId::from("two-axes")]);
        assert_eq!(world.store.len(), 4);
        assert!(world.expansion.is_expanded(&"scenarios".into()));
    }

    #[test]
    fn collapsing_a_pillar_drops_methodologies_and_media() {
        let mut world = World::new(sample(), SceneConfig::default());
        world.click("scanning");
        assert_eq!(created(world.click("signals")).len(), 4);
        assert_eq!(created(world.click("trends")).len(), 4);
        assert_eq!(world.store.len(), 13);

        let ClickOutcome::Collapsed { removed } = world.click("scanning") else {
            panic!("expected collapse");
        };
        assert_eq!(removed.len(), 10);
        assert_eq!(world.store.len(), 3);
        assert_eq!(world.connections.structural_count(), 2);
        assert!(!world.expansion.is_expanded(&"signals".into()));

        // methodologies come back collapsed
        assert_eq!(created(world.click("scanning")).len(), 2);
        assert_eq!(world.store.len(), 5);
    }

    #[test]
    fn expand_then_collapse_restores_counts_and_resources() {
        let mut world = World::new(sample(), SceneConfig::default());
        let baseline = world.counts();
        world.click("scanning");
        world.click("trends");
        assert_ne!(world.counts(), baseline);
        world.click("scanning");
        assert_eq!(world.counts(), baseline);
    }

    #[test]
    fn repeated_operations_are_idempotent() {
        let mut world = World::new(sample(), SceneConfig::default());
        let id = NodeId::from("scenarios");
        assert!(
            world
                .expansion
                .collapse(&id, &mut world.store, &mut world.connections)
                .is_empty()
        );

        created(world.click("scenarios"));
        let again = world
            .expansion
            .expand(&id, &world.content, &mut world.store, &mut world.connections)
            .unwrap();
        assert_eq!(created(again), Vec::<NodeId>::new());
        assert_eq!(world.store.len(), 6);
        world.assert_invariants();
    }

    #[test]
    fn leaves_and_center_have_nothing_to_expand() {
        let mut world = World::new(sample(), SceneConfig::default());
        assert_eq!(world.click("foresight"), ClickOutcome::NoChildren);
        world.click("scenarios");
        // no media on this methodology
        assert_eq!(world.click("two-axes"), ClickOutcome::NoChildren);
        assert_eq!(world.expansion.state_of(&"two-axes".into()), NodeState::Collapsed);
    }

    #[test]
    fn media_leaves_take_a_lighter_parent_color() {
        let mut world = World::new(sample(), SceneConfig::default());
        world.click("scanning");
        let ids = created(world.click("signals"));
        assert_eq!(ids[0].as_str(), "signals-media-0");

        let parent = world.store.get(&"signals".into()).unwrap().color;
        let leaf = world.store.get(&ids[0]).unwrap();
        assert_eq!(leaf.level, Level::Media);
        assert_eq!(leaf.color, parent.lerp(Rgb::WHITE, 0.45));
        assert_eq!(leaf.label(), "Signals 101");
        assert_eq!(world.click("signals-media-0"), ClickOutcome::NoChildren);
    }

    #[test]
    fn media_beyond_the_soft_limit_are_held_back() {
        let config = SceneConfig {
            max_media_per_node: Some(2),
            ..SceneConfig::default()
        };
        let mut world = World::new(sample(), config);
        world.click("scanning");
        let ClickOutcome::Expanded { created, notice } = world.click("signals") else {
            panic!("expected expansion");
        };
        assert_eq!(created.len(), 2);
        assert_eq!(notice.map(|t| t.level), Some(ToastLevel::Warning));
    }

    #[test]
    fn unknown_nodes_are_errors() {
        let mut world = World::new(sample(), SceneConfig::default());
        let err = world
            .expansion
            .click(&"ghost".into(), &world.content, &mut world.store, &mut world.connections)
            .unwrap_err();
        assert_eq!(err, ExpansionError::UnknownNode("ghost".into()));
    }

    #[test]
    fn reveal_expands_the_lineage() {
        let mut world = World::new(sample(), SceneConfig::default());
        let target = NodeId::media(&"trends".into(), 3);
        let toasts = world
            .expansion
            .reveal(&target, &world.content, &mut world.store, &mut world.connections)
            .unwrap();
        assert!(toasts.is_empty());
        assert!(world.store.contains(&target));
        assert!(world.expansion.is_expanded(&"scanning".into()));
        assert!(world.expansion.is_expanded(&"trends".into()));
        world.assert_invariants();
    }
}
