use std::collections::{HashMap, HashSet, VecDeque};

use crate::node::{NewNode, NodeId, SceneNode};
use crate::resources::ResourcePool;

/// Authoritative collection of live scene nodes.
///
/// Nodes keep only their parent id; the store maintains the reverse
/// `parent -> children` index so child lookup does not scan every node.
#[derive(Debug, Default)]
pub struct NodeGraphStore {
    nodes: Vec<SceneNode>,
    index: HashMap<NodeId, usize>,
    children: HashMap<NodeId, Vec<NodeId>>,
    resources: ResourcePool,
}

impl NodeGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node and allocate its resources.
    ///
    /// A live node with the same id is never overwritten; the insert is
    /// rejected before anything is allocated.
    pub fn add_node(&mut self, node: NewNode) -> Result<&SceneNode, GraphError> {
        if self.index.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        if let Some(parent) = &node.parent {
            self.children
                .entry(parent.clone())
                .or_default()
                .push(node.id.clone());
        }
        let slot = self.nodes.len();
        self.index.insert(node.id.clone(), slot);
        self.nodes
            .push(SceneNode::materialize(node, &mut self.resources));
        Ok(&self.nodes[slot])
    }

    pub fn get(&self, id: &NodeId) -> Option<&SceneNode> {
        self.index.get(id).map(|&slot| &self.nodes[slot])
    }

    pub fn get_mut(&mut self, id: &NodeId) -> Option<&mut SceneNode> {
        let slot = *self.index.get(id)?;
        self.nodes.get_mut(slot)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Live nodes that have a parent, i.e. that own an inbound edge.
    pub fn non_root_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.parent().is_some()).count()
    }

    /// Live nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &SceneNode> + '_ {
        self.nodes.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SceneNode> + '_ {
        self.nodes.iter_mut()
    }

    /// Direct children of `id`, in insertion order.
    pub fn children_of(&self, id: &NodeId) -> &[NodeId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn resources(&self) -> &ResourcePool {
        &self.resources
    }

    /// Every transitive child of `id`, breadth first.
    ///
    /// Uses an explicit worklist so deep hierarchies cannot exhaust the
    /// stack. A child that was already visited means the parent links
    /// loop; the walk skips it and stays finite.
    pub fn find_descendant_ids(&self, id: &NodeId) -> Vec<NodeId> {
        let mut visited: HashSet<&NodeId> = HashSet::from([id]);
        let mut queue: VecDeque<&NodeId> = VecDeque::from([id]);
        let mut found = Vec::new();

        while let Some(current) = queue.pop_front() {
            for child in self.children_of(current) {
                if !visited.insert(child) {
                    log::warn!(
                        "parent links loop back to `{child}` below `{id}`"
                    );
                    continue;
                }
                found.push(child.clone());
                queue.push_back(child);
            }
        }

        found
    }

    /// Remove every descendant of `id` (but not `id` itself).
    ///
    /// Each removed node's resources are released exactly once. Returns
    /// the removed ids in breadth-first order so callers can prune
    /// whatever else refers to them.
    pub fn remove_subtree(&mut self, id: &NodeId) -> Vec<NodeId> {
        let removed = self.find_descendant_ids(id);
        if removed.is_empty() {
            return removed;
        }
        let doomed: HashSet<&NodeId> = removed.iter().collect();

        let mut kept = Vec::with_capacity(self.nodes.len() - removed.len());
        for node in std::mem::take(&mut self.nodes) {
            if !doomed.contains(&node.id) {
                kept.push(node);
                continue;
            }
            if let Some(parent) = node.parent()
                && !doomed.contains(parent)
                && let Some(siblings) = self.children.get_mut(parent)
            {
                siblings.retain(|c| c != &node.id);
                if siblings.is_empty() {
                    self.children.remove(parent);
                }
            }
            self.children.remove(&node.id);
            node.dispose(&mut self.resources);
        }
        self.nodes = kept;
        self.reindex();

        log::debug!("removed {} nodes below `{id}`", removed.len());
        removed
    }

    /// Dispose every live node.
    pub fn clear(&mut self) {
        for node in std::mem::take(&mut self.nodes) {
            node.dispose(&mut self.resources);
        }
        self.index.clear();
        self.children.clear();
    }

    /// Number of parent hops from `id` up to a parentless node.
    ///
    /// A hop to a parent that is not live counts and ends the walk, as
    /// does reaching a node already seen on this walk. `None` when `id`
    /// itself is not live.
    pub fn depth(&self, id: &NodeId) -> Option<usize> {
        let mut node = self.get(id)?;
        let mut visited: HashSet<&NodeId> = HashSet::from([id]);
        let mut depth = 0;

        while let Some(parent) = node.parent() {
            if !visited.insert(parent) {
                log::warn!("parent chain of `{id}` loops at `{parent}`");
                break;
            }
            depth += 1;
            match self.get(parent) {
                Some(next) => node = next,
                None => break,
            }
        }

        Some(depth)
    }

    fn reindex(&mut self) {
        self.index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(slot, node)| (node.id.clone(), slot))
            .collect();
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("a live node with id `{0}` already exists")]
    DuplicateNode(NodeId),
}
