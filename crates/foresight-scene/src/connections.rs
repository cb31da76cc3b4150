use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

use crate::color::Rgb;
use crate::config::ConnectionStyle;
use crate::node::{NodeId, SceneNode};
use crate::resources::{ResourceHandle, ResourceKind, ResourcePool};

// ------------------------------------------------------------------
// Particle flow
// ------------------------------------------------------------------

/// Small particles sliding from parent to child along an edge.
#[derive(Debug, Clone)]
pub struct ParticleFlow {
    /// Progress of each particle along the edge, in [0, 1).
    phases: Vec<f32>,
    speed: f32,
}

impl ParticleFlow {
    fn seeded(count: usize, speed: f32, rng: &mut StdRng) -> Self {
        let phases = (0..count).map(|_| rng.random::<f32>()).collect();
        Self { phases, speed }
    }

    pub fn advance(&mut self, dt: f32) {
        for phase in &mut self.phases {
            *phase = (*phase + self.speed * dt).rem_euclid(1.0);
        }
    }

    pub fn phases(&self) -> &[f32] {
        &self.phases
    }

    pub fn positions(&self, from: Vec3, to: Vec3) -> impl Iterator<Item = Vec3> + '_ {
        self.phases.iter().map(move |&t| from.lerp(to, t))
    }
}

// ------------------------------------------------------------------
// Edges
// ------------------------------------------------------------------

#[derive(Debug)]
struct EdgeResources {
    line: ResourceHandle,
    particles: ResourceHandle,
}

/// Structural edge between a parent and one of its children.
#[derive(Debug)]
pub struct Connection {
    pub parent_id: NodeId,
    pub child_id: NodeId,
    pub from: Vec3,
    pub to: Vec3,
    pub color: Rgb,
    pub resting_opacity: f32,
    pub opacity: f32,
    /// 0 when idle, 1 when fully highlighted.
    pub glow: f32,
    pub particles: ParticleFlow,
    resources: EdgeResources,
}

impl Connection {
    pub fn touches(&self, id: &NodeId) -> bool {
        &self.parent_id == id || &self.child_id == id
    }
}

/// Transient link between related methodologies in different pillars.
#[derive(Debug)]
pub struct CrossPillarLink {
    pub from_id: NodeId,
    pub to_id: NodeId,
    pub from: Vec3,
    pub to: Vec3,
    pub color: Rgb,
    pub opacity: f32,
    line: ResourceHandle,
}

/// Owns every edge line in the scene.
///
/// Structural edges and cross-pillar links live in separate lists so
/// that recomputing the transient links never touches the tree edges.
#[derive(Debug)]
pub struct ConnectionManager {
    structural: Vec<Connection>,
    cross_pillar: Vec<CrossPillarLink>,
    active_lane: Option<NodeId>,
    style: ConnectionStyle,
    rng: StdRng,
    resources: ResourcePool,
}

impl ConnectionManager {
    pub fn new(style: ConnectionStyle) -> Self {
        Self {
            structural: Vec::new(),
            cross_pillar: Vec::new(),
            active_lane: None,
            rng: StdRng::seed_from_u64(style.particle_seed),
            style,
            resources: ResourcePool::new(),
        }
    }

    pub fn style(&self) -> &ConnectionStyle {
        &self.style
    }

    pub fn create_connection(
        &mut self,
        from: Vec3,
        to: Vec3,
        color: Rgb,
        opacity: f32,
        parent_id: NodeId,
        child_id: NodeId,
    ) -> Result<(), ConnectionError> {
        let exists = self
            .structural
            .iter()
            .any(|c| c.parent_id == parent_id && c.child_id == child_id);
        if exists {
            return Err(ConnectionError::DuplicateConnection {
                parent: parent_id,
                child: child_id,
            });
        }

        let particles = ParticleFlow::seeded(
            self.style.particles_per_connection,
            self.style.particle_speed,
            &mut self.rng,
        );
        let resources = EdgeResources {
            line: self.resources.allocate(ResourceKind::Line),
            particles: self.resources.allocate(ResourceKind::ParticleSprite),
        };
        self.structural.push(Connection {
            parent_id,
            child_id,
            from,
            to,
            color,
            resting_opacity: opacity,
            opacity,
            glow: 0.0,
            particles,
            resources,
        });
        Ok(())
    }

    /// Drop every structural edge with an endpoint in `removed`.
    pub fn remove_connections_for_ids(&mut self, removed: &[NodeId]) -> usize {
        if removed.is_empty() {
            return 0;
        }
        let removed: HashSet<&NodeId> = removed.iter().collect();
        let before = self.structural.len();

        let mut kept = Vec::with_capacity(before);
        for connection in std::mem::take(&mut self.structural) {
            if removed.contains(&connection.parent_id)
                || removed.contains(&connection.child_id)
            {
                self.resources.release(connection.resources.line);
                self.resources.release(connection.resources.particles);
            } else {
                kept.push(connection);
            }
        }
        self.structural = kept;
        before - self.structural.len()
    }

    /// Edges touching this node stay lit until the lane is cleared.
    pub fn set_active_lane(&mut self, lane: Option<NodeId>) {
        self.active_lane = lane;
    }

    pub fn active_lane(&self) -> Option<&NodeId> {
        self.active_lane.as_ref()
    }

    /// Ease every edge toward its highlight target and move particles.
    ///
    /// The approach is exponential in `dt`, so the fade looks the same at
    /// any frame rate and never snaps.
    pub fn animate(&mut self, active: Option<&NodeId>, dt: f32) {
        let k = 1.0 - (-self.style.fade_rate * dt.max(0.0)).exp();
        let lane = self.active_lane.as_ref();

        for c in &mut self.structural {
            let lit = active.is_some_and(|id| c.touches(id))
                || lane.is_some_and(|id| c.touches(id));
            let (target_opacity, target_glow) = if lit {
                (self.style.active_opacity, 1.0)
            } else {
                (c.resting_opacity, 0.0)
            };
            c.opacity += (target_opacity - c.opacity) * k;
            c.glow += (target_glow - c.glow) * k;
            c.particles.advance(dt * (1.0 + c.glow));
        }

        for link in &mut self.cross_pillar {
            link.opacity +=
                (self.style.cross_pillar_opacity - link.opacity) * k;
        }
    }

    /// Replace the transient links with ones from `focus` to `targets`.
    pub fn create_cross_pillar_connections(
        &mut self,
        focus: &SceneNode,
        targets: &[&SceneNode],
    ) -> usize {
        self.remove_cross_pillar_connections();
        for target in targets {
            if target.id == focus.id {
                continue;
            }
            self.cross_pillar.push(CrossPillarLink {
                from_id: focus.id.clone(),
                to_id: target.id.clone(),
                from: focus.position,
                to: target.position,
                color: focus.color.lerp(target.color, 0.5),
                opacity: 0.0,
                line: self.resources.allocate(ResourceKind::Line),
            });
        }
        self.cross_pillar.len()
    }

    pub fn remove_cross_pillar_connections(&mut self) -> usize {
        let count = self.cross_pillar.len();
        for link in self.cross_pillar.drain(..) {
            self.resources.release(link.line);
        }
        count
    }

    /// Dispose everything, structural and transient.
    pub fn clear(&mut self) {
        self.remove_cross_pillar_connections();
        for c in std::mem::take(&mut self.structural) {
            self.resources.release(c.resources.line);
            self.resources.release(c.resources.particles);
        }
        self.active_lane = None;
    }

    pub fn structural(&self) -> &[Connection] {
        &self.structural
    }

    pub fn structural_count(&self) -> usize {
        self.structural.len()
    }

    pub fn cross_pillar(&self) -> &[CrossPillarLink] {
        &self.cross_pillar
    }

    pub fn resources(&self) -> &ResourcePool {
        &self.resources
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConnectionError {
    #[error("a connection `{parent}` -> `{child}` already exists")]
    DuplicateConnection { parent: NodeId, child: NodeId },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_store::NodeGraphStore;
    use crate::node::{Level, NewNode, NodePayload};

    fn manager_with_edges(pairs: &[(&str, &str)]) -> ConnectionManager {
        let mut m = ConnectionManager::new(ConnectionStyle::default());
        for (parent, child) in pairs {
            m.create_connection(
                Vec3::ZERO,
                Vec3::X,
                Rgb::WHITE,
                0.3,
                (*parent).into(),
                (*child).into(),
            )
            .unwrap();
        }
        m
    }

    #[test]
    fn duplicate_pair_is_rejected() {
        let mut m = manager_with_edges(&[("p", "a")]);
        let err = m
            .create_connection(Vec3::ZERO, Vec3::X, Rgb::WHITE, 0.3, "p".into(), "a".into())
            .unwrap_err();
        assert!(matches!(err, ConnectionError::DuplicateConnection { .. }));
        assert_eq!(m.structural_count(), 1);
    }

    #[test]
    fn removal_matches_either_endpoint_and_releases_resources() {
        let mut m = manager_with_edges(&[("p", "a"), ("a", "x"), ("p", "b")]);
        assert_eq!(m.resources().live_count(), 6);

        let removed = m.remove_connections_for_ids(&["a".into(), "x".into()]);
        assert_eq!(removed, 2);
        assert_eq!(m.structural_count(), 1);
        assert_eq!(m.structural()[0].child_id.as_str(), "b");
        assert_eq!(m.resources().live_count(), 2);
    }

    #[test]
    fn highlight_fades_instead_of_snapping() {
        let mut m = manager_with_edges(&[("p", "a"), ("q", "b")]);
        let active = NodeId::from("a");

        m.animate(Some(&active), 1.0 / 60.0);
        let lit = &m.structural()[0];
        assert!(lit.opacity > 0.3 && lit.opacity < 0.95, "{}", lit.opacity);
        assert_eq!(m.structural()[1].opacity, 0.3);

        for _ in 0..240 {
            m.animate(Some(&active), 1.0 / 60.0);
        }
        assert!((m.structural()[0].opacity - 0.95).abs() < 1e-3);

        for _ in 0..240 {
            m.animate(None, 1.0 / 60.0);
        }
        assert!((m.structural()[0].opacity - 0.3).abs() < 1e-3);
        assert!(m.structural()[0].glow < 1e-3);
    }

    #[test]
    fn active_lane_lights_edges_without_a_selection() {
        let mut m = manager_with_edges(&[("p", "a"), ("q", "b")]);
        m.set_active_lane(Some("b".into()));
        for _ in 0..120 {
            m.animate(None, 1.0 / 60.0);
        }
        assert!(m.structural()[1].glow > 0.9);
        assert!(m.structural()[0].glow < 1e-3);
    }

    #[test]
    fn particles_stay_on_the_edge() {
        let mut m = manager_with_edges(&[("p", "a")]);
        for _ in 0..500 {
            m.animate(None, 0.05);
        }
        let c = &m.structural()[0];
        assert_eq!(c.particles.phases().len(), 3);
        for p in c.particles.positions(c.from, c.to) {
            assert!((0.0..=1.0).contains(&p.x));
        }
    }

    #[test]
    fn cross_pillar_links_are_tracked_separately() {
        let mut store = NodeGraphStore::new();
        for (id, x) in [("m1", 0.0), ("m2", 10.0), ("m3", 20.0)] {
            store
                .add_node(NewNode {
                    id: id.into(),
                    parent: None,
                    level: Level::Methodology,
                    position: Vec3::new(x, 0.0, 0.0),
                    color: Rgb::WHITE,
                    payload: NodePayload::Center {
                        label: id.into(),
                        media: vec![],
                    },
                })
                .unwrap();
        }
        let focus = store.get(&"m1".into()).unwrap();
        let targets = [
            store.get(&"m2".into()).unwrap(),
            store.get(&"m3".into()).unwrap(),
        ];

        let mut m = manager_with_edges(&[("m1", "child")]);
        assert_eq!(m.create_cross_pillar_connections(focus, &targets), 2);
        assert_eq!(m.create_cross_pillar_connections(focus, &targets[..1]), 1);

        m.remove_connections_for_ids(&["m1".into()]);
        assert_eq!(m.structural_count(), 0);
        assert_eq!(m.cross_pillar().len(), 1);

        assert_eq!(m.remove_cross_pillar_connections(), 1);
        assert_eq!(m.resources().live_count(), 0);
    }
}
