use glam::Vec3;

use crate::camera::{CameraRig, Pointer, pick};
use crate::config::{ConfigError, SceneConfig};
use crate::connections::ConnectionManager;
use crate::content::Content;
use crate::expansion::{ClickOutcome, ExpansionController, ExpansionError, Toast};
use crate::flight::{FlightCompletion, FlightController, FlightError, FlightPhase, FlightTick};
use crate::graph_store::NodeGraphStore;
use crate::node::{Level, NodeId, SceneNode};

/// Notifications for the UI layer, buffered until drained.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    NodeClicked(NodeId),
    HoverChanged(Option<NodeId>),
    Toast(Toast),
    FlightArrived(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneStats {
    pub live_nodes: usize,
    pub structural_connections: usize,
    pub cross_pillar_links: usize,
    pub expanded: usize,
    pub ceiling: usize,
    pub live_resources: usize,
    pub flight_phase: FlightPhase,
}

/// One explorable mind map: the content it was built from plus every
/// piece of live scene state.
///
/// All mutation goes through `&mut self`, from either an input handler
/// or [`Scene::frame`].
#[derive(Debug)]
pub struct Scene {
    content: Content,
    config: SceneConfig,
    store: NodeGraphStore,
    connections: ConnectionManager,
    expansion: ExpansionController,
    flight: FlightController,
    selected: Option<NodeId>,
    hovered: Option<NodeId>,
    /// Node whose cross-pillar links are currently shown.
    linked: Option<NodeId>,
    events: Vec<SceneEvent>,
}

impl Scene {
    pub fn new(content: Content, config: SceneConfig) -> Result<Self, SceneError> {
        config.validate()?;
        let mut scene = Self {
            store: NodeGraphStore::new(),
            connections: ConnectionManager::new(config.connections),
            expansion: ExpansionController::new(&config),
            flight: FlightController::new(config.flight),
            selected: None,
            hovered: None,
            linked: None,
            events: Vec::new(),
            content,
            config,
        };
        scene.bootstrap()?;
        Ok(scene)
    }

    /// Swap in new content and start over from the bootstrap layout.
    pub fn rebuild(&mut self, content: Content) -> Result<(), SceneError> {
        self.content = content;
        self.bootstrap()
    }

    fn bootstrap(&mut self) -> Result<(), SceneError> {
        self.flight.dispose();
        self.selected = None;
        self.hovered = None;
        self.linked = None;
        self.expansion
            .bootstrap(&self.content, &mut self.store, &mut self.connections)?;

        let reach = self.config.radii.pillar;
        self.flight.init(CameraRig::looking_at(
            Vec3::new(0.0, reach * 1.2, reach * 2.4),
            Vec3::ZERO,
        ));
        Ok(())
    }

    // --------------------------------------------------------------
    // Accessors
    // --------------------------------------------------------------

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn store(&self) -> &NodeGraphStore {
        &self.store
    }

    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    pub fn expansion(&self) -> &ExpansionController {
        &self.expansion
    }

    pub fn flight(&self) -> &FlightController {
        &self.flight
    }

    pub fn camera(&self) -> Option<&CameraRig> {
        self.flight.rig()
    }

    pub fn camera_mut(&mut self) -> Option<&mut CameraRig> {
        self.flight.rig_mut()
    }

    pub fn node(&self, id: &NodeId) -> Option<&SceneNode> {
        self.store.get(id)
    }

    pub fn selected(&self) -> Option<&NodeId> {
        self.selected.as_ref()
    }

    pub fn hovered(&self) -> Option<&NodeId> {
        self.hovered.as_ref()
    }

    pub fn stats(&self) -> SceneStats {
        SceneStats {
            live_nodes: self.store.len(),
            structural_connections: self.connections.structural_count(),
            cross_pillar_links: self.connections.cross_pillar().len(),
            expanded: self.expansion.expanded().count(),
            ceiling: self.expansion.ceiling(),
            live_resources: self.store.resources().live_count()
                + self.connections.resources().live_count(),
            flight_phase: self.flight.phase(),
        }
    }

    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    // --------------------------------------------------------------
    // Input
    // --------------------------------------------------------------

    /// Toggle expansion of a node and select it.
    pub fn click(&mut self, id: &NodeId) -> Result<ClickOutcome, SceneError> {
        let outcome = self.expansion.click(
            id,
            &self.content,
            &mut self.store,
            &mut self.connections,
        )?;
        self.events.push(SceneEvent::NodeClicked(id.clone()));

        match &outcome {
            ClickOutcome::Refused(toast)
            | ClickOutcome::Expanded {
                notice: Some(toast),
                ..
            } => self.events.push(SceneEvent::Toast(toast.clone())),
            ClickOutcome::Collapsed { removed } => self.forget(removed),
            _ => {}
        }
        if matches!(outcome, ClickOutcome::Expanded { .. }) {
            // new nodes may be link targets
            self.linked = None;
        }

        self.select(Some(id.clone()));
        Ok(outcome)
    }

    pub fn select(&mut self, id: Option<NodeId>) {
        self.selected = id.filter(|id| self.store.contains(id));
        self.refresh_links();
    }

    /// Make `id` live by expanding its ancestors. Notices become toast
    /// events; returns whether the node is live afterwards.
    pub fn reveal(&mut self, id: &NodeId) -> Result<bool, SceneError> {
        let toasts = self.expansion.reveal(
            id,
            &self.content,
            &mut self.store,
            &mut self.connections,
        )?;
        self.events
            .extend(toasts.into_iter().map(SceneEvent::Toast));
        self.linked = None;
        self.refresh_links();
        Ok(self.store.contains(id))
    }

    /// Fly the camera to a live node, lighting the edges around it until
    /// the flight lands.
    pub fn fly_to(&mut self, id: &NodeId) -> Result<FlightCompletion, SceneError> {
        let node = self
            .store
            .get(id)
            .ok_or_else(|| SceneError::UnknownNode(id.clone()))?;
        let completion = self.flight.fly_to(node)?;
        self.connections.set_active_lane(Some(id.clone()));
        Ok(completion)
    }

    // --------------------------------------------------------------
    // Frame
    // --------------------------------------------------------------

    /// Advance the scene by one animation frame.
    ///
    /// Runs the camera, then node appearance, then connection animation,
    /// then the hover test against `pointer`, in that order. Render after
    /// this returns.
    pub fn frame(&mut self, dt: f32, pointer: Option<Pointer>) -> Result<(), SceneError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(SceneError::InvalidFrameTime(dt));
        }

        if let FlightTick::Arrived(id) = self.flight.tick(dt) {
            self.connections.set_active_lane(None);
            self.events.push(SceneEvent::FlightArrived(id));
        }

        let appearance = self.config.appearance;
        let k = 1.0 - (-appearance.scale_rate * dt).exp();
        for node in self.store.iter_mut() {
            node.target_scale = if self.selected.as_ref() == Some(&node.id) {
                appearance.selected_scale
            } else if self.hovered.as_ref() == Some(&node.id) {
                appearance.hover_scale
            } else {
                1.0
            };
            node.scale += (node.target_scale - node.scale) * k;
        }

        self.connections.animate(self.selected.as_ref(), dt);

        let hit = pointer
            .and_then(|p| p.resolve(self.flight.rig()))
            .and_then(|ray| pick(&ray, self.store.iter()))
            .map(|node| node.id.clone());
        if hit != self.hovered {
            self.hovered = hit;
            self.events
                .push(SceneEvent::HoverChanged(self.hovered.clone()));
            self.refresh_links();
        }
        Ok(())
    }

    // --------------------------------------------------------------
    // Helpers
    // --------------------------------------------------------------

    /// Drop references to nodes that no longer exist.
    fn forget(&mut self, removed: &[NodeId]) {
        if self.selected.as_ref().is_some_and(|s| removed.contains(s)) {
            self.selected = None;
        }
        if self.hovered.as_ref().is_some_and(|h| removed.contains(h)) {
            self.hovered = None;
            self.events.push(SceneEvent::HoverChanged(None));
        }
        let dangling_link = self
            .connections
            .cross_pillar()
            .iter()
            .any(|link| removed.contains(&link.to_id));
        if dangling_link || self.linked.as_ref().is_some_and(|l| removed.contains(l)) {
            self.connections.remove_cross_pillar_connections();
            self.linked = None;
        }
        if self
            .flight
            .target()
            .is_some_and(|t| removed.contains(&t.node_id))
        {
            log::info!("flight target was collapsed away; flight cancelled");
            self.flight.dispose();
        }
        if self
            .connections
            .active_lane()
            .is_some_and(|lane| removed.contains(lane))
        {
            self.connections.set_active_lane(None);
        }
    }

    /// Recompute the cross-pillar links for the hovered or selected node.
    fn refresh_links(&mut self) {
        let focus = self.hovered.clone().or_else(|| self.selected.clone());
        if focus == self.linked && self.linked.is_some() {
            return;
        }
        self.connections.remove_cross_pillar_connections();
        self.linked = focus;

        let Some(node) = self.linked.as_ref().and_then(|id| self.store.get(id)) else {
            return;
        };
        if node.level != Level::Methodology {
            return;
        }
        let targets: Vec<&SceneNode> = node
            .payload
            .related()
            .iter()
            .filter_map(|id| self.store.get(id))
            .filter(|target| target.parent() != node.parent())
            .collect();
        if !targets.is_empty() {
            let count = self
                .connections
                .create_cross_pillar_connections(node, &targets);
            log::debug!("linked `{}` to {count} related nodes", node.id);
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    #[error("no live node `{0}`")]
    UnknownNode(NodeId),
    #[error("frame time must be finite and non-negative, got {0}")]
    InvalidFrameTime(f32),
    #[error(transparent)]
    Expansion(#[from] ExpansionError),
    #[error(transparent)]
    Flight(#[from] FlightError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
