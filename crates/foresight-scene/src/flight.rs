use futures::channel::oneshot;
use glam::Vec3;

use crate::camera::CameraRig;
use crate::config::FlightConfig;
use crate::node::{NodeId, SceneNode};
use crate::path::{CatmullRomPath, ease_in_out_cubic};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightPhase {
    /// Idle; the user owns the camera.
    Orbiting,
    Departing,
    InTransit,
    Arriving,
}

/// How a flight's completion was settled. Every variant is a resolution,
/// never an error: callers awaiting a flight always wake up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightOutcome {
    Arrived,
    /// A newer flight replaced this one before it arrived.
    Superseded,
    /// The controller was disposed mid-flight.
    Cancelled,
}

/// Resolves once, when the flight that produced it settles.
pub type FlightCompletion = oneshot::Receiver<FlightOutcome>;

#[derive(Debug, Clone, PartialEq)]
pub struct FlightTarget {
    pub node_id: NodeId,
    pub position: Vec3,
}

impl From<&SceneNode> for FlightTarget {
    fn from(node: &SceneNode) -> Self {
        Self {
            node_id: node.id.clone(),
            position: node.position,
        }
    }
}

/// What a single `tick` did.
#[derive(Debug, Clone, PartialEq)]
pub enum FlightTick {
    Idle,
    Moving(FlightPhase),
    /// The flight to this node finished during the tick.
    Arrived(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Pose {
    position: Vec3,
    look_at: Vec3,
}

impl Pose {
    fn lerp(self, other: Pose, t: f32) -> Pose {
        Pose {
            position: self.position.lerp(other.position, t),
            look_at: self.look_at.lerp(other.look_at, t),
        }
    }
}

#[derive(Debug)]
struct ActiveFlight {
    target: FlightTarget,
    start: Pose,
    /// Path followed by the camera focus, not the camera itself.
    path: CatmullRomPath,
    /// Horizontal unit vector from the focus toward where the camera trails.
    trail_dir: Vec3,
    transit_duration: f32,
    completion: Option<oneshot::Sender<FlightOutcome>>,
}

/// Drives the camera through DEPARTING → IN_TRANSIT → ARRIVING.
///
/// Poses are recomputed from eased phase progress on every tick, and
/// time left over at a phase boundary flows into the next phase, so a
/// flight lasts exactly its planned duration whatever the frame rate.
#[derive(Debug)]
pub struct FlightController {
    config: FlightConfig,
    rig: Option<CameraRig>,
    phase: FlightPhase,
    elapsed: f32,
    active: Option<ActiveFlight>,
}

impl FlightController {
    pub fn new(config: FlightConfig) -> Self {
        Self {
            config,
            rig: None,
            phase: FlightPhase::Orbiting,
            elapsed: 0.0,
            active: None,
        }
    }

    /// Bind the camera and controls the controller will drive.
    pub fn init(&mut self, rig: CameraRig) {
        if self.rig.is_some() {
            log::debug!("flight controller re-bound to a new camera");
        }
        self.rig = Some(rig);
    }

    pub fn config(&self) -> &FlightConfig {
        &self.config
    }

    pub fn phase(&self) -> FlightPhase {
        self.phase
    }

    pub fn is_flying(&self) -> bool {
        self.active.is_some()
    }

    pub fn target(&self) -> Option<&FlightTarget> {
        self.active.as_ref().map(|f| &f.target)
    }

    pub fn rig(&self) -> Option<&CameraRig> {
        self.rig.as_ref()
    }

    pub fn rig_mut(&mut self) -> Option<&mut CameraRig> {
        self.rig.as_mut()
    }

    /// Planned DEPARTING + IN_TRANSIT + ARRIVING time of the active flight.
    pub fn planned_duration(&self) -> Option<f32> {
        self.active
            .as_ref()
            .map(|f| self.config.phase_overhead() + f.transit_duration)
    }

    /// Start flying toward `target`.
    ///
    /// Any flight already under way is resolved as `Superseded` first.
    /// Fails immediately when no camera has been bound.
    pub fn fly_to(
        &mut self,
        target: impl Into<FlightTarget>,
    ) -> Result<FlightCompletion, FlightError> {
        let target = target.into();
        let Some(rig) = self.rig.as_mut() else {
            return Err(FlightError::NotInitialized);
        };

        if let Some(previous) = self.active.take() {
            log::debug!(
                "flight to `{}` superseded by `{}`",
                previous.target.node_id,
                target.node_id
            );
            settle(previous, FlightOutcome::Superseded);
        }

        let start = Pose {
            position: rig.position,
            look_at: rig.look_at,
        };
        let source = rig.look_at;
        let distance = source.distance(target.position);
        let path = CatmullRomPath::arc(
            source,
            target.position,
            distance * self.config.arc_height_factor,
        );
        let trail_dir = horizontal(source - target.position)
            .or_else(|| horizontal(rig.position - rig.look_at))
            .unwrap_or(Vec3::Z);
        let transit_duration = self.config.transit_duration(distance);

        rig.controls.enabled = false;
        let (tx, rx) = oneshot::channel();
        self.active = Some(ActiveFlight {
            target,
            start,
            path,
            trail_dir,
            transit_duration,
            completion: Some(tx),
        });
        self.phase = FlightPhase::Departing;
        self.elapsed = 0.0;
        Ok(rx)
    }

    /// Advance the active flight by `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> FlightTick {
        let (Some(rig), Some(flight)) = (self.rig.as_mut(), self.active.as_ref())
        else {
            return FlightTick::Idle;
        };

        let mut remaining = dt.max(0.0);
        loop {
            let duration = match self.phase {
                FlightPhase::Departing => self.config.depart_duration,
                FlightPhase::InTransit => flight.transit_duration,
                FlightPhase::Arriving => self.config.arrive_duration,
                FlightPhase::Orbiting => return FlightTick::Idle,
            };

            let left = duration - self.elapsed;
            if remaining < left {
                self.elapsed += remaining;
                let pose = pose_at(&self.config, flight, self.phase, self.elapsed / duration);
                apply(rig, pose);
                return FlightTick::Moving(self.phase);
            }

            remaining -= left;
            apply(rig, pose_at(&self.config, flight, self.phase, 1.0));
            self.elapsed = 0.0;
            self.phase = match self.phase {
                FlightPhase::Departing => FlightPhase::InTransit,
                FlightPhase::InTransit => FlightPhase::Arriving,
                _ => break,
            };
        }

        self.phase = FlightPhase::Orbiting;
        let Some(flight) = self.active.take() else {
            return FlightTick::Idle;
        };
        rig.controls.target = flight.target.position;
        rig.controls.enabled = true;
        let node_id = flight.target.node_id.clone();
        log::debug!("arrived at `{node_id}`");
        settle(flight, FlightOutcome::Arrived);
        FlightTick::Arrived(node_id)
    }

    /// Cancel any flight and hand the camera back to the user.
    pub fn dispose(&mut self) {
        if let Some(flight) = self.active.take() {
            settle(flight, FlightOutcome::Cancelled);
        }
        self.phase = FlightPhase::Orbiting;
        self.elapsed = 0.0;
        if let Some(rig) = self.rig.as_mut() {
            rig.controls.target = rig.look_at;
            rig.controls.enabled = true;
        }
    }
}

impl Drop for FlightController {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn settle(mut flight: ActiveFlight, outcome: FlightOutcome) {
    if let Some(tx) = flight.completion.take() {
        // The caller may have stopped listening; that is fine.
        let _ = tx.send(outcome);
    }
}

fn apply(rig: &mut CameraRig, pose: Pose) {
    rig.position = pose.position;
    rig.look_at = pose.look_at;
}

fn horizontal(v: Vec3) -> Option<Vec3> {
    Vec3::new(v.x, 0.0, v.z).try_normalize()
}

/// Camera trailing `focus` by `distance`, raised by the elevation ratio.
fn trail(config: &FlightConfig, flight: &ActiveFlight, focus: Vec3, distance: f32) -> Pose {
    Pose {
        position: focus
            + flight.trail_dir * distance
            + Vec3::Y * distance * config.elevation_ratio,
        look_at: focus,
    }
}

fn pose_at(
    config: &FlightConfig,
    flight: &ActiveFlight,
    phase: FlightPhase,
    t: f32,
) -> Pose {
    let e = ease_in_out_cubic(t);
    let target = flight.target.position;
    match phase {
        FlightPhase::Orbiting => flight.start,
        FlightPhase::Departing => {
            let transit_start =
                trail(config, flight, flight.path.point(0.0), config.far_approach_distance);
            flight.start.lerp(transit_start, e)
        }
        FlightPhase::InTransit => {
            let distance = config.far_approach_distance
                + (config.orbit_distance - config.far_approach_distance) * e;
            trail(config, flight, flight.path.point(e), distance)
        }
        FlightPhase::Arriving => {
            let from = trail(config, flight, target, config.orbit_distance);
            let settled = Pose {
                position: target
                    + flight.trail_dir * config.orbit_distance
                    + Vec3::Y * config.orbit_distance * config.elevation_ratio * 0.5,
                look_at: target,
            };
            from.lerp(settled, e)
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum FlightError {
    #[error("flight requested before a camera was bound")]
    NotInitialized,
}
