use serde::{Deserialize, Serialize};

use crate::content::Content;
use crate::flight::{FlightCompletion, FlightOutcome};
use crate::node::NodeId;
use crate::scene::Scene;

fn default_dwell() -> f32 {
    3.0
}

/// One stop of a guided tour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourSegment {
    #[serde(alias = "nodeId")]
    pub node_id: NodeId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
    /// Seconds to linger after arriving.
    #[serde(default = "default_dwell")]
    pub dwell_secs: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TourEvent {
    SegmentStarted { index: usize, segment: TourSegment },
    SegmentArrived { index: usize, node_id: NodeId },
    SegmentSkipped { index: usize, node_id: NodeId, reason: String },
    /// Another flight took the camera; the tour stopped.
    Interrupted { index: usize },
    Finished,
}

#[derive(Debug, Default)]
enum Step {
    #[default]
    Idle,
    Starting,
    Travelling(FlightCompletion),
    Dwelling(f32),
}

/// Plays a list of segments: reveal the target, fly to it, dwell, next.
#[derive(Debug, Default)]
pub struct TourOrchestrator {
    segments: Vec<TourSegment>,
    index: usize,
    step: Step,
}

impl TourOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, segments: Vec<TourSegment>) {
        log::info!("tour started with {} segments", segments.len());
        self.segments = segments;
        self.index = 0;
        self.step = Step::Starting;
    }

    /// Stop playback. The camera keeps whatever flight it is on.
    pub fn stop(&mut self) {
        if self.is_running() {
            log::info!("tour stopped at segment {}", self.index);
        }
        self.step = Step::Idle;
    }

    pub fn is_running(&self) -> bool {
        !matches!(self.step, Step::Idle)
    }

    pub fn current(&self) -> Option<&TourSegment> {
        if self.is_running() {
            self.segments.get(self.index)
        } else {
            None
        }
    }

    /// `(current index, segment count)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.index, self.segments.len())
    }

    /// Drive the tour by one frame. Call after [`Scene::frame`].
    pub fn poll(&mut self, scene: &mut Scene, dt: f32) -> Vec<TourEvent> {
        let mut events = Vec::new();
        loop {
            match std::mem::take(&mut self.step) {
                Step::Idle => return events,
                Step::Starting => {
                    let Some(segment) = self.segments.get(self.index).cloned() else {
                        log::info!("tour finished");
                        events.push(TourEvent::Finished);
                        return events;
                    };
                    let index = self.index;
                    let node_id = segment.node_id.clone();
                    events.push(TourEvent::SegmentStarted { index, segment });

                    match begin(scene, &node_id) {
                        Ok(completion) => {
                            self.step = Step::Travelling(completion);
                            return events;
                        }
                        Err(reason) => {
                            log::warn!("tour skipped `{node_id}`: {reason}");
                            events.push(TourEvent::SegmentSkipped {
                                index,
                                node_id,
                                reason,
                            });
                            self.index += 1;
                            self.step = Step::Starting;
                        }
                    }
                }
                Step::Travelling(mut completion) => match completion.try_recv() {
                    Ok(None) => {
                        self.step = Step::Travelling(completion);
                        return events;
                    }
                    Ok(Some(FlightOutcome::Arrived)) => {
                        let node_id = self.segments[self.index].node_id.clone();
                        let dwell = self.segments[self.index].dwell_secs.max(0.0);
                        events.push(TourEvent::SegmentArrived {
                            index: self.index,
                            node_id,
                        });
                        self.step = Step::Dwelling(dwell);
                        return events;
                    }
                    Ok(Some(_)) | Err(_) => {
                        log::info!("tour interrupted at segment {}", self.index);
                        events.push(TourEvent::Interrupted { index: self.index });
                        return events;
                    }
                },
                Step::Dwelling(left) => {
                    let left = left - dt;
                    if left > 0.0 {
                        self.step = Step::Dwelling(left);
                        return events;
                    }
                    self.index += 1;
                    self.step = Step::Starting;
                }
            }
        }
    }
}

fn begin(scene: &mut Scene, node_id: &NodeId) -> Result<FlightCompletion, String> {
    match scene.reveal(node_id) {
        Ok(true) => {}
        Ok(false) => return Err("node could not be shown".into()),
        Err(e) => return Err(e.to_string()),
    }
    let completion = scene.fly_to(node_id).map_err(|e| e.to_string())?;
    scene.select(Some(node_id.clone()));
    Ok(completion)
}

/// The content's own tour, or the center followed by each pillar and its
/// first methodology.
pub fn default_plan(content: &Content) -> Vec<TourSegment> {
    if !content.tour.is_empty() {
        return content.tour.clone();
    }

    let stop = |id: &NodeId, title: &str| TourSegment {
        node_id: id.clone(),
        title: title.to_string(),
        narration: None,
        dwell_secs: default_dwell(),
    };

    let mut plan = vec![stop(&content.root.id, &content.root.label)];
    for pillar in &content.pillars {
        plan.push(stop(&pillar.id, &pillar.label));
        if let Some(first) = pillar
            .children
            .first()
            .and_then(|id| content.methodology(id))
        {
            plan.push(stop(&first.id, &first.label));
        }
    }
    plan
}
