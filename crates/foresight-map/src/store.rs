use foresight_scene::{
    Content, Scene, SceneConfig, SceneEvent, Toast, ToastLevel, TourEvent,
    TourOrchestrator,
};
use std::path::Path;

use crate::serialization;
use crate::versioned::Versioned;

/// Seconds a notice stays on screen.
pub const TOAST_SECONDS: f32 = 6.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveToast {
    pub toast: Toast,
    pub remaining: f32,
}

/// Everything the viewer shows, mutated only through `actions::update`.
pub struct Store {
    /// The content the scene was last built from.
    pub content: Versioned<Content>,
    pub scene: Scene,
    pub tour: TourOrchestrator,
    pub tour_caption: Option<String>,
    pub toasts: Vec<ActiveToast>,
    pub show_labels: bool,
    pub show_stats: bool,
    pub error_message: Option<String>,
}

impl Store {
    pub fn new(content: Content, config: SceneConfig) -> Result<Self, String> {
        let scene = Scene::new(content.clone(), config)
            .map_err(|e| format!("Failed to build scene: {e}"))?;
        Ok(Self {
            content: Versioned::new(content),
            scene,
            tour: TourOrchestrator::new(),
            tour_caption: None,
            toasts: Vec::new(),
            show_labels: true,
            show_stats: false,
            error_message: None,
        })
    }

    /// Rebuild the scene from new content, dropping all session state.
    pub fn apply_content(&mut self, content: Content) -> Result<(), String> {
        self.scene
            .rebuild(content.clone())
            .map_err(|e| format!("Failed to build scene: {e}"))?;
        self.content.set(content);
        self.tour.stop();
        self.tour_caption = None;
        self.toasts.clear();
        log::info!(
            "scene rebuilt from content `{}`",
            self.content.get().root.label
        );
        Ok(())
    }

    pub fn load_content_from_file(&mut self, path: &Path) -> Result<(), String> {
        let content = serialization::load_content(path)?;
        self.apply_content(content)
    }

    pub fn export_content_to_file(&self, path: &Path) -> Result<(), String> {
        serialization::save_content(self.content.get(), path)
    }

    pub fn push_toast(&mut self, toast: Toast) {
        match toast.level {
            ToastLevel::Warning => log::warn!("{}", toast.message),
            ToastLevel::Error => log::error!("{}", toast.message),
        }
        self.toasts.push(ActiveToast {
            toast,
            remaining: TOAST_SECONDS,
        });
    }

    pub fn age_toasts(&mut self, dt: f32) {
        for t in &mut self.toasts {
            t.remaining -= dt;
        }
        self.toasts.retain(|t| t.remaining > 0.0);
    }

    /// Move buffered scene events into UI state.
    pub fn absorb_scene_events(&mut self) {
        for event in self.scene.drain_events() {
            match event {
                SceneEvent::Toast(toast) => self.push_toast(toast),
                SceneEvent::NodeClicked(id) => log::debug!("clicked `{id}`"),
                SceneEvent::HoverChanged(_) => {}
                SceneEvent::FlightArrived(id) => log::debug!("camera settled on `{id}`"),
            }
        }
    }

    pub fn absorb_tour_events(&mut self, events: Vec<TourEvent>) {
        for event in events {
            match event {
                TourEvent::SegmentStarted { segment, .. } => {
                    self.tour_caption =
                        Some(segment.narration.unwrap_or(segment.title));
                }
                TourEvent::SegmentArrived { .. } => {}
                TourEvent::SegmentSkipped { node_id, reason, .. } => {
                    self.push_toast(Toast::warning(format!(
                        "Tour skipped `{node_id}`: {reason}"
                    )));
                }
                TourEvent::Interrupted { .. } | TourEvent::Finished => {
                    self.tour_caption = None;
                }
            }
        }
    }
}
