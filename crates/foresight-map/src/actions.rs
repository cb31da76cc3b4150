use foresight_scene::{ClickOutcome, NodeId, Pointer, Toast, TourSegment};
use std::path::PathBuf;

use crate::effects::Effect;
use crate::serialization;
use crate::store::Store;

/// Everything the UI can ask of the store.
#[derive(Debug, Clone)]
pub enum Action {
    // Scene
    /// Toggle a node's children and fly to it
    ClickNode { id: NodeId },
    /// Fly to a node without changing what is expanded
    FlyTo { id: NodeId },
    SelectNode { id: Option<NodeId> },
    /// Advance the scene; `pointer` is where the mouse was last seen
    Frame { dt: f32, pointer: Option<Pointer> },

    // Camera
    Orbit { yaw: f32, pitch: f32 },
    Zoom { factor: f32 },

    // Tour
    StartTour { segments: Vec<TourSegment> },
    StopTour,

    // UI state
    SetShowLabels { show: bool },
    SetShowStats { show: bool },
    DismissToast { index: usize },
    ClearErrorMessage,

    // Content
    /// Load content from a file on disk
    LoadContent { path: PathBuf },
    /// Load content already read into memory (browser uploads)
    LoadContentJson { json: String },
    ExportContent { path: PathBuf },
    ResetToBundledContent,
}

/// Apply a single action to the store
pub fn update(store: &mut Store, action: Action) -> Vec<Effect> {
    match action {
        Action::ClickNode { id } => {
            match store.scene.click(&id) {
                Ok(ClickOutcome::Refused(_)) => {}
                Ok(_) => fly(store, &id),
                Err(e) => store.push_toast(Toast::error(e.to_string())),
            }
            store.absorb_scene_events();
            vec![]
        }
        Action::FlyTo { id } => {
            fly(store, &id);
            vec![]
        }
        Action::SelectNode { id } => {
            store.scene.select(id);
            vec![]
        }
        Action::Frame { dt, pointer } => {
            if let Err(e) = store.scene.frame(dt, pointer) {
                log::error!("frame skipped: {e}");
            }
            let events = store.tour.poll(&mut store.scene, dt);
            store.absorb_tour_events(events);
            store.absorb_scene_events();
            store.age_toasts(dt);
            vec![]
        }

        Action::Orbit { yaw, pitch } => {
            if let Some(rig) = store.scene.camera_mut() {
                rig.orbit(yaw, pitch);
            }
            vec![]
        }
        Action::Zoom { factor } => {
            if let Some(rig) = store.scene.camera_mut() {
                rig.zoom(factor);
            }
            vec![]
        }

        Action::StartTour { segments } => {
            store.tour.start(segments);
            vec![]
        }
        Action::StopTour => {
            store.tour.stop();
            store.tour_caption = None;
            vec![]
        }

        Action::SetShowLabels { show } => {
            store.show_labels = show;
            vec![]
        }
        Action::SetShowStats { show } => {
            store.show_stats = show;
            vec![]
        }
        Action::DismissToast { index } => {
            if index < store.toasts.len() {
                store.toasts.remove(index);
            }
            vec![]
        }
        Action::ClearErrorMessage => {
            store.error_message = None;
            vec![]
        }

        Action::LoadContent { path } => {
            vec![Effect::LoadContentFromFile { path }]
        }
        Action::LoadContentJson { json } => {
            if let Err(e) = serialization::content_from_json(&json)
                .and_then(|content| store.apply_content(content))
            {
                store.error_message = Some(e);
            }
            vec![]
        }
        Action::ExportContent { path } => {
            vec![Effect::ExportContentToFile { path }]
        }
        Action::ResetToBundledContent => {
            if let Err(e) = serialization::bundled_content()
                .and_then(|content| store.apply_content(content))
            {
                store.error_message = Some(e);
            }
            vec![]
        }
    }
}

fn fly(store: &mut Store, id: &NodeId) {
    // Nobody waits on a flight the user started.
    if let Err(e) = store.scene.fly_to(id) {
        log::warn!("cannot fly to `{id}`: {e}");
    }
}
