use eframe::egui;
use foresight_scene::Pointer;

use crate::actions::Action;
use crate::panels;
use crate::state::State;
use crate::store::Store;
use crate::viewport;

/// Longest step fed to the scene, so a stalled tab does not teleport
/// the camera.
const MAX_FRAME_DT: f32 = 0.1;

pub struct ForesightApp {
    state: State,
    /// Mouse position seen by the last paint, hover-tested by the next step.
    pointer: Option<Pointer>,
    #[cfg(target_arch = "wasm32")]
    pending_upload: Option<futures::channel::oneshot::Receiver<String>>,
}

impl ForesightApp {
    pub fn new(store: Store) -> Self {
        Self {
            state: State::new(store),
            pointer: None,
            #[cfg(target_arch = "wasm32")]
            pending_upload: None,
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn open_content_dialog(&mut self, _ctx: &egui::Context) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .pick_file()
        {
            self.state.dispatch(Action::LoadContent { path });
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn open_content_dialog(&mut self, ctx: &egui::Context) {
        self.pending_upload = Some(crate::web::open_content_dialog(ctx.clone()));
    }

    #[cfg(target_arch = "wasm32")]
    fn poll_upload(&mut self) {
        let Some(rx) = self.pending_upload.as_mut() else {
            return;
        };
        match rx.try_recv() {
            Ok(None) => {}
            Ok(Some(json)) => {
                self.pending_upload = None;
                self.state.dispatch(Action::LoadContentJson { json });
            }
            // dialog dismissed
            Err(_) => self.pending_upload = None,
        }
    }
}

impl eframe::App for ForesightApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        #[cfg(target_arch = "wasm32")]
        self.poll_upload();

        // Step the scene before painting so the picture and the hover
        // test both reflect this frame's camera.
        let dt = ctx.input(|i| i.stable_dt).min(MAX_FRAME_DT);
        self.state.dispatch(Action::Frame {
            dt,
            pointer: self.pointer,
        });
        self.state.flush_actions();
        self.state.flush_effects();

        if panels::menu_bar(ctx, &mut self.state) {
            self.open_content_dialog(ctx);
        }
        panels::tour_bar(ctx, &mut self.state);
        panels::details_panel(ctx, &mut self.state);

        self.pointer = egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| viewport::show(ui, &mut self.state))
            .inner;

        panels::toasts(ctx, &mut self.state);
        panels::stats_window(ctx, &mut self.state);
        panels::error_window(ctx, &mut self.state);

        // Input from this paint lands before the next step.
        self.state.flush_actions();
        self.state.flush_effects();

        ctx.request_repaint();
    }
}
