mod actions;
mod app;
mod cache;
mod effects;
mod panels;
mod serialization;
mod state;
mod store;
mod versioned;
mod viewport;

pub mod native;
pub mod web;

pub use app::ForesightApp;

use eframe::egui;

/// Build the app from `scene_config.json` and `content.json` when
/// present, falling back to defaults and the bundled map.
pub fn create_app(cc: &eframe::CreationContext<'_>) -> Result<ForesightApp, String> {
    cc.egui_ctx.set_visuals(egui::Visuals::dark());

    let config = serialization::load_config_or_default();
    let content = serialization::load_content_or_bundled()?;
    let store = store::Store::new(content, config)?;
    Ok(ForesightApp::new(store))
}
