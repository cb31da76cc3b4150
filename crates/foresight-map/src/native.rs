#![cfg(not(target_arch = "wasm32"))]

use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::create_app;

const DEFAULT_LOG_FILTER: &str = "warn,foresight_scene=info,foresight_map=info";

/// Entry point used by the native executable.
pub fn run() -> eframe::Result<()> {
    // `log` records are bridged into tracing by the subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Strategic Foresight")
            .with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Strategic Foresight",
        native_options,
        Box::new(|cc| Ok(Box::new(create_app(cc)?))),
    )
}
