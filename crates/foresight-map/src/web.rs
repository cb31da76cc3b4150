#![cfg(target_arch = "wasm32")]

use crate::create_app;
use eframe::{WebRunner, egui};
use futures::channel::oneshot;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;

/// Launch the app inside the canvas referenced by `index.html`.
#[wasm_bindgen]
pub async fn start() -> Result<(), JsValue> {
    use web_sys::HtmlCanvasElement;

    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let document = web_sys::window()
        .ok_or("No window")?
        .document()
        .ok_or("No document")?;

    let canvas = document
        .get_element_by_id("the_canvas_id")
        .ok_or("Canvas not found")?
        .dyn_into::<HtmlCanvasElement>()?;

    let web_options = eframe::WebOptions::default();

    WebRunner::new()
        .start(
            canvas,
            web_options,
            Box::new(|cc| Ok(Box::new(create_app(cc)?))),
        )
        .await
}

/// Ask the browser for a content file. The receiver yields its text, or
/// is cancelled when the dialog is dismissed.
pub fn open_content_dialog(ctx: egui::Context) -> oneshot::Receiver<String> {
    use rfd::AsyncFileDialog;
    use wasm_bindgen_futures::spawn_local;

    let (tx, rx) = oneshot::channel();
    let task = AsyncFileDialog::new()
        .add_filter("JSON", &["json"])
        .pick_file();

    spawn_local(async move {
        if let Some(file) = task.await {
            match String::from_utf8(file.read().await) {
                Ok(json) => {
                    let _ = tx.send(json);
                }
                Err(e) => log::error!("{} is not UTF-8 text: {e}", file.file_name()),
            }
        }
        ctx.request_repaint();
    });

    rx
}
