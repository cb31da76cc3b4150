#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result<()> {
    foresight_map::native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The browser build starts through the library's `start()` instead.
}
