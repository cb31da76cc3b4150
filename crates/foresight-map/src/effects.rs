use crate::store::Store;
use std::path::PathBuf;

/// Deferred effects that must run outside the reducer (file IO)
#[derive(Debug, Clone)]
pub enum Effect {
    LoadContentFromFile { path: PathBuf },
    ExportContentToFile { path: PathBuf },
}

/// Execute a single effect against the store
pub fn run(store: &mut Store, effect: Effect) {
    match effect {
        Effect::LoadContentFromFile { path } => {
            if let Err(e) = store.load_content_from_file(&path) {
                store.error_message = Some(e);
            }
        }
        Effect::ExportContentToFile { path } => {
            match store.export_content_to_file(&path) {
                Ok(()) => log::info!("content exported to {}", path.display()),
                Err(e) => store.error_message = Some(e),
            }
        }
    }
}
