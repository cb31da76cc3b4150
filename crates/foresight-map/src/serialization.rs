use foresight_scene::{Content, SceneConfig};
use std::path::Path;

/// Content shipped with the app, used when no `content.json` is found.
pub const BUNDLED_CONTENT: &str = include_str!("../assets/foresight.json");

pub const CONTENT_FILE: &str = "content.json";
pub const CONFIG_FILE: &str = "scene_config.json";

// ------------------------------------------------------------------
// Content
// ------------------------------------------------------------------

pub fn bundled_content() -> Result<Content, String> {
    content_from_json(BUNDLED_CONTENT)
        .map_err(|e| format!("bundled content is broken: {e}"))
}

pub fn content_from_json(json: &str) -> Result<Content, String> {
    Content::from_json_str(json).map_err(|e| e.to_string())
}

pub fn load_content(path: &Path) -> Result<Content, String> {
    Content::from_path(path)
        .map_err(|e| format!("Failed to load {}: {e}", path.display()))
}

pub fn save_content(content: &Content, path: &Path) -> Result<(), String> {
    let json = serde_json::to_string_pretty(content)
        .map_err(|e| format!("Failed to serialize content: {e}"))?;
    std::fs::write(path, json)
        .map_err(|e| format!("Failed to write {}: {e}", path.display()))
}

/// `content.json` from the working directory when it exists and is
/// valid, else the bundled content.
pub fn load_content_or_bundled() -> Result<Content, String> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        let path = Path::new(CONTENT_FILE);
        if path.exists() {
            match load_content(path) {
                Ok(content) => {
                    log::info!("loaded content from {CONTENT_FILE}");
                    return Ok(content);
                }
                Err(e) => {
                    log::error!("{e}. Using bundled content.");
                }
            }
        }
    }
    bundled_content()
}

// ------------------------------------------------------------------
// Config
// ------------------------------------------------------------------

pub fn load_config(path: &Path) -> Result<SceneConfig, String> {
    SceneConfig::from_path(path)
        .map_err(|e| format!("Failed to load {}: {e}", path.display()))
}

/// `scene_config.json` when present and valid, else defaults.
pub fn load_config_or_default() -> SceneConfig {
    #[cfg(not(target_arch = "wasm32"))]
    {
        let path = Path::new(CONFIG_FILE);
        if path.exists() {
            match load_config(path) {
                Ok(config) => return config,
                Err(e) => log::error!("{e}. Using default settings."),
            }
        }
    }
    SceneConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use foresight_scene::{Level, NodeId, Rgb};

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("foresight-map-{}-{name}", std::process::id()))
    }

    #[test]
    fn bundled_content_is_valid() {
        let content = bundled_content().unwrap();
        assert_eq!(content.pillars.len(), 4);
        assert_eq!(content.methodologies.len(), 12);
        assert_eq!(content.tour.len(), 6);
        // the last pillar has no color of its own
        assert_eq!(content.pillars[3].color(), Rgb::palette(3));
        assert_eq!(
            content.level_of(&NodeId::media(&"delphi".into(), 0)),
            Some(Level::Media)
        );
        assert!(content.total_node_count() < SceneConfig::default().max_live_nodes);
    }

    #[test]
    fn saved_content_loads_back() {
        let content = bundled_content().unwrap();
        let path = temp_path("content.json");
        save_content(&content, &path).unwrap();
        let loaded = load_content(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, content);
    }

    #[test]
    fn errors_name_the_file() {
        let path = temp_path("missing.json");
        let err = load_content(&path).unwrap_err();
        assert!(err.contains("missing.json"), "{err}");

        let err = content_from_json("{ \"root\": 1 }").unwrap_err();
        assert!(err.contains("invalid content JSON"), "{err}");
    }

    #[test]
    fn invalid_config_is_reported() {
        let path = temp_path("config.json");
        std::fs::write(&path, r#"{ "max_live_nodes": 0 }"#).unwrap();
        let err = load_config(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(err.contains("max_live_nodes"), "{err}");
    }
}
