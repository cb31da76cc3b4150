use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::node::Level;

/// Tunables for the whole scene, loadable from JSON.
///
/// Every section falls back to its defaults, so a config file only needs
/// to name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Ceiling on simultaneously live nodes. A safety valve, not a
    /// measured limit.
    pub max_live_nodes: usize,
    /// Media beyond this count on a single node are not materialized.
    pub max_media_per_node: Option<usize>,
    pub radii: LevelRadii,
    pub flight: FlightConfig,
    pub connections: ConnectionStyle,
    pub appearance: AppearanceConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            max_live_nodes: 400,
            max_media_per_node: Some(12),
            radii: LevelRadii::default(),
            flight: FlightConfig::default(),
            connections: ConnectionStyle::default(),
            appearance: AppearanceConfig::default(),
        }
    }
}

impl SceneConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SceneConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_live_nodes == 0 {
            return Err(ConfigError::Invalid(
                "max_live_nodes must be at least 1".into(),
            ));
        }
        self.flight.validate()
    }
}

/// Circle radius children are laid out on, per child level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelRadii {
    pub pillar: f32,
    pub methodology: f32,
    pub media: f32,
}

impl LevelRadii {
    pub fn for_level(&self, level: Level) -> f32 {
        match level {
            Level::Center => 0.0,
            Level::Pillar => self.pillar,
            Level::Methodology => self.methodology,
            Level::Media => self.media,
        }
    }
}

impl Default for LevelRadii {
    fn default() -> Self {
        Self {
            pillar: 40.0,
            methodology: 14.0,
            media: 5.0,
        }
    }
}

/// Timing and framing of camera flights, in seconds and world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    pub depart_duration: f32,
    pub arrive_duration: f32,
    pub base_duration: f32,
    pub distance_multiplier: f32,
    pub max_duration: f32,
    /// Midpoint lift as a fraction of source–target distance.
    pub arc_height_factor: f32,
    /// Trailing distance when a transit begins.
    pub far_approach_distance: f32,
    /// Trailing distance once settled around the target.
    pub orbit_distance: f32,
    /// Camera height above the focus, as a fraction of trailing distance.
    pub elevation_ratio: f32,
}

impl FlightConfig {
    pub fn phase_overhead(&self) -> f32 {
        self.depart_duration + self.arrive_duration
    }

    /// Transit time for a flight covering `distance`.
    pub fn transit_duration(&self, distance: f32) -> f32 {
        (self.base_duration + distance * self.distance_multiplier)
            .clamp(self.base_duration, self.max_duration)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            ("depart_duration", self.depart_duration),
            ("arrive_duration", self.arrive_duration),
            ("base_duration", self.base_duration),
        ];
        for (name, value) in durations {
            if !(value > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "flight.{name} must be positive, got {value}"
                )));
            }
        }
        if self.max_duration < self.base_duration {
            return Err(ConfigError::Invalid(
                "flight.max_duration must not be below base_duration".into(),
            ));
        }
        Ok(())
    }
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            depart_duration: 0.8,
            arrive_duration: 1.0,
            base_duration: 1.6,
            distance_multiplier: 0.025,
            max_duration: 4.0,
            arc_height_factor: 0.35,
            far_approach_distance: 60.0,
            orbit_distance: 22.0,
            elevation_ratio: 0.35,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionStyle {
    pub resting_opacity: f32,
    pub active_opacity: f32,
    /// Exponential approach rate toward the target opacity, per second.
    pub fade_rate: f32,
    pub particles_per_connection: usize,
    /// Fraction of the edge a particle covers per second.
    pub particle_speed: f32,
    pub cross_pillar_opacity: f32,
    pub particle_seed: u64,
}

impl Default for ConnectionStyle {
    fn default() -> Self {
        Self {
            resting_opacity: 0.3,
            active_opacity: 0.95,
            fade_rate: 6.0,
            particles_per_connection: 3,
            particle_speed: 0.35,
            cross_pillar_opacity: 0.55,
            particle_seed: 0x5eed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    pub hover_scale: f32,
    pub selected_scale: f32,
    pub scale_rate: f32,
    /// How far media leaves are blended toward white from their parent color.
    pub media_tint: f32,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            hover_scale: 1.3,
            selected_scale: 1.5,
            scale_rate: 10.0,
            media_tint: 0.45,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = SceneConfig::from_json_str(
            r#"{ "max_live_nodes": 10, "flight": { "max_duration": 9.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.max_live_nodes, 10);
        assert_eq!(config.flight.max_duration, 9.0);
        assert_eq!(config.flight.depart_duration, 0.8);
        assert_eq!(config.radii, LevelRadii::default());
    }

    #[test]
    fn transit_duration_is_clamped() {
        let flight = FlightConfig::default();
        assert_eq!(flight.transit_duration(0.0), flight.base_duration);
        assert_eq!(flight.transit_duration(1.0e6), flight.max_duration);
        let mid = flight.transit_duration(40.0);
        assert!((mid - (1.6 + 40.0 * 0.025)).abs() < 1e-5);
    }

    #[test]
    fn zero_ceiling_is_rejected() {
        let err = SceneConfig::from_json_str(r#"{ "max_live_nodes": 0 }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
