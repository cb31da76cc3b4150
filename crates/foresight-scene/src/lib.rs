pub mod camera;
pub mod color;
pub mod config;
pub mod connections;
pub mod content;
pub mod expansion;
pub mod flight;
pub mod graph_store;
pub mod layout;
pub mod node;
pub mod path;
pub mod resources;
pub mod scene;
pub mod tour;

pub use camera::{CameraRig, OrbitControls, Pointer, Projection, Ray, ScreenPoint, Viewport};
pub use color::Rgb;
pub use config::{ConfigError, SceneConfig};
pub use connections::{ConnectionError, ConnectionManager};
pub use content::{Content, ContentError, MediaItem, MediaKind};
pub use expansion::{ClickOutcome, ExpansionController, ExpansionError, NodeState, Toast, ToastLevel};
pub use flight::{FlightCompletion, FlightController, FlightError, FlightOutcome, FlightPhase};
pub use graph_store::{GraphError, NodeGraphStore};
pub use node::{Level, NodeId, SceneNode};
pub use scene::{Scene, SceneError, SceneEvent, SceneStats};
pub use tour::{TourEvent, TourOrchestrator, TourSegment};

pub use glam::Vec3;
