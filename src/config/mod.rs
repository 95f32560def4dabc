pub mod settings;

pub use settings::{AnalysisConfig, Config, ConfigError, DiscoveryConfig, PointMarker, UiConfig};
