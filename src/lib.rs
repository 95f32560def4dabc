// Library exports for capture-metrics
pub mod analysis;
pub mod capture;
pub mod config;
pub mod output;
pub mod pipeline;
pub mod ui;
pub mod utils;
pub mod visualization;

pub use analysis::{metadata, protocols, statistics};
pub use capture::{decoder, discovery, packet, pcap_engine};
pub use config::settings;
pub use pipeline::{run, RunContext, RunError, RunOptions, TraceReport};
pub use ui::app;
pub use utils::formatting;
pub use visualization::{charts, layouts};

// Error types
pub use anyhow::{Error, Result};
