pub mod json;
pub mod text;

use clap::ValueEnum;

use crate::analysis::ComparativeSummary;
use crate::pipeline::TraceReport;

pub use json::JsonRenderer;
pub use text::TextRenderer;

/// Final stage of a run: consumes the derived reports.
pub trait Renderer {
    fn render(&mut self, reports: &[TraceReport], comparison: &ComparativeSummary) -> anyhow::Result<()>;
}

/// Where the derived data goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Interactive terminal grid (default)
    Tui,
    /// Per-trace summary table on stdout
    Text,
    /// Per-trace summaries and counts as JSON on stdout
    Json,
}
