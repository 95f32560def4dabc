pub mod metadata;
pub mod protocols;
pub mod statistics;

use thiserror::Error;

pub use metadata::Metadata;
pub use protocols::{count, count_matching, ProtocolCount};
pub use statistics::{mean, summarize, ComparativeSummary, SummaryStats};

/// A capture with no packets has no anchor to normalize against.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("capture contains no packets")]
pub struct EmptyCaptureError;
