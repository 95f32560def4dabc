pub mod charts;
pub mod layouts;

pub use charts::{ProtocolChart, SeriesChart, TraceCharts};
pub use layouts::GridLayout;
