use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

use crate::analysis::{ComparativeSummary, SummaryStats};
use crate::output::Renderer;
use crate::pipeline::TraceReport;

#[derive(Serialize)]
struct TraceSummary<'a> {
    name: &'a str,
    summary: &'a SummaryStats,
    protocols: BTreeMap<String, usize>,
}

#[derive(Serialize)]
struct Document<'a> {
    traces: Vec<TraceSummary<'a>>,
    comparison: &'a ComparativeSummary,
}

/// Summaries and protocol counts as one pretty-printed JSON document. With
/// `with_series` the full per-packet series are included as well.
pub struct JsonRenderer<W: Write> {
    writer: W,
    with_series: bool,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            with_series: false,
        }
    }

    pub fn with_series(mut self, with_series: bool) -> Self {
        self.with_series = with_series;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Renderer for JsonRenderer<W> {
    fn render(&mut self, reports: &[TraceReport], comparison: &ComparativeSummary) -> anyhow::Result<()> {
        if self.with_series {
            serde_json::to_writer_pretty(&mut self.writer, reports)?;
        } else {
            let traces = reports
                .iter()
                .map(|report| TraceSummary {
                    name: &report.name,
                    summary: &report.summary,
                    protocols: report
                        .counts
                        .entries()
                        .iter()
                        .map(|(tag, n)| (tag.to_string(), *n))
                        .collect(),
                })
                .collect();
            serde_json::to_writer_pretty(&mut self.writer, &Document { traces, comparison })?;
        }
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
