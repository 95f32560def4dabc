use std::io::Write;

use crate::analysis::ComparativeSummary;
use crate::output::Renderer;
use crate::pipeline::TraceReport;
use crate::utils::formatting::{format_bytes, format_seconds, truncate_string};

const NAME_WIDTH: usize = 28;

/// Plain-text table, one line per trace.
pub struct TextRenderer<W: Write> {
    writer: W,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn render(&mut self, reports: &[TraceReport], comparison: &ComparativeSummary) -> anyhow::Result<()> {
        let tags: Vec<String> = reports
            .first()
            .map(|r| r.counts.entries().iter().map(|(tag, _)| tag.to_string()).collect())
            .unwrap_or_default();

        write!(
            self.writer,
            "{:<width$} {:>8} {:>10} {:>10} {:>10} {:>12} {:>10}",
            "trace",
            "packets",
            "bytes",
            "duration",
            "mean size",
            "mean gap",
            "mean win",
            width = NAME_WIDTH
        )?;
        for tag in &tags {
            write!(self.writer, " {:>7}", tag)?;
        }
        writeln!(self.writer)?;

        for report in reports {
            let stats = &report.summary;
            write!(
                self.writer,
                "{:<width$} {:>8} {:>10} {:>10} {:>10.1} {:>12} {:>10.1}",
                truncate_string(&report.name, NAME_WIDTH),
                stats.packet_count,
                format_bytes(stats.total_bytes),
                format_seconds(stats.duration),
                stats.mean_size,
                format_seconds(stats.mean_inter_arrival),
                stats.mean_window,
                width = NAME_WIDTH
            )?;
            for (_, n) in report.counts.entries() {
                write!(self.writer, " {:>7}", n)?;
            }
            writeln!(self.writer)?;
        }

        writeln!(
            self.writer,
            "{} traces, longest {}, largest packet {} B",
            comparison.trace_count,
            format_seconds(comparison.max_duration),
            comparison.max_size
        )?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{Capture, PacketRecord, ProtocolTag};

    #[test]
    fn test_text_table() {
        let capture = Capture::new(
            "lab.pcapng",
            vec![
                PacketRecord::new(0.0, 40).with_layer(ProtocolTag::Udp),
                PacketRecord::new(0.1, 60).with_tcp(1000, 0x02),
                PacketRecord::new(0.3, 55).with_tcp(2000, 0x10),
            ],
        );
        let report = TraceReport::analyze(&capture, &ProtocolTag::DEFAULT_DISTRIBUTION).unwrap();
        let comparison = ComparativeSummary::across(vec![(&report.metadata, &report.counts)]);

        let mut renderer = TextRenderer::new(Vec::new());
        renderer.render(std::slice::from_ref(&report), &comparison).unwrap();
        let text = String::from_utf8(renderer.into_inner()).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("UDP") && lines[0].ends_with("HTTP"));
        assert!(lines[1].starts_with("lab.pcapng"));
        assert!(lines[1].contains("51.7"));
        assert!(lines[2].starts_with("1 traces"));
    }
}
