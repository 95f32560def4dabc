use serde::Serialize;

use crate::analysis::{EmptyCaptureError, Metadata, ProtocolCount};

/// Per-trace means used as reference overlays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    pub mean_size: f64,
    pub mean_inter_arrival: f64,
    pub mean_window: f64,
    pub packet_count: usize,
    pub total_bytes: u64,
    pub duration: f64,
}

/// Unweighted arithmetic mean; `None` for an empty sample.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        None
    } else {
        Some(sum / n as f64)
    }
}

/// Means of the size, inter-arrival and window series over all samples.
/// The placeholder first inter-arrival entry is included.
pub fn summarize(metadata: &Metadata) -> Result<SummaryStats, EmptyCaptureError> {
    let mean_size = mean(metadata.size().iter().map(|&s| s as f64)).ok_or(EmptyCaptureError)?;
    let mean_inter_arrival = mean(metadata.inter_arrival().iter().copied()).ok_or(EmptyCaptureError)?;
    let mean_window = mean(metadata.window().iter().map(|&w| f64::from(w))).ok_or(EmptyCaptureError)?;

    Ok(SummaryStats {
        mean_size,
        mean_inter_arrival,
        mean_window,
        packet_count: metadata.len(),
        total_bytes: metadata.size().iter().map(|&s| s as u64).sum(),
        duration: metadata.duration(),
    })
}

/// Bounds shared by every trace so rows of the grid are comparable.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ComparativeSummary {
    pub trace_count: usize,
    pub max_duration: f64,
    pub max_size: usize,
    pub max_inter_arrival: f64,
    pub max_window: u32,
    pub max_flags: u8,
    pub max_count: usize,
}

impl ComparativeSummary {
    pub fn across<'a, I>(traces: I) -> Self
    where
        I: IntoIterator<Item = (&'a Metadata, &'a ProtocolCount)>,
    {
        let mut summary = ComparativeSummary::default();
        for (metadata, counts) in traces {
            summary.trace_count += 1;
            summary.max_duration = summary.max_duration.max(metadata.duration());
            summary.max_size = summary.max_size.max(metadata.size().iter().copied().max().unwrap_or(0));
            summary.max_inter_arrival = metadata
                .inter_arrival()
                .iter()
                .copied()
                .fold(summary.max_inter_arrival, f64::max);
            summary.max_window = summary.max_window.max(metadata.window().iter().copied().max().unwrap_or(0));
            summary.max_flags = summary.max_flags.max(metadata.flags().iter().copied().max().unwrap_or(0));
            summary.max_count = summary.max_count.max(counts.max());
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{Capture, PacketRecord, ProtocolTag};

    fn three_packets() -> Metadata {
        let capture = Capture::new(
            "three.pcapng",
            vec![
                PacketRecord::new(0.0, 40),
                PacketRecord::new(0.1, 60).with_tcp(1000, 0x02),
                PacketRecord::new(0.3, 55).with_tcp(2000, 0x10),
            ],
        );
        Metadata::derive(&capture).unwrap()
    }

    #[test]
    fn test_summarize_means() {
        let stats = summarize(&three_packets()).unwrap();
        assert!((stats.mean_size - 155.0 / 3.0).abs() < 1e-12);
        assert!((stats.mean_inter_arrival - 0.1).abs() < 1e-9);
        assert!((stats.mean_window - 1000.0).abs() < 1e-12);
        assert_eq!(stats.packet_count, 3);
        assert_eq!(stats.total_bytes, 155);
        assert!((stats.duration - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_summarize_empty_metadata() {
        assert_eq!(summarize(&Metadata::default()), Err(EmptyCaptureError));
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(Vec::<f64>::new()), None);
        assert_eq!(mean(vec![2.0, 4.0]), Some(3.0));
    }

    #[test]
    fn test_comparative_summary_takes_maxima() {
        let short = three_packets();
        let long = Metadata::derive(&Capture::new(
            "long.pcapng",
            vec![
                PacketRecord::new(10.0, 1500).with_tcp(65535, 0x18),
                PacketRecord::new(15.0, 60),
            ],
        ))
        .unwrap();
        let counts = ProtocolCount::from_capture(
            &Capture::new("c", vec![PacketRecord::new(0.0, 1).with_tcp(1, 1)]),
            &[ProtocolTag::Tcp],
        );

        let summary = ComparativeSummary::across(vec![(&short, &counts), (&long, &counts)]);
        assert_eq!(summary.trace_count, 2);
        assert_eq!(summary.max_size, 1500);
        assert_eq!(summary.max_window, 65535);
        assert_eq!(summary.max_flags, 0x18);
        assert_eq!(summary.max_count, 1);
        assert!((summary.max_duration - 5.0).abs() < 1e-9);
        assert!((summary.max_inter_arrival - 5.0).abs() < 1e-9);
    }
}
