use serde::Serialize;

use crate::analysis::EmptyCaptureError;
use crate::capture::Capture;

/// Per-packet time series derived from one capture. All five series have one
/// entry per packet, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metadata {
    normalized_time: Vec<f64>,
    size: Vec<usize>,
    inter_arrival: Vec<f64>,
    window: Vec<u32>,
    flags: Vec<u8>,
}

impl Metadata {
    /// Derives the series for `capture`, anchored at the first packet's
    /// timestamp.
    ///
    /// The first inter-arrival entry is the first normalized time (always 0),
    /// not a real gap. The TCP window is carried forward across packets
    /// without a TCP layer and starts at 0; flags are never carried.
    pub fn derive(capture: &Capture) -> Result<Self, EmptyCaptureError> {
        let packets = capture.packets();
        let anchor = packets.first().ok_or(EmptyCaptureError)?.timestamp;
        let n = packets.len();

        let mut metadata = Metadata {
            normalized_time: Vec::with_capacity(n),
            size: Vec::with_capacity(n),
            inter_arrival: Vec::with_capacity(n),
            window: Vec::with_capacity(n),
            flags: Vec::with_capacity(n),
        };

        let mut previous_time = 0.0;
        let mut current_window = 0;
        for (i, packet) in packets.iter().enumerate() {
            let time = packet.timestamp - anchor;
            let gap = if i == 0 { time } else { time - previous_time };
            previous_time = time;

            let flags = match packet.tcp() {
                Some(tcp) => {
                    current_window = tcp.window;
                    tcp.flags
                }
                None => 0,
            };

            metadata.normalized_time.push(time);
            metadata.size.push(packet.length);
            metadata.inter_arrival.push(gap);
            metadata.window.push(current_window);
            metadata.flags.push(flags);
        }

        log::debug!(
            "{}: derived {} samples over {:.6}s",
            capture.name(),
            n,
            previous_time
        );
        Ok(metadata)
    }

    pub fn normalized_time(&self) -> &[f64] {
        &self.normalized_time
    }

    pub fn size(&self) -> &[usize] {
        &self.size
    }

    pub fn inter_arrival(&self) -> &[f64] {
        &self.inter_arrival
    }

    pub fn window(&self) -> &[u32] {
        &self.window
    }

    pub fn flags(&self) -> &[u8] {
        &self.flags
    }

    pub fn len(&self) -> usize {
        self.normalized_time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.normalized_time.is_empty()
    }

    /// Normalized time of the last packet.
    pub fn duration(&self) -> f64 {
        self.normalized_time.last().copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{PacketRecord, ProtocolTag};

    const EPS: f64 = 1e-9;

    fn three_packets() -> Capture {
        Capture::new(
            "three.pcapng",
            vec![
                PacketRecord::new(0.0, 40).with_layer(ProtocolTag::Udp),
                PacketRecord::new(0.1, 60).with_tcp(1000, 0x02),
                PacketRecord::new(0.3, 55).with_tcp(2000, 0x10),
            ],
        )
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < EPS, "{:?} != {:?}", actual, expected);
        }
    }

    #[test]
    fn test_three_packet_scenario() {
        let metadata = Metadata::derive(&three_packets()).unwrap();

        assert_close(metadata.normalized_time(), &[0.0, 0.1, 0.3]);
        assert_eq!(metadata.size(), &[40, 60, 55]);
        assert_close(metadata.inter_arrival(), &[0.0, 0.1, 0.2]);
        assert_eq!(metadata.window(), &[0, 1000, 2000]);
        assert_eq!(metadata.flags(), &[0, 2, 16]);
    }

    #[test]
    fn test_empty_capture_is_rejected() {
        let capture = Capture::new("empty.pcapng", Vec::new());
        assert_eq!(Metadata::derive(&capture), Err(EmptyCaptureError));
    }

    #[test]
    fn test_anchor_is_first_packet() {
        let capture = Capture::new(
            "absolute.pcapng",
            vec![
                PacketRecord::new(1_700_000_000.25, 100),
                PacketRecord::new(1_700_000_001.0, 100),
            ],
        );
        let metadata = Metadata::derive(&capture).unwrap();
        assert_eq!(metadata.normalized_time()[0], 0.0);
        assert_eq!(metadata.inter_arrival()[0], 0.0);
        assert!((metadata.duration() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_window_carries_forward_and_flags_do_not() {
        let capture = Capture::new(
            "mixed.pcapng",
            vec![
                PacketRecord::new(0.0, 60).with_layer(ProtocolTag::Arp),
                PacketRecord::new(0.5, 60).with_tcp(4096, 0x18),
                PacketRecord::new(1.0, 80).with_layer(ProtocolTag::Udp),
                PacketRecord::new(1.5, 80).with_layer(ProtocolTag::Udp),
                PacketRecord::new(2.0, 60).with_tcp(0, 0x11),
                PacketRecord::new(2.5, 90).with_layer(ProtocolTag::Icmp),
            ],
        );
        let metadata = Metadata::derive(&capture).unwrap();

        assert_eq!(metadata.window(), &[0, 4096, 4096, 4096, 0, 0]);
        assert_eq!(metadata.flags(), &[0, 0x18, 0, 0, 0x11, 0]);

        for (i, packet) in capture.packets().iter().enumerate().skip(1) {
            if !packet.has_layer(ProtocolTag::Tcp) {
                assert_eq!(metadata.window()[i], metadata.window()[i - 1]);
            }
        }
    }

    #[test]
    fn test_series_lengths_match_packet_count() {
        let packets: Vec<PacketRecord> = (0..25)
            .map(|i| {
                let packet = PacketRecord::new(i as f64 * 0.01, 64 + i);
                if i % 3 == 0 {
                    packet.with_tcp(i as u32, (i % 32) as u8)
                } else {
                    packet
                }
            })
            .collect();
        let capture = Capture::new("many.pcapng", packets);
        let metadata = Metadata::derive(&capture).unwrap();

        assert_eq!(metadata.len(), capture.len());
        assert_eq!(metadata.size().len(), capture.len());
        assert_eq!(metadata.inter_arrival().len(), capture.len());
        assert_eq!(metadata.window().len(), capture.len());
        assert_eq!(metadata.flags().len(), capture.len());
    }

    #[test]
    fn test_flags_depend_only_on_own_packet() {
        let base = vec![
            PacketRecord::new(0.0, 60).with_tcp(10, 0x02),
            PacketRecord::new(0.1, 60),
            PacketRecord::new(0.2, 60).with_tcp(10, 0x10),
        ];
        let mut changed = base.clone();
        changed[0] = PacketRecord::new(0.0, 60).with_tcp(99, 0x04);

        let a = Metadata::derive(&Capture::new("a", base)).unwrap();
        let b = Metadata::derive(&Capture::new("b", changed)).unwrap();
        assert_eq!(&a.flags()[1..], &b.flags()[1..]);
    }
}
