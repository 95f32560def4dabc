use pcap::Capture as PcapCapture;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::decoder::{decode_frame, LinkLayer};
use super::packet::PacketRecord;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Capture file '{0}' could not be opened: {1}")]
    OpenFailed(PathBuf, String),

    #[error("Capture file '{0}' is corrupt after {1} packets: {2}")]
    ReadFailed(PathBuf, usize, String),

    #[error("Could not list directory '{0}': {1}")]
    Discovery(PathBuf, #[source] std::io::Error),
}

/// Anything that can turn a file on disk into an ordered packet sequence.
pub trait CaptureSource: Send + Sync {
    fn load(&self, path: &Path) -> Result<Vec<PacketRecord>, CaptureError>;
}

/// Offline reader for pcap and pcapng files backed by libpcap.
#[derive(Debug, Default, Clone, Copy)]
pub struct PcapEngine;

impl PcapEngine {
    pub fn new() -> Self {
        Self
    }
}

impl CaptureSource for PcapEngine {
    fn load(&self, path: &Path) -> Result<Vec<PacketRecord>, CaptureError> {
        let mut capture = PcapCapture::from_file(path)
            .map_err(|e| CaptureError::OpenFailed(path.to_path_buf(), e.to_string()))?;

        let link = LinkLayer::from_dlt(capture.get_datalink().0);
        if let LinkLayer::Unsupported(dlt) = link {
            log::warn!("{}: unsupported datalink {}, only sizes and times will be derived", path.display(), dlt);
        }

        let mut packets = Vec::new();
        loop {
            match capture.next_packet() {
                Ok(packet) => {
                    let timestamp = packet.header.ts.tv_sec as f64
                        + packet.header.ts.tv_usec as f64 / 1_000_000.0;
                    packets.push(decode_frame(link, timestamp, packet.data));
                }
                Err(pcap::Error::NoMorePackets) => break,
                Err(e) => {
                    return Err(CaptureError::ReadFailed(
                        path.to_path_buf(),
                        packets.len(),
                        e.to_string(),
                    ))
                }
            }
        }

        log::debug!("{}: decoded {} packets", path.display(), packets.len());
        Ok(packets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_fails_to_open() {
        let engine = PcapEngine::new();
        let path = std::env::temp_dir().join("capture-metrics-does-not-exist.pcapng");
        match engine.load(&path) {
            Err(CaptureError::OpenFailed(p, _)) => assert_eq!(p, path),
            other => panic!("expected open failure, got {:?}", other.map(|p| p.len())),
        }
    }
}
