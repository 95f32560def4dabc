use serde::Serialize;

use crate::capture::{Capture, PacketRecord, ProtocolTag};

/// Number of packets in `capture` carrying the `tag` layer.
pub fn count(capture: &Capture, tag: ProtocolTag) -> usize {
    count_matching(capture, |packet| packet.has_layer(tag))
}

/// Number of packets in `capture` accepted by `predicate`.
pub fn count_matching<F>(capture: &Capture, predicate: F) -> usize
where
    F: Fn(&PacketRecord) -> bool,
{
    capture.packets().iter().filter(|packet| predicate(packet)).count()
}

/// Occurrence counts for an ordered list of tags. Counts overlap: one packet
/// can match several tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProtocolCount {
    entries: Vec<(ProtocolTag, usize)>,
}

impl ProtocolCount {
    pub fn from_capture(capture: &Capture, tags: &[ProtocolTag]) -> Self {
        let entries = tags.iter().map(|&tag| (tag, count(capture, tag))).collect();
        Self { entries }
    }

    pub fn get(&self, tag: ProtocolTag) -> usize {
        self.entries
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    /// Entries in the order the tags were requested.
    pub fn entries(&self) -> &[(ProtocolTag, usize)] {
        &self.entries
    }

    pub fn max(&self) -> usize {
        self.entries.iter().map(|(_, n)| *n).max().unwrap_or(0)
    }
}
