use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier for a protocol layer a decoded packet may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProtocolTag {
    Ethernet,
    Vlan,
    Arp,
    Ipv4,
    Ipv6,
    Icmp,
    Icmpv6,
    Tcp,
    Udp,
    Dns,
    Tls,
    Http,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown protocol tag '{0}'")]
pub struct UnknownProtocolTag(pub String);

impl ProtocolTag {
    pub const ALL: [ProtocolTag; 12] = [
        ProtocolTag::Ethernet,
        ProtocolTag::Vlan,
        ProtocolTag::Arp,
        ProtocolTag::Ipv4,
        ProtocolTag::Ipv6,
        ProtocolTag::Icmp,
        ProtocolTag::Icmpv6,
        ProtocolTag::Tcp,
        ProtocolTag::Udp,
        ProtocolTag::Dns,
        ProtocolTag::Tls,
        ProtocolTag::Http,
    ];

    /// Tags shown in the protocol distribution when nothing else is configured.
    pub const DEFAULT_DISTRIBUTION: [ProtocolTag; 4] = [
        ProtocolTag::Udp,
        ProtocolTag::Tcp,
        ProtocolTag::Tls,
        ProtocolTag::Http,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolTag::Ethernet => "ETH",
            ProtocolTag::Vlan => "VLAN",
            ProtocolTag::Arp => "ARP",
            ProtocolTag::Ipv4 => "IPV4",
            ProtocolTag::Ipv6 => "IPV6",
            ProtocolTag::Icmp => "ICMP",
            ProtocolTag::Icmpv6 => "ICMPV6",
            ProtocolTag::Tcp => "TCP",
            ProtocolTag::Udp => "UDP",
            ProtocolTag::Dns => "DNS",
            ProtocolTag::Tls => "TLS",
            ProtocolTag::Http => "HTTP",
        }
    }
}

impl fmt::Display for ProtocolTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtocolTag {
    type Err = UnknownProtocolTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.as_str() {
            "ETHERNET" => return Ok(ProtocolTag::Ethernet),
            "802.1Q" => return Ok(ProtocolTag::Vlan),
            "IP" => return Ok(ProtocolTag::Ipv4),
            _ => {}
        }
        ProtocolTag::ALL
            .iter()
            .copied()
            .find(|tag| tag.as_str() == upper)
            .ok_or_else(|| UnknownProtocolTag(s.to_string()))
    }
}

impl TryFrom<String> for ProtocolTag {
    type Error = UnknownProtocolTag;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProtocolTag> for String {
    fn from(tag: ProtocolTag) -> Self {
        tag.as_str().to_string()
    }
}

/// TCP header fields the metrics care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TcpFields {
    pub window: u32,
    pub flags: u8,
}

/// A single decoded packet: arrival time, captured length and the layers
/// that were recognized in it.
#[derive(Debug, Clone, PartialEq)]
pub struct PacketRecord {
    pub timestamp: f64,
    pub length: usize,
    layers: Vec<ProtocolTag>,
    tcp: Option<TcpFields>,
}

impl PacketRecord {
    pub fn new(timestamp: f64, length: usize) -> Self {
        Self {
            timestamp,
            length,
            layers: Vec::new(),
            tcp: None,
        }
    }

    pub fn with_layer(mut self, tag: ProtocolTag) -> Self {
        self.push_layer(tag);
        self
    }

    /// Attaches TCP fields; implies the TCP layer.
    pub fn with_tcp(mut self, window: u32, flags: u8) -> Self {
        self.set_tcp(TcpFields { window, flags });
        self
    }

    pub fn push_layer(&mut self, tag: ProtocolTag) {
        if !self.layers.contains(&tag) {
            self.layers.push(tag);
        }
    }

    pub fn set_tcp(&mut self, fields: TcpFields) {
        self.push_layer(ProtocolTag::Tcp);
        self.tcp = Some(fields);
    }

    pub fn has_layer(&self, tag: ProtocolTag) -> bool {
        self.layers.contains(&tag)
    }

    /// Layers in the order they were decoded, outermost first.
    pub fn layers(&self) -> &[ProtocolTag] {
        &self.layers
    }

    pub fn tcp(&self) -> Option<&TcpFields> {
        self.tcp.as_ref()
    }
}

/// One loaded trace: a name plus its packets in arrival order.
#[derive(Debug, Clone)]
pub struct Capture {
    name: String,
    packets: Vec<PacketRecord>,
}

impl Capture {
    pub fn new(name: impl Into<String>, packets: Vec<PacketRecord>) -> Self {
        Self {
            name: name.into(),
            packets,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn packets(&self) -> &[PacketRecord] {
        &self.packets
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}
