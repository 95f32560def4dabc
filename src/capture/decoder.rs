use pnet::packet::ethernet::{EtherType, EtherTypes, EthernetPacket};
use pnet::packet::ip::{IpNextHeaderProtocol, IpNextHeaderProtocols};
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::ipv6::Ipv6Packet;
use pnet::packet::tcp::TcpPacket;
use pnet::packet::udp::UdpPacket;
use pnet::packet::vlan::VlanPacket;
use pnet::packet::Packet;

use super::packet::{PacketRecord, ProtocolTag, TcpFields};

/// Link-layer framing of the captured bytes, from the file's datalink type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkLayer {
    Ethernet,
    RawIp,
    LinuxCooked,
    Loopback,
    Unsupported(i32),
}

impl LinkLayer {
    /// Maps a libpcap DLT value.
    pub fn from_dlt(dlt: i32) -> Self {
        match dlt {
            1 => LinkLayer::Ethernet,
            12 | 14 | 101 | 228 | 229 => LinkLayer::RawIp,
            113 => LinkLayer::LinuxCooked,
            0 | 108 => LinkLayer::Loopback,
            other => LinkLayer::Unsupported(other),
        }
    }
}

const DNS_PORT: u16 = 53;
const SLL_HEADER_LEN: usize = 16;
const LOOPBACK_HEADER_LEN: usize = 4;

const HTTP_METHODS: [&[u8]; 9] = [
    b"GET ", b"POST ", b"PUT ", b"DELETE ", b"HEAD ", b"OPTIONS ", b"PATCH ", b"CONNECT ", b"TRACE ",
];

/// Decodes one captured frame into a record. Layers that cannot be parsed are
/// simply absent; decoding never fails.
pub fn decode_frame(link: LinkLayer, timestamp: f64, data: &[u8]) -> PacketRecord {
    let mut record = PacketRecord::new(timestamp, data.len());

    match link {
        LinkLayer::Ethernet => decode_ethernet(data, &mut record),
        LinkLayer::RawIp => decode_raw_ip(data, &mut record),
        LinkLayer::LinuxCooked => {
            if data.len() >= SLL_HEADER_LEN {
                let ethertype = EtherType::new(u16::from_be_bytes([data[14], data[15]]));
                decode_ethertype(ethertype, &data[SLL_HEADER_LEN..], &mut record);
            }
        }
        LinkLayer::Loopback => {
            if data.len() > LOOPBACK_HEADER_LEN {
                decode_raw_ip(&data[LOOPBACK_HEADER_LEN..], &mut record);
            }
        }
        LinkLayer::Unsupported(dlt) => {
            log::debug!("unsupported datalink {}, keeping frame without layers", dlt);
        }
    }

    record
}

fn decode_ethernet(data: &[u8], record: &mut PacketRecord) {
    if let Some(ethernet) = EthernetPacket::new(data) {
        record.push_layer(ProtocolTag::Ethernet);
        decode_ethertype(ethernet.get_ethertype(), ethernet.payload(), record);
    }
}

fn decode_ethertype(ethertype: EtherType, payload: &[u8], record: &mut PacketRecord) {
    match ethertype {
        EtherTypes::Ipv4 => decode_ipv4(payload, record),
        EtherTypes::Ipv6 => decode_ipv6(payload, record),
        EtherTypes::Arp => record.push_layer(ProtocolTag::Arp),
        EtherTypes::Vlan => {
            if let Some(vlan) = VlanPacket::new(payload) {
                record.push_layer(ProtocolTag::Vlan);
                decode_ethertype(vlan.get_ethertype(), vlan.payload(), record);
            }
        }
        _ => {}
    }
}

fn decode_raw_ip(data: &[u8], record: &mut PacketRecord) {
    match data.first().map(|b| b >> 4) {
        Some(4) => decode_ipv4(data, record),
        Some(6) => decode_ipv6(data, record),
        _ => {}
    }
}

fn decode_ipv4(data: &[u8], record: &mut PacketRecord) {
    if let Some(ipv4) = Ipv4Packet::new(data) {
        record.push_layer(ProtocolTag::Ipv4);
        decode_transport(ipv4.get_next_level_protocol(), ipv4.payload(), record);
    }
}

fn decode_ipv6(data: &[u8], record: &mut PacketRecord) {
    if let Some(ipv6) = Ipv6Packet::new(data) {
        record.push_layer(ProtocolTag::Ipv6);
        decode_transport(ipv6.get_next_header(), ipv6.payload(), record);
    }
}

fn decode_transport(protocol: IpNextHeaderProtocol, payload: &[u8], record: &mut PacketRecord) {
    match protocol {
        IpNextHeaderProtocols::Tcp => {
            if let Some(tcp) = TcpPacket::new(payload) {
                // Keep the low 8 flag bits (CWR..FIN); NS is dropped.
                let flags = (u16::from(tcp.get_flags()) & 0xff) as u8;
                record.set_tcp(TcpFields {
                    window: u32::from(tcp.get_window()),
                    flags,
                });
                if tcp.get_source() == DNS_PORT || tcp.get_destination() == DNS_PORT {
                    record.push_layer(ProtocolTag::Dns);
                }
                decode_tcp_payload(tcp.payload(), record);
            }
        }
        IpNextHeaderProtocols::Udp => {
            if let Some(udp) = UdpPacket::new(payload) {
                record.push_layer(ProtocolTag::Udp);
                if udp.get_source() == DNS_PORT || udp.get_destination() == DNS_PORT {
                    record.push_layer(ProtocolTag::Dns);
                }
            }
        }
        IpNextHeaderProtocols::Icmp => record.push_layer(ProtocolTag::Icmp),
        IpNextHeaderProtocols::Icmpv6 => record.push_layer(ProtocolTag::Icmpv6),
        _ => {}
    }
}

fn decode_tcp_payload(payload: &[u8], record: &mut PacketRecord) {
    if is_tls_record(payload) {
        record.push_layer(ProtocolTag::Tls);
    } else if is_http_message(payload) {
        record.push_layer(ProtocolTag::Http);
    }
}

/// TLS record header: content type 20..=24, major version 3, minor 0..=4.
pub fn is_tls_record(payload: &[u8]) -> bool {
    payload.len() >= 5
        && (20..=24).contains(&payload[0])
        && payload[1] == 3
        && payload[2] <= 4
}

/// HTTP/1.x request line or status line at the start of the segment.
pub fn is_http_message(payload: &[u8]) -> bool {
    payload.starts_with(b"HTTP/1.")
        || HTTP_METHODS.iter().any(|method| payload.starts_with(method))
}
