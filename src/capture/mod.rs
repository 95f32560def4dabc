pub mod decoder;
pub mod discovery;
pub mod packet;
pub mod pcap_engine;

pub use decoder::{decode_frame, LinkLayer};
pub use discovery::{find_capture_files, trace_name};
pub use packet::{Capture, PacketRecord, ProtocolTag, TcpFields, UnknownProtocolTag};
pub use pcap_engine::{CaptureError, CaptureSource, PcapEngine};
