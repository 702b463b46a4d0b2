#[path = "../common/mod.rs"]
mod common;

use libuhf::protocol::commands::{SearchRequest, StreamReports};
use libuhf::protocol::{Command, CrcMode, Frame};
use libuhf::tag::MetadataFlags;
use libuhf::types::TagProtocol;

#[test]
fn stop_streaming_bytes() {
    let bytes = Command::StopStreaming.encode().unwrap();
    assert_eq!(bytes, vec![0x2F, 0x00, 0x00, 0x02]);
}

#[test]
fn auth_response_bytes() {
    let bytes = Command::AuthResponse {
        password: 0xDEAD_BEEF,
    }
    .encode()
    .unwrap();
    assert_eq!(hex::encode(bytes), "2f000003deadbeef");
}

#[test]
fn set_protocol_frame() {
    let bytes = Command::SetProtocol(TagProtocol::Gen2).encode().unwrap();
    let frame = Frame::encode(&bytes, CrcMode::Enabled).unwrap();
    assert_eq!(&frame[..5], &[0xFF, 0x02, 0x93, 0x00, 0x05]);
}

#[test]
fn search_carries_timeout_and_metadata() {
    let mut req = SearchRequest::new(500, MetadataFlags::READ_COUNT | MetadataFlags::ANTENNA);
    req.antennas = vec![0x11];
    let bytes = Command::Search(req).encode().unwrap();
    assert_eq!(bytes[0], 0x22);
    // timeout is big-endian somewhere after the option/flags words
    assert!(bytes.windows(2).any(|w| w == [0x01, 0xF4]));
}

#[test]
fn continuous_search_sets_stream_flags() {
    let mut inner = SearchRequest::new(250, MetadataFlags::ALL);
    inner.antennas = vec![0x11];
    let req = libuhf::protocol::commands::MultiSearchRequest {
        timeout_ms: 250,
        metadata: MetadataFlags::ALL,
        streaming: Some(StreamReports {
            status: 0x0002,
            stats: 0,
        }),
        entries: vec![libuhf::protocol::commands::ProtocolSearch {
            protocol: TagProtocol::Gen2,
            weight: 1000,
            search: inner,
        }],
    };
    let bytes = Command::MultiProtocolSearch(req).encode().unwrap();
    assert_eq!(bytes[0], 0x2F);
    assert_eq!(bytes[3], 0x01);
    let flags = u16::from_be_bytes([bytes[4], bytes[5]]);
    assert_eq!(flags & 0x0040, 0x0040);
    assert_eq!(flags & 0x0080, 0x0080);
    assert_eq!(flags & 0x0100, 0);
}
