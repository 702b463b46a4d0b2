//! Test support helpers intended for use by unit and integration tests.
//!
//! These helpers build device replies for the scripted `MockTransport` so
//! tests across the crate and tests/ directory share one idea of what the
//! module sends back.
#![allow(dead_code)]

use std::sync::Arc;

use crate::antenna::{AntennaMap, SharedAntennaMap};
use crate::constants::{SOF, opcode, stream_marker};
use crate::params::MemoryParams;
use crate::protocol::crc16;
use crate::reader::channel::Channel;
use crate::reader::dispatch::Dispatcher;
use crate::reader::handle::{Connected, Reader};
use crate::reader::models::create_model_for;
use crate::tag::MetadataFlags;
use crate::transport::MockTransport;
use crate::types::{ModelFamily, PowerMode, TagProtocol};
use crate::Result;

/// Search options byte echoed in search and stream replies.
const OPTIONS: u8 = 0x10;
/// Flags word echoed in stream frames (continuous search).
const STREAM_FLAGS: [u8; 2] = [0x00, 0x40];
/// CRC word appended to every synthesised EPC.
const EPC_CRC: [u8; 2] = [0xAB, 0xCD];

/// A complete reply frame: `[SOF][len][opcode][status u16][data][crc]`.
#[doc(hidden)]
pub fn reply(opcode: u8, status: u16, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + 4);
    body.push((data.len() + 2) as u8);
    body.push(opcode);
    body.extend_from_slice(&status.to_be_bytes());
    body.extend_from_slice(data);
    let crc = crc16(&body);
    let mut out = vec![SOF];
    out.extend(body);
    out.extend_from_slice(&crc.to_be_bytes());
    out
}

/// Reply frame for a link with the CRC trailer switched off.
#[doc(hidden)]
pub fn reply_without_crc(opcode: u8, status: u16, data: &[u8]) -> Vec<u8> {
    let mut out = reply(opcode, status, data);
    out.truncate(out.len() - 2);
    out
}

/// "No tags found" answer to a search.
#[doc(hidden)]
pub fn no_tags(opcode: u8) -> Vec<u8> {
    reply(opcode, crate::protocol::status::codes::NO_TAGS_FOUND, &[])
}

/// Successful single-protocol search that found `count` tags.
#[doc(hidden)]
pub fn search_reply(count: u32) -> Vec<u8> {
    let mut data = vec![OPTIONS, 0x00, 0x00];
    data.extend_from_slice(&count.to_be_bytes());
    reply(opcode::READ_TAG_ID_MULTIPLE, 0, &data)
}

/// Successful multi-protocol search that found `count` tags.
#[doc(hidden)]
pub fn multi_search_reply(count: u32) -> Vec<u8> {
    let mut data = vec![0x01, 0x00, 0x00];
    data.extend_from_slice(&count.to_be_bytes());
    reply(opcode::MULTI_PROTOCOL_TAG_OP, 0, &data)
}

/// One synthetic tag record.
#[doc(hidden)]
#[derive(Debug, Clone)]
pub struct TagSpec {
    epc: Vec<u8>,
    antenna: u8,
    count: u8,
    rssi: i8,
    protocol: TagProtocol,
    data: Vec<u8>,
    corrupt: bool,
}

impl TagSpec {
    pub fn new(epc: &[u8]) -> Self {
        Self {
            epc: epc.to_vec(),
            antenna: 0x11,
            count: 1,
            rssi: -55,
            protocol: TagProtocol::Gen2,
            data: Vec::new(),
            corrupt: false,
        }
    }

    /// Wire antenna byte, `(tx << 4) | rx`.
    pub fn antenna(mut self, wire: u8) -> Self {
        self.antenna = wire;
        self
    }

    pub fn count(mut self, n: u8) -> Self {
        self.count = n;
        self
    }

    pub fn rssi(mut self, rssi: i8) -> Self {
        self.rssi = rssi;
        self
    }

    pub fn protocol(mut self, protocol: TagProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn data(mut self, data: &[u8]) -> Self {
        self.data = data.to_vec();
        self
    }

    /// PC bits announcing more words than the id block carries.
    pub fn corrupt(mut self) -> Self {
        self.corrupt = true;
        self
    }

    /// Encode the metadata fields selected by `meta`, then the id block.
    pub fn encode(&self, meta: MetadataFlags) -> Vec<u8> {
        let mut out = Vec::new();
        if meta.contains(MetadataFlags::READ_COUNT) {
            out.push(self.count);
        }
        if meta.contains(MetadataFlags::RSSI) {
            out.push(self.rssi as u8);
        }
        if meta.contains(MetadataFlags::ANTENNA) {
            out.push(self.antenna);
        }
        if meta.contains(MetadataFlags::FREQUENCY) {
            out.extend_from_slice(&915_250u32.to_be_bytes()[1..]);
        }
        if meta.contains(MetadataFlags::TIMESTAMP) {
            out.extend_from_slice(&10u32.to_be_bytes());
        }
        if meta.contains(MetadataFlags::PHASE) {
            out.extend_from_slice(&90u16.to_be_bytes());
        }
        if meta.contains(MetadataFlags::PROTOCOL) {
            out.push(self.protocol.code());
        }
        if meta.contains(MetadataFlags::DATA) {
            out.extend_from_slice(&((self.data.len() * 8) as u16).to_be_bytes());
            out.extend_from_slice(&self.data);
        }
        if meta.contains(MetadataFlags::GPIO) {
            out.push(0x00);
        }

        let block = if self.corrupt {
            vec![0x32, 0x00, 0x80]
        } else {
            let mut b = Vec::new();
            if self.protocol.has_pc_word() {
                b.extend_from_slice(&[0x30, 0x00]);
            }
            b.extend_from_slice(&self.epc);
            b.extend_from_slice(&EPC_CRC);
            b
        };
        out.extend_from_slice(&((block.len() * 8) as u16).to_be_bytes());
        out.extend(block);
        out
    }
}

/// Tag-buffer page holding `tags`.
#[doc(hidden)]
pub fn tag_buffer_reply(meta: MetadataFlags, tags: &[TagSpec]) -> Vec<u8> {
    let mut data = meta.bits().to_be_bytes().to_vec();
    data.push(0x00);
    data.push(tags.len() as u8);
    for t in tags {
        data.extend(t.encode(meta));
    }
    reply(opcode::GET_TAG_ID_BUFFER, 0, &data)
}

fn stream_frame(status: u16, marker: Option<u8>, payload: &[u8]) -> Vec<u8> {
    let mut data = vec![OPTIONS];
    data.extend_from_slice(&STREAM_FLAGS);
    if let Some(m) = marker {
        data.push(m);
    }
    data.extend_from_slice(payload);
    reply(opcode::STREAM_DATA, status, &data)
}

/// Streamed tag: `[meta u16][record]` after the tag marker.
#[doc(hidden)]
pub fn stream_tag_frame(meta: MetadataFlags, tag: &TagSpec) -> Vec<u8> {
    let mut payload = meta.bits().to_be_bytes().to_vec();
    payload.extend(tag.encode(meta));
    stream_frame(0, Some(stream_marker::TAG), &payload)
}

#[doc(hidden)]
pub fn stream_status_frame(fields: u16, body: &[u8]) -> Vec<u8> {
    let mut payload = fields.to_be_bytes().to_vec();
    payload.extend_from_slice(body);
    stream_frame(0, Some(stream_marker::STATUS), &payload)
}

#[doc(hidden)]
pub fn stream_stats_frame(fields: u16, body: &[u8]) -> Vec<u8> {
    let mut payload = fields.to_be_bytes().to_vec();
    payload.extend_from_slice(body);
    stream_frame(0, Some(stream_marker::STATS), &payload)
}

#[doc(hidden)]
pub fn end_of_cycle_frame() -> Vec<u8> {
    stream_frame(0, Some(stream_marker::END_OF_CYCLE), &[])
}

/// Stream data frame carrying a fault status and no payload.
#[doc(hidden)]
pub fn stream_fault_frame(status: u16) -> Vec<u8> {
    reply(opcode::STREAM_DATA, status, &[])
}

/// Authentication challenge: `[opts][flags u16][meta u16][record]`.
#[doc(hidden)]
pub fn auth_request_frame(meta: MetadataFlags, tag: &TagSpec) -> Vec<u8> {
    let mut payload = meta.bits().to_be_bytes().to_vec();
    payload.extend(tag.encode(meta));
    stream_frame(
        crate::protocol::status::codes::TAG_ID_BUFFER_AUTH_REQUEST,
        None,
        &payload,
    )
}

#[doc(hidden)]
pub fn stop_ack() -> Vec<u8> {
    reply(opcode::STREAM_STOP_ACK, 0, &[0x00, 0x00, 0x02])
}

/// Version reply for hardware family byte `family` and protocol bitmask
/// `protocols` (Gen2 is bit 0x10).
#[doc(hidden)]
pub fn version_reply(family: u8, protocols: u32) -> Vec<u8> {
    let mut data = vec![0x12, 0x01, 0x00, 0x00];
    data.extend_from_slice(&[family, 0x00, 0x00, 0x01]);
    data.extend_from_slice(&[0x20, 0x24, 0x05, 0x01]);
    data.extend_from_slice(&[0x01, 0x09, 0x00, 0x02]);
    data.extend_from_slice(&protocols.to_be_bytes());
    reply(opcode::VERSION, 0, &data)
}

#[doc(hidden)]
pub fn product_group_reply(group: u16) -> Vec<u8> {
    let mut data = vec![0x01, 0x12];
    data.extend_from_slice(&group.to_be_bytes());
    reply(opcode::GET_READER_OPTIONAL_PARAMS, 0, &data)
}

/// Dispatcher over `mock` for `family`, awake, with a short command
/// timeout. No protocol is cached.
#[doc(hidden)]
pub fn dispatcher_for(mock: &MockTransport, family: ModelFamily) -> Dispatcher {
    dispatcher_with_timeouts(mock, family, 50, 100)
}

/// [`dispatcher_for`] with explicit transport and command timeouts.
#[doc(hidden)]
pub fn dispatcher_with_timeouts(
    mock: &MockTransport,
    family: ModelFamily,
    transport_ms: u64,
    command_ms: u64,
) -> Dispatcher {
    let model = create_model_for(family);
    let ports = model.physical_ports();
    let antennas = SharedAntennaMap::new(AntennaMap::monostatic(&ports), ports);
    let mut channel = Channel::new(Box::new(mock.clone()), transport_ms);
    channel.set_power_mode(PowerMode::Full);
    channel.set_wakeup_supported(model.supports_wakeup_preamble());
    Dispatcher::new(channel.into_link(), Arc::clone(&model), antennas, command_ms)
}

/// Script every reply of a successful connect: version at any baud,
/// product group, power mode `power`, protocol list and protocol set.
#[doc(hidden)]
pub fn script_connect(mock: &MockTransport, family: u8, power: PowerMode) {
    mock.on_opcode(opcode::VERSION, vec![version_reply(family, 0x10)]);
    mock.on_opcode(opcode::GET_READER_OPTIONAL_PARAMS, vec![product_group_reply(0)]);
    let mode = power.code().unwrap_or(0);
    mock.on_opcode(opcode::GET_POWER_MODE, vec![reply(opcode::GET_POWER_MODE, 0, &[mode])]);
    mock.on_opcode(
        opcode::GET_AVAILABLE_PROTOCOLS,
        vec![reply(opcode::GET_AVAILABLE_PROTOCOLS, 0, &[0x00, 0x05])],
    );
    mock.always(opcode::SET_TAG_PROTOCOL, vec![reply(opcode::SET_TAG_PROTOCOL, 0, &[])]);
    mock.always(
        opcode::SET_READER_OPTIONAL_PARAMS,
        vec![reply(opcode::SET_READER_OPTIONAL_PARAMS, 0, &[])],
    );
}

/// A reader connected over `mock` as hardware family byte `family`, with
/// short timeouts.
#[doc(hidden)]
pub fn connected_reader(mock: &MockTransport, family: u8) -> Result<Reader<Connected>> {
    use crate::params::{ParamStore, ParamValue, keys};

    script_connect(mock, family, PowerMode::Full);
    let mut params = MemoryParams::new();
    params.set(keys::COMMAND_TIMEOUT, ParamValue::U32(100))?;
    params.set(keys::TRANSPORT_TIMEOUT, ParamValue::U32(50))?;
    Reader::new_with_transport(Box::new(mock.clone()), Box::new(params)).connect("mock")
}
