// libuhf-rs/libuhf/src/constants.rs
//! Wire-level protocol constants shared across the crate

/// Start-of-frame marker preceding every frame on the wire
pub const SOF: u8 = 0xFF;

/// Header bytes acquired before the argument block: SOF, length, opcode
pub const HEADER_LEN: usize = 3;

/// Trailing CRC length when CRC is enabled
pub const CRC_LEN: usize = 2;

/// Maximum argument bytes a single frame can carry (length is one byte)
pub const MAX_ARGS_LEN: usize = 255;

/// Leading bytes discarded while hunting for SOF before the stream is
/// declared unrecoverable
pub const MAX_RESYNC_BYTES: usize = 10;

/// CRC-CCITT polynomial and initial value
pub const CRC_POLY: u16 = 0x1021;
pub const CRC_INIT: u16 = 0xFFFF;

/// Largest timeout the device accepts in a single search command
pub const MAX_WIRE_TIMEOUT_MS: u64 = 65_535;

/// Duration of 0xFF filler written ahead of a frame to rouse a sleeping UART
pub const WAKEUP_PREAMBLE_MS: u64 = 100;

/// Baud rates swept during connect, in probe order
pub const BAUD_CANDIDATES: [u32; 8] = [9600, 115200, 921600, 19200, 38400, 57600, 230400, 460800];

/// Default baud rate when nothing has been remembered yet
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Offset of the response-type marker inside a streamed data frame payload
pub const STREAM_RESPONSE_TYPE_OFFSET: usize = 3;

/// Number of user GPIO pins reported in tag metadata
pub const GPIO_PIN_COUNT: u8 = 4;

/// Command opcodes
pub mod opcode {
    pub const WRITE_FLASH: u8 = 0x01;
    pub const READ_FLASH: u8 = 0x02;
    pub const VERSION: u8 = 0x03;
    pub const SET_BAUD_RATE: u8 = 0x06;
    pub const ERASE_FLASH: u8 = 0x07;
    pub const READ_TAG_ID_MULTIPLE: u8 = 0x22;
    pub const WRITE_TAG_ID: u8 = 0x23;
    pub const WRITE_TAG_DATA: u8 = 0x24;
    pub const LOCK_TAG: u8 = 0x25;
    pub const KILL_TAG: u8 = 0x26;
    pub const READ_TAG_DATA: u8 = 0x28;
    pub const GET_TAG_ID_BUFFER: u8 = 0x29;
    pub const CLEAR_TAG_ID_BUFFER: u8 = 0x2A;
    pub const BLOCK_WRITE: u8 = 0x2D;
    pub const MULTI_PROTOCOL_TAG_OP: u8 = 0x2F;
    pub const GET_ANTENNA_PORT: u8 = 0x61;
    pub const GET_READ_TX_POWER: u8 = 0x62;
    pub const GET_TAG_PROTOCOL: u8 = 0x63;
    pub const GET_WRITE_TX_POWER: u8 = 0x64;
    pub const GET_FREQ_HOP_TABLE: u8 = 0x65;
    pub const GET_USER_GPIO_INPUTS: u8 = 0x66;
    pub const GET_REGION: u8 = 0x67;
    pub const GET_POWER_MODE: u8 = 0x68;
    pub const GET_READER_OPTIONAL_PARAMS: u8 = 0x6A;
    pub const GET_PROTOCOL_PARAM: u8 = 0x6B;
    pub const GET_AVAILABLE_PROTOCOLS: u8 = 0x70;
    pub const GET_TEMPERATURE: u8 = 0x72;
    pub const SET_ANTENNA_PORT: u8 = 0x91;
    pub const SET_READ_TX_POWER: u8 = 0x92;
    pub const SET_TAG_PROTOCOL: u8 = 0x93;
    pub const SET_WRITE_TX_POWER: u8 = 0x94;
    pub const SET_FREQ_HOP_TABLE: u8 = 0x95;
    pub const SET_USER_GPIO_OUTPUTS: u8 = 0x96;
    pub const SET_REGION: u8 = 0x97;
    pub const SET_POWER_MODE: u8 = 0x98;
    pub const SET_READER_OPTIONAL_PARAMS: u8 = 0x9A;
    pub const SET_PROTOCOL_PARAM: u8 = 0x9B;

    /// Stream data frames reuse the search opcode
    pub const STREAM_DATA: u8 = READ_TAG_ID_MULTIPLE;
    /// The stop acknowledgement closing a stream session
    pub const STREAM_STOP_ACK: u8 = MULTI_PROTOCOL_TAG_OP;
}

/// Sub-commands carried by `MULTI_PROTOCOL_TAG_OP`
pub mod subcommand {
    pub const SEARCH: u8 = 0x01;
    pub const STOP_STREAMING: u8 = 0x02;
    pub const AUTH_RESPONSE: u8 = 0x03;
}

/// Response-type markers inside streamed data frames
pub mod stream_marker {
    pub const END_OF_CYCLE: u8 = 0x00;
    pub const TAG: u8 = 0x01;
    pub const STATUS: u8 = 0x02;
    pub const STATS: u8 = 0x03;
}

/// Poll interval of the streaming receive loop between stop checks
pub const STREAM_POLL_MS: u64 = 50;
