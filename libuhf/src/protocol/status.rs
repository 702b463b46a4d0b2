// libuhf-rs/libuhf/src/protocol/status.rs
//! Device status codes and their typed fault families.

use std::fmt;

use thiserror::Error;

/// Raw status codes reported in the first two argument bytes of a response.
pub mod codes {
    pub const MSG_WRONG_NUMBER_OF_DATA: u16 = 0x0100;
    pub const INVALID_OPCODE: u16 = 0x0101;
    pub const UNIMPLEMENTED_OPCODE: u16 = 0x0102;
    pub const MSG_POWER_TOO_HIGH: u16 = 0x0103;
    pub const MSG_INVALID_FREQ_RECEIVED: u16 = 0x0104;
    pub const MSG_INVALID_PARAMETER_VALUE: u16 = 0x0105;
    pub const MSG_POWER_TOO_LOW: u16 = 0x0106;
    pub const UNIMPLEMENTED_FEATURE: u16 = 0x0109;
    pub const INVALID_BAUD_RATE: u16 = 0x010A;
    pub const INVALID_REGION: u16 = 0x010B;
    pub const INVALID_LICENSE_KEY: u16 = 0x010C;

    pub const BL_INVALID_IMAGE_CRC: u16 = 0x0200;
    pub const BL_INVALID_APP_END_ADDR: u16 = 0x0201;

    pub const FLASH_BAD_ERASE_PASSWORD: u16 = 0x0300;
    pub const FLASH_BAD_WRITE_PASSWORD: u16 = 0x0301;
    pub const FLASH_UNDEFINED_SECTOR: u16 = 0x0302;
    pub const FLASH_ILLEGAL_SECTOR: u16 = 0x0303;
    pub const FLASH_WRITE_TO_NON_ERASED_AREA: u16 = 0x0304;
    pub const FLASH_WRITE_TO_ILLEGAL_SECTOR: u16 = 0x0305;
    pub const FLASH_VERIFY_FAILED: u16 = 0x0306;

    pub const NO_TAGS_FOUND: u16 = 0x0400;
    pub const NO_PROTOCOL_DEFINED: u16 = 0x0401;
    pub const INVALID_PROTOCOL_SPECIFIED: u16 = 0x0402;
    pub const WRITE_PASSED_LOCK_FAILED: u16 = 0x0403;
    pub const PROTOCOL_NO_DATA_READ: u16 = 0x0404;
    pub const AFE_NOT_ON: u16 = 0x0405;
    pub const PROTOCOL_WRITE_FAILED: u16 = 0x0406;
    pub const NOT_IMPLEMENTED_FOR_THIS_PROTOCOL: u16 = 0x0407;
    pub const PROTOCOL_INVALID_WRITE_DATA: u16 = 0x0408;
    pub const PROTOCOL_INVALID_ADDRESS: u16 = 0x0409;
    pub const GENERAL_TAG_ERROR: u16 = 0x040A;
    pub const DATA_TOO_LARGE: u16 = 0x040B;
    pub const PROTOCOL_INVALID_KILL_PASSWORD: u16 = 0x040C;
    pub const PROTOCOL_KILL_FAILED: u16 = 0x040E;
    pub const PROTOCOL_BIT_DECODING_FAILED: u16 = 0x040F;
    pub const PROTOCOL_INVALID_EPC: u16 = 0x0410;
    pub const PROTOCOL_INVALID_NUM_DATA: u16 = 0x0411;
    pub const GEN2_PROTOCOL_OTHER_ERROR: u16 = 0x0420;
    pub const GEN2_PROTOCOL_MEMORY_OVERRUN_BAD_PC: u16 = 0x0423;
    pub const GEN2_PROTOCOL_MEMORY_LOCKED: u16 = 0x0424;
    pub const GEN2_PROTOCOL_INSUFFICIENT_POWER: u16 = 0x042B;
    pub const GEN2_PROTOCOL_NON_SPECIFIC_ERROR: u16 = 0x042F;
    pub const GEN2_PROTOCOL_UNKNOWN_ERROR: u16 = 0x0430;

    pub const AHAL_INVALID_FREQ: u16 = 0x0500;
    pub const AHAL_CHANNEL_OCCUPIED: u16 = 0x0501;
    pub const AHAL_TRANSMITTER_ON: u16 = 0x0502;
    pub const ANTENNA_NOT_CONNECTED: u16 = 0x0503;
    pub const TEMPERATURE_EXCEED_LIMITS: u16 = 0x0504;
    pub const HIGH_RETURN_LOSS: u16 = 0x0505;
    pub const INVALID_ANTENNA_CONFIG: u16 = 0x0507;

    pub const TAG_ID_BUFFER_NOT_ENOUGH_TAGS_AVAILABLE: u16 = 0x0600;
    pub const TAG_ID_BUFFER_FULL: u16 = 0x0601;
    pub const TAG_ID_BUFFER_REPEATED_TAG_ID: u16 = 0x0602;
    pub const TAG_ID_BUFFER_NUM_TAG_TOO_LARGE: u16 = 0x0603;
    pub const TAG_ID_BUFFER_AUTH_REQUEST: u16 = 0x0604;

    pub const SYSTEM_UNKNOWN_ERROR: u16 = 0x7F00;
    pub const TM_ASSERT_FAILED: u16 = 0x7F01;
}

/// A raw device status code with a human-readable name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FaultCode(u16);

impl FaultCode {
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    pub fn name(&self) -> &'static str {
        use codes::*;
        match self.0 {
            MSG_WRONG_NUMBER_OF_DATA => "wrong number of data",
            INVALID_OPCODE => "invalid opcode",
            UNIMPLEMENTED_OPCODE => "unimplemented opcode",
            MSG_POWER_TOO_HIGH => "power too high",
            MSG_INVALID_FREQ_RECEIVED => "invalid frequency",
            MSG_INVALID_PARAMETER_VALUE => "invalid parameter value",
            MSG_POWER_TOO_LOW => "power too low",
            UNIMPLEMENTED_FEATURE => "unimplemented feature",
            INVALID_BAUD_RATE => "invalid baud rate",
            INVALID_REGION => "invalid region",
            INVALID_LICENSE_KEY => "invalid license key",
            BL_INVALID_IMAGE_CRC => "invalid image crc",
            BL_INVALID_APP_END_ADDR => "invalid application end address",
            FLASH_BAD_ERASE_PASSWORD => "bad erase password",
            FLASH_BAD_WRITE_PASSWORD => "bad write password",
            FLASH_UNDEFINED_SECTOR => "undefined sector",
            FLASH_ILLEGAL_SECTOR => "illegal sector",
            FLASH_WRITE_TO_NON_ERASED_AREA => "write to non-erased area",
            FLASH_WRITE_TO_ILLEGAL_SECTOR => "write to illegal sector",
            FLASH_VERIFY_FAILED => "verify failed",
            NO_TAGS_FOUND => "no tags found",
            NO_PROTOCOL_DEFINED => "no protocol defined",
            INVALID_PROTOCOL_SPECIFIED => "invalid protocol specified",
            WRITE_PASSED_LOCK_FAILED => "write passed, lock failed",
            PROTOCOL_NO_DATA_READ => "no data read",
            AFE_NOT_ON => "analog front end not on",
            PROTOCOL_WRITE_FAILED => "write failed",
            NOT_IMPLEMENTED_FOR_THIS_PROTOCOL => "not implemented for this protocol",
            PROTOCOL_INVALID_WRITE_DATA => "invalid write data",
            PROTOCOL_INVALID_ADDRESS => "invalid address",
            GENERAL_TAG_ERROR => "general tag error",
            DATA_TOO_LARGE => "data too large",
            PROTOCOL_INVALID_KILL_PASSWORD => "invalid kill password",
            PROTOCOL_KILL_FAILED => "kill failed",
            PROTOCOL_BIT_DECODING_FAILED => "bit decoding failed",
            PROTOCOL_INVALID_EPC => "invalid epc",
            PROTOCOL_INVALID_NUM_DATA => "invalid number of data",
            GEN2_PROTOCOL_OTHER_ERROR => "gen2 other error",
            GEN2_PROTOCOL_MEMORY_OVERRUN_BAD_PC => "gen2 memory overrun or bad pc",
            GEN2_PROTOCOL_MEMORY_LOCKED => "gen2 memory locked",
            GEN2_PROTOCOL_INSUFFICIENT_POWER => "gen2 insufficient power",
            GEN2_PROTOCOL_NON_SPECIFIC_ERROR => "gen2 non-specific error",
            GEN2_PROTOCOL_UNKNOWN_ERROR => "gen2 unknown error",
            AHAL_INVALID_FREQ => "invalid frequency",
            AHAL_CHANNEL_OCCUPIED => "channel occupied",
            AHAL_TRANSMITTER_ON => "transmitter on",
            ANTENNA_NOT_CONNECTED => "antenna not connected",
            TEMPERATURE_EXCEED_LIMITS => "temperature exceeds limits",
            HIGH_RETURN_LOSS => "high return loss",
            INVALID_ANTENNA_CONFIG => "invalid antenna configuration",
            TAG_ID_BUFFER_NOT_ENOUGH_TAGS_AVAILABLE => "not enough tags available",
            TAG_ID_BUFFER_FULL => "tag id buffer full",
            TAG_ID_BUFFER_REPEATED_TAG_ID => "repeated tag id",
            TAG_ID_BUFFER_NUM_TAG_TOO_LARGE => "number of tags too large",
            TAG_ID_BUFFER_AUTH_REQUEST => "tag authentication request",
            SYSTEM_UNKNOWN_ERROR => "unknown system error",
            TM_ASSERT_FAILED => "assertion failed",
            _ => "unknown",
        }
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x} ({})", self.0, self.name())
    }
}

/// Device-reported fault, one variant per status code family.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Fault {
    #[error("command fault {0}")]
    Command(FaultCode),
    #[error("bootloader fault {0}")]
    Bootloader(FaultCode),
    #[error("flash fault {0}")]
    Flash(FaultCode),
    #[error("no tags found")]
    NoTagsFound,
    #[error("tag protocol fault {0}")]
    Protocol(FaultCode),
    #[error("RF/antenna fault {0}")]
    Rf(FaultCode),
    #[error("tag id buffer full")]
    TagBufferFull,
    #[error("tag authentication requested")]
    TagAuthRequest,
    #[error("tag buffer fault {0}")]
    TagBuffer(FaultCode),
    #[error("system fault {0}")]
    System(FaultCode),
    #[error("unknown fault {0}")]
    Unknown(FaultCode),
}

impl Fault {
    /// Classify a non-zero status word. Returns `None` for success.
    pub fn from_status(status: u16) -> Option<Self> {
        if status == 0 {
            return None;
        }
        let code = FaultCode::new(status);
        let fault = match status {
            codes::NO_TAGS_FOUND => Self::NoTagsFound,
            codes::TAG_ID_BUFFER_FULL => Self::TagBufferFull,
            codes::TAG_ID_BUFFER_AUTH_REQUEST => Self::TagAuthRequest,
            _ => match status >> 8 {
                0x01 => Self::Command(code),
                0x02 => Self::Bootloader(code),
                0x03 => Self::Flash(code),
                0x04 => Self::Protocol(code),
                0x05 => Self::Rf(code),
                0x06 => Self::TagBuffer(code),
                0x07 | 0x7F => Self::System(code),
                _ => Self::Unknown(code),
            },
        };
        Some(fault)
    }

    pub fn code(&self) -> u16 {
        match self {
            Self::NoTagsFound => codes::NO_TAGS_FOUND,
            Self::TagBufferFull => codes::TAG_ID_BUFFER_FULL,
            Self::TagAuthRequest => codes::TAG_ID_BUFFER_AUTH_REQUEST,
            Self::Command(c)
            | Self::Bootloader(c)
            | Self::Flash(c)
            | Self::Protocol(c)
            | Self::Rf(c)
            | Self::TagBuffer(c)
            | Self::System(c)
            | Self::Unknown(c) => c.as_u16(),
        }
    }

    /// Faults the hardware recovers from on its own while streaming.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.code(),
            codes::ANTENNA_NOT_CONNECTED
                | codes::TEMPERATURE_EXCEED_LIMITS
                | codes::HIGH_RETURN_LOSS
                | codes::AHAL_CHANNEL_OCCUPIED
        )
    }

    /// Hard system / assert faults that must never be swallowed.
    pub fn is_system(&self) -> bool {
        matches!(self, Self::System(_))
    }
}
