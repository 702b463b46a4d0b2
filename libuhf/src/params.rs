// libuhf-rs/libuhf/src/params.rs
//! Named reader settings.
//!
//! The reader reads its timeouts, baud rate, read plan and filtering
//! options from a [`ParamStore`] and writes back what it learns on connect.

use std::collections::HashMap;
use std::mem::discriminant;

use crate::read::plan::ReadPlan;
use crate::types::TagProtocol;
use crate::{Error, Result};

/// Well-known parameter names.
pub mod keys {
    pub const COMMAND_TIMEOUT: &str = "/reader/commandTimeout";
    pub const TRANSPORT_TIMEOUT: &str = "/reader/transportTimeout";
    pub const BAUD_RATE: &str = "/reader/baudRate";
    pub const READ_PLAN: &str = "/reader/read/plan";
    pub const ASYNC_ON_TIME: &str = "/reader/read/asyncOnTime";
    pub const ASYNC_OFF_TIME: &str = "/reader/read/asyncOffTime";
    pub const UNIQUE_BY_ANTENNA: &str = "/reader/tagReadData/uniqueByAntenna";
    pub const UNIQUE_BY_DATA: &str = "/reader/tagReadData/uniqueByData";
    pub const UNIQUE_BY_PROTOCOL: &str = "/reader/tagReadData/uniqueByProtocol";
    pub const RECORD_HIGHEST_RSSI: &str = "/reader/tagReadData/recordHighestRssi";
    pub const ENABLE_READ_FILTERING: &str = "/reader/tagReadData/enableReadFiltering";
    pub const VERSION_MODEL: &str = "/reader/version/model";
    pub const SUPPORTED_PROTOCOLS: &str = "/reader/version/supportedProtocols";
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamValue {
    Bool(bool),
    U32(u32),
    Str(String),
    Protocols(Vec<TagProtocol>),
    #[cfg_attr(feature = "serde", serde(skip))]
    ReadPlan(ReadPlan),
}

impl ParamValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            ParamValue::U32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_read_plan(&self) -> Option<&ReadPlan> {
        match self {
            ParamValue::ReadPlan(p) => Some(p),
            _ => None,
        }
    }
}

/// Key/value settings collaborator.
pub trait ParamStore: Send {
    fn get(&self, name: &str) -> Option<ParamValue>;

    fn set(&mut self, name: &str, value: ParamValue) -> Result<()>;

    fn get_u32(&self, name: &str) -> Option<u32> {
        self.get(name).and_then(|v| v.as_u32())
    }

    fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(|v| v.as_bool())
    }
}

/// In-memory store pre-populated with defaults. Values keep the type of
/// their default.
#[derive(Debug, Clone)]
pub struct MemoryParams {
    values: HashMap<String, ParamValue>,
}

impl Default for MemoryParams {
    fn default() -> Self {
        use keys::*;
        let defaults = [
            (COMMAND_TIMEOUT, ParamValue::U32(1000)),
            (TRANSPORT_TIMEOUT, ParamValue::U32(1000)),
            (BAUD_RATE, ParamValue::U32(crate::constants::DEFAULT_BAUD_RATE)),
            (READ_PLAN, ParamValue::ReadPlan(ReadPlan::default())),
            (ASYNC_ON_TIME, ParamValue::U32(250)),
            (ASYNC_OFF_TIME, ParamValue::U32(0)),
            (UNIQUE_BY_ANTENNA, ParamValue::Bool(false)),
            (UNIQUE_BY_DATA, ParamValue::Bool(false)),
            (UNIQUE_BY_PROTOCOL, ParamValue::Bool(true)),
            (RECORD_HIGHEST_RSSI, ParamValue::Bool(false)),
            (ENABLE_READ_FILTERING, ParamValue::Bool(true)),
            (VERSION_MODEL, ParamValue::Str(String::new())),
            (SUPPORTED_PROTOCOLS, ParamValue::Protocols(Vec::new())),
        ];
        Self {
            values: defaults
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }
}

impl MemoryParams {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ParamStore for MemoryParams {
    fn get(&self, name: &str) -> Option<ParamValue> {
        self.values.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: ParamValue) -> Result<()> {
        let Some(current) = self.values.get_mut(name) else {
            return Err(Error::InvalidArgument(format!("unknown parameter {}", name)));
        };
        if discriminant(current) != discriminant(&value) {
            return Err(Error::InvalidArgument(format!(
                "parameter {} expects {:?}-typed value, got {:?}",
                name, current, value
            )));
        }
        if let ParamValue::ReadPlan(plan) = &value {
            plan.validate()?;
        }
        *current = value;
        Ok(())
    }
}
