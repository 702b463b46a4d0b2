// libuhf-rs/libuhf/src/reader/dispatch.rs
//! Typed commands over the wire channel.

use std::sync::Arc;

use log::debug;

use crate::antenna::SharedAntennaMap;
use crate::constants::MAX_WIRE_TIMEOUT_MS;
use crate::protocol::filter::TagFilter;
use crate::protocol::settings::{
    ConfigValue, ProtocolConfig, ProtocolParam, ReaderConfigKey, WriteReplyTimeout,
};
use crate::protocol::tagop::{TagOp, TagOpResult};
use crate::protocol::{Command, MultiSearchRequest, Response, SearchRequest, SearchSummary};
use crate::reader::channel::Link;
use crate::reader::models::DeviceModel;
use crate::tag::{MetadataFlags, ParseContext, TagReadRecord, parse_records};
use crate::types::{GpioPin, PowerMode, ProductGroup, Region, TagProtocol, VersionInfo};
use crate::{Error, Result};

/// Outcome of one search command. "No tags" is an ordinary answer, not a
/// fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(SearchSummary),
    Empty,
}

impl SearchOutcome {
    pub fn tag_count(&self) -> u32 {
        match self {
            SearchOutcome::Found(s) => s.tag_count,
            SearchOutcome::Empty => 0,
        }
    }
}

/// Command front end shared by the reader handle and the read engines.
#[derive(Clone)]
pub struct Dispatcher {
    link: Link,
    model: Arc<dyn DeviceModel>,
    antennas: SharedAntennaMap,
    command_timeout_ms: u64,
}

fn unexpected(cmd: &Command, resp: Response) -> Error {
    Error::Parse(format!(
        "unexpected reply to {:#04x}: {:?}",
        cmd.command_code(),
        resp
    ))
}

impl Dispatcher {
    pub fn new(
        link: Link,
        model: Arc<dyn DeviceModel>,
        antennas: SharedAntennaMap,
        command_timeout_ms: u64,
    ) -> Self {
        Self {
            link,
            model,
            antennas,
            command_timeout_ms,
        }
    }

    pub fn link(&self) -> &Link {
        &self.link
    }

    pub fn model(&self) -> &Arc<dyn DeviceModel> {
        &self.model
    }

    pub fn set_model(&mut self, model: Arc<dyn DeviceModel>) {
        self.link
            .lock()
            .set_wakeup_supported(model.supports_wakeup_preamble());
        self.model = model;
    }

    pub fn antennas(&self) -> &SharedAntennaMap {
        &self.antennas
    }

    pub fn command_timeout_ms(&self) -> u64 {
        self.command_timeout_ms
    }

    pub fn set_command_timeout_ms(&mut self, ms: u64) {
        self.command_timeout_ms = ms;
    }

    /// Execute a command with the configured command timeout.
    pub fn execute(&self, cmd: &Command) -> Result<Response> {
        self.execute_with_timeout(cmd, self.command_timeout_ms)
    }

    /// Encode (validating first), transact and decode.
    pub fn execute_with_timeout(&self, cmd: &Command, timeout_ms: u64) -> Result<Response> {
        let payload = cmd.encode()?;
        let frame = self.link.lock().transact(&payload, timeout_ms)?;
        Response::decode(cmd, frame.data())
    }

    fn ack(&self, cmd: Command) -> Result<()> {
        match self.execute(&cmd)? {
            Response::Ack => Ok(()),
            other => Err(unexpected(&cmd, other)),
        }
    }

    pub fn version(&self) -> Result<VersionInfo> {
        let cmd = Command::Version;
        match self.execute(&cmd)? {
            Response::Version(v) => Ok(v),
            other => Err(unexpected(&cmd, other)),
        }
    }

    /// Ask the module to switch baud rate, then follow it on our side.
    pub fn set_baud_rate(&self, baud: u32) -> Result<()> {
        self.ack(Command::SetBaudRate(baud))?;
        self.link.lock().transport_mut().set_baud_rate(baud)
    }

    pub fn region(&self) -> Result<Region> {
        let cmd = Command::GetRegion;
        match self.execute(&cmd)? {
            Response::Region(r) => Ok(r),
            other => Err(unexpected(&cmd, other)),
        }
    }

    pub fn set_region(&self, region: Region) -> Result<()> {
        self.ack(Command::SetRegion(region))
    }

    pub fn protocol(&self) -> Result<TagProtocol> {
        let cmd = Command::GetProtocol;
        match self.execute(&cmd)? {
            Response::Protocol(p) => {
                self.link.lock().set_current_protocol(Some(p));
                Ok(p)
            }
            other => Err(unexpected(&cmd, other)),
        }
    }

    pub fn set_protocol(&self, protocol: TagProtocol) -> Result<()> {
        self.ack(Command::SetProtocol(protocol))?;
        self.link.lock().set_current_protocol(Some(protocol));
        Ok(())
    }

    /// Switch protocol only when the cached one differs.
    pub fn ensure_protocol(&self, protocol: TagProtocol) -> Result<()> {
        if self.link.lock().current_protocol() == Some(protocol) {
            return Ok(());
        }
        self.set_protocol(protocol)
    }

    pub fn available_protocols(&self) -> Result<Vec<TagProtocol>> {
        let cmd = Command::GetAvailableProtocols;
        match self.execute(&cmd)? {
            Response::Protocols(p) => Ok(p),
            other => Err(unexpected(&cmd, other)),
        }
    }

    /// Logical antenna currently selected for standalone operations.
    pub fn antenna_port(&self) -> Result<u32> {
        let cmd = Command::GetAntennaPort;
        match self.execute(&cmd)? {
            Response::AntennaPort { tx, rx } => {
                self.antennas.load().translate_wire(((tx & 0x0F) << 4) | (rx & 0x0F))
            }
            other => Err(unexpected(&cmd, other)),
        }
    }

    pub fn set_antenna_port(&self, logical: u32) -> Result<()> {
        let (tx, rx) = self.antennas.load().tx_rx(logical).ok_or_else(|| {
            Error::InvalidArgument(format!("antenna {} is not in the antenna map", logical))
        })?;
        self.ack(Command::SetAntennaPort { tx, rx })
    }

    /// Physical ports and whether something is connected to each.
    pub fn detect_antennas(&self) -> Result<Vec<(u8, bool)>> {
        let cmd = Command::DetectAntennas;
        match self.execute(&cmd)? {
            Response::DetectedAntennas(d) => Ok(d),
            other => Err(unexpected(&cmd, other)),
        }
    }

    fn check_power(range: (i16, i16), centi_dbm: i16) -> Result<()> {
        if centi_dbm < range.0 || centi_dbm > range.1 {
            return Err(Error::InvalidArgument(format!(
                "power {} cdBm outside {}..={}",
                centi_dbm, range.0, range.1
            )));
        }
        Ok(())
    }

    pub fn read_power(&self) -> Result<i16> {
        let cmd = Command::GetReadPower;
        match self.execute(&cmd)? {
            Response::Power(p) => Ok(p),
            other => Err(unexpected(&cmd, other)),
        }
    }

    pub fn set_read_power(&self, centi_dbm: i16) -> Result<()> {
        Self::check_power(self.model.read_power_range(), centi_dbm)?;
        self.ack(Command::SetReadPower(centi_dbm))
    }

    pub fn write_power(&self) -> Result<i16> {
        let cmd = Command::GetWritePower;
        match self.execute(&cmd)? {
            Response::Power(p) => Ok(p),
            other => Err(unexpected(&cmd, other)),
        }
    }

    pub fn set_write_power(&self, centi_dbm: i16) -> Result<()> {
        Self::check_power(self.model.write_power_range(), centi_dbm)?;
        self.ack(Command::SetWritePower(centi_dbm))
    }

    /// Query the power mode and refresh the wakeup cache.
    pub fn power_mode(&self) -> Result<PowerMode> {
        let cmd = Command::GetPowerMode;
        match self.execute(&cmd)? {
            Response::PowerMode(m) => {
                self.link.lock().set_power_mode(m);
                Ok(m)
            }
            other => Err(unexpected(&cmd, other)),
        }
    }

    pub fn set_power_mode(&self, mode: PowerMode) -> Result<()> {
        self.ack(Command::SetPowerMode(mode))?;
        self.link.lock().set_power_mode(mode);
        Ok(())
    }

    pub fn reader_config(&self, key: ReaderConfigKey) -> Result<ConfigValue> {
        let cmd = Command::GetReaderConfig(key);
        match self.execute(&cmd)? {
            Response::ReaderConfig(v) => Ok(v),
            other => Err(unexpected(&cmd, other)),
        }
    }

    pub fn set_reader_config(&self, key: ReaderConfigKey, value: ConfigValue) -> Result<()> {
        self.ack(Command::SetReaderConfig(key, value))
    }

    pub fn product_group(&self) -> Result<ProductGroup> {
        let value = self.reader_config(ReaderConfigKey::ProductGroupId)?;
        let id = value
            .as_u32()
            .ok_or_else(|| Error::Parse(format!("product group {:?}", value)))?;
        Ok(ProductGroup::from(id as u16))
    }

    pub fn protocol_config(&self, param: ProtocolParam) -> Result<ProtocolConfig> {
        let cmd = Command::GetProtocolConfig(param);
        match self.execute(&cmd)? {
            Response::ProtocolConfig(c) => Ok(c),
            other => Err(unexpected(&cmd, other)),
        }
    }

    pub fn set_protocol_config(&self, config: ProtocolConfig) -> Result<()> {
        self.ack(Command::SetProtocolConfig(config))
    }

    /// Gen2 write-reply wait, 1000..=21000 µs.
    pub fn set_write_reply_timeout(&self, timeout: WriteReplyTimeout) -> Result<()> {
        self.set_protocol_config(ProtocolConfig::Gen2WriteReplyTimeout(timeout))
    }

    pub fn hop_table(&self) -> Result<Vec<u32>> {
        let cmd = Command::GetHopTable;
        match self.execute(&cmd)? {
            Response::HopTable(t) => Ok(t),
            other => Err(unexpected(&cmd, other)),
        }
    }

    pub fn set_hop_table(&self, freqs_khz: Vec<u32>) -> Result<()> {
        self.ack(Command::SetHopTable(freqs_khz))
    }

    pub fn hop_time(&self) -> Result<u32> {
        let cmd = Command::GetHopTime;
        match self.execute(&cmd)? {
            Response::HopTime(ms) => Ok(ms),
            other => Err(unexpected(&cmd, other)),
        }
    }

    pub fn set_hop_time(&self, ms: u32) -> Result<()> {
        self.ack(Command::SetHopTime(ms))
    }

    /// Module temperature in °C.
    pub fn temperature(&self) -> Result<i8> {
        let cmd = Command::GetTemperature;
        match self.execute(&cmd)? {
            Response::Temperature(t) => Ok(t),
            other => Err(unexpected(&cmd, other)),
        }
    }

    pub fn gpio_inputs(&self) -> Result<Vec<GpioPin>> {
        let cmd = Command::GetGpioInputs;
        match self.execute(&cmd)? {
            Response::GpioInputs(p) => Ok(p),
            other => Err(unexpected(&cmd, other)),
        }
    }

    pub fn set_gpio_output(&self, pin: u8, high: bool) -> Result<()> {
        self.ack(Command::SetGpioOutput { pin, high })
    }

    pub fn set_gpio_direction(&self, pin: u8, output: bool, high: bool) -> Result<()> {
        self.ack(Command::SetGpioDirection { pin, output, high })
    }

    pub fn erase_flash(&self, password: u32, sector: u8) -> Result<()> {
        self.ack(Command::EraseFlash { password, sector })
    }

    pub fn write_flash(&self, password: u32, sector: u8, address: u32, data: Vec<u8>) -> Result<()> {
        self.ack(Command::WriteFlash {
            password,
            address,
            sector,
            data,
        })
    }

    pub fn read_flash(&self, sector: u8, address: u32, length: u8) -> Result<Vec<u8>> {
        let cmd = Command::ReadFlash {
            sector,
            address,
            length,
        };
        match self.execute(&cmd)? {
            Response::FlashData(d) => Ok(d),
            other => Err(unexpected(&cmd, other)),
        }
    }

    fn search(&self, cmd: Command, search_ms: u16) -> Result<SearchOutcome> {
        let timeout = search_ms as u64 + self.command_timeout_ms;
        match self.execute_with_timeout(&cmd, timeout) {
            Ok(Response::Search(summary)) => Ok(SearchOutcome::Found(summary)),
            Ok(other) => Err(unexpected(&cmd, other)),
            Err(e) if e.is_no_tags_found() => {
                debug!("search finished without tags");
                Ok(SearchOutcome::Empty)
            }
            Err(e) => Err(e),
        }
    }

    /// One single-protocol search; tags stay in the module's buffer.
    pub fn read_tag_multiple(&self, req: SearchRequest) -> Result<SearchOutcome> {
        let ms = req.timeout_ms;
        self.search(Command::Search(req), ms)
    }

    /// Several protocols in one command, timed by the module.
    pub fn multi_protocol_search(&self, req: MultiSearchRequest) -> Result<SearchOutcome> {
        let ms = req.timeout_ms;
        self.search(Command::MultiProtocolSearch(req), ms)
    }

    /// Fetch up to `count` records from the tag buffer. Records keep their
    /// corrupt marker; callers decide what to drop.
    pub fn get_tag_buffer(
        &self,
        metadata: MetadataFlags,
        count: usize,
        protocol: TagProtocol,
    ) -> Result<Vec<TagReadRecord>> {
        let mut out = Vec::with_capacity(count.min(u8::MAX as usize));
        while out.len() < count {
            let cmd = Command::GetTagBuffer { metadata };
            let chunk = match self.execute(&cmd)? {
                Response::TagBuffer(chunk) => chunk,
                other => return Err(unexpected(&cmd, other)),
            };
            if chunk.count == 0 {
                debug!("tag buffer ran dry at {} of {}", out.len(), count);
                break;
            }
            let map = self.antennas.load();
            let ctx = ParseContext {
                antennas: &map,
                protocol,
                rssi_in_dbm: self.model.rssi_in_dbm(),
            };
            out.extend(parse_records(
                &chunk.records,
                chunk.count as usize,
                chunk.metadata,
                &ctx,
            )?);
        }
        Ok(out)
    }

    pub fn clear_tag_buffer(&self) -> Result<()> {
        self.ack(Command::ClearTagBuffer)
    }

    /// Run `op` against the first tag matching `filter` (or any tag).
    pub fn execute_tag_op(
        &self,
        op: TagOp,
        filter: Option<TagFilter>,
        access_password: u32,
    ) -> Result<TagOpResult> {
        let timeout_ms = self.command_timeout_ms.min(MAX_WIRE_TIMEOUT_MS) as u16;
        let cmd = Command::TagOp {
            op: op.clone(),
            timeout_ms,
            password: access_password,
            filter,
        };
        match self.execute_with_timeout(&cmd, timeout_ms as u64 + self.command_timeout_ms)? {
            Response::TagOpData(data) => op.parse_result(&data),
            other => Err(unexpected(&cmd, other)),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("model", &self.model.name())
            .field("command_timeout_ms", &self.command_timeout_ms)
            .finish()
    }
}
