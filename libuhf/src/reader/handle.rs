// libuhf-rs/libuhf/src/reader/handle.rs

use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use log::{debug, info, warn};

use crate::antenna::{AntennaMap, AntennaPort, SharedAntennaMap};
use crate::constants::DEFAULT_BAUD_RATE;
use crate::params::{MemoryParams, ParamStore, ParamValue, keys};
use crate::protocol::filter::TagFilter;
use crate::protocol::settings::{ConfigValue, ReaderConfigKey};
use crate::protocol::tagop::{TagOp, TagOpResult};
use crate::protocol::CrcMode;
use crate::read::dedup::DedupPolicy;
use crate::read::events::ReadEvent;
use crate::read::plan::ReadPlan;
use crate::read::stream::{AuthCallback, StreamConfig, StreamingReadEngine};
use crate::read::sync::{DEFAULT_METADATA, ReadOptions, SyncReadEngine};
use crate::reader::baud;
use crate::reader::channel::Channel;
use crate::reader::dispatch::Dispatcher;
use crate::reader::models::{DeviceModel, create_model_for};
use crate::tag::TagReadRecord;
use crate::transport::Transport;
use crate::types::{ModelFamily, ProductGroup, TagProtocol, VersionInfo};
use crate::utils::ms;
use crate::{Error, Result};

/// Type-state markers
pub struct Disconnected;
pub struct Connected;

/// Reader handle that enforces the connect sequence at compile time.
pub struct Reader<State = Disconnected> {
    dispatcher: Dispatcher,
    params: Box<dyn ParamStore>,
    auth: Option<AuthCallback>,
    version: Option<VersionInfo>,
    product_group: ProductGroup,
    stream: Option<StreamingReadEngine>,
    _state: PhantomData<State>,
}

impl<S> Reader<S> {
    pub fn param(&self, name: &str) -> Option<ParamValue> {
        self.params.get(name)
    }

    /// Register the password source for tags that ask to authenticate
    /// while streaming. Takes effect at the next `start_reading`.
    pub fn set_auth_callback(&mut self, callback: AuthCallback) {
        self.auth = Some(callback);
    }

    pub fn antenna_map(&self) -> Arc<AntennaMap> {
        self.dispatcher.antennas().load()
    }

    fn into_state<T>(self) -> Reader<T> {
        Reader {
            dispatcher: self.dispatcher,
            params: self.params,
            auth: self.auth,
            version: self.version,
            product_group: self.product_group,
            stream: self.stream,
            _state: PhantomData,
        }
    }
}

impl Reader<Disconnected> {
    /// Create a reader over an existing transport (e.g. MockTransport). The
    /// transport is opened by `connect` if it is not open yet.
    pub fn new_with_transport(transport: Box<dyn Transport>, params: Box<dyn ParamStore>) -> Self {
        let transport_timeout = params.get_u32(keys::TRANSPORT_TIMEOUT).unwrap_or(1000) as u64;
        let command_timeout = params.get_u32(keys::COMMAND_TIMEOUT).unwrap_or(1000) as u64;
        let model = create_model_for(ModelFamily::Unknown(0));
        let ports = model.physical_ports();
        let antennas = SharedAntennaMap::new(AntennaMap::monostatic(&ports), ports);
        let link = Channel::new(transport, transport_timeout).into_link();
        Self {
            dispatcher: Dispatcher::new(link, model, antennas, command_timeout),
            params,
            auth: None,
            version: None,
            product_group: ProductGroup::default(),
            stream: None,
            _state: PhantomData,
        }
    }

    /// Same as [`Reader::new_with_transport`] with default parameters.
    pub fn with_default_params(transport: Box<dyn Transport>) -> Self {
        Self::new_with_transport(transport, Box::new(MemoryParams::new()))
    }

    pub fn set_param(&mut self, name: &str, value: ParamValue) -> Result<()> {
        self.params.set(name, value)?;
        match name {
            keys::COMMAND_TIMEOUT | keys::TRANSPORT_TIMEOUT => self.apply_timeouts(),
            _ => {}
        }
        Ok(())
    }

    fn apply_timeouts(&mut self) {
        if let Some(ms) = self.params.get_u32(keys::COMMAND_TIMEOUT) {
            self.dispatcher.set_command_timeout_ms(ms as u64);
        }
        if let Some(ms) = self.params.get_u32(keys::TRANSPORT_TIMEOUT) {
            self.dispatcher.link().lock().set_transport_timeout_ms(ms as u64);
        }
    }

    /// Open the port, find the module's baud rate and bring it into a
    /// known state.
    ///
    /// Product group, power mode and the protocol list are optional on some
    /// firmware: a device fault there falls back to a default instead of
    /// failing the connect.
    pub fn connect(mut self, port: &str) -> Result<Reader<Connected>> {
        self.apply_timeouts();
        {
            let mut link = self.dispatcher.link().lock();
            if !link.transport().is_open() {
                link.transport_mut().open(port)?;
            }
        }

        let remembered = self
            .params
            .get_u32(keys::BAUD_RATE)
            .unwrap_or(DEFAULT_BAUD_RATE);
        let (baud, version) = baud::negotiate(&self.dispatcher, remembered)?;
        info!(
            "connected to {} firmware {} at {} baud",
            version.model(),
            version.firmware_string(),
            baud
        );

        let model = create_model_for(version.model());
        self.dispatcher.set_model(Arc::clone(&model));

        let group = tolerate(self.dispatcher.product_group(), "product group")?
            .unwrap_or_default();
        self.product_group = group;
        self.dispatcher
            .antennas()
            .reset(model.antenna_map(group), model.physical_ports());

        // seeds the wakeup cache
        tolerate(self.dispatcher.power_mode(), "power mode")?;

        let protocols = match tolerate(self.dispatcher.available_protocols(), "protocol list")? {
            Some(list) => list,
            None => version.supported_protocols(),
        };

        if model.supports_crc_disable() && self.dispatcher.link().lock().transport().is_usb() {
            self.dispatcher
                .set_reader_config(ReaderConfigKey::SendCrc, ConfigValue::Bool(false))?;
            self.dispatcher.link().lock().set_crc(CrcMode::Disabled);
            debug!("CRC trailer disabled on USB link");
        }

        if protocols.contains(&TagProtocol::Gen2) {
            self.dispatcher.set_protocol(TagProtocol::Gen2)?;
        } else {
            warn!("module does not list Gen2; leaving protocol unset");
        }

        self.params
            .set(keys::VERSION_MODEL, ParamValue::Str(model.name().to_string()))?;
        self.params
            .set(keys::SUPPORTED_PROTOCOLS, ParamValue::Protocols(protocols))?;
        self.params.set(keys::BAUD_RATE, ParamValue::U32(baud))?;

        self.version = Some(version);
        Ok(self.into_state())
    }
}

/// Treat a device fault as "not supported here".
fn tolerate<T>(result: Result<T>, what: &str) -> Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(Error::Device(fault)) => {
            debug!("{} query not supported: {}", what, fault);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

impl Reader<Connected> {
    /// Typed command access. Refused while a streaming session owns the
    /// wire.
    pub fn commands(&self) -> Result<&Dispatcher> {
        self.ensure_idle()?;
        Ok(&self.dispatcher)
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.is_reading() {
            return Err(Error::InvalidState(
                "not allowed while a read session is running".into(),
            ));
        }
        Ok(())
    }

    pub fn version(&self) -> Option<&VersionInfo> {
        self.version.as_ref()
    }

    pub fn model(&self) -> &Arc<dyn DeviceModel> {
        self.dispatcher.model()
    }

    pub fn product_group(&self) -> ProductGroup {
        self.product_group
    }

    pub fn is_reading(&self) -> bool {
        self.stream.as_ref().is_some_and(|s| s.is_active())
    }

    fn read_plan(&self) -> ReadPlan {
        self.params
            .get(keys::READ_PLAN)
            .and_then(|v| v.as_read_plan().cloned())
            .unwrap_or_default()
    }

    fn dedup_policy(&self) -> DedupPolicy {
        let flag = |key: &str, default: bool| self.params.get_bool(key).unwrap_or(default);
        let d = DedupPolicy::default();
        DedupPolicy {
            enabled: flag(keys::ENABLE_READ_FILTERING, d.enabled),
            unique_by_antenna: flag(keys::UNIQUE_BY_ANTENNA, d.unique_by_antenna),
            unique_by_data: flag(keys::UNIQUE_BY_DATA, d.unique_by_data),
            unique_by_protocol: flag(keys::UNIQUE_BY_PROTOCOL, d.unique_by_protocol),
            record_highest_rssi: flag(keys::RECORD_HIGHEST_RSSI, d.record_highest_rssi),
        }
    }

    /// Timed read with the configured read plan.
    pub fn read(&mut self, timeout: Duration) -> Result<Vec<TagReadRecord>> {
        self.ensure_idle()?;
        let options = ReadOptions {
            dedup: self.dedup_policy(),
            metadata: DEFAULT_METADATA,
            clear_buffer: true,
        };
        let plan = self.read_plan();
        SyncReadEngine::new(self.dispatcher.clone(), options).read(&plan, timeout)
    }

    /// Start continuous reading with the configured plan. Events arrive on
    /// the returned receiver until `stop_reading`.
    pub fn start_reading(&mut self) -> Result<Receiver<ReadEvent>> {
        self.ensure_idle()?;
        let mut config = StreamConfig::new(self.read_plan());
        config.on_time = ms(self.params.get_u32(keys::ASYNC_ON_TIME).unwrap_or(250) as u64);
        config.off_time = ms(self.params.get_u32(keys::ASYNC_OFF_TIME).unwrap_or(0) as u64);
        config.dedup = self.dedup_policy();
        config.disable_filtering = !self
            .params
            .get_bool(keys::ENABLE_READ_FILTERING)
            .unwrap_or(true);
        config.auth = self.auth.clone();

        let (tx, rx) = mpsc::channel();
        let mut engine = StreamingReadEngine::new(self.dispatcher.clone());
        engine.start(config, tx)?;
        self.stream = Some(engine);
        Ok(rx)
    }

    /// Stop continuous reading; returns once the module confirmed.
    pub fn stop_reading(&mut self) -> Result<()> {
        match self.stream.take() {
            Some(mut engine) => engine.stop(),
            None => Ok(()),
        }
    }

    /// Validate and install a new logical antenna map.
    pub fn set_antenna_map(&self, ports: &[AntennaPort]) -> Result<()> {
        self.dispatcher.antennas().set_map(ports)
    }

    pub fn execute_tag_op(
        &self,
        op: TagOp,
        filter: Option<TagFilter>,
        access_password: u32,
    ) -> Result<TagOpResult> {
        self.ensure_idle()?;
        self.dispatcher.execute_tag_op(op, filter, access_password)
    }

    /// Store a parameter and apply it to the live connection. When the
    /// module rejects the change the stored value is rolled back.
    pub fn set_param(&mut self, name: &str, value: ParamValue) -> Result<()> {
        let previous = self.params.get(name);
        self.params.set(name, value.clone())?;
        if let Err(e) = self.apply_param(name, &value) {
            if let Some(prev) = previous {
                self.params.set(name, prev)?;
            }
            return Err(e);
        }
        Ok(())
    }

    fn apply_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match (name, value) {
            (keys::COMMAND_TIMEOUT, ParamValue::U32(ms)) => {
                self.dispatcher.set_command_timeout_ms(*ms as u64);
            }
            (keys::TRANSPORT_TIMEOUT, ParamValue::U32(ms)) => {
                self.dispatcher
                    .link()
                    .lock()
                    .set_transport_timeout_ms(*ms as u64);
            }
            (keys::BAUD_RATE, ParamValue::U32(baud)) => {
                self.ensure_idle()?;
                self.dispatcher.set_baud_rate(*baud)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Stop any session and close the transport.
    pub fn disconnect(mut self) -> Result<Reader<Disconnected>> {
        self.stop_reading()?;
        self.dispatcher.link().lock().transport_mut().close()?;
        self.version = None;
        Ok(self.into_state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::opcode;
    use crate::test_support::{
        connected_reader, end_of_cycle_frame, reply, reply_without_crc, stop_ack,
    };
    use crate::transport::MockTransport;

    #[test]
    fn connect_runs_startup_sequence() {
        let mock = MockTransport::new();
        let reader = connected_reader(&mock, 0x18).unwrap();

        assert_eq!(
            mock.written_opcodes(),
            vec![
                opcode::VERSION,
                opcode::GET_READER_OPTIONAL_PARAMS,
                opcode::GET_POWER_MODE,
                opcode::GET_AVAILABLE_PROTOCOLS,
                opcode::SET_TAG_PROTOCOL,
            ]
        );
        assert_eq!(reader.model().family(), ModelFamily::M6e);
        assert_eq!(reader.product_group(), ProductGroup::Module);
        assert_eq!(
            reader.param(keys::VERSION_MODEL).and_then(|v| v.as_str().map(String::from)),
            Some("M6e".to_string())
        );
        assert!(matches!(
            reader.param(keys::SUPPORTED_PROTOCOLS),
            Some(ParamValue::Protocols(ref p)) if p == &[TagProtocol::Gen2]
        ));
        assert_eq!(reader.antenna_map().len(), 4);
        assert!(mock.is_open());
    }

    #[test]
    fn optional_queries_may_fault() {
        let mock = MockTransport::new();
        mock.on_opcode(
            opcode::GET_READER_OPTIONAL_PARAMS,
            vec![reply(opcode::GET_READER_OPTIONAL_PARAMS, 0x0101, &[])],
        );
        let reader = connected_reader(&mock, 0x18).unwrap();
        assert_eq!(reader.product_group(), ProductGroup::Module);
    }

    #[test]
    fn usb_link_drops_crc() {
        let mock = MockTransport::new();
        mock.set_usb(true);
        mock.on_opcode(
            opcode::SET_TAG_PROTOCOL,
            vec![reply_without_crc(opcode::SET_TAG_PROTOCOL, 0, &[])],
        );
        let reader = connected_reader(&mock, 0x18).unwrap();
        assert!(mock.written_opcodes().contains(&opcode::SET_READER_OPTIONAL_PARAMS));
        let crc = reader.commands().unwrap().link().lock().crc();
        assert_eq!(crc, CrcMode::Disabled);
        assert_eq!(mock.pending_rx(), 0);
    }

    #[test]
    fn silent_module_fails_to_connect() {
        let mock = MockTransport::new();
        let reader = Reader::with_default_params(Box::new(mock.clone()));
        assert!(matches!(
            reader.connect("mock"),
            Err(Error::BaudNegotiationFailed)
        ));
    }

    #[test]
    fn commands_refused_while_streaming() {
        let mock = MockTransport::new();
        let mut reader = connected_reader(&mock, 0x18).unwrap();
        mock.on_opcode(opcode::MULTI_PROTOCOL_TAG_OP, vec![end_of_cycle_frame()]);
        mock.on_opcode(opcode::MULTI_PROTOCOL_TAG_OP, vec![stop_ack()]);

        let _events = reader.start_reading().unwrap();
        assert!(reader.is_reading());
        assert!(matches!(reader.commands(), Err(Error::InvalidState(_))));
        assert!(matches!(
            reader.read(ms(10)),
            Err(Error::InvalidState(_))
        ));
        reader.stop_reading().unwrap();
        assert!(!reader.is_reading());
        assert!(reader.commands().is_ok());
    }

    #[test]
    fn filtering_is_restored_after_streaming() {
        let mock = MockTransport::new();
        let mut reader = connected_reader(&mock, 0x18).unwrap();
        reader
            .set_param(keys::ENABLE_READ_FILTERING, ParamValue::Bool(false))
            .unwrap();
        mock.on_opcode(opcode::MULTI_PROTOCOL_TAG_OP, vec![end_of_cycle_frame()]);
        mock.on_opcode(opcode::MULTI_PROTOCOL_TAG_OP, vec![stop_ack()]);

        let _events = reader.start_reading().unwrap();
        reader.stop_reading().unwrap();

        let config_writes: Vec<Vec<u8>> = mock
            .written()
            .into_iter()
            .filter(|f| f[2] == opcode::SET_READER_OPTIONAL_PARAMS)
            .collect();
        assert_eq!(config_writes.len(), 2);
        assert_eq!(&config_writes[0][3..6], &[0x01, 0x0C, 0x00]);
        assert_eq!(&config_writes[1][3..6], &[0x01, 0x0C, 0x01]);
    }

    #[test]
    fn baud_param_applies_or_rolls_back() {
        let mock = MockTransport::new();
        let mut reader = connected_reader(&mock, 0x18).unwrap();

        mock.on_opcode(opcode::SET_BAUD_RATE, vec![reply(opcode::SET_BAUD_RATE, 0, &[])]);
        reader
            .set_param(keys::BAUD_RATE, ParamValue::U32(921_600))
            .unwrap();
        assert_eq!(mock.baud_rate(), 921_600);

        // nothing scripted: the module stays silent
        assert!(reader
            .set_param(keys::BAUD_RATE, ParamValue::U32(9600))
            .is_err());
        assert_eq!(
            reader.param(keys::BAUD_RATE).and_then(|v| v.as_u32()),
            Some(921_600)
        );
    }

    #[test]
    fn disconnect_closes_transport() {
        let mock = MockTransport::new();
        let reader = connected_reader(&mock, 0x18).unwrap();
        let reader = reader.disconnect().unwrap();
        assert!(!mock.is_open());
        assert!(reader.param(keys::BAUD_RATE).is_some());
    }
}
