// libuhf-rs/libuhf/src/read/stream.rs
//! Continuous reading.
//!
//! A session is driven by one worker thread. The caller talks to it over a
//! control channel and learns its progress over a lifecycle channel; reads
//! and reports flow out on the event channel in the order the module sent
//! them. While a session runs, the worker owns the wire: the only command
//! sent besides the start command is the stop (or an authentication reply).

use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime};

use log::{debug, error, warn};
use parking_lot::Mutex;

use crate::antenna::AntennaMap;
use crate::constants::{STREAM_POLL_MS, STREAM_RESPONSE_TYPE_OFFSET, opcode, stream_marker};
use crate::protocol::commands::{MultiSearchRequest, ProtocolSearch, SearchRequest, StreamReports};
use crate::protocol::settings::{ConfigValue, ReaderConfigKey};
use crate::protocol::{Command, Fault};
use crate::read::dedup::DedupPolicy;
use crate::read::events::{ReadEvent, ReaderStats, StatusReport, stats_fields, status_fields};
use crate::read::plan::{ReadPlan, SimpleReadPlan};
use crate::read::sync::{DEFAULT_METADATA, ReadOptions, SyncReadEngine};
use crate::reader::dispatch::Dispatcher;
use crate::tag::{MetadataFlags, ParseContext, TagReadRecord, parse_stream_record};
use crate::types::{PowerMode, TagProtocol};
use crate::utils::{ms, wire_timeout_ms};
use crate::{Error, ErrorKind, Result};

/// Supplies the access password for a tag that asked to authenticate.
/// `None` answers with the zero password.
pub type AuthCallback = Arc<dyn Fn(&TagReadRecord) -> Option<u32> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Starting,
    Streaming,
    Stopping,
}

/// How a session is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// The module searches continuously and pushes frames.
    Hardware,
    /// Timed reads repeated on the worker thread.
    Emulated,
}

#[derive(Clone)]
pub struct StreamConfig {
    pub plan: ReadPlan,
    pub metadata: MetadataFlags,
    pub reports: StreamReports,
    /// Search time per cycle.
    pub on_time: Duration,
    /// Pause between emulated cycles.
    pub off_time: Duration,
    /// Applied to each emulated cycle.
    pub dedup: DedupPolicy,
    /// Turn the module's duplicate filter off for the session and back on
    /// afterwards.
    pub disable_filtering: bool,
    pub auth: Option<AuthCallback>,
}

impl StreamConfig {
    pub fn new(plan: ReadPlan) -> Self {
        Self {
            plan,
            metadata: DEFAULT_METADATA,
            reports: StreamReports::default(),
            on_time: ms(250),
            off_time: Duration::ZERO,
            dedup: DedupPolicy::default(),
            disable_filtering: false,
            auth: None,
        }
    }

    /// Ask for every status and stats field.
    pub fn with_all_reports(mut self) -> Self {
        self.reports = StreamReports {
            status: status_fields::ALL,
            stats: stats_fields::ALL,
        };
        self
    }
}

impl fmt::Debug for StreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamConfig")
            .field("plan", &self.plan)
            .field("metadata", &self.metadata)
            .field("reports", &self.reports)
            .field("on_time", &self.on_time)
            .field("off_time", &self.off_time)
            .field("disable_filtering", &self.disable_filtering)
            .field("auth", &self.auth.is_some())
            .finish()
    }
}

enum Control {
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Started,
    Stopped,
}

struct Session {
    control: Sender<Control>,
    lifecycle: Receiver<Lifecycle>,
    worker: Option<JoinHandle<()>>,
    mode: StreamMode,
    restore_filtering: bool,
}

pub struct StreamingReadEngine {
    dispatcher: Dispatcher,
    state: Arc<Mutex<StreamState>>,
    session: Option<Session>,
}

impl StreamingReadEngine {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            state: Arc::new(Mutex::new(StreamState::Idle)),
            session: None,
        }
    }

    pub fn state(&self) -> StreamState {
        *self.state.lock()
    }

    /// A session exists and has not been stopped by the caller yet. The
    /// worker may already have ended on its own.
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn mode(&self) -> Option<StreamMode> {
        self.session.as_ref().map(|s| s.mode)
    }

    /// Start a session delivering into `events`.
    ///
    /// Hardware streaming is used when the model supports it and every
    /// sub-plan shares one antenna set; otherwise timed reads are repeated
    /// on the worker.
    pub fn start(&mut self, config: StreamConfig, events: Sender<ReadEvent>) -> Result<()> {
        if self.session.is_some() {
            if self.state() != StreamState::Idle {
                return Err(Error::InvalidState("a read session is already running".into()));
            }
            // worker ended on its own; reap it
            self.stop()?;
        }
        config.plan.validate()?;

        let mode = if self.dispatcher.model().supports_streaming() && config.plan.shares_antenna_set()
        {
            StreamMode::Hardware
        } else {
            StreamMode::Emulated
        };
        let restore_filtering = mode == StreamMode::Hardware && config.disable_filtering;

        *self.state.lock() = StreamState::Starting;
        if restore_filtering {
            if let Err(e) = self
                .dispatcher
                .set_reader_config(ReaderConfigKey::EnableFiltering, ConfigValue::Bool(false))
            {
                *self.state.lock() = StreamState::Idle;
                return Err(e);
            }
        }

        let (control_tx, control_rx) = mpsc::channel();
        let (life_tx, life_rx) = mpsc::channel();
        let worker = Worker {
            dispatcher: self.dispatcher.clone(),
            config,
            events,
            control: control_rx,
        };
        let announcer = Announcer {
            tx: life_tx,
            state: Arc::clone(&self.state),
            started: false,
        };
        let spawned = thread::Builder::new()
            .name("libuhf-stream".into())
            .spawn(move || worker.run(mode, announcer));
        let handle = match spawned {
            Ok(h) => h,
            Err(e) => {
                *self.state.lock() = StreamState::Idle;
                return Err(Error::Io(e));
            }
        };

        debug!("read session started ({:?})", mode);
        self.session = Some(Session {
            control: control_tx,
            lifecycle: life_rx,
            worker: Some(handle),
            mode,
            restore_filtering,
        });
        Ok(())
    }

    /// Stop the session and wait until the module acknowledged it.
    ///
    /// Waits for the worker to report that streaming actually began before
    /// asking it to stop, then for its final report. Stopping an idle engine
    /// is a no-op.
    pub fn stop(&mut self) -> Result<()> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };
        if let Ok(Lifecycle::Started) = session.lifecycle.recv() {
            // Err: the worker already ended and dropped its receiver
            let _ = session.control.send(Control::Stop);
            while let Ok(msg) = session.lifecycle.recv() {
                if msg == Lifecycle::Stopped {
                    break;
                }
            }
        }
        if let Some(handle) = session.worker.take() {
            if handle.join().is_err() {
                error!("read session worker panicked");
            }
        }
        *self.state.lock() = StreamState::Idle;
        debug!("read session stopped");

        if session.restore_filtering {
            self.dispatcher
                .set_reader_config(ReaderConfigKey::EnableFiltering, ConfigValue::Bool(true))?;
        }
        Ok(())
    }
}

impl Drop for StreamingReadEngine {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("stopping read session on drop failed: {}", e);
        }
    }
}

/// Reports lifecycle transitions. `Started` is sent at most once and always
/// before `Stopped`, which is sent when the worker ends (even by panic).
struct Announcer {
    tx: Sender<Lifecycle>,
    state: Arc<Mutex<StreamState>>,
    started: bool,
}

impl Announcer {
    fn started(&mut self) {
        if !self.started {
            self.started = true;
            *self.state.lock() = StreamState::Streaming;
            let _ = self.tx.send(Lifecycle::Started);
        }
    }
}

impl Drop for Announcer {
    fn drop(&mut self) {
        self.started();
        *self.state.lock() = StreamState::Idle;
        let _ = self.tx.send(Lifecycle::Stopped);
    }
}

#[derive(Debug, Default)]
struct StopRequest {
    requested: bool,
    sent_at: Option<Instant>,
    /// An abort was already reported; later receive errors are noise.
    aborted: bool,
}

enum Cycle {
    Finished,
    Restart,
}

struct Worker {
    dispatcher: Dispatcher,
    config: StreamConfig,
    events: Sender<ReadEvent>,
    control: Receiver<Control>,
}

impl Worker {
    fn run(self, mode: StreamMode, mut life: Announcer) {
        match mode {
            StreamMode::Hardware => self.run_hardware(&mut life),
            StreamMode::Emulated => self.run_emulated(&mut life),
        }
    }

    fn emit(&self, event: ReadEvent) {
        // a dropped receiver only means nobody listens any more
        let _ = self.events.send(event);
    }

    fn poll_control(&self, stop: &mut StopRequest) {
        match self.control.try_recv() {
            Ok(Control::Stop) | Err(TryRecvError::Disconnected) => stop.requested = true,
            Err(TryRecvError::Empty) => {}
        }
    }

    /// Send the stop command once. Returns false when it could not be sent.
    fn send_stop(&self, stop: &mut StopRequest, state: &Announcer) -> bool {
        stop.requested = true;
        if stop.sent_at.is_some() {
            return true;
        }
        *state.state.lock() = StreamState::Stopping;
        let sent = Command::StopStreaming
            .encode()
            .and_then(|bytes| self.dispatcher.link().lock().send(&bytes));
        match sent {
            Ok(()) => {
                debug!("stop command sent");
                stop.sent_at = Some(Instant::now());
                true
            }
            Err(e) => {
                error!("could not send stop command: {}", e);
                self.emit(ReadEvent::Exception(e));
                false
            }
        }
    }

    fn stop_grace(&self) -> Duration {
        let transport = self.dispatcher.link().lock().transport_timeout_ms();
        ms(self.dispatcher.command_timeout_ms() + transport)
    }

    fn start_command(&self) -> Result<Vec<u8>> {
        let map = self.dispatcher.antennas().load();
        let mut requested = self.config.metadata;
        if self.config.plan.simple_plans().len() > 1 {
            requested |= MetadataFlags::PROTOCOL;
        }
        let metadata = MetadataFlags::from_bits(
            requested.bits() & self.dispatcher.model().supported_metadata().bits(),
        )?;
        let stop_on = match &self.config.plan {
            ReadPlan::StopTrigger(p) => Some(p.stop_on_tag_count),
            _ => None,
        };
        let timeout_ms = wire_timeout_ms(self.config.on_time);
        let search_for = |p: &SimpleReadPlan| -> Result<ProtocolSearch> {
            let mut search = SearchRequest::new(timeout_ms, metadata);
            search.antennas = p
                .antennas
                .iter()
                .map(|&a| map.wire_byte(a))
                .collect::<Result<Vec<u8>>>()?;
            search.filter = p.filter.clone();
            search.tag_op = p.tag_op.clone();
            search.access_password = p.access_password;
            search.fast_search = p.fast_search;
            search.stop_on_count = stop_on;
            Ok(ProtocolSearch {
                protocol: p.protocol,
                weight: p.weight.min(u16::MAX as u32) as u16,
                search,
            })
        };
        let entries = self
            .config
            .plan
            .simple_plans()
            .into_iter()
            .map(search_for)
            .collect::<Result<Vec<_>>>()?;
        Command::MultiProtocolSearch(MultiSearchRequest {
            timeout_ms,
            metadata,
            streaming: Some(self.config.reports),
            entries,
        })
        .encode()
    }

    fn run_hardware(&self, life: &mut Announcer) {
        let start = match self.start_command() {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("cannot build stream start command: {}", e);
                self.emit(ReadEvent::Exception(e));
                return;
            }
        };
        let mut stop = StopRequest::default();
        loop {
            if let Err(e) = self.dispatcher.link().lock().send(&start) {
                error!("stream start failed: {}", e);
                self.emit(ReadEvent::Exception(e));
                return;
            }
            let base_time = SystemTime::now();
            match self.pump(&mut stop, life, base_time) {
                Cycle::Finished => return,
                Cycle::Restart => debug!("restarting stream after tag buffer overflow"),
            }
        }
    }

    /// Receive frames of one started stream until it ends.
    fn pump(&self, stop: &mut StopRequest, life: &mut Announcer, base_time: SystemTime) -> Cycle {
        loop {
            self.poll_control(stop);
            if stop.requested && !self.send_stop(stop, life) {
                return Cycle::Finished;
            }
            if let Some(sent) = stop.sent_at {
                if sent.elapsed() > self.stop_grace() {
                    warn!("no stop acknowledgement; ending session");
                    return Cycle::Finished;
                }
            }

            let received = self.dispatcher.link().lock().receive_polled(STREAM_POLL_MS);
            life.started();
            let frame = match received {
                Ok(frame) => frame,
                Err(Error::Timeout) => continue,
                Err(e) => {
                    if !stop.aborted {
                        error!("stream receive failed: {}", e);
                        stop.aborted = true;
                        self.emit(ReadEvent::Exception(e));
                    } else {
                        debug!("receive while stopping: {}", e);
                    }
                    if !self.send_stop(stop, life) {
                        return Cycle::Finished;
                    }
                    continue;
                }
            };

            match frame.opcode {
                opcode::STREAM_STOP_ACK => {
                    debug!("stop acknowledged");
                    return Cycle::Finished;
                }
                opcode::STREAM_DATA => {}
                other => {
                    error!("unexpected opcode {:#04x} while streaming", other);
                    self.dispatcher
                        .link()
                        .lock()
                        .set_power_mode(PowerMode::Unknown);
                    self.emit(ReadEvent::Exception(Error::DeviceReset {
                        sent: opcode::MULTI_PROTOCOL_TAG_OP,
                        received: other,
                    }));
                    return Cycle::Finished;
                }
            }

            let status = match frame.status() {
                Ok(s) => s,
                Err(e) => {
                    self.emit(ReadEvent::Exception(e));
                    continue;
                }
            };
            match Fault::from_status(status) {
                None => self.deliver(frame.data(), base_time),
                Some(Fault::NoTagsFound) => {}
                Some(Fault::TagBufferFull) => {
                    warn!("module tag buffer full");
                    self.emit(ReadEvent::Exception(Error::Device(Fault::TagBufferFull)));
                    let drain = self.dispatcher.command_timeout_ms();
                    match self.dispatcher.link().lock().receive(drain) {
                        Ok(f) if f.opcode == opcode::STREAM_STOP_ACK => {
                            debug!("stop acknowledged while draining");
                            return Cycle::Finished;
                        }
                        Ok(f) => debug!("consumed drain frame {:#04x}", f.opcode),
                        Err(e) => debug!("no drain frame after buffer full: {}", e),
                    }
                    if stop.sent_at.is_some() {
                        // the acknowledgement is still on its way
                        continue;
                    }
                    self.poll_control(stop);
                    return if stop.requested {
                        Cycle::Finished
                    } else {
                        Cycle::Restart
                    };
                }
                Some(Fault::TagAuthRequest) => self.authenticate(frame.data(), base_time),
                Some(fault) if fault.is_transient() => {
                    warn!("transient fault while streaming: {}", fault);
                    self.emit(ReadEvent::Exception(Error::Device(fault)));
                }
                Some(fault) => {
                    error!("stream aborted by {}", fault);
                    stop.aborted = true;
                    self.emit(ReadEvent::Exception(Error::Device(fault)));
                    if !self.send_stop(stop, life) {
                        return Cycle::Finished;
                    }
                }
            }
        }
    }

    /// Protocol of records that carry no protocol field.
    fn plan_protocol(&self) -> TagProtocol {
        match self.config.plan.simple_plans().as_slice() {
            [only] => only.protocol,
            _ => TagProtocol::Gen2,
        }
    }

    fn parse_context<'a>(&self, map: &'a AntennaMap) -> ParseContext<'a> {
        ParseContext {
            antennas: map,
            protocol: self.plan_protocol(),
            rssi_in_dbm: self.dispatcher.model().rssi_in_dbm(),
        }
    }

    /// Classify a data frame by its response-type marker.
    fn deliver(&self, data: &[u8], base_time: SystemTime) {
        let Some(&marker) = data.get(STREAM_RESPONSE_TYPE_OFFSET) else {
            debug!("short stream frame ({} bytes)", data.len());
            return;
        };
        let body = &data[STREAM_RESPONSE_TYPE_OFFSET + 1..];
        let map = self.dispatcher.antennas().load();
        let event = match marker {
            stream_marker::TAG => parse_stream_record(body, &self.parse_context(&map)).map(|mut rec| {
                if rec.is_corrupt() {
                    warn!("dropping corrupt streamed tag record");
                    None
                } else {
                    rec.base_time = Some(base_time);
                    Some(ReadEvent::Tag(rec))
                }
            }),
            stream_marker::STATUS => StatusReport::parse(body, &map).map(|r| Some(ReadEvent::Status(r))),
            stream_marker::STATS => ReaderStats::parse(body, &map).map(|s| Some(ReadEvent::Stats(s))),
            stream_marker::END_OF_CYCLE => {
                debug!("end of search cycle");
                Ok(None)
            }
            other => {
                debug!("ignoring stream marker {:#04x}", other);
                Ok(None)
            }
        };
        match event {
            Ok(Some(ev)) => self.emit(ev),
            Ok(None) => {}
            Err(e) => {
                warn!("malformed stream frame: {}", e);
                self.emit(ReadEvent::Exception(e));
            }
        }
    }

    /// Answer an authentication challenge: `[opts][flags u16]` followed by
    /// the challenging tag as a streamed record.
    fn authenticate(&self, data: &[u8], base_time: SystemTime) {
        let map = self.dispatcher.antennas().load();
        let body = data.get(STREAM_RESPONSE_TYPE_OFFSET..).unwrap_or(&[]);
        let mut tag = match parse_stream_record(body, &self.parse_context(&map)) {
            Ok(tag) => tag,
            Err(e) => {
                warn!("unreadable authentication request: {}", e);
                self.emit(ReadEvent::Exception(e));
                return;
            }
        };
        tag.base_time = Some(base_time);
        let password = match &self.config.auth {
            Some(cb) => cb(&tag).unwrap_or(0),
            None => {
                warn!("tag {} asked to authenticate but no callback is set", tag.epc);
                0
            }
        };
        let sent = Command::AuthResponse { password }
            .encode()
            .and_then(|bytes| self.dispatcher.link().lock().send(&bytes));
        if let Err(e) = sent {
            error!("authentication reply failed: {}", e);
            self.emit(ReadEvent::Exception(e));
        }
    }

    /// Emulated streaming: repeat timed reads until told to stop.
    fn run_emulated(&self, life: &mut Announcer) {
        let options = ReadOptions {
            dedup: self.config.dedup,
            metadata: self.config.metadata,
            clear_buffer: true,
        };
        let mut engine = SyncReadEngine::new(self.dispatcher.clone(), options);
        let mut stop = StopRequest::default();
        loop {
            self.poll_control(&mut stop);
            if stop.requested {
                break;
            }
            life.started();
            match engine.read(&self.config.plan, self.config.on_time) {
                Ok(tags) => tags.into_iter().for_each(|t| self.emit(ReadEvent::Tag(t))),
                Err(e) => {
                    let fatal = e.kind() == ErrorKind::Communication
                        || e.fault().is_some_and(|f| f.is_system());
                    if fatal {
                        error!("emulated read session aborted: {}", e);
                    } else {
                        warn!("emulated read cycle failed: {}", e);
                    }
                    self.emit(ReadEvent::Exception(e));
                    if fatal {
                        break;
                    }
                }
            }
            engine.options_mut().clear_buffer = false;
            if !self.config.off_time.is_zero() {
                match self.control.recv_timeout(self.config.off_time) {
                    Ok(Control::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                }
            }
        }
    }
}
