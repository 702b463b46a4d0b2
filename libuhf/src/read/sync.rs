// libuhf-rs/libuhf/src/read/sync.rs
//! Timed (non-streaming) reads.
//!
//! One call runs searches until its time budget is spent, pulls the found
//! tags out of the module's buffer after each search, drops corrupt
//! records and folds duplicates.

use std::time::{Duration, SystemTime};

use log::{debug, warn};

use crate::protocol::commands::{MultiSearchRequest, ProtocolSearch, SearchRequest};
use crate::protocol::EmbeddedCounts;
use crate::read::dedup::{DedupPolicy, fold};
use crate::read::plan::{MultiReadPlan, ReadPlan, SimpleReadPlan};
use crate::reader::dispatch::{Dispatcher, SearchOutcome};
use crate::tag::{MetadataFlags, TagReadRecord};
use crate::types::TagProtocol;
use crate::utils::Deadline;
use crate::{Error, Result};

/// Metadata requested when the caller does not say otherwise.
pub const DEFAULT_METADATA: MetadataFlags = MetadataFlags::ALL;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    pub dedup: DedupPolicy,
    /// Requested record fields; trimmed to what the model supports.
    pub metadata: MetadataFlags,
    /// Clear the module's tag buffer before the first search.
    pub clear_buffer: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            dedup: DedupPolicy::default(),
            metadata: DEFAULT_METADATA,
            clear_buffer: true,
        }
    }
}

/// Per-call success/failure tallies of embedded tag operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadCounters {
    pub searches: u32,
    pub embedded_succeeded: u32,
    pub embedded_failed: u32,
    pub dropped_corrupt: u32,
}

impl ReadCounters {
    fn add_embedded(&mut self, counts: Option<EmbeddedCounts>) {
        if let Some(c) = counts {
            self.embedded_succeeded += c.succeeded as u32;
            self.embedded_failed += c.failed as u32;
        }
    }
}

pub struct SyncReadEngine {
    dispatcher: Dispatcher,
    options: ReadOptions,
    counters: ReadCounters,
}

impl SyncReadEngine {
    pub fn new(dispatcher: Dispatcher, options: ReadOptions) -> Self {
        Self {
            dispatcher,
            options,
            counters: ReadCounters::default(),
        }
    }

    pub fn options_mut(&mut self) -> &mut ReadOptions {
        &mut self.options
    }

    /// Tallies of the most recent `read`.
    pub fn counters(&self) -> ReadCounters {
        self.counters
    }

    /// Run `plan` for `timeout` and return the de-duplicated reads.
    pub fn read(&mut self, plan: &ReadPlan, timeout: Duration) -> Result<Vec<TagReadRecord>> {
        plan.validate()?;
        self.counters = ReadCounters::default();
        if self.options.clear_buffer {
            self.dispatcher.clear_tag_buffer()?;
        }

        let mut raw = match plan {
            ReadPlan::Simple(p) => self.read_simple(p, None, timeout)?,
            ReadPlan::StopTrigger(p) => {
                self.read_simple(&p.plan, Some(p.stop_on_tag_count), timeout)?
            }
            ReadPlan::Multi(m) => self.read_multi(m, timeout)?,
        };

        let before = raw.len();
        raw.retain(|r| !r.is_corrupt());
        let dropped = (before - raw.len()) as u32;
        if dropped > 0 {
            warn!("dropped {} corrupt tag records", dropped);
        }
        self.counters.dropped_corrupt = dropped;

        Ok(fold(raw, &self.options.dedup))
    }

    fn metadata_for(&self, plan: &SimpleReadPlan) -> MetadataFlags {
        let mut meta = self.options.metadata;
        if plan.tag_op.is_some() {
            meta |= MetadataFlags::DATA;
        }
        MetadataFlags::from_bits(meta.bits() & self.dispatcher.model().supported_metadata().bits())
            .unwrap_or(MetadataFlags::NONE)
    }

    fn wire_antennas(&self, plan: &SimpleReadPlan) -> Result<Vec<u8>> {
        let map = self.dispatcher.antennas().load();
        plan.antennas.iter().map(|&a| map.wire_byte(a)).collect()
    }

    fn request_for(
        &self,
        plan: &SimpleReadPlan,
        timeout_ms: u16,
        metadata: MetadataFlags,
        stop_on: Option<u32>,
    ) -> Result<SearchRequest> {
        let mut req = SearchRequest::new(timeout_ms, metadata);
        req.antennas = self.wire_antennas(plan)?;
        req.filter = plan.filter.clone();
        req.tag_op = plan.tag_op.clone();
        req.access_password = plan.access_password;
        req.fast_search = plan.fast_search;
        req.stop_on_count = stop_on;
        Ok(req)
    }

    fn read_multi(&mut self, plan: &MultiReadPlan, timeout: Duration) -> Result<Vec<TagReadRecord>> {
        if plan.plans.len() > 1
            && plan.shares_antenna_set()
            && self.dispatcher.model().supports_multi_protocol_search()
        {
            return self.read_multi_protocol(plan, timeout);
        }
        let slices = plan.allocate(timeout.as_millis() as u64);
        let mut out = Vec::new();
        for (sub, ms) in plan.plans.iter().zip(slices) {
            debug!("sub-plan {} for {} ms", sub.protocol, ms);
            out.extend(self.read_simple(sub, None, Duration::from_millis(ms))?);
        }
        Ok(out)
    }

    /// Search with `plan` until `budget` is spent (or the stop trigger
    /// fires), fetching after every search.
    fn read_simple(
        &mut self,
        plan: &SimpleReadPlan,
        stop_on: Option<u32>,
        budget: Duration,
    ) -> Result<Vec<TagReadRecord>> {
        self.dispatcher.ensure_protocol(plan.protocol)?;
        let metadata = self.metadata_for(plan);
        let deadline = Deadline::after(budget);
        let mut out = Vec::new();

        loop {
            let wire_ms = deadline.next_wire_timeout_ms();
            if wire_ms == 0 {
                break;
            }
            let req = self.request_for(plan, wire_ms, metadata, stop_on)?;
            let started = SystemTime::now();
            self.counters.searches += 1;
            let outcome = self.dispatcher.read_tag_multiple(req);
            self.absorb(outcome, metadata, plan.protocol, started, &mut out)?;

            if stop_on.is_some_and(|n| out.len() as u32 >= n) || deadline.expired() {
                break;
            }
        }
        Ok(out)
    }

    /// All sub-plans in one multi-protocol command per round.
    fn read_multi_protocol(
        &mut self,
        plan: &MultiReadPlan,
        budget: Duration,
    ) -> Result<Vec<TagReadRecord>> {
        let metadata = plan
            .plans
            .iter()
            .fold(MetadataFlags::PROTOCOL, |acc, p| acc | self.metadata_for(p));
        let deadline = Deadline::after(budget);
        let mut out = Vec::new();

        loop {
            let wire_ms = deadline.next_wire_timeout_ms();
            if wire_ms == 0 {
                break;
            }
            let entries = plan
                .plans
                .iter()
                .map(|p| {
                    Ok(ProtocolSearch {
                        protocol: p.protocol,
                        weight: p.weight.min(u16::MAX as u32) as u16,
                        search: self.request_for(p, wire_ms, metadata, None)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let req = MultiSearchRequest {
                timeout_ms: wire_ms,
                metadata,
                streaming: None,
                entries,
            };
            let started = SystemTime::now();
            self.counters.searches += 1;
            let outcome = self.dispatcher.multi_protocol_search(req);
            self.absorb(outcome, metadata, TagProtocol::Gen2, started, &mut out)?;

            if deadline.expired() {
                break;
            }
        }
        Ok(out)
    }

    /// Fold one search outcome into `out`.
    ///
    /// System faults and communication errors end the read. Any other
    /// device fault keeps what the module already buffered, clears the
    /// buffer and lets the caller search again.
    fn absorb(
        &mut self,
        outcome: Result<SearchOutcome>,
        metadata: MetadataFlags,
        protocol: TagProtocol,
        started: SystemTime,
        out: &mut Vec<TagReadRecord>,
    ) -> Result<()> {
        let stamp = |mut recs: Vec<TagReadRecord>| {
            for r in &mut recs {
                r.base_time = Some(started);
            }
            recs
        };
        match outcome {
            Ok(SearchOutcome::Empty) => Ok(()),
            Ok(SearchOutcome::Found(summary)) => {
                self.counters.add_embedded(summary.embedded);
                let recs = self.dispatcher.get_tag_buffer(
                    metadata,
                    summary.tag_count as usize,
                    protocol,
                )?;
                out.extend(stamp(recs));
                Ok(())
            }
            Err(Error::Device(fault)) if !fault.is_system() => {
                warn!("search fault {}; keeping buffered tags", fault);
                match self.dispatcher.get_tag_buffer(metadata, usize::MAX, protocol) {
                    Ok(recs) => out.extend(stamp(recs)),
                    Err(e) => debug!("tag buffer drain stopped: {}", e),
                }
                if let Err(e) = self.dispatcher.clear_tag_buffer() {
                    debug!("clearing tag buffer after fault failed: {}", e);
                }
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::opcode;
    use crate::protocol::status::codes;
    use crate::test_support::{
        dispatcher_for, no_tags, reply, search_reply, tag_buffer_reply, TagSpec,
    };
    use crate::transport::MockTransport;
    use crate::types::ModelFamily;

    fn engine(mock: &MockTransport) -> SyncReadEngine {
        mock.always(opcode::CLEAR_TAG_ID_BUFFER, vec![reply(0x2A, 0, &[])]);
        mock.always(opcode::SET_TAG_PROTOCOL, vec![reply(0x93, 0, &[])]);
        let options = ReadOptions {
            metadata: MetadataFlags::READ_COUNT | MetadataFlags::ANTENNA,
            ..ReadOptions::default()
        };
        SyncReadEngine::new(dispatcher_for(mock, ModelFamily::M6e), options)
    }

    #[test]
    fn no_tags_every_time_is_empty() {
        let mock = MockTransport::new();
        mock.always(opcode::READ_TAG_ID_MULTIPLE, vec![no_tags(0x22)]);
        let mut e = engine(&mock);
        let tags = e.read(&ReadPlan::default(), Duration::from_millis(30)).unwrap();
        assert!(tags.is_empty());
        assert!(e.counters().searches >= 1);
    }

    #[test]
    fn found_tags_are_fetched_and_folded() {
        let mock = MockTransport::new();
        let meta = MetadataFlags::READ_COUNT | MetadataFlags::ANTENNA;
        let tags = [
            TagSpec::new(&[0x01, 0x02]).antenna(0x11).count(2),
            TagSpec::new(&[0x01, 0x02]).antenna(0x22).count(3),
            TagSpec::new(&[0x09, 0x09]).antenna(0x11),
        ];
        mock.on_opcode(opcode::READ_TAG_ID_MULTIPLE, vec![search_reply(3)]);
        mock.always(opcode::READ_TAG_ID_MULTIPLE, vec![no_tags(0x22)]);
        mock.on_opcode(opcode::GET_TAG_ID_BUFFER, vec![tag_buffer_reply(meta, &tags)]);
        let mut e = engine(&mock);
        let out = e.read(&ReadPlan::default(), Duration::from_millis(30)).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].read_count, 5);
        assert!(out.iter().all(|r| r.base_time.is_some()));
    }

    #[test]
    fn corrupt_records_are_dropped_silently() {
        let mock = MockTransport::new();
        let meta = MetadataFlags::READ_COUNT | MetadataFlags::ANTENNA;
        let tags = [
            TagSpec::new(&[0x01]).antenna(0x11),
            TagSpec::new(&[0x02]).antenna(0x11).corrupt(),
            TagSpec::new(&[0x03]).antenna(0x11),
        ];
        mock.on_opcode(opcode::READ_TAG_ID_MULTIPLE, vec![search_reply(3)]);
        mock.always(opcode::READ_TAG_ID_MULTIPLE, vec![no_tags(0x22)]);
        mock.on_opcode(opcode::GET_TAG_ID_BUFFER, vec![tag_buffer_reply(meta, &tags)]);
        let mut e = engine(&mock);
        let out = e.read(&ReadPlan::default(), Duration::from_millis(30)).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(e.counters().dropped_corrupt, 1);
    }

    #[test]
    fn system_fault_propagates() {
        let mock = MockTransport::new();
        mock.always(
            opcode::READ_TAG_ID_MULTIPLE,
            vec![reply(0x22, codes::TM_ASSERT_FAILED, &[])],
        );
        let mut e = engine(&mock);
        let err = e.read(&ReadPlan::default(), Duration::from_millis(30)).unwrap_err();
        assert!(err.fault().is_some_and(|f| f.is_system()));
    }

    #[test]
    fn other_fault_drains_then_continues() {
        let mock = MockTransport::new();
        let meta = MetadataFlags::READ_COUNT | MetadataFlags::ANTENNA;
        mock.on_opcode(
            opcode::READ_TAG_ID_MULTIPLE,
            vec![reply(0x22, codes::GENERAL_TAG_ERROR, &[])],
        );
        mock.always(opcode::READ_TAG_ID_MULTIPLE, vec![no_tags(0x22)]);
        mock.on_opcode(
            opcode::GET_TAG_ID_BUFFER,
            vec![tag_buffer_reply(meta, &[TagSpec::new(&[0xAA]).antenna(0x11)])],
        );
        mock.always(opcode::GET_TAG_ID_BUFFER, vec![tag_buffer_reply(meta, &[])]);
        let mut e = engine(&mock);
        let out = e.read(&ReadPlan::default(), Duration::from_millis(30)).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].epc.as_bytes(), &[0xAA]);
    }

    #[test]
    fn stop_trigger_ends_early() {
        let mock = MockTransport::new();
        let meta = MetadataFlags::READ_COUNT | MetadataFlags::ANTENNA;
        mock.always(opcode::READ_TAG_ID_MULTIPLE, vec![search_reply(1)]);
        mock.always(
            opcode::GET_TAG_ID_BUFFER,
            vec![tag_buffer_reply(meta, &[TagSpec::new(&[0x01]).antenna(0x11)])],
        );
        let mut e = engine(&mock);
        let plan = ReadPlan::StopTrigger(crate::read::plan::StopTriggerReadPlan {
            plan: SimpleReadPlan::new(TagProtocol::Gen2, vec![1]),
            stop_on_tag_count: 1,
        });
        e.read(&plan, Duration::from_secs(5)).unwrap();
        assert_eq!(e.counters().searches, 1);
        let search = mock
            .written()
            .into_iter()
            .find(|f| f[2] == opcode::READ_TAG_ID_MULTIPLE)
            .unwrap();
        // flags word carries the stop-on-count bit
        assert_eq!(search[5] & 0x20, 0x20);
    }

    #[test]
    fn non_shared_multi_plan_runs_each_protocol() {
        let mock = MockTransport::new();
        mock.always(opcode::READ_TAG_ID_MULTIPLE, vec![no_tags(0x22)]);
        let mut e = engine(&mock);
        let plan = ReadPlan::Multi(MultiReadPlan::new(vec![
            SimpleReadPlan::new(TagProtocol::Gen2, vec![1]),
            SimpleReadPlan::new(TagProtocol::Iso180006b, vec![2]),
        ]));
        e.read(&plan, Duration::from_millis(40)).unwrap();
        let ops = mock.written_opcodes();
        assert_eq!(ops.iter().filter(|&&o| o == opcode::SET_TAG_PROTOCOL).count(), 2);
        assert!(!ops.contains(&opcode::MULTI_PROTOCOL_TAG_OP));
    }

    #[test]
    fn shared_multi_plan_uses_one_command() {
        let mock = MockTransport::new();
        mock.always(opcode::MULTI_PROTOCOL_TAG_OP, vec![no_tags(0x2F)]);
        let mut e = engine(&mock);
        let plan = ReadPlan::Multi(MultiReadPlan::new(vec![
            SimpleReadPlan::new(TagProtocol::Gen2, vec![1]),
            SimpleReadPlan::new(TagProtocol::Iso180006b, vec![1]),
        ]));
        e.read(&plan, Duration::from_millis(20)).unwrap();
        let ops = mock.written_opcodes();
        assert!(ops.contains(&opcode::MULTI_PROTOCOL_TAG_OP));
        assert!(!ops.contains(&opcode::READ_TAG_ID_MULTIPLE));
    }
}
