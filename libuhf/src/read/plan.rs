// libuhf-rs/libuhf/src/read/plan.rs

use crate::protocol::filter::TagFilter;
use crate::protocol::tagop::TagOp;
use crate::types::TagProtocol;
use crate::{Error, Result};

/// Search one protocol on a set of logical antennas.
#[derive(Debug, Clone)]
pub struct SimpleReadPlan {
    pub protocol: TagProtocol,
    /// Logical antenna ids; empty means "whatever the reader is set to".
    pub antennas: Vec<u32>,
    pub filter: Option<TagFilter>,
    pub tag_op: Option<TagOp>,
    pub access_password: u32,
    pub weight: u32,
    pub fast_search: bool,
}

impl SimpleReadPlan {
    pub fn new(protocol: TagProtocol, antennas: Vec<u32>) -> Self {
        Self {
            protocol,
            antennas,
            filter: None,
            tag_op: None,
            access_password: 0,
            weight: 1000,
            fast_search: false,
        }
    }

    pub fn with_filter(mut self, filter: TagFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_tag_op(mut self, op: TagOp, access_password: u32) -> Self {
        self.tag_op = Some(op);
        self.access_password = access_password;
        self
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_fast_search(mut self, fast: bool) -> Self {
        self.fast_search = fast;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.tag_op.is_some() && !self.protocol.supports_embedded_ops() {
            return Err(Error::UnsupportedOperation(format!(
                "embedded tag operations are not supported for {}",
                self.protocol
            )));
        }
        Ok(())
    }
}

/// Sub-plans share the read time in proportion to their weights.
#[derive(Debug, Clone)]
pub struct MultiReadPlan {
    pub plans: Vec<SimpleReadPlan>,
}

impl MultiReadPlan {
    pub fn new(plans: Vec<SimpleReadPlan>) -> Self {
        Self { plans }
    }

    /// Split `total_ms` by weight; all-zero weights split evenly.
    pub fn allocate(&self, total_ms: u64) -> Vec<u64> {
        let n = self.plans.len() as u64;
        if n == 0 {
            return Vec::new();
        }
        let sum: u64 = self.plans.iter().map(|p| p.weight as u64).sum();
        self.plans
            .iter()
            .map(|p| {
                if sum == 0 {
                    total_ms / n
                } else {
                    total_ms * p.weight as u64 / sum
                }
            })
            .collect()
    }

    /// True when every sub-plan names the same antenna set (order ignored).
    pub fn shares_antenna_set(&self) -> bool {
        let mut sets = self.plans.iter().map(|p| {
            let mut a = p.antennas.clone();
            a.sort_unstable();
            a.dedup();
            a
        });
        match sets.next() {
            None => true,
            Some(first) => sets.all(|s| s == first),
        }
    }
}

/// Stop the search once `stop_on_tag_count` tags were seen.
#[derive(Debug, Clone)]
pub struct StopTriggerReadPlan {
    pub plan: SimpleReadPlan,
    pub stop_on_tag_count: u32,
}

#[derive(Debug, Clone)]
pub enum ReadPlan {
    Simple(SimpleReadPlan),
    Multi(MultiReadPlan),
    StopTrigger(StopTriggerReadPlan),
}

impl ReadPlan {
    pub fn validate(&self) -> Result<()> {
        match self {
            ReadPlan::Simple(p) => p.validate(),
            ReadPlan::StopTrigger(p) => p.plan.validate(),
            ReadPlan::Multi(m) => {
                if m.plans.is_empty() {
                    return Err(Error::InvalidArgument("multi read plan is empty".into()));
                }
                m.plans.iter().try_for_each(SimpleReadPlan::validate)
            }
        }
    }

    /// Leaf plans, in order.
    pub fn simple_plans(&self) -> Vec<&SimpleReadPlan> {
        match self {
            ReadPlan::Simple(p) => vec![p],
            ReadPlan::StopTrigger(p) => vec![&p.plan],
            ReadPlan::Multi(m) => m.plans.iter().collect(),
        }
    }

    pub fn shares_antenna_set(&self) -> bool {
        match self {
            ReadPlan::Multi(m) => m.shares_antenna_set(),
            _ => true,
        }
    }
}

impl Default for ReadPlan {
    fn default() -> Self {
        ReadPlan::Simple(SimpleReadPlan::new(TagProtocol::Gen2, Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MemoryBank;

    fn plan(weight: u32, antennas: Vec<u32>) -> SimpleReadPlan {
        SimpleReadPlan::new(TagProtocol::Gen2, antennas).with_weight(weight)
    }

    #[test]
    fn weighted_split() {
        let m = MultiReadPlan::new(vec![plan(1, vec![]), plan(3, vec![])]);
        assert_eq!(m.allocate(4000), vec![1000, 3000]);
    }

    #[test]
    fn zero_weights_split_evenly() {
        let m = MultiReadPlan::new(vec![plan(0, vec![]), plan(0, vec![])]);
        assert_eq!(m.allocate(4000), vec![2000, 2000]);
    }

    #[test]
    fn antenna_set_comparison_ignores_order() {
        let m = MultiReadPlan::new(vec![plan(1, vec![1, 2]), plan(1, vec![2, 1])]);
        assert!(m.shares_antenna_set());
        let m = MultiReadPlan::new(vec![plan(1, vec![1]), plan(1, vec![2])]);
        assert!(!m.shares_antenna_set());
        let m = MultiReadPlan::new(vec![plan(1, vec![]), plan(1, vec![])]);
        assert!(m.shares_antenna_set());
    }

    #[test]
    fn embedded_op_only_on_gen2() {
        let op = TagOp::ReadData {
            bank: MemoryBank::Tid,
            word_address: 0,
            word_count: 2,
        };
        let ok = SimpleReadPlan::new(TagProtocol::Gen2, vec![]).with_tag_op(op.clone(), 0);
        assert!(ok.validate().is_ok());
        let bad = SimpleReadPlan::new(TagProtocol::Iso180006b, vec![]).with_tag_op(op, 0);
        assert!(matches!(
            ReadPlan::Simple(bad).validate(),
            Err(Error::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn empty_multi_plan_rejected() {
        assert!(ReadPlan::Multi(MultiReadPlan::new(vec![])).validate().is_err());
    }
}
