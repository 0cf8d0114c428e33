//! Traffic Shaping Policy
//!
//! A `Controller` pairs a `Calculator`, which derives the actually-allowed
//! threshold for the current instant (constant for `Direct`, ramping for
//! `WarmUp`, water-mark-driven for `MemoryAdaptive`), with a `Checker`,
//! which performs the admission decision against that threshold (`Reject`
//! rejects outright, `Throttling` queues up to `max_queueing_time_ms`).

/// Memory-adaptive calculator
pub mod adaptive;
/// Direct calculator and reject checker
pub mod default;
/// Throttling checker
pub mod throttling;
/// Warm-up calculator
pub mod warmup;

pub use adaptive::*;
pub use default::*;
pub use throttling::*;
pub use warmup::*;

use super::Rule;
use crate::base::{ReadStat, StatNode, TokenResult, WriteStat};
use std::sync::{Arc, Mutex, Weak};

/// Traffic Shaping `Calculator` calculates the actual traffic shaping threshold
/// based on the threshold of rule and the traffic shaping strategy.
pub trait Calculator: Send + Sync + std::fmt::Debug {
    fn get_owner(&self) -> &Weak<Controller>;
    fn set_owner(&mut self, owner: Weak<Controller>);
    fn calculate_allowed_threshold(&self, batch_count: u32, flag: i32) -> f64;
}

/// Traffic Shaping `Checker` performs checking according to current metrics and the traffic
/// shaping strategy, then yields the token result.
pub trait Checker: Send + Sync + std::fmt::Debug {
    fn get_owner(&self) -> &Weak<Controller>;
    fn set_owner(&mut self, owner: Weak<Controller>);
    /// `prioritized` entries that would otherwise be rejected outright may instead try to
    /// borrow a pass from a future statistic bucket (see `RejectChecker`); checkers that have
    /// no such fallback (e.g. `ThrottlingChecker`) simply ignore the flag.
    fn do_check(
        &self,
        stat_node: Option<Arc<dyn StatNode>>,
        batch_count: u32,
        threshold: f64,
        prioritized: bool,
    ) -> TokenResult;
}

/// `StandaloneStat` indicates the independent statistic for each traffic shaping controller.
#[derive(Debug)]
pub struct StandaloneStat {
    /// `reuse_global` indicates whether this standalone statistic reuses the resource's
    /// global statistic.
    reuse_global: bool,
    /// `read_only_metric` is the readonly metric statistic. If `reuse_global` is true, it is
    /// the reused `SlidingWindowMetric`; otherwise it is the independent `BucketLeapArray`.
    read_only_metric: Arc<dyn ReadStat>,
    /// `write_only_metric` is the write-only metric statistic. It is `None` when
    /// `reuse_global` is true (writes go through the resource's own stat slot instead).
    write_only_metric: Option<Arc<dyn WriteStat>>,
}

impl StandaloneStat {
    pub fn new(
        reuse_global: bool,
        read_only_metric: Arc<dyn ReadStat>,
        write_only_metric: Option<Arc<dyn WriteStat>>,
    ) -> Self {
        StandaloneStat {
            reuse_global,
            read_only_metric,
            write_only_metric,
        }
    }

    pub fn reuse_global(&self) -> bool {
        self.reuse_global
    }

    pub fn read_only_metric(&self) -> &Arc<dyn ReadStat> {
        &self.read_only_metric
    }

    /// Panics when `reuse_global` is true, since in that case no independent writer
    /// was ever created.
    pub fn write_only_metric(&self) -> Option<&Arc<dyn WriteStat>> {
        self.write_only_metric.as_ref()
    }
}

#[derive(Debug)]
pub struct Controller {
    calculator: Option<Arc<Mutex<dyn Calculator>>>,
    checker: Option<Arc<Mutex<dyn Checker>>>,
    rule: Arc<Rule>,
    /// `stat` is the statistic bound to this traffic shaping controller.
    stat: Arc<StandaloneStat>,
}

impl Controller {
    pub fn new(rule: Arc<Rule>, stat: Arc<StandaloneStat>) -> Self {
        Controller {
            calculator: None,
            checker: None,
            rule,
            stat,
        }
    }

    pub fn rule(&self) -> &Arc<Rule> {
        &self.rule
    }

    pub fn get_checker(&self) -> &Arc<Mutex<dyn Checker>> {
        self.checker.as_ref().unwrap()
    }

    pub fn set_checker(&mut self, checker: Arc<Mutex<dyn Checker>>) {
        self.checker = Some(checker);
    }

    pub fn get_calculator(&self) -> &Arc<Mutex<dyn Calculator>> {
        self.calculator.as_ref().unwrap()
    }

    pub fn set_calculator(&mut self, calculator: Arc<Mutex<dyn Calculator>>) {
        self.calculator = Some(calculator);
    }

    pub fn stat(&self) -> &Arc<StandaloneStat> {
        &self.stat
    }

    pub fn perform_checking(
        &self,
        res_stat: Arc<dyn StatNode>,
        batch_count: u32,
        flag: i32,
    ) -> TokenResult {
        self.perform_checking_prioritized(res_stat, batch_count, flag, false)
    }

    pub fn perform_checking_prioritized(
        &self,
        res_stat: Arc<dyn StatNode>,
        batch_count: u32,
        flag: i32,
        prioritized: bool,
    ) -> TokenResult {
        let calculator = self.calculator.as_ref().unwrap();
        let calculator = calculator.lock().unwrap();
        let allowed_threshold = calculator.calculate_allowed_threshold(batch_count, flag);
        #[cfg(feature = "exporter")]
        crate::exporter::set_flow_threshold(self.rule.resource_name().as_str(), allowed_threshold);
        let checker = self.checker.as_ref().unwrap();
        let checker = checker.lock().unwrap();
        checker.do_check(Some(res_stat), batch_count, allowed_threshold, prioritized)
    }
}
