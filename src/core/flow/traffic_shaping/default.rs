use super::{Calculator, Checker, Controller, Rule};
use crate::core::base::{
    BlockType, ConcurrencyStat, MetricEvent, ReadStat, StatNode, TokenResult, WriteStat,
};
use crate::core::config;
use crate::core::flow::Grade;
use crate::utils::{curr_time_millis, milli2nano};
use std::sync::{Arc, Mutex, Weak};

/// Provide a determined threshold, fixed to `rule.threshold`.
#[derive(Debug)]
pub struct DirectCalculator {
    owner: Weak<Controller>,
    threshold: f64,
}

impl DirectCalculator {
    pub fn new(owner: Weak<Controller>, rule: Arc<Rule>) -> Self {
        DirectCalculator {
            owner,
            threshold: rule.threshold,
        }
    }
}

impl Calculator for DirectCalculator {
    fn get_owner(&self) -> &Weak<Controller> {
        &self.owner
    }

    fn set_owner(&mut self, owner: Weak<Controller>) {
        self.owner = owner;
    }

    fn calculate_allowed_threshold(&self, _batch_count: u32, _flag: i32) -> f64 {
        self.threshold
    }
}

/// Rejects any request that would push the resource's pass count past the threshold.
#[derive(Debug)]
pub struct RejectChecker {
    owner: Weak<Controller>,
    rule: Arc<Rule>,
}

impl RejectChecker {
    pub fn new(owner: Weak<Controller>, rule: Arc<Rule>) -> Self {
        RejectChecker { owner, rule }
    }
}

impl Checker for RejectChecker {
    fn get_owner(&self) -> &Weak<Controller> {
        &self.owner
    }

    fn set_owner(&mut self, owner: Weak<Controller>) {
        self.owner = owner;
    }

    fn do_check(
        &self,
        stat_node: Option<Arc<dyn StatNode>>,
        batch_count: u32,
        threshold: f64,
        prioritized: bool,
    ) -> TokenResult {
        let owner = self.owner.upgrade().unwrap();
        let cur_count = match self.rule.grade {
            Grade::Thread => stat_node
                .as_ref()
                .map(|n| n.current_concurrency() as f64)
                .unwrap_or(0.0),
            Grade::Qps => owner.stat().read_only_metric().sum(MetricEvent::Pass) as f64,
        };
        if cur_count + batch_count as f64 <= threshold {
            return TokenResult::new_pass();
        }
        // THREAD-graded rules count concurrent holders, not admitted requests,
        // so borrowing from a future QPS bucket makes no sense for them.
        if prioritized && self.rule.grade == Grade::Qps {
            if let Some(node) = stat_node {
                let now = curr_time_millis();
                let wait_ms = node
                    .try_occupy_next(now, batch_count, threshold)
                    .unwrap_or_else(|_| config::occupy_timeout_ms());
                if wait_ms < config::occupy_timeout_ms() {
                    node.add_waiting(now + wait_ms, batch_count as u64);
                    node.add_count(MetricEvent::OccupiedPass, batch_count as u64);
                    return TokenResult::new_should_wait(milli2nano(wait_ms) as u64);
                }
            }
        }
        TokenResult::new_blocked_with_cause(
            BlockType::Flow,
            "flow reject check blocked".into(),
            self.rule.clone(),
            Arc::new(cur_count),
        )
    }
}
