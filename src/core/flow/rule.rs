use crate::{base::GuardRule, logging, system_metric, Error};
use serde::{Deserialize, Serialize};
use serde_json;
use std::fmt;
use std::hash::{Hash, Hasher};
cfg_k8s! {
    use schemars::JsonSchema;
    use kube::CustomResource;
}

pub type Id = String;

/// `limit_origin` value that disables origin differentiation: the rule
/// applies to every origin alike.
pub const LIMIT_ORIGIN_DEFAULT: &str = "default";
/// `limit_origin` value that applies the rule only to origins not
/// specifically targeted by any other rule on the same resource.
pub const LIMIT_ORIGIN_OTHER: &str = "other";

/// RelationStrategy indicates the flow control strategy based on the relation of invocations.
#[cfg_attr(feature = "ds_k8s", derive(JsonSchema))]
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum RelationStrategy {
    /// Current means flow control by current resource directly (DIRECT).
    Current,
    /// Associated means flow control by the associated resource rather than current resource (RELATE).
    Associated,
    /// Chain means flow control only applies when the entry resource of the
    /// current call chain is `ref_resource` (CHAIN).
    Chain,
}

impl Default for RelationStrategy {
    fn default() -> RelationStrategy {
        RelationStrategy::Current
    }
}

/// Grade indicates what `threshold` is measured against: concurrent
/// in-flight requests (`Thread`) or admitted requests per statistic
/// interval (`Qps`).
#[cfg_attr(feature = "ds_k8s", derive(JsonSchema))]
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize, Hash, Eq)]
pub enum Grade {
    Thread,
    Qps,
}

impl Default for Grade {
    fn default() -> Grade {
        Grade::Qps
    }
}

#[cfg_attr(feature = "ds_k8s", derive(JsonSchema))]
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize, Hash, Eq)]
pub enum CalculateStrategy {
    Direct,
    WarmUp,
    MemoryAdaptive,
    #[serde(skip)]
    Custom(u8),
}

impl Default for CalculateStrategy {
    fn default() -> CalculateStrategy {
        CalculateStrategy::Direct
    }
}

#[cfg_attr(feature = "ds_k8s", derive(JsonSchema))]
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize, Hash, Eq)]
pub enum ControlStrategy {
    Reject,
    /// Throttling indicates that pending requests will be throttled,
    /// wait in queue (until free capacity is available)
    Throttling,
    #[serde(skip)]
    Custom(u8),
}

impl Default for ControlStrategy {
    fn default() -> ControlStrategy {
        ControlStrategy::Reject
    }
}

#[cfg_attr(
    feature = "ds_k8s",
    derive(CustomResource, JsonSchema),
    kube(
        group = "rust.datasource.guard.io",
        version = "v1alpha1",
        kind = "FlowResource",
        namespaced
    )
)]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
/// Rule describes the strategy of flow control, the flow control strategy is based on QPS statistic metric
pub struct Rule {
    /// `id` represents the unique ID of the rule (optional).
    pub id: Id,
    /// `resource` represents the resource name.
    pub resource: String,
    pub ref_resource: String,
    /// `grade` selects what `threshold` is measured against: concurrent
    /// threads (`Thread`) or QPS (`Qps`, the default).
    pub grade: Grade,
    pub calculate_strategy: CalculateStrategy,
    pub control_strategy: ControlStrategy,
    pub relation_strategy: RelationStrategy,
    /// `limit_origin` restricts the rule to a particular caller origin.
    /// Empty (the default) means the rule ignores origin and always uses
    /// the resource's own node. `"default"` explicitly does the same.
    /// `"other"` applies the rule only to origins not named by any other
    /// rule on this resource. Any other value names the origin directly.
    /// Only consulted when `relation_strategy` is `Current`.
    pub limit_origin: String,
    /// `threshold` means the threshold during stat_interval_ms
    /// If `stat_interval_ms` is 1000(1 second), `threshold` means QPS
    pub threshold: f64,
    pub warm_up_period_sec: u32,
    pub warm_up_cold_factor: u32,
    /// `max_queueing_time_ms` only takes effect when `control_strategy` is Throttling.
    /// When `max_queueing_time_ms` is 0, it means Throttling only controls interval of requests,
    /// and requests exceeding the threshold will be rejected directly.
    pub max_queueing_time_ms: u32,
    /// stat_interval_ms indicates the statistic interval and it's the optional setting for flow Rule.
    /// If user doesn't set stat_interval_ms, that means using default metric statistic of resource.
    /// If the stat_interval_ms user specifies can not reuse the global statistic of resource,
    /// guard will generate independent statistic structure for this self.
    pub stat_interval_ms: u32,
    /// `stat_sliding_window_bucket_count` represents the bucket count of the
    /// independent statistic sliding window when `stat_interval_ms` forces
    /// one to be generated. `stat_interval_ms % stat_sliding_window_bucket_count`
    /// must be 0, otherwise `stat_sliding_window_bucket_count` is replaced by 1.
    /// If it is not set, default value 1 is used.
    pub stat_sliding_window_bucket_count: u32,

    /// adaptive flow control algorithm related parameters
    /// limitation: low_mem_usage_threshold > high_mem_usage_threshold && mem_high_water_mark > mem_low_water_mark
    /// - if the current memory usage is less than or equals to mem_low_water_mark, threshold == low_mem_usage_threshold
    /// - if the current memory usage is more than or equals to mem_high_water_mark, threshold == high_mem_usage_threshold
    /// - if the current memory usage is in (mem_low_water_mark, mem_high_water_mark), threshold is in (high_mem_usage_threshold, low_mem_usage_threshold)
    pub low_mem_usage_threshold: u64,
    pub high_mem_usage_threshold: u64,
    pub mem_low_water_mark: u64,
    pub mem_high_water_mark: u64,
}

impl Hash for Rule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.resource.hash(state);
        self.ref_resource.hash(state);
    }
}

impl Default for Rule {
    fn default() -> Self {
        Rule {
            #[cfg(target_arch = "wasm32")]
            id: String::new(),
            #[cfg(not(target_arch = "wasm32"))]
            id: uuid::Uuid::new_v4().to_string(),
            resource: String::default(),
            ref_resource: String::default(),
            grade: Grade::default(),
            limit_origin: String::default(),
            calculate_strategy: CalculateStrategy::default(),
            control_strategy: ControlStrategy::default(),
            relation_strategy: RelationStrategy::default(),
            threshold: 0.0,
            warm_up_period_sec: 0,
            warm_up_cold_factor: 0,
            max_queueing_time_ms: 0,
            stat_interval_ms: 0,
            stat_sliding_window_bucket_count: 0,
            low_mem_usage_threshold: 0,
            high_mem_usage_threshold: 0,
            mem_low_water_mark: 0,
            mem_high_water_mark: 0,
        }
    }
}

impl Rule {
    pub fn is_stat_reusable(&self, other: &Self) -> bool {
        self.resource == other.resource
            && self.relation_strategy == other.relation_strategy
            && self.ref_resource == other.ref_resource
            && self.stat_interval_ms == other.stat_interval_ms
            && self.need_statistic()
            && other.need_statistic()
    }

    pub fn need_statistic(&self) -> bool {
        self.calculate_strategy == CalculateStrategy::WarmUp
            || self.control_strategy == ControlStrategy::Reject
    }

    pub fn get_rule_stat_sliding_window_bucket_count(&self) -> u32 {
        let mut bucket_count = self.stat_sliding_window_bucket_count;
        if bucket_count == 0 || self.stat_interval_ms % bucket_count != 0 {
            bucket_count = 1
        }
        bucket_count
    }
}

impl GuardRule for Rule {
    fn resource_name(&self) -> String {
        self.resource.clone()
    }

    fn is_valid(&self) -> crate::Result<()> {
        if self.resource.is_empty() {
            return Err(Error::msg("empty resource name"));
        }
        if self.threshold < 0.0 {
            return Err(Error::msg("negative threshold"));
        }
        if self.relation_strategy == RelationStrategy::Associated && self.ref_resource.is_empty() {
            return Err(Error::msg("ref_resource must be non empty when relation_strategy is RelationStrategy::Associated"));
        }
        if self.relation_strategy == RelationStrategy::Chain && self.ref_resource.is_empty() {
            return Err(Error::msg("ref_resource must be non empty when relation_strategy is RelationStrategy::Chain"));
        }
        if self.calculate_strategy == CalculateStrategy::WarmUp {
            if self.warm_up_period_sec == 0 {
                return Err(Error::msg("warm_up_period_sec must be great than 0"));
            }
            if self.warm_up_cold_factor == 1 {
                return Err(Error::msg("warm_up_cold_factor must be great than 1"));
            }
        }
        if self.stat_interval_ms > 10 * 60 * 1000 {
            logging::info!(
                "stat_interval_ms is great than 10 minutes, less than 10 minutes is recommended."
            )
        }
        if self.calculate_strategy == CalculateStrategy::MemoryAdaptive {
            if self.mem_low_water_mark == 0
                || self.mem_high_water_mark == 0
                || self.high_mem_usage_threshold == 0
                || self.low_mem_usage_threshold == 0
            {
                return Err(Error::msg(
                    "memory water mark or usage threshold setting to 0",
                ));
            }
            if self.high_mem_usage_threshold >= self.low_mem_usage_threshold {
                return Err(Error::msg(
                    "self.high_mem_usage_threshold >= self.low_mem_usage_threshold",
                ));
            }
            if self.mem_high_water_mark > system_metric::get_total_memory_size() {
                return Err(Error::msg("self.mem_high_water_mark should not be greater than current system's total memory size"));
            }
            if self.mem_low_water_mark >= self.mem_high_water_mark {
                // can not be equal to defeat from zero overflow
                return Err(Error::msg(
                    "self.mem_low_water_mark >= self.mem_high_water_mark",
                ));
            }
        }
        Ok(())
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        // todo: discuss under different strategies
        self.resource == other.resource
            && self.ref_resource == other.ref_resource
            && self.grade == other.grade
            && self.limit_origin == other.limit_origin
            && self.calculate_strategy == other.calculate_strategy
            && self.control_strategy == other.control_strategy
            && self.relation_strategy == other.relation_strategy
            && self.threshold == other.threshold
            && self.warm_up_period_sec == other.warm_up_period_sec
            && self.warm_up_cold_factor == other.warm_up_cold_factor
            && self.max_queueing_time_ms == other.max_queueing_time_ms
            && self.stat_interval_ms == other.stat_interval_ms
            && self.low_mem_usage_threshold == other.low_mem_usage_threshold
            && self.high_mem_usage_threshold == other.high_mem_usage_threshold
            && self.mem_low_water_mark == other.mem_low_water_mark
            && self.mem_high_water_mark == other.mem_high_water_mark
    }
}

impl Eq for Rule {}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmtted = serde_json::to_string_pretty(self).unwrap();
        write!(f, "{}", fmtted)
    }
}
