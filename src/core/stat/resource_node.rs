use super::{BucketLeapArray, SlidingWindowMetric};
use crate::{
    base::{
        ConcurrencyStat, MetricEvent, MetricItem, MetricItemRetriever, ReadStat, ResourceType,
        StatNode, TimePredicate, WriteStat,
    },
    config, Result,
};
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc, RwLock,
};

/// `StatNodeBase` owns the actual sliding-window counters shared by every
/// node kind in the call-tree (`ClusterNode`, `DefaultNode`, and the leaf
/// nodes kept per calling origin). It does not know where it sits in the
/// tree; that's the job of whichever wrapper embeds it.
#[allow(dead_code)]
#[derive(Debug)]
pub struct StatNodeBase {
    pub(crate) res_name: String,
    pub(crate) resource_type: ResourceType,
    pub(crate) sample_count: u32,
    pub(crate) interval_ms: u32,
    pub(crate) concurrency: AtomicU32,
    pub(crate) arr: Arc<BucketLeapArray>,
    pub(crate) metric: Arc<SlidingWindowMetric>,
}

impl StatNodeBase {
    pub fn new(res_name: String, resource_type: ResourceType) -> Self {
        let arr = Arc::new(
            BucketLeapArray::new(
                config::global_stat_sample_count_total(),
                config::global_stat_interval_ms_total(),
            )
            .unwrap(),
        );
        let sample_count = config::metric_stat_sample_count();
        let interval_ms = config::metric_stat_interval_ms();
        let metric =
            Arc::new(SlidingWindowMetric::new(sample_count, interval_ms, arr.clone()).unwrap());
        StatNodeBase {
            res_name,
            resource_type,
            sample_count,
            interval_ms,
            concurrency: AtomicU32::new(0),
            arr,
            metric,
        }
    }

    pub fn res_name(&self) -> &str {
        &self.res_name
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    pub fn default_metric(&self) -> Arc<dyn ReadStat> {
        self.metric.clone()
    }

    pub fn max_avg(&self, event: MetricEvent) -> f64 {
        self.metric.max_of_single_bucket(event) as f64 * self.sample_count as f64
            / self.interval_ms as f64
            * 1000f64
    }

    pub fn max_concurrency(&self) -> u32 {
        self.metric.max_concurrency()
    }
}

impl MetricItemRetriever for StatNodeBase {
    fn metrics_on_condition(&self, predicate: &TimePredicate) -> Vec<MetricItem> {
        self.metric.second_metrics_on_condition(predicate)
    }
}

impl ReadStat for StatNodeBase {
    fn qps(&self, event: MetricEvent) -> f64 {
        self.metric.qps(event)
    }
    fn qps_previous(&self, event: MetricEvent) -> f64 {
        self.metric.qps_previous(event)
    }
    fn sum(&self, event: MetricEvent) -> u64 {
        self.metric.sum(event)
    }
    fn min_rt(&self) -> f64 {
        self.metric.min_rt()
    }
    fn avg_rt(&self) -> f64 {
        self.metric.avg_rt()
    }
    fn waiting(&self) -> u64 {
        self.arr.waiting()
    }
}

impl WriteStat for StatNodeBase {
    fn add_count(&self, event: MetricEvent, count: u64) {
        self.arr.add_count(event, count);
    }

    fn update_concurrency(&self, concurrency: u32) {
        self.arr.update_concurrency(concurrency);
    }

    fn add_waiting(&self, future_time: u64, count: u64) {
        self.arr.add_waiting(future_time, count);
    }
}

impl ConcurrencyStat for StatNodeBase {
    fn current_concurrency(&self) -> u32 {
        self.concurrency.load(Ordering::SeqCst)
    }

    fn increase_concurrency(&self) {
        self.arr
            .update_concurrency(self.concurrency.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn decrease_concurrency(&self) {
        self.concurrency.fetch_sub(1, Ordering::SeqCst);
    }
}

impl StatNode for StatNodeBase {
    fn generate_read_stat(&self, sample_count: u32, interval_ms: u32) -> Result<Arc<dyn ReadStat>> {
        let stat = SlidingWindowMetric::new(sample_count, interval_ms, self.arr.clone())?;
        Ok(Arc::new(stat))
    }

    fn try_occupy_next(&self, future_time: u64, acquire_count: u32, threshold: f64) -> Result<u64> {
        Ok(self.arr.try_occupy_next(future_time, acquire_count, threshold))
    }
}

/// `ClusterNode` holds the process-global statistics for a single resource,
/// regardless of which context (call tree) the traffic came through. Every
/// `DefaultNode` for that resource, no matter which `EntranceNode` it hangs
/// from, feeds counts up into the one `ClusterNode`.
///
/// It additionally keeps a small set of per-origin leaf counters so callers
/// can be distinguished (e.g. to apply an authority rule per caller), without
/// those origin counters propagating anywhere further themselves.
#[derive(Debug)]
pub struct ClusterNode {
    base: StatNodeBase,
    origin_nodes: RwLock<HashMap<String, Arc<StatNodeBase>>>,
}

impl ClusterNode {
    pub fn new(res_name: String, resource_type: ResourceType) -> Self {
        ClusterNode {
            base: StatNodeBase::new(res_name, resource_type),
            origin_nodes: RwLock::new(HashMap::new()),
        }
    }

    /// Returns (creating on first use) the origin-keyed leaf node tracking
    /// traffic from a single caller. Origin nodes are terminal: they record
    /// their own counters but do not feed back into `self.base`, since that
    /// total is already maintained directly by the `DefaultNode`s that call
    /// into this cluster node.
    pub fn origin_stat(&self, origin: &str) -> Arc<StatNodeBase> {
        if let Some(node) = self.origin_nodes.read().unwrap().get(origin) {
            return node.clone();
        }
        let mut map = self.origin_nodes.write().unwrap();
        map.entry(origin.to_owned())
            .or_insert_with(|| {
                Arc::new(StatNodeBase::new(
                    self.base.res_name.clone(),
                    self.base.resource_type,
                ))
            })
            .clone()
    }

    pub fn origin_count(&self) -> usize {
        self.origin_nodes.read().unwrap().len()
    }

    pub fn res_name(&self) -> &str {
        self.base.res_name()
    }

    pub fn resource_type(&self) -> ResourceType {
        self.base.resource_type()
    }

    pub fn default_metric(&self) -> Arc<dyn ReadStat> {
        self.base.default_metric()
    }

    pub fn max_avg(&self, event: MetricEvent) -> f64 {
        self.base.max_avg(event)
    }

    pub fn max_concurrency(&self) -> u32 {
        self.base.max_concurrency()
    }
}

impl MetricItemRetriever for ClusterNode {
    fn metrics_on_condition(&self, predicate: &TimePredicate) -> Vec<MetricItem> {
        self.base.metrics_on_condition(predicate)
    }
}

impl ReadStat for ClusterNode {
    fn qps(&self, event: MetricEvent) -> f64 {
        self.base.qps(event)
    }
    fn qps_previous(&self, event: MetricEvent) -> f64 {
        self.base.qps_previous(event)
    }
    fn sum(&self, event: MetricEvent) -> u64 {
        self.base.sum(event)
    }
    fn min_rt(&self) -> f64 {
        self.base.min_rt()
    }
    fn avg_rt(&self) -> f64 {
        self.base.avg_rt()
    }
    fn waiting(&self) -> u64 {
        self.base.waiting()
    }
}

impl WriteStat for ClusterNode {
    fn add_count(&self, event: MetricEvent, count: u64) {
        self.base.add_count(event, count);
    }

    fn update_concurrency(&self, concurrency: u32) {
        self.base.update_concurrency(concurrency);
    }

    fn add_waiting(&self, future_time: u64, count: u64) {
        self.base.add_waiting(future_time, count);
    }
}

impl ConcurrencyStat for ClusterNode {
    fn current_concurrency(&self) -> u32 {
        self.base.current_concurrency()
    }

    fn increase_concurrency(&self) {
        self.base.increase_concurrency()
    }

    fn decrease_concurrency(&self) {
        self.base.decrease_concurrency()
    }
}

impl StatNode for ClusterNode {
    fn generate_read_stat(&self, sample_count: u32, interval_ms: u32) -> Result<Arc<dyn ReadStat>> {
        self.base.generate_read_stat(sample_count, interval_ms)
    }

    fn try_occupy_next(&self, future_time: u64, acquire_count: u32, threshold: f64) -> Result<u64> {
        self.base.try_occupy_next(future_time, acquire_count, threshold)
    }
}

/// `DefaultNode` is a single call-tree node: the statistics for one resource
/// as seen from one particular context (one chain of nested entries). Its
/// writes propagate up into both its own counters and its `ClusterNode`'s,
/// so per-context and process-wide views stay consistent without a second
/// bookkeeping pass.
///
/// An `EntranceNode` is simply a `DefaultNode` that sits at the root of a
/// context's call tree, with no parent; see the [`EntranceNode`] alias.
#[derive(Debug)]
pub struct DefaultNode {
    base: StatNodeBase,
    cluster_node: Arc<ClusterNode>,
    children: RwLock<Vec<Arc<DefaultNode>>>,
}

impl DefaultNode {
    pub fn new(
        res_name: String,
        resource_type: ResourceType,
        cluster_node: Arc<ClusterNode>,
    ) -> Self {
        DefaultNode {
            base: StatNodeBase::new(res_name, resource_type),
            cluster_node,
            children: RwLock::new(Vec::new()),
        }
    }

    pub fn cluster_node(&self) -> Arc<ClusterNode> {
        self.cluster_node.clone()
    }

    pub fn add_child(&self, child: Arc<DefaultNode>) {
        let mut children = self.children.write().unwrap();
        if children
            .iter()
            .any(|c| c.base.res_name == child.base.res_name)
        {
            return;
        }
        children.push(child);
    }

    pub fn children(&self) -> Vec<Arc<DefaultNode>> {
        self.children.read().unwrap().clone()
    }
}

impl MetricItemRetriever for DefaultNode {
    fn metrics_on_condition(&self, predicate: &TimePredicate) -> Vec<MetricItem> {
        self.base.metrics_on_condition(predicate)
    }
}

impl ReadStat for DefaultNode {
    fn qps(&self, event: MetricEvent) -> f64 {
        self.base.qps(event)
    }
    fn qps_previous(&self, event: MetricEvent) -> f64 {
        self.base.qps_previous(event)
    }
    fn sum(&self, event: MetricEvent) -> u64 {
        self.base.sum(event)
    }
    fn min_rt(&self) -> f64 {
        self.base.min_rt()
    }
    fn avg_rt(&self) -> f64 {
        self.base.avg_rt()
    }
    fn waiting(&self) -> u64 {
        self.base.waiting()
    }
}

impl WriteStat for DefaultNode {
    fn add_count(&self, event: MetricEvent, count: u64) {
        self.base.add_count(event, count);
        self.cluster_node.add_count(event, count);
    }

    fn update_concurrency(&self, concurrency: u32) {
        self.base.update_concurrency(concurrency);
    }

    fn add_waiting(&self, future_time: u64, count: u64) {
        self.base.add_waiting(future_time, count);
        self.cluster_node.add_waiting(future_time, count);
    }
}

impl ConcurrencyStat for DefaultNode {
    fn current_concurrency(&self) -> u32 {
        self.base.current_concurrency()
    }

    fn increase_concurrency(&self) {
        self.base.increase_concurrency();
        self.cluster_node.increase_concurrency();
    }

    fn decrease_concurrency(&self) {
        self.base.decrease_concurrency();
        self.cluster_node.decrease_concurrency();
    }
}

impl StatNode for DefaultNode {
    fn generate_read_stat(&self, sample_count: u32, interval_ms: u32) -> Result<Arc<dyn ReadStat>> {
        self.base.generate_read_stat(sample_count, interval_ms)
    }

    fn try_occupy_next(&self, future_time: u64, acquire_count: u32, threshold: f64) -> Result<u64> {
        self.base.try_occupy_next(future_time, acquire_count, threshold)
    }
}

/// An `EntranceNode` is a [`DefaultNode`] with no parent: the root of a
/// single context's call tree, created once per distinct context name.
pub type EntranceNode = DefaultNode;
