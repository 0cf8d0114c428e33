use super::{BucketLeapArray, BucketWrap, MetricBucket};
use crate::base::{
    check_validity_for_reuse_statistic, MetricEvent, MetricItem, ReadStat, TimePredicate,
    DEFAULT_STATISTIC_MAX_RT,
};
use crate::utils::curr_time_millis;
use crate::Result;
use std::cmp;
use std::collections::HashMap;
use std::sync::Arc;

// SlidingWindowMetric represents the sliding window metric wrapper,
// several of which might associated the same inner BucketLeapArray
// It does not store any data and is the wrapper of BucketLeapArray to adapt to different internal bucket
// SlidingWindowMetric is used for GuardRules and BucketLeapArray is used for monitor
// BucketLeapArray is per resource, and SlidingWindowMetric support only read operation.
#[derive(Debug)]
pub struct SlidingWindowMetric {
    bucket_len_ms: u32,
    sample_count: u32,
    interval_ms: u32,
    inner: Arc<BucketLeapArray>,
}

#[allow(dead_code)]
// all the methods are getter
impl SlidingWindowMetric {
    pub fn new(sample_count: u32, interval_ms: u32, inner: Arc<BucketLeapArray>) -> Result<Self> {
        check_validity_for_reuse_statistic(
            sample_count,
            interval_ms,
            inner.sample_count(),
            inner.interval_ms(),
        )?;
        Ok(SlidingWindowMetric {
            bucket_len_ms: interval_ms / sample_count,
            sample_count,
            interval_ms,
            inner,
        })
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn bucket_len_ms(&self) -> u32 {
        self.bucket_len_ms
    }

    /// Get the start time range of the bucket for the provided time.
    /// The actual time span is: [start, end + bucket_len_ms).
    /// Why? See `LeapArray::calculate_start_stamp()` and `LeapArray::get_valid_values_conditional()`
    pub(crate) fn bucket_start_range(&self, t_ms: u64) -> (u64, u64) {
        let end = self.inner.calculate_start_stamp(t_ms);
        let start = end - self.interval_ms as u64 + self.inner.bucket_len_ms() as u64;
        (start, end)
    }

    pub(crate) fn satisfied_buckets(&self, now: u64) -> Vec<Arc<BucketWrap<MetricBucket>>> {
        let (start, end) = self.bucket_start_range(now);
        self.inner
            .get_valid_values_conditional(now, &move |curr: u64| start <= curr && curr <= end)
    }

    pub fn interval_s(&self) -> f64 {
        self.interval_ms as f64 / 1000.0
    }

    pub fn sum_with_time(&self, now: u64, event: MetricEvent) -> u64 {
        let buckets = self.satisfied_buckets(now);
        let mut res = 0;
        for b in buckets {
            res += b.value().get(event);
        }
        res
    }

    pub fn qps_with_time(&self, now: u64, event: MetricEvent) -> f64 {
        self.sum_with_time(now, event) as f64 / self.interval_s()
    }

    pub fn max_of_single_bucket(&self, event: MetricEvent) -> u64 {
        let buckets = self.satisfied_buckets(curr_time_millis());
        let mut res = 0;
        for b in buckets {
            res = cmp::max(res, b.value().get(event));
        }
        res
    }

    pub fn max_concurrency(&self) -> u32 {
        let buckets = self.satisfied_buckets(curr_time_millis());
        let mut res = 0;
        for b in buckets {
            res = cmp::max(res, b.value().max_concurrency());
        }
        res
    }

    /// second_metrics_on_condition aggregates metric items by second on condition that
    /// the startTime of the statistic buckets satisfies the time predicate.
    pub fn second_metrics_on_condition(&self, condition: &TimePredicate) -> Vec<MetricItem> {
        let buckets = self
            .inner
            .get_valid_values_conditional(curr_time_millis(), condition);
        // Aggregate second-level MetricItem (only for stable metrics)
        let mut buckets_map = HashMap::<u64, Vec<Arc<BucketWrap<MetricBucket>>>>::new();
        for b in buckets {
            let start_stamp = b.start_stamp();
            // eliminates differences in millisecond-level
            let second_start = start_stamp - start_stamp % 1000;
            buckets_map
                .entry(second_start)
                .or_insert_with(Vec::new)
                .push(b);
        }
        let mut res = Vec::new();
        for (timestamp, b) in buckets_map {
            if !b.is_empty() {
                res.push(self.metric_item_from_buckets(timestamp, b));
            }
        }
        res
    }

    pub(crate) fn metric_item_from_buckets(
        &self,
        timestamp: u64,
        buckets: Vec<Arc<BucketWrap<MetricBucket>>>,
    ) -> MetricItem {
        let mut metric_item = MetricItem::default();
        let mut all_rt = 0;
        metric_item.timestamp = timestamp;
        for bucket in buckets {
            let b = bucket.value();
            metric_item.pass_qps += b.get(MetricEvent::Pass);
            metric_item.block_qps += b.get(MetricEvent::Block);
            metric_item.error_qps += b.get(MetricEvent::Error);
            metric_item.complete_qps += b.get(MetricEvent::Complete);
            metric_item.concurrency = cmp::max(b.max_concurrency(), metric_item.concurrency);
            all_rt += b.get(MetricEvent::Rt);
        }
        if metric_item.complete_qps > 0 {
            metric_item.avg_rt = all_rt / metric_item.complete_qps;
        } else {
            metric_item.avg_rt = all_rt;
        }
        metric_item
    }

    pub(crate) fn metric_item_from_bucket(
        &self,
        bucket: Arc<BucketWrap<MetricBucket>>,
    ) -> MetricItem {
        let timestamp = bucket.start_stamp();
        let bucket = bucket.value();
        let complete_qps = bucket.get(MetricEvent::Complete);
        let avg_rt = if complete_qps > 0 {
            bucket.get(MetricEvent::Rt) / complete_qps
        } else {
            bucket.get(MetricEvent::Rt)
        };
        MetricItem {
            timestamp,
            pass_qps: bucket.get(MetricEvent::Pass),
            block_qps: bucket.get(MetricEvent::Block),
            complete_qps,
            error_qps: bucket.get(MetricEvent::Error),
            avg_rt,
            ..MetricItem::default()
        }
    }
}

impl ReadStat for SlidingWindowMetric {
    fn qps(&self, event: MetricEvent) -> f64 {
        self.qps_with_time(curr_time_millis(), event)
    }

    fn qps_previous(&self, event: MetricEvent) -> f64 {
        self.qps_with_time(curr_time_millis() - self.bucket_len_ms as u64, event)
    }

    fn sum(&self, event: MetricEvent) -> u64 {
        self.sum_with_time(curr_time_millis(), event)
    }

    fn avg_rt(&self) -> f64 {
        let completed = self.sum(MetricEvent::Complete);
        if completed == 0 {
            0f64
        } else {
            self.sum(MetricEvent::Rt) as f64 / completed as f64
        }
    }

    fn min_rt(&self) -> f64 {
        let buckets = self.satisfied_buckets(curr_time_millis());
        let mut res = DEFAULT_STATISTIC_MAX_RT;
        for b in buckets {
            res = cmp::min(res, b.value().min_rt());
        }
        res as f64
    }
}
