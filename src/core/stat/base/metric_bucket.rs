use crate::base::{MetricEvent, DEFAULT_STATISTIC_MAX_RT};
use enum_map::EnumMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// use atomic types to ensure metric's internal mutability
/// otherwise, exclusive Mutex would be necessary on the LeapArray Arc among threads
/// todo: or use AtomicPtr?
pub trait MetricTrait: fmt::Debug + Default + Send + Sync {
    fn reset(&self);
}

/// MetricBucket represents the entity to record metrics per minimum time unit (i.e. the bucket time span).
/// Note that all operations of the MetricBucket are required to be thread-safe.
#[derive(Debug)]
pub struct MetricBucket {
    // EnumMap should work as fast as arrays
    counter: EnumMap<MetricEvent, AtomicU64>,
    min_rt: AtomicU64,
    max_concurrency: AtomicU32,
}

impl MetricTrait for MetricBucket {
    fn reset(&self) {
        for (_, item) in &self.counter {
            item.store(0, Ordering::SeqCst);
        }
        self.min_rt
            .store(DEFAULT_STATISTIC_MAX_RT, Ordering::SeqCst);
        self.max_concurrency.store(0, Ordering::SeqCst);
    }
}

impl Default for MetricBucket {
    fn default() -> Self {
        MetricBucket {
            counter: EnumMap::default(),
            min_rt: AtomicU64::new(DEFAULT_STATISTIC_MAX_RT),
            max_concurrency: AtomicU32::new(0),
        }
    }
}

impl MetricBucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add statistic count for the given metric event.
    pub fn add(&self, event: MetricEvent, count: u64) {
        match event {
            MetricEvent::Rt => self.add_rt(count),
            _ => self.add_count(event, count),
        }
    }

    pub fn add_count(&self, event: MetricEvent, count: u64) {
        self.counter[event].fetch_add(count, Ordering::SeqCst);
    }

    pub fn add_rt(&self, round_trip: u64) {
        self.add_count(MetricEvent::Rt, round_trip);
        if round_trip < self.min_rt.load(Ordering::SeqCst) {
            // Might not be accurate here.
            self.min_rt.store(round_trip, Ordering::SeqCst);
        }
    }

    /// Get current statistic count of the given metric event.
    pub fn get(&self, event: MetricEvent) -> u64 {
        self.counter[event].load(Ordering::SeqCst)
    }

    pub fn min_rt(&self) -> u64 {
        self.min_rt.load(Ordering::SeqCst)
    }
    pub fn update_concurrency(&self, concurrency: u32) {
        if concurrency > self.max_concurrency.load(Ordering::SeqCst) {
            // Might not be accurate here.
            self.max_concurrency.store(concurrency, Ordering::SeqCst);
        }
    }
    pub fn max_concurrency(&self) -> u32 {
        self.max_concurrency.load(Ordering::SeqCst)
    }
}
