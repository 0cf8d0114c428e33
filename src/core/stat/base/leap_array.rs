use super::MetricTrait;
use crate::base::TimePredicate;
use crate::utils::curr_time_millis;
use crate::{Error, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

const DEFAULT_TIME: u64 = 0;

/// BucketWrap represents a slot recording metrics over `[start_stamp, start_stamp+bucket_length)`.
/// The metric itself (`T`) is internally atomic, so a shared `Arc<BucketWrap<T>>` can be updated
/// from multiple threads without an outer lock.
#[derive(Debug, Default)]
pub struct BucketWrap<T: MetricTrait> {
    start_stamp: AtomicU64,
    value: T,
}

impl<T: MetricTrait> BucketWrap<T> {
    pub fn new(start_stamp: u64) -> Self {
        BucketWrap {
            start_stamp: AtomicU64::new(start_stamp),
            value: T::default(),
        }
    }

    pub fn start_stamp(&self) -> u64 {
        self.start_stamp.load(Ordering::SeqCst)
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn reset_start_stamp(&self, start_stamp: u64) {
        self.start_stamp.store(start_stamp, Ordering::SeqCst);
    }

    pub fn reset_value(&self) {
        self.value.reset();
    }

    pub fn is_time_in_bucket(&self, now: u64, bucket_len_ms: u32) -> bool {
        let start = self.start_stamp.load(Ordering::SeqCst);
        start <= now && now < start + (bucket_len_ms as u64)
    }

    pub fn is_deprecated(&self, now: u64, interval: u64) -> bool {
        let start = self.start_stamp.load(Ordering::SeqCst);
        now > start && now - start > interval
    }
}

/// The BucketWrap leap array. The inner array is treated as a ring: `sample_count` is the
/// number of buckets and `interval_ms` is the total span they cover, so
/// `bucket_len_ms = interval_ms / sample_count`.
#[derive(Debug)]
pub struct LeapArray<T: MetricTrait> {
    bucket_len_ms: u32,
    sample_count: u32,
    interval_ms: u32,
    pub(crate) array: Vec<Arc<BucketWrap<T>>>,
    mutex: Vec<Mutex<bool>>,
}

impl<T: MetricTrait> LeapArray<T> {
    pub fn new(sample_count: u32, interval_ms: u32) -> Result<Self> {
        if sample_count == 0 || interval_ms % sample_count != 0 {
            return Err(Error::msg(
                "Invalid sample count or interval_ms. Time span needs to be evenly divided",
            ));
        }
        let mut array = Vec::with_capacity(sample_count as usize);
        let mut mutex = Vec::with_capacity(sample_count as usize);
        for _ in 0..sample_count {
            array.push(Arc::new(BucketWrap::default()));
            mutex.push(Mutex::new(false));
        }
        Ok(LeapArray {
            bucket_len_ms: interval_ms / sample_count,
            sample_count,
            interval_ms,
            array,
            mutex,
        })
    }

    pub fn bucket_len_ms(&self) -> u32 {
        self.bucket_len_ms
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    pub fn reset_bucket(&self, idx: usize, start_stamp: u64) {
        self.array[idx].reset_start_stamp(start_stamp);
        self.array[idx].reset_value();
    }

    pub fn current_bucket(&self) -> Result<Arc<BucketWrap<T>>> {
        self.get_bucket_of_time(curr_time_millis())
    }

    /// Get bucket item at given time from the array.
    /// - Bucket is absent: create and install it.
    /// - Bucket is up-to-date: return it as-is.
    /// - Bucket is deprecated: reset it in place (guarded by a per-slot try-lock).
    /// - `now` regresses behind the slot's current window (clock went backwards, or a very
    ///   late-arriving call raced a reset): return a freshly built, detached bucket that is
    ///   never installed into the ring, so a confused caller cannot corrupt live statistics.
    pub fn get_bucket_of_time(&self, now: u64) -> Result<Arc<BucketWrap<T>>> {
        let idx = self.time2idx(now) as usize;
        let target_start = self.calculate_start_stamp(now);
        let bucket = self.array[idx].clone();
        loop {
            let curr_start = bucket.start_stamp();
            if curr_start == DEFAULT_TIME {
                bucket.reset_start_stamp(target_start);
                return Ok(Arc::clone(&bucket));
            } else if curr_start == target_start {
                return Ok(Arc::clone(&bucket));
            } else if target_start > curr_start {
                if self.mutex[idx].try_lock().is_ok() {
                    self.reset_bucket(idx, target_start);
                    return Ok(Arc::clone(&self.array[idx]));
                } else {
                    std::thread::yield_now();
                }
            } else {
                return Ok(Arc::new(BucketWrap::new(target_start)));
            }
        }
    }

    /// Get the previous bucket item for current timestamp.
    pub fn get_previous_bucket(&self) -> Result<Arc<BucketWrap<T>>> {
        let previous = curr_time_millis() - (self.bucket_len_ms as u64);
        let idx = self.time2idx(previous) as usize;
        let bucket = self.array[idx].clone();
        if bucket.is_deprecated(curr_time_millis(), self.interval_ms as u64) {
            return Err(Error::msg("previous bucket has been deprecated"));
        }
        if bucket.start_stamp() + (self.bucket_len_ms as u64) < previous {
            return Err(Error::msg("the timestamp of returnning bucket is wrong"));
        }
        Ok(bucket)
    }

    pub(crate) fn calculate_start_stamp(&self, now: u64) -> u64 {
        now - now % (self.bucket_len_ms as u64)
    }

    pub(crate) fn time2idx(&self, now: u64) -> u64 {
        let idx = now / (self.bucket_len_ms as u64);
        idx % (self.sample_count as u64)
    }

    pub fn valid_array(&self) -> Vec<Arc<BucketWrap<T>>> {
        let mut res = Vec::new();
        for bucket in &self.array {
            if !bucket.is_deprecated(curr_time_millis(), self.interval_ms as u64) {
                res.push(bucket.clone());
            }
        }
        res
    }

    pub fn get_bucket_value(&self, now: u64) -> Result<&T> {
        let idx = self.time2idx(now) as usize;
        let bucket = &self.array[idx];
        if bucket.is_time_in_bucket(now, self.bucket_len_ms) {
            Ok(bucket.value())
        } else {
            Err(Error::msg("invalid time, cannot get value in the bucket"))
        }
    }

    pub fn get_current_values(&self) -> Vec<Arc<BucketWrap<T>>> {
        self.get_valid_values(curr_time_millis())
    }

    /// Get all BucketWrap between `[now - interval, now]`.
    pub fn get_valid_values(&self, now: u64) -> Vec<Arc<BucketWrap<T>>> {
        self.get_valid_values_conditional(now, &|_| true)
    }

    pub fn get_valid_values_conditional(
        &self,
        now: u64,
        condition: &TimePredicate,
    ) -> Vec<Arc<BucketWrap<T>>> {
        let mut res = Vec::new();
        for bucket in &self.array {
            if !bucket.is_deprecated(now, self.interval_ms as u64) && condition(bucket.start_stamp())
            {
                res.push(bucket.clone());
            }
        }
        res
    }

    #[cfg(test)]
    pub(self) fn get_valid_head(&self) -> Result<Arc<BucketWrap<T>>> {
        let idx = self.time2idx(curr_time_millis() + (self.bucket_len_ms as u64)) as usize;
        let bucket = self.array[idx].clone();
        if bucket.is_deprecated(curr_time_millis(), self.interval_ms as u64) {
            Err(Error::msg("Cannot get a valid head"))
        } else {
            Ok(bucket)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use std::{thread, time};

    const SAMPLE_COUNT: u32 = 20;
    const BUCKET_LEN_MS: u32 = 500;
    const INTERVAL_MS: u32 = BUCKET_LEN_MS * SAMPLE_COUNT;

    impl MetricTrait for AtomicU64 {
        fn reset(&self) {
            self.store(0, Ordering::SeqCst);
        }
    }
    type LeapArrayAtomicU64 = LeapArray<AtomicU64>;

    #[test]
    fn time_idx() {
        let arr = LeapArrayAtomicU64::new(SAMPLE_COUNT, INTERVAL_MS).unwrap();
        assert_eq!(arr.time2idx(1576296044907), 9);
        assert_eq!(arr.calculate_start_stamp(1576296044907), 1576296044500);
    }

    #[test]
    fn start_time() {
        let arr = LeapArrayAtomicU64::new(SAMPLE_COUNT, INTERVAL_MS).unwrap();
        let now = 1596199310000;
        let bucket = arr.get_bucket_of_time(now + 801).unwrap();
        assert_eq!(bucket.start_stamp(), now + 500);
        assert!(Arc::ptr_eq(&bucket, arr.array.get(1).unwrap()));
    }

    #[test]
    fn deprecated() {
        let now = 1576296044907;
        let bucket = BucketWrap::<AtomicU64>::new(1576296004907);
        assert!(bucket.is_deprecated(now, INTERVAL_MS as u64));
    }

    #[test]
    fn clock_regression_returns_detached_bucket() {
        let arr = LeapArrayAtomicU64::new(SAMPLE_COUNT, INTERVAL_MS).unwrap();
        let now = 1596199310000;
        arr.get_bucket_of_time(now).unwrap();
        let regressed = arr.get_bucket_of_time(now - INTERVAL_MS as u64).unwrap();
        // the ring slot for `now` must be untouched by the regressed read
        let still_current = arr.get_bucket_of_time(now).unwrap();
        assert_eq!(still_current.start_stamp(), arr.calculate_start_stamp(now));
        assert_ne!(regressed.start_stamp(), still_current.start_stamp());
        assert!(!Arc::ptr_eq(&regressed, &still_current));
    }

    #[test]
    #[ignore]
    fn valid_head() {
        let sample_count = 10;
        let interval_ms = 1000;
        let bucket_len_ms = (interval_ms / sample_count) as u64;
        let arr = LeapArrayAtomicU64::new(sample_count, interval_ms).unwrap();

        let window = time::Duration::from_millis(bucket_len_ms);
        for i in 1..=(sample_count as u64) {
            thread::sleep(window);
            arr.current_bucket()
                .unwrap()
                .value()
                .store(i, Ordering::SeqCst);
        }
        thread::sleep(window);
        let head = arr.get_valid_head().unwrap();
        assert_eq!(2, head.value().load(Ordering::SeqCst));
    }
}
