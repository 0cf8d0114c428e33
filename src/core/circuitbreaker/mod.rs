//! `circuitbreaker` module implements the circuit breaker pattern, which provides
//! stability and prevents cascading failures in distributed systems.
//!
//! Circuit breaker rules support three strategies:
//!
//!  1. SlowRequestRatio: the ratio of slow response time entries (entry's response time is
//!     greater than the max allowed response time) exceeds the threshold. Requires
//!     `max_allowed_rt_ms` to be set.
//!
//!  2. ErrorRatio: the ratio of error entries exceeds the threshold.
//!
//!  3. ErrorCount: the number of error entries exceeds the threshold.
//!
//! Each circuit breaking `Rule` is converted into a `CircuitBreakerTrait` object with its
//! own statistic structure. The breaker is a state machine with three states:
//!
//!  1. Closed: all entries pass checking.
//!
//!  2. Open: the circuit breaker is broken, all entries are blocked. After the retry timeout
//!     elapses, the breaker transitions to Half-Open and allows one entry to probe whether
//!     the resource has recovered.
//!
//!  3. Half-Open: only one entry is allowed to access the resource; others are blocked.
//!
//! `StateChangeListener` lets callers observe state transitions.

pub mod breaker;
pub mod rule;
pub mod rule_manager;
pub mod slot;
pub mod stat_slot;

pub use breaker::*;
pub use rule::*;
pub use rule_manager::*;
pub use slot::*;
pub use stat_slot::*;
