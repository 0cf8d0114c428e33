//! Cluster-mode flow control contracts (§4.8/§6 of the design).
//!
//! The remote token service itself -- its RPC transport, discovery and the
//! embedded server's storage -- is explicitly out of scope (see `core::flow`'s
//! module doc and the crate-level Non-goals): this module only defines the
//! Rust trait/struct contract a cluster-mode `flow::Rule` would delegate to,
//! so a transport can be plugged in later without touching the flow slot's
//! dispatch logic.

use crate::base::{BlockType, TokenResult};
use crate::utils::{milli2nano, sleep_for_ns};

/// Response codes a `TokenService` may return for a single token request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenServiceStatus {
    Ok,
    ShouldWait,
    Blocked,
    NoRuleExists,
    BadRequest,
    Fail,
    TooManyRequest,
}

/// Outcome of a single cluster token request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenServiceResult {
    pub status: TokenServiceStatus,
    /// Remaining tokens in the current window as reported by the server;
    /// `-1` when the server does not report a remaining count.
    pub remaining: i64,
    /// Wait time in milliseconds the client should sleep before treating the
    /// request as admitted. Only meaningful when `status == ShouldWait`.
    pub wait_ms: u64,
}

impl TokenServiceResult {
    pub fn ok(remaining: i64) -> Self {
        TokenServiceResult {
            status: TokenServiceStatus::Ok,
            remaining,
            wait_ms: 0,
        }
    }

    pub fn should_wait(wait_ms: u64) -> Self {
        TokenServiceResult {
            status: TokenServiceStatus::ShouldWait,
            remaining: 0,
            wait_ms,
        }
    }

    pub fn blocked() -> Self {
        TokenServiceResult {
            status: TokenServiceStatus::Blocked,
            remaining: 0,
            wait_ms: 0,
        }
    }

    pub fn fail() -> Self {
        TokenServiceResult {
            status: TokenServiceStatus::Fail,
            remaining: -1,
            wait_ms: 0,
        }
    }
}

/// The remote (or in-process embedded) collaborator a cluster-mode flow rule
/// delegates admission to. Implementations own whatever transport they use
/// to reach the token server; this crate only specifies the call shape.
pub trait TokenService: Send + Sync {
    /// Requests `acquire_count` tokens for the rule identified by `rule_id`.
    /// `prioritized` requests may be granted a `ShouldWait` response instead
    /// of `Blocked` when the server supports priority occupy of a future
    /// window (mirroring `StatNode::try_occupy_next` locally, see §4.4).
    fn request_token(&self, rule_id: &str, acquire_count: u32, prioritized: bool) -> TokenServiceResult;
}

/// How a cluster token server derives the admission threshold for a rule
/// (§4.8): `Global` uses the rule's configured count directly; `AvgLocal`
/// divides it evenly across currently-connected clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdType {
    Global,
    AvgLocal,
}

/// Computes the threshold a cluster token server should enforce for a rule
/// whose nominal count is `count`, given `connected_clients` reporting in.
pub fn effective_threshold(threshold_type: ThresholdType, count: f64, connected_clients: u32) -> f64 {
    match threshold_type {
        ThresholdType::Global => count,
        ThresholdType::AvgLocal => count * connected_clients.max(1) as f64,
    }
}

/// Client-side handling of a `TokenService` response (§4.8):
/// - `Ok` admits.
/// - `ShouldWait` sleeps the advised duration, then admits.
/// - `Blocked`/`TooManyRequest` rejects.
/// - Any other status (`NoRuleExists`/`BadRequest`/`Fail`) falls back to
///   `local_check` when `fallback_to_local_when_fail` is set, or admits
///   otherwise -- a cluster-service hiccup should not itself cause a
///   reject if the caller has no local fallback configured.
pub fn handle_cluster_result<F>(
    result: TokenServiceResult,
    fallback_to_local_when_fail: bool,
    local_check: F,
) -> TokenResult
where
    F: FnOnce() -> TokenResult,
{
    match result.status {
        TokenServiceStatus::Ok => TokenResult::new_pass(),
        TokenServiceStatus::ShouldWait => {
            sleep_for_ns(milli2nano(result.wait_ms) as u64);
            TokenResult::new_pass()
        }
        TokenServiceStatus::Blocked | TokenServiceStatus::TooManyRequest => {
            TokenResult::new_blocked(BlockType::Flow)
        }
        TokenServiceStatus::NoRuleExists | TokenServiceStatus::BadRequest | TokenServiceStatus::Fail => {
            if fallback_to_local_when_fail {
                local_check()
            } else {
                TokenResult::new_pass()
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct AlwaysOk;
    impl TokenService for AlwaysOk {
        fn request_token(&self, _rule_id: &str, _acquire_count: u32, _prioritized: bool) -> TokenServiceResult {
            TokenServiceResult::ok(10)
        }
    }

    #[test]
    fn ok_admits() {
        let svc = AlwaysOk;
        let r = svc.request_token("r1", 1, false);
        let result = handle_cluster_result(r, false, TokenResult::new_pass);
        assert!(result.is_pass());
    }

    #[test]
    fn should_wait_admits_after_sleep() {
        let r = TokenServiceResult::should_wait(1);
        let result = handle_cluster_result(r, false, TokenResult::new_pass);
        assert!(result.is_pass());
    }

    #[test]
    fn blocked_rejects() {
        let r = TokenServiceResult::blocked();
        let result = handle_cluster_result(r, true, || {
            TokenResult::new_blocked(BlockType::Isolation)
        });
        assert!(result.is_blocked());
    }

    #[test]
    fn fail_without_fallback_admits() {
        let r = TokenServiceResult::fail();
        let result = handle_cluster_result(r, false, || {
            TokenResult::new_blocked(BlockType::Flow)
        });
        assert!(result.is_pass());
    }

    #[test]
    fn fail_with_fallback_runs_local_check() {
        let r = TokenServiceResult::fail();
        let result = handle_cluster_result(r, true, || TokenResult::new_blocked(BlockType::Flow));
        assert!(result.is_blocked());
    }

    #[test]
    fn effective_threshold_avg_local_scales_by_clients() {
        assert!((effective_threshold(ThresholdType::Global, 10.0, 5) - 10.0).abs() < f64::EPSILON);
        assert!((effective_threshold(ThresholdType::AvgLocal, 10.0, 5) - 50.0).abs() < f64::EPSILON);
        assert!((effective_threshold(ThresholdType::AvgLocal, 10.0, 0) - 10.0).abs() < f64::EPSILON);
    }
}
