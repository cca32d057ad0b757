//! Fixed-window request throttling.
//!
//! Each key owns a counter and the instant its window opened. A request
//! after the window has elapsed opens a new window; otherwise it increments
//! the counter and is allowed while the count stays within budget. This is a
//! fixed window, not a sliding log: a burst straddling a window boundary may
//! pass up to twice the budget.
//!
//! Callers scope keys to both the protected operation and the actor
//! (`login:<ip>`, `article-create:<ip>`) so unrelated operations never share
//! a budget. State is per process and lost on restart.

use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use metrics::counter;
use thiserror::Error;
use tokio::time::Instant;
use tracing::warn;

/// Outcome when the limiter itself cannot decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Allow the request so a limiter fault cannot lock every user out.
    #[default]
    Open,
    /// Reject the request.
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub success: bool,
    pub remaining: u32,
}

/// A request ceiling over a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitBudget {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitBudget {
    pub const fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    pub fn retry_after_secs(&self) -> u64 {
        self.window.as_secs().max(1)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitCounter {
    pub count: u32,
    pub window_start: Instant,
    window: Duration,
}

impl RateLimitCounter {
    fn open(now: Instant, window: Duration) -> Self {
        Self {
            count: 1,
            window_start: now,
            window,
        }
    }

    fn window_elapsed(&self, now: Instant) -> bool {
        now.duration_since(self.window_start) > self.window
    }

    fn record(&mut self, now: Instant, max_requests: u32, window: Duration) -> RateLimitDecision {
        self.window = window;
        if self.window_elapsed(now) {
            *self = Self::open(now, window);
        } else {
            self.count = self.count.saturating_add(1);
        }
        self.decision(max_requests)
    }

    fn decision(&self, max_requests: u32) -> RateLimitDecision {
        RateLimitDecision {
            success: self.count <= max_requests,
            remaining: max_requests.saturating_sub(self.count),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LimiterFault {
    #[error("rate limiter is tracking {tracked} keys, limit is {limit}")]
    TableFull { tracked: usize, limit: usize },
}

/// Per-key fixed-window counters shared by every request handler.
#[derive(Debug)]
pub struct RateLimiter {
    counters: DashMap<String, RateLimitCounter>,
    max_tracked_keys: usize,
    failure_policy: FailurePolicy,
}

impl RateLimiter {
    pub fn new(max_tracked_keys: usize, failure_policy: FailurePolicy) -> Self {
        Self {
            counters: DashMap::new(),
            max_tracked_keys: max_tracked_keys.max(1),
            failure_policy,
        }
    }

    /// Count one request against `key`. Never fails: internal faults are
    /// resolved through the configured [`FailurePolicy`].
    pub fn rate_limit(&self, key: &str, max_requests: u32, window: Duration) -> RateLimitDecision {
        let decision = match self.try_rate_limit(key, max_requests, window) {
            Ok(decision) => decision,
            Err(fault) => self.resolve_fault(key, &fault),
        };

        if !decision.success {
            counter!("namngam_rate_limit_rejected_total", "scope" => scope_label(key))
                .increment(1);
        }
        decision
    }

    pub fn check(&self, key: &str, budget: RateLimitBudget) -> RateLimitDecision {
        self.rate_limit(key, budget.max_requests, budget.window)
    }

    /// Count one request, surfacing internal faults instead of applying the policy.
    pub fn try_rate_limit(
        &self,
        key: &str,
        max_requests: u32,
        window: Duration,
    ) -> Result<RateLimitDecision, LimiterFault> {
        let now = Instant::now();

        if let Some(mut counter) = self.counters.get_mut(key) {
            return Ok(counter.record(now, max_requests, window));
        }

        if self.counters.len() >= self.max_tracked_keys {
            self.sweep_expired();
            let tracked = self.counters.len();
            if tracked >= self.max_tracked_keys {
                return Err(LimiterFault::TableFull {
                    tracked,
                    limit: self.max_tracked_keys,
                });
            }
        }

        let decision = match self.counters.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => occupied.get_mut().record(now, max_requests, window),
            Entry::Vacant(vacant) => {
                let counter = RateLimitCounter::open(now, window);
                let decision = counter.decision(max_requests);
                vacant.insert(counter);
                decision
            }
        };
        Ok(decision)
    }

    /// Drop counters whose window has elapsed. Returns the number removed.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.counters.len();
        self.counters
            .retain(|_, counter| !counter.window_elapsed(now));
        before.saturating_sub(self.counters.len())
    }

    pub fn tracked_keys(&self) -> usize {
        self.counters.len()
    }

    fn resolve_fault(&self, key: &str, fault: &LimiterFault) -> RateLimitDecision {
        let success = matches!(self.failure_policy, FailurePolicy::Open);
        warn!(
            target = "namngam::rate_limit",
            scope = scope_label(key),
            error = %fault,
            fail_open = success,
            "rate limiter fault"
        );
        RateLimitDecision {
            success,
            remaining: 0,
        }
    }
}

/// Operation part of a `scope:actor` key, used as a low-cardinality label.
fn scope_label(key: &str) -> String {
    key.split_once(':')
        .map_or(key, |(scope, _)| scope)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(900);

    fn limiter() -> RateLimiter {
        RateLimiter::new(100, FailurePolicy::Open)
    }

    #[tokio::test(start_paused = true)]
    async fn budget_allows_exactly_max_requests() {
        let limiter = limiter();
        for expected_remaining in (0..5).rev() {
            let decision = limiter.rate_limit("login:10.0.0.1", 5, WINDOW);
            assert!(decision.success);
            assert_eq!(decision.remaining, expected_remaining);
        }

        let rejected = limiter.rate_limit("login:10.0.0.1", 5, WINDOW);
        assert_eq!(
            rejected,
            RateLimitDecision {
                success: false,
                remaining: 0
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn window_elapse_resets_counter() {
        let limiter = limiter();
        for _ in 0..6 {
            limiter.rate_limit("login:10.0.0.1", 5, WINDOW);
        }

        tokio::time::advance(WINDOW).await;
        assert!(!limiter.rate_limit("login:10.0.0.1", 5, WINDOW).success);

        tokio::time::advance(WINDOW + Duration::from_secs(1)).await;
        let decision = limiter.rate_limit("login:10.0.0.1", 5, WINDOW);
        assert!(decision.success);
        assert_eq!(decision.remaining, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn keys_do_not_share_budgets() {
        let limiter = limiter();
        for _ in 0..5 {
            limiter.rate_limit("article-create:10.0.0.1", 5, WINDOW);
        }
        assert!(!limiter.rate_limit("article-create:10.0.0.1", 5, WINDOW).success);
        assert!(limiter.rate_limit("login:10.0.0.1", 5, WINDOW).success);
        assert!(limiter.rate_limit("article-create:10.0.0.2", 5, WINDOW).success);
    }

    #[tokio::test(start_paused = true)]
    async fn boundary_burst_is_allowed() {
        let limiter = limiter();
        tokio::time::advance(Duration::from_secs(1)).await;
        for _ in 0..3 {
            assert!(limiter.rate_limit("k:a", 3, Duration::from_secs(10)).success);
        }
        tokio::time::advance(Duration::from_secs(11)).await;
        for _ in 0..3 {
            assert!(limiter.rate_limit("k:a", 3, Duration::from_secs(10)).success);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn full_table_fails_open_by_default() {
        let limiter = RateLimiter::new(1, FailurePolicy::Open);
        limiter.rate_limit("login:a", 5, WINDOW);

        assert_eq!(
            limiter.try_rate_limit("login:b", 5, WINDOW),
            Err(LimiterFault::TableFull {
                tracked: 1,
                limit: 1
            })
        );
        assert_eq!(
            limiter.rate_limit("login:b", 5, WINDOW),
            RateLimitDecision {
                success: true,
                remaining: 0
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn full_table_fails_closed_when_configured() {
        let limiter = RateLimiter::new(1, FailurePolicy::Closed);
        limiter.rate_limit("login:a", 5, WINDOW);
        assert!(!limiter.rate_limit("login:b", 5, WINDOW).success);
        assert!(limiter.rate_limit("login:a", 5, WINDOW).success);
    }

    #[tokio::test(start_paused = true)]
    async fn full_table_recovers_after_sweep() {
        let limiter = RateLimiter::new(1, FailurePolicy::Closed);
        limiter.rate_limit("login:a", 5, Duration::from_secs(1));
        tokio::time::advance(Duration::from_secs(2)).await;

        assert!(limiter.rate_limit("login:b", 5, WINDOW).success);
        assert_eq!(limiter.tracked_keys(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_drops_elapsed_windows() {
        let limiter = limiter();
        limiter.rate_limit("a:1", 5, Duration::from_secs(1));
        limiter.rate_limit("b:1", 5, Duration::from_secs(60));
        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(limiter.sweep_expired(), 1);
        assert_eq!(limiter.tracked_keys(), 1);
    }

    #[test]
    fn scope_label_takes_operation_part() {
        assert_eq!(scope_label("login:10.0.0.1"), "login");
        assert_eq!(scope_label("bare"), "bare");
        assert_eq!(RateLimitBudget::new(5, Duration::ZERO).retry_after_secs(), 1);
    }
}
