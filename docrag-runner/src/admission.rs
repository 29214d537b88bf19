//! Admission control for ingestion triggers.
//!
//! Two fixed windows bound how often ingestion invocations start: a global
//! throttle on starts per minute, and a per-source rate limit of one start
//! per longer window. Rejected requests consume no budget.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::warn;

const INGEST_THROTTLE_LIMIT: u32 = 2;
const INGEST_THROTTLE_PERIOD: Duration = Duration::from_secs(60);
const INGEST_RATE_LIMIT_PERIOD: Duration = Duration::from_secs(4 * 60 * 60);

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The invocation may start now.
    Granted,
    /// The global start budget for the current window is spent.
    Throttled { retry_after: Duration },
    /// The key already started an invocation within its rate-limit window.
    RateLimited { retry_after: Duration },
}

impl Admission {
    pub fn is_granted(&self) -> bool {
        matches!(self, Admission::Granted)
    }

    /// How long the caller should wait before retrying, if rejected.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Admission::Granted => None,
            Admission::Throttled { retry_after } | Admission::RateLimited { retry_after } => {
                Some(*retry_after)
            }
        }
    }
}

struct GateState {
    window_start: Instant,
    starts_in_window: u32,
    last_start_by_key: HashMap<String, Instant>,
}

/// Start-rate gate evaluated before an ingestion invocation begins.
pub struct AdmissionGate {
    throttle_limit: u32,
    throttle_period: Duration,
    rate_limit_period: Duration,
    state: Mutex<GateState>,
}

impl AdmissionGate {
    pub fn new(
        throttle_limit: u32,
        throttle_period: Duration,
        rate_limit_period: Duration,
    ) -> Self {
        Self {
            throttle_limit,
            throttle_period,
            rate_limit_period,
            state: Mutex::new(GateState {
                window_start: Instant::now(),
                starts_in_window: 0,
                last_start_by_key: HashMap::new(),
            }),
        }
    }

    /// The ingestion policy: 2 starts per minute overall, one start per
    /// source every 4 hours.
    pub fn for_ingestion() -> Self {
        Self::new(
            INGEST_THROTTLE_LIMIT,
            INGEST_THROTTLE_PERIOD,
            INGEST_RATE_LIMIT_PERIOD,
        )
    }

    /// Decide whether an invocation keyed by `key` may start now. Budget is
    /// consumed only when the decision is [`Admission::Granted`].
    pub async fn admit(&self, key: &str) -> Admission {
        let now = Instant::now();
        let mut state = self.state.lock().await;

        if now.duration_since(state.window_start) >= self.throttle_period {
            state.window_start = now;
            state.starts_in_window = 0;
        }

        // Expired per-key records are dropped so the map only tracks live
        // rate-limit windows.
        let rate_period = self.rate_limit_period;
        state
            .last_start_by_key
            .retain(|_, started| now.duration_since(*started) < rate_period);

        if let Some(started) = state.last_start_by_key.get(key) {
            let retry_after = rate_period - now.duration_since(*started);
            warn!(key, ?retry_after, "ingestion rate limit hit");
            return Admission::RateLimited { retry_after };
        }

        if state.starts_in_window >= self.throttle_limit {
            let retry_after = self.throttle_period - now.duration_since(state.window_start);
            warn!(?retry_after, "ingestion throttle hit");
            return Admission::Throttled { retry_after };
        }

        state.starts_in_window += 1;
        state.last_start_by_key.insert(key.to_owned(), now);
        Admission::Granted
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::advance;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn grants_up_to_the_throttle_limit_per_window() {
        let gate = AdmissionGate::for_ingestion();

        assert!(gate.admit("a.pdf").await.is_granted());
        assert!(gate.admit("b.pdf").await.is_granted());
        assert!(matches!(
            gate.admit("c.pdf").await,
            Admission::Throttled { .. }
        ));

        advance(Duration::from_secs(61)).await;
        assert!(gate.admit("c.pdf").await.is_granted());
    }

    #[tokio::test(start_paused = true)]
    async fn limits_each_source_to_one_start_per_window() {
        let gate = AdmissionGate::for_ingestion();
        assert!(gate.admit("doc.pdf").await.is_granted());

        advance(Duration::from_secs(120)).await;
        assert!(matches!(
            gate.admit("doc.pdf").await,
            Admission::RateLimited { .. }
        ));

        advance(Duration::from_secs(4 * 60 * 60)).await;
        assert!(gate.admit("doc.pdf").await.is_granted());
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_requests_consume_no_budget() {
        let gate = AdmissionGate::for_ingestion();

        assert!(gate.admit("same.pdf").await.is_granted());
        assert!(matches!(
            gate.admit("same.pdf").await,
            Admission::RateLimited { .. }
        ));

        // The rejected duplicate left the second throttle slot intact.
        assert!(gate.admit("other.pdf").await.is_granted());
        assert!(matches!(
            gate.admit("third.pdf").await,
            Admission::Throttled { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn reports_time_until_the_window_reopens() {
        let gate = AdmissionGate::new(1, Duration::from_secs(60), Duration::from_secs(600));
        assert!(gate.admit("a").await.is_granted());

        advance(Duration::from_secs(20)).await;
        let throttled = gate.admit("b").await;
        assert_eq!(throttled.retry_after(), Some(Duration::from_secs(40)));

        let limited = gate.admit("a").await;
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(580)));
    }
}
