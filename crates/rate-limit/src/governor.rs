//! Rate-Limit Governor
//!
//! Process-wide tracker of exchange quota consumption:
//! - Reads weight and order-count headers from every response
//! - Throttles at high usage or on HTTP 429, bans on HTTP 418
//! - Answers "may this request go out now?" for every outgoing call
//!
//! All state sits behind one mutex; every public method takes it once, so
//! check-then-set sequences (bucket update, throttle escalation) are atomic.

use crate::config::{MAX_RETRY_AFTER_SECS, RateLimitConfig};
use crate::error::{RateLimitError, Result};
use crate::request::{ExchangeRequest, ExchangeResponse, HttpMethod};
use crate::state::{BlockRemaining, BlockState};
use bastion_bus::{BanNotice, ChannelPublisher, ChannelSubscriber, Publisher};
use bastion_core::{QuotaUsage, Timestamp};
use bastion_ports::Clock;
use chrono::{DateTime, Duration, Utc};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Point-in-time view of the governor
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatus {
    pub block_state: BlockState,
    /// Seconds until unblocked; `None` when banned
    pub block_remaining_secs: Option<i64>,
    /// Window with the highest usage percentage
    pub busiest_window: Option<(String, QuotaUsage)>,
    pub weights: HashMap<String, QuotaUsage>,
    pub order_counts: HashMap<String, u64>,
}

#[derive(Default)]
struct GovernorState {
    weights: HashMap<String, QuotaUsage>,
    order_counts: HashMap<String, u64>,
    block: BlockState,
}

impl GovernorState {
    /// Lift an elapsed throttle
    fn expire(&mut self, now: Timestamp) {
        if self.block.expire(now) {
            info!("[RATE-LIMIT] Throttle window elapsed, requests resumed");
        }
    }

    /// Enter (or extend) a throttle; never shortens one, never downgrades a ban
    fn throttle(&mut self, now: Timestamp, duration: Duration, reason: &str) {
        let until = now
            .checked_add_signed(duration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        match self.block {
            BlockState::Banned { .. } => {}
            BlockState::Throttled { until: current } if current >= until => {
                debug!(
                    "[RATE-LIMIT] Already throttled until {} ({})",
                    current, reason
                );
            }
            _ => {
                warn!(
                    "[RATE-LIMIT] Throttling for {}s: {}",
                    duration.num_seconds(),
                    reason
                );
                self.block = BlockState::Throttled { until };
            }
        }
    }
}

pub struct RateLimitGovernor {
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<GovernorState>,
    bans: ChannelPublisher<BanNotice>,
}

impl RateLimitGovernor {
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_ban_publisher(config, clock, ChannelPublisher::new(16))
    }

    /// Create a governor that broadcasts bans on an existing channel
    pub fn with_ban_publisher(
        config: RateLimitConfig,
        clock: Arc<dyn Clock>,
        bans: ChannelPublisher<BanNotice>,
    ) -> Self {
        Self {
            config,
            clock,
            state: Mutex::new(GovernorState::default()),
            bans,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Listen for ban notices
    pub fn subscribe_bans(&self) -> ChannelSubscriber<BanNotice> {
        self.bans.subscribe()
    }

    /// Feed an exchange response back into the governor
    ///
    /// Updates every weight and order-count bucket present in the headers,
    /// then applies the status code. Returns the resulting block state.
    pub async fn check_rate_limit(&self, response: &ExchangeResponse) -> BlockState {
        let (block, notice) = {
            let mut state = self.state.lock();
            let now = self.clock.now();
            state.expire(now);

            for (name, value) in response.headers() {
                if let Some(window) = name.strip_prefix(&self.config.weight_header_prefix) {
                    let used = match parse_counter(name, value) {
                        Ok(used) => used,
                        Err(e) => {
                            warn!("[RATE-LIMIT] {}", e);
                            continue;
                        }
                    };
                    let usage = QuotaUsage::new(used, self.config.window_max(window));
                    state.weights.insert(window.to_string(), usage);

                    if usage.percentage > self.config.throttle_pct {
                        warn!(
                            "[RATE-LIMIT] Weight {} at {:.1}% ({}/{})",
                            window, usage.percentage, usage.used, usage.max
                        );
                        state.throttle(
                            now,
                            to_chrono(self.config.throttle_duration()),
                            &format!("{} weight at {:.1}%", window, usage.percentage),
                        );
                    } else if usage.percentage > self.config.warn_pct {
                        warn!(
                            "[RATE-LIMIT] Weight {} at {:.1}% ({}/{})",
                            window, usage.percentage, usage.used, usage.max
                        );
                    }
                } else if let Some(window) =
                    name.strip_prefix(&self.config.order_count_header_prefix)
                {
                    match parse_counter(name, value) {
                        Ok(count) => {
                            state.order_counts.insert(window.to_string(), count);
                        }
                        Err(e) => warn!("[RATE-LIMIT] {}", e),
                    }
                }
            }

            let mut notice = None;
            match response.status {
                429 => {
                    let retry_after = response
                        .header("retry-after")
                        .and_then(|v| v.trim().parse::<u64>().ok())
                        .map(|secs| {
                            if secs > MAX_RETRY_AFTER_SECS {
                                warn!(
                                    "[RATE-LIMIT] Retry-After {}s capped at {}s",
                                    secs, MAX_RETRY_AFTER_SECS
                                );
                            }
                            Duration::seconds(secs.min(MAX_RETRY_AFTER_SECS) as i64)
                        })
                        .unwrap_or_else(|| to_chrono(self.config.default_retry_after()));
                    state.throttle(now, retry_after, "HTTP 429 quota exceeded");
                }
                418 => {
                    if !state.block.is_banned() {
                        error!("[RATE-LIMIT] HTTP 418: IP banned, blocking all non-critical requests");
                        state.block = BlockState::Banned { since: now };
                        notice = Some(BanNotice {
                            timestamp: now,
                            quota_snapshot: state.weights.clone(),
                            order_count_snapshot: state.order_counts.clone(),
                        });
                    } else {
                        error!("[RATE-LIMIT] HTTP 418 received while already banned");
                    }
                }
                _ => {}
            }

            (state.block, notice)
        };

        if let Some(notice) = notice
            && let Err(e) = self.bans.publish(&notice).await
        {
            debug!("[RATE-LIMIT] Ban notice not delivered: {}", e);
        }

        block
    }

    /// Is this a call that must never be deferred?
    ///
    /// Reduce-only / close-position order placement and position queries.
    pub fn is_critical_operation(&self, request: &ExchangeRequest) -> bool {
        let path = request.path().trim_end_matches('/');
        let matches_any =
            |endpoints: &[String]| endpoints.iter().any(|e| path.ends_with(e.as_str()));

        let closing_order = request.method == HttpMethod::Post
            && matches_any(&self.config.order_endpoints)
            && request.is_position_closing();
        let position_query =
            request.method == HttpMethod::Get && matches_any(&self.config.position_endpoints);

        closing_order || position_query
    }

    /// Must this request be deferred?
    ///
    /// Critical operations always pass, even while banned.
    pub fn should_block(&self, request: &ExchangeRequest) -> bool {
        let critical = self.is_critical_operation(request);

        let mut state = self.state.lock();
        state.expire(self.clock.now());
        let block = state.block;

        if critical {
            if block.is_blocked() {
                info!(
                    "[RATE-LIMIT] Critical {} {} allowed through while {:?}",
                    request.method,
                    request.path(),
                    block
                );
            }
            return false;
        }

        if block.is_blocked() {
            debug!(
                "[RATE-LIMIT] Deferring {} {} ({:?})",
                request.method,
                request.path(),
                block
            );
        }
        block.is_blocked()
    }

    /// Time left in the current block
    pub fn block_time_remaining(&self) -> BlockRemaining {
        let mut state = self.state.lock();
        let now = self.clock.now();
        state.expire(now);
        state.block.remaining(now)
    }

    pub fn block_state(&self) -> BlockState {
        let mut state = self.state.lock();
        state.expire(self.clock.now());
        state.block
    }

    pub fn is_banned(&self) -> bool {
        self.block_state().is_banned()
    }

    /// Current weight usage per window
    pub fn weight_usage(&self) -> HashMap<String, QuotaUsage> {
        self.state.lock().weights.clone()
    }

    /// Current order count per window
    pub fn order_counts(&self) -> HashMap<String, u64> {
        self.state.lock().order_counts.clone()
    }

    pub fn status(&self) -> RateLimitStatus {
        let mut state = self.state.lock();
        let now = self.clock.now();
        state.expire(now);
        let block = state.block;

        let block_remaining_secs = match block.remaining(now) {
            BlockRemaining::Clear => Some(0),
            BlockRemaining::For(d) => Some(d.num_seconds()),
            BlockRemaining::Indefinite => None,
        };

        let busiest_window = state
            .weights
            .iter()
            .max_by(|a, b| a.1.percentage.total_cmp(&b.1.percentage))
            .map(|(window, usage)| (window.clone(), *usage));

        RateLimitStatus {
            block_state: block,
            block_remaining_secs,
            busiest_window,
            weights: state.weights.clone(),
            order_counts: state.order_counts.clone(),
        }
    }

    /// Clear all counters and lift any throttle or ban
    ///
    /// Operator action only (e.g. after moving to a new IP).
    pub fn reset(&self) {
        let mut state = self.state.lock();
        let was = state.block;
        *state = GovernorState::default();
        info!("[RATE-LIMIT] Reset by operator (was {:?})", was);
    }
}

fn parse_counter(header: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| RateLimitError::InvalidHeaderValue {
            header: header.to_string(),
            value: value.to_string(),
        })
}

fn to_chrono(duration: std::time::Duration) -> Duration {
    Duration::from_std(duration).unwrap_or_else(|_| Duration::seconds(60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_bus::Subscriber;
    use bastion_clock::ManualClock;

    fn governor() -> (RateLimitGovernor, Arc<ManualClock>) {
        let clock = ManualClock::new(None);
        let governor = RateLimitGovernor::new(RateLimitConfig::default(), clock.clone());
        (governor, clock)
    }

    fn market_data() -> ExchangeRequest {
        ExchangeRequest::get("/fapi/v1/klines").with_param("symbol", "BTCUSDT")
    }

    fn close_order() -> ExchangeRequest {
        ExchangeRequest::post("/fapi/v1/order")
            .with_param("symbol", "BTCUSDT")
            .with_param("reduceOnly", "true")
    }

    #[test]
    fn test_critical_classification() {
        let (g, _) = governor();

        assert!(g.is_critical_operation(&close_order()));
        assert!(g.is_critical_operation(&ExchangeRequest::get(
            "https://fapi.binance.com/fapi/v2/positionRisk?symbol=ETHUSDT"
        )));
        assert!(g.is_critical_operation(
            &ExchangeRequest::post("/fapi/v1/order").with_param("closePosition", "true")
        ));

        // opening orders, other endpoints, other methods
        assert!(!g.is_critical_operation(&ExchangeRequest::post("/fapi/v1/order")));
        assert!(!g.is_critical_operation(&market_data()));
        assert!(!g.is_critical_operation(
            &ExchangeRequest::get("/fapi/v1/order").with_param("reduceOnly", "true")
        ));
        assert!(!g.is_critical_operation(
            &ExchangeRequest::post("/fapi/v1/leverage").with_param("reduceOnly", "true")
        ));
    }

    #[tokio::test]
    async fn test_usage_tracking() {
        let (g, _) = governor();
        let response = ExchangeResponse::ok()
            .with_header("X-MBX-USED-WEIGHT-1M", "1200")
            .with_header("X-MBX-ORDER-COUNT-10S", "7")
            .with_header("X-MBX-ORDER-COUNT-1D", "150");

        let state = g.check_rate_limit(&response).await;
        assert_eq!(state, BlockState::Open);

        let weights = g.weight_usage();
        assert_eq!(weights["1m"].used, 1200);
        assert_eq!(weights["1m"].max, 24_000);
        assert_eq!(weights["1m"].remaining, 22_800);

        let counts = g.order_counts();
        assert_eq!(counts["10s"], 7);
        assert_eq!(counts["1d"], 150);
    }

    #[tokio::test]
    async fn test_high_usage_throttles_for_sixty_seconds() {
        let (g, clock) = governor();
        let response = ExchangeResponse::ok().with_header("x-mbx-used-weight-1m", "23500");

        let state = g.check_rate_limit(&response).await;
        assert!(matches!(state, BlockState::Throttled { .. }));
        assert_eq!(
            g.block_time_remaining(),
            BlockRemaining::For(Duration::seconds(60))
        );

        assert!(g.should_block(&market_data()));
        assert!(!g.should_block(&close_order()));

        clock.advance(Duration::seconds(60));
        assert!(!g.should_block(&market_data()));
        assert_eq!(g.block_state(), BlockState::Open);
    }

    #[tokio::test]
    async fn test_warning_band_does_not_throttle() {
        let (g, _) = governor();
        // 90% of the 1m window
        let response = ExchangeResponse::ok().with_header("x-mbx-used-weight-1m", "21600");

        assert_eq!(g.check_rate_limit(&response).await, BlockState::Open);
        assert!(!g.should_block(&market_data()));
    }

    #[tokio::test]
    async fn test_unknown_window_uses_default_max() {
        let (g, _) = governor();
        let response = ExchangeResponse::ok().with_header("x-mbx-used-weight-3h", "960");

        let state = g.check_rate_limit(&response).await;
        assert_eq!(g.weight_usage()["3h"].max, 1000);
        assert!(state.is_blocked());
    }

    #[tokio::test]
    async fn test_invalid_header_skipped() {
        let (g, _) = governor();
        let response = ExchangeResponse::ok()
            .with_header("x-mbx-used-weight-1m", "-5")
            .with_header("x-mbx-used-weight-1s", "12");

        g.check_rate_limit(&response).await;
        let weights = g.weight_usage();
        assert!(!weights.contains_key("1m"));
        assert_eq!(weights["1s"].used, 12);
    }

    #[tokio::test]
    async fn test_429_uses_retry_after() {
        let (g, _) = governor();
        let response = ExchangeResponse::new(429).with_header("Retry-After", "17");

        g.check_rate_limit(&response).await;
        assert_eq!(
            g.block_time_remaining(),
            BlockRemaining::For(Duration::seconds(17))
        );
    }

    #[tokio::test]
    async fn test_429_default_retry() {
        let (g, _) = governor();
        g.check_rate_limit(&ExchangeResponse::new(429)).await;
        assert_eq!(
            g.block_time_remaining(),
            BlockRemaining::For(Duration::seconds(60))
        );

        let (g, _) = governor();
        g.check_rate_limit(&ExchangeResponse::new(429).with_header("Retry-After", "soon"))
            .await;
        assert_eq!(
            g.block_time_remaining(),
            BlockRemaining::For(Duration::seconds(60))
        );
    }

    #[tokio::test]
    async fn test_oversized_retry_after_capped() {
        let (g, clock) = governor();
        let response = ExchangeResponse::new(429).with_header("Retry-After", "99999999999999");

        let state = g.check_rate_limit(&response).await;
        assert!(state.is_blocked());
        assert_eq!(
            g.block_time_remaining(),
            BlockRemaining::For(Duration::seconds(MAX_RETRY_AFTER_SECS as i64))
        );

        clock.advance(Duration::days(1));
        assert_eq!(g.block_state(), BlockState::Open);
    }

    #[tokio::test]
    async fn test_throttle_saturates_at_end_of_time() {
        let clock = ManualClock::new(None);
        let config = RateLimitConfig {
            // Representable as a duration, beyond the calendar
            throttle_secs: 1_000_000_000_000_000,
            ..RateLimitConfig::default()
        };
        let g = RateLimitGovernor::new(config, clock.clone());

        let state = g
            .check_rate_limit(&ExchangeResponse::ok().with_header("x-mbx-used-weight-1m", "24000"))
            .await;
        assert_eq!(
            state,
            BlockState::Throttled {
                until: DateTime::<Utc>::MAX_UTC
            }
        );
        assert!(g.should_block(&market_data()));
    }

    #[tokio::test]
    async fn test_throttle_never_shortened() {
        let (g, clock) = governor();
        g.check_rate_limit(&ExchangeResponse::new(429).with_header("Retry-After", "120"))
            .await;

        clock.advance(Duration::seconds(10));
        g.check_rate_limit(&ExchangeResponse::new(429).with_header("Retry-After", "5"))
            .await;

        assert_eq!(
            g.block_time_remaining(),
            BlockRemaining::For(Duration::seconds(110))
        );
    }

    #[tokio::test]
    async fn test_ban_is_permanent_until_reset() {
        let (g, clock) = governor();
        let mut bans = g.subscribe_bans();

        g.check_rate_limit(&ExchangeResponse::ok().with_header("x-mbx-used-weight-1m", "500"))
            .await;
        let state = g.check_rate_limit(&ExchangeResponse::new(418)).await;
        assert!(state.is_banned());

        let notice = bans.try_next().unwrap().expect("ban notice");
        assert_eq!(notice.quota_snapshot["1m"].used, 500);

        clock.advance(Duration::days(2));
        assert!(g.should_block(&market_data()));
        assert!(!g.should_block(&close_order()));
        assert_eq!(g.block_time_remaining(), BlockRemaining::Indefinite);

        // 429 while banned does not downgrade
        g.check_rate_limit(&ExchangeResponse::new(429)).await;
        assert!(g.is_banned());

        g.reset();
        assert!(!g.should_block(&market_data()));
        assert!(g.weight_usage().is_empty());
        assert!(g.order_counts().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_ban_broadcasts_once() {
        let (g, _) = governor();
        let mut bans = g.subscribe_bans();

        g.check_rate_limit(&ExchangeResponse::new(418)).await;
        g.check_rate_limit(&ExchangeResponse::new(418)).await;

        assert!(bans.try_next().unwrap().is_some());
        assert!(bans.try_next().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_status_reports_busiest_window() {
        let (g, _) = governor();
        g.check_rate_limit(
            &ExchangeResponse::ok()
                .with_header("x-mbx-used-weight-1m", "2400")
                .with_header("x-mbx-used-weight-1s", "600"),
        )
        .await;

        let status = g.status();
        let (window, usage) = status.busiest_window.unwrap();
        assert_eq!(window, "1s");
        assert_eq!(usage.percentage, 50.0);
        assert_eq!(status.block_remaining_secs, Some(0));
    }
}
