//! Execution Governor
//!
//! One service object per process. Owns the sizing engine, the rate-limit
//! governor, the alert engine and the trading controls.
//!
//! Corrective directives from `push_metrics` and bans seen by
//! `record_response` reach the controls before those calls return; the
//! broadcast channels are for observers. Background tasks:
//! - Ban listener: halts trading on bans recorded straight on the rate-limit governor
//! - Maintenance: purges old resolved alerts on an interval

use crate::config::GovernorConfig;
use crate::controls::{ControlsSnapshot, HaltCause, TradingControls};
use crate::error::{GovernorError, Result};
use bastion_alerts::{AlertEngine, EngineStatus};
use bastion_bus::{ChannelPublisher, Subscriber, TransportError};
use bastion_clock::SystemClock;
use bastion_core::{Alert, PerformanceMetrics, RiskTier, TradeContext};
use bastion_leverage::{LeverageDecision, LeverageEngine};
use bastion_ports::Clock;
use bastion_rate_limit::{
    BlockRemaining, BlockState, ExchangeRequest, ExchangeResponse, RateLimitGovernor,
    RateLimitStatus,
};
use log::{debug, info, warn};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Combined status of every component
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernorStatus {
    pub running: bool,
    pub controls: ControlsSnapshot,
    pub rate_limit: RateLimitStatus,
    pub alerts: EngineStatus,
}

pub struct ExecutionGovernor {
    config: GovernorConfig,
    leverage: LeverageEngine,
    rate_limit: Arc<RateLimitGovernor>,
    alerts: Arc<AlertEngine>,
    controls: Arc<TradingControls>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ExecutionGovernor {
    /// Governor on wall-clock time
    pub fn new(config: GovernorConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(config: GovernorConfig, clock: Arc<dyn Clock>) -> Self {
        let leverage = LeverageEngine::new(config.leverage.clone());
        let rate_limit = Arc::new(RateLimitGovernor::with_ban_publisher(
            config.rate_limit.clone(),
            clock.clone(),
            ChannelPublisher::new(config.channel_capacity),
        ));
        let alerts = Arc::new(AlertEngine::with_publisher(
            config.alerts.clone(),
            clock.clone(),
            ChannelPublisher::new(config.channel_capacity),
        ));
        let controls = Arc::new(TradingControls::new(
            clock,
            config.min_confidence,
            config.leverage.day.base_leverage,
        ));

        Self {
            config,
            leverage,
            rate_limit,
            alerts,
            controls,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Start the alert engine and the background tasks
    ///
    /// Must run inside a tokio runtime. Calling it while running is a no-op.
    pub fn start(&self) {
        let mut tasks = self.tasks.lock();
        if !tasks.is_empty() {
            debug!("[GOVERNOR] Already running");
            return;
        }

        self.alerts.start();

        // Subscribe before spawning so nothing published from here on is missed
        let mut bans = self.rate_limit.subscribe_bans();
        let controls = self.controls.clone();
        let rate_limit = self.rate_limit.clone();
        tasks.push(tokio::spawn(async move {
            loop {
                match bans.next().await {
                    // A notice drained after an operator reset is stale
                    Ok(notice) if rate_limit.is_banned() => {
                        controls.halt(
                            HaltCause::ExchangeBan,
                            format!("Exchange ban at {}", notice.timestamp),
                        );
                    }
                    Ok(notice) => {
                        debug!("[GOVERNOR] Ignoring stale ban notice from {}", notice.timestamp);
                    }
                    Err(TransportError::ChannelClosed) => break,
                    Err(e) => warn!("[GOVERNOR] Ban channel error: {}", e),
                }
            }
        }));

        let alerts = self.alerts.clone();
        let period = self.config.maintenance_interval();
        tasks.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                alerts.cleanup_old_alerts();
            }
        }));

        info!("[GOVERNOR] Started ({} background tasks)", tasks.len());
    }

    /// Stop the alert engine and abort the background tasks
    pub fn shutdown(&self) {
        let mut tasks = self.tasks.lock();
        self.alerts.stop();
        for task in tasks.drain(..) {
            task.abort();
        }
        info!("[GOVERNOR] Shut down");
    }

    pub fn is_running(&self) -> bool {
        !self.tasks.lock().is_empty()
    }

    /// Decide whether to open a trade and at what leverage
    ///
    /// Checks, in order: halt, pause, exchange block, confidence floor,
    /// then sizes the trade and verifies the margin buffer. The size
    /// multiplier scales position and margin; the leverage cap clamps the
    /// engine's proposal.
    pub fn evaluate(
        &self,
        context: &TradeContext,
        open_positions: usize,
    ) -> Result<LeverageDecision> {
        if let Some(reason) = self.controls.halt_reason() {
            return Err(GovernorError::TradingHalted { reason });
        }
        if let Some(until) = self.controls.paused_until() {
            return Err(GovernorError::TradingPaused { until });
        }
        match self.rate_limit.block_time_remaining() {
            BlockRemaining::Clear => {}
            BlockRemaining::For(remaining) => return Err(GovernorError::Throttled { remaining }),
            BlockRemaining::Indefinite => return Err(GovernorError::Banned),
        }

        let threshold = self.controls.confidence_threshold();
        if context.confidence < threshold {
            return Err(GovernorError::BelowConfidenceThreshold {
                confidence: context.confidence,
                threshold,
            });
        }

        let mut decision = self.leverage.calculate_optimal_leverage(context);
        let multiplier = self.controls.size_multiplier();
        let cap = self.controls.leverage_cap();

        if let Some(cap) = cap
            && decision.leverage > cap
        {
            decision.rationale = format!("{}, capped at {}x", decision.rationale, cap);
            decision.leverage = cap.max(1);
        }
        if multiplier != Decimal::ONE {
            decision.rationale = format!("{}, size x{}", decision.rationale, multiplier);
        }
        if cap.is_some() || multiplier != Decimal::ONE {
            let lev = Decimal::from(decision.leverage);
            let committed = context.available_balance.saturating_mul(multiplier);
            decision.margin_required = committed / lev;
            decision.max_position_size = committed.saturating_mul(lev);
            decision.risk_tier = RiskTier::from_leverage(decision.leverage);
        }

        if !self.leverage.can_open_trade(
            context.available_balance,
            decision.margin_required,
            open_positions,
        ) {
            return Err(GovernorError::InsufficientMargin {
                required: decision.margin_required,
                available: context.available_balance,
            });
        }

        info!(
            "[GOVERNOR] {} admitted at {}x ({})",
            context.symbol, decision.leverage, decision.timeframe
        );
        Ok(decision)
    }

    /// May this request go to the exchange now?
    pub fn admit(&self, request: &ExchangeRequest) -> Result<()> {
        if !self.rate_limit.should_block(request) {
            return Ok(());
        }
        match self.rate_limit.block_time_remaining() {
            BlockRemaining::Indefinite => Err(GovernorError::Banned),
            BlockRemaining::For(remaining) => Err(GovernorError::Throttled { remaining }),
            // Unblocked between the two reads
            BlockRemaining::Clear => Ok(()),
        }
    }

    /// Feed an exchange response back into the rate-limit governor
    ///
    /// A ban halts trading before this returns.
    pub async fn record_response(&self, response: &ExchangeResponse) -> BlockState {
        let state = self.rate_limit.check_rate_limit(response).await;
        if let BlockState::Banned { since } = state {
            self.controls
                .halt(HaltCause::ExchangeBan, format!("Exchange ban at {}", since));
        }
        state
    }

    /// Push live performance into the alert engine
    ///
    /// The firing rules' directives are applied to the controls before this
    /// returns.
    pub async fn push_metrics(&self, metrics: &PerformanceMetrics) -> Vec<Alert> {
        let evaluation = self.alerts.evaluate_metrics(metrics).await;
        for directive in &evaluation.directives {
            if self.controls.apply(directive) {
                debug!("[GOVERNOR] Applied {}", directive.name());
            }
        }
        evaluation.alerts
    }

    /// Operator action: lift an emergency stop or pause
    ///
    /// Does not clear an exchange ban; see `reset_rate_limits`.
    pub fn resume_trading(&self) {
        self.controls.resume();
    }

    /// Operator action: clear the exchange ban/throttle and its halt
    ///
    /// Alert-driven stops and pauses stay in force.
    pub fn reset_rate_limits(&self) {
        self.rate_limit.reset();
        self.controls.lift(HaltCause::ExchangeBan);
    }

    pub fn status(&self) -> GovernorStatus {
        GovernorStatus {
            running: self.is_running(),
            controls: self.controls.snapshot(),
            rate_limit: self.rate_limit.status(),
            alerts: self.alerts.status(),
        }
    }

    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    pub fn leverage(&self) -> &LeverageEngine {
        &self.leverage
    }

    pub fn rate_limit(&self) -> &Arc<RateLimitGovernor> {
        &self.rate_limit
    }

    pub fn alerts(&self) -> &Arc<AlertEngine> {
        &self.alerts
    }

    pub fn controls(&self) -> &Arc<TradingControls> {
        &self.controls
    }
}

impl Drop for ExecutionGovernor {
    fn drop(&mut self) {
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }
    }
}
