//! Scripted session replay
//!
//! A session is a JSON list of steps (trade opportunities, exchange
//! responses, outgoing requests, metrics pushes, clock moves) replayed
//! against a governor on a manual clock. Used by the `bastion` binary to
//! dry-run a configuration.

use crate::error::ConfigError;
use crate::governor::{ExecutionGovernor, GovernorStatus};
use bastion_clock::ManualClock;
use bastion_core::{Alert, PerformanceMetrics, Timestamp, TradeContext};
use bastion_leverage::LeverageDecision;
use bastion_ports::Clock;
use bastion_rate_limit::{BlockState, ExchangeRequest, ExchangeResponse};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Session {
    /// Clock start; wall time when absent
    pub start: Option<Timestamp>,
    pub steps: Vec<SessionStep>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum SessionStep {
    /// Size a trade opportunity
    #[serde(rename_all = "camelCase")]
    Evaluate {
        context: TradeContext,
        #[serde(default)]
        open_positions: usize,
    },
    /// Feed an exchange response to the rate-limit governor
    Response { response: ExchangeResponse },
    /// Ask whether a request may go out
    Request { request: ExchangeRequest },
    /// Push performance metrics to the alert engine
    Metrics { metrics: PerformanceMetrics },
    /// Move the clock forward
    Advance { seconds: i64 },
    /// Operator resumes trading
    Resume,
    /// Operator clears the exchange ban
    ResetRateLimits,
    /// Purge old resolved alerts
    Cleanup,
    Status,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum StepOutcome {
    Admitted { decision: LeverageDecision },
    Refused { reason: String },
    Block { state: BlockState },
    #[serde(rename_all = "camelCase")]
    Request {
        allowed: bool,
        reason: Option<String>,
    },
    Alerts { alerts: Vec<Alert> },
    Advanced { now: Timestamp },
    Resumed,
    RateLimitsReset,
    CleanedUp { removed: usize },
    Status { status: GovernorStatus },
}

impl Session {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}

/// Let the governor's background tasks drain their channels
///
/// On a current-thread runtime each yield runs every task that is ready.
pub async fn settle() {
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

/// Replay every step in order, one outcome per step
pub async fn replay(
    governor: &ExecutionGovernor,
    clock: &ManualClock,
    session: &Session,
) -> Vec<StepOutcome> {
    let mut outcomes = Vec::with_capacity(session.steps.len());

    for step in &session.steps {
        let outcome = match step {
            SessionStep::Evaluate {
                context,
                open_positions,
            } => match governor.evaluate(context, *open_positions) {
                Ok(decision) => StepOutcome::Admitted { decision },
                Err(e) => StepOutcome::Refused {
                    reason: e.to_string(),
                },
            },
            SessionStep::Response { response } => {
                let state = governor.record_response(response).await;
                settle().await;
                StepOutcome::Block { state }
            }
            SessionStep::Request { request } => match governor.admit(request) {
                Ok(()) => StepOutcome::Request {
                    allowed: true,
                    reason: None,
                },
                Err(e) => StepOutcome::Request {
                    allowed: false,
                    reason: Some(e.to_string()),
                },
            },
            SessionStep::Metrics { metrics } => {
                let alerts = governor.push_metrics(metrics).await;
                settle().await;
                StepOutcome::Alerts { alerts }
            }
            SessionStep::Advance { seconds } => {
                clock.advance(Duration::seconds(*seconds));
                StepOutcome::Advanced { now: clock.now() }
            }
            SessionStep::Resume => {
                governor.resume_trading();
                StepOutcome::Resumed
            }
            SessionStep::ResetRateLimits => {
                governor.reset_rate_limits();
                StepOutcome::RateLimitsReset
            }
            SessionStep::Cleanup => StepOutcome::CleanedUp {
                removed: governor.alerts().cleanup_old_alerts(),
            },
            SessionStep::Status => StepOutcome::Status {
                status: governor.status(),
            },
        };
        outcomes.push(outcome);
    }

    outcomes
}
