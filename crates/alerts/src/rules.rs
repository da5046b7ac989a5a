//! Alert rules
//!
//! A rule pairs a predicate over live metrics with a severity, a message
//! template, a cooldown and a set of corrective directives. The default
//! table covers drawdown, losing streaks, win rate, daily loss, Sharpe,
//! position size and exchange API health.

use crate::error::Result;
use bastion_bus::Directive;
use bastion_core::{
    Alert, AlertSeverity, AlertType, PerformanceMetrics, PerformanceThresholds, Timestamp,
};
use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fmt;
use std::sync::Arc;

pub type Condition =
    Arc<dyn Fn(&PerformanceMetrics, &PerformanceThresholds) -> Result<bool> + Send + Sync>;
pub type SeverityFn = Arc<dyn Fn(&PerformanceMetrics) -> AlertSeverity + Send + Sync>;
pub type MessageFn = Arc<dyn Fn(&PerformanceMetrics, &PerformanceThresholds) -> String + Send + Sync>;
pub type ActionFn = Arc<dyn Fn(&Alert) -> Vec<Directive> + Send + Sync>;

// Rule ids
pub const DRAWDOWN_ALERT: &str = "drawdown_alert";
pub const LOSING_STREAK_ALERT: &str = "losing_streak_alert";
pub const LOW_PERFORMANCE_ALERT: &str = "low_performance_alert";
pub const DAILY_LOSS_ALERT: &str = "daily_loss_alert";
pub const LOW_SHARPE_ALERT: &str = "low_sharpe_alert";
pub const POSITION_SIZE_ALERT: &str = "position_size_alert";
pub const API_FAILURE_ALERT: &str = "api_failure_alert";

/// New-position scale applied on a HIGH drawdown
pub const DRAWDOWN_SIZE_FACTOR: Decimal = dec!(0.5);
/// Pause length on a CRITICAL losing streak
pub const LOSING_STREAK_PAUSE_MS: u64 = 3_600_000;
/// Confidence points added on a HIGH losing streak
pub const LOSING_STREAK_CONFIDENCE_STEP: Decimal = dec!(10);

/// How a rule picks the severity of the alert it raises
#[derive(Clone)]
pub enum SeverityResolver {
    Constant(AlertSeverity),
    /// Derived from the metrics that triggered the rule
    Computed(SeverityFn),
}

impl SeverityResolver {
    pub fn computed(
        f: impl Fn(&PerformanceMetrics) -> AlertSeverity + Send + Sync + 'static,
    ) -> Self {
        SeverityResolver::Computed(Arc::new(f))
    }

    pub fn resolve(&self, metrics: &PerformanceMetrics) -> AlertSeverity {
        match self {
            SeverityResolver::Constant(severity) => *severity,
            SeverityResolver::Computed(f) => f(metrics),
        }
    }
}

impl fmt::Debug for SeverityResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeverityResolver::Constant(s) => write!(f, "Constant({})", s),
            SeverityResolver::Computed(_) => f.write_str("Computed"),
        }
    }
}

/// A monitored condition with its response
#[derive(Clone)]
pub struct AlertRule {
    pub id: String,
    pub name: String,
    pub alert_type: AlertType,
    pub severity: SeverityResolver,
    /// Minimum gap between two firings
    pub cooldown: Duration,
    condition: Condition,
    message: MessageFn,
    actions: ActionFn,
    last_triggered: Option<Timestamp>,
}

impl AlertRule {
    /// Rule with a constant MEDIUM severity, a 5 minute cooldown, a generic
    /// message and no corrective actions
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        alert_type: AlertType,
        condition: impl Fn(&PerformanceMetrics, &PerformanceThresholds) -> Result<bool>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        let name = name.into();
        let default_message = name.clone();
        Self {
            id: id.into(),
            name,
            alert_type,
            severity: SeverityResolver::Constant(AlertSeverity::Medium),
            cooldown: Duration::minutes(5),
            condition: Arc::new(condition),
            message: Arc::new(move |_: &PerformanceMetrics, _: &PerformanceThresholds| {
                default_message.clone()
            }),
            actions: Arc::new(|_: &Alert| Vec::<Directive>::new()),
            last_triggered: None,
        }
    }

    pub fn with_severity(mut self, severity: SeverityResolver) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_message(
        mut self,
        message: impl Fn(&PerformanceMetrics, &PerformanceThresholds) -> String + Send + Sync + 'static,
    ) -> Self {
        self.message = Arc::new(message);
        self
    }

    pub fn with_actions(
        mut self,
        actions: impl Fn(&Alert) -> Vec<Directive> + Send + Sync + 'static,
    ) -> Self {
        self.actions = Arc::new(actions);
        self
    }

    pub fn last_triggered(&self) -> Option<Timestamp> {
        self.last_triggered
    }

    /// Is the rule still inside the cooldown of its last firing?
    pub fn in_cooldown(&self, now: Timestamp) -> bool {
        // A cooldown reaching past the calendar never ends
        self.last_triggered.is_some_and(|last| {
            last.checked_add_signed(self.cooldown)
                .is_none_or(|end| now < end)
        })
    }

    pub fn evaluate(
        &self,
        metrics: &PerformanceMetrics,
        thresholds: &PerformanceThresholds,
    ) -> Result<bool> {
        (self.condition)(metrics, thresholds)
    }

    /// Raise an alert for these metrics and start the cooldown
    ///
    /// The cooldown starts only once the alert is built.
    pub(crate) fn fire(
        &mut self,
        metrics: &PerformanceMetrics,
        thresholds: &PerformanceThresholds,
        now: Timestamp,
    ) -> Alert {
        let alert = Alert::new(
            self.id.clone(),
            self.alert_type,
            self.severity.resolve(metrics),
            (self.message)(metrics, thresholds),
            metrics.clone(),
            now,
        );
        self.last_triggered = Some(now);
        alert
    }

    /// Corrective directives for an alert this rule raised
    pub fn actions(&self, alert: &Alert) -> Vec<Directive> {
        (self.actions)(alert)
    }
}

impl fmt::Debug for AlertRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertRule")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("alert_type", &self.alert_type)
            .field("severity", &self.severity)
            .field("cooldown", &self.cooldown)
            .field("last_triggered", &self.last_triggered)
            .finish()
    }
}

/// The built-in rule table, in evaluation order
pub fn default_rules(max_api_failures: u32) -> Vec<AlertRule> {
    vec![
        drawdown_rule(),
        losing_streak_rule(),
        low_performance_rule(),
        daily_loss_rule(),
        low_sharpe_rule(),
        position_size_rule(),
        api_failure_rule(max_api_failures),
    ]
}

fn drawdown_rule() -> AlertRule {
    AlertRule::new(
        DRAWDOWN_ALERT,
        "Drawdown limit",
        AlertType::Drawdown,
        |m, t| Ok(m.drawdown_pct.is_some_and(|d| d > t.max_drawdown)),
    )
    .with_severity(SeverityResolver::computed(|m| {
        match m.drawdown_pct.unwrap_or_default() {
            d if d > dec!(25) => AlertSeverity::Critical,
            d if d > dec!(20) => AlertSeverity::High,
            _ => AlertSeverity::Medium,
        }
    }))
    .with_cooldown(Duration::minutes(30))
    .with_message(|m, t| {
        format!(
            "Drawdown {}% exceeds limit of {}%",
            m.drawdown_pct.unwrap_or_default(),
            t.max_drawdown
        )
    })
    .with_actions(|alert| match alert.severity {
        AlertSeverity::Critical => vec![Directive::EmergencyStop {
            alert_id: alert.id.clone(),
            reason: alert.message.clone(),
        }],
        AlertSeverity::High => vec![Directive::ReducePositionSize {
            alert_id: alert.id.clone(),
            factor: DRAWDOWN_SIZE_FACTOR,
        }],
        _ => Vec::new(),
    })
}

fn losing_streak_rule() -> AlertRule {
    AlertRule::new(
        LOSING_STREAK_ALERT,
        "Losing streak",
        AlertType::LosingStreak,
        |m, t| {
            Ok(m
                .consecutive_losses
                .is_some_and(|n| n >= t.max_consecutive_losses))
        },
    )
    .with_severity(SeverityResolver::computed(|m| {
        if m.consecutive_losses.unwrap_or_default() >= 7 {
            AlertSeverity::Critical
        } else {
            AlertSeverity::High
        }
    }))
    .with_cooldown(Duration::minutes(15))
    .with_message(|m, _| {
        format!(
            "{} consecutive losing trades",
            m.consecutive_losses.unwrap_or_default()
        )
    })
    .with_actions(|alert| {
        if alert.severity == AlertSeverity::Critical {
            vec![Directive::PauseTrading {
                alert_id: alert.id.clone(),
                duration_ms: LOSING_STREAK_PAUSE_MS,
            }]
        } else {
            vec![Directive::IncreaseConfidenceThreshold {
                alert_id: alert.id.clone(),
                increment: LOSING_STREAK_CONFIDENCE_STEP,
            }]
        }
    })
}

fn low_performance_rule() -> AlertRule {
    AlertRule::new(
        LOW_PERFORMANCE_ALERT,
        "Low win rate",
        AlertType::Performance,
        |m, t| Ok(m.win_rate_pct.is_some_and(|w| w < t.min_win_rate)),
    )
    .with_severity(SeverityResolver::computed(|m| {
        if m.win_rate_pct.unwrap_or_default() < dec!(25) {
            AlertSeverity::High
        } else {
            AlertSeverity::Medium
        }
    }))
    .with_cooldown(Duration::minutes(60))
    .with_message(|m, t| {
        format!(
            "Win rate {}% below minimum of {}%",
            m.win_rate_pct.unwrap_or_default(),
            t.min_win_rate
        )
    })
    .with_actions(|alert| {
        vec![Directive::OptimizeStrategy {
            alert_id: alert.id.clone(),
            data: alert.data.clone(),
        }]
    })
}

fn daily_loss_rule() -> AlertRule {
    AlertRule::new(
        DAILY_LOSS_ALERT,
        "Daily loss limit",
        AlertType::Risk,
        |m, t| Ok(m.daily_loss.is_some_and(|l| l > t.max_daily_loss)),
    )
    .with_severity(SeverityResolver::computed(|m| {
        if m.daily_loss.unwrap_or_default() > dec!(10) {
            AlertSeverity::Critical
        } else {
            AlertSeverity::High
        }
    }))
    .with_cooldown(Duration::minutes(5))
    .with_message(|m, t| {
        format!(
            "Daily loss ${} exceeds limit of ${}",
            m.daily_loss.unwrap_or_default(),
            t.max_daily_loss
        )
    })
    .with_actions(|alert| {
        vec![Directive::TightenRiskManagement {
            alert_id: alert.id.clone(),
            data: alert.data.clone(),
        }]
    })
}

fn low_sharpe_rule() -> AlertRule {
    AlertRule::new(
        LOW_SHARPE_ALERT,
        "Low Sharpe ratio",
        AlertType::Performance,
        |m, t| Ok(m.sharpe_ratio.is_some_and(|s| s < t.min_sharpe_ratio)),
    )
    .with_severity(SeverityResolver::computed(|m| {
        if m.sharpe_ratio.unwrap_or_default() < dec!(0.5) {
            AlertSeverity::High
        } else {
            AlertSeverity::Medium
        }
    }))
    .with_cooldown(Duration::minutes(120))
    .with_message(|m, t| {
        format!(
            "Sharpe ratio {} below minimum of {}",
            m.sharpe_ratio.unwrap_or_default(),
            t.min_sharpe_ratio
        )
    })
    .with_actions(|alert| {
        vec![Directive::OptimizeStrategy {
            alert_id: alert.id.clone(),
            data: alert.data.clone(),
        }]
    })
}

fn position_size_rule() -> AlertRule {
    AlertRule::new(
        POSITION_SIZE_ALERT,
        "Excessive position size",
        AlertType::Risk,
        |m, t| Ok(m.position_size_pct.is_some_and(|p| p > t.max_position_size)),
    )
    .with_severity(SeverityResolver::computed(|m| {
        if m.position_size_pct.unwrap_or_default() > dec!(30) {
            AlertSeverity::Critical
        } else {
            AlertSeverity::High
        }
    }))
    .with_cooldown(Duration::minutes(10))
    .with_message(|m, t| {
        format!(
            "Position size {}% of balance exceeds limit of {}%",
            m.position_size_pct.unwrap_or_default(),
            t.max_position_size
        )
    })
    .with_actions(|alert| {
        vec![Directive::TightenRiskManagement {
            alert_id: alert.id.clone(),
            data: alert.data.clone(),
        }]
    })
}

fn api_failure_rule(max_failures: u32) -> AlertRule {
    AlertRule::new(
        API_FAILURE_ALERT,
        "Exchange API failures",
        AlertType::System,
        move |m, _| Ok(m.api_failures.is_some_and(|n| n > max_failures)),
    )
    .with_severity(SeverityResolver::Constant(AlertSeverity::Medium))
    .with_cooldown(Duration::minutes(5))
    .with_message(move |m, _| {
        format!(
            "{} exchange API failures (limit {})",
            m.api_failures.unwrap_or_default(),
            max_failures
        )
    })
    .with_actions(|alert| {
        vec![Directive::SwitchToFallback {
            alert_id: alert.id.clone(),
            data: alert.data.clone(),
        }]
    })
}
