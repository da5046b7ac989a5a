//! Risk Alert & Mitigation Engine
//!
//! Evaluates pushed performance metrics against the rule set:
//! - Skips rules inside their cooldown
//! - Raises an alert per firing rule and stores it
//! - Publishes the alert and the rule's corrective directives
//!
//! Directives are advisory. The engine never pauses or resizes anything
//! itself; the trading loop consumes them.

use crate::config::AlertEngineConfig;
use crate::error::{Result, RuleError};
use crate::rules::{AlertRule, default_rules};
use crate::stats::{AlertStats, EngineStatus};
use bastion_bus::{ChannelPublisher, ChannelSubscriber, Directive, Publisher};
use bastion_core::{Alert, AlertSeverity, PerformanceMetrics, PerformanceThresholds};
use bastion_ports::Clock;
use chrono::Duration;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Outcome of one metrics push
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    /// Alerts raised, in rule order
    pub alerts: Vec<Alert>,
    /// Corrective directives of the firing rules, in the order raised
    pub directives: Vec<Directive>,
}

struct EngineState {
    active: bool,
    rules: Vec<AlertRule>,
    /// Insertion order
    alerts: Vec<Alert>,
    thresholds: PerformanceThresholds,
}

pub struct AlertEngine {
    config: AlertEngineConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<EngineState>,
    directives: ChannelPublisher<Directive>,
}

impl AlertEngine {
    pub fn new(config: AlertEngineConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_publisher(config, clock, ChannelPublisher::new(256))
    }

    /// Create an engine that publishes on an existing directive channel
    pub fn with_publisher(
        config: AlertEngineConfig,
        clock: Arc<dyn Clock>,
        directives: ChannelPublisher<Directive>,
    ) -> Self {
        let mut rules = default_rules(config.max_api_failures);
        for rule in &mut rules {
            match config.cooldown_override(&rule.id) {
                Some(cooldown) => rule.cooldown = cooldown,
                None if config.cooldown_overrides.contains_key(&rule.id) => warn!(
                    "[ALERTS] Ignoring out-of-range cooldown override for {}",
                    rule.id
                ),
                None => {}
            }
        }

        Self {
            state: Mutex::new(EngineState {
                active: false,
                rules,
                alerts: Vec::new(),
                thresholds: config.thresholds.clone(),
            }),
            config,
            clock,
            directives,
        }
    }

    pub fn config(&self) -> &AlertEngineConfig {
        &self.config
    }

    /// Listen for alerts and directives
    pub fn subscribe(&self) -> ChannelSubscriber<Directive> {
        self.directives.subscribe()
    }

    pub fn start(&self) {
        let mut state = self.state.lock();
        if !state.active {
            state.active = true;
            info!("[ALERTS] Engine started with {} rules", state.rules.len());
        }
    }

    pub fn stop(&self) {
        let mut state = self.state.lock();
        if state.active {
            state.active = false;
            info!("[ALERTS] Engine stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    /// Evaluate one metrics push against every rule
    ///
    /// Returns the alerts raised. A failing or panicking rule is logged and
    /// the remaining rules are still evaluated. Does nothing while stopped.
    pub async fn process_data(&self, metrics: &PerformanceMetrics) -> Vec<Alert> {
        self.evaluate_metrics(metrics).await.alerts
    }

    /// Like `process_data`, also handing back the corrective directives
    ///
    /// Callers that enforce directives should apply these rather than rely
    /// on the broadcast, which drops messages for lagging subscribers.
    pub async fn evaluate_metrics(&self, metrics: &PerformanceMetrics) -> Evaluation {
        let (evaluation, outbox) = {
            let mut state = self.state.lock();
            if !state.active {
                debug!("[ALERTS] Engine stopped, ignoring metrics push");
                return Evaluation::default();
            }

            let now = self.clock.now();
            let EngineState {
                rules,
                alerts,
                thresholds,
                ..
            } = &mut *state;

            let thresholds = &*thresholds;
            let mut evaluation = Evaluation::default();
            let mut outbox = Vec::new();

            for rule in rules.iter_mut() {
                if rule.in_cooldown(now) {
                    continue;
                }

                let fired = panic::catch_unwind(AssertUnwindSafe(|| -> Result<Option<Alert>> {
                    if !rule.evaluate(metrics, thresholds)? {
                        return Ok(None);
                    }
                    Ok(Some(rule.fire(metrics, thresholds, now)))
                }));
                let alert = match fired {
                    Ok(Ok(Some(alert))) => alert,
                    Ok(Ok(None)) => continue,
                    Ok(Err(e)) => {
                        error!("[ALERTS] {}", e);
                        continue;
                    }
                    Err(payload) => {
                        error!(
                            "[ALERTS] Rule {} panicked: {}",
                            rule.id,
                            panic_message(payload.as_ref())
                        );
                        continue;
                    }
                };

                if alert.is_critical() {
                    error!("[ALERTS] {} [{}] {}", alert.severity, rule.id, alert.message);
                } else {
                    warn!("[ALERTS] {} [{}] {}", alert.severity, rule.id, alert.message);
                }

                let actions = panic::catch_unwind(AssertUnwindSafe(|| rule.actions(&alert)))
                    .unwrap_or_else(|payload| {
                        error!(
                            "[ALERTS] Rule {} actions panicked: {}",
                            rule.id,
                            panic_message(payload.as_ref())
                        );
                        Vec::new()
                    });
                for action in &actions {
                    info!("[ALERTS] {} -> {}", rule.id, action.name());
                }

                alerts.push(alert.clone());
                outbox.push(Directive::Alert {
                    alert: alert.clone(),
                });
                outbox.extend(actions.iter().cloned());
                evaluation.directives.extend(actions);
                evaluation.alerts.push(alert);
            }

            (evaluation, outbox)
        };

        self.publish_all(outbox).await;
        evaluation
    }

    /// Mark an alert as seen; returns false if no such alert
    pub async fn acknowledge_alert(&self, alert_id: &str) -> bool {
        let changed = {
            let mut state = self.state.lock();
            let Some(alert) = state.alerts.iter_mut().find(|a| a.id == alert_id) else {
                return false;
            };
            let changed = !alert.acknowledged;
            alert.acknowledged = true;
            changed
        };

        if changed {
            info!("[ALERTS] Alert {} acknowledged", alert_id);
            self.publish_all(vec![Directive::AlertAcknowledged {
                alert_id: alert_id.to_string(),
            }])
            .await;
        }
        true
    }

    /// Close an alert; returns false if no such alert
    pub async fn resolve_alert(&self, alert_id: &str) -> bool {
        let changed = {
            let mut state = self.state.lock();
            let now = self.clock.now();
            let Some(alert) = state.alerts.iter_mut().find(|a| a.id == alert_id) else {
                return false;
            };
            let changed = !alert.resolved;
            if changed {
                alert.resolved = true;
                alert.resolved_at = Some(now);
            }
            changed
        };

        if changed {
            info!("[ALERTS] Alert {} resolved", alert_id);
            self.publish_all(vec![Directive::AlertResolved {
                alert_id: alert_id.to_string(),
            }])
            .await;
        }
        true
    }

    /// Drop resolved alerts raised before the retention window
    ///
    /// Returns how many were removed.
    pub fn cleanup_old_alerts(&self) -> usize {
        let mut state = self.state.lock();
        let Some(cutoff) = self.clock.now().checked_sub_signed(self.config.retention()) else {
            return 0;
        };
        let before = state.alerts.len();
        state
            .alerts
            .retain(|a| !(a.resolved && a.timestamp < cutoff));
        let removed = before - state.alerts.len();

        if removed > 0 {
            info!("[ALERTS] Cleaned up {} old alerts", removed);
        }
        removed
    }

    pub fn alert(&self, alert_id: &str) -> Option<Alert> {
        self.state
            .lock()
            .alerts
            .iter()
            .find(|a| a.id == alert_id)
            .cloned()
    }

    /// Unresolved alerts, oldest first
    pub fn active_alerts(&self) -> Vec<Alert> {
        self.state
            .lock()
            .alerts
            .iter()
            .filter(|a| a.is_active())
            .cloned()
            .collect()
    }

    pub fn alerts_by_severity(&self, severity: AlertSeverity) -> Vec<Alert> {
        self.state
            .lock()
            .alerts
            .iter()
            .filter(|a| a.severity == severity)
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> AlertStats {
        AlertStats::from_alerts(&self.state.lock().alerts)
    }

    pub fn status(&self) -> EngineStatus {
        let state = self.state.lock();
        let active: Vec<_> = state.alerts.iter().filter(|a| a.is_active()).collect();

        EngineStatus {
            active: state.active,
            rule_count: state.rules.len(),
            active_alerts: active.len(),
            critical_alerts: active.iter().filter(|a| a.is_critical()).count(),
            thresholds: state.thresholds.clone(),
        }
    }

    pub fn thresholds(&self) -> PerformanceThresholds {
        self.state.lock().thresholds.clone()
    }

    /// Replace the thresholds; applies from the next evaluation
    pub fn update_thresholds(&self, thresholds: PerformanceThresholds) {
        info!("[ALERTS] Thresholds updated: {:?}", thresholds);
        self.state.lock().thresholds = thresholds;
    }

    pub fn set_rule_cooldown(&self, rule_id: &str, cooldown: Duration) -> Result<()> {
        let mut state = self.state.lock();
        let rule = state
            .rules
            .iter_mut()
            .find(|r| r.id == rule_id)
            .ok_or_else(|| RuleError::UnknownRule(rule_id.to_string()))?;

        info!(
            "[ALERTS] Rule {} cooldown {}m -> {}m",
            rule_id,
            rule.cooldown.num_minutes(),
            cooldown.num_minutes()
        );
        rule.cooldown = cooldown;
        Ok(())
    }

    /// Register a rule; replaces any rule with the same id in place
    pub fn add_rule(&self, rule: AlertRule) {
        let mut state = self.state.lock();
        match state.rules.iter_mut().find(|r| r.id == rule.id) {
            Some(existing) => {
                info!("[ALERTS] Rule {} replaced", rule.id);
                *existing = rule;
            }
            None => {
                info!("[ALERTS] Rule {} added", rule.id);
                state.rules.push(rule);
            }
        }
    }

    /// Drop a rule; returns false if no such rule
    pub fn remove_rule(&self, rule_id: &str) -> bool {
        let mut state = self.state.lock();
        let before = state.rules.len();
        state.rules.retain(|r| r.id != rule_id);
        let removed = state.rules.len() != before;
        if removed {
            info!("[ALERTS] Rule {} removed", rule_id);
        }
        removed
    }

    /// Rule ids in evaluation order
    pub fn rule_ids(&self) -> Vec<String> {
        self.state.lock().rules.iter().map(|r| r.id.clone()).collect()
    }

    async fn publish_all(&self, directives: Vec<Directive>) {
        for directive in directives {
            if let Err(e) = self.directives.publish(&directive).await {
                debug!("[ALERTS] {} not delivered: {}", directive.name(), e);
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
