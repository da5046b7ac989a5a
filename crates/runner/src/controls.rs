//! Trading Controls
//!
//! Turns advisory directives into the switches the trading loop reads
//! before opening a trade:
//! - Halt per cause: an emergency stop lasts until an operator resumes
//!   trading, an exchange-ban halt until the rate limits are reset
//! - Timed pause
//! - Position-size multiplier and leverage cap
//! - Raised entry confidence
//! - Fallback exchange path
//!
//! Applying the same directive twice leaves the controls unchanged.

use bastion_bus::Directive;
use bastion_core::Timestamp;
use bastion_ports::Clock;
use chrono::{DateTime, Duration, Utc};
use log::{error, info, warn};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Why trading is halted
///
/// Each cause is lifted independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HaltCause {
    /// Raised by a CRITICAL alert; lifted by `resume`
    EmergencyStop,
    /// Raised by an exchange IP ban; lifted by `lift(HaltCause::ExchangeBan)`
    ExchangeBan,
}

/// Point-in-time view of the controls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlsSnapshot {
    pub halted: bool,
    pub halt_reason: Option<String>,
    pub halt_causes: Vec<HaltCause>,
    pub paused_until: Option<Timestamp>,
    pub size_multiplier: Decimal,
    pub confidence_threshold: Decimal,
    pub leverage_cap: Option<u32>,
    pub use_fallback: bool,
}

struct ControlState {
    /// Active halts, most severe cause first
    halts: BTreeMap<HaltCause, String>,
    paused_until: Option<Timestamp>,
    size_multiplier: Decimal,
    confidence_threshold: Decimal,
    /// Alerts whose confidence increase was already applied
    raised_by: HashSet<String>,
    leverage_cap: Option<u32>,
    use_fallback: bool,
}

pub struct TradingControls {
    clock: Arc<dyn Clock>,
    base_confidence: Decimal,
    tightened_leverage_cap: u32,
    state: Mutex<ControlState>,
}

impl TradingControls {
    /// `tightened_leverage_cap` is the ceiling applied on a tighten-risk directive
    pub fn new(clock: Arc<dyn Clock>, base_confidence: Decimal, tightened_leverage_cap: u32) -> Self {
        Self {
            clock,
            base_confidence,
            tightened_leverage_cap,
            state: Mutex::new(ControlState {
                halts: BTreeMap::new(),
                paused_until: None,
                size_multiplier: Decimal::ONE,
                confidence_threshold: base_confidence,
                raised_by: HashSet::new(),
                leverage_cap: None,
                use_fallback: false,
            }),
        }
    }

    /// Apply one directive; returns true if any control changed
    pub fn apply(&self, directive: &Directive) -> bool {
        let mut state = self.state.lock();
        match directive {
            Directive::EmergencyStop { reason, .. } => {
                if state.halts.contains_key(&HaltCause::EmergencyStop) {
                    return false;
                }
                error!("[GOVERNOR] Emergency stop: {}", reason);
                state.halts.insert(HaltCause::EmergencyStop, reason.clone());
                true
            }
            Directive::PauseTrading { duration_ms, .. } => {
                // Saturates at the end of time rather than wrapping
                let until = i64::try_from(*duration_ms)
                    .ok()
                    .and_then(Duration::try_milliseconds)
                    .and_then(|d| self.clock.now().checked_add_signed(d))
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                if state.paused_until.is_some_and(|current| current >= until) {
                    return false;
                }
                warn!("[GOVERNOR] Trading paused until {}", until);
                state.paused_until = Some(until);
                true
            }
            Directive::ReducePositionSize { factor, .. } => {
                if *factor >= state.size_multiplier {
                    return false;
                }
                warn!(
                    "[GOVERNOR] Position size multiplier {} -> {}",
                    state.size_multiplier, factor
                );
                state.size_multiplier = *factor;
                true
            }
            Directive::IncreaseConfidenceThreshold {
                alert_id,
                increment,
            } => {
                if !state.raised_by.insert(alert_id.clone()) {
                    return false;
                }
                let raised = (state.confidence_threshold + increment).min(dec!(100));
                warn!(
                    "[GOVERNOR] Confidence threshold {} -> {}",
                    state.confidence_threshold, raised
                );
                state.confidence_threshold = raised;
                true
            }
            Directive::TightenRiskManagement { .. } => {
                if state.leverage_cap == Some(self.tightened_leverage_cap) {
                    return false;
                }
                warn!(
                    "[GOVERNOR] Leverage capped at {}x",
                    self.tightened_leverage_cap
                );
                state.leverage_cap = Some(self.tightened_leverage_cap);
                true
            }
            Directive::SwitchToFallback { .. } => {
                if state.use_fallback {
                    return false;
                }
                warn!("[GOVERNOR] Switching to fallback exchange path");
                state.use_fallback = true;
                true
            }
            Directive::OptimizeStrategy { alert_id, .. } => {
                info!("[GOVERNOR] Strategy re-tune requested by {}", alert_id);
                false
            }
            Directive::Alert { .. }
            | Directive::AlertAcknowledged { .. }
            | Directive::AlertResolved { .. } => false,
        }
    }

    /// Halt trading outside the directive path (e.g. on an exchange ban)
    ///
    /// A cause already halting keeps its first reason.
    pub fn halt(&self, cause: HaltCause, reason: impl Into<String>) {
        let mut state = self.state.lock();
        if !state.halts.contains_key(&cause) {
            let reason = reason.into();
            error!("[GOVERNOR] Trading halted ({:?}): {}", cause, reason);
            state.halts.insert(cause, reason);
        }
    }

    /// Lift one halt cause; returns true if it was active
    pub fn lift(&self, cause: HaltCause) -> bool {
        let mut state = self.state.lock();
        let lifted = state.halts.remove(&cause).is_some();
        if lifted {
            info!(
                "[GOVERNOR] {:?} halt lifted ({} remaining)",
                cause,
                state.halts.len()
            );
        }
        lifted
    }

    /// Lift an emergency stop and a pause (operator action)
    ///
    /// An exchange-ban halt stays until the rate limits are reset.
    pub fn resume(&self) {
        let mut state = self.state.lock();
        let stopped = state.halts.remove(&HaltCause::EmergencyStop).is_some();
        if stopped || state.paused_until.is_some() {
            info!("[GOVERNOR] Trading resumed");
        }
        state.paused_until = None;
    }

    /// Restore every control to its starting value
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.halts.clear();
        state.paused_until = None;
        state.size_multiplier = Decimal::ONE;
        state.confidence_threshold = self.base_confidence;
        state.raised_by.clear();
        state.leverage_cap = None;
        state.use_fallback = false;
        info!("[GOVERNOR] Controls reset");
    }

    /// Reason of the most severe active halt
    pub fn halt_reason(&self) -> Option<String> {
        self.state.lock().halts.values().next().cloned()
    }

    pub fn is_halted(&self) -> bool {
        !self.state.lock().halts.is_empty()
    }

    pub fn is_halted_by(&self, cause: HaltCause) -> bool {
        self.state.lock().halts.contains_key(&cause)
    }

    /// End of the current pause, if still in effect
    pub fn paused_until(&self) -> Option<Timestamp> {
        let now = self.clock.now();
        self.state.lock().paused_until.filter(|until| *until > now)
    }

    pub fn size_multiplier(&self) -> Decimal {
        self.state.lock().size_multiplier
    }

    pub fn confidence_threshold(&self) -> Decimal {
        self.state.lock().confidence_threshold
    }

    pub fn leverage_cap(&self) -> Option<u32> {
        self.state.lock().leverage_cap
    }

    pub fn use_fallback(&self) -> bool {
        self.state.lock().use_fallback
    }

    pub fn snapshot(&self) -> ControlsSnapshot {
        let now = self.clock.now();
        let state = self.state.lock();
        ControlsSnapshot {
            halted: !state.halts.is_empty(),
            halt_reason: state.halts.values().next().cloned(),
            halt_causes: state.halts.keys().copied().collect(),
            paused_until: state.paused_until.filter(|until| *until > now),
            size_multiplier: state.size_multiplier,
            confidence_threshold: state.confidence_threshold,
            leverage_cap: state.leverage_cap,
            use_fallback: state.use_fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_clock::ManualClock;
    use bastion_core::PerformanceMetrics;

    fn controls() -> (TradingControls, Arc<ManualClock>) {
        let clock = ManualClock::new(None);
        (TradingControls::new(clock.clone(), dec!(60), 5), clock)
    }

    #[test]
    fn test_emergency_stop_until_resume() {
        let (c, _) = controls();
        let stop = Directive::EmergencyStop {
            alert_id: "a1".to_string(),
            reason: "Drawdown 30%".to_string(),
        };

        assert!(c.apply(&stop));
        assert!(!c.apply(&stop));
        assert_eq!(c.halt_reason().as_deref(), Some("Drawdown 30%"));

        c.resume();
        assert!(!c.is_halted());
    }

    #[test]
    fn test_pause_never_shortened() {
        let (c, clock) = controls();
        let long = Directive::PauseTrading {
            alert_id: "a1".to_string(),
            duration_ms: 3_600_000,
        };
        let short = Directive::PauseTrading {
            alert_id: "a2".to_string(),
            duration_ms: 60_000,
        };

        assert!(c.apply(&long));
        let until = c.paused_until().unwrap();
        assert!(!c.apply(&short));
        assert_eq!(c.paused_until(), Some(until));

        clock.advance(Duration::hours(1));
        assert_eq!(c.paused_until(), None);
    }

    #[test]
    fn test_oversized_pause_saturates() {
        let (c, clock) = controls();
        assert!(c.apply(&Directive::PauseTrading {
            alert_id: "a1".to_string(),
            duration_ms: u64::MAX,
        }));
        assert_eq!(c.paused_until(), Some(DateTime::<Utc>::MAX_UTC));

        // Nothing longer can replace it
        assert!(!c.apply(&Directive::PauseTrading {
            alert_id: "a2".to_string(),
            duration_ms: i64::MAX as u64,
        }));
        clock.advance(Duration::days(365));
        assert!(c.paused_until().is_some());
    }

    #[test]
    fn test_size_multiplier_minimum_wins() {
        let (c, _) = controls();
        let half = Directive::ReducePositionSize {
            alert_id: "a1".to_string(),
            factor: dec!(0.5),
        };

        assert!(c.apply(&half));
        assert!(!c.apply(&half));
        assert!(!c.apply(&Directive::ReducePositionSize {
            alert_id: "a2".to_string(),
            factor: dec!(0.8),
        }));
        assert_eq!(c.size_multiplier(), dec!(0.5));
    }

    #[test]
    fn test_confidence_raised_once_per_alert() {
        let (c, _) = controls();
        let raise = |id: &str| Directive::IncreaseConfidenceThreshold {
            alert_id: id.to_string(),
            increment: dec!(10),
        };

        assert!(c.apply(&raise("a1")));
        assert!(!c.apply(&raise("a1")));
        assert_eq!(c.confidence_threshold(), dec!(70));

        c.apply(&raise("a2"));
        c.apply(&raise("a3"));
        c.apply(&raise("a4"));
        c.apply(&raise("a5"));
        assert_eq!(c.confidence_threshold(), dec!(100));
    }

    #[test]
    fn test_tighten_and_fallback() {
        let (c, _) = controls();
        let data = PerformanceMetrics::default();

        assert!(c.apply(&Directive::TightenRiskManagement {
            alert_id: "a1".to_string(),
            data: data.clone(),
        }));
        assert_eq!(c.leverage_cap(), Some(5));

        assert!(c.apply(&Directive::SwitchToFallback {
            alert_id: "a2".to_string(),
            data: data.clone(),
        }));
        assert!(c.use_fallback());

        assert!(!c.apply(&Directive::OptimizeStrategy {
            alert_id: "a3".to_string(),
            data,
        }));
    }

    #[test]
    fn test_halt_causes_lift_independently() {
        let (c, _) = controls();
        c.apply(&Directive::EmergencyStop {
            alert_id: "a1".to_string(),
            reason: "Drawdown 30%".to_string(),
        });
        c.halt(HaltCause::ExchangeBan, "Exchange ban");
        assert_eq!(
            c.snapshot().halt_causes,
            vec![HaltCause::EmergencyStop, HaltCause::ExchangeBan]
        );

        // Clearing the ban leaves the emergency stop in force
        assert!(c.lift(HaltCause::ExchangeBan));
        assert!(!c.lift(HaltCause::ExchangeBan));
        assert!(c.is_halted());
        assert_eq!(c.halt_reason().as_deref(), Some("Drawdown 30%"));

        c.resume();
        assert!(!c.is_halted());
    }

    #[test]
    fn test_resume_keeps_ban_halt() {
        let (c, _) = controls();
        c.halt(HaltCause::ExchangeBan, "Exchange ban");
        c.resume();
        assert!(c.is_halted_by(HaltCause::ExchangeBan));

        c.lift(HaltCause::ExchangeBan);
        assert!(!c.is_halted());
    }

    #[test]
    fn test_reset() {
        let (c, _) = controls();
        c.halt(HaltCause::ExchangeBan, "ban");
        c.apply(&Directive::ReducePositionSize {
            alert_id: "a1".to_string(),
            factor: dec!(0.5),
        });
        c.reset();

        let snapshot = c.snapshot();
        assert!(!snapshot.halted);
        assert_eq!(snapshot.size_multiplier, Decimal::ONE);
        assert_eq!(snapshot.confidence_threshold, dec!(60));
    }
}
