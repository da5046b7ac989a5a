//! Block state machine
//!
//! `Banned` carries no end time: it lasts until an operator reset.

use bastion_core::Timestamp;
use chrono::Duration;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum BlockState {
    /// No restriction
    #[default]
    Open,
    /// Non-critical requests are deferred until `until`
    Throttled { until: Timestamp },
    /// Non-critical requests are refused until reset
    Banned { since: Timestamp },
}

impl BlockState {
    pub fn is_blocked(&self) -> bool {
        !matches!(self, BlockState::Open)
    }

    pub fn is_banned(&self) -> bool {
        matches!(self, BlockState::Banned { .. })
    }

    /// `None` while open, `Some(None)` when banned (no end), `Some(Some(t))` while throttled
    pub fn block_until(&self) -> Option<Option<Timestamp>> {
        match self {
            BlockState::Open => None,
            BlockState::Throttled { until } => Some(Some(*until)),
            BlockState::Banned { .. } => Some(None),
        }
    }

    /// Apply the scheduled unblock if the throttle window has elapsed
    ///
    /// Returns true when the state changed.
    pub(crate) fn expire(&mut self, now: Timestamp) -> bool {
        if let BlockState::Throttled { until } = *self
            && now >= until
        {
            *self = BlockState::Open;
            return true;
        }
        false
    }

    /// How long until requests flow again, as seen at `now`
    pub fn remaining(&self, now: Timestamp) -> BlockRemaining {
        match self {
            BlockState::Open => BlockRemaining::Clear,
            BlockState::Throttled { until } if *until > now => {
                BlockRemaining::For(*until - now)
            }
            BlockState::Throttled { .. } => BlockRemaining::Clear,
            BlockState::Banned { .. } => BlockRemaining::Indefinite,
        }
    }
}

/// Time left in the current block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRemaining {
    /// Not blocked
    Clear,
    /// Throttled for this much longer
    For(Duration),
    /// Banned; only a reset clears it
    Indefinite,
}

impl BlockRemaining {
    pub fn is_clear(&self) -> bool {
        matches!(self, BlockRemaining::Clear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_throttle_expires() {
        let mut state = BlockState::Throttled {
            until: t0() + Duration::seconds(60),
        };

        assert!(!state.expire(t0() + Duration::seconds(59)));
        assert!(state.is_blocked());

        assert!(state.expire(t0() + Duration::seconds(60)));
        assert_eq!(state, BlockState::Open);
    }

    #[test]
    fn test_ban_never_expires() {
        let mut state = BlockState::Banned { since: t0() };
        assert!(!state.expire(t0() + Duration::days(365)));
        assert!(state.is_banned());
        assert_eq!(state.block_until(), Some(None));
        assert_eq!(state.remaining(t0()), BlockRemaining::Indefinite);
    }

    #[test]
    fn test_remaining() {
        let state = BlockState::Throttled {
            until: t0() + Duration::seconds(30),
        };
        assert_eq!(
            state.remaining(t0() + Duration::seconds(10)),
            BlockRemaining::For(Duration::seconds(20))
        );
        assert!(state.remaining(t0() + Duration::seconds(31)).is_clear());
        assert!(BlockState::Open.remaining(t0()).is_clear());
    }
}
