//! Ban broadcast

use bastion_core::{QuotaUsage, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Emitted once when the exchange answers 418 (IP ban)
///
/// Every listener should treat this as a full trading halt. The snapshots
/// record quota consumption at the moment of the ban for post-mortem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BanNotice {
    pub timestamp: Timestamp,
    /// Weight usage per window ("1m", "1s", ...)
    pub quota_snapshot: HashMap<String, QuotaUsage>,
    /// Order count per window ("10s", "1d", ...)
    pub order_count_snapshot: HashMap<String, u64>,
}
