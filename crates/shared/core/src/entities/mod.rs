mod alert;
mod metrics;
mod quota;
mod signal;
mod timeframe;
mod trade_context;

pub use alert::{Alert, AlertSeverity, AlertType};
pub use metrics::{PerformanceMetrics, PerformanceThresholds};
pub use quota::QuotaUsage;
pub use signal::Signal;
pub use timeframe::{RiskTier, Timeframe};
pub use trade_context::TradeContext;
