//! Dashboard reporting: period classification, organization/user headline
//! statistics, revenue totals, and login/activity helpers.

pub mod activity;
pub mod dashboard;
pub mod period;

pub use activity::{filter_login_logs, format_duration};
pub use dashboard::{compute_dashboard_stats, compute_revenue_stats, StatsAggregator};
pub use period::{is_in_period, Clock, FixedClock, PeriodClassifier, SystemClock};
