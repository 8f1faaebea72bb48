//! Read-only reports over a user's transactions.
//!
//! The handlers load the transactions for the requested months and pass them
//! to the functions in [crate::aggregation].

mod handlers;

pub use handlers::{
    get_expenses_endpoint, get_grouped_endpoint, get_history_endpoint,
    get_month_transactions_endpoint, get_range_endpoint, get_totals_endpoint,
};

/// The longest history report a request can ask for, in months.
pub const MAX_HISTORY_MONTHS: u32 = 120;

/// The config for the reports.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// The number of months shown by the history report when not specified in a request.
    pub history_months: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { history_months: 6 }
    }
}
