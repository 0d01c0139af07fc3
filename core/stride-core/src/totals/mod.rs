//! Today's totals and the per-date activity history.

mod daily_log;
mod repository;

pub use daily_log::{DailyLog, DAILY_LOG_VERSION};
pub use repository::{BaselineRecovery, TotalsRepository};
