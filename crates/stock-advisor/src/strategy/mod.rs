//! Investment Strategies
//!
//! Contribution schedules and the DCA replay built on top of them.

mod dca;
pub mod schedule;

pub use dca::simulate_dca;
pub use schedule::{next_trading_day, schedule_dates};
