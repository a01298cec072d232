//! Service Kit - Slash Commands
//!
//! Domain commands that implement `command_core::Command` for the stock bot.

mod dca_simulator;
mod market_overview;
mod news_feed;
mod ping;
mod probability;
mod stock_quote;

pub use dca_simulator::DcaCommand;
pub use market_overview::{MarketOverviewCommand, DEFAULT_FETCH_CONCURRENCY};
pub use news_feed::NewsCommand;
pub use ping::PingCommand;
pub use probability::ProbabilityCommand;
pub use stock_quote::StockCommand;

use command_core::CommandReply;

use crate::error::AnalysisError;

/// Failed reply carrying the user-facing message for a domain error.
///
/// Provider faults are logged as errors; bad input and empty results as
/// warnings.
pub(crate) fn reply_for_error(command: &str, err: &AnalysisError) -> CommandReply {
    if err.is_upstream() {
        tracing::error!(command, error = %err, "market data request failed");
    } else {
        tracing::warn!(command, error = %err, "command could not complete");
    }
    CommandReply::failure(command, err.user_message())
}
