//! Application State

use std::sync::Arc;
use std::time::Instant;

use command_core::CommandRegistry;
use stock_advisor::MarketDataSource;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Registry with every slash command
    pub commands: Arc<CommandRegistry>,

    /// Market data backing the commands
    pub source: Arc<dyn MarketDataSource>,

    pub started_at: Instant,
}

impl AppState {
    pub fn new(commands: CommandRegistry, source: Arc<dyn MarketDataSource>) -> Self {
        Self {
            commands: Arc::new(commands),
            source,
            started_at: Instant::now(),
        }
    }
}
