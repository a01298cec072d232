//! Ping Command

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use command_core::{Command, CommandCall, CommandReply, CommandSchema, Result as CoreResult};

use crate::market::MarketDataSource;

const NAME: &str = "ping";

/// Round-trip latency of the market data provider
pub struct PingCommand {
    source: Arc<dyn MarketDataSource>,
}

impl PingCommand {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Command for PingCommand {
    fn schema(&self) -> CommandSchema {
        CommandSchema {
            name: NAME.into(),
            description: "Check bot responsiveness and data provider latency".into(),
            parameters: vec![],
            category: Some("basic".into()),
        }
    }

    async fn execute(&self, _call: &CommandCall) -> CoreResult<CommandReply> {
        let started = Instant::now();
        let healthy = self.source.health_check().await;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        tracing::info!(latency_ms, healthy, provider = self.source.name(), "ping");

        let status = if healthy { "reachable" } else { "unreachable" };
        let output = format!(
            "Pong! 🏓 {} {status} in {latency_ms} ms",
            self.source.name()
        );
        let data = serde_json::json!({
            "provider": self.source.name(),
            "healthy": healthy,
            "latency_ms": latency_ms,
        });

        Ok(CommandReply::success(NAME, output).with_data(data))
    }
}
