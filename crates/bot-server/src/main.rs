//! stock-bot HTTP Server
//!
//! Axum server exposing the slash commands as a JSON API, plus the
//! health endpoints the hosting platform pings to keep the bot awake.

mod config;
mod handlers;
mod state;

use std::sync::Arc;

use anyhow::Context;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use command_core::{CommandRegistry, HelloCommand};
use stock_advisor::{
    MarketDataSource, MockMarketData, StaticSymbols, SymbolSource, WikipediaSp500, YahooFinance,
    commands::{
        DcaCommand, MarketOverviewCommand, NewsCommand, PingCommand, ProbabilityCommand,
        StockCommand,
    },
    market::YahooConfig,
    translate::{GoogleTranslator, Passthrough, Translator},
};

use crate::config::{BotConfig, DataSource};
use crate::handlers::router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    let config = BotConfig::from_env().context("invalid configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=debug", config.log_level)));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let source = market_source(&config)?;
    if source.health_check().await {
        tracing::info!("✓ Connected to {}", source.name());
    } else {
        tracing::warn!("⚠ {} not reachable - commands will report errors", source.name());
    }

    let commands = build_commands(&config, Arc::clone(&source))?;
    tracing::info!(
        live = config.uses_live_universe(),
        "Market overview scans up to {} symbols",
        config.universe_size()
    );
    tracing::info!("Registered {} commands:", commands.len());
    for name in commands.names() {
        tracing::info!("  • /{}", name);
    }

    let state = AppState::new(commands, source);

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 stock-bot server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /                    - Banner");
    tracing::info!("  GET  /health              - Health check");
    tracing::info!("  GET  /api/commands        - Command schemas");
    tracing::info!("  POST /api/commands/{{name}} - Run a command");

    axum::serve(listener, app).await?;

    Ok(())
}

fn market_source(config: &BotConfig) -> anyhow::Result<Arc<dyn MarketDataSource>> {
    match config.data_source {
        DataSource::Mock => {
            tracing::warn!("⚠ Using synthetic market data (DATA_SOURCE=mock)");
            Ok(Arc::new(MockMarketData::new()))
        }
        DataSource::Yahoo => {
            let mut yahoo = YahooConfig {
                timeout: config.http_timeout,
                ..YahooConfig::default()
            };
            if let Some(url) = &config.yahoo_base_url {
                yahoo.base_url.clone_from(url);
            }
            let client = YahooFinance::new(yahoo).context("failed to build Yahoo client")?;
            Ok(Arc::new(client))
        }
    }
}

fn build_commands(
    config: &BotConfig,
    source: Arc<dyn MarketDataSource>,
) -> anyhow::Result<CommandRegistry> {
    let universe: Arc<dyn SymbolSource> = match &config.market_symbols {
        Some(symbols) => Arc::new(StaticSymbols::new(symbols.iter(), config.max_market_symbols)),
        None if config.uses_live_universe() => Arc::new(
            WikipediaSp500::new(
                config.sp500_url.as_str(),
                config.max_market_symbols,
                config.http_timeout,
            )
            .context("failed to build S&P 500 client")?,
        ),
        None => Arc::new(StaticSymbols::default_universe(config.max_market_symbols)),
    };

    let translator: Arc<dyn Translator> = match &config.translate_target {
        Some(target) => {
            tracing::info!(target = %target, "headline translation enabled");
            Arc::new(
                GoogleTranslator::new(
                    target.as_str(),
                    config.translation_max_length,
                    config.http_timeout,
                )
                .context("failed to build translator")?,
            )
        }
        None => Arc::new(Passthrough),
    };

    let mut commands = CommandRegistry::new();

    commands.register(HelloCommand);
    commands.register(PingCommand::new(Arc::clone(&source)));
    commands.register(StockCommand::new(Arc::clone(&source)));
    commands.register(
        NewsCommand::new(Arc::clone(&source))
            .with_translator(translator)
            .with_max_items(config.max_news_items),
    );
    commands.register(
        MarketOverviewCommand::new(Arc::clone(&source), universe)
            .with_concurrency(config.fetch_concurrency),
    );
    commands.register(DcaCommand::new(Arc::clone(&source)));
    commands.register(ProbabilityCommand::new(source));

    Ok(commands)
}
