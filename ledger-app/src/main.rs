//! # Ledger Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize the repository adapter
//! - Create the ledger service
//! - Start the HTTP server

mod config;

use opentelemetry::global;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace as sdktrace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledger_hex::{LedgerService, inbound::HttpServer};
use ledger_repo::{Repo, build_repo};
use ledger_types::{Currency, Money, RepoError};

fn init_tracer() -> anyhow::Result<(sdktrace::Tracer, sdktrace::SdkTracerProvider)> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    // Use gRPC exporter with batch processing (non-blocking)
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()?;

    let provider = sdktrace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .build();

    global::set_tracer_provider(provider.clone());

    use opentelemetry::trace::TracerProvider as _;
    Ok((provider.tracer("ledger-service"), provider))
}

/// Opens the demo accounts unless they already exist.
async fn seed_demo_accounts(repo: &Repo) -> anyhow::Result<()> {
    let demo = [("A", "USD", 10000), ("B", "USD", 1000), ("C", "EUR", 5000)];

    for (identifier, currency, balance) in demo {
        match repo
            .open_account(identifier, Currency::new(currency)?, Money::new(balance)?)
            .await
        {
            Ok(account) => tracing::info!(
                identifier = %account.identifier,
                currency = %account.currency,
                balance = %account.balance,
                "demo account opened"
            ),
            Err(RepoError::Conflict(_)) => {
                tracing::debug!(identifier, "demo account already present");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Export spans only when a collector is configured
    let otel = if std::env::var_os("OTEL_EXPORTER_OTLP_ENDPOINT").is_some() {
        Some(init_tracer()?)
    } else {
        None
    };
    let telemetry = otel
        .as_ref()
        .map(|(tracer, _)| tracing_opentelemetry::layer().with_tracer(tracer.clone()));

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ledger_app=debug,ledger_hex=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(telemetry)
        .init();

    // Load configuration
    let config = config::Config::from_env()?;

    tracing::info!("Starting ledger server on port {}", config.port);
    tracing::debug!(pool = ?config.pool, "database pool settings");

    // Build repository (handles connection and migration)
    let repo = build_repo(&config.database_url, &config.pool).await?;

    if config.seed_demo_accounts {
        seed_demo_accounts(&repo).await?;
    }

    // Create the transfer engine
    let service = LedgerService::new(repo);

    // Create and run the HTTP server
    let server = HttpServer::new(service);
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await?;

    // Ensure traces are flushed before exit
    if let Some((_, provider)) = otel {
        let _ = provider.shutdown();
    }
    Ok(())
}
