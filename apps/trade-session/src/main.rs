//! Trade Session Binary
//!
//! Opens an authenticated session, prints an account overview and keeps
//! the credential fresh until interrupted.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin trade-session
//! cargo run --bin trade-session -- save-token <TOKEN>
//! ```
//!
//! # Environment Variables
//!
//! ## Required (or a saved token file)
//! - `FINAM_API_TOKEN`: Long-lived API secret
//!
//! ## Optional
//! - `FINAM_GRPC_ADDR`: Gateway address (default: https://api.finam.ru:443)
//! - `TRADE_SESSION_CONNECT_TIMEOUT_SECS`: Channel connect deadline (default: 10)
//! - `TRADE_SESSION_CALL_TIMEOUT_SECS`: Per-call deadline (default: 30)
//! - `TRADE_SESSION_AUTH_TIMEOUT_SECS`: Auth call deadline (default: 10)
//! - `TRADE_SESSION_METRICS_PORT`: Prometheus listener port (default: 0, disabled)
//! - `OTEL_ENABLED`: Enable OpenTelemetry export (default: false)
//! - `RUST_LOG`: Log filter (default: trade_session=info)

use anyhow::Context;
use tokio::signal;
use trade_session::infrastructure::config::{self, SecretSource, SessionConfig};
use trade_session::infrastructure::telemetry;
use trade_session::{TradeSessionClient, init_metrics};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    let mut args = std::env::args().skip(1);
    if args.next().as_deref() == Some("save-token") {
        let token = args.next().context("usage: trade-session save-token <TOKEN>")?;
        let path = config::save_api_token_to_user_home(&token)?;
        println!("Token saved to {}", path.display());
        return Ok(());
    }

    let _ = dotenvy::dotenv();

    // Initialize telemetry (tracing + optional OTLP)
    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting trade session");

    let config = SessionConfig::from_env()?;
    log_config(&config);

    if config.metrics_port != 0 {
        init_metrics(config.metrics_port)?;
    }

    let client = config::connect(&config).await?;
    print_overview(&client).await;

    tracing::info!(
        expires_at = %client.tokens().expires_at(),
        "Session ready; press Ctrl+C to exit"
    );

    await_shutdown().await;

    client.close().await;
    tracing::info!("Trade session stopped");
    Ok(())
}

/// Log the parsed configuration.
fn log_config(config: &SessionConfig) {
    let secret_source = match &config.secret_source {
        SecretSource::Environment => "environment".to_string(),
        SecretSource::File(path) => path.display().to_string(),
    };

    tracing::info!(
        grpc_addr = %config.gateway.grpc_addr,
        secret_source = %secret_source,
        call_timeout_secs = config.session.call_timeout.as_secs(),
        metrics_port = config.metrics_port,
        "Configuration loaded"
    );
}

/// Print accounts and their open positions.
async fn print_overview(client: &TradeSessionClient) {
    let accounts = match client.get_accounts().await {
        Ok(accounts) => accounts,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load accounts");
            return;
        }
    };

    for account in &accounts {
        println!(
            "{} [{}] {} equity={} unrealized={}",
            account.id, account.account_type, account.status, account.equity, account.unrealized_pnl
        );

        match client.get_account_details(&account.id).await {
            Ok((_, positions)) => {
                for position in positions {
                    println!(
                        "  {:<16} {:>10} @ {:<10} {}",
                        position.symbol, position.quantity, position.average_price, position.name
                    );
                }
            }
            Err(e) => tracing::warn!(account_id = %account.id, error = %e, "Failed to load positions"),
        }
    }

    println!(
        "{} accounts, {} instruments indexed",
        accounts.len(),
        client.resolver().cache().index_len()
    );
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
async fn await_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
