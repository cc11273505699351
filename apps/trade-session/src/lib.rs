#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Trade Session - Brokerage Gateway Session Core
//!
//! Keeps an authenticated session against a brokerage's gRPC trading
//! gateway: exchanges the long-lived API secret for short-lived access
//! tokens and renews them in the background, resolves bare tickers to
//! exchange-qualified symbols through a shared cache, and exposes a client
//! facade for accounts, quotes, orders and trade history.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Pure types and rules
//!   - `credential`: Access tokens and expiry claim decoding
//!   - `instrument`: Symbol resolution table and security search index
//!   - `trading`: View models, side/quantity rules, wire decimals
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: The `TradingGateway` driven port
//!   - `services`: Token renewal, instrument resolution, client facade
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `grpc`: Trade API client over a TLS channel
//!   - `config`: Environment and token-file configuration
//!   - `metrics`: Prometheus instrumentation
//!   - `telemetry`: Tracing subscriber and OTLP export
//!
//! # Data Flow
//!
//! ```text
//!  presentation ──► TradeSessionClient ──► InstrumentResolver ──┐
//!                        │                                      │
//!                        └──────► TokenManager ◄── renewal task │
//!                                      │                        │
//!                                      ▼                        ▼
//!                               TradingGateway (gRPC) ◄─────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Pure session and trading types.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::credential::{AccessToken, Credential, DecodeError, claims_expiry};
pub use domain::instrument::{InstrumentCache, SecurityInfo};
pub use domain::trading::{
    AccountInfo, Order, OrderSide, OrderStatus, OrderType, Position, Quote, Trade,
    ValidationError, WireDecimal,
};

// Ports
pub use application::ports::{GatewayError, TradingGateway};

// Services
pub use application::services::{
    AuthError, ClientError, InstrumentResolver, RefreshPolicy, SessionSettings, TokenManager,
    TradeSessionClient,
};

// Infrastructure config
pub use infrastructure::config::{ConfigError, SessionConfig};

// gRPC adapter
pub use infrastructure::grpc::GrpcGateway;

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
