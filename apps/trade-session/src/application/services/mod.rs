//! Application Services
//!
//! Services that orchestrate domain logic and coordinate gateway calls.
//!
//! - `TokenManager`: credential issue and background renewal
//! - `InstrumentResolver`: read-through instrument cache
//! - `TradeSessionClient`: facade used by the presentation layer

use std::future::Future;
use std::time::Duration;

use crate::application::ports::GatewayError;

mod client;
mod instrument_resolver;
mod token_manager;

pub use client::{ClientError, SessionSettings, TRADE_HISTORY_DAYS, TradeSessionClient};
pub use instrument_resolver::InstrumentResolver;
pub use token_manager::{AuthError, RefreshPolicy, TokenManager, refresh_delay};

/// Bound a gateway call by `deadline`.
async fn with_deadline<T>(
    deadline: Duration,
    call: impl Future<Output = Result<T, GatewayError>>,
) -> Result<T, GatewayError> {
    tokio::time::timeout(deadline, call)
        .await
        .map_err(|_| GatewayError::Timeout(deadline))?
}
