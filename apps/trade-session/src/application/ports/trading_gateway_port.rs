//! Trading Gateway Port (Driven Port)
//!
//! Interface to the remote brokerage gateway. Every authenticated call takes
//! the access token explicitly; the adapter attaches it to the request.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::credential::AccessToken;
use crate::domain::trading::{Order, OrderSide, Quote, WireDecimal};

// =============================================================================
// Requests
// =============================================================================

/// Request to place an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Account to trade in.
    pub account_id: String,
    /// Qualified symbol (or the best-known symbol when unresolved).
    pub symbol: String,
    /// Order side.
    pub side: OrderSide,
    /// Quantity in units (already converted from lots).
    pub quantity: Decimal,
    /// Client-generated order identifier.
    pub client_order_id: String,
}

impl OrderRequest {
    /// Create a market order request.
    #[must_use]
    pub const fn market(
        account_id: String,
        symbol: String,
        side: OrderSide,
        quantity: Decimal,
        client_order_id: String,
    ) -> Self {
        Self {
            account_id,
            symbol,
            side,
            quantity,
            client_order_id,
        }
    }
}

/// Half-open time window for history queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    /// Window start.
    pub start: DateTime<Utc>,
    /// Window end.
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window covering the `days` days before `now`.
    #[must_use]
    pub fn trailing_days(now: DateTime<Utc>, days: i64) -> Self {
        Self {
            start: now - chrono::Duration::days(days),
            end: now,
        }
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Instrument details from `GetAsset`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetDetails {
    /// Exchange ticker.
    pub ticker: String,
    /// Trading board (used as the MIC part of the qualified symbol).
    pub board: String,
    /// Instrument name.
    pub name: String,
    /// Units per lot.
    pub lot_size: WireDecimal,
}

/// One listing from the bulk `Assets` catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetSummary {
    /// Listing symbol, qualified or not.
    pub symbol: String,
    /// Exchange ticker.
    pub ticker: String,
    /// Market identifier code.
    pub mic: String,
    /// Instrument name.
    pub name: String,
}

/// Raw position as reported inside an account snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPosition {
    /// Symbol as reported (may be bare).
    pub symbol: String,
    /// Signed quantity.
    pub quantity: WireDecimal,
    /// Average entry price.
    pub average_price: WireDecimal,
    /// Current price.
    pub current_price: WireDecimal,
    /// Daily profit and loss.
    pub daily_pnl: WireDecimal,
    /// Unrealized profit and loss.
    pub unrealized_pnl: WireDecimal,
}

/// Account state from `GetAccount`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountSnapshot {
    /// Account identifier.
    pub account_id: String,
    /// Account type.
    pub account_type: String,
    /// Account status.
    pub status: String,
    /// Total equity.
    pub equity: WireDecimal,
    /// Unrealized profit.
    pub unrealized_profit: WireDecimal,
    /// Account opening date.
    pub open_date: Option<DateTime<Utc>>,
    /// Open and historical positions.
    pub positions: Vec<RawPosition>,
}

/// One fill from the `Trades` history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradeRecord {
    /// Trade identifier.
    pub trade_id: String,
    /// Instrument symbol.
    pub symbol: String,
    /// Side, when set.
    pub side: Option<OrderSide>,
    /// Fill price.
    pub price: WireDecimal,
    /// Fill size.
    pub size: WireDecimal,
    /// Fill time.
    pub timestamp: Option<DateTime<Utc>>,
}

// =============================================================================
// Errors
// =============================================================================

/// Gateway port error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The gateway answered with a non-OK status.
    #[error("gateway status {code:?}: {message}")]
    Status {
        /// gRPC status code.
        code: tonic::Code,
        /// Status message.
        message: String,
    },

    /// The transport failed before a status was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// The call did not complete within its deadline.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    /// The response was missing required data.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Check whether the failure happened below the application protocol.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Status { code, .. } => matches!(code, tonic::Code::Unavailable),
            Self::InvalidResponse(_) => false,
        }
    }

    /// Check whether retrying the same call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Status { code, .. } => matches!(
                code,
                tonic::Code::Unavailable
                    | tonic::Code::DeadlineExceeded
                    | tonic::Code::ResourceExhausted
                    | tonic::Code::Aborted
            ),
            Self::InvalidResponse(_) => false,
        }
    }
}

impl From<tonic::Status> for GatewayError {
    fn from(status: tonic::Status) -> Self {
        Self::Status {
            code: status.code(),
            message: status.message().to_string(),
        }
    }
}

// =============================================================================
// Port
// =============================================================================

/// Port for the remote trading gateway.
#[async_trait]
pub trait TradingGateway: Send + Sync {
    /// Exchange the long-lived secret for a short-lived access token.
    async fn auth(&self, secret: &str) -> Result<String, GatewayError>;

    /// Account identifiers the token grants access to.
    async fn token_details(&self, token: &AccessToken) -> Result<Vec<String>, GatewayError>;

    /// Account state including positions.
    async fn get_account(
        &self,
        token: &AccessToken,
        account_id: &str,
    ) -> Result<AccountSnapshot, GatewayError>;

    /// Details for one instrument in the context of an account.
    async fn get_asset(
        &self,
        token: &AccessToken,
        symbol: &str,
        account_id: &str,
    ) -> Result<AssetDetails, GatewayError>;

    /// The full instrument catalog.
    async fn assets(&self, token: &AccessToken) -> Result<Vec<AssetSummary>, GatewayError>;

    /// Last quote for a qualified symbol; `None` when the gateway has none.
    async fn last_quote(
        &self,
        token: &AccessToken,
        symbol: &str,
    ) -> Result<Option<Quote>, GatewayError>;

    /// Place an order and return its identifier.
    async fn place_order(
        &self,
        token: &AccessToken,
        request: OrderRequest,
    ) -> Result<String, GatewayError>;

    /// Orders of an account.
    async fn get_orders(
        &self,
        token: &AccessToken,
        account_id: &str,
    ) -> Result<Vec<Order>, GatewayError>;

    /// Fills of an account within a window.
    async fn trades(
        &self,
        token: &AccessToken,
        account_id: &str,
        window: TimeWindow,
    ) -> Result<Vec<TradeRecord>, GatewayError>;
}
