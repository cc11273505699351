//! Trading Types
//!
//! View models handed to the presentation layer and the pure trading rules
//! applied before anything reaches the gateway: side parsing, close-direction
//! inference, lot conversion and zero-position filtering.
//!
//! Gateway decimals are kept in their wire form ([`WireDecimal`]) so the
//! front-end renders exactly what the exchange reported; parsing happens
//! only where arithmetic is needed.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Placeholder rendered for an absent decimal.
pub const NOT_AVAILABLE: &str = "N/A";

/// Price label shown for orders without a limit price.
pub const MARKET_PRICE_LABEL: &str = "Market";

// =============================================================================
// Errors
// =============================================================================

/// Input rejected before any gateway call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Side string is neither `buy` nor `sell`.
    #[error("invalid direction: {0}")]
    InvalidSide(String),

    /// Position quantity is zero or not a number.
    #[error("could not determine close direction for quantity {0}")]
    IndeterminateDirection(String),

    /// Lot count is zero or negative.
    #[error("quantity must be positive, got {0}")]
    NonPositiveQuantity(Decimal),

    /// Lots times lot size does not fit in a decimal.
    #[error("quantity of {lots} lots of {lot_size} is too large")]
    QuantityOverflow {
        /// Requested lot count.
        lots: Decimal,
        /// Units per lot.
        lot_size: Decimal,
    },
}

// =============================================================================
// Wire Decimal
// =============================================================================

/// A gateway decimal in string form, possibly absent.
///
/// The exchange may use `,` as the decimal separator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireDecimal(Option<String>);

impl WireDecimal {
    /// Wrap an optional raw value.
    #[must_use]
    pub const fn new(raw: Option<String>) -> Self {
        Self(raw)
    }

    /// An absent value.
    #[must_use]
    pub const fn absent() -> Self {
        Self(None)
    }

    /// A present value.
    #[must_use]
    pub fn present(raw: impl Into<String>) -> Self {
        Self(Some(raw.into()))
    }

    /// The raw string, if present.
    #[must_use]
    pub fn raw(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Parse into a decimal, accepting `,` as the separator.
    #[must_use]
    pub fn parse(&self) -> Option<Decimal> {
        self.0.as_deref().and_then(parse_decimal)
    }

    /// Check whether the value parses to exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.parse().is_some_and(|d| d.is_zero())
    }
}

impl fmt::Display for WireDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_deref().unwrap_or(NOT_AVAILABLE))
    }
}

/// Parse a decimal string that may use `,` as the separator.
#[must_use]
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let normalized = raw.trim().replace(',', ".");
    if normalized.is_empty() {
        return None;
    }
    Decimal::from_str(&normalized)
        .or_else(|_| Decimal::from_scientific(&normalized))
        .ok()
}

// =============================================================================
// Order Side
// =============================================================================

/// Direction of an order or trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    /// Buy.
    Buy,
    /// Sell.
    Sell,
}

impl OrderSide {
    /// Side that closes a position of the given signed quantity.
    ///
    /// Long positions close with a sell, short positions with a buy.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::IndeterminateDirection`] when the quantity
    /// is zero or unparseable.
    pub fn closing(current_quantity: &str) -> Result<Self, ValidationError> {
        match parse_decimal(current_quantity) {
            Some(qty) if qty > Decimal::ZERO => Ok(Self::Sell),
            Some(qty) if qty < Decimal::ZERO => Ok(Self::Buy),
            _ => Err(ValidationError::IndeterminateDirection(
                current_quantity.to_string(),
            )),
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
        }
    }
}

impl FromStr for OrderSide {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            _ => Err(ValidationError::InvalidSide(s.to_string())),
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Label for an optional side; `Unknown` when the gateway sent none.
#[must_use]
pub const fn side_label(side: Option<OrderSide>) -> &'static str {
    match side {
        Some(side) => side.label(),
        None => "Unknown",
    }
}

// =============================================================================
// Order Type & Status
// =============================================================================

/// Order type as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    /// Market order.
    Market,
    /// Limit order.
    Limit,
    /// Any other type, by its wire name without the `ORDER_TYPE_` prefix.
    Other(String),
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Market => f.write_str("Market"),
            Self::Limit => f.write_str("Limit"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Accepted, not yet filled.
    New,
    /// Partially filled.
    PartiallyFilled,
    /// Fully filled.
    Filled,
    /// Cancelled.
    Cancelled,
    /// Rejected by the exchange or broker.
    Rejected,
    /// Executed.
    Executed,
    /// Status not set.
    Unspecified,
    /// A status this client does not know.
    Unknown,
}

impl OrderStatus {
    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::PartiallyFilled => "Partial",
            Self::Filled => "Filled",
            Self::Cancelled => "Cancelled",
            Self::Rejected => "Rejected",
            Self::Executed => "Executed",
            Self::Unspecified => "Unspecified",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Quantity Rules
// =============================================================================

/// Reject lot counts that are zero or negative.
///
/// # Errors
///
/// Returns [`ValidationError::NonPositiveQuantity`].
pub fn ensure_positive_lots(lots: Decimal) -> Result<Decimal, ValidationError> {
    if lots > Decimal::ZERO {
        Ok(lots)
    } else {
        Err(ValidationError::NonPositiveQuantity(lots))
    }
}

/// Convert a lot count into units.
///
/// Unknown or non-positive lot sizes leave the count unchanged.
///
/// # Errors
///
/// Returns [`ValidationError::QuantityOverflow`] when the product does not
/// fit in a [`Decimal`].
pub fn lots_to_units(
    lots: Decimal,
    lot_size: Option<Decimal>,
) -> Result<Decimal, ValidationError> {
    match lot_size {
        Some(size) if size > Decimal::ZERO => lots
            .checked_mul(size)
            .ok_or(ValidationError::QuantityOverflow { lots, lot_size: size }),
        _ => Ok(lots),
    }
}

/// Trade value `price × quantity` formatted with two decimals.
///
/// Unparseable operands count as zero. A product too large for a
/// [`Decimal`] renders as [`NOT_AVAILABLE`].
#[must_use]
pub fn trade_total(price: &WireDecimal, quantity: &WireDecimal) -> String {
    let price: Decimal = price.parse().unwrap_or_default();
    let quantity: Decimal = quantity.parse().unwrap_or_default();
    price
        .checked_mul(quantity)
        .map_or_else(
            || NOT_AVAILABLE.to_string(),
            |total| format!("{:.2}", total.round_dp(2)),
        )
}

// =============================================================================
// View Models
// =============================================================================

/// Brokerage account summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Account identifier.
    pub id: String,
    /// Account type as reported by the broker.
    pub account_type: String,
    /// Account status as reported by the broker.
    pub status: String,
    /// Total equity.
    pub equity: WireDecimal,
    /// Unrealized profit and loss.
    pub unrealized_pnl: WireDecimal,
    /// Account opening date.
    pub open_date: Option<DateTime<Utc>>,
}

/// An open position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Resolved symbol (qualified when resolution succeeded).
    pub symbol: String,
    /// Bare ticker.
    pub ticker: String,
    /// Market identifier code, empty when unresolved.
    pub mic: String,
    /// Cached instrument name, empty when unknown.
    pub name: String,
    /// Units per lot, zero when unknown.
    pub lot_size: Decimal,
    /// Signed quantity in units.
    pub quantity: WireDecimal,
    /// Average entry price.
    pub average_price: WireDecimal,
    /// Current market price.
    pub current_price: WireDecimal,
    /// Profit and loss for the trading day.
    pub daily_pnl: WireDecimal,
    /// Unrealized profit and loss.
    pub unrealized_pnl: WireDecimal,
}

/// Last quote for an instrument.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Qualified symbol.
    pub symbol: String,
    /// Best bid.
    pub bid: WireDecimal,
    /// Size at best bid.
    pub bid_size: WireDecimal,
    /// Best ask.
    pub ask: WireDecimal,
    /// Size at best ask.
    pub ask_size: WireDecimal,
    /// Last trade price.
    pub last: WireDecimal,
    /// Last trade size.
    pub last_size: WireDecimal,
    /// Session volume.
    pub volume: WireDecimal,
    /// Session open.
    pub open: WireDecimal,
    /// Session high.
    pub high: WireDecimal,
    /// Session low.
    pub low: WireDecimal,
    /// Previous close.
    pub close: WireDecimal,
    /// Quote time.
    pub timestamp: Option<DateTime<Utc>>,
}

/// A historical fill.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Trade identifier.
    pub id: String,
    /// Instrument symbol.
    pub symbol: String,
    /// Side, when reported.
    pub side: Option<OrderSide>,
    /// Fill price.
    pub price: WireDecimal,
    /// Fill quantity.
    pub quantity: WireDecimal,
    /// `price × quantity`, two decimals.
    pub total: String,
    /// Fill time.
    pub timestamp: Option<DateTime<Utc>>,
}

/// A working or recent order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier.
    pub id: String,
    /// Instrument symbol.
    pub symbol: String,
    /// Side, when reported.
    pub side: Option<OrderSide>,
    /// Order type, when reported.
    pub order_type: Option<OrderType>,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Ordered quantity.
    pub quantity: WireDecimal,
    /// Limit price; absent for market orders.
    pub limit_price: WireDecimal,
    /// Time of the last transaction on the order.
    pub creation_time: Option<DateTime<Utc>>,
}

impl Order {
    /// Price label: the limit price, or `Market` when absent or zero.
    #[must_use]
    pub fn price_label(&self) -> String {
        match self.limit_price.raw() {
            None | Some("" | "0") => MARKET_PRICE_LABEL.to_string(),
            Some(raw) => raw.to_string(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
