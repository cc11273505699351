//! Trade API Protobuf Messages
//!
//! Checked-in prost definitions for the subset of the `grpc.tradeapi.v1`
//! schema the session uses. Field tags follow the published schema;
//! fields the session never reads are omitted and skipped on decode.

#![allow(missing_docs)]
#![allow(clippy::derive_partial_eq_without_eq)]

/// `google.type` well-known messages.
pub mod google_type {
    /// Arbitrary-precision decimal carried as a string.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Decimal {
        #[prost(string, tag = "1")]
        pub value: ::prost::alloc::string::String,
    }

    /// Half-open time interval.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Interval {
        #[prost(message, optional, tag = "1")]
        pub start_time: ::core::option::Option<::prost_types::Timestamp>,
        #[prost(message, optional, tag = "2")]
        pub end_time: ::core::option::Option<::prost_types::Timestamp>,
    }
}

use google_type::{Decimal, Interval};

// =============================================================================
// Enums
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Side {
    Unspecified = 0,
    Buy = 1,
    Sell = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum OrderType {
    Unspecified = 0,
    Market = 1,
    Limit = 2,
    Stop = 3,
    StopLimit = 4,
    MultiLeg = 5,
}

impl OrderType {
    /// Schema name without the `ORDER_TYPE_` prefix.
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Unspecified => "UNSPECIFIED",
            Self::Market => "MARKET",
            Self::Limit => "LIMIT",
            Self::Stop => "STOP",
            Self::StopLimit => "STOP_LIMIT",
            Self::MultiLeg => "MULTI_LEG",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum OrderStatus {
    Unspecified = 0,
    New = 1,
    PartiallyFilled = 2,
    Filled = 3,
    DoneForDay = 4,
    Canceled = 5,
    Replaced = 6,
    PendingCancel = 7,
    Rejected = 9,
    Suspended = 10,
    PendingNew = 11,
    Expired = 13,
    Failed = 16,
    Forwarding = 17,
    Wait = 18,
    DeniedByBroker = 19,
    RejectedByExchange = 20,
    Watching = 21,
    Executed = 22,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum TimeInForce {
    Unspecified = 0,
    Day = 1,
}

// =============================================================================
// auth.AuthService
// =============================================================================

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AuthRequest {
    #[prost(string, tag = "1")]
    pub secret: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AuthResponse {
    #[prost(string, tag = "1")]
    pub token: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TokenDetailsRequest {
    #[prost(string, tag = "1")]
    pub token: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TokenDetailsResponse {
    #[prost(message, optional, tag = "1")]
    pub created_at: ::core::option::Option<::prost_types::Timestamp>,
    #[prost(message, optional, tag = "2")]
    pub expires_at: ::core::option::Option<::prost_types::Timestamp>,
    #[prost(string, repeated, tag = "4")]
    pub account_ids: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(bool, tag = "5")]
    pub readonly: bool,
}

// =============================================================================
// accounts.AccountsService
// =============================================================================

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetAccountRequest {
    #[prost(string, tag = "1")]
    pub account_id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Position {
    #[prost(string, tag = "1")]
    pub symbol: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "2")]
    pub quantity: ::core::option::Option<Decimal>,
    #[prost(message, optional, tag = "3")]
    pub average_price: ::core::option::Option<Decimal>,
    #[prost(message, optional, tag = "4")]
    pub current_price: ::core::option::Option<Decimal>,
    #[prost(message, optional, tag = "6")]
    pub daily_pnl: ::core::option::Option<Decimal>,
    #[prost(message, optional, tag = "7")]
    pub unrealized_pnl: ::core::option::Option<Decimal>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetAccountResponse {
    #[prost(string, tag = "1")]
    pub account_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub r#type: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub status: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "4")]
    pub equity: ::core::option::Option<Decimal>,
    #[prost(message, optional, tag = "5")]
    pub unrealized_profit: ::core::option::Option<Decimal>,
    #[prost(message, repeated, tag = "6")]
    pub positions: ::prost::alloc::vec::Vec<Position>,
    #[prost(message, optional, tag = "12")]
    pub open_account_date: ::core::option::Option<::prost_types::Timestamp>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TradesRequest {
    #[prost(string, tag = "1")]
    pub account_id: ::prost::alloc::string::String,
    #[prost(int32, tag = "2")]
    pub limit: i32,
    #[prost(message, optional, tag = "3")]
    pub interval: ::core::option::Option<Interval>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AccountTrade {
    #[prost(string, tag = "1")]
    pub trade_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub symbol: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "3")]
    pub price: ::core::option::Option<Decimal>,
    #[prost(message, optional, tag = "4")]
    pub size: ::core::option::Option<Decimal>,
    #[prost(enumeration = "Side", tag = "5")]
    pub side: i32,
    #[prost(message, optional, tag = "6")]
    pub timestamp: ::core::option::Option<::prost_types::Timestamp>,
    #[prost(string, tag = "7")]
    pub order_id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TradesResponse {
    #[prost(message, repeated, tag = "1")]
    pub trades: ::prost::alloc::vec::Vec<AccountTrade>,
}

// =============================================================================
// assets.AssetsService
// =============================================================================

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AssetsRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Asset {
    #[prost(string, tag = "1")]
    pub symbol: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub id: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub ticker: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub mic: ::prost::alloc::string::String,
    #[prost(string, tag = "5")]
    pub isin: ::prost::alloc::string::String,
    #[prost(string, tag = "6")]
    pub r#type: ::prost::alloc::string::String,
    #[prost(string, tag = "7")]
    pub name: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AssetsResponse {
    #[prost(message, repeated, tag = "1")]
    pub assets: ::prost::alloc::vec::Vec<Asset>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetAssetRequest {
    #[prost(string, tag = "1")]
    pub symbol: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub account_id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetAssetResponse {
    #[prost(string, tag = "1")]
    pub board: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub id: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub ticker: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub mic: ::prost::alloc::string::String,
    #[prost(string, tag = "5")]
    pub isin: ::prost::alloc::string::String,
    #[prost(string, tag = "6")]
    pub r#type: ::prost::alloc::string::String,
    #[prost(string, tag = "7")]
    pub name: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "8")]
    pub lot_size: ::core::option::Option<Decimal>,
}

// =============================================================================
// marketdata.MarketDataService
// =============================================================================

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QuoteRequest {
    #[prost(string, tag = "1")]
    pub symbol: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Quote {
    #[prost(string, tag = "1")]
    pub symbol: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "2")]
    pub timestamp: ::core::option::Option<::prost_types::Timestamp>,
    #[prost(message, optional, tag = "3")]
    pub ask: ::core::option::Option<Decimal>,
    #[prost(message, optional, tag = "4")]
    pub ask_size: ::core::option::Option<Decimal>,
    #[prost(message, optional, tag = "5")]
    pub bid: ::core::option::Option<Decimal>,
    #[prost(message, optional, tag = "6")]
    pub bid_size: ::core::option::Option<Decimal>,
    #[prost(message, optional, tag = "7")]
    pub last: ::core::option::Option<Decimal>,
    #[prost(message, optional, tag = "8")]
    pub last_size: ::core::option::Option<Decimal>,
    #[prost(message, optional, tag = "9")]
    pub volume: ::core::option::Option<Decimal>,
    #[prost(message, optional, tag = "10")]
    pub turnover: ::core::option::Option<Decimal>,
    #[prost(message, optional, tag = "11")]
    pub open: ::core::option::Option<Decimal>,
    #[prost(message, optional, tag = "12")]
    pub high: ::core::option::Option<Decimal>,
    #[prost(message, optional, tag = "13")]
    pub low: ::core::option::Option<Decimal>,
    #[prost(message, optional, tag = "14")]
    pub close: ::core::option::Option<Decimal>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QuoteResponse {
    #[prost(string, tag = "1")]
    pub symbol: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "2")]
    pub quote: ::core::option::Option<Quote>,
}

// =============================================================================
// orders.OrdersService
// =============================================================================

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Order {
    #[prost(string, tag = "1")]
    pub account_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub symbol: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "3")]
    pub quantity: ::core::option::Option<Decimal>,
    #[prost(enumeration = "Side", tag = "4")]
    pub side: i32,
    #[prost(enumeration = "OrderType", tag = "5")]
    pub r#type: i32,
    #[prost(enumeration = "TimeInForce", tag = "6")]
    pub time_in_force: i32,
    #[prost(message, optional, tag = "7")]
    pub limit_price: ::core::option::Option<Decimal>,
    #[prost(message, optional, tag = "8")]
    pub stop_price: ::core::option::Option<Decimal>,
    #[prost(string, tag = "10")]
    pub client_order_id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OrderState {
    #[prost(string, tag = "1")]
    pub order_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub exec_id: ::prost::alloc::string::String,
    #[prost(enumeration = "OrderStatus", tag = "3")]
    pub status: i32,
    #[prost(message, optional, tag = "4")]
    pub order: ::core::option::Option<Order>,
    #[prost(message, optional, tag = "5")]
    pub transact_at: ::core::option::Option<::prost_types::Timestamp>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OrdersRequest {
    #[prost(string, tag = "1")]
    pub account_id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OrdersResponse {
    #[prost(message, repeated, tag = "1")]
    pub orders: ::prost::alloc::vec::Vec<OrderState>,
}

// =============================================================================
// Methods
// =============================================================================

/// A unary method of the trade API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rpc {
    pub service: &'static str,
    pub method: &'static str,
    pub path: &'static str,
}

macro_rules! rpc {
    ($name:ident, $service:literal, $method:literal) => {
        pub const $name: Rpc = Rpc {
            service: $service,
            method: $method,
            path: concat!("/", $service, "/", $method),
        };
    };
}

rpc!(AUTH, "grpc.tradeapi.v1.auth.AuthService", "Auth");
rpc!(TOKEN_DETAILS, "grpc.tradeapi.v1.auth.AuthService", "TokenDetails");
rpc!(GET_ACCOUNT, "grpc.tradeapi.v1.accounts.AccountsService", "GetAccount");
rpc!(TRADES, "grpc.tradeapi.v1.accounts.AccountsService", "Trades");
rpc!(ASSETS, "grpc.tradeapi.v1.assets.AssetsService", "Assets");
rpc!(GET_ASSET, "grpc.tradeapi.v1.assets.AssetsService", "GetAsset");
rpc!(LAST_QUOTE, "grpc.tradeapi.v1.marketdata.MarketDataService", "LastQuote");
rpc!(PLACE_ORDER, "grpc.tradeapi.v1.orders.OrdersService", "PlaceOrder");
rpc!(GET_ORDERS, "grpc.tradeapi.v1.orders.OrdersService", "GetOrders");
