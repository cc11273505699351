//! Port Interfaces
//!
//! Contracts that infrastructure adapters implement.
//!
//! ## Driven Ports (Outbound)
//!
//! - `TradingGateway`: the remote brokerage gateway (auth, accounts,
//!   assets, market data, orders)

mod trading_gateway_port;

pub use trading_gateway_port::{
    AccountSnapshot, AssetDetails, AssetSummary, GatewayError, OrderRequest, RawPosition,
    TimeWindow, TradeRecord, TradingGateway,
};
