//! gRPC Trading Gateway Adapter
//!
//! Implements [`TradingGateway`] over a single TLS channel to the trade API.
//!
//! # Architecture
//!
//! Every call goes through [`GrpcGateway::unary`], which:
//!
//! 1. Attaches the raw access token as `authorization` metadata
//! 2. Tags the request with its gRPC method for tracing layers
//! 3. Records latency and failures per method
//!
//! Deadlines are applied by the application services, not here.

pub mod proto;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tonic::codegen::http::uri::PathAndQuery;
use tonic::metadata::MetadataValue;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};

use crate::application::ports::{
    AccountSnapshot, AssetDetails, AssetSummary, GatewayError, OrderRequest, RawPosition,
    TimeWindow, TradeRecord, TradingGateway,
};
use crate::domain::credential::AccessToken;
use crate::domain::trading::{Order, OrderSide, OrderStatus, OrderType, Quote, WireDecimal};
use crate::infrastructure::metrics;

use proto::Rpc;

/// Metadata key carrying the access token.
const AUTHORIZATION: &str = "authorization";

/// Keepalive interval for the gateway connection.
const TCP_KEEPALIVE: Duration = Duration::from_secs(30);

// =============================================================================
// Gateway
// =============================================================================

/// Trade API client over one shared channel.
#[derive(Debug, Clone)]
pub struct GrpcGateway {
    channel: Channel,
}

impl GrpcGateway {
    /// Connect to the gateway at `addr`.
    ///
    /// `https://` addresses use TLS with the platform's native roots.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] if the address is invalid or the
    /// connection cannot be established within `connect_timeout`.
    pub async fn connect(addr: &str, connect_timeout: Duration) -> Result<Self, GatewayError> {
        let mut endpoint = Endpoint::from_shared(addr.to_string())
            .map_err(|e| GatewayError::Transport(format!("invalid endpoint {addr}: {e}")))?
            .connect_timeout(connect_timeout)
            .tcp_keepalive(Some(TCP_KEEPALIVE));

        if addr.starts_with("https://") {
            endpoint = endpoint
                .tls_config(ClientTlsConfig::new().with_native_roots())
                .map_err(|e| GatewayError::Transport(format!("TLS configuration: {e}")))?;
        }

        let channel = endpoint
            .connect()
            .await
            .map_err(|e| GatewayError::Transport(format!("connect to {addr}: {e}")))?;

        tracing::info!(addr, "Connected to trading gateway");
        Ok(Self { channel })
    }

    /// Wrap an existing channel.
    #[must_use]
    pub const fn from_channel(channel: Channel) -> Self {
        Self { channel }
    }

    async fn unary<Req, Resp>(
        &self,
        rpc: Rpc,
        message: Req,
        token: Option<&AccessToken>,
    ) -> Result<Resp, GatewayError>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let started = Instant::now();
        let result = self.call(rpc, message, token).await;
        metrics::record_gateway_latency(rpc.method, started.elapsed());

        if let Err(error) = &result {
            metrics::record_gateway_failure(rpc.method);
            tracing::debug!(method = rpc.method, %error, "Gateway call failed");
        }

        result
    }

    async fn call<Req, Resp>(
        &self,
        rpc: Rpc,
        message: Req,
        token: Option<&AccessToken>,
    ) -> Result<Resp, GatewayError>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = tonic::client::Grpc::new(self.channel.clone());
        grpc.ready()
            .await
            .map_err(|e| GatewayError::Transport(format!("service was not ready: {e}")))?;

        let mut request = tonic::Request::new(message);
        if let Some(token) = token {
            let value = MetadataValue::try_from(token.as_str()).map_err(|_| {
                GatewayError::Status {
                    code: tonic::Code::Unauthenticated,
                    message: "access token is not valid metadata".to_string(),
                }
            })?;
            request.metadata_mut().insert(AUTHORIZATION, value);
        }
        request
            .extensions_mut()
            .insert(tonic::GrpcMethod::new(rpc.service, rpc.method));

        let codec = tonic_prost::ProstCodec::<Req, Resp>::default();
        let path = PathAndQuery::from_static(rpc.path);

        grpc.unary(request, path, codec)
            .await
            .map(tonic::Response::into_inner)
            .map_err(GatewayError::from)
    }
}

#[async_trait]
impl TradingGateway for GrpcGateway {
    async fn auth(&self, secret: &str) -> Result<String, GatewayError> {
        let response: proto::AuthResponse = self
            .unary(
                proto::AUTH,
                proto::AuthRequest {
                    secret: secret.to_string(),
                },
                None,
            )
            .await?;
        Ok(response.token)
    }

    async fn token_details(&self, token: &AccessToken) -> Result<Vec<String>, GatewayError> {
        let response: proto::TokenDetailsResponse = self
            .unary(
                proto::TOKEN_DETAILS,
                proto::TokenDetailsRequest {
                    token: token.as_str().to_string(),
                },
                Some(token),
            )
            .await?;
        Ok(response.account_ids)
    }

    async fn get_account(
        &self,
        token: &AccessToken,
        account_id: &str,
    ) -> Result<AccountSnapshot, GatewayError> {
        let response: proto::GetAccountResponse = self
            .unary(
                proto::GET_ACCOUNT,
                proto::GetAccountRequest {
                    account_id: account_id.to_string(),
                },
                Some(token),
            )
            .await?;
        Ok(account_snapshot(response))
    }

    async fn get_asset(
        &self,
        token: &AccessToken,
        symbol: &str,
        account_id: &str,
    ) -> Result<AssetDetails, GatewayError> {
        let response: proto::GetAssetResponse = self
            .unary(
                proto::GET_ASSET,
                proto::GetAssetRequest {
                    symbol: symbol.to_string(),
                    account_id: account_id.to_string(),
                },
                Some(token),
            )
            .await?;
        Ok(asset_details(response))
    }

    async fn assets(&self, token: &AccessToken) -> Result<Vec<AssetSummary>, GatewayError> {
        let response: proto::AssetsResponse = self
            .unary(proto::ASSETS, proto::AssetsRequest {}, Some(token))
            .await?;
        Ok(response.assets.into_iter().map(asset_summary).collect())
    }

    async fn last_quote(
        &self,
        token: &AccessToken,
        symbol: &str,
    ) -> Result<Option<Quote>, GatewayError> {
        let response: proto::QuoteResponse = self
            .unary(
                proto::LAST_QUOTE,
                proto::QuoteRequest {
                    symbol: symbol.to_string(),
                },
                Some(token),
            )
            .await?;
        Ok(response.quote.map(|quote| quote_view(symbol, quote)))
    }

    async fn place_order(
        &self,
        token: &AccessToken,
        request: OrderRequest,
    ) -> Result<String, GatewayError> {
        let state: proto::OrderState = self
            .unary(proto::PLACE_ORDER, market_order(request), Some(token))
            .await?;
        Ok(state.order_id)
    }

    async fn get_orders(
        &self,
        token: &AccessToken,
        account_id: &str,
    ) -> Result<Vec<Order>, GatewayError> {
        let response: proto::OrdersResponse = self
            .unary(
                proto::GET_ORDERS,
                proto::OrdersRequest {
                    account_id: account_id.to_string(),
                },
                Some(token),
            )
            .await?;
        Ok(response.orders.into_iter().map(order_view).collect())
    }

    async fn trades(
        &self,
        token: &AccessToken,
        account_id: &str,
        window: TimeWindow,
    ) -> Result<Vec<TradeRecord>, GatewayError> {
        let response: proto::TradesResponse = self
            .unary(
                proto::TRADES,
                proto::TradesRequest {
                    account_id: account_id.to_string(),
                    limit: 0,
                    interval: Some(proto::google_type::Interval {
                        start_time: Some(to_timestamp(window.start)),
                        end_time: Some(to_timestamp(window.end)),
                    }),
                },
                Some(token),
            )
            .await?;
        Ok(response.trades.into_iter().map(trade_record).collect())
    }
}

// =============================================================================
// Wire Conversions
// =============================================================================

fn wire(value: Option<proto::google_type::Decimal>) -> WireDecimal {
    WireDecimal::new(value.map(|d| d.value))
}

fn from_timestamp(ts: Option<prost_types::Timestamp>) -> Option<DateTime<Utc>> {
    let ts = ts?;
    DateTime::from_timestamp(ts.seconds, u32::try_from(ts.nanos).unwrap_or(0))
}

fn to_timestamp(time: DateTime<Utc>) -> prost_types::Timestamp {
    prost_types::Timestamp {
        seconds: time.timestamp(),
        nanos: i32::try_from(time.timestamp_subsec_nanos()).unwrap_or(0),
    }
}

fn side_from_wire(value: i32) -> Option<OrderSide> {
    match proto::Side::try_from(value) {
        Ok(proto::Side::Buy) => Some(OrderSide::Buy),
        Ok(proto::Side::Sell) => Some(OrderSide::Sell),
        _ => None,
    }
}

const fn side_to_wire(side: OrderSide) -> proto::Side {
    match side {
        OrderSide::Buy => proto::Side::Buy,
        OrderSide::Sell => proto::Side::Sell,
    }
}

fn order_type_from_wire(value: i32) -> OrderType {
    match proto::OrderType::try_from(value) {
        Ok(proto::OrderType::Market) => OrderType::Market,
        Ok(proto::OrderType::Limit) => OrderType::Limit,
        Ok(other) => OrderType::Other(other.short_name().to_string()),
        Err(_) => OrderType::Other(value.to_string()),
    }
}

fn status_from_wire(value: i32) -> OrderStatus {
    match proto::OrderStatus::try_from(value) {
        Ok(proto::OrderStatus::Unspecified) => OrderStatus::Unspecified,
        Ok(proto::OrderStatus::New) => OrderStatus::New,
        Ok(proto::OrderStatus::PartiallyFilled) => OrderStatus::PartiallyFilled,
        Ok(proto::OrderStatus::Filled) => OrderStatus::Filled,
        Ok(proto::OrderStatus::Canceled) => OrderStatus::Cancelled,
        Ok(proto::OrderStatus::Rejected) => OrderStatus::Rejected,
        Ok(proto::OrderStatus::Executed) => OrderStatus::Executed,
        _ => OrderStatus::Unknown,
    }
}

fn account_snapshot(response: proto::GetAccountResponse) -> AccountSnapshot {
    AccountSnapshot {
        account_id: response.account_id,
        account_type: response.r#type,
        status: response.status,
        equity: wire(response.equity),
        unrealized_profit: wire(response.unrealized_profit),
        open_date: from_timestamp(response.open_account_date),
        positions: response
            .positions
            .into_iter()
            .map(|p| RawPosition {
                symbol: p.symbol,
                quantity: wire(p.quantity),
                average_price: wire(p.average_price),
                current_price: wire(p.current_price),
                daily_pnl: wire(p.daily_pnl),
                unrealized_pnl: wire(p.unrealized_pnl),
            })
            .collect(),
    }
}

fn asset_details(response: proto::GetAssetResponse) -> AssetDetails {
    AssetDetails {
        ticker: response.ticker,
        board: response.board,
        name: response.name,
        lot_size: wire(response.lot_size),
    }
}

fn asset_summary(asset: proto::Asset) -> AssetSummary {
    AssetSummary {
        symbol: asset.symbol,
        ticker: asset.ticker,
        mic: asset.mic,
        name: asset.name,
    }
}

fn quote_view(symbol: &str, quote: proto::Quote) -> Quote {
    Quote {
        symbol: symbol.to_string(),
        bid: wire(quote.bid),
        bid_size: wire(quote.bid_size),
        ask: wire(quote.ask),
        ask_size: wire(quote.ask_size),
        last: wire(quote.last),
        last_size: wire(quote.last_size),
        volume: wire(quote.volume),
        open: wire(quote.open),
        high: wire(quote.high),
        low: wire(quote.low),
        close: wire(quote.close),
        timestamp: from_timestamp(quote.timestamp),
    }
}

fn market_order(request: OrderRequest) -> proto::Order {
    proto::Order {
        account_id: request.account_id,
        symbol: request.symbol,
        quantity: Some(proto::google_type::Decimal {
            value: request.quantity.to_string(),
        }),
        side: side_to_wire(request.side).into(),
        r#type: proto::OrderType::Market.into(),
        client_order_id: request.client_order_id,
        ..Default::default()
    }
}

fn order_view(state: proto::OrderState) -> Order {
    let mut view = Order {
        id: state.order_id,
        symbol: String::new(),
        side: None,
        order_type: None,
        status: status_from_wire(state.status),
        quantity: WireDecimal::absent(),
        limit_price: WireDecimal::absent(),
        creation_time: from_timestamp(state.transact_at),
    };

    if let Some(order) = state.order {
        view.symbol = order.symbol;
        view.side = side_from_wire(order.side);
        view.order_type = Some(order_type_from_wire(order.r#type));
        view.quantity = wire(order.quantity);
        view.limit_price = wire(order.limit_price);
    }

    view
}

fn trade_record(trade: proto::AccountTrade) -> TradeRecord {
    TradeRecord {
        trade_id: trade.trade_id,
        symbol: trade.symbol,
        side: side_from_wire(trade.side),
        price: wire(trade.price),
        size: wire(trade.size),
        timestamp: from_timestamp(trade.timestamp),
    }
}

// =============================================================================
// Tests
// =============================================================================
