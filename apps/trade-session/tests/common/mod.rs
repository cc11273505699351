//! Shared test fixtures: an in-memory trading gateway and token helpers.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use parking_lot::Mutex;

use trade_session::application::ports::{
    AccountSnapshot, AssetDetails, AssetSummary, GatewayError, OrderRequest, RawPosition,
    TimeWindow, TradeRecord, TradingGateway,
};
use trade_session::{AccessToken, Order, Quote, WireDecimal};

/// Build an unsigned JWT whose payload carries `exp` and a unique `jti`.
pub fn jwt_with_exp(exp: i64, jti: usize) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"test","exp":{exp},"jti":{jti}}}"#));
    format!("{header}.{payload}.signature")
}

pub fn not_found(what: &str) -> GatewayError {
    GatewayError::Status {
        code: tonic::Code::NotFound,
        message: format!("{what} not found"),
    }
}

pub fn unavailable() -> GatewayError {
    GatewayError::Status {
        code: tonic::Code::Unavailable,
        message: "gateway unavailable".to_string(),
    }
}

/// In-memory gateway with call counters and scripted failures.
#[derive(Default)]
pub struct FakeGateway {
    pub auth_calls: AtomicUsize,
    pub get_asset_calls: AtomicUsize,
    pub assets_calls: AtomicUsize,
    pub quote_calls: AtomicUsize,

    auth_script: Mutex<VecDeque<Result<String, GatewayError>>>,
    auth_delay: Mutex<Option<Duration>>,
    token_lifetime_secs: Mutex<Option<i64>>,

    account_ids: Mutex<Vec<String>>,
    accounts: Mutex<HashMap<String, AccountSnapshot>>,

    assets: Mutex<Vec<AssetSummary>>,
    fail_assets: AtomicBool,
    asset_details: Mutex<HashMap<String, AssetDetails>>,
    fail_get_asset: AtomicBool,
    get_asset_delay: Mutex<Option<Duration>>,
    pub asset_requests: Mutex<Vec<String>>,

    quotes: Mutex<HashMap<String, Quote>>,

    pub placed: Mutex<Vec<OrderRequest>>,
    pub order_tokens: Mutex<Vec<String>>,
    orders: Mutex<Vec<Order>>,
    trades: Mutex<Vec<TradeRecord>>,
    pub trade_windows: Mutex<Vec<TimeWindow>>,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn as_port(self: &Arc<Self>) -> Arc<dyn TradingGateway> {
        Arc::clone(self) as Arc<dyn TradingGateway>
    }

    // -------------------------------------------------------------------------
    // Scripting
    // -------------------------------------------------------------------------

    /// Queue an outcome for the next auth call; unscripted calls succeed.
    pub fn push_auth(&self, outcome: Result<String, GatewayError>) {
        self.auth_script.lock().push_back(outcome);
    }

    pub fn set_auth_delay(&self, delay: Duration) {
        *self.auth_delay.lock() = Some(delay);
    }

    /// Lifetime of tokens issued by unscripted auth calls (default one hour).
    pub fn set_token_lifetime(&self, secs: i64) {
        *self.token_lifetime_secs.lock() = Some(secs);
    }

    pub fn add_account(&self, snapshot: AccountSnapshot) {
        self.account_ids.lock().push(snapshot.account_id.clone());
        self.accounts
            .lock()
            .insert(snapshot.account_id.clone(), snapshot);
    }

    /// List an account id without any details behind it.
    pub fn add_account_id(&self, account_id: &str) {
        self.account_ids.lock().push(account_id.to_string());
    }

    pub fn add_listing(&self, symbol: &str, ticker: &str, mic: &str, name: &str) {
        self.assets.lock().push(AssetSummary {
            symbol: symbol.to_string(),
            ticker: ticker.to_string(),
            mic: mic.to_string(),
            name: name.to_string(),
        });
    }

    pub fn fail_assets(&self, fail: bool) {
        self.fail_assets.store(fail, Ordering::SeqCst);
    }

    /// Register `GetAsset` details under each of `keys`.
    pub fn add_asset(&self, keys: &[&str], ticker: &str, board: &str, lot_size: Option<&str>, name: &str) {
        let details = AssetDetails {
            ticker: ticker.to_string(),
            board: board.to_string(),
            name: name.to_string(),
            lot_size: WireDecimal::new(lot_size.map(str::to_string)),
        };
        let mut table = self.asset_details.lock();
        for key in keys {
            table.insert((*key).to_string(), details.clone());
        }
    }

    pub fn fail_get_asset(&self, fail: bool) {
        self.fail_get_asset.store(fail, Ordering::SeqCst);
    }

    pub fn set_get_asset_delay(&self, delay: Duration) {
        *self.get_asset_delay.lock() = Some(delay);
    }

    pub fn add_quote(&self, symbol: &str, quote: Quote) {
        self.quotes.lock().insert(symbol.to_string(), quote);
    }

    pub fn add_order(&self, order: Order) {
        self.orders.lock().push(order);
    }

    pub fn add_trade(&self, trade: TradeRecord) {
        self.trades.lock().push(trade);
    }

    pub fn auth_count(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    pub fn get_asset_count(&self) -> usize {
        self.get_asset_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TradingGateway for FakeGateway {
    async fn auth(&self, secret: &str) -> Result<String, GatewayError> {
        let call = self.auth_calls.fetch_add(1, Ordering::SeqCst) + 1;

        let delay = *self.auth_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if secret.is_empty() {
            return Err(GatewayError::Status {
                code: tonic::Code::Unauthenticated,
                message: "empty secret".to_string(),
            });
        }

        let scripted = self.auth_script.lock().pop_front();
        if let Some(outcome) = scripted {
            return outcome;
        }

        let lifetime = self.token_lifetime_secs.lock().unwrap_or(3600);
        Ok(jwt_with_exp(Utc::now().timestamp() + lifetime, call))
    }

    async fn token_details(&self, _token: &AccessToken) -> Result<Vec<String>, GatewayError> {
        Ok(self.account_ids.lock().clone())
    }

    async fn get_account(
        &self,
        _token: &AccessToken,
        account_id: &str,
    ) -> Result<AccountSnapshot, GatewayError> {
        self.accounts
            .lock()
            .get(account_id)
            .cloned()
            .ok_or_else(|| not_found(account_id))
    }

    async fn get_asset(
        &self,
        _token: &AccessToken,
        symbol: &str,
        _account_id: &str,
    ) -> Result<AssetDetails, GatewayError> {
        self.get_asset_calls.fetch_add(1, Ordering::SeqCst);
        self.asset_requests.lock().push(symbol.to_string());

        let delay = *self.get_asset_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_get_asset.load(Ordering::SeqCst) {
            return Err(unavailable());
        }

        self.asset_details
            .lock()
            .get(symbol)
            .cloned()
            .ok_or_else(|| not_found(symbol))
    }

    async fn assets(&self, _token: &AccessToken) -> Result<Vec<AssetSummary>, GatewayError> {
        self.assets_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_assets.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self.assets.lock().clone())
    }

    async fn last_quote(
        &self,
        _token: &AccessToken,
        symbol: &str,
    ) -> Result<Option<Quote>, GatewayError> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.quotes.lock().get(symbol).cloned())
    }

    async fn place_order(
        &self,
        token: &AccessToken,
        request: OrderRequest,
    ) -> Result<String, GatewayError> {
        let mut placed = self.placed.lock();
        placed.push(request);
        self.order_tokens.lock().push(token.as_str().to_string());
        Ok(format!("order-{}", placed.len()))
    }

    async fn get_orders(
        &self,
        _token: &AccessToken,
        _account_id: &str,
    ) -> Result<Vec<Order>, GatewayError> {
        Ok(self.orders.lock().clone())
    }

    async fn trades(
        &self,
        _token: &AccessToken,
        _account_id: &str,
        window: TimeWindow,
    ) -> Result<Vec<TradeRecord>, GatewayError> {
        self.trade_windows.lock().push(window);
        Ok(self.trades.lock().clone())
    }
}

/// Account snapshot holding `positions` as `(symbol, quantity)` pairs.
pub fn account(account_id: &str, positions: &[(&str, &str)]) -> AccountSnapshot {
    AccountSnapshot {
        account_id: account_id.to_string(),
        account_type: "MC".to_string(),
        status: "ACCOUNT_ACTIVE".to_string(),
        equity: WireDecimal::present("100000.00"),
        unrealized_profit: WireDecimal::present("1250.50"),
        open_date: None,
        positions: positions
            .iter()
            .map(|(symbol, quantity)| RawPosition {
                symbol: (*symbol).to_string(),
                quantity: WireDecimal::present(*quantity),
                average_price: WireDecimal::present("250.00"),
                current_price: WireDecimal::present("255.00"),
                daily_pnl: WireDecimal::absent(),
                unrealized_pnl: WireDecimal::absent(),
            })
            .collect(),
    }
}
