//! Trade Session Client
//!
//! Single entry point for the presentation layer. Composes the token
//! manager and the instrument resolver, and applies the trading rules that
//! must hold before an order leaves the process:
//!
//! - side strings and lot counts are validated synchronously
//! - lot counts are converted to units with the resolved lot size
//! - close direction is inferred from the signed position quantity
//! - flat positions are dropped from account details
//!
//! Batch reads (`get_accounts`, `get_quotes`, `get_snapshots`) skip and log
//! individual failures instead of failing the batch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;

use super::instrument_resolver::InstrumentResolver;
use super::token_manager::{AuthError, RefreshPolicy, TokenManager};
use super::with_deadline;
use crate::application::ports::{
    AccountSnapshot, GatewayError, OrderRequest, RawPosition, TimeWindow, TradingGateway,
};
use crate::domain::instrument::{InstrumentCache, SecurityInfo, is_qualified, split_symbol};
use crate::domain::trading::{
    AccountInfo, Order, OrderSide, Position, Quote, Trade, ValidationError, ensure_positive_lots,
    lots_to_units, trade_total,
};
use crate::infrastructure::metrics;

/// Days of history returned by [`TradeSessionClient::get_trade_history`].
pub const TRADE_HISTORY_DAYS: i64 = 30;

// =============================================================================
// Errors
// =============================================================================

/// Errors surfaced by the client facade.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// The gateway channel could not be established.
    #[error("failed to connect: {0}")]
    Connection(#[source] GatewayError),

    /// Initial authentication failed.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// A gateway call failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Input was rejected before any gateway call.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ClientError {
    /// Check whether the caller supplied invalid input.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check whether retrying the operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(e) | Self::Gateway(e) => e.is_retryable(),
            Self::Auth(e) => e.is_retryable(),
            Self::Validation(_) => false,
        }
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Timing settings for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Deadline for each authenticated gateway call.
    pub call_timeout: Duration,
    /// Deadline for the auth call.
    pub auth_timeout: Duration,
    /// Credential renewal timing.
    pub refresh: RefreshPolicy,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(30),
            auth_timeout: Duration::from_secs(10),
            refresh: RefreshPolicy::default(),
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// Authenticated session against the trading gateway.
pub struct TradeSessionClient {
    gateway: Arc<dyn TradingGateway>,
    tokens: Arc<TokenManager>,
    resolver: InstrumentResolver,
    call_timeout: Duration,
}

impl std::fmt::Debug for TradeSessionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradeSessionClient")
            .field("tokens", &self.tokens)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

impl TradeSessionClient {
    /// Authenticate, start credential renewal and warm the instrument cache.
    ///
    /// A failed catalog load is logged and does not fail construction;
    /// lookups then resolve lazily.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Auth`] when initial authentication fails.
    pub async fn start(
        gateway: Arc<dyn TradingGateway>,
        secret: impl Into<String>,
        settings: SessionSettings,
    ) -> Result<Self, ClientError> {
        let tokens = TokenManager::authenticate(
            Arc::clone(&gateway),
            secret,
            settings.refresh,
            settings.auth_timeout,
        )
        .await?;
        let tokens = Arc::new(tokens);
        tokens.start_background_refresh();

        let resolver = InstrumentResolver::new(
            Arc::new(InstrumentCache::new()),
            Arc::clone(&gateway),
            Arc::clone(&tokens),
            settings.call_timeout,
        );

        if let Err(e) = resolver.load_all().await {
            tracing::warn!(error = %e, "Failed to load instrument catalog");
        }

        Ok(Self {
            gateway,
            tokens,
            resolver,
            call_timeout: settings.call_timeout,
        })
    }

    /// The token manager.
    #[must_use]
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// The instrument resolver.
    #[must_use]
    pub const fn resolver(&self) -> &InstrumentResolver {
        &self.resolver
    }

    /// Stop credential renewal and release the gateway.
    pub async fn close(self) {
        self.tokens.shutdown().await;
        tracing::info!("Trade session closed");
    }

    // -------------------------------------------------------------------------
    // Accounts
    // -------------------------------------------------------------------------

    /// All accounts the credential grants access to.
    ///
    /// Accounts whose details cannot be fetched are skipped.
    ///
    /// # Errors
    ///
    /// Fails only when the account list itself cannot be fetched.
    pub async fn get_accounts(&self) -> Result<Vec<AccountInfo>, ClientError> {
        let token = self.tokens.token();
        let account_ids =
            with_deadline(self.call_timeout, self.gateway.token_details(&token)).await?;

        let mut accounts = Vec::with_capacity(account_ids.len());
        for account_id in account_ids {
            match self.fetch_account(&account_id).await {
                Ok(snapshot) => accounts.push(account_info(&account_id, &snapshot)),
                Err(e) => tracing::warn!(account_id = %account_id, error = %e, "Failed to get account"),
            }
        }

        Ok(accounts)
    }

    /// Account summary and its non-flat positions.
    ///
    /// # Errors
    ///
    /// Returns the gateway error when the account cannot be fetched.
    pub async fn get_account_details(
        &self,
        account_id: &str,
    ) -> Result<(AccountInfo, Vec<Position>), ClientError> {
        let snapshot = self.fetch_account(account_id).await?;
        let info = account_info(account_id, &snapshot);

        let mut positions = Vec::with_capacity(snapshot.positions.len());
        for raw in snapshot.positions {
            if raw.quantity.is_zero() {
                continue;
            }
            positions.push(self.position(account_id, raw).await);
        }

        Ok((info, positions))
    }

    async fn fetch_account(&self, account_id: &str) -> Result<AccountSnapshot, GatewayError> {
        let token = self.tokens.token();
        with_deadline(
            self.call_timeout,
            self.gateway.get_account(&token, account_id),
        )
        .await
    }

    async fn position(&self, account_id: &str, raw: RawPosition) -> Position {
        let symbol = self.resolver.resolve(&raw.symbol, account_id).await;

        let (ticker, mic) = match split_symbol(&symbol) {
            (ticker, Some(mic)) if is_qualified(&symbol) => (ticker.to_string(), mic.to_string()),
            _ => (raw.symbol.clone(), String::new()),
        };

        let mut name = self.resolver.display_name(&symbol);
        if name.is_empty() {
            name = self.resolver.display_name(&ticker);
        }

        Position {
            lot_size: self.resolver.lot_size(&ticker),
            symbol,
            ticker,
            mic,
            name,
            quantity: raw.quantity,
            average_price: raw.average_price,
            current_price: raw.current_price,
            daily_pnl: raw.daily_pnl,
            unrealized_pnl: raw.unrealized_pnl,
        }
    }

    // -------------------------------------------------------------------------
    // Market Data
    // -------------------------------------------------------------------------

    /// Full quotes keyed by resolved qualified symbol.
    ///
    /// Tickers that do not resolve to a qualified symbol, and quotes that
    /// cannot be fetched, are skipped.
    ///
    /// # Errors
    ///
    /// Currently never fails; the `Result` leaves room for batch-level errors.
    pub async fn get_quotes<S: AsRef<str>>(
        &self,
        account_id: &str,
        tickers: &[S],
    ) -> Result<HashMap<String, Quote>, ClientError> {
        let mut quotes = HashMap::with_capacity(tickers.len());

        for ticker in tickers {
            if let Some(quote) = self.quote_for(account_id, ticker.as_ref()).await {
                quotes.insert(quote.symbol.clone(), quote);
            }
        }

        Ok(quotes)
    }

    /// Price snapshots keyed by the input ticker.
    ///
    /// Only last price, last size, volume, close and timestamp are filled.
    ///
    /// # Errors
    ///
    /// Currently never fails; the `Result` leaves room for batch-level errors.
    pub async fn get_snapshots<S: AsRef<str>>(
        &self,
        account_id: &str,
        tickers: &[S],
    ) -> Result<HashMap<String, Quote>, ClientError> {
        let mut snapshots = HashMap::with_capacity(tickers.len());

        for ticker in tickers {
            let ticker = ticker.as_ref();
            if let Some(quote) = self.quote_for(account_id, ticker).await {
                snapshots.insert(
                    ticker.to_string(),
                    Quote {
                        symbol: quote.symbol,
                        last: quote.last,
                        last_size: quote.last_size,
                        volume: quote.volume,
                        close: quote.close,
                        timestamp: quote.timestamp,
                        ..Quote::default()
                    },
                );
            }
        }

        Ok(snapshots)
    }

    async fn quote_for(&self, account_id: &str, ticker: &str) -> Option<Quote> {
        let symbol = self.resolver.resolve(ticker, account_id).await;
        if !is_qualified(&symbol) {
            tracing::debug!(ticker, "Skipping quote for unresolved ticker");
            return None;
        }

        let token = self.tokens.token();
        match with_deadline(self.call_timeout, self.gateway.last_quote(&token, &symbol)).await {
            Ok(Some(quote)) => Some(Quote { symbol, ..quote }),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(symbol = %symbol, error = %e, "Failed to get quote");
                None
            }
        }
    }

    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------

    /// Place a market order for `lots` lots.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] for an unknown side or a
    /// non-positive lot count (before any gateway call) or a lot count too
    /// large to convert into units (before the order is sent), or the
    /// gateway error when the order is refused.
    pub async fn place_order(
        &self,
        account_id: &str,
        ticker: &str,
        side: &str,
        lots: Decimal,
    ) -> Result<String, ClientError> {
        let side: OrderSide = side.parse()?;
        self.submit(account_id, ticker, side, lots).await
    }

    /// Close all or part of a position.
    ///
    /// Long positions are closed with a sell, short positions with a buy.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] when the direction cannot be
    /// inferred from `current_quantity` or `close_lots` is not positive.
    pub async fn close_position(
        &self,
        account_id: &str,
        ticker: &str,
        current_quantity: &str,
        close_lots: Decimal,
    ) -> Result<String, ClientError> {
        let side = OrderSide::closing(current_quantity)?;
        self.submit(account_id, ticker, side, close_lots).await
    }

    async fn submit(
        &self,
        account_id: &str,
        ticker: &str,
        side: OrderSide,
        lots: Decimal,
    ) -> Result<String, ClientError> {
        let lots = ensure_positive_lots(lots)?;

        let symbol = self.resolver.resolve(ticker, account_id).await;
        tracing::debug!(input = ticker, resolved = %symbol, "Order symbol resolved");

        let lot_size = [ticker, symbol.as_str()]
            .into_iter()
            .map(|key| self.resolver.lot_size(key))
            .find(|lot| *lot > Decimal::ZERO);
        let quantity = lots_to_units(lots, lot_size)?.normalize();

        if let Some(lot_size) = lot_size {
            tracing::debug!(%lots, %lot_size, %quantity, "Converted lots to units");
        }

        let request = OrderRequest::market(
            account_id.to_string(),
            symbol,
            side,
            quantity,
            uuid::Uuid::new_v4().to_string(),
        );

        let token = self.tokens.token();
        let order_id =
            with_deadline(self.call_timeout, self.gateway.place_order(&token, request)).await?;

        metrics::record_order_submitted(side);
        tracing::info!(account_id, ticker, %side, %quantity, order_id = %order_id, "Order placed");

        Ok(order_id)
    }

    /// Orders of an account.
    ///
    /// # Errors
    ///
    /// Returns the gateway error when the orders cannot be fetched.
    pub async fn get_active_orders(&self, account_id: &str) -> Result<Vec<Order>, ClientError> {
        let token = self.tokens.token();
        let orders =
            with_deadline(self.call_timeout, self.gateway.get_orders(&token, account_id)).await?;
        Ok(orders)
    }

    /// Fills of the last 30 days.
    ///
    /// # Errors
    ///
    /// Returns the gateway error when the history cannot be fetched.
    pub async fn get_trade_history(&self, account_id: &str) -> Result<Vec<Trade>, ClientError> {
        let window = TimeWindow::trailing_days(Utc::now(), TRADE_HISTORY_DAYS);
        let token = self.tokens.token();
        let records = with_deadline(
            self.call_timeout,
            self.gateway.trades(&token, account_id, window),
        )
        .await?;

        Ok(records
            .into_iter()
            .map(|r| Trade {
                total: trade_total(&r.price, &r.size),
                id: r.trade_id,
                symbol: r.symbol,
                side: r.side,
                price: r.price,
                quantity: r.size,
                timestamp: r.timestamp,
            })
            .collect())
    }

    // -------------------------------------------------------------------------
    // Instrument Metadata
    // -------------------------------------------------------------------------

    /// Search the instrument catalog by ticker or name.
    #[must_use]
    pub fn search_securities(&self, query: &str) -> Vec<SecurityInfo> {
        self.resolver.search(query)
    }

    /// Cached lot size; zero when unknown.
    #[must_use]
    pub fn get_lot_size(&self, ticker: &str) -> Decimal {
        self.resolver.lot_size(ticker)
    }

    /// Cached instrument name; empty when unknown.
    #[must_use]
    pub fn get_instrument_name(&self, key: &str) -> String {
        self.resolver.display_name(key)
    }

    /// Remember an instrument name learned elsewhere (e.g. from a search).
    pub fn record_instrument_name(&self, ticker: &str, full_symbol: &str, name: &str) {
        self.resolver.record_name(ticker, full_symbol, name);
    }
}

fn account_info(account_id: &str, snapshot: &AccountSnapshot) -> AccountInfo {
    AccountInfo {
        id: account_id.to_string(),
        account_type: snapshot.account_type.clone(),
        status: snapshot.status.clone(),
        equity: snapshot.equity.clone(),
        unrealized_pnl: snapshot.unrealized_profit.clone(),
        open_date: snapshot.open_date,
    }
}
