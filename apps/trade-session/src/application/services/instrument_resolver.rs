//! Instrument Resolver
//!
//! Read-through layer over [`InstrumentCache`]: serves lookups locally and
//! falls back to the gateway's `GetAsset` on a miss, memoizing the result.
//!
//! Resolution is lenient. A failed lookup is logged and the best-known
//! symbol is returned, so callers always get something to send; the
//! gateway then decides whether it accepts it.
//!
//! Duplicate concurrent lookups for the same ticker are not coalesced.
//! Each performs its own remote call and the last writer wins, which is
//! harmless because both write the same facts.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;

use super::token_manager::TokenManager;
use super::with_deadline;
use crate::application::ports::{AssetDetails, GatewayError, TradingGateway};
use crate::domain::instrument::{InstrumentCache, SecurityInfo, is_qualified, qualify};
use crate::domain::trading::WireDecimal;
use crate::infrastructure::metrics::{self, LookupOutcome};

/// Resolves tickers to qualified symbols and lot sizes.
pub struct InstrumentResolver {
    cache: Arc<InstrumentCache>,
    gateway: Arc<dyn TradingGateway>,
    tokens: Arc<TokenManager>,
    call_timeout: Duration,
}

impl std::fmt::Debug for InstrumentResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstrumentResolver")
            .field("indexed", &self.cache.index_len())
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

impl InstrumentResolver {
    /// Create a resolver over an existing cache.
    #[must_use]
    pub fn new(
        cache: Arc<InstrumentCache>,
        gateway: Arc<dyn TradingGateway>,
        tokens: Arc<TokenManager>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            cache,
            gateway,
            tokens,
            call_timeout,
        }
    }

    /// The underlying cache.
    #[must_use]
    pub fn cache(&self) -> &InstrumentCache {
        &self.cache
    }

    /// Resolve a ticker (or qualified symbol) to its qualified symbol.
    ///
    /// Never fails. On a gateway error the cached qualified symbol is
    /// returned if there is one, otherwise the input unchanged.
    pub async fn resolve(&self, ticker: &str, account_hint: &str) -> String {
        if is_qualified(ticker) {
            if self.cache.lot_size(ticker).is_none() {
                self.fetch_lot_size(ticker, account_hint).await;
            }
            return ticker.to_string();
        }

        let cached = self.cache.full_symbol(ticker);
        let has_lot = self.cache.lot_size(ticker).is_some();

        if let Some(full) = cached.as_deref().filter(|_| has_lot) {
            metrics::record_instrument_lookup(LookupOutcome::Hit);
            return full.to_string();
        }

        tracing::debug!(
            ticker,
            has_symbol = cached.is_some(),
            has_lot,
            "Instrument cache miss"
        );

        let fetch_symbol = cached.as_deref().unwrap_or(ticker);
        let best_known = || cached.clone().unwrap_or_else(|| ticker.to_string());

        let details = match self.get_asset(fetch_symbol, account_hint).await {
            Ok(details) => details,
            Err(e) => {
                metrics::record_instrument_lookup(LookupOutcome::Degraded);
                tracing::warn!(symbol = fetch_symbol, error = %e, "Failed to fetch asset");
                return best_known();
            }
        };

        if details.ticker.is_empty() || details.board.is_empty() {
            metrics::record_instrument_lookup(LookupOutcome::Degraded);
            tracing::debug!(symbol = fetch_symbol, "Asset response lacks ticker or board");
            return best_known();
        }

        let full = qualify(&details.ticker, &details.board);
        let lot_size = parse_lot_size(&details.lot_size, ticker);
        self.cache.record_resolution(ticker, &full, lot_size);
        self.cache.record_name(ticker, &full, &details.name);
        metrics::record_instrument_lookup(LookupOutcome::Resolved);

        tracing::debug!(
            ticker,
            resolved = %full,
            lot_size = ?lot_size,
            raw_lot_size = %details.lot_size,
            "Resolved instrument via gateway"
        );

        full
    }

    /// Cached lot size; zero when unknown.
    #[must_use]
    pub fn lot_size(&self, ticker: &str) -> Decimal {
        self.cache.lot_size(ticker).unwrap_or(Decimal::ZERO)
    }

    /// Cached display name; empty when unknown.
    #[must_use]
    pub fn display_name(&self, key: &str) -> String {
        self.cache.display_name(key).unwrap_or_default()
    }

    /// Store a display name under both the ticker and the symbol.
    pub fn record_name(&self, ticker: &str, full_symbol: &str, name: &str) {
        self.cache.record_name(ticker, full_symbol, name);
    }

    /// Search the security index.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<SecurityInfo> {
        self.cache.search(query)
    }

    /// Bulk-load the instrument catalog.
    ///
    /// # Errors
    ///
    /// Returns the gateway error when the catalog call fails; the cache is
    /// left untouched in that case.
    pub async fn load_all(&self) -> Result<usize, GatewayError> {
        let token = self.tokens.token();
        let assets = with_deadline(self.call_timeout, self.gateway.assets(&token)).await?;

        let listings = assets
            .iter()
            .map(|a| SecurityInfo::from_listing(&a.symbol, &a.ticker, &a.mic, &a.name))
            .collect();

        let count = self.cache.load_catalog(listings);
        metrics::record_catalog_load(count);
        tracing::info!(count, "Loaded instruments into cache");

        Ok(count)
    }

    async fn get_asset(
        &self,
        symbol: &str,
        account_id: &str,
    ) -> Result<AssetDetails, GatewayError> {
        let token = self.tokens.token();
        with_deadline(
            self.call_timeout,
            self.gateway.get_asset(&token, symbol, account_id),
        )
        .await
    }

    async fn fetch_lot_size(&self, symbol: &str, account_id: &str) {
        let details = match self.get_asset(symbol, account_id).await {
            Ok(details) => details,
            Err(e) => {
                metrics::record_instrument_lookup(LookupOutcome::Degraded);
                tracing::warn!(symbol, error = %e, "Failed to fetch lot size");
                return;
            }
        };

        if let Some(lot_size) = parse_lot_size(&details.lot_size, symbol) {
            self.cache
                .record_lot_size([symbol, details.ticker.as_str()], lot_size);
            metrics::record_instrument_lookup(LookupOutcome::Resolved);
            tracing::debug!(symbol, %lot_size, "Fetched lot size");
        }
    }
}

/// Parse a lot size, logging values that cannot be used.
fn parse_lot_size(raw: &WireDecimal, key: &str) -> Option<Decimal> {
    raw.raw()?;

    match raw.parse() {
        Some(lot) if lot > Decimal::ZERO => Some(lot),
        Some(lot) => {
            tracing::warn!(key, %lot, "Ignoring non-positive lot size");
            None
        }
        None => {
            tracing::warn!(key, raw = %raw, "Failed to parse lot size");
            None
        }
    }
}
