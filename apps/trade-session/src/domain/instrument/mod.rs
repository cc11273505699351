//! Instrument Resolution Types
//!
//! Symbol helpers and the concurrent instrument table used to turn short
//! tickers into exchange-qualified symbols (`TICKER@MIC`), lot sizes and
//! display names.
//!
//! # Design
//!
//! The table keeps one entry per lookup key. A resolved instrument is stored
//! under both its bare ticker and its qualified symbol, so later lookups
//! by either form are served locally. Entries are created lazily or in bulk
//! and updated in place; nothing is evicted during a session.
//!
//! The security index is a separate ordered snapshot, replaced wholesale by
//! every bulk load and used only for substring search.

use std::collections::HashMap;

use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Maximum number of results returned by [`InstrumentCache::search`].
pub const SEARCH_LIMIT: usize = 50;

/// Separator between ticker and market identifier code.
const MIC_SEPARATOR: char = '@';

// =============================================================================
// Symbol Helpers
// =============================================================================

/// Check whether a key is an exchange-qualified symbol (`TICKER@MIC`).
///
/// Both the ticker and the MIC must be non-empty.
#[must_use]
pub fn is_qualified(key: &str) -> bool {
    matches!(split_symbol(key), (ticker, Some(_)) if !ticker.is_empty())
}

/// Split a key into its ticker and optional MIC.
///
/// An empty MIC (`"SBER@"`) is treated as absent.
#[must_use]
pub fn split_symbol(key: &str) -> (&str, Option<&str>) {
    match key.split_once(MIC_SEPARATOR) {
        Some((ticker, mic)) if !mic.is_empty() => (ticker, Some(mic)),
        Some((ticker, _)) => (ticker, None),
        None => (key, None),
    }
}

/// Build a qualified symbol from a ticker and a MIC.
#[must_use]
pub fn qualify(ticker: &str, mic: &str) -> String {
    format!("{ticker}{MIC_SEPARATOR}{mic}")
}

// =============================================================================
// Entries
// =============================================================================

/// Cached facts about one instrument.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstrumentEntry {
    /// Exchange-qualified symbol, when known.
    pub full_symbol: Option<String>,
    /// Units per lot, when known. Always positive.
    pub lot_size: Option<Decimal>,
    /// Human-readable instrument name, when known.
    pub display_name: Option<String>,
}

/// A searchable security from the bulk catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityInfo {
    /// Exchange ticker as listed by the gateway.
    pub ticker: String,
    /// Qualified symbol (or the raw listing symbol when no MIC was known).
    pub symbol: String,
    /// Instrument name.
    pub name: String,
}

impl SecurityInfo {
    /// Build an index entry from a catalog listing.
    ///
    /// The full symbol is the listing symbol when already qualified,
    /// otherwise `ticker@mic` when both are present, otherwise the raw
    /// listing symbol.
    #[must_use]
    pub fn from_listing(symbol: &str, ticker: &str, mic: &str, name: &str) -> Self {
        let full_symbol = if !is_qualified(symbol) && !ticker.is_empty() && !mic.is_empty() {
            qualify(ticker, mic)
        } else {
            symbol.to_string()
        };

        Self {
            ticker: ticker.to_string(),
            symbol: full_symbol,
            name: name.to_string(),
        }
    }

    fn matches(&self, needle: &str) -> bool {
        self.ticker.to_lowercase().contains(needle) || self.name.to_lowercase().contains(needle)
    }
}

// =============================================================================
// Cache State
// =============================================================================

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, InstrumentEntry>,
    index: Vec<SecurityInfo>,
}

impl CacheState {
    fn entry_mut(&mut self, key: &str) -> &mut InstrumentEntry {
        self.entries.entry(key.to_string()).or_default()
    }

    fn lot_size(&self, key: &str) -> Option<Decimal> {
        let entry = self.entries.get(key)?;
        entry.lot_size.or_else(|| {
            entry
                .full_symbol
                .as_deref()
                .and_then(|full| self.entries.get(full))
                .and_then(|e| e.lot_size)
        })
    }

    fn ingest(&mut self, info: &SecurityInfo) {
        if !info.ticker.is_empty() {
            if is_qualified(&info.symbol) {
                self.entry_mut(&info.ticker).full_symbol = Some(info.symbol.clone());
            }

            // A qualified ticker also maps its bare part.
            if is_qualified(&info.ticker) {
                let (bare, _) = split_symbol(&info.ticker);
                self.entry_mut(bare).full_symbol = Some(info.ticker.clone());
            }
        }

        if !info.name.is_empty() {
            for key in [info.ticker.as_str(), info.symbol.as_str()] {
                if !key.is_empty() {
                    self.entry_mut(key).display_name = Some(info.name.clone());
                }
            }
        }
    }
}

// =============================================================================
// Instrument Cache
// =============================================================================

/// Thread-safe instrument table plus the security search index.
///
/// All mutation happens under a single write lock and never spans I/O;
/// callers resolve misses outside the cache and record the result.
///
/// # Example
///
/// ```rust
/// use rust_decimal::Decimal;
/// use trade_session::domain::instrument::InstrumentCache;
///
/// let cache = InstrumentCache::new();
/// cache.record_resolution("SBER", "SBER@MISX", Some(Decimal::TEN));
///
/// assert_eq!(cache.full_symbol("SBER").as_deref(), Some("SBER@MISX"));
/// assert_eq!(cache.lot_size("SBER@MISX"), Some(Decimal::TEN));
/// ```
#[derive(Debug, Default)]
pub struct InstrumentCache {
    state: RwLock<CacheState>,
}

impl InstrumentCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the entry stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<InstrumentEntry> {
        self.state.read().entries.get(key).cloned()
    }

    /// Cached qualified symbol for `key`.
    #[must_use]
    pub fn full_symbol(&self, key: &str) -> Option<String> {
        self.state
            .read()
            .entries
            .get(key)
            .and_then(|e| e.full_symbol.clone())
    }

    /// Cached lot size: direct key first, then through the cached full symbol.
    #[must_use]
    pub fn lot_size(&self, key: &str) -> Option<Decimal> {
        self.state.read().lot_size(key)
    }

    /// Cached display name for a ticker or a qualified symbol.
    #[must_use]
    pub fn display_name(&self, key: &str) -> Option<String> {
        self.state
            .read()
            .entries
            .get(key)
            .and_then(|e| e.display_name.clone())
    }

    /// Record a resolved instrument under both its ticker and its symbol.
    ///
    /// Lot sizes that are not strictly positive are ignored.
    pub fn record_resolution(&self, ticker: &str, full_symbol: &str, lot_size: Option<Decimal>) {
        let lot_size = lot_size.filter(|lot| lot.is_sign_positive() && !lot.is_zero());
        let mut state = self.state.write();

        let entry = state.entry_mut(ticker);
        entry.full_symbol = Some(full_symbol.to_string());
        if lot_size.is_some() {
            entry.lot_size = lot_size;
        }

        if full_symbol != ticker {
            let entry = state.entry_mut(full_symbol);
            entry.full_symbol = Some(full_symbol.to_string());
            if lot_size.is_some() {
                entry.lot_size = lot_size;
            }
        }
    }

    /// Record a lot size under every non-empty key.
    ///
    /// Non-positive values are ignored.
    pub fn record_lot_size<'a>(&self, keys: impl IntoIterator<Item = &'a str>, lot_size: Decimal) {
        if lot_size <= Decimal::ZERO {
            return;
        }

        let mut state = self.state.write();
        for key in keys {
            if !key.is_empty() {
                state.entry_mut(key).lot_size = Some(lot_size);
            }
        }
    }

    /// Record a display name under both the ticker and the full symbol.
    ///
    /// No-op when `name` is empty; empty keys are skipped.
    pub fn record_name(&self, ticker: &str, full_symbol: &str, name: &str) {
        if name.is_empty() {
            return;
        }

        let mut state = self.state.write();
        for key in [ticker, full_symbol] {
            if !key.is_empty() {
                state.entry_mut(key).display_name = Some(name.to_string());
            }
        }
    }

    /// Fill the table from a catalog and replace the search index.
    ///
    /// Runs as a single write-locked pass. Returns the number of listings.
    pub fn load_catalog(&self, listings: Vec<SecurityInfo>) -> usize {
        let count = listings.len();
        let mut state = self.state.write();

        for info in &listings {
            state.ingest(info);
        }
        state.index = listings;

        count
    }

    /// Case-insensitive substring search on ticker or name.
    ///
    /// Results keep index order and are capped at [`SEARCH_LIMIT`]. An empty
    /// query matches every security.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<SecurityInfo> {
        let needle = query.to_lowercase();
        self.state
            .read()
            .index
            .iter()
            .filter(|info| info.matches(&needle))
            .take(SEARCH_LIMIT)
            .cloned()
            .collect()
    }

    /// Number of securities in the search index.
    #[must_use]
    pub fn index_len(&self) -> usize {
        self.state.read().index.len()
    }
}

// =============================================================================
// Tests
// =============================================================================
