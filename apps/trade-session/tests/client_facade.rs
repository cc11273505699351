//! Client Facade Integration Tests
//!
//! Session startup, account and position views, quotes, order placement
//! rules and trade history through [`TradeSessionClient`].

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use common::{FakeGateway, account};
use rust_decimal::Decimal;
use trade_session::application::ports::TradeRecord;
use trade_session::{
    AuthError, ClientError, Order, OrderSide, OrderStatus, OrderType, Quote, SessionSettings,
    TradeSessionClient, ValidationError, WireDecimal,
};

async fn start(fake: &Arc<FakeGateway>) -> TradeSessionClient {
    TradeSessionClient::start(fake.as_port(), "secret", SessionSettings::default())
        .await
        .unwrap()
}

/// Gateway knowing SBER (lot 10) and GAZP (lot 1) on TQBR.
fn market() -> Arc<FakeGateway> {
    let fake = FakeGateway::new();
    fake.add_asset(&["SBER", "SBER@TQBR"], "SBER", "TQBR", Some("10"), "Sberbank");
    fake.add_asset(&["GAZP", "GAZP@TQBR"], "GAZP", "TQBR", Some("1"), "Gazprom");
    fake
}

// =============================================================================
// Session Lifecycle
// =============================================================================

#[tokio::test]
async fn start_warms_the_catalog() {
    let fake = market();
    fake.add_listing("SBER@TQBR", "SBER", "TQBR", "Sberbank");
    fake.add_listing("GAZP@TQBR", "GAZP", "TQBR", "Gazprom");

    let client = start(&fake).await;

    assert!(client.tokens().is_refreshing());
    assert_eq!(client.search_securities("gaz").len(), 1);
    assert_eq!(client.get_instrument_name("SBER"), "Sberbank");

    client.close().await;
}

#[tokio::test]
async fn catalog_failure_does_not_fail_startup() {
    let fake = market();
    fake.fail_assets(true);

    let client = start(&fake).await;

    assert!(client.search_securities("").is_empty());
    client.close().await;
}

#[tokio::test]
async fn rejected_secret_fails_startup() {
    let fake = market();

    let result = TradeSessionClient::start(fake.as_port(), "", SessionSettings::default()).await;

    assert!(matches!(
        result,
        Err(ClientError::Auth(AuthError::Rejected(_)))
    ));
}

#[tokio::test(start_paused = true)]
async fn close_stops_token_renewal() {
    let fake = market();
    fake.set_token_lifetime(60);

    let client = start(&fake).await;
    client.close().await;

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(fake.auth_count(), 1);
}

// =============================================================================
// Accounts
// =============================================================================

#[tokio::test]
async fn accounts_that_fail_are_skipped() {
    let fake = market();
    fake.add_account(account("A1", &[]));
    fake.add_account_id("A2");

    let client = start(&fake).await;
    let accounts = client.get_accounts().await.unwrap();

    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].id, "A1");
    assert_eq!(accounts[0].equity.to_string(), "100000.00");
    assert_eq!(accounts[0].unrealized_pnl.to_string(), "1250.50");
}

#[tokio::test]
async fn account_details_drop_flat_positions() {
    let fake = market();
    fake.add_account(account("A1", &[("SBER", "20"), ("GAZP", "0"), ("LKOH", "-5")]));
    fake.add_asset(&["LKOH"], "LKOH", "TQBR", Some("1"), "");

    let client = start(&fake).await;
    let (info, positions) = client.get_account_details("A1").await.unwrap();

    assert_eq!(info.id, "A1");
    assert_eq!(positions.len(), 2);

    let sber = &positions[0];
    assert_eq!(sber.symbol, "SBER@TQBR");
    assert_eq!(sber.ticker, "SBER");
    assert_eq!(sber.mic, "TQBR");
    assert_eq!(sber.name, "Sberbank");
    assert_eq!(sber.lot_size, Decimal::from(10));
    assert_eq!(sber.quantity.raw(), Some("20"));
    assert_eq!(sber.daily_pnl.to_string(), "N/A");

    // no name known anywhere
    assert_eq!(positions[1].symbol, "LKOH@TQBR");
    assert_eq!(positions[1].name, "");

    // the flat GAZP position was never resolved
    assert!(!fake.asset_requests.lock().iter().any(|s| s.starts_with("GAZP")));
}

#[tokio::test]
async fn unresolvable_position_keeps_raw_symbol() {
    let fake = market();
    fake.add_account(account("A1", &[("DELISTED", "3")]));

    let client = start(&fake).await;
    let (_, positions) = client.get_account_details("A1").await.unwrap();

    assert_eq!(positions[0].symbol, "DELISTED");
    assert_eq!(positions[0].ticker, "DELISTED");
    assert_eq!(positions[0].mic, "");
    assert_eq!(positions[0].lot_size, Decimal::ZERO);
}

#[tokio::test]
async fn missing_account_is_an_error() {
    let fake = market();
    let client = start(&fake).await;

    let result = client.get_account_details("NOPE").await;
    assert!(matches!(result, Err(ClientError::Gateway(_))));
}

// =============================================================================
// Market Data
// =============================================================================

fn quote(last: &str) -> Quote {
    Quote {
        symbol: "ignored".to_string(),
        bid: WireDecimal::present("250.10"),
        ask: WireDecimal::present("250.20"),
        last: WireDecimal::present(last),
        volume: WireDecimal::present("1000000"),
        close: WireDecimal::present("249.00"),
        ..Quote::default()
    }
}

#[tokio::test]
async fn quotes_are_keyed_by_resolved_symbol() {
    let fake = market();
    fake.add_quote("SBER@TQBR", quote("250.15"));

    let client = start(&fake).await;
    let quotes = client
        .get_quotes("A1", &["SBER", "GAZP", "UNKNOWN"])
        .await
        .unwrap();

    // GAZP has no quote, UNKNOWN does not resolve
    assert_eq!(quotes.len(), 1);
    let sber = &quotes["SBER@TQBR"];
    assert_eq!(sber.symbol, "SBER@TQBR");
    assert_eq!(sber.last.raw(), Some("250.15"));
    assert_eq!(fake.quote_calls.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[tokio::test]
async fn snapshots_keep_input_keys_and_price_fields() {
    let fake = market();
    fake.add_quote("SBER@TQBR", quote("250.15"));

    let client = start(&fake).await;
    let snapshots = client.get_snapshots("A1", &["SBER".to_string()]).await.unwrap();

    let sber = &snapshots["SBER"];
    assert_eq!(sber.symbol, "SBER@TQBR");
    assert_eq!(sber.last.raw(), Some("250.15"));
    assert_eq!(sber.close.raw(), Some("249.00"));
    assert_eq!(sber.bid, WireDecimal::absent());
    assert_eq!(sber.ask.to_string(), "N/A");
}

// =============================================================================
// Orders
// =============================================================================

#[tokio::test]
async fn lots_are_converted_to_units() {
    let fake = market();
    let client = start(&fake).await;

    let order_id = client
        .place_order("A1", "SBER", "Buy", Decimal::from(3))
        .await
        .unwrap();

    assert_eq!(order_id, "order-1");
    let placed = fake.placed.lock();
    assert_eq!(placed[0].account_id, "A1");
    assert_eq!(placed[0].symbol, "SBER@TQBR");
    assert_eq!(placed[0].side, OrderSide::Buy);
    assert_eq!(placed[0].quantity, Decimal::from(30));
    assert!(uuid::Uuid::parse_str(&placed[0].client_order_id).is_ok());
}

#[tokio::test]
async fn unknown_lot_size_sends_lots_unchanged() {
    let fake = market();
    fake.add_asset(&["NEWCO"], "NEWCO", "TQBR", None, "New Company");
    let client = start(&fake).await;

    client
        .place_order("A1", "NEWCO", "sell", Decimal::from(7))
        .await
        .unwrap();

    let placed = fake.placed.lock();
    assert_eq!(placed[0].symbol, "NEWCO@TQBR");
    assert_eq!(placed[0].side, OrderSide::Sell);
    assert_eq!(placed[0].quantity, Decimal::from(7));
}

#[tokio::test]
async fn invalid_side_is_rejected_before_any_call() {
    let fake = market();
    let client = start(&fake).await;

    let result = client.place_order("A1", "SBER", "hold", Decimal::ONE).await;

    assert_eq!(
        result,
        Err(ClientError::Validation(ValidationError::InvalidSide(
            "hold".to_string()
        )))
    );
    assert_eq!(fake.get_asset_count(), 0);
    assert!(fake.placed.lock().is_empty());
}

#[tokio::test]
async fn non_positive_lots_are_rejected() {
    let fake = market();
    let client = start(&fake).await;

    for lots in [Decimal::ZERO, Decimal::NEGATIVE_ONE] {
        let result = client.place_order("A1", "SBER", "buy", lots).await;
        assert!(result.unwrap_err().is_validation());
    }
    assert_eq!(fake.get_asset_count(), 0);
    assert!(fake.placed.lock().is_empty());
}

#[tokio::test]
async fn oversized_lot_count_is_rejected_before_the_order() {
    let fake = market();
    let client = start(&fake).await;

    let result = client.place_order("A1", "SBER", "buy", Decimal::MAX).await;

    assert_eq!(
        result,
        Err(ClientError::Validation(ValidationError::QuantityOverflow {
            lots: Decimal::MAX,
            lot_size: Decimal::from(10),
        }))
    );
    assert!(fake.placed.lock().is_empty());
}

#[tokio::test]
async fn closing_infers_direction_from_quantity() {
    let fake = market();
    let client = start(&fake).await;

    client
        .close_position("A1", "SBER", "20", Decimal::ONE)
        .await
        .unwrap();
    client
        .close_position("A1", "GAZP", "-15", Decimal::from(5))
        .await
        .unwrap();

    let placed = fake.placed.lock();
    assert_eq!(placed[0].side, OrderSide::Sell);
    assert_eq!(placed[0].quantity, Decimal::from(10));
    assert_eq!(placed[1].side, OrderSide::Buy);
    assert_eq!(placed[1].quantity, Decimal::from(5));
}

#[tokio::test]
async fn flat_or_unreadable_position_cannot_be_closed() {
    let fake = market();
    let client = start(&fake).await;

    for quantity in ["0", "", "abc"] {
        let result = client.close_position("A1", "SBER", quantity, Decimal::ONE).await;
        assert!(matches!(
            result,
            Err(ClientError::Validation(ValidationError::IndeterminateDirection(_)))
        ));
    }
    assert!(fake.placed.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn orders_use_the_renewed_token() {
    let fake = market();
    fake.set_token_lifetime(60);
    let client = start(&fake).await;

    client
        .place_order("A1", "SBER", "buy", Decimal::ONE)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    client
        .place_order("A1", "SBER", "buy", Decimal::ONE)
        .await
        .unwrap();

    let tokens = fake.order_tokens.lock().clone();
    assert_ne!(tokens[0], tokens[1]);
    assert_eq!(tokens[1], client.tokens().token().as_str());
}

#[tokio::test]
async fn active_orders_pass_through() {
    let fake = market();
    fake.add_order(Order {
        id: "ord-1".to_string(),
        symbol: "SBER@TQBR".to_string(),
        side: Some(OrderSide::Buy),
        order_type: Some(OrderType::Limit),
        status: OrderStatus::PartiallyFilled,
        quantity: WireDecimal::present("10"),
        limit_price: WireDecimal::present("249.50"),
        creation_time: None,
    });
    let client = start(&fake).await;

    let orders = client.get_active_orders("A1").await.unwrap();

    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].status.label(), "Partial");
    assert_eq!(orders[0].price_label(), "249.50");
}

// =============================================================================
// Trade History
// =============================================================================

#[tokio::test]
async fn trade_history_computes_totals_over_thirty_days() {
    let fake = market();
    fake.add_trade(TradeRecord {
        trade_id: "t-1".to_string(),
        symbol: "SBER@TQBR".to_string(),
        side: Some(OrderSide::Buy),
        price: WireDecimal::present("250.5"),
        size: WireDecimal::present("10"),
        timestamp: DateTime::from_timestamp(1_700_000_000, 0),
    });
    fake.add_trade(TradeRecord {
        trade_id: "t-2".to_string(),
        symbol: "GAZP@TQBR".to_string(),
        side: None,
        price: WireDecimal::absent(),
        size: WireDecimal::present("3"),
        timestamp: None,
    });
    let client = start(&fake).await;

    let trades = client.get_trade_history("A1").await.unwrap();

    assert_eq!(trades[0].id, "t-1");
    assert_eq!(trades[0].total, "2505.00");
    assert_eq!(trades[0].quantity.raw(), Some("10"));
    assert_eq!(trades[1].total, "0.00");
    assert_eq!(trades[1].price.to_string(), "N/A");

    let window = fake.trade_windows.lock()[0];
    assert_eq!((window.end - window.start).num_days(), 30);
}

#[tokio::test]
async fn oversized_fill_does_not_break_history() {
    let fake = market();
    fake.add_trade(TradeRecord {
        trade_id: "t-big".to_string(),
        symbol: "SBER@TQBR".to_string(),
        side: Some(OrderSide::Sell),
        price: WireDecimal::present("79228162514264337593543950335"),
        size: WireDecimal::present("2"),
        timestamp: None,
    });
    fake.add_trade(TradeRecord {
        trade_id: "t-small".to_string(),
        symbol: "SBER@TQBR".to_string(),
        side: Some(OrderSide::Buy),
        price: WireDecimal::present("100"),
        size: WireDecimal::present("2"),
        timestamp: None,
    });
    let client = start(&fake).await;

    let trades = client.get_trade_history("A1").await.unwrap();

    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].total, "N/A");
    assert_eq!(trades[1].total, "200.00");
}

// =============================================================================
// Instrument Metadata
// =============================================================================

#[tokio::test]
async fn recorded_names_are_served() {
    let fake = market();
    let client = start(&fake).await;

    client.record_instrument_name("MTSS", "MTSS@TQBR", "MTS");

    assert_eq!(client.get_instrument_name("MTSS"), "MTS");
    assert_eq!(client.get_instrument_name("MTSS@TQBR"), "MTS");
    assert_eq!(client.get_lot_size("MTSS"), Decimal::ZERO);
}
