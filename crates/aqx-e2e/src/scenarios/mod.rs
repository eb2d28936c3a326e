//! The scenario catalogue and the steps scenarios share.

mod auth;
mod notifications;
mod positions;
mod trading;

use crate::config::SuiteConfig;
use crate::driver::PageDriver;
use crate::pages::{LoginPage, TradePage};
use crate::parser::ParsedTable;
use crate::records::{OrderTicket, OrderType, PositionRecord, Quote, TradeSide};
use crate::result::Lookup;
use crate::scenario::{ensure, Category, Scenario, ScenarioError, ScenarioResult};
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Every scenario, in run order
#[must_use]
pub fn catalogue() -> Vec<Scenario> {
    auth::SCENARIOS
        .iter()
        .chain(trading::SCENARIOS.iter())
        .chain(positions::SCENARIOS.iter())
        .chain(notifications::SCENARIOS.iter())
        .copied()
        .collect()
}

/// Look up a scenario by id, case-insensitively
#[must_use]
pub fn find(id: &str) -> Option<Scenario> {
    catalogue()
        .into_iter()
        .find(|s| s.id.eq_ignore_ascii_case(id.trim()))
}

/// Scenarios of one category
#[must_use]
pub fn by_category(category: Category) -> Vec<Scenario> {
    catalogue()
        .into_iter()
        .filter(|s| s.category == category)
        .collect()
}

fn require_credentials(config: &SuiteConfig) -> ScenarioResult {
    if config.has_credentials() {
        Ok(())
    } else {
        Err(ScenarioError::config(
            "username and password are required (--username/--password or AQX_USERNAME/AQX_PASSWORD)",
        ))
    }
}

/// Log in with the configured account and land on a loaded trade page
async fn login_to_trade<'a>(
    driver: &'a dyn PageDriver,
    config: &'a SuiteConfig,
) -> ScenarioResult<TradePage<'a>> {
    require_credentials(config)?;
    let options = config.page_options();

    let login = LoginPage::new(driver, &config.base_url, options);
    login.open().await?;
    login.login(&config.username, &config.password).await?;
    ensure(
        login.wait_for_success(config.timeout).await,
        "login should show the welcome announcement",
    )?;

    let trade = TradePage::new(driver, &config.base_url, options);
    trade.open().await?;
    ensure(
        trade.verify_page_loaded().await,
        "trade page should show the chart and order buttons",
    )?;
    Ok(trade)
}

/// An order sent from the order panel
#[derive(Debug, Clone, PartialEq)]
struct Submission {
    ticket: OrderTicket,
    /// Order numbers the target table listed just before submitting
    known_ids: BTreeSet<String>,
}

/// What happened to an order submission
#[derive(Debug, Clone, PartialEq)]
enum Placement {
    /// Order panel submitted
    Submitted(Submission),
    /// Market closed; nothing was submitted
    MarketClosed,
}

/// Ticket for `order_type` around the current `price`.
///
/// Pending entries sit 1 % away from market on the side that keeps them
/// pending: limits below (buy) or above (sell) market, stops the other way.
/// Stop-limit orders put their limit a further 1 % beyond the stop.
fn ticket_for(
    config: &SuiteConfig,
    side: TradeSide,
    order_type: OrderType,
    price: Quote,
) -> OrderTicket {
    let (below, above) = (price.scaled(0.99), price.scaled(1.01));
    match (order_type, side) {
        (OrderType::Market, _) => OrderTicket::market(&config.symbol, side, &config.volume),
        (OrderType::Limit, TradeSide::Buy) | (OrderType::Stop, TradeSide::Sell) => {
            OrderTicket::pending(&config.symbol, side, order_type, &config.volume, below)
        }
        (OrderType::Limit, TradeSide::Sell) | (OrderType::Stop, TradeSide::Buy) => {
            OrderTicket::pending(&config.symbol, side, order_type, &config.volume, above)
        }
        (OrderType::StopLimit, TradeSide::Buy) => {
            OrderTicket::pending(&config.symbol, side, order_type, &config.volume, above)
                .with_stop_limit_price(price.scaled(1.02))
        }
        (OrderType::StopLimit, TradeSide::Sell) => {
            OrderTicket::pending(&config.symbol, side, order_type, &config.volume, below)
                .with_stop_limit_price(price.scaled(0.98))
        }
    }
}

/// Open the table an order of `order_type` lands in and return its name
async fn open_target_table(
    trade: &TradePage<'_>,
    order_type: OrderType,
) -> ScenarioResult<&'static str> {
    if order_type.is_pending() {
        trade.open_pending_orders_tab().await?;
        Ok("pending orders")
    } else {
        trade.open_positions_tab().await?;
        Ok("open positions")
    }
}

/// Order numbers in the active table; empty when it cannot be read
async fn listed_order_ids(trade: &TradePage<'_>) -> BTreeSet<String> {
    match trade.read_positions().await {
        Lookup::Found(table) => table.records.into_iter().filter_map(|r| r.order_id).collect(),
        unread => {
            debug!(?unread, "no rows listed before submitting");
            BTreeSet::new()
        }
    }
}

/// Select the configured symbol and submit one order.
///
/// The order numbers already in the target table are recorded first so the
/// new row can be told apart from older ones.
async fn submit_order(
    trade: &TradePage<'_>,
    config: &SuiteConfig,
    side: TradeSide,
    order_type: OrderType,
) -> ScenarioResult<Placement> {
    let price = trade.input_symbol(&config.symbol).await?.ok_or_else(|| {
        ScenarioError::assertion(format!("{} should show a current price", config.symbol))
    })?;

    if trade.is_market_closed().await {
        warn!(symbol = %config.symbol, "market closed, order not submitted");
        return Ok(Placement::MarketClosed);
    }

    let ticket = ticket_for(config, side, order_type, price);
    open_target_table(trade, order_type).await?;
    let known_ids = listed_order_ids(trade).await;

    trade.place_order(&ticket).await?;
    trade.settle(1_500).await;
    Ok(Placement::Submitted(Submission { ticket, known_ids }))
}

/// Row for `symbol` on `side`
fn is_order(record: &PositionRecord, symbol: &str, side: TradeSide) -> bool {
    record
        .symbol
        .as_deref()
        .is_some_and(|s| s.eq_ignore_ascii_case(symbol))
        && record.side == Some(side)
}

/// Whether a rendered amount equals `expected` numerically (`"100.00"` is
/// `"100"`)
fn same_amount(cell: Option<&str>, expected: &str) -> bool {
    match (cell.and_then(Quote::parse), Quote::parse(expected)) {
        (Some(listed), Some(expected)) => (listed.value - expected.value).abs() < 1e-9,
        _ => false,
    }
}

/// Whether a rendered price equals `expected` at the precision it was typed
fn same_level(cell: Option<&str>, expected: Quote) -> bool {
    cell.and_then(Quote::parse)
        .is_some_and(|listed| {
            Quote::new(listed.value, expected.decimals).to_string() == expected.to_string()
        })
}

/// Row created by `submission`: an order number that was not listed before,
/// the ticket's symbol, side and volume, and for pending orders an entry
/// price within 1 % of the ticket's when the table shows one
fn is_new_order(record: &PositionRecord, submission: &Submission) -> bool {
    let ticket = &submission.ticket;
    let fresh = record
        .order_id
        .as_deref()
        .is_some_and(|id| !submission.known_ids.contains(id));
    let price_ok = match (ticket.price, record.price.as_deref().and_then(Quote::parse)) {
        (Some(expected), Some(listed)) => {
            (listed.value - expected.value).abs() <= expected.value.abs() * 0.01
        }
        _ => true,
    };
    fresh
        && is_order(record, &ticket.symbol, ticket.side)
        && same_amount(record.volume.as_deref(), &ticket.volume)
        && price_ok
}

/// Re-read the active table until `pred` holds or the timeout runs out, and
/// return the last read. `pred` only sees tables that were actually read.
async fn await_table(
    trade: &TradePage<'_>,
    config: &SuiteConfig,
    pred: impl Fn(&ParsedTable) -> bool + Send + Sync,
) -> Lookup<ParsedTable> {
    let start = Instant::now();
    loop {
        let table = trade.read_positions().await;
        let done = matches!(&table, Lookup::Found(t) if pred(t));
        if done || start.elapsed() >= config.timeout {
            return table;
        }
        tokio::time::sleep(config.poll_interval).await;
    }
}

/// Re-read the active table until a row satisfies `pred`
async fn await_row(
    trade: &TradePage<'_>,
    config: &SuiteConfig,
    pred: impl Fn(&PositionRecord) -> bool + Send + Sync,
) -> Option<PositionRecord> {
    let table = await_table(trade, config, |t| t.records.iter().any(|r| pred(r)))
        .await
        .found()?;
    let row = table.records.into_iter().find(|r| pred(r))?;
    info!(order_id = ?row.order_id, "row found");
    Some(row)
}

/// Open a market position and return its new table row
async fn open_market_position(
    trade: &TradePage<'_>,
    config: &SuiteConfig,
    side: TradeSide,
) -> ScenarioResult<Option<PositionRecord>> {
    match submit_order(trade, config, side, OrderType::Market).await? {
        Placement::MarketClosed => Ok(None),
        Placement::Submitted(submission) => {
            trade.open_positions_tab().await?;
            let row = await_row(trade, config, |r| is_new_order(r, &submission))
                .await
                .ok_or_else(|| {
                    ScenarioError::assertion(format!(
                        "open positions should list a new {side} {} position of volume {}",
                        config.symbol, submission.ticket.volume
                    ))
                })?;
            Ok(Some(row))
        }
    }
}
