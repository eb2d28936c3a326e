//! Order placement scenarios, one per order type and side.

use super::{await_row, is_new_order, login_to_trade, open_target_table, submit_order, Placement};
use crate::config::SuiteConfig;
use crate::driver::PageDriver;
use crate::records::{OrderType, TradeSide};
use crate::scenario::{Category, Scenario, ScenarioError, ScenarioFuture, ScenarioResult};
use tracing::{info, warn};

pub(super) const SCENARIOS: [Scenario; 8] = [
    Scenario::new("TRD-001", "Market buy order", Category::Trading, market_buy),
    Scenario::new("TRD-002", "Market sell order", Category::Trading, market_sell),
    Scenario::new("TRD-003", "Limit buy order", Category::Trading, limit_buy),
    Scenario::new("TRD-004", "Limit sell order", Category::Trading, limit_sell),
    Scenario::new("TRD-005", "Stop buy order", Category::Trading, stop_buy),
    Scenario::new("TRD-006", "Stop sell order", Category::Trading, stop_sell),
    Scenario::new(
        "TRD-007",
        "Stop limit buy order",
        Category::Trading,
        stop_limit_buy,
    ),
    Scenario::new(
        "TRD-008",
        "Stop limit sell order",
        Category::Trading,
        stop_limit_sell,
    ),
];

/// Submit one order and check it lands in the right table.
///
/// Market orders must show up under open positions, everything else under
/// pending orders, as a row that was not there before submitting. A closed
/// market passes with a warning.
async fn place_and_verify(
    driver: &dyn PageDriver,
    config: &SuiteConfig,
    side: TradeSide,
    order_type: OrderType,
) -> ScenarioResult {
    let trade = login_to_trade(driver, config).await?;

    let submission = match submit_order(&trade, config, side, order_type).await? {
        Placement::MarketClosed => {
            warn!(%side, %order_type, "market closed, submission checks skipped");
            return Ok(());
        }
        Placement::Submitted(submission) => submission,
    };

    let table = open_target_table(&trade, order_type).await?;
    let row = await_row(&trade, config, |r| is_new_order(r, &submission))
        .await
        .ok_or_else(|| {
            ScenarioError::assertion(format!(
                "{table} should list a new {side} {order_type} {} order of volume {}",
                submission.ticket.symbol, submission.ticket.volume
            ))
        })?;
    info!(order_id = ?row.order_id, table, "order listed");
    Ok(())
}

fn market_buy<'a>(driver: &'a dyn PageDriver, config: &'a SuiteConfig) -> ScenarioFuture<'a> {
    Box::pin(place_and_verify(driver, config, TradeSide::Buy, OrderType::Market))
}

fn market_sell<'a>(driver: &'a dyn PageDriver, config: &'a SuiteConfig) -> ScenarioFuture<'a> {
    Box::pin(place_and_verify(driver, config, TradeSide::Sell, OrderType::Market))
}

fn limit_buy<'a>(driver: &'a dyn PageDriver, config: &'a SuiteConfig) -> ScenarioFuture<'a> {
    Box::pin(place_and_verify(driver, config, TradeSide::Buy, OrderType::Limit))
}

fn limit_sell<'a>(driver: &'a dyn PageDriver, config: &'a SuiteConfig) -> ScenarioFuture<'a> {
    Box::pin(place_and_verify(driver, config, TradeSide::Sell, OrderType::Limit))
}

fn stop_buy<'a>(driver: &'a dyn PageDriver, config: &'a SuiteConfig) -> ScenarioFuture<'a> {
    Box::pin(place_and_verify(driver, config, TradeSide::Buy, OrderType::Stop))
}

fn stop_sell<'a>(driver: &'a dyn PageDriver, config: &'a SuiteConfig) -> ScenarioFuture<'a> {
    Box::pin(place_and_verify(driver, config, TradeSide::Sell, OrderType::Stop))
}

fn stop_limit_buy<'a>(
    driver: &'a dyn PageDriver,
    config: &'a SuiteConfig,
) -> ScenarioFuture<'a> {
    Box::pin(place_and_verify(
        driver,
        config,
        TradeSide::Buy,
        OrderType::StopLimit,
    ))
}

fn stop_limit_sell<'a>(
    driver: &'a dyn PageDriver,
    config: &'a SuiteConfig,
) -> ScenarioFuture<'a> {
    Box::pin(place_and_verify(
        driver,
        config,
        TradeSide::Sell,
        OrderType::StopLimit,
    ))
}
