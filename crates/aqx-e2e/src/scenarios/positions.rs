//! Position management scenarios.

use super::{
    await_row, await_table, is_order, login_to_trade, open_market_position, same_level,
    submit_order, Placement,
};
use crate::config::SuiteConfig;
use crate::driver::PageDriver;
use crate::parser::ParsedTable;
use crate::records::{OrderType, Quote, TradeSide};
use crate::result::Lookup;
use crate::scenario::{ensure, Category, Scenario, ScenarioError, ScenarioFuture};
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Positions opened by the bulk close scenario
const BULK_ORDERS: usize = 3;

pub(super) const SCENARIOS: [Scenario; 3] = [
    Scenario::new(
        "POS-001",
        "Edit stop loss and take profit of a position",
        Category::Positions,
        edit_position,
    ),
    Scenario::new(
        "POS-002",
        "Close a position by order number",
        Category::Positions,
        close_position,
    ),
    Scenario::new(
        "POS-003",
        "Bulk close open positions",
        Category::Positions,
        bulk_close,
    ),
];

fn edit_position<'a>(driver: &'a dyn PageDriver, config: &'a SuiteConfig) -> ScenarioFuture<'a> {
    Box::pin(async move {
        let trade = login_to_trade(driver, config).await?;
        let Some(row) = open_market_position(&trade, config, TradeSide::Buy).await? else {
            warn!("market closed, edit skipped");
            return Ok(());
        };

        let price = trade.current_price().await.ok_or_else(|| {
            ScenarioError::assertion(format!("{} should show a current price", config.symbol))
        })?;
        let (stop_loss, take_profit): (Quote, Quote) = (price.scaled(0.99), price.scaled(1.01));
        trade
            .edit_position(row.order_id.as_deref(), Some(&stop_loss), Some(&take_profit))
            .await?;
        info!(order_id = ?row.order_id, %stop_loss, %take_profit, "levels submitted");

        let order_id = row.order_id.clone();
        let edited = await_row(&trade, config, |r| {
            r.order_id == order_id
                && same_level(r.stop_loss.as_deref(), stop_loss)
                && same_level(r.take_profit.as_deref(), take_profit)
        })
        .await;
        ensure(
            edited.is_some(),
            format!(
                "position {} should show stop loss {stop_loss} and take profit {take_profit}",
                order_id.as_deref().unwrap_or("?")
            ),
        )
    })
}

fn close_position<'a>(driver: &'a dyn PageDriver, config: &'a SuiteConfig) -> ScenarioFuture<'a> {
    Box::pin(async move {
        let trade = login_to_trade(driver, config).await?;
        let Some(row) = open_market_position(&trade, config, TradeSide::Sell).await? else {
            warn!("market closed, close skipped");
            return Ok(());
        };
        let order_id = row
            .order_id
            .clone()
            .ok_or_else(|| ScenarioError::assertion("position row should carry an order number"))?;

        trade.close_position(Some(&order_id)).await?;
        trade.settle(1_000).await;

        match await_table(&trade, config, |t| t.find_order(&order_id).is_none()).await {
            Lookup::Found(table) if table.find_order(&order_id).is_none() => {
                info!(order_id, "position closed");
                Ok(())
            }
            Lookup::Found(_) => Err(ScenarioError::assertion(format!(
                "position {order_id} should leave open positions after closing"
            ))),
            unread => Err(ScenarioError::assertion(format!(
                "open positions could not be read after closing {order_id} ({unread:?})"
            ))),
        }
    })
}

fn bulk_close<'a>(driver: &'a dyn PageDriver, config: &'a SuiteConfig) -> ScenarioFuture<'a> {
    Box::pin(async move {
        let trade = login_to_trade(driver, config).await?;

        let mut known_ids = BTreeSet::new();
        for n in 0..BULK_ORDERS {
            match submit_order(&trade, config, TradeSide::Buy, OrderType::Market).await? {
                Placement::MarketClosed => {
                    warn!("market closed, bulk close skipped");
                    return Ok(());
                }
                Placement::Submitted(submission) if n == 0 => known_ids = submission.known_ids,
                Placement::Submitted(_) => {}
            }
            info!(order = n + 1, of = BULK_ORDERS, "opened position");
        }

        trade.open_positions_tab().await?;
        let new_rows = |t: &ParsedTable| {
            t.records
                .iter()
                .filter(|r| {
                    r.order_id.as_deref().is_some_and(|id| !known_ids.contains(id))
                        && is_order(r, &config.symbol, TradeSide::Buy)
                })
                .count()
        };
        let opened = await_table(&trade, config, |t| new_rows(t) >= BULK_ORDERS)
            .await
            .found()
            .map_or(0, |t| new_rows(&t));
        ensure(
            opened >= BULK_ORDERS,
            format!("open positions should list at least {BULK_ORDERS} new rows, found {opened}"),
        )?;

        trade.bulk_close_positions().await?;
        trade.settle(1_500).await;
        match await_table(&trade, config, |t| t.records.is_empty()).await {
            Lookup::Found(table) => ensure(
                table.records.is_empty(),
                format!(
                    "bulk close should empty open positions, {} left",
                    table.records.len()
                ),
            ),
            unread => Err(ScenarioError::assertion(format!(
                "open positions could not be read after bulk close ({unread:?})"
            ))),
        }
    })
}
