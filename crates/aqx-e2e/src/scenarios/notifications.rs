//! Notification feed scenarios.

use super::{login_to_trade, open_market_position};
use crate::config::SuiteConfig;
use crate::driver::PageDriver;
use crate::matcher::match_position;
use crate::records::TradeSide;
use crate::scenario::{Category, Scenario, ScenarioError, ScenarioFuture};
use std::time::Instant;
use tracing::{info, warn};

pub(super) const SCENARIOS: [Scenario; 1] = [Scenario::new(
    "NTF-001",
    "Market order has a matching notification",
    Category::Notifications,
    order_notification,
)];

fn order_notification<'a>(
    driver: &'a dyn PageDriver,
    config: &'a SuiteConfig,
) -> ScenarioFuture<'a> {
    Box::pin(async move {
        let trade = login_to_trade(driver, config).await?;
        let Some(position) = open_market_position(&trade, config, TradeSide::Buy).await? else {
            warn!("market closed, notification check skipped");
            return Ok(());
        };

        trade.open_notifications().await?;
        let start = Instant::now();
        loop {
            let feed = trade.read_notifications().await;
            if let Some(found) = match_position(&position, &feed) {
                info!(
                    kind = ?found.kind,
                    candidates = found.candidates,
                    title = %found.notification.title,
                    "notification matched"
                );
                return Ok(());
            }
            if start.elapsed() >= config.timeout {
                return Err(ScenarioError::assertion(format!(
                    "notification feed ({} entries) should list order {}",
                    feed.len(),
                    position.order_id.as_deref().unwrap_or("?")
                )));
            }
            tokio::time::sleep(config.poll_interval).await;
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::MockElement;
    use crate::pages::TradePage;
    use crate::scenarios::test_support::{fast_config, list_on_place, trade_flow, EMPTY_TABLE};

    const POSITIONS: &str = "Open Date\nOrder No.\nSymbol\nType\nProfit\nVolume\n\
        2024-05-01 10:00:00\n456\nAUDUSD\nBUY\n0.00\n100";

    mod feed_tests {
        use super::*;

        #[tokio::test]
        async fn test_matching_entry_passes() {
            let driver = trade_flow("Place Buy Order");
            list_on_place(&driver, EMPTY_TABLE, POSITIONS);
            driver.set_element(
                &TradePage::NOTIFICATION_ITEMS,
                MockElement::many([
                    "2024-05-01 10:00:00\nOrder No. 455 EURUSD\nSELL\nVolume 100",
                    "2024-05-01 10:00:00\nOrder No. 456 AUDUSD\nBUY\nVolume 100",
                ]),
            );
            order_notification(&driver, &fast_config()).await.unwrap();
            assert!(driver.was_called(&format!("click:{}", TradePage::NOTIFICATION_BELL)));
        }

        #[tokio::test]
        async fn test_empty_feed_fails() {
            let driver = trade_flow("Place Buy Order");
            list_on_place(&driver, EMPTY_TABLE, POSITIONS);
            let err = order_notification(&driver, &fast_config())
                .await
                .unwrap_err();
            assert!(err.is_assertion());
            assert!(err.to_string().contains("order 456"));
        }
    }
}
