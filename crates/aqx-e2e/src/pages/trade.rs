//! Trading screen: symbol search, order panel, positions panel and the
//! notification feed.
//!
//! Flow through the order panel (not enforced):
//!
//! ```text
//! Idle -> SymbolSelected -> OrderTypeSelected -> ParametersEntered -> Submitted
//!                                                                        |
//!                                            PositionVisible <-----------+-----> PendingOrderVisible
//! ```

use crate::driver::PageDriver;
use crate::locator::{xpath_literal, Locator};
use crate::page_object::{BasePage, PageObject, PageOptions};
use crate::parser::{parse_notification_text, parse_position_table, ParsedTable};
use crate::records::{ExpiryType, NotificationRecord, OrderTicket, OrderType, Quote, TradeSide};
use crate::result::{Lookup, ProbeResult};
use crate::wait::Condition;
use tracing::{debug, info, warn};

/// The web trading page
#[derive(Debug, Clone)]
pub struct TradePage<'a> {
    base: BasePage<'a>,
    address: String,
}

impl<'a> TradePage<'a> {
    /// Price chart
    pub const CHART_CONTAINER: Locator = Locator::xpath(
        "//div[contains(@class,'chart') or contains(@class,'chart-container')]",
    );
    /// Symbol search input
    pub const SYMBOL_INPUT: Locator = Locator::xpath(
        "//input[contains(translate(@placeholder,'ABCDEFGHIJKLMNOPQRSTUVWXYZ','abcdefghijklmnopqrstuvwxyz'),'symbol')]",
    );
    /// First entry of the symbol search results
    pub const SYMBOL_DROPDOWN_RESULT: Locator =
        Locator::xpath("(//div[@class='sc-197e9882-0 kJjEOX']//div)[1]");
    /// Title of the selected symbol
    pub const SYMBOL_OVERVIEW_TITLE: Locator = Locator::test_id("symbol-overview-id");
    /// Current price of the selected symbol
    pub const PRICE_DISPLAY: Locator = Locator::xpath(
        "//div[contains(@class,'price') or contains(@class,'current-price')]",
    );

    /// Volume input
    pub const VOLUME_INPUT: Locator = Locator::name("lotSize");
    /// Entry price input for pending orders
    pub const PRICE_INPUT: Locator = Locator::name("price");
    /// Limit price input for stop-limit orders
    pub const STOP_LIMIT_PRICE_INPUT: Locator = Locator::name("stopLimitPrice");
    /// Stop loss input
    pub const STOP_LOSS_INPUT: Locator = Locator::name("stopLoss");
    /// Take profit input
    pub const TAKE_PROFIT_INPUT: Locator = Locator::name("takeProfit");

    /// Order type dropdown toggle
    pub const ORDER_TYPE_DROPDOWN: Locator =
        Locator::xpath("(//div[text()='Market']/following-sibling::div)[1]");
    /// Market option
    pub const MARKET_OPTION: Locator = Locator::xpath("//div[normalize-space(text())='Market']");
    /// Limit option
    pub const LIMIT_OPTION: Locator = Locator::xpath("//div[normalize-space(text())='Limit']");
    /// Stop option
    pub const STOP_OPTION: Locator = Locator::xpath("//div[normalize-space(text())='Stop']");
    /// Stop limit option
    pub const STOP_LIMIT_OPTION: Locator =
        Locator::xpath("//div[normalize-space(text())='Stop Limit']");

    /// Expiry dropdown toggle
    pub const EXPIRY_DROPDOWN: Locator = Locator::test_id("trade-dropdown-expiry-type");
    /// Good till cancelled option
    pub const EXPIRY_GTC_OPTION: Locator =
        Locator::xpath("//div[normalize-space(text())='Good Till Cancelled']");
    /// Good till day option
    pub const EXPIRY_DAY_OPTION: Locator =
        Locator::xpath("//div[normalize-space(text())='Good Till Day']");
    /// Specified date option
    pub const EXPIRY_DATE_OPTION: Locator =
        Locator::xpath("//div[normalize-space(text())='Specified Date']");
    /// Specified date and time option
    pub const EXPIRY_DATETIME_OPTION: Locator =
        Locator::xpath("//div[normalize-space(text())='Specified Date and Time']");

    /// Buy side button
    pub const BUY_BUTTON: Locator = Locator::test_id("trade-button-order-buy");
    /// Sell side button
    pub const SELL_BUTTON: Locator = Locator::test_id("trade-button-order-sell");
    /// Place order button (reads "Market Closed" outside trading hours)
    pub const PLACE_ORDER_BUTTON: Locator = Locator::test_id("trade-button-order");
    /// Confirmation dialog button, when one-click trading is off
    pub const CONFIRM_ORDER_BUTTON: Locator =
        Locator::test_id("trade-confirmation-button-confirm");

    /// Open positions tab
    pub const OPEN_POSITIONS_TAB: Locator =
        Locator::xpath("//div[starts-with(normalize-space(text()),'Open Positions')]");
    /// Pending orders tab
    pub const PENDING_ORDERS_TAB: Locator =
        Locator::xpath("//div[starts-with(normalize-space(text()),'Pending Orders')]");
    /// History tab
    pub const HISTORY_TAB: Locator =
        Locator::xpath("//div[starts-with(normalize-space(text()),'History')]");
    /// Table body of the active tab
    pub const POSITION_CONTAINER: Locator = Locator::xpath("//div[@class='sc-dvmDTH isBNLJ']");

    /// First edit button of the table
    pub const EDIT_POSITION_BUTTON: Locator =
        Locator::xpath("//button[contains(text(), 'Edit')]");
    /// First close button of the table
    pub const CLOSE_POSITION_BUTTON: Locator =
        Locator::xpath("//button[contains(text(), 'Close')]");
    /// Stop loss input of the edit dialog
    pub const EDIT_STOP_LOSS_INPUT: Locator =
        Locator::xpath("//div[@role='dialog']//input[@name='stopLoss']");
    /// Take profit input of the edit dialog
    pub const EDIT_TAKE_PROFIT_INPUT: Locator =
        Locator::xpath("//div[@role='dialog']//input[@name='takeProfit']");
    /// Submit button of the edit dialog
    pub const EDIT_CONFIRM_BUTTON: Locator = Locator::test_id("edit-button-order");
    /// Submit button of the close dialog
    pub const CLOSE_CONFIRM_BUTTON: Locator = Locator::test_id("close-order-button-submit");
    /// Bulk close control
    pub const BULK_CLOSE_BUTTON: Locator = Locator::test_id("bulk-close");
    /// Submit button of the bulk close dialog
    pub const BULK_CLOSE_CONFIRM_BUTTON: Locator = Locator::test_id("bulk-close-button-submit");

    /// Notification bell
    pub const NOTIFICATION_BELL: Locator = Locator::test_id("notification-selector");
    /// Entries of the notification feed
    pub const NOTIFICATION_ITEMS: Locator = Locator::test_id("notification-list-result-item");

    /// Trade page under `base_url`
    #[must_use]
    pub fn new(driver: &'a dyn PageDriver, base_url: &str, options: PageOptions) -> Self {
        let mut page = Self {
            base: BasePage::new(driver, options),
            address: String::new(),
        };
        page.address = page.url(base_url);
        page
    }

    /// Option locator for an order type
    #[must_use]
    pub const fn order_type_option(order_type: OrderType) -> Locator {
        match order_type {
            OrderType::Market => Self::MARKET_OPTION,
            OrderType::Limit => Self::LIMIT_OPTION,
            OrderType::Stop => Self::STOP_OPTION,
            OrderType::StopLimit => Self::STOP_LIMIT_OPTION,
        }
    }

    /// Option locator for an expiry
    #[must_use]
    pub const fn expiry_option(expiry: ExpiryType) -> Locator {
        match expiry {
            ExpiryType::GoodTillCancelled => Self::EXPIRY_GTC_OPTION,
            ExpiryType::GoodTillDay => Self::EXPIRY_DAY_OPTION,
            ExpiryType::SpecifiedDate => Self::EXPIRY_DATE_OPTION,
            ExpiryType::SpecifiedDateTime => Self::EXPIRY_DATETIME_OPTION,
        }
    }

    /// Side button locator
    #[must_use]
    pub const fn side_button(side: TradeSide) -> Locator {
        match side {
            TradeSide::Buy => Self::BUY_BUTTON,
            TradeSide::Sell => Self::SELL_BUTTON,
        }
    }

    /// Button labelled `label` inside the innermost element whose text
    /// contains `order_id`
    #[must_use]
    pub fn row_button(order_id: &str, label: &str) -> Locator {
        let id = xpath_literal(order_id);
        let button = format!("button[contains(text(), {})]", xpath_literal(label));
        let row = format!("contains(normalize-space(.), {id}) and .//{button}");
        Locator::xpath_owned(format!(
            "//div[{row}][not(.//div[{row}])]//{button}"
        ))
    }

    /// Title inside the `index`-th (zero-based) notification entry
    #[must_use]
    pub fn notification_title(index: usize) -> Locator {
        Locator::xpath_owned(format!(
            "(//div[@data-testid='notification-list-result-item'])[{}]\
             //div[@data-testid='notification-title']",
            index + 1
        ))
    }

    /// Let the page catch up after an action
    pub async fn settle(&self, ms: u64) {
        self.base.settle(ms).await;
    }

    /// Navigate to the trade page and wait for the chart
    pub async fn open(&self) -> ProbeResult<()> {
        self.base.open_url(&self.address).await?;
        self.base.wait_visible(&Self::CHART_CONTAINER).await?;
        info!(url = %self.address, "opened trade page");
        Ok(())
    }

    /// Chart and both side buttons visible
    pub async fn verify_page_loaded(&self) -> bool {
        let timeout = self.base.options().wait.timeout;
        for locator in [&Self::CHART_CONTAINER, &Self::BUY_BUTTON, &Self::SELL_BUTTON] {
            if !self.base.is_element_visible(locator, timeout).await {
                warn!(%locator, "trade page not loaded");
                return false;
            }
        }
        true
    }

    /// Place order button reads "closed"
    pub async fn is_market_closed(&self) -> bool {
        let lookup = self
            .base
            .text_if_visible(&Self::PLACE_ORDER_BUTTON, self.base.options().check_timeout)
            .await;
        let closed = lookup
            .found()
            .is_some_and(|text| text.to_ascii_uppercase().contains("CLOSED"));
        if closed {
            warn!("market closed");
        }
        closed
    }

    /// Search for `symbol`, pick the first result and return its price.
    ///
    /// Characters are typed one at a time so the search box fires a lookup per
    /// keystroke. A missing dropdown is tolerated; the price is read anyway.
    pub async fn input_symbol(&self, symbol: &str) -> ProbeResult<Option<Quote>> {
        let driver = self.base.driver();
        self.base.wait_visible(&Self::SYMBOL_INPUT).await?;
        driver.clear(&Self::SYMBOL_INPUT).await?;
        self.base.settle(200).await;
        self.base.click(&Self::SYMBOL_INPUT).await?;
        self.base.settle(200).await;

        let mut buf = [0u8; 4];
        for ch in symbol.chars() {
            driver
                .type_text(&Self::SYMBOL_INPUT, ch.encode_utf8(&mut buf))
                .await?;
            self.base.settle(100).await;
        }
        self.base.settle(500).await;
        info!(symbol, "typed symbol");

        match self
            .base
            .check(&Self::SYMBOL_DROPDOWN_RESULT, Condition::Clickable)
            .await
        {
            Lookup::Found(_) => {
                driver.click(&Self::SYMBOL_DROPDOWN_RESULT).await?;
                self.base.settle(800).await;
                if let Some(title) = driver.inner_text(&Self::SYMBOL_OVERVIEW_TITLE).await? {
                    info!(title = %title.trim(), "symbol selected");
                }
            }
            other => warn!(symbol, result = ?other, "symbol dropdown not shown"),
        }

        Ok(self.current_price().await)
    }

    /// Price of the selected symbol
    pub async fn current_price(&self) -> Option<Quote> {
        let text = self
            .base
            .text_if_visible(&Self::PRICE_DISPLAY, self.base.options().check_timeout)
            .await
            .found()?;
        let quote = Quote::parse(text.trim());
        debug!(text = %text.trim(), ?quote, "read current price");
        quote
    }

    /// Choose an order type by label (`market`, `limit`, `stop`, `stop limit`)
    pub async fn select_order_type(&self, label: &str) -> ProbeResult<OrderType> {
        let order_type: OrderType = label.parse()?;
        self.select_order(order_type).await?;
        Ok(order_type)
    }

    /// Choose an order type
    pub async fn select_order(&self, order_type: OrderType) -> ProbeResult<()> {
        self.base.click(&Self::ORDER_TYPE_DROPDOWN).await?;
        self.base.settle(300).await;
        self.base.click(&Self::order_type_option(order_type)).await?;
        info!(%order_type, "selected order type");
        self.base.settle(300).await;
        Ok(())
    }

    /// Choose a pending order expiry by label
    pub async fn select_expiry(&self, label: &str) -> ProbeResult<ExpiryType> {
        let expiry: ExpiryType = label.parse()?;
        self.select_expiry_type(expiry).await?;
        Ok(expiry)
    }

    /// Choose a pending order expiry
    pub async fn select_expiry_type(&self, expiry: ExpiryType) -> ProbeResult<()> {
        self.base.click(&Self::EXPIRY_DROPDOWN).await?;
        self.base.settle(300).await;
        self.base.click(&Self::expiry_option(expiry)).await?;
        info!(%expiry, "selected expiry");
        self.base.settle(300).await;
        Ok(())
    }

    /// Click the buy or sell button
    pub async fn select_side(&self, side: TradeSide) -> ProbeResult<()> {
        let button = Self::side_button(side);
        self.base.wait_visible(&button).await?;
        self.base.driver().scroll_into_view(&button).await?;
        self.base.settle(200).await;
        self.base.click(&button).await?;
        info!(%side, "selected side");
        self.base.settle(500).await;
        Ok(())
    }

    /// Type the volume
    pub async fn input_volume(&self, volume: &str) -> ProbeResult<()> {
        self.base.type_text(&Self::VOLUME_INPUT, volume).await?;
        info!(volume, "entered volume");
        Ok(())
    }

    /// Type the entry price of a pending order
    pub async fn input_price(&self, price: &Quote) -> ProbeResult<()> {
        self.type_quote(&Self::PRICE_INPUT, "price", price).await
    }

    /// Type the limit price of a stop-limit order
    pub async fn input_stop_limit_price(&self, price: &Quote) -> ProbeResult<()> {
        self.type_quote(&Self::STOP_LIMIT_PRICE_INPUT, "stop limit price", price)
            .await
    }

    /// Type the stop loss
    pub async fn input_stop_loss(&self, price: &Quote) -> ProbeResult<()> {
        self.type_quote(&Self::STOP_LOSS_INPUT, "stop loss", price)
            .await
    }

    /// Type the take profit
    pub async fn input_take_profit(&self, price: &Quote) -> ProbeResult<()> {
        self.type_quote(&Self::TAKE_PROFIT_INPUT, "take profit", price)
            .await
    }

    async fn type_quote(&self, locator: &Locator, field: &str, price: &Quote) -> ProbeResult<()> {
        let text = price.to_string();
        self.base.type_text(locator, &text).await?;
        info!(field, price = %text, "entered price");
        Ok(())
    }

    /// Submit the order panel
    pub async fn click_place_order(&self) -> ProbeResult<()> {
        self.base.click(&Self::PLACE_ORDER_BUTTON).await?;
        info!("clicked place order");
        self.base.settle(500).await;
        Ok(())
    }

    /// Confirm the order dialog if it shows. Returns whether it was there.
    pub async fn confirm_order(&self) -> ProbeResult<bool> {
        self.confirm_if_shown(&Self::CONFIRM_ORDER_BUTTON).await
    }

    async fn confirm_if_shown(&self, button: &Locator) -> ProbeResult<bool> {
        match self.base.check(button, Condition::Clickable).await {
            Lookup::Found(_) => {
                self.base.driver().click(button).await?;
                info!(%button, "confirmed dialog");
                self.base.settle(500).await;
                Ok(true)
            }
            other => {
                debug!(%button, result = ?other, "no confirmation dialog");
                Ok(false)
            }
        }
    }

    /// Fill and submit the order panel for an already selected symbol
    pub async fn place_order(&self, ticket: &OrderTicket) -> ProbeResult<()> {
        self.select_order(ticket.order_type).await?;
        self.select_side(ticket.side).await?;
        self.input_volume(&ticket.volume).await?;

        if let Some(ref price) = ticket.price {
            self.input_price(price).await?;
        }
        if let Some(ref price) = ticket.stop_limit_price {
            self.input_stop_limit_price(price).await?;
        }
        if ticket.order_type.is_pending() {
            if let Some(expiry) = ticket.expiry {
                self.select_expiry_type(expiry).await?;
            }
        }
        if let Some(ref price) = ticket.stop_loss {
            self.input_stop_loss(price).await?;
        }
        if let Some(ref price) = ticket.take_profit {
            self.input_take_profit(price).await?;
        }

        self.click_place_order().await?;
        let _ = self.confirm_order().await?;
        info!(
            symbol = %ticket.symbol,
            side = %ticket.side,
            order_type = %ticket.order_type,
            volume = %ticket.volume,
            "order submitted"
        );
        Ok(())
    }

    async fn open_tab(&self, tab: &Locator, name: &str) -> ProbeResult<()> {
        self.base.click(tab).await?;
        info!(tab = name, "opened tab");
        self.base.settle(500).await;
        Ok(())
    }

    /// Switch the table to open positions
    pub async fn open_positions_tab(&self) -> ProbeResult<()> {
        self.open_tab(&Self::OPEN_POSITIONS_TAB, "open positions")
            .await
    }

    /// Switch the table to pending orders
    pub async fn open_pending_orders_tab(&self) -> ProbeResult<()> {
        self.open_tab(&Self::PENDING_ORDERS_TAB, "pending orders")
            .await
    }

    /// Switch the table to history
    pub async fn open_history_tab(&self) -> ProbeResult<()> {
        self.open_tab(&Self::HISTORY_TAB, "history").await
    }

    /// Open the notification feed
    pub async fn open_notifications(&self) -> ProbeResult<()> {
        self.open_tab(&Self::NOTIFICATION_BELL, "notifications")
            .await
    }

    /// Visible text of the active table, trimmed.
    ///
    /// A visible but blank panel is `Found("")`; a panel that is missing or
    /// never became visible is reported as such, not as an empty table.
    pub async fn read_position_data(&self) -> Lookup<String> {
        self.base
            .text_if_visible(&Self::POSITION_CONTAINER, self.base.options().check_timeout)
            .await
            .map(|text| text.trim().to_string())
    }

    /// Parsed rows of the active table
    pub async fn read_positions(&self) -> Lookup<ParsedTable> {
        let lookup = self.read_position_data().await;
        if !lookup.is_found() {
            debug!(?lookup, "positions panel not readable");
        }
        lookup.map(|text| parse_position_table(&text))
    }

    /// Number of rows in the active table
    pub async fn position_count(&self) -> Lookup<usize> {
        self.read_positions().await.map(|table| table.records.len())
    }

    /// Every entry of the open notification feed, titles included.
    ///
    /// Each title is read from inside its own entry, so an entry without one
    /// gets an empty title instead of its neighbour's.
    pub async fn read_notifications(&self) -> Vec<NotificationRecord> {
        let driver = self.base.driver();
        let bodies = match driver.inner_texts(&Self::NOTIFICATION_ITEMS).await {
            Ok(bodies) => bodies,
            Err(e) => {
                warn!(error = %e, "could not read notification feed");
                return Vec::new();
            }
        };

        let mut records = Vec::with_capacity(bodies.len());
        for (i, body) in bodies.iter().enumerate() {
            let title = match driver.inner_text(&Self::notification_title(i)).await {
                Ok(title) => title.map(|t| t.trim().to_string()).unwrap_or_default(),
                Err(e) => {
                    warn!(entry = i, error = %e, "could not read notification title");
                    String::new()
                }
            };
            records.push(NotificationRecord {
                title,
                ..parse_notification_text(body)
            });
        }
        info!(entries = records.len(), "read notification feed");
        records
    }

    /// Click a row's button, or the first unscoped one when the row cannot be
    /// found. Returns whether the scoped button was used.
    async fn click_row_button(
        &self,
        order_id: Option<&str>,
        label: &str,
        fallback: &Locator,
    ) -> ProbeResult<bool> {
        if let Some(id) = order_id {
            let scoped = Self::row_button(id, label);
            match self.base.check(&scoped, Condition::Clickable).await {
                Lookup::Found(_) => {
                    self.base.driver().click(&scoped).await?;
                    return Ok(true);
                }
                other => warn!(order_id = id, label, result = ?other, "row button not found, using first"),
            }
        }
        self.base.click(fallback).await?;
        Ok(false)
    }

    /// Open the edit dialog of a position and update its stop loss / take
    /// profit. With neither value the dialog is only opened.
    pub async fn edit_position(
        &self,
        order_id: Option<&str>,
        stop_loss: Option<&Quote>,
        take_profit: Option<&Quote>,
    ) -> ProbeResult<()> {
        let scoped = self
            .click_row_button(order_id, "Edit", &Self::EDIT_POSITION_BUTTON)
            .await?;
        info!(?order_id, scoped, "edit mode");
        self.base.settle(500).await;

        if let Some(price) = stop_loss {
            self.type_quote(&Self::EDIT_STOP_LOSS_INPUT, "stop loss", price)
                .await?;
        }
        if let Some(price) = take_profit {
            self.type_quote(&Self::EDIT_TAKE_PROFIT_INPUT, "take profit", price)
                .await?;
        }
        if stop_loss.is_some() || take_profit.is_some() {
            self.base.click(&Self::EDIT_CONFIRM_BUTTON).await?;
            info!(?order_id, "position updated");
            self.base.settle(500).await;
        }
        Ok(())
    }

    /// Close one position, confirming the dialog if it shows
    pub async fn close_position(&self, order_id: Option<&str>) -> ProbeResult<()> {
        let scoped = self
            .click_row_button(order_id, "Close", &Self::CLOSE_POSITION_BUTTON)
            .await?;
        self.base.settle(500).await;
        let _ = self.confirm_if_shown(&Self::CLOSE_CONFIRM_BUTTON).await?;
        info!(?order_id, scoped, "position closed");
        Ok(())
    }

    /// Close every open position
    pub async fn bulk_close_positions(&self) -> ProbeResult<()> {
        self.base.click(&Self::BULK_CLOSE_BUTTON).await?;
        self.base.settle(500).await;
        let _ = self
            .confirm_if_shown(&Self::BULK_CLOSE_CONFIRM_BUTTON)
            .await?;
        info!("bulk close submitted");
        Ok(())
    }
}

impl PageObject for TradePage<'_> {
    fn url_path(&self) -> &str {
        "/web/trade"
    }

    fn page_name(&self) -> &str {
        "Trade"
    }
}
