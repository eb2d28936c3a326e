//! Structured records extracted from the trading screen, and the small
//! value types used to fill in an order ticket.

use crate::result::ProbeError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Direction of an order or position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeSide {
    /// Buy / long
    Buy,
    /// Sell / short
    Sell,
}

impl TradeSide {
    /// Label as rendered by the platform
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TradeSide {
    type Err = ProbeError;

    /// Accepts `BUY`, `SELL` and compound labels such as `BUY LIMIT`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.split_whitespace().next() {
            Some("BUY") => Ok(Self::Buy),
            Some("SELL") => Ok(Self::Sell),
            _ => Err(ProbeError::unknown_option("trade side", s)),
        }
    }
}

/// Order type offered by the order panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    /// Fill at the current price
    Market,
    /// Pending at a better price
    Limit,
    /// Pending at a worse price
    Stop,
    /// Stop that places a limit once triggered
    StopLimit,
}

impl OrderType {
    /// Label shown in the order type dropdown
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Market => "Market",
            Self::Limit => "Limit",
            Self::Stop => "Stop",
            Self::StopLimit => "Stop Limit",
        }
    }

    /// Whether the order rests in the pending orders tab until triggered
    #[must_use]
    pub const fn is_pending(self) -> bool {
        !matches!(self, Self::Market)
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OrderType {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "market" => Ok(Self::Market),
            "limit" => Ok(Self::Limit),
            "stop" => Ok(Self::Stop),
            "stop limit" => Ok(Self::StopLimit),
            _ => Err(ProbeError::unknown_option("order type", s)),
        }
    }
}

/// Expiry of a pending order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpiryType {
    /// Good till cancelled
    GoodTillCancelled,
    /// Good till end of day
    GoodTillDay,
    /// Good till a specified date
    SpecifiedDate,
    /// Good till a specified date and time
    SpecifiedDateTime,
}

impl ExpiryType {
    /// Label shown in the expiry dropdown
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::GoodTillCancelled => "Good Till Cancelled",
            Self::GoodTillDay => "Good Till Day",
            Self::SpecifiedDate => "Specified Date",
            Self::SpecifiedDateTime => "Specified Date and Time",
        }
    }
}

impl fmt::Display for ExpiryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ExpiryType {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "good till cancelled" | "gtc" => Ok(Self::GoodTillCancelled),
            "good till day" | "day" => Ok(Self::GoodTillDay),
            "specified date" => Ok(Self::SpecifiedDate),
            "specified date and time" => Ok(Self::SpecifiedDateTime),
            _ => Err(ProbeError::unknown_option("expiry", s)),
        }
    }
}

fn decimal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-?\d[\d,]*(?:\.(\d+))?").expect("valid decimal regex"))
}

/// A price read from the page.
///
/// Keeps the number of decimals it was rendered with so derived prices
/// (stop loss at 99 % of market, say) are written back at the same precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Numeric value
    pub value: f64,
    /// Decimal places used when formatting
    pub decimals: usize,
}

impl Quote {
    /// Create a quote
    #[must_use]
    pub const fn new(value: f64, decimals: usize) -> Self {
        Self { value, decimals }
    }

    /// Extract the first decimal number in rendered text (`"Bid 1,234.50"`)
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let caps = decimal_re().captures(text)?;
        let whole = caps.get(0)?.as_str().replace(',', "");
        let decimals = caps.get(1).map_or(0, |m| m.as_str().len());
        whole.parse().ok().map(|value| Self { value, decimals })
    }

    /// Same precision, value multiplied by `factor`
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            value: self.value * factor,
            decimals: self.decimals,
        }
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.*}", self.decimals, self.value)
    }
}

/// One row of the open positions or pending orders table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRecord {
    /// Open date (`YYYY-MM-DD ...`)
    pub date: Option<String>,
    /// Order number, digits only
    pub order_id: Option<String>,
    /// Instrument symbol
    pub symbol: Option<String>,
    /// Buy or sell
    pub side: Option<TradeSide>,
    /// Volume as rendered
    pub volume: Option<String>,
    /// Profit as rendered
    pub profit: Option<String>,
    /// Entry price as rendered
    pub price: Option<String>,
    /// Stop loss as rendered
    pub stop_loss: Option<String>,
    /// Take profit as rendered
    pub take_profit: Option<String>,
    /// Source text the record was parsed from
    pub raw_text: String,
}

/// One entry of the notification feed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Date line
    pub date: Option<String>,
    /// Order number
    pub order_id: Option<String>,
    /// Instrument symbol
    pub symbol: Option<String>,
    /// Buy or sell
    pub side: Option<TradeSide>,
    /// Volume
    pub volume: Option<String>,
    /// Profit
    pub profit: Option<String>,
    /// Entry title, fetched separately from the body
    pub title: String,
}

impl NotificationRecord {
    /// Whether any field was extracted from the entry body
    #[must_use]
    pub const fn has_fields(&self) -> bool {
        self.date.is_some()
            || self.order_id.is_some()
            || self.symbol.is_some()
            || self.side.is_some()
            || self.volume.is_some()
            || self.profit.is_some()
    }
}

/// Everything needed to submit one order through the order panel
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTicket {
    /// Instrument symbol
    pub symbol: String,
    /// Buy or sell
    pub side: TradeSide,
    /// Order type
    pub order_type: OrderType,
    /// Volume, as typed
    pub volume: String,
    /// Entry price for pending orders
    pub price: Option<Quote>,
    /// Limit price for stop-limit orders
    pub stop_limit_price: Option<Quote>,
    /// Stop loss
    pub stop_loss: Option<Quote>,
    /// Take profit
    pub take_profit: Option<Quote>,
    /// Expiry for pending orders
    pub expiry: Option<ExpiryType>,
}

impl OrderTicket {
    /// Market order with no protective levels
    #[must_use]
    pub fn market(symbol: impl Into<String>, side: TradeSide, volume: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            volume: volume.into(),
            price: None,
            stop_limit_price: None,
            stop_loss: None,
            take_profit: None,
            expiry: None,
        }
    }

    /// Pending order at `price`
    #[must_use]
    pub fn pending(
        symbol: impl Into<String>,
        side: TradeSide,
        order_type: OrderType,
        volume: impl Into<String>,
        price: Quote,
    ) -> Self {
        Self {
            order_type,
            price: Some(price),
            expiry: Some(ExpiryType::GoodTillCancelled),
            ..Self::market(symbol, side, volume)
        }
    }

    /// Set stop-limit price
    #[must_use]
    pub const fn with_stop_limit_price(mut self, price: Quote) -> Self {
        self.stop_limit_price = Some(price);
        self
    }

    /// Set stop loss
    #[must_use]
    pub const fn with_stop_loss(mut self, price: Quote) -> Self {
        self.stop_loss = Some(price);
        self
    }

    /// Set take profit
    #[must_use]
    pub const fn with_take_profit(mut self, price: Quote) -> Self {
        self.take_profit = Some(price);
        self
    }

    /// Set expiry
    #[must_use]
    pub const fn with_expiry(mut self, expiry: ExpiryType) -> Self {
        self.expiry = Some(expiry);
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod label_tests {
        use super::*;

        #[test]
        fn test_trade_side_parse() {
            assert_eq!("BUY".parse::<TradeSide>().unwrap(), TradeSide::Buy);
            assert_eq!(" sell ".parse::<TradeSide>().unwrap(), TradeSide::Sell);
            assert_eq!("BUY LIMIT".parse::<TradeSide>().unwrap(), TradeSide::Buy);
            assert!("HOLD".parse::<TradeSide>().is_err());
        }

        #[test]
        fn test_order_type_labels() {
            assert_eq!("Stop Limit".parse::<OrderType>().unwrap(), OrderType::StopLimit);
            assert_eq!("MARKET".parse::<OrderType>().unwrap(), OrderType::Market);
            assert_eq!(OrderType::StopLimit.to_string(), "Stop Limit");
            assert!(!OrderType::Market.is_pending());
            assert!(OrderType::Stop.is_pending());
        }

        #[test]
        fn test_order_type_unknown() {
            let err = "Trailing Stop".parse::<OrderType>().unwrap_err();
            assert!(err.to_string().contains("order type"));
        }

        #[test]
        fn test_expiry_labels() {
            assert_eq!(
                "gtc".parse::<ExpiryType>().unwrap(),
                ExpiryType::GoodTillCancelled
            );
            assert_eq!(
                ExpiryType::SpecifiedDateTime.label(),
                "Specified Date and Time"
            );
            assert!("forever".parse::<ExpiryType>().is_err());
        }
    }

    mod quote_tests {
        use super::*;

        #[test]
        fn test_parse_keeps_precision() {
            let quote = Quote::parse("0.65432").unwrap();
            assert_eq!(quote.decimals, 5);
            assert_eq!(quote.to_string(), "0.65432");
        }

        #[test]
        fn test_parse_from_label_with_thousands() {
            let quote = Quote::parse("Bid 2,345.10 USD").unwrap();
            assert!((quote.value - 2345.10).abs() < 1e-9);
            assert_eq!(quote.decimals, 2);
        }

        #[test]
        fn test_parse_integer_and_garbage() {
            assert_eq!(Quote::parse("100").unwrap().decimals, 0);
            assert!(Quote::parse("no price").is_none());
        }

        #[test]
        fn test_scaled_formats_with_same_decimals() {
            let stop_loss = Quote::new(100.0, 2).scaled(0.99);
            assert_eq!(stop_loss.to_string(), "99.00");
        }
    }

    mod ticket_tests {
        use super::*;

        #[test]
        fn test_market_ticket() {
            let ticket = OrderTicket::market("AUDUSD", TradeSide::Buy, "0.01");
            assert_eq!(ticket.order_type, OrderType::Market);
            assert!(ticket.price.is_none());
            assert!(ticket.expiry.is_none());
        }

        #[test]
        fn test_pending_ticket_defaults_to_gtc() {
            let ticket = OrderTicket::pending(
                "AUDUSD",
                TradeSide::Sell,
                OrderType::Limit,
                "0.01",
                Quote::new(0.66, 2),
            )
            .with_expiry(ExpiryType::GoodTillDay);
            assert_eq!(ticket.expiry, Some(ExpiryType::GoodTillDay));
            assert_eq!(ticket.price, Some(Quote::new(0.66, 2)));
        }

        #[test]
        fn test_notification_has_fields() {
            let mut record = NotificationRecord::default();
            assert!(!record.has_fields());
            record.volume = Some("1.0".to_string());
            assert!(record.has_fields());
        }
    }
}
