//! Parsers for rendered panel text.
//!
//! Both parsers work on `innerText` split into trimmed, non-empty lines and
//! never fail: fields they cannot find stay `None`.
//!
//! ```text
//! positions panel text                  notification entry text
//! ────────────────────                  ───────────────────────
//! Open Date   ┐                         2024-05-01 10:00:00     -> date
//! Order No.   │ header block            Order No. 456 AUDUSD    -> order_id, symbol
//! Symbol      │ (column order           BUY                     -> side
//! Type        │  read from here)        Volume 1.0              -> volume
//! Profit      │                         -12.34                  -> profit
//! Volume      ┘                         at                      (sentinel)
//! 2024-05-01 10:00:00  ┐                0.65432
//! 123456               │ one row per
//! AUDUSD               │ header-width
//! BUY                  │ group
//! 1.25                 │
//! 0.01                 ┘
//! ```

use crate::records::{NotificationRecord, PositionRecord, TradeSide};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// A column of the positions / pending orders table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    /// Open date
    Date,
    /// Order number
    OrderId,
    /// Symbol
    Symbol,
    /// Buy / sell
    Type,
    /// Profit
    Profit,
    /// Volume
    Volume,
    /// Entry price
    Price,
    /// Stop loss level
    StopLoss,
    /// Take profit level
    TakeProfit,
    /// Known column the records do not carry (swap, commission, ...)
    Other,
}

impl Column {
    /// Map a header label to its column, `None` for text that is not a header
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let column = match label.trim().to_ascii_lowercase().as_str() {
            "open date" | "open time" | "date" | "time" => Self::Date,
            "order no." | "order no" | "order id" | "order #" | "ticket" => Self::OrderId,
            "symbol" => Self::Symbol,
            "type" | "order type" | "side" => Self::Type,
            "profit" | "p/l" | "pnl" | "profit/loss" | "unrealized p/l" => Self::Profit,
            "volume" | "size" | "lot size" | "lots" => Self::Volume,
            "entry price" | "open price" | "price" => Self::Price,
            "stop loss" | "s/l" | "sl" => Self::StopLoss,
            "take profit" | "t/p" | "tp" => Self::TakeProfit,
            "current price" | "market price" | "swap" | "commission" | "expiry" | "status" => {
                Self::Other
            }
            _ => return None,
        };
        Some(column)
    }
}

/// Header order the table is normally rendered with
pub const DEFAULT_COLUMNS: [Column; 6] = [
    Column::Date,
    Column::OrderId,
    Column::Symbol,
    Column::Type,
    Column::Profit,
    Column::Volume,
];

/// How the records of a [`ParsedTable`] were obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSource {
    /// Header block found; rows mapped with these columns
    Header(Vec<Column>),
    /// No header; text handed to the notification parser
    Fallback,
}

/// Result of parsing the positions panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTable {
    /// Where the records came from
    pub source: TableSource,
    /// Parsed rows, in rendered order
    pub records: Vec<PositionRecord>,
}

impl ParsedTable {
    /// First row, if any
    #[must_use]
    pub fn first(&self) -> Option<&PositionRecord> {
        self.records.first()
    }

    /// Row with the given order number
    #[must_use]
    pub fn find_order(&self, order_id: &str) -> Option<&PositionRecord> {
        self.records
            .iter()
            .find(|r| r.order_id.as_deref() == Some(order_id))
    }
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("valid date regex"))
}

fn order_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Order No\.?\s*#?\s*(\d+)").expect("valid order regex"))
}

fn order_symbol_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Order No\.?\s*#?\s*\d+\s+([A-Za-z][A-Za-z0-9./_-]*)")
            .expect("valid symbol regex")
    })
}

fn volume_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)").expect("valid volume regex"))
}

fn signed_decimal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?\d[\d,]*(?:\.\d+)?$").expect("valid decimal regex"))
}

fn lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

/// Parse one notification feed entry.
///
/// Field rules, each taking the first line that qualifies:
/// - `date`: contains `YYYY-MM-DD`
/// - `order_id` / `symbol`: extracted independently from a line containing
///   `Order No.`
/// - `side`: a line that is exactly `BUY` or `SELL`
/// - `volume`: a line containing "volume", first decimal on it
/// - `profit`: a standalone signed decimal, not the volume line, before a
///   line reading `at`
///
/// The title is not part of the body; callers fill it in.
#[must_use]
pub fn parse_notification_text(text: &str) -> NotificationRecord {
    let mut record = NotificationRecord::default();
    let mut volume_line = None;
    let mut past_sentinel = false;

    for (idx, line) in lines(text).into_iter().enumerate() {
        if record.date.is_none() && date_re().is_match(line) {
            record.date = Some(line.to_string());
        }

        if line.contains("Order No") {
            if record.order_id.is_none() {
                record.order_id = order_id_re()
                    .captures(line)
                    .map(|c| c[1].to_string());
            }
            if record.symbol.is_none() {
                record.symbol = order_symbol_re()
                    .captures(line)
                    .map(|c| c[1].to_ascii_uppercase());
            }
        }

        if record.side.is_none() {
            let upper = line.to_ascii_uppercase();
            if upper == "BUY" {
                record.side = Some(TradeSide::Buy);
            } else if upper == "SELL" {
                record.side = Some(TradeSide::Sell);
            }
        }

        if record.volume.is_none() && line.to_ascii_lowercase().contains("volume") {
            if let Some(caps) = volume_re().captures(line) {
                record.volume = Some(caps[1].to_string());
                volume_line = Some(idx);
            }
        }

        if line.eq_ignore_ascii_case("at") {
            past_sentinel = true;
        } else if !past_sentinel
            && record.profit.is_none()
            && volume_line != Some(idx)
            && signed_decimal_re().is_match(line)
        {
            record.profit = Some(line.to_string());
        }
    }

    record
}

/// Find the header block: the first run of consecutive header labels that
/// names at least date, order number, symbol and type.
fn find_header(lines: &[&str]) -> Option<(usize, Vec<Column>)> {
    let mut i = 0;
    while i < lines.len() {
        let mut columns = Vec::new();
        let mut j = i;
        while j < lines.len() {
            match Column::from_label(lines[j]) {
                Some(column) => columns.push(column),
                None => break,
            }
            j += 1;
        }

        let required = [Column::Date, Column::OrderId, Column::Symbol, Column::Type];
        if required.iter().all(|c| columns.contains(c)) {
            return Some((j, columns));
        }
        i = j.max(i + 1);
    }
    None
}

fn parse_row(columns: &[Column], cells: &[&str]) -> Option<PositionRecord> {
    let mut record = PositionRecord {
        raw_text: cells.join("\n"),
        ..PositionRecord::default()
    };

    for (column, cell) in columns.iter().zip(cells) {
        let cell = (*cell).to_string();
        match column {
            Column::Date => record.date = Some(cell),
            Column::OrderId => record.order_id = Some(cell),
            Column::Symbol => record.symbol = Some(cell),
            Column::Type => record.side = cell.parse().ok(),
            Column::Profit => record.profit = Some(cell),
            Column::Volume => record.volume = Some(cell),
            Column::Price => record.price = Some(cell),
            Column::StopLoss => record.stop_loss = Some(cell),
            Column::TakeProfit => record.take_profit = Some(cell),
            Column::Other => {}
        }
    }

    let date_ok = record.date.as_deref().is_some_and(|d| date_re().is_match(d));
    let id_ok = record
        .order_id
        .as_deref()
        .is_some_and(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()));
    (date_ok && id_ok && record.side.is_some()).then_some(record)
}

/// Parse the visible text of the positions or pending orders panel.
///
/// Column order comes from the header block, so a reordered table still maps
/// correctly. Rows are consecutive header-width line groups; parsing stops at
/// the first group whose date, order number or type does not check out.
/// Without a recognisable header the text is treated as a single notification
/// entry.
#[must_use]
pub fn parse_position_table(text: &str) -> ParsedTable {
    let all = lines(text);

    let Some((body_start, columns)) = find_header(&all) else {
        debug!("no table header found, using notification parser");
        let notification = parse_notification_text(text);
        let records = if notification.has_fields() {
            vec![PositionRecord {
                date: notification.date,
                order_id: notification.order_id,
                symbol: notification.symbol,
                side: notification.side,
                volume: notification.volume,
                profit: notification.profit,
                raw_text: text.to_string(),
                ..PositionRecord::default()
            }]
        } else {
            Vec::new()
        };
        return ParsedTable {
            source: TableSource::Fallback,
            records,
        };
    };

    let width = columns.len();
    let records = all[body_start..]
        .chunks_exact(width)
        .map_while(|cells| parse_row(&columns, cells))
        .collect::<Vec<_>>();
    debug!(rows = records.len(), ?columns, "parsed position table");

    ParsedTable {
        source: TableSource::Header(columns),
        records,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FEED_ENTRY: &str = "2024-05-01 10:00:00\n\
        Order No. 456 AUDUSD\n\
        BUY\n\
        volume 1.0\n\
        -12.34\n\
        at\n\
        0.65432";

    const TABLE: &str = "Open Positions\n\
        Open Date\nOrder No.\nSymbol\nType\nProfit\nVolume\n\
        2024-05-01 10:00:00\n123456\nAUDUSD\nBUY\n1.25\n0.01\n\
        2024-05-01 10:05:00\n123457\nEURUSD\nSELL\n-0.40\n0.02\n\
        Showing 2 positions";

    mod notification_parser_tests {
        use super::*;

        #[test]
        fn test_documented_pattern() {
            let record = parse_notification_text(FEED_ENTRY);
            assert_eq!(record.date.as_deref(), Some("2024-05-01 10:00:00"));
            assert_eq!(record.order_id.as_deref(), Some("456"));
            assert_eq!(record.symbol.as_deref(), Some("AUDUSD"));
            assert_eq!(record.side, Some(TradeSide::Buy));
            assert_eq!(record.volume.as_deref(), Some("1.0"));
            assert_eq!(record.profit.as_deref(), Some("-12.34"));
            assert!(record.title.is_empty());
        }

        #[test]
        fn test_profit_after_sentinel_ignored() {
            let record = parse_notification_text("SELL\nat\n5.00");
            assert_eq!(record.side, Some(TradeSide::Sell));
            assert!(record.profit.is_none());
        }

        #[test]
        fn test_standalone_volume_not_taken_as_profit() {
            let record = parse_notification_text("volume\n2.5\n+3.10");
            // "volume" alone has no number, so the next decimal is profit
            assert!(record.volume.is_none());
            assert_eq!(record.profit.as_deref(), Some("2.5"));

            let record = parse_notification_text("Volume: 2.5\n+3.10");
            assert_eq!(record.volume.as_deref(), Some("2.5"));
            assert_eq!(record.profit.as_deref(), Some("+3.10"));
        }

        #[test]
        fn test_symbol_and_id_independent() {
            let record = parse_notification_text("Order No. #789");
            assert_eq!(record.order_id.as_deref(), Some("789"));
            assert!(record.symbol.is_none());
        }

        #[test]
        fn test_empty_text() {
            let record = parse_notification_text("");
            assert!(!record.has_fields());
        }
    }

    mod position_parser_tests {
        use super::*;

        #[test]
        fn test_reads_rows_after_header() {
            let table = parse_position_table(TABLE);
            assert_eq!(table.source, TableSource::Header(DEFAULT_COLUMNS.to_vec()));
            assert_eq!(table.records.len(), 2);

            let first = table.first().unwrap();
            assert_eq!(first.date.as_deref(), Some("2024-05-01 10:00:00"));
            assert_eq!(first.order_id.as_deref(), Some("123456"));
            assert_eq!(first.symbol.as_deref(), Some("AUDUSD"));
            assert_eq!(first.side, Some(TradeSide::Buy));
            assert_eq!(first.profit.as_deref(), Some("1.25"));
            assert_eq!(first.volume.as_deref(), Some("0.01"));

            let second = table.find_order("123457").unwrap();
            assert_eq!(second.side, Some(TradeSide::Sell));
        }

        #[test]
        fn test_reordered_header_maps_by_label() {
            let text = "Symbol\nOrder No.\nType\nOpen Date\nVolume\nProfit\n\
                AUDUSD\n42\nSELL\n2024-06-01\n0.10\n-1.00";
            let table = parse_position_table(text);
            let row = table.first().unwrap();
            assert_eq!(row.symbol.as_deref(), Some("AUDUSD"));
            assert_eq!(row.order_id.as_deref(), Some("42"));
            assert_eq!(row.volume.as_deref(), Some("0.10"));
            assert_eq!(row.profit.as_deref(), Some("-1.00"));
        }

        #[test]
        fn test_price_and_levels_columns() {
            let text = "Open Date\nOrder No.\nSymbol\nType\nEntry Price\nS/L\nT/P\nSwap\nVolume\n\
                2024-05-01 10:00:00\n7\nAUDUSD\nBUY\n0.65432\n0.64778\n0.66086\n0.00\n100";
            let table = parse_position_table(text);
            let row = table.find_order("7").unwrap();
            assert_eq!(row.price.as_deref(), Some("0.65432"));
            assert_eq!(row.stop_loss.as_deref(), Some("0.64778"));
            assert_eq!(row.take_profit.as_deref(), Some("0.66086"));
            assert_eq!(row.volume.as_deref(), Some("100"));
            assert_eq!(Column::from_label("Current Price"), Some(Column::Other));
            assert_eq!(Column::from_label("TP"), Some(Column::TakeProfit));
        }

        #[test]
        fn test_stops_at_invalid_row() {
            let text = "Open Date\nOrder No.\nSymbol\nType\nProfit\nVolume\n\
                not-a-date\n1\nAUDUSD\nBUY\n0\n0.01";
            let table = parse_position_table(text);
            assert!(matches!(table.source, TableSource::Header(_)));
            assert!(table.records.is_empty());
        }

        #[test]
        fn test_garbage_falls_back_without_error() {
            let table = parse_position_table("@@@ random ### text\nnothing here");
            assert_eq!(table.source, TableSource::Fallback);
            assert!(table.records.is_empty());
        }

        #[test]
        fn test_fallback_uses_notification_fields() {
            let table = parse_position_table(FEED_ENTRY);
            assert_eq!(table.source, TableSource::Fallback);
            let row = table.first().unwrap();
            assert_eq!(row.order_id.as_deref(), Some("456"));
            assert_eq!(row.raw_text, FEED_ENTRY);
        }

        #[test]
        fn test_partial_header_is_not_a_header() {
            let table = parse_position_table("Symbol\nType\nAUDUSD\nBUY");
            assert_eq!(table.source, TableSource::Fallback);
        }
    }

    proptest! {
        #[test]
        fn prop_parsers_never_panic(text in "\\PC{0,200}") {
            let _ = parse_notification_text(&text);
            let _ = parse_position_table(&text);
        }

        #[test]
        fn prop_header_rows_always_validated(id in "[0-9]{1,9}", vol in "[0-9]\\.[0-9]{2}") {
            let text = format!(
                "Open Date\nOrder No.\nSymbol\nType\nProfit\nVolume\n2024-01-02\n{id}\nXAUUSD\nSELL\n1.00\n{vol}"
            );
            let table = parse_position_table(&text);
            prop_assert_eq!(table.records.len(), 1);
            prop_assert_eq!(table.records[0].order_id.as_deref(), Some(id.as_str()));
            prop_assert_eq!(table.records[0].volume.as_deref(), Some(vol.as_str()));
        }
    }
}
