//! AQX Trader E2E: browser-driven UI tests for the AQX Trader web terminal.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      AQX-E2E Architecture                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Scenario   │    │ Page       │    │ PageDriver │            │
//! │   │ Catalogue  │───►│ Objects    │───►│ (chromium  │            │
//! │   │ + Runner   │    │ Login/Trade│    │  or mock)  │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │         │                 │                                      │
//! │         ▼                 ▼                                      │
//! │   ┌────────────┐    ┌────────────┐                               │
//! │   │ Suite      │    │ Parser +   │                               │
//! │   │ Report     │    │ Matcher    │                               │
//! │   └────────────┘    └────────────┘                               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pages talk to the browser only through [`PageDriver`], so every scenario
//! runs unchanged against [`MockDriver`] in unit tests.

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

mod browser;
mod config;
mod driver;
mod locator;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod page_object;
mod result;
mod wait;

/// Parsing of position tables and notification text
pub mod parser;

/// Pairing of open positions with notification entries
pub mod matcher;

/// Domain records (positions, notifications, order tickets)
pub mod records;

/// Page objects for the login and trade screens
pub mod pages;

/// Scenario type, categories and assertion errors
pub mod scenario;

/// The scenario catalogue
pub mod scenarios;

/// Suite execution and reporting
pub mod runner;

pub use browser::{BrowserConfig, STEALTH_ARGS};
#[cfg(feature = "browser")]
pub use browser::{ChromiumDriver, ChromiumLauncher};
pub use config::{
    SuiteConfig, DEFAULT_BASE_URL, DEFAULT_SYMBOL, DEFAULT_VOLUME, INVALID_PASSWORD,
    INVALID_USERNAME,
};
pub use driver::{ElementState, MockDriver, MockElement, PageDriver};
pub use locator::{xpath_literal, Locator, Strategy};
pub use matcher::{match_position, Match, MatchKind};
pub use page_object::{BasePage, PageObject, PageOptions};
pub use pages::{LoginPage, TradePage};
pub use parser::{parse_notification_text, parse_position_table, Column, ParsedTable};
pub use records::{
    ExpiryType, NotificationRecord, OrderTicket, OrderType, PositionRecord, Quote, TradeSide,
};
pub use result::{Lookup, ProbeError, ProbeResult};
pub use runner::{
    NoopObserver, Outcome, ScenarioReport, Selection, SessionLauncher, SessionMode,
    SuiteObserver, SuiteReport, SuiteRunner,
};
pub use scenario::{Category, Scenario, ScenarioError, ScenarioResult};
pub use wait::{
    wait_for, Condition, WaitOptions, DEFAULT_CHECK_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_WAIT_TIMEOUT_MS,
};
