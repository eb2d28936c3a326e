//! Suite configuration shared by every scenario.

use crate::page_object::PageOptions;
use crate::wait::{WaitOptions, DEFAULT_CHECK_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Production web trader
pub const DEFAULT_BASE_URL: &str = "https://aqxtrader.aquariux.com";

/// Symbol traded by the order scenarios
pub const DEFAULT_SYMBOL: &str = "AUDUSD";

/// Volume typed into the order panel
pub const DEFAULT_VOLUME: &str = "100";

/// Username used by the invalid-username scenario
pub const INVALID_USERNAME: &str = "invalid_user";

/// Password used by the invalid-password scenario
pub const INVALID_PASSWORD: &str = "wrong_password";

/// Target site, account and pacing for a suite run
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Site root
    pub base_url: String,
    /// Demo account login
    pub username: String,
    /// Demo account password
    pub password: String,
    /// Symbol traded by the order scenarios
    pub symbol: String,
    /// Volume typed into the order panel
    pub volume: String,
    /// Timeout for required interactions
    pub timeout: Duration,
    /// Timeout for best-effort checks
    pub check_timeout: Duration,
    /// Delay between polls
    pub poll_interval: Duration,
    /// Multiplier applied to settle delays
    pub settle_scale: f64,
    /// Pause between scenarios
    pub pause_between: Duration,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        let wait = WaitOptions::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            username: String::new(),
            password: String::new(),
            symbol: DEFAULT_SYMBOL.to_string(),
            volume: DEFAULT_VOLUME.to_string(),
            timeout: wait.timeout,
            check_timeout: Duration::from_millis(DEFAULT_CHECK_TIMEOUT_MS),
            poll_interval: wait.poll_interval,
            settle_scale: 1.0,
            pause_between: Duration::from_secs(1),
        }
    }
}

impl fmt::Debug for SuiteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuiteConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("symbol", &self.symbol)
            .field("volume", &self.volume)
            .field("timeout", &self.timeout)
            .field("check_timeout", &self.check_timeout)
            .field("poll_interval", &self.poll_interval)
            .field("settle_scale", &self.settle_scale)
            .field("pause_between", &self.pause_between)
            .finish()
    }
}

impl SuiteConfig {
    /// Create config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set site root
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set account credentials
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Set traded symbol
    #[must_use]
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    /// Set order volume
    #[must_use]
    pub fn with_volume(mut self, volume: impl Into<String>) -> Self {
        self.volume = volume.into();
        self
    }

    /// Set required-interaction timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set best-effort check timeout
    #[must_use]
    pub const fn with_check_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout = timeout;
        self
    }

    /// Set polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set settle multiplier (0 disables settle delays)
    #[must_use]
    pub const fn with_settle_scale(mut self, scale: f64) -> Self {
        self.settle_scale = scale;
        self
    }

    /// Set pause between scenarios
    #[must_use]
    pub const fn with_pause_between(mut self, pause: Duration) -> Self {
        self.pause_between = pause;
        self
    }

    /// Login page URL
    #[must_use]
    pub fn login_url(&self) -> String {
        format!("{}/", self.base_url.trim_end_matches('/'))
    }

    /// Trade page URL
    #[must_use]
    pub fn trade_url(&self) -> String {
        format!("{}/web/trade", self.base_url.trim_end_matches('/'))
    }

    /// Whether login credentials were supplied
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    /// Page object options derived from the timeouts
    #[must_use]
    pub fn page_options(&self) -> PageOptions {
        PageOptions::new()
            .with_wait(
                WaitOptions::new()
                    .with_timeout(self.timeout)
                    .with_poll_interval(self.poll_interval),
            )
            .with_check_timeout(self.check_timeout)
            .with_settle_scale(self.settle_scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod defaults_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = SuiteConfig::default();
            assert_eq!(config.base_url, DEFAULT_BASE_URL);
            assert_eq!(config.symbol, "AUDUSD");
            assert_eq!(config.timeout, Duration::from_secs(10));
            assert_eq!(config.check_timeout, Duration::from_secs(5));
            assert!(!config.has_credentials());
        }

        #[test]
        fn test_derived_urls() {
            let config = SuiteConfig::new().with_base_url("https://demo.example.com/");
            assert_eq!(config.login_url(), "https://demo.example.com/");
            assert_eq!(config.trade_url(), "https://demo.example.com/web/trade");
        }
    }

    mod builder_tests {
        use super::*;

        #[test]
        fn test_page_options_follow_config() {
            let config = SuiteConfig::new()
                .with_timeout(Duration::from_millis(250))
                .with_poll_interval(Duration::from_millis(10))
                .with_check_timeout(Duration::from_millis(50))
                .with_settle_scale(0.0);
            let options = config.page_options();
            assert_eq!(options.wait.timeout, Duration::from_millis(250));
            assert_eq!(options.wait.poll_interval, Duration::from_millis(10));
            assert_eq!(options.check_timeout, Duration::from_millis(50));
            assert!(options.settle_scale.abs() < f64::EPSILON);
        }

        #[test]
        fn test_debug_hides_password() {
            let config = SuiteConfig::new().with_credentials("1001186", "hunter2");
            assert!(config.has_credentials());
            let shown = format!("{config:?}");
            assert!(shown.contains("1001186"));
            assert!(!shown.contains("hunter2"));
        }
    }
}
