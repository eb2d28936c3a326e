//! Page Object Model support.
//!
//! [`PageObject`] describes a screen; [`BasePage`] is the element wait/action
//! helper every screen composes. Required interactions (`click`, `type_text`,
//! `get_text`, `wait_until_disappear`) fail with
//! [`ProbeError::ElementNotReady`]; best-effort checks return `bool` or a
//! [`Lookup`] instead of erroring.

use crate::driver::{ElementState, PageDriver};
use crate::locator::Locator;
use crate::result::{Lookup, ProbeError, ProbeResult};
use crate::wait::{wait_for, Condition, WaitOptions, DEFAULT_CHECK_TIMEOUT_MS};
use std::time::Duration;
use tracing::warn;

/// A screen of the application under test
pub trait PageObject {
    /// Path of the page relative to the base URL (e.g. "/web/trade")
    fn url_path(&self) -> &str;

    /// Name used in logs
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Absolute URL of the page under `base_url`
    fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.url_path())
    }
}

/// Waiting and pacing knobs shared by all page objects
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageOptions {
    /// Default wait for required interactions
    pub wait: WaitOptions,
    /// Timeout for best-effort checks
    pub check_timeout: Duration,
    /// Multiplier applied to settle delays (0 disables them)
    pub settle_scale: f64,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            wait: WaitOptions::default(),
            check_timeout: Duration::from_millis(DEFAULT_CHECK_TIMEOUT_MS),
            settle_scale: 1.0,
        }
    }
}

impl PageOptions {
    /// Create new options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set wait options
    #[must_use]
    pub const fn with_wait(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Set best-effort check timeout
    #[must_use]
    pub const fn with_check_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout = timeout;
        self
    }

    /// Set settle multiplier
    #[must_use]
    pub const fn with_settle_scale(mut self, scale: f64) -> Self {
        self.settle_scale = scale;
        self
    }
}

/// Element wait/action helper over a borrowed driver
#[derive(Clone, Copy)]
pub struct BasePage<'a> {
    driver: &'a dyn PageDriver,
    options: PageOptions,
}

impl std::fmt::Debug for BasePage<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasePage")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<'a> BasePage<'a> {
    /// Wrap a driver
    #[must_use]
    pub fn new(driver: &'a dyn PageDriver, options: PageOptions) -> Self {
        Self { driver, options }
    }

    /// The underlying driver
    #[must_use]
    pub fn driver(&self) -> &'a dyn PageDriver {
        self.driver
    }

    /// The page options
    #[must_use]
    pub const fn options(&self) -> &PageOptions {
        &self.options
    }

    /// Wait with the default options, turning anything but `Found` into an error
    async fn require(&self, locator: &Locator, condition: Condition) -> ProbeResult<ElementState> {
        match wait_for(self.driver, locator, condition, &self.options.wait).await? {
            Lookup::Found(state) => Ok(state),
            Lookup::NotFound => Err(ProbeError::ElementNotReady {
                locator: locator.to_string(),
                condition: condition.to_string(),
                waited_ms: duration_ms(self.options.wait.timeout),
            }),
            Lookup::TimedOut { waited_ms } => Err(ProbeError::ElementNotReady {
                locator: locator.to_string(),
                condition: condition.to_string(),
                waited_ms,
            }),
        }
    }

    /// Navigate to an absolute URL
    pub async fn open_url(&self, url: &str) -> ProbeResult<()> {
        self.driver.navigate(url).await
    }

    /// Wait until clickable, then click
    pub async fn click(&self, locator: &Locator) -> ProbeResult<()> {
        self.require(locator, Condition::Clickable).await?;
        self.driver.click(locator).await
    }

    /// Wait until visible, clear, then type
    pub async fn type_text(&self, locator: &Locator, text: &str) -> ProbeResult<()> {
        self.require(locator, Condition::Visible).await?;
        self.driver.clear(locator).await?;
        self.driver.type_text(locator, text).await
    }

    /// Wait until visible, then read its text
    pub async fn get_text(&self, locator: &Locator) -> ProbeResult<String> {
        self.require(locator, Condition::Visible).await?;
        Ok(self.driver.inner_text(locator).await?.unwrap_or_default())
    }

    /// Wait until the element is no longer rendered
    pub async fn wait_until_disappear(&self, locator: &Locator) -> ProbeResult<()> {
        self.require(locator, Condition::Absent).await.map(|_| ())
    }

    /// Wait until visible, required
    pub async fn wait_visible(&self, locator: &Locator) -> ProbeResult<()> {
        self.require(locator, Condition::Visible).await.map(|_| ())
    }

    /// Three-way lookup with an explicit timeout.
    ///
    /// Driver failures are logged and reported as `TimedOut` with zero wait so
    /// callers only have one type to match on.
    pub async fn probe(
        &self,
        locator: &Locator,
        condition: Condition,
        timeout: Duration,
    ) -> Lookup<ElementState> {
        let options = self.options.wait.with_timeout(timeout);
        match wait_for(self.driver, locator, condition, &options).await {
            Ok(lookup) => lookup,
            Err(e) => {
                warn!(%locator, %condition, error = %e, "probe failed");
                Lookup::TimedOut { waited_ms: 0 }
            }
        }
    }

    /// Best-effort visibility check
    pub async fn is_element_visible(&self, locator: &Locator, timeout: Duration) -> bool {
        self.probe(locator, Condition::Visible, timeout)
            .await
            .is_found()
    }

    /// Best-effort presence check
    pub async fn is_element_present(&self, locator: &Locator, timeout: Duration) -> bool {
        self.probe(locator, Condition::Present, timeout)
            .await
            .is_found()
    }

    /// Visibility check with the configured check timeout (5 seconds by default)
    pub async fn is_visible(&self, locator: &Locator) -> bool {
        self.is_element_visible(locator, self.options.check_timeout)
            .await
    }

    /// Three-way lookup with the configured check timeout
    pub async fn check(&self, locator: &Locator, condition: Condition) -> Lookup<ElementState> {
        self.probe(locator, condition, self.options.check_timeout)
            .await
    }

    /// Read text if the element becomes visible within `timeout`
    pub async fn text_if_visible(&self, locator: &Locator, timeout: Duration) -> Lookup<String> {
        match self.probe(locator, Condition::Visible, timeout).await {
            Lookup::Found(_) => match self.driver.inner_text(locator).await {
                Ok(Some(text)) => Lookup::Found(text),
                Ok(None) => Lookup::NotFound,
                Err(e) => {
                    warn!(%locator, error = %e, "text read failed");
                    Lookup::TimedOut { waited_ms: 0 }
                }
            },
            Lookup::NotFound => Lookup::NotFound,
            Lookup::TimedOut { waited_ms } => Lookup::TimedOut { waited_ms },
        }
    }

    /// Fixed delay for animations and async repaints, scaled by `settle_scale`
    pub async fn settle(&self, ms: u64) {
        if self.options.settle_scale <= 0.0 {
            return;
        }
        let scaled = Duration::from_millis(ms).mul_f64(self.options.settle_scale);
        tokio::time::sleep(scaled).await;
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement};

    const FIELD: Locator = Locator::name("userId");
    const BUTTON: Locator = Locator::test_id("submit");
    const SPINNER: Locator = Locator::css("div.spinner");

    fn options() -> PageOptions {
        PageOptions::new()
            .with_wait(
                WaitOptions::new()
                    .with_timeout(Duration::from_millis(40))
                    .with_poll_interval(Duration::from_millis(5)),
            )
            .with_check_timeout(Duration::from_millis(20))
            .with_settle_scale(0.0)
    }

    mod page_object_trait_tests {
        use super::*;

        #[derive(Debug)]
        struct Dashboard;

        impl PageObject for Dashboard {
            fn url_path(&self) -> &str {
                "/web/dashboard"
            }
        }

        #[test]
        fn test_default_page_name_is_type_name() {
            assert!(Dashboard.page_name().ends_with("Dashboard"));
            assert_eq!(Dashboard.url_path(), "/web/dashboard");
        }

        #[test]
        fn test_url_joins_base() {
            assert_eq!(
                Dashboard.url("https://aqxtrader.aquariux.com/"),
                "https://aqxtrader.aquariux.com/web/dashboard"
            );
        }
    }

    mod required_action_tests {
        use super::*;

        #[tokio::test]
        async fn test_type_text_clears_first() {
            let driver = MockDriver::new().with_element(&FIELD, MockElement::ready(""));
            let page = BasePage::new(&driver, options());
            page.type_text(&FIELD, "first").await.unwrap();
            page.type_text(&FIELD, "second").await.unwrap();
            assert_eq!(driver.value_of(&FIELD).as_deref(), Some("second"));
        }

        #[tokio::test]
        async fn test_click_missing_element_errors() {
            let driver = MockDriver::new();
            let page = BasePage::new(&driver, options());
            let err = page.click(&BUTTON).await.unwrap_err();
            match err {
                ProbeError::ElementNotReady { condition, .. } => {
                    assert_eq!(condition, "clickable");
                }
                other => panic!("unexpected error: {other}"),
            }
            assert!(!driver.was_called("click"));
        }

        #[tokio::test]
        async fn test_get_text() {
            let driver = MockDriver::new().with_element(&BUTTON, MockElement::ready("Log in"));
            let page = BasePage::new(&driver, options());
            assert_eq!(page.get_text(&BUTTON).await.unwrap(), "Log in");
        }

        #[tokio::test]
        async fn test_wait_until_disappear() {
            let driver = MockDriver::new().with_element(&SPINNER, MockElement::ready(""));
            let page = BasePage::new(&driver, options());
            assert!(page.wait_until_disappear(&SPINNER).await.is_err());
            driver.set_element(&SPINNER, MockElement::hidden());
            assert!(page.wait_until_disappear(&SPINNER).await.is_ok());
        }
    }

    mod best_effort_tests {
        use super::*;

        #[tokio::test]
        async fn test_visibility_and_presence() {
            let driver = MockDriver::new().with_element(&SPINNER, MockElement::hidden());
            let page = BasePage::new(&driver, options());
            let short = Duration::from_millis(20);
            assert!(!page.is_element_visible(&SPINNER, short).await);
            assert!(page.is_element_present(&SPINNER, short).await);
            assert!(!page.is_element_present(&BUTTON, short).await);
        }

        #[tokio::test]
        async fn test_probe_distinguishes_causes() {
            let driver = MockDriver::new().with_element(&SPINNER, MockElement::hidden());
            let page = BasePage::new(&driver, options());
            let short = Duration::from_millis(20);
            assert!(matches!(
                page.probe(&SPINNER, Condition::Visible, short).await,
                Lookup::TimedOut { .. }
            ));
            assert_eq!(
                page.probe(&BUTTON, Condition::Visible, short).await,
                Lookup::NotFound
            );
        }

        #[tokio::test]
        async fn test_text_if_visible() {
            let driver = MockDriver::new().with_element(&BUTTON, MockElement::ready("Invalid"));
            let page = BasePage::new(&driver, options());
            let short = Duration::from_millis(20);
            assert_eq!(
                page.text_if_visible(&BUTTON, short).await,
                Lookup::Found("Invalid".to_string())
            );
            assert_eq!(page.text_if_visible(&FIELD, short).await, Lookup::NotFound);
        }

        #[tokio::test]
        async fn test_settle_disabled() {
            let driver = MockDriver::new();
            let page = BasePage::new(&driver, options());
            let start = std::time::Instant::now();
            page.settle(5_000).await;
            assert!(start.elapsed() < Duration::from_millis(100));
        }
    }
}
