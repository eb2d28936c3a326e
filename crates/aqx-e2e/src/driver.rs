//! Page driver seam between page objects and the browser.
//!
//! Page objects only ever talk to [`PageDriver`]. The Chromium implementation
//! lives in `browser` (feature `browser`); [`MockDriver`] keeps an in-memory
//! element table so page objects, waits and the runner can be tested without
//! a browser.

use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Snapshot of the first element matched by a locator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementState {
    /// Element exists in the DOM
    pub present: bool,
    /// Element has a non-empty box and is not hidden by style
    pub visible: bool,
    /// Element is not disabled
    pub enabled: bool,
}

impl ElementState {
    /// State reported for a locator with no match
    pub const MISSING: Self = Self {
        present: false,
        visible: false,
        enabled: false,
    };

    /// Present, visible and enabled
    pub const READY: Self = Self {
        present: true,
        visible: true,
        enabled: true,
    };

    /// Present in the DOM but not rendered
    pub const HIDDEN: Self = Self {
        present: true,
        visible: false,
        enabled: true,
    };

    /// Visible and enabled, i.e. a click would land
    #[must_use]
    pub const fn is_clickable(&self) -> bool {
        self.visible && self.enabled
    }
}

/// Browser session as seen by the page objects.
///
/// All methods take `&self` so several page objects can share one session.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to URL and wait for the load event
    async fn navigate(&self, url: &str) -> ProbeResult<()>;

    /// Current page URL
    async fn current_url(&self) -> ProbeResult<String>;

    /// Reload the current page
    async fn reload(&self) -> ProbeResult<()>;

    /// State of the first element matching the locator (no waiting)
    async fn element_state(&self, locator: &Locator) -> ProbeResult<ElementState>;

    /// Click the first matching element
    async fn click(&self, locator: &Locator) -> ProbeResult<()>;

    /// Clear the value of the first matching input
    async fn clear(&self, locator: &Locator) -> ProbeResult<()>;

    /// Type text into the first matching element
    async fn type_text(&self, locator: &Locator, text: &str) -> ProbeResult<()>;

    /// Rendered text of the first matching element, `None` when absent
    async fn inner_text(&self, locator: &Locator) -> ProbeResult<Option<String>>;

    /// Rendered text of every matching element, in document order
    async fn inner_texts(&self, locator: &Locator) -> ProbeResult<Vec<String>>;

    /// Scroll the first matching element into view
    async fn scroll_into_view(&self, locator: &Locator) -> ProbeResult<()>;

    /// End the session
    async fn close(&self) -> ProbeResult<()>;
}

#[async_trait]
impl<D: PageDriver + ?Sized> PageDriver for Arc<D> {
    async fn navigate(&self, url: &str) -> ProbeResult<()> {
        (**self).navigate(url).await
    }

    async fn current_url(&self) -> ProbeResult<String> {
        (**self).current_url().await
    }

    async fn reload(&self) -> ProbeResult<()> {
        (**self).reload().await
    }

    async fn element_state(&self, locator: &Locator) -> ProbeResult<ElementState> {
        (**self).element_state(locator).await
    }

    async fn click(&self, locator: &Locator) -> ProbeResult<()> {
        (**self).click(locator).await
    }

    async fn clear(&self, locator: &Locator) -> ProbeResult<()> {
        (**self).clear(locator).await
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> ProbeResult<()> {
        (**self).type_text(locator, text).await
    }

    async fn inner_text(&self, locator: &Locator) -> ProbeResult<Option<String>> {
        (**self).inner_text(locator).await
    }

    async fn inner_texts(&self, locator: &Locator) -> ProbeResult<Vec<String>> {
        (**self).inner_texts(locator).await
    }

    async fn scroll_into_view(&self, locator: &Locator) -> ProbeResult<()> {
        (**self).scroll_into_view(locator).await
    }

    async fn close(&self) -> ProbeResult<()> {
        (**self).close().await
    }
}

/// An element in the mock page
#[derive(Debug, Clone, Default)]
pub struct MockElement {
    /// State once the element has appeared
    pub state: ElementState,
    /// Inner text of the first match
    pub text: String,
    /// Inner texts of all matches (falls back to `text`)
    pub texts: Vec<String>,
    /// Current input value
    pub value: String,
    /// Number of `element_state` polls before the element appears
    pub appears_after: u32,
}

impl MockElement {
    /// A visible, enabled element with the given text
    #[must_use]
    pub fn ready(text: impl Into<String>) -> Self {
        Self {
            state: ElementState::READY,
            text: text.into(),
            ..Self::default()
        }
    }

    /// A present but hidden element
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            state: ElementState::HIDDEN,
            ..Self::default()
        }
    }

    /// A visible element that is disabled
    #[must_use]
    pub fn disabled(text: impl Into<String>) -> Self {
        Self {
            state: ElementState {
                present: true,
                visible: true,
                enabled: false,
            },
            text: text.into(),
            ..Self::default()
        }
    }

    /// Several matches, each with its own text
    #[must_use]
    pub fn many<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let texts: Vec<String> = texts.into_iter().map(Into::into).collect();
        Self {
            state: ElementState::READY,
            text: texts.first().cloned().unwrap_or_default(),
            texts,
            ..Self::default()
        }
    }

    /// Delay appearance by a number of polls
    #[must_use]
    pub const fn after_polls(mut self, polls: u32) -> Self {
        self.appears_after = polls;
        self
    }
}

#[derive(Debug, Default)]
struct MockPage {
    url: String,
    elements: HashMap<String, MockElement>,
    on_click: HashMap<String, Vec<ClickEffect>>,
    history: Vec<String>,
    closed: bool,
}

#[derive(Debug, Clone)]
enum ClickEffect {
    Insert(String, MockElement),
    Remove(String),
}

/// In-memory driver for unit testing page objects.
///
/// Elements are keyed by the locator's display form, so tests register them
/// with the same `const` locators the page objects use.
#[derive(Debug, Default)]
pub struct MockDriver {
    page: Mutex<MockPage>,
}

impl MockDriver {
    /// Create an empty mock page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn page(&self) -> MutexGuard<'_, MockPage> {
        self.page
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Add or replace an element
    pub fn set_element(&self, locator: &Locator, element: MockElement) {
        let _ = self.page().elements.insert(locator.to_string(), element);
    }

    /// Builder form of [`MockDriver::set_element`]
    #[must_use]
    pub fn with_element(self, locator: &Locator, element: MockElement) -> Self {
        self.set_element(locator, element);
        self
    }

    /// Remove an element
    pub fn remove_element(&self, locator: &Locator) {
        let _ = self.page().elements.remove(&locator.to_string());
    }

    /// When `clicked` is clicked, insert `element` at `target`
    pub fn reveal_on_click(&self, clicked: &Locator, target: &Locator, element: MockElement) {
        self.page()
            .on_click
            .entry(clicked.to_string())
            .or_default()
            .push(ClickEffect::Insert(target.to_string(), element));
    }

    /// When `clicked` is clicked, remove `target`
    pub fn hide_on_click(&self, clicked: &Locator, target: &Locator) {
        self.page()
            .on_click
            .entry(clicked.to_string())
            .or_default()
            .push(ClickEffect::Remove(target.to_string()));
    }

    /// Current value of an input
    #[must_use]
    pub fn value_of(&self, locator: &Locator) -> Option<String> {
        self.page()
            .elements
            .get(&locator.to_string())
            .map(|e| e.value.clone())
    }

    /// Recorded calls, e.g. `click:name=userId`
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.page().history.clone()
    }

    /// Whether any recorded call starts with `prefix`
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.page().history.iter().any(|c| c.starts_with(prefix))
    }

    /// Whether `close` was called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.page().closed
    }

    fn record(&self, call: String) {
        self.page().history.push(call);
    }

    fn require(&self, locator: &Locator) -> ProbeResult<MockElement> {
        self.page()
            .elements
            .get(&locator.to_string())
            .filter(|e| e.appears_after == 0 && e.state.present)
            .cloned()
            .ok_or_else(|| ProbeError::driver(format!("no element matches {locator}")))
    }
}

#[async_trait]
impl PageDriver for MockDriver {
    async fn navigate(&self, url: &str) -> ProbeResult<()> {
        self.record(format!("navigate:{url}"));
        self.page().url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self.page().url.clone())
    }

    async fn reload(&self) -> ProbeResult<()> {
        self.record("reload".to_string());
        Ok(())
    }

    async fn element_state(&self, locator: &Locator) -> ProbeResult<ElementState> {
        let mut page = self.page();
        match page.elements.get_mut(&locator.to_string()) {
            Some(element) if element.appears_after > 0 => {
                element.appears_after -= 1;
                Ok(ElementState::MISSING)
            }
            Some(element) => Ok(element.state),
            None => Ok(ElementState::MISSING),
        }
    }

    async fn click(&self, locator: &Locator) -> ProbeResult<()> {
        let _ = self.require(locator)?;
        self.record(format!("click:{locator}"));
        let mut page = self.page();
        let effects = page
            .on_click
            .get(&locator.to_string())
            .cloned()
            .unwrap_or_default();
        for effect in effects {
            match effect {
                ClickEffect::Insert(key, element) => {
                    let _ = page.elements.insert(key, element);
                }
                ClickEffect::Remove(key) => {
                    let _ = page.elements.remove(&key);
                }
            }
        }
        Ok(())
    }

    async fn clear(&self, locator: &Locator) -> ProbeResult<()> {
        let _ = self.require(locator)?;
        self.record(format!("clear:{locator}"));
        if let Some(element) = self.page().elements.get_mut(&locator.to_string()) {
            element.value.clear();
        }
        Ok(())
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> ProbeResult<()> {
        let _ = self.require(locator)?;
        self.record(format!("type:{locator}:{text}"));
        if let Some(element) = self.page().elements.get_mut(&locator.to_string()) {
            element.value.push_str(text);
        }
        Ok(())
    }

    async fn inner_text(&self, locator: &Locator) -> ProbeResult<Option<String>> {
        Ok(self
            .page()
            .elements
            .get(&locator.to_string())
            .filter(|e| e.appears_after == 0 && e.state.present)
            .map(|e| e.text.clone()))
    }

    async fn inner_texts(&self, locator: &Locator) -> ProbeResult<Vec<String>> {
        Ok(self
            .page()
            .elements
            .get(&locator.to_string())
            .filter(|e| e.appears_after == 0 && e.state.present)
            .map(|e| {
                if e.texts.is_empty() {
                    vec![e.text.clone()]
                } else {
                    e.texts.clone()
                }
            })
            .unwrap_or_default())
    }

    async fn scroll_into_view(&self, locator: &Locator) -> ProbeResult<()> {
        let _ = self.require(locator)?;
        self.record(format!("scroll:{locator}"));
        Ok(())
    }

    async fn close(&self) -> ProbeResult<()> {
        self.record("close".to_string());
        self.page().closed = true;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const BUTTON: Locator = Locator::test_id("go");
    const BANNER: Locator = Locator::xpath("//span[@id='banner']");
    const FIELD: Locator = Locator::name("userId");

    mod element_state_tests {
        use super::*;

        #[test]
        fn test_clickable_requires_visible_and_enabled() {
            assert!(ElementState::READY.is_clickable());
            assert!(!ElementState::HIDDEN.is_clickable());
            assert!(!ElementState::MISSING.is_clickable());
            let disabled = MockElement::disabled("x").state;
            assert!(!disabled.is_clickable());
        }

        #[test]
        fn test_element_state_deserializes_from_js_shape() {
            let state: ElementState =
                serde_json::from_str(r#"{"present":true,"visible":false,"enabled":true}"#)
                    .unwrap();
            assert_eq!(state, ElementState::HIDDEN);
        }
    }

    mod mock_driver_tests {
        use super::*;

        #[tokio::test]
        async fn test_navigate_records_url() {
            let driver = MockDriver::new();
            driver.navigate("https://example.test/").await.unwrap();
            assert_eq!(driver.current_url().await.unwrap(), "https://example.test/");
            assert!(driver.was_called("navigate:https://example.test/"));
        }

        #[tokio::test]
        async fn test_missing_element_state() {
            let driver = MockDriver::new();
            let state = driver.element_state(&BUTTON).await.unwrap();
            assert_eq!(state, ElementState::MISSING);
            assert!(driver.click(&BUTTON).await.is_err());
        }

        #[tokio::test]
        async fn test_appears_after_polls() {
            let driver =
                MockDriver::new().with_element(&BUTTON, MockElement::ready("Go").after_polls(2));
            assert!(!driver.element_state(&BUTTON).await.unwrap().present);
            assert!(!driver.element_state(&BUTTON).await.unwrap().present);
            assert!(driver.element_state(&BUTTON).await.unwrap().visible);
        }

        #[tokio::test]
        async fn test_click_effects() {
            let driver = MockDriver::new().with_element(&BUTTON, MockElement::ready("Go"));
            driver.reveal_on_click(&BUTTON, &BANNER, MockElement::ready("Welcome"));
            driver.click(&BUTTON).await.unwrap();
            assert_eq!(
                driver.inner_text(&BANNER).await.unwrap().as_deref(),
                Some("Welcome")
            );

            driver.hide_on_click(&BUTTON, &BANNER);
            driver.click(&BUTTON).await.unwrap();
            assert!(driver.inner_text(&BANNER).await.unwrap().is_none());
        }

        #[tokio::test]
        async fn test_clear_and_type() {
            let driver = MockDriver::new().with_element(&FIELD, MockElement::ready(""));
            driver.type_text(&FIELD, "old").await.unwrap();
            driver.clear(&FIELD).await.unwrap();
            driver.type_text(&FIELD, "1001").await.unwrap();
            assert_eq!(driver.value_of(&FIELD).as_deref(), Some("1001"));
        }

        #[tokio::test]
        async fn test_inner_texts_falls_back_to_text() {
            let driver = MockDriver::new().with_element(&BANNER, MockElement::ready("one"));
            assert_eq!(driver.inner_texts(&BANNER).await.unwrap(), vec!["one"]);
            driver.set_element(&BANNER, MockElement::many(["a", "b"]));
            assert_eq!(driver.inner_texts(&BANNER).await.unwrap(), vec!["a", "b"]);
            driver.remove_element(&BANNER);
            assert!(driver.inner_texts(&BANNER).await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_close() {
            let driver = MockDriver::new();
            driver.close().await.unwrap();
            assert!(driver.is_closed());
        }
    }
}
