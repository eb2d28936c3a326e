//! Locators: how a UI element is found in the rendered page.
//!
//! A locator is a strategy tag plus a selector string. Page objects declare
//! theirs as `const` items; locators that depend on runtime data (a row
//! scoped by order number) are built with the `*_owned` constructors.
//!
//! Every locator renders to:
//! - a JavaScript expression yielding the first match (or `null`),
//! - a JavaScript expression yielding an array of all matches,
//! - an XPath expression (CSS locators excepted) for native lookups.

use std::borrow::Cow;
use std::fmt;

/// How the selector string is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// CSS selector
    Css,
    /// XPath expression
    XPath,
    /// Value of the `name` attribute
    Name,
    /// Value of the `data-testid` attribute
    TestId,
}

impl Strategy {
    /// Short tag used in logs and error messages
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::XPath => "xpath",
            Self::Name => "name",
            Self::TestId => "testid",
        }
    }
}

/// A reference to one or more elements of the rendered page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    strategy: Strategy,
    value: Cow<'static, str>,
}

impl Locator {
    /// CSS selector locator
    #[must_use]
    pub const fn css(selector: &'static str) -> Self {
        Self {
            strategy: Strategy::Css,
            value: Cow::Borrowed(selector),
        }
    }

    /// XPath locator
    #[must_use]
    pub const fn xpath(expr: &'static str) -> Self {
        Self {
            strategy: Strategy::XPath,
            value: Cow::Borrowed(expr),
        }
    }

    /// `name` attribute locator
    #[must_use]
    pub const fn name(name: &'static str) -> Self {
        Self {
            strategy: Strategy::Name,
            value: Cow::Borrowed(name),
        }
    }

    /// `data-testid` attribute locator
    #[must_use]
    pub const fn test_id(id: &'static str) -> Self {
        Self {
            strategy: Strategy::TestId,
            value: Cow::Borrowed(id),
        }
    }

    /// XPath locator built at runtime
    #[must_use]
    pub fn xpath_owned(expr: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::XPath,
            value: Cow::Owned(expr.into()),
        }
    }

    /// Strategy tag
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Raw selector string
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// XPath form of this locator, `None` for CSS locators
    #[must_use]
    pub fn to_xpath(&self) -> Option<String> {
        match self.strategy {
            Strategy::Css => None,
            Strategy::XPath => Some(self.value.to_string()),
            Strategy::Name => Some(format!("//*[@name={}]", xpath_literal(&self.value))),
            Strategy::TestId => Some(format!("//*[@data-testid={}]", xpath_literal(&self.value))),
        }
    }

    /// JavaScript expression evaluating to the first matching element or `null`
    #[must_use]
    pub fn to_query(&self) -> String {
        match self.to_xpath() {
            None => format!("document.querySelector({})", js_literal(&self.value)),
            Some(xpath) => format!(
                "document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
                js_literal(&xpath)
            ),
        }
    }

    /// JavaScript expression evaluating to an array of every matching element
    #[must_use]
    pub fn to_query_all(&self) -> String {
        match self.to_xpath() {
            None => format!(
                "Array.from(document.querySelectorAll({}))",
                js_literal(&self.value)
            ),
            Some(xpath) => format!(
                "(() => {{ const snap = document.evaluate({}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
                 const out = []; for (let i = 0; i < snap.snapshotLength; i++) {{ out.push(snap.snapshotItem(i)); }} return out; }})()",
                js_literal(&xpath)
            ),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy.tag(), self.value)
    }
}

/// Quote a string as a JavaScript string literal
fn js_literal(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Quote a string as an XPath 1.0 literal.
///
/// XPath 1.0 has no escape sequences, so strings containing both quote kinds
/// go through `concat()`.
#[must_use]
pub fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        format!("'{s}'")
    } else if !s.contains('"') {
        format!("\"{s}\"")
    } else {
        let parts: Vec<String> = s.split('\'').map(|p| format!("'{p}'")).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const SUBMIT: Locator = Locator::test_id("login-submit");

    mod constructor_tests {
        use super::*;

        #[test]
        fn test_const_locator() {
            assert_eq!(SUBMIT.strategy(), Strategy::TestId);
            assert_eq!(SUBMIT.value(), "login-submit");
        }

        #[test]
        fn test_owned_locator_equals_const() {
            let owned = Locator::xpath_owned("//div".to_string());
            assert_eq!(owned, Locator::xpath("//div"));
        }

        #[test]
        fn test_display_includes_strategy() {
            assert_eq!(Locator::name("userId").to_string(), "name=userId");
            assert_eq!(Locator::css("div.chart").to_string(), "css=div.chart");
        }
    }

    mod xpath_tests {
        use super::*;

        #[test]
        fn test_name_to_xpath() {
            assert_eq!(
                Locator::name("password").to_xpath().as_deref(),
                Some("//*[@name='password']")
            );
        }

        #[test]
        fn test_test_id_to_xpath() {
            assert_eq!(
                SUBMIT.to_xpath().as_deref(),
                Some("//*[@data-testid='login-submit']")
            );
        }

        #[test]
        fn test_css_has_no_xpath() {
            assert!(Locator::css("button").to_xpath().is_none());
        }

        #[test]
        fn test_xpath_literal_quotes() {
            assert_eq!(xpath_literal("abc"), "'abc'");
            assert_eq!(xpath_literal("it's"), "\"it's\"");
            assert_eq!(xpath_literal("a'b\"c"), "concat('a', \"'\", 'b\"c')");
        }
    }

    mod query_tests {
        use super::*;

        #[test]
        fn test_css_query() {
            let query = Locator::css("input[name='lotSize']").to_query();
            assert_eq!(query, "document.querySelector(\"input[name='lotSize']\")");
        }

        #[test]
        fn test_xpath_query_is_escaped() {
            let query = Locator::xpath("//div[text()=\"Market\"]").to_query();
            assert!(query.starts_with("document.evaluate("));
            assert!(query.contains("\\\"Market\\\""));
            assert!(query.contains("FIRST_ORDERED_NODE_TYPE"));
        }

        #[test]
        fn test_query_all_variants() {
            assert!(Locator::css("li")
                .to_query_all()
                .starts_with("Array.from(document.querySelectorAll("));
            assert!(SUBMIT.to_query_all().contains("ORDERED_NODE_SNAPSHOT_TYPE"));
        }
    }
}
