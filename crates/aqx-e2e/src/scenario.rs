//! Scenario model: an identified, categorised async check over one browser
//! session.

use crate::config::SuiteConfig;
use crate::driver::PageDriver;
use crate::result::ProbeError;
use futures::future::BoxFuture;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Why a scenario did not pass
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The page did not reach the expected state
    #[error("{message}")]
    Assertion {
        /// What was expected
        message: String,
    },

    /// Page or driver failure
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// The scenario cannot run with the given configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },
}

impl ScenarioError {
    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Expected-state failure, as opposed to an unexpected error
    #[must_use]
    pub const fn is_assertion(&self) -> bool {
        matches!(self, Self::Assertion { .. })
    }
}

/// Result type for scenario bodies
pub type ScenarioResult<T = ()> = Result<T, ScenarioError>;

/// Fail with an assertion error unless `condition` holds
pub fn ensure(condition: bool, message: impl Into<String>) -> ScenarioResult {
    if condition {
        Ok(())
    } else {
        Err(ScenarioError::assertion(message))
    }
}

/// Future returned by a scenario body
pub type ScenarioFuture<'a> = BoxFuture<'a, ScenarioResult>;

/// Scenario body
pub type ScenarioFn = for<'a> fn(&'a dyn PageDriver, &'a SuiteConfig) -> ScenarioFuture<'a>;

/// Scenario grouping used for selection and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Login screen
    Authentication,
    /// Order placement
    Trading,
    /// Position management
    Positions,
    /// Notification feed
    Notifications,
}

impl Category {
    /// Every category, in catalogue order
    pub const ALL: [Self; 4] = [
        Self::Authentication,
        Self::Trading,
        Self::Positions,
        Self::Notifications,
    ];

    /// Display label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Authentication => "Authentication",
            Self::Trading => "Trading",
            Self::Positions => "Positions",
            Self::Notifications => "Notifications",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auth" | "authentication" => Ok(Self::Authentication),
            "trade" | "trading" => Ok(Self::Trading),
            "pos" | "positions" => Ok(Self::Positions),
            "ntf" | "notifications" => Ok(Self::Notifications),
            _ => Err(ProbeError::unknown_option("category", s)),
        }
    }
}

/// One entry of the catalogue
#[derive(Clone, Copy)]
pub struct Scenario {
    /// Stable identifier (`AUTH-001`)
    pub id: &'static str,
    /// Human-readable name
    pub name: &'static str,
    /// Grouping
    pub category: Category,
    /// Body
    pub run: ScenarioFn,
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

impl Scenario {
    /// Create a scenario
    #[must_use]
    pub const fn new(
        id: &'static str,
        name: &'static str,
        category: Category,
        run: ScenarioFn,
    ) -> Self {
        Self {
            id,
            name,
            category,
            run,
        }
    }

    /// Run the body against a session
    pub async fn execute(&self, driver: &dyn PageDriver, config: &SuiteConfig) -> ScenarioResult {
        (self.run)(driver, config).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::MockDriver;

    fn visits_base<'a>(driver: &'a dyn PageDriver, config: &'a SuiteConfig) -> ScenarioFuture<'a> {
        Box::pin(async move {
            driver.navigate(&config.base_url).await?;
            ensure(
                driver.current_url().await? == config.base_url,
                "should land on base url",
            )
        })
    }

    mod error_tests {
        use super::*;

        #[test]
        fn test_ensure() {
            assert!(ensure(true, "unused").is_ok());
            let err = ensure(false, "banner should show").unwrap_err();
            assert!(err.is_assertion());
            assert_eq!(err.to_string(), "banner should show");
        }

        #[test]
        fn test_probe_error_is_not_assertion() {
            let err: ScenarioError = ProbeError::driver("socket closed").into();
            assert!(!err.is_assertion());
            assert_eq!(err.to_string(), "Driver error: socket closed");
            assert!(!ScenarioError::config("no username").is_assertion());
        }
    }

    mod category_tests {
        use super::*;

        #[test]
        fn test_aliases() {
            assert_eq!("auth".parse::<Category>().unwrap(), Category::Authentication);
            assert_eq!("TRADE".parse::<Category>().unwrap(), Category::Trading);
            assert_eq!("pos".parse::<Category>().unwrap(), Category::Positions);
            assert_eq!("ntf".parse::<Category>().unwrap(), Category::Notifications);
            assert!("workflow".parse::<Category>().is_err());
        }

        #[test]
        fn test_display() {
            assert_eq!(Category::Authentication.to_string(), "Authentication");
        }
    }

    mod execute_tests {
        use super::*;

        #[tokio::test]
        async fn test_execute_runs_body() {
            let scenario = Scenario::new("T-1", "visit", Category::Authentication, visits_base);
            let driver = MockDriver::new();
            let config = SuiteConfig::new();
            scenario.execute(&driver, &config).await.unwrap();
            assert!(driver.was_called("navigate:https://aqxtrader.aquariux.com"));
            assert!(format!("{scenario:?}").contains("T-1"));
        }
    }
}
