//! Login screen scenarios.

use super::require_credentials;
use crate::config::{SuiteConfig, INVALID_PASSWORD, INVALID_USERNAME};
use crate::driver::PageDriver;
use crate::pages::LoginPage;
use crate::scenario::{ensure, Category, Scenario, ScenarioFuture, ScenarioResult};

pub(super) const SCENARIOS: [Scenario; 5] = [
    Scenario::new(
        "AUTH-001",
        "Login with valid credentials",
        Category::Authentication,
        valid_login,
    ),
    Scenario::new(
        "AUTH-002",
        "Login with invalid username",
        Category::Authentication,
        invalid_username,
    ),
    Scenario::new(
        "AUTH-003",
        "Login with invalid password",
        Category::Authentication,
        invalid_password,
    ),
    Scenario::new(
        "AUTH-004",
        "Login with empty credentials",
        Category::Authentication,
        empty_credentials,
    ),
    Scenario::new(
        "AUTH-005",
        "Web server available",
        Category::Authentication,
        web_available,
    ),
];

async fn open_login<'a>(
    driver: &'a dyn PageDriver,
    config: &'a SuiteConfig,
) -> ScenarioResult<LoginPage<'a>> {
    let login = LoginPage::new(driver, &config.base_url, config.page_options());
    login.open().await?;
    ensure(login.verify_page_loaded().await, "login page should load")?;
    Ok(login)
}

async fn expect_rejection(login: &LoginPage<'_>) -> ScenarioResult {
    ensure(
        login.get_error_message().await.is_found(),
        "error message should be displayed",
    )
}

fn valid_login<'a>(driver: &'a dyn PageDriver, config: &'a SuiteConfig) -> ScenarioFuture<'a> {
    Box::pin(async move {
        require_credentials(config)?;
        let login = open_login(driver, config).await?;
        login.login(&config.username, &config.password).await?;
        ensure(
            login.wait_for_success(config.timeout).await,
            "user should be redirected to the dashboard",
        )
    })
}

fn invalid_username<'a>(
    driver: &'a dyn PageDriver,
    config: &'a SuiteConfig,
) -> ScenarioFuture<'a> {
    Box::pin(async move {
        let login = open_login(driver, config).await?;
        login.login(INVALID_USERNAME, &config.password).await?;
        expect_rejection(&login).await
    })
}

fn invalid_password<'a>(
    driver: &'a dyn PageDriver,
    config: &'a SuiteConfig,
) -> ScenarioFuture<'a> {
    Box::pin(async move {
        let login = open_login(driver, config).await?;
        login.login(&config.username, INVALID_PASSWORD).await?;
        expect_rejection(&login).await
    })
}

fn empty_credentials<'a>(
    driver: &'a dyn PageDriver,
    config: &'a SuiteConfig,
) -> ScenarioFuture<'a> {
    Box::pin(async move {
        let login = open_login(driver, config).await?;
        login.submit().await?;
        expect_rejection(&login).await
    })
}

fn web_available<'a>(driver: &'a dyn PageDriver, config: &'a SuiteConfig) -> ScenarioFuture<'a> {
    Box::pin(async move {
        let login = open_login(driver, config).await?;
        let url = login.current_url().await?;
        ensure(
            url.to_ascii_lowercase().contains("aqxtrader"),
            format!("should be on the AQX Trader domain, got {url}"),
        )
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::MockElement;
    use crate::scenario::ScenarioError;
    use crate::scenarios::test_support::{fast_config, login_flow};

    mod login_scenario_tests {
        use super::*;

        #[tokio::test]
        async fn test_valid_login_passes() {
            let driver = login_flow();
            valid_login(&driver, &fast_config()).await.unwrap();
            assert!(driver.was_called("type:name=userId:1001186"));
        }

        #[tokio::test]
        async fn test_valid_login_without_credentials_is_config_error() {
            let driver = login_flow();
            let err = valid_login(&driver, &SuiteConfig::new()).await.unwrap_err();
            assert!(matches!(err, ScenarioError::Config { .. }));
            assert!(driver.history().is_empty());
        }

        #[tokio::test]
        async fn test_rejection_requires_error_banner() {
            let driver = login_flow();
            let err = invalid_password(&driver, &fast_config())
                .await
                .unwrap_err();
            assert!(err.is_assertion());

            let driver = login_flow();
            driver.reveal_on_click(
                &LoginPage::LOGIN_BUTTON,
                &LoginPage::ERROR_MESSAGE,
                MockElement::ready("Invalid credentials"),
            );
            invalid_username(&driver, &fast_config()).await.unwrap();
            assert!(driver.was_called("type:name=userId:invalid_user"));
        }

        #[tokio::test]
        async fn test_empty_credentials_types_nothing() {
            let driver = login_flow();
            driver.set_element(&LoginPage::ERROR_MESSAGE, MockElement::ready("Required"));
            empty_credentials(&driver, &fast_config()).await.unwrap();
            assert!(!driver.was_called("type:"));
        }
    }

    mod availability_tests {
        use super::*;

        #[tokio::test]
        async fn test_web_available_checks_domain() {
            let driver = login_flow();
            web_available(&driver, &fast_config()).await.unwrap();

            let config = fast_config().with_base_url("https://example.com");
            let err = web_available(&driver, &config).await.unwrap_err();
            assert!(err.is_assertion());
        }

        #[tokio::test]
        async fn test_missing_form_is_unexpected_error() {
            let driver = crate::driver::MockDriver::new();
            let err = web_available(&driver, &fast_config()).await.unwrap_err();
            assert!(!err.is_assertion());
        }
    }
}
