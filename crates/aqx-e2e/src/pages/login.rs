//! Login screen.

use crate::driver::PageDriver;
use crate::locator::Locator;
use crate::page_object::{BasePage, PageObject, PageOptions};
use crate::result::{Lookup, ProbeResult};
use crate::wait::Condition;
use std::time::Duration;
use tracing::{info, warn};

/// The login form and the announcement shown after a successful login
#[derive(Debug, Clone)]
pub struct LoginPage<'a> {
    base: BasePage<'a>,
    url: String,
}

impl<'a> LoginPage<'a> {
    /// Username input
    pub const USERNAME_FIELD: Locator = Locator::name("userId");
    /// Password input
    pub const PASSWORD_FIELD: Locator = Locator::name("password");
    /// Submit button
    pub const LOGIN_BUTTON: Locator = Locator::test_id("login-submit");
    /// Banner rendered above the form on failed logins
    pub const ERROR_MESSAGE: Locator = Locator::xpath("//div[@id='root']/div[1]");
    /// Form title
    pub const LOGIN_FORM: Locator = Locator::xpath("//div[normalize-space(text())='Log in']");
    /// Announcement shown once logged in
    pub const WELCOME_BANNER: Locator =
        Locator::xpath("//span[contains(.,'AQX Announcement: Welcome to AQX Trader!')]");

    /// Login page under `base_url`
    #[must_use]
    pub fn new(driver: &'a dyn PageDriver, base_url: &str, options: PageOptions) -> Self {
        let mut page = Self {
            base: BasePage::new(driver, options),
            url: String::new(),
        };
        page.url = page.url(base_url);
        page
    }

    /// Navigate to the login page and wait for the form
    pub async fn open(&self) -> ProbeResult<()> {
        self.base.open_url(&self.url).await?;
        self.base.wait_visible(&Self::LOGIN_FORM).await?;
        info!(url = %self.url, "opened login page");
        Ok(())
    }

    /// Type the username
    pub async fn enter_username(&self, username: &str) -> ProbeResult<()> {
        self.base.type_text(&Self::USERNAME_FIELD, username).await?;
        info!(username, "entered username");
        Ok(())
    }

    /// Type the password
    pub async fn enter_password(&self, password: &str) -> ProbeResult<()> {
        self.base.type_text(&Self::PASSWORD_FIELD, password).await?;
        info!("entered password");
        Ok(())
    }

    /// Click submit and give the page time to react
    pub async fn submit(&self) -> ProbeResult<()> {
        self.base.click(&Self::LOGIN_BUTTON).await?;
        info!("clicked login button");
        self.base.settle(2_000).await;
        Ok(())
    }

    /// Username, password, submit. Empty values are typed as-is.
    pub async fn login(&self, username: &str, password: &str) -> ProbeResult<()> {
        self.enter_username(username).await?;
        self.enter_password(password).await?;
        self.submit().await
    }

    /// Form title and both inputs visible
    pub async fn verify_page_loaded(&self) -> bool {
        let timeout = self.base.options().wait.timeout;
        for locator in [&Self::LOGIN_FORM, &Self::USERNAME_FIELD, &Self::PASSWORD_FIELD] {
            if !self.base.is_element_visible(locator, timeout).await {
                warn!(%locator, "login page not loaded");
                return false;
            }
        }
        info!("login page loaded");
        true
    }

    /// Wait for the post-login announcement
    pub async fn wait_for_success(&self, timeout: Duration) -> bool {
        match self.base.text_if_visible(&Self::WELCOME_BANNER, timeout).await {
            Lookup::Found(text) => {
                info!(banner = %text.trim(), "login succeeded");
                true
            }
            other => {
                warn!(result = ?other, "login banner not shown");
                false
            }
        }
    }

    /// Error banner text, if one shows within the check timeout
    pub async fn get_error_message(&self) -> Lookup<String> {
        let lookup = self
            .base
            .text_if_visible(&Self::ERROR_MESSAGE, self.base.options().check_timeout)
            .await;
        match &lookup {
            Lookup::Found(text) => info!(error = %text, "login error shown"),
            _ => info!("no login error shown"),
        }
        lookup
    }

    /// Whether the error banner shows within the check timeout
    pub async fn is_error_displayed(&self) -> bool {
        self.base
            .check(&Self::ERROR_MESSAGE, Condition::Visible)
            .await
            .is_found()
    }

    /// Current page URL
    pub async fn current_url(&self) -> ProbeResult<String> {
        self.base.driver().current_url().await
    }

    /// Reload and check the form is back
    pub async fn refresh(&self) -> ProbeResult<bool> {
        self.base.driver().reload().await?;
        let loaded = self.verify_page_loaded().await;
        info!(loaded, "page refreshed");
        Ok(loaded)
    }
}

impl PageObject for LoginPage<'_> {
    fn url_path(&self) -> &str {
        "/"
    }

    fn page_name(&self) -> &str {
        "Login"
    }
}
