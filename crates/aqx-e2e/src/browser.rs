//! Chromium session over the Chrome `DevTools` Protocol.
//!
//! [`BrowserConfig`] is always available so the CLI can build it; the
//! driver itself needs the `browser` feature (chromiumoxide).

/// Arguments that keep the site from treating the session as automated and
/// stop the password manager from covering the login form
pub const STEALTH_ARGS: [&str; 3] = [
    "--disable-blink-features=AutomationControlled",
    "--disable-credential-manager",
    "--disable-credential-manager-ui",
];

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserConfig {
    /// Run without a window
    pub headless: bool,
    /// Window width
    pub window_width: u32,
    /// Window height
    pub window_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Additional command line arguments
    pub extra_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            chromium_path: None,
            sandbox: true,
            extra_args: Vec::new(),
        }
    }
}

impl BrowserConfig {
    /// Set window dimensions
    #[must_use]
    pub const fn with_window(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Append a command line argument
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Full argument list passed to chromium on top of its defaults
    #[must_use]
    pub fn launch_args(&self) -> Vec<String> {
        let mut args: Vec<String> = STEALTH_ARGS.iter().map(|a| (*a).to_string()).collect();
        if !self.headless {
            args.push("--start-maximized".to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc, clippy::significant_drop_tightening)]
mod cdp {
    use super::BrowserConfig;
    use crate::driver::{ElementState, PageDriver};
    use crate::locator::Locator;
    use crate::result::{ProbeError, ProbeResult};
    use crate::runner::SessionLauncher;
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::element::Element;
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use serde::de::DeserializeOwned;
    use tokio::sync::Mutex;
    use tracing::{debug, info};

    /// A single-page Chromium session
    #[derive(Debug)]
    pub struct ChromiumDriver {
        browser: Mutex<CdpBrowser>,
        page: CdpPage,
        handle: tokio::task::JoinHandle<()>,
    }

    impl ChromiumDriver {
        /// Launch chromium and open a blank page
        pub async fn launch(config: &BrowserConfig) -> ProbeResult<Self> {
            let mut builder = CdpConfig::builder()
                .window_size(config.window_width, config.window_height);

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            for arg in config.launch_args() {
                builder = builder.arg(arg);
            }

            let cdp_config = builder
                .build()
                .map_err(|message| ProbeError::BrowserLaunch { message })?;

            let (browser, mut handler) =
                CdpBrowser::launch(cdp_config)
                    .await
                    .map_err(|e| ProbeError::BrowserLaunch {
                        message: e.to_string(),
                    })?;

            let handle = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| ProbeError::BrowserLaunch {
                    message: e.to_string(),
                })?;

            info!(headless = config.headless, "chromium session started");
            Ok(Self {
                browser: Mutex::new(browser),
                page,
                handle,
            })
        }

        async fn eval<T: DeserializeOwned>(&self, expr: String) -> ProbeResult<T> {
            let result = self
                .page
                .evaluate(expr)
                .await
                .map_err(|e| ProbeError::driver(e.to_string()))?;
            Ok(result.into_value()?)
        }

        /// Native handle so clicks and keystrokes are trusted input events
        async fn element(&self, locator: &Locator) -> ProbeResult<Element> {
            let found = match locator.to_xpath() {
                Some(xpath) => self.page.find_xpath(xpath).await,
                None => self.page.find_element(locator.value()).await,
            };
            found.map_err(|e| ProbeError::driver(format!("{locator}: {e}")))
        }
    }

    fn state_script(locator: &Locator) -> String {
        format!(
            "(() => {{ const el = {}; \
             if (!el) {{ return {{ present: false, visible: false, enabled: false }}; }} \
             const r = el.getBoundingClientRect(); const s = window.getComputedStyle(el); \
             const visible = r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none'; \
             const enabled = !el.disabled && el.getAttribute('aria-disabled') !== 'true'; \
             return {{ present: true, visible, enabled }}; }})()",
            locator.to_query()
        )
    }

    #[async_trait]
    impl PageDriver for ChromiumDriver {
        async fn navigate(&self, url: &str) -> ProbeResult<()> {
            debug!(url, "navigate");
            self.page
                .goto(url)
                .await
                .map_err(|e| ProbeError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            Ok(())
        }

        async fn current_url(&self) -> ProbeResult<String> {
            let url = self
                .page
                .url()
                .await
                .map_err(|e| ProbeError::driver(e.to_string()))?;
            Ok(url.unwrap_or_default())
        }

        async fn reload(&self) -> ProbeResult<()> {
            self.page
                .reload()
                .await
                .map_err(|e| ProbeError::driver(e.to_string()))?;
            Ok(())
        }

        async fn element_state(&self, locator: &Locator) -> ProbeResult<ElementState> {
            self.eval(state_script(locator)).await
        }

        async fn click(&self, locator: &Locator) -> ProbeResult<()> {
            let element = self.element(locator).await?;
            element
                .scroll_into_view()
                .await
                .map_err(|e| ProbeError::driver(e.to_string()))?;
            element
                .click()
                .await
                .map_err(|e| ProbeError::driver(e.to_string()))?;
            Ok(())
        }

        async fn clear(&self, locator: &Locator) -> ProbeResult<()> {
            let selected: bool = self
                .eval(format!(
                    "(() => {{ const el = {}; if (!el) {{ return false; }} \
                     el.focus(); if (el.select) {{ el.select(); }} return true; }})()",
                    locator.to_query()
                ))
                .await?;
            if !selected {
                return Err(ProbeError::driver(format!("no element matches {locator}")));
            }
            let element = self.element(locator).await?;
            element
                .press_key("Backspace")
                .await
                .map_err(|e| ProbeError::driver(e.to_string()))?;
            Ok(())
        }

        async fn type_text(&self, locator: &Locator, text: &str) -> ProbeResult<()> {
            let element = self.element(locator).await?;
            element
                .click()
                .await
                .map_err(|e| ProbeError::driver(e.to_string()))?;
            element
                .type_str(text)
                .await
                .map_err(|e| ProbeError::driver(e.to_string()))?;
            Ok(())
        }

        async fn inner_text(&self, locator: &Locator) -> ProbeResult<Option<String>> {
            self.eval(format!(
                "(() => {{ const el = {}; return el ? el.innerText : null; }})()",
                locator.to_query()
            ))
            .await
        }

        async fn inner_texts(&self, locator: &Locator) -> ProbeResult<Vec<String>> {
            self.eval(format!(
                "{}.map(el => el.innerText)",
                locator.to_query_all()
            ))
            .await
        }

        async fn scroll_into_view(&self, locator: &Locator) -> ProbeResult<()> {
            let element = self.element(locator).await?;
            element
                .scroll_into_view()
                .await
                .map_err(|e| ProbeError::driver(e.to_string()))?;
            Ok(())
        }

        async fn close(&self) -> ProbeResult<()> {
            let mut browser = self.browser.lock().await;
            browser
                .close()
                .await
                .map_err(|e| ProbeError::driver(e.to_string()))?;
            let _ = browser.wait().await;
            self.handle.abort();
            info!("chromium session closed");
            Ok(())
        }
    }

    /// Launches a fresh [`ChromiumDriver`] per session
    #[derive(Debug, Clone, Default)]
    pub struct ChromiumLauncher {
        config: BrowserConfig,
    }

    impl ChromiumLauncher {
        /// Create a launcher
        #[must_use]
        pub const fn new(config: BrowserConfig) -> Self {
            Self { config }
        }
    }

    #[async_trait]
    impl SessionLauncher for ChromiumLauncher {
        async fn launch(&self) -> ProbeResult<Box<dyn PageDriver>> {
            Ok(Box::new(ChromiumDriver::launch(&self.config).await?))
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::{ChromiumDriver, ChromiumLauncher};
