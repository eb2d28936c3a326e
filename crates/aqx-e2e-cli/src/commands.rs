//! CLI command definitions using clap

use crate::error::{CliError, CliResult};
use aqx_e2e::runner::Selection;
use aqx_e2e::{BrowserConfig, SuiteConfig, DEFAULT_BASE_URL, DEFAULT_SYMBOL, DEFAULT_VOLUME};
use clap::{Parser, ValueEnum};
use std::time::Duration;

/// Target that prints the catalogue instead of running it
pub const LIST_TARGET: &str = "list";

/// aqx-e2e: browser-driven end-to-end UI tests for AQX Trader
#[derive(Parser, Debug)]
#[command(name = "aqx-e2e")]
#[command(author, version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// What to run: all, a category (auth, trading, positions, notifications),
    /// test:<ID>, a bare scenario id, or `list`
    #[arg(value_name = "TARGET", default_value = "all")]
    pub target: String,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Reuse one browser session for every scenario
    #[arg(long)]
    pub shared_session: bool,

    /// Stop at the first scenario that does not pass
    #[arg(long)]
    pub fail_fast: bool,

    /// Site under test
    #[arg(long, env = "AQX_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Login user id
    #[arg(long, env = "AQX_USERNAME", default_value = "")]
    pub username: String,

    /// Login password
    #[arg(long, env = "AQX_PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,

    /// Symbol to trade
    #[arg(long, env = "AQX_SYMBOL", default_value = DEFAULT_SYMBOL)]
    pub symbol: String,

    /// Order volume
    #[arg(long, env = "AQX_VOLUME", default_value = DEFAULT_VOLUME)]
    pub volume: String,

    /// Element wait timeout in milliseconds
    #[arg(long, env = "AQX_TIMEOUT_MS", default_value = "10000")]
    pub timeout_ms: u64,

    /// Chromium executable (auto-detected when omitted)
    #[arg(long, env = "AQX_CHROMIUM_PATH")]
    pub chromium_path: Option<String>,

    /// Launch chromium without its sandbox (containers)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    pub format: FormatArg,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorArg,
}

impl Cli {
    /// Whether the target asks for the catalogue listing
    #[must_use]
    pub fn is_list(&self) -> bool {
        self.target.trim().eq_ignore_ascii_case(LIST_TARGET)
    }

    /// Scenarios the target names
    pub fn selection(&self) -> CliResult<Selection> {
        self.target
            .parse()
            .map_err(|e: aqx_e2e::ProbeError| CliError::invalid_argument(e.to_string()))
    }

    /// Suite configuration from the arguments
    #[must_use]
    pub fn suite_config(&self) -> SuiteConfig {
        SuiteConfig::new()
            .with_base_url(self.base_url.trim())
            .with_credentials(self.username.trim(), self.password.as_str())
            .with_symbol(self.symbol.trim())
            .with_volume(self.volume.trim())
            .with_timeout(Duration::from_millis(self.timeout_ms))
    }

    /// Browser configuration from the arguments
    #[must_use]
    pub fn browser_config(&self) -> BrowserConfig {
        let mut config = BrowserConfig::default().with_headless(!self.headed);
        if let Some(ref path) = self.chromium_path {
            config = config.with_chromium_path(path.as_str());
        }
        if self.no_sandbox {
            config = config.with_no_sandbox();
        }
        config
    }
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Report format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatArg {
    /// Progress lines and a summary table
    #[default]
    Text,
    /// The suite report as JSON on stdout
    Json,
}

impl From<FormatArg> for crate::output::OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}
