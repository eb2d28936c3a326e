//! aqx-e2e: end-to-end UI suite for AQX Trader
//!
//! ## Usage
//!
//! ```bash
//! aqx-e2e                         # Run every scenario
//! aqx-e2e auth                    # Run one category
//! aqx-e2e test:TRD-003 --headed   # Run one scenario with a visible browser
//! aqx-e2e list                    # Show the catalogue
//! ```

use aqx_e2e::runner::{SessionLauncher, SessionMode, SuiteRunner};
use aqx_e2e_cli::{
    catalogue_lines, logging, Cli, CliConfig, CliError, CliResult, ColorChoice, OutputFormat,
    ProgressReporter, Verbosity,
};
use clap::Parser;
use std::process::ExitCode;
use tracing::debug;

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.clone().into();
    let session_mode = if cli.shared_session {
        SessionMode::Shared
    } else {
        SessionMode::PerScenario
    };

    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(color)
        .with_fail_fast(cli.fail_fast)
        .with_session_mode(session_mode)
}

#[cfg(feature = "browser")]
fn launcher(cli: &Cli) -> CliResult<Box<dyn SessionLauncher>> {
    Ok(Box::new(aqx_e2e::ChromiumLauncher::new(cli.browser_config())))
}

#[cfg(not(feature = "browser"))]
fn launcher(_cli: &Cli) -> CliResult<Box<dyn SessionLauncher>> {
    Err(CliError::config(
        "browser support not enabled. Rebuild with --features browser",
    ))
}

/// Returns whether every selected scenario passed
fn run() -> CliResult<bool> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    let use_color = config.color.should_color();
    logging::init(config.verbosity, use_color);

    if cli.is_list() {
        for line in catalogue_lines(&aqx_e2e::scenarios::catalogue()) {
            println!("{line}");
        }
        return Ok(true);
    }

    let selection = cli.selection()?;
    let suite = cli.suite_config();
    debug!(?selection, ?suite, ?config, "resolved configuration");

    let format: OutputFormat = cli.format.into();
    let runner = SuiteRunner::new(suite)
        .with_session_mode(config.session_mode)
        .with_fail_fast(config.fail_fast);
    let launcher = launcher(&cli)?;
    let mut reporter = ProgressReporter::new(
        use_color,
        config.verbosity.is_quiet() || format == OutputFormat::Json,
    );

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::config(format!("Failed to create async runtime: {e}")))?;
    let report = rt.block_on(runner.run_selection(&selection, launcher.as_ref(), &mut reporter))?;

    match format {
        OutputFormat::Text => reporter.summary(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(report.all_passed())
}
