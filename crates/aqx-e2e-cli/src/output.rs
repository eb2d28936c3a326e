//! Output formatting and progress reporting

use aqx_e2e::runner::{Outcome, ScenarioReport, SuiteObserver, SuiteReport};
use aqx_e2e::Scenario;
use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

/// Output format for suite results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Progress reporter for a suite run
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    fn line(&self, text: &str) {
        match self.progress_bar {
            Some(ref pb) if !pb.is_finished() => pb.println(text),
            _ => {
                let _ = self.term.write_line(text);
            }
        }
    }

    fn outcome_tag(&self, outcome: &Outcome) -> String {
        if !self.use_color {
            return outcome.label().to_string();
        }
        match outcome {
            Outcome::Passed => style("✓").green().bold().to_string(),
            Outcome::Failed(_) => style("✗").red().bold().to_string(),
            Outcome::Error(_) => style("!").yellow().bold().to_string(),
        }
    }

    /// Print the summary block
    pub fn summary(&self, report: &SuiteReport) {
        for line in summary_lines(report) {
            let _ = self.term.write_line(&line);
        }
        let status = if report.all_passed() { "PASSED" } else { "FAILED" };
        let status = if self.use_color {
            let color = if report.all_passed() {
                Style::new().green().bold()
            } else {
                Style::new().red().bold()
            };
            color.apply_to(status).to_string()
        } else {
            status.to_string()
        };
        let _ = self.term.write_line(&format!(
            "{status} in {:.2}s",
            report.duration.as_secs_f64()
        ));
    }
}

impl SuiteObserver for ProgressReporter {
    fn suite_started(&mut self, total: usize) {
        if self.quiet || total == 0 {
            return;
        }
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
    }

    fn scenario_started(&mut self, index: usize, total: usize, scenario: &Scenario) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(format!("{} {}", scenario.id, scenario.name));
        } else if !self.quiet {
            self.line(&format!("[{index}/{total}] {} {}", scenario.id, scenario.name));
        }
    }

    fn scenario_finished(&mut self, report: &ScenarioReport) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(1);
        }
        // Failures are printed even in quiet mode
        if self.quiet && report.outcome.is_pass() {
            return;
        }
        let mut text = format!(
            "{} {} {} ({:.1}s)",
            self.outcome_tag(&report.outcome),
            report.id,
            report.name,
            report.duration.as_secs_f64()
        );
        if let Some(message) = report.outcome.message() {
            text.push_str(&format!(": {message}"));
        }
        self.line(&text);
    }

    fn suite_finished(&mut self, _report: &SuiteReport) {
        if let Some(pb) = self.progress_bar.take() {
            pb.finish_and_clear();
        }
    }
}

/// Summary block lines
#[must_use]
pub fn summary_lines(report: &SuiteReport) -> Vec<String> {
    let rule = "=".repeat(60);
    let mut lines = vec![
        String::new(),
        rule.clone(),
        "TEST SUMMARY".to_string(),
        rule.clone(),
        format!("Total:        {}", report.total()),
        format!("Passed:       {}", report.passed()),
        format!("Failed:       {}", report.failed()),
        format!("Errors:       {}", report.errors()),
        format!("Success rate: {:.1}%", report.success_rate()),
    ];
    let failures = report.failures();
    if !failures.is_empty() {
        lines.push(String::new());
        lines.push("Failures:".to_string());
        for failure in failures {
            lines.push(format!(
                "  {} {} [{}]: {}",
                failure.id,
                failure.name,
                failure.outcome.label(),
                failure.outcome.message().unwrap_or_default()
            ));
        }
    }
    lines.push(rule);
    lines
}

/// Catalogue listing, one scenario per line
#[must_use]
pub fn catalogue_lines(scenarios: &[Scenario]) -> Vec<String> {
    scenarios
        .iter()
        .map(|s| format!("{:<10} {:<14} {}", s.id, s.category.label(), s.name))
        .collect()
}
