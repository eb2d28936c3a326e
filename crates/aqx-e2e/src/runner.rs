//! Suite runner: selects scenarios, hands each one a browser session and
//! buckets the outcomes.

use crate::config::SuiteConfig;
use crate::driver::PageDriver;
use crate::result::{ProbeError, ProbeResult};
use crate::scenario::{Category, Scenario};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Which scenarios to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The whole catalogue
    All,
    /// One category
    Category(Category),
    /// One scenario by id
    Single(String),
}

impl FromStr for Selection {
    type Err = ProbeError;

    /// Accepts `all`, a category alias, `test:<ID>` or a bare scenario id
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let target = s.trim();
        if target.is_empty() || target.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        if let Some(id) = target
            .split_once(':')
            .filter(|(prefix, _)| prefix.eq_ignore_ascii_case("test"))
            .map(|(_, id)| id.trim())
        {
            if id.is_empty() {
                return Err(ProbeError::unknown_option("target", s));
            }
            return Ok(Self::Single(id.to_ascii_uppercase()));
        }
        if let Ok(category) = target.parse::<Category>() {
            return Ok(Self::Category(category));
        }
        if is_scenario_id(target) {
            return Ok(Self::Single(target.to_ascii_uppercase()));
        }
        Err(ProbeError::unknown_option("target", s))
    }
}

/// `PREFIX-123`
fn is_scenario_id(s: &str) -> bool {
    s.split_once('-').is_some_and(|(prefix, number)| {
        !prefix.is_empty()
            && prefix.chars().all(|c| c.is_ascii_alphabetic())
            && !number.is_empty()
            && number.chars().all(|c| c.is_ascii_digit())
    })
}

impl Selection {
    /// Scenarios of `catalogue` this selection picks, in catalogue order
    #[must_use]
    pub fn resolve(&self, catalogue: &[Scenario]) -> Vec<Scenario> {
        catalogue
            .iter()
            .filter(|s| match self {
                Self::All => true,
                Self::Category(category) => s.category == *category,
                Self::Single(id) => s.id.eq_ignore_ascii_case(id),
            })
            .copied()
            .collect()
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Category(category) => write!(f, "category {category}"),
            Self::Single(id) => write!(f, "scenario {id}"),
        }
    }
}

/// How browser sessions are handed to scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionMode {
    /// Fresh session per scenario
    #[default]
    PerScenario,
    /// One session for the whole run
    Shared,
}

/// Creates browser sessions
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    /// Start a session
    async fn launch(&self) -> ProbeResult<Box<dyn PageDriver>>;
}

/// Result of one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Every check held
    Passed,
    /// An expected-state check failed
    Failed(String),
    /// Something unexpected went wrong (element never ready, driver error, ...)
    Error(String),
}

impl Outcome {
    /// Whether the scenario passed
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Short label for output
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Passed => "PASSED",
            Self::Failed(_) => "FAILED",
            Self::Error(_) => "ERROR",
        }
    }

    /// Failure or error message
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Passed => None,
            Self::Failed(m) | Self::Error(m) => Some(m),
        }
    }
}

/// Report for one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Scenario id
    pub id: String,
    /// Scenario name
    pub name: String,
    /// Category label
    pub category: String,
    /// Outcome
    pub outcome: Outcome,
    /// Wall time, session launch included
    pub duration: Duration,
}

/// Report for a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Reports in run order
    pub reports: Vec<ScenarioReport>,
    /// Total wall time
    pub duration: Duration,
}

impl SuiteReport {
    /// Number of passed scenarios
    #[must_use]
    pub fn passed(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_pass()).count()
    }

    /// Number of failed scenarios
    #[must_use]
    pub fn failed(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Failed(_)))
            .count()
    }

    /// Number of errored scenarios
    #[must_use]
    pub fn errors(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Error(_)))
            .count()
    }

    /// Number of scenarios run
    #[must_use]
    pub fn total(&self) -> usize {
        self.reports.len()
    }

    /// Percentage of scenarios that passed (0 for an empty run)
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        if self.reports.is_empty() {
            return 0.0;
        }
        self.passed() as f64 / self.total() as f64 * 100.0
    }

    /// Whether every scenario passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.reports.iter().all(|r| r.outcome.is_pass())
    }

    /// Failed and errored scenarios
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioReport> {
        self.reports
            .iter()
            .filter(|r| !r.outcome.is_pass())
            .collect()
    }
}

/// Progress callbacks
pub trait SuiteObserver {
    /// Run is about to start
    fn suite_started(&mut self, _total: usize) {}

    /// Scenario `index` (1-based) of `total` is about to start
    fn scenario_started(&mut self, _index: usize, _total: usize, _scenario: &Scenario) {}

    /// Scenario finished
    fn scenario_finished(&mut self, _report: &ScenarioReport) {}

    /// Run finished
    fn suite_finished(&mut self, _report: &SuiteReport) {}
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SuiteObserver for NoopObserver {}

/// Runs scenarios one at a time
#[derive(Debug, Clone)]
pub struct SuiteRunner {
    config: SuiteConfig,
    mode: SessionMode,
    fail_fast: bool,
}

impl SuiteRunner {
    /// Create a runner
    #[must_use]
    pub fn new(config: SuiteConfig) -> Self {
        Self {
            config,
            mode: SessionMode::default(),
            fail_fast: false,
        }
    }

    /// Set session mode
    #[must_use]
    pub const fn with_session_mode(mut self, mode: SessionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Stop at the first scenario that does not pass
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Suite configuration
    #[must_use]
    pub const fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Resolve `selection` against the catalogue and run it.
    ///
    /// A single-scenario selection naming an id the catalogue lacks is an
    /// error rather than an empty run.
    pub async fn run_selection(
        &self,
        selection: &Selection,
        launcher: &dyn SessionLauncher,
        observer: &mut dyn SuiteObserver,
    ) -> ProbeResult<SuiteReport> {
        let scenarios = selection.resolve(&crate::scenarios::catalogue());
        if let Selection::Single(id) = selection {
            if scenarios.is_empty() {
                return Err(ProbeError::unknown_option("scenario", id.clone()));
            }
        }
        self.run(&scenarios, launcher, observer).await
    }

    async fn run_one(&self, scenario: &Scenario, driver: &dyn PageDriver) -> Outcome {
        match scenario.execute(driver, &self.config).await {
            Ok(()) => {
                info!(id = scenario.id, "scenario passed");
                Outcome::Passed
            }
            Err(e) if e.is_assertion() => {
                warn!(id = scenario.id, error = %e, "scenario failed");
                Outcome::Failed(e.to_string())
            }
            Err(e) => {
                error!(id = scenario.id, error = %e, "scenario errored");
                Outcome::Error(e.to_string())
            }
        }
    }

    async fn run_in_fresh_session(
        &self,
        scenario: &Scenario,
        launcher: &dyn SessionLauncher,
    ) -> Outcome {
        let driver = match launcher.launch().await {
            Ok(driver) => driver,
            Err(e) => {
                error!(id = scenario.id, error = %e, "session launch failed");
                return Outcome::Error(format!("session launch failed: {e}"));
            }
        };
        let outcome = self.run_one(scenario, driver.as_ref()).await;
        if let Err(e) = driver.close().await {
            warn!(id = scenario.id, error = %e, "session close failed");
        }
        outcome
    }

    /// Run `scenarios` in order.
    ///
    /// A scenario that fails or errors never stops the run unless fail-fast is
    /// on. The only error returned is a failed shared session launch.
    pub async fn run(
        &self,
        scenarios: &[Scenario],
        launcher: &dyn SessionLauncher,
        observer: &mut dyn SuiteObserver,
    ) -> ProbeResult<SuiteReport> {
        let started = Instant::now();
        let total = scenarios.len();
        observer.suite_started(total);
        info!(total, mode = ?self.mode, "starting suite");

        let shared = match self.mode {
            SessionMode::Shared => Some(launcher.launch().await?),
            SessionMode::PerScenario => None,
        };

        let mut report = SuiteReport::default();
        for (i, scenario) in scenarios.iter().enumerate() {
            observer.scenario_started(i + 1, total, scenario);
            let scenario_start = Instant::now();

            let outcome = match shared {
                Some(ref driver) => self.run_one(scenario, driver.as_ref()).await,
                None => self.run_in_fresh_session(scenario, launcher).await,
            };
            let passed = outcome.is_pass();

            let entry = ScenarioReport {
                id: scenario.id.to_string(),
                name: scenario.name.to_string(),
                category: scenario.category.to_string(),
                outcome,
                duration: scenario_start.elapsed(),
            };
            observer.scenario_finished(&entry);
            report.reports.push(entry);

            if !passed && self.fail_fast {
                warn!(id = scenario.id, "fail fast, stopping suite");
                break;
            }
            if i + 1 < total && !self.config.pause_between.is_zero() {
                tokio::time::sleep(self.config.pause_between).await;
            }
        }

        if let Some(driver) = shared {
            if let Err(e) = driver.close().await {
                warn!(error = %e, "shared session close failed");
            }
        }

        report.duration = started.elapsed();
        info!(
            passed = report.passed(),
            failed = report.failed(),
            errors = report.errors(),
            "suite finished"
        );
        observer.suite_finished(&report);
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::MockDriver;
    use crate::scenario::{ensure, ScenarioError, ScenarioFuture};
    use std::sync::{Arc, Mutex};

    fn passes<'a>(driver: &'a dyn PageDriver, config: &'a SuiteConfig) -> ScenarioFuture<'a> {
        Box::pin(async move {
            driver.navigate(&config.base_url).await?;
            Ok::<(), ScenarioError>(())
        })
    }

    fn fails<'a>(_driver: &'a dyn PageDriver, _config: &'a SuiteConfig) -> ScenarioFuture<'a> {
        Box::pin(async move { ensure(false, "banner should show") })
    }

    fn errors<'a>(_driver: &'a dyn PageDriver, _config: &'a SuiteConfig) -> ScenarioFuture<'a> {
        Box::pin(async move { Err(ScenarioError::from(ProbeError::driver("target closed"))) })
    }

    fn sample() -> Vec<Scenario> {
        vec![
            Scenario::new("AUTH-001", "passes", Category::Authentication, passes),
            Scenario::new("AUTH-002", "fails", Category::Authentication, fails),
            Scenario::new("TRD-001", "errors", Category::Trading, errors),
            Scenario::new("TRD-002", "passes again", Category::Trading, passes),
        ]
    }

    #[derive(Default)]
    struct MockLauncher {
        sessions: Mutex<Vec<Arc<MockDriver>>>,
        broken: bool,
    }

    impl MockLauncher {
        fn sessions(&self) -> Vec<Arc<MockDriver>> {
            self.sessions.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SessionLauncher for MockLauncher {
        async fn launch(&self) -> ProbeResult<Box<dyn PageDriver>> {
            if self.broken {
                return Err(ProbeError::BrowserLaunch {
                    message: "chromium not found".to_string(),
                });
            }
            let driver = Arc::new(MockDriver::new());
            self.sessions.lock().unwrap().push(Arc::clone(&driver));
            Ok(Box::new(driver))
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl SuiteObserver for Recorder {
        fn suite_started(&mut self, total: usize) {
            self.events.push(format!("start:{total}"));
        }

        fn scenario_started(&mut self, index: usize, total: usize, scenario: &Scenario) {
            self.events.push(format!("[{index}/{total}] {}", scenario.id));
        }

        fn scenario_finished(&mut self, report: &ScenarioReport) {
            self.events
                .push(format!("{} {}", report.outcome.label(), report.id));
        }

        fn suite_finished(&mut self, report: &SuiteReport) {
            self.events.push(format!("done:{}", report.total()));
        }
    }

    fn runner() -> SuiteRunner {
        SuiteRunner::new(SuiteConfig::new().with_pause_between(Duration::ZERO))
    }

    mod selection_tests {
        use super::*;

        #[test]
        fn test_parse_targets() {
            assert_eq!("all".parse::<Selection>().unwrap(), Selection::All);
            assert_eq!("".parse::<Selection>().unwrap(), Selection::All);
            assert_eq!(
                "AUTH".parse::<Selection>().unwrap(),
                Selection::Category(Category::Authentication)
            );
            assert_eq!(
                "trade".parse::<Selection>().unwrap(),
                Selection::Category(Category::Trading)
            );
            assert_eq!(
                "TEST:auth-001".parse::<Selection>().unwrap(),
                Selection::Single("AUTH-001".to_string())
            );
            assert_eq!(
                "pos-002".parse::<Selection>().unwrap(),
                Selection::Single("POS-002".to_string())
            );
        }

        #[test]
        fn test_parse_rejects_unknown() {
            assert!("WORKFLOW".parse::<Selection>().is_err());
            assert!("test:".parse::<Selection>().is_err());
            assert!("AUTH-".parse::<Selection>().is_err());
        }

        #[test]
        fn test_resolve() {
            let all = sample();
            assert_eq!(Selection::All.resolve(&all).len(), 4);
            assert_eq!(
                Selection::Category(Category::Trading).resolve(&all).len(),
                2
            );
            let single = Selection::Single("AUTH-002".to_string()).resolve(&all);
            assert_eq!(single.len(), 1);
            assert_eq!(single[0].name, "fails");
            assert!(Selection::Single("X-1".to_string()).resolve(&all).is_empty());
        }
    }

    mod outcome_tests {
        use super::*;

        #[tokio::test]
        async fn test_outcomes_bucketed_and_suite_continues() {
            let launcher = MockLauncher::default();
            let mut recorder = Recorder::default();
            let report = runner()
                .run(&sample(), &launcher, &mut recorder)
                .await
                .unwrap();

            assert_eq!(report.total(), 4);
            assert_eq!(report.passed(), 2);
            assert_eq!(report.failed(), 1);
            assert_eq!(report.errors(), 1);
            assert!(!report.all_passed());
            assert!((report.success_rate() - 50.0).abs() < f64::EPSILON);

            let failures: Vec<&str> = report.failures().iter().map(|r| r.id.as_str()).collect();
            assert_eq!(failures, vec!["AUTH-002", "TRD-001"]);
            assert_eq!(
                report.reports[1].outcome,
                Outcome::Failed("banner should show".to_string())
            );
            assert_eq!(
                report.reports[2].outcome.message(),
                Some("Driver error: target closed")
            );

            assert_eq!(recorder.events.first().map(String::as_str), Some("start:4"));
            assert!(recorder.events.contains(&"[3/4] TRD-001".to_string()));
            assert!(recorder.events.contains(&"ERROR TRD-001".to_string()));
            assert_eq!(recorder.events.last().map(String::as_str), Some("done:4"));
        }

        #[tokio::test]
        async fn test_fail_fast_stops_after_first_failure() {
            let launcher = MockLauncher::default();
            let report = runner()
                .with_fail_fast(true)
                .run(&sample(), &launcher, &mut NoopObserver)
                .await
                .unwrap();
            assert_eq!(report.total(), 2);
            assert_eq!(report.failed(), 1);
        }

        #[tokio::test]
        async fn test_empty_run() {
            let launcher = MockLauncher::default();
            let report = runner()
                .run(&[], &launcher, &mut NoopObserver)
                .await
                .unwrap();
            assert_eq!(report.total(), 0);
            assert!(report.success_rate().abs() < f64::EPSILON);
        }
    }

    mod session_tests {
        use super::*;

        #[tokio::test]
        async fn test_fresh_session_per_scenario_closed() {
            let launcher = MockLauncher::default();
            let _ = runner()
                .run(&sample(), &launcher, &mut NoopObserver)
                .await
                .unwrap();
            let sessions = launcher.sessions();
            assert_eq!(sessions.len(), 4);
            assert!(sessions.iter().all(|s| s.is_closed()));
        }

        #[tokio::test]
        async fn test_shared_session_launched_once() {
            let launcher = MockLauncher::default();
            let report = runner()
                .with_session_mode(SessionMode::Shared)
                .run(&sample(), &launcher, &mut NoopObserver)
                .await
                .unwrap();
            assert_eq!(report.total(), 4);
            let sessions = launcher.sessions();
            assert_eq!(sessions.len(), 1);
            assert!(sessions[0].is_closed());
            let navigations = sessions[0]
                .history()
                .iter()
                .filter(|c| c.starts_with("navigate:"))
                .count();
            assert_eq!(navigations, 2);
        }

        #[tokio::test]
        async fn test_launch_failure_per_scenario_is_error_outcome() {
            let launcher = MockLauncher {
                broken: true,
                ..MockLauncher::default()
            };
            let report = runner()
                .run(&sample(), &launcher, &mut NoopObserver)
                .await
                .unwrap();
            assert_eq!(report.errors(), 4);
            assert!(report.reports[0]
                .outcome
                .message()
                .unwrap()
                .contains("chromium not found"));
        }

        #[tokio::test]
        async fn test_launch_failure_shared_is_fatal() {
            let launcher = MockLauncher {
                broken: true,
                ..MockLauncher::default()
            };
            let result = runner()
                .with_session_mode(SessionMode::Shared)
                .run(&sample(), &launcher, &mut NoopObserver)
                .await;
            assert!(matches!(result, Err(ProbeError::BrowserLaunch { .. })));
        }

        #[tokio::test]
        async fn test_unknown_single_scenario_rejected() {
            let launcher = MockLauncher::default();
            let result = runner()
                .run_selection(
                    &Selection::Single("AUTH-999".to_string()),
                    &launcher,
                    &mut NoopObserver,
                )
                .await;
            assert!(matches!(result, Err(ProbeError::UnknownOption { .. })));
            assert!(launcher.sessions().is_empty());
        }
    }
}
