//! # Test Collection Runner
//!
//! Runs named async cases one at a time against a single [`AppHostFixture`], resetting
//! the database after every case whether it passed, failed or panicked.
//!
//! ```rust,no_run
//! use employee_fixture::{AppHostFixture, FixtureOptions, TestCollection};
//!
//! async fn lists_nothing(fixture: &AppHostFixture) -> anyhow::Result<()> {
//!     fixture.client()?.get("/api/v1").await.assert_status_ok();
//!     Ok(())
//! }
//!
//! # async fn example() {
//! TestCollection::new("employees", FixtureOptions::default())
//!     .case("lists_nothing", |fx| Box::pin(lists_nothing(fx)))
//!     .run()
//!     .await
//!     .assert_success();
//! # }
//! ```

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use tracing::{error, info, warn};

use crate::fixture::{AppHostFixture, FixtureOptions};

/// Body of one case
pub type CaseFn = for<'a> fn(&'a AppHostFixture) -> LocalBoxFuture<'a, anyhow::Result<()>>;

struct CollectionCase {
    name: String,
    run: CaseFn,
}

/// What happened to one case
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseOutcome {
    Passed,
    Failed(String),
    /// Not run because setup or an earlier reset failed
    Skipped,
}

/// Outcome of [`TestCollection::run`]
#[derive(Debug, Clone, Default)]
pub struct CollectionReport {
    pub collection: String,
    pub cases: Vec<(String, CaseOutcome)>,
    /// Setup or reset failure that stopped the run
    pub aborted: Option<String>,
    pub teardown_error: Option<String>,
}

impl CollectionReport {
    pub fn passed(&self) -> usize {
        self.count(|outcome| matches!(outcome, CaseOutcome::Passed))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, CaseOutcome::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, CaseOutcome::Skipped))
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
            && self.skipped() == 0
            && self.aborted.is_none()
            && self.teardown_error.is_none()
    }

    /// Panic with the full report unless every case passed
    pub fn assert_success(&self) {
        assert!(self.is_success(), "{self}");
    }

    /// A failed exit reset fails the case that just ran and stops the collection
    pub fn record_reset_failure(&mut self, error: String) {
        if let Some((_, outcome)) = self.cases.last_mut() {
            *outcome = CaseOutcome::Failed(format!("reset after case failed: {error}"));
        }
        self.aborted = Some(error);
    }

    fn count(&self, predicate: impl Fn(&CaseOutcome) -> bool) -> usize {
        self.cases.iter().filter(|(_, outcome)| predicate(outcome)).count()
    }
}

impl fmt::Display for CollectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "collection '{}': {} passed, {} failed, {} skipped",
            self.collection,
            self.passed(),
            self.failed(),
            self.skipped()
        )?;
        for (name, outcome) in &self.cases {
            match outcome {
                CaseOutcome::Passed => writeln!(f, "  ok      {name}")?,
                CaseOutcome::Failed(message) => writeln!(f, "  FAILED  {name}: {message}")?,
                CaseOutcome::Skipped => writeln!(f, "  skipped {name}")?,
            }
        }
        if let Some(reason) = &self.aborted {
            writeln!(f, "  aborted: {reason}")?;
        }
        if let Some(reason) = &self.teardown_error {
            writeln!(f, "  teardown: {reason}")?;
        }
        Ok(())
    }
}

/// Named cases sharing one fixture
pub struct TestCollection {
    name: String,
    options: FixtureOptions,
    cases: Vec<CollectionCase>,
}

impl TestCollection {
    pub fn new(name: impl Into<String>, options: FixtureOptions) -> Self {
        Self {
            name: name.into(),
            options,
            cases: Vec::new(),
        }
    }

    pub fn case(mut self, name: impl Into<String>, run: CaseFn) -> Self {
        self.cases.push(CollectionCase {
            name: name.into(),
            run,
        });
        self
    }

    /// Initialize the fixture, run every case, then tear down.
    ///
    /// A reset failure stops the run: later cases are reported as skipped.
    pub async fn run(self) -> CollectionReport {
        let mut report = CollectionReport {
            collection: self.name.clone(),
            ..CollectionReport::default()
        };

        let mut fixture = AppHostFixture::new(self.options);
        if let Err(e) = fixture.initialize().await {
            error!(collection = %self.name, error = %e, "Collection setup failed");
            report.aborted = Some(e.to_string());
            report.cases = self
                .cases
                .into_iter()
                .map(|case| (case.name, CaseOutcome::Skipped))
                .collect();
            return report;
        }

        let mut cases = self.cases.into_iter();
        for case in cases.by_ref() {
            let outcome = match AssertUnwindSafe((case.run)(&fixture)).catch_unwind().await {
                Ok(Ok(())) => CaseOutcome::Passed,
                Ok(Err(e)) => CaseOutcome::Failed(format!("{e:#}")),
                Err(payload) => CaseOutcome::Failed(panic_message(payload.as_ref())),
            };

            match &outcome {
                CaseOutcome::Failed(message) => {
                    warn!(collection = %self.name, case = %case.name, error = %message, "Case failed")
                }
                _ => info!(collection = %self.name, case = %case.name, "Case passed"),
            }
            report.cases.push((case.name, outcome));

            if let Err(e) = fixture.reset_between_tests().await {
                error!(collection = %self.name, error = %e, "Reset failed; stopping collection");
                report.record_reset_failure(e.to_string());
                break;
            }
        }
        report
            .cases
            .extend(cases.map(|case| (case.name, CaseOutcome::Skipped)));

        if let Err(e) = fixture.teardown().await {
            report.teardown_error = Some(e.to_string());
        }

        info!(
            collection = %report.collection,
            passed = report.passed(),
            failed = report.failed(),
            skipped = report.skipped(),
            "Collection finished"
        );
        report
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(cases: Vec<(&str, CaseOutcome)>) -> CollectionReport {
        CollectionReport {
            collection: "employees".to_string(),
            cases: cases
                .into_iter()
                .map(|(name, outcome)| (name.to_string(), outcome))
                .collect(),
            ..CollectionReport::default()
        }
    }

    #[test]
    fn test_report_counts() {
        let report = report(vec![
            ("a", CaseOutcome::Passed),
            ("b", CaseOutcome::Failed("boom".to_string())),
            ("c", CaseOutcome::Skipped),
        ]);

        assert_eq!(report.passed(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.skipped(), 1);
        assert!(!report.is_success());

        let rendered = report.to_string();
        assert!(rendered.contains("FAILED  b: boom"));
    }

    #[test]
    fn test_report_success() {
        let report = report(vec![("a", CaseOutcome::Passed)]);
        assert!(report.is_success());
        report.assert_success();
    }

    #[test]
    fn test_reset_failure_fails_the_case_that_ran() {
        let mut report = report(vec![("a", CaseOutcome::Passed), ("b", CaseOutcome::Passed)]);

        report.record_reset_failure("[reset] failed to clear table 'public.employees'".to_string());

        assert_eq!(report.cases[0].1, CaseOutcome::Passed);
        assert!(matches!(
            &report.cases[1].1,
            CaseOutcome::Failed(message) if message.contains("public.employees")
        ));
        assert_eq!(report.passed(), 1);
        assert_eq!(report.failed(), 1);
        assert!(report.aborted.is_some());
        assert!(!report.is_success());
        assert!(!report.to_string().contains("ok      b"));
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("bad state");
        assert_eq!(panic_message(payload.as_ref()), "panicked: bad state");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "panicked: owned");
    }

    #[tokio::test]
    #[ignore] // Only run when Docker is available
    async fn test_setup_failure_skips_every_case() {
        async fn never_runs(_fixture: &AppHostFixture) -> anyhow::Result<()> {
            panic!("case ran without a fixture");
        }

        let options = FixtureOptions::default().with_container(
            crate::provisioner::PostgresContainer::new()
                .with_image("employee-fixture-missing-image", "none")
                .with_startup_timeout(std::time::Duration::from_secs(5)),
        );

        let report = TestCollection::new("broken", options)
            .case("never_runs", |fx| Box::pin(never_runs(fx)))
            .run()
            .await;

        assert!(report.aborted.is_some());
        assert_eq!(report.skipped(), 1);
        assert!(!report.is_success());
    }
}
