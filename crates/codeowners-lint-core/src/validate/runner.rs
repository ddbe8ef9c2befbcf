//! Concurrent execution of checks and aggregation of their results.
//!
//! Every check runs in its own tokio task against the same shared input.
//! Reports are handed to a [`Printer`] in completion order, so output from a
//! fast check is never held back by a slow one. A failing or panicking check
//! only affects its own report.

use crate::validate::checks::{Check, CheckInput};
use crate::validate::{CancellationToken, CheckError, CheckOutput, Severity};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use log::{debug, error, info};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The result of one check, as handed to the printer.
#[derive(Debug)]
pub struct CheckReport {
    pub name: &'static str,
    pub duration: Duration,
    /// The issues found, or why the check could not finish.
    pub outcome: Result<CheckOutput, CheckError>,
}

impl CheckReport {
    /// Returns true if the check reported issues or failed internally.
    pub fn is_failure(&self) -> bool {
        match &self.outcome {
            Ok(output) => !output.is_ok(),
            Err(_) => true,
        }
    }
}

/// Totals over every finished check of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub checks_run: usize,
    /// Checks that reported at least one issue or failed internally.
    pub checks_failed: usize,
    pub internal_errors: usize,
    pub by_severity: BTreeMap<Severity, usize>,
}

impl RunSummary {
    fn record(&mut self, report: &CheckReport) {
        self.checks_run += 1;
        if report.is_failure() {
            self.checks_failed += 1;
        }
        match &report.outcome {
            Ok(output) => {
                for issue in &output.issues {
                    *self.by_severity.entry(issue.severity).or_default() += 1;
                }
            }
            Err(_) => self.internal_errors += 1,
        }
    }

    /// The most severe thing seen. A check that failed internally counts
    /// as an error.
    pub fn most_severe(&self) -> Option<Severity> {
        if self.internal_errors > 0 {
            return Some(Severity::Error);
        }
        self.by_severity
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(severity, _)| *severity)
            .min()
    }

    pub fn issue_count(&self) -> usize {
        self.by_severity.values().sum()
    }

    /// True when the most severe thing seen is at least as severe as
    /// `threshold`. Independent of the order checks finished in.
    pub fn should_exit_with_failure(&self, threshold: Severity) -> bool {
        self.most_severe().is_some_and(|severity| severity <= threshold)
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Passed,
    Failed,
    /// Cancelled before every check finished. Overrides pass/fail.
    Interrupted,
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Passed => 0,
            RunOutcome::Interrupted => 2,
            RunOutcome::Failed => 3,
        }
    }
}

/// Receives results while a run progresses.
pub trait Printer: Send {
    /// Called once per finished check, in completion order.
    fn print_check_result(&mut self, report: &CheckReport);

    /// Called once after every check finished.
    fn print_summary(&mut self, summary: &RunSummary);

    /// Called instead of [`print_summary`](Self::print_summary) when the run
    /// was cancelled.
    fn print_interrupted(&mut self);
}

/// Runs a fixed set of checks concurrently.
pub struct CheckRunner {
    checks: Vec<Arc<dyn Check>>,
    threshold: Severity,
}

impl CheckRunner {
    /// `threshold` is the least severe issue that still fails the run.
    pub fn new(checks: Vec<Arc<dyn Check>>, threshold: Severity) -> Self {
        Self { checks, threshold }
    }

    pub fn check_names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|check| check.name()).collect()
    }

    /// Runs every check and reports through `printer`.
    pub async fn run(
        &self,
        input: CheckInput,
        cancel: &CancellationToken,
        printer: &mut dyn Printer,
    ) -> RunOutcome {
        info!(
            "Running {} checks against {:?}",
            self.checks.len(),
            input.repo_dir
        );

        let mut pending: FuturesUnordered<_> = self
            .checks
            .iter()
            .map(|check| spawn_check(Arc::clone(check), input.clone(), cancel.clone()))
            .collect();

        let mut summary = RunSummary::default();
        while let Some(report) = pending.next().await {
            if let Err(err) = &report.outcome {
                if err.is_cancelled() {
                    debug!("Check {} was cancelled", report.name);
                    continue;
                }
                error!("Check {} failed: {}", report.name, err);
            }
            debug!("Check {} finished in {:?}", report.name, report.duration);
            summary.record(&report);
            printer.print_check_result(&report);
        }

        if cancel.is_cancelled() {
            info!("Run interrupted after {} checks", summary.checks_run);
            printer.print_interrupted();
            return RunOutcome::Interrupted;
        }

        printer.print_summary(&summary);
        let outcome = if summary.should_exit_with_failure(self.threshold) {
            RunOutcome::Failed
        } else {
            RunOutcome::Passed
        };
        info!(
            "Run finished: {} issues, {} internal errors, {:?}",
            summary.issue_count(),
            summary.internal_errors,
            outcome
        );
        outcome
    }
}

async fn spawn_check(
    check: Arc<dyn Check>,
    input: CheckInput,
    cancel: CancellationToken,
) -> CheckReport {
    let name = check.name();
    let started = Instant::now();
    let task = tokio::spawn(async move { check.check(&input, &cancel).await });

    let outcome = match task.await {
        Ok(outcome) => outcome,
        Err(join_error) => Err(CheckError::Aborted(join_error.to_string())),
    };

    CheckReport {
        name,
        duration: started.elapsed(),
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::Entry;
    use crate::validate::Issue;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    struct FixedCheck {
        name: &'static str,
        issues: Vec<Issue>,
    }

    #[async_trait]
    impl Check for FixedCheck {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn check(
            &self,
            _input: &CheckInput,
            cancel: &CancellationToken,
        ) -> Result<CheckOutput, CheckError> {
            cancel.check()?;
            Ok(CheckOutput {
                issues: self.issues.clone(),
            })
        }
    }

    struct BrokenCheck;

    #[async_trait]
    impl Check for BrokenCheck {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn check(
            &self,
            _input: &CheckInput,
            _cancel: &CancellationToken,
        ) -> Result<CheckOutput, CheckError> {
            Err(CheckError::Git {
                command: "status".into(),
                stderr: "fatal: not a git repository".into(),
            })
        }
    }

    struct PanickingCheck;

    #[async_trait]
    impl Check for PanickingCheck {
        fn name(&self) -> &'static str {
            "panicking"
        }

        async fn check(
            &self,
            _input: &CheckInput,
            _cancel: &CancellationToken,
        ) -> Result<CheckOutput, CheckError> {
            panic!("check exploded")
        }
    }

    /// Waits for its partner, so it only finishes when both run at once.
    struct Rendezvous {
        name: &'static str,
        wait: Arc<Notify>,
        wake: Arc<Notify>,
    }

    #[async_trait]
    impl Check for Rendezvous {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn check(
            &self,
            _input: &CheckInput,
            _cancel: &CancellationToken,
        ) -> Result<CheckOutput, CheckError> {
            self.wake.notify_one();
            self.wait.notified().await;
            Ok(CheckOutput::new())
        }
    }

    #[derive(Default)]
    struct RecordingPrinter {
        reports: Vec<(&'static str, bool)>,
        summary: Option<RunSummary>,
        interrupted: bool,
    }

    impl Printer for RecordingPrinter {
        fn print_check_result(&mut self, report: &CheckReport) {
            self.reports.push((report.name, report.is_failure()));
        }

        fn print_summary(&mut self, summary: &RunSummary) {
            self.summary = Some(summary.clone());
        }

        fn print_interrupted(&mut self) {
            self.interrupted = true;
        }
    }

    fn fixed(name: &'static str, issues: Vec<Issue>) -> Arc<dyn Check> {
        Arc::new(FixedCheck { name, issues })
    }

    fn input() -> CheckInput {
        CheckInput::new("/repo", vec![Entry::new(1, "*", ["@a"])])
    }

    async fn run(
        checks: Vec<Arc<dyn Check>>,
        threshold: Severity,
    ) -> (RunOutcome, RecordingPrinter) {
        let mut printer = RecordingPrinter::default();
        let outcome = CheckRunner::new(checks, threshold)
            .run(input(), &CancellationToken::new(), &mut printer)
            .await;
        (outcome, printer)
    }

    #[tokio::test]
    async fn clean_run_passes() {
        let (outcome, printer) = run(
            vec![fixed("a", vec![]), fixed("b", vec![])],
            Severity::Warning,
        )
        .await;

        assert_eq!(outcome, RunOutcome::Passed);
        assert_eq!(outcome.exit_code(), 0);
        let summary = printer.summary.unwrap();
        assert_eq!(summary.checks_run, 2);
        assert_eq!(summary.checks_failed, 0);
        assert_eq!(summary.most_severe(), None);
    }

    #[tokio::test]
    async fn threshold_decides_failure() {
        let checks = || vec![fixed("warns", vec![Issue::warning("hmm")])];

        let (outcome, _) = run(checks(), Severity::Warning).await;
        assert_eq!(outcome, RunOutcome::Failed);
        assert_eq!(outcome.exit_code(), 3);

        let (outcome, printer) = run(checks(), Severity::Error).await;
        assert_eq!(outcome, RunOutcome::Passed);
        let summary = printer.summary.unwrap();
        assert_eq!(summary.checks_failed, 1);
        assert!(summary.should_exit_with_failure(Severity::Warning));
        assert!(!summary.should_exit_with_failure(Severity::Error));
    }

    #[tokio::test]
    async fn severities_are_tallied_across_checks() {
        let (outcome, printer) = run(
            vec![
                fixed("a", vec![Issue::warning("w1"), Issue::error("e1")]),
                fixed("b", vec![Issue::warning("w2")]),
                fixed("c", vec![]),
            ],
            Severity::Error,
        )
        .await;

        assert_eq!(outcome, RunOutcome::Failed);
        let summary = printer.summary.unwrap();
        assert_eq!(summary.by_severity[&Severity::Warning], 2);
        assert_eq!(summary.by_severity[&Severity::Error], 1);
        assert_eq!(summary.issue_count(), 3);
        assert_eq!(summary.checks_failed, 2);
        assert_eq!(summary.most_severe(), Some(Severity::Error));
    }

    #[tokio::test]
    async fn internal_errors_are_isolated() {
        let (outcome, printer) = run(
            vec![
                Arc::new(BrokenCheck),
                Arc::new(PanickingCheck),
                fixed("ok", vec![]),
            ],
            Severity::Error,
        )
        .await;

        assert_eq!(outcome, RunOutcome::Failed);
        assert_eq!(printer.reports.len(), 3);
        assert!(printer.reports.contains(&("ok", false)));
        assert!(printer.reports.contains(&("broken", true)));
        assert!(printer.reports.contains(&("panicking", true)));

        let summary = printer.summary.unwrap();
        assert_eq!(summary.internal_errors, 2);
        assert_eq!(summary.most_severe(), Some(Severity::Error));
    }

    #[tokio::test]
    async fn checks_run_concurrently() {
        let first = Arc::new(Notify::new());
        let second = Arc::new(Notify::new());
        let checks: Vec<Arc<dyn Check>> = vec![
            Arc::new(Rendezvous {
                name: "left",
                wait: first.clone(),
                wake: second.clone(),
            }),
            Arc::new(Rendezvous {
                name: "right",
                wait: second,
                wake: first,
            }),
        ];

        let (outcome, printer) = run(checks, Severity::Warning).await;
        assert_eq!(outcome, RunOutcome::Passed);
        assert_eq!(printer.reports.len(), 2);
    }

    #[tokio::test]
    async fn cancellation_overrides_outcome() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut printer = RecordingPrinter::default();

        let outcome = CheckRunner::new(
            vec![fixed("a", vec![Issue::error("never seen")])],
            Severity::Warning,
        )
        .run(input(), &cancel, &mut printer)
        .await;

        assert_eq!(outcome, RunOutcome::Interrupted);
        assert_eq!(outcome.exit_code(), 2);
        assert!(printer.interrupted);
        assert!(printer.summary.is_none());
        assert!(printer.reports.is_empty());
    }

    #[test]
    fn check_names_in_order() {
        let runner = CheckRunner::new(
            vec![fixed("x", vec![]), fixed("y", vec![])],
            Severity::Error,
        );
        assert_eq!(runner.check_names(), vec!["x", "y"]);
    }
}
