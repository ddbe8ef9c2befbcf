//! Output formatting for the CLI.
//!
//! This module provides the human-readable and JSON printers the check
//! runner reports into.

use codeowners_lint_core::validate::{CheckReport, Issue, Printer, RunSummary, Severity};
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Prints each check as soon as it finishes.
pub struct TtyPrinter<W: Write> {
    writer: W,
    use_colors: bool,
    error: Option<io::Error>,
}

impl<W: Write> TtyPrinter<W> {
    pub fn new(writer: W, use_colors: bool) -> Self {
        Self {
            writer,
            use_colors,
            error: None,
        }
    }

    /// Returns the first write error, if any.
    pub fn finish(self) -> io::Result<()> {
        self.error.map_or(Ok(()), Err)
    }

    fn keep_first_error(&mut self, result: io::Result<()>) {
        if let Err(e) = result
            && self.error.is_none()
        {
            self.error = Some(e);
        }
    }

    fn write_report(&mut self, report: &CheckReport) -> io::Result<()> {
        let header = format!("==> Executing {} ({:.2?})", report.name, report.duration);
        if self.use_colors {
            writeln!(self.writer, "{}", header.cyan().bold())?;
        } else {
            writeln!(self.writer, "{}", header)?;
        }

        match &report.outcome {
            Ok(output) if output.is_ok() => {
                let ok = "    Check OK";
                if self.use_colors {
                    writeln!(self.writer, "{}", ok.green())?;
                } else {
                    writeln!(self.writer, "{}", ok)?;
                }
            }
            Ok(output) => {
                for issue in &output.issues {
                    self.write_issue(issue)?;
                }
            }
            Err(err) => {
                let label = "[internal error]";
                if self.use_colors {
                    writeln!(self.writer, "    {} {}", label.red().bold(), err)?;
                } else {
                    writeln!(self.writer, "    {} {}", label, err)?;
                }
            }
        }
        writeln!(self.writer)
    }

    /// Writes a single issue.
    pub fn write_issue(&mut self, issue: &Issue) -> io::Result<()> {
        let label = format!("[{}]", issue.severity.short_tag());
        let label = if self.use_colors {
            match issue.severity {
                Severity::Error => label.red().bold().to_string(),
                Severity::Warning => label.yellow().bold().to_string(),
            }
        } else {
            label
        };

        match issue.line {
            Some(line) => writeln!(self.writer, "    {} line {}: {}", label, line, issue.message),
            None => writeln!(self.writer, "    {} {}", label, issue.message),
        }
    }

    fn write_summary(&mut self, summary: &RunSummary) -> io::Result<()> {
        let failures = match summary.checks_failed {
            0 => "no".to_string(),
            n => n.to_string(),
        };
        let message = format!(
            "{} check(s) executed, {} failure(s)",
            summary.checks_run, failures
        );

        if !self.use_colors {
            return writeln!(self.writer, "{}", message);
        }
        if summary.checks_failed == 0 {
            writeln!(self.writer, "{}", message.green().bold())
        } else {
            writeln!(self.writer, "{}", message.red().bold())
        }
    }

    /// Writes a startup error.
    pub fn write_error(&mut self, message: &str) -> io::Result<()> {
        if self.use_colors {
            writeln!(self.writer, "{} {}", "Error:".red().bold(), message)
        } else {
            writeln!(self.writer, "Error: {}", message)
        }
    }
}

impl<W: Write + Send> Printer for TtyPrinter<W> {
    fn print_check_result(&mut self, report: &CheckReport) {
        let result = self.write_report(report);
        self.keep_first_error(result);
    }

    fn print_summary(&mut self, summary: &RunSummary) {
        let result = self.write_summary(summary);
        self.keep_first_error(result);
    }

    fn print_interrupted(&mut self) {
        let result = writeln!(self.writer, "Interrupted: not every check finished");
        self.keep_first_error(result);
    }
}

/// The JSON record of one check.
#[derive(Debug, Default, Serialize)]
pub struct JsonCheck {
    pub issues: Vec<Issue>,
    /// Set when the check could not finish.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Collects every report and writes one JSON object keyed by check name.
pub struct JsonPrinter<W: Write> {
    writer: W,
    checks: BTreeMap<&'static str, JsonCheck>,
    error: Option<io::Error>,
}

impl<W: Write> JsonPrinter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            checks: BTreeMap::new(),
            error: None,
        }
    }

    /// Returns the write error, if writing the document failed.
    pub fn finish(self) -> io::Result<()> {
        self.error.map_or(Ok(()), Err)
    }

    fn write_document(&mut self) {
        let result = serde_json::to_string_pretty(&self.checks)
            .map_err(io::Error::other)
            .and_then(|json| writeln!(self.writer, "{}", json));
        if let Err(e) = result {
            self.error = Some(e);
        }
    }
}

impl<W: Write + Send> Printer for JsonPrinter<W> {
    fn print_check_result(&mut self, report: &CheckReport) {
        let check = match &report.outcome {
            Ok(output) => JsonCheck {
                issues: output.issues.clone(),
                error: None,
            },
            Err(err) => JsonCheck {
                issues: Vec::new(),
                error: Some(err.to_string()),
            },
        };
        self.checks.insert(report.name, check);
    }

    fn print_summary(&mut self, _summary: &RunSummary) {
        self.write_document();
    }

    fn print_interrupted(&mut self) {
        self.write_document();
    }
}
