use std::fmt::{self, Write as _};

use serde::Serialize;

use crate::store::StoreMode;

/// Outcome of one check
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum CheckStatus {
    /// Check passed
    Ok,
    /// Store is usable but something looks off
    Warning(String),
    /// Store is damaged
    Failed(String),
}

impl CheckStatus {
    fn symbol(&self) -> &'static str {
        match self {
            CheckStatus::Ok => "✓",
            CheckStatus::Warning(_) => "⚠",
            CheckStatus::Failed(_) => "✗",
        }
    }
}

/// One named check and its outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationCheck {
    /// Name of the check
    pub name: String,
    /// Outcome
    pub status: CheckStatus,
}

impl ValidationCheck {
    pub(crate) fn ok(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Ok,
        }
    }

    pub(crate) fn warning(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Warning(message.into()),
        }
    }

    pub(crate) fn failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Failed(message.into()),
        }
    }

    /// Ok when `bad` is zero, otherwise a warning or failure naming the
    /// first offending object
    pub(crate) fn from_count(
        name: impl Into<String>,
        bad: usize,
        total: usize,
        first: Option<i64>,
        fatal: bool,
    ) -> Self {
        if bad == 0 {
            return Self::ok(name);
        }
        let mut message = format!("{} of {} spectra", bad, total);
        if let Some(id) = first {
            let _ = write!(message, " (first: object {})", id);
        }
        if fatal {
            Self::failed(name, message)
        } else {
            Self::warning(name, message)
        }
    }
}

/// Result of validating one spectrum store
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    /// Path of the validated store
    pub file_path: String,
    /// Record encoding, once the header could be read
    pub mode: Option<StoreMode>,
    /// Spectra listed in the index
    pub spectra: usize,
    /// Pixels across all readable records
    pub pixels: u64,
    /// Checks in the order they ran
    pub checks: Vec<ValidationCheck>,
}

impl ValidationReport {
    /// An empty report for `file_path`
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            mode: None,
            spectra: 0,
            pixels: 0,
            checks: Vec::new(),
        }
    }

    /// Record a check
    pub fn add_check(&mut self, check: ValidationCheck) {
        self.checks.push(check);
    }

    /// Look up a check by name
    pub fn check(&self, name: &str) -> Option<&ValidationCheck> {
        self.checks.iter().find(|c| c.name == name)
    }

    fn count(&self, pred: impl Fn(&CheckStatus) -> bool) -> usize {
        self.checks.iter().filter(|c| pred(&c.status)).count()
    }

    /// Number of passed checks
    pub fn success_count(&self) -> usize {
        self.count(|s| matches!(s, CheckStatus::Ok))
    }

    /// Number of warnings
    pub fn warning_count(&self) -> usize {
        self.count(|s| matches!(s, CheckStatus::Warning(_)))
    }

    /// Number of failed checks
    pub fn failure_count(&self) -> usize {
        self.count(|s| matches!(s, CheckStatus::Failed(_)))
    }

    /// Returns true if any check failed
    pub fn has_failures(&self) -> bool {
        self.failure_count() > 0
    }

    /// Returns true if any check warned
    pub fn has_warnings(&self) -> bool {
        self.warning_count() > 0
    }

    fn verdict(&self) -> &'static str {
        if self.has_failures() {
            "Validation FAILED"
        } else if self.has_warnings() {
            "Validation PASSED with warnings"
        } else {
            "Validation PASSED"
        }
    }

    fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("File: {}", self.file_path)];
        if let Some(mode) = self.mode {
            lines.push(format!("Mode: {}", mode));
            lines.push(format!("Spectra: {}, pixels: {}", self.spectra, self.pixels));
        }
        lines
    }

    /// Render the report with terminal colours
    #[cfg(feature = "colorized_output")]
    pub fn format_colored(&self) -> String {
        use console::style;

        let mut out = String::new();
        let _ = writeln!(out, "{}", style("Spectrum Store Validation Report").bold().cyan());
        for line in self.summary_lines() {
            let _ = writeln!(out, "{}", line);
        }
        out.push('\n');

        for check in &self.checks {
            let (symbol, name) = match &check.status {
                CheckStatus::Ok => (style(check.status.symbol()).green(), style(&check.name).green()),
                CheckStatus::Warning(_) => (
                    style(check.status.symbol()).yellow(),
                    style(&check.name).yellow(),
                ),
                CheckStatus::Failed(_) => (style(check.status.symbol()).red(), style(&check.name).red()),
            };
            let _ = write!(out, "[{}] {}", symbol, name);
            match &check.status {
                CheckStatus::Ok => out.push('\n'),
                CheckStatus::Warning(msg) => {
                    let _ = writeln!(out, " - {}: {}", style("WARNING").yellow().bold(), msg);
                }
                CheckStatus::Failed(msg) => {
                    let _ = writeln!(out, " - {}: {}", style("FAILED").red().bold(), msg);
                }
            }
        }

        let _ = writeln!(
            out,
            "\n{}: {} passed, {} warnings, {} failed\n",
            style("Summary").bold(),
            style(self.success_count()).green(),
            style(self.warning_count()).yellow(),
            style(self.failure_count()).red()
        );
        let verdict = if self.has_failures() {
            style(self.verdict()).red().bold()
        } else if self.has_warnings() {
            style(self.verdict()).yellow().bold()
        } else {
            style(self.verdict()).green().bold()
        };
        let _ = writeln!(out, "{}", verdict);
        out
    }

    /// Render the report without colours
    #[cfg(not(feature = "colorized_output"))]
    pub fn format_colored(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Spectrum Store Validation Report")?;
        for line in self.summary_lines() {
            writeln!(f, "{}", line)?;
        }
        writeln!(f)?;

        for check in &self.checks {
            write!(f, "[{}] {}", check.status.symbol(), check.name)?;
            match &check.status {
                CheckStatus::Ok => writeln!(f)?,
                CheckStatus::Warning(msg) => writeln!(f, " - WARNING: {}", msg)?,
                CheckStatus::Failed(msg) => writeln!(f, " - FAILED: {}", msg)?,
            }
        }

        writeln!(
            f,
            "\nSummary: {} passed, {} warnings, {} failed\n",
            self.success_count(),
            self.warning_count(),
            self.failure_count()
        )?;
        writeln!(f, "{}", self.verdict())
    }
}
