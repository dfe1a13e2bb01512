//! Lint violations and the console report.

use super::Severity;
use std::path::{Path, PathBuf};

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File containing the violation
    pub file: PathBuf,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
    /// Severity from the rule set
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// Rule name
    pub rule: String,
}

/// Result of linting a set of files.
#[derive(Debug, Default)]
pub struct LintReport {
    /// Number of files that were checked
    pub files_checked: usize,
    /// Whether the linter stopped before checking every file
    pub stopped_early: bool,
    /// Violations grouped by file, in check order
    files: Vec<Vec<Violation>>,
}

impl LintReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the violations of one checked file.
    pub fn add_file(&mut self, violations: Vec<Violation>) {
        self.files_checked += 1;
        if !violations.is_empty() {
            self.files.push(violations);
        }
    }

    /// All violations in check order.
    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.files.iter().flatten()
    }

    /// Number of error-level violations.
    pub fn error_count(&self) -> usize {
        self.violations().filter(|v| v.severity == Severity::Error).count()
    }

    /// Number of warnings.
    pub fn warning_count(&self) -> usize {
        self.violations().filter(|v| v.severity == Severity::Warning).count()
    }

    /// Whether any error-level violation was found.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Whether no violation of any level was found.
    pub fn is_clean(&self) -> bool {
        self.files.is_empty()
    }

    /// Format the report in a stylish layout, relative to `base` when possible.
    ///
    /// Returns an empty string for a clean report.
    pub fn format(&self, base: Option<&Path>) -> String {
        if self.is_clean() {
            return String::new();
        }

        let mut out = String::new();
        for violations in &self.files {
            let file = &violations[0].file;
            let shown = base.and_then(|b| file.strip_prefix(b).ok()).unwrap_or(file);
            out.push('\n');
            out.push_str(&shown.display().to_string());
            out.push('\n');

            let width = violations
                .iter()
                .map(|v| format!("{}:{}", v.line, v.column).len())
                .max()
                .unwrap_or(0);
            for v in violations {
                let location = format!("{}:{}", v.line, v.column);
                out.push_str(&format!(
                    "  {:<width$}  {:<7}  {}  {}\n",
                    location,
                    v.severity.to_string(),
                    v.message,
                    v.rule,
                    width = width
                ));
            }
        }

        let errors = self.error_count();
        let warnings = self.warning_count();
        let total = errors + warnings;
        out.push_str(&format!(
            "\n\u{2716} {} problem{} ({} error{}, {} warning{})\n",
            total,
            plural(total),
            errors,
            plural(errors),
            warnings,
            plural(warnings)
        ));
        out
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(file: &str, line: usize, severity: Severity, rule: &str) -> Violation {
        Violation {
            file: PathBuf::from(file),
            line,
            column: 3,
            severity,
            message: format!("{} hit", rule),
            rule: rule.to_string(),
        }
    }

    #[test]
    fn test_clean_report_formats_empty() {
        let mut report = LintReport::new();
        report.add_file(vec![]);
        assert!(report.is_clean());
        assert_eq!(report.files_checked, 1);
        assert_eq!(report.format(None), "");
    }

    #[test]
    fn test_counts() {
        let mut report = LintReport::new();
        report.add_file(vec![
            violation("a.scss", 1, Severity::Error, "no-ids"),
            violation("a.scss", 4, Severity::Warning, "final-newline"),
        ]);
        report.add_file(vec![violation("b.scss", 2, Severity::Error, "no-debug")]);

        assert_eq!(report.error_count(), 2);
        assert_eq!(report.warning_count(), 1);
        assert!(report.has_errors());
        assert_eq!(report.violations().count(), 3);
    }

    #[test]
    fn test_format_lists_every_violation() {
        let mut report = LintReport::new();
        report.add_file(vec![
            violation("/theme/sass/a.scss", 1, Severity::Error, "no-ids"),
            violation("/theme/sass/a.scss", 12, Severity::Warning, "final-newline"),
        ]);

        let text = report.format(Some(Path::new("/theme")));
        assert!(text.contains("sass/a.scss\n"));
        assert!(text.contains("1:3   error    no-ids hit  no-ids"));
        assert!(text.contains("12:3  warning  final-newline hit  final-newline"));
        assert!(text.contains("2 problems (1 error, 1 warning)"));
    }
}
