//! Shared lint infrastructure for style and script sources.
//!
//! Both linters resolve a [`RuleSet`] (built-in defaults overlaid with the
//! theme's rule file), run their rules over each file and collect
//! [`Violation`]s into a [`LintReport`]. How a linter reacts to errors while
//! walking its files is governed by its [`FailPolicy`].

pub mod report;
pub mod rules;

pub use report::{LintReport, Violation};
pub use rules::{load_rule_overrides, RuleSet, Severity};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error raised while running a linter (not a lint violation).
#[derive(Debug, Error)]
pub enum LintError {
    /// A source file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        /// The unreadable file
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
    /// The rule file exists but cannot be parsed
    #[error("Invalid lint rule file {}: {message}", path.display())]
    RuleFile {
        /// The rule file
        path: PathBuf,
        /// Parser message
        message: String,
    },
}

/// When a linter stops walking its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPolicy {
    /// Stop after the first file that carries an error-level violation
    OnError,
    /// Check every file, then fail if any error was found
    AfterAll,
}

/// A rule hit inside one file, before severity is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Rule name
    pub rule: &'static str,
    /// Byte offset of the offending text
    pub offset: usize,
    /// Human-readable message
    pub message: String,
}

impl Finding {
    /// Create a finding at a byte offset.
    pub fn new(rule: &'static str, offset: usize, message: impl Into<String>) -> Self {
        Self { rule, offset, message: message.into() }
    }
}

/// A linter for one kind of source file.
pub trait Linter {
    /// Name used in logs (e.g. "sass-lint").
    fn name(&self) -> &'static str;

    /// Rule severities in effect.
    fn rules(&self) -> &RuleSet;

    /// Run every rule over a single source text.
    fn check(&self, path: &Path, source: &str) -> Vec<Finding>;
}

/// Lint a list of files, honouring the fail policy.
///
/// Findings for disabled rules are dropped; the rest become violations with
/// the configured severity and a 1-based line/column.
pub fn lint_files(
    linter: &dyn Linter,
    files: &[PathBuf],
    policy: FailPolicy,
) -> Result<LintReport, LintError> {
    let mut report = LintReport::new();

    for path in files {
        let source = std::fs::read_to_string(path)
            .map_err(|source| LintError::Read { path: path.clone(), source })?;

        let violations = lint_source(linter, path, &source);
        let file_has_errors = violations.iter().any(|v| v.severity == Severity::Error);
        tracing::debug!(
            linter = linter.name(),
            file = %path.display(),
            violations = violations.len(),
            "checked file"
        );

        report.add_file(violations);

        if file_has_errors && policy == FailPolicy::OnError {
            report.stopped_early = files.len() > report.files_checked;
            break;
        }
    }

    Ok(report)
}

/// Lint a single in-memory source.
pub fn lint_source(linter: &dyn Linter, path: &Path, source: &str) -> Vec<Violation> {
    let rules = linter.rules();
    let mut violations: Vec<Violation> = linter
        .check(path, source)
        .into_iter()
        .filter_map(|finding| {
            let severity = rules.severity(finding.rule);
            if severity == Severity::Off {
                return None;
            }
            let (line, column) = line_col(source, finding.offset);
            Some(Violation {
                file: path.to_path_buf(),
                line,
                column,
                severity,
                message: finding.message,
                rule: finding.rule.to_string(),
            })
        })
        .collect();

    violations.sort_by(|a, b| (a.line, a.column).cmp(&(b.line, b.column)));
    violations
}

/// Convert a byte offset into a 1-based (line, column) pair.
///
/// Columns count characters, not bytes. Offsets past the end clamp to the end.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = source[line_start..offset].chars().count() + 1;
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Flags every line containing "bad".
    struct BadWordLinter {
        rules: RuleSet,
    }

    impl BadWordLinter {
        fn new() -> Self {
            Self { rules: RuleSet::new(&[("no-bad", Severity::Error), ("no-meh", Severity::Warning)]) }
        }
    }

    impl Linter for BadWordLinter {
        fn name(&self) -> &'static str {
            "bad-word"
        }

        fn rules(&self) -> &RuleSet {
            &self.rules
        }

        fn check(&self, _path: &Path, source: &str) -> Vec<Finding> {
            let mut findings: Vec<Finding> = source
                .match_indices("bad")
                .map(|(i, _)| Finding::new("no-bad", i, "bad word"))
                .collect();
            findings.extend(source.match_indices("meh").map(|(i, _)| Finding::new("no-meh", i, "meh")));
            findings
        }
    }

    fn write_files(temp: &TempDir, files: &[(&str, &str)]) -> Vec<PathBuf> {
        files
            .iter()
            .map(|(name, content)| {
                let path = temp.path().join(name);
                fs::write(&path, content).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn test_line_col() {
        let src = "ab\ncdé\nf";
        assert_eq!(line_col(src, 0), (1, 1));
        assert_eq!(line_col(src, 1), (1, 2));
        assert_eq!(line_col(src, 3), (2, 1));
        // 'f' sits after the two-byte 'é'
        assert_eq!(line_col(src, 8), (3, 1));
        assert_eq!(line_col(src, 6), (2, 3));
        assert_eq!(line_col(src, 100), (3, 2));
    }

    #[test]
    fn test_lint_source_attaches_severity_and_location() {
        let linter = BadWordLinter::new();
        let violations = lint_source(&linter, Path::new("x.txt"), "ok\nmeh bad\n");

        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].rule, "no-meh");
        assert_eq!(violations[0].severity, Severity::Warning);
        assert_eq!((violations[0].line, violations[0].column), (2, 1));
        assert_eq!(violations[1].rule, "no-bad");
        assert_eq!((violations[1].line, violations[1].column), (2, 5));
    }

    #[test]
    fn test_disabled_rules_are_dropped() {
        let mut linter = BadWordLinter::new();
        linter.rules.set("no-bad", Severity::Off);
        let violations = lint_source(&linter, Path::new("x.txt"), "bad");
        assert!(violations.is_empty());
    }

    #[test]
    fn test_on_error_stops_after_first_failing_file() {
        let temp = TempDir::new().unwrap();
        let files = write_files(&temp, &[("a.txt", "meh"), ("b.txt", "bad"), ("c.txt", "bad")]);

        let report = lint_files(&BadWordLinter::new(), &files, FailPolicy::OnError).unwrap();
        assert_eq!(report.files_checked, 2);
        assert!(report.stopped_early);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn test_after_all_checks_every_file() {
        let temp = TempDir::new().unwrap();
        let files = write_files(&temp, &[("a.txt", "bad"), ("b.txt", "fine"), ("c.txt", "bad")]);

        let report = lint_files(&BadWordLinter::new(), &files, FailPolicy::AfterAll).unwrap();
        assert_eq!(report.files_checked, 3);
        assert!(!report.stopped_early);
        assert_eq!(report.error_count(), 2);
        assert!(report.has_errors());
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let files = vec![PathBuf::from("/nonexistent/file.scss")];
        let result = lint_files(&BadWordLinter::new(), &files, FailPolicy::AfterAll);
        assert!(matches!(result, Err(LintError::Read { .. })));
    }
}
