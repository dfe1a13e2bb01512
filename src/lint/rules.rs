//! Rule severities and rule-file loading.
//!
//! Rule files use the conventions of the linters they replace:
//! `.sass-lint.yml` with numeric levels and `.eslintrc.json` with
//! `"off" | "warn" | "error"` names, optionally in `[level, options]` form.

use super::LintError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// How seriously a rule hit is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Rule disabled
    Off,
    /// Reported, does not fail the task
    Warning,
    /// Reported and fails the task
    Error,
}

impl Severity {
    /// Map a numeric level (0, 1, 2).
    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            0 => Some(Severity::Off),
            1 => Some(Severity::Warning),
            2 => Some(Severity::Error),
            _ => None,
        }
    }

    /// Map a level name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "off" => Some(Severity::Off),
            "warn" | "warning" => Some(Severity::Warning),
            "error" => Some(Severity::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Off => write!(f, "off"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Severity as written in a rule file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSeverity {
    Level(i64),
    Name(String),
    WithOptions(Vec<serde_json::Value>),
}

impl RawSeverity {
    fn resolve(&self) -> Option<Severity> {
        match self {
            RawSeverity::Level(level) => Severity::from_level(*level),
            RawSeverity::Name(name) => Severity::from_name(name),
            RawSeverity::WithOptions(values) => match values.first()? {
                serde_json::Value::Number(n) => n.as_i64().and_then(Severity::from_level),
                serde_json::Value::String(s) => Severity::from_name(s),
                _ => None,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RuleFile {
    #[serde(default)]
    rules: BTreeMap<String, RawSeverity>,
}

/// The severity of every known rule for one linter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    severities: BTreeMap<String, Severity>,
}

impl RuleSet {
    /// Create a rule set from built-in defaults.
    pub fn new(defaults: &[(&str, Severity)]) -> Self {
        Self { severities: defaults.iter().map(|(name, sev)| (name.to_string(), *sev)).collect() }
    }

    /// Severity of a rule; unknown rules are off.
    pub fn severity(&self, rule: &str) -> Severity {
        self.severities.get(rule).copied().unwrap_or(Severity::Off)
    }

    /// Whether a rule is known to this set.
    pub fn contains(&self, rule: &str) -> bool {
        self.severities.contains_key(rule)
    }

    /// Set a known rule's severity. Unknown names are ignored.
    pub fn set(&mut self, rule: &str, severity: Severity) {
        if let Some(slot) = self.severities.get_mut(rule) {
            *slot = severity;
        }
    }

    /// Apply overrides from a rule file.
    ///
    /// Returns the names that did not match a known rule.
    pub fn apply(&mut self, overrides: &BTreeMap<String, Severity>) -> Vec<String> {
        let mut unknown = Vec::new();
        for (name, severity) in overrides {
            if self.contains(name) {
                self.set(name, *severity);
            } else {
                unknown.push(name.clone());
            }
        }
        unknown
    }
}

/// Read rule overrides from a rule file.
///
/// A missing file yields no overrides. YAML is used for `.yml`/`.yaml`
/// files, JSON for everything else. Entries with an unrecognised level are
/// logged and skipped.
pub fn load_rule_overrides(path: &Path) -> Result<BTreeMap<String, Severity>, LintError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no rule file, using defaults");
            return Ok(BTreeMap::new());
        }
        Err(source) => return Err(LintError::Read { path: path.to_path_buf(), source }),
    };

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml") | Some("yaml")
    );

    let file: RuleFile = if contents.trim().is_empty() {
        RuleFile::default()
    } else if is_yaml {
        serde_yaml::from_str(&contents).map_err(|e| LintError::RuleFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
    } else {
        serde_json::from_str(&contents).map_err(|e| LintError::RuleFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
    };

    let mut overrides = BTreeMap::new();
    for (name, raw) in file.rules {
        match raw.resolve() {
            Some(severity) => {
                overrides.insert(name, severity);
            }
            None => tracing::warn!(rule = %name, path = %path.display(), "unrecognised rule level"),
        }
    }
    Ok(overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_severity_parsing() {
        assert_eq!(Severity::from_level(0), Some(Severity::Off));
        assert_eq!(Severity::from_level(2), Some(Severity::Error));
        assert_eq!(Severity::from_level(3), None);
        assert_eq!(Severity::from_name("warn"), Some(Severity::Warning));
        assert_eq!(Severity::from_name("Error"), Some(Severity::Error));
        assert_eq!(Severity::from_name("loud"), None);
    }

    #[test]
    fn test_rule_set_apply_reports_unknown() {
        let mut rules = RuleSet::new(&[("no-ids", Severity::Error), ("no-debug", Severity::Error)]);
        let overrides = BTreeMap::from([
            ("no-ids".to_string(), Severity::Off),
            ("no-color-keywords".to_string(), Severity::Warning),
        ]);

        let unknown = rules.apply(&overrides);
        assert_eq!(unknown, vec!["no-color-keywords".to_string()]);
        assert_eq!(rules.severity("no-ids"), Severity::Off);
        assert_eq!(rules.severity("no-debug"), Severity::Error);
        assert_eq!(rules.severity("no-color-keywords"), Severity::Off);
    }

    #[test]
    fn test_load_sass_lint_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".sass-lint.yml");
        fs::write(&path, "options:\n  formatter: stylish\nrules:\n  no-ids: 0\n  no-important: 1\n  indentation: [2, {size: 2}]\n").unwrap();

        let overrides = load_rule_overrides(&path).unwrap();
        assert_eq!(overrides.get("no-ids"), Some(&Severity::Off));
        assert_eq!(overrides.get("no-important"), Some(&Severity::Warning));
        assert_eq!(overrides.get("indentation"), Some(&Severity::Error));
    }

    #[test]
    fn test_load_eslintrc_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".eslintrc.json");
        fs::write(
            &path,
            r#"{"env": {"browser": true}, "rules": {"no-console": "off", "eqeqeq": ["error", "always"], "no-var": 2, "odd": "sometimes"}}"#,
        )
        .unwrap();

        let overrides = load_rule_overrides(&path).unwrap();
        assert_eq!(overrides.get("no-console"), Some(&Severity::Off));
        assert_eq!(overrides.get("eqeqeq"), Some(&Severity::Error));
        assert_eq!(overrides.get("no-var"), Some(&Severity::Error));
        assert!(!overrides.contains_key("odd"));
    }

    #[test]
    fn test_missing_rule_file_is_empty() {
        let overrides = load_rule_overrides(Path::new("/nonexistent/.eslintrc.json")).unwrap();
        assert!(overrides.is_empty());
    }

    #[test]
    fn test_malformed_rule_file_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".eslintrc.json");
        fs::write(&path, "{ rules: ").unwrap();
        assert!(matches!(load_rule_overrides(&path), Err(LintError::RuleFile { .. })));
    }
}
