//! SCSS linter.
//!
//! Rules run over a copy of the source in which comments and string contents
//! are blanked out, so offsets still line up with the original text.

use crate::lint::{Finding, Linter, RuleSet, Severity};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Built-in rules with their default severities.
pub const DEFAULT_RULES: &[(&str, Severity)] = &[
    ("no-important", Severity::Error),
    ("no-ids", Severity::Error),
    ("no-debug", Severity::Error),
    ("no-trailing-whitespace", Severity::Warning),
    ("final-newline", Severity::Warning),
    ("no-empty-rulesets", Severity::Warning),
];

/// Linter for `.scss` sources.
#[derive(Debug, Clone)]
pub struct StyleLinter {
    rules: RuleSet,
}

impl StyleLinter {
    /// Create a linter with the given rule set.
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }
}

impl Default for StyleLinter {
    fn default() -> Self {
        Self::new(RuleSet::new(DEFAULT_RULES))
    }
}

impl Linter for StyleLinter {
    fn name(&self) -> &'static str {
        "sass-lint"
    }

    fn rules(&self) -> &RuleSet {
        &self.rules
    }

    fn check(&self, _path: &Path, source: &str) -> Vec<Finding> {
        let code = blank_comments_and_strings(source);
        let mut findings = Vec::new();

        for m in important_re().find_iter(&code) {
            findings.push(Finding::new("no-important", m.start(), "!important not allowed"));
        }
        for m in debug_re().find_iter(&code) {
            findings.push(Finding::new("no-debug", m.start(), "@debug statements not allowed"));
        }
        check_blocks(&code, &mut findings);
        check_whitespace(source, &mut findings);

        findings
    }
}

fn important_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"!\s*important\b").expect("valid regex"))
}

fn debug_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@debug\b").expect("valid regex"))
}

fn id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#[A-Za-z_-][\w-]*").expect("valid regex"))
}

/// Replace comment bodies and string contents with spaces.
///
/// Newlines are kept. A `//` directly after `:` is left alone so unquoted
/// `url(http://...)` values survive.
fn blank_comments_and_strings(source: &str) -> String {
    let bytes = source.as_bytes();
    let mut out = bytes.to_vec();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = find_from(bytes, i + 2, b"*/").map(|e| e + 2).unwrap_or(bytes.len());
                blank(&mut out, i, end);
                i = end;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') && (i == 0 || bytes[i - 1] != b':') => {
                let end = find_from(bytes, i, b"\n").unwrap_or(bytes.len());
                blank(&mut out, i, end);
                i = end;
            }
            quote @ (b'"' | b'\'') => {
                let mut j = i + 1;
                while j < bytes.len() && bytes[j] != quote && bytes[j] != b'\n' {
                    if bytes[j] == b'\\' {
                        j += 1;
                    }
                    j += 1;
                }
                let end = j.min(bytes.len());
                blank(&mut out, i + 1, end);
                i = end + 1;
            }
            _ => i += 1,
        }
    }

    // Only ASCII bytes were substituted, so the buffer is still valid UTF-8
    String::from_utf8_lossy(&out).into_owned()
}

fn find_from(haystack: &[u8], start: usize, needle: &[u8]) -> Option<usize> {
    if start >= haystack.len() {
        return None;
    }
    haystack[start..].windows(needle.len()).position(|w| w == needle).map(|p| p + start)
}

fn blank(buf: &mut [u8], start: usize, end: usize) {
    let end = end.min(buf.len());
    let start = start.min(end);
    for b in &mut buf[start..end] {
        if *b != b'\n' {
            *b = b' ';
        }
    }
}

enum Block {
    Interpolation,
    Rule { selector_start: usize, open: usize, is_selector: bool },
}

/// Walk `{`/`}` pairs to find selectors (for `no-ids`) and empty rulesets.
fn check_blocks(code: &str, findings: &mut Vec<Finding>) {
    let bytes = code.as_bytes();
    let mut stack: Vec<Block> = Vec::new();
    let mut segment_start = 0;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'{' if i > 0 && bytes[i - 1] == b'#' => stack.push(Block::Interpolation),
            b'{' => {
                let raw = &code[segment_start..i];
                let selector = raw.trim();
                let is_selector =
                    !selector.is_empty() && !selector.starts_with('@') && !selector.ends_with(':');
                if is_selector {
                    check_selector_ids(raw, segment_start, findings);
                }
                let selector_start = segment_start + (raw.len() - raw.trim_start().len());
                stack.push(Block::Rule { selector_start, open: i, is_selector });
                segment_start = i + 1;
            }
            b'}' => {
                match stack.pop() {
                    Some(Block::Interpolation) => continue,
                    Some(Block::Rule { selector_start, open, is_selector }) => {
                        if is_selector && code[open + 1..i].trim().is_empty() {
                            findings.push(Finding::new(
                                "no-empty-rulesets",
                                selector_start,
                                "Empty rulesets not allowed",
                            ));
                        }
                    }
                    None => {}
                }
                segment_start = i + 1;
            }
            b';' => segment_start = i + 1,
            _ => {}
        }
    }
}

fn check_selector_ids(raw: &str, base: usize, findings: &mut Vec<Finding>) {
    // `#{...}` interpolation never matches the pattern
    for m in id_re().find_iter(raw) {
        findings.push(Finding::new(
            "no-ids",
            base + m.start(),
            format!("ID selectors not allowed ({})", m.as_str()),
        ));
    }
}

fn check_whitespace(source: &str, findings: &mut Vec<Finding>) {
    let mut offset = 0;
    for line in source.split_inclusive('\n') {
        let content = line.trim_end_matches('\n').trim_end_matches('\r');
        let trimmed = content.trim_end_matches([' ', '\t']);
        if trimmed.len() != content.len() {
            findings.push(Finding::new(
                "no-trailing-whitespace",
                offset + trimmed.len(),
                "Trailing whitespace not allowed",
            ));
        }
        offset += line.len();
    }

    if !source.is_empty() && !source.ends_with('\n') {
        findings.push(Finding::new("final-newline", source.len(), "Files must end with a new line"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::lint_source;

    fn rules_hit(source: &str) -> Vec<String> {
        let linter = StyleLinter::default();
        lint_source(&linter, Path::new("test.scss"), source).into_iter().map(|v| v.rule).collect()
    }

    #[test]
    fn test_clean_source() {
        let src = "$brand: #336699;\n\n.button {\n  color: $brand;\n\n  &:hover {\n    color: darken($brand, 10%);\n  }\n}\n";
        assert!(rules_hit(src).is_empty());
    }

    #[test]
    fn test_no_important() {
        assert_eq!(rules_hit(".a {\n  color: red !important;\n}\n"), vec!["no-important"]);
        assert_eq!(rules_hit(".a {\n  color: red ! important;\n}\n"), vec!["no-important"]);
    }

    #[test]
    fn test_no_ids_only_in_selectors() {
        assert_eq!(rules_hit("#header .nav {\n  color: #fff;\n}\n"), vec!["no-ids"]);
        assert!(rules_hit(".a {\n  background: #abcdef;\n}\n").is_empty());
    }

    #[test]
    fn test_interpolation_is_not_an_id() {
        let src = "$name: 'x';\n.icon-#{$name} {\n  display: block;\n}\n";
        assert!(rules_hit(src).is_empty());
    }

    #[test]
    fn test_comments_and_strings_are_ignored() {
        let src = "// #legacy { color: red !important; }\n/* @debug 'x'; */\n.a {\n  content: \"#id !important\";\n}\n";
        assert!(rules_hit(src).is_empty());
    }

    #[test]
    fn test_unterminated_comment_and_string_at_end_of_file() {
        assert_eq!(rules_hit(".a {\n  color: red;\n}\n/* #main !important"), vec!["final-newline"]);
        let masked = blank_comments_and_strings(".a { content: \"#x\\");
        assert_eq!(masked.len(), ".a { content: \"#x\\".len());
        assert!(!masked.contains("#x"));
    }

    #[test]
    fn test_blank_clamps_range() {
        let mut buf = b"ab\ncd".to_vec();
        blank(&mut buf, 1, 99);
        assert_eq!(buf, b"a \n  ");
        blank(&mut buf, 10, 99);
        assert_eq!(buf.len(), 5);
    }

    #[test]
    fn test_url_with_scheme_is_not_a_comment() {
        let src = ".a {\n  background: url(http://example.com/x.png) !important;\n}\n";
        assert_eq!(rules_hit(src), vec!["no-important"]);
    }

    #[test]
    fn test_no_debug() {
        assert_eq!(rules_hit("@debug 'value';\n"), vec!["no-debug"]);
    }

    #[test]
    fn test_whitespace_rules() {
        let hits = rules_hit(".a {\n  color: red; \n}");
        assert_eq!(hits, vec!["no-trailing-whitespace", "final-newline"]);
    }

    #[test]
    fn test_empty_ruleset() {
        assert_eq!(rules_hit(".a {\n}\n"), vec!["no-empty-rulesets"]);
        assert!(rules_hit("@media print {\n}\n").is_empty());
    }

    #[test]
    fn test_violation_location() {
        let linter = StyleLinter::default();
        let violations =
            lint_source(&linter, Path::new("test.scss"), ".a {\n  color: red;\n}\n\n#main {\n  margin: 0;\n}\n");
        assert_eq!(violations.len(), 1);
        assert_eq!((violations[0].line, violations[0].column), (5, 1));
        assert!(violations[0].message.contains("#main"));
    }

    #[test]
    fn test_disabled_rule_via_rule_set() {
        let mut rules = RuleSet::new(DEFAULT_RULES);
        rules.set("no-ids", Severity::Off);
        let linter = StyleLinter::new(rules);
        assert!(lint_source(&linter, Path::new("t.scss"), "#a {\n  margin: 0;\n}\n").is_empty());
    }
}
