//! Script linter built on the oxc parser and semantic model.

use crate::lint::{Finding, Linter, RuleSet, Severity};
use oxc::allocator::Allocator;
use oxc::ast::ast::{Expression, IdentifierReference, VariableDeclarationKind};
use oxc::ast::AstKind;
use oxc::parser::Parser;
use oxc::semantic::{Scoping, SemanticBuilder};
use oxc::span::SourceType;
use oxc::syntax::operator::BinaryOperator;
use std::path::Path;

/// Rule used for syntax errors; always an error and not configurable.
pub const PARSE_ERROR_RULE: &str = "parse-error";

/// Built-in rules with their default severities.
pub const DEFAULT_RULES: &[(&str, Severity)] = &[
    (PARSE_ERROR_RULE, Severity::Error),
    ("no-debugger", Severity::Error),
    ("no-console", Severity::Warning),
    ("no-alert", Severity::Warning),
    ("no-eval", Severity::Error),
    ("eqeqeq", Severity::Warning),
    ("no-var", Severity::Off),
];

/// Linter for `.js` sources.
#[derive(Debug, Clone)]
pub struct ScriptLinter {
    rules: RuleSet,
}

impl ScriptLinter {
    /// Create a linter with the given rule set.
    ///
    /// Syntax errors stay at error level whatever the rule file says.
    pub fn new(mut rules: RuleSet) -> Self {
        rules.set(PARSE_ERROR_RULE, Severity::Error);
        Self { rules }
    }
}

impl Default for ScriptLinter {
    fn default() -> Self {
        Self::new(RuleSet::new(DEFAULT_RULES))
    }
}

impl Linter for ScriptLinter {
    fn name(&self) -> &'static str {
        "eslint"
    }

    fn rules(&self) -> &RuleSet {
        &self.rules
    }

    fn check(&self, path: &Path, source: &str) -> Vec<Finding> {
        let allocator = Allocator::default();
        let source_type = SourceType::from_path(path).unwrap_or_default();
        let parsed = Parser::new(&allocator, source, source_type).parse();

        if !parsed.errors.is_empty() {
            return parsed
                .errors
                .iter()
                .map(|err| {
                    let offset = err
                        .labels
                        .as_ref()
                        .and_then(|labels| labels.first())
                        .map(|label| label.offset())
                        .unwrap_or(0);
                    Finding::new(PARSE_ERROR_RULE, offset, format!("Parsing error: {}", err.message))
                })
                .collect();
        }

        let semantic = SemanticBuilder::new().build(&parsed.program).semantic;
        let mut findings = Vec::new();

        for node in semantic.nodes().iter() {
            match node.kind() {
                AstKind::DebuggerStatement(stmt) => findings.push(Finding::new(
                    "no-debugger",
                    stmt.span.start as usize,
                    "Unexpected 'debugger' statement",
                )),
                AstKind::IdentifierReference(ident)
                    if ident.name.as_str() == "console" && is_global(semantic.scoping(), ident) =>
                {
                    findings.push(Finding::new(
                        "no-console",
                        ident.span.start as usize,
                        "Unexpected console statement",
                    ))
                }
                AstKind::CallExpression(call) => {
                    let Expression::Identifier(callee) = call.callee.without_parentheses() else {
                        continue;
                    };
                    if !is_global(semantic.scoping(), callee) {
                        continue;
                    }
                    let name = callee.name.as_str();
                    let offset = callee.span.start as usize;
                    match name {
                        "alert" | "confirm" | "prompt" => findings.push(Finding::new(
                            "no-alert",
                            offset,
                            format!("Unexpected {}", name),
                        )),
                        "eval" => {
                            findings.push(Finding::new("no-eval", offset, "eval can be harmful"))
                        }
                        _ => {}
                    }
                }
                AstKind::BinaryExpression(expr) => {
                    let expected = match expr.operator {
                        BinaryOperator::Equality => Some(("==", "===")),
                        BinaryOperator::Inequality => Some(("!=", "!==")),
                        _ => None,
                    };
                    if let Some((found, wanted)) = expected {
                        findings.push(Finding::new(
                            "eqeqeq",
                            expr.span.start as usize,
                            format!("Expected '{}' and instead saw '{}'", wanted, found),
                        ));
                    }
                }
                AstKind::VariableDeclaration(decl) if decl.kind == VariableDeclarationKind::Var => {
                    findings.push(Finding::new(
                        "no-var",
                        decl.span.start as usize,
                        "Unexpected var, use let or const instead",
                    ))
                }
                _ => {}
            }
        }

        findings
    }
}

/// Whether a reference resolves to no declaration in the file.
fn is_global(scoping: &Scoping, ident: &IdentifierReference) -> bool {
    scoping.get_reference(ident.reference_id()).symbol_id().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::lint_source;

    fn rules_hit(linter: &ScriptLinter, source: &str) -> Vec<String> {
        lint_source(linter, Path::new("app.js"), source).into_iter().map(|v| v.rule).collect()
    }

    #[test]
    fn test_clean_script() {
        let src = "(function (Drupal) {\n  Drupal.behaviors.menu = {\n    attach(context) {\n      const items = context.querySelectorAll('.menu');\n      return items.length === 0;\n    },\n  };\n})(Drupal);\n";
        assert!(rules_hit(&ScriptLinter::default(), src).is_empty());
    }

    #[test]
    fn test_default_rules() {
        let src = "debugger;\nconsole.log('x');\nif (a == b) { alert('hi'); }\n";
        let hits = rules_hit(&ScriptLinter::default(), src);
        assert_eq!(hits, vec!["no-debugger", "no-console", "eqeqeq", "no-alert"]);
    }

    #[test]
    fn test_parse_error_is_reported() {
        let violations =
            lint_source(&ScriptLinter::default(), Path::new("app.js"), "const x = ;\n");
        assert!(!violations.is_empty());
        assert!(violations.iter().all(|v| v.rule == PARSE_ERROR_RULE));
        assert_eq!(violations[0].severity, Severity::Error);
        assert_eq!(violations[0].line, 1);
        assert!(violations[0].message.starts_with("Parsing error"));
    }

    #[test]
    fn test_parse_error_cannot_be_disabled() {
        let mut rules = RuleSet::new(DEFAULT_RULES);
        rules.set(PARSE_ERROR_RULE, Severity::Off);
        let linter = ScriptLinter::new(rules);
        let hits = rules_hit(&linter, "function (\n");
        assert!(!hits.is_empty());
        assert!(hits.iter().all(|r| r == PARSE_ERROR_RULE));
    }

    #[test]
    fn test_no_var_when_enabled() {
        let mut rules = RuleSet::new(DEFAULT_RULES);
        rules.set("no-var", Severity::Error);
        let linter = ScriptLinter::new(rules);
        assert_eq!(rules_hit(&linter, "var x = 1;\nlet y = 2;\n"), vec!["no-var"]);
    }

    #[test]
    fn test_local_bindings_are_not_globals() {
        let src = "function ask(prompt, console) {\n  console.log(prompt);\n  return prompt('x');\n}\nfunction alert() {}\nalert();\n";
        assert!(rules_hit(&ScriptLinter::default(), src).is_empty());
    }

    #[test]
    fn test_alert_and_eval_only_when_called() {
        let src = "const fn1 = alert;\nwindow.handler = eval;\n(eval)('1');\nconfirm('sure?');\n";
        assert_eq!(rules_hit(&ScriptLinter::default(), src), vec!["no-eval", "no-alert"]);
    }

    #[test]
    fn test_strings_do_not_trigger_rules() {
        let src = "const s = 'debugger console eval';\n";
        assert!(rules_hit(&ScriptLinter::default(), src).is_empty());
    }
}
