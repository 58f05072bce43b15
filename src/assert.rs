//! Assertion engine: the minimal line DSL (`exists`, `duration <op> Nms`,
//! `<lvalue> == <rvalue>`). A match-on-kind-then-compare shape, narrowed
//! to three forms and made strict: an unrecognized line fails the
//! assertion instead of being warned about and skipped.

use serde::Serialize;
use serde_json::Value;

use crate::errors::ErrorCode;
use crate::interpolate::stringify;
use crate::jsonpath;

pub struct AssertContext<'a> {
    pub status: u16,
    pub body: Option<&'a Value>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssertOutcome {
    pub line: String,
    pub passed: bool,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

fn outcome(line: &str, passed: bool, expected: Option<String>, actual: Option<String>) -> AssertOutcome {
    AssertOutcome {
        line: line.to_string(),
        passed,
        expected,
        actual,
    }
}

/// Resolves `status` or `body.<path>`. Any other lvalue form is invalid.
fn resolve_lvalue(lvalue: &str, ctx: &AssertContext) -> Result<Option<Value>, ()> {
    if lvalue == "status" {
        return Ok(Some(Value::from(ctx.status)));
    }
    if let Some(path) = lvalue.strip_prefix("body.") {
        return Ok(ctx.body.and_then(|b| jsonpath::extract(b, path)));
    }
    if lvalue == "body" {
        return Ok(ctx.body.cloned());
    }
    Err(())
}

/// Strips one optional pair of surrounding double quotes from an rvalue,
/// e.g. `"ok"` → `ok`, but `ok` and `"ok` pass through unchanged.
fn strip_one_quote_pair(s: &str) -> &str {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn evaluate_line(line: &str, ctx: &AssertContext) -> AssertOutcome {
    if line == "exists" {
        return outcome(line, ctx.body.is_some(), Some("present".into()), None);
    }

    if let Some(lvalue) = line.strip_suffix("exists").map(str::trim) {
        if !lvalue.is_empty() {
            return match resolve_lvalue(lvalue, ctx) {
                Ok(Some(_)) => outcome(line, true, Some("present".into()), None),
                Ok(None) => outcome(line, false, Some("present".into()), Some("missing".into())),
                Err(()) => outcome(line, false, Some("valid lvalue".into()), Some(lvalue.to_string())),
            };
        }
    }

    if let Some(rest) = line.strip_prefix("duration ") {
        let parts: Vec<&str> = rest.split_whitespace().collect();
        if parts.len() == 2 && parts[1].ends_with("ms") {
            let op = parts[0];
            let threshold = parts[1].trim_end_matches("ms").parse::<u64>();
            if let Ok(threshold) = threshold {
                let passed = match op {
                    "<" => ctx.duration_ms < threshold,
                    "<=" => ctx.duration_ms <= threshold,
                    ">" => ctx.duration_ms > threshold,
                    ">=" => ctx.duration_ms >= threshold,
                    "==" => ctx.duration_ms == threshold,
                    _ => {
                        return outcome(
                            line,
                            false,
                            Some("valid comparison operator".into()),
                            Some(op.to_string()),
                        )
                    }
                };
                return outcome(
                    line,
                    passed,
                    Some(format!("{} {}ms", op, threshold)),
                    Some(format!("{}ms", ctx.duration_ms)),
                );
            }
        }
        return outcome(line, false, Some("duration <op> Nms".into()), Some(line.to_string()));
    }

    if let Some((lvalue, rvalue)) = line.split_once("==") {
        let lvalue = lvalue.trim();
        let rvalue = strip_one_quote_pair(rvalue.trim());
        return match resolve_lvalue(lvalue, ctx) {
            Ok(actual) => {
                let passed = match &actual {
                    Some(value) if value.is_number() => match rvalue.parse::<f64>() {
                        Ok(parsed) if parsed.is_finite() => value.as_f64() == Some(parsed),
                        _ => stringify(value) == rvalue,
                    },
                    Some(value) => stringify(value) == rvalue,
                    None => false,
                };
                outcome(
                    line,
                    passed,
                    Some(rvalue.to_string()),
                    actual.as_ref().map(stringify),
                )
            }
            Err(()) => outcome(line, false, Some("valid lvalue".into()), Some(lvalue.to_string())),
        };
    }

    outcome(
        line,
        false,
        Some("valid assertion".into()),
        Some(format!("{line} ({})", ErrorCode::INVALID_ASSERTION_LINE.formatted())),
    )
}

/// Evaluates every non-blank, non-comment line of `spec` against `ctx`.
pub fn evaluate(spec: &str, ctx: &AssertContext) -> Vec<AssertOutcome> {
    spec.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| evaluate_line(line, ctx))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(status: u16, body: Option<&Value>, duration_ms: u64) -> AssertContext<'_> {
        AssertContext {
            status,
            body,
            duration_ms,
        }
    }

    #[test]
    fn bare_exists_checks_body_presence() {
        let body = json!({"a": 1});
        let result = evaluate("exists", &ctx(200, Some(&body), 10));
        assert!(result[0].passed);
    }

    #[test]
    fn lvalue_exists_checks_path_presence() {
        let body = json!({"user": {"id": 1}});
        let result = evaluate("body.user.id exists", &ctx(200, Some(&body), 10));
        assert!(result[0].passed);

        let result = evaluate("body.user.missing exists", &ctx(200, Some(&body), 10));
        assert!(!result[0].passed);
    }

    #[test]
    fn status_equality() {
        let result = evaluate("status == 200", &ctx(200, None, 5));
        assert!(result[0].passed);

        let result = evaluate("status == 404", &ctx(200, None, 5));
        assert!(!result[0].passed);
    }

    #[test]
    fn body_path_equality() {
        let body = json!({"status": "ok"});
        let result = evaluate("body.status == \"ok\"", &ctx(200, Some(&body), 5));
        assert!(result[0].passed);
    }

    #[test]
    fn numeric_equality_ignores_int_vs_float_representation() {
        let body = json!({"score": 1.0});
        let result = evaluate("body.score == 1", &ctx(200, Some(&body), 5));
        assert!(result[0].passed);
    }

    #[test]
    fn quoted_numeric_rvalue_still_compares_numerically() {
        let result = evaluate("status == \"200\"", &ctx(200, None, 5));
        assert!(result[0].passed);
    }

    #[test]
    fn duration_comparison() {
        let result = evaluate("duration < 500ms", &ctx(200, None, 120));
        assert!(result[0].passed);

        let result = evaluate("duration < 100ms", &ctx(200, None, 120));
        assert!(!result[0].passed);
    }

    #[test]
    fn unrecognized_line_fails() {
        let result = evaluate("this is not an assertion", &ctx(200, None, 5));
        assert!(!result[0].passed);
        assert_eq!(result[0].expected.as_deref(), Some("valid assertion"));
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let result = evaluate("# comment\n\nstatus == 200", &ctx(200, None, 5));
        assert_eq!(result.len(), 1);
    }
}
