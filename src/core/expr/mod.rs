//! Expression evaluation for SOI calculations.
//!
//! A calculation string is either a direct variable reference (no arithmetic
//! operator present) or an arithmetic expression over variable names and
//! numeric literals. Direct references return the resolved value unchanged,
//! so categorical text values pass through. Arithmetic expressions are parsed
//! by the restricted tokenizer/parser in this module and evaluated against
//! values bound by name; resolved values are never substituted back into the
//! expression text.
//!
//! Two domain rules shape the arithmetic:
//! - any operand resolving to "no value" makes the whole result "no value"
//! - division by zero yields 0 (ratios of two zero quantities are defined
//!   as zero)

pub mod parser;
pub mod tokenizer;

use crate::error::{SoiError, SoiResult};
use crate::types::DspValue;
use parser::{BinOp, Expr, Parser};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // The word boundary matters: without it the exponent suffix of a
    // scientific-notation literal ("1e3") would match as an identifier.
    RE.get_or_init(|| Regex::new(r"\b[a-zA-Z_][a-zA-Z0-9_]*\b").expect("valid identifier pattern"))
}

/// Extract distinct variable identifiers from an expression, in order of
/// first appearance.
pub fn extract_identifiers(expression: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for m in identifier_regex().find_iter(expression) {
        let ident = m.as_str();
        if !seen.iter().any(|s| s == ident) {
            seen.push(ident.to_string());
        }
    }
    seen
}

/// Whether the string is an arithmetic expression rather than a direct
/// variable reference. Identifiers never contain operator characters, so the
/// presence of any of the four operators means arithmetic. `-` is included:
/// treating subtraction-only formulas as direct lookups was a bug in earlier
/// variants of the pipeline.
fn needs_evaluation(expression: &str) -> bool {
    expression
        .chars()
        .any(|c| matches!(c, '+' | '-' | '*' | '/'))
}

fn malformed(expression: &str, message: impl Into<String>) -> SoiError {
    SoiError::MalformedExpression {
        expression: expression.to_string(),
        message: message.into(),
    }
}

/// Evaluate a calculation string, resolving variable references through
/// `resolve`.
///
/// Returns `Ok(None)` when any referenced variable has no value. Resolver
/// errors propagate unchanged.
pub fn evaluate<F>(expression: &str, mut resolve: F) -> SoiResult<Option<DspValue>>
where
    F: FnMut(&str) -> SoiResult<Option<DspValue>>,
{
    // Metadata cells occasionally wrap long formulas across lines.
    let expression = expression.replace('\n', " ");
    let expression = expression.trim();

    if !needs_evaluation(expression) {
        return resolve(expression);
    }

    let mut bindings: HashMap<String, f64> = HashMap::new();
    for ident in extract_identifiers(expression) {
        match resolve(&ident)? {
            None => return Ok(None),
            Some(value) => {
                let Some(number) = value.as_number() else {
                    return Err(malformed(
                        expression,
                        format!("variable '{ident}' resolved to non-numeric value '{value}'"),
                    ));
                };
                bindings.insert(ident, number);
            }
        }
    }

    let tokens = tokenizer::tokenize(expression).map_err(|e| malformed(expression, e.to_string()))?;
    let ast = Parser::new(tokens)
        .parse()
        .map_err(|e| malformed(expression, e.to_string()))?;

    match eval_ast(&ast, &bindings) {
        Ok(result) => Ok(Some(DspValue::Number(result))),
        Err(EvalError::DivisionByZero) => Ok(Some(DspValue::Number(0.0))),
        Err(EvalError::Unbound(name)) => Err(malformed(
            expression,
            format!("unbound variable '{name}'"),
        )),
    }
}

enum EvalError {
    DivisionByZero,
    Unbound(String),
}

fn eval_ast(expr: &Expr, bindings: &HashMap<String, f64>) -> Result<f64, EvalError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Variable(name) => bindings
            .get(name)
            .copied()
            .ok_or_else(|| EvalError::Unbound(name.clone())),
        Expr::Negate(operand) => Ok(-eval_ast(operand, bindings)?),
        Expr::Binary { op, left, right } => {
            let lhs = eval_ast(left, bindings)?;
            let rhs = eval_ast(right, bindings)?;
            match op {
                BinOp::Add => Ok(lhs + rhs),
                BinOp::Sub => Ok(lhs - rhs),
                BinOp::Mul => Ok(lhs * rhs),
                BinOp::Div => {
                    if rhs == 0.0 {
                        Err(EvalError::DivisionByZero)
                    } else {
                        Ok(lhs / rhs)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resolver<'a>(
        values: &'a [(&'a str, DspValue)],
    ) -> impl FnMut(&str) -> SoiResult<Option<DspValue>> + 'a {
        move |name: &str| {
            Ok(values
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| v.clone()))
        }
    }

    #[test]
    fn test_extract_identifiers() {
        assert_eq!(
            extract_identifiers("eucalc_a / (eucalc_b + 100)"),
            vec!["eucalc_a".to_string(), "eucalc_b".to_string()]
        );
        // duplicates collapse, digits are not identifiers
        assert_eq!(extract_identifiers("a + a + 42"), vec!["a".to_string()]);
        assert_eq!(extract_identifiers("1 + 2"), Vec::<String>::new());
    }

    #[test]
    fn test_extract_identifiers_skips_scientific_notation() {
        assert_eq!(extract_identifiers("a * 1e3"), vec!["a".to_string()]);
        assert_eq!(extract_identifiers("b / 2.5E-2"), vec!["b".to_string()]);
        // a bare identifier that merely looks like an exponent still counts
        assert_eq!(extract_identifiers("e3 + 1"), vec!["e3".to_string()]);
    }

    #[test]
    fn test_direct_reference_passes_value_through() {
        let values = [("cimp_time_frame_of_floods", DspValue::Text("Mid-term".to_string()))];
        let result = evaluate("cimp_time_frame_of_floods", resolver(&values)).unwrap();
        assert_eq!(result, Some(DspValue::Text("Mid-term".to_string())));
    }

    #[test]
    fn test_arithmetic_expression() {
        let values = [
            ("a", DspValue::Number(3.0)),
            ("b", DspValue::Number(4.0)),
        ];
        let result = evaluate("a + b * 2", resolver(&values)).unwrap();
        assert_eq!(result, Some(DspValue::Number(11.0)));
    }

    #[test]
    fn test_subtraction_only_is_evaluated() {
        let values = [
            ("a", DspValue::Number(10.0)),
            ("b", DspValue::Number(4.0)),
        ];
        let result = evaluate("a - b", resolver(&values)).unwrap();
        assert_eq!(result, Some(DspValue::Number(6.0)));
    }

    #[test]
    fn test_zero_divided_by_zero_is_zero() {
        let values = [
            ("a", DspValue::Number(0.0)),
            ("b", DspValue::Number(0.0)),
        ];
        let result = evaluate("a / b", resolver(&values)).unwrap();
        assert_eq!(result, Some(DspValue::Number(0.0)));

        // the Python pipeline's canonical shape: 0 / (0 + 0)
        let result = evaluate("a / (a + b)", resolver(&values)).unwrap();
        assert_eq!(result, Some(DspValue::Number(0.0)));
    }

    #[test]
    fn test_division_by_zero_normalizes_whole_expression() {
        let values = [
            ("a", DspValue::Number(5.0)),
            ("b", DspValue::Number(0.0)),
        ];
        let result = evaluate("1 + a / b", resolver(&values)).unwrap();
        assert_eq!(result, Some(DspValue::Number(0.0)));
    }

    #[test]
    fn test_null_propagation() {
        let values = [("a", DspValue::Number(1.0))];
        let result = evaluate("a + missing", resolver(&values)).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_missing_direct_reference_is_null() {
        let values: [(&str, DspValue); 0] = [];
        let result = evaluate("absent_variable", resolver(&values)).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_non_numeric_operand_is_malformed() {
        let values = [
            ("a", DspValue::Number(1.0)),
            ("b", DspValue::Text("High".to_string())),
        ];
        let err = evaluate("a + b", resolver(&values)).unwrap_err();
        assert!(matches!(err, SoiError::MalformedExpression { .. }));
    }

    #[test]
    fn test_malformed_expression_rejected() {
        let values = [("a", DspValue::Number(1.0))];
        let err = evaluate("a + ", resolver(&values)).unwrap_err();
        assert!(matches!(err, SoiError::MalformedExpression { .. }));
    }

    #[test]
    fn test_newlines_are_normalized() {
        let values = [
            ("a", DspValue::Number(2.0)),
            ("b", DspValue::Number(3.0)),
        ];
        let result = evaluate("a +\nb", resolver(&values)).unwrap();
        assert_eq!(result, Some(DspValue::Number(5.0)));
    }

    #[test]
    fn test_scientific_notation_literal_is_not_resolved() {
        // only "a" must be resolved; "e3" is part of the literal
        let values = [("a", DspValue::Number(2.0))];
        let result = evaluate("a * 1e3", resolver(&values)).unwrap();
        assert_eq!(result, Some(DspValue::Number(2000.0)));
    }

    #[test]
    fn test_numeric_literals_only() {
        let values: [(&str, DspValue); 0] = [];
        let result = evaluate("100 * 2 / 4", resolver(&values)).unwrap();
        assert_eq!(result, Some(DspValue::Number(50.0)));
    }
}
