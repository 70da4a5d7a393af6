//! Reference resolution.
//!
//! Walks a token sequence left to right and replaces everything that needs
//! the sheet with plain numbers, leaving a stream of numbers, operators and
//! parentheses for the arithmetic evaluator:
//!
//! - `SUM(...)` / `AVG(...)` calls are evaluated and inlined as one number.
//!   A range or single-reference argument aggregates its cells directly,
//!   also when wrapped in redundant parentheses; any other argument is a
//!   sub-expression.
//! - Cell references become the referenced cell's numeric value.
//! - Numbers, operators and parentheses pass through unchanged.
//!
//! A formula made of exactly one reference short-circuits and yields the
//! referenced value untouched, so `=A1` can echo text.

use super::cell_ref::{CellId, expand_range};
use super::error::{ErrorCode, EvalResult};
use super::eval::evaluate;
use super::tokenize::Token;
use super::value::{CellValue, ValueLookup, parse_numeric};

/// Result of resolving a formula's tokens.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolved {
    /// The formula was a single reference; this is the referenced value.
    Scalar(CellValue),
    /// Numbers, operators and punctuation ready for [`evaluate`].
    Expression(Vec<Token>),
}

/// Resolve references and function calls against `lookup`.
pub fn resolve(tokens: &[Token], lookup: &dyn ValueLookup) -> EvalResult<Resolved> {
    if let [Token::Ref(id)] = tokens {
        return match lookup.value(id) {
            CellValue::Empty => Ok(Resolved::Scalar(CellValue::Number(0.0))),
            CellValue::Error(code) => Err(code),
            value => Ok(Resolved::Scalar(value)),
        };
    }
    resolve_expression(tokens, lookup).map(Resolved::Expression)
}

fn resolve_expression(tokens: &[Token], lookup: &dyn ValueLookup) -> EvalResult<Vec<Token>> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;

    while i < tokens.len() {
        match &tokens[i] {
            Token::Function(func) => {
                if tokens.get(i + 1) != Some(&Token::LParen) {
                    return Err(ErrorCode::Syntax);
                }
                let (args, next) = split_arguments(tokens, i + 2)?;
                let values = collect_arguments(&args, lookup)?;
                out.push(Token::Number(func.apply(&values)?));
                i = next;
            }
            Token::Ref(id) => {
                out.push(Token::Number(reference_operand(id, lookup)?));
                i += 1;
            }
            // Ranges only make sense as function arguments.
            Token::Range(..) => return Err(ErrorCode::Syntax),
            token => {
                out.push(token.clone());
                i += 1;
            }
        }
    }
    Ok(out)
}

/// Numeric value of a bare reference inside arithmetic.
fn reference_operand(id: &CellId, lookup: &dyn ValueLookup) -> EvalResult<f64> {
    match lookup.value(id) {
        CellValue::Empty => Ok(0.0),
        CellValue::Number(n) => Ok(n),
        CellValue::Text(text) => parse_numeric(&text).ok_or(ErrorCode::Value),
        CellValue::Error(code) => Err(code),
    }
}

/// Split a call's arguments, starting just after its `(`.
///
/// Commas separate arguments only at nesting depth 0. Returns the argument
/// slices and the index just past the matching `)`. A call that never closes
/// is `#VALUE!`; an empty argument (`SUM(1,,2)`) is `#SYNTAX!`. `SUM()` has
/// no arguments at all.
fn split_arguments(tokens: &[Token], start: usize) -> EvalResult<(Vec<&[Token]>, usize)> {
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut arg_start = start;

    for (i, token) in tokens.iter().enumerate().skip(start) {
        match token {
            Token::LParen => depth += 1,
            Token::RParen if depth == 0 => {
                let last = &tokens[arg_start..i];
                if last.is_empty() {
                    if !args.is_empty() {
                        return Err(ErrorCode::Syntax);
                    }
                } else {
                    args.push(last);
                }
                return Ok((args, i + 1));
            }
            Token::RParen => depth -= 1,
            Token::Comma if depth == 0 => {
                let arg = &tokens[arg_start..i];
                if arg.is_empty() {
                    return Err(ErrorCode::Syntax);
                }
                args.push(arg);
                arg_start = i + 1;
            }
            _ => {}
        }
    }
    Err(ErrorCode::Value)
}

/// Flatten call arguments into the numbers an aggregate receives.
fn collect_arguments(args: &[&[Token]], lookup: &dyn ValueLookup) -> EvalResult<Vec<f64>> {
    let mut values = Vec::new();
    for arg in args {
        match strip_outer_parens(arg) {
            [Token::Range(start, end)] => {
                let cells = expand_range(*start, *end).ok_or(ErrorCode::Value)?;
                for id in cells {
                    values.push(aggregate_member(lookup.value(&id))?);
                }
            }
            [Token::Ref(id)] => values.push(aggregate_member(lookup.value(id))?),
            expr => values.push(evaluate(&resolve_expression(expr, lookup)?)?),
        }
    }
    Ok(values)
}

/// Drop parentheses wrapping a whole argument, so `SUM((A1))` aggregates
/// `A1` the same way `SUM(A1)` does.
fn strip_outer_parens(mut arg: &[Token]) -> &[Token] {
    while let [Token::LParen, inner @ .., Token::RParen] = arg
        && is_balanced(inner)
    {
        arg = inner;
    }
    arg
}

fn is_balanced(tokens: &[Token]) -> bool {
    let mut depth = 0usize;
    for token in tokens {
        match token {
            Token::LParen => depth += 1,
            Token::RParen if depth == 0 => return false,
            Token::RParen => depth -= 1,
            _ => {}
        }
    }
    depth == 0
}

/// Empty and non-numeric members count as 0; errors propagate.
fn aggregate_member(value: CellValue) -> EvalResult<f64> {
    match value {
        CellValue::Error(code) => Err(code),
        other => Ok(other.as_number().unwrap_or(0.0)),
    }
}
