//! Arithmetic evaluation and the formula entry point.
//!
//! [`evaluate`] converts a resolved token stream to postfix with the
//! shunting-yard algorithm (`*` and `/` bind tighter than `+` and `-`, all
//! left-associative) and then runs the postfix program on a value stack.
//! [`evaluate_formula`] chains tokenizer, resolver and evaluator for one
//! cell's raw text.

use super::error::{ErrorCode, EvalResult};
use super::resolve::{Resolved, resolve};
use super::tokenize::{Operator, Token, TokenizePolicy, tokenize};
use super::value::{CellValue, ValueLookup};

#[derive(Clone, Copy, Debug, PartialEq)]
enum Postfix {
    Number(f64),
    Op(Operator),
    Negate,
}

#[derive(Clone, Copy, Debug)]
enum Pending {
    Op(Operator),
    Negate,
    LParen,
}

/// Evaluate a resolved token stream to a number.
///
/// A `+` or `-` where an operand is expected is a sign and binds tighter
/// than any binary operator. Fails with `#SYNTAX!` on unbalanced
/// parentheses, missing operands, stray commas or unresolved tokens, and
/// with `#DIV/0!` when a divisor is zero.
pub fn evaluate(tokens: &[Token]) -> EvalResult<f64> {
    let program = to_postfix(tokens)?;
    run_postfix(&program)
}

fn to_postfix(tokens: &[Token]) -> EvalResult<Vec<Postfix>> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut ops: Vec<Pending> = Vec::new();
    let mut expect_operand = true;

    for token in tokens {
        match token {
            Token::Number(n) => {
                output.push(Postfix::Number(*n));
                expect_operand = false;
            }
            Token::Op(op) if expect_operand => match op {
                Operator::Add => {}
                Operator::Sub => ops.push(Pending::Negate),
                Operator::Mul | Operator::Div => return Err(ErrorCode::Syntax),
            },
            Token::Op(op) => {
                while let Some(top) = ops.last() {
                    match top {
                        Pending::Negate => output.push(Postfix::Negate),
                        Pending::Op(prev) if prev.precedence() >= op.precedence() => {
                            output.push(Postfix::Op(*prev))
                        }
                        _ => break,
                    }
                    ops.pop();
                }
                ops.push(Pending::Op(*op));
                expect_operand = true;
            }
            Token::LParen => {
                ops.push(Pending::LParen);
                expect_operand = true;
            }
            Token::RParen => {
                loop {
                    match ops.pop() {
                        Some(Pending::Op(op)) => output.push(Postfix::Op(op)),
                        Some(Pending::Negate) => output.push(Postfix::Negate),
                        Some(Pending::LParen) => break,
                        None => return Err(ErrorCode::Syntax),
                    }
                }
                expect_operand = false;
            }
            Token::Comma | Token::Ref(_) | Token::Range(..) | Token::Function(_) => {
                return Err(ErrorCode::Syntax);
            }
        }
    }

    while let Some(pending) = ops.pop() {
        match pending {
            Pending::Op(op) => output.push(Postfix::Op(op)),
            Pending::Negate => output.push(Postfix::Negate),
            Pending::LParen => return Err(ErrorCode::Syntax),
        }
    }
    Ok(output)
}

fn run_postfix(program: &[Postfix]) -> EvalResult<f64> {
    let mut stack: Vec<f64> = Vec::new();
    for item in program {
        match item {
            Postfix::Number(n) => stack.push(*n),
            Postfix::Negate => {
                let a = stack.pop().ok_or(ErrorCode::Syntax)?;
                stack.push(-a);
            }
            Postfix::Op(op) => {
                let (Some(b), Some(a)) = (stack.pop(), stack.pop()) else {
                    return Err(ErrorCode::Syntax);
                };
                stack.push(op.apply(a, b)?);
            }
        }
    }
    match stack.as_slice() {
        [n] if n.is_finite() => Ok(*n),
        [_] => Err(ErrorCode::Value),
        _ => Err(ErrorCode::Syntax),
    }
}

/// Evaluate one cell's raw text.
///
/// Text without a leading `=` is a literal and comes back unchanged as
/// [`CellValue::Text`]. Formula text is tokenized, resolved against `lookup`
/// and evaluated.
pub fn evaluate_formula(
    raw: &str,
    lookup: &dyn ValueLookup,
    policy: TokenizePolicy,
) -> EvalResult<CellValue> {
    let Some(formula) = raw.strip_prefix('=') else {
        return Ok(CellValue::Text(raw.to_string()));
    };

    let result = tokenize(formula.trim(), policy)
        .and_then(|tokens| resolve(&tokens, lookup))
        .and_then(|resolved| match resolved {
            Resolved::Scalar(value) => Ok(value),
            Resolved::Expression(tokens) => evaluate(&tokens).map(CellValue::Number),
        });
    if let Err(code) = &result {
        tracing::trace!(raw, %code, "formula evaluation failed");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_str(expr: &str) -> EvalResult<f64> {
        evaluate(&tokenize(expr, TokenizePolicy::Strict)?)
    }

    #[test]
    fn test_precedence_and_parens() {
        assert_eq!(eval_str("2+3*4"), Ok(14.0));
        assert_eq!(eval_str("(2+3)*4"), Ok(20.0));
        assert_eq!(eval_str("10-4-3"), Ok(3.0));
        assert_eq!(eval_str("64/4/2"), Ok(8.0));
        assert_eq!(eval_str("2*(3+(4-1))/3"), Ok(4.0));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval_str("10/0"), Err(ErrorCode::DivZero));
        assert_eq!(eval_str("10/(2-2)"), Err(ErrorCode::DivZero));
        assert_eq!(eval_str("0/10"), Ok(0.0));
    }

    #[test]
    fn test_malformed_expressions() {
        assert_eq!(eval_str("(1+2"), Err(ErrorCode::Syntax));
        assert_eq!(eval_str("1+2)"), Err(ErrorCode::Syntax));
        assert_eq!(eval_str("1+"), Err(ErrorCode::Syntax));
        assert_eq!(eval_str("1 2"), Err(ErrorCode::Syntax));
        assert_eq!(eval_str("1,2"), Err(ErrorCode::Syntax));
        assert_eq!(eval_str("()"), Err(ErrorCode::Syntax));
    }

    #[test]
    fn test_signs() {
        assert_eq!(eval_str("-5"), Ok(-5.0));
        assert_eq!(eval_str("+5"), Ok(5.0));
        assert_eq!(eval_str("3*-5"), Ok(-15.0));
        assert_eq!(eval_str("--5"), Ok(5.0));
        assert_eq!(eval_str("-2+3"), Ok(1.0));
        assert_eq!(eval_str("-(2+3)*2"), Ok(-10.0));
        assert_eq!(eval_str("2 -3"), Ok(-1.0));
        assert_eq!(eval_str("-"), Err(ErrorCode::Syntax));
        assert_eq!(eval_str("*5"), Err(ErrorCode::Syntax));
        assert_eq!(eval_str("2*/5"), Err(ErrorCode::Syntax));
    }

    #[test]
    fn test_literal_passes_through() {
        let lookup = |_: &crate::engine::CellId| CellValue::Empty;
        assert_eq!(
            evaluate_formula("hello", &lookup, TokenizePolicy::Strict),
            Ok(CellValue::Text("hello".into()))
        );
        assert_eq!(
            evaluate_formula("= 2 + 3 ", &lookup, TokenizePolicy::Strict),
            Ok(CellValue::Number(5.0))
        );
        assert_eq!(
            evaluate_formula("=", &lookup, TokenizePolicy::Strict),
            Err(ErrorCode::Syntax)
        );
    }
}
