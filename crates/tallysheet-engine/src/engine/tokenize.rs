//! Formula tokenizer.
//!
//! Splits the text after a formula's leading `=` into a flat sequence of
//! typed lexemes. Lexemes are matched in this order at each position:
//!
//! - Range: `A1:B5` (tried before single references so it stays one token)
//! - Cell reference: `A1`, `AA12`
//! - Number: `12`, `3.25`
//! - Operator or punctuation: `+ - * / ( ) ,`
//! - Function name: `SUM`, `AVG`
//!
//! Whitespace between lexemes is skipped. Anything else is governed by
//! [`TokenizePolicy`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::cell_ref::CellId;
use super::error::{ErrorCode, EvalResult};
use crate::builtins::Function;

/// What to do with characters no lexeme matches.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenizePolicy {
    /// Fail with `#SYNTAX!`.
    #[default]
    Strict,
    /// Drop them and keep going.
    Lenient,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    pub fn precedence(&self) -> u8 {
        match self {
            Operator::Add | Operator::Sub => 1,
            Operator::Mul | Operator::Div => 2,
        }
    }

    pub fn apply(&self, a: f64, b: f64) -> EvalResult<f64> {
        match self {
            Operator::Add => Ok(a + b),
            Operator::Sub => Ok(a - b),
            Operator::Mul => Ok(a * b),
            Operator::Div if b == 0.0 => Err(ErrorCode::DivZero),
            Operator::Div => Ok(a / b),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Ref(CellId),
    Range(CellId, CellId),
    Number(f64),
    Op(Operator),
    LParen,
    RParen,
    Comma,
    Function(Function),
}

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?<range>[A-Z]+[0-9]+:[A-Z]+[0-9]+)",
            r"|(?<cell>[A-Z]+[0-9]+)",
            r"|(?<number>[0-9]+(?:\.[0-9]+)?)",
            r"|(?<punct>[-+*/(),])",
            r"|(?<name>[A-Z]+)",
            r"|(?<space>\s+)",
        ))
        .expect("token regex must compile")
    })
}

/// Tokenize formula text (without the leading `=`).
///
/// Fails with `#SYNTAX!` when nothing matches, when a reference-shaped lexeme
/// is not a valid identifier (e.g. `A0`), or, under
/// [`TokenizePolicy::Strict`], when any character is left unmatched.
pub fn tokenize(formula: &str, policy: TokenizePolicy) -> EvalResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut consumed = 0;

    for caps in token_re().captures_iter(formula) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > consumed {
            unmatched(policy, &formula[consumed..whole.start()])?;
        }
        consumed = whole.end();

        if let Some(m) = caps.name("range") {
            let (start, end) = m.as_str().split_once(':').ok_or(ErrorCode::Syntax)?;
            tokens.push(Token::Range(parse_ref(start)?, parse_ref(end)?));
        } else if let Some(m) = caps.name("cell") {
            tokens.push(Token::Ref(parse_ref(m.as_str())?));
        } else if let Some(m) = caps.name("number") {
            let n = m.as_str().parse::<f64>().map_err(|_| ErrorCode::Syntax)?;
            tokens.push(Token::Number(n));
        } else if let Some(m) = caps.name("punct") {
            tokens.push(match m.as_str() {
                "+" => Token::Op(Operator::Add),
                "-" => Token::Op(Operator::Sub),
                "*" => Token::Op(Operator::Mul),
                "/" => Token::Op(Operator::Div),
                "(" => Token::LParen,
                ")" => Token::RParen,
                _ => Token::Comma,
            });
        } else if let Some(m) = caps.name("name") {
            match Function::from_name(m.as_str()) {
                Some(func) => tokens.push(Token::Function(func)),
                None => unmatched(policy, m.as_str())?,
            }
        }
    }
    if consumed < formula.len() {
        unmatched(policy, &formula[consumed..])?;
    }

    if tokens.is_empty() {
        return Err(ErrorCode::Syntax);
    }
    Ok(tokens)
}

fn unmatched(policy: TokenizePolicy, text: &str) -> EvalResult<()> {
    match policy {
        TokenizePolicy::Strict => {
            tracing::trace!(text, "unrecognized formula text");
            Err(ErrorCode::Syntax)
        }
        TokenizePolicy::Lenient => Ok(()),
    }
}

fn parse_ref(text: &str) -> EvalResult<CellId> {
    CellId::parse(text).ok_or(ErrorCode::Syntax)
}
