//! Built-in worker-local tools.

use crate::{DispatchSite, ToolDyn, ToolError, ToolFuture};
use serde_json::Value;

/// A restricted arithmetic evaluator.
///
/// Accepts `{"code": "return <expr>"}` where `<expr>` is made up of integer
/// literals, `+ - * /`, and parentheses — nothing else. There is no access
/// to variables, loops, or any host API; this is deliberately not a
/// JavaScript engine, just a calculator that speaks the `runjs` input shape
/// scenario 1 expects. Anything outside that grammar is an
/// [`ToolError::InvalidInput`], not a best-effort guess.
pub struct RunJs;

impl ToolDyn for RunJs {
    fn name(&self) -> &str {
        "runjs"
    }

    fn description(&self) -> &str {
        "Evaluate a restricted arithmetic expression of the form `return <expr>`."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "code": { "type": "string" }
            },
            "required": ["code"]
        })
    }

    fn dispatch_site(&self) -> DispatchSite {
        DispatchSite::WorkerLocal
    }

    fn side_effect_free(&self) -> bool {
        true
    }

    fn call(&self, input: Value) -> ToolFuture<'_> {
        Box::pin(async move {
            let code = input
                .get("code")
                .and_then(Value::as_str)
                .ok_or_else(|| ToolError::InvalidInput("expected a \"code\" string field".into()))?;
            let expr = code
                .trim()
                .strip_prefix("return")
                .ok_or_else(|| ToolError::InvalidInput("expected code of the form `return <expr>`".into()))?
                .trim();
            let value = eval_expr(expr)
                .ok_or_else(|| ToolError::InvalidInput(format!("not a valid arithmetic expression: {expr}")))?;
            Ok(serde_json::json!({ "content": format!("Result: {value}") }))
        })
    }
}

/// Evaluate a restricted arithmetic expression: integers, `+ - * /`,
/// parentheses, standard precedence. Returns `None` on any character
/// outside that grammar rather than guessing at intent.
fn eval_expr(expr: &str) -> Option<i64> {
    let tokens = tokenize(expr)?;
    let mut pos = 0;
    let value = parse_sum(&tokens, &mut pos)?;
    if pos != tokens.len() {
        return None;
    }
    Some(value)
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Num(i64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(expr: &str) -> Option<Vec<Tok>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = expr.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' => i += 1,
            '+' => {
                tokens.push(Tok::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Tok::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Tok::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Tok::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Tok::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Tok::RParen);
                i += 1;
            }
            d if d.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let digits: String = chars[start..i].iter().collect();
                tokens.push(Tok::Num(digits.parse().ok()?));
            }
            _ => return None,
        }
    }
    Some(tokens)
}

fn parse_sum(tokens: &[Tok], pos: &mut usize) -> Option<i64> {
    let mut value = parse_product(tokens, pos)?;
    loop {
        match tokens.get(*pos) {
            Some(Tok::Plus) => {
                *pos += 1;
                value += parse_product(tokens, pos)?;
            }
            Some(Tok::Minus) => {
                *pos += 1;
                value -= parse_product(tokens, pos)?;
            }
            _ => break,
        }
    }
    Some(value)
}

fn parse_product(tokens: &[Tok], pos: &mut usize) -> Option<i64> {
    let mut value = parse_atom(tokens, pos)?;
    loop {
        match tokens.get(*pos) {
            Some(Tok::Star) => {
                *pos += 1;
                value *= parse_atom(tokens, pos)?;
            }
            Some(Tok::Slash) => {
                *pos += 1;
                let divisor = parse_atom(tokens, pos)?;
                if divisor == 0 {
                    return None;
                }
                value /= divisor;
            }
            _ => break,
        }
    }
    Some(value)
}

fn parse_atom(tokens: &[Tok], pos: &mut usize) -> Option<i64> {
    match tokens.get(*pos) {
        Some(Tok::Num(n)) => {
            *pos += 1;
            Some(*n)
        }
        Some(Tok::Minus) => {
            *pos += 1;
            parse_atom(tokens, pos).map(|v| -v)
        }
        Some(Tok::LParen) => {
            *pos += 1;
            let value = parse_sum(tokens, pos)?;
            match tokens.get(*pos) {
                Some(Tok::RParen) => {
                    *pos += 1;
                    Some(value)
                }
                _ => None,
            }
        }
        _ => None,
    }
}
