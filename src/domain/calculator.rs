//! Arithmetic evaluator for the `calculate` tool
//!
//! Input is first checked against a character allow-list, then evaluated by a
//! recursive-descent parser that only knows numbers, `+ - * /`, unary signs and
//! parentheses.
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor (('*' | '/') factor)*
//! factor := ('+' | '-') factor | number | '(' expr ')'
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::ToolError;

const MAX_EXPRESSION_LEN: usize = 1_000;
const MAX_NESTING: usize = 64;

static ALLOWED_EXPRESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9+\-*/().\s]+$").expect("static pattern"));

pub fn evaluate(expression: &str) -> Result<f64, ToolError> {
    if expression.trim().is_empty() {
        return Err(ToolError::invalid_input("expression is empty"));
    }
    if expression.len() > MAX_EXPRESSION_LEN {
        return Err(ToolError::invalid_input(format!(
            "expression exceeds {MAX_EXPRESSION_LEN} characters"
        )));
    }
    if !ALLOWED_EXPRESSION.is_match(expression) {
        return Err(ToolError::invalid_input(
            "expression may only contain digits, + - * / ( ) . and whitespace",
        ));
    }

    let mut parser = Parser {
        chars: expression.as_bytes(),
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    parser.skip_whitespace();
    if parser.pos < parser.chars.len() {
        return Err(parser.unexpected());
    }

    Ok(value)
}

/// Every intermediate value must stay finite, not just the final result.
fn finite(value: f64) -> Result<f64, ToolError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ToolError::invalid_input("result is not a finite number"))
    }
}

/// Renders a result without a trailing `.0` for integral values.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{value}")
}

struct Parser<'a> {
    chars: &'a [u8],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn expr(&mut self) -> Result<f64, ToolError> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(b'+') => {
                    self.pos += 1;
                    value = finite(value + self.term()?)?;
                }
                Some(b'-') => {
                    self.pos += 1;
                    value = finite(value - self.term()?)?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<f64, ToolError> {
        let mut value = self.factor()?;
        loop {
            match self.peek() {
                Some(b'*') => {
                    self.pos += 1;
                    value = finite(value * self.factor()?)?;
                }
                Some(b'/') => {
                    self.pos += 1;
                    let divisor = self.factor()?;
                    if divisor == 0.0 {
                        return Err(ToolError::invalid_input("division by zero"));
                    }
                    value = finite(value / divisor)?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn factor(&mut self) -> Result<f64, ToolError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(ToolError::invalid_input("expression is nested too deeply"));
        }

        let value = match self.peek() {
            Some(b'+') => {
                self.pos += 1;
                self.factor()
            }
            Some(b'-') => {
                self.pos += 1;
                self.factor().map(|value| -value)
            }
            Some(b'(') => {
                self.pos += 1;
                let value = self.expr()?;
                if self.peek() != Some(b')') {
                    return Err(ToolError::invalid_input("unbalanced parentheses"));
                }
                self.pos += 1;
                Ok(value)
            }
            Some(c) if c.is_ascii_digit() || c == b'.' => self.number(),
            _ => Err(self.unexpected()),
        };

        self.depth -= 1;
        value
    }

    fn number(&mut self) -> Result<f64, ToolError> {
        let start = self.pos;
        while self
            .chars
            .get(self.pos)
            .is_some_and(|c| c.is_ascii_digit() || *c == b'.')
        {
            self.pos += 1;
        }

        let literal = std::str::from_utf8(&self.chars[start..self.pos])
            .map_err(|_| ToolError::invalid_input("invalid number"))?;
        let value = literal
            .parse::<f64>()
            .map_err(|_| ToolError::invalid_input(format!("invalid number {literal:?}")))?;
        finite(value)
    }

    /// Next non-whitespace byte, leaving the cursor on it.
    fn peek(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.chars.get(self.pos).is_some_and(u8::is_ascii_whitespace) {
            self.pos += 1;
        }
    }

    fn unexpected(&self) -> ToolError {
        match self.chars.get(self.pos) {
            Some(c) => ToolError::invalid_input(format!(
                "unexpected {:?} at position {}",
                char::from(*c),
                self.pos
            )),
            None => ToolError::invalid_input("unexpected end of expression"),
        }
    }
}
