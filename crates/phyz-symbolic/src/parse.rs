//! Infix expression parser.
//!
//! Grammar (lowest to highest precedence):
//!
//! ```text
//! expr  := term (('+' | '-') term)*
//! term  := unary (('*' | '/') unary)*
//! unary := ('-' | '+') unary | power
//! power := atom (('**' | '^') unary)?
//! atom  := number | name | name '(' expr ')' | '(' expr ')'
//! ```
//!
//! Powers are right-associative and bind tighter than unary minus, so
//! `-x**2` reads as `-(x**2)`.

use crate::error::{Result, SymbolicError};
use crate::expr::{Expr, Func, parse_decimal};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(String),
    Name(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

fn error(position: usize, message: impl Into<String>) -> SymbolicError {
    SymbolicError::Parse {
        position,
        message: message.into(),
    }
}

fn tokenize(text: &str) -> Result<Vec<(usize, Token)>> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        if c.is_ascii_digit() || (c == '.' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit)) {
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                i += 1;
            }
            if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
                let mut j = i + 1;
                if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                    j += 1;
                }
                if j < bytes.len() && bytes[j].is_ascii_digit() {
                    i = j;
                    while i < bytes.len() && bytes[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            tokens.push((start, Token::Number(text[start..i].to_string())));
            continue;
        }
        if c.is_ascii_alphabetic() || c == '_' {
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            tokens.push((start, Token::Name(text[start..i].to_string())));
            continue;
        }
        let token = match c {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' if bytes.get(i + 1) == Some(&b'*') => {
                i += 1;
                Token::Caret
            }
            '*' => Token::Star,
            '/' => Token::Slash,
            '^' => Token::Caret,
            '(' => Token::LParen,
            ')' => Token::RParen,
            other => return Err(error(start, format!("unexpected character '{other}'"))),
        };
        i += 1;
        tokens.push((start, token));
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |(o, _)| *o)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(error(self.offset(), format!("expected {what}")))
        }
    }

    fn expr(&mut self) -> Result<Expr> {
        let mut acc = self.term()?;
        loop {
            if self.eat(&Token::Plus) {
                acc = acc + self.term()?;
            } else if self.eat(&Token::Minus) {
                acc = acc - self.term()?;
            } else {
                return Ok(acc);
            }
        }
    }

    fn term(&mut self) -> Result<Expr> {
        let mut acc = self.unary()?;
        loop {
            if self.eat(&Token::Star) {
                acc = acc * self.unary()?;
            } else if self.eat(&Token::Slash) {
                acc = acc / self.unary()?;
            } else {
                return Ok(acc);
            }
        }
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.eat(&Token::Minus) {
            return Ok(-self.unary()?);
        }
        if self.eat(&Token::Plus) {
            return self.unary();
        }
        self.power()
    }

    fn power(&mut self) -> Result<Expr> {
        let base = self.atom()?;
        if self.eat(&Token::Caret) {
            let exponent = self.unary()?;
            return Ok(Expr::pow(base, exponent));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Expr> {
        let offset = self.offset();
        let Some((_, token)) = self.tokens.get(self.pos).cloned() else {
            return Err(error(offset, "unexpected end of input"));
        };
        self.pos += 1;
        match token {
            Token::Number(text) => parse_decimal(&text)
                .map(Expr::Num)
                .ok_or_else(|| error(offset, format!("malformed number '{text}'"))),
            Token::Name(name) => {
                if self.eat(&Token::LParen) {
                    let arg = self.expr()?;
                    self.expect(&Token::RParen, "')' after function argument")?;
                    call(&name, arg).ok_or_else(|| error(offset, format!("unknown function '{name}'")))
                } else {
                    Ok(Expr::Sym(name))
                }
            }
            Token::LParen => {
                let inner = self.expr()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            other => Err(error(offset, format!("unexpected token {other:?}"))),
        }
    }
}

fn call(name: &str, arg: Expr) -> Option<Expr> {
    let expr = match name {
        "sqrt" => Expr::sqrt(arg),
        "ln" => Expr::ln(arg),
        "arcsin" => Expr::apply(Func::Asin, arg),
        "arccos" => Expr::apply(Func::Acos, arg),
        "arctan" => Expr::apply(Func::Atan, arg),
        "cot" => Expr::recip(Expr::apply(Func::Tan, arg)),
        "sec" => Expr::recip(Expr::cos(arg)),
        "csc" => Expr::recip(Expr::sin(arg)),
        other => Expr::apply(Func::from_name(other)?, arg),
    };
    Some(expr)
}

/// Parse an infix expression.
///
/// Decimal literals are read exactly, so `0.1` is the rational `1/10`.
/// Identifiers that are not followed by `(` are free symbols.
pub fn parse(text: &str) -> Result<Expr> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(error(0, "empty expression"));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: text.len(),
    };
    let expr = parser.expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(error(parser.offset(), "unexpected trailing input"));
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_precedence() {
        let e = parse("1 + 2*3**2").unwrap();
        assert_eq!(e, Expr::int(19));
        let e = parse("-2**2").unwrap();
        assert_eq!(e, Expr::int(-4));
        let e = parse("2^3^2").unwrap();
        assert_eq!(e, Expr::int(512));
    }

    #[test]
    fn test_parse_symbols_and_functions() {
        let e = parse("r**2*sin(theta)**2").unwrap();
        assert!(e.depends_on("r"));
        assert!(e.depends_on("theta"));
        assert_eq!(
            e,
            Expr::product([
                Expr::powi(Expr::symbol("r"), 2),
                Expr::powi(Expr::sin(Expr::symbol("theta")), 2),
            ])
        );
    }

    #[test]
    fn test_parse_schwarzschild_component() {
        let e = parse("-(1 - 2*M/r)").unwrap();
        let names: Vec<_> = e.free_symbols().into_iter().collect();
        assert_eq!(names, vec!["M".to_string(), "r".to_string()]);
    }

    #[test]
    fn test_parse_decimal_is_exact() {
        assert_eq!(parse("0.25").unwrap(), Expr::rational(1, 4));
        assert_eq!(parse("1.5e1").unwrap(), Expr::int(15));
    }

    #[test]
    fn test_parse_errors_report_position() {
        match parse("1 + * x") {
            Err(SymbolicError::Parse { position, .. }) => assert_eq!(position, 4),
            other => panic!("expected parse error, got {other:?}"),
        }
        assert!(parse("").is_err());
        assert!(parse("(x + 1").is_err());
        assert!(parse("foo(x)").is_err());
        assert!(parse("x $ y").is_err());
        assert!(parse("x y").is_err());
    }
}
