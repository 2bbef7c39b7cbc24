//! Tokenizer for constant expressions

use logos::Logos;
use malachite::base::num::arithmetic::traits::Pow;
use malachite::rational::Rational;
use malachite::Natural;
use std::fmt;
use std::str::FromStr;

/// Largest decimal exponent accepted in a literal
const MAX_DECIMAL_EXPONENT: i64 = 100_000;

#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    #[regex(r"([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?", |lex| parse_number(lex.slice()))]
    Number(Rational),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_owned())]
    Identifier(String),

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("^")]
    Caret,
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,

    #[regex(r"[ \t\n\f]+", logos::skip)]
    Whitespace,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(_) => write!(f, "number"),
            Token::Identifier(name) => write!(f, "{}", name),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Caret => write!(f, "^"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::Whitespace => write!(f, "whitespace"),
        }
    }
}

/// Exact value of a decimal literal such as `1.25e-3`
pub fn parse_number(input: &str) -> Option<Rational> {
    let (mantissa, exponent) = match input.find(['e', 'E']) {
        Some(pos) => (&input[..pos], input[pos + 1..].parse::<i64>().ok()?),
        None => (input, 0),
    };
    let (int_part, frac_part) = match mantissa.find('.') {
        Some(pos) => (&mantissa[..pos], &mantissa[pos + 1..]),
        None => (mantissa, ""),
    };
    let digits = format!("{int_part}{frac_part}");
    if digits.is_empty() {
        return None;
    }
    let significand = Natural::from_str(&digits).ok()?;
    let scale = exponent.checked_sub(frac_part.len() as i64)?;
    if scale.abs() > MAX_DECIMAL_EXPONENT {
        return None;
    }
    let power = Rational::from(10u32).pow(scale.unsigned_abs());
    let value = Rational::from(significand);
    Some(if scale >= 0 { value * power } else { value / power })
}

/// Tokenize a whole expression, returning the byte offset of the first bad token
pub fn tokenize(source: &str) -> Result<Vec<Token>, usize> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next() {
        match token {
            Ok(token) => tokens.push(token),
            Err(()) => return Err(lexer.span().start),
        }
    }
    Ok(tokens)
}
