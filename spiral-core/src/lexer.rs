//! Lexer for callable declarations using logos

use logos::Logos;
use std::ops::Range;

use crate::parser::SignatureError;

#[derive(Logos, Debug, PartialEq, Clone)]
pub enum Token<'a> {
    // Punctuation
    #[token("?")]
    Question,

    #[token("|")]
    Pipe,

    #[token("&")]
    Amp,

    #[token("...")]
    Ellipsis,

    #[token(",")]
    Comma,

    #[token("=")]
    Assign,

    #[token("=>")]
    Arrow,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    // Literals
    #[regex(r"-?[0-9]+", priority = 2, callback = |lex| lex.slice().parse::<i64>().ok())]
    Integer(i64),

    #[regex(r"-?[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", priority = 2, callback = |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    #[regex(r"'([^'\\]|\\.)*'", |lex| {
        let s = lex.slice();
        unescape(&s[1..s.len() - 1], '\'')
    })]
    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        unescape(&s[1..s.len() - 1], '"')
    })]
    String(String),

    #[regex(r"\$[a-zA-Z_][a-zA-Z0-9_]*", |lex| &lex.slice()[1..])]
    Variable(&'a str),

    // Type names; namespaces separated by backslashes, leading one dropped
    #[regex(r"\\?[a-zA-Z_][a-zA-Z0-9_]*(\\[a-zA-Z_][a-zA-Z0-9_]*)*", |lex| lex.slice().trim_start_matches('\\'))]
    Name(&'a str),

    #[regex(r"[ \t\n\r]+", logos::skip)]
    Error,
}

impl Token<'_> {
    /// Human readable form for error messages
    pub fn describe(&self) -> String {
        match self {
            Token::Question => "`?`".to_string(),
            Token::Pipe => "`|`".to_string(),
            Token::Amp => "`&`".to_string(),
            Token::Ellipsis => "`...`".to_string(),
            Token::Comma => "`,`".to_string(),
            Token::Assign => "`=`".to_string(),
            Token::Arrow => "`=>`".to_string(),
            Token::LParen => "`(`".to_string(),
            Token::RParen => "`)`".to_string(),
            Token::LBracket => "`[`".to_string(),
            Token::RBracket => "`]`".to_string(),
            Token::Integer(i) => format!("integer {}", i),
            Token::Float(f) => format!("float {}", f),
            Token::String(s) => format!("string {:?}", s),
            Token::Variable(name) => format!("`${}`", name),
            Token::Name(name) => format!("`{}`", name),
            Token::Error => "invalid token".to_string(),
        }
    }
}

fn unescape(s: &str, quote: char) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some(c) if c == quote || c == '\\' => result.push(c),
            Some('n') if quote == '"' => result.push('\n'),
            Some('t') if quote == '"' => result.push('\t'),
            Some('r') if quote == '"' => result.push('\r'),
            Some(c) => {
                result.push('\\');
                result.push(c);
            }
            None => result.push('\\'),
        }
    }

    result
}

pub type Spanned<'a> = (Token<'a>, Range<usize>);

/// Split a declaration into tokens with their byte spans
pub fn tokenize(source: &str) -> Result<Vec<Spanned<'_>>, SignatureError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(token) = lexer.next() {
        match token {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => {
                return Err(SignatureError::InvalidToken {
                    position: lexer.span().start,
                    found: lexer.slice().to_string(),
                })
            }
        }
    }

    Ok(tokens)
}
