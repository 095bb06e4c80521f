//! Recursive descent parser for callable declarations
//!
//! A declaration is a comma separated parameter list written the way a PHP
//! function signature is, for example `?string $p = 'scalar', object ...$e`.

use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::lexer::{tokenize, Spanned, Token};
use crate::types::{Parameter, ScalarKind, Signature, Type};
use crate::value::{Arguments, Key, Value};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignatureError {
    #[error("Unexpected token at position {position}: expected {expected}, found {found}")]
    UnexpectedToken {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of declaration: expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("Invalid token at position {position}: {found}")]
    InvalidToken { position: usize, found: String },

    #[error("Duplicate parameter `${0}`")]
    DuplicateParameter(String),

    #[error("Invalid declaration: {0}")]
    InvalidSyntax(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnexpectedToken,
    UnexpectedEof,
    InvalidToken,
    DuplicateParameter,
    InvalidSyntax,
}

impl SignatureError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SignatureError::UnexpectedToken { .. } => ErrorKind::UnexpectedToken,
            SignatureError::UnexpectedEof { .. } => ErrorKind::UnexpectedEof,
            SignatureError::InvalidToken { .. } => ErrorKind::InvalidToken,
            SignatureError::DuplicateParameter(_) => ErrorKind::DuplicateParameter,
            SignatureError::InvalidSyntax(_) => ErrorKind::InvalidSyntax,
        }
    }
}

type ParseResult<T> = Result<T, SignatureError>;

pub struct SignatureParser<'a> {
    tokens: Vec<Spanned<'a>>,
    pos: usize,
}

impl<'a> SignatureParser<'a> {
    pub fn new(source: &'a str) -> ParseResult<Self> {
        Ok(Self {
            tokens: tokenize(source)?,
            pos: 0,
        })
    }

    pub fn parse(mut self) -> ParseResult<Signature> {
        let mut parameters = Vec::new();
        let mut seen = FxHashSet::default();

        while self.peek().is_some() {
            if parameters.last().map_or(false, Parameter::is_variadic) {
                return Err(SignatureError::InvalidSyntax(
                    "variadic parameter must be the last one".to_string(),
                ));
            }

            let parameter = self.parse_parameter()?;
            if !seen.insert(parameter.name.clone()) {
                return Err(SignatureError::DuplicateParameter(parameter.name));
            }
            parameters.push(parameter);

            if self.peek().is_some() {
                self.expect(&Token::Comma, "`,`")?;
            }
        }

        Ok(Signature::new(parameters))
    }

    fn parse_parameter(&mut self) -> ParseResult<Parameter> {
        let ty = match self.peek() {
            Some(Token::Question | Token::Name(_) | Token::LParen) => self.parse_type()?,
            _ => Type::None,
        };

        let by_reference = self.eat(&Token::Amp);
        let variadic = self.eat(&Token::Ellipsis);

        let name = match self.advance() {
            Some((Token::Variable(name), _)) => name.to_string(),
            Some((token, span)) => {
                return Err(SignatureError::UnexpectedToken {
                    position: span.start,
                    expected: "parameter name".to_string(),
                    found: token.describe(),
                })
            }
            None => {
                return Err(SignatureError::UnexpectedEof {
                    expected: "parameter name".to_string(),
                })
            }
        };

        let default = if self.eat(&Token::Assign) {
            if variadic {
                return Err(SignatureError::InvalidSyntax(format!(
                    "variadic parameter `${}` cannot have a default value",
                    name
                )));
            }
            Some(self.parse_literal()?)
        } else {
            None
        };

        Ok(Parameter {
            name,
            position: 0,
            ty: if variadic { Type::variadic(ty) } else { ty },
            default,
            by_reference,
        })
    }

    fn parse_type(&mut self) -> ParseResult<Type> {
        if self.eat(&Token::Question) {
            let inner = self.parse_named()?;
            return Ok(Type::nullable(inner));
        }

        let mut members = vec![self.parse_member()?];
        while self.eat(&Token::Pipe) {
            members.push(self.parse_member()?);
        }

        Ok(if members.len() == 1 {
            members.remove(0)
        } else {
            Type::Union(members)
        })
    }

    fn parse_member(&mut self) -> ParseResult<Type> {
        if self.eat(&Token::LParen) {
            let inner = self.parse_intersection()?;
            self.expect(&Token::RParen, "`)`")?;
            return Ok(inner);
        }
        self.parse_intersection()
    }

    fn parse_intersection(&mut self) -> ParseResult<Type> {
        let mut members = vec![self.parse_named()?];
        // `A&B $x` is an intersection, `A &$x` marks a reference
        while matches!(self.peek(), Some(Token::Amp))
            && matches!(self.peek_nth(1), Some(Token::Name(_)))
        {
            self.advance();
            members.push(self.parse_named()?);
        }

        Ok(if members.len() == 1 {
            members.remove(0)
        } else {
            Type::Intersection(members)
        })
    }

    fn parse_named(&mut self) -> ParseResult<Type> {
        match self.advance() {
            Some((Token::Name(name), _)) => Ok(match ScalarKind::from_name(name) {
                Some(kind) => Type::Scalar(kind),
                None => Type::class(name),
            }),
            Some((token, span)) => Err(SignatureError::UnexpectedToken {
                position: span.start,
                expected: "type name".to_string(),
                found: token.describe(),
            }),
            None => Err(SignatureError::UnexpectedEof {
                expected: "type name".to_string(),
            }),
        }
    }

    fn parse_literal(&mut self) -> ParseResult<Value> {
        match self.advance() {
            Some((Token::Integer(i), _)) => Ok(Value::Int(i)),
            Some((Token::Float(f), _)) => Ok(Value::Float(f)),
            Some((Token::String(s), _)) => Ok(Value::String(s)),
            Some((Token::Name(name), span)) => match name.to_ascii_lowercase().as_str() {
                "null" => Ok(Value::Null),
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(SignatureError::UnexpectedToken {
                    position: span.start,
                    expected: "literal".to_string(),
                    found: format!("`{}`", name),
                }),
            },
            Some((Token::LBracket, _)) => self.parse_array(),
            Some((token, span)) => Err(SignatureError::UnexpectedToken {
                position: span.start,
                expected: "literal".to_string(),
                found: token.describe(),
            }),
            None => Err(SignatureError::UnexpectedEof {
                expected: "literal".to_string(),
            }),
        }
    }

    fn parse_array(&mut self) -> ParseResult<Value> {
        let mut array = Arguments::new();

        while !self.eat(&Token::RBracket) {
            let position = self.position();
            let first = self.parse_literal()?;
            if self.eat(&Token::Arrow) {
                let key = match first {
                    Value::Int(i) if i >= 0 => Key::Index(i as usize),
                    Value::String(s) => Key::Name(s),
                    other => {
                        return Err(SignatureError::UnexpectedToken {
                            position,
                            expected: "array key".to_string(),
                            found: other.type_name().to_string(),
                        })
                    }
                };
                array.insert(key, self.parse_literal()?);
            } else {
                array.push(first);
            }

            if !self.eat(&Token::Comma) {
                self.expect(&Token::RBracket, "`]`")?;
                break;
            }
        }

        Ok(Value::Array(array))
    }

    fn peek(&self) -> Option<&Token<'a>> {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token<'a>> {
        self.tokens.get(self.pos + n).map(|(token, _)| token)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or_else(|| self.tokens.last().map_or(0, |(_, span)| span.end), |(_, span)| span.start)
    }

    fn advance(&mut self) -> Option<Spanned<'a>> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token<'a>) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token<'a>, description: &str) -> ParseResult<()> {
        match self.advance() {
            Some((token, _)) if &token == expected => Ok(()),
            Some((token, span)) => Err(SignatureError::UnexpectedToken {
                position: span.start,
                expected: description.to_string(),
                found: token.describe(),
            }),
            None => Err(SignatureError::UnexpectedEof {
                expected: description.to_string(),
            }),
        }
    }
}

/// Parse a declaration into a signature
pub fn parse_signature(source: &str) -> ParseResult<Signature> {
    SignatureParser::new(source)?.parse()
}

impl Signature {
    /// Parse a declaration such as `EngineInterface $engine, int ...$ids`
    pub fn parse(source: &str) -> Result<Signature, SignatureError> {
        parse_signature(source)
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
