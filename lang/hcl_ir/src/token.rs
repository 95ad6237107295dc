//! Tokens produced by the scanner, plus literal value decoding.

use std::fmt;

use crate::pos::Pos;
use crate::strconv;

/// The kind of a single lexical token.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum TokenKind {
    // Special tokens
    #[default]
    Illegal,
    Eof,
    Comment,

    // Identifiers and basic type literals
    Ident,
    Number,
    Float,
    Bool,
    String,
    Heredoc,

    // Operators and delimiters
    Lbrack,
    Lbrace,
    Comma,
    Period,
    Rbrack,
    Rbrace,
    Assign,
    Add,
    Sub,
}

impl TokenKind {
    /// True for identifiers and basic type literals.
    #[inline]
    pub fn is_identifier(self) -> bool {
        matches!(
            self,
            TokenKind::Ident
                | TokenKind::Number
                | TokenKind::Float
                | TokenKind::Bool
                | TokenKind::String
                | TokenKind::Heredoc
        )
    }

    /// True for basic type literals only.
    #[inline]
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::Number
                | TokenKind::Float
                | TokenKind::Bool
                | TokenKind::String
                | TokenKind::Heredoc
        )
    }

    /// True for operators and delimiters.
    #[inline]
    pub fn is_operator(self) -> bool {
        matches!(
            self,
            TokenKind::Lbrack
                | TokenKind::Lbrace
                | TokenKind::Comma
                | TokenKind::Period
                | TokenKind::Rbrack
                | TokenKind::Rbrace
                | TokenKind::Assign
                | TokenKind::Add
                | TokenKind::Sub
        )
    }

    /// Upper-case wire name, as used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Illegal => "ILLEGAL",
            TokenKind::Eof => "EOF",
            TokenKind::Comment => "COMMENT",
            TokenKind::Ident => "IDENT",
            TokenKind::Number => "NUMBER",
            TokenKind::Float => "FLOAT",
            TokenKind::Bool => "BOOL",
            TokenKind::String => "STRING",
            TokenKind::Heredoc => "HEREDOC",
            TokenKind::Lbrack => "LBRACK",
            TokenKind::Lbrace => "LBRACE",
            TokenKind::Comma => "COMMA",
            TokenKind::Period => "PERIOD",
            TokenKind::Rbrack => "RBRACK",
            TokenKind::Rbrace => "RBRACE",
            TokenKind::Assign => "ASSIGN",
            TokenKind::Add => "ADD",
            TokenKind::Sub => "SUB",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single token with its source position and raw text.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Pos,
    /// Raw source text, including surrounding quotes for strings and the
    /// full marker/terminator lines for heredocs.
    pub text: String,
    /// Set when the token was produced from a JSON document; string
    /// literals then use JSON escaping rather than the native grammar.
    pub from_json: bool,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.pos, self.kind, self.text)
    }
}

/// A decoded literal value.
#[derive(Clone, PartialEq, Debug)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// Failure to decode a token's literal value.
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    #[error("unknown bool value: {0}")]
    Bool(String),
    #[error("invalid number {text}: {source}")]
    Int {
        text: String,
        source: std::num::ParseIntError,
    },
    #[error("invalid float {text}: {source}")]
    Float {
        text: String,
        source: std::num::ParseFloatError,
    },
    #[error("unquote {text} err: {source}")]
    Unquote {
        text: String,
        source: strconv::SyntaxError,
    },
    #[error("unquote {text} err: {source}")]
    Json {
        text: String,
        source: serde_json::Error,
    },
    #[error("heredoc doesn't contain newline")]
    HeredocNewline,
    #[error("malformed heredoc")]
    HeredocMalformed,
    #[error("unimplemented Value for type: {0}")]
    Unsupported(TokenKind),
}

impl Token {
    /// Construct a token with no position, for tests and synthesized
    /// nodes.
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Token {
            kind,
            pos: Pos::default(),
            text: text.into(),
            from_json: false,
        }
    }

    /// Decode the properly typed value for this token.
    ///
    /// Only literal kinds (and IDENT) carry a value; any other kind is
    /// an error.
    pub fn value(&self) -> Result<Value, ValueError> {
        match self.kind {
            TokenKind::Bool => match self.text.as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                other => Err(ValueError::Bool(other.to_string())),
            },
            TokenKind::Float => self
                .text
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|source| ValueError::Float {
                    text: self.text.clone(),
                    source,
                }),
            TokenKind::Number => self
                .text
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|source| ValueError::Int {
                    text: self.text.clone(),
                    source,
                }),
            TokenKind::Ident => Ok(Value::String(self.text.clone())),
            TokenKind::Heredoc => unindent_heredoc(&self.text).map(Value::String),
            TokenKind::String => {
                // Occurs when JSON null is mapped to a string token.
                if self.text.is_empty() {
                    return Ok(Value::String(String::new()));
                }
                if self.from_json {
                    // JSON escaping, not the native grammar: the token
                    // text is itself a JSON string literal.
                    serde_json::from_str::<String>(&self.text)
                        .map(Value::String)
                        .map_err(|source| ValueError::Json {
                            text: self.text.clone(),
                            source,
                        })
                } else {
                    strconv::unquote(&self.text)
                        .map(Value::String)
                        .map_err(|source| ValueError::Unquote {
                            text: self.text.clone(),
                            source,
                        })
                }
            }
            kind => Err(ValueError::Unsupported(kind)),
        }
    }
}

/// Strip the marker and terminator lines from a heredoc's raw text.
///
/// `<<ANCHOR` heredocs return the body verbatim. `<<-ANCHOR` heredocs
/// additionally remove the hanging indent, using the terminator line's
/// leading whitespace as the prefix, provided every body line carries at
/// least that indent.
fn unindent_heredoc(heredoc: &str) -> Result<String, ValueError> {
    let idx = heredoc.find('\n').ok_or(ValueError::HeredocNewline)?;
    let len = heredoc.len();

    let unindent = heredoc.as_bytes().get(2) == Some(&b'-');

    // The anchor reappears on the terminator line, so the body ends
    // `anchor.len() + 1` bytes before the end; for the plain form that
    // equals `len - idx + 1` because the anchor is `idx - 2` bytes long.
    if !unindent {
        let body = heredoc
            .get(idx + 1..len - idx + 1)
            .ok_or(ValueError::HeredocMalformed)?;
        return Ok(body.to_string());
    }

    // `<<-` adds one byte to the marker, and the terminator line may
    // carry leading whitespace, kept here as the final split element.
    let inner = heredoc
        .get(idx + 1..len - idx + 2)
        .ok_or(ValueError::HeredocMalformed)?;
    let lines: Vec<&str> = inner.split('\n').collect();
    let whitespace_prefix = lines[lines.len() - 1];

    let is_indented = lines.iter().all(|v| v.starts_with(whitespace_prefix));

    // Some line is shallower than the terminator: return the body as
    // is, less the terminator's own leading whitespace.
    if !is_indented {
        let body = heredoc
            .get(idx + 1..len - idx + 1)
            .ok_or(ValueError::HeredocMalformed)?;
        return Ok(body.trim_end_matches([' ', '\t']).to_string());
    }

    let mut unindented: Vec<&str> = Vec::with_capacity(lines.len());
    for (k, line) in lines.iter().enumerate() {
        if k == lines.len() - 1 {
            unindented.push("");
            break;
        }
        unindented.push(&line[whitespace_prefix.len()..]);
    }

    Ok(unindented.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn value_of(kind: TokenKind, text: &str) -> Value {
        match Token::new(kind, text).value() {
            Ok(v) => v,
            Err(e) => panic!("value({text:?}) failed: {e}"),
        }
    }

    #[test]
    fn test_kind_classification() {
        assert!(TokenKind::Ident.is_identifier());
        assert!(TokenKind::Heredoc.is_identifier());
        assert!(!TokenKind::Ident.is_literal());
        assert!(TokenKind::Number.is_literal());
        assert!(TokenKind::Assign.is_operator());
        assert!(!TokenKind::Eof.is_operator());
        assert!(!TokenKind::Comment.is_identifier());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(TokenKind::Lbrack.to_string(), "LBRACK");
        assert_eq!(TokenKind::Illegal.to_string(), "ILLEGAL");
    }

    #[test]
    fn test_value_bool() {
        assert_eq!(value_of(TokenKind::Bool, "true"), Value::Bool(true));
        assert_eq!(value_of(TokenKind::Bool, "false"), Value::Bool(false));
        assert!(Token::new(TokenKind::Bool, "truthy").value().is_err());
    }

    #[test]
    fn test_value_numbers() {
        assert_eq!(value_of(TokenKind::Number, "42"), Value::Int(42));
        assert_eq!(value_of(TokenKind::Number, "-17"), Value::Int(-17));
        assert_eq!(value_of(TokenKind::Float, "3.14"), Value::Float(3.14));
        assert!(Token::new(TokenKind::Number, "10kb").value().is_err());
    }

    #[test]
    fn test_value_ident_and_string() {
        assert_eq!(
            value_of(TokenKind::Ident, "foo"),
            Value::String("foo".to_string())
        );
        assert_eq!(
            value_of(TokenKind::String, r#""bar""#),
            Value::String("bar".to_string())
        );
        assert_eq!(
            value_of(TokenKind::String, ""),
            Value::String(String::new())
        );
    }

    #[test]
    fn test_value_string_from_json() {
        let mut tok = Token::new(TokenKind::String, r#""aAb""#);
        tok.from_json = true;
        assert_eq!(tok.value().ok(), Some(Value::String("aAb".to_string())));
    }

    #[test]
    fn test_value_string_keeps_interpolation() {
        assert_eq!(
            value_of(TokenKind::String, r#""${file("foo")}""#),
            Value::String(r#"${file("foo")}"#.to_string())
        );
    }

    #[test]
    fn test_value_operator_rejected() {
        assert!(Token::new(TokenKind::Assign, "=").value().is_err());
    }

    #[test]
    fn test_heredoc_plain() {
        assert_eq!(
            value_of(TokenKind::Heredoc, "<<EOF\nhello\nworld\nEOF\n"),
            Value::String("hello\nworld\n".to_string())
        );
    }

    #[test]
    fn test_heredoc_empty_body() {
        assert_eq!(
            value_of(TokenKind::Heredoc, "<<EOF\nEOF\n"),
            Value::String(String::new())
        );
    }

    #[test]
    fn test_heredoc_indented() {
        assert_eq!(
            value_of(TokenKind::Heredoc, "<<-EOF\n    hi\n    EOF\n"),
            Value::String("hi\n".to_string())
        );
    }

    #[test]
    fn test_heredoc_indented_multiline() {
        assert_eq!(
            value_of(TokenKind::Heredoc, "<<-EOF\n\tone\n\ttwo\n\tEOF\n"),
            Value::String("one\ntwo\n".to_string())
        );
    }

    #[test]
    fn test_heredoc_shallow_line_keeps_body() {
        // One line is shallower than the terminator, so the body stays
        // as is and only the terminator indent is trimmed.
        assert_eq!(
            value_of(TokenKind::Heredoc, "<<-EOF\nhi\n    EOF\n"),
            Value::String("hi\n".to_string())
        );
    }

    #[test]
    fn test_heredoc_without_newline_rejected() {
        assert!(Token::new(TokenKind::Heredoc, "<<EOF").value().is_err());
    }
}
