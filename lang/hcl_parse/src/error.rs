//! Parse error types.

use hcl_ir::{ObjectKey, Pos};
use thiserror::Error;

/// An error produced while parsing.
///
/// Both variants carry the object keys collected before the error was
/// hit, so callers can recover a partially parsed item.
#[derive(Clone, PartialEq, Debug, Error)]
pub enum ParseError {
    /// A lexical or structural error at a known source position.
    #[error("At {pos}: {msg}")]
    Pos {
        pos: Pos,
        msg: String,
        keys: Vec<ObjectKey>,
    },

    /// End of input where an object item was expected. At the top level
    /// this simply terminates the item list; anywhere else it is a
    /// genuine error.
    #[error("EOF token found")]
    UnexpectedEof { keys: Vec<ObjectKey> },
}

impl ParseError {
    pub(crate) fn at(pos: Pos, msg: impl Into<String>) -> Self {
        ParseError::Pos {
            pos,
            msg: msg.into(),
            keys: Vec::new(),
        }
    }
}
