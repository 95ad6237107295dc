//! Core data structures for the HCL front end:
//! - Source positions (`Pos`)
//! - Tokens and literal value decoding
//! - Quoted-string decoding with interpolation passthrough
//! - AST nodes with attached comments
//! - Depth-first tree traversal
//!
//! All node types are plain owned data with `Clone + PartialEq + Debug`,
//! so parser output can be compared structurally in tests and rewritten
//! in place by the walker.

pub mod ast;
pub mod strconv;
pub mod walk;

mod pos;
mod token;

pub use ast::{
    Comment, CommentGroup, File, ListType, LiteralType, Node, ObjectItem, ObjectKey, ObjectList,
    ObjectType,
};
pub use pos::Pos;
pub use token::{Token, TokenKind, Value, ValueError};
pub use walk::{walk, walk_mut, NodeMut, NodeRef, Visitor, VisitorMut};
