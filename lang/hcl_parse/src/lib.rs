//! Recursive-descent parser for HCL configuration sources.
//!
//! [`parse`] turns raw bytes into an [`hcl_ir::File`], collecting every
//! comment group along the way and attaching lead and line comments to
//! the items they document. [`Parser`] exposes the individual grammar
//! productions for embedding and tests.

mod error;
mod parser;

pub use error::ParseError;
pub use parser::{parse, Parser};
