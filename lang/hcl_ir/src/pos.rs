//! Source positions.
//!
//! A position carries an optional file name, a byte offset, and 1-based
//! line/column numbers. Line 0 marks an invalid position (the default).

use std::fmt;

/// An arbitrary source position. Valid iff `line > 0`.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Pos {
    /// File name, if any.
    pub filename: Option<String>,
    /// Byte offset, starting at 0.
    pub offset: u32,
    /// Line number, starting at 1.
    pub line: u32,
    /// Column number, starting at 1 (character count).
    pub column: u32,
}

impl Pos {
    /// Position with offset/line/column and no file name.
    #[inline]
    pub const fn new(offset: u32, line: u32, column: u32) -> Self {
        Pos {
            filename: None,
            offset,
            line,
            column,
        }
    }

    /// Whether the position refers to an actual source location.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.line > 0
    }

    /// Whether `self` comes before `other` in the source.
    ///
    /// Ordering compares offset and line only; column and file name do
    /// not participate.
    #[inline]
    pub fn before(&self, other: &Pos) -> bool {
        other.offset > self.offset || other.line > self.line
    }

    /// Whether `self` comes after `other` in the source.
    #[inline]
    pub fn after(&self, other: &Pos) -> bool {
        other.offset < self.offset || other.line < self.line
    }
}

impl fmt::Display for Pos {
    /// One of several forms:
    ///
    /// ```text
    /// file:line:column    valid position with file name
    /// line:column         valid position without file name
    /// file                invalid position with file name
    /// -                   invalid position without file name
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = self.filename.clone().unwrap_or_default();
        if self.is_valid() {
            if !s.is_empty() {
                s.push(':');
            }
            s.push_str(&format!("{}:{}", self.line, self.column));
        }
        if s.is_empty() {
            s.push('-');
        }
        f.write_str(&s)
    }
}

impl fmt::Debug for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pos({self})")
    }
}
