//! Comment-preserving pretty-printer for HCL sources.
//!
//! [`format`] parses the input and prints a canonical rendition of it:
//! two-space indentation, aligned runs of single-line items, standalone
//! comments kept in their source slots, and a single trailing newline.
//! Formatting already-formatted output is a no-op.

mod comments;
mod printer;

pub use hcl_parse::ParseError;

use hcl_ir::File;

/// Printer configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of spaces per indentation level. `0` indents with tabs.
    pub spaces_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config { spaces_width: 2 }
    }
}

impl Config {
    /// Format `src` with this configuration. The result ends with
    /// exactly one newline.
    pub fn format(&self, src: &[u8]) -> Result<Vec<u8>, ParseError> {
        let file = hcl_parse::parse(src)?;
        let mut out = self.print(&file);
        out.push(b'\n');
        Ok(out)
    }

    /// Print an already parsed file. No trailing newline is added.
    pub fn print(&self, file: &File) -> Vec<u8> {
        let standalone = comments::standalone_comments(file);
        let mut p = printer::Printer::new(self.clone(), standalone);
        printer::unindent(&p.output_file(file))
    }
}

/// Format `src` with the default configuration.
pub fn format(src: &[u8]) -> Result<Vec<u8>, ParseError> {
    Config::default().format(src)
}
