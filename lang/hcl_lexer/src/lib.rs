//! Lexical scanner for HCL sources.
//!
//! The scanner is a hand-written state machine over raw bytes: it
//! decodes one UTF-8 character at a time, supports a one-character
//! pushback, and reports diagnostics through a caller-installed sink
//! while continuing to scan.

mod scanner;

pub use scanner::Scanner;
