//! The scanner state machine.
//!
//! Positions are tracked per character: `src_pos` always sits just past
//! the last character read, `prev_pos` remembers the state before it so
//! a single `unread` can restore it, and `last_line_len` makes column
//! reporting survive an unread across a line boundary.

use hcl_ir::{Pos, Token, TokenKind};
use regex::Regex;

/// Marker rune for the end of input.
const EOF_CHAR: char = '\0';

type ErrorHandler<'a> = Box<dyn FnMut(Pos, &str) + 'a>;

/// A lexical scanner over a byte slice.
pub struct Scanner<'src> {
    src: &'src [u8],
    /// Read cursor into `src`, in bytes.
    read_offset: usize,
    /// Byte length of the last successful read, while it is still
    /// unreadable.
    last_rune_size: Option<usize>,

    src_pos: Pos,
    prev_pos: Pos,
    /// Length of the last character in bytes.
    last_char_len: usize,
    /// Length of the last line in characters, for column reporting.
    last_line_len: u32,

    tok_start: usize,
    tok_end: usize,
    tok_pos: Pos,

    error: Option<ErrorHandler<'src>>,
    error_count: usize,
}

impl<'src> Scanner<'src> {
    /// Create a scanner reading from `src`.
    pub fn new(src: &'src [u8]) -> Self {
        Scanner {
            src,
            read_offset: 0,
            last_rune_size: None,
            src_pos: Pos::new(0, 1, 0),
            prev_pos: Pos::default(),
            last_char_len: 0,
            last_line_len: 0,
            tok_start: 0,
            tok_end: 0,
            tok_pos: Pos::default(),
            error: None,
            error_count: 0,
        }
    }

    /// Install the diagnostic sink. Without one, diagnostics go to
    /// stderr.
    pub fn set_error_handler(&mut self, handler: impl FnMut(Pos, &str) + 'src) {
        self.error = Some(Box::new(handler));
    }

    /// Number of diagnostics reported so far.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Start position of the most recently scanned token.
    pub fn tok_pos(&self) -> Pos {
        self.tok_pos.clone()
    }

    /// Read the next character. Returns the EOF marker at end of input.
    fn next(&mut self) -> char {
        let Some((ch, size)) = self.read_rune() else {
            // advance for error reporting
            self.src_pos.column += 1;
            self.last_char_len = 0;
            return EOF_CHAR;
        };

        if ch == char::REPLACEMENT_CHARACTER && size == 1 {
            self.src_pos.column += 1;
            self.src_pos.offset += 1;
            self.last_char_len = 1;
            self.err("illegal UTF-8 encoding");
            return ch;
        }

        // remember last position
        self.prev_pos = self.src_pos.clone();

        self.src_pos.column += 1;
        self.last_char_len = size;
        self.src_pos.offset += size as u32;

        if ch == '\n' {
            self.src_pos.line += 1;
            self.last_line_len = self.src_pos.column;
            self.src_pos.column = 0;
        }

        // A null character with data left is an error.
        if ch == '\0' && self.read_offset < self.src.len() {
            self.err("unexpected null character (0x00)");
            return EOF_CHAR;
        }

        ch
    }

    /// Push the previous character back and restore its position.
    fn unread(&mut self) {
        if let Some(size) = self.last_rune_size.take() {
            self.read_offset -= size;
        }
        self.src_pos = self.prev_pos.clone();
    }

    /// Look at the next character without advancing.
    fn peek(&mut self) -> char {
        // Invalidates the pushback slot, like a read-then-unread pair.
        self.last_rune_size = None;
        if self.read_offset >= self.src.len() {
            return EOF_CHAR;
        }
        decode_rune(&self.src[self.read_offset..]).0
    }

    fn read_rune(&mut self) -> Option<(char, usize)> {
        if self.read_offset >= self.src.len() {
            self.last_rune_size = None;
            return None;
        }
        let (ch, size) = decode_rune(&self.src[self.read_offset..]);
        self.read_offset += size;
        self.last_rune_size = Some(size);
        Some((ch, size))
    }

    /// Scan the next token.
    pub fn scan(&mut self) -> Token {
        let mut ch = self.next();

        // skip white space
        while is_whitespace(ch) {
            ch = self.next();
        }

        let mut kind = TokenKind::Illegal;

        // token text marking
        self.tok_start = self.src_pos.offset as usize - self.last_char_len;

        // The token position points at the character just scanned, so
        // back the offset up by one character width.
        self.tok_pos.offset = self.src_pos.offset - self.last_char_len as u32;
        if self.src_pos.column > 0 {
            // common case: last character was not a '\n'
            self.tok_pos.line = self.src_pos.line;
            self.tok_pos.column = self.src_pos.column;
        } else {
            // last character was a '\n'; we cannot be at the beginning
            // of the source since at least one read has happened
            self.tok_pos.line = self.src_pos.line - 1;
            self.tok_pos.column = self.last_line_len;
        }

        if is_letter(ch) {
            kind = TokenKind::Ident;
            let lit = self.scan_identifier();
            if lit == "true" || lit == "false" {
                kind = TokenKind::Bool;
            }
        } else if is_decimal(ch) {
            kind = self.scan_number(ch);
        } else {
            match ch {
                EOF_CHAR => kind = TokenKind::Eof,
                '"' => {
                    kind = TokenKind::String;
                    self.scan_string();
                }
                '#' | '/' => {
                    kind = TokenKind::Comment;
                    self.scan_comment(ch);
                }
                '.' => {
                    kind = TokenKind::Period;
                    let ch = self.peek();
                    if is_decimal(ch) {
                        kind = TokenKind::Float;
                        let ch = self.scan_mantissa(ch);
                        self.scan_exponent(ch);
                    }
                }
                '<' => {
                    kind = TokenKind::Heredoc;
                    self.scan_heredoc();
                }
                '[' => kind = TokenKind::Lbrack,
                ']' => kind = TokenKind::Rbrack,
                '{' => kind = TokenKind::Lbrace,
                '}' => kind = TokenKind::Rbrace,
                ',' => kind = TokenKind::Comma,
                '=' => kind = TokenKind::Assign,
                '+' => kind = TokenKind::Add,
                '-' => {
                    if is_decimal(self.peek()) {
                        let ch = self.next();
                        kind = self.scan_number(ch);
                    } else {
                        kind = TokenKind::Sub;
                    }
                }
                _ => self.err("illegal char"),
            }
        }

        self.tok_end = self.src_pos.offset as usize;

        let text = String::from_utf8_lossy(&self.src[self.tok_start..self.tok_end]).into_owned();

        Token {
            kind,
            pos: self.tok_pos.clone(),
            text,
            from_json: false,
        }
    }

    fn scan_comment(&mut self, ch: char) {
        // single line comments
        if ch == '#' || (ch == '/' && self.peek() != '*') {
            if ch == '/' && self.peek() != '/' {
                self.err("expected '/' for comment");
                return;
            }

            let mut ch = self.next();
            while ch != '\n' && ch != EOF_CHAR {
                ch = self.next();
            }
            if ch != EOF_CHAR {
                self.unread();
            }
            return;
        }

        // consume the character after "/*" up front, so unterminated
        // block comments are caught
        let mut ch = ch;
        if ch == '/' {
            self.next();
            ch = self.next();
        }

        loop {
            if ch == EOF_CHAR {
                self.err("comment not terminated");
                break;
            }

            let ch0 = ch;
            ch = self.next();
            if ch0 == '*' && ch == '/' {
                break;
            }
        }
    }

    /// Scan a number starting from `ch`, already consumed.
    fn scan_number(&mut self, ch: char) -> TokenKind {
        if ch == '0' {
            // check for hexadecimal, octal or float
            let mut ch = self.next();
            if ch == 'x' || ch == 'X' {
                // hexadecimal
                ch = self.next();
                let mut found = false;
                while is_hexadecimal(ch) {
                    ch = self.next();
                    found = true;
                }

                if !found {
                    self.err("illegal hexadecimal number");
                }

                if ch != EOF_CHAR {
                    self.unread();
                }

                return TokenKind::Number;
            }

            // now it's either something like 0421 (octal) or 0.1231
            // (float)
            let mut illegal_octal = false;
            while is_decimal(ch) {
                ch = self.next();
                if ch == '8' || ch == '9' {
                    // Only a possibility so far: 0159 is illegal but
                    // 0159.23 is valid. Decide once the token ends.
                    illegal_octal = true;
                }
            }

            if ch == 'e' || ch == 'E' {
                self.scan_exponent(ch);
                return TokenKind::Float;
            }

            if ch == '.' {
                let ch = self.scan_fraction(ch);
                if ch == 'e' || ch == 'E' {
                    let ch = self.next();
                    self.scan_exponent(ch);
                }
                return TokenKind::Float;
            }

            if illegal_octal {
                self.err("illegal octal number");
            }

            if ch != EOF_CHAR {
                self.unread();
            }
            return TokenKind::Number;
        }

        self.scan_mantissa(ch);
        let ch = self.next(); // seek forward
        if ch == 'e' || ch == 'E' {
            self.scan_exponent(ch);
            return TokenKind::Float;
        }

        if ch == '.' {
            let ch = self.scan_fraction(ch);
            if ch == 'e' || ch == 'E' {
                let ch = self.next();
                self.scan_exponent(ch);
            }
            return TokenKind::Float;
        }

        if ch != EOF_CHAR {
            self.unread();
        }
        TokenKind::Number
    }

    /// Scan a mantissa beginning at `ch`, returning the first
    /// non-decimal character (left unread when anything was consumed).
    fn scan_mantissa(&mut self, ch: char) -> char {
        let mut ch = ch;
        let mut scanned = false;
        while is_decimal(ch) {
            ch = self.next();
            scanned = true;
        }

        if scanned && ch != EOF_CHAR {
            self.unread();
        }
        ch
    }

    /// Scan the fraction after the '.'.
    fn scan_fraction(&mut self, ch: char) -> char {
        let mut ch = ch;
        if ch == '.' {
            ch = self.peek(); // peek to see whether we can move forward
            ch = self.scan_mantissa(ch);
        }
        ch
    }

    /// Scan the remainder of an exponent after the 'e' or 'E'.
    fn scan_exponent(&mut self, ch: char) -> char {
        let mut ch = ch;
        if ch == 'e' || ch == 'E' {
            ch = self.next();
            if ch == '-' || ch == '+' {
                ch = self.next();
            }
            ch = self.scan_mantissa(ch);
        }
        ch
    }

    fn scan_heredoc(&mut self) {
        // the second '<' of '<<EOF'
        if self.next() != '<' {
            self.err("heredoc expected second '<', didn't see it");
            return;
        }

        // Remember where the anchor starts.
        let offs = self.src_pos.offset as usize;

        let mut ch = self.next();

        // indented heredoc syntax
        if ch == '-' {
            ch = self.next();
        }

        while is_letter(ch) || is_digit(ch) {
            ch = self.next();
        }

        if ch == EOF_CHAR {
            self.err("heredoc not terminated");
            return;
        }

        // tolerate Windows line endings
        if ch == '\r' {
            if self.peek() == '\n' {
                ch = self.next();
            }
        }

        if ch != '\n' {
            self.err("invalid characters in heredoc anchor");
            return;
        }

        // The anchor, '-' prefix and any '\r' included.
        let ident = &self.src[offs..self.src_pos.offset as usize - self.last_char_len];
        if ident.is_empty() {
            self.err("zero-length heredoc anchor");
            return;
        }

        let anchor = if ident[0] == b'-' { &ident[1..] } else { ident };
        let anchor = String::from_utf8_lossy(anchor).into_owned();
        let pattern = format!("^[[:space:]]*{}\\z", regex::escape(&anchor));
        let Ok(terminator) = Regex::new(&pattern) else {
            self.err("heredoc not terminated");
            return;
        };

        // Read the body, line by line, until the terminator matches.
        let ident_len = ident.len();
        let mut line_start = self.src_pos.offset as usize;
        loop {
            let ch = self.next();

            if ch == '\n' {
                // Length check first: a line shorter than the anchor
                // cannot be a terminator.
                let line_end = self.src_pos.offset as usize - self.last_char_len;
                if line_end - line_start >= ident_len
                    && terminator.is_match(&String::from_utf8_lossy(&self.src[line_start..line_end]))
                {
                    break;
                }

                // Not a terminator, record the start of a new line.
                line_start = self.src_pos.offset as usize;
            }

            if ch == EOF_CHAR {
                self.err("heredoc not terminated");
                return;
            }
        }
    }

    fn scan_string(&mut self) {
        let mut braces = 0u32;
        loop {
            // the opening '"' is already consumed
            let ch = self.next();

            if (ch == '\n' && braces == 0) || ch == EOF_CHAR {
                self.err("literal not terminated");
                return;
            }

            if ch == '"' && braces == 0 {
                break;
            }

            // Inside a ${} quotes don't terminate the literal.
            if braces == 0 && ch == '$' && self.peek() == '{' {
                braces += 1;
                self.next();
            } else if braces > 0 && ch == '{' {
                braces += 1;
            }
            if braces > 0 && ch == '}' {
                braces -= 1;
            }

            if ch == '\\' {
                self.scan_escape();
            }
        }
    }

    /// Scan an escape sequence; the '\' is already consumed.
    fn scan_escape(&mut self) -> char {
        let ch = self.next();
        match ch {
            'a' | 'b' | 'f' | 'n' | 'r' | 't' | 'v' | '\\' | '"' => ch,
            '0'..='7' => self.scan_digits(ch, 8, 3),
            'x' => {
                let first = self.next();
                self.scan_digits(first, 16, 2)
            }
            'u' => {
                let first = self.next();
                self.scan_digits(first, 16, 4)
            }
            'U' => {
                let first = self.next();
                self.scan_digits(first, 16, 8)
            }
            _ => {
                self.err("illegal char escape");
                ch
            }
        }
    }

    /// Scan up to `n` digits of the given base, starting at `ch`.
    fn scan_digits(&mut self, ch: char, base: u32, n: usize) -> char {
        let start = n;
        let mut n = n;
        let mut ch = ch;
        while n > 0 && digit_val(ch) < base {
            ch = self.next();
            if ch == EOF_CHAR {
                // halt digit scanning at end of input
                break;
            }

            n -= 1;
        }
        if n > 0 {
            self.err("illegal char escape");
        }

        if n != start {
            // all digits scanned, put the last non-digit back, but
            // only if anything was read at all
            self.unread();
        }

        ch
    }

    /// Scan an identifier and return its text.
    fn scan_identifier(&mut self) -> String {
        let offs = self.src_pos.offset as usize - self.last_char_len;
        let mut ch = self.next();
        while is_letter(ch) || is_digit(ch) || ch == '-' || ch == '.' {
            ch = self.next();
        }

        if ch != EOF_CHAR {
            self.unread(); // put back the char ending the identifier
        }

        String::from_utf8_lossy(&self.src[offs..self.src_pos.offset as usize]).into_owned()
    }

    /// Position of the character immediately after the character or
    /// token returned by the last read.
    fn recent_position(&self) -> Pos {
        let mut pos = Pos::default();
        pos.offset = self.src_pos.offset - self.last_char_len as u32;

        if self.src_pos.column > 0 {
            // common case: last character was not a '\n'
            pos.line = self.src_pos.line;
            pos.column = self.src_pos.column;
        } else if self.last_line_len > 0 {
            // last character was a '\n'
            pos.line = self.src_pos.line - 1;
            pos.column = self.last_line_len;
        } else {
            // at the beginning of the source
            pos.line = 1;
            pos.column = 1;
        }
        pos
    }

    /// Report a diagnostic and keep scanning.
    fn err(&mut self, msg: &str) {
        self.error_count += 1;
        let pos = self.recent_position();

        if let Some(handler) = self.error.as_mut() {
            handler(pos, msg);
            return;
        }

        eprintln!("{pos}: {msg}");
    }
}

/// Decode one UTF-8 character, yielding U+FFFD with size 1 for an
/// invalid encoding.
fn decode_rune(bytes: &[u8]) -> (char, usize) {
    let b0 = bytes[0];
    if b0 < 0x80 {
        return (b0 as char, 1);
    }
    let len = match b0 {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => return (char::REPLACEMENT_CHARACTER, 1),
    };
    if bytes.len() < len {
        return (char::REPLACEMENT_CHARACTER, 1);
    }
    match std::str::from_utf8(&bytes[..len]) {
        Ok(s) => match s.chars().next() {
            Some(ch) => (ch, len),
            None => (char::REPLACEMENT_CHARACTER, 1),
        },
        Err(_) => (char::REPLACEMENT_CHARACTER, 1),
    }
}

fn is_letter(ch: char) -> bool {
    ch.is_ascii_lowercase()
        || ch.is_ascii_uppercase()
        || ch == '_'
        || (ch as u32 >= 0x80 && ch.is_alphabetic())
}

fn is_digit(ch: char) -> bool {
    ch.is_ascii_digit() || (ch as u32 >= 0x80 && ch.is_numeric())
}

fn is_decimal(ch: char) -> bool {
    ch.is_ascii_digit()
}

fn is_hexadecimal(ch: char) -> bool {
    ch.is_ascii_hexdigit()
}

fn is_whitespace(ch: char) -> bool {
    ch == ' ' || ch == '\t' || ch == '\n' || ch == '\r'
}

/// Integer value of an octal, decimal or hexadecimal digit. Returns 16
/// (larger than any legal digit value) for anything else.
fn digit_val(ch: char) -> u32 {
    match ch {
        '0'..='9' => ch as u32 - '0' as u32,
        'a'..='f' => ch as u32 - 'a' as u32 + 10,
        'A'..='F' => ch as u32 - 'A' as u32 + 10,
        _ => 16,
    }
}
