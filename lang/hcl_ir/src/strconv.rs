//! Quoted-string decoding.
//!
//! Unlike a plain string unescape, `${ ... }` interpolation spans are
//! copied through verbatim (nested braces included) so that a later
//! evaluation stage sees them untouched. Escapes are only decoded in
//! the text between spans.

use thiserror::Error;

/// The input is not a well-formed quoted string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid syntax")]
pub struct SyntaxError;

/// Decode a double-quoted string literal.
///
/// The input must include the surrounding quotes. Escapes follow the
/// usual C-style grammar (`\a \b \f \n \r \t \v \\ \"`, octal `\NNN`,
/// `\xHH`, `\uHHHH`, `\UHHHHHHHH`); a bare newline outside an
/// interpolation span is rejected.
pub fn unquote(s: &str) -> Result<String, SyntaxError> {
    let n = s.len();
    if n < 2 {
        return Err(SyntaxError);
    }
    let bytes = s.as_bytes();
    let quote = bytes[0];
    if quote != bytes[n - 1] {
        return Err(SyntaxError);
    }
    let mut s = &s[1..n - 1];

    if quote != b'"' {
        return Err(SyntaxError);
    }

    // A raw newline is only legal inside an interpolation span.
    if !s.contains('$') && !s.contains('{') && s.contains('\n') {
        return Err(SyntaxError);
    }

    // Is it trivial? Avoid allocation.
    if !s.contains('\\') && !s.contains('"') && !s.contains('$') {
        return Ok(s.to_string());
    }

    let mut buf = String::new();
    while !s.is_empty() {
        // `${` starts a span that passes through un-unquoted: no
        // characters inside it are decoded.
        if s.starts_with("${") {
            buf.push_str("${");
            s = &s[2..];

            let mut braces = 1u32;
            let mut chars = s.char_indices();
            let mut consumed = s.len();
            for (i, r) in chars.by_ref() {
                buf.push(r);
                match r {
                    '{' => braces += 1,
                    '}' => {
                        braces -= 1;
                        if braces == 0 {
                            consumed = i + r.len_utf8();
                            break;
                        }
                    }
                    _ => {}
                }
            }
            if braces != 0 {
                return Err(SyntaxError);
            }
            s = &s[consumed..];
            continue;
        }

        if s.starts_with('\n') {
            return Err(SyntaxError);
        }

        let (c, tail) = unquote_char(s)?;
        buf.push(c);
        s = tail;
    }

    Ok(buf)
}

fn unhex(c: u8) -> Result<u32, SyntaxError> {
    match c {
        b'0'..=b'9' => Ok(u32::from(c - b'0')),
        b'a'..=b'f' => Ok(u32::from(c - b'a') + 10),
        b'A'..=b'F' => Ok(u32::from(c - b'A') + 10),
        _ => Err(SyntaxError),
    }
}

/// Decode one character (or escape sequence) from the front of `s`,
/// returning it with the remaining tail.
fn unquote_char(s: &str) -> Result<(char, &str), SyntaxError> {
    let mut chars = s.chars();
    let c = chars.next().ok_or(SyntaxError)?;

    // easy cases
    if c == '"' {
        return Err(SyntaxError);
    }
    if c as u32 >= 0x80 || c != '\\' {
        return Ok((c, &s[c.len_utf8()..]));
    }

    // hard case: c is backslash
    let bytes = s.as_bytes();
    if bytes.len() <= 1 {
        return Err(SyntaxError);
    }
    let e = bytes[1];
    let s = &s[2..];

    let value: char;
    let mut tail = s;
    match e {
        b'a' => value = '\u{07}',
        b'b' => value = '\u{08}',
        b'f' => value = '\u{0C}',
        b'n' => value = '\n',
        b'r' => value = '\r',
        b't' => value = '\t',
        b'v' => value = '\u{0B}',
        b'x' | b'u' | b'U' => {
            let n = match e {
                b'x' => 2,
                b'u' => 4,
                _ => 8,
            };
            if s.len() < n {
                return Err(SyntaxError);
            }
            let mut v: u32 = 0;
            for j in 0..n {
                let x = unhex(s.as_bytes()[j])?;
                v = v << 4 | x;
            }
            tail = &s[n..];
            if e != b'x' && v > 0x80 {
                return Err(SyntaxError);
            }
            value = char::from_u32(v).ok_or(SyntaxError)?;
        }
        b'0'..=b'7' => {
            if s.len() < 2 {
                return Err(SyntaxError);
            }
            let mut v: u32 = u32::from(e - b'0');
            for j in 0..2 {
                let d = s.as_bytes()[j];
                if !(b'0'..=b'7').contains(&d) {
                    return Err(SyntaxError);
                }
                v = v << 3 | u32::from(d - b'0');
            }
            tail = &s[2..];
            if v > 255 {
                return Err(SyntaxError);
            }
            value = char::from_u32(v).ok_or(SyntaxError)?;
        }
        b'\\' => value = '\\',
        b'\'' | b'"' => {
            if e != b'"' {
                return Err(SyntaxError);
            }
            value = '"';
        }
        _ => return Err(SyntaxError),
    }

    Ok((value, tail))
}
