//! The parser proper: tokens in, AST out.

use std::cell::RefCell;
use std::rc::Rc;

use hcl_ir::{
    Comment, CommentGroup, File, ListType, LiteralType, Node, ObjectItem, ObjectKey, ObjectList,
    ObjectType, Token, TokenKind,
};
use hcl_lexer::Scanner;
use tracing::trace;

use crate::error::ParseError;

/// Parse a full source buffer into a [`File`].
///
/// Line endings are normalized to `\n` up front; the scanner and the
/// printer only deal in `\n`.
pub fn parse(src: &[u8]) -> Result<File, ParseError> {
    let normalized = normalize_line_endings(src);
    let mut parser = Parser::new(&normalized);
    parser.parse()
}

fn normalize_line_endings(src: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(src.len());
    let mut i = 0;
    while i < src.len() {
        if src[i] == b'\r' && src.get(i + 1) == Some(&b'\n') {
            i += 1;
            continue;
        }
        out.push(src[i]);
        i += 1;
    }
    out
}

/// A recursive-descent parser with a one-token pushback buffer.
///
/// `scan` collects comment groups as a side effect and remembers the
/// most recent lead and line comment candidates; the grammar productions
/// claim them when an item or list element is completed.
pub struct Parser<'src> {
    sc: Scanner<'src>,

    /// Last token read from the scanner.
    tok: Token,
    /// When set, the next `scan` re-delivers `tok` instead of reading.
    buffered: bool,

    comments: Vec<CommentGroup>,
    lead_comment: Option<CommentGroup>,
    line_comment: Option<CommentGroup>,
}

impl<'src> Parser<'src> {
    pub fn new(src: &'src [u8]) -> Self {
        Parser {
            sc: Scanner::new(src),
            tok: Token::default(),
            buffered: false,
            comments: Vec::new(),
            lead_comment: None,
            line_comment: None,
        }
    }

    /// Parse the whole input as a top-level object list.
    ///
    /// Scanner diagnostics are captured through the error sink; a
    /// lexical error takes precedence over whatever structural error it
    /// subsequently caused.
    pub fn parse(&mut self) -> Result<File, ParseError> {
        let scerr: Rc<RefCell<Option<ParseError>>> = Rc::default();
        let sink = Rc::clone(&scerr);
        self.sc.set_error_handler(move |pos, msg| {
            *sink.borrow_mut() = Some(ParseError::at(pos, msg));
        });

        let result = self.object_list(false);
        if let Some(err) = scerr.borrow_mut().take() {
            return Err(err);
        }

        Ok(File {
            node: result?,
            comments: std::mem::take(&mut self.comments),
        })
    }

    /// Parse a list of items within an object (generally k/v pairs).
    ///
    /// `obj` tells us whether we are within an object (braces) or at the
    /// top level. Within an object the list ends at an `RBRACE`.
    pub fn object_list(&mut self, obj: bool) -> Result<ObjectList, ParseError> {
        let (node, err) = self.object_list_partial(obj);
        match err {
            Some(err) => Err(err),
            None => Ok(node),
        }
    }

    /// Like [`Parser::object_list`], but returns the items collected
    /// before an error as well. `object_type` needs the partial list
    /// when the failing item ran into the closing brace.
    fn object_list_partial(&mut self, obj: bool) -> (ObjectList, Option<ParseError>) {
        trace!(obj, "object_list");
        let mut node = ObjectList::default();

        loop {
            if obj {
                let tok = self.scan();
                self.unscan();
                if tok.kind == TokenKind::Rbrace {
                    break;
                }
            }

            let item = match self.object_item() {
                Ok(item) => item,
                // we are finished
                Err(ParseError::UnexpectedEof { .. }) => break,
                Err(err) => return (node, Some(err)),
            };
            node.add(item);

            // object lists can be optionally comma-delimited e.g. when a
            // list of maps is being expressed, so a comma is allowed here
            // and simply consumed
            let tok = self.scan();
            if tok.kind != TokenKind::Comma {
                self.unscan();
            }
        }

        (node, None)
    }

    /// Parse a single object item.
    pub fn object_item(&mut self) -> Result<ObjectItem, ParseError> {
        trace!("object_item");

        let keys = match self.object_key() {
            Ok(keys) => keys,
            // Keys without a value: tolerate the EOF here so the value
            // check below reports the more useful error.
            Err(ParseError::UnexpectedEof { keys }) if !keys.is_empty() => keys,
            Err(ParseError::Pos { keys, .. })
                if !keys.is_empty() && self.tok.kind == TokenKind::Rbrace =>
            {
                // Keys with no value directly before a closing brace.
                // Reset the token kind so object_type does not take the
                // brace for a clean end of its list.
                self.tok.kind = TokenKind::Eof;
                keys
            }
            Err(err) => return Err(err),
        };

        let mut o = ObjectItem {
            keys,
            ..ObjectItem::default()
        };
        if let Some(lead) = self.lead_comment.take() {
            o.lead_comment = Some(lead);
        }

        match self.tok.kind {
            TokenKind::Assign => {
                o.assign = self.tok.pos.clone();
                o.val = Some(self.object()?);
            }
            TokenKind::Lbrace => {
                o.val = Some(Node::Object(self.object_type()?));
            }
            _ => {
                let key_str: Vec<&str> = o.keys.iter().map(|k| k.token.text.as_str()).collect();
                return Err(ParseError::at(
                    self.tok.pos.clone(),
                    format!(
                        "key '{}' expected start of object ('{{') or assignment ('=')",
                        key_str.join(" ")
                    ),
                ));
            }
        }

        // do a look-ahead for a line comment on the same line as the item
        self.scan();
        if let (Some(val), Some(first)) = (&o.val, o.keys.first()) {
            if val.pos().line == first.pos().line && self.line_comment.is_some() {
                o.line_comment = self.line_comment.take();
            }
        }
        self.unscan();

        Ok(o)
    }

    /// Parse an object key sequence: one or more IDENT/STRING tokens up
    /// to the `=` or `{` that starts the value.
    pub fn object_key(&mut self) -> Result<Vec<ObjectKey>, ParseError> {
        trace!("object_key");
        let mut key_count = 0usize;
        let mut keys: Vec<ObjectKey> = Vec::new();

        loop {
            let tok = self.scan();
            match tok.kind {
                // The keys collected so far ride along in the error, so
                // the caller can tell a bare EOF from keys cut short.
                TokenKind::Eof => return Err(ParseError::UnexpectedEof { keys }),
                TokenKind::Assign => {
                    // assignment or object only, but not nested objects.
                    // `foo bar = {}` is not allowed
                    if key_count > 1 {
                        return Err(ParseError::at(
                            tok.pos,
                            format!("nested object expected: LBRACE got: {}", tok.kind),
                        ));
                    }
                    if key_count == 0 {
                        return Err(ParseError::at(tok.pos, "no object keys found!"));
                    }
                    return Ok(keys);
                }
                TokenKind::Lbrace => {
                    // `{{}}` with no keys at all is a syntax error
                    if keys.is_empty() {
                        return Err(ParseError::Pos {
                            pos: tok.pos,
                            msg: format!("expected: IDENT | STRING got: {}", tok.kind),
                            keys,
                        });
                    }
                    return Ok(keys);
                }
                TokenKind::Ident | TokenKind::String => {
                    key_count += 1;
                    keys.push(ObjectKey { token: tok });
                }
                TokenKind::Illegal => {
                    return Err(ParseError::Pos {
                        pos: tok.pos,
                        msg: "illegal character".to_string(),
                        keys,
                    });
                }
                _ => {
                    return Err(ParseError::Pos {
                        pos: tok.pos,
                        msg: format!("expected: IDENT | STRING | ASSIGN | LBRACE got: {}", tok.kind),
                        keys,
                    });
                }
            }
        }
    }

    /// Parse any value node: literal, object or list.
    fn object(&mut self) -> Result<Node, ParseError> {
        trace!("object");
        let tok = self.scan();

        match tok.kind {
            TokenKind::Number
            | TokenKind::Float
            | TokenKind::Bool
            | TokenKind::String
            | TokenKind::Heredoc => Ok(Node::Literal(self.literal_type())),
            TokenKind::Lbrace => Ok(Node::Object(self.object_type()?)),
            TokenKind::Lbrack => Ok(Node::List(self.list_type()?)),
            TokenKind::Eof => Err(ParseError::UnexpectedEof { keys: Vec::new() }),
            _ => Err(ParseError::at(
                tok.pos.clone(),
                format!("Unknown token: {tok}"),
            )),
        }
    }

    /// Parse an object type. The current token is the opening `LBRACE`.
    fn object_type(&mut self) -> Result<ObjectType, ParseError> {
        trace!("object_type");
        let mut o = ObjectType {
            lbrace: self.tok.pos.clone(),
            ..ObjectType::default()
        };

        let (list, err) = self.object_list_partial(true);
        // If we hit an RBRACE we parsed all items and are good to go;
        // anything else is a syntax error to pass up.
        if let Some(err) = err {
            if self.tok.kind != TokenKind::Rbrace {
                return Err(err);
            }
        }

        let tok = self.scan();
        if tok.kind != TokenKind::Rbrace {
            return Err(ParseError::at(
                tok.pos,
                format!("object expected closing RBRACE got: {}", tok.kind),
            ));
        }

        o.list = list;
        o.rbrace = tok.pos;
        Ok(o)
    }

    /// Parse a list type. The current token is the opening `LBRACK`.
    fn list_type(&mut self) -> Result<ListType, ParseError> {
        trace!("list_type");
        let mut l = ListType {
            lbrack: self.tok.pos.clone(),
            ..ListType::default()
        };

        let mut need_comma = false;
        loop {
            let tok = self.scan();
            if need_comma && !matches!(tok.kind, TokenKind::Comma | TokenKind::Rbrack) {
                return Err(ParseError::at(
                    tok.pos,
                    format!(
                        "error parsing list, expected comma or list end, got: {}",
                        tok.kind
                    ),
                ));
            }
            match tok.kind {
                TokenKind::Bool
                | TokenKind::Number
                | TokenKind::Float
                | TokenKind::String
                | TokenKind::Heredoc => {
                    let mut node = self.literal_type();
                    if let Some(lead) = self.lead_comment.take() {
                        node.lead_comment = Some(lead);
                    }
                    l.add(Node::Literal(node));
                    need_comma = true;
                }
                TokenKind::Comma => {
                    // look ahead so a trailing line comment attaches to
                    // the element before this comma
                    self.scan();
                    if self.line_comment.is_some() {
                        if let Some(Node::Literal(lit)) = l.list.last_mut() {
                            lit.line_comment = self.line_comment.take();
                        }
                    }
                    self.unscan();
                    need_comma = false;
                }
                TokenKind::Lbrace => {
                    let node = self.object_type().map_err(|err| {
                        ParseError::at(
                            tok.pos.clone(),
                            format!("error while trying to parse object within list: {err}"),
                        )
                    })?;
                    l.add(Node::Object(node));
                    need_comma = true;
                }
                TokenKind::Lbrack => {
                    let node = self.list_type().map_err(|err| {
                        ParseError::at(
                            tok.pos.clone(),
                            format!("error while trying to parse list within list: {err}"),
                        )
                    })?;
                    // a nested list does not require a following comma
                    l.add(Node::List(node));
                }
                TokenKind::Rbrack => {
                    l.rbrack = tok.pos;
                    return Ok(l);
                }
                _ => {
                    return Err(ParseError::at(
                        tok.pos,
                        format!("unexpected token while parsing list: {}", tok.kind),
                    ));
                }
            }
        }
    }

    /// Wrap the current token as a literal node.
    fn literal_type(&self) -> LiteralType {
        LiteralType {
            token: self.tok.clone(),
            ..LiteralType::default()
        }
    }

    /// Return the next token, reading from the pushback buffer first.
    ///
    /// Comment tokens never escape: they are collected into groups here,
    /// and the last group before the returned token is remembered as a
    /// lead-comment or line-comment candidate.
    fn scan(&mut self) -> Token {
        if self.buffered {
            self.buffered = false;
            return self.tok.clone();
        }

        let prev = std::mem::take(&mut self.tok);
        self.tok = self.sc.scan();

        if self.tok.kind == TokenKind::Comment {
            if self.tok.pos.line == prev.pos.line {
                // The comment is on the same line as the previous token;
                // it cannot be a lead comment but may be a line comment.
                let (group, endline) = self.consume_comment_group(0);
                if self.tok.pos.line != endline {
                    // The next token is on a different line, thus the
                    // last comment group is a line comment.
                    self.line_comment = Some(group);
                }
            }

            // consume successor comments, if any
            let mut last: Option<(CommentGroup, u32)> = None;
            while self.tok.kind == TokenKind::Comment {
                last = Some(self.consume_comment_group(1));
            }
            if let Some((group, endline)) = last {
                if endline + 1 == self.tok.pos.line
                    && self.tok.kind != TokenKind::Rbrace
                    && self.tok.kind != TokenKind::Rbrack
                {
                    // The next token follows on the line immediately
                    // after the comment group, thus the last comment
                    // group is a lead comment.
                    self.lead_comment = Some(group);
                }
            }
        }

        self.tok.clone()
    }

    /// Push the previously read token back onto the buffer.
    fn unscan(&mut self) {
        self.buffered = true;
    }

    /// Consume adjacent comments into one group. A comment joins the
    /// group while it starts no more than `n` lines below the group's
    /// current end.
    fn consume_comment_group(&mut self, n: u32) -> (CommentGroup, u32) {
        let mut list = Vec::new();
        let mut endline = self.tok.pos.line;

        while self.tok.kind == TokenKind::Comment && self.tok.pos.line <= endline + n {
            let (comment, end) = self.consume_comment();
            endline = end;
            list.push(comment);
        }

        let group = CommentGroup { list };
        self.comments.push(group.clone());
        (group, endline)
    }

    /// Consume one comment token, returning the line its text ends on.
    fn consume_comment(&mut self) -> (Comment, u32) {
        let mut endline = self.tok.pos.line;

        // count the endline if it's a multiline comment, i.e. starting
        // with /*
        if self.tok.text.len() > 1 && self.tok.text.as_bytes()[1] == b'*' {
            for b in self.tok.text.bytes() {
                if b == b'\n' {
                    endline += 1;
                }
            }
        }

        let comment = Comment {
            start: self.tok.pos.clone(),
            text: self.tok.text.clone(),
        };
        self.tok = self.sc.scan();
        (comment, endline)
    }
}

#[cfg(test)]
mod tests;
