//! The printer proper.
//!
//! Rendering is buffer-based: every node renders into its own byte
//! buffer, and parents indent child output line by line. Lines that must
//! keep their own indentation (heredoc bodies, multiline strings,
//! multiline comments) are tagged with a private-use marker that a final
//! [`unindent`] pass resolves.

use hcl_ir::{CommentGroup, File, ListType, LiteralType, Node, ObjectItem, ObjectList, ObjectType, Pos, TokenKind};

use crate::Config;

/// Sentinel offset/line for "no next item".
const INFINITY: u32 = 1 << 30;

/// Marker prepended to lines whose indentation must survive the parent's
/// indent pass. Private use area, so it cannot occur in real input.
const UNINDENT_MARKER: &[u8] = "\u{E123}".as_bytes();

pub(crate) struct Printer {
    cfg: Config,
    /// Position of the last item printed, for standalone-comment
    /// interleaving.
    prev: Pos,
    /// Comment groups not attached to any node, in source order.
    standalone_comments: Vec<CommentGroup>,
}

impl Printer {
    pub(crate) fn new(cfg: Config, standalone_comments: Vec<CommentGroup>) -> Self {
        Printer {
            cfg,
            prev: Pos::default(),
            standalone_comments,
        }
    }

    pub(crate) fn output_file(&mut self, file: &File) -> Vec<u8> {
        self.output_list(&file.node)
    }

    /// Render a top-level object list: items separated by newlines, with
    /// standalone comments emitted in their source slots.
    fn output_list(&mut self, t: &ObjectList) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut index = 0;

        loop {
            // The location of the next actual non-comment item; at the
            // end the next item is at "infinity".
            let next_item = if index == t.items.len() {
                Pos::new(INFINITY, INFINITY, 0)
            } else {
                t.items[index].pos()
            };

            for c in &self.standalone_comments {
                // A group prints together, not separated by blank lines.
                let mut printed = false;
                let mut newline_printed = false;
                for comment in &c.list {
                    // Only comments between the previously printed item
                    // and the next one belong here.
                    if comment.pos().after(&self.prev) && comment.pos().before(&next_item) {
                        // At the end of the item list, separate the
                        // trailing comment from the last item. Not when
                        // prev is invalid: a comment leading the file
                        // stays on the first line.
                        if !newline_printed && self.prev.is_valid() && index == t.items.len() {
                            buf.extend_from_slice(b"\n\n");
                            newline_printed = true;
                        }

                        buf.extend_from_slice(comment.text.as_bytes());
                        buf.push(b'\n');
                        printed = true;
                    }
                }

                // Keep a blank line between the comment and the item it
                // precedes.
                if printed && index != t.items.len() {
                    buf.push(b'\n');
                }
            }

            if index == t.items.len() {
                break;
            }

            self.prev = t.items[index].pos();
            let item_out = self.object_item(&t.items[index]);
            buf.extend(item_out);

            if index != t.items.len() - 1 {
                buf.push(b'\n');

                // A blank line separates the next item unless both this
                // item and the next are single-line objects on adjacent
                // lines.
                let current = &t.items[index];
                let next = &t.items[index + 1];
                if next.pos().line != current.pos().line + 1
                    || !is_single_line_object(next)
                    || !is_single_line_object(current)
                {
                    buf.push(b'\n');
                }
            }
            index += 1;
        }

        buf
    }

    fn output_node(&mut self, node: &Node) -> Vec<u8> {
        match node {
            Node::Literal(lit) => self.literal(lit),
            Node::List(list) => self.list(list),
            Node::Object(obj) => self.object_type(obj),
        }
    }

    fn literal(&self, lit: &LiteralType) -> Vec<u8> {
        let mut result = lit.token.text.clone().into_bytes();
        match lit.token.kind {
            TokenKind::Heredoc => {
                // Clear the trailing newline from heredocs
                if result.last() == Some(&b'\n') {
                    result.pop();
                }

                // Tag lines 2+ so that we don't indent them
                result = heredoc_indent(&result);
            }
            TokenKind::String => {
                // Same for multiline strings
                if result.contains(&b'\n') {
                    result = heredoc_indent(&result);
                }
            }
            _ => {}
        }
        result
    }

    /// Render one object item: lead comment, keys, `=` when assigned,
    /// the value, and a same-line line comment.
    fn object_item(&mut self, o: &ObjectItem) -> Vec<u8> {
        let mut buf = Vec::new();

        if let Some(lead) = &o.lead_comment {
            for comment in &lead.list {
                buf.extend_from_slice(comment.text.as_bytes());
                buf.push(b'\n');
            }
        }

        for (i, k) in o.keys.iter().enumerate() {
            buf.extend_from_slice(k.token.text.as_bytes());
            buf.push(b' ');

            // reach end of key
            if o.assign.is_valid() && i == o.keys.len() - 1 && o.keys.len() == 1 {
                buf.extend_from_slice(b"= ");
            }
        }

        if let Some(val) = &o.val {
            buf.extend(self.output_node(val));

            if let (Some(first), Some(line_comment)) = (o.keys.first(), &o.line_comment) {
                if val.pos().line == first.pos().line {
                    buf.push(b' ');
                    for comment in &line_comment.list {
                        buf.extend_from_slice(comment.text.as_bytes());
                    }
                }
            }
        }

        buf
    }

    /// Render an object body, brace to brace, with standalone comments
    /// interleaved and adjacent single-line items aligned.
    fn object_type(&mut self, o: &ObjectType) -> Vec<u8> {
        let mut buf = vec![b'{'];
        let mut index = 0;
        let mut commented = false;
        let mut newline_printed = false;

        loop {
            // The location of the next actual non-comment item; at the
            // end the next item is the closing brace.
            let next_item = if index == o.list.items.len() {
                o.rbrace.clone()
            } else {
                o.list.items[index].pos()
            };

            for c in &self.standalone_comments {
                let mut printed = false;
                let mut last_comment_pos = Pos::default();
                for comment in &c.list {
                    if comment.pos().after(&self.prev) && comment.pos().before(&next_item) {
                        // Open the block on the first comment.
                        if !newline_printed {
                            newline_printed = true;
                            buf.push(b'\n');
                        }

                        // blank line when between other printed nodes
                        if index > 0 {
                            commented = true;
                            buf.push(b'\n');
                        }

                        last_comment_pos = comment.pos();
                        buf.extend(self.indent(&heredoc_indent(comment.text.as_bytes())));
                        printed = true;
                    }
                }

                if printed {
                    buf.push(b'\n');

                    // If another item follows and the comment didn't hug
                    // it directly, keep a blank line between them.
                    if next_item != o.rbrace && next_item.line != last_comment_pos.line + 1 {
                        buf.push(b'\n');
                    }
                }
            }

            if index == o.list.items.len() {
                self.prev = o.rbrace.clone();
                break;
            }

            // Not a totally empty block: print the initial newline if the
            // comment pass hasn't done it already.
            if !newline_printed {
                buf.push(b'\n');
                newline_printed = true;
            }

            // Collect adjacent one-liner items so their comments and
            // values can be column-aligned. One rendered line means a
            // one-liner, two means a one-liner with a lead comment.
            let mut aligned: Vec<&ObjectItem> = Vec::new();
            for item in &o.list.items[index..] {
                // a single-item object never aligns
                if o.list.items.len() == 1 {
                    break;
                }

                let rendered = self.object_item(item);
                if count_lines(&rendered) > 2 {
                    break;
                }

                let cur_pos = item.pos();
                let next_pos = if index == o.list.items.len() - 1 {
                    Pos::default()
                } else {
                    o.list.items[index + 1].pos()
                };
                let prev_pos = if index == 0 {
                    Pos::default()
                } else {
                    o.list.items[index - 1].pos()
                };

                if cur_pos.line + 1 == next_pos.line {
                    aligned.push(item);
                    index += 1;
                    continue;
                }

                if cur_pos.line == prev_pos.line + 1 {
                    aligned.push(item);
                    index += 1;

                    // finish if the next item is not adjacent
                    if cur_pos.line + 1 != next_pos.line {
                        break;
                    }
                    continue;
                }

                break;
            }

            // Blank line when the items sit between other non-aligned
            // items, unless a standalone comment already provided one.
            if !commented && index != aligned.len() {
                buf.push(b'\n');
            }

            if aligned.is_empty() {
                self.prev = o.list.items[index].pos();
                let item_out = self.object_item(&o.list.items[index]);
                buf.extend(self.indent(&item_out));
                index += 1;
            } else {
                self.prev = aligned[aligned.len() - 1].pos();
                let items = self.aligned_items(&aligned);
                buf.extend(self.indent(&items));
            }

            buf.push(b'\n');
        }

        buf.push(b'}');
        buf
    }

    /// Render a run of single-line items with their keys, values and
    /// line comments padded to shared columns.
    fn aligned_items(&mut self, items: &[&ObjectItem]) -> Vec<u8> {
        let mut buf = Vec::new();

        // find the longest key and value length, needed for alignment
        let mut longest_key_len = 0;
        let mut longest_val_len = 0;
        for item in items {
            let key = item.keys.first().map_or(0, |k| k.token.text.len());
            let val = item.val.as_ref().map_or(0, |v| self.output_node(v).len());
            longest_key_len = longest_key_len.max(key);
            longest_val_len = longest_val_len.max(val);
        }

        for (i, item) in items.iter().enumerate() {
            if let Some(lead) = &item.lead_comment {
                for comment in &lead.list {
                    buf.extend_from_slice(comment.text.as_bytes());
                    buf.push(b'\n');
                }
            }

            for k in &item.keys {
                // Keys past the first can be longer than the column
                // width; they get no padding then.
                let key_len = k.token.text.len();
                buf.extend_from_slice(k.token.text.as_bytes());
                for _ in 0..(longest_key_len + 1).saturating_sub(key_len) {
                    buf.push(b' ');
                }

                // reach end of key
                if item.keys.len() == 1 {
                    buf.extend_from_slice(b"= ");
                }
            }

            if let Some(val) = &item.val {
                let val_out = self.output_node(val);
                let val_len = val_out.len();
                buf.extend(val_out);

                if let (Some(first), Some(line_comment)) = (item.keys.first(), &item.line_comment)
                {
                    if val.pos().line == first.pos().line {
                        for _ in 0..(longest_val_len + 1).saturating_sub(val_len) {
                            buf.push(b' ');
                        }
                        for comment in &line_comment.list {
                            buf.extend_from_slice(comment.text.as_bytes());
                        }
                    }
                }
            }

            // no newline after the last item
            if i != items.len() - 1 {
                buf.push(b'\n');
            }
        }

        buf
    }

    /// Render a list. Single-line when the first element shares the
    /// opening bracket's line, multi-line otherwise.
    fn list(&mut self, l: &ListType) -> Vec<u8> {
        let mut buf = vec![b'['];

        // longest literal element, for line-comment alignment
        let mut longest_line = 0;
        for item in &l.list {
            if let Node::Literal(lit) = item {
                longest_line = longest_line.max(lit.token.text.len());
            }
        }

        let len = l.list.len();
        let mut insert_space_before_item = false;
        let mut last_had_lead_comment = false;
        for (i, item) in l.list.iter().enumerate() {
            // Heredocs have unique comma placement.
            let heredoc =
                matches!(item, Node::Literal(lit) if lit.token.kind == TokenKind::Heredoc);

            if item.pos().line != l.lbrack.line {
                // multiline list, add a newline before each item
                buf.push(b'\n');
                insert_space_before_item = false;

                // A lead comment goes first.
                let mut lead_comment = false;
                if let Node::Literal(lit) = item {
                    if let Some(lead) = &lit.lead_comment {
                        lead_comment = true;

                        // Space out from the previous element, unless
                        // that element's own lead comment already did.
                        if i > 0 && !last_had_lead_comment {
                            buf.push(b'\n');
                        }

                        for comment in &lead.list {
                            buf.extend(self.indent(comment.text.as_bytes()));
                            buf.push(b'\n');
                        }
                    }
                }

                let val = self.output_node(item);
                let cur_len = val.len();
                buf.extend(self.indent(&val));

                // A heredoc's comma goes on the next line; that is the
                // only way the result reparses.
                if heredoc {
                    buf.push(b'\n');
                    buf.extend(self.indent(b","));
                } else {
                    buf.push(b',');
                }

                if let Node::Literal(lit) = item {
                    if let Some(line_comment) = &lit.line_comment {
                        buf.push(b' ');
                        for _ in 0..longest_line.saturating_sub(cur_len) {
                            buf.push(b' ');
                        }
                        for comment in &line_comment.list {
                            buf.extend_from_slice(comment.text.as_bytes());
                        }
                    }
                }

                let last_item = i == len - 1;
                if last_item {
                    buf.push(b'\n');
                }
                if lead_comment && !last_item {
                    buf.push(b'\n');
                }

                last_had_lead_comment = lead_comment;
            } else {
                if insert_space_before_item {
                    buf.push(b' ');
                    insert_space_before_item = false;
                }

                let val = self.output_node(item);
                let cur_len = val.len();
                buf.extend(val);

                // A heredoc element forces a newline so the result
                // parses.
                if heredoc {
                    buf.push(b'\n');
                }

                if i != len - 1 {
                    buf.push(b',');
                    insert_space_before_item = true;
                }

                if let Node::Literal(lit) = item {
                    if let Some(line_comment) = &lit.line_comment {
                        buf.push(b' ');
                        for _ in 0..longest_line.saturating_sub(cur_len) {
                            buf.push(b' ');
                        }
                        for comment in &line_comment.list {
                            buf.extend_from_slice(comment.text.as_bytes());
                        }
                    }
                }
            }
        }

        buf.push(b']');
        buf
    }

    /// Indent every non-empty line of `buf` by one level.
    fn indent(&self, buf: &[u8]) -> Vec<u8> {
        let prefix: Vec<u8> = if self.cfg.spaces_width == 0 {
            vec![b'\t']
        } else {
            vec![b' '; self.cfg.spaces_width]
        };

        let mut res = Vec::with_capacity(buf.len());
        let mut bol = true;
        for &c in buf {
            if bol && c != b'\n' {
                res.extend_from_slice(&prefix);
            }
            res.push(c);
            bol = c == b'\n';
        }
        res
    }
}

/// Remove the indentation in front of every marker, marker included.
pub(crate) fn unindent(buf: &[u8]) -> Vec<u8> {
    let mut res: Vec<u8> = Vec::with_capacity(buf.len());
    let mut i = 0;
    while i < buf.len() {
        let skip = buf.len() - i <= UNINDENT_MARKER.len() || !buf[i..].starts_with(UNINDENT_MARKER);
        if skip {
            res.push(buf[i]);
            i += 1;
            continue;
        }

        // We have a marker: clean out any characters between the start
        // of this line and the marker.
        while let Some(&last) = res.last() {
            if last == b'\n' {
                break;
            }
            res.pop();
        }

        i += UNINDENT_MARKER.len();
    }
    res
}

/// Tag lines 2+ of `buf` as not indentable.
fn heredoc_indent(buf: &[u8]) -> Vec<u8> {
    let mut res = Vec::with_capacity(buf.len());
    let mut bol = false;
    for &c in buf {
        if bol && c != b'\n' {
            res.extend_from_slice(UNINDENT_MARKER);
        }
        res.push(c);
        bol = c == b'\n';
    }
    res
}

/// Whether the item prints as a single line, like `obj {}`: no lead
/// comment, no assignment, and an empty object body.
fn is_single_line_object(item: &ObjectItem) -> bool {
    if item.lead_comment.is_some() {
        return false;
    }
    if item.assign.is_valid() {
        return false;
    }
    match &item.val {
        Some(Node::Object(obj)) => obj.list.items.is_empty(),
        _ => false,
    }
}

fn count_lines(buf: &[u8]) -> usize {
    1 + buf.iter().filter(|&&c| c == b'\n').count()
}
