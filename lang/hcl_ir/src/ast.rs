//! Abstract syntax tree for HCL configuration sources.
//!
//! The tree is fully owned data: every node carries the tokens and
//! positions it was built from, and comment groups stay attached so a
//! printer can reproduce them.

use crate::pos::Pos;
use crate::token::{Token, Value};

/// A single parsed source file.
///
/// `comments` holds every comment group seen while scanning, in source
/// order, including the groups also attached to nodes as lead or line
/// comments.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct File {
    pub node: ObjectList,
    pub comments: Vec<CommentGroup>,
}

impl File {
    pub fn pos(&self) -> Pos {
        self.node.pos()
    }
}

/// A list of object items. A file's top level is an `ObjectList`, as is
/// the body of every nested object.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct ObjectList {
    pub items: Vec<ObjectItem>,
}

impl ObjectList {
    pub fn add(&mut self, item: ObjectItem) {
        self.items.push(item);
    }

    /// Filter out the items whose keys start with the given prefix,
    /// compared case-insensitively against the decoded key values.
    ///
    /// The returned items have the matched prefix stripped off, which
    /// may leave zero-length key lists. No matches yields an empty
    /// list.
    pub fn filter(&self, keys: &[&str]) -> ObjectList {
        let mut result = ObjectList::default();
        'items: for item in &self.items {
            if item.keys.len() < keys.len() {
                continue;
            }

            for (key, want) in item.keys.iter().zip(keys) {
                let got = match key.token.value() {
                    Ok(Value::String(s)) => s,
                    _ => continue 'items,
                };
                if !got.eq_ignore_ascii_case(want) {
                    continue 'items;
                }
            }

            let mut new_item = item.clone();
            new_item.keys.drain(..keys.len());
            result.add(new_item);
        }
        result
    }

    /// Items that still carry keys, i.e. further nested objects. Meant
    /// to be used after `filter`.
    pub fn children(&self) -> ObjectList {
        ObjectList {
            items: self
                .items
                .iter()
                .filter(|item| !item.keys.is_empty())
                .cloned()
                .collect(),
        }
    }

    /// Items that are direct element assignments (no keys left). Meant
    /// to be used after `filter`.
    pub fn elem(&self) -> ObjectList {
        ObjectList {
            items: self
                .items
                .iter()
                .filter(|item| item.keys.is_empty())
                .cloned()
                .collect(),
        }
    }

    pub fn pos(&self) -> Pos {
        self.items.first().map(ObjectItem::pos).unwrap_or_default()
    }
}

/// An item in an object list: one or more keys followed by an assigned
/// value or a nested object body.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct ObjectItem {
    /// One key for an assignment; more for a nested object, in which
    /// case `assign` stays invalid.
    pub keys: Vec<ObjectKey>,
    /// Position of `=`, if any.
    pub assign: Pos,
    /// The value. With more than one key this is always an object.
    pub val: Option<Node>,
    pub lead_comment: Option<CommentGroup>,
    pub line_comment: Option<CommentGroup>,
}

impl ObjectItem {
    /// Position of the first key, or the invalid position for a
    /// key-less item.
    pub fn pos(&self) -> Pos {
        self.keys.first().map(ObjectKey::pos).unwrap_or_default()
    }
}

/// An object key: an identifier or a string literal.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct ObjectKey {
    pub token: Token,
}

impl ObjectKey {
    pub fn pos(&self) -> Pos {
        self.token.pos.clone()
    }
}

/// A literal of basic type: NUMBER, FLOAT, BOOL, STRING or HEREDOC.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct LiteralType {
    pub token: Token,
    /// Comment attachment, only populated for list elements.
    pub lead_comment: Option<CommentGroup>,
    pub line_comment: Option<CommentGroup>,
}

impl LiteralType {
    pub fn pos(&self) -> Pos {
        self.token.pos.clone()
    }
}

/// A `[ ... ]` list with its elements in lexical order.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct ListType {
    pub lbrack: Pos,
    pub rbrack: Pos,
    pub list: Vec<Node>,
}

impl ListType {
    pub fn add(&mut self, node: Node) {
        self.list.push(node);
    }

    pub fn pos(&self) -> Pos {
        self.lbrack.clone()
    }
}

/// A `{ ... }` object body.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct ObjectType {
    pub lbrace: Pos,
    pub rbrace: Pos,
    pub list: ObjectList,
}

impl ObjectType {
    pub fn pos(&self) -> Pos {
        self.lbrace.clone()
    }
}

/// A value position in the tree: item values and list elements.
#[derive(Clone, PartialEq, Debug)]
pub enum Node {
    Literal(LiteralType),
    List(ListType),
    Object(ObjectType),
}

impl Node {
    pub fn pos(&self) -> Pos {
        match self {
            Node::Literal(n) => n.pos(),
            Node::List(n) => n.pos(),
            Node::Object(n) => n.pos(),
        }
    }
}

/// A single `#`, `//` or `/* ... */` comment.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Comment {
    /// Position of the leading `/` or `#`.
    pub start: Pos,
    /// Raw text, including the comment markers.
    pub text: String,
}

impl Comment {
    pub fn pos(&self) -> Pos {
        self.start.clone()
    }
}

/// A sequence of comments with no other tokens and no empty lines
/// between them.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct CommentGroup {
    /// Never empty.
    pub list: Vec<Comment>,
}

impl CommentGroup {
    pub fn pos(&self) -> Pos {
        self.list.first().map(Comment::pos).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;
    use pretty_assertions::assert_eq;

    fn string_key(text: &str) -> ObjectKey {
        ObjectKey {
            token: Token::new(TokenKind::String, text),
        }
    }

    fn item_with_keys(keys: Vec<ObjectKey>) -> ObjectItem {
        ObjectItem {
            keys,
            ..ObjectItem::default()
        }
    }

    #[test]
    fn test_filter_strips_prefix() {
        let input = ObjectList {
            items: vec![item_with_keys(vec![string_key(r#""foo""#)])],
        };
        let expected = ObjectList {
            items: vec![item_with_keys(vec![])],
        };
        assert_eq!(input.filter(&["foo"]), expected);
    }

    #[test]
    fn test_filter_keeps_remaining_keys() {
        let input = ObjectList {
            items: vec![
                item_with_keys(vec![string_key(r#""foo""#), string_key(r#""bar""#)]),
                item_with_keys(vec![string_key(r#""baz""#)]),
            ],
        };
        let expected = ObjectList {
            items: vec![item_with_keys(vec![string_key(r#""bar""#)])],
        };
        assert_eq!(input.filter(&["foo"]), expected);
    }

    #[test]
    fn test_filter_case_insensitive() {
        let input = ObjectList {
            items: vec![item_with_keys(vec![string_key(r#""FOO""#)])],
        };
        assert_eq!(input.filter(&["foo"]).items.len(), 1);
    }

    #[test]
    fn test_children_and_elem() {
        let list = ObjectList {
            items: vec![
                item_with_keys(vec![string_key(r#""a""#)]),
                item_with_keys(vec![]),
            ],
        };
        assert_eq!(list.children().items.len(), 1);
        assert_eq!(list.elem().items.len(), 1);
    }

    #[test]
    fn test_item_pos_without_keys_is_invalid() {
        assert!(!ObjectItem::default().pos().is_valid());
    }
}
