//! Standalone-comment partition.
//!
//! The parser records every comment group in `File::comments` and also
//! attaches some of them to nodes as lead or line comments. The printer
//! emits attached groups next to their nodes, so everything left over
//! is "standalone" and has to be interleaved by position.

use hcl_ir::{walk, CommentGroup, File, NodeRef, Pos, Visitor};
use rustc_hash::FxHashMap;

/// All comment groups of `file` that are not attached to any node, in
/// source order.
pub(crate) fn standalone_comments(file: &File) -> Vec<CommentGroup> {
    let mut by_pos: FxHashMap<Pos, CommentGroup> = FxHashMap::default();
    for group in &file.comments {
        by_pos.insert(group.pos(), group.clone());
    }

    let mut filter = AttachedFilter { by_pos };
    walk(NodeRef::File(file), &mut filter);

    let mut groups: Vec<CommentGroup> = filter.by_pos.into_values().collect();
    groups.sort_by_key(|g| {
        let pos = g.pos();
        (pos.offset, pos.line)
    });
    groups
}

/// Removes every lead/line-attached comment from the position map,
/// leaving only the standalone groups.
struct AttachedFilter {
    by_pos: FxHashMap<Pos, CommentGroup>,
}

impl AttachedFilter {
    fn remove_group(&mut self, group: Option<&CommentGroup>) {
        if let Some(group) = group {
            for comment in &group.list {
                self.by_pos.remove(&comment.pos());
            }
        }
    }
}

impl Visitor for AttachedFilter {
    fn enter(&mut self, node: NodeRef<'_>) -> bool {
        match node {
            NodeRef::Literal(lit) => {
                self.remove_group(lit.lead_comment.as_ref());
                self.remove_group(lit.line_comment.as_ref());
            }
            NodeRef::ObjectItem(item) => {
                self.remove_group(item.lead_comment.as_ref());
                self.remove_group(item.line_comment.as_ref());
            }
            _ => {}
        }
        true
    }
}
