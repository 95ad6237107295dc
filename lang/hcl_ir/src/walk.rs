//! Depth-first AST traversal.
//!
//! Two variants: a borrowing walk for read-only passes (the printer's
//! comment collection), and an in-place mutating walk for rewrites.
//! Both visit a node, descend into its children when `enter` allows it,
//! and then call `leave` once the subtree is done.

use crate::ast::{
    File, ListType, LiteralType, Node, ObjectItem, ObjectKey, ObjectList, ObjectType,
};

/// A borrowed view of any tree node.
#[derive(Copy, Clone, Debug)]
pub enum NodeRef<'a> {
    File(&'a File),
    ObjectList(&'a ObjectList),
    ObjectItem(&'a ObjectItem),
    ObjectKey(&'a ObjectKey),
    Literal(&'a LiteralType),
    List(&'a ListType),
    Object(&'a ObjectType),
}

/// Read-only visitor. `enter` gates descent into the node's children;
/// `leave` fires after the children of every entered node.
pub trait Visitor {
    fn enter(&mut self, node: NodeRef<'_>) -> bool;
    fn leave(&mut self) {}
}

/// Walk `node` in depth-first order, children in lexical field order.
pub fn walk(node: NodeRef<'_>, v: &mut impl Visitor) {
    if !v.enter(node) {
        return;
    }

    match node {
        NodeRef::File(n) => {
            walk(NodeRef::ObjectList(&n.node), v);
        }
        NodeRef::ObjectList(n) => {
            for item in &n.items {
                walk(NodeRef::ObjectItem(item), v);
            }
        }
        NodeRef::ObjectItem(n) => {
            for key in &n.keys {
                walk(NodeRef::ObjectKey(key), v);
            }
            if let Some(val) = &n.val {
                walk(node_ref(val), v);
            }
        }
        NodeRef::List(n) => {
            for elem in &n.list {
                walk(node_ref(elem), v);
            }
        }
        NodeRef::Object(n) => {
            walk(NodeRef::ObjectList(&n.list), v);
        }
        // Leaves
        NodeRef::ObjectKey(_) | NodeRef::Literal(_) => {}
    }

    v.leave();
}

fn node_ref(node: &Node) -> NodeRef<'_> {
    match node {
        Node::Literal(n) => NodeRef::Literal(n),
        Node::List(n) => NodeRef::List(n),
        Node::Object(n) => NodeRef::Object(n),
    }
}

/// A mutable view of any tree node.
#[derive(Debug)]
pub enum NodeMut<'a> {
    File(&'a mut File),
    ObjectList(&'a mut ObjectList),
    ObjectItem(&'a mut ObjectItem),
    ObjectKey(&'a mut ObjectKey),
    Literal(&'a mut LiteralType),
    List(&'a mut ListType),
    Object(&'a mut ObjectType),
}

/// Rewriting visitor. `enter_mut` may edit the node in place before
/// descent.
pub trait VisitorMut {
    fn enter_mut(&mut self, node: NodeMut<'_>) -> bool;
    fn leave(&mut self) {}
}

/// Walk `node` depth-first, allowing in-place rewrites.
pub fn walk_mut(node: NodeMut<'_>, v: &mut impl VisitorMut) {
    // The borrow has to be re-derived for descent, so take the variant
    // apart up front.
    match node {
        NodeMut::File(n) => {
            if !v.enter_mut(NodeMut::File(&mut *n)) {
                return;
            }
            walk_mut(NodeMut::ObjectList(&mut n.node), v);
        }
        NodeMut::ObjectList(n) => {
            if !v.enter_mut(NodeMut::ObjectList(&mut *n)) {
                return;
            }
            for item in &mut n.items {
                walk_mut(NodeMut::ObjectItem(item), v);
            }
        }
        NodeMut::ObjectItem(n) => {
            if !v.enter_mut(NodeMut::ObjectItem(&mut *n)) {
                return;
            }
            for key in &mut n.keys {
                walk_mut(NodeMut::ObjectKey(key), v);
            }
            if let Some(val) = &mut n.val {
                walk_mut(node_mut(val), v);
            }
        }
        NodeMut::List(n) => {
            if !v.enter_mut(NodeMut::List(&mut *n)) {
                return;
            }
            for elem in &mut n.list {
                walk_mut(node_mut(elem), v);
            }
        }
        NodeMut::Object(n) => {
            if !v.enter_mut(NodeMut::Object(&mut *n)) {
                return;
            }
            walk_mut(NodeMut::ObjectList(&mut n.list), v);
        }
        NodeMut::ObjectKey(n) => {
            if !v.enter_mut(NodeMut::ObjectKey(&mut *n)) {
                return;
            }
        }
        NodeMut::Literal(n) => {
            if !v.enter_mut(NodeMut::Literal(&mut *n)) {
                return;
            }
        }
    }

    v.leave();
}

fn node_mut(node: &mut Node) -> NodeMut<'_> {
    match node {
        Node::Literal(n) => NodeMut::Literal(n),
        Node::List(n) => NodeMut::List(n),
        Node::Object(n) => NodeMut::Object(n),
    }
}
