// ABOUTME: Depth-first pre/post visitors shared by every tree query and mutation.
// ABOUTME: Both walks are iterative, so document depth is bounded by the heap, not the stack.

use ego_tree::iter::Edge;
use ego_tree::{NodeId, NodeRef, Tree};

/// Visits every node under `root` (inclusive) exactly once.
///
/// `pre` runs on entry, before any child; `post` runs on exit, after the last
/// child. Children are visited in stored sibling order.
pub fn for_each_node<'a, T: 'a>(
    root: NodeRef<'a, T>,
    mut pre: impl FnMut(NodeRef<'a, T>),
    mut post: impl FnMut(NodeRef<'a, T>),
) {
    for edge in root.traverse() {
        match edge {
            Edge::Open(node) => pre(node),
            Edge::Close(node) => post(node),
        }
    }
}

/// Pre-order only shorthand for [`for_each_node`].
pub fn pre_order<'a, T: 'a>(root: NodeRef<'a, T>, pre: impl FnMut(NodeRef<'a, T>)) {
    for_each_node(root, pre, |_| {});
}

/// Pre-order walk that hands the callback mutable access to the tree.
///
/// The next node is computed after the callback returns, so detaching the
/// visited node's next sibling or first child is safe: the walk simply follows
/// the new shape. The callback must not detach the node it is visiting. The
/// walk never leaves the subtree rooted at `root`.
pub fn for_each_node_mut<T>(
    tree: &mut Tree<T>,
    root: NodeId,
    mut pre: impl FnMut(&mut Tree<T>, NodeId),
) {
    let mut current = Some(root);
    while let Some(id) = current {
        pre(tree, id);
        current = next_in_pre_order(tree, root, id);
    }
}

fn next_in_pre_order<T>(tree: &Tree<T>, root: NodeId, id: NodeId) -> Option<NodeId> {
    let node = tree.get(id)?;
    if let Some(child) = node.first_child() {
        return Some(child.id());
    }

    let mut cursor = node;
    loop {
        if cursor.id() == root {
            return None;
        }
        if let Some(sibling) = cursor.next_sibling() {
            return Some(sibling.id());
        }
        cursor = cursor.parent()?;
    }
}
