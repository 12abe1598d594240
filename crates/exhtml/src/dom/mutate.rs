// ABOUTME: In-place removal of elements matching a tag (optionally class or attribute) predicate.
// ABOUTME: Detaches neighbours of the visited node so the ongoing traversal is never disturbed.

//! Tree mutation.
//!
//! Removal runs two walks over the subtree. The first detaches, for every
//! visited node, each matching next sibling; the second detaches each matching
//! first child. The visited node itself is never detached, which keeps the
//! walk valid while the tree changes under it. Together the passes remove
//! every matching element strictly below `root`; `root` itself and anything
//! outside its subtree are left alone.

use ego_tree::{NodeId, Tree};
use scraper::Node;

use super::predicate::{AttrFilter, Predicate};
use super::traverse::for_each_node_mut;

/// Removes every element below `root` whose tag is one of `tags`.
pub fn remove_by_tag(tree: &mut Tree<Node>, root: NodeId, tags: &[&str]) {
    remove_matching(tree, root, &Predicate::tags(tags));
}

/// Removes `tag` elements, restricted to an exact `class` value when one is given.
pub fn remove_by_tag_class(tree: &mut Tree<Node>, root: NodeId, tag: &str, class: Option<&str>) {
    let predicate = match class.filter(|c| !c.is_empty()) {
        Some(class) => Predicate::tag(tag).class(class),
        None => Predicate::tag(tag),
    };
    remove_matching(tree, root, &predicate);
}

/// Removes `tag` elements, restricted to an exact attribute pair when one is given.
///
/// An attribute with an empty key means "no filter"; an empty value is
/// compared literally.
pub fn remove_by_tag_attr(
    tree: &mut Tree<Node>,
    root: NodeId,
    tag: &str,
    attr: Option<(&str, &str)>,
) {
    let filter = match attr {
        Some((key, value)) if !key.is_empty() => AttrFilter::Equals(key, value),
        _ => AttrFilter::None,
    };
    remove_matching(tree, root, &Predicate::tag(tag).with_attr(filter));
}

/// Removes every element strictly below `root` that satisfies `predicate`.
pub fn remove_matching(tree: &mut Tree<Node>, root: NodeId, predicate: &Predicate<'_>) {
    if predicate.is_empty() {
        return;
    }

    for_each_node_mut(tree, root, |tree, id| {
        if id == root {
            return;
        }
        while let Some(sibling) = matching_next_sibling(tree, id, predicate) {
            detach(tree, sibling);
        }
    });

    for_each_node_mut(tree, root, |tree, id| {
        while let Some(child) = matching_first_child(tree, id, predicate) {
            detach(tree, child);
        }
    });
}

fn matching_next_sibling(tree: &Tree<Node>, id: NodeId, predicate: &Predicate<'_>) -> Option<NodeId> {
    let sibling = tree.get(id)?.next_sibling()?;
    predicate.matches(sibling).then(|| sibling.id())
}

fn matching_first_child(tree: &Tree<Node>, id: NodeId, predicate: &Predicate<'_>) -> Option<NodeId> {
    let child = tree.get(id)?.first_child()?;
    predicate.matches(child).then(|| child.id())
}

fn detach(tree: &mut Tree<Node>, id: NodeId) {
    if let Some(mut node) = tree.get_mut(id) {
        node.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scraper::Html;

    fn fragment_root(doc: &Html) -> NodeId {
        doc.root_element().id()
    }

    #[test]
    fn test_remove_consecutive_and_leading() {
        let mut doc = Html::parse_fragment("<p><br>a<br><br>b<br></p><br>");
        let root = fragment_root(&doc);
        remove_by_tag(&mut doc.tree, root, &["br"]);
        assert_eq!(doc.root_element().inner_html(), "<p>ab</p>");
    }

    #[test]
    fn test_remove_by_class_is_literal() {
        let mut doc = Html::parse_fragment(
            r#"<div><p class="ad">1</p><p class="ad big">2</p><p>3</p><p class="ad">4</p></div>"#,
        );
        let root = fragment_root(&doc);
        remove_by_tag_class(&mut doc.tree, root, "p", Some("ad"));
        assert_eq!(
            doc.root_element().inner_html(),
            r#"<div><p class="ad big">2</p><p>3</p></div>"#
        );
    }

    #[test]
    fn test_remove_by_class_none_means_tag_only() {
        let mut doc = Html::parse_fragment(r#"<div><span class="x">1</span><span>2</span>t</div>"#);
        let root = fragment_root(&doc);
        remove_by_tag_class(&mut doc.tree, root, "span", Some(""));
        assert_eq!(doc.root_element().inner_html(), "<div>t</div>");
    }

    #[test]
    fn test_remove_by_attr_pair() {
        let mut doc = Html::parse_fragment(
            r#"<ul><li data-ad="1">a</li><li data-ad="0">b</li><li>c</li></ul>"#,
        );
        let root = fragment_root(&doc);
        remove_by_tag_attr(&mut doc.tree, root, "li", Some(("data-ad", "1")));
        assert_eq!(
            doc.root_element().inner_html(),
            r#"<ul><li data-ad="0">b</li><li>c</li></ul>"#
        );
    }

    #[test]
    fn test_empty_tag_is_noop() {
        let mut doc = Html::parse_fragment("<div><br></div>");
        let before = doc.root_element().inner_html();
        let root = fragment_root(&doc);
        remove_by_tag(&mut doc.tree, root, &[]);
        remove_by_tag_class(&mut doc.tree, root, "", Some("x"));
        assert_eq!(doc.root_element().inner_html(), before);
    }

    #[test]
    fn test_root_and_outside_siblings_untouched() {
        let mut doc = Html::parse_fragment("<div><br>x</div><br>");
        let div = doc
            .root_element()
            .children()
            .find(|n| n.value().is_element())
            .unwrap()
            .id();
        remove_by_tag(&mut doc.tree, div, &["br", "div"]);
        assert_eq!(doc.root_element().inner_html(), "<div>x</div><br>");
    }
}
