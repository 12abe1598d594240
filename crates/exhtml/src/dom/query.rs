// ABOUTME: Predicate-based element queries over a parsed document subtree.
// ABOUTME: Covers tag, tag+attribute, class, id, type, meta conventions, and sibling lookups.

//! Tree queries.
//!
//! Every query walks the subtree once, root included, and returns matches in
//! document order. A parent matching never stops the walk from descending
//! into it. Empty predicate components produce an empty result rather than an
//! error: "nothing to search for" and "nothing found" look the same.
//!
//! Tag names are compared exactly; documents parsed by `scraper` store HTML
//! tag names lower-cased, so pass lower-case names.

use ego_tree::NodeRef;
use scraper::{ElementRef, Node};

use super::predicate::{AttrFilter, Predicate};
use super::traverse::pre_order;

/// Returns every element under `root` (inclusive) satisfying `predicate`.
pub fn select<'a>(root: NodeRef<'a, Node>, predicate: &Predicate<'_>) -> Vec<ElementRef<'a>> {
    let mut nodes = Vec::new();
    if predicate.is_empty() {
        return nodes;
    }
    pre_order(root, |node| {
        if let Some(element) = ElementRef::wrap(node) {
            if predicate.matches_element(element.value()) {
                nodes.push(element);
            }
        }
    });
    nodes
}

/// Elements whose tag is one of `tags`.
pub fn elements_by_tag<'a>(root: NodeRef<'a, Node>, tags: &[&str]) -> Vec<ElementRef<'a>> {
    select(root, &Predicate::tags(tags))
}

/// Elements with `tag`, optionally narrowed by an attribute.
///
/// An empty `attr_name` matches on tag alone; an empty `attr_value` only
/// requires the attribute to be present; otherwise the pair must match exactly.
pub fn elements_by_tag_attr<'a>(
    root: NodeRef<'a, Node>,
    tag: &str,
    attr_name: &str,
    attr_value: &str,
) -> Vec<ElementRef<'a>> {
    let filter = match (attr_name.is_empty(), attr_value.is_empty()) {
        (true, _) => AttrFilter::None,
        (false, true) => AttrFilter::Has(attr_name),
        (false, false) => AttrFilter::Equals(attr_name, attr_value),
    };
    select(root, &Predicate::tag(tag).with_attr(filter))
}

/// Elements with `tag` that carry an attribute named `attr`, whatever its value.
pub fn tag_with_attr<'a>(root: NodeRef<'a, Node>, tag: &str, attr: &str) -> Vec<ElementRef<'a>> {
    select(root, &Predicate::tag(tag).has_attr(attr))
}

/// `<div>` elements carrying exactly `attr_name="attr_value"`.
pub fn div_with_attr<'a>(
    root: NodeRef<'a, Node>,
    attr_name: &str,
    attr_value: &str,
) -> Vec<ElementRef<'a>> {
    exact_attr(root, "div", attr_name, attr_value)
}

/// Elements with `tag` whose `class` attribute is exactly `class`.
///
/// This is a whole-string comparison: `class="a b"` does not match `"a"`.
pub fn elements_by_tag_and_class<'a>(
    root: NodeRef<'a, Node>,
    tag: &str,
    class: &str,
) -> Vec<ElementRef<'a>> {
    exact_attr(root, tag, "class", class)
}

pub fn elements_by_tag_and_id<'a>(
    root: NodeRef<'a, Node>,
    tag: &str,
    id: &str,
) -> Vec<ElementRef<'a>> {
    exact_attr(root, tag, "id", id)
}

pub fn elements_by_tag_and_type<'a>(
    root: NodeRef<'a, Node>,
    tag: &str,
    kind: &str,
) -> Vec<ElementRef<'a>> {
    exact_attr(root, tag, "type", kind)
}

fn exact_attr<'a>(
    root: NodeRef<'a, Node>,
    tag: &str,
    key: &str,
    value: &str,
) -> Vec<ElementRef<'a>> {
    if value.is_empty() {
        return Vec::new();
    }
    select(root, &Predicate::tag(tag).attr_eq(key, value))
}

/// `<meta name="...">` elements, e.g. `<meta name="dateModified" content="2020/09/29 11:27">`.
pub fn metas_by_name<'a>(root: NodeRef<'a, Node>, values: &[&str]) -> Vec<ElementRef<'a>> {
    select(root, &Predicate::meta("name", values))
}

/// `<meta itemprop="...">` elements.
pub fn metas_by_itemprop<'a>(root: NodeRef<'a, Node>, values: &[&str]) -> Vec<ElementRef<'a>> {
    select(root, &Predicate::meta("itemprop", values))
}

/// `<meta property="...">` elements, e.g. Open Graph tags.
pub fn metas_by_property<'a>(root: NodeRef<'a, Node>, values: &[&str]) -> Vec<ElementRef<'a>> {
    select(root, &Predicate::meta("property", values))
}

/// The non-empty `content` of the first meta element whose `key` attribute is
/// one of `values`.
pub fn meta_content<'a>(root: NodeRef<'a, Node>, key: &str, values: &[&str]) -> Option<&'a str> {
    select(root, &Predicate::meta(key, values))
        .into_iter()
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
}

/// Every node (of any kind) that has a following sibling. The node itself is
/// returned, not the sibling.
pub fn elements_next(root: NodeRef<'_, Node>) -> Vec<NodeRef<'_, Node>> {
    let mut nodes = Vec::new();
    pre_order(root, |node| {
        if node.next_sibling().is_some() {
            nodes.push(node);
        }
    });
    nodes
}

/// For each element named `tag`, its following sibling (which may be a text
/// node).
pub fn elements_next_by_tag<'a>(root: NodeRef<'a, Node>, tag: &str) -> Vec<NodeRef<'a, Node>> {
    let mut nodes = Vec::new();
    let predicate = Predicate::tag(tag);
    if predicate.is_empty() {
        return nodes;
    }
    pre_order(root, |node| {
        if predicate.matches(node) {
            if let Some(sibling) = node.next_sibling() {
                nodes.push(sibling);
            }
        }
    });
    nodes
}
