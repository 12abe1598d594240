// ABOUTME: The tag-and-attribute predicate shared by the query and mutation engines.
// ABOUTME: Combines a tag set with an attribute filter using literal, case-sensitive matching.

use ego_tree::NodeRef;
use scraper::node::Element;
use scraper::Node;

/// The tag names a predicate accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagSet<'p> {
    One(&'p str),
    Many(&'p [&'p str]),
}

impl TagSet<'_> {
    /// True when no element name can ever match.
    pub fn is_empty(&self) -> bool {
        match self {
            TagSet::One(tag) => tag.is_empty(),
            TagSet::Many(tags) => tags.iter().all(|t| t.is_empty()),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        match self {
            TagSet::One(tag) => *tag == name,
            TagSet::Many(tags) => tags.iter().any(|t| *t == name),
        }
    }
}

/// Attribute condition applied after the tag matched.
///
/// Values are compared as whole strings: `class="a b"` does not satisfy
/// `Equals("class", "a")`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrFilter<'p> {
    /// Tag alone decides.
    None,
    /// Some attribute has this key, any value.
    Has(&'p str),
    /// Some attribute has exactly this key and value.
    Equals(&'p str, &'p str),
    /// Some attribute with this key has one of the accepted values.
    OneOf(&'p str, &'p [&'p str]),
}

impl AttrFilter<'_> {
    fn is_empty(&self) -> bool {
        match self {
            AttrFilter::None => false,
            AttrFilter::Has(key) | AttrFilter::Equals(key, _) => key.is_empty(),
            AttrFilter::OneOf(key, values) => key.is_empty() || values.is_empty(),
        }
    }

    fn matches(&self, element: &Element) -> bool {
        match *self {
            AttrFilter::None => true,
            AttrFilter::Has(key) => element.attrs().any(|(name, _)| name == key),
            AttrFilter::Equals(key, value) => element
                .attrs()
                .any(|(name, actual)| name == key && actual == value),
            AttrFilter::OneOf(key, values) => element
                .attrs()
                .any(|(name, actual)| name == key && values.iter().any(|v| *v == actual)),
        }
    }
}

/// A tag set plus an attribute filter.
///
/// An empty predicate (no usable tag, or an attribute filter missing its key
/// or accepted values) matches nothing; there is no implicit match-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Predicate<'p> {
    pub tags: TagSet<'p>,
    pub attr: AttrFilter<'p>,
}

impl<'p> Predicate<'p> {
    pub fn tag(tag: &'p str) -> Self {
        Self {
            tags: TagSet::One(tag),
            attr: AttrFilter::None,
        }
    }

    pub fn tags(tags: &'p [&'p str]) -> Self {
        Self {
            tags: TagSet::Many(tags),
            attr: AttrFilter::None,
        }
    }

    /// `<meta>` elements whose `key` attribute is one of `values`.
    pub fn meta(key: &'p str, values: &'p [&'p str]) -> Self {
        Self::tag("meta").with_attr(AttrFilter::OneOf(key, values))
    }

    pub fn with_attr(mut self, attr: AttrFilter<'p>) -> Self {
        self.attr = attr;
        self
    }

    pub fn has_attr(self, key: &'p str) -> Self {
        self.with_attr(AttrFilter::Has(key))
    }

    pub fn attr_eq(self, key: &'p str, value: &'p str) -> Self {
        self.with_attr(AttrFilter::Equals(key, value))
    }

    pub fn class(self, class: &'p str) -> Self {
        self.attr_eq("class", class)
    }

    pub fn id(self, id: &'p str) -> Self {
        self.attr_eq("id", id)
    }

    pub fn attr_type(self, kind: &'p str) -> Self {
        self.attr_eq("type", kind)
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() || self.attr.is_empty()
    }

    pub fn matches_element(&self, element: &Element) -> bool {
        !self.is_empty() && self.tags.contains(element.name()) && self.attr.matches(element)
    }

    /// Non-element nodes never match.
    pub fn matches(&self, node: NodeRef<'_, Node>) -> bool {
        match node.value() {
            Node::Element(element) => self.matches_element(element),
            _ => false,
        }
    }
}
