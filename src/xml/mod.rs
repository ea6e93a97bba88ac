//! A minimal owned XML document tree.
//!
//! EPP frames are not decoded into typed structs because the core never
//! knows the shape of `resData`, `msgQ`, or `extension` payloads — those are
//! opaque to the engine and supplied pre-built by handler callbacks. What
//! the engine does need, repeatedly, is: parse a frame
//! into something it can pattern-match on (`hello` vs `command` vs
//! `extension`), walk down to an inner element to read a namespace URI, and
//! splice handler-supplied elements into a freshly built response. A small
//! namespace-aware tree serves all three needs without forcing handlers into
//! any particular serde shape.

pub mod build;
pub mod parse;

pub use parse::{XmlError, parse_document};

/// The EPP namespace carried on the root `<epp>` element.
pub const EPP_NS: &str = "urn:ietf:params:xml:ns:epp-1.0";

/// A namespace-qualified element or attribute name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// The local (unprefixed) name, e.g. `"check"`.
    pub local: String,
    /// The resolved namespace URI, if any.
    pub ns: Option<String>,
}

impl QName {
    /// Build a qualified name.
    #[must_use]
    pub fn new(local: impl Into<String>, ns: Option<impl Into<String>>) -> Self {
        Self {
            local: local.into(),
            ns: ns.map(Into::into),
        }
    }

    /// Build a name with no namespace.
    #[must_use]
    pub fn unqualified(local: impl Into<String>) -> Self { Self { local: local.into(), ns: None } }
}

/// An owned XML element: a name, its attributes, and its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// The element's qualified name.
    pub name: QName,
    /// Attributes in document order, as (name, value) pairs.
    pub attrs: Vec<(QName, String)>,
    /// Child nodes in document order.
    pub children: Vec<Node>,
}

/// A child node: either a nested element or a text run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A nested element.
    Element(Element),
    /// Text content (whitespace-only runs are dropped during parsing; CDATA
    /// sections are materialized as plain text).
    Text(String),
}

/// A parsed document: just its root element, since EPP frames never carry
/// processing instructions or multiple top-level elements that matter here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// The document's single root element, `<epp>` for every frame this
    /// engine handles or produces.
    pub root: Element,
}

impl Element {
    /// Construct an element with no attributes and no children.
    #[must_use]
    pub fn new(name: QName) -> Self { Self { name, attrs: Vec::new(), children: Vec::new() } }

    /// Builder-style attribute addition.
    #[must_use]
    pub fn with_attr(mut self, name: QName, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    /// Builder-style child addition.
    #[must_use]
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append a child in place.
    pub fn push_child(&mut self, child: impl Into<Node>) { self.children.push(child.into()); }

    /// Iterate over direct child elements, skipping text nodes.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// The first direct child element, if any.
    #[must_use]
    pub fn first_child_element(&self) -> Option<&Element> { self.child_elements().next() }

    /// The first direct child element whose local name matches, regardless
    /// of namespace.
    #[must_use]
    pub fn find_child(&self, local: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.name.local == local)
    }

    /// Concatenated text content of direct text-node children.
    #[must_use]
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }
}

impl From<Element> for Node {
    fn from(e: Element) -> Self { Self::Element(e) }
}

impl From<String> for Node {
    fn from(t: String) -> Self { Self::Text(t) }
}

impl From<&str> for Node {
    fn from(t: &str) -> Self { Self::Text(t.to_owned()) }
}
