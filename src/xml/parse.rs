//! Frame Parser/Validator.
//!
//! Parses a raw frame payload into the owned [`Document`] tree. Namespace
//! resolution happens here, once, using [`quick_xml`]'s namespace-aware
//! reader — downstream code (the dispatcher's object/extension repertoire
//! checks) only ever compares already-resolved URIs, never prefixes.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use thiserror::Error;

use super::{Document, Element, Node, QName};

/// Failure to parse a frame payload as XML.
///
/// Schema validation is a distinct, pluggable step (see
/// [`crate::dispatch::SchemaValidator`]) so that an implementation can start
/// with an always-pass validator and plug in a real one later without
/// touching the parser.
#[derive(Debug, Error)]
pub enum XmlError {
    /// The payload was not well-formed XML.
    #[error("XML parse error")]
    Parse(#[source] quick_xml::Error),
    /// The payload was well-formed but structurally unusable (no root
    /// element, or an end tag with no matching start tag).
    #[error("XML parse error")]
    Malformed(&'static str),
    /// Schema validation rejected an otherwise well-formed document.
    #[error("XML schema error")]
    SchemaViolation,
}

impl From<quick_xml::Error> for XmlError {
    fn from(e: quick_xml::Error) -> Self { Self::Parse(e) }
}

impl From<quick_xml::events::attributes::AttrError> for XmlError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Self::Parse(quick_xml::Error::InvalidAttr(e))
    }
}

struct OpenElement {
    name: QName,
    attrs: Vec<(QName, String)>,
    children: Vec<Node>,
}

/// Parse a frame payload into a [`Document`].
///
/// Whitespace-only text nodes are dropped; CDATA sections are materialized
/// as plain text.
///
/// # Errors
/// Returns [`XmlError::Parse`] or [`XmlError::Malformed`] if `bytes` is not
/// a well-formed single-rooted XML document.
pub fn parse_document(bytes: &[u8]) -> Result<Document, XmlError> {
    let mut reader = NsReader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<OpenElement> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let (ns, event) = reader.read_resolved_event_into(&mut buf)?;
        match event {
            Event::Start(start) => {
                let name = resolve_name(ns, &start)?;
                let attrs = resolve_attrs(&reader, &start)?;
                stack.push(OpenElement { name, attrs, children: Vec::new() });
            }
            Event::Empty(start) => {
                let name = resolve_name(ns, &start)?;
                let attrs = resolve_attrs(&reader, &start)?;
                let element = Element { name, attrs, children: Vec::new() };
                place(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let open = stack.pop().ok_or(XmlError::Malformed("unmatched end tag"))?;
                let element = Element {
                    name: open.name,
                    attrs: open.attrs,
                    children: open.children,
                };
                place(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let decoded = text.unescape()?.into_owned();
                if !decoded.trim().is_empty() {
                    if let Some(top) = stack.last_mut() {
                        top.children.push(Node::Text(decoded));
                    }
                }
            }
            Event::CData(cdata) => {
                let decoded = String::from_utf8_lossy(cdata.as_ref()).into_owned();
                if let Some(top) = stack.last_mut() {
                    top.children.push(Node::Text(decoded));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(XmlError::Malformed("unclosed element at end of document"));
    }
    root.map(|root| Document { root }).ok_or(XmlError::Malformed("document has no root element"))
}

fn place(
    stack: &mut [OpenElement],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Element(element));
    } else if root.is_none() {
        *root = Some(element);
    } else {
        return Err(XmlError::Malformed("more than one top-level element"));
    }
    Ok(())
}

fn resolve_name(ns: ResolveResult, start: &BytesStart<'_>) -> Result<QName, XmlError> {
    let local = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let ns = match ns {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        ResolveResult::Unbound | ResolveResult::Unknown(_) => None,
    };
    Ok(QName::new(local, ns))
}

fn resolve_attrs(
    reader: &NsReader<&[u8]>,
    start: &BytesStart<'_>,
) -> Result<Vec<(QName, String)>, XmlError> {
    let mut out = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        // Namespace declarations (`xmlns`, `xmlns:foo`) are resolution
        // machinery, not data; they are never meaningful as attribute
        // values to dispatcher or handler code.
        if attr.key.as_ref() == b"xmlns" || attr.key.prefix().map(|p| p.as_ref()) == Some(b"xmlns")
        {
            continue;
        }
        let (ns, local) = reader.resolve_attribute(attr.key);
        let local = String::from_utf8_lossy(local.as_ref()).into_owned();
        let ns = match ns {
            ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
            ResolveResult::Unbound | ResolveResult::Unknown(_) => None,
        };
        let value = attr.unescape_value()?.into_owned();
        out.push((QName::new(local, ns), value));
    }
    Ok(out)
}
