//! Serializes a [`Document`] back into the bytes sent on the wire.
//!
//! A child element is only given an explicit `xmlns="..."` attribute when
//! its namespace differs from its parent's — the same minimal-redeclaration
//! approach a hand-rolled writer takes to avoid repeating `xmlns` on every
//! descendant of a `<resData>` block already in that namespace.

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use super::{Document, Element, Node};
use super::parse::XmlError;

/// Serialize a document to its UTF-8 XML bytes, with no leading XML
/// declaration (the wire framer is solely responsible for the length
/// prefix; EPP frames do not require a `<?xml ...?>` prologue, and omitting
/// it keeps every emitted frame byte-for-byte reproducible from its
/// [`Document`] alone).
///
/// # Errors
/// Returns [`XmlError::Parse`] if the underlying writer fails, which only
/// happens on an I/O error writing into the in-memory buffer (never, in
/// practice, since `Vec<u8>` writes cannot fail).
pub fn serialize_document(doc: &Document) -> Result<Vec<u8>, XmlError> {
    let mut writer = Writer::new(Vec::new());
    write_element(&mut writer, &doc.root, None)?;
    Ok(writer.into_inner())
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    el: &Element,
    parent_ns: Option<&str>,
) -> Result<(), XmlError> {
    let mut start = BytesStart::new(el.name.local.as_str());
    if el.name.ns.as_deref() != parent_ns {
        if let Some(ns) = &el.name.ns {
            start.push_attribute(("xmlns", ns.as_str()));
        }
    }
    for (name, value) in &el.attrs {
        start.push_attribute((name.local.as_str(), value.as_str()));
    }

    if el.children.is_empty() {
        writer.write_event(Event::Empty(start)).map_err(XmlError::from)?;
        return Ok(());
    }

    writer.write_event(Event::Start(start)).map_err(XmlError::from)?;
    for child in &el.children {
        match child {
            Node::Element(child) => write_element(writer, child, el.name.ns.as_deref())?,
            Node::Text(text) => {
                writer
                    .write_event(Event::Text(BytesText::new(text)))
                    .map_err(XmlError::from)?;
            }
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(el.name.local.as_str())))
        .map_err(XmlError::from)?;
    Ok(())
}
