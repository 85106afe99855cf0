//! XML reader and writer for [`Document`].
//!
//! Only elements and their attributes are significant.  Text content,
//! comments, CDATA, doctype and processing instructions are skipped when
//! reading and never produced when writing.
//!
//! Output is indented two spaces per level and every element with no
//! children is written self-closing, so two serializations of equal trees
//! are byte-identical and diff cleanly.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use super::{Document, DocumentError, NodeId};

/// Parses `text` into a [`Document`].
///
/// The root element may carry any tag; checking it against
/// [`super::LAYOUT_ROOT`] is the caller's job.
///
/// # Errors
///
/// Returns [`DocumentError::Xml`] for text that is not well-formed,
/// [`DocumentError::Empty`] when no element is present,
/// [`DocumentError::Unbalanced`] when the text ends inside an element, and
/// [`DocumentError::TrailingContent`] for a second top-level element.
pub fn parse(text: &str) -> Result<Document, DocumentError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut document: Option<Document> = None;
    let mut open: Vec<NodeId> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let id = open_element(&mut document, &open, &start)?;
                open.push(id);
            }
            Event::Empty(start) => {
                open_element(&mut document, &open, &start)?;
            }
            Event::End(_) => {
                open.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let document = document.ok_or(DocumentError::Empty)?;
    if let Some(&id) = open.last() {
        return Err(DocumentError::Unbalanced(document.node(id).tag().to_string()));
    }
    Ok(document)
}

/// Serializes `document` to indented XML text with a UTF-8 declaration.
///
/// # Errors
///
/// Returns [`DocumentError::Write`] or [`DocumentError::Xml`] if the
/// underlying writer fails.
pub fn write(document: &Document) -> Result<String, DocumentError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    write_node(&mut writer, document, document.root())?;
    String::from_utf8(writer.into_inner()).map_err(|e| DocumentError::Encoding(e.to_string()))
}

fn open_element(
    document: &mut Option<Document>,
    open: &[NodeId],
    start: &BytesStart<'_>,
) -> Result<NodeId, DocumentError> {
    let tag = decode(start.name().as_ref())?;

    let (doc, id) = match document {
        Some(doc) => {
            let parent = open
                .last()
                .copied()
                .ok_or_else(|| DocumentError::TrailingContent(tag.clone()))?;
            let id = doc.append_child(parent, &tag);
            (doc, id)
        }
        None => {
            let doc = document.insert(Document::new(&tag));
            let id = doc.root();
            (doc, id)
        }
    };

    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = decode(attr.key.as_ref())?;
        let value = attr.unescape_value()?;
        doc.set_attribute(id, &key, &value);
    }

    Ok(id)
}

fn write_node(
    writer: &mut Writer<Vec<u8>>,
    document: &Document,
    id: NodeId,
) -> Result<(), DocumentError> {
    let node = document.node(id);
    let mut start = BytesStart::new(node.tag());
    for (key, value) in node.attributes() {
        start.push_attribute((key, value));
    }

    if node.children().is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for &child in node.children() {
        write_node(writer, document, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(node.tag())))?;
    Ok(())
}

fn decode(bytes: &[u8]) -> Result<String, DocumentError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| DocumentError::Encoding(e.to_string()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
