// XML codec
// Decodes response bodies into a generic `Node` tree and encodes nested
// request parameters as XML documents, both on top of quick-xml events.

use std::borrow::Cow;

use bytes::Bytes;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::Writer;
use thiserror::Error;

use crate::request::EncodeError;
use crate::tree::Node;

// Prefix for attribute entries in decoded maps.
pub const ATTRIBUTE_PREFIX: char = '@';
// Key for element text that sits next to attributes or child elements.
pub const TEXT_KEY: &str = "#text";

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("XML parse error at position {position}: {message}")]
    Syntax { position: u64, message: String },

    #[error("Invalid UTF-8 in XML: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Invalid escape sequence: {0}")]
    Escape(String),

    #[error("Document has no root element")]
    NoRoot,

    #[error("Document ended with {0} unclosed element(s)")]
    Unclosed(usize),
}

pub trait XmlCodec: Send + Sync {
    fn decode(&self, xml: &[u8]) -> Result<Node, DecodeError>;
    fn encode(&self, root: &str, tree: &Node) -> Result<Bytes, EncodeError>;
}

// Decoding yields `{root_name: value}`. An element with only text becomes a
// `Scalar`, an empty element `Null`, repeated siblings a `List`, attributes
// `@name` entries, and text beside attributes or children a `#text` entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuickXmlCodec;

struct Frame {
    name: String,
    entries: Vec<(String, Node)>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self, DecodeError> {
        let name = std::str::from_utf8(start.name().as_ref())?.to_string();
        let mut entries = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| DecodeError::Syntax {
                position: 0,
                message: e.to_string(),
            })?;
            let key = std::str::from_utf8(attr.key.as_ref())?;
            let value = unescape_text(std::str::from_utf8(attr.value.as_ref())?)?;
            entries.push((format!("{}{}", ATTRIBUTE_PREFIX, key), Node::from(value.into_owned())));
        }
        Ok(Self {
            name,
            entries,
            text: String::new(),
        })
    }

    fn close(self) -> (String, Node) {
        let text = self.text.trim();
        let value = if self.entries.is_empty() {
            if text.is_empty() {
                Node::Null
            } else {
                Node::from(text)
            }
        } else {
            let mut entries = self.entries;
            if !text.is_empty() {
                entries.push((TEXT_KEY.to_string(), Node::from(text)));
            }
            Node::Map(entries)
        };
        (self.name, value)
    }
}

fn unescape_text(raw: &str) -> Result<Cow<'_, str>, DecodeError> {
    unescape(raw).map_err(|e| DecodeError::Escape(e.to_string()))
}

fn resolve_reference(name: &str) -> Option<String> {
    if let Some(code) = name.strip_prefix('#') {
        let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => code.parse().ok()?,
        };
        return char::from_u32(value).map(String::from);
    }
    let resolved = match name {
        "lt" => "<",
        "gt" => ">",
        "amp" => "&",
        "apos" => "'",
        "quot" => "\"",
        _ => return None,
    };
    Some(resolved.to_string())
}

// Repeated sibling elements collect into a list
fn attach(entries: &mut Vec<(String, Node)>, name: String, value: Node) {
    match entries.iter_mut().find(|(k, _)| *k == name) {
        Some((_, Node::List(items))) => items.push(value),
        Some((_, existing)) => {
            let first = std::mem::take(existing);
            *existing = Node::List(vec![first, value]);
        }
        None => entries.push((name, value)),
    }
}

impl XmlCodec for QuickXmlCodec {
    fn decode(&self, xml: &[u8]) -> Result<Node, DecodeError> {
        let mut reader = Reader::from_reader(xml);
        // Text is trimmed once per element, after references are resolved
        reader.config_mut().trim_text(false);

        let mut stack: Vec<Frame> = Vec::new();
        let mut root: Option<(String, Node)> = None;

        loop {
            let event = reader.read_event().map_err(|e| DecodeError::Syntax {
                position: reader.error_position() as u64,
                message: e.to_string(),
            })?;
            match event {
                Event::Start(e) => stack.push(Frame::open(&e)?),
                Event::Empty(e) => {
                    let (name, value) = Frame::open(&e)?.close();
                    match stack.last_mut() {
                        Some(parent) => attach(&mut parent.entries, name, value),
                        None => root = root.or(Some((name, value))),
                    }
                }
                Event::End(_) => {
                    if let Some(frame) = stack.pop() {
                        let (name, value) = frame.close();
                        match stack.last_mut() {
                            Some(parent) => attach(&mut parent.entries, name, value),
                            None => root = root.or(Some((name, value))),
                        }
                    }
                }
                Event::Text(e) => {
                    if let Some(frame) = stack.last_mut() {
                        frame.text.push_str(&unescape_text(std::str::from_utf8(&e)?)?);
                    }
                }
                Event::CData(e) => {
                    if let Some(frame) = stack.last_mut() {
                        frame.text.push_str(std::str::from_utf8(&e)?);
                    }
                }
                Event::GeneralRef(e) => {
                    if let Some(frame) = stack.last_mut() {
                        let name = std::str::from_utf8(&e)?;
                        let resolved = resolve_reference(name)
                            .ok_or_else(|| DecodeError::Escape(format!("unknown entity &{};", name)))?;
                        frame.text.push_str(&resolved);
                    }
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions, doctype
                _ => (),
            }
        }

        if !stack.is_empty() {
            return Err(DecodeError::Unclosed(stack.len()));
        }
        let (name, value) = root.ok_or(DecodeError::NoRoot)?;
        Ok(Node::Map(vec![(name, value)]))
    }

    fn encode(&self, root: &str, tree: &Node) -> Result<Bytes, EncodeError> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_err)?;
        write_element(&mut writer, root, tree)?;
        Ok(Bytes::from(writer.into_inner()))
    }
}

fn xml_err(e: impl std::fmt::Display) -> EncodeError {
    EncodeError::Xml(e.to_string())
}

fn write_element(writer: &mut Writer<Vec<u8>>, name: &str, value: &Node) -> Result<(), EncodeError> {
    match value {
        Node::List(items) => {
            for item in items {
                write_element(writer, name, item)?;
            }
        }
        Node::Null => {
            writer
                .write_event(Event::Empty(BytesStart::new(name)))
                .map_err(xml_err)?;
        }
        Node::Scalar(text) => {
            writer
                .write_event(Event::Start(BytesStart::new(name)))
                .map_err(xml_err)?;
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(xml_err)?;
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(xml_err)?;
        }
        Node::Map(entries) => {
            let mut start = BytesStart::new(name);
            for (key, value) in entries {
                if let (Some(attr), Some(text)) = (key.strip_prefix(ATTRIBUTE_PREFIX), value.as_str()) {
                    start.push_attribute((attr, text));
                }
            }
            writer.write_event(Event::Start(start)).map_err(xml_err)?;
            for (key, value) in entries {
                if key.starts_with(ATTRIBUTE_PREFIX) {
                    continue;
                }
                if key == TEXT_KEY {
                    if let Some(text) = value.as_str() {
                        writer
                            .write_event(Event::Text(BytesText::new(text)))
                            .map_err(xml_err)?;
                    }
                    continue;
                }
                write_element(writer, key, value)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(xml_err)?;
        }
    }
    Ok(())
}
