//! XML wire form of [`MessageEnvelope`].
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8" standalone="yes"?>
//! <message>
//!     <type>...</type>
//!     <payload>...</payload>
//! </message>
//! ```

use std::fmt::Display;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use tracing::{debug, trace, warn};

use crate::config::{CodecConfig, DEFAULT_INDENT};
use crate::domains::message::MessageEnvelope;
use crate::error::{EnvelopeError, Result};
use crate::interfaces::codec::EnvelopeCodec;

pub const ROOT_ELEMENT: &str = "message";
pub const TYPE_ELEMENT: &str = "type";
pub const PAYLOAD_ELEMENT: &str = "payload";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmlCodec {
    indent: usize,
    xml_declaration: bool,
}

impl Default for XmlCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlCodec {
    pub const fn new() -> Self {
        Self {
            indent: DEFAULT_INDENT,
            xml_declaration: true,
        }
    }

    pub fn from_config(config: &CodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            indent: config.indent(),
            xml_declaration: config.xml_declaration(),
        })
    }

    pub fn indent(&self) -> usize {
        self.indent
    }

    pub fn xml_declaration(&self) -> bool {
        self.xml_declaration
    }

    fn write_envelope(&self, envelope: &MessageEnvelope) -> Result<String> {
        let mut writer = if self.indent > 0 {
            Writer::new_with_indent(Vec::new(), b' ', self.indent)
        } else {
            Writer::new(Vec::new())
        };

        if self.xml_declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
                .map_err(serialization)?;
        }
        writer
            .write_event(Event::Start(BytesStart::new(ROOT_ELEMENT)))
            .map_err(serialization)?;
        write_field(&mut writer, TYPE_ELEMENT, &envelope.kind)?;
        write_field(&mut writer, PAYLOAD_ELEMENT, &envelope.payload)?;
        writer
            .write_event(Event::End(BytesEnd::new(ROOT_ELEMENT)))
            .map_err(serialization)?;

        String::from_utf8(writer.into_inner()).map_err(serialization)
    }

    fn read_envelope(&self, text: &str) -> Result<MessageEnvelope> {
        let mut reader = Reader::from_str(text);
        let mut envelope = None;
        let mut first_event = true;

        loop {
            let event = next_event(&mut reader)?;
            let at_start = std::mem::replace(&mut first_event, false);
            match event {
                Event::Start(start) => {
                    ensure_single_root(&envelope)?;
                    ensure_root_name(&start)?;
                    envelope = Some(read_fields(&mut reader)?);
                }
                Event::Empty(start) => {
                    ensure_single_root(&envelope)?;
                    ensure_root_name(&start)?;
                    envelope = Some(MessageEnvelope::new());
                }
                Event::Text(content) => {
                    if !is_blank(&content) {
                        return Err(unexpected(&reader, "text outside the root element"));
                    }
                }
                Event::CData(_) => {
                    return Err(unexpected(&reader, "CDATA outside the root element"));
                }
                Event::End(_) => {
                    return Err(unexpected(&reader, "closing tag without an open element"));
                }
                Event::Decl(_) if !at_start => {
                    return Err(unexpected(
                        &reader,
                        "XML declaration after the start of the document",
                    ));
                }
                Event::DocType(_) if envelope.is_some() => {
                    return Err(unexpected(&reader, "DOCTYPE after the root element"));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        envelope.ok_or_else(|| {
            EnvelopeError::Parse(format!("missing root element `{ROOT_ELEMENT}`"))
        })
    }
}

impl EnvelopeCodec for XmlCodec {
    fn encode(&self, envelope: &MessageEnvelope) -> Result<String> {
        match self.write_envelope(envelope) {
            Ok(text) => {
                trace!(kind = %envelope.kind, bytes = text.len(), "encoded message envelope");
                Ok(text)
            }
            Err(err) => {
                warn!(error = %err, kind = %envelope.kind, "failed to encode message envelope");
                Err(err)
            }
        }
    }

    fn decode(&self, text: &str) -> Result<MessageEnvelope> {
        match self.read_envelope(text) {
            Ok(envelope) => {
                trace!(kind = %envelope.kind, "decoded message envelope");
                Ok(envelope)
            }
            Err(err) => {
                debug!(error = %err, input_len = text.len(), "rejected message envelope");
                Err(err)
            }
        }
    }
}

fn serialization<E: Display>(err: E) -> EnvelopeError {
    EnvelopeError::Serialization(err.to_string())
}

/// The `Char` production of XML 1.0. Surrogates cannot occur in a `char`.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

fn write_field(writer: &mut Writer<Vec<u8>>, name: &str, value: &str) -> Result<()> {
    if let Some(c) = value.chars().find(|c| !is_xml_char(*c)) {
        return Err(EnvelopeError::Serialization(format!(
            "character U+{:04X} in `{name}` cannot be represented in XML 1.0",
            c as u32
        )));
    }
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(serialization)?;
    // BytesText::new escapes markup-significant characters.
    writer
        .write_event(Event::Text(BytesText::new(value)))
        .map_err(serialization)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(serialization)?;
    Ok(())
}

fn next_event<'i>(reader: &mut Reader<&'i [u8]>) -> Result<Event<'i>> {
    reader.read_event().map_err(|err| {
        EnvelopeError::Parse(format!("{err} (at byte {})", reader.buffer_position()))
    })
}

fn unexpected(reader: &Reader<&[u8]>, what: &str) -> EnvelopeError {
    EnvelopeError::Parse(format!("{what} (at byte {})", reader.buffer_position()))
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

fn ensure_single_root(envelope: &Option<MessageEnvelope>) -> Result<()> {
    if envelope.is_some() {
        return Err(EnvelopeError::Parse(
            "more than one top-level element".to_string(),
        ));
    }
    Ok(())
}

fn ensure_root_name(start: &BytesStart<'_>) -> Result<()> {
    let name = start.name();
    if name.as_ref() != ROOT_ELEMENT.as_bytes() {
        return Err(EnvelopeError::Parse(format!(
            "expected root element `{ROOT_ELEMENT}`, found `{}`",
            String::from_utf8_lossy(name.as_ref())
        )));
    }
    check_attributes(start)
}

/// Attribute values are never used, but they still have to be well-formed.
fn check_attributes(start: &BytesStart<'_>) -> Result<()> {
    for attribute in start.attributes() {
        attribute.map_err(|err| {
            EnvelopeError::Parse(format!(
                "malformed attribute in `{}`: {err}",
                String::from_utf8_lossy(start.name().as_ref())
            ))
        })?;
    }
    Ok(())
}

fn misplaced_prolog(reader: &Reader<&[u8]>, element: &str) -> EnvelopeError {
    unexpected(reader, &format!("XML declaration or DOCTYPE inside `{element}`"))
}

/// Consumes an unknown element up to its closing tag, still checking that
/// everything inside it is well-formed.
fn skip_element(reader: &mut Reader<&[u8]>, name: &str) -> Result<()> {
    let mut depth = 0usize;

    loop {
        match next_event(reader)? {
            Event::Start(start) => {
                check_attributes(&start)?;
                depth += 1;
            }
            Event::Empty(start) => check_attributes(&start)?,
            Event::End(_) => {
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
            Event::Decl(_) | Event::DocType(_) => return Err(misplaced_prolog(reader, name)),
            Event::Eof => {
                return Err(EnvelopeError::Parse(format!(
                    "unterminated element `{name}`"
                )));
            }
            _ => {}
        }
    }
}

/// Reads the children of `<message>` up to and including its closing tag.
/// Unknown children are skipped whole; for repeated fields the last one wins.
fn read_fields(reader: &mut Reader<&[u8]>) -> Result<MessageEnvelope> {
    let mut envelope = MessageEnvelope::new();

    loop {
        match next_event(reader)? {
            Event::Start(start) => {
                check_attributes(&start)?;
                let name = start.name();
                if name.as_ref() == TYPE_ELEMENT.as_bytes() {
                    envelope.kind = read_text(reader, TYPE_ELEMENT)?;
                } else if name.as_ref() == PAYLOAD_ELEMENT.as_bytes() {
                    envelope.payload = read_text(reader, PAYLOAD_ELEMENT)?;
                } else {
                    skip_element(reader, &String::from_utf8_lossy(name.as_ref()))?;
                }
            }
            Event::Empty(start) => {
                check_attributes(&start)?;
                let name = start.name();
                if name.as_ref() == TYPE_ELEMENT.as_bytes() {
                    envelope.kind.clear();
                } else if name.as_ref() == PAYLOAD_ELEMENT.as_bytes() {
                    envelope.payload.clear();
                }
            }
            Event::Text(content) => {
                if !is_blank(&content) {
                    return Err(unexpected(
                        reader,
                        "text directly inside the root element",
                    ));
                }
            }
            Event::CData(_) => {
                return Err(unexpected(reader, "CDATA directly inside the root element"));
            }
            Event::End(_) => return Ok(envelope),
            Event::Decl(_) | Event::DocType(_) => {
                return Err(misplaced_prolog(reader, ROOT_ELEMENT));
            }
            Event::Eof => {
                return Err(EnvelopeError::Parse(format!(
                    "unterminated element `{ROOT_ELEMENT}`"
                )));
            }
            _ => {}
        }
    }
}

fn read_text(reader: &mut Reader<&[u8]>, field: &str) -> Result<String> {
    let mut value = String::new();

    loop {
        match next_event(reader)? {
            Event::Text(content) => {
                let text = content.unescape().map_err(|err| {
                    EnvelopeError::Parse(format!("invalid escape in `{field}`: {err}"))
                })?;
                value.push_str(&text);
            }
            Event::CData(content) => {
                let bytes = content.into_inner();
                let text = std::str::from_utf8(&bytes).map_err(|err| {
                    EnvelopeError::Parse(format!("invalid UTF-8 in `{field}`: {err}"))
                })?;
                value.push_str(text);
            }
            Event::Start(_) | Event::Empty(_) => {
                return Err(unexpected(
                    reader,
                    &format!("nested element inside `{field}`"),
                ));
            }
            Event::End(_) => return Ok(value),
            Event::Decl(_) | Event::DocType(_) => return Err(misplaced_prolog(reader, field)),
            Event::Eof => {
                return Err(EnvelopeError::Parse(format!(
                    "unterminated element `{field}`"
                )));
            }
            _ => {}
        }
    }
}
