//! Parsing of the EPUB package files (container.xml and the OPF).

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};
use crate::util::strip_bom;

/// Dublin Core fields shown by `termbook --info`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Metadata {
    pub title: String,
    pub authors: Vec<String>,
    pub language: String,
    pub identifier: String,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
}

/// A manifest entry, `href` relative to the OPF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub href: String,
    pub media_type: String,
}

/// Parsed OPF package document.
#[derive(Debug, Default)]
pub struct Package {
    pub metadata: Metadata,
    /// Maps manifest id -> item
    pub manifest: HashMap<String, ManifestItem>,
    /// Item ids in reading order, including non-linear items.
    pub spine_ids: Vec<String>,
}

/// Parse META-INF/container.xml to find the OPF path.
pub fn parse_container_xml(bytes: &[u8]) -> Result<String> {
    let content = String::from_utf8(strip_bom(bytes).to_vec())?;

    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Empty(e) | Event::Start(e) if local_name(e.name().as_ref()) == b"rootfile" => {
                if let Some(path) = attr_string(&e, b"full-path")? {
                    return Ok(path);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Err(Error::InvalidEpub("No rootfile found in container.xml".into()))
}

/// Parse the OPF package document.
pub fn parse_opf(content: &str) -> Result<Package> {
    // Entities split text events, so whitespace is kept until the element ends
    let mut reader = Reader::from_str(content);

    let mut package = Package::default();
    let mut in_metadata = false;
    let mut current_element: Option<Vec<u8>> = None;
    let mut buf_text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"metadata" => in_metadata = true,
                    local @ (b"title" | b"creator" | b"language" | b"identifier"
                    | b"publisher" | b"description" | b"date")
                        if in_metadata =>
                    {
                        current_element = Some(local.to_vec());
                        buf_text.clear();
                    }
                    b"item" | b"itemref" => read_item(&e, &mut package)?,
                    _ => {}
                }
            }
            Event::Empty(e) => read_item(&e, &mut package)?,
            Event::Text(e) => {
                if current_element.is_some() {
                    buf_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::CData(e) => {
                if current_element.is_some() {
                    buf_text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::GeneralRef(e) => {
                if current_element.is_some()
                    && let Some(resolved) = resolve_entity(&String::from_utf8_lossy(e.as_ref()))
                {
                    buf_text.push_str(&resolved);
                }
            }
            Event::End(e) => {
                let name = e.name();
                if local_name(name.as_ref()) == b"metadata" {
                    in_metadata = false;
                }
                if let Some(elem) = current_element.take() {
                    store_metadata(&mut package.metadata, &elem, buf_text.trim());
                    buf_text.clear();
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(package)
}

fn store_metadata(metadata: &mut Metadata, element: &[u8], text: &str) {
    let text = text.to_string();
    match element {
        b"title" if metadata.title.is_empty() => metadata.title = text,
        b"creator" => metadata.authors.push(text),
        b"language" if metadata.language.is_empty() => metadata.language = text,
        b"identifier" if metadata.identifier.is_empty() => metadata.identifier = text,
        b"publisher" => metadata.publisher = Some(text),
        b"description" => metadata.description = Some(text),
        b"date" => metadata.date = Some(text),
        _ => {}
    }
}

/// Manifest `<item>` and spine `<itemref>` elements.
fn read_item(e: &BytesStart<'_>, package: &mut Package) -> Result<()> {
    let name = e.name();
    match local_name(name.as_ref()) {
        b"item" => {
            let id = attr_string(e, b"id")?.unwrap_or_default();
            if id.is_empty() {
                return Ok(());
            }
            let href = attr_string(e, b"href")?.unwrap_or_default();
            let media_type = attr_string(e, b"media-type")?.unwrap_or_default();
            package.manifest.insert(id, ManifestItem { href, media_type });
        }
        b"itemref" => {
            if let Some(idref) = attr_string(e, b"idref")? {
                package.spine_ids.push(idref);
            }
        }
        _ => {}
    }
    Ok(())
}

fn attr_string(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return Ok(Some(String::from_utf8(attr.value.to_vec())?));
        }
    }
    Ok(None)
}

/// Extract local name from namespaced XML name (e.g., "dc:title" -> "title").
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

fn resolve_entity(entity: &str) -> Option<String> {
    let c = match entity {
        "apos" => '\'',
        "quot" => '"',
        "lt" => '<',
        "gt" => '>',
        "amp" => '&',
        _ => {
            let code = if let Some(hex) = entity.strip_prefix("#x") {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                entity.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)?
        }
    };
    Some(c.to_string())
}
