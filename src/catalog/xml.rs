//! RHDB XML catalog reader.
//!
//! The first element under the root is the header; each of its children is a
//! `<field>value</field>` pair. Every following element is one patch:
//!
//! ```xml
//! <game name="Bahamut Lagoon">
//!   <version>1.3</version>
//!   <shortauthor>DeJap</shortauthor>
//!   <patchtype>bps</patchtype>
//!   <baseCRC>AAAAAAAA</baseCRC>
//!   <patchCRC>BBBBBBBB</patchCRC>
//!   <finalCRC>CCCCCCCC</finalCRC>
//! </game>
//! ```
//!
//! Parsing only builds [`CatalogData`]; name and duplicate checks happen in
//! [`Catalog::from_xml`](crate::catalog::store::Catalog::from_xml).

use roxmltree::{Document, Node, ParsingOptions};

use crate::catalog::store::{CatalogData, CatalogError, CatalogHeader};
use crate::core::entry::CatalogEntry;
use crate::core::types::{Crc32, PatchFormat};

/// Parse an RHDB document into header and entries
///
/// # Errors
///
/// Returns `CatalogError::XmlError` for malformed XML,
/// `CatalogError::MissingHeader` for an empty root, and a field or checksum
/// error for the first incomplete entry.
pub fn parse(xml: &str) -> Result<CatalogData, CatalogError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(xml, options)?;

    let mut elements = doc.root_element().children().filter(Node::is_element);
    let header = parse_header(elements.next().ok_or(CatalogError::MissingHeader)?);
    let games = elements.map(parse_game).collect::<Result<Vec<_>, _>>()?;

    Ok(CatalogData { header, games })
}

fn parse_header(node: Node<'_, '_>) -> CatalogHeader {
    let mut header = CatalogHeader::default();
    for field in node.children().filter(Node::is_element) {
        let value = field.text().unwrap_or_default().trim();
        match field.tag_name().name() {
            "name" => header.name = value.to_string(),
            "fileextension" if !value.is_empty() => {
                header.file_extension = Some(value.to_string());
            }
            "fileextension" => {}
            other => {
                header
                    .extra
                    .insert(other.to_string(), serde_json::Value::from(value));
            }
        }
    }
    header
}

fn parse_game(node: Node<'_, '_>) -> Result<CatalogEntry, CatalogError> {
    let name = node.attribute("name").unwrap_or_default().trim();
    if name.is_empty() {
        return Err(CatalogError::MissingField {
            entry: node.tag_name().name().to_string(),
            field: "name",
        });
    }

    let text = |field: &'static str| {
        child_text(node, field).ok_or_else(|| CatalogError::MissingField {
            entry: name.to_string(),
            field,
        })
    };
    let crc = |field: &'static str| {
        text(field)?
            .parse::<Crc32>()
            .map_err(|source| CatalogError::InvalidChecksum {
                entry: name.to_string(),
                field,
                source,
            })
    };

    Ok(CatalogEntry::new(name, PatchFormat::from(text("patchtype")?))
        .with_release(text("version")?, text("shortauthor")?)
        .with_checksums(crc("baseCRC")?, crc("patchCRC")?, crc("finalCRC")?))
}

/// Trimmed text of the first `<tag>` child; empty elements give `""`
fn child_text<'a>(node: Node<'a, '_>, tag: &str) -> Option<&'a str> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .map(|child| child.text().unwrap_or_default().trim())
}
