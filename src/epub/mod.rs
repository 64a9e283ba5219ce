//! EPUB archives as a [`crate::ChapterSource`].

mod archive;
mod parser;

pub use archive::{EpubArchive, SpineItem};
pub use parser::{ManifestItem, Metadata, Package, parse_container_xml, parse_opf};
