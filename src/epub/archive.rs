use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use zip::ZipArchive;

use super::parser::{Metadata, parse_container_xml, parse_opf};
use crate::error::{Error, Result};
use crate::source::ChapterSource;
use crate::util::{decode_text, percent_decode, resolve_path};

/// One entry of the reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SpineItem {
    pub id: String,
    /// Path of the chapter inside the archive.
    pub path: String,
    pub media_type: String,
}

/// An EPUB file loaded into memory.
///
/// All zip entries are read eagerly, so chapters and images can be served
/// through `&self` without re-opening the archive.
///
/// # Example
///
/// ```no_run
/// use termbook::{ChapterSource, EpubArchive};
///
/// let book = EpubArchive::open("book.epub")?;
/// for item in book.spine() {
///     let markup = book.chapter_bytes(&item.path)?;
///     println!("{}: {} bytes", item.path, markup.len());
/// }
/// # Ok::<(), termbook::Error>(())
/// ```
#[derive(Debug)]
pub struct EpubArchive {
    metadata: Metadata,
    spine: Vec<SpineItem>,
    entries: HashMap<String, Vec<u8>>,
}

impl EpubArchive {
    /// Open an EPUB file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Read an EPUB from any [`Read`] + [`Seek`] source.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;

        let mut entries = HashMap::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.insert(file.name().to_string(), data);
        }

        let container = entries
            .get("META-INF/container.xml")
            .ok_or_else(|| Error::InvalidEpub("missing META-INF/container.xml".into()))?;
        let opf_path = parse_container_xml(container)?;

        let opf = entries
            .get(&opf_path)
            .ok_or_else(|| Error::InvalidEpub(format!("missing package document {opf_path}")))?;
        let package = parse_opf(&decode_text(opf))?;

        let spine = package
            .spine_ids
            .iter()
            .filter_map(|id| {
                let Some(item) = package.manifest.get(id) else {
                    log::debug!("spine references unknown manifest id {id}");
                    return None;
                };
                Some(SpineItem {
                    id: id.clone(),
                    path: resolve_path(&opf_path, &percent_decode(&item.href)),
                    media_type: item.media_type.clone(),
                })
            })
            .collect();

        Ok(Self {
            metadata: package.metadata,
            spine,
            entries,
        })
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Chapters in reading order.
    pub fn spine(&self) -> &[SpineItem] {
        &self.spine
    }

    /// Look an entry up by archive path, tolerating percent-encoded names.
    fn entry(&self, path: &str) -> Result<Vec<u8>> {
        let path = path.strip_prefix('/').unwrap_or(path);
        self.entries
            .get(path)
            .or_else(|| self.entries.get(&percent_decode(path)))
            .cloned()
            .ok_or_else(|| Error::MissingResource(path.to_string()))
    }
}

impl ChapterSource for EpubArchive {
    fn chapter_bytes(&self, path: &str) -> Result<Vec<u8>> {
        self.entry(path)
    }

    fn image_bytes(&self, path: &str) -> Result<Vec<u8>> {
        self.entry(path)
    }
}
