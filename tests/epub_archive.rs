use std::io::{Cursor, Write};

use tempfile::NamedTempFile;
use termbook::{ChapterRenderer, ChapterSource, ColorPalette, EpubArchive, Error, RenderLine};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

const OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Terminal Reading</dc:title>
    <dc:creator>Test Author</dc:creator>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>
    <item id="intro" href="text/intro.xhtml" media-type="application/xhtml+xml"/>
    <item id="code" href="text/code%20samples.xhtml" media-type="application/xhtml+xml"/>
    <item id="photo" href="images/photo.png" media-type="image/png"/>
  </manifest>
  <spine>
    <itemref idref="intro"/>
    <itemref idref="code"/>
  </spine>
</package>"#;

const INTRO: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<body>
<h1>Introduction</h1>
<p>Reading books in a terminal.</p>
<img src="../images/photo.png" alt="A photo"/>
</body>
</html>"#;

const CODE: &str = r#"<html><body><pre class="language-python">print("hi")</pre></body></html>"#;

fn photo_png() -> Vec<u8> {
    let image = image::RgbImage::from_fn(120, 90, |x, y| {
        image::Rgb([(x * 2) as u8, (y * 2) as u8, ((x + y) % 256) as u8])
    });
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();
    png
}

fn build_epub(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("mimetype", stored).unwrap();
    zip.write_all(b"application/epub+zip").unwrap();
    for (name, data) in entries {
        zip.start_file(*name, deflated).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn sample_epub() -> Vec<u8> {
    let photo = photo_png();
    build_epub(&[
        ("META-INF/container.xml", CONTAINER.as_bytes()),
        ("OEBPS/content.opf", OPF.as_bytes()),
        ("OEBPS/text/intro.xhtml", INTRO.as_bytes()),
        ("OEBPS/text/code samples.xhtml", CODE.as_bytes()),
        ("OEBPS/images/photo.png", &photo),
    ])
}

#[test]
fn test_open_from_disk() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&sample_epub()).unwrap();

    let book = EpubArchive::open(file.path()).unwrap();
    assert_eq!(book.metadata().title, "Terminal Reading");
    assert_eq!(book.metadata().authors, vec!["Test Author"]);

    let paths: Vec<_> = book.spine().iter().map(|item| item.path.as_str()).collect();
    assert_eq!(paths, vec!["OEBPS/text/intro.xhtml", "OEBPS/text/code samples.xhtml"]);
}

#[test]
fn test_chapters_render_with_images() {
    let book = EpubArchive::from_reader(Cursor::new(sample_epub())).unwrap();
    let intro = &book.spine()[0];
    let markup = book.chapter_bytes(&intro.path).unwrap();

    let mut palette = ColorPalette::new();
    let chapter =
        ChapterRenderer::new().render_with_images(&markup, 80, &intro.path, &book, &mut palette);

    assert!(matches!(&chapter.lines[0], RenderLine::Header(h) if h.trim() == "Introduction"));
    assert_eq!(chapter.alt_texts, vec!["A photo"]);
    assert!(
        chapter
            .lines
            .iter()
            .any(|line| matches!(line, RenderLine::ImageRow { .. }))
    );
    assert!(chapter.degradations.is_empty(), "{:?}", chapter.degradations);
    assert!(!palette.is_empty());
}

#[test]
fn test_percent_encoded_manifest_href() {
    let book = EpubArchive::from_reader(Cursor::new(sample_epub())).unwrap();
    let code = &book.spine()[1];
    let markup = book.chapter_bytes(&code.path).unwrap();

    let chapter = ChapterRenderer::new().render(&markup, 80);
    assert!(
        chapter
            .lines
            .iter()
            .any(|line| matches!(line, RenderLine::CodeLine { text, .. } if text == "print(\"hi\")"))
    );
}

#[test]
fn test_missing_entry() {
    let book = EpubArchive::from_reader(Cursor::new(sample_epub())).unwrap();
    assert!(matches!(
        book.image_bytes("OEBPS/images/nope.png"),
        Err(Error::MissingResource(_))
    ));
}

#[test]
fn test_missing_container_is_invalid() {
    let bytes = build_epub(&[("OEBPS/content.opf", OPF.as_bytes())]);
    assert!(matches!(
        EpubArchive::from_reader(Cursor::new(bytes)),
        Err(Error::InvalidEpub(_))
    ));
}

#[test]
fn test_not_a_zip() {
    assert!(matches!(
        EpubArchive::from_reader(Cursor::new(b"plain text".to_vec())),
        Err(Error::Zip(_))
    ));
}
