use std::collections::HashMap;
use std::io::Cursor;

use proptest::prelude::*;
use termbook::heuristic::classify_block;
use termbook::{
    ChapterRenderer, ChapterSource, ClassifierConfig, ColorPalette, Degradation, Error, ImageConfig,
    RenderConfig, RenderLine, render_chapter, render_chapter_plain,
};

/// Chapter resources held in memory.
struct MemorySource(HashMap<String, Vec<u8>>);

impl MemorySource {
    fn with_image(name: &str, image: image::RgbImage) -> Self {
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        Self(HashMap::from([(name.to_string(), png)]))
    }
}

impl ChapterSource for MemorySource {
    fn chapter_bytes(&self, path: &str) -> termbook::Result<Vec<u8>> {
        self.0
            .get(path)
            .cloned()
            .ok_or_else(|| Error::MissingResource(path.to_string()))
    }

    fn image_bytes(&self, path: &str) -> termbook::Result<Vec<u8>> {
        self.chapter_bytes(path)
    }
}

fn texts(lines: &[RenderLine]) -> Vec<&str> {
    lines.iter().map(RenderLine::text).collect()
}

fn gradient(width: u32, height: u32) -> image::RgbImage {
    image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, ((x * y) % 256) as u8])
    })
}

#[test]
fn test_heading_and_paragraph() {
    let chapter = render_chapter(b"<h1>Title</h1><p>Hello world.</p>", 80);
    assert_eq!(
        chapter.lines,
        vec![
            RenderLine::Header(format!("{}Title", " ".repeat(37))),
            RenderLine::PlainText(String::new()),
            RenderLine::PlainText("Hello world.".to_string()),
            RenderLine::PlainText(String::new()),
        ]
    );
}

#[test]
fn test_explicit_class_makes_code() {
    let chapter = render_chapter(
        b"<pre class=\"language-python\">def f():\n    return 1\n</pre>",
        80,
    );
    let code: Vec<_> = chapter
        .lines
        .iter()
        .filter_map(|line| match line {
            RenderLine::CodeLine { text, colors } => Some((text, colors)),
            _ => None,
        })
        .collect();
    assert_eq!(code.len(), 2);

    let keyword = termbook::highlight::TokenCategory::Keyword.color();
    assert!(code[0].1[..3].iter().all(|c| *c == keyword));
    assert!(code[1].1[4..10].iter().all(|c| *c == keyword));
}

#[test]
fn test_preformatted_sentence_is_prose() {
    let text = "This is clearly just a long explanatory paragraph written in plain English \
                sentences that happen to be preformatted for layout reasons only.";
    let verdict = classify_block(text);
    assert!(!verdict.is_code(), "verdict: {verdict:?}");

    let chapter = render_chapter(format!("<pre>{text}</pre>").as_bytes(), 200);
    assert!(
        chapter
            .lines
            .iter()
            .all(|line| !matches!(line, RenderLine::CodeLine { .. }))
    );
}

#[test]
fn test_link_text_replaced_by_url() {
    let chapter = render_chapter(
        b"<p><a href=\"https://example.com/path\">click here</a></p>",
        80,
    );
    let all = texts(&chapter.lines).join("\n");
    assert!(all.contains("https://example.com/path"));
    assert!(!all.contains("click here"));
    assert!(matches!(chapter.lines[0], RenderLine::UrlHighlighted(_)));
}

#[test]
fn test_short_list_items_stay_separate() {
    let chapter = render_chapter(b"<ul><li>apples</li><li>pears</li></ul>", 40);
    let bullets: Vec<_> = chapter
        .lines
        .iter()
        .filter(|line| matches!(line, RenderLine::BulletItem(_)))
        .map(RenderLine::text)
        .collect();
    assert_eq!(bullets, vec![" - apples", " - pears"]);
}

#[test]
fn test_tiny_image_becomes_glyph() {
    let source = MemorySource::with_image(
        "bullet.png",
        image::RgbImage::from_pixel(8, 8, image::Rgb([200, 30, 30])),
    );
    let renderer = ChapterRenderer::new();
    let mut palette = ColorPalette::new();
    let chapter = renderer.render_with_images(
        b"<p><img src=\"bullet.png\"/></p>",
        80,
        "ch1.xhtml",
        &source,
        &mut palette,
    );

    assert!(
        chapter
            .lines
            .iter()
            .all(|line| !matches!(line, RenderLine::ImageRow { .. }))
    );
    let glyphs: Vec<_> = chapter
        .lines
        .iter()
        .filter(|line| !line.is_blank())
        .map(|line| line.text().trim())
        .collect();
    assert_eq!(glyphs, vec!["\u{25c6}"]);
    assert!(palette.is_empty());
}

#[test]
fn test_content_image_drawn_with_half_blocks() {
    let source = MemorySource::with_image("img/photo.png", gradient(200, 100));
    let renderer = ChapterRenderer::new();
    let mut palette = ColorPalette::new();
    let chapter = renderer.render_with_images(
        b"<p>Before.</p><img src=\"../img/photo.png\"/><p>After.</p>",
        80,
        "text/ch1.xhtml",
        &source,
        &mut palette,
    );

    let rows: Vec<_> = chapter
        .lines
        .iter()
        .filter_map(|line| match line {
            RenderLine::ImageRow { text, colors } => Some((text, colors)),
            _ => None,
        })
        .collect();
    assert!(rows.len() > 1);
    for (text, colors) in &rows {
        assert_eq!(text.chars().count(), colors.len());
        assert!(text.chars().count() <= 80);
    }
    assert_eq!(chapter.lines.last().map(RenderLine::is_blank), Some(true));
    assert!(texts(&chapter.lines).contains(&"After."));
}

#[test]
fn test_missing_image_leaves_marker_and_continues() {
    let source = MemorySource(HashMap::new());
    let mut palette = ColorPalette::new();
    let chapter = ChapterRenderer::new().render_with_images(
        b"<img src=\"gone.png\"/><p>Still here.</p>",
        60,
        "ch1.xhtml",
        &source,
        &mut palette,
    );

    let all = texts(&chapter.lines);
    assert!(all.iter().any(|t| t.trim() == "[Error loading image: gone.png]"));
    assert!(all.contains(&"Still here."));
    assert!(matches!(
        chapter.degradations.as_slice(),
        [Degradation::ImageDecode { src, .. }] if src == "gone.png"
    ));
}

#[test]
fn test_path_mention_is_table_row() {
    let chapter = render_chapter(b"<p>Edit the file src/index.js to start</p>", 80);
    assert_eq!(
        chapter.lines[0],
        RenderLine::TableRow("Edit the file src/index.js to start".to_string())
    );
}

#[test]
fn test_broken_preformatted_sentence_reflows() {
    use termbook::classify::{Mode, classify};
    use termbook::reflow::reflow;

    let scanned = termbook::scan::scan("<pre>the quick brown<br/>fox jumps over</pre>");
    let chapter = classify(&scanned.events, &ClassifierConfig::default(), Mode::Full);
    let groups: Vec<_> = reflow(&chapter.lines, &chapter.categories)
        .into_iter()
        .map(|g| g.text)
        .collect();
    assert_eq!(groups, vec!["the quick brown fox jumps over", ""]);
}

#[test]
fn test_full_palette_reported_once() {
    let source = MemorySource::with_image("photo.png", gradient(200, 100));
    let mut palette = ColorPalette::with_capacity(1);
    let chapter = ChapterRenderer::new().render_with_images(
        b"<img src=\"photo.png\"/><p>Between.</p><img src=\"photo.png\"/>",
        80,
        "ch1.xhtml",
        &source,
        &mut palette,
    );

    let exhausted: Vec<_> = chapter
        .degradations
        .iter()
        .filter(|d| matches!(d, Degradation::ColorBudgetExhausted { capacity: 1 }))
        .collect();
    assert_eq!(exhausted.len(), 1);
    assert!(
        chapter
            .lines
            .iter()
            .filter(|line| matches!(line, RenderLine::ImageRow { .. }))
            .count()
            > 2
    );
    assert_eq!(palette.len(), 1);
}

#[test]
fn test_code_colours_use_palette() {
    let source = MemorySource(HashMap::new());
    let html = b"<pre class=\"language-python\">def f(x):\n    return \"x\" # note\n</pre>";

    let mut palette = ColorPalette::new();
    let chapter =
        ChapterRenderer::new().render_with_images(html, 80, "ch1.xhtml", &source, &mut palette);
    assert!(palette.len() > 1);
    assert!(chapter.degradations.is_empty(), "{:?}", chapter.degradations);

    let mut tiny = ColorPalette::with_capacity(1);
    let chapter =
        ChapterRenderer::new().render_with_images(html, 80, "ch1.xhtml", &source, &mut tiny);
    assert_eq!(
        chapter.degradations,
        vec![Degradation::ColorBudgetExhausted { capacity: 1 }]
    );
    assert!(
        chapter
            .lines
            .iter()
            .any(|line| matches!(line, RenderLine::CodeLine { .. }))
    );
}

#[test]
fn test_images_disabled_keeps_placeholders() {
    let source = MemorySource::with_image("photo.png", gradient(200, 100));
    let renderer = ChapterRenderer::with_config(
        RenderConfig::default().with_image(ImageConfig::default().with_enabled(false)),
    );
    let html = b"<p>A</p><img src=\"photo.png\"/>";
    let mut palette = ColorPalette::new();
    let with_images = renderer.render_with_images(html, 60, "ch1.xhtml", &source, &mut palette);
    assert_eq!(with_images.lines, renderer.render(html, 60).lines);
}

#[test]
fn test_heading_never_code() {
    let chapter = render_chapter(b"<h2><code>x = compute(1);</code></h2>", 60);
    assert!(matches!(chapter.lines[0], RenderLine::Header(_)));
    assert!(
        chapter
            .lines
            .iter()
            .all(|line| !matches!(line, RenderLine::CodeLine { .. }))
    );
}

#[test]
fn test_code_colors_match_text_length() {
    let html = br#"<p>Intro.</p>
<pre><code class="language-java">public class Main {
    public static void main(String[] args) { System.out.println("a very long line that needs wrapping, really"); }
}</code></pre>
<pre>SELECT name FROM users WHERE id = 1;</pre>"#;
    let renderer = ChapterRenderer::with_config(RenderConfig::default().with_wrap_code(true));
    let chapter = renderer.render(html, 60);

    let mut seen = 0;
    for line in &chapter.lines {
        if let RenderLine::CodeLine { text, colors } = line {
            seen += 1;
            assert_eq!(text.chars().count(), colors.len(), "{text:?}");
            assert!(text.chars().count() <= 60, "{text:?}");
        }
    }
    assert!(seen >= 3);
}

fn fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z ]{1,30}".prop_map(|t| format!("<p>{t}</p>")),
        "[a-z ]{1,20}".prop_map(|t| format!("<h2>{t}</h2>")),
        "[a-z]{1,10}".prop_map(|t| format!("<ul><li>{t}</li><li>{t}</li></ul>")),
        "[a-z =;(){}]{1,40}".prop_map(|t| format!("<pre>{t}\n{t}</pre>")),
        "[a-z]{1,8}".prop_map(|t| format!("<img src=\"{t}.png\" alt=\"{t}\"/>")),
        "[a-z]{1,8}".prop_map(|t| format!("<a href=\"https://{t}.org/x\">{t}</a>")),
        Just("<blockquote><p>quoted words</p></blockquote>".to_string()),
        Just("<p>broken <b>markup</p></div>".to_string()),
    ]
}

proptest! {
    #[test]
    fn prop_rendering_is_idempotent(
        parts in prop::collection::vec(fragment(), 1..12),
        width in 20usize..120,
    ) {
        let html = parts.concat();
        let first = render_chapter(html.as_bytes(), width);
        let second = render_chapter(html.as_bytes(), width);
        prop_assert_eq!(first.lines, second.lines);
        prop_assert_eq!(first.degradations, second.degradations);
    }

    #[test]
    fn prop_plain_output_has_no_placeholders(
        parts in prop::collection::vec(fragment(), 1..12),
        width in 20usize..120,
    ) {
        let html = parts.concat();
        for line in render_chapter_plain(html.as_bytes(), width) {
            prop_assert!(!line.contains("[IMG:"), "{}", line);
        }
    }

    #[test]
    fn prop_code_colors_cover_every_char(
        parts in prop::collection::vec(fragment(), 1..8),
    ) {
        let html = parts.concat();
        let renderer = ChapterRenderer::with_config(RenderConfig::default().with_wrap_code(true));
        for line in renderer.render(html.as_bytes(), 40).lines {
            if let RenderLine::CodeLine { text, colors } = line {
                prop_assert_eq!(text.chars().count(), colors.len());
            }
        }
    }
}
