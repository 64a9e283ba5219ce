//! termbook - render EPUB chapters in the terminal

use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use serde::Serialize;

use termbook::image::rgb_to_color_index;
use termbook::{
    ChapterRenderer, ChapterSource, ClassifierConfig, ColorPalette, DirectorySource, EpubArchive,
    ImageConfig, RenderConfig, RenderLine, RenderedChapter, Rgb, Theme,
};

#[derive(Parser)]
#[command(name = "termbook")]
#[command(version, about = "Render EPUB chapters as terminal text", long_about = None)]
#[command(after_help = "EXAMPLES:
    termbook book.epub               Render every chapter
    termbook -c 3 -w 72 book.epub    Render the fourth spine item at 72 columns
    termbook -d chapter.xhtml        Plain-text dump of a single file
    termbook -i book.epub            Show book metadata")]
struct Cli {
    /// Input file (EPUB, or a single XHTML/HTML chapter)
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output width in columns
    #[arg(short, long, default_value_t = termbook::config::DEFAULT_WIDTH)]
    width: usize,

    /// Spine index of the chapter to render (default: all)
    #[arg(short, long)]
    chapter: Option<usize>,

    /// Plain-text dump without colours or images
    #[arg(short, long)]
    dump: bool,

    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,

    #[arg(long, value_enum, default_value_t = ThemeArg::Dark)]
    theme: ThemeArg,

    #[arg(long, value_enum, default_value_t = ColorMode::Truecolor)]
    color: ColorMode,

    /// Leave image placeholders instead of drawing images
    #[arg(long)]
    no_images: bool,

    /// Class substring that forces preformatted text to be prose
    #[arg(long, value_name = "S", conflicts_with = "no_prose_class_marker")]
    prose_class_marker: Option<String>,

    /// Disable the prose class marker
    #[arg(long)]
    no_prose_class_marker: bool,

    /// Break long code lines at syntax boundaries
    #[arg(long)]
    wrap_code: bool,

    /// Show book metadata without rendering
    #[arg(short, long)]
    info: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeArg {
    Dark,
    Light,
}

impl From<ThemeArg> for Theme {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Dark => Theme::Dark,
            ThemeArg::Light => Theme::Light,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ColorMode {
    Truecolor,
    Ansi256,
    None,
}

/// A book opened from the command line.
enum Input {
    Epub(EpubArchive),
    File(DirectorySource, String),
}

impl Input {
    fn source(&self) -> &dyn ChapterSource {
        match self {
            Input::Epub(archive) => archive,
            Input::File(source, _) => source,
        }
    }

    fn chapters(&self) -> Vec<String> {
        match self {
            Input::Epub(archive) => archive.spine().iter().map(|item| item.path.clone()).collect(),
            Input::File(_, name) => vec![name.clone()],
        }
    }
}

#[derive(Serialize)]
struct JsonChapter<'a, T: Serialize> {
    path: &'a str,
    #[serde(flatten)]
    body: T,
}

#[derive(Serialize)]
struct PlainLines<'a> {
    lines: &'a [String],
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let result = if cli.info {
        show_info(&cli.input)
    } else {
        run(&cli)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn open_input(path: &str) -> termbook::Result<Input> {
    let is_epub = Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("epub"));

    if is_epub {
        Ok(Input::Epub(EpubArchive::open(path)?))
    } else {
        let (source, name) = DirectorySource::for_file(path);
        Ok(Input::File(source, name))
    }
}

fn show_info(path: &str) -> Result<(), String> {
    let input = open_input(path).map_err(|e| e.to_string())?;

    println!("File: {path}");
    if let Input::Epub(archive) = &input {
        let meta = archive.metadata();
        println!("Title: {}", meta.title);
        if !meta.authors.is_empty() {
            println!("Authors: {}", meta.authors.join(", "));
        }
        if !meta.language.is_empty() {
            println!("Language: {}", meta.language);
        }
        if let Some(ref publisher) = meta.publisher {
            println!("Publisher: {publisher}");
        }
        if let Some(ref date) = meta.date {
            println!("Date: {date}");
        }
        if let Some(ref desc) = meta.description {
            let desc = desc.trim();
            match desc.char_indices().nth(200) {
                Some((cut, _)) => println!("Description: {}...", &desc[..cut]),
                None => println!("Description: {desc}"),
            }
        }
    }
    let chapters = input.chapters();
    println!("Chapters: {}", chapters.len());
    for (i, chapter) in chapters.iter().enumerate() {
        println!("  {i:>3}  {chapter}");
    }

    Ok(())
}

fn run(cli: &Cli) -> Result<(), String> {
    let input = open_input(&cli.input).map_err(|e| e.to_string())?;
    let chapters = input.chapters();

    let selected: Vec<&String> = match cli.chapter {
        Some(index) => {
            let chapter = chapters.get(index).ok_or_else(|| {
                format!(
                    "chapter {index} out of range (book has {})",
                    chapters.len()
                )
            })?;
            vec![chapter]
        }
        None => chapters.iter().collect(),
    };

    let marker = if cli.no_prose_class_marker {
        None
    } else {
        Some(cli.prose_class_marker.as_deref().unwrap_or("text"))
    };
    let config = RenderConfig::default()
        .with_classifier(ClassifierConfig::default().with_prose_class_marker(marker))
        .with_image(ImageConfig::default().with_enabled(!cli.no_images))
        .with_wrap_code(cli.wrap_code)
        .with_theme(cli.theme.into());
    let renderer = ChapterRenderer::with_config(config);
    let mut palette = ColorPalette::new();
    let painter = Painter {
        theme: cli.theme.into(),
        mode: cli.color,
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut json_chapters = Vec::new();

    for path in selected {
        let bytes = match input.source().chapter_bytes(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("skipping {path}: {e}");
                continue;
            }
        };

        if cli.dump {
            let lines = renderer.render_plain(&bytes, cli.width);
            if cli.json {
                json_chapters.push(to_json(path, PlainLines { lines: &lines })?);
            } else {
                for line in &lines {
                    writeln!(out, "{line}").map_err(|e| e.to_string())?;
                }
            }
            continue;
        }

        let chapter =
            renderer.render_with_images(&bytes, cli.width, path, input.source(), &mut palette);
        for degradation in &chapter.degradations {
            log::info!("{path}: {degradation}");
        }
        if cli.json {
            json_chapters.push(to_json(path, &chapter)?);
        } else {
            painter.write_chapter(&mut out, &chapter).map_err(|e| e.to_string())?;
        }
    }

    if cli.json {
        serde_json::to_writer_pretty(&mut out, &json_chapters).map_err(|e| e.to_string())?;
        writeln!(out).map_err(|e| e.to_string())?;
    }
    out.flush().map_err(|e| e.to_string())
}

fn to_json<T: Serialize>(path: &str, body: T) -> Result<serde_json::Value, String> {
    serde_json::to_value(JsonChapter { path, body }).map_err(|e| e.to_string())
}

/// Writes render lines as ANSI-coloured text.
struct Painter {
    theme: Theme,
    mode: ColorMode,
}

const RESET: &str = "\x1b[0m";

impl Painter {
    fn fg(&self, rgb: Rgb) -> String {
        match self.mode {
            ColorMode::Truecolor => format!("\x1b[38;2;{};{};{}m", rgb.r, rgb.g, rgb.b),
            ColorMode::Ansi256 => format!("\x1b[38;5;{}m", rgb_to_color_index(rgb)),
            ColorMode::None => String::new(),
        }
    }

    fn bg(&self, rgb: Rgb) -> String {
        match self.mode {
            ColorMode::Truecolor => format!("\x1b[48;2;{};{};{}m", rgb.r, rgb.g, rgb.b),
            ColorMode::Ansi256 => format!("\x1b[48;5;{}m", rgb_to_color_index(rgb)),
            ColorMode::None => String::new(),
        }
    }

    fn styled(&self, w: &mut impl Write, style: &str, text: &str) -> io::Result<()> {
        if self.mode == ColorMode::None || text.is_empty() {
            writeln!(w, "{text}")
        } else {
            writeln!(w, "{style}{text}{RESET}")
        }
    }

    fn write_chapter(&self, w: &mut impl Write, chapter: &RenderedChapter) -> io::Result<()> {
        for line in &chapter.lines {
            match line {
                RenderLine::Header(text) => self.styled(w, "\x1b[1m", text)?,
                RenderLine::Caption(text) => self.styled(w, "\x1b[3m", text)?,
                RenderLine::Quote(text) => self.styled(w, "\x1b[2m", text)?,
                RenderLine::UrlHighlighted(text) => self.styled(w, "\x1b[4m", text)?,
                RenderLine::PlainText(text)
                | RenderLine::BulletItem(text)
                | RenderLine::TableRow(text) => writeln!(w, "{text}")?,
                RenderLine::CodeLine { text, colors } => {
                    if self.mode == ColorMode::None {
                        writeln!(w, "{text}")?;
                        continue;
                    }
                    let mut last = None;
                    for (ch, color) in text.chars().zip(colors) {
                        let rgb = color.for_theme(self.theme);
                        if last != Some(rgb) {
                            write!(w, "{}", self.fg(rgb))?;
                            last = Some(rgb);
                        }
                        write!(w, "{ch}")?;
                    }
                    writeln!(w, "{RESET}")?;
                }
                RenderLine::ImageRow { text, colors } => {
                    if self.mode == ColorMode::None {
                        writeln!(w)?;
                        continue;
                    }
                    for (ch, (fg, bg)) in text.chars().zip(colors) {
                        write!(w, "{}{}{ch}", self.fg(*fg), self.bg(*bg))?;
                    }
                    writeln!(w, "{RESET}")?;
                }
            }
        }
        Ok(())
    }
}
