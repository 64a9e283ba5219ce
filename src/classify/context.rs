//! Nested element context.
//!
//! Each open element owns a copy of the context in effect inside it, so
//! closing an element restores exactly what was in effect before it opened.

use crate::config::ClassifierConfig;
use crate::scan::{Attr, attr};

/// Flags in effect for text inside an element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    pub heading: bool,
    pub indented: bool,
    pub bullet: bool,
    pub preformatted: bool,
    pub code: bool,
    pub prose_override: bool,
    pub hidden: bool,
    pub caption: bool,
    /// Language hint from a `language-X` / `lang-X` class.
    pub language: Option<String>,
    /// Index of the enclosing absolute link, if any.
    pub link: Option<usize>,
}

/// An open element on the classifier stack.
#[derive(Debug, Clone)]
pub struct Frame {
    pub name: String,
    pub ctx: Context,
    /// Text appended when the element closes (`]` for sup, `}` for sub).
    pub closer: Option<&'static str>,
}

/// Class names that mark a `<pre>` as a code listing.
const CODE_BLOCK_CLASSES: &[&str] = &[
    "programlisting",
    "code",
    "codeintext",
    "sourceCode",
    "highlight",
    "code-area",
];

pub fn is_heading(name: &str) -> bool {
    matches!(name, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

/// Elements that never have content and so never open a frame.
pub fn is_void(name: &str) -> bool {
    matches!(
        name,
        "br" | "img"
            | "image"
            | "hr"
            | "meta"
            | "link"
            | "input"
            | "col"
            | "area"
            | "base"
            | "wbr"
            | "source"
    )
}

/// Elements whose boundaries separate paragraphs.
pub fn is_block(name: &str) -> bool {
    is_heading(name)
        || matches!(
            name,
            "p" | "div"
                | "blockquote"
                | "pre"
                | "li"
                | "tr"
                | "table"
                | "figure"
                | "figcaption"
                | "ul"
                | "ol"
                | "dl"
                | "dt"
                | "dd"
                | "section"
                | "article"
                | "aside"
                | "header"
                | "footer"
                | "nav"
        )
}

fn class_tokens(attrs: &[Attr]) -> impl Iterator<Item = &str> {
    attr(attrs, "class").unwrap_or("").split_whitespace()
}

/// Extract `X` from a `language-X` or `lang-X` class token.
pub fn language_from_class(attrs: &[Attr]) -> Option<String> {
    class_tokens(attrs).find_map(|token| {
        token
            .strip_prefix("language-")
            .or_else(|| token.strip_prefix("lang-"))
            .filter(|lang| !lang.is_empty())
            .map(str::to_string)
    })
}

impl Context {
    /// Derive the context inside a newly opened element.
    pub fn enter(&self, name: &str, attrs: &[Attr], config: &ClassifierConfig) -> Context {
        let mut ctx = self.clone();

        for token in class_tokens(attrs) {
            if token.to_ascii_lowercase().contains("caption") {
                ctx.caption = true;
            }
            if config.is_prose_token(token) {
                ctx.prose_override = true;
            }
        }

        match name {
            _ if is_heading(name) => ctx.heading = true,
            "q" | "dt" | "dd" | "blockquote" => ctx.indented = true,
            "figcaption" | "caption" => ctx.caption = true,
            "li" => ctx.bullet = true,
            "script" | "style" | "head" => ctx.hidden = true,
            "pre" => ctx.enter_pre(attrs, config),
            "code" => {
                ctx.code = true;
                ctx.prose_override = false;
                if let Some(lang) = language_from_class(attrs) {
                    ctx.language = Some(lang);
                }
            }
            _ => {}
        }
        ctx
    }

    fn enter_pre(&mut self, attrs: &[Attr], config: &ClassifierConfig) {
        self.preformatted = true;
        self.prose_override = false;
        self.language = None;

        if class_tokens(attrs).any(|t| config.is_prose_token(t)) {
            self.prose_override = true;
            return;
        }

        if let Some(lang) = language_from_class(attrs) {
            self.language = Some(lang);
            self.code = true;
        } else if class_tokens(attrs)
            .any(|t| CODE_BLOCK_CLASSES.contains(&t) || t.to_ascii_lowercase().contains("screen"))
        {
            self.code = true;
        }
    }
}
