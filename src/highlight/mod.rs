//! Syntax highlighting for code blocks.
//!
//! Text goes through callout alignment, language detection and syntect's
//! parser. Each character gets one [`DualColor`] from the category of its
//! innermost mapped scope. Highlighting never fails: on any tokenizer error
//! the block comes back untouched in the neutral colour, with a
//! [`Degradation`] attached.

mod callout;
mod language;
mod theme;

use std::collections::HashMap;

use syntect::parsing::{ParseState, Scope, ScopeStack, SyntaxReference};
use syntect::util::LinesWithEndings;

use crate::error::Degradation;

pub use callout::reorganize_callouts;
pub use language::{Language, detect as detect_language, resolve_hint};
pub use theme::{
    DualColor, NEUTRAL, Rgb, Theme, TokenCategory, category_for_scope, category_for_stack,
};

use language::SYNTAXES;

/// One highlighted line, without its line terminator.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightedLine {
    pub text: String,
    /// One colour per `char` of `text`.
    pub colors: Vec<DualColor>,
}

impl HighlightedLine {
    fn uniform(text: &str, color: DualColor) -> Self {
        Self {
            text: text.to_string(),
            colors: vec![color; text.chars().count()],
        }
    }
}

/// Result of highlighting one code block.
#[derive(Debug, Clone)]
pub struct Highlighted {
    /// Name of the language used, "Plain Text" when none applied.
    pub language: &'static str,
    pub lines: Vec<HighlightedLine>,
    pub degradation: Option<Degradation>,
}

/// Code block highlighter.
#[derive(Debug, Default, Clone, Copy)]
pub struct Highlighter;

impl Highlighter {
    pub fn new() -> Self {
        Self
    }

    /// Highlight a code block, with an optional language hint from markup.
    pub fn highlight(&self, text: &str, hint: Option<&str>) -> Highlighted {
        let text = reorganize_callouts(text);
        let (language, unresolved) = language::detect(&text, hint);
        let mut degradation = unresolved.map(|hint| Degradation::UnsupportedLanguage { hint });

        let lines = match language.syntax {
            None => plain_lines(&text),
            Some(syntax) => match tokenize(&text, syntax) {
                Ok(lines) => lines,
                Err(reason) => {
                    log::debug!("highlighting as {} failed: {reason}", language.name);
                    degradation = Some(Degradation::HighlightFailed { reason });
                    return Highlighted {
                        language: Language::PLAIN.name,
                        lines: plain_lines(&text),
                        degradation,
                    };
                }
            },
        };

        Highlighted {
            language: language.name,
            lines: trim_trailing_empty(lines),
            degradation,
        }
    }
}

fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

fn plain_lines(text: &str) -> Vec<HighlightedLine> {
    let lines = text
        .split('\n')
        .map(|line| HighlightedLine::uniform(strip_terminator(line), NEUTRAL))
        .collect();
    trim_trailing_empty(lines)
}

fn trim_trailing_empty(mut lines: Vec<HighlightedLine>) -> Vec<HighlightedLine> {
    while lines.last().is_some_and(|l| l.text.trim().is_empty()) {
        lines.pop();
    }
    lines
}

/// Category lookups are cached per block; scopes repeat heavily.
struct ScopeCategories {
    cache: HashMap<Scope, Option<TokenCategory>>,
}

impl ScopeCategories {
    fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    fn lookup(&mut self, scope: Scope) -> Option<TokenCategory> {
        *self
            .cache
            .entry(scope)
            .or_insert_with(|| category_for_scope(&scope.build_string()))
    }

    fn resolve(&mut self, stack: &ScopeStack) -> DualColor {
        let mapped: Vec<Option<TokenCategory>> =
            stack.as_slice().iter().map(|&s| self.lookup(s)).collect();
        category_for_stack(mapped.into_iter()).color()
    }
}

fn push_colored(line: &mut HighlightedLine, segment: &str, color: DualColor) {
    for ch in segment.chars() {
        if ch == '\n' || ch == '\r' {
            continue;
        }
        line.text.push(ch);
        line.colors.push(color);
    }
}

fn tokenize(text: &str, syntax: &SyntaxReference) -> Result<Vec<HighlightedLine>, String> {
    let mut state = ParseState::new(syntax);
    let mut stack = ScopeStack::new();
    let mut categories = ScopeCategories::new();
    let mut out = Vec::new();

    for line in LinesWithEndings::from(text) {
        let ops = state
            .parse_line(line, &SYNTAXES)
            .map_err(|e| e.to_string())?;

        let mut highlighted = HighlightedLine {
            text: String::with_capacity(line.len()),
            colors: Vec::with_capacity(line.len()),
        };
        let mut pos = 0;
        for (index, op) in &ops {
            let index = (*index).min(line.len());
            if index > pos {
                let color = categories.resolve(&stack);
                push_colored(&mut highlighted, &line[pos..index], color);
                pos = index;
            }
            stack.apply(op).map_err(|e| format!("{e:?}"))?;
        }
        if pos < line.len() {
            let color = categories.resolve(&stack);
            push_colored(&mut highlighted, &line[pos..], color);
        }
        out.push(highlighted);
    }

    Ok(out)
}
