//! Markup scanner: a thin event stream over the html5ever tokenizer.
//!
//! The tokenizer never fails. Parse errors are collected next to the events
//! so the caller can report the chapter as best effort.

use std::borrow::Cow;
use std::cell::RefCell;

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};

/// One attribute on a tag; names are lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: String,
}

/// A scanner event. Tag names are lowercase and text has entities decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    StartTag { name: String, attrs: Vec<Attr> },
    EndTag { name: String },
    SelfClosingTag { name: String, attrs: Vec<Attr> },
    Text(String),
}

/// Events plus the tokenizer's parse errors.
#[derive(Debug, Default, Clone)]
pub struct ScanOutput {
    pub events: Vec<ScanEvent>,
    pub errors: Vec<String>,
}

/// Look up an attribute value by name.
pub fn attr<'a>(attrs: &'a [Attr], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|a| a.name == name)
        .map(|a| a.value.as_str())
}

/// Decode chapter bytes, sniffing the encoding.
pub fn decode_chapter(bytes: &[u8]) -> Cow<'_, str> {
    crate::util::decode_text(bytes)
}

/// Drop a leading `<?xml ...?>` declaration, which the HTML tokenizer
/// would otherwise report as a parse error in every XHTML chapter.
fn strip_xml_declaration(text: &str) -> &str {
    let trimmed = text.trim_start();
    if trimmed.starts_with("<?xml")
        && let Some(end) = trimmed.find("?>")
    {
        return &trimmed[end + 2..];
    }
    text
}

/// Tokenize a chapter into scanner events.
pub fn scan(text: &str) -> ScanOutput {
    let sink = EventSink::default();
    let input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(strip_xml_declaration(text)));

    let tokenizer = Tokenizer::new(sink, TokenizerOpts::default());
    let _ = tokenizer.feed(&input);
    tokenizer.end();

    let output = tokenizer.sink.finish();
    if !output.errors.is_empty() {
        log::trace!(
            "scanner recovered from {} parse errors (first: {})",
            output.errors.len(),
            output.errors[0]
        );
    }
    output
}

/// Collects tokens into [`ScanEvent`]s.
///
/// Uses interior mutability because html5ever's TokenSink trait takes `&self`.
#[derive(Default)]
struct EventSink {
    events: RefCell<Vec<ScanEvent>>,
    errors: RefCell<Vec<String>>,
    text: RefCell<String>,
}

impl EventSink {
    fn flush_text(&self) {
        let mut text = self.text.borrow_mut();
        if !text.is_empty() {
            self.events
                .borrow_mut()
                .push(ScanEvent::Text(std::mem::take(&mut *text)));
        }
    }

    fn push_tag(&self, tag: Tag) -> TokenSinkResult<()> {
        self.flush_text();
        let name = tag.name.as_ref().to_ascii_lowercase();
        let mut events = self.events.borrow_mut();

        match tag.kind {
            TagKind::EndTag => {
                events.push(ScanEvent::EndTag { name });
                TokenSinkResult::Continue
            }
            TagKind::StartTag => {
                let attrs = tag
                    .attrs
                    .iter()
                    .map(|a| Attr {
                        name: a.name.local.as_ref().to_ascii_lowercase(),
                        value: a.value.to_string(),
                    })
                    .collect();

                if tag.self_closing {
                    events.push(ScanEvent::SelfClosingTag { name, attrs });
                    return TokenSinkResult::Continue;
                }

                let raw = raw_kind(&name);
                events.push(ScanEvent::StartTag { name, attrs });
                match raw {
                    Some(kind) => TokenSinkResult::RawData(kind),
                    None => TokenSinkResult::Continue,
                }
            }
        }
    }

    fn finish(self) -> ScanOutput {
        self.flush_text();
        ScanOutput {
            events: self.events.into_inner(),
            errors: self.errors.into_inner(),
        }
    }
}

/// Elements whose content is not markup.
fn raw_kind(name: &str) -> Option<RawKind> {
    match name {
        "script" => Some(RawKind::ScriptData),
        "style" | "xmp" | "iframe" | "noembed" | "noframes" => Some(RawKind::Rawtext),
        "title" | "textarea" => Some(RawKind::Rcdata),
        _ => None,
    }
}

impl TokenSink for EventSink {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => return self.push_tag(tag),
            Token::CharacterTokens(chars) => self.text.borrow_mut().push_str(&chars),
            Token::ParseError(msg) => self.errors.borrow_mut().push(msg.into_owned()),
            // Comments, doctypes, NUL and EOF carry no text
            _ => {}
        }
        TokenSinkResult::Continue
    }
}
