//! Loader for the small marked-up text format used by sample content.
//!
//! ```xml
//! <book>
//!   <chapter title="One">
//!     <p dir="rtl" align="justify">متن <img src="a.png" width="40" height="30"/> تستی</p>
//!   </chapter>
//! </book>
//! ```
//!
//! `<book>` and `<chapter>` are optional; paragraphs outside any chapter land
//! in an implicit first chapter. Inline `<img/>` markers are passed through to
//! the tokenizer unchanged.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::content::{Alignment, Chapter, Document, Paragraph};
use crate::error::PagerError;
use crate::style::TextStyle;
use crate::tokenizer::tokenize;
use crate::word::Direction;

/// Parsed document plus recovered tokenizer diagnostics.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadedDocument {
    pub document: Document,
    pub diagnostics: Vec<PagerError>,
}

#[derive(Default)]
struct ParagraphBuilder {
    text: String,
    direction: Option<Direction>,
    alignment: Option<Alignment>,
    style: TextStyle,
}

impl ParagraphBuilder {
    fn from_tag(reader: &Reader<&[u8]>, e: &BytesStart<'_>) -> Self {
        let mut out = Self::default();
        for attr in e.attributes().flatten() {
            let value = reader
                .decoder()
                .decode(attr.value.as_ref())
                .unwrap_or_default();
            match attr.key.as_ref() {
                b"dir" => out.direction = Direction::from_attr(&value),
                b"align" => out.alignment = Alignment::from_attr(&value),
                b"size" => {
                    out.style.size_px = value
                        .trim()
                        .trim_end_matches("px")
                        .parse::<f32>()
                        .ok()
                        .filter(|v| v.is_finite() && *v > 0.0)
                }
                b"family" if !value.trim().is_empty() => {
                    out.style.family = Some(value.trim().to_string())
                }
                _ => {}
            }
        }
        out
    }

    fn finish(self, diagnostics: &mut Vec<PagerError>) -> Paragraph {
        let out = tokenize(self.text.trim(), self.direction);
        diagnostics.extend(out.diagnostics);
        Paragraph::new(out.words, out.direction)
            .with_alignment(self.alignment.unwrap_or_default())
            .with_style(self.style)
    }
}

/// Parse marked-up content into a [`Document`].
pub fn parse_markup(source: &str) -> Result<LoadedDocument, PagerError> {
    let mut reader = Reader::from_reader(source.as_bytes());
    reader.config_mut().trim_text(false);

    let mut buf = Vec::with_capacity(64);
    let mut chapters: Vec<Chapter> = Vec::new();
    let mut chapter: Option<Chapter> = None;
    let mut paragraph: Option<ParagraphBuilder> = None;
    let mut diagnostics = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"chapter" => {
                    if let Some(done) = chapter.take() {
                        chapters.push(done);
                    }
                    chapter = Some(Chapter {
                        title: chapter_title(&reader, &e),
                        paragraphs: Vec::new(),
                    });
                }
                b"p" => {
                    if let Some(open) = paragraph.take() {
                        push_paragraph(&mut chapter, open.finish(&mut diagnostics));
                    }
                    paragraph = Some(ParagraphBuilder::from_tag(&reader, &e));
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"p" => {
                    let empty = ParagraphBuilder::from_tag(&reader, &e);
                    push_paragraph(&mut chapter, empty.finish(&mut diagnostics));
                }
                b"chapter" => {
                    if let Some(done) = chapter.take() {
                        chapters.push(done);
                    }
                    chapters.push(Chapter {
                        title: chapter_title(&reader, &e),
                        paragraphs: Vec::new(),
                    });
                }
                b"img" => {
                    if let Some(open) = paragraph.as_mut() {
                        let raw: &[u8] = &e;
                        let body = reader.decoder().decode(raw).unwrap_or_default();
                        open.text.push('<');
                        open.text.push_str(&body);
                        open.text.push_str("/>");
                    }
                }
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"p" => {
                    if let Some(open) = paragraph.take() {
                        push_paragraph(&mut chapter, open.finish(&mut diagnostics));
                    }
                }
                b"chapter" => {
                    if let Some(open) = paragraph.take() {
                        push_paragraph(&mut chapter, open.finish(&mut diagnostics));
                    }
                    if let Some(done) = chapter.take() {
                        chapters.push(done);
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if let Some(open) = paragraph.as_mut() {
                    let text = e.decode().map_err(|err| markup_error(&reader, err))?;
                    open.text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(open) = paragraph.as_mut() {
                    let raw: &[u8] = &e;
                    open.text
                        .push_str(&reader.decoder().decode(raw).unwrap_or_default());
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if let Some(open) = paragraph.as_mut() {
                    let name = e.decode().map_err(|err| markup_error(&reader, err))?;
                    let entity = format!("&{};", name);
                    let resolved = quick_xml::escape::unescape(&entity)
                        .map_err(|err| markup_error(&reader, err))?;
                    open.text.push_str(&resolved);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(markup_error(&reader, err)),
        }
        buf.clear();
    }

    if let Some(open) = paragraph.take() {
        push_paragraph(&mut chapter, open.finish(&mut diagnostics));
    }
    if let Some(done) = chapter.take() {
        chapters.push(done);
    }

    Ok(LoadedDocument {
        document: Document::new(chapters),
        diagnostics,
    })
}

fn push_paragraph(chapter: &mut Option<Chapter>, paragraph: Paragraph) {
    chapter
        .get_or_insert_with(Chapter::default)
        .paragraphs
        .push(paragraph);
}

fn chapter_title(reader: &Reader<&[u8]>, e: &BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"title")
        .map(|attr| {
            reader
                .decoder()
                .decode(attr.value.as_ref())
                .unwrap_or_default()
                .into_owned()
        })
}

fn markup_error(reader: &Reader<&[u8]>, err: impl core::fmt::Debug) -> PagerError {
    PagerError::Markup {
        message: format!("{:?}", err),
        offset: usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX),
    }
}
