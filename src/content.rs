//! Paragraph, chapter and document containers.
//!
//! Content is stored as an arena: a document owns its chapters, a chapter
//! owns its paragraphs, a paragraph owns its words. Neighbour links are plain
//! indices resolved through [`crate::navigation`].

use crate::error::PagerError;
use crate::interval::binary_search;
use crate::style::TextStyle;
use crate::tokenizer::tokenize;
use crate::word::{Direction, Word};

/// Horizontal alignment of a paragraph's lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Alignment {
    Left,
    Center,
    Right,
    #[default]
    Justify,
}

impl Alignment {
    /// Parse a markup `align` attribute value.
    pub fn from_attr(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Self::Left),
            "center" | "centre" => Some(Self::Center),
            "right" => Some(Self::Right),
            "justify" => Some(Self::Justify),
            _ => None,
        }
    }
}

/// One paragraph of tokenized text.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Paragraph {
    pub words: Vec<Word>,
    pub direction: Direction,
    pub alignment: Alignment,
    /// Paragraph-level style overrides; word styles are applied on top.
    pub style: TextStyle,
}

impl Paragraph {
    pub fn new(words: Vec<Word>, direction: Direction) -> Self {
        Self {
            words,
            direction,
            alignment: Alignment::default(),
            style: TextStyle::default(),
        }
    }

    /// Tokenize `text` into a paragraph. Recovered tokenizer problems are
    /// returned alongside.
    pub fn from_text(text: &str, direction: Option<Direction>) -> (Self, Vec<PagerError>) {
        let out = tokenize(text, direction);
        (Self::new(out.words, out.direction), out.diagnostics)
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Number of characters covered by the paragraph's words.
    pub fn char_len(&self) -> usize {
        self.words.last().map(|w| w.range.end + 1).unwrap_or(0)
    }

    pub fn start_offset(&self) -> usize {
        self.words.first().map(|w| w.range.start).unwrap_or(0)
    }

    /// Last character offset; an empty paragraph is addressed at offset 0.
    pub fn end_offset(&self) -> usize {
        self.words.last().map(|w| w.range.end).unwrap_or(0)
    }

    /// Index of the word covering `offset`.
    pub fn word_at_offset(&self, offset: usize) -> Option<usize> {
        binary_search(&self.words, &offset).ok()
    }

    /// Index of the word following `index` inside this paragraph.
    pub fn word_after(&self, index: usize) -> Option<usize> {
        let next = index.checked_add(1)?;
        (next < self.words.len()).then_some(next)
    }

    /// Index of the word preceding `index` inside this paragraph.
    pub fn word_before(&self, index: usize) -> Option<usize> {
        if index == 0 || index > self.words.len() {
            None
        } else {
            Some(index - 1)
        }
    }

    /// Plain text of the paragraph, reassembled from its words.
    pub fn text(&self) -> String {
        self.words.iter().map(|w| w.text.as_str()).collect()
    }
}

/// Ordered paragraphs of one chapter.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Chapter {
    pub title: Option<String>,
    pub paragraphs: Vec<Paragraph>,
}

impl Chapter {
    pub fn new(paragraphs: Vec<Paragraph>) -> Self {
        Self {
            title: None,
            paragraphs,
        }
    }

    /// Build a chapter with one paragraph per non-blank line.
    pub fn from_lines(text: &str, direction: Option<Direction>) -> (Self, Vec<PagerError>) {
        let mut diagnostics = Vec::new();
        let mut paragraphs = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (paragraph, mut errs) = Paragraph::from_text(line, direction);
            diagnostics.append(&mut errs);
            paragraphs.push(paragraph);
        }
        (Self::new(paragraphs), diagnostics)
    }
}

/// Whole document: the default content provider.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    pub chapters: Vec<Chapter>,
}

impl Document {
    pub fn new(chapters: Vec<Chapter>) -> Self {
        Self { chapters }
    }

    /// Single-chapter document with one paragraph per non-blank line.
    pub fn from_plain_text(text: &str, direction: Option<Direction>) -> (Self, Vec<PagerError>) {
        let (chapter, diagnostics) = Chapter::from_lines(text, direction);
        (Self::new(vec![chapter]), diagnostics)
    }

    pub fn paragraph_total(&self) -> usize {
        self.chapters.iter().map(|c| c.paragraphs.len()).sum()
    }
}
