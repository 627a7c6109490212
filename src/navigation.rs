//! Content addressing: positions, the content provider seam, and neighbour
//! traversal across paragraph and chapter boundaries.
//!
//! # Usage
//!
//! ```rust
//! use bidi_pager::{next_position, ContentProvider, Document, Position};
//!
//! let (doc, _) = Document::from_plain_text("first\nsecond", None);
//! let end_of_first = Position::new(0, 0, 4);
//! assert_eq!(next_position(&doc, end_of_first), Some(Position::new(0, 1, 0)));
//! assert_eq!(doc.chapter_count(), 1);
//! ```

use core::fmt;

use crate::content::{Document, Paragraph};
use crate::error::{AddressingError, PagerError};

/// Totally ordered document address: chapter, then paragraph, then
/// character offset inside the paragraph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub chapter: usize,
    pub paragraph: usize,
    pub offset: usize,
}

impl Position {
    pub const fn new(chapter: usize, paragraph: usize, offset: usize) -> Self {
        Self {
            chapter,
            paragraph,
            offset,
        }
    }

    /// Same paragraph, different offset.
    pub const fn with_offset(self, offset: usize) -> Self {
        Self { offset, ..self }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.chapter, self.paragraph, self.offset)
    }
}

/// Address of a word across the whole document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WordRef {
    pub chapter: usize,
    pub paragraph: usize,
    pub word: usize,
}

/// Source of paragraphs for layout and pagination.
pub trait ContentProvider {
    fn chapter_count(&self) -> usize;

    /// Paragraph count of `chapter`; 0 for unknown chapters.
    fn paragraph_count(&self, chapter: usize) -> usize;

    fn paragraph(&self, chapter: usize, paragraph: usize) -> Option<&Paragraph>;

    /// Paragraph addressed by `position`, ignoring its offset.
    fn paragraph_at(&self, position: Position) -> Option<&Paragraph> {
        self.paragraph(position.chapter, position.paragraph)
    }

    /// First position of `chapter`.
    fn chapter_first_paragraph(&self, chapter: usize) -> Option<Position> {
        self.paragraph(chapter, 0)
            .map(|p| Position::new(chapter, 0, p.start_offset()))
    }

    /// Last position of `chapter`.
    fn chapter_last_paragraph(&self, chapter: usize) -> Option<Position> {
        let last = self.paragraph_count(chapter).checked_sub(1)?;
        self.paragraph(chapter, last)
            .map(|p| Position::new(chapter, last, p.end_offset()))
    }
}

impl ContentProvider for Document {
    fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    fn paragraph_count(&self, chapter: usize) -> usize {
        self.chapters
            .get(chapter)
            .map(|c| c.paragraphs.len())
            .unwrap_or(0)
    }

    fn paragraph(&self, chapter: usize, paragraph: usize) -> Option<&Paragraph> {
        self.chapters.get(chapter)?.paragraphs.get(paragraph)
    }
}

/// Resolve `position` to its paragraph, checking every coordinate.
pub fn checked_paragraph<P: ContentProvider + ?Sized>(
    provider: &P,
    position: Position,
) -> Result<&Paragraph, PagerError> {
    let chapter_count = provider.chapter_count();
    if position.chapter >= chapter_count {
        return Err(AddressingError::Chapter {
            chapter: position.chapter,
            chapter_count,
        }
        .into());
    }
    let paragraph = provider
        .paragraph_at(position)
        .ok_or(AddressingError::Paragraph {
            chapter: position.chapter,
            paragraph: position.paragraph,
            paragraph_count: provider.paragraph_count(position.chapter),
        })?;
    if position.offset > paragraph.end_offset() {
        return Err(AddressingError::Position {
            position,
            end_offset: paragraph.end_offset(),
        }
        .into());
    }
    Ok(paragraph)
}

/// First position of the paragraph after `position`'s paragraph in the same
/// chapter.
pub fn next_paragraph<P: ContentProvider + ?Sized>(
    provider: &P,
    position: Position,
) -> Option<Position> {
    let next = position.paragraph + 1;
    provider
        .paragraph(position.chapter, next)
        .map(|p| Position::new(position.chapter, next, p.start_offset()))
}

/// Last position of the paragraph before `position`'s paragraph in the same
/// chapter.
pub fn previous_paragraph<P: ContentProvider + ?Sized>(
    provider: &P,
    position: Position,
) -> Option<Position> {
    let prev = position.paragraph.checked_sub(1)?;
    provider
        .paragraph(position.chapter, prev)
        .map(|p| Position::new(position.chapter, prev, p.end_offset()))
}

/// First position of the next non-empty chapter.
pub fn next_chapter<P: ContentProvider + ?Sized>(
    provider: &P,
    position: Position,
) -> Option<Position> {
    (position.chapter + 1..provider.chapter_count())
        .find_map(|chapter| provider.chapter_first_paragraph(chapter))
}

/// Last position of the previous non-empty chapter.
pub fn previous_chapter<P: ContentProvider + ?Sized>(
    provider: &P,
    position: Position,
) -> Option<Position> {
    (0..position.chapter)
        .rev()
        .find_map(|chapter| provider.chapter_last_paragraph(chapter))
}

/// Position one character after `position`: the next offset in the same
/// paragraph, else the next paragraph's first offset, else the next
/// chapter's first offset. `None` at the end of the content.
pub fn next_position<P: ContentProvider + ?Sized>(
    provider: &P,
    position: Position,
) -> Option<Position> {
    let paragraph = provider.paragraph_at(position)?;
    if position.offset < paragraph.end_offset() {
        return Some(position.with_offset(position.offset + 1));
    }
    next_paragraph(provider, position).or_else(|| next_chapter(provider, position))
}

/// Mirror of [`next_position`]. `None` at the start of the content.
pub fn previous_position<P: ContentProvider + ?Sized>(
    provider: &P,
    position: Position,
) -> Option<Position> {
    let paragraph = provider.paragraph_at(position)?;
    if position.offset > paragraph.start_offset() {
        return Some(position.with_offset(position.offset - 1));
    }
    previous_paragraph(provider, position).or_else(|| previous_chapter(provider, position))
}

/// Content exists after `position`, in this paragraph or any later one.
pub fn is_next_available<P: ContentProvider + ?Sized>(provider: &P, position: Position) -> bool {
    next_position(provider, position).is_some()
}

/// Content exists before `position`, in this paragraph or any earlier one.
pub fn is_previous_available<P: ContentProvider + ?Sized>(
    provider: &P,
    position: Position,
) -> bool {
    previous_position(provider, position).is_some()
}

/// `position` is the first offset of the first paragraph of its chapter.
pub fn is_start_of_chapter<P: ContentProvider + ?Sized>(
    provider: &P,
    position: Position,
) -> bool {
    let Some(paragraph) = provider.paragraph_at(position) else {
        return false;
    };
    previous_paragraph(provider, position).is_none() && position.offset == paragraph.start_offset()
}

/// `position` is the last offset of the last paragraph of its chapter.
pub fn is_end_of_chapter<P: ContentProvider + ?Sized>(provider: &P, position: Position) -> bool {
    let Some(paragraph) = provider.paragraph_at(position) else {
        return false;
    };
    next_paragraph(provider, position).is_none() && position.offset == paragraph.end_offset()
}

/// Word following `word`, crossing into the next paragraph of the chapter.
pub fn next_word<P: ContentProvider + ?Sized>(provider: &P, word: WordRef) -> Option<WordRef> {
    let paragraph = provider.paragraph(word.chapter, word.paragraph)?;
    if let Some(next) = paragraph.word_after(word.word) {
        return Some(WordRef { word: next, ..word });
    }
    let mut index = word.paragraph + 1;
    while let Some(p) = provider.paragraph(word.chapter, index) {
        if !p.is_empty() {
            return Some(WordRef {
                chapter: word.chapter,
                paragraph: index,
                word: 0,
            });
        }
        index += 1;
    }
    None
}

/// Word preceding `word`, crossing into the previous paragraph of the chapter.
pub fn previous_word<P: ContentProvider + ?Sized>(provider: &P, word: WordRef) -> Option<WordRef> {
    let paragraph = provider.paragraph(word.chapter, word.paragraph)?;
    if let Some(prev) = paragraph.word_before(word.word) {
        return Some(WordRef { word: prev, ..word });
    }
    let mut index = word.paragraph;
    while index > 0 {
        index -= 1;
        if let Some(p) = provider.paragraph(word.chapter, index) {
            if let Some(last) = p.words.len().checked_sub(1) {
                return Some(WordRef {
                    chapter: word.chapter,
                    paragraph: index,
                    word: last,
                });
            }
        }
    }
    None
}
