//! Error taxonomy shared by tokenization, layout and pagination.

use core::fmt;

use crate::navigation::Position;

/// Lookup failure context for [`PagerError::Addressing`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddressingError {
    /// Character offset is not covered by any laid-out line.
    Offset {
        /// Offset that was looked up.
        offset: usize,
        /// Number of lines that were searched.
        line_count: usize,
    },
    /// Chapter index past the end of the content.
    Chapter {
        /// Requested chapter.
        chapter: usize,
        /// Chapters available.
        chapter_count: usize,
    },
    /// Paragraph index past the end of its chapter.
    Paragraph {
        /// Chapter searched.
        chapter: usize,
        /// Requested paragraph.
        paragraph: usize,
        /// Paragraphs available in the chapter.
        paragraph_count: usize,
    },
    /// Position offset past the end of its paragraph.
    Position {
        /// Offending position.
        position: Position,
        /// Last valid offset of the paragraph.
        end_offset: usize,
    },
}

impl fmt::Display for AddressingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offset { offset, line_count } => {
                write!(f, "offset {} is not covered by any of {} lines", offset, line_count)
            }
            Self::Chapter {
                chapter,
                chapter_count,
            } => write!(f, "chapter {} out of range ({} chapters)", chapter, chapter_count),
            Self::Paragraph {
                chapter,
                paragraph,
                paragraph_count,
            } => write!(
                f,
                "paragraph {} out of range in chapter {} ({} paragraphs)",
                paragraph, chapter, paragraph_count
            ),
            Self::Position {
                position,
                end_offset,
            } => write!(
                f,
                "position {} past paragraph end offset {}",
                position, end_offset
            ),
        }
    }
}

/// Errors surfaced by the pager.
///
/// `MalformedAttribute` and `InsufficientSpace` are recovered where they occur
/// and only ever travel as diagnostics; the other variants are returned to the
/// caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PagerError {
    /// An offset or position lookup found no containing interval.
    Addressing(AddressingError),
    /// An image marker attribute was missing or unparsable; size defaulted to zero.
    MalformedAttribute {
        /// Attribute name (`width`, `height`, `src`).
        attribute: &'static str,
        /// Raw value, when one was present.
        value: Option<String>,
    },
    /// Viewport too small to place a single line.
    InsufficientSpace {
        /// Space available in px.
        available: i64,
        /// Space the first line needs in px.
        required: i64,
    },
    /// Navigation was requested from a page whose positions are not usable.
    InvalidNavigation(&'static str),
    /// Content markup could not be read.
    Markup {
        /// Parser message.
        message: String,
        /// Byte offset into the markup source.
        offset: usize,
    },
}

impl PagerError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Addressing(_) => "ADDRESSING",
            Self::MalformedAttribute { .. } => "MALFORMED_ATTRIBUTE",
            Self::InsufficientSpace { .. } => "INSUFFICIENT_SPACE",
            Self::InvalidNavigation(_) => "INVALID_NAVIGATION",
            Self::Markup { .. } => "MARKUP",
        }
    }

    /// Whether layout continues after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MalformedAttribute { .. } | Self::InsufficientSpace { .. }
        )
    }
}

impl fmt::Display for PagerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.code())?;
        match self {
            Self::Addressing(err) => write!(f, "{}", err),
            Self::MalformedAttribute { attribute, value } => match value {
                Some(value) => write!(f, "image attribute {}={:?} is not usable", attribute, value),
                None => write!(f, "image attribute {} is missing", attribute),
            },
            Self::InsufficientSpace {
                available,
                required,
            } => write!(
                f,
                "{}px available but at least {}px required",
                available, required
            ),
            Self::InvalidNavigation(reason) => write!(f, "{}", reason),
            Self::Markup { message, offset } => {
                write!(f, "{} [offset={}]", message, offset)
            }
        }
    }
}

impl std::error::Error for PagerError {}

impl From<AddressingError> for PagerError {
    fn from(err: AddressingError) -> Self {
        PagerError::Addressing(err)
    }
}
