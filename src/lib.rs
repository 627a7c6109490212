//! Word model, tokenizer and content structure for paginated mixed
//! right-to-left/left-to-right prose.
//!
//! Raw paragraph text is tokenized into directional [`Word`]s, grouped into
//! [`Paragraph`]s and [`Chapter`]s, and addressed with [`Position`]s. The
//! `bidi-pager-render` crate lays these out into lines and pages.

#![cfg_attr(
    not(test),
    deny(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented
    )
)]

pub mod content;
pub mod error;
pub mod interval;
pub mod markup;
pub mod navigation;
pub mod style;
pub mod tokenizer;
pub mod word;

pub use content::{Alignment, Chapter, Document, Paragraph};
pub use error::{AddressingError, PagerError};
pub use interval::{binary_search, complement_index, Interval, IntervalOrd};
pub use markup::{parse_markup, LoadedDocument};
pub use navigation::{
    checked_paragraph, is_end_of_chapter, is_next_available, is_previous_available,
    is_start_of_chapter, next_chapter, next_paragraph, next_position, next_word,
    previous_chapter, previous_paragraph, previous_position, previous_word, ContentProvider,
    Position, WordRef,
};
pub use style::{ResolvedTextStyle, TextStyle};
pub use tokenizer::{resolve_neutrals, tokenize, Tokenized};
pub use word::{is_inert_char, is_rtl_char, Direction, ImageSpec, Word, WordKind};
