//! Line layout, pagination and render IR for `bidi-pager`.
//!
//! [`LayoutEngine`] turns a [`bidi_pager::Paragraph`] into measured, placed
//! [`Line`]s; [`PaginationSession`] stacks paragraph layouts into [`Page`]s
//! and navigates between them.

#![cfg_attr(
    not(test),
    deny(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

mod render_engine;
mod render_ir;
mod render_layout;

pub use bidi_pager::{Alignment, Direction, Position};
pub use render_engine::{PageCacheSnapshot, PaginationSession, RenderDiagnostic};
pub use render_ir::{
    Line, Page, PageHit, PageParagraph, ParagraphLayout, PlacedWord, Point, Rect, WordProbe,
};
pub use render_layout::{
    wrapped_extent, HeuristicMeasurer, ImageDecoder, LayoutConfig, LayoutEngine, LineBuilder,
    TextExtent, TextMeasurer,
};
