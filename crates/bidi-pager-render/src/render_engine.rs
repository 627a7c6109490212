use bidi_pager::navigation;
use bidi_pager::{AddressingError, ContentProvider, PagerError, Position};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::render_ir::{Page, PageParagraph, ParagraphLayout};
use crate::render_layout::{LayoutConfig, LayoutEngine};

/// Runtime diagnostics from layout and pagination.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderDiagnostic {
    /// A previous page was rebuilt from the cached top of its bottom.
    CacheHit { bottom: Position, top: Position },
    /// A previous page had to be derived by backward layout.
    CacheMiss { bottom: Position },
    /// A page or paragraph was refused because not even one line fits.
    InsufficientSpace { available: i64, required: i64 },
    /// Navigation ran past the first or last position of the content.
    EndOfContent { at: Position },
    /// An image had no usable size and is drawn as zero-size.
    MalformedAttribute { src: String },
}

impl RenderDiagnostic {
    /// Error equivalent, for diagnostics that mirror a [`PagerError`].
    pub fn as_error(&self) -> Option<PagerError> {
        match self {
            Self::InsufficientSpace {
                available,
                required,
            } => Some(PagerError::InsufficientSpace {
                available: *available,
                required: *required,
            }),
            Self::MalformedAttribute { src } => Some(PagerError::MalformedAttribute {
                attribute: "src",
                value: Some(src.clone()),
            }),
            _ => None,
        }
    }
}

type DiagnosticSink<'a> = Option<Box<dyn FnMut(RenderDiagnostic) + 'a>>;

/// Serializable copy of the previous-page cache.
///
/// Entries map a page's bottom position to its top position.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PageCacheSnapshot {
    pub entries: Vec<(Position, Position)>,
}

impl PageCacheSnapshot {
    /// Encode with postcard.
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        postcard::to_allocvec(self).ok()
    }

    /// Decode bytes produced by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        postcard::from_bytes(bytes).ok()
    }
}

/// Pagination state for one open document.
///
/// Holds the layout engine, a memo of paragraph layouts and the
/// previous-page cache that maps each visited page's bottom position to its
/// top. Both are dropped on [`reset`](Self::reset) and whenever the
/// configuration changes.
pub struct PaginationSession<'a, P: ContentProvider + ?Sized> {
    provider: &'a P,
    engine: LayoutEngine,
    previous_page_cache: HashMap<Position, Position>,
    layouts: HashMap<(usize, usize), Arc<ParagraphLayout>>,
    diagnostic_sink: DiagnosticSink<'a>,
}

impl<P: ContentProvider + ?Sized> fmt::Debug for PaginationSession<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginationSession")
            .field("engine", &self.engine)
            .field("cached_pages", &self.previous_page_cache.len())
            .field("cached_layouts", &self.layouts.len())
            .finish()
    }
}

impl<'a, P: ContentProvider + ?Sized> PaginationSession<'a, P> {
    pub fn new(provider: &'a P, engine: LayoutEngine) -> Self {
        Self {
            provider,
            engine,
            previous_page_cache: HashMap::new(),
            layouts: HashMap::new(),
            diagnostic_sink: None,
        }
    }

    /// Session with the default measurer.
    pub fn with_config(provider: &'a P, cfg: LayoutConfig) -> Self {
        Self::new(provider, LayoutEngine::new(cfg))
    }

    /// Register or replace the diagnostics sink.
    pub fn set_diagnostic_sink<F>(&mut self, sink: F)
    where
        F: FnMut(RenderDiagnostic) + 'a,
    {
        self.diagnostic_sink = Some(Box::new(sink));
    }

    fn emit(&mut self, diagnostic: RenderDiagnostic) {
        if let Some(sink) = self.diagnostic_sink.as_mut() {
            sink(diagnostic);
        }
    }

    pub fn provider(&self) -> &'a P {
        self.provider
    }

    pub fn config(&self) -> &LayoutConfig {
        self.engine.config()
    }

    /// Replace the layout configuration. Every layout and cached page is
    /// invalidated.
    pub fn set_config(&mut self, cfg: LayoutConfig) {
        self.engine.set_config(cfg);
        self.reset();
    }

    /// Drop cached layouts and previous-page entries, e.g. after the content
    /// changed.
    pub fn reset(&mut self) {
        self.previous_page_cache.clear();
        self.layouts.clear();
    }

    /// Cached top of the page ending at `bottom`.
    pub fn cached_previous_top(&self, bottom: Position) -> Option<Position> {
        self.previous_page_cache.get(&bottom).copied()
    }

    pub fn cache_snapshot(&self) -> PageCacheSnapshot {
        let mut entries: Vec<(Position, Position)> = self
            .previous_page_cache
            .iter()
            .map(|(bottom, top)| (*bottom, *top))
            .collect();
        entries.sort();
        PageCacheSnapshot { entries }
    }

    /// Merge a snapshot into the previous-page cache.
    pub fn restore_cache(&mut self, snapshot: &PageCacheSnapshot) {
        self.previous_page_cache
            .extend(snapshot.entries.iter().copied());
    }

    /// Layout of one paragraph, memoized for the session.
    ///
    /// `Ok(None)` when the content width cannot hold a line.
    pub fn paragraph_layout(
        &mut self,
        chapter: usize,
        index: usize,
    ) -> Result<Option<Arc<ParagraphLayout>>, PagerError> {
        if let Some(layout) = self.layouts.get(&(chapter, index)) {
            return Ok(Some(Arc::clone(layout)));
        }
        let provider = self.provider;
        let paragraph =
            provider
                .paragraph(chapter, index)
                .ok_or_else(|| AddressingError::Paragraph {
                    chapter,
                    paragraph: index,
                    paragraph_count: provider.paragraph_count(chapter),
                })?;
        let mut reported = Vec::new();
        let layout = self
            .engine
            .layout_paragraph_with(chapter, index, paragraph, &mut |d| reported.push(d));
        for diagnostic in reported {
            self.emit(diagnostic);
        }
        Ok(layout.map(|layout| {
            let layout = Arc::new(layout);
            self.layouts.insert((chapter, index), Arc::clone(&layout));
            layout
        }))
    }

    /// Height of the lines of `position`'s paragraph from its line onward.
    pub fn paragraph_height_from(&mut self, position: Position) -> Result<f64, PagerError> {
        navigation::checked_paragraph(self.provider, position)?;
        match self.paragraph_layout(position.chapter, position.paragraph)? {
            Some(layout) => layout.height_from(position.offset),
            None => Ok(0.0),
        }
    }

    /// Build the page whose first line contains `top`.
    ///
    /// The page ends when the next line would overflow the viewport or the
    /// chapter ends. A first line taller than the page is shown alone and
    /// clipped. `Ok(None)` when the content area cannot hold even a line of
    /// minimum height.
    pub fn build_page_forwardly(&mut self, top: Position) -> Result<Option<Page>, PagerError> {
        self.build_forward(top, None)
    }

    /// First page of `chapter`.
    pub fn page_at_chapter(&mut self, chapter: usize) -> Result<Option<Page>, PagerError> {
        let top = self.provider.chapter_first_paragraph(chapter).ok_or(
            AddressingError::Chapter {
                chapter,
                chapter_count: self.provider.chapter_count(),
            },
        )?;
        self.build_forward(top, None)
    }

    /// First page of the first non-empty chapter.
    pub fn first_page(&mut self) -> Result<Option<Page>, PagerError> {
        let first = (0..self.provider.chapter_count())
            .find_map(|chapter| self.provider.chapter_first_paragraph(chapter));
        match first {
            Some(top) => self.build_forward(top, None),
            None => Ok(None),
        }
    }

    /// Page following `current`. Remembers `current` so that stepping back
    /// from the returned page reuses its top.
    pub fn build_next_page(&mut self, current: &Page) -> Result<Option<Page>, PagerError> {
        self.validate(current)?;
        self.previous_page_cache.insert(current.bottom, current.top);
        let Some(top) = navigation::next_position(self.provider, current.bottom) else {
            log::debug!("no content after {}", current.bottom);
            self.emit(RenderDiagnostic::EndOfContent {
                at: current.bottom,
            });
            return Ok(None);
        };
        self.build_forward(top, None)
    }

    /// Page preceding `current`, from the cache when possible, otherwise by
    /// laying out lines bottom-up from the position before `current.top`.
    pub fn build_previous_page(&mut self, current: &Page) -> Result<Option<Page>, PagerError> {
        self.validate(current)?;
        let Some(bottom) = navigation::previous_position(self.provider, current.top) else {
            log::debug!("no content before {}", current.top);
            self.emit(RenderDiagnostic::EndOfContent { at: current.top });
            return Ok(None);
        };
        if let Some(top) = self.cached_previous_top(bottom) {
            log::debug!("previous page cache hit: {} -> {}", bottom, top);
            self.emit(RenderDiagnostic::CacheHit { bottom, top });
            return self.build_forward(top, None);
        }
        log::debug!("previous page cache miss at {}", bottom);
        self.emit(RenderDiagnostic::CacheMiss { bottom });
        let Some(top) = self.layout_backward(bottom)? else {
            return Ok(None);
        };
        self.build_forward(top, Some(bottom))
    }

    /// Page scrolled forward by one line.
    pub fn build_line_forward(&mut self, current: &Page) -> Result<Option<Page>, PagerError> {
        self.validate(current)?;
        if !self.is_line_forward_available(current) {
            return Ok(None);
        }
        let Some(first) = current.paragraphs.first() else {
            return Ok(None);
        };
        let top = match first.layout.lines.get(first.first_line + 1) {
            Some(line) => first.layout.position_of(line.range.start),
            None => match navigation::next_paragraph(self.provider, current.top) {
                Some(next) => next,
                None => return Ok(None),
            },
        };
        self.build_forward(top, None)
    }

    /// Page scrolled backward by one line.
    pub fn build_line_backward(&mut self, current: &Page) -> Result<Option<Page>, PagerError> {
        self.validate(current)?;
        if !self.is_line_backward_available(current) {
            return Ok(None);
        }
        let Some(first) = current.paragraphs.first() else {
            return Ok(None);
        };
        let top = if first.first_line > 0 {
            let line = &first.layout.lines[first.first_line - 1];
            first.layout.position_of(line.range.start)
        } else {
            let Some(prev) = navigation::previous_paragraph(self.provider, current.top) else {
                return Ok(None);
            };
            let Some(layout) = self.paragraph_layout(prev.chapter, prev.paragraph)? else {
                return Ok(None);
            };
            match layout.lines.last() {
                Some(line) => layout.position_of(line.range.start),
                None => return Ok(None),
            }
        };
        self.build_forward(top, None)
    }

    pub fn is_next_available(&self, page: &Page) -> bool {
        navigation::is_next_available(self.provider, page.bottom)
    }

    pub fn is_previous_available(&self, page: &Page) -> bool {
        navigation::is_previous_available(self.provider, page.top)
    }

    pub fn is_start_of_chapter(&self, page: &Page) -> bool {
        navigation::is_start_of_chapter(self.provider, page.top)
    }

    pub fn is_end_of_chapter(&self, page: &Page) -> bool {
        navigation::is_end_of_chapter(self.provider, page.bottom)
    }

    /// At the end of a chapter, scrolling on is only allowed while the page
    /// is more than half full.
    pub fn is_line_forward_available(&self, page: &Page) -> bool {
        if self.is_end_of_chapter(page) {
            page.content_height > self.config().content_height() / 2.0
        } else {
            true
        }
    }

    pub fn is_line_backward_available(&self, page: &Page) -> bool {
        !self.is_start_of_chapter(page)
    }

    pub fn content_height(&self, page: &Page) -> f64 {
        page.content_height
    }

    fn validate(&self, page: &Page) -> Result<(), PagerError> {
        if page.top > page.bottom {
            return Err(PagerError::InvalidNavigation("page top is after its bottom"));
        }
        let addressable = navigation::checked_paragraph(self.provider, page.top).is_ok()
            && navigation::checked_paragraph(self.provider, page.bottom).is_ok();
        if !addressable {
            return Err(PagerError::InvalidNavigation(
                "page positions are not addressable",
            ));
        }
        Ok(())
    }

    /// No line can be shown at all: the content area is empty or shorter
    /// than the minimum line height.
    fn viewport_too_short(&self, budget: f64) -> bool {
        budget <= 0.0 || budget < f64::from(self.config().min_line_height_px.max(0))
    }

    fn refuse(&mut self, available: f64, required: f64) {
        log::warn!(
            "page not built: {}px available, first line needs {}px",
            available,
            required
        );
        self.emit(RenderDiagnostic::InsufficientSpace {
            available: available.floor() as i64,
            required: required.ceil() as i64,
        });
    }

    /// Fill a page downward from `top`, within `top`'s chapter, optionally
    /// stopping after the line that contains `stop`.
    fn build_forward(
        &mut self,
        top: Position,
        stop: Option<Position>,
    ) -> Result<Option<Page>, PagerError> {
        navigation::checked_paragraph(self.provider, top)?;
        let budget = self.config().content_height();
        let gap = f64::from(self.config().paragraph_gap_px.max(0));
        let margin_top = f64::from(self.config().margin_top);

        let mut y = 0.0;
        let mut parts: Vec<PageParagraph> = Vec::new();
        let mut cursor = top;
        loop {
            let Some(layout) = self.paragraph_layout(cursor.chapter, cursor.paragraph)? else {
                return Ok(None);
            };
            let start_line = if parts.is_empty() {
                layout.line_index(top.offset)?
            } else {
                0
            };
            let lead = if parts.is_empty() { 0.0 } else { gap };
            let at_stop = stop.is_some_and(|s| {
                (s.chapter, s.paragraph) == (cursor.chapter, cursor.paragraph)
            });

            let mut shown: Option<(usize, f64)> = None;
            let mut full = false;
            for (idx, line) in layout.lines.iter().enumerate().skip(start_line) {
                if at_stop && stop.is_some_and(|s| line.range.start > s.offset) {
                    break;
                }
                let needed = line.height + if idx == start_line { lead } else { 0.0 };
                if y + needed > budget {
                    if parts.is_empty() && shown.is_none() {
                        if self.viewport_too_short(budget) {
                            self.refuse(budget, needed);
                            return Ok(None);
                        }
                        // Taller than the page: shown alone, clipped at the bottom margin.
                        log::debug!(
                            "line at {} needs {}px of {}px; clipped",
                            layout.position_of(line.range.start),
                            needed,
                            budget
                        );
                        shown = Some((idx, margin_top - line.location.y));
                        y = budget;
                    }
                    full = true;
                    break;
                }
                let origin_y = match shown {
                    Some((_, origin_y)) => origin_y,
                    None => margin_top + y + lead - line.location.y,
                };
                y += needed;
                shown = Some((idx, origin_y));
            }

            if let Some((last_line, origin_y)) = shown {
                parts.push(PageParagraph {
                    layout: Arc::clone(&layout),
                    first_line: start_line,
                    last_line,
                    origin_y,
                });
            }
            if full || at_stop {
                break;
            }
            match navigation::next_paragraph(self.provider, cursor) {
                Some(next) => cursor = next,
                None => break,
            }
        }

        let (Some(first), Some(last)) = (parts.first(), parts.last()) else {
            return Ok(None);
        };
        let (page_top, page_bottom) = (first.top(), last.bottom());
        let page = Page {
            top: page_top,
            bottom: page_bottom,
            content_height: y,
            paragraphs: parts,
        };
        log::trace!("page {} -> {} ({}px)", page.top, page.bottom, page.content_height);
        Ok(Some(page))
    }

    /// Top position of the fullest page ending with the line that contains
    /// `bottom`, accumulating whole lines upward within the chapter.
    ///
    /// A partially shown paragraph contributes only its shown lines.
    fn layout_backward(&mut self, bottom: Position) -> Result<Option<Position>, PagerError> {
        navigation::checked_paragraph(self.provider, bottom)?;
        let budget = self.config().content_height();
        let gap = f64::from(self.config().paragraph_gap_px.max(0));

        let mut y = 0.0;
        let mut top: Option<Position> = None;
        let mut cursor = bottom;
        loop {
            let Some(layout) = self.paragraph_layout(cursor.chapter, cursor.paragraph)? else {
                return Ok(None);
            };
            let (end_line, lead) = match top {
                None => (layout.line_index(bottom.offset)?, 0.0),
                Some(_) => (layout.lines.len().saturating_sub(1), gap),
            };
            for idx in (0..=end_line).rev() {
                let Some(line) = layout.lines.get(idx) else {
                    continue;
                };
                let needed = line.height + if idx == end_line { lead } else { 0.0 };
                if y + needed > budget {
                    if top.is_none() {
                        if self.viewport_too_short(budget) {
                            self.refuse(budget, needed);
                            return Ok(None);
                        }
                        return Ok(Some(layout.position_of(line.range.start)));
                    }
                    log::debug!("backward layout from {} stops at {:?}", bottom, top);
                    return Ok(top);
                }
                y += needed;
                top = Some(layout.position_of(line.range.start));
            }
            match navigation::previous_paragraph(self.provider, cursor) {
                Some(prev) => cursor = prev,
                None => {
                    log::debug!("backward layout from {} reached chapter start", bottom);
                    return Ok(top);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_layout::{wrapped_extent, TextExtent, TextMeasurer};
    use bidi_pager::{Chapter, Direction, Document, ResolvedTextStyle};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct FixedMeasurer;

    impl TextMeasurer for FixedMeasurer {
        fn measure(
            &self,
            text: &str,
            _style: &ResolvedTextStyle,
            _direction: Direction,
            max_width: Option<f64>,
        ) -> TextExtent {
            wrapped_extent(text.chars().count() as f64 * 10.0, 20.0, max_width)
        }
    }

    fn cfg(height: i32, gap: i32) -> LayoutConfig {
        LayoutConfig {
            display_width: 100,
            display_height: height,
            margin_left: 0,
            margin_right: 0,
            margin_top: 0,
            margin_bottom: 0,
            paragraph_gap_px: gap,
            min_line_height_px: 0,
            ..LayoutConfig::default()
        }
    }

    fn session(doc: &Document, height: i32, gap: i32) -> PaginationSession<'_, Document> {
        let engine = LayoutEngine::new(cfg(height, gap)).with_text_measurer(Arc::new(FixedMeasurer));
        PaginationSession::new(doc, engine)
    }

    /// Ten two-line paragraphs: "aaaa bbbb" / "cccc".
    fn ten_paragraphs() -> Document {
        let text = vec!["aaaa bbbb cccc"; 10].join("\n");
        let (doc, _) = Document::from_plain_text(&text, None);
        doc
    }

    fn built(result: Result<Option<Page>, PagerError>) -> Page {
        match result {
            Ok(Some(page)) => page,
            other => panic!("expected a page, got {:?}", other.map(|p| p.map(|p| p.top))),
        }
    }

    #[test]
    fn forward_page_fills_viewport() {
        let doc = ten_paragraphs();
        let mut s = session(&doc, 100, 0);
        let page = built(s.build_page_forwardly(Position::new(0, 0, 0)));
        assert_eq!(page.top, Position::new(0, 0, 0));
        assert_eq!(page.bottom, Position::new(0, 2, 8));
        assert_eq!(page.line_count(), 5);
        assert_eq!(page.content_height, 100.0);
        assert_eq!(page.paragraphs[2].origin_y, 80.0);
    }

    #[test]
    fn top_is_normalized_to_line_start() {
        let doc = ten_paragraphs();
        let mut s = session(&doc, 100, 0);
        let page = built(s.build_page_forwardly(Position::new(0, 1, 11)));
        assert_eq!(page.top, Position::new(0, 1, 9));
    }

    #[test]
    fn next_then_previous_hits_the_cache() {
        let doc = ten_paragraphs();
        let mut s = session(&doc, 100, 0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        s.set_diagnostic_sink(move |d| sink.borrow_mut().push(d));

        let first = built(s.build_page_forwardly(Position::new(0, 0, 0)));
        let second = built(s.build_next_page(&first));
        assert_eq!(second.top, Position::new(0, 2, 9));
        assert_eq!(second.bottom, Position::new(0, 4, 13));

        let back = built(s.build_previous_page(&second));
        assert_eq!(back, first);
        assert!(seen.borrow().contains(&RenderDiagnostic::CacheHit {
            bottom: Position::new(0, 2, 8),
            top: Position::new(0, 0, 0),
        }));
    }

    #[test]
    fn previous_page_without_cache_lays_out_backward() {
        let doc = ten_paragraphs();
        let mut s = session(&doc, 100, 0);
        let second = built(s.build_page_forwardly(Position::new(0, 2, 9)));
        let back = built(s.build_previous_page(&second));
        assert_eq!(back.top, Position::new(0, 0, 0));
        assert_eq!(back.bottom, Position::new(0, 2, 8));
        assert_eq!(back.line_count(), 5);
    }

    #[test]
    fn backward_layout_counts_paragraph_gaps() {
        let doc = ten_paragraphs();
        // 20px lines, 10px gaps: two paragraphs take 90px
        let mut s = session(&doc, 100, 10);
        let later = built(s.build_page_forwardly(Position::new(0, 5, 0)));
        let back = built(s.build_previous_page(&later));
        assert_eq!(back.bottom, Position::new(0, 4, 13));
        assert_eq!(back.top, Position::new(0, 3, 0));
        assert!(back.content_height <= 100.0);
        assert_eq!(back.content_height, 90.0);
    }

    #[test]
    fn pages_stop_at_chapter_end() {
        let (one, _) = Chapter::from_lines("aaaa", None);
        let (two, _) = Chapter::from_lines("bbbb\ncccc", None);
        let doc = Document::new(vec![one, two]);
        let mut s = session(&doc, 100, 0);
        let first = built(s.build_page_forwardly(Position::new(0, 0, 0)));
        assert_eq!(first.bottom, Position::new(0, 0, 3));
        assert!(s.is_end_of_chapter(&first));
        assert!(s.is_start_of_chapter(&first));
        assert!(s.is_next_available(&first));
        assert!(!s.is_previous_available(&first));
        // a single 20px line is not more than half of 100px
        assert!(!s.is_line_forward_available(&first));
        assert!(!s.is_line_backward_available(&first));

        let second = built(s.build_next_page(&first));
        assert_eq!(second.top, Position::new(1, 0, 0));
        assert!(s.is_start_of_chapter(&second));
        assert!(!s.is_next_available(&second));

        let back = built(s.build_previous_page(&second));
        assert_eq!(back, first);
    }

    #[test]
    fn end_of_content_yields_none() {
        let (doc, _) = Document::from_plain_text("aaaa", None);
        let mut s = session(&doc, 100, 0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        s.set_diagnostic_sink(move |d| sink.borrow_mut().push(d));
        let page = built(s.build_page_forwardly(Position::new(0, 0, 0)));
        assert!(matches!(s.build_next_page(&page), Ok(None)));
        assert!(matches!(s.build_previous_page(&page), Ok(None)));
        assert_eq!(
            seen.borrow().as_slice(),
            &[
                RenderDiagnostic::EndOfContent {
                    at: Position::new(0, 0, 3)
                },
                RenderDiagnostic::EndOfContent {
                    at: Position::new(0, 0, 0)
                },
            ]
        );
    }

    #[test]
    fn viewport_too_short_is_refused() {
        let doc = ten_paragraphs();
        let mut s = session(&doc, 100, 0);
        s.set_config(LayoutConfig {
            min_line_height_px: 14,
            ..cfg(10, 0)
        });
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        s.set_diagnostic_sink(move |d| sink.borrow_mut().push(d));
        assert!(matches!(
            s.build_page_forwardly(Position::new(0, 0, 0)),
            Ok(None)
        ));
        let diagnostic = seen.borrow().first().cloned();
        assert_eq!(
            diagnostic,
            Some(RenderDiagnostic::InsufficientSpace {
                available: 10,
                required: 20
            })
        );
        assert!(diagnostic
            .and_then(|d| d.as_error())
            .is_some_and(|e| e.is_recoverable()));
    }

    #[test]
    fn line_taller_than_the_page_is_shown_alone() {
        // "bbbb.." is wrapped to six 20px rows in a 50px wide, 60px high page
        let text = format!("aaaa\n{}\ncccc", "b".repeat(30));
        let (doc, _) = Document::from_plain_text(&text, None);
        let engine = LayoutEngine::new(LayoutConfig {
            display_width: 50,
            ..cfg(60, 0)
        })
        .with_text_measurer(Arc::new(FixedMeasurer));
        let mut s = PaginationSession::new(&doc, engine);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        s.set_diagnostic_sink(move |d| sink.borrow_mut().push(d));

        let first = built(s.build_page_forwardly(Position::new(0, 0, 0)));
        assert_eq!(first.bottom, Position::new(0, 0, 3));
        assert!(s.is_next_available(&first));

        let tall = built(s.build_next_page(&first));
        assert_eq!(tall.top, Position::new(0, 1, 0));
        assert_eq!(tall.bottom, Position::new(0, 1, 29));
        assert_eq!(tall.line_count(), 1);
        assert_eq!(tall.content_height, 60.0);
        assert_eq!(tall.paragraphs[0].origin_y, 0.0);

        let last = built(s.build_next_page(&tall));
        assert_eq!(last.top, Position::new(0, 2, 0));
        assert!(!s.is_next_available(&last));

        let mut fresh = PaginationSession::new(
            &doc,
            LayoutEngine::new(LayoutConfig {
                display_width: 50,
                ..cfg(60, 0)
            })
            .with_text_measurer(Arc::new(FixedMeasurer)),
        );
        let back = built(fresh.build_previous_page(&last));
        assert_eq!(back, tall);
        assert!(!seen
            .borrow()
            .iter()
            .any(|d| matches!(d, RenderDiagnostic::InsufficientSpace { .. })));
    }

    #[test]
    fn line_forward_at_chapter_end_needs_a_half_full_page() {
        let (chapter, _) = Chapter::from_lines("aaaa bbbb cccc\naaaa bbbb cccc", None);
        let doc = Document::new(vec![chapter]);
        let mut s = session(&doc, 100, 0);
        let page = built(s.build_page_forwardly(Position::new(0, 0, 0)));
        assert!(s.is_end_of_chapter(&page));
        assert_eq!(page.content_height, 80.0);
        assert!(s.is_line_forward_available(&page));

        let down = built(s.build_line_forward(&page));
        assert_eq!(down.top, Position::new(0, 0, 9));
        assert_eq!(down.content_height, 60.0);
        assert!(s.is_line_forward_available(&down));

        let down_again = built(s.build_line_forward(&down));
        assert_eq!(down_again.top, Position::new(0, 1, 0));
        assert_eq!(down_again.content_height, 40.0);
        assert!(!s.is_line_forward_available(&down_again));
        assert!(matches!(s.build_line_forward(&down_again), Ok(None)));
    }

    #[test]
    fn invalid_pages_are_rejected() {
        let doc = ten_paragraphs();
        let mut s = session(&doc, 100, 0);
        let mut page = built(s.build_page_forwardly(Position::new(0, 0, 0)));
        page.top = Position::new(0, 5, 0);
        assert!(matches!(
            s.build_next_page(&page),
            Err(PagerError::InvalidNavigation(_))
        ));
        page.top = Position::new(0, 0, 0);
        page.bottom = Position::new(7, 0, 0);
        assert!(matches!(
            s.build_previous_page(&page),
            Err(PagerError::InvalidNavigation(_))
        ));
        assert!(matches!(
            s.build_page_forwardly(Position::new(0, 0, 99)),
            Err(PagerError::Addressing(_))
        ));
    }

    #[test]
    fn line_scrolling_moves_by_one_line() {
        let doc = ten_paragraphs();
        let mut s = session(&doc, 100, 0);
        let page = built(s.build_page_forwardly(Position::new(0, 0, 0)));
        let down = built(s.build_line_forward(&page));
        assert_eq!(down.top, Position::new(0, 0, 9));
        let down_again = built(s.build_line_forward(&down));
        assert_eq!(down_again.top, Position::new(0, 1, 0));
        let up = built(s.build_line_backward(&down_again));
        assert_eq!(up.top, Position::new(0, 0, 9));
        assert!(matches!(s.build_line_backward(&page), Ok(None)));
    }

    #[test]
    fn cache_snapshot_survives_postcard_round_trip() {
        let doc = ten_paragraphs();
        let mut s = session(&doc, 100, 0);
        let first = built(s.build_page_forwardly(Position::new(0, 0, 0)));
        let second = built(s.build_next_page(&first));
        let bytes = s
            .cache_snapshot()
            .to_bytes()
            .unwrap_or_else(|| panic!("encode failed"));

        let mut fresh = session(&doc, 100, 0);
        let snapshot =
            PageCacheSnapshot::from_bytes(&bytes).unwrap_or_else(|| panic!("decode failed"));
        assert_eq!(snapshot.entries, vec![(first.bottom, first.top)]);
        fresh.restore_cache(&snapshot);
        assert_eq!(fresh.cached_previous_top(first.bottom), Some(first.top));
        let back = built(fresh.build_previous_page(&second));
        assert_eq!(back.top, first.top);
    }

    #[test]
    fn set_config_invalidates_cache_and_layouts() {
        let doc = ten_paragraphs();
        let mut s = session(&doc, 100, 0);
        let first = built(s.build_page_forwardly(Position::new(0, 0, 0)));
        let _ = s.build_next_page(&first);
        assert!(s.cached_previous_top(first.bottom).is_some());
        s.set_config(cfg(200, 0));
        assert!(s.cached_previous_top(first.bottom).is_none());
        let taller = built(s.build_page_forwardly(Position::new(0, 0, 0)));
        assert_eq!(taller.line_count(), 10);
    }

    #[test]
    fn paragraph_height_from_counts_remaining_lines() {
        let doc = ten_paragraphs();
        let mut s = session(&doc, 100, 0);
        assert_eq!(s.paragraph_height_from(Position::new(0, 0, 0)).ok(), Some(40.0));
        assert_eq!(s.paragraph_height_from(Position::new(0, 0, 10)).ok(), Some(20.0));
    }
}
