use core::cmp::Ordering;
use std::sync::Arc;

use bidi_pager::{
    binary_search, AddressingError, Alignment, Direction, Interval, IntervalOrd, PagerError,
    Position, ResolvedTextStyle, WordKind,
};
use serde::{Deserialize, Serialize};

/// Point in layout pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in layout pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left x.
    pub x: f64,
    /// Top y.
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    fn translated(self, dy: f64) -> Self {
        Self {
            y: self.y + dy,
            ..self
        }
    }
}

/// Word after measurement and placement.
///
/// `width`/`height` are the measured (and possibly scaled) box, `extra_width`
/// is the justification stretch added after the word. The advance of the word
/// along its line is `width + extra_width`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacedWord {
    /// Index of the source word in its paragraph.
    pub word_index: usize,
    pub text: String,
    pub kind: WordKind,
    pub attached: bool,
    pub direction: Direction,
    pub style: ResolvedTextStyle,
    pub range: Interval<usize>,
    pub width: f64,
    pub height: f64,
    /// Justification stretch; always zero for attached words.
    pub extra_width: f64,
    /// Render width clamp for a word wider than a whole line.
    pub max_width: Option<f64>,
    /// Image scale; `< 1.0` when an image was shrunk to fit its line.
    pub scale: f64,
    /// Glyph anchor: the leading edge of the word in its own direction.
    pub draw_point: Point,
    /// Ink box of the word.
    pub bounds: Rect,
    /// Full advance cell of the word, stretch included, line-tall.
    pub slot: Rect,
}

impl PlacedWord {
    pub fn advance(&self) -> f64 {
        self.width + self.extra_width
    }

    pub fn is_space(&self) -> bool {
        self.kind.is_space()
    }

    pub fn is_image(&self) -> bool {
        matches!(self.kind, WordKind::Image(_))
    }

    fn translated(&self, dy: f64) -> Self {
        let mut out = self.clone();
        out.draw_point.y += dy;
        out.bounds = out.bounds.translated(dy);
        out.slot = out.slot.translated(dy);
        out
    }
}

/// One finalized line of a paragraph.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Top-left corner of the line box.
    pub location: Point,
    pub target_width: f64,
    /// Width left unused after alignment; `~0` for justified lines.
    pub remaining_width: f64,
    pub height: f64,
    /// Character offsets covered, contiguous with the neighbouring lines.
    pub range: Interval<usize>,
    /// Words in placement order: left to right on LTR lines, right to left on
    /// RTL lines.
    pub words: Vec<PlacedWord>,
    pub direction: Direction,
}

impl Line {
    /// Sum of the placed words' advances.
    pub fn total_advance(&self) -> f64 {
        self.words.iter().map(PlacedWord::advance).sum()
    }

    pub fn bottom(&self) -> f64 {
        self.location.y + self.height
    }

    /// Visible text in logical order.
    pub fn text(&self) -> String {
        let mut words: Vec<&PlacedWord> = self.words.iter().collect();
        words.sort_by_key(|w| w.range.start);
        words.iter().map(|w| w.text.as_str()).collect()
    }

    fn translated(&self, dy: f64) -> Self {
        Self {
            location: Point::new(self.location.x, self.location.y + dy),
            words: self.words.iter().map(|w| w.translated(dy)).collect(),
            ..self.clone()
        }
    }
}

impl IntervalOrd<usize> for Line {
    fn interval_cmp(&self, offset: &usize) -> Ordering {
        self.range.compare_point(*offset)
    }
}

/// A placed word together with the line it sits on, ordered against screen
/// points.
///
/// Probes flattened line by line in placement order are sorted with respect
/// to any point, which lets a point lookup reuse the interval search.
#[derive(Clone, Copy, Debug)]
pub struct WordProbe<'a> {
    pub line: &'a Line,
    pub word: &'a PlacedWord,
}

impl IntervalOrd<Point> for WordProbe<'_> {
    fn interval_cmp(&self, point: &Point) -> Ordering {
        if point.y < self.line.location.y {
            return Ordering::Greater;
        }
        if point.y >= self.line.bottom() {
            return Ordering::Less;
        }
        let slot = self.word.slot;
        match self.line.direction {
            Direction::Ltr if point.x < slot.x => Ordering::Greater,
            Direction::Ltr if point.x >= slot.right() => Ordering::Less,
            Direction::Rtl if point.x >= slot.right() => Ordering::Greater,
            Direction::Rtl if point.x < slot.x => Ordering::Less,
            _ => Ordering::Equal,
        }
    }
}

/// Lines of one paragraph at one width.
///
/// Line `y` coordinates are relative to the paragraph top; a [`PageParagraph`]
/// carries the offset that places them on a page.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParagraphLayout {
    pub chapter: usize,
    pub paragraph: usize,
    pub direction: Direction,
    pub alignment: Alignment,
    pub lines: Vec<Line>,
}

impl ParagraphLayout {
    /// Index of the line covering `offset`.
    pub fn line_index(&self, offset: usize) -> Result<usize, PagerError> {
        binary_search(&self.lines, &offset).map_err(|_| {
            PagerError::from(AddressingError::Offset {
                offset,
                line_count: self.lines.len(),
            })
        })
    }

    pub fn start_offset(&self) -> usize {
        self.lines.first().map(|l| l.range.start).unwrap_or(0)
    }

    pub fn end_offset(&self) -> usize {
        self.lines.last().map(|l| l.range.end).unwrap_or(0)
    }

    pub fn position_of(&self, offset: usize) -> Position {
        Position::new(self.chapter, self.paragraph, offset)
    }

    pub fn height(&self) -> f64 {
        self.lines.iter().map(|l| l.height).sum()
    }

    /// Height of the lines from the one covering `offset` to the end.
    pub fn height_from(&self, offset: usize) -> Result<f64, PagerError> {
        let first = self.line_index(offset)?;
        Ok(self.lines[first..].iter().map(|l| l.height).sum())
    }

    /// Line covering `offset`, and the placed word covering it when the
    /// offset is not a stripped space.
    pub fn locate_offset(&self, offset: usize) -> Result<(usize, Option<usize>), PagerError> {
        let line = self.line_index(offset)?;
        let word = self.lines[line]
            .words
            .iter()
            .position(|w| w.range.contains(offset));
        Ok((line, word))
    }

    /// `(line, word)` indices of the placed word under `point`.
    pub fn word_at_point(&self, point: Point) -> Option<(usize, usize)> {
        let mut probes = Vec::with_capacity(self.lines.iter().map(|l| l.words.len()).sum());
        let mut index = Vec::with_capacity(probes.capacity());
        for (line_idx, line) in self.lines.iter().enumerate() {
            for (word_idx, word) in line.words.iter().enumerate() {
                probes.push(WordProbe { line, word });
                index.push((line_idx, word_idx));
            }
        }
        binary_search(&probes, &point).ok().map(|hit| index[hit])
    }
}

/// Slice of a paragraph layout shown on a page.
#[derive(Clone, Debug, PartialEq)]
pub struct PageParagraph {
    pub layout: Arc<ParagraphLayout>,
    pub first_line: usize,
    /// Inclusive.
    pub last_line: usize,
    /// Added to paragraph-relative `y` to get page `y`.
    pub origin_y: f64,
}

impl PageParagraph {
    pub fn lines(&self) -> &[Line] {
        &self.layout.lines[self.first_line..=self.last_line]
    }

    /// Shown lines in page coordinates.
    pub fn positioned_lines(&self) -> Vec<Line> {
        self.lines()
            .iter()
            .map(|l| l.translated(self.origin_y))
            .collect()
    }

    pub fn top(&self) -> Position {
        let line = &self.layout.lines[self.first_line];
        self.layout.position_of(line.range.start)
    }

    pub fn bottom(&self) -> Position {
        let line = &self.layout.lines[self.last_line];
        self.layout.position_of(line.range.end)
    }

    pub fn shown_height(&self) -> f64 {
        self.lines().iter().map(|l| l.height).sum()
    }
}

/// Hit-test result on a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageHit {
    /// Index into [`Page::paragraphs`].
    pub paragraph: usize,
    /// Line index inside the paragraph layout.
    pub line: usize,
    pub word: usize,
    /// Position of the word's first character.
    pub position: Position,
}

/// One screenful of content between two positions.
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    /// Start of the first shown line.
    pub top: Position,
    /// End of the last shown line.
    pub bottom: Position,
    pub paragraphs: Vec<PageParagraph>,
    /// Shown line heights plus paragraph gaps.
    pub content_height: f64,
}

impl Page {
    pub fn line_count(&self) -> usize {
        self.paragraphs
            .iter()
            .map(|p| p.last_line + 1 - p.first_line)
            .sum()
    }

    /// Text of every shown line in page order.
    pub fn line_texts(&self) -> Vec<String> {
        self.paragraphs
            .iter()
            .flat_map(|p| p.lines().iter().map(Line::text))
            .collect()
    }

    /// Word under a page-coordinate point.
    pub fn hit_test(&self, point: Point) -> Option<PageHit> {
        for (paragraph_idx, part) in self.paragraphs.iter().enumerate() {
            let local = Point::new(point.x, point.y - part.origin_y);
            let shown = part.lines();
            let (Some(first), Some(last)) = (shown.first(), shown.last()) else {
                continue;
            };
            if local.y < first.location.y || local.y >= last.bottom() {
                continue;
            }
            let (line, word) = part.layout.word_at_point(local)?;
            let placed = &part.layout.lines[line].words[word];
            return Some(PageHit {
                paragraph: paragraph_idx,
                line,
                word,
                position: part.layout.position_of(placed.range.start),
            });
        }
        None
    }
}
