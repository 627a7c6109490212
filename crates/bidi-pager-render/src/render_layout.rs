use bidi_pager::{
    Alignment, Direction, ImageSpec, Paragraph, ResolvedTextStyle, TextStyle, Word, WordKind,
};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;

use crate::render_engine::RenderDiagnostic;
use crate::render_ir::{Line, ParagraphLayout, PlacedWord, Point, Rect};

/// Measured size of a run of text.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextExtent {
    pub width: f64,
    pub height: f64,
}

/// Text measurement hook used for line fitting.
pub trait TextMeasurer: Send + Sync {
    /// Measure `text` in `style`.
    ///
    /// With `max_width`, the text wraps internally: the returned width must
    /// not exceed `max_width` and the height grows with the wrapped lines.
    fn measure(
        &self,
        text: &str,
        style: &ResolvedTextStyle,
        direction: Direction,
        max_width: Option<f64>,
    ) -> TextExtent;
}

/// Natural size lookup for images declared without dimensions.
pub trait ImageDecoder: Send + Sync {
    fn natural_size(&self, src: &str) -> Option<(f64, f64)>;
}

/// Extent of a single-line run of `width`, wrapped at `max_width` when set.
pub fn wrapped_extent(width: f64, line_height: f64, max_width: Option<f64>) -> TextExtent {
    match max_width {
        Some(max) if max > 0.0 && width > max => TextExtent {
            width: max,
            height: line_height * (width / max).ceil(),
        },
        _ => TextExtent {
            width,
            height: line_height,
        },
    }
}

/// Per-glyph em-width estimate for when no font metrics are available.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicMeasurer;

impl TextMeasurer for HeuristicMeasurer {
    fn measure(
        &self,
        text: &str,
        style: &ResolvedTextStyle,
        _direction: Direction,
        max_width: Option<f64>,
    ) -> TextExtent {
        wrapped_extent(
            heuristic_text_width(text, style),
            line_height_px(style),
            max_width,
        )
    }
}

fn heuristic_text_width(text: &str, style: &ResolvedTextStyle) -> f64 {
    let chars = text.chars().count();
    if chars == 0 {
        return 0.0;
    }
    let em_sum: f64 = text.chars().map(proportional_glyph_em_width).sum();
    let family = style.family.to_ascii_lowercase();
    let mut family_scale = if family.contains("sans") { 0.99 } else { 1.03 };
    if style.weight >= 700 {
        family_scale += 0.03;
    }
    if style.italic {
        family_scale += 0.01;
    }
    if style.size_px >= 24.0 {
        family_scale += 0.01;
    }
    let spacing = (chars.saturating_sub(1) as f64) * f64::from(style.letter_spacing);
    (em_sum * f64::from(style.size_px) * family_scale + spacing).max(0.0)
}

fn proportional_glyph_em_width(ch: char) -> f64 {
    match ch {
        ' ' | '\u{00A0}' => 0.32,
        '\t' => 1.28,
        'i' | 'l' | 'I' | '|' | '!' => 0.24,
        '.' | ',' | ':' | ';' | '\'' | '"' | '`' | '\u{060C}' => 0.23,
        '-' | '\u{2010}' | '\u{2013}' | '\u{2014}' => 0.34,
        '(' | ')' | '[' | ']' | '{' | '}' | '«' | '»' => 0.30,
        'f' | 't' | 'j' | 'r' => 0.34,
        'm' | 'w' | 'M' | 'W' | '@' | '%' | '&' | '#' => 0.74,
        c if c.is_ascii_digit() => 0.52,
        c if c.is_ascii_uppercase() => 0.64,
        c if c.is_ascii_lowercase() => 0.52,
        c if c.is_whitespace() => 0.32,
        c if c.is_ascii_punctuation() => 0.42,
        // Arabic-script letters join and run narrower than Latin capitals.
        '\u{0600}'..='\u{06FF}' | '\u{FB50}'..='\u{FEFF}' => 0.48,
        _ => 0.56,
    }
}

fn line_height_px(style: &ResolvedTextStyle) -> f64 {
    (f64::from(style.size_px) * f64::from(style.line_height))
        .round()
        .max(1.0)
}

/// Layout configuration for paragraph and page construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Physical display width.
    pub display_width: i32,
    /// Physical display height.
    pub display_height: i32,
    pub margin_left: i32,
    pub margin_right: i32,
    pub margin_top: i32,
    pub margin_bottom: i32,
    /// Gap between consecutive paragraphs on a page.
    pub paragraph_gap_px: i32,
    /// Minimum line height in px.
    pub min_line_height_px: i32,
    /// Justify every non-final line regardless of paragraph alignment.
    pub justify: bool,
    /// Style that paragraph and word overrides resolve against.
    pub base_style: ResolvedTextStyle,
}

impl LayoutConfig {
    /// Convenience for a display size with sensible defaults.
    pub fn for_display(width: i32, height: i32) -> Self {
        Self {
            display_width: width,
            display_height: height,
            ..Self::default()
        }
    }

    /// Line width available between the side margins.
    pub fn content_width(&self) -> f64 {
        f64::from(self.display_width - self.margin_left - self.margin_right)
    }

    /// Page height available between the top and bottom margins.
    pub fn content_height(&self) -> f64 {
        f64::from(self.display_height - self.margin_top - self.margin_bottom)
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            display_width: 480,
            display_height: 800,
            margin_left: 32,
            margin_right: 32,
            margin_top: 48,
            margin_bottom: 40,
            paragraph_gap_px: 8,
            min_line_height_px: 14,
            justify: false,
            base_style: ResolvedTextStyle::default(),
        }
    }
}

/// Accumulates words into one line.
///
/// Words whose direction differs from the line's are held on a stack and
/// placed, most recent first, as soon as a word in the line's direction
/// arrives or the line is finalized. That keeps an embedded run of the
/// opposite direction in its own reading order while the run as a block
/// follows the line.
#[derive(Clone, Debug)]
pub struct LineBuilder {
    direction: Direction,
    location: Point,
    target_width: f64,
    remaining_width: f64,
    height: f64,
    cursor: f64,
    range_start: usize,
    range_end: Option<usize>,
    words: Vec<PlacedWord>,
    pending: SmallVec<[PlacedWord; 4]>,
}

impl LineBuilder {
    /// Empty line with its top-left corner at `location`, first covering
    /// character offset `range_start`.
    pub fn new(
        direction: Direction,
        location: Point,
        target_width: f64,
        min_height: f64,
        range_start: usize,
    ) -> Self {
        let mut line = Self {
            direction,
            location,
            target_width,
            remaining_width: target_width,
            height: min_height.max(0.0),
            cursor: 0.0,
            range_start,
            range_end: None,
            words: Vec::new(),
            pending: SmallVec::new(),
        };
        line.cursor = line.start_x();
        line
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn remaining_width(&self) -> f64 {
        self.remaining_width
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.pending.is_empty()
    }

    /// Whether `width` more pixels leave some room on the line.
    pub fn fits(&self, width: f64) -> bool {
        self.remaining_width - width > 0.0
    }

    /// Mark a word's characters as covered without placing it.
    pub fn skip(&mut self, word: &PlacedWord) {
        self.consume(word.range.end);
    }

    pub fn add_word(&mut self, word: PlacedWord) {
        self.remaining_width -= word.advance();
        self.height = self.height.max(word.height);
        self.consume(word.range.end);
        if word.direction == self.direction {
            self.flush_pending();
            self.place(word);
        } else {
            self.pending.push(word);
        }
    }

    /// Close the line: strip trailing spaces, then justify or align and
    /// re-place every word.
    pub fn finalize(mut self, alignment: Alignment, is_justify: bool) -> Line {
        // Spaces still on the stack are logically last.
        while self.pending.last().is_some_and(PlacedWord::is_space) {
            if let Some(space) = self.pending.pop() {
                self.remaining_width += space.advance();
            }
        }
        self.flush_pending();
        while self.words.last().is_some_and(PlacedWord::is_space) {
            if let Some(space) = self.words.pop() {
                self.remaining_width += space.advance();
            }
        }

        let shift = if is_justify {
            self.justify();
            0.0
        } else if self.remaining_width > 0.0 {
            alignment_shift(alignment, self.direction, self.remaining_width)
        } else {
            0.0
        };
        self.replay(shift);

        Line {
            location: self.location,
            target_width: self.target_width,
            remaining_width: self.remaining_width,
            height: self.height,
            range: bidi_pager::Interval::new(
                self.range_start,
                self.range_end.unwrap_or(self.range_start),
            ),
            words: self.words,
            direction: self.direction,
        }
    }

    fn start_x(&self) -> f64 {
        match self.direction {
            Direction::Ltr => self.location.x,
            Direction::Rtl => self.location.x + self.target_width,
        }
    }

    fn consume(&mut self, end: usize) {
        self.range_end = Some(self.range_end.map_or(end, |prev| prev.max(end)));
    }

    fn flush_pending(&mut self) {
        while let Some(word) = self.pending.pop() {
            self.place(word);
        }
    }

    fn place(&mut self, mut word: PlacedWord) {
        place_at(
            &mut word,
            &mut self.cursor,
            self.direction,
            self.location.y,
            self.height,
        );
        self.words.push(word);
    }

    /// Spread the remaining width over every non-attached word except the
    /// last one.
    fn justify(&mut self) {
        let Some(last) = self.words.len().checked_sub(1) else {
            return;
        };
        if self.remaining_width <= 0.0 {
            return;
        }
        let candidates = self.words[..last].iter().filter(|w| !w.attached).count();
        if candidates == 0 {
            return;
        }
        let extra = self.remaining_width / candidates as f64;
        for word in self.words[..last].iter_mut().filter(|w| !w.attached) {
            word.extra_width += extra;
        }
        self.remaining_width -= extra * candidates as f64;
    }

    fn replay(&mut self, shift: f64) {
        let mut cursor = self.start_x() + shift;
        for word in &mut self.words {
            place_at(
                word,
                &mut cursor,
                self.direction,
                self.location.y,
                self.height,
            );
        }
        self.cursor = cursor;
    }
}

fn alignment_shift(alignment: Alignment, direction: Direction, remaining: f64) -> f64 {
    match (alignment, direction) {
        (Alignment::Left, Direction::Rtl) => -remaining,
        (Alignment::Center, Direction::Ltr) => remaining / 2.0,
        (Alignment::Center, Direction::Rtl) => -remaining / 2.0,
        (Alignment::Right, Direction::Ltr) => remaining,
        _ => 0.0,
    }
}

fn place_at(
    word: &mut PlacedWord,
    cursor: &mut f64,
    line_direction: Direction,
    top: f64,
    line_height: f64,
) {
    let advance = word.advance();
    let (left, slot_left) = match line_direction {
        Direction::Ltr => {
            let left = *cursor;
            *cursor += advance;
            (left, left)
        }
        Direction::Rtl => {
            let left = *cursor - word.width;
            *cursor -= advance;
            (left, *cursor)
        }
    };
    // Bottom-aligned so images and taller runs share a baseline area.
    let y = top + (line_height - word.height).max(0.0);
    word.bounds = Rect {
        x: left,
        y,
        width: word.width,
        height: word.height,
    };
    word.slot = Rect {
        x: slot_left,
        y: top,
        width: advance,
        height: line_height,
    };
    let anchor_x = if word.direction.is_rtl() {
        left + word.width
    } else {
        left
    };
    word.draw_point = Point::new(anchor_x, y);
}

/// Last index of the unbreakable unit starting at `start`: the word plus
/// every following token glued to it.
fn attachment_unit_end(words: &[PlacedWord], start: usize) -> usize {
    let mut end = start;
    while end + 1 < words.len() && words[end].attached {
        end += 1;
    }
    end
}

/// Deterministic paragraph layout engine.
#[derive(Clone)]
pub struct LayoutEngine {
    cfg: LayoutConfig,
    text_measurer: Arc<dyn TextMeasurer>,
    image_decoder: Option<Arc<dyn ImageDecoder>>,
}

impl core::fmt::Debug for LayoutEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LayoutEngine")
            .field("cfg", &self.cfg)
            .field("has_image_decoder", &self.image_decoder.is_some())
            .finish()
    }
}

impl LayoutEngine {
    /// Create a layout engine using [`HeuristicMeasurer`].
    pub fn new(cfg: LayoutConfig) -> Self {
        Self {
            cfg,
            text_measurer: Arc::new(HeuristicMeasurer),
            image_decoder: None,
        }
    }

    /// Install a shared text measurer for glyph-accurate width fitting.
    pub fn with_text_measurer(mut self, measurer: Arc<dyn TextMeasurer>) -> Self {
        self.text_measurer = measurer;
        self
    }

    /// Install an image decoder for images declared without a size.
    pub fn with_image_decoder(mut self, decoder: Arc<dyn ImageDecoder>) -> Self {
        self.image_decoder = Some(decoder);
        self
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.cfg
    }

    pub fn set_config(&mut self, cfg: LayoutConfig) {
        self.cfg = cfg;
    }

    /// Measure every word of `paragraph`. Positions are left at zero.
    pub fn measure_paragraph(&self, paragraph: &Paragraph) -> Vec<PlacedWord> {
        self.measure_paragraph_with(paragraph, &mut |_| {})
    }

    /// Lay out `paragraph` at the configured content width.
    ///
    /// Returns `None` when the content width cannot hold anything.
    pub fn layout_paragraph(
        &self,
        chapter: usize,
        index: usize,
        paragraph: &Paragraph,
    ) -> Option<ParagraphLayout> {
        self.layout_paragraph_with(chapter, index, paragraph, &mut |_| {})
    }

    pub(crate) fn layout_paragraph_with(
        &self,
        chapter: usize,
        index: usize,
        paragraph: &Paragraph,
        report: &mut dyn FnMut(RenderDiagnostic),
    ) -> Option<ParagraphLayout> {
        let width = self.cfg.content_width();
        if width < 1.0 {
            log::warn!(
                "paragraph {}:{} not laid out: content width is {}px",
                chapter,
                index,
                width
            );
            report(RenderDiagnostic::InsufficientSpace {
                available: width as i64,
                required: 1,
            });
            return None;
        }

        let mut words = self.measure_paragraph_with(paragraph, report);
        let is_justify = paragraph.alignment == Alignment::Justify || self.cfg.justify;
        let min_height = f64::from(self.cfg.min_line_height_px.max(0));
        let x = f64::from(self.cfg.margin_left);
        let new_line = |top: f64, start: usize| {
            LineBuilder::new(
                paragraph.direction,
                Point::new(x, top),
                width,
                min_height,
                start,
            )
        };

        let mut lines = Vec::new();
        let mut line = new_line(0.0, paragraph.start_offset());
        let mut i = 0;
        while i < words.len() {
            if line.is_empty() && words[i].is_space() {
                line.skip(&words[i]);
                i += 1;
                continue;
            }
            let unit_end = attachment_unit_end(&words, i);
            let unit_width: f64 = words[i..=unit_end].iter().map(PlacedWord::advance).sum();
            if line.fits(unit_width) {
                line.add_word(core::mem::take(&mut words[i]));
                i += 1;
                continue;
            }
            if !line.is_empty() {
                // Only spaces left: this is the paragraph's last line.
                let last = words[i..].iter().all(PlacedWord::is_space);
                let done = line.finalize(paragraph.alignment, is_justify && !last);
                log::trace!(
                    "line break before offset {} at y={}",
                    words[i].range.start,
                    done.bottom()
                );
                line = new_line(done.bottom(), done.range.end + 1);
                lines.push(done);
                continue;
            }
            let mut word = core::mem::take(&mut words[i]);
            if !line.fits(word.advance()) {
                self.force_fit(&mut word, line.remaining_width());
            }
            line.add_word(word);
            i += 1;
        }
        if line.is_empty() && !lines.is_empty() {
            // Spaces that wrapped past the last word stay on the previous line.
            if let (Some(previous), Some(end)) = (lines.last_mut(), line.range_end) {
                previous.range.end = previous.range.end.max(end);
            }
        } else {
            lines.push(line.finalize(paragraph.alignment, false));
        }

        Some(ParagraphLayout {
            chapter,
            paragraph: index,
            direction: paragraph.direction,
            alignment: paragraph.alignment,
            lines,
        })
    }

    fn measure_paragraph_with(
        &self,
        paragraph: &Paragraph,
        report: &mut dyn FnMut(RenderDiagnostic),
    ) -> Vec<PlacedWord> {
        paragraph
            .words
            .iter()
            .enumerate()
            .map(|(index, word)| self.measure_word(index, word, &paragraph.style, report))
            .collect()
    }

    fn measure_word(
        &self,
        index: usize,
        word: &Word,
        paragraph_style: &TextStyle,
        report: &mut dyn FnMut(RenderDiagnostic),
    ) -> PlacedWord {
        let style = paragraph_style
            .merged(&word.style)
            .resolve(&self.cfg.base_style);
        let (width, height) = match &word.kind {
            WordKind::Image(spec) => self.image_size(spec, report),
            _ => {
                let extent = self
                    .text_measurer
                    .measure(&word.text, &style, word.direction, None);
                (extent.width, extent.height)
            }
        };
        PlacedWord {
            word_index: index,
            text: word.text.clone(),
            kind: word.kind.clone(),
            attached: word.attached,
            direction: word.direction,
            style,
            range: word.range,
            width,
            height,
            scale: 1.0,
            ..PlacedWord::default()
        }
    }

    fn image_size(
        &self,
        spec: &ImageSpec,
        report: &mut dyn FnMut(RenderDiagnostic),
    ) -> (f64, f64) {
        let (mut width, mut height) = (spec.declared_width, spec.declared_height);
        if width <= 0.0 || height <= 0.0 {
            let natural = self
                .image_decoder
                .as_ref()
                .and_then(|decoder| decoder.natural_size(&spec.src));
            match natural {
                Some((natural_w, natural_h)) => {
                    if width <= 0.0 {
                        width = natural_w;
                    }
                    if height <= 0.0 {
                        height = natural_h;
                    }
                }
                None => {
                    log::warn!("image {:?} has no usable size; drawn as zero-size", spec.src);
                    report(RenderDiagnostic::MalformedAttribute {
                        src: spec.src.clone(),
                    });
                }
            }
        }
        (width.max(0.0), height.max(0.0))
    }

    /// Shrink a word that is wider than a whole empty line.
    fn force_fit(&self, word: &mut PlacedWord, available: f64) {
        let available = available.max(0.0);
        if word.is_image() {
            if word.width > 0.0 {
                let scale = available / word.width;
                word.scale = scale;
                word.width = available;
                word.height *= scale;
            }
        } else {
            let extent =
                self.text_measurer
                    .measure(&word.text, &word.style, word.direction, Some(available));
            word.max_width = Some(available);
            word.width = extent.width.min(available);
            word.height = extent.height;
        }
        log::trace!(
            "word at offset {} forced into {}px (scale {})",
            word.range.start,
            available,
            word.scale
        );
    }
}
