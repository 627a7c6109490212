use std::path::Path;
use std::sync::Arc;

use bidi_pager::{parse_markup, Direction, Document, ResolvedTextStyle};
use bidi_pager_render::{
    wrapped_extent, LayoutConfig, LayoutEngine, PaginationSession, TextExtent, TextMeasurer,
};

pub const MIXED_FIXTURE: &str = "tests/fixtures/mixed.xml";

/// Ten pixels per character, twenty pixels per line.
pub struct FixedMeasurer;

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

pub fn load_fixture(path: &str) -> Document {
    let source =
        std::fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {}", path, e));
    parse_markup(&source)
        .unwrap_or_else(|e| panic!("parse {}: {}", path, e))
        .document
}

/// Layout config with no margins, no minimum line height and no gap.
pub fn bare_config(width: i32, height: i32) -> LayoutConfig {
    LayoutConfig {
        display_width: width,
        display_height: height,
        margin_left: 0,
        margin_right: 0,
        margin_top: 0,
        margin_bottom: 0,
        paragraph_gap_px: 0,
        min_line_height_px: 0,
        ..LayoutConfig::default()
    }
}

pub fn fixed_engine(cfg: LayoutConfig) -> LayoutEngine {
    LayoutEngine::new(cfg).with_text_measurer(Arc::new(FixedMeasurer))
}

pub fn fixed_session(doc: &Document, cfg: LayoutConfig) -> PaginationSession<'_, Document> {
    PaginationSession::new(doc, fixed_engine(cfg))
}

/// Every `.xml` and `.txt` file directly under `tests/fixtures`.
pub fn discover_fixtures() -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(Path::new("tests/fixtures")) else {
        return Vec::new();
    };
    let mut out: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("xml") || ext.eq_ignore_ascii_case("txt"))
        })
        .filter_map(|path| path.to_str().map(str::to_string))
        .collect();
    out.sort();
    out
}

pub fn load_any(path: &str) -> Document {
    if path.ends_with(".txt") {
        let source =
            std::fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {}", path, e));
        Document::from_plain_text(&source, None).0
    } else {
        load_fixture(path)
    }
}
