//! Paragraph tokenization into classified, directionally tagged words.
//!
//! One source line becomes one ordered word sequence:
//! - runs of non-space, non-punctuation characters become `Normal` words,
//! - each whitespace run becomes a single `Space` word,
//! - punctuation from the inert set becomes an `InertChar` word,
//! - a self-contained `<img .../>` marker becomes an `Image` word.
//!
//! Neutral tokens (spaces, punctuation) are then resolved from the token
//! that follows them, falling back to the paragraph direction at the end.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::PagerError;
use crate::word::{is_inert_char, Direction, ImageSpec, Word, WordKind};

/// Upper bound on the characters scanned when looking for the end of an
/// image marker.
const MAX_MARKER_CHARS: usize = 512;

/// Output of [`tokenize`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tokenized {
    /// Words in source order.
    pub words: Vec<Word>,
    /// Resolved paragraph base direction.
    pub direction: Direction,
    /// Recovered problems (malformed image attributes).
    pub diagnostics: Vec<PagerError>,
}

/// Tokenize one paragraph line.
///
/// `base` is the direction declared by the source; when absent it is
/// inferred from the text (RTL if any character is RTL).
pub fn tokenize(line: &str, base: Option<Direction>) -> Tokenized {
    let direction = base.unwrap_or_else(|| Direction::of_text(line));
    let chars: Vec<char> = line.chars().collect();
    let mut state = TokenizerState::new(chars.len());

    let mut i = 0usize;
    while i < chars.len() {
        let ch = chars[i];
        if ch.is_whitespace() {
            state.flush(false);
            let start = i;
            while i < chars.len() && chars[i].is_whitespace() {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            state.words.push(Word::new(text, start, WordKind::Space));
            continue;
        }
        if ch == '<' {
            if let Some((end, spec)) = parse_image_marker(&chars, i, &mut state.diagnostics) {
                state.flush(false);
                let text: String = chars[i..=end].iter().collect();
                state
                    .words
                    .push(Word::new(text, i, WordKind::Image(spec)).with_direction(direction));
                i = end + 1;
                continue;
            }
        }
        if is_inert_char(ch) {
            let has_buffer = !state.buffer.is_empty();
            state.flush(has_buffer);
            let glued = chars.get(i + 1).is_some_and(|next| !next.is_whitespace());
            state.words.push(
                Word::new(ch.to_string(), i, WordKind::InertChar).with_attached(glued),
            );
            i += 1;
            continue;
        }
        if state.buffer.is_empty() {
            state.buffer_start = i;
        }
        state.buffer.push(ch);
        i += 1;
    }
    state.flush(false);

    let mut words = state.words;
    resolve_neutrals(&mut words, direction);
    Tokenized {
        words,
        direction,
        diagnostics: state.diagnostics,
    }
}

/// Give every space and inert token the direction of its successor, or
/// `base` when it is the last token. Runs backward so chains of neutrals
/// inherit from the first strong token after them.
pub fn resolve_neutrals(words: &mut [Word], base: Direction) {
    let mut next: Option<Direction> = None;
    for word in words.iter_mut().rev() {
        if word.kind.is_neutral() {
            word.direction = next.unwrap_or(base);
        }
        next = Some(word.direction);
    }
}

struct TokenizerState {
    words: Vec<Word>,
    buffer: String,
    buffer_start: usize,
    diagnostics: Vec<PagerError>,
}

impl TokenizerState {
    fn new(char_count: usize) -> Self {
        Self {
            words: Vec::with_capacity(char_count / 3 + 1),
            buffer: String::with_capacity(32),
            buffer_start: 0,
            diagnostics: Vec::new(),
        }
    }

    fn flush(&mut self, attached: bool) {
        if self.buffer.is_empty() {
            return;
        }
        let text = core::mem::take(&mut self.buffer);
        self.words
            .push(Word::new(text, self.buffer_start, WordKind::Normal).with_attached(attached));
    }
}

/// Try to read an `<img .../>` marker starting at `chars[start]`.
///
/// Returns the index of the closing `>` and the declared image attributes.
/// Anything that is not a well-formed `img` tag yields `None` and the `<`
/// is tokenized as punctuation.
fn parse_image_marker(
    chars: &[char],
    start: usize,
    diagnostics: &mut Vec<PagerError>,
) -> Option<(usize, ImageSpec)> {
    let limit = chars.len().min(start + MAX_MARKER_CHARS);
    let end = (start + 1..limit).find(|&idx| chars[idx] == '>')?;
    let tag: String = chars[start..=end].iter().collect();
    let name_end = tag[1..]
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .map(|idx| idx + 1)?;
    if !tag[1..name_end].eq_ignore_ascii_case("img") {
        return None;
    }

    let mut reader = Reader::from_reader(tag.as_bytes());
    let mut buf = Vec::with_capacity(tag.len());
    let (src, width, height) = match reader.read_event_into(&mut buf) {
        Ok(Event::Empty(e)) | Ok(Event::Start(e)) => {
            let mut src = None;
            let mut width = None;
            let mut height = None;
            for attr in e.attributes().flatten() {
                let value = reader
                    .decoder()
                    .decode(attr.value.as_ref())
                    .unwrap_or_default()
                    .into_owned();
                match attr.key.as_ref() {
                    b"src" => src = Some(value),
                    b"width" => width = Some(value),
                    b"height" => height = Some(value),
                    _ => {}
                }
            }
            (src, width, height)
        }
        _ => return None,
    };

    let spec = ImageSpec {
        src: match src {
            Some(src) if !src.trim().is_empty() => src,
            other => {
                report_malformed(diagnostics, "src", other);
                String::new()
            }
        },
        declared_width: parse_dimension(diagnostics, "width", width),
        declared_height: parse_dimension(diagnostics, "height", height),
    };
    Some((end, spec))
}

fn parse_dimension(
    diagnostics: &mut Vec<PagerError>,
    attribute: &'static str,
    raw: Option<String>,
) -> f64 {
    let parsed = raw.as_deref().and_then(|value| {
        let value = value.trim();
        let value = value.strip_suffix("px").unwrap_or(value).trim();
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
    });
    match parsed {
        Some(v) => v,
        None => {
            report_malformed(diagnostics, attribute, raw);
            0.0
        }
    }
}

fn report_malformed(
    diagnostics: &mut Vec<PagerError>,
    attribute: &'static str,
    value: Option<String>,
) {
    let err = PagerError::MalformedAttribute { attribute, value };
    log::warn!("image marker: {}", err);
    diagnostics.push(err);
}
