//! Directionally tagged word tokens.

use core::cmp::Ordering;

use crate::interval::{Interval, IntervalOrd};
use crate::style::TextStyle;

/// Reading direction of a word, line or paragraph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl Direction {
    pub fn is_rtl(self) -> bool {
        matches!(self, Self::Rtl)
    }

    /// Direction of `text`: RTL as soon as one character is strong RTL.
    pub fn of_text(text: &str) -> Self {
        if text.chars().any(is_rtl_char) {
            Self::Rtl
        } else {
            Self::Ltr
        }
    }

    /// Parse a markup `dir` attribute value.
    pub fn from_attr(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rtl" => Some(Self::Rtl),
            "ltr" => Some(Self::Ltr),
            _ => None,
        }
    }
}

/// Strong right-to-left character test over a fixed script table.
///
/// Digits of every script stay left-to-right, including the Arabic-Indic
/// forms that live inside the Arabic block.
pub fn is_rtl_char(ch: char) -> bool {
    if ch.is_ascii() {
        return false;
    }
    if matches!(ch, '\u{0660}'..='\u{0669}' | '\u{06F0}'..='\u{06F9}') {
        return false;
    }
    matches!(ch,
        '\u{0590}'..='\u{05FF}' |  // Hebrew
        '\u{0600}'..='\u{06FF}' |  // Arabic
        '\u{0750}'..='\u{077F}' |  // Arabic Supplement
        '\u{08A0}'..='\u{08FF}' |  // Arabic Extended-A
        '\u{FB1D}'..='\u{FB4F}' |  // Hebrew Presentation Forms
        '\u{FB50}'..='\u{FDFF}' |  // Arabic Presentation Forms-A
        '\u{FE70}'..='\u{FEFF}'    // Arabic Presentation Forms-B
    )
}

/// Punctuation that carries no direction of its own and may attach to its
/// neighbours.
pub fn is_inert_char(ch: char) -> bool {
    matches!(
        ch,
        '(' | ')'
            | '['
            | ']'
            | '{'
            | '}'
            | '<'
            | '>'
            | '"'
            | '\''
            | '«'
            | '»'
            | '/'
            | '\\'
            | '.'
            | ','
            | ';'
            | ':'
            | '!'
            | '?'
            | '\u{060C}'
            | '\u{061B}'
            | '\u{061F}'
    )
}

/// Image payload declared by an inline marker.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageSpec {
    /// Source reference, empty when the marker had none.
    pub src: String,
    /// Declared width in px (0 when absent).
    pub declared_width: f64,
    /// Declared height in px (0 when absent).
    pub declared_height: f64,
}

/// Token variant.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WordKind {
    #[default]
    Normal,
    Space,
    InertChar,
    Image(ImageSpec),
}

impl WordKind {
    pub fn is_space(&self) -> bool {
        matches!(self, Self::Space)
    }

    /// Space and inert punctuation take their direction from context.
    pub fn is_neutral(&self) -> bool {
        matches!(self, Self::Space | Self::InertChar)
    }

    pub fn image(&self) -> Option<&ImageSpec> {
        match self {
            Self::Image(spec) => Some(spec),
            _ => None,
        }
    }
}

/// One token of a paragraph.
///
/// `range` covers the token's characters in paragraph offsets, so
/// `range.len() == text.chars().count()` always holds.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Word {
    pub text: String,
    pub range: Interval<usize>,
    pub kind: WordKind,
    /// Glued to the following token: no line break and no justification
    /// stretch between the two.
    pub attached: bool,
    pub direction: Direction,
    /// Inline style overrides on top of the paragraph style.
    pub style: TextStyle,
}

impl Word {
    /// Build a token starting at character offset `start`.
    ///
    /// `text` must not be empty: a closed range always covers at least one
    /// character, so an empty token could not keep `range.len()` equal to
    /// its character count.
    pub fn new(text: impl Into<String>, start: usize, kind: WordKind) -> Self {
        let text = text.into();
        let len = text.chars().count();
        debug_assert!(len > 0, "word at offset {} has no text", start);
        Self {
            range: Interval::new(start, start + len.saturating_sub(1)),
            direction: match kind {
                WordKind::Normal => Direction::of_text(&text),
                _ => Direction::Ltr,
            },
            text,
            kind,
            attached: false,
            style: TextStyle::default(),
        }
    }

    pub fn with_attached(mut self, attached: bool) -> Self {
        self.attached = attached;
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }

    pub fn is_space(&self) -> bool {
        self.kind.is_space()
    }

    pub fn is_image(&self) -> bool {
        matches!(self.kind, WordKind::Image(_))
    }

    pub fn start_offset(&self) -> usize {
        self.range.start
    }

    pub fn end_offset(&self) -> usize {
        self.range.end
    }
}

impl IntervalOrd<usize> for Word {
    fn interval_cmp(&self, offset: &usize) -> Ordering {
        self.range.compare_point(*offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rtl_table_covers_arabic_and_hebrew_but_not_digits() {
        assert!(is_rtl_char('م'));
        assert!(is_rtl_char('ש'));
        assert!(is_rtl_char('\u{FEFB}'));
        assert!(!is_rtl_char('a'));
        assert!(!is_rtl_char('7'));
        assert!(!is_rtl_char('\u{0663}'));
        assert!(!is_rtl_char('\u{06F4}'));
        assert!(!is_rtl_char('é'));
    }

    #[test]
    fn word_direction_is_rtl_with_one_rtl_char() {
        assert_eq!(Direction::of_text("abcم"), Direction::Rtl);
        assert_eq!(Direction::of_text("۱۲۳"), Direction::Ltr);
        assert_eq!(Word::new("متن", 0, WordKind::Normal).direction, Direction::Rtl);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "has no text")]
    fn empty_word_text_is_rejected() {
        let _ = Word::new("", 3, WordKind::Normal);
    }

    #[test]
    fn range_length_matches_char_count() {
        let word = Word::new("تستی", 6, WordKind::Normal);
        assert_eq!(word.range, Interval::new(6, 9));
        assert_eq!(word.range.len(), word.text.chars().count());
    }

    #[test]
    fn inert_set_contains_punctuation_only() {
        for ch in ['(', ')', '«', '.', '،', '؟', '/'] {
            assert!(is_inert_char(ch), "{:?}", ch);
        }
        for ch in ['a', '-', ' ', 'م'] {
            assert!(!is_inert_char(ch), "{:?}", ch);
        }
    }

    #[test]
    fn dir_attribute_parses_case_insensitively() {
        assert_eq!(Direction::from_attr("RTL"), Some(Direction::Rtl));
        assert_eq!(Direction::from_attr(" ltr "), Some(Direction::Ltr));
        assert_eq!(Direction::from_attr("auto"), None);
    }
}
