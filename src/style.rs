//! Style overrides and their resolved form.

/// Partial text style. Every field is an override that is only applied when
/// present.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextStyle {
    /// Font family name.
    pub family: Option<String>,
    /// CSS-like numeric weight.
    pub weight: Option<u16>,
    /// Italic flag.
    pub italic: Option<bool>,
    /// Font size in px.
    pub size_px: Option<f32>,
    /// Line-height multiplier.
    pub line_height: Option<f32>,
    /// Extra spacing between glyphs in px.
    pub letter_spacing: Option<f32>,
}

impl TextStyle {
    /// Apply every override set in `other` on top of `self`.
    pub fn add_style(&mut self, other: &TextStyle) {
        if let Some(family) = &other.family {
            self.family = Some(family.clone());
        }
        if other.weight.is_some() {
            self.weight = other.weight;
        }
        if other.italic.is_some() {
            self.italic = other.italic;
        }
        if other.size_px.is_some() {
            self.size_px = other.size_px;
        }
        if other.line_height.is_some() {
            self.line_height = other.line_height;
        }
        if other.letter_spacing.is_some() {
            self.letter_spacing = other.letter_spacing;
        }
    }

    /// Same as [`add_style`](Self::add_style) but returns the merged value.
    pub fn merged(&self, other: &TextStyle) -> TextStyle {
        let mut out = self.clone();
        out.add_style(other);
        out
    }

    pub fn is_empty(&self) -> bool {
        *self == TextStyle::default()
    }

    /// Fill unset fields from `base`.
    pub fn resolve(&self, base: &ResolvedTextStyle) -> ResolvedTextStyle {
        ResolvedTextStyle {
            family: self.family.clone().unwrap_or_else(|| base.family.clone()),
            weight: self.weight.unwrap_or(base.weight),
            italic: self.italic.unwrap_or(base.italic),
            size_px: self.size_px.unwrap_or(base.size_px),
            line_height: self.line_height.unwrap_or(base.line_height),
            letter_spacing: self.letter_spacing.unwrap_or(base.letter_spacing),
        }
    }
}

/// Fully resolved style handed to text measurement.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolvedTextStyle {
    pub family: String,
    pub weight: u16,
    pub italic: bool,
    pub size_px: f32,
    pub line_height: f32,
    pub letter_spacing: f32,
}

impl Default for ResolvedTextStyle {
    fn default() -> Self {
        Self {
            family: "serif".to_string(),
            weight: 400,
            italic: false,
            size_px: 16.0,
            line_height: 1.4,
            letter_spacing: 0.0,
        }
    }
}
