//! Mapping of document styles onto the layout engine's style primitives.

use std::collections::BTreeMap;

use genpdf::fonts::{Font, FontFamily};
use genpdf::style::{Color, Style};
use genpdf::Alignment;

use crate::error::GenerationError;
use crate::model::{DocumentStyle, HorizontalAlignment};

/// Font families registered with a document, keyed by registry name.
///
/// The document's default family is applied by the engine itself, so naming it
/// in a style needs no override.
pub(crate) struct LoadedFamilies {
    default: String,
    others: BTreeMap<String, FontFamily<Font>>,
}

impl LoadedFamilies {
    pub(crate) fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            others: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, family: FontFamily<Font>) {
        self.others.insert(name.into(), family);
    }

    /// Returns the family to switch to for `name`, or `None` for the default family.
    fn resolve(&self, name: &str) -> Result<Option<FontFamily<Font>>, GenerationError> {
        if name == self.default {
            return Ok(None);
        }
        self.others
            .get(name)
            .cloned()
            .map(Some)
            .ok_or_else(|| {
                GenerationError::Config(format!("font family '{name}' is not registered"))
            })
    }
}

const NAMED_COLORS: &[(&str, (u8, u8, u8))] = &[
    ("black", (0, 0, 0)),
    ("white", (255, 255, 255)),
    ("red", (255, 0, 0)),
    ("green", (0, 128, 0)),
    ("blue", (0, 0, 255)),
    ("yellow", (255, 255, 0)),
    ("orange", (255, 165, 0)),
    ("purple", (128, 0, 128)),
    ("gray", (128, 128, 128)),
    ("grey", (128, 128, 128)),
    ("silver", (192, 192, 192)),
    ("navy", (0, 0, 128)),
    ("teal", (0, 128, 128)),
    ("maroon", (128, 0, 0)),
];

/// Parses `#rrggbb`, `#rgb` or a basic color name.
pub fn parse_color(value: &str) -> Result<Color, GenerationError> {
    let trimmed = value.trim();

    if let Some(hex) = trimmed.strip_prefix('#') {
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => {
                return Err(GenerationError::InvalidDefinition(format!(
                    "color '{value}' must have 3 or 6 hexadecimal digits"
                )))
            }
        };
        if !expanded.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(GenerationError::InvalidDefinition(format!(
                "color '{value}' contains non-hexadecimal digits"
            )));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&expanded[range], 16).map_err(|_| {
                GenerationError::InvalidDefinition(format!("invalid color '{value}'"))
            })
        };
        return Ok(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?));
    }

    let lowered = trimmed.to_ascii_lowercase();
    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == lowered)
        .map(|(_, (r, g, b))| Color::Rgb(*r, *g, *b))
        .ok_or_else(|| GenerationError::InvalidDefinition(format!("unknown color '{value}'")))
}

/// Converts the alignment to the engine's alignment; justified text is laid out left aligned.
pub fn to_alignment(alignment: HorizontalAlignment) -> Alignment {
    match alignment {
        HorizontalAlignment::Left | HorizontalAlignment::Justify => Alignment::Left,
        HorizontalAlignment::Center => Alignment::Center,
        HorizontalAlignment::Right => Alignment::Right,
    }
}

/// Builds an engine [`Style`] from the set attributes of `style`.
pub(crate) fn to_style(
    style: &DocumentStyle,
    families: &LoadedFamilies,
) -> Result<Style, GenerationError> {
    let mut result = Style::new();

    if let Some(size) = style.font_size {
        result.set_font_size(size);
    }
    if style.bold == Some(true) {
        result.set_bold();
    }
    if style.italic == Some(true) {
        result.set_italic();
    }
    if let Some(color) = &style.color {
        result.set_color(parse_color(color)?);
    }
    if let Some(name) = &style.font {
        if let Some(family) = families.resolve(name)? {
            result.set_font_family(family);
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(parse_color("#ff8000").unwrap(), Color::Rgb(255, 128, 0));
        assert_eq!(parse_color("#0f0").unwrap(), Color::Rgb(0, 255, 0));
    }

    #[test]
    fn parses_named_colors_case_insensitively() {
        assert_eq!(parse_color("Navy").unwrap(), Color::Rgb(0, 0, 128));
    }

    #[test]
    fn rejects_invalid_colors() {
        assert!(parse_color("#12FG34").unwrap_err().to_string().contains("non-hexadecimal"));
        assert!(parse_color("#1234").is_err());
        assert!(parse_color("chartreuse-ish").is_err());
    }

    #[test]
    fn style_flags_are_applied() {
        let style = DocumentStyle::new()
            .with_font_size(20)
            .bold()
            .italic()
            .with_color("#0a141e");
        let converted = to_style(&style, &LoadedFamilies::new("Roboto")).unwrap();
        assert!(converted.is_bold());
        assert!(converted.is_italic());
        assert_eq!(converted.font_size(), 20);
        assert_eq!(converted.color(), Some(Color::Rgb(10, 20, 30)));
    }

    #[test]
    fn unknown_font_family_is_a_config_error() {
        let style = DocumentStyle::new().with_font("Missing");
        let err = to_style(&style, &LoadedFamilies::new("Roboto")).unwrap_err();
        assert!(matches!(err, GenerationError::Config(_)));
    }

    #[test]
    fn default_family_needs_no_override() {
        let style = DocumentStyle::new().with_font("Roboto");
        assert!(to_style(&style, &LoadedFamilies::new("Roboto")).is_ok());
    }

    #[test]
    fn justify_maps_to_left() {
        assert!(matches!(to_alignment(HorizontalAlignment::Justify), Alignment::Left));
        assert!(matches!(to_alignment(HorizontalAlignment::Center), Alignment::Center));
    }
}
