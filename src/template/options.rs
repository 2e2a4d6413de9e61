//! Page geometry and behaviour of HTML rendering.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::GenerationError;
use crate::model::MM_PER_POINT;

/// Time a renderer may take before the run is aborted.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Unit of a [`Dimension`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unit {
    /// Millimetres.
    Millimeters,
    /// Centimetres.
    Centimeters,
    /// Inches.
    Inches,
    /// Pixels at 72 per inch.
    Pixels,
}

impl Unit {
    fn suffix(self) -> &'static str {
        match self {
            Unit::Millimeters => "mm",
            Unit::Centimeters => "cm",
            Unit::Inches => "in",
            Unit::Pixels => "px",
        }
    }
}

/// A length written as a number with an optional unit, like `50mm` or `2in`.
///
/// Numbers without a unit are pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dimension {
    value: f64,
    unit: Unit,
}

impl Dimension {
    /// Creates a dimension in millimetres.
    pub fn mm(value: f64) -> Self {
        Self {
            value,
            unit: Unit::Millimeters,
        }
    }

    /// Returns the numeric value in the dimension's own unit.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Returns the unit.
    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Converts the dimension to millimetres.
    pub fn to_mm(&self) -> f64 {
        match self.unit {
            Unit::Millimeters => self.value,
            Unit::Centimeters => self.value * 10.0,
            Unit::Inches => self.value * 25.4,
            Unit::Pixels => self.value * MM_PER_POINT,
        }
    }
}

impl FromStr for Dimension {
    type Err = GenerationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let split = trimmed
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(trimmed.len());
        let (number, suffix) = trimmed.split_at(split);

        let unit = match suffix.trim() {
            "" | "px" => Unit::Pixels,
            "mm" => Unit::Millimeters,
            "cm" => Unit::Centimeters,
            "in" => Unit::Inches,
            other => {
                return Err(GenerationError::Config(format!(
                    "unsupported unit '{other}' in dimension '{input}'"
                )))
            }
        };

        let value: f64 = number.parse().map_err(|_| {
            GenerationError::Config(format!("dimension '{input}' does not start with a number"))
        })?;

        Ok(Self { value, unit })
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

/// Named paper formats understood by the HTML renderers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum PaperFormat {
    A3,
    #[default]
    A4,
    A5,
    Legal,
    Letter,
    Tabloid,
}

impl PaperFormat {
    /// Returns `(width, height)` in portrait orientation, in millimetres.
    pub fn dimensions_mm(self) -> (f64, f64) {
        match self {
            PaperFormat::A3 => (297.0, 420.0),
            PaperFormat::A4 => (210.0, 297.0),
            PaperFormat::A5 => (148.0, 210.0),
            PaperFormat::Legal => (215.9, 355.6),
            PaperFormat::Letter => (215.9, 279.4),
            PaperFormat::Tabloid => (279.4, 431.8),
        }
    }

    /// Returns the name used on converter command lines.
    pub fn name(self) -> &'static str {
        match self {
            PaperFormat::A3 => "A3",
            PaperFormat::A4 => "A4",
            PaperFormat::A5 => "A5",
            PaperFormat::Legal => "Legal",
            PaperFormat::Letter => "Letter",
            PaperFormat::Tabloid => "Tabloid",
        }
    }
}

impl FromStr for PaperFormat {
    type Err = GenerationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "a3" => Ok(PaperFormat::A3),
            "a4" => Ok(PaperFormat::A4),
            "a5" => Ok(PaperFormat::A5),
            "legal" => Ok(PaperFormat::Legal),
            "letter" => Ok(PaperFormat::Letter),
            "tabloid" => Ok(PaperFormat::Tabloid),
            _ => Err(GenerationError::Config(format!(
                "unknown paper format '{input}'"
            ))),
        }
    }
}

/// Page orientation of a named format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Orientation {
    /// Height exceeds width.
    #[default]
    Portrait,
    /// Width exceeds height.
    Landscape,
}

impl Orientation {
    /// Returns the name used on converter command lines.
    pub fn name(self) -> &'static str {
        match self {
            Orientation::Portrait => "Portrait",
            Orientation::Landscape => "Landscape",
        }
    }
}

impl FromStr for Orientation {
    type Err = GenerationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "portrait" => Ok(Orientation::Portrait),
            "landscape" => Ok(Orientation::Landscape),
            _ => Err(GenerationError::Config(format!(
                "unknown orientation '{input}'"
            ))),
        }
    }
}

/// Options handed to an [`HtmlRenderer`](super::HtmlRenderer).
///
/// An explicit page size takes precedence over the format and orientation.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderOptions {
    size: Option<(Dimension, Dimension)>,
    format: PaperFormat,
    orientation: Orientation,
    border: Option<Dimension>,
    base: Option<String>,
    timeout: Duration,
}

impl RenderOptions {
    /// Creates options for a portrait A4 page without border.
    pub fn new() -> Self {
        Self {
            size: None,
            format: PaperFormat::default(),
            orientation: Orientation::default(),
            border: None,
            base: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets an explicit page width and height.
    pub fn with_size(mut self, width: Dimension, height: Dimension) -> Self {
        self.size = Some((width, height));
        self
    }

    /// Sets the paper format used when no explicit size is set.
    pub fn with_format(mut self, format: PaperFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the orientation of the paper format.
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Sets the uniform page border.
    pub fn with_border(mut self, border: Dimension) -> Self {
        self.border = Some(border);
        self
    }

    /// Sets the base URL relative resources are resolved against.
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Sets the time limit of a single render.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the explicit page size, if any.
    pub fn size(&self) -> Option<(Dimension, Dimension)> {
        self.size
    }

    /// Returns the paper format.
    pub fn format(&self) -> PaperFormat {
        self.format
    }

    /// Returns the orientation.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Returns the page border.
    pub fn border(&self) -> Option<Dimension> {
        self.border
    }

    /// Returns the base URL.
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// Returns the render time limit.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the border in millimetres, zero when unset.
    pub fn border_mm(&self) -> f64 {
        self.border.map(|border| border.to_mm()).unwrap_or(0.0)
    }

    /// Resolves the page `(width, height)` in millimetres.
    pub fn page_size_mm(&self) -> (f64, f64) {
        if let Some((width, height)) = self.size {
            return (width.to_mm(), height.to_mm());
        }

        let (width, height) = self.format.dimensions_mm();
        match self.orientation {
            Orientation::Portrait => (width, height),
            Orientation::Landscape => (height, width),
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn parses_dimensions_with_units() {
        assert!(close("50mm".parse::<Dimension>().unwrap().to_mm(), 50.0));
        assert!(close("1.5cm".parse::<Dimension>().unwrap().to_mm(), 15.0));
        assert!(close("2in".parse::<Dimension>().unwrap().to_mm(), 50.8));
        assert!(close("72px".parse::<Dimension>().unwrap().to_mm(), 25.4));
    }

    #[test]
    fn bare_numbers_are_pixels() {
        let dimension: Dimension = " 144 ".parse().unwrap();
        assert_eq!(dimension.unit(), Unit::Pixels);
        assert!(close(dimension.to_mm(), 50.8));
    }

    #[test]
    fn rejects_malformed_dimensions() {
        assert!("mm".parse::<Dimension>().is_err());
        assert!("10pt".parse::<Dimension>().is_err());
        assert!("1.2.3mm".parse::<Dimension>().is_err());
    }

    #[test]
    fn dimension_display_keeps_unit() {
        assert_eq!("90mm".parse::<Dimension>().unwrap().to_string(), "90mm");
    }

    #[test]
    fn explicit_size_wins_over_format() {
        let options = RenderOptions::new()
            .with_format(PaperFormat::Letter)
            .with_orientation(Orientation::Landscape)
            .with_size(Dimension::mm(50.0), Dimension::mm(90.0));
        assert_eq!(options.page_size_mm(), (50.0, 90.0));
    }

    #[test]
    fn landscape_swaps_format_dimensions() {
        let options = RenderOptions::new()
            .with_format(PaperFormat::A5)
            .with_orientation(Orientation::Landscape);
        assert_eq!(options.page_size_mm(), (210.0, 148.0));
    }

    #[test]
    fn parses_format_and_orientation_names() {
        assert_eq!("tabloid".parse::<PaperFormat>().unwrap(), PaperFormat::Tabloid);
        assert_eq!("Landscape".parse::<Orientation>().unwrap(), Orientation::Landscape);
        assert!("B5".parse::<PaperFormat>().is_err());
    }
}
