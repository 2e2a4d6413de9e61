//! Page geometry: paper sizes, orientation and page margins.

use serde::Deserialize;

/// Millimetres per PostScript point (1/72 inch).
pub const MM_PER_POINT: f64 = 25.4 / 72.0;

/// Named paper sizes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[allow(missing_docs)]
pub enum PageSize {
    #[serde(rename = "4A0")]
    FourA0,
    #[serde(rename = "2A0")]
    TwoA0,
    A0,
    A1,
    A2,
    A3,
    #[default]
    A4,
    A5,
    A6,
    A7,
    A8,
    A9,
    A10,
    B0,
    B1,
    B2,
    B3,
    B4,
    B5,
    B6,
    B7,
    B8,
    B9,
    B10,
    C0,
    C1,
    C2,
    C3,
    C4,
    C5,
    C6,
    C7,
    C8,
    C9,
    C10,
    RA0,
    RA1,
    RA2,
    RA3,
    RA4,
    SRA0,
    SRA1,
    SRA2,
    SRA3,
    SRA4,
    Executive,
    Folio,
    Legal,
    Letter,
    Tabloid,
}

impl PageSize {
    /// Returns `(width, height)` in portrait orientation, in millimetres.
    pub fn dimensions_mm(self) -> (f64, f64) {
        use PageSize::*;
        match self {
            FourA0 => (1682.0, 2378.0),
            TwoA0 => (1189.0, 1682.0),
            A0 => (841.0, 1189.0),
            A1 => (594.0, 841.0),
            A2 => (420.0, 594.0),
            A3 => (297.0, 420.0),
            A4 => (210.0, 297.0),
            A5 => (148.0, 210.0),
            A6 => (105.0, 148.0),
            A7 => (74.0, 105.0),
            A8 => (52.0, 74.0),
            A9 => (37.0, 52.0),
            A10 => (26.0, 37.0),
            B0 => (1000.0, 1414.0),
            B1 => (707.0, 1000.0),
            B2 => (500.0, 707.0),
            B3 => (353.0, 500.0),
            B4 => (250.0, 353.0),
            B5 => (176.0, 250.0),
            B6 => (125.0, 176.0),
            B7 => (88.0, 125.0),
            B8 => (62.0, 88.0),
            B9 => (44.0, 62.0),
            B10 => (31.0, 44.0),
            C0 => (917.0, 1297.0),
            C1 => (648.0, 917.0),
            C2 => (458.0, 648.0),
            C3 => (324.0, 458.0),
            C4 => (229.0, 324.0),
            C5 => (162.0, 229.0),
            C6 => (114.0, 162.0),
            C7 => (81.0, 114.0),
            C8 => (57.0, 81.0),
            C9 => (40.0, 57.0),
            C10 => (28.0, 40.0),
            RA0 => (860.0, 1220.0),
            RA1 => (610.0, 860.0),
            RA2 => (430.0, 610.0),
            RA3 => (305.0, 430.0),
            RA4 => (215.0, 305.0),
            SRA0 => (900.0, 1280.0),
            SRA1 => (640.0, 900.0),
            SRA2 => (450.0, 640.0),
            SRA3 => (320.0, 450.0),
            SRA4 => (225.0, 320.0),
            Executive => (184.15, 266.7),
            Folio => (215.9, 330.2),
            Legal => (215.9, 355.6),
            Letter => (215.9, 279.4),
            Tabloid => (279.4, 431.8),
        }
    }
}

/// Page orientation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageOrientation {
    /// Height greater than width.
    #[default]
    Portrait,
    /// Width greater than height.
    Landscape,
}

impl PageOrientation {
    /// Orients a `(width, height)` pair.
    pub fn apply(self, (width, height): (f64, f64)) -> (f64, f64) {
        let (short, long) = if width <= height {
            (width, height)
        } else {
            (height, width)
        };
        match self {
            PageOrientation::Portrait => (short, long),
            PageOrientation::Landscape => (long, short),
        }
    }
}

/// Page margins in points, stored as `[left, top, right, bottom]`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(from = "[f64; 4]")]
pub struct PageMargins {
    /// Left margin.
    pub left: f64,
    /// Top margin.
    pub top: f64,
    /// Right margin.
    pub right: f64,
    /// Bottom margin.
    pub bottom: f64,
}

impl PageMargins {
    /// Creates margins from the four sides, in points.
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Creates equal margins on every side, in points.
    pub fn uniform(points: f64) -> Self {
        Self::new(points, points, points, points)
    }
}

impl Default for PageMargins {
    fn default() -> Self {
        Self::uniform(40.0)
    }
}

impl From<[f64; 4]> for PageMargins {
    fn from([left, top, right, bottom]: [f64; 4]) -> Self {
        Self::new(left, top, right, bottom)
    }
}
