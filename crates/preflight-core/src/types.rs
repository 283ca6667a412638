// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Preflight print-readiness engine.

use serde::{Deserialize, Serialize};

use crate::error::PreflightError;

/// Millimetres per inch.
const MM_PER_INCH: f64 = 25.4;

/// Pixel dimensions of an image or a required print area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width divided by height. Zero-height sizes yield `f64::INFINITY`.
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Whether both axes are at least as large as `other`.
    pub fn covers(&self, other: PixelSize) -> bool {
        self.width >= other.width && self.height >= other.height
    }
}

impl std::fmt::Display for PixelSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Pixel layout of a decoded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMode {
    Grayscale,
    GrayscaleAlpha,
    Rgb,
    Rgba,
    Cmyk,
    /// Indexed, bilevel, floating-point or otherwise unusual layouts.
    Other(String),
}

impl ColorMode {
    /// Short mode label as used in print-shop tooling (`L`, `RGB`, `CMYK`, ...).
    pub fn label(&self) -> &str {
        match self {
            Self::Grayscale => "L",
            Self::GrayscaleAlpha => "LA",
            Self::Rgb => "RGB",
            Self::Rgba => "RGBA",
            Self::Cmyk => "CMYK",
            Self::Other(label) => label,
        }
    }

    /// Names of the individual bands, in storage order.
    pub fn band_names(&self) -> Vec<String> {
        let bands: &[&str] = match self {
            Self::Grayscale => &["L"],
            Self::GrayscaleAlpha => &["L", "A"],
            Self::Rgb => &["R", "G", "B"],
            Self::Rgba => &["R", "G", "B", "A"],
            Self::Cmyk => &["C", "M", "Y", "K"],
            Self::Other(label) => return vec![label.clone()],
        };
        bands.iter().map(|b| (*b).to_owned()).collect()
    }

    /// How well this layout suits print production.
    pub fn suitability(&self) -> Suitability {
        match self {
            Self::Rgb | Self::Rgba | Self::Cmyk => Suitability::Adequate,
            Self::Grayscale => Suitability::Conditional,
            Self::GrayscaleAlpha | Self::Other(_) => Suitability::Caution,
        }
    }
}

impl std::fmt::Display for ColorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Print suitability of a colour layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Suitability {
    /// Fine for high-quality printing.
    Adequate,
    /// Usable depending on the job (e.g. monochrome prints).
    Conditional,
    /// Likely to print poorly without conversion.
    Caution,
}

/// Standard print sizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PaperSize {
    Letter,
    Legal,
    Tabloid,
    A3,
    A4,
    A5,
}

impl PaperSize {
    /// Dimensions in inches (width, height), portrait orientation.
    pub fn dimensions_in(&self) -> (f64, f64) {
        match self {
            Self::Letter => (8.5, 11.0),
            Self::Legal => (8.5, 14.0),
            Self::Tabloid => (11.0, 17.0),
            Self::A3 => (297.0 / MM_PER_INCH, 420.0 / MM_PER_INCH),
            Self::A4 => (210.0 / MM_PER_INCH, 297.0 / MM_PER_INCH),
            Self::A5 => (148.0 / MM_PER_INCH, 210.0 / MM_PER_INCH),
        }
    }

    /// Look up a named size (`letter`, `a4`, ...). Case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "letter" => Some(Self::Letter),
            "legal" => Some(Self::Legal),
            "tabloid" | "ledger" => Some(Self::Tabloid),
            "a3" => Some(Self::A3),
            "a4" => Some(Self::A4),
            "a5" => Some(Self::A5),
            _ => None,
        }
    }
}

/// Physical print target: trim size, bleed and output resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintSpec {
    /// Target print resolution in dots per inch.
    pub dpi: f64,
    /// Trim width in inches.
    pub width_in: f64,
    /// Trim height in inches.
    pub height_in: f64,
    /// Bleed added on every edge, in inches.
    pub bleed_in: f64,
}

impl Default for PrintSpec {
    fn default() -> Self {
        Self {
            dpi: 300.0,
            width_in: 8.5,
            height_in: 11.0,
            bleed_in: 0.125,
        }
    }
}

impl PrintSpec {
    /// Build a validated print target.
    pub fn new(dpi: f64, width_in: f64, height_in: f64, bleed_in: f64) -> Result<Self, PreflightError> {
        let spec = Self {
            dpi,
            width_in,
            height_in,
            bleed_in,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Reject non-finite, zero or negative dimensions.
    pub fn validate(&self) -> Result<(), PreflightError> {
        let positive = [
            ("dpi", self.dpi),
            ("width", self.width_in),
            ("height", self.height_in),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(PreflightError::InvalidPrintSpec(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if !self.bleed_in.is_finite() || self.bleed_in < 0.0 {
            return Err(PreflightError::InvalidPrintSpec(format!(
                "bleed must be zero or positive, got {}",
                self.bleed_in
            )));
        }
        Ok(())
    }

    /// Trim width divided by trim height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width_in / self.height_in
    }

    /// Pixels needed to cover the trim area plus bleed on both sides.
    ///
    /// Fractional pixels are truncated.
    pub fn required_pixels(&self) -> PixelSize {
        let width = (self.width_in + 2.0 * self.bleed_in) * self.dpi;
        let height = (self.height_in + 2.0 * self.bleed_in) * self.dpi;
        PixelSize::new(width as u32, height as u32)
    }
}
