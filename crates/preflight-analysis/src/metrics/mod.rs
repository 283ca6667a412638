// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Metric engine — independent, pure print-readiness checks over one decoded
// image and one print target. Each check yields a structured `Finding`; the
// human-readable sentence is rendered from it on demand.

pub mod artifacts;
pub mod basic;
pub mod exposure;
pub mod sharpness;

use image::GrayImage;
use preflight_core::{AnalysisConfig, PrintSpec};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::asset::ImageAsset;
use crate::halftone::{self, HalftonePreview};

pub use artifacts::ArtifactScores;
pub use basic::{AspectRatio, Bleed, ColorDepth};
pub use exposure::{ExposureReading, ExposureVerdict};
pub use sharpness::SharpnessReading;

/// The fixed set of checks, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckName {
    Resolution,
    ColorDepth,
    FileSize,
    BleedAndMargins,
    ColorProfile,
    Sharpness,
    AspectRatio,
    CompressionArtifacts,
    Exposure,
    Halftone,
}

impl CheckName {
    /// Every check, in the order reports list them.
    pub const ALL: [CheckName; 10] = [
        Self::Resolution,
        Self::ColorDepth,
        Self::FileSize,
        Self::BleedAndMargins,
        Self::ColorProfile,
        Self::Sharpness,
        Self::AspectRatio,
        Self::CompressionArtifacts,
        Self::Exposure,
        Self::Halftone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resolution => "resolution",
            Self::ColorDepth => "color_depth",
            Self::FileSize => "file_size",
            Self::BleedAndMargins => "bleed_and_margins",
            Self::ColorProfile => "color_profile",
            Self::Sharpness => "sharpness",
            Self::AspectRatio => "aspect_ratio",
            Self::CompressionArtifacts => "compression_artifacts",
            Self::Exposure => "exposure",
            Self::Halftone => "halftone",
        }
    }

    /// Position in `ALL`; used to keep report order independent of
    /// completion order.
    pub fn rank(&self) -> usize {
        Self::ALL.iter().position(|c| c == self).unwrap_or(usize::MAX)
    }

    /// Report label: the name with only its first letter upper-cased
    /// (`Bleed_and_margins`).
    pub fn label(&self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    }
}

impl std::fmt::Display for CheckName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a single check could not produce a finding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricError {
    #[error("image has no pixels")]
    Empty,

    #[error("image is {width}x{height} but this check needs at least {min}x{min} pixels")]
    TooSmall { width: u32, height: u32, min: u32 },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("{0}")]
    Internal(String),
}

/// Structured evidence produced by one check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    Resolution { width: u32, height: u32 },
    ColorDepth(ColorDepth),
    FileSize { bytes: usize },
    BleedAndMargins(Bleed),
    ColorProfile {
        mode: String,
        profile: crate::icc::ProfileDescriptor,
    },
    Sharpness(SharpnessReading),
    AspectRatio(AspectRatio),
    CompressionArtifacts(ArtifactScores),
    Exposure(ExposureReading),
    Halftone(HalftonePreview),
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolution { width, height } => {
                write!(f, "Image resolution: {width}x{height} pixels")
            }
            Self::ColorDepth(depth) => depth.fmt(f),
            Self::FileSize { bytes } => {
                write!(f, "File size: {:.2} MB", *bytes as f64 / (1024.0 * 1024.0))
            }
            Self::BleedAndMargins(bleed) => bleed.fmt(f),
            Self::ColorProfile { mode, profile } => {
                write!(f, "Color mode: {mode}, ICC Profile: {profile}")
            }
            Self::Sharpness(reading) => reading.fmt(f),
            Self::AspectRatio(ratio) => ratio.fmt(f),
            Self::CompressionArtifacts(scores) => scores.fmt(f),
            Self::Exposure(reading) => reading.fmt(f),
            Self::Halftone(_) => f.write_str("Halftone screening simulation complete."),
        }
    }
}

/// Everything a check may read. Shared read-only across worker threads.
pub struct CheckContext<'a> {
    pub asset: &'a ImageAsset,
    pub spec: &'a PrintSpec,
    pub config: &'a AnalysisConfig,
    gray: GrayImage,
}

impl<'a> CheckContext<'a> {
    /// Prepare a context, computing the shared luma copy once.
    pub fn new(asset: &'a ImageAsset, spec: &'a PrintSpec, config: &'a AnalysisConfig) -> Self {
        Self {
            asset,
            spec,
            config,
            gray: asset.grayscale(),
        }
    }

    /// Luma copy of the asset for single-channel algorithms.
    pub fn gray(&self) -> &GrayImage {
        &self.gray
    }
}

/// One print-readiness check.
///
/// Implementations must be pure: the same context always yields the same
/// result, and nothing in the context is mutated.
pub trait Check: Send + Sync {
    fn name(&self) -> CheckName;
    fn run(&self, ctx: &CheckContext<'_>) -> Result<Finding, MetricError>;
}

/// The built-in implementation of a named check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Builtin(pub CheckName);

impl Check for Builtin {
    fn name(&self) -> CheckName {
        self.0
    }

    fn run(&self, ctx: &CheckContext<'_>) -> Result<Finding, MetricError> {
        let asset = ctx.asset;
        match self.0 {
            CheckName::Resolution => Ok(basic::resolution(asset)),
            CheckName::ColorDepth => Ok(basic::color_depth(asset)),
            CheckName::FileSize => Ok(basic::file_size(asset)),
            CheckName::BleedAndMargins => Ok(basic::bleed_and_margins(asset, ctx.spec)),
            CheckName::ColorProfile => Ok(basic::color_profile(asset)),
            CheckName::Sharpness => {
                sharpness::check_sharpness(ctx.gray(), ctx.config.sharpness_threshold)
                    .map(Finding::Sharpness)
            }
            CheckName::AspectRatio => Ok(Finding::AspectRatio(basic::aspect_ratio(
                asset.size(),
                ctx.spec,
                ctx.config.aspect_tolerance,
            ))),
            CheckName::CompressionArtifacts => {
                artifacts::detect_artifacts(ctx.gray(), &ctx.config.artifacts)
                    .map(Finding::CompressionArtifacts)
            }
            CheckName::Exposure => {
                exposure::check_exposure(ctx.gray(), &ctx.config.exposure).map(Finding::Exposure)
            }
            CheckName::Halftone => Ok(Finding::Halftone(halftone::simulate(
                ctx.gray(),
                ctx.spec.dpi,
            ))),
        }
    }
}

/// One boxed built-in check per name, in report order.
pub fn builtin_checks() -> Vec<Box<dyn Check>> {
    CheckName::ALL
        .iter()
        .map(|&name| Box::new(Builtin(name)) as Box<dyn Check>)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_snake_case_and_ordered() {
        let names: Vec<&str> = CheckName::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "resolution",
                "color_depth",
                "file_size",
                "bleed_and_margins",
                "color_profile",
                "sharpness",
                "aspect_ratio",
                "compression_artifacts",
                "exposure",
                "halftone",
            ]
        );
        assert_eq!(CheckName::Exposure.rank(), 8);
    }

    #[test]
    fn labels_capitalise_first_letter_only() {
        assert_eq!(CheckName::BleedAndMargins.label(), "Bleed_and_margins");
        assert_eq!(CheckName::Resolution.label(), "Resolution");
    }

    #[test]
    fn serde_names_match_as_str() {
        for name in CheckName::ALL {
            let json = serde_json::to_string(&name).unwrap();
            assert_eq!(json, format!("\"{}\"", name.as_str()));
        }
    }

    #[test]
    fn file_size_message_in_megabytes() {
        let finding = Finding::FileSize { bytes: 3 * 1024 * 1024 / 2 };
        assert_eq!(finding.to_string(), "File size: 1.50 MB");
    }

    #[test]
    fn resolution_message() {
        let finding = Finding::Resolution {
            width: 850,
            height: 1100,
        };
        assert_eq!(finding.to_string(), "Image resolution: 850x1100 pixels");
    }
}
