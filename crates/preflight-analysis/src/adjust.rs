// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Adjustment engine — derives an ordered list of corrective transforms from a
// metric report and applies them to a fresh decode of the original bytes.

use preflight_core::error::PreflightError;
use preflight_core::{AnalysisConfig, PixelSize, PrintSpec};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::image::ImageProcessor;
use crate::metrics::{CheckName, ExposureVerdict, Finding};
use crate::report::MetricReport;

/// One corrective transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Adjustment {
    /// Centre crop to the target aspect ratio.
    CropToAspect { x: u32, y: u32, width: u32, height: u32 },
    Sharpen { factor: f32 },
    Brighten { factor: f32 },
    Darken { factor: f32 },
    Upscale { factor: u32 },
}

/// Ordered corrective transforms for one image.
///
/// Rules are evaluated in a fixed order (crop, sharpen, exposure, upscale)
/// and each fires independently.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AdjustmentPlan {
    steps: Vec<Adjustment>,
}

impl AdjustmentPlan {
    /// Derive the plan from structured report evidence.
    ///
    /// `original` is the decoded size of the image the report describes. It
    /// drives the crop rule and stands in for the resolution entry when that
    /// check failed.
    pub fn derive(report: &MetricReport, original: PixelSize, spec: &PrintSpec, config: &AnalysisConfig) -> Self {
        let mut steps = Vec::new();
        let params = &config.adjustment;

        if let Some(crop) = crop_to_aspect(original, spec.aspect_ratio(), config.aspect_tolerance) {
            steps.push(crop);
        }

        if let Some(Finding::Sharpness(reading)) = report.finding(CheckName::Sharpness) {
            if reading.blurry {
                steps.push(Adjustment::Sharpen {
                    factor: params.sharpen_factor,
                });
            }
        }

        if let Some(Finding::Exposure(reading)) = report.finding(CheckName::Exposure) {
            match reading.verdict {
                ExposureVerdict::Underexposed => steps.push(Adjustment::Brighten {
                    factor: params.brighten_factor,
                }),
                ExposureVerdict::Overexposed => steps.push(Adjustment::Darken {
                    factor: params.darken_factor,
                }),
                ExposureVerdict::Acceptable => {}
            }
        }

        let reported = match report.finding(CheckName::Resolution) {
            Some(Finding::Resolution { width, height }) => PixelSize::new(*width, *height),
            _ => original,
        };
        if reported.width < params.upscale_min_dimension || reported.height < params.upscale_min_dimension {
            steps.push(Adjustment::Upscale {
                factor: params.upscale_factor,
            });
        }

        debug!(?steps, "Adjustment plan derived");
        Self { steps }
    }

    pub fn from_steps(steps: Vec<Adjustment>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Adjustment] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Apply every step in order.
    pub fn apply(&self, processor: ImageProcessor) -> ImageProcessor {
        self.steps.iter().fold(processor, |p, step| match *step {
            Adjustment::CropToAspect { x, y, width, height } => p.crop(x, y, width, height),
            Adjustment::Sharpen { factor } => p.sharpen(factor),
            Adjustment::Brighten { factor } | Adjustment::Darken { factor } => p.scale_brightness(factor),
            Adjustment::Upscale { factor } => p.upscale(factor),
        })
    }
}

/// Centre crop rectangle bringing `size` to `target` ratio, or `None` when
/// the ratios already agree within `tolerance` or the crop would be empty.
fn crop_to_aspect(size: PixelSize, target: f64, tolerance: f64) -> Option<Adjustment> {
    if size.width == 0 || size.height == 0 {
        return None;
    }
    let current = size.aspect_ratio();
    if (current - target).abs() < tolerance {
        return None;
    }
    if current > target {
        let width = (size.height as f64 * target) as u32;
        (width > 0).then_some(Adjustment::CropToAspect {
            x: (size.width - width.min(size.width)) / 2,
            y: 0,
            width,
            height: size.height,
        })
    } else {
        let height = (size.width as f64 / target) as u32;
        (height > 0).then_some(Adjustment::CropToAspect {
            x: 0,
            y: (size.height - height.min(size.height)) / 2,
            width: size.width,
            height,
        })
    }
}

/// Correct `data` according to `report` and return PNG bytes.
///
/// The image is always re-encoded, even when no rule fires.
#[instrument(skip(data, report, spec, config), fields(data_len = data.len()))]
pub fn adjust(
    data: &[u8],
    report: &MetricReport,
    spec: &PrintSpec,
    config: &AnalysisConfig,
) -> Result<Vec<u8>, PreflightError> {
    spec.validate()?;
    let processor = ImageProcessor::from_bytes(data)?;
    let original = PixelSize::new(processor.width(), processor.height());
    let plan = AdjustmentPlan::derive(report, original, spec, config);
    info!(steps = plan.steps().len(), "Applying adjustment plan");
    plan.apply(processor).to_png_bytes()
}
