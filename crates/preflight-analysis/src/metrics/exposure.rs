// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Exposure — share of pixels crushed into the darkest and brightest
// histogram bins. Dark excess is checked first and wins outright.

use image::GrayImage;
use imageproc::stats::histogram;
use preflight_core::config::ExposureConfig;
use serde::Serialize;
use tracing::debug;

use super::MetricError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureVerdict {
    Underexposed,
    Overexposed,
    Acceptable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExposureReading {
    pub dark_percent: f64,
    pub bright_percent: f64,
    pub dark_threshold: f64,
    pub bright_threshold: f64,
    pub verdict: ExposureVerdict,
}

/// Classify exposure from the 256-bin luma histogram.
pub fn check_exposure(gray: &GrayImage, params: &ExposureConfig) -> Result<ExposureReading, MetricError> {
    let total = gray.width() as u64 * gray.height() as u64;
    if total == 0 {
        return Err(MetricError::Empty);
    }
    if params.dark_bins > 256 || params.bright_bins > 256 {
        return Err(MetricError::InvalidParameter(format!(
            "histogram has 256 bins, got dark_bins={} bright_bins={}",
            params.dark_bins, params.bright_bins
        )));
    }

    let hist = histogram(gray);
    let bins = &hist.channels[0];
    let count = |range: std::ops::Range<usize>| bins[range].iter().map(|&c| c as u64).sum::<u64>();
    let dark = count(0..params.dark_bins);
    let bright = count(256 - params.bright_bins..256);

    let dark_percent = dark as f64 / total as f64 * 100.0;
    let bright_percent = bright as f64 / total as f64 * 100.0;
    let verdict = if dark_percent > params.dark_percent {
        ExposureVerdict::Underexposed
    } else if bright_percent > params.bright_percent {
        ExposureVerdict::Overexposed
    } else {
        ExposureVerdict::Acceptable
    };
    debug!(dark_percent, bright_percent, ?verdict, "Exposure classified");

    Ok(ExposureReading {
        dark_percent,
        bright_percent,
        dark_threshold: params.dark_percent,
        bright_threshold: params.bright_percent,
        verdict,
    })
}

impl std::fmt::Display for ExposureReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.verdict {
            ExposureVerdict::Underexposed => write!(
                f,
                "Image may be underexposed. {:.2}% of pixels are very dark (threshold: {}%).",
                self.dark_percent, self.dark_threshold
            ),
            ExposureVerdict::Overexposed => write!(
                f,
                "Image may be overexposed. {:.2}% of pixels are very bright (threshold: {}%).",
                self.bright_percent, self.bright_threshold
            ),
            ExposureVerdict::Acceptable => write!(
                f,
                "Exposure is within acceptable limits. Dark pixels: {:.2}%, Bright pixels: {:.2}%.",
                self.dark_percent, self.bright_percent
            ),
        }
    }
}
