// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sharpness — variance of the Laplacian response. Flat or blurred images
// have little second-derivative energy and therefore a low variance.

use image::GrayImage;
use serde::Serialize;
use tracing::debug;

use super::MetricError;
use crate::kernel::{self, Plane};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SharpnessReading {
    /// Population variance of the Laplacian over every pixel.
    pub variance: f64,
    pub threshold: f64,
    pub blurry: bool,
}

/// Score sharpness of a luma image against `threshold`.
pub fn check_sharpness(gray: &GrayImage, threshold: f64) -> Result<SharpnessReading, MetricError> {
    let plane = Plane::from_gray(gray);
    let variance = kernel::laplacian(&plane)
        .variance()
        .ok_or(MetricError::Empty)?;
    debug!(variance, threshold, "Laplacian variance computed");
    Ok(SharpnessReading {
        variance,
        threshold,
        blurry: variance < threshold,
    })
}

impl std::fmt::Display for SharpnessReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.blurry {
            write!(
                f,
                "Image appears blurry (sharpness: {:.2}). Consider sharpening or using a different image.",
                self.variance
            )
        } else {
            write!(
                f,
                "Image sharpness is adequate for printing (sharpness: {:.2}).",
                self.variance
            )
        }
    }
}
