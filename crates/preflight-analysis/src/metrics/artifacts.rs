// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Compression-artifact detection from three independent sub-scores:
//
// 1. Blockiness   — mean |left-vs-right column| and |top-vs-bottom row|
//                   differences across every block-sized window
// 2. Detail loss  — fraction of pixels with a near-zero Laplacian
// 3. Ringing      — fraction of pixels where the sharpened Sobel magnitude
//                   exceeds the edge threshold
//
// The combined level is their unweighted mean.

use image::GrayImage;
use preflight_core::config::ArtifactConfig;
use serde::Serialize;
use tracing::debug;

use super::MetricError;
use crate::kernel::{self, Border, Kernel, Plane};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArtifactScores {
    pub blockiness: f64,
    pub detail_loss: f64,
    pub ringing: f64,
    /// Unweighted mean of the three sub-scores.
    pub level: f64,
    pub significant: bool,
}

/// Score compression artifacts on a luma image.
///
/// An image smaller than a block on both axes is still scored, with the
/// block kernels sliding over the image instead. Fails when the image is
/// smaller than a block on one axis only.
pub fn detect_artifacts(gray: &GrayImage, params: &ArtifactConfig) -> Result<ArtifactScores, MetricError> {
    if params.block_size < 2 {
        return Err(MetricError::InvalidParameter(format!(
            "block size must be at least 2, got {}",
            params.block_size
        )));
    }
    let plane = Plane::from_gray(gray);
    if plane.is_empty() {
        return Err(MetricError::Empty);
    }

    let blockiness = blockiness(&plane, params.block_size).ok_or(MetricError::TooSmall {
        width: gray.width(),
        height: gray.height(),
        min: params.block_size as u32,
    })?;
    let detail_loss = detail_loss(&plane, params.detail_threshold).ok_or(MetricError::Empty)?;
    let ringing = ringing(&plane, params.edge_threshold).ok_or(MetricError::Empty)?;

    let level = (blockiness + detail_loss + ringing) / 3.0;
    debug!(blockiness, detail_loss, ringing, level, "Artifact scores computed");
    Ok(ArtifactScores {
        blockiness,
        detail_loss,
        ringing,
        level,
        significant: level > params.level_threshold,
    })
}

/// Mean absolute block-edge difference, averaged over both directions.
fn blockiness(plane: &Plane, block_size: usize) -> Option<f64> {
    let horizontal = kernel::convolve_valid(plane, &Kernel::column_edges(block_size))?;
    let vertical = kernel::convolve_valid(plane, &Kernel::row_edges(block_size))?;
    let h = horizontal.map(f64::abs).mean()?;
    let v = vertical.map(f64::abs).mean()?;
    Some((h + v) / 2.0)
}

/// Fraction of pixels whose |Laplacian| is below `threshold`.
fn detail_loss(plane: &Plane, threshold: f64) -> Option<f64> {
    kernel::laplacian(plane).fraction(|v| v.abs() < threshold)
}

/// Fraction of pixels whose ring-filtered gradient magnitude exceeds
/// `threshold`.
fn ringing(plane: &Plane, threshold: f64) -> Option<f64> {
    let gx = kernel::sobel_x(plane);
    let gy = kernel::sobel_y(plane);
    let magnitude = gx.zip_with(&gy, f64::hypot)?;
    let filtered = kernel::convolve_same(&magnitude, &kernel::ring_kernel(), Border::Symmetric);
    filtered.fraction(|v| v > threshold)
}

impl std::fmt::Display for ArtifactScores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (headline, outlook) = if self.significant {
            (
                "Significant compression artifacts detected",
                "This may affect print quality on physical media.",
            )
        } else {
            (
                "No significant compression artifacts detected",
                "The image should print well on physical media.",
            )
        };
        write!(
            f,
            "{headline} (level: {:.2}). Blockiness: {:.2}, Detail loss: {:.2}, Ringing: {:.2}. {outlook}",
            self.level, self.blockiness, self.detail_loss, self.ringing
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn flat_black_image_loses_all_detail() {
        let flat = GrayImage::new(32, 32);
        let scores = detect_artifacts(&flat, &ArtifactConfig::default()).unwrap();
        assert_eq!(scores.blockiness, 0.0);
        assert_eq!(scores.ringing, 0.0);
        assert_eq!(scores.detail_loss, 1.0);
        assert!((scores.level - 1.0 / 3.0).abs() < 1e-12);
        assert!(scores.significant);
        assert_eq!(
            scores.to_string(),
            "Significant compression artifacts detected (level: 0.33). Blockiness: 0.00, \
             Detail loss: 1.00, Ringing: 0.00. This may affect print quality on physical media."
        );
    }

    #[test]
    fn level_is_unweighted_mean() {
        let img = GrayImage::from_fn(40, 40, |x, y| Luma([((x / 8 + y / 8) % 2 * 200) as u8]));
        let s = detect_artifacts(&img, &ArtifactConfig::default()).unwrap();
        assert!((s.level - (s.blockiness + s.detail_loss + s.ringing) / 3.0).abs() < 1e-12);
        assert!(s.blockiness > 0.0);
        assert!(s.ringing > 0.0 && s.ringing < 1.0);
    }

    #[test]
    fn quiet_verdict_below_threshold() {
        let flat = GrayImage::new(16, 16);
        let params = ArtifactConfig {
            level_threshold: 0.5,
            ..ArtifactConfig::default()
        };
        let scores = detect_artifacts(&flat, &params).unwrap();
        assert!(!scores.significant);
        assert!(scores.to_string().starts_with("No significant compression artifacts"));
    }

    #[test]
    fn image_inside_one_block_is_still_scored() {
        let tiny = GrayImage::new(6, 6);
        let scores = detect_artifacts(&tiny, &ArtifactConfig::default()).unwrap();
        assert_eq!(scores.blockiness, 0.0);
        assert_eq!(scores.detail_loss, 1.0);
    }

    #[test]
    fn image_narrower_than_a_block_fails() {
        let tiny = GrayImage::new(5, 20);
        assert_eq!(
            detect_artifacts(&tiny, &ArtifactConfig::default()),
            Err(MetricError::TooSmall {
                width: 5,
                height: 20,
                min: 8
            })
        );
    }

    #[test]
    fn degenerate_block_size_is_rejected() {
        let params = ArtifactConfig {
            block_size: 1,
            ..ArtifactConfig::default()
        };
        assert!(matches!(
            detect_artifacts(&GrayImage::new(8, 8), &params),
            Err(MetricError::InvalidParameter(_))
        ));
    }
}
