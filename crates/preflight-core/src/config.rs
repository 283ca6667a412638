// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Analysis configuration. Every threshold here is a starting default that has
// not been calibrated against ground truth.

use serde::{Deserialize, Serialize};

/// Tunable thresholds for the metric engine and the adjustment engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Laplacian variance below which an image is reported blurry.
    pub sharpness_threshold: f64,
    /// Maximum |image ratio - target ratio| still treated as a match.
    pub aspect_tolerance: f64,
    pub artifacts: ArtifactConfig,
    pub exposure: ExposureConfig,
    pub adjustment: AdjustmentConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sharpness_threshold: 100.0,
            aspect_tolerance: 0.01,
            artifacts: ArtifactConfig::default(),
            exposure: ExposureConfig::default(),
            adjustment: AdjustmentConfig::default(),
        }
    }
}

/// Compression-artifact detector parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Side length of the square blockiness kernels.
    pub block_size: usize,
    /// |Laplacian| below this counts as lost detail.
    pub detail_threshold: f64,
    /// Filtered gradient magnitude above this counts as ringing.
    pub edge_threshold: f64,
    /// Combined level above this is reported as significant.
    pub level_threshold: f64,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            block_size: 8,
            detail_threshold: 0.1,
            edge_threshold: 20.0,
            level_threshold: 0.1,
        }
    }
}

/// Histogram-based exposure classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExposureConfig {
    /// Percentage of very dark pixels above which the image is underexposed.
    pub dark_percent: f64,
    /// Percentage of very bright pixels above which the image is overexposed.
    pub bright_percent: f64,
    /// Number of histogram bins, from 0 upwards, that count as very dark.
    pub dark_bins: usize,
    /// Number of histogram bins, from 255 downwards, that count as very bright.
    pub bright_bins: usize,
}

impl Default for ExposureConfig {
    fn default() -> Self {
        Self {
            dark_percent: 5.0,
            bright_percent: 5.0,
            dark_bins: 10,
            bright_bins: 10,
        }
    }
}

/// Fixed intensities used by the corrective transforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustmentConfig {
    pub sharpen_factor: f32,
    pub brighten_factor: f32,
    pub darken_factor: f32,
    /// Images narrower or shorter than this are upscaled.
    pub upscale_min_dimension: u32,
    pub upscale_factor: u32,
}

impl Default for AdjustmentConfig {
    fn default() -> Self {
        Self {
            sharpen_factor: 1.5,
            brighten_factor: 1.2,
            darken_factor: 0.8,
            upscale_min_dimension: 2000,
            upscale_factor: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let cfg: AnalysisConfig = toml::from_str(
            r#"
            sharpness_threshold = 250.0

            [artifacts]
            block_size = 16
            "#,
        )
        .unwrap();
        assert_eq!(cfg.sharpness_threshold, 250.0);
        assert_eq!(cfg.artifacts.block_size, 16);
        assert_eq!(cfg.artifacts.detail_threshold, 0.1);
        assert_eq!(cfg.exposure, ExposureConfig::default());
        assert_eq!(cfg.adjustment.upscale_min_dimension, 2000);
    }

    #[test]
    fn json_round_trip_is_lossless() {
        let cfg = AnalysisConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: AnalysisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
