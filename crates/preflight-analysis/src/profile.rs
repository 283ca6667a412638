// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Colour-profile conversion — transform pixels from the embedded profile
// (or sRGB when none is embedded) into a target ICC profile read from disk.

use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbImage, RgbaImage};
use moxcms::{ColorProfile, Layout, TransformOptions};
use preflight_core::error::PreflightError;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::asset::ImageAsset;

/// Outcome of a conversion attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ConversionStatus {
    Converted,
    ProfileNotFound(PathBuf),
    Failed(String),
}

impl ConversionStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Converted)
    }
}

impl std::fmt::Display for ConversionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Converted => f.write_str("Color profile conversion completed successfully."),
            Self::ProfileNotFound(path) => write!(
                f,
                "Color profile conversion failed: Profile file not found at {}",
                path.display()
            ),
            Self::Failed(err) => write!(f, "Color profile conversion failed: {err}"),
        }
    }
}

/// Convert `asset` into the ICC profile stored at `target_path`.
///
/// Never fails: on any problem the original asset is returned unchanged
/// together with a failure status.
#[instrument(skip(asset), fields(target = %target_path.display()))]
pub fn convert_color_profile(asset: &ImageAsset, target_path: &Path) -> (ImageAsset, ConversionStatus) {
    if !target_path.exists() {
        warn!("Target profile does not exist");
        return (
            asset.clone(),
            ConversionStatus::ProfileNotFound(target_path.to_path_buf()),
        );
    }
    match std::fs::read(target_path)
        .map_err(PreflightError::from)
        .and_then(|bytes| convert_to_icc(asset, &bytes))
    {
        Ok(converted) => {
            info!("Colour profile conversion complete");
            (converted, ConversionStatus::Converted)
        }
        Err(err) => {
            warn!(error = %err, "Colour profile conversion failed");
            (asset.clone(), ConversionStatus::Failed(err.to_string()))
        }
    }
}

/// Convert into the profile encoded in `target_icc`; the result embeds it.
pub fn convert_to_icc(asset: &ImageAsset, target_icc: &[u8]) -> Result<ImageAsset, PreflightError> {
    let target = ColorProfile::new_from_slice(target_icc)
        .map_err(|e| PreflightError::ProfileConversion(format!("unreadable target profile: {e:?}")))?;
    let pixels = transform_pixels(asset, &target)?;
    Ok(asset
        .clone()
        .with_pixels(pixels)
        .with_icc_profile(Some(target_icc.to_vec())))
}

/// Run the pixel transform from the asset's source profile into `target`.
///
/// Pixels are processed as 8-bit RGB, or RGBA when the image has alpha.
fn transform_pixels(asset: &ImageAsset, target: &ColorProfile) -> Result<DynamicImage, PreflightError> {
    let source = match asset.icc_profile() {
        Some(bytes) => ColorProfile::new_from_slice(bytes)
            .map_err(|e| PreflightError::ProfileConversion(format!("unreadable embedded profile: {e:?}")))?,
        None => ColorProfile::new_srgb(),
    };
    let image = asset.image();
    let (w, h) = (image.width(), image.height());

    if image.color().has_alpha() {
        let src = image.to_rgba8();
        let mut dst = vec![0u8; src.as_raw().len()];
        run_transform(&source, target, Layout::Rgba, src.as_raw(), &mut dst)?;
        let buffer = RgbaImage::from_raw(w, h, dst)
            .ok_or_else(|| PreflightError::ProfileConversion("output buffer size mismatch".into()))?;
        Ok(DynamicImage::ImageRgba8(buffer))
    } else {
        let src = image.to_rgb8();
        let mut dst = vec![0u8; src.as_raw().len()];
        run_transform(&source, target, Layout::Rgb, src.as_raw(), &mut dst)?;
        let buffer = RgbImage::from_raw(w, h, dst)
            .ok_or_else(|| PreflightError::ProfileConversion("output buffer size mismatch".into()))?;
        Ok(DynamicImage::ImageRgb8(buffer))
    }
}

fn run_transform(
    source: &ColorProfile,
    target: &ColorProfile,
    layout: Layout,
    src: &[u8],
    dst: &mut [u8],
) -> Result<(), PreflightError> {
    let transform = source
        .create_transform_8bit(layout, target, layout, TransformOptions::default())
        .map_err(|e| PreflightError::ProfileConversion(format!("{e:?}")))?;
    transform
        .transform(src, dst)
        .map_err(|e| PreflightError::ProfileConversion(format!("{e:?}")))
}
