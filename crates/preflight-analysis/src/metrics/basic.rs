// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Geometry and container checks: resolution, colour depth, file size,
// bleed coverage, embedded profile and aspect ratio.

use preflight_core::{ColorMode, PixelSize, PrintSpec, Suitability};
use serde::Serialize;

use super::Finding;
use crate::asset::ImageAsset;
use crate::icc::ProfileDescriptor;

pub fn resolution(asset: &ImageAsset) -> Finding {
    Finding::Resolution {
        width: asset.width(),
        height: asset.height(),
    }
}

pub fn file_size(asset: &ImageAsset) -> Finding {
    Finding::FileSize {
        bytes: asset.byte_len(),
    }
}

pub fn color_profile(asset: &ImageAsset) -> Finding {
    Finding::ColorProfile {
        mode: asset.color_mode().label().to_owned(),
        profile: ProfileDescriptor::of(asset),
    }
}

/// Colour layout, sample depth, and what that means for printing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColorDepth {
    pub mode: ColorMode,
    pub bits_per_channel: u16,
    pub suitability: Suitability,
}

pub fn color_depth(asset: &ImageAsset) -> Finding {
    let mode = asset.color_mode().clone();
    Finding::ColorDepth(ColorDepth {
        suitability: mode.suitability(),
        bits_per_channel: asset.bits_per_channel(),
        mode,
    })
}

impl std::fmt::Display for ColorDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bits = self.bits_per_channel;
        match &self.mode {
            ColorMode::Rgb => write!(
                f,
                "Color depth: {}-bit ({bits} bits per channel), adequate for high-quality printing.",
                bits * 3
            ),
            ColorMode::Rgba => write!(
                f,
                "Color depth: {}-bit ({bits} bits per channel with alpha), adequate for high-quality printing.",
                bits * 4
            ),
            ColorMode::Grayscale => write!(
                f,
                "Color depth: {bits}-bit grayscale, may be adequate depending on print requirements."
            ),
            ColorMode::Cmyk => write!(
                f,
                "Color depth: {}-bit CMYK, suitable for professional printing.",
                bits * 4
            ),
            other => write!(
                f,
                "Color depth: {other}, may not be optimal for high-quality printing."
            ),
        }
    }
}

/// Pixels required for trim + bleed versus pixels available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bleed {
    pub required: PixelSize,
    pub actual: PixelSize,
    pub sufficient: bool,
}

pub fn bleed_and_margins(asset: &ImageAsset, spec: &PrintSpec) -> Finding {
    let required = spec.required_pixels();
    let actual = asset.size();
    Finding::BleedAndMargins(Bleed {
        required,
        actual,
        sufficient: actual.covers(required),
    })
}

impl std::fmt::Display for Bleed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.sufficient {
            f.write_str("Image dimensions are sufficient for bleed.")
        } else {
            write!(
                f,
                "Image is too small. Required: {}px, Actual: {}px",
                self.required, self.actual
            )
        }
    }
}

/// Image ratio against the print target's ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AspectRatio {
    pub image_ratio: f64,
    pub target_ratio: f64,
    pub matches: bool,
}

/// Compare width/height ratios; within `tolerance` counts as a match.
pub fn aspect_ratio(size: PixelSize, spec: &PrintSpec, tolerance: f64) -> AspectRatio {
    let image_ratio = size.aspect_ratio();
    let target_ratio = spec.aspect_ratio();
    AspectRatio {
        image_ratio,
        target_ratio,
        matches: (image_ratio - target_ratio).abs() < tolerance,
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.matches {
            write!(
                f,
                "Aspect ratio matches the print dimensions. Image: {:.2}, Desired: {:.2}",
                self.image_ratio, self.target_ratio
            )
        } else {
            write!(
                f,
                "Aspect ratio mismatch. Image: {:.2}, Desired: {:.2}. Cropping or distortion may occur.",
                self.image_ratio, self.target_ratio
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, Luma, RgbImage};

    fn letter() -> PrintSpec {
        PrintSpec::new(300.0, 8.5, 11.0, 0.125).unwrap()
    }

    fn blank(width: u32, height: u32) -> ImageAsset {
        ImageAsset::from_dynamic(DynamicImage::ImageRgb8(RgbImage::new(width, height)))
    }

    #[test]
    fn resolution_matches_decoded_size() {
        assert_eq!(
            resolution(&blank(850, 1100)),
            Finding::Resolution {
                width: 850,
                height: 1100
            }
        );
    }

    #[test]
    fn aspect_ratio_match_for_letter_proportions() {
        let ratio = aspect_ratio(PixelSize::new(850, 1100), &letter(), 0.01);
        assert!(ratio.matches);
        assert!((ratio.image_ratio - 0.7727).abs() < 1e-4);
        assert_eq!(
            ratio.to_string(),
            "Aspect ratio matches the print dimensions. Image: 0.77, Desired: 0.77"
        );
    }

    #[test]
    fn aspect_ratio_mismatch_reports_both_ratios() {
        let ratio = aspect_ratio(PixelSize::new(1000, 1100), &letter(), 0.01);
        assert!(!ratio.matches);
        assert_eq!(
            ratio.to_string(),
            "Aspect ratio mismatch. Image: 0.91, Desired: 0.77. Cropping or distortion may occur."
        );
    }

    #[test]
    fn bleed_too_small() {
        let Finding::BleedAndMargins(bleed) = bleed_and_margins(&blank(2000, 3000), &letter())
        else {
            panic!("wrong finding");
        };
        assert!(!bleed.sufficient);
        assert_eq!(bleed.required, PixelSize::new(2625, 3375));
        assert_eq!(
            bleed.to_string(),
            "Image is too small. Required: 2625x3375px, Actual: 2000x3000px"
        );
    }

    #[test]
    fn bleed_sufficient() {
        let Finding::BleedAndMargins(bleed) = bleed_and_margins(&blank(2700, 3400), &letter())
        else {
            panic!("wrong finding");
        };
        assert!(bleed.sufficient);
        assert_eq!(bleed.to_string(), "Image dimensions are sufficient for bleed.");
    }

    #[test]
    fn color_depth_messages() {
        assert_eq!(
            color_depth(&blank(2, 2)).to_string(),
            "Color depth: 24-bit (8 bits per channel), adequate for high-quality printing."
        );
        let gray = ImageAsset::from_dynamic(DynamicImage::ImageLuma8(GrayImage::from_pixel(
            2,
            2,
            Luma([0]),
        )));
        let Finding::ColorDepth(depth) = color_depth(&gray) else {
            panic!("wrong finding");
        };
        assert_eq!(depth.suitability, Suitability::Conditional);
        assert_eq!(
            depth.to_string(),
            "Color depth: 8-bit grayscale, may be adequate depending on print requirements."
        );
    }

    #[test]
    fn cmyk_and_unusual_modes() {
        let cmyk = ColorDepth {
            mode: ColorMode::Cmyk,
            bits_per_channel: 8,
            suitability: Suitability::Adequate,
        };
        assert_eq!(
            cmyk.to_string(),
            "Color depth: 32-bit CMYK, suitable for professional printing."
        );
        let indexed = ColorDepth {
            mode: ColorMode::Other("P".into()),
            bits_per_channel: 8,
            suitability: Suitability::Caution,
        };
        assert_eq!(
            indexed.to_string(),
            "Color depth: P, may not be optimal for high-quality printing."
        );
    }

    #[test]
    fn color_profile_without_icc() {
        assert_eq!(
            color_profile(&blank(2, 2)).to_string(),
            "Color mode: RGB, ICC Profile: No ICC profile found"
        );
    }

    #[test]
    fn color_profile_with_embedded_description() {
        let asset = blank(2, 2).with_icc_profile(Some(crate::icc::tests::described_profile("sRGB built-in")));
        assert_eq!(
            color_profile(&asset).to_string(),
            "Color mode: RGB, ICC Profile: sRGB built-in"
        );
    }
}
