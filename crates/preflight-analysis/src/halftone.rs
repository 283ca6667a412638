// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Halftone preview — an illustrative contour rendering of the luma plane.
// This is not a halftone screen; it only hints at where tone breaks up.

use image::{GrayImage, Luma};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::kernel::{self, Border, Plane};

/// Brightness offset added after the contour filter so flat areas render
/// white and edges render dark.
const CONTOUR_OFFSET: f64 = 255.0;

/// Derived preview image produced by the halftone check.
#[derive(Clone, PartialEq)]
pub struct HalftonePreview {
    image: GrayImage,
    dpi: f64,
}

impl HalftonePreview {
    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }

    /// Print resolution the preview was generated for.
    pub fn dpi(&self) -> f64 {
        self.dpi
    }
}

impl std::fmt::Debug for HalftonePreview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HalftonePreview")
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .field("dpi", &self.dpi)
            .finish()
    }
}

// Pixels are not serialised; reports carry only the preview geometry.
impl Serialize for HalftonePreview {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("HalftonePreview", 3)?;
        s.serialize_field("width", &self.image.width())?;
        s.serialize_field("height", &self.image.height())?;
        s.serialize_field("dpi", &self.dpi)?;
        s.end()
    }
}

/// Render the contour preview of `gray`.
///
/// Interior pixels get `8c - sum(neighbours) + 255`, clamped to 0..=255.
/// The one-pixel frame is copied through unchanged.
pub fn simulate(gray: &GrayImage, dpi: f64) -> HalftonePreview {
    let (w, h) = gray.dimensions();
    let filtered = kernel::correlate_same(&Plane::from_gray(gray), &kernel::ring_kernel(), Border::Reflect101);
    let image = GrayImage::from_fn(w, h, |x, y| {
        if x == 0 || y == 0 || x + 1 >= w || y + 1 >= h {
            return *gray.get_pixel(x, y);
        }
        let v = filtered.get(x as usize, y as usize) + CONTOUR_OFFSET;
        Luma([v.round().clamp(0.0, 255.0) as u8])
    });
    debug!(width = w, height = h, dpi, "Halftone preview rendered");
    HalftonePreview { image, dpi }
}
