// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — crop, sharpen, brightness scaling and upscaling for the
// adjustment engine. Operates on in-memory images using the `image` crate.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageBuffer, ImageFormat, Pixel};
use preflight_core::error::PreflightError;
use tracing::{debug, info, instrument};

/// Weights of the 3x3 smoothing kernel sharpening blends against.
const SMOOTH: [[f32; 3]; 3] = [[1.0, 1.0, 1.0], [1.0, 5.0, 1.0], [1.0, 1.0, 1.0]];
const SMOOTH_SUM: f32 = 13.0;

/// Run a generic buffer transform on whichever layout `image` holds, keeping
/// that layout. Layouts `image` may add later go through RGBA f32.
macro_rules! map_layout {
    ($image:expr, |$buf:ident| $body:expr) => {
        match $image {
            DynamicImage::ImageLuma8($buf) => DynamicImage::ImageLuma8($body),
            DynamicImage::ImageLumaA8($buf) => DynamicImage::ImageLumaA8($body),
            DynamicImage::ImageRgb8($buf) => DynamicImage::ImageRgb8($body),
            DynamicImage::ImageRgba8($buf) => DynamicImage::ImageRgba8($body),
            DynamicImage::ImageLuma16($buf) => DynamicImage::ImageLuma16($body),
            DynamicImage::ImageLumaA16($buf) => DynamicImage::ImageLumaA16($body),
            DynamicImage::ImageRgb16($buf) => DynamicImage::ImageRgb16($body),
            DynamicImage::ImageRgba16($buf) => DynamicImage::ImageRgba16($body),
            DynamicImage::ImageRgb32F($buf) => DynamicImage::ImageRgb32F($body),
            DynamicImage::ImageRgba32F($buf) => DynamicImage::ImageRgba32F($body),
            other => {
                let $buf = other.to_rgba32f();
                DynamicImage::ImageRgba32F($body)
            }
        }
    };
}

/// Image processing pipeline operating on a single in-memory image.
///
/// Each method consumes `self` and returns a new `ImageProcessor` wrapping the
/// transformed image, enabling method chaining.
///
/// ```ignore
/// let png = ImageProcessor::from_bytes(&data)?
///     .crop(100, 0, 1700, 2200)
///     .sharpen(1.5)
///     .upscale(2)
///     .to_png_bytes()?;
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, PreflightError> {
        let img = image::load_from_memory(data)
            .map_err(|err| PreflightError::Decode(err.to_string()))?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Crop a rectangular region from the image.
    ///
    /// `x` and `y` are the top-left corner; `width` and `height` define the
    /// size of the crop rectangle. Values are clamped to image bounds.
    #[instrument(skip(self), fields(x, y, width, height))]
    pub fn crop(self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let img_w = self.image.width();
        let img_h = self.image.height();

        let safe_x = x.min(img_w.saturating_sub(1));
        let safe_y = y.min(img_h.saturating_sub(1));
        let safe_w = width.min(img_w.saturating_sub(safe_x));
        let safe_h = height.min(img_h.saturating_sub(safe_y));

        info!(safe_x, safe_y, safe_w, safe_h, "Cropping image");
        Self {
            image: self.image.crop_imm(safe_x, safe_y, safe_w, safe_h),
        }
    }

    /// Sharpen by blending with a 3x3 smoothed copy:
    /// `out = smooth + factor * (image - smooth)`.
    ///
    /// A factor of 1.0 is a no-op; the one-pixel frame is left untouched.
    /// Alpha is never altered, and the pixel layout and depth are kept.
    #[instrument(skip(self), fields(factor))]
    pub fn sharpen(self, factor: f32) -> Self {
        info!(factor, "Sharpening image");
        Self {
            image: map_layout!(self.image, |buf| sharpen_buffer(&buf, factor)),
        }
    }

    /// Multiply every colour channel by `factor`. Values > 1.0 brighten,
    /// values < 1.0 darken. Alpha, layout and depth are preserved.
    #[instrument(skip(self), fields(factor))]
    pub fn scale_brightness(self, factor: f32) -> Self {
        info!(factor, "Scaling brightness");
        Self {
            image: map_layout!(self.image, |buf| scale_buffer(buf, factor)),
        }
    }

    /// Enlarge both dimensions by `factor` with Lanczos3 resampling.
    #[instrument(skip(self), fields(factor))]
    pub fn upscale(self, factor: u32) -> Self {
        let new_w = self.image.width().saturating_mul(factor);
        let new_h = self.image.height().saturating_mul(factor);
        info!(
            from_w = self.image.width(),
            from_h = self.image.height(),
            new_w,
            new_h,
            "Upscaling image"
        );
        Self {
            image: self.image.resize_exact(new_w, new_h, FilterType::Lanczos3),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, PreflightError> {
        encode_png(&self.image)
    }
}

/// A channel sample the pixel transforms can do arithmetic on.
trait Sample: Copy {
    fn level(self) -> f32;
    /// Round to the type's precision, still as `f32`.
    fn quantize(value: f32) -> f32;
    /// Round and clamp into the type's range.
    fn from_level(value: f32) -> Self;
}

impl Sample for u8 {
    fn level(self) -> f32 {
        self as f32
    }
    fn quantize(value: f32) -> f32 {
        value.round()
    }
    fn from_level(value: f32) -> Self {
        value.round().clamp(0.0, u8::MAX as f32) as u8
    }
}

impl Sample for u16 {
    fn level(self) -> f32 {
        self as f32
    }
    fn quantize(value: f32) -> f32 {
        value.round()
    }
    fn from_level(value: f32) -> Self {
        value.round().clamp(0.0, u16::MAX as f32) as u16
    }
}

impl Sample for f32 {
    fn level(self) -> f32 {
        self
    }
    fn quantize(value: f32) -> f32 {
        value
    }
    fn from_level(value: f32) -> Self {
        value.max(0.0)
    }
}

/// Number of leading non-alpha channels in `P`.
fn colour_channels<P: Pixel>() -> usize {
    P::CHANNEL_COUNT as usize - usize::from(P::HAS_ALPHA)
}

fn sharpen_buffer<P>(src: &ImageBuffer<P, Vec<P::Subpixel>>, factor: f32) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel,
    P::Subpixel: Sample,
{
    let (w, h) = src.dimensions();
    let colour = colour_channels::<P>();
    ImageBuffer::from_fn(w, h, |x, y| {
        let original = *src.get_pixel(x, y);
        if x == 0 || y == 0 || x + 1 >= w || y + 1 >= h {
            return original;
        }
        let mut px = original;
        for c in 0..colour {
            let mut acc = 0.0f32;
            for (dy, row) in SMOOTH.iter().enumerate() {
                for (dx, weight) in row.iter().enumerate() {
                    let neighbour = src.get_pixel(x + dx as u32 - 1, y + dy as u32 - 1);
                    acc += weight * neighbour.channels()[c].level();
                }
            }
            let smooth = P::Subpixel::quantize(acc / SMOOTH_SUM);
            let v = smooth + factor * (original.channels()[c].level() - smooth);
            px.channels_mut()[c] = P::Subpixel::from_level(v);
        }
        px
    })
}

fn scale_buffer<P>(mut buf: ImageBuffer<P, Vec<P::Subpixel>>, factor: f32) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel,
    P::Subpixel: Sample,
{
    let colour = colour_channels::<P>();
    for px in buf.pixels_mut() {
        for sample in &mut px.channels_mut()[..colour] {
            *sample = P::Subpixel::from_level(sample.level() * factor);
        }
    }
    buf
}

/// Encode a `DynamicImage` as PNG, returning the raw bytes.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, PreflightError> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|err| PreflightError::Encode(err.to_string()))?;
    Ok(buffer)
}
