// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image decoder — turns a raw byte buffer into an immutable `ImageAsset`
// carrying the pixels plus the container metadata print checks need.

use std::io::Cursor;

use image::{DynamicImage, ExtendedColorType, GrayImage, ImageDecoder, ImageFormat, ImageReader, Luma};
use preflight_core::error::PreflightError;
use preflight_core::{ColorMode, PixelSize};
use tracing::{debug, instrument, warn};

use crate::container::{self, Dpi, ExifFields, FrameInfo};

/// A decoded image and everything the container told us about it.
///
/// Immutable once constructed; metrics only ever borrow it.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    image: DynamicImage,
    format: ImageFormat,
    color_mode: ColorMode,
    bits_per_channel: u16,
    channel_count: u8,
    dpi: Option<Dpi>,
    /// `Err` when the container carries a profile the decoder could not read.
    icc_profile: Result<Option<Vec<u8>>, String>,
    /// `Err` when the container carries an EXIF block that does not parse.
    exif: Result<Option<ExifFields>, String>,
    frames: FrameInfo,
    byte_len: usize,
}

impl ImageAsset {
    /// Decode an encoded image (PNG, JPEG, TIFF, GIF, WebP, ...).
    ///
    /// Fails with `PreflightError::Decode` when the container is not
    /// recognised or the pixel data is truncated or corrupt.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn decode(data: &[u8]) -> Result<Self, PreflightError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|err| PreflightError::Decode(err.to_string()))?;
        let format = reader.format().ok_or_else(|| {
            PreflightError::Decode("the image format could not be determined".into())
        })?;

        let mut decoder = reader
            .into_decoder()
            .map_err(|err| PreflightError::Decode(err.to_string()))?;
        let original = decoder.original_color_type();
        let icc_profile = decoder.icc_profile().map_err(|err| {
            warn!(error = %err, "Embedded ICC profile could not be read");
            err.to_string()
        });
        let image = DynamicImage::from_decoder(decoder)
            .map_err(|err| PreflightError::Decode(err.to_string()))?;

        let (color_mode, bits_per_channel) = describe_color(original);
        let exif = container::read_exif(data).inspect_err(|err| {
            warn!(error = %err, "EXIF block could not be read");
        });
        let asset = Self {
            format,
            color_mode,
            bits_per_channel,
            channel_count: original.channel_count(),
            dpi: container::read_dpi(data, format),
            icc_profile,
            exif,
            frames: container::read_frames(data, format),
            byte_len: data.len(),
            image,
        };
        debug!(
            width = asset.image.width(),
            height = asset.image.height(),
            ?format,
            mode = %asset.color_mode,
            "Image decoded from bytes"
        );
        Ok(asset)
    }

    /// Wrap an already-decoded image. Container metadata is left empty and
    /// the PNG format is assumed.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        let original: ExtendedColorType = image.color().into();
        let (color_mode, bits_per_channel) = describe_color(original);
        Self {
            format: ImageFormat::Png,
            color_mode,
            bits_per_channel,
            channel_count: original.channel_count(),
            dpi: None,
            icc_profile: Ok(None),
            exif: Ok(None),
            frames: FrameInfo::default(),
            byte_len: 0,
            image,
        }
    }

    /// Same asset, with an embedded ICC profile.
    pub fn with_icc_profile(mut self, icc: Option<Vec<u8>>) -> Self {
        self.icc_profile = Ok(icc);
        self
    }

    /// Same container metadata, new pixels. Mode and depth follow the new
    /// pixel buffer.
    pub(crate) fn with_pixels(mut self, image: DynamicImage) -> Self {
        let layout: ExtendedColorType = image.color().into();
        let (color_mode, bits_per_channel) = describe_color(layout);
        self.color_mode = color_mode;
        self.bits_per_channel = bits_per_channel;
        self.channel_count = layout.channel_count();
        self.image = image;
        self
    }

    // -- Accessors ------------------------------------------------------------

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn size(&self) -> PixelSize {
        PixelSize::new(self.image.width(), self.image.height())
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn color_mode(&self) -> &ColorMode {
        &self.color_mode
    }

    /// Bits per sample in the source file, before any decoder expansion.
    pub fn bits_per_channel(&self) -> u16 {
        self.bits_per_channel
    }

    pub fn channel_count(&self) -> u8 {
        self.channel_count
    }

    pub fn dpi(&self) -> Option<Dpi> {
        self.dpi
    }

    /// Embedded ICC profile bytes, verbatim.
    pub fn icc_profile(&self) -> Option<&[u8]> {
        self.icc_profile.as_ref().ok().and_then(|icc| icc.as_deref())
    }

    /// Why the embedded profile could not be read, if it could not.
    pub fn icc_error(&self) -> Option<&str> {
        self.icc_profile.as_ref().err().map(String::as_str)
    }

    pub fn exif(&self) -> Option<&ExifFields> {
        self.exif.as_ref().ok().and_then(Option::as_ref)
    }

    /// Why the EXIF block could not be read, if it could not.
    pub fn exif_error(&self) -> Option<&str> {
        self.exif.as_ref().err().map(String::as_str)
    }

    pub fn frame_count(&self) -> u32 {
        self.frames.frames
    }

    pub fn is_animated(&self) -> bool {
        self.frames.animated
    }

    /// Length of the encoded buffer this asset was decoded from.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// A BT.601 luma copy (`0.299 R + 0.587 G + 0.114 B`), leaving the asset
    /// untouched. Alpha is ignored.
    pub fn grayscale(&self) -> GrayImage {
        if let DynamicImage::ImageLuma8(gray) = &self.image {
            return gray.clone();
        }
        let rgb = self.image.to_rgb8();
        GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
            let [r, g, b] = rgb.get_pixel(x, y).0;
            let weighted = r as u32 * 299 + g as u32 * 587 + b as u32 * 114;
            Luma([((weighted + 500) / 1000) as u8])
        })
    }
}

/// Map the source colour layout to a print colour mode and per-channel depth.
fn describe_color(color: ExtendedColorType) -> (ColorMode, u16) {
    use ExtendedColorType as E;
    match color {
        E::L8 => (ColorMode::Grayscale, 8),
        E::L16 => (ColorMode::Grayscale, 16),
        E::La8 => (ColorMode::GrayscaleAlpha, 8),
        E::La16 => (ColorMode::GrayscaleAlpha, 16),
        E::Rgb8 => (ColorMode::Rgb, 8),
        E::Rgb16 => (ColorMode::Rgb, 16),
        E::Rgb32F => (ColorMode::Rgb, 32),
        E::Rgba8 => (ColorMode::Rgba, 8),
        E::Rgba16 => (ColorMode::Rgba, 16),
        E::Rgba32F => (ColorMode::Rgba, 32),
        E::Cmyk8 => (ColorMode::Cmyk, 8),
        E::Cmyk16 => (ColorMode::Cmyk, 16),
        E::L1 => (ColorMode::Other("1".into()), 1),
        other => {
            let channels = other.channel_count().max(1) as u16;
            (
                ColorMode::Other(format!("{other:?}")),
                other.bits_per_pixel() / channels,
            )
        }
    }
}
