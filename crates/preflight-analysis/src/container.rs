// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Container-level metadata the pixel decoder does not surface: physical
// resolution (PNG pHYs, JFIF density, EXIF resolution), EXIF fields, and
// animation frame counts.

use std::io::Cursor;

use exif::{In, Reader, Tag, Value};
use image::codecs::gif::GifDecoder;
use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, ImageFormat};
use tracing::debug;

const PNG_SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";
const CM_PER_INCH: f64 = 2.54;
const METRES_PER_INCH: f64 = 0.0254;

/// Physical resolution in dots per inch, per axis.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Dpi {
    pub x: f64,
    pub y: f64,
}

impl std::fmt::Display for Dpi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", format_density(self.x), format_density(self.y))
    }
}

/// Whole numbers print without decimals; everything else to two places.
fn format_density(value: f64) -> String {
    if (value - value.round()).abs() < 0.005 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Frame layout of a possibly animated container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    pub frames: u32,
    pub animated: bool,
}

impl Default for FrameInfo {
    fn default() -> Self {
        Self {
            frames: 1,
            animated: false,
        }
    }
}

/// Ordered EXIF tag/value pairs from the primary image directory.
pub type ExifFields = Vec<(String, String)>;

/// Read EXIF from any container kamadak-exif understands.
///
/// `Ok(None)` when the container simply has no EXIF block.
pub fn read_exif(data: &[u8]) -> Result<Option<ExifFields>, String> {
    let exif = match Reader::new().read_from_container(&mut Cursor::new(data)) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return Ok(None),
        Err(err) => return Err(err.to_string()),
    };
    let fields = exif
        .fields()
        .filter(|field| field.ifd_num == In::PRIMARY)
        .map(|field| {
            (
                field.tag.to_string(),
                field.display_value().with_unit(&exif).to_string(),
            )
        })
        .collect();
    Ok(Some(fields))
}

/// Physical resolution from the container, trying the format-native field
/// first and EXIF second.
pub fn read_dpi(data: &[u8], format: ImageFormat) -> Option<Dpi> {
    let native = match format {
        ImageFormat::Png => png_dpi(data),
        ImageFormat::Jpeg => jfif_dpi(data),
        _ => None,
    };
    native.or_else(|| exif_dpi(data))
}

/// Density from the PNG `pHYs` chunk. Only metre units carry a physical size.
fn png_dpi(data: &[u8]) -> Option<Dpi> {
    if data.len() < 8 || &data[..8] != PNG_SIGNATURE {
        return None;
    }
    let mut pos = 8;
    while pos + 8 <= data.len() {
        let length = u32::from_be_bytes(data[pos..pos + 4].try_into().ok()?) as usize;
        let kind = &data[pos + 4..pos + 8];
        let body_start = pos + 8;
        let body_end = body_start.checked_add(length)?;
        if body_end > data.len() {
            return None;
        }
        match kind {
            b"pHYs" if length >= 9 => {
                let body = &data[body_start..body_end];
                let ppu_x = u32::from_be_bytes(body[0..4].try_into().ok()?) as f64;
                let ppu_y = u32::from_be_bytes(body[4..8].try_into().ok()?) as f64;
                if body[8] != 1 {
                    return None;
                }
                return Some(Dpi {
                    x: ppu_x * METRES_PER_INCH,
                    y: ppu_y * METRES_PER_INCH,
                });
            }
            b"IDAT" | b"IEND" => return None,
            _ => {}
        }
        // length + type + body + crc
        pos = body_end + 4;
    }
    None
}

/// Density from a JPEG `APP0` JFIF segment.
fn jfif_dpi(data: &[u8]) -> Option<Dpi> {
    if data.len() < 4 || data[0] != 0xFF || data[1] != 0xD8 {
        return None;
    }
    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        // Start of scan: no more header segments.
        if marker == 0xDA {
            return None;
        }
        let length = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        let body_start = pos + 4;
        let body_end = pos + 2 + length;
        if length < 2 || body_end > data.len() {
            return None;
        }
        let body = &data[body_start..body_end];
        if marker == 0xE0 && body.len() >= 12 && &body[..5] == b"JFIF\0" {
            let units = body[7];
            let x = u16::from_be_bytes([body[8], body[9]]) as f64;
            let y = u16::from_be_bytes([body[10], body[11]]) as f64;
            return match units {
                1 => Some(Dpi { x, y }),
                2 => Some(Dpi {
                    x: x * CM_PER_INCH,
                    y: y * CM_PER_INCH,
                }),
                _ => None,
            };
        }
        pos = body_end;
    }
    None
}

/// Density from EXIF `XResolution`/`YResolution` + `ResolutionUnit`.
fn exif_dpi(data: &[u8]) -> Option<Dpi> {
    let exif = Reader::new()
        .read_from_container(&mut Cursor::new(data))
        .ok()?;
    let rational = |tag: Tag| -> Option<f64> {
        match exif.get_field(tag, In::PRIMARY)?.value {
            Value::Rational(ref values) => values.first().map(|r| r.to_f64()),
            _ => None,
        }
    };
    let x = rational(Tag::XResolution)?;
    let y = rational(Tag::YResolution).unwrap_or(x);
    let unit = exif
        .get_field(Tag::ResolutionUnit, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .unwrap_or(2);
    match unit {
        2 => Some(Dpi { x, y }),
        3 => Some(Dpi {
            x: x * CM_PER_INCH,
            y: y * CM_PER_INCH,
        }),
        _ => None,
    }
}

/// Count frames in animated GIF, APNG and WebP containers.
///
/// Never fails: anything unreadable counts as a single still frame.
pub fn read_frames(data: &[u8], format: ImageFormat) -> FrameInfo {
    let counted = match format {
        ImageFormat::Gif => GifDecoder::new(Cursor::new(data))
            .ok()
            .map(|decoder| decoder.into_frames().count()),
        ImageFormat::Png => PngDecoder::new(Cursor::new(data))
            .ok()
            .and_then(|decoder| match decoder.is_apng() {
                Ok(true) => decoder.apng().ok().map(|apng| apng.into_frames().count()),
                _ => None,
            }),
        ImageFormat::WebP => WebPDecoder::new(Cursor::new(data))
            .ok()
            .filter(|decoder| decoder.has_animation())
            .map(|decoder| decoder.into_frames().count()),
        _ => None,
    };
    match counted {
        Some(frames) if frames > 0 => {
            debug!(frames, ?format, "Counted container frames");
            FrameInfo {
                frames: frames as u32,
                animated: frames > 1,
            }
        }
        _ => FrameInfo::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::tests::{exif_300dpi, jpeg_bytes, with_app1};
    use image::codecs::gif::GifEncoder;
    use image::{DynamicImage, Frame, Rgba, RgbaImage, RgbImage};

    /// Minimal PNG prefix: signature, a dummy IHDR, then `pHYs`.
    fn png_with_phys(ppm: u32, unit: u8) -> Vec<u8> {
        let mut data = PNG_SIGNATURE.to_vec();
        data.extend_from_slice(&13u32.to_be_bytes());
        data.extend_from_slice(b"IHDR");
        data.extend_from_slice(&[0u8; 13]);
        data.extend_from_slice(&[0u8; 4]);
        data.extend_from_slice(&9u32.to_be_bytes());
        data.extend_from_slice(b"pHYs");
        data.extend_from_slice(&ppm.to_be_bytes());
        data.extend_from_slice(&ppm.to_be_bytes());
        data.push(unit);
        data.extend_from_slice(&[0u8; 4]);
        data
    }

    #[test]
    fn png_phys_in_metres_converts_to_dpi() {
        // 11811 px/m == 300 dpi (to within rounding).
        let dpi = png_dpi(&png_with_phys(11811, 1)).unwrap();
        assert!((dpi.x - 300.0).abs() < 0.01, "got {}", dpi.x);
        assert_eq!(dpi.to_string(), "300x300");
    }

    #[test]
    fn png_phys_without_unit_has_no_dpi() {
        assert!(png_dpi(&png_with_phys(11811, 0)).is_none());
    }

    #[test]
    fn jfif_density_in_inches() {
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        data.extend_from_slice(b"JFIF\0");
        data.extend_from_slice(&[1, 1, 1, 0x01, 0x2C, 0x01, 0x2C, 0, 0]);
        data.extend_from_slice(&[0xFF, 0xDA]);
        let dpi = jfif_dpi(&data).unwrap();
        assert_eq!((dpi.x, dpi.y), (300.0, 300.0));
    }

    #[test]
    fn jfif_density_in_centimetres() {
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        data.extend_from_slice(b"JFIF\0");
        data.extend_from_slice(&[1, 1, 2, 0x00, 0x64, 0x00, 0x64, 0, 0]);
        let dpi = jfif_dpi(&data).unwrap();
        assert!((dpi.x - 254.0).abs() < 1e-9);
        assert_eq!(dpi.to_string(), "254x254");
    }

    #[test]
    fn fractional_density_keeps_two_places() {
        let dpi = Dpi { x: 72.009, y: 72.5 };
        assert_eq!(dpi.to_string(), "72x72.50");
    }

    #[test]
    fn garbage_has_no_exif() {
        assert!(matches!(read_exif(b"not an image"), Ok(None) | Err(_)));
        assert!(exif_dpi(b"not an image").is_none());
    }

    fn gif_with_frames(count: u8) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut buffer);
            let frames = (0..count).map(|i| Frame::new(RgbaImage::from_pixel(4, 4, Rgba([i * 60, 0, 0, 255]))));
            encoder.encode_frames(frames).unwrap();
        }
        buffer
    }

    #[test]
    fn animated_gif_counts_every_frame() {
        let info = read_frames(&gif_with_frames(3), ImageFormat::Gif);
        assert_eq!(info, FrameInfo { frames: 3, animated: true });
    }

    #[test]
    fn single_frame_gif_is_still() {
        let info = read_frames(&gif_with_frames(1), ImageFormat::Gif);
        assert_eq!(info, FrameInfo { frames: 1, animated: false });
    }

    #[test]
    fn exif_resolution_from_jpeg() {
        let jpeg = jpeg_bytes(&DynamicImage::ImageRgb8(RgbImage::new(8, 8)));
        let data = with_app1(&jpeg, &exif_300dpi());
        assert_eq!(exif_dpi(&data), Some(Dpi { x: 300.0, y: 300.0 }));
        let fields = read_exif(&data).unwrap().unwrap();
        let (_, x_res) = fields.iter().find(|(tag, _)| tag == "XResolution").unwrap();
        assert!(x_res.starts_with("300"), "got {x_res}");
    }

    #[test]
    fn still_formats_report_one_frame() {
        assert_eq!(read_frames(b"", ImageFormat::Bmp), FrameInfo::default());
        assert_eq!(read_frames(b"garbage", ImageFormat::Gif), FrameInfo::default());
    }
}
