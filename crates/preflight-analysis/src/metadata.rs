// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Metadata extractor — a side-channel description of the container and its
// pixels, independent of the metric report. Never fails: an unreadable image
// becomes a lone `Error` field, and an unreadable EXIF block or ICC profile is
// marked on its own field and listed under a trailing `Error` field.

use preflight_core::error::PreflightError;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use tracing::{instrument, warn};

use crate::asset::ImageAsset;
use crate::icc::ProfileDescriptor;

/// One metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Text(String),
    Integer(u64),
    Flag(bool),
    List(Vec<String>),
    /// Ordered key/value pairs, e.g. EXIF tags.
    Fields(Vec<(String, String)>),
}

impl Serialize for MetadataValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Integer(n) => serializer.serialize_u64(*n),
            Self::Flag(b) => serializer.serialize_bool(*b),
            Self::List(items) => items.serialize(serializer),
            Self::Fields(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (k, v) in pairs {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl std::fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Flag(b) => write!(f, "{b}"),
            Self::List(items) => write!(f, "{}", items.join(", ")),
            Self::Fields(pairs) => {
                let rendered: Vec<String> = pairs.iter().map(|(k, v)| format!("{k}={v}")).collect();
                write!(f, "{}", rendered.join(", "))
            }
        }
    }
}

/// Ordered metadata fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metadata {
    fields: Vec<(String, MetadataValue)>,
}

impl Metadata {
    fn push(&mut self, key: &str, value: MetadataValue) {
        self.fields.push((key.to_owned(), value));
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether any part of extraction failed.
    pub fn is_error(&self) -> bool {
        self.get("Error").is_some()
    }
}

impl Serialize for Metadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl std::fmt::Display for Metadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (k, v) in &self.fields {
            writeln!(f, "{k}: {v}")?;
        }
        Ok(())
    }
}

/// Hex SHA-256 digest of `data`.
pub fn fingerprint(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Describe an encoded image.
#[instrument(skip(data), fields(data_len = data.len()))]
pub fn extract_metadata(data: &[u8]) -> Metadata {
    match ImageAsset::decode(data) {
        Ok(asset) => describe(&asset, data),
        Err(err) => {
            warn!(error = %err, "Metadata extraction could not open the image");
            let mut meta = Metadata::default();
            meta.push("Error", MetadataValue::Text(format!("Error opening image: {err}")));
            meta
        }
    }
}

fn describe(asset: &ImageAsset, data: &[u8]) -> Metadata {
    use MetadataValue::*;

    let mut meta = Metadata::default();
    let mut failures = Vec::new();
    meta.push("Format", Text(format!("{:?}", asset.format()).to_uppercase()));
    meta.push("Mode", Text(asset.color_mode().label().to_owned()));
    meta.push("Size", Text(asset.size().to_string()));
    meta.push("Width", Integer(asset.width().into()));
    meta.push("Height", Integer(asset.height().into()));
    if let Some(dpi) = asset.dpi() {
        meta.push("DPI", Text(dpi.to_string()));
    }
    if let Some(exif) = asset.exif() {
        meta.push("EXIF", Fields(exif.clone()));
    } else if let Some(err) = asset.exif_error() {
        meta.push("EXIF", Text(format!("Present but unreadable: {err}")));
        failures.push(PreflightError::MetadataExtraction(format!("EXIF: {err}")));
    }
    let profile = ProfileDescriptor::of(asset);
    if let ProfileDescriptor::Unreadable(err) = &profile {
        failures.push(PreflightError::MetadataExtraction(format!("ICC profile: {err}")));
    }
    meta.push("ICC Profile", Text(profile.summary()));
    meta.push("Bands", List(asset.color_mode().band_names()));
    meta.push("Bit depth", Integer(asset.bits_per_channel().into()));
    meta.push("Layers", Integer(asset.channel_count().into()));
    meta.push(
        "File size",
        Text(format!("{} bytes ({:.2} KB)", data.len(), data.len() as f64 / 1024.0)),
    );
    meta.push("Animated", Flag(asset.is_animated()));
    meta.push("Frames", Integer(asset.frame_count().into()));
    meta.push("SHA-256", Text(fingerprint(data)));
    if !failures.is_empty() {
        for err in &failures {
            warn!(error = %err, "Metadata field could not be extracted");
        }
        let messages: Vec<String> = failures.iter().map(ToString::to_string).collect();
        meta.push("Error", Text(messages.join("; ")));
    }
    meta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::tests::{exif_300dpi, jpeg_bytes, png_bytes, with_app1};
    use crate::icc::tests::described_profile;
    use image::{DynamicImage, Rgb, RgbImage};

    #[test]
    fn png_fields_in_order() {
        let bytes = png_bytes(&DynamicImage::ImageRgb8(RgbImage::from_pixel(12, 7, Rgb([1, 2, 3]))));
        let meta = extract_metadata(&bytes);
        let keys: Vec<&str> = meta.keys().collect();
        assert_eq!(
            keys,
            vec![
                "Format",
                "Mode",
                "Size",
                "Width",
                "Height",
                "ICC Profile",
                "Bands",
                "Bit depth",
                "Layers",
                "File size",
                "Animated",
                "Frames",
                "SHA-256",
            ]
        );
        assert_eq!(meta.get("Format"), Some(&MetadataValue::Text("PNG".into())));
        assert_eq!(meta.get("Size"), Some(&MetadataValue::Text("12x7".into())));
        assert_eq!(meta.get("ICC Profile"), Some(&MetadataValue::Text("Not found".into())));
        assert_eq!(meta.get("Frames"), Some(&MetadataValue::Integer(1)));
        assert_eq!(meta.get("Animated"), Some(&MetadataValue::Flag(false)));
        assert_eq!(
            meta.get("Bands"),
            Some(&MetadataValue::List(vec!["R".into(), "G".into(), "B".into()]))
        );
        assert!(!meta.is_error());
    }

    #[test]
    fn file_size_in_bytes_and_kilobytes() {
        let bytes = png_bytes(&DynamicImage::ImageRgb8(RgbImage::new(3, 3)));
        let meta = extract_metadata(&bytes);
        let expected = format!("{} bytes ({:.2} KB)", bytes.len(), bytes.len() as f64 / 1024.0);
        assert_eq!(meta.get("File size"), Some(&MetadataValue::Text(expected)));
    }

    #[test]
    fn unreadable_input_becomes_error_field() {
        let meta = extract_metadata(b"garbage");
        assert!(meta.is_error());
        assert_eq!(meta.keys().count(), 1);
        let Some(MetadataValue::Text(msg)) = meta.get("Error") else {
            panic!("missing error field");
        };
        assert!(msg.starts_with("Error opening image: "));
    }

    #[test]
    fn exif_fields_from_jpeg() {
        let jpeg = jpeg_bytes(&DynamicImage::ImageRgb8(RgbImage::new(8, 8)));
        let meta = extract_metadata(&with_app1(&jpeg, &exif_300dpi()));
        let Some(MetadataValue::Fields(fields)) = meta.get("EXIF") else {
            panic!("missing EXIF field");
        };
        assert!(fields.iter().any(|(tag, _)| tag == "ResolutionUnit"));
        assert!(!meta.is_error());
    }

    #[test]
    fn corrupt_exif_is_reported_not_dropped() {
        let jpeg = jpeg_bytes(&DynamicImage::ImageRgb8(RgbImage::new(8, 8)));
        let meta = extract_metadata(&with_app1(&jpeg, b"Exif\0\0XX\0\x2A\0\0\0\x08"));
        let Some(MetadataValue::Text(exif)) = meta.get("EXIF") else {
            panic!("missing EXIF field");
        };
        assert!(exif.starts_with("Present but unreadable: "));
        let Some(MetadataValue::Text(error)) = meta.get("Error") else {
            panic!("missing error field");
        };
        assert!(error.starts_with("metadata extraction failed: EXIF: "));
        // Everything else is still described.
        assert_eq!(meta.get("Width"), Some(&MetadataValue::Integer(8)));
        assert_eq!(meta.keys().last(), Some("Error"));
    }

    #[test]
    fn embedded_profile_description() {
        let asset = ImageAsset::from_dynamic(DynamicImage::ImageRgb8(RgbImage::new(2, 2)))
            .with_icc_profile(Some(described_profile("Display P3")));
        let meta = describe(&asset, b"");
        assert_eq!(meta.get("ICC Profile"), Some(&MetadataValue::Text("Display P3".into())));
        assert!(!meta.is_error());
    }

    #[test]
    fn unreadable_profile_is_marked_and_listed() {
        let asset = ImageAsset::from_dynamic(DynamicImage::ImageRgb8(RgbImage::new(2, 2)))
            .with_icc_profile(Some(b"junk".to_vec()));
        let meta = describe(&asset, b"");
        let Some(MetadataValue::Text(profile)) = meta.get("ICC Profile") else {
            panic!("missing profile field");
        };
        assert!(profile.starts_with("Present but unreadable: "));
        assert!(meta.is_error());
    }

    #[test]
    fn fingerprint_is_sha256_hex() {
        assert_eq!(
            fingerprint(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn json_preserves_order_and_types() {
        let bytes = png_bytes(&DynamicImage::ImageRgb8(RgbImage::new(2, 5)));
        let json = serde_json::to_string(&extract_metadata(&bytes)).unwrap();
        assert!(json.starts_with(r#"{"Format":"PNG","Mode":"RGB","Size":"2x5","Width":2,"Height":5"#));
    }
}
