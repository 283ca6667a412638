// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Read-only ICC profile inspection on top of moxcms. Pixel transforms live in
// `profile`.

use moxcms::{ColorProfile, ProfileText};
use serde::Serialize;

use crate::asset::ImageAsset;

/// What we could learn about an image's embedded profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ProfileDescriptor {
    /// No profile embedded.
    Absent,
    /// Profile parsed; carries its description.
    Described(String),
    /// Profile parsed but carries no description text.
    Undescribed,
    /// Profile bytes present but unparseable; carries the read error.
    Unreadable(String),
}

impl ProfileDescriptor {
    /// Inspect optional embedded profile bytes.
    pub fn inspect(icc: Option<&[u8]>) -> Self {
        let Some(bytes) = icc else {
            return Self::Absent;
        };
        match ColorProfile::new_from_slice(bytes) {
            Ok(profile) => match profile.description.as_ref().and_then(profile_text) {
                Some(description) => Self::Described(description),
                None => Self::Undescribed,
            },
            Err(err) => Self::Unreadable(err.to_string()),
        }
    }

    /// Inspect the asset's profile, including a profile the container
    /// carried but the decoder could not hand over.
    pub fn of(asset: &ImageAsset) -> Self {
        match asset.icc_error() {
            Some(err) => Self::Unreadable(err.to_owned()),
            None => Self::inspect(asset.icc_profile()),
        }
    }

    /// Short form used by the metadata extractor.
    pub fn summary(&self) -> String {
        match self {
            Self::Absent => "Not found".to_owned(),
            Self::Described(description) => description.clone(),
            Self::Undescribed => "Present (no description)".to_owned(),
            Self::Unreadable(err) => format!("Present but unreadable: {err}"),
        }
    }
}

impl std::fmt::Display for ProfileDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Absent => f.write_str("No ICC profile found"),
            Self::Described(description) => f.write_str(description),
            Self::Undescribed => f.write_str("ICC profile present, no description"),
            Self::Unreadable(err) => write!(f, "ICC profile present but unreadable: {err}"),
        }
    }
}

/// First readable text of a description tag; empty text counts as none.
fn profile_text(text: &ProfileText) -> Option<String> {
    let value = match text {
        ProfileText::PlainString(s) => s.clone(),
        ProfileText::Localizable(locs) => locs.first().map(|l| l.value.clone()).unwrap_or_default(),
        ProfileText::Description(desc) => desc.ascii_string.clone(),
    };
    let trimmed = value.trim_end_matches('\0').trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use moxcms::LocalizableString;

    /// An encoded sRGB profile carrying `description`.
    pub(crate) fn described_profile(description: &str) -> Vec<u8> {
        let mut profile = ColorProfile::new_srgb();
        profile.description = Some(ProfileText::Localizable(vec![LocalizableString::new(
            "en".into(),
            "US".into(),
            description.into(),
        )]));
        profile.encode().unwrap()
    }

    #[test]
    fn reads_the_description() {
        let descriptor = ProfileDescriptor::inspect(Some(&described_profile("Coated FOGRA39")));
        assert_eq!(descriptor, ProfileDescriptor::Described("Coated FOGRA39".into()));
        assert_eq!(descriptor.to_string(), "Coated FOGRA39");
        assert_eq!(descriptor.summary(), "Coated FOGRA39");
    }

    #[test]
    fn valid_profile_without_description_is_not_unreadable() {
        let mut profile = ColorProfile::new_srgb();
        profile.description = None;
        let bytes = profile.encode().unwrap();
        let descriptor = ProfileDescriptor::inspect(Some(&bytes));
        assert_eq!(descriptor, ProfileDescriptor::Undescribed);
        assert_eq!(descriptor.summary(), "Present (no description)");
    }

    #[test]
    fn absent_profile() {
        let descriptor = ProfileDescriptor::inspect(None);
        assert_eq!(descriptor.to_string(), "No ICC profile found");
        assert_eq!(descriptor.summary(), "Not found");
    }

    #[test]
    fn junk_bytes_are_unreadable() {
        let descriptor = ProfileDescriptor::inspect(Some(b"junk"));
        assert!(matches!(descriptor, ProfileDescriptor::Unreadable(_)));
        assert!(descriptor.to_string().starts_with("ICC profile present but unreadable: "));
        assert!(descriptor.summary().starts_with("Present but unreadable: "));
    }
}
