// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// preflight-analysis — Print-readiness analysis for raster images.
//
// Decodes an image once, runs every print check against a print target,
// extracts container metadata, converts colour profiles, and applies
// corrective transforms driven by the resulting report.

pub mod adjust;
pub mod asset;
pub mod container;
pub mod halftone;
pub mod icc;
pub mod image;
pub mod kernel;
pub mod metadata;
pub mod metrics;
pub mod profile;
pub mod report;

// Re-export the primary entry points so callers can use `preflight_analysis::analyze` etc.
pub use adjust::{adjust, Adjustment, AdjustmentPlan};
pub use asset::ImageAsset;
pub use halftone::HalftonePreview;
pub use self::image::ImageProcessor;
pub use metadata::{extract_metadata, Metadata, MetadataValue};
pub use metrics::{Check, CheckName, Finding, MetricError};
pub use profile::{convert_color_profile, ConversionStatus};
pub use report::{analyze, Aggregator, Analysis, MetricReport, MetricResult, Outcome};
