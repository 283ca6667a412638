// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for customers submitting artwork.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Reply-composing collaborators show `message` as the heading and
// `suggestion` as the body.

use crate::error::PreflightError;

/// Severity of an error from the customer's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The customer can fix it (send a different file, pick another size).
    ActionRequired,
    /// The file cannot be used as sent.
    Permanent,
    /// Something went wrong on our side; the customer did nothing wrong.
    Internal,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the customer should try (shown as body text).
    pub suggestion: String,
    /// Severity level.
    pub severity: Severity,
}

/// Convert a `PreflightError` into a `HumanError` a customer can act on.
pub fn humanize_error(err: &PreflightError) -> HumanError {
    match err {
        PreflightError::Decode(detail) => {
            if detail.contains("unsupported") || detail.contains("format") {
                HumanError {
                    message: "We couldn't recognise this file as an image.".into(),
                    suggestion: "Please send your artwork as a PNG, JPEG or TIFF file.".into(),
                    severity: Severity::Permanent,
                }
            } else {
                HumanError {
                    message: "This image file seems to be damaged.".into(),
                    suggestion: "The file may not have uploaded completely. Try exporting it again and re-sending it.".into(),
                    severity: Severity::ActionRequired,
                }
            }
        }

        PreflightError::MetricComputation { check, .. } => HumanError {
            message: format!("We couldn't complete the {} check.", check.replace('_', " ")),
            suggestion: "The rest of the report is still valid. We'll review this part by hand.".into(),
            severity: Severity::Internal,
        },

        PreflightError::ProfileConversion(detail) => {
            if detail.contains("not found") {
                HumanError {
                    message: "The printer colour profile is missing.".into(),
                    suggestion: "Your artwork was left in its original colours. No action is needed from you.".into(),
                    severity: Severity::Internal,
                }
            } else {
                HumanError {
                    message: "We couldn't convert your artwork's colours for printing.".into(),
                    suggestion: "If colour accuracy matters, please send the file with an sRGB colour profile.".into(),
                    severity: Severity::ActionRequired,
                }
            }
        }

        PreflightError::MetadataExtraction(_) => HumanError {
            message: "Some details of your file couldn't be read.".into(),
            suggestion: "This does not affect printing. No action is needed.".into(),
            severity: Severity::Internal,
        },

        PreflightError::Encode(_) => HumanError {
            message: "We couldn't save the corrected version of your artwork.".into(),
            suggestion: "Your original file is unaffected. We'll retry the correction by hand.".into(),
            severity: Severity::Internal,
        },

        PreflightError::InvalidPrintSpec(detail) => HumanError {
            message: "The print size you asked for doesn't look right.".into(),
            suggestion: format!("Please check the width, height and bleed of your order. ({detail})"),
            severity: Severity::ActionRequired,
        },

        PreflightError::Config(_) | PreflightError::Serialization(_) => HumanError {
            message: "Our print checker is misconfigured.".into(),
            suggestion: "This is our problem, not yours. We'll look into it.".into(),
            severity: Severity::Internal,
        },

        PreflightError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try sending it again.".into(),
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, please let us know.".into(),
                    severity: Severity::Internal,
                }
            }
        }
    }
}
