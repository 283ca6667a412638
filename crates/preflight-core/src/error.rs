// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Preflight.

use thiserror::Error;

/// Top-level error type for all Preflight operations.
///
/// `Decode` is the only failure that aborts an analysis once the print target
/// has been accepted. `MetricComputation`, `ProfileConversion` and
/// `MetadataExtraction` are isolated and reported alongside the results.
#[derive(Debug, Error)]
pub enum PreflightError {
    // -- Fatal at the boundary --
    #[error("failed to decode image: {0}")]
    Decode(String),

    // -- Isolated and reported --
    #[error("check `{check}` failed: {message}")]
    MetricComputation { check: String, message: String },

    #[error("colour profile conversion failed: {0}")]
    ProfileConversion(String),

    #[error("metadata extraction failed: {0}")]
    MetadataExtraction(String),

    // -- Output --
    #[error("image encoding failed: {0}")]
    Encode(String),

    // -- Caller input --
    #[error("invalid print target: {0}")]
    InvalidPrintSpec(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PreflightError>;
