// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Report aggregator — fans every check out over the rayon pool, isolates
// failures per check, and fans the results back in in a fixed order.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use preflight_core::error::PreflightError;
use preflight_core::{AnalysisConfig, PrintSpec};
use rayon::prelude::*;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use tracing::{debug, info, instrument, warn};

use crate::asset::ImageAsset;
use crate::image::encode_png;
use crate::metrics::{builtin_checks, Check, CheckContext, CheckName, Finding};

/// What happened when one check ran.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Measured(Finding),
    Failed { message: String },
}

/// One named entry of a `MetricReport`.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricResult {
    check: CheckName,
    outcome: Outcome,
}

impl MetricResult {
    pub fn measured(check: CheckName, finding: Finding) -> Self {
        Self {
            check,
            outcome: Outcome::Measured(finding),
        }
    }

    pub fn failed(check: CheckName, message: impl Into<String>) -> Self {
        Self {
            check,
            outcome: Outcome::Failed {
                message: message.into(),
            },
        }
    }

    pub fn check(&self) -> CheckName {
        self.check
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn finding(&self) -> Option<&Finding> {
        match &self.outcome {
            Outcome::Measured(finding) => Some(finding),
            Outcome::Failed { .. } => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, Outcome::Failed { .. })
    }

    /// The human-readable verdict for this entry.
    pub fn message(&self) -> String {
        match &self.outcome {
            Outcome::Measured(finding) => finding.to_string(),
            Outcome::Failed { message } => format!("Check could not be completed: {message}"),
        }
    }
}

impl Serialize for MetricResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("MetricResult", 3)?;
        s.serialize_field("status", if self.is_failure() { "failed" } else { "ok" })?;
        s.serialize_field("message", &self.message())?;
        s.serialize_field("evidence", &self.finding())?;
        s.end()
    }
}

/// Every check's result for one image, in fixed check order.
///
/// Built once per analysis call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricReport {
    entries: Vec<MetricResult>,
}

impl MetricReport {
    /// Build a report, ordering entries by check rank and keeping the first
    /// entry for any repeated name.
    pub fn from_results(mut entries: Vec<MetricResult>) -> Self {
        entries.sort_by_key(|entry| entry.check.rank());
        entries.dedup_by_key(|entry| entry.check);
        Self { entries }
    }

    pub fn get(&self, check: CheckName) -> Option<&MetricResult> {
        self.entries.iter().find(|entry| entry.check == check)
    }

    /// Structured evidence for `check`, if it ran and succeeded.
    pub fn finding(&self, check: CheckName) -> Option<&Finding> {
        self.get(check).and_then(MetricResult::finding)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricResult> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Failed entries as errors, for callers that want to surface them.
    pub fn failures(&self) -> Vec<PreflightError> {
        self.entries
            .iter()
            .filter_map(|entry| match &entry.outcome {
                Outcome::Failed { message } => Some(PreflightError::MetricComputation {
                    check: entry.check.to_string(),
                    message: message.clone(),
                }),
                Outcome::Measured(_) => None,
            })
            .collect()
    }
}

impl std::fmt::Display for MetricReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}: {}", entry.check.label(), entry.message())?;
        }
        Ok(())
    }
}

// Serialises as an ordered map keyed by check name.
impl Serialize for MetricReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(entry.check.as_str(), entry)?;
        }
        map.end()
    }
}

/// Runs a set of checks against one asset and print target.
pub struct Aggregator {
    config: AnalysisConfig,
    checks: Vec<Box<dyn Check>>,
}

impl Aggregator {
    /// An aggregator running every built-in check.
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            checks: builtin_checks(),
        }
    }

    /// An aggregator running exactly `checks`.
    pub fn with_checks(config: AnalysisConfig, checks: Vec<Box<dyn Check>>) -> Self {
        Self { config, checks }
    }

    /// Swap the implementation used for one check name.
    pub fn replace_check(mut self, check: Box<dyn Check>) -> Self {
        let name = check.name();
        self.checks.retain(|existing| existing.name() != name);
        self.checks.push(check);
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run every check. Never fails: a check that errors or panics becomes a
    /// failed entry and the others still run.
    #[instrument(skip_all, fields(width = asset.width(), height = asset.height(), checks = self.checks.len()))]
    pub fn run(&self, asset: &ImageAsset, spec: &PrintSpec) -> MetricReport {
        let ctx = CheckContext::new(asset, spec, &self.config);
        let results: Vec<MetricResult> = self
            .checks
            .par_iter()
            .map(|check| run_isolated(check.as_ref(), &ctx))
            .collect();
        let report = MetricReport::from_results(results);
        info!(
            entries = report.len(),
            failed = report.iter().filter(|e| e.is_failure()).count(),
            "Metric report assembled"
        );
        report
    }
}

fn run_isolated(check: &dyn Check, ctx: &CheckContext<'_>) -> MetricResult {
    let name = check.name();
    match panic::catch_unwind(AssertUnwindSafe(|| check.run(ctx))) {
        Ok(Ok(finding)) => {
            debug!(check = %name, "Check completed");
            MetricResult::measured(name, finding)
        }
        Ok(Err(err)) => {
            warn!(check = %name, error = %err, "Check failed");
            MetricResult::failed(name, err.to_string())
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(check = %name, error = %message, "Check panicked");
            MetricResult::failed(name, format!("internal error: {message}"))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

/// Result of a full analysis call.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub report: MetricReport,
    /// PNG-encoded halftone preview, when that check succeeded.
    pub halftone_preview: Option<Vec<u8>>,
}

/// Decode `data` and run every check against `spec`.
///
/// Decoding is the only failure that aborts the call; everything after it is
/// recorded in the report.
#[instrument(skip(data, spec, config), fields(data_len = data.len(), dpi = spec.dpi))]
pub fn analyze(data: &[u8], spec: &PrintSpec, config: &AnalysisConfig) -> Result<Analysis, PreflightError> {
    spec.validate()?;
    let asset = ImageAsset::decode(data)?;
    let report = Aggregator::new(config.clone()).run(&asset, spec);

    let halftone_preview = match report.finding(CheckName::Halftone) {
        Some(Finding::Halftone(preview)) => {
            let preview = image::DynamicImage::ImageLuma8(preview.image().clone());
            match encode_png(&preview) {
                Ok(bytes) => Some(bytes),
                Err(err) => {
                    warn!(error = %err, "Halftone preview could not be encoded");
                    None
                }
            }
        }
        _ => None,
    };

    Ok(Analysis {
        report,
        halftone_preview,
    })
}
