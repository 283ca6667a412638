// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// CLI configuration file: analysis thresholds plus a default print target.
// Command-line flags override whatever the file says.

use std::path::Path;

use preflight_core::error::PreflightError;
use preflight_core::{AnalysisConfig, PaperSize, PrintSpec};
use serde::{Deserialize, Serialize};

/// Contents of a `preflight.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub analysis: AnalysisConfig,
    pub print: PrintSpec,
}

impl CliConfig {
    /// Load from `path`, or the defaults when no path was given.
    pub fn load(path: Option<&Path>) -> Result<Self, PreflightError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|err| PreflightError::Config(format!("{}: {err}", path.display())))?;
        config.print.validate()?;
        Ok(config)
    }
}

/// Print-target overrides from the command line.
#[derive(Debug, Clone, Default)]
pub struct TargetOverrides {
    pub paper: Option<String>,
    pub dpi: Option<f64>,
    pub width_in: Option<f64>,
    pub height_in: Option<f64>,
    pub bleed_in: Option<f64>,
}

impl TargetOverrides {
    /// Layer the overrides onto `base`: a named paper size first, then any
    /// explicit dimensions.
    pub fn apply(&self, base: PrintSpec) -> Result<PrintSpec, PreflightError> {
        let mut spec = base;
        if let Some(name) = &self.paper {
            let paper = PaperSize::from_name(name)
                .ok_or_else(|| PreflightError::Config(format!("unknown paper size '{name}'")))?;
            let (w, h) = paper.dimensions_in();
            spec.width_in = w;
            spec.height_in = h;
        }
        if let Some(dpi) = self.dpi {
            spec.dpi = dpi;
        }
        if let Some(w) = self.width_in {
            spec.width_in = w;
        }
        if let Some(h) = self.height_in {
            spec.height_in = h;
        }
        if let Some(b) = self.bleed_in {
            spec.bleed_in = b;
        }
        spec.validate()?;
        Ok(spec)
    }
}

/// The default configuration rendered as TOML, for `gen-config`.
pub fn stock_config_toml() -> Result<String, PreflightError> {
    toml::to_string_pretty(&CliConfig::default())
        .map_err(|err| PreflightError::Config(err.to_string()))
}
