// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preflight — print-readiness checks and automatic fixes for raster images.
//
// Entry point. Initialises logging, loads configuration, and dispatches the
// subcommand.

mod config;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use preflight_analysis::{adjust, analyze, convert_color_profile, extract_metadata, ImageAsset};
use preflight_core::error::PreflightError;
use preflight_core::human_errors::humanize_error;
use tracing::info;

use config::{CliConfig, TargetOverrides};

#[derive(Parser)]
#[command(name = "preflight")]
#[command(about = "Check whether an image is ready for print, and fix what can be fixed")]
#[command(version)]
struct Cli {
    /// TOML file with analysis thresholds and a default print target
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Print target flags shared by `analyze` and `adjust`.
#[derive(clap::Args, Clone, Debug, Default)]
struct TargetArgs {
    /// Named paper size (letter, legal, tabloid, a3, a4, a5)
    #[arg(long)]
    paper: Option<String>,
    /// Print resolution in dots per inch
    #[arg(long)]
    dpi: Option<f64>,
    /// Trim width in inches
    #[arg(long)]
    width: Option<f64>,
    /// Trim height in inches
    #[arg(long)]
    height: Option<f64>,
    /// Bleed on every edge in inches
    #[arg(long)]
    bleed: Option<f64>,
}

impl From<&TargetArgs> for TargetOverrides {
    fn from(args: &TargetArgs) -> Self {
        Self {
            paper: args.paper.clone(),
            dpi: args.dpi,
            width_in: args.width,
            height_in: args.height,
            bleed_in: args.bleed,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Run every print-readiness check and print the report
    Analyze {
        input: PathBuf,
        #[command(flatten)]
        target: TargetArgs,
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
        /// Write the halftone preview PNG here
        #[arg(long)]
        halftone_out: Option<PathBuf>,
    },
    /// Describe the container: format, mode, DPI, EXIF, ICC and more
    Metadata {
        input: PathBuf,
        /// Emit the metadata as JSON
        #[arg(long)]
        json: bool,
    },
    /// Analyse, then apply the corrective transforms and write a PNG
    Adjust {
        input: PathBuf,
        #[command(flatten)]
        target: TargetArgs,
        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Convert the image into a target ICC profile and write a PNG
    ConvertProfile {
        input: PathBuf,
        /// Target ICC profile file
        #[arg(long)]
        profile: PathBuf,
        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print the default configuration as TOML
    GenConfig,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        let human = humanize_error(&err);
        eprintln!("error: {}", human.message);
        eprintln!("  {}", human.suggestion);
        tracing::debug!(error = %err, severity = ?human.severity, "Command failed");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), PreflightError> {
    let cfg = CliConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Analyze {
            input,
            target,
            json,
            halftone_out,
        } => {
            let spec = TargetOverrides::from(&target).apply(cfg.print)?;
            let data = read_input(&input)?;
            let analysis = analyze(&data, &spec, &cfg.analysis)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&analysis.report)?);
            } else {
                print!("{}", analysis.report);
            }
            if let (Some(path), Some(png)) = (halftone_out, analysis.halftone_preview) {
                std::fs::write(&path, png)?;
                info!(path = %path.display(), "Halftone preview written");
            }
        }
        Command::Metadata { input, json } => {
            let data = read_input(&input)?;
            let meta = extract_metadata(&data);
            if json {
                println!("{}", serde_json::to_string_pretty(&meta)?);
            } else {
                print!("{meta}");
            }
        }
        Command::Adjust {
            input,
            target,
            output,
        } => {
            let spec = TargetOverrides::from(&target).apply(cfg.print)?;
            let data = read_input(&input)?;
            let analysis = analyze(&data, &spec, &cfg.analysis)?;
            let png = adjust(&data, &analysis.report, &spec, &cfg.analysis)?;
            std::fs::write(&output, png)?;
            println!("Adjusted image written to {}", output.display());
        }
        Command::ConvertProfile {
            input,
            profile,
            output,
        } => {
            let data = read_input(&input)?;
            let asset = ImageAsset::decode(&data)?;
            let (converted, status) = convert_color_profile(&asset, &profile);
            println!("{status}");
            if !status.is_success() {
                return Err(PreflightError::ProfileConversion(status.to_string()));
            }
            let png = preflight_analysis::image::encode_png(converted.image())?;
            std::fs::write(&output, png)?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml()?);
        }
    }

    Ok(())
}

fn read_input(path: &Path) -> Result<Vec<u8>, PreflightError> {
    let data = std::fs::read(path)?;
    info!(path = %path.display(), bytes = data.len(), "Input read");
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn analyze_flags_parse() {
        let cli = Cli::try_parse_from([
            "preflight", "analyze", "in.png", "--dpi", "150", "--paper", "a4", "--json",
        ])
        .unwrap();
        let Command::Analyze { input, target, json, .. } = cli.command else {
            panic!("wrong subcommand");
        };
        assert_eq!(input, PathBuf::from("in.png"));
        assert_eq!(target.dpi, Some(150.0));
        assert_eq!(target.paper.as_deref(), Some("a4"));
        assert!(json);
    }

    #[test]
    fn adjust_requires_output() {
        assert!(Cli::try_parse_from(["preflight", "adjust", "in.png"]).is_err());
        assert!(Cli::try_parse_from(["preflight", "adjust", "in.png", "-o", "out.png"]).is_ok());
    }

    #[test]
    fn missing_input_is_an_io_error() {
        let cli = Cli::try_parse_from(["preflight", "metadata", "/no/such/file.png"]).unwrap();
        assert!(matches!(run(cli), Err(PreflightError::Io(_))));
    }

    #[test]
    fn adjust_writes_a_png() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.png");
        image::RgbImage::from_pixel(20, 30, image::Rgb([200, 180, 160]))
            .save(&input)
            .unwrap();
        let cli = Cli::try_parse_from([
            "preflight",
            "adjust",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .unwrap();
        run(cli).unwrap();
        let written = image::open(&output).unwrap();
        // Cropped to 20x25 for letter proportions, then doubled.
        assert_eq!((written.width(), written.height()), (40, 50));
    }
}
