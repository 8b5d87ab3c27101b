// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Fracsurf CLI

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use fracsurf::cli::{discover_stl_files, Reporter, Runner};
use fracsurf::io;
use fracsurf::segmentation::{ClusteringParameters, IndexSelector, SegmentSelector};
use fracsurf::FractureExtractor;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "fracsurf")]
#[command(about = "Fracture surface segmentation for broken fragment meshes", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the fracture surface of an STL fragment
    Extract {
        /// Input STL file
        input: PathBuf,

        /// Output STL file for the fracture surface
        #[arg(short, long)]
        output: PathBuf,

        /// Parameter file (.toml or .json)
        #[arg(short, long, value_name = "FILE")]
        params: Option<PathBuf>,

        /// Segment numbers to mark as fracture, as listed by `segments`
        #[arg(short, long, value_delimiter = ',', value_name = "N,..")]
        select: Option<Vec<usize>>,

        /// Also write the per-face fracture mask as JSON
        #[arg(short, long, value_name = "FILE")]
        mask: Option<PathBuf>,
    },

    /// List the refined segments of an STL fragment
    Segments {
        /// Input STL file
        input: PathBuf,

        /// Parameter file (.toml or .json)
        #[arg(short, long, value_name = "FILE")]
        params: Option<PathBuf>,

        /// Write segment faces, colors and scores as JSON
        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,
    },

    /// Extract every STL fragment in a directory in parallel
    Batch {
        /// Directory searched recursively for .stl files
        dir: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Parameter file (.toml or .json)
        #[arg(short, long, value_name = "FILE")]
        params: Option<PathBuf>,
    },

    /// Print the default parameters
    Params {
        #[arg(short, long, value_enum, default_value_t = ParamsFormat::Toml)]
        format: ParamsFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ParamsFormat {
    Toml,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Extract {
            input,
            output,
            params,
            select,
            mask,
        } => extract_command(input, output, params.as_deref(), select.as_deref(), mask.as_deref()),
        Commands::Segments { input, params, json } => {
            segments_command(input, params.as_deref(), json.as_deref())
        }
        Commands::Batch { dir, output, params } => batch_command(dir, output, params.as_deref()),
        Commands::Params { format } => params_command(*format),
    };

    if let Err(e) = result {
        Reporter::report_error(&format!("{e:#}"));
        std::process::exit(1);
    }

    Ok(())
}

/// `RUST_LOG` overrides the level picked by `-v`
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_target(false)
        .init();
}

fn load_params(path: Option<&Path>) -> Result<ClusteringParameters> {
    match path {
        Some(path) => ClusteringParameters::from_file(path)
            .with_context(|| format!("Failed to load parameters from {}", path.display())),
        None => Ok(ClusteringParameters::default()),
    }
}

fn extract_command(
    input: &Path,
    output: &Path,
    params: Option<&Path>,
    select: Option<&[usize]>,
    mask: Option<&Path>,
) -> Result<()> {
    if !input.exists() {
        bail!("Input file not found: {}", input.display());
    }

    let runner = Runner::new(load_params(params)?)?;
    let selector = match select {
        Some(numbers) => {
            if numbers.contains(&0) {
                bail!("Segment numbers start at 1");
            }
            Some(IndexSelector::new(numbers.iter().map(|n| n - 1).collect()))
        }
        None => None,
    };

    let selector = selector.as_ref().map(|s| s as &dyn SegmentSelector);
    let run = runner.run_file(input, output, selector, mask)?;
    Reporter::report_extraction(&run);

    if !run.found() {
        Reporter::report_warning("No fracture surface identified");
        std::process::exit(2);
    }
    Ok(())
}

fn segments_command(input: &Path, params: Option<&Path>, json: Option<&Path>) -> Result<()> {
    let start = Instant::now();
    let extractor = FractureExtractor::new(load_params(params)?)?;
    let mesh = io::import_stl(input)?;

    let segmentation = extractor
        .segment(&mesh)
        .with_context(|| format!("Failed to segment {}", input.display()))?;
    let summaries = segmentation.summaries(&mesh, extractor.params());

    Reporter::report_segments(
        &input.display().to_string(),
        &segmentation,
        &summaries,
        start.elapsed(),
    );

    if let Some(path) = json {
        io::write_segments_json(&summaries, path)?;
        Reporter::success(&format!("Segments written to {}", path.display()));
    }
    Ok(())
}

fn batch_command(dir: &Path, output: &Path, params: Option<&Path>) -> Result<()> {
    let start = Instant::now();
    let runner = Runner::new(load_params(params)?)?;

    let inputs = discover_stl_files(dir)?;
    if inputs.is_empty() {
        bail!("No STL files found in {}", dir.display());
    }
    Reporter::report_info(&format!("Extracting {} fragments", inputs.len()));

    std::fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory {}", output.display()))?;
    let results = runner.run_batch(&inputs, output, true);

    let failed = Reporter::report_batch(&results, start.elapsed());
    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn params_command(format: ParamsFormat) -> Result<()> {
    let params = ClusteringParameters::default();
    let text = match format {
        ParamsFormat::Toml => toml::to_string_pretty(&params)?,
        ParamsFormat::Json => serde_json::to_string_pretty(&params)?,
    };
    println!("{text}");
    Ok(())
}
