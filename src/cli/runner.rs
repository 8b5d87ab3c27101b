// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Extraction runner for single files and directory batches

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::extract::FractureExtractor;
use crate::io;
use crate::segmentation::{ClusteringParameters, SegmentSelector};

/// Result of one fragment extraction
#[derive(Debug, Clone)]
pub struct ExtractionRun {
    pub input: PathBuf,
    pub triangles: usize,
    /// Triangles of the written fracture surface; `None` when none was found
    pub fracture_triangles: Option<usize>,
    pub output: Option<PathBuf>,
    pub duration: Duration,
}

impl ExtractionRun {
    pub fn found(&self) -> bool {
        self.fracture_triangles.is_some()
    }
}

/// Runner for executing extractions with one parameter set
pub struct Runner {
    extractor: FractureExtractor,
}

impl Runner {
    pub fn new(params: ClusteringParameters) -> Result<Self> {
        let extractor = FractureExtractor::new(params).context("Invalid clustering parameters")?;
        Ok(Self { extractor })
    }

    pub fn extractor(&self) -> &FractureExtractor {
        &self.extractor
    }

    /// Extract one fragment and write its fracture surface (and mask) when found.
    ///
    /// Without a selector the automatic heuristics pick the fracture faces.
    pub fn run_file(
        &self,
        input: &Path,
        output: &Path,
        selector: Option<&dyn SegmentSelector>,
        mask: Option<&Path>,
    ) -> Result<ExtractionRun> {
        let start = Instant::now();

        let mesh = io::import_stl(input)?;
        let surface = match selector {
            Some(selector) => self.extractor.extract_with(&mesh, selector),
            None => self.extractor.extract(&mesh),
        }
        .with_context(|| format!("Failed to segment {}", input.display()))?;

        let mut run = ExtractionRun {
            input: input.to_path_buf(),
            triangles: mesh.triangle_count(),
            fracture_triangles: None,
            output: None,
            duration: Duration::ZERO,
        };

        if let Some(surface) = surface {
            io::export_stl(&surface.mesh, output)?;
            if let Some(mask_path) = mask {
                io::write_mask_json(&surface.mask, mask_path)?;
            }
            run.fracture_triangles = Some(surface.mesh.triangle_count());
            run.output = Some(output.to_path_buf());
        } else {
            warn!("no fracture surface found in {}", input.display());
        }

        run.duration = start.elapsed();
        Ok(run)
    }

    /// Extract every input in parallel into `out_dir` with automatic selection.
    ///
    /// Results keep the order of `inputs`.
    pub fn run_batch(
        &self,
        inputs: &[PathBuf],
        out_dir: &Path,
        show_progress: bool,
    ) -> Vec<(PathBuf, Result<ExtractionRun>)> {
        let progress = if show_progress {
            let pb = ProgressBar::new(inputs.len() as u64);
            let template =
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})";
            if let Ok(style) = ProgressStyle::default_bar().template(template) {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb
        } else {
            ProgressBar::hidden()
        };

        let results: Vec<_> = inputs
            .par_iter()
            .map(|input| {
                let output = output_path(out_dir, input);
                let result = self.run_file(input, &output, None, None);
                progress.inc(1);
                (input.clone(), result)
            })
            .collect();

        progress.finish_and_clear();
        info!("batch of {} files finished", inputs.len());
        results
    }
}

/// STL files under `dir`, sorted by path
pub fn discover_stl_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.with_context(|| format!("Failed to scan {}", dir.display()))?;
        let is_stl = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("stl"));
        if entry.file_type().is_file() && is_stl {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// `<out_dir>/<stem>_fracture.stl`
pub fn output_path(out_dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "fragment".to_string());
    out_dir.join(format!("{stem}_fracture.stl"))
}
