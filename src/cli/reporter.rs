// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use super::runner::ExtractionRun;
use crate::extract::{SegmentSummary, Segmentation};
use anyhow::Result;
use colored::*;
use std::path::PathBuf;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// Report refined segments as a table
    pub fn report_segments(
        file: &str,
        segmentation: &Segmentation,
        summaries: &[SegmentSummary],
        duration: Duration,
    ) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", "Segments:".bold(), file.cyan());
        println!("{}", "━".repeat(80).bright_black());

        println!(
            "  {:>4}  {:<2} {:>7} {:>10} {:>12} {:>9} {:>10}",
            "#".bright_black(),
            "",
            "Faces".bright_black(),
            "Area".bright_black(),
            "Orientation".bright_black(),
            "Planar".bright_black(),
            "Curvature".bright_black()
        );
        for summary in summaries {
            let [r, g, b] = summary.color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
            println!(
                "  {:>4}  {:<2} {:>7} {:>10.3} {:>12} {:>9} {:>10.4}",
                summary.index + 1,
                "■".truecolor(r, g, b),
                summary.faces.len(),
                summary.area,
                Self::badness(summary.scores.orientation_badness, 0.30),
                Self::badness(summary.scores.planar_badness, 2.0),
                summary.scores.curvature
            );
        }

        println!("\n{}", "Refinement:".bold());
        let stats = &segmentation.stats;
        println!(
            "  {} {}  {} {}  {} {}",
            "Initial clusters:".bright_black(),
            segmentation.initial.cluster_count().to_string().cyan(),
            "Noise faces:".bright_black(),
            segmentation.initial.noise_count().to_string().cyan(),
            "Max depth:".bright_black(),
            stats.max_depth.to_string().cyan()
        );
        println!(
            "  {} {}  {} {}  {} {}",
            "Splits:".bright_black(),
            (stats.component_splits + stats.recluster_splits).to_string().cyan(),
            "Dropped segments:".bright_black(),
            segmentation.dropped.len().to_string().yellow(),
            "Dropped faces:".bright_black(),
            segmentation.dropped_faces().to_string().yellow()
        );
        println!(
            "  {} {}",
            "Time:".bright_black(),
            Self::format_duration(duration).yellow()
        );
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Report one extraction
    pub fn report_extraction(run: &ExtractionRun) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", "Fragment:".bold(), run.input.display().to_string().cyan());
        println!("{}", "━".repeat(80).bright_black());
        println!(
            "  {} {}",
            "Triangles:".bright_black(),
            run.triangles.to_string().cyan()
        );

        match (run.fracture_triangles, &run.output) {
            (Some(count), Some(output)) => {
                let share = count as f64 / run.triangles.max(1) as f64 * 100.0;
                println!(
                    "  {} {} ({:.1}%)",
                    "Fracture:".bright_black(),
                    count.to_string().green(),
                    share
                );
                println!(
                    "  {} {}",
                    "Output:".bright_black(),
                    output.display().to_string().cyan()
                );
            }
            _ => println!("  {} {}", "Fracture:".bright_black(), "none found".yellow()),
        }

        println!(
            "  {} {}",
            "Time:".bright_black(),
            Self::format_duration(run.duration).yellow()
        );
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Report a batch summary; returns the number of failed files
    pub fn report_batch(results: &[(PathBuf, Result<ExtractionRun>)], duration: Duration) -> usize {
        let mut found = 0;
        let mut missing = 0;
        let mut failed = 0;

        for (input, result) in results {
            let name = input.display().to_string();
            match result {
                Ok(run) if run.found() => {
                    found += 1;
                    let triangles = run.fracture_triangles.unwrap_or(0);
                    println!(
                        "  {} {} {}",
                        "✅".green(),
                        name,
                        format!("({triangles} triangles)").bright_black()
                    );
                }
                Ok(_) => {
                    missing += 1;
                    let note = "(no fracture surface)".bright_black();
                    println!("  {} {} {}", "⚠️".yellow(), name, note);
                }
                Err(e) => {
                    failed += 1;
                    println!("  {} {} {}", "❌".red(), name, format!("{e:#}").bright_black());
                }
            }
        }

        println!("\n{}", "═".repeat(80).bright_black());
        println!("{}", "Batch Summary".bold());
        println!("{}", "═".repeat(80).bright_black());
        println!("  {} {}", "Files:".bright_black(), results.len().to_string().cyan());
        println!("  {} {}", "Extracted:".bright_black(), found.to_string().green());
        println!("  {} {}", "No fracture:".bright_black(), missing.to_string().yellow());
        println!(
            "  {} {}",
            "Errors:".bright_black(),
            if failed > 0 { failed.to_string().red() } else { failed.to_string().green() }
        );
        println!("  {} {}", "Time:".bright_black(), Self::format_duration(duration).yellow());
        println!("{}", "═".repeat(80).bright_black());

        failed
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report warning
    pub fn report_warning(message: &str) {
        println!("\n{} {}", "⚠️  Warning:".yellow().bold(), message);
    }

    /// Report info
    pub fn report_info(message: &str) {
        println!("{} {}", "ℹ️".bright_blue(), message);
    }

    /// Print success message
    pub fn success(message: &str) {
        println!("{} {}", "✅".green(), message.green());
    }

    /// Badness value colored against its split threshold
    fn badness(value: f64, threshold: f64) -> ColoredString {
        let text = format!("{value:.4}");
        if value <= threshold * 0.5 {
            text.green()
        } else if value <= threshold {
            text.yellow()
        } else {
            text.red()
        }
    }

    /// Format duration for display
    fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(
            Reporter::format_duration(Duration::from_micros(500)),
            "500µs"
        );
        assert_eq!(
            Reporter::format_duration(Duration::from_millis(5)),
            "5.00ms"
        );
        assert_eq!(Reporter::format_duration(Duration::from_secs(2)), "2.00s");
    }

    #[test]
    fn test_badness_text() {
        colored::control::set_override(false);
        assert_eq!(Reporter::badness(0.1234567, 0.3).to_string(), "0.1235");
        colored::control::unset_override();
    }
}
