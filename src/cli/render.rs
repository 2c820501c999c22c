//! Batch rendering (`cardforge render ...`).

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use cardforge::{CardRenderer, render_batch};
use clap::Args;
use log::info;

use crate::cli::utils::{load_fonts, load_project, load_records, select_rows};

/// Args for `cardforge render`.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Job file describing fields, fonts and mapping.
    pub job: PathBuf,
    /// CSV file with one card per data row.
    #[arg(long)]
    pub csv: PathBuf,
    /// Output directory for card images and the manifest.
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Rows to render, e.g. 1..10,25,30.. (default: all).
    #[arg(short = 'r', long = "rows")]
    pub rows: Option<String>,
    /// Worker threads; overrides the job's processing mode.
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,
    /// Exit with an error when any row fails.
    #[arg(long)]
    pub strict: bool,
}

/// Execute a render command.
pub fn handle(args: RenderArgs) -> Result<()> {
    let project = load_project(&args.job)?;
    let records = load_records(&project, &args.csv)?;
    let fonts = load_fonts(&project)?;

    let rows = match args.rows.as_deref() {
        Some(expr) => select_rows(expr, records.len())?,
        None => (0..records.len()).collect(),
    };
    let threads = args.threads.unwrap_or_else(|| project.processing.threads());
    info!(
        "rendering {} row(s) of {} with {} thread(s)",
        rows.len(),
        args.csv.display(),
        threads
    );

    let renderer = CardRenderer::new(&project, &fonts)
        .with_context(|| format!("failed to prepare job '{}'", project.name))?;
    let report = render_batch(&renderer, &records, &rows, &args.output, threads)?;
    let manifest = report.write_manifest(&args.output)?;

    println!(
        "Rendered {} image(s) to {} ({} failed row(s)); manifest {}",
        report.cards.len(),
        args.output.display(),
        report.failures.len(),
        manifest.display()
    );
    for failure in &report.failures {
        eprintln!("row {}: {}", failure.row, failure.error);
    }
    if args.strict && !report.failures.is_empty() {
        return Err(anyhow!("{} row(s) failed to render", report.failures.len()));
    }
    Ok(())
}
