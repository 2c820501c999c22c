//! Command-line interface wiring for the `cardforge` binary.
//!
//! This module owns the clap definitions and delegates execution to
//! one submodule per command.

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod common;
pub mod fields;
pub mod layout;
pub mod preview;
pub mod render;
pub mod utils;

/// Parsed CLI entrypoint for the `cardforge` binary.
#[derive(Parser, Debug)]
#[command(
    name = "cardforge",
    version,
    about = "Populate card images from CSV rows and a field layout"
)]
pub struct Cli {
    /// Top-level command to execute.
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render card images for CSV rows.
    Render(render::RenderArgs),
    /// Show where the text of one field chain lands.
    Layout(layout::LayoutArgs),
    /// Inspect and edit the field package of a job.
    #[command(subcommand)]
    Fields(fields::FieldsCommand),
    /// Draw field outlines onto a card side.
    Preview(preview::PreviewArgs),
}

/// Execute the requested command.
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Render(args) => render::handle(args),
        Command::Layout(args) => layout::handle(args),
        Command::Fields(cmd) => fields::handle(cmd),
        Command::Preview(args) => preview::handle(args),
    }
}
