//! Field package maintenance (`cardforge fields ...`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cardforge::Project;
use clap::{Args, Subcommand};

use crate::cli::utils::{load_project, load_records};

/// Supported `cardforge fields` subcommands.
#[derive(Subcommand, Debug)]
pub enum FieldsCommand {
    /// List fields with their chain position and mapping.
    List(FieldsListArgs),
    /// Append a field to the overflow chain of another.
    Link(FieldsLinkArgs),
    /// Drop a field's overflow successor.
    Unlink(FieldsNameArgs),
    /// Rename a field, keeping links and mapping intact.
    Rename(FieldsRenameArgs),
    /// Remove a field, splicing it out of its chain.
    Remove(FieldsNameArgs),
    /// Report mappings that point at missing fields or CSV columns.
    Check(FieldsCheckArgs),
}

#[derive(Args, Debug)]
pub struct FieldsListArgs {
    pub job: PathBuf,
}

#[derive(Args, Debug)]
pub struct FieldsLinkArgs {
    pub job: PathBuf,
    /// Field whose chain is extended.
    pub from: String,
    /// Field appended at the end of the chain.
    pub to: String,
}

#[derive(Args, Debug)]
pub struct FieldsNameArgs {
    pub job: PathBuf,
    pub name: String,
}

#[derive(Args, Debug)]
pub struct FieldsRenameArgs {
    pub job: PathBuf,
    pub from: String,
    pub to: String,
}

#[derive(Args, Debug)]
pub struct FieldsCheckArgs {
    pub job: PathBuf,
    /// CSV whose header row the mapping is checked against.
    #[arg(long)]
    pub csv: Option<PathBuf>,
    /// Drop invalid mappings and save the job.
    #[arg(long)]
    pub fix: bool,
}

/// Execute a fields command.
pub fn handle(command: FieldsCommand) -> Result<()> {
    match command {
        FieldsCommand::List(args) => list(args),
        FieldsCommand::Link(args) => edit(&args.job, |project| {
            project.package.link(&args.from, &args.to)?;
            Ok(format!("Linked '{}' -> '{}'", args.from, args.to))
        }),
        FieldsCommand::Unlink(args) => edit(&args.job, |project| {
            project.package.unlink(&args.name)?;
            Ok(format!("Unlinked '{}'", args.name))
        }),
        FieldsCommand::Rename(args) => edit(&args.job, |project| {
            project.package.rename(&args.from, &args.to)?;
            if let Some(column) = project.mapping.remove(&args.from) {
                project.add_mapping(args.to.clone(), column);
            }
            Ok(format!("Renamed '{}' to '{}'", args.from, args.to))
        }),
        FieldsCommand::Remove(args) => edit(&args.job, |project| {
            project.package.remove(&args.name)?;
            project.mapping.remove(&args.name);
            Ok(format!("Removed '{}'", args.name))
        }),
        FieldsCommand::Check(args) => check(args),
    }
}

fn edit<F>(job: &Path, change: F) -> Result<()>
where
    F: FnOnce(&mut Project) -> Result<String>,
{
    let mut project = load_project(job)?;
    let message = change(&mut project)?;
    project
        .save(job)
        .with_context(|| format!("failed to save {}", job.display()))?;
    println!("{}", message);
    Ok(())
}

fn list(args: FieldsListArgs) -> Result<()> {
    let project = load_project(&args.job)?;
    print!("{}", describe(&project));
    Ok(())
}

fn describe(project: &Project) -> String {
    let mut out = String::new();
    for field in project.package.fields() {
        let source = if field.is_calculated() {
            "calculated".to_string()
        } else {
            project
                .column_for(field)
                .map(|c| format!("column {c}"))
                .unwrap_or_else(|| "unmapped".to_string())
        };
        let link = field
            .linked_field
            .as_deref()
            .map(|next| format!(" -> {next}"))
            .unwrap_or_default();
        out.push_str(&format!(
            "{:<20} {:<5} {:>5},{:<5} {:>5}x{:<5} {:?}/{:?} {}{}\n",
            field.display_name(),
            field.side.file_label(),
            field.rect.x,
            field.rect.y,
            field.rect.width,
            field.rect.height,
            field.kind,
            field.horizontal_align,
            source,
            link
        ));
    }
    if project.package.is_empty() {
        out.push_str("(no fields)\n");
    }
    out
}

fn check(args: FieldsCheckArgs) -> Result<()> {
    let mut project = load_project(&args.job)?;
    let headers = match &args.csv {
        Some(csv) => Some(load_records(&project, csv)?.headers().to_vec()),
        None => None,
    };
    let invalid = project.verify_mapping(headers.as_deref(), args.fix);
    if invalid.is_empty() {
        println!("Mapping of '{}' is valid", project.name);
        return Ok(());
    }
    for field in &invalid {
        println!("invalid mapping: {}", field);
    }
    if args.fix {
        project
            .save(&args.job)
            .with_context(|| format!("failed to save {}", args.job.display()))?;
        println!("Removed {} mapping(s)", invalid.len());
    }
    Ok(())
}
