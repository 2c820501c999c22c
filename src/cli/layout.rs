//! Layout inspection (`cardforge layout ...`).

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use cardforge::{Field, PlacedText, layout_chain_with};
use clap::{ArgGroup, Args};

use crate::cli::common::AlignArg;
use crate::cli::utils::{load_fonts, load_project, load_records, write_output};

/// Args for `cardforge layout`.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(&["text", "csv"])))]
pub struct LayoutArgs {
    /// Job file describing fields and fonts.
    pub job: PathBuf,
    /// Head field of the chain to lay out.
    #[arg(short = 'f', long)]
    pub field: String,
    /// Literal text to lay out.
    #[arg(long)]
    pub text: Option<String>,
    /// CSV file to take the field value from.
    #[arg(long, requires = "row")]
    pub csv: Option<PathBuf>,
    /// 1-based CSV data row.
    #[arg(long)]
    pub row: Option<usize>,
    /// Override the head field's horizontal alignment.
    #[arg(long, value_enum)]
    pub align: Option<AlignArg>,
    /// Output file (`-` for stdout).
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

/// Execute a layout command.
pub fn handle(args: LayoutArgs) -> Result<()> {
    let mut project = load_project(&args.job)?;
    if let Some(align) = args.align {
        let field = project
            .package
            .get_mut(&args.field)
            .ok_or_else(|| anyhow!("unknown field '{}'", args.field))?;
        field.horizontal_align = align.into();
    }
    let head = project
        .package
        .get(&args.field)
        .ok_or_else(|| anyhow!("unknown field '{}'", args.field))?;

    let text = match (&args.text, &args.csv, args.row) {
        (Some(text), _, _) => Some(text.clone()),
        (None, Some(csv), Some(row)) => {
            let records = load_records(&project, csv)?;
            let record = row
                .checked_sub(1)
                .and_then(|idx| records.record(idx))
                .ok_or_else(|| anyhow!("row {} out of range 1..{}", row, records.len()))?;
            project.field_value(head, &record)
        }
        _ => return Err(anyhow!("either --text or --csv with --row is required")),
    };

    let fonts = load_fonts(&project)?;
    let family = head
        .font_family
        .as_deref()
        .or(project.package.default_font.as_deref());
    let placed = layout_chain_with(
        &project.package,
        head,
        text.as_deref(),
        |member: &Field| -> Result<_> { Ok(fonts.face(family, member.style)?.metrics()) },
        &project.layout,
    )
    .with_context(|| format!("failed to lay out field '{}'", head.name))?;

    let listing = render_listing(&placed);
    match args.output {
        Some(path) => {
            write_output(&path, &listing)?;
            println!("Wrote layout of '{}' to {}", args.field, path.display());
        }
        None => print!("{}", listing),
    }
    Ok(())
}

fn render_listing(placed: &[PlacedText]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<16} {:<5} {:>6} {:>8} {:>4}  text",
        "field", "side", "x", "baseline", "size"
    );
    for run in placed {
        let _ = writeln!(
            out,
            "{:<16} {:<5} {:>6} {:>8} {:>4}  {}",
            run.field,
            run.side.file_label(),
            run.x,
            run.baseline,
            run.size,
            run.text
        );
    }
    if placed.is_empty() {
        out.push_str("(nothing placed)\n");
    }
    out
}
