//! Layout previews (`cardforge preview ...`).

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use cardforge::{CardSide, draw_field_outline, load_background, rgba};
use clap::Args;
use image::RgbaImage;

use crate::cli::common::SideArg;
use crate::cli::utils::{load_fonts, load_project};

/// Args for `cardforge preview`.
#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Job file describing fields and backgrounds.
    pub job: PathBuf,
    /// PNG file to write.
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Card side to preview.
    #[arg(long, default_value_t = SideArg::Front, value_enum)]
    pub side: SideArg,
}

/// Draw every field of one side as an outline with its name and guides.
pub fn handle(args: PreviewArgs) -> Result<()> {
    let project = load_project(&args.job)?;
    let fonts = load_fonts(&project)?;
    let side: CardSide = args.side.into();
    let backgrounds = &project.package.backgrounds;
    let background = match side {
        CardSide::Front => backgrounds.front.as_ref(),
        CardSide::Rear => backgrounds.rear.as_ref(),
    };

    let mut canvas = match background {
        Some(path) => {
            let path = project.resolve_path(path);
            load_background(&path)
                .with_context(|| format!("failed to read background {}", path.display()))?
        }
        None => {
            let [width, height] = project
                .card_size
                .ok_or_else(|| anyhow!("no {} background and no card_size in job", side))?;
            RgbaImage::from_pixel(width, height, rgba(0xff, 0xff, 0xff, 0xff))
        }
    };

    let mut drawn = 0;
    for field in project.package.fields_for_side(side) {
        let face = fonts.for_field(field, project.package.default_font.as_deref())?;
        draw_field_outline(&mut canvas, field, face.as_ref());
        drawn += 1;
    }
    canvas
        .save(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    println!(
        "Previewed {} {} field(s) to {}",
        drawn,
        side,
        args.output.display()
    );
    Ok(())
}
