//! Card draw driver: one CSV record in, front and rear images out.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use image::{ImageError, RgbaImage};
use log::{debug, error, info};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::field::{CardSide, Field, FieldKind};
use crate::font::{FontBook, FontError};
use crate::image::{CardSurfaces, load_background, paint_image, paint_run, rgba};
use crate::layout::{LayoutError, layout_chain_with};
use crate::project::Project;
use crate::records::{Record, Records};

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Font(#[from] FontError),
    #[error("failed to read image {path}: {source}")]
    Image { path: String, source: ImageError },
    #[error("failed to write {path}: {source}")]
    Encode { path: String, source: ImageError },
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("no front background and no card_size configured")]
    NoCanvas,
    #[error("row {0} does not exist")]
    MissingRow(usize),
    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error("failed to serialize manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// One image written for a card.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestEntry {
    pub row: usize,
    pub side: CardSide,
    pub path: PathBuf,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RowFailure {
    pub row: usize,
    pub error: String,
}

/// Outcome of a batch render, written out as the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub project: String,
    pub created_at: DateTime<Utc>,
    pub cards: Vec<ManifestEntry>,
    pub failures: Vec<RowFailure>,
}

impl BatchReport {
    pub fn write_manifest(&self, out_dir: &Path) -> Result<PathBuf, RenderError> {
        let path = out_dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).map_err(|source| RenderError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(path)
    }
}

/// Renders records of one job. Backgrounds are loaded once and shared
/// read-only by every row.
pub struct CardRenderer<'a> {
    project: &'a Project,
    fonts: &'a FontBook,
    front: RgbaImage,
    rear: Option<RgbaImage>,
    alternate_rear: Option<RgbaImage>,
}

impl<'a> CardRenderer<'a> {
    pub fn new(project: &'a Project, fonts: &'a FontBook) -> Result<Self, RenderError> {
        let backgrounds = &project.package.backgrounds;
        let load = |path: Option<&PathBuf>| -> Result<Option<RgbaImage>, RenderError> {
            path.map(|p| {
                let path = project.resolve_path(p);
                load_background(&path).map_err(|source| RenderError::Image {
                    path: path.display().to_string(),
                    source,
                })
            })
            .transpose()
        };
        let front = match load(backgrounds.front.as_ref())? {
            Some(image) => image,
            None => {
                let [width, height] = project.card_size.ok_or(RenderError::NoCanvas)?;
                RgbaImage::from_pixel(width, height, rgba(0xff, 0xff, 0xff, 0xff))
            }
        };
        Ok(Self {
            project,
            fonts,
            front,
            rear: load(backgrounds.rear.as_ref())?,
            alternate_rear: load(backgrounds.alternate_rear.as_ref())?,
        })
    }

    fn uses_alternate_rear(&self, record: &Record<'_>) -> bool {
        if self.alternate_rear.is_none() {
            return false;
        }
        let Some(column) = self.project.alternate_rear_column.as_deref() else {
            return false;
        };
        let value = record.get(column).unwrap_or("").trim().to_ascii_lowercase();
        !matches!(value.as_str(), "" | "0" | "false" | "no")
    }

    fn surfaces(&self, record: &Record<'_>) -> CardSurfaces {
        let rear = if self.uses_alternate_rear(record) {
            self.alternate_rear.clone()
        } else if self.rear.is_some() {
            self.rear.clone()
        } else if self
            .project
            .package
            .fields_for_side(CardSide::Rear)
            .next()
            .is_some()
        {
            Some(RgbaImage::from_pixel(
                self.front.width(),
                self.front.height(),
                rgba(0xff, 0xff, 0xff, 0xff),
            ))
        } else {
            None
        };
        CardSurfaces::new(self.front.clone(), rear)
    }

    /// Paint every sourced field of `record` onto fresh card surfaces.
    pub fn render(&self, record: &Record<'_>) -> Result<CardSurfaces, RenderError> {
        let package = &self.project.package;
        let mut surfaces = self.surfaces(record);
        for field in package.fields() {
            let Some(value) = self.project.field_value(field, record) else {
                continue;
            };
            match field.kind {
                FieldKind::Text => self.paint_text_chain(&mut surfaces, field, &value)?,
                FieldKind::Image => self.paint_image_field(&mut surfaces, field, &value)?,
            }
        }
        Ok(surfaces)
    }

    /// Lay out a chain from its head. Every member draws with the head's
    /// family in its own style.
    fn paint_text_chain(
        &self,
        surfaces: &mut CardSurfaces,
        head: &Field,
        value: &str,
    ) -> Result<(), RenderError> {
        let fonts = self.fonts;
        let package = &self.project.package;
        let family = head
            .font_family
            .as_deref()
            .or(package.default_font.as_deref());
        let placed = layout_chain_with(
            package,
            head,
            Some(value),
            |member: &Field| -> Result<_, RenderError> {
                Ok(fonts.face(family, member.style)?.metrics())
            },
            &self.project.layout,
        )?;
        for run in &placed {
            paint_run(surfaces, run, fonts.face(family, run.style)?);
        }
        Ok(())
    }

    fn paint_image_field(
        &self,
        surfaces: &mut CardSurfaces,
        field: &Field,
        value: &str,
    ) -> Result<(), RenderError> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(());
        }
        let path = self.project.resolve_path(Path::new(value));
        let source = image::open(&path).map_err(|source| RenderError::Image {
            path: path.display().to_string(),
            source,
        })?;
        if let Some(surface) = surfaces.side_mut(field.side) {
            paint_image(surface, &field.rect, &source);
        }
        Ok(())
    }

    /// Encode both faces of a rendered card into `out_dir`.
    pub fn write(
        &self,
        record: &Record<'_>,
        surfaces: &CardSurfaces,
        out_dir: &Path,
    ) -> Result<Vec<ManifestEntry>, RenderError> {
        let template = self.project.file_name_template();
        let faces = [
            (CardSide::Front, Some(&surfaces.front)),
            (CardSide::Rear, surfaces.rear.as_ref()),
        ];
        let mut written = Vec::new();
        for (side, image) in faces {
            let Some(image) = image else {
                continue;
            };
            let path = out_dir.join(template.render(record, side));
            let io_err = |source| RenderError::Io {
                path: path.display().to_string(),
                source,
            };
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
            image.save(&path).map_err(|source| RenderError::Encode {
                path: path.display().to_string(),
                source,
            })?;
            let bytes = fs::read(&path).map_err(io_err)?;
            debug!("row {} {} -> {}", record.no, side, path.display());
            written.push(ManifestEntry {
                row: record.no,
                side,
                sha256: format!("{:x}", Sha256::digest(&bytes)),
                path,
            });
        }
        Ok(written)
    }

    fn render_row(
        &self,
        records: &Records,
        index: usize,
        out_dir: &Path,
    ) -> Result<Vec<ManifestEntry>, RenderError> {
        let record = records
            .record(index)
            .ok_or(RenderError::MissingRow(index + 1))?;
        let surfaces = self.render(&record)?;
        self.write(&record, &surfaces, out_dir)
    }
}

/// Render the zero-based `rows` of `records` on a pool of `threads` workers.
///
/// A failing row is logged and reported; the remaining rows still render.
pub fn render_batch(
    renderer: &CardRenderer<'_>,
    records: &Records,
    rows: &[usize],
    out_dir: &Path,
    threads: usize,
) -> Result<BatchReport, RenderError> {
    fs::create_dir_all(out_dir).map_err(|source| RenderError::Io {
        path: out_dir.display().to_string(),
        source,
    })?;
    let pool = ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()?;
    let results: Vec<(usize, Result<Vec<ManifestEntry>, RenderError>)> = pool.install(|| {
        rows.par_iter()
            .map(|&index| (index + 1, renderer.render_row(records, index, out_dir)))
            .collect()
    });

    let mut report = BatchReport {
        project: renderer.project.name.clone(),
        created_at: Utc::now(),
        cards: Vec::new(),
        failures: Vec::new(),
    };
    for (row, result) in results {
        match result {
            Ok(entries) => report.cards.extend(entries),
            Err(err) => {
                error!("row {row}: {err}");
                report.failures.push(RowFailure {
                    row,
                    error: err.to_string(),
                });
            }
        }
    }
    info!(
        "rendered {} image(s) from {} row(s), {} failure(s)",
        report.cards.len(),
        rows.len(),
        report.failures.len()
    );
    Ok(report)
}
