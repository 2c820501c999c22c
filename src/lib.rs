//! Core library for populating card images from CSV rows and a field layout.

mod field;
mod font;
mod image;
mod layout;
mod package;
mod project;
mod records;
mod render;
mod templates;

pub use crate::image::{
    CardSurfaces, draw_field_outline, load_background, paint_image, paint_run, paint_text, rgba,
};
pub use field::{
    CardSide, DEFAULT_FONT_SIZE, Field, FieldKind, FontStyle, HorizontalAlign, Rect, ValueSource,
    VerticalAlign,
};
pub use font::{FontBook, FontError, GlyphFace, Typeface};
pub use layout::{
    FontMetrics, LayoutError, LayoutOptions, PARAGRAPH_DELIMITER, PlacedText, TAB_MARKER,
    TAB_PLACEHOLDER, fit_font_size, justify_line, layout_chain, layout_chain_with,
    split_into_paragraphs, start_baseline, wrap_paragraph,
};
pub use package::{Backgrounds, FieldPackage, PackageError};
pub use project::{ProcessingMode, Project, ProjectError};
pub use records::{CsvOptions, Record, RecordError, Records};
pub use render::{
    BatchReport, CardRenderer, MANIFEST_FILE, ManifestEntry, RenderError, RowFailure,
    render_batch,
};
pub use templates::{DEFAULT_FILE_NAME_TEMPLATE, FileNameTemplate, expand, expand_value};
