//! Typefaces and font resolution.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use thiserror::Error;

use crate::field::{Field, FontStyle};
use crate::layout::FontMetrics;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to read font {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("{path} is not a usable font file")]
    Invalid { path: String },
    #[error("no font available for family {0:?} and no default font registered")]
    Unresolved(Option<String>),
}

/// A typeface the layout engine can measure and the painter can draw with.
pub trait Typeface: FontMetrics + Send + Sync {
    fn metrics(&self) -> &dyn FontMetrics;

    /// Paint `text` with its baseline at `baseline`.
    fn draw(
        &self,
        image: &mut RgbaImage,
        text: &str,
        x: i32,
        baseline: i32,
        size: u32,
        color: Rgba<u8>,
    );
}

/// Outline font loaded through `ab_glyph`.
pub struct GlyphFace {
    font: FontArc,
}

impl GlyphFace {
    pub fn from_bytes(bytes: Vec<u8>, origin: &str) -> Result<Self, FontError> {
        let font = FontArc::try_from_vec(bytes).map_err(|_| FontError::Invalid {
            path: origin.to_string(),
        })?;
        Ok(Self { font })
    }

    pub fn load(path: &Path) -> Result<Self, FontError> {
        let bytes = fs::read(path).map_err(|source| FontError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_bytes(bytes, &path.display().to_string())
    }

    fn scale(size: u32) -> PxScale {
        PxScale::from(size.max(1) as f32)
    }
}

impl FontMetrics for GlyphFace {
    fn text_width(&self, text: &str, size: u32) -> i32 {
        let scaled = self.font.as_scaled(Self::scale(size));
        let mut width = 0.0f32;
        let mut previous = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        width.round() as i32
    }

    fn ascent(&self, size: u32) -> i32 {
        self.font.as_scaled(Self::scale(size)).ascent().ceil() as i32
    }

    fn line_height(&self, size: u32) -> i32 {
        let scaled = self.font.as_scaled(Self::scale(size));
        (scaled.ascent() - scaled.descent() + scaled.line_gap()).ceil() as i32
    }
}

impl Typeface for GlyphFace {
    fn metrics(&self) -> &dyn FontMetrics {
        self
    }

    fn draw(
        &self,
        image: &mut RgbaImage,
        text: &str,
        x: i32,
        baseline: i32,
        size: u32,
        color: Rgba<u8>,
    ) {
        // imageproc positions text by the top of its ascent.
        let top = baseline - self.ascent(size);
        draw_text_mut(image, color, x, top, Self::scale(size), &self.font, text);
    }
}

/// Named typefaces available to a job, with a package-level default.
#[derive(Clone, Default)]
pub struct FontBook {
    faces: HashMap<String, Arc<dyn Typeface>>,
    default: Option<String>,
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<S: Into<String>>(&mut self, name: S, face: Arc<dyn Typeface>) {
        let name = name.into();
        if self.default.is_none() {
            self.default = Some(name.clone());
        }
        self.faces.insert(name, face);
    }

    /// Load and register a font file under `name`.
    pub fn load<S: Into<String>>(&mut self, name: S, path: &Path) -> Result<(), FontError> {
        let face = GlyphFace::load(path)?;
        self.insert(name, Arc::new(face));
        Ok(())
    }

    pub fn set_default<S: Into<String>>(&mut self, name: S) {
        self.default = Some(name.into());
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.faces.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve a family and style, trying `"<family> <style>"` before the
    /// bare family and finally the default face.
    pub fn resolve(
        &self,
        family: Option<&str>,
        style: FontStyle,
    ) -> Result<Arc<dyn Typeface>, FontError> {
        self.lookup(family, style).map(Arc::clone)
    }

    /// Borrowing variant of [`FontBook::resolve`].
    pub fn face(
        &self,
        family: Option<&str>,
        style: FontStyle,
    ) -> Result<&dyn Typeface, FontError> {
        self.lookup(family, style).map(|face| face.as_ref())
    }

    fn lookup(
        &self,
        family: Option<&str>,
        style: FontStyle,
    ) -> Result<&Arc<dyn Typeface>, FontError> {
        let family = family.or(self.default.as_deref());
        if let Some(family) = family {
            if let Some(suffix) = style.suffix() {
                if let Some(face) = self.faces.get(&format!("{family} {suffix}")) {
                    return Ok(face);
                }
            }
            if let Some(face) = self.faces.get(family) {
                return Ok(face);
            }
        }
        self.default
            .as_deref()
            .and_then(|name| self.faces.get(name))
            .ok_or_else(|| FontError::Unresolved(family.map(str::to_string)))
    }

    /// Resolve the face a field draws with, honouring the package default.
    pub fn for_field(
        &self,
        field: &Field,
        package_default: Option<&str>,
    ) -> Result<Arc<dyn Typeface>, FontError> {
        let family = field.font_family.as_deref().or(package_default);
        self.resolve(family, field.style)
    }
}
