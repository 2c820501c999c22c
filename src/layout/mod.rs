//! Text layout for card fields.
//!
//! Text is split into paragraphs, wrapped to the field width, positioned
//! according to the field's alignment, and continued into linked fields once
//! a field runs out of vertical space. The engine never paints: it produces a
//! display list of [`PlacedText`] runs which the image layer draws.

mod chain;
mod justify;
mod paragraphs;
mod wrap;

pub use chain::{layout_chain, layout_chain_with};
pub use justify::{justify_line, start_baseline};
pub use paragraphs::split_into_paragraphs;
pub use wrap::{fit_font_size, wrap_paragraph};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::field::{CardSide, FontStyle};

/// Marker separating paragraphs in source text.
pub const PARAGRAPH_DELIMITER: &str = "-n-";
/// Marker for indents and mid-line tabs; never painted literally.
pub const TAB_MARKER: &str = "\t";
/// Stand-in used when measuring a tab marker.
pub const TAB_PLACEHOLDER: &str = "....";

/// Measures text for a single typeface at a given pixel size.
pub trait FontMetrics {
    /// Advance width of `text` in whole pixels.
    fn text_width(&self, text: &str, size: u32) -> i32;
    fn ascent(&self, size: u32) -> i32;
    /// Distance between consecutive baselines.
    fn line_height(&self, size: u32) -> i32;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("text in field '{field}' cannot be shrunk to fit {width}px")]
    FontCollapsed { field: String, width: u32 },
    #[error("overflow chain starting at '{head}' revisits field '{field}'")]
    CyclicChain { head: String, field: String },
}

/// Tunables shared by every field of a job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutOptions {
    pub paragraph_delimiter: String,
    pub tab_marker: String,
    pub tab_placeholder: String,
    /// Horizontal margin applied to left and right aligned lines.
    pub inset: i32,
    /// Gap between the field top and the first line's ascent.
    pub top_padding: i32,
    /// Below this share of the field width a justified line keeps single spaces.
    pub block_fill_ratio: f32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            paragraph_delimiter: PARAGRAPH_DELIMITER.to_string(),
            tab_marker: TAB_MARKER.to_string(),
            tab_placeholder: TAB_PLACEHOLDER.to_string(),
            inset: 0,
            top_padding: 2,
            block_fill_ratio: 0.60,
        }
    }
}

impl LayoutOptions {
    /// Width of `text` with tab markers measured as the placeholder.
    pub(crate) fn measure(&self, face: &dyn FontMetrics, text: &str, size: u32) -> i32 {
        if self.tab_marker.is_empty() || !text.contains(self.tab_marker.as_str()) {
            return face.text_width(text, size);
        }
        let expanded = text.replace(self.tab_marker.as_str(), &self.tab_placeholder);
        face.text_width(&expanded, size)
    }

    pub(crate) fn tab_width(&self, face: &dyn FontMetrics, size: u32) -> i32 {
        face.text_width(&self.tab_placeholder, size)
    }
}

/// One run of text positioned on a card face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedText {
    pub field: String,
    pub side: CardSide,
    pub text: String,
    pub x: i32,
    /// Absolute baseline in surface pixels.
    pub baseline: i32,
    pub size: u32,
    /// Style of the field the run belongs to; the painter picks the face by it.
    pub style: FontStyle,
    pub color: [u8; 4],
}
