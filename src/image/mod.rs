//! Raster surfaces and painting helpers for card faces.

mod paint;

pub use paint::{
    CardSurfaces, draw_field_outline, load_background, paint_image, paint_run, paint_text, rgba,
};
