use std::path::Path;

use image::imageops::{FilterType, overlay};
use image::{DynamicImage, ImageResult, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect as PixelRect;
use log::trace;

use crate::field::{CardSide, Field, Rect};
use crate::font::Typeface;
use crate::layout::PlacedText;

const NAMEPLATE_SIZE: u32 = 12;
const GUIDE_INSET: i32 = 10;

/// Front and rear raster surfaces of one card.
#[derive(Debug, Clone)]
pub struct CardSurfaces {
    pub front: RgbaImage,
    pub rear: Option<RgbaImage>,
}

impl CardSurfaces {
    pub fn new(front: RgbaImage, rear: Option<RgbaImage>) -> Self {
        Self { front, rear }
    }

    /// White surfaces of the given size, used when no background is configured.
    pub fn blank(width: u32, height: u32, with_rear: bool) -> Self {
        let white = rgba(0xff, 0xff, 0xff, 0xff);
        Self {
            front: RgbaImage::from_pixel(width, height, white),
            rear: with_rear.then(|| RgbaImage::from_pixel(width, height, white)),
        }
    }

    pub fn side_mut(&mut self, side: CardSide) -> Option<&mut RgbaImage> {
        match side {
            CardSide::Front => Some(&mut self.front),
            CardSide::Rear => self.rear.as_mut(),
        }
    }
}

/// Load a background image as RGBA.
pub fn load_background(path: &Path) -> ImageResult<RgbaImage> {
    Ok(image::open(path)?.to_rgba8())
}

/// Paint a display list produced by the layout engine with a single face.
pub fn paint_text(surfaces: &mut CardSurfaces, placed: &[PlacedText], face: &dyn Typeface) {
    for run in placed {
        paint_run(surfaces, run, face);
    }
}

/// Paint one run onto the surface of its side, if that side exists.
pub fn paint_run(surfaces: &mut CardSurfaces, run: &PlacedText, face: &dyn Typeface) {
    let Some(surface) = surfaces.side_mut(run.side) else {
        trace!("no {} surface for field '{}'", run.side, run.field);
        return;
    };
    face.draw(
        surface,
        &run.text,
        run.x,
        run.baseline,
        run.size,
        Rgba(run.color),
    );
}

/// Scale `source` to fit inside `rect`, keeping its aspect ratio, and center it.
pub fn paint_image(surface: &mut RgbaImage, rect: &Rect, source: &DynamicImage) {
    if rect.width == 0 || rect.height == 0 {
        return;
    }
    let fitted = source
        .resize(rect.width, rect.height, FilterType::Triangle)
        .to_rgba8();
    let offset_x = rect.x + (rect.width as i32 - fitted.width() as i32) / 2;
    let offset_y = rect.y + (rect.height as i32 - fitted.height() as i32) / 2;
    overlay(surface, &fitted, offset_x as i64, offset_y as i64);
}

/// Draw a field's outline, nameplate and baseline guides for layout previews.
pub fn draw_field_outline(image: &mut RgbaImage, field: &Field, face: &dyn Typeface) {
    let rect = &field.rect;
    let color = Rgba(field.color);
    let name = field.display_name();

    let plate_width = (face.text_width(&name, NAMEPLATE_SIZE) + 4).max(1) as u32;
    let plate_height = (face.line_height(NAMEPLATE_SIZE) + 4).max(1) as u32;
    draw_filled_rect_mut(
        image,
        PixelRect::at(rect.x, rect.y).of_size(plate_width, plate_height),
        rgba(0x40, 0x40, 0x40, 0xff),
    );
    draw_hollow_rect_mut(
        image,
        PixelRect::at(rect.x, rect.y).of_size(rect.width.max(1), rect.height.max(1)),
        color,
    );
    face.draw(
        image,
        &name,
        rect.x + 2,
        rect.y + face.ascent(NAMEPLATE_SIZE),
        NAMEPLATE_SIZE,
        color,
    );

    let line_height = face.line_height(field.font_size).max(1);
    let ascent = face.ascent(field.font_size);
    let steps = (rect.height as i32 / line_height).max(1);
    let x_start = (rect.x + GUIDE_INSET) as f32;
    let x_end = (rect.right() - GUIDE_INSET) as f32;
    for i in 0..steps {
        let y = (rect.y + i * line_height + ascent) as f32;
        draw_line_segment_mut(
            image,
            (x_start, y),
            (x_end, y),
            rgba(0x80, 0x80, 0x80, 0xff),
        );
    }
}

pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Rgba<u8> {
    Rgba([r, g, b, a])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FontStyle;
    use crate::layout::FontMetrics;
    use pretty_assertions::assert_eq;

    /// Paints a solid box per run instead of glyphs.
    struct BoxFace;

    impl FontMetrics for BoxFace {
        fn text_width(&self, text: &str, _size: u32) -> i32 {
            text.chars().count() as i32 * 4
        }
        fn ascent(&self, size: u32) -> i32 {
            size as i32
        }
        fn line_height(&self, size: u32) -> i32 {
            size as i32 + 2
        }
    }

    impl Typeface for BoxFace {
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
            let width = self.text_width(text, size).max(1) as u32;
            draw_filled_rect_mut(
                image,
                PixelRect::at(x, baseline - size as i32).of_size(width, size),
                color,
            );
        }
    }

    fn run(side: CardSide, x: i32, baseline: i32) -> PlacedText {
        PlacedText {
            field: "f".into(),
            side,
            text: "ab".into(),
            x,
            baseline,
            size: 4,
            style: FontStyle::Plain,
            color: [0, 0, 0, 0xff],
        }
    }

    #[test]
    fn text_lands_on_the_selected_side() {
        let mut surfaces = CardSurfaces::blank(20, 20, true);
        paint_text(
            &mut surfaces,
            &[run(CardSide::Front, 2, 6), run(CardSide::Rear, 10, 16)],
            &BoxFace,
        );
        let black = rgba(0, 0, 0, 0xff);
        assert_eq!(*surfaces.front.get_pixel(3, 3), black);
        assert_eq!(*surfaces.front.get_pixel(11, 13), rgba(0xff, 0xff, 0xff, 0xff));
        let rear = surfaces.rear.as_ref().unwrap();
        assert_eq!(*rear.get_pixel(11, 13), black);
    }

    #[test]
    fn rear_runs_without_rear_surface_are_skipped() {
        let mut surfaces = CardSurfaces::blank(10, 10, false);
        paint_run(&mut surfaces, &run(CardSide::Rear, 0, 5), &BoxFace);
        assert!(surfaces.rear.is_none());
        assert!(surfaces.front.pixels().all(|p| p.0 == [0xff; 4]));
    }

    #[test]
    fn images_are_fitted_and_centered() {
        let mut surface = RgbaImage::from_pixel(40, 40, rgba(0xff, 0xff, 0xff, 0xff));
        let red = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 5, rgba(0xff, 0, 0, 0xff)));
        paint_image(&mut surface, &Rect::new(0, 0, 40, 40), &red);
        // 10x5 scales to 40x20, centered vertically.
        assert_eq!(*surface.get_pixel(20, 5), rgba(0xff, 0xff, 0xff, 0xff));
        assert_eq!(*surface.get_pixel(20, 20), rgba(0xff, 0, 0, 0xff));
        assert_eq!(*surface.get_pixel(20, 35), rgba(0xff, 0xff, 0xff, 0xff));
    }

    #[test]
    fn outline_marks_field_border() {
        let mut image = RgbaImage::from_pixel(100, 60, rgba(0xff, 0xff, 0xff, 0xff));
        let field = Field::new("title", (10, 10), (90, 50), CardSide::Front);
        draw_field_outline(&mut image, &field, &BoxFace);
        assert_eq!(*image.get_pixel(89, 49), Rgba(field.color));
    }
}
