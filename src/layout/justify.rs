use super::{FontMetrics, LayoutOptions};
use crate::field::{HorizontalAlign, Rect, VerticalAlign};

/// Position each word of `line` horizontally inside `rect`.
///
/// Returns the painted word text (tab markers stripped) with its absolute x.
pub fn justify_line(
    line: &str,
    align: HorizontalAlign,
    rect: &Rect,
    face: &dyn FontMetrics,
    size: u32,
    options: &LayoutOptions,
) -> Vec<(String, i32)> {
    let words: Vec<&str> = line.split(' ').collect();
    let width = rect.width as i32;
    let space = face.text_width(" ", size);
    let line_width = options.measure(face, line, size);

    let start = match align {
        HorizontalAlign::Left | HorizontalAlign::Block => options.inset,
        HorizontalAlign::Right => width - options.inset - line_width,
        HorizontalAlign::Center => (width - line_width) / 2,
    };

    let spacing = match align {
        HorizontalAlign::Block => block_spacing(&words, width, space, face, size, options),
        _ => space,
    };

    let marker = options.tab_marker.as_str();
    let tab_width = options.tab_width(face, size);
    let mut advance = 0;
    let mut placed = Vec::with_capacity(words.len());
    for (i, word) in words.iter().enumerate() {
        let tabbed = !marker.is_empty() && word.contains(marker);
        let text = if tabbed {
            word.replace(marker, "")
        } else {
            word.to_string()
        };
        let offset = if tabbed { tab_width } else { 0 };
        let x = rect.x + start + advance + i as i32 * spacing + offset;
        advance += face.text_width(&text, size) + offset;
        if !text.is_empty() {
            placed.push((text, x));
        }
    }
    placed
}

fn block_spacing(
    words: &[&str],
    width: i32,
    space: i32,
    face: &dyn FontMetrics,
    size: u32,
    options: &LayoutOptions,
) -> i32 {
    let count = words.len() as i32;
    let words_width = options.measure(face, &words.concat(), size);
    let natural = words_width + space * count;
    // Short lines (usually a paragraph's last) are not stretched.
    if (natural as f32) < width as f32 * options.block_fill_ratio {
        return space;
    }
    let gaps = if count > 1 { count - 1 } else { count.max(1) };
    (width - words_width) / gaps
}

/// Baseline of the first line relative to the field top.
///
/// `Bottom` is positioned like `Top`.
pub fn start_baseline(
    align: VerticalAlign,
    field_height: u32,
    line_count: usize,
    face: &dyn FontMetrics,
    size: u32,
    options: &LayoutOptions,
) -> i32 {
    let ascent = face.ascent(size);
    let top = ascent + options.top_padding;
    match align {
        VerticalAlign::Top | VerticalAlign::Bottom => top,
        VerticalAlign::Center => {
            let line_height = face.line_height(size);
            let mut y = (field_height as i32 - line_height) / 2 + ascent + options.top_padding;
            if line_count > 1 {
                y -= line_height * (line_count as i32 - 1) / 2;
            }
            if y < 0 { top } else { y }
        }
    }
}
