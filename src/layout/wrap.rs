use log::{debug, trace};

use super::{FontMetrics, LayoutError, LayoutOptions};

/// Break a paragraph into lines no wider than `max_width`.
///
/// Words are separated by single spaces; a word wider than the field keeps a
/// line of its own. Lines are trimmed of surrounding spaces and empty lines
/// are never produced.
pub fn wrap_paragraph(
    paragraph: &str,
    face: &dyn FontMetrics,
    size: u32,
    max_width: u32,
    options: &LayoutOptions,
) -> Vec<String> {
    let max_width = max_width as i32;
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in paragraph.split(' ') {
        if line.is_empty() {
            line.push_str(word);
            continue;
        }
        let candidate = format!("{line} {word}");
        if options.measure(face, &candidate, size) <= max_width {
            line = candidate;
        } else {
            push_line(&mut lines, &line);
            line = word.to_string();
        }
    }
    push_line(&mut lines, &line);
    for (no, line) in lines.iter().enumerate() {
        trace!("line {no}: {line:?}");
    }
    lines
}

fn push_line(lines: &mut Vec<String>, line: &str) {
    let line = line.trim_matches(' ');
    if !line.is_empty() {
        lines.push(line.to_string());
    }
}

/// Shrink `size` until every paragraph fits on a single line of `max_width`.
///
/// The shrink is sticky: once a paragraph forced a smaller size, later
/// paragraphs start from it.
pub fn fit_font_size(
    field: &str,
    paragraphs: &[String],
    face: &dyn FontMetrics,
    size: u32,
    max_width: u32,
    options: &LayoutOptions,
) -> Result<u32, LayoutError> {
    let mut size = size;
    for paragraph in paragraphs {
        while options.measure(face, paragraph, size) > max_width as i32 {
            if size <= 1 {
                return Err(LayoutError::FontCollapsed {
                    field: field.to_string(),
                    width: max_width,
                });
            }
            size -= 1;
        }
    }
    debug!("field '{field}' resized to {size}px");
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::testing::FixedFace;
    use pretty_assertions::assert_eq;

    #[test]
    fn short_paragraph_is_one_trimmed_line() {
        let face = FixedFace::new();
        let options = LayoutOptions::default();
        assert_eq!(
            wrap_paragraph(" Hello World ", &face, 20, 200, &options),
            vec!["Hello World"]
        );
    }

    #[test]
    fn width_boundary_is_inclusive() {
        let face = FixedFace::new().word("Hello", 40).word("World", 45).space(10);
        let options = LayoutOptions::default();
        assert_eq!(
            wrap_paragraph("Hello World", &face, 20, 95, &options),
            vec!["Hello World"]
        );
        assert_eq!(
            wrap_paragraph("Hello World", &face, 20, 94, &options),
            vec!["Hello", "World"]
        );
    }

    #[test]
    fn long_paragraph_breaks_on_words() {
        // 10px per char, 10px per space at size 20.
        let face = FixedFace::new();
        let options = LayoutOptions::default();
        let lines = wrap_paragraph("aaa bbb ccc ddd eee", &face, 20, 75, &options);
        assert_eq!(lines, vec!["aaa bbb", "ccc ddd", "eee"]);
    }

    #[test]
    fn oversized_first_word_gets_its_own_line() {
        let face = FixedFace::new();
        let options = LayoutOptions::default();
        let lines = wrap_paragraph("extraordinary a", &face, 20, 50, &options);
        assert_eq!(lines, vec!["extraordinary", "a"]);
    }

    #[test]
    fn tab_marker_is_measured_as_placeholder() {
        let face = FixedFace::new();
        let options = LayoutOptions::default();
        // "....ab cd" is 90px, so the tabbed line cannot take the second word.
        let lines = wrap_paragraph("\tab cd", &face, 20, 80, &options);
        assert_eq!(lines, vec!["\tab", "cd"]);
    }

    #[test]
    fn empty_paragraph_has_no_lines() {
        let face = FixedFace::new();
        let options = LayoutOptions::default();
        assert!(wrap_paragraph("", &face, 20, 100, &options).is_empty());
        assert!(wrap_paragraph("   ", &face, 20, 100, &options).is_empty());
    }

    #[test]
    fn wrapping_is_idempotent() {
        let face = FixedFace::new();
        let options = LayoutOptions::default();
        let text = "the quick brown fox jumps over the lazy dog";
        let first = wrap_paragraph(text, &face, 16, 90, &options);
        let second = wrap_paragraph(text, &face, 16, 90, &options);
        assert_eq!(first, second);
    }

    #[test]
    fn resize_shrinks_until_paragraph_fits() {
        let face = FixedFace::new();
        let options = LayoutOptions::default();
        // 10 chars at size/2 px each must fit in 60px: size 13 (13 / 2 = 6).
        let paragraphs = vec!["abcde fghi".to_string()];
        let size = fit_font_size("f", &paragraphs, &face, 20, 60, &options).unwrap();
        assert_eq!(size, 13);
        assert_eq!(
            wrap_paragraph(&paragraphs[0], &face, size, 60, &options),
            vec!["abcde fghi"]
        );
    }

    #[test]
    fn resize_runaway_is_an_error() {
        let face = FixedFace::new().word("wall", 500);
        let options = LayoutOptions::default();
        let paragraphs = vec!["wall".to_string()];
        assert_eq!(
            fit_font_size("title", &paragraphs, &face, 20, 100, &options),
            Err(LayoutError::FontCollapsed {
                field: "title".into(),
                width: 100
            })
        );
    }
}
