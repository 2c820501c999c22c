use log::debug;

use super::{
    FontMetrics, LayoutError, LayoutOptions, PlacedText, fit_font_size, justify_line,
    split_into_paragraphs, start_baseline, wrap_paragraph,
};
use crate::field::Field;
use crate::package::FieldPackage;

enum FieldOutcome {
    Complete,
    /// Paragraphs left over once the field ran out of height.
    Overflow(Vec<String>),
}

/// Lay out `text` into `head` and, on overflow, into its linked successors,
/// measuring every field with the same `face`.
///
/// Text that still does not fit once the chain ends is dropped. A missing
/// value lays out as empty text.
pub fn layout_chain(
    package: &FieldPackage,
    head: &Field,
    text: Option<&str>,
    face: &dyn FontMetrics,
    options: &LayoutOptions,
) -> Result<Vec<PlacedText>, LayoutError> {
    layout_chain_with(package, head, text, |_| Ok(face), options)
}

/// Like [`layout_chain`], but `face_for` supplies the metrics of each field
/// in the chain, so a successor can be measured in its own style.
pub fn layout_chain_with<'f, F, E>(
    package: &FieldPackage,
    head: &Field,
    text: Option<&str>,
    mut face_for: F,
    options: &LayoutOptions,
) -> Result<Vec<PlacedText>, E>
where
    F: FnMut(&Field) -> Result<&'f dyn FontMetrics, E>,
    E: From<LayoutError>,
{
    let mut placed = Vec::new();
    let mut paragraphs = split_into_paragraphs(text.unwrap_or(""), head.indented, options);
    let mut visited = vec![head.name.as_str()];
    let mut field = head;
    loop {
        let face = face_for(field)?;
        let rest = match layout_field(field, &paragraphs, face, options, &mut placed)? {
            FieldOutcome::Complete => break,
            FieldOutcome::Overflow(rest) => rest,
        };
        let Some(next) = package.successor(field) else {
            debug!(
                "field '{}' is full, dropping {} paragraph(s)",
                field.name,
                rest.len()
            );
            break;
        };
        if visited.contains(&next.name.as_str()) {
            return Err(LayoutError::CyclicChain {
                head: head.name.clone(),
                field: next.name.clone(),
            }
            .into());
        }
        debug!(
            "field '{}' overflows {} paragraph(s) into '{}'",
            field.name,
            rest.len(),
            next.name
        );
        visited.push(next.name.as_str());
        field = next;
        paragraphs = rest;
    }
    Ok(placed)
}

fn layout_field(
    field: &Field,
    paragraphs: &[String],
    face: &dyn FontMetrics,
    options: &LayoutOptions,
    out: &mut Vec<PlacedText>,
) -> Result<FieldOutcome, LayoutError> {
    let rect = &field.rect;

    // Each paragraph is fitted before it is wrapped; a shrink carries over to
    // the paragraphs after it.
    let mut size = field.font_size;
    let mut blocks: Vec<(u32, Vec<String>)> = Vec::with_capacity(paragraphs.len());
    for paragraph in paragraphs {
        if field.resize_text {
            size = fit_font_size(
                &field.name,
                std::slice::from_ref(paragraph),
                face,
                size,
                rect.width,
                options,
            )?;
        }
        blocks.push((size, wrap_paragraph(paragraph, face, size, rect.width, options)));
    }

    let line_count = blocks.iter().map(|(_, lines)| lines.len()).sum();
    let first_size = blocks.first().map_or(field.font_size, |(size, _)| *size);
    let mut y = start_baseline(
        field.vertical_align,
        rect.height,
        line_count,
        face,
        first_size,
        options,
    );

    for (p, (size, lines)) in blocks.iter().enumerate() {
        let size = *size;
        let line_height = face.line_height(size);
        for (l, line) in lines.iter().enumerate() {
            for (text, x) in justify_line(line, field.horizontal_align, rect, face, size, options)
            {
                out.push(PlacedText {
                    field: field.name.clone(),
                    side: field.side,
                    text,
                    x,
                    baseline: rect.y + y,
                    size,
                    style: field.style,
                    color: field.text_color,
                });
            }
            y += line_height;
            if y > rect.height as i32 {
                let mut rest = Vec::new();
                let tail = lines[l + 1..].join(" ");
                if !tail.is_empty() {
                    rest.push(tail);
                }
                rest.extend(paragraphs[p + 1..].iter().cloned());
                if rest.is_empty() {
                    return Ok(FieldOutcome::Complete);
                }
                return Ok(FieldOutcome::Overflow(rest));
            }
        }
    }
    Ok(FieldOutcome::Complete)
}
