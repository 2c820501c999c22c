use super::LayoutOptions;

/// Split raw field text into paragraphs on the configured delimiter.
///
/// With `indented` set every paragraph, including the first, starts with the
/// tab marker.
pub fn split_into_paragraphs(text: &str, indented: bool, options: &LayoutOptions) -> Vec<String> {
    let delimiter = options.paragraph_delimiter.as_str();
    let pieces: Vec<&str> = if delimiter.is_empty() {
        vec![text]
    } else {
        text.split(delimiter).collect()
    };
    pieces
        .into_iter()
        .map(|p| {
            if indented {
                format!("{}{}", options.tab_marker, p)
            } else {
                p.to_string()
            }
        })
        .collect()
}
