use crate::field::CardSide;
use crate::records::Record;

/// Default output file name pattern.
pub const DEFAULT_FILE_NAME_TEMPLATE: &str = "{no}.png";

/// Expand `{name}` placeholders using `lookup`.
///
/// Unknown placeholders and unbalanced braces are kept verbatim.
pub fn expand<F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let key = &after[..close];
                match lookup(key) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Expand a calculated field value: `{no}` plus any column header.
pub fn expand_value(template: &str, record: &Record<'_>) -> String {
    expand(template, |key| match key {
        "no" => Some(record.no.to_string()),
        column => record.get(column).map(str::to_string),
    })
}

/// Output file naming for rendered cards.
///
/// Placeholders: `{no}` card number, `{side}` (`front`/`back`) and any CSV
/// column header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNameTemplate {
    pattern: String,
}

impl FileNameTemplate {
    pub fn new<S: Into<String>>(pattern: S) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// File name for one side of the card built from `record`.
    ///
    /// Without a `{side}` placeholder the rear image gets `_back` inserted
    /// before the extension so both faces can be written.
    pub fn render(&self, record: &Record<'_>, side: CardSide) -> String {
        let name = expand(&self.pattern, |key| match key {
            "no" => Some(record.no.to_string()),
            "side" => Some(side.file_label().to_string()),
            column => record.get(column).map(sanitize),
        });
        if side == CardSide::Rear && !self.pattern.contains("{side}") {
            return insert_suffix(&name, "_back");
        }
        name
    }
}

impl Default for FileNameTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_FILE_NAME_TEMPLATE)
    }
}

fn sanitize(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

fn insert_suffix(name: &str, suffix: &str) -> String {
    match name.rfind('.') {
        Some(dot) if dot > 0 => format!("{}{}{}", &name[..dot], suffix, &name[dot..]),
        _ => format!("{name}{suffix}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record<'a>(headers: &'a [String], values: &'a [String]) -> Record<'a> {
        Record::new(7, headers, values)
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn expands_known_and_keeps_unknown_placeholders() {
        let out = expand("{a}-{b}-{", |k| (k == "a").then(|| "x".to_string()));
        assert_eq!(out, "x-{b}-{");
    }

    #[test]
    fn file_names_use_number_side_and_columns() {
        let headers = strings(&["Name", "Set"]);
        let values = strings(&["Fire/Ice", "core"]);
        let rec = record(&headers, &values);
        let template = FileNameTemplate::new("{Set}_{no}_{side}_{Name}.png");
        assert_eq!(
            template.render(&rec, CardSide::Front),
            "core_7_front_Fire_Ice.png"
        );
        assert_eq!(
            template.render(&rec, CardSide::Rear),
            "core_7_back_Fire_Ice.png"
        );
    }

    #[test]
    fn rear_gets_suffix_without_side_placeholder() {
        let headers = strings(&[]);
        let values = strings(&[]);
        let rec = record(&headers, &values);
        let template = FileNameTemplate::default();
        assert_eq!(template.render(&rec, CardSide::Front), "7.png");
        assert_eq!(template.render(&rec, CardSide::Rear), "7_back.png");
    }

    #[test]
    fn calculated_values_read_columns() {
        let headers = strings(&["First", "Last"]);
        let values = strings(&["Ada", "Lovelace"]);
        let rec = record(&headers, &values);
        assert_eq!(
            expand_value("#{no} {Last}, {First}", &rec),
            "#7 Lovelace, Ada"
        );
    }
}
