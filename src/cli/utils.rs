//! Convenience helpers shared across command handlers.

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use cardforge::{FontBook, Project, Records};

/// Persist a string either to a file or stdout when `-` is provided.
pub fn write_output(path: &Path, content: &str) -> Result<()> {
    if path.as_os_str() == "-" {
        io::stdout().write_all(content.as_bytes())?;
        return Ok(());
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

/// Select CSV rows from a list such as `1..10,25,40..$` or `..3,7..`.
///
/// Rows are 1-based on the command line; the result holds sorted, unique
/// zero-based record indices. An open start means the first row and an open
/// end (or `$`) the last one.
pub fn select_rows(expr: &str, row_count: usize) -> Result<Vec<usize>> {
    if row_count == 0 {
        return Err(anyhow!("CSV has no data rows to select from"));
    }
    let mut rows = BTreeSet::new();
    for item in expr.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        let span = match item.split_once("..") {
            Some((from, to)) => {
                let first = row_number(from, 1, row_count)?;
                let last = row_number(to, row_count, row_count)?;
                first..=last
            }
            None => {
                let row = row_number(item, row_count, row_count)?;
                row..=row
            }
        };
        if span.is_empty() {
            return Err(anyhow!("row span '{}' runs backwards", item));
        }
        rows.extend(span.map(|row| row - 1));
    }
    if rows.is_empty() {
        return Err(anyhow!("no rows selected by '{}'", expr));
    }
    Ok(rows.into_iter().collect())
}

/// One 1-based row number; `open` stands in for an omitted bound.
fn row_number(token: &str, open: usize, row_count: usize) -> Result<usize> {
    let row = match token.trim() {
        "" => open,
        "$" => row_count,
        number => number
            .parse()
            .map_err(|_| anyhow!("'{}' is not a row number", number))?,
    };
    if !(1..=row_count).contains(&row) {
        return Err(anyhow!("row {} out of range 1..{}", row, row_count));
    }
    Ok(row)
}

/// Load a job file, attaching path context to any error.
pub fn load_project(path: &Path) -> Result<Project> {
    Project::load(path).with_context(|| format!("failed to load job {}", path.display()))
}

/// Read the CSV rows for a job using its dialect.
pub fn load_records(project: &Project, path: &Path) -> Result<Records> {
    Records::load(path, &project.csv)
        .with_context(|| format!("failed to read CSV {}", path.display()))
}

pub fn load_fonts(project: &Project) -> Result<FontBook> {
    project
        .load_fonts()
        .with_context(|| format!("failed to load fonts for job '{}'", project.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rows_come_back_sorted_and_unique() {
        assert_eq!(select_rows("5,1..2,2", 5).unwrap(), vec![0, 1, 4]);
        assert_eq!(select_rows("$,3", 5).unwrap(), vec![2, 4]);
    }

    #[test]
    fn open_bounds_reach_the_ends() {
        assert_eq!(select_rows("..2", 4).unwrap(), vec![0, 1]);
        assert_eq!(select_rows("3..", 4).unwrap(), vec![2, 3]);
        assert_eq!(select_rows("..", 3).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn bad_selections_are_rejected() {
        assert!(select_rows("4", 3).is_err());
        assert!(select_rows("0", 3).is_err());
        assert!(select_rows("3..1", 3).is_err());
        assert!(select_rows("x", 3).is_err());
        assert!(select_rows(" , ", 3).is_err());
        assert!(select_rows("1", 0).is_err());
    }
}
