//! Job files: everything needed to render a batch of cards.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::field::{Field, ValueSource};
use crate::font::{FontBook, FontError};
use crate::layout::LayoutOptions;
use crate::package::{FieldPackage, PackageError};
use crate::records::{CsvOptions, Record};
use crate::templates::{DEFAULT_FILE_NAME_TEMPLATE, FileNameTemplate, expand_value};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse job file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("invalid field layout: {0}")]
    Package(#[from] PackageError),
}

/// How many worker threads render rows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMode {
    /// All cores but one, at least one.
    #[default]
    CpuMinusOne,
    SingleThread,
    Custom(usize),
}

impl ProcessingMode {
    pub fn threads(&self) -> usize {
        match self {
            ProcessingMode::CpuMinusOne => num_cpus::get().saturating_sub(1).max(1),
            ProcessingMode::SingleThread => 1,
            ProcessingMode::Custom(n) => (*n).max(1),
        }
    }
}

/// Configuration of one rendering job, stored as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default = "default_file_name_template")]
    pub file_name_template: String,
    /// Font name to font file; `"<Family> Bold"` style names select styled faces.
    #[serde(default)]
    pub fonts: BTreeMap<String, PathBuf>,
    #[serde(default)]
    pub csv: CsvOptions,
    /// Field name to CSV column header.
    #[serde(default)]
    pub mapping: BTreeMap<String, String>,
    /// Column whose non-empty, non-false value selects the alternate rear.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_rear_column: Option<String>,
    /// Surface size used when the package has no front background.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_size: Option<[u32; 2]>,
    #[serde(default)]
    pub processing: ProcessingMode,
    #[serde(default)]
    pub layout: LayoutOptions,
    #[serde(default)]
    pub package: FieldPackage,
    #[serde(skip)]
    root: PathBuf,
}

fn default_file_name_template() -> String {
    DEFAULT_FILE_NAME_TEMPLATE.to_string()
}

impl Project {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            file_name_template: default_file_name_template(),
            fonts: BTreeMap::new(),
            csv: CsvOptions::default(),
            mapping: BTreeMap::new(),
            alternate_rear_column: None,
            card_size: None,
            processing: ProcessingMode::default(),
            layout: LayoutOptions::default(),
            package: FieldPackage::new(),
            root: PathBuf::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let text = fs::read_to_string(path).map_err(|source| ProjectError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut project: Project =
            serde_json::from_str(&text).map_err(|source| ProjectError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        project.package.normalize()?;
        project.root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(project)
    }

    /// Write the job file, keeping the previous version as a dot-file beside it.
    pub fn save(&self, path: &Path) -> Result<(), ProjectError> {
        let io_err = |source| ProjectError::Io {
            path: path.display().to_string(),
            source,
        };
        if path.exists() {
            if let Some(file_name) = path.file_name() {
                let backup = path.with_file_name(format!(".{}", file_name.to_string_lossy()));
                fs::copy(path, backup).map_err(io_err)?;
            }
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ProjectError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        fs::write(path, json).map_err(io_err)
    }

    /// Directory relative paths in the job file are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn set_root<P: Into<PathBuf>>(&mut self, root: P) {
        self.root = root.into();
    }

    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn file_name_template(&self) -> FileNameTemplate {
        FileNameTemplate::new(self.file_name_template.clone())
    }

    /// Load every configured font file.
    pub fn load_fonts(&self) -> Result<FontBook, FontError> {
        let mut book = FontBook::new();
        for (name, path) in &self.fonts {
            let path = self.resolve_path(path);
            debug!("loading font '{}' from {}", name, path.display());
            book.load(name.clone(), &path)?;
        }
        if let Some(default) = &self.package.default_font {
            book.set_default(default.clone());
        }
        Ok(book)
    }

    pub fn add_mapping<F: Into<String>, C: Into<String>>(&mut self, field: F, column: C) {
        self.mapping.insert(field.into(), column.into());
    }

    pub fn column_for(&self, field: &Field) -> Option<&str> {
        self.mapping.get(&field.name).map(String::as_str)
    }

    /// Value a field shows for `record`; `None` for fields without a source.
    /// A mapped column missing from the row reads as empty.
    pub fn field_value(&self, field: &Field, record: &Record<'_>) -> Option<String> {
        match &field.source {
            ValueSource::Calculated(template) => Some(expand_value(template, record)),
            ValueSource::Mapped => self
                .column_for(field)
                .map(|column| record.get(column).unwrap_or("").to_string()),
        }
    }

    /// Fields whose mapping names a missing field or a column absent from
    /// `headers`. With `remove` set those mappings are dropped.
    pub fn verify_mapping(&mut self, headers: Option<&[String]>, remove: bool) -> Vec<String> {
        let invalid: Vec<String> = self
            .mapping
            .iter()
            .filter(|(field, column)| {
                self.package.get(field).is_none()
                    || headers.is_some_and(|h| !h.iter().any(|c| c == *column))
            })
            .map(|(field, _)| field.clone())
            .collect();
        if remove {
            for field in &invalid {
                self.mapping.remove(field);
            }
        }
        invalid
    }
}
