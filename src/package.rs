//! Field packages: the ordered field table of a card plus its backgrounds.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::field::{CardSide, Field};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PackageError {
    #[error("a field named '{0}' already exists")]
    DuplicateName(String),
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("field '{0}' cannot be linked to itself")]
    SelfLink(String),
    #[error("linking '{from}' to '{to}' would create a cycle")]
    Cycle { from: String, to: String },
    #[error("field '{to}' already continues '{predecessor}'")]
    AlreadyLinked { to: String, predecessor: String },
}

/// Background images for each card face.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Backgrounds {
    #[serde(default)]
    pub front: Option<PathBuf>,
    #[serde(default)]
    pub rear: Option<PathBuf>,
    #[serde(default)]
    pub alternate_rear: Option<PathBuf>,
}

/// Ordered set of fields bound to front/rear background images.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FieldPackage {
    #[serde(default)]
    pub backgrounds: Backgrounds,
    /// Family used by fields without their own `font_family`.
    #[serde(default)]
    pub default_font: Option<String>,
    #[serde(default)]
    fields: Vec<Field>,
}

impl FieldPackage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a package from deserialized fields, checking names and links.
    pub fn from_fields(fields: Vec<Field>) -> Result<Self, PackageError> {
        let mut package = Self {
            fields,
            ..Self::default()
        };
        package.normalize()?;
        Ok(package)
    }

    /// Validate a package read from disk and refresh stored link depths.
    pub fn normalize(&mut self) -> Result<(), PackageError> {
        self.validate()?;
        self.recompute_depths();
        Ok(())
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    fn require(&self, name: &str) -> Result<&Field, PackageError> {
        self.get(name)
            .ok_or_else(|| PackageError::UnknownField(name.to_string()))
    }

    /// Fields painted on `side`, in package order.
    pub fn fields_for_side(&self, side: CardSide) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(move |f| f.side == side)
    }

    /// Fields whose value is derived from a template instead of a CSV column.
    pub fn calculated_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_calculated())
    }

    /// Overflow successor of `field`. A dangling link resolves to `None`.
    pub fn successor(&self, field: &Field) -> Option<&Field> {
        field.linked_field.as_deref().and_then(|name| self.get(name))
    }

    fn predecessor(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.linked_field.as_deref() == Some(name))
    }

    /// The overflow chain starting at `name`, head first.
    pub fn chain(&self, name: &str) -> Result<Vec<&Field>, PackageError> {
        let mut current = self.require(name)?;
        let mut chain = vec![current];
        while let Some(next) = self.successor(current) {
            if chain.iter().any(|f| f.name == next.name) {
                return Err(PackageError::Cycle {
                    from: current.name.clone(),
                    to: next.name.clone(),
                });
            }
            chain.push(next);
            current = next;
        }
        Ok(chain)
    }

    pub fn add(&mut self, field: Field) -> Result<(), PackageError> {
        if self.get(&field.name).is_some() {
            return Err(PackageError::DuplicateName(field.name));
        }
        let mut field = field;
        // Links are only established through `link`.
        field.linked_field = None;
        field.link_depth = 0;
        self.fields.push(field);
        Ok(())
    }

    /// Remove a field, splicing its successor (if any) onto its predecessor.
    pub fn remove(&mut self, name: &str) -> Result<Field, PackageError> {
        let idx = self
            .fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| PackageError::UnknownField(name.to_string()))?;
        let removed = self.fields.remove(idx);
        for field in &mut self.fields {
            if field.linked_field.as_deref() == Some(name) {
                field.linked_field = removed.linked_field.clone();
            }
        }
        self.recompute_depths();
        Ok(removed)
    }

    pub fn rename(&mut self, from: &str, to: &str) -> Result<(), PackageError> {
        if from == to {
            return self.require(from).map(|_| ());
        }
        if self.get(to).is_some() {
            return Err(PackageError::DuplicateName(to.to_string()));
        }
        let field = self
            .get_mut(from)
            .ok_or_else(|| PackageError::UnknownField(from.to_string()))?;
        field.name = to.to_string();
        for field in &mut self.fields {
            if field.linked_field.as_deref() == Some(from) {
                field.linked_field = Some(to.to_string());
            }
        }
        Ok(())
    }

    /// Append `to` at the tail of the chain that `from` belongs to.
    ///
    /// Linking a field that already has a successor extends its chain rather
    /// than replacing the link.
    pub fn link(&mut self, from: &str, to: &str) -> Result<(), PackageError> {
        if from == to {
            return Err(PackageError::SelfLink(from.to_string()));
        }
        self.require(to)?;
        let tail = self
            .chain(from)?
            .last()
            .map(|f| f.name.clone())
            .ok_or_else(|| PackageError::UnknownField(from.to_string()))?;
        if let Some(pred) = self.predecessor(to) {
            return Err(PackageError::AlreadyLinked {
                to: to.to_string(),
                predecessor: pred.name.clone(),
            });
        }
        if self.chain(to)?.iter().any(|f| f.name == tail) {
            return Err(PackageError::Cycle {
                from: tail,
                to: to.to_string(),
            });
        }
        if let Some(field) = self.get_mut(&tail) {
            field.linked_field = Some(to.to_string());
        }
        self.recompute_depths();
        Ok(())
    }

    /// Drop the outgoing link of `name`; its former successor becomes a chain head.
    pub fn unlink(&mut self, name: &str) -> Result<(), PackageError> {
        let field = self
            .get_mut(name)
            .ok_or_else(|| PackageError::UnknownField(name.to_string()))?;
        field.linked_field = None;
        self.recompute_depths();
        Ok(())
    }

    /// Check name uniqueness and that links form simple acyclic chains.
    pub fn validate(&self) -> Result<(), PackageError> {
        let mut names = HashSet::new();
        for field in &self.fields {
            if !names.insert(field.name.as_str()) {
                return Err(PackageError::DuplicateName(field.name.clone()));
            }
        }
        let mut targets = HashSet::new();
        for field in &self.fields {
            if let Some(to) = field.linked_field.as_deref() {
                if to == field.name {
                    return Err(PackageError::SelfLink(to.to_string()));
                }
                if !targets.insert(to) {
                    let predecessor = self
                        .predecessor(to)
                        .map(|f| f.name.clone())
                        .unwrap_or_default();
                    return Err(PackageError::AlreadyLinked {
                        to: to.to_string(),
                        predecessor,
                    });
                }
            }
        }
        for field in &self.fields {
            self.chain(&field.name)?;
        }
        Ok(())
    }

    fn recompute_depths(&mut self) {
        let depths: Vec<(String, u32)> = self
            .fields
            .iter()
            .filter(|f| self.predecessor(&f.name).is_none())
            .filter_map(|head| self.chain(&head.name).ok())
            .flat_map(|chain| {
                chain
                    .into_iter()
                    .enumerate()
                    .map(|(depth, f)| (f.name.clone(), depth as u32))
                    .collect::<Vec<_>>()
            })
            .collect();
        for (name, depth) in depths {
            if let Some(field) = self.get_mut(&name) {
                field.link_depth = depth;
            }
        }
    }
}
