use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::{CorrectionError, Result};

const BUILTIN_TABLE: &str = include_str!("../data/corrections.yaml");

/// One curated rewrite of a record's difficulty.
#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
pub struct CorrectionEntry {
    pub id: String,
    /// Value the record is expected to hold before the rewrite. A different
    /// value only triggers a warning.
    #[serde(rename = "expected", alias = "old")]
    pub expected_prior: String,
    #[serde(alias = "new")]
    pub target: String,
    #[serde(rename = "reason", alias = "rationale")]
    pub rationale: String,
}

impl CorrectionEntry {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        expected_prior: impl Into<String>,
        target: impl Into<String>,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            expected_prior: expected_prior.into(),
            target: target.into(),
            rationale: rationale.into(),
        }
    }
}

/// Ordered correction entries plus the reference they were derived from.
#[derive(Debug, Clone, Default, Deserialize, Eq, PartialEq)]
pub struct CorrectionTable {
    #[serde(default)]
    pub based_on: Option<String>,
    pub corrections: Vec<CorrectionEntry>,
}

impl CorrectionTable {
    #[must_use]
    pub fn new(corrections: Vec<CorrectionEntry>) -> Self {
        Self { based_on: None, corrections }
    }

    /// The table shipped with the crate.
    ///
    /// # Errors
    /// Returns an error only if the embedded resource is not a valid table.
    pub fn builtin() -> Result<Self> {
        Self::from_yaml_str(BUILTIN_TABLE)
    }

    /// Parse a table from YAML. JSON documents are accepted as well.
    ///
    /// # Errors
    /// Returns [`CorrectionError::Yaml`] for malformed input and
    /// [`CorrectionError::InvalidTable`] when an entry has a blank `id` or `target`.
    pub fn from_yaml_str(body: &str) -> Result<Self> {
        let table: Self = serde_yaml::from_str(body)?;
        table.validate()?;
        Ok(table)
    }

    /// Read and parse a table file.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read or does not hold a valid table.
    pub fn load(path: &Path) -> Result<Self> {
        let body = fs::read_to_string(path)
            .map_err(|source| CorrectionError::Read { path: path.to_path_buf(), source })?;
        Self::from_yaml_str(&body)
    }

    /// Reject entries that could never apply a meaningful rewrite.
    ///
    /// # Errors
    /// Returns [`CorrectionError::InvalidTable`] naming the first offending entry.
    pub fn validate(&self) -> Result<()> {
        for (index, entry) in self.corrections.iter().enumerate() {
            if entry.id.trim().is_empty() {
                return Err(CorrectionError::InvalidTable(format!(
                    "entry {index} has an empty id"
                )));
            }
            if entry.target.trim().is_empty() {
                return Err(CorrectionError::InvalidTable(format!(
                    "entry {index} ({}) has an empty target",
                    entry.id
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.corrections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.corrections.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CorrectionEntry> {
        self.corrections.iter()
    }

    /// Ids with more than one entry, sorted. The last of them wins when applied.
    #[must_use]
    pub fn duplicate_ids(&self) -> Vec<&str> {
        let mut counts = BTreeMap::<&str, usize>::new();
        for entry in &self.corrections {
            *counts.entry(entry.id.as_str()).or_default() += 1;
        }
        counts.into_iter().filter(|(_, count)| *count > 1).map(|(id, _)| id).collect()
    }
}

impl<'a> IntoIterator for &'a CorrectionTable {
    type Item = &'a CorrectionEntry;
    type IntoIter = std::slice::Iter<'a, CorrectionEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
