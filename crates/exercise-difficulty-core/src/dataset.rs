use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::{CorrectionError, Result};

pub const ID_FIELD: &str = "id";
pub const NAME_FIELD: &str = "name";
pub const DIFFICULTY_FIELD: &str = "difficulty";

/// One exercise object. Field order is kept as read.
pub type Record = Map<String, Value>;

/// The exercise list, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
    trailing_newline: bool,
}

impl Dataset {
    /// Parse a JSON array of objects.
    ///
    /// # Errors
    /// Returns [`CorrectionError::Json`] when the body is not valid JSON or is not
    /// an array whose elements are all objects.
    pub fn parse(body: &str) -> Result<Self> {
        let records: Vec<Record> = serde_json::from_str(body)?;
        Ok(Self { records, trailing_newline: body.ends_with('\n') })
    }

    /// Pretty-print with two-space indentation. Non-ASCII text is written as-is.
    ///
    /// # Errors
    /// Returns [`CorrectionError::Json`] if a value cannot be serialized.
    pub fn to_json_string(&self) -> Result<String> {
        let mut body = serde_json::to_string_pretty(&self.records)?;
        if self.trailing_newline {
            body.push('\n');
        }
        Ok(body)
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record whose `id` is the string `id`.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|record| record_id(record) == Some(id))
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Record> {
        self.records.iter_mut().find(|record| record_id(record) == Some(id))
    }

    /// String ids that occur on more than one record, sorted.
    #[must_use]
    pub fn duplicate_ids(&self) -> Vec<&str> {
        let mut counts = BTreeMap::<&str, usize>::new();
        for id in self.records.iter().filter_map(record_id) {
            *counts.entry(id).or_default() += 1;
        }
        counts.into_iter().filter(|(_, count)| *count > 1).map(|(id, _)| id).collect()
    }
}

fn record_id(record: &Record) -> Option<&str> {
    record.get(ID_FIELD).and_then(Value::as_str)
}

/// Read and parse the dataset file.
///
/// # Errors
/// Returns [`CorrectionError::Read`] when the file cannot be read and
/// [`CorrectionError::Json`] when it is not a JSON array of objects.
pub fn load(path: &Path) -> Result<Dataset> {
    let body = fs::read_to_string(path)
        .map_err(|source| CorrectionError::Read { path: path.to_path_buf(), source })?;
    Dataset::parse(&body)
}

/// Overwrite `path` with the serialized dataset.
///
/// # Errors
/// Returns [`CorrectionError::Write`] when the file cannot be written.
pub fn save(path: &Path, dataset: &Dataset) -> Result<()> {
    let body = dataset.to_json_string()?;
    fs::write(path, body)
        .map_err(|source| CorrectionError::Write { path: path.to_path_buf(), source })
}
