//! Curated difficulty corrections for the exercise dataset.
//!
//! The crate loads the JSON exercise list, applies a [`CorrectionTable`] to the
//! `difficulty` field of matching records, and renders the console summary and
//! Markdown changelog for the run.

use std::path::PathBuf;

pub mod corrector;
pub mod dataset;
pub mod difficulty;
pub mod report;
pub mod table;

pub use corrector::{apply_corrections, AppliedCorrection, CorrectionReport, PriorMismatch};
pub use dataset::{load, save, Dataset, Record, DIFFICULTY_FIELD, ID_FIELD, NAME_FIELD};
pub use difficulty::{Difficulty, Shift};
pub use report::{
    group_by_shift, render_changelog, render_summary, write_changelog, ShiftGroup,
    CHANGELOG_TITLE,
};
pub use table::{CorrectionEntry, CorrectionTable};

#[derive(Debug, thiserror::Error)]
pub enum CorrectionError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid dataset JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid correction table: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid correction table: {0}")]
    InvalidTable(String),
}

pub type Result<T> = std::result::Result<T, CorrectionError>;
