//! Console summary and Markdown changelog for a correction run.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use time::Date;

use crate::corrector::{AppliedCorrection, CorrectionReport};
use crate::difficulty::Shift;
use crate::{CorrectionError, Result};

pub const CHANGELOG_TITLE: &str = "# Exercise Difficulty Corrections Log";

const ABSENT: &str = "(none)";
const BANNER_WIDTH: usize = 80;
const RULE_WIDTH: usize = 60;

/// Applied corrections sharing the same old and new difficulty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftGroup<'a> {
    pub from: Option<&'a str>,
    pub to: &'a str,
    pub items: Vec<&'a AppliedCorrection>,
}

impl ShiftGroup<'_> {
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} → {}", self.from.unwrap_or(ABSENT), self.to)
    }

    #[must_use]
    pub fn shift(&self) -> Shift {
        Shift::between(self.from, self.to)
    }
}

/// Group by `(previous, new)`, ordered by group label. Items keep application order.
#[must_use]
pub fn group_by_shift(applied: &[AppliedCorrection]) -> Vec<ShiftGroup<'_>> {
    let mut groups = BTreeMap::<String, ShiftGroup<'_>>::new();
    for correction in applied {
        let from = correction.previous.as_deref();
        let to = correction.new.as_str();
        let label = format!("{} → {}", from.unwrap_or(ABSENT), to);
        groups
            .entry(label)
            .or_insert_with(|| ShiftGroup { from, to, items: Vec::new() })
            .items
            .push(correction);
    }
    groups.into_values().collect()
}

#[must_use]
pub fn render_summary(report: &CorrectionReport) -> String {
    let banner = "=".repeat(BANNER_WIDTH);
    let mut output = format!("\n{banner}\nDIFFICULTY CORRECTION SUMMARY\n{banner}\n\n");

    if report.applied.is_empty() {
        output.push_str("No exercises corrected.\n");
    } else {
        output.push_str(&format!("{} exercises corrected:\n", report.applied.len()));

        for group in group_by_shift(&report.applied) {
            output.push_str(&format!(
                "\n{} ({} exercises, {}):\n",
                group.label(),
                group.items.len(),
                group.shift().as_str()
            ));
            output.push_str(&"-".repeat(RULE_WIDTH));
            output.push('\n');
            for item in &group.items {
                output.push_str(&format!(
                    "  • {} ({})\n    Reason: {}\n",
                    item.name.as_deref().unwrap_or(ABSENT),
                    item.id,
                    item.rationale
                ));
            }
        }
    }

    if !report.mismatches.is_empty() {
        output.push_str(&format!(
            "\nWARNING: {} exercises did not hold the expected difficulty:\n",
            report.mismatches.len()
        ));
        for mismatch in &report.mismatches {
            output.push_str(&format!(
                "  • {} - expected {}, found {}\n",
                mismatch.id,
                mismatch.expected,
                mismatch.found.as_deref().unwrap_or(ABSENT)
            ));
        }
    }

    if !report.missing.is_empty() {
        output.push_str(&format!(
            "\nWARNING: {} exercises not found in the dataset:\n",
            report.missing.len()
        ));
        for id in &report.missing {
            output.push_str(&format!("  • {id}\n"));
        }
    }

    output.push_str(&format!("\n{banner}\n"));
    output
}

/// Markdown changelog with one section per applied correction.
#[must_use]
pub fn render_changelog(
    report: &CorrectionReport,
    based_on: Option<&str>,
    generated_on: Date,
) -> String {
    let mut output = format!("{CHANGELOG_TITLE}\n\n## Summary\n\n");
    output.push_str(&format!("- **Total corrections:** {}\n", report.applied.len()));
    output.push_str(&format!("- **Date:** {generated_on}\n"));
    if let Some(based_on) = based_on {
        output.push_str(&format!("- **Based on:** {based_on}\n"));
    }

    output.push_str("\n## Changes Applied\n\n");
    for correction in &report.applied {
        output.push_str(&format!(
            "### {} (`{}`)\n- **Old:** {}\n- **New:** {}\n- **Reason:** {}\n\n",
            correction.name.as_deref().unwrap_or(ABSENT),
            correction.id,
            correction.previous.as_deref().unwrap_or(ABSENT),
            correction.new,
            correction.rationale
        ));
    }

    if !report.missing.is_empty() {
        output.push_str("## Not Found\n\n");
        for id in &report.missing {
            output.push_str(&format!("- `{id}`\n"));
        }
        output.push('\n');
    }

    output
}

/// Render the changelog and overwrite `path` with it.
///
/// # Errors
/// Returns [`CorrectionError::Write`] when the file cannot be written.
pub fn write_changelog(
    path: &Path,
    report: &CorrectionReport,
    based_on: Option<&str>,
    generated_on: Date,
) -> Result<()> {
    fs::write(path, render_changelog(report, based_on, generated_on))
        .map_err(|source| CorrectionError::Write { path: path.to_path_buf(), source })
}
