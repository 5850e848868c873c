use serde::Serialize;
use serde_json::Value;

use crate::dataset::{Dataset, Record, DIFFICULTY_FIELD, NAME_FIELD};
use crate::table::CorrectionTable;

#[derive(Debug, Clone, Serialize, Eq, PartialEq)]
pub struct AppliedCorrection {
    pub id: String,
    pub name: Option<String>,
    /// Difficulty observed on the record before the rewrite.
    pub previous: Option<String>,
    pub new: String,
    pub rationale: String,
}

/// A matched record whose difficulty was not the one the table expected.
#[derive(Debug, Clone, Serialize, Eq, PartialEq)]
pub struct PriorMismatch {
    pub id: String,
    pub expected: String,
    pub found: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Eq, PartialEq)]
pub struct CorrectionReport {
    pub applied: Vec<AppliedCorrection>,
    /// Table ids with no matching record, in table order.
    pub missing: Vec<String>,
    pub mismatches: Vec<PriorMismatch>,
}

/// Apply every table entry, in table order, to the first record carrying its id.
///
/// The target difficulty is written even when the record does not hold the
/// expected prior value. When several entries share an id the last one wins.
pub fn apply_corrections(dataset: &mut Dataset, table: &CorrectionTable) -> CorrectionReport {
    let mut report = CorrectionReport::default();

    for entry in table {
        let Some(record) = dataset.find_mut(&entry.id) else {
            tracing::warn!(id = %entry.id, "exercise not found in dataset");
            report.missing.push(entry.id.clone());
            continue;
        };

        let observed = record.get(DIFFICULTY_FIELD).and_then(Value::as_str);
        let previous = field_text(record, DIFFICULTY_FIELD);
        if observed != Some(entry.expected_prior.as_str()) {
            tracing::warn!(
                id = %entry.id,
                expected = %entry.expected_prior,
                found = previous.as_deref().unwrap_or("(none)"),
                "difficulty differs from the expected prior value"
            );
            report.mismatches.push(PriorMismatch {
                id: entry.id.clone(),
                expected: entry.expected_prior.clone(),
                found: previous.clone(),
            });
        }

        record.insert(DIFFICULTY_FIELD.to_string(), Value::String(entry.target.clone()));
        tracing::debug!(id = %entry.id, new = %entry.target, "difficulty corrected");

        report.applied.push(AppliedCorrection {
            id: entry.id.clone(),
            name: field_text(record, NAME_FIELD),
            previous,
            new: entry.target.clone(),
            rationale: entry.rationale.clone(),
        });
    }

    report
}

/// Display text of a field; `None` when the field is absent or null.
fn field_text(record: &Record, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::table::CorrectionEntry;

    fn dataset(value: &Value) -> Dataset {
        Dataset::parse(&value.to_string()).unwrap_or_else(|err| panic!("fixture dataset: {err}"))
    }

    fn difficulty_of<'a>(dataset: &'a Dataset, id: &str) -> Option<&'a str> {
        dataset.find(id).and_then(|record| record.get(DIFFICULTY_FIELD)).and_then(Value::as_str)
    }

    #[test]
    fn applies_matching_entry() {
        let mut data = dataset(&json!([{"id": "a", "name": "Foo", "difficulty": "NOVICE"}]));
        let table = CorrectionTable::new(vec![CorrectionEntry::new(
            "a",
            "NOVICE",
            "INTERMEDIATE",
            "r",
        )]);

        let report = apply_corrections(&mut data, &table);

        assert_eq!(difficulty_of(&data, "a"), Some("INTERMEDIATE"));
        assert_eq!(
            report.applied,
            vec![AppliedCorrection {
                id: "a".to_string(),
                name: Some("Foo".to_string()),
                previous: Some("NOVICE".to_string()),
                new: "INTERMEDIATE".to_string(),
                rationale: "r".to_string(),
            }]
        );
        assert!(report.missing.is_empty());
        assert!(report.mismatches.is_empty());
    }

    #[test]
    fn records_missing_ids_without_touching_dataset() {
        let mut data = dataset(&json!([{"id": "a", "name": "Foo", "difficulty": "NOVICE"}]));
        let before = data.clone();
        let table =
            CorrectionTable::new(vec![CorrectionEntry::new("z", "NOVICE", "EXPERT", "absent")]);

        let report = apply_corrections(&mut data, &table);

        assert_eq!(report.missing, vec!["z".to_string()]);
        assert!(report.applied.is_empty());
        assert_eq!(data, before);
    }

    #[test]
    fn mismatched_prior_still_overwrites() {
        let mut data = dataset(&json!([{"id": "a", "name": "Foo", "difficulty": "ADVANCED"}]));
        let table = CorrectionTable::new(vec![CorrectionEntry::new(
            "a",
            "NOVICE",
            "INTERMEDIATE",
            "r",
        )]);

        let report = apply_corrections(&mut data, &table);

        assert_eq!(difficulty_of(&data, "a"), Some("INTERMEDIATE"));
        assert_eq!(
            report.mismatches,
            vec![PriorMismatch {
                id: "a".to_string(),
                expected: "NOVICE".to_string(),
                found: Some("ADVANCED".to_string()),
            }]
        );
        assert_eq!(report.applied[0].previous.as_deref(), Some("ADVANCED"));
    }

    #[test]
    fn last_duplicate_table_entry_wins() {
        let mut data = dataset(&json!([{"id": "a", "name": "Foo", "difficulty": "NOVICE"}]));
        let table = CorrectionTable::new(vec![
            CorrectionEntry::new("a", "NOVICE", "ADVANCED", "first"),
            CorrectionEntry::new("a", "ADVANCED", "EXPERT", "second"),
        ]);

        let report = apply_corrections(&mut data, &table);

        assert_eq!(difficulty_of(&data, "a"), Some("EXPERT"));
        assert_eq!(report.applied.len(), 2);
        assert_eq!(report.applied[1].previous.as_deref(), Some("ADVANCED"));
        assert!(report.mismatches.is_empty());
    }

    #[test]
    fn only_first_record_with_duplicate_id_is_corrected() {
        let mut data = dataset(&json!([
            {"id": "a", "name": "first", "difficulty": "NOVICE"},
            {"id": "a", "name": "second", "difficulty": "NOVICE"}
        ]));
        let table =
            CorrectionTable::new(vec![CorrectionEntry::new("a", "NOVICE", "EXPERT", "r")]);

        let report = apply_corrections(&mut data, &table);

        assert_eq!(report.applied[0].name.as_deref(), Some("first"));
        assert_eq!(data.records()[0].get(DIFFICULTY_FIELD), Some(&json!("EXPERT")));
        assert_eq!(data.records()[1].get(DIFFICULTY_FIELD), Some(&json!("NOVICE")));
    }

    #[test]
    fn absent_difficulty_is_appended_and_reported_as_mismatch() {
        let mut data = dataset(&json!([{"id": "a", "name": "Foo"}]));
        let table =
            CorrectionTable::new(vec![CorrectionEntry::new("a", "NOVICE", "EXPERT", "r")]);

        let report = apply_corrections(&mut data, &table);

        let keys = data.records()[0].keys().map(String::as_str).collect::<Vec<_>>();
        assert_eq!(keys, vec!["id", "name", "difficulty"]);
        assert_eq!(report.applied[0].previous, None);
        assert_eq!(report.mismatches[0].found, None);
    }

    #[test]
    fn non_string_values_are_reported_as_text() {
        let mut data = dataset(&json!([{"id": "a", "name": 12, "difficulty": 3}]));
        let table = CorrectionTable::new(vec![CorrectionEntry::new("a", "3", "EXPERT", "r")]);

        let report = apply_corrections(&mut data, &table);

        assert_eq!(report.applied[0].name.as_deref(), Some("12"));
        assert_eq!(report.applied[0].previous.as_deref(), Some("3"));
        assert_eq!(report.mismatches.len(), 1, "number 3 is not the string \"3\"");
    }

    #[test]
    fn second_run_reaches_same_values_with_mismatch_warnings() {
        let mut data = dataset(&json!([
            {"id": "a", "name": "A", "difficulty": "EXPERT"},
            {"id": "b", "name": "B", "difficulty": "NOVICE"}
        ]));
        let table = CorrectionTable::new(vec![
            CorrectionEntry::new("a", "EXPERT", "INTERMEDIATE", "r"),
            CorrectionEntry::new("b", "NOVICE", "ADVANCED", "r"),
        ]);

        let first = apply_corrections(&mut data, &table);
        let after_first = data.clone();
        let second = apply_corrections(&mut data, &table);

        assert!(first.mismatches.is_empty());
        assert_eq!(data, after_first);
        assert_eq!(second.mismatches.len(), 2);
    }

    fn difficulty_label() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["NOVICE", "INTERMEDIATE", "ADVANCED", "EXPERT"])
            .prop_map(str::to_string)
    }

    fn fixture(
        difficulties: &[String],
        targets: &[(usize, String)],
    ) -> (Dataset, CorrectionTable) {
        let records = difficulties
            .iter()
            .enumerate()
            .map(|(index, difficulty)| {
                json!({
                    "id": format!("ex-{index}"),
                    "name": format!("Ejercicio número {index}"),
                    "difficulty": difficulty,
                    "xp": index * 10,
                    "tags": ["calistenia", format!("t{index}")]
                })
            })
            .collect::<Vec<_>>();
        let entries = targets
            .iter()
            .map(|(index, target)| {
                CorrectionEntry::new(format!("ex-{index}"), "NOVICE", target.clone(), "prop")
            })
            .collect();
        (dataset(&Value::Array(records)), CorrectionTable::new(entries))
    }

    proptest! {
        #[test]
        fn property_only_difficulty_changes_and_order_is_kept(
            difficulties in prop::collection::vec(difficulty_label(), 1..12),
            targets in prop::collection::vec((0_usize..16, difficulty_label()), 0..10),
        ) {
            let (mut data, table) = fixture(&difficulties, &targets);
            let before = data.clone();

            let report = apply_corrections(&mut data, &table);

            prop_assert_eq!(data.len(), before.len());
            for (after, original) in data.records().iter().zip(before.records()) {
                prop_assert_eq!(after.keys().collect::<Vec<_>>(), original.keys().collect::<Vec<_>>());
                for (key, value) in original {
                    if key != DIFFICULTY_FIELD {
                        prop_assert_eq!(after.get(key), Some(value));
                    }
                }
            }

            for entry in &table {
                let present = before.find(&entry.id).is_some();
                prop_assert_eq!(present, !report.missing.contains(&entry.id));
            }

            let mut expected = std::collections::BTreeMap::new();
            for entry in &table {
                if before.find(&entry.id).is_some() {
                    expected.insert(entry.id.clone(), entry.target.clone());
                }
            }
            for (id, target) in expected {
                prop_assert_eq!(difficulty_of(&data, &id), Some(target.as_str()));
            }
        }

        #[test]
        fn property_reapplying_is_idempotent(
            difficulties in prop::collection::vec(difficulty_label(), 1..12),
            targets in prop::collection::vec((0_usize..16, difficulty_label()), 0..10),
        ) {
            let (mut data, table) = fixture(&difficulties, &targets);

            apply_corrections(&mut data, &table);
            let once = data.clone();
            apply_corrections(&mut data, &table);

            prop_assert_eq!(data, once);
        }
    }
}
