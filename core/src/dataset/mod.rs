//! Dataset model: kinds, fields, records and the id rules shared by the
//! store and the query validator.

mod field;
mod record;
mod value;

pub use field::{DatasetKind, Field};
pub use record::{Record, Room, Section};
pub use value::Value;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{InsightError, InsightResult};

/// Separates the dataset id from the field name in a query key (`ubc_avg`).
pub const DELIMITER: char = '_';

/// Check a dataset id: non-empty, not all whitespace, no key delimiter.
pub fn validate_id(id: &str) -> InsightResult<()> {
    if id.trim().is_empty() {
        return Err(InsightError::invalid("dataset id must not be empty or whitespace"));
    }
    if id.contains(DELIMITER) {
        return Err(InsightError::invalid(format!(
            "dataset id '{}' must not contain '{}'",
            id, DELIMITER
        )));
    }
    Ok(())
}

/// A fully materialized dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub id: String,
    pub kind: DatasetKind,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn size(&self) -> usize {
        self.records.len()
    }

    pub fn info(&self) -> DatasetInfo {
        DatasetInfo {
            id: self.id.clone(),
            kind: self.kind,
            num_rows: self.records.len(),
        }
    }
}

/// Listing entry for a stored dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetInfo {
    pub id: String,
    pub kind: DatasetKind,
    pub num_rows: usize,
}

/// Records handed over by an ingestor, claimed to be of `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetContent {
    pub kind: DatasetKind,
    pub records: Vec<Record>,
}

impl DatasetContent {
    pub fn new(kind: DatasetKind, records: Vec<Record>) -> Self {
        Self { kind, records }
    }

    /// Drop records of the wrong kind and records repeating an earlier
    /// natural identifier. Fails if nothing is left.
    pub fn into_usable_records(self) -> InsightResult<Vec<Record>> {
        let total = self.records.len();
        let mut seen = HashSet::with_capacity(total);
        let mut usable = Vec::with_capacity(total);
        let mut wrong_kind = 0usize;
        let mut duplicates = 0usize;

        for record in self.records {
            if record.kind() != self.kind {
                wrong_kind += 1;
                continue;
            }
            if !seen.insert(record.natural_id().to_string()) {
                duplicates += 1;
                continue;
            }
            usable.push(record);
        }

        if wrong_kind > 0 || duplicates > 0 {
            warn!(
                kind = %self.kind,
                total,
                wrong_kind,
                duplicates,
                "Dropped unusable records"
            );
        }

        if usable.is_empty() {
            return Err(InsightError::invalid(format!(
                "content contains no usable {} records",
                self.kind
            )));
        }
        Ok(usable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::section;

    #[test]
    fn id_rules() {
        assert!(validate_id("ubc").is_ok());
        assert!(validate_id("my dataset").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id("   \t").is_err());
        assert!(validate_id("ubc_2020").is_err());
    }

    #[test]
    fn usable_records_drop_duplicates() {
        let content = DatasetContent::new(
            DatasetKind::Sections,
            vec![
                section("1", "cpsc", 70.0),
                section("1", "math", 80.0),
                section("2", "math", 80.0),
            ],
        );
        let records = content.into_usable_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text(Field::Dept), Some("cpsc"));
    }

    #[test]
    fn content_of_wrong_kind_is_unusable() {
        let content = DatasetContent::new(DatasetKind::Rooms, vec![section("1", "cpsc", 70.0)]);
        let err = content.into_usable_records().unwrap_err();
        assert_eq!(err.kind(), "invalid_request");

        let empty = DatasetContent::new(DatasetKind::Sections, vec![]);
        assert!(empty.into_usable_records().is_err());
    }

    #[test]
    fn info_serializes_num_rows() {
        let dataset = Dataset {
            id: "ubc".into(),
            kind: DatasetKind::Sections,
            records: vec![section("1", "cpsc", 70.0)],
        };
        let json = serde_json::to_value(dataset.info()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "ubc", "kind": "sections", "numRows": 1})
        );
    }
}
