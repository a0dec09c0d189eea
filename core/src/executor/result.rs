use crate::dataset::{Record, Value};
use crate::query::Column;

use std::collections::HashMap;

/// One output row: column key as written in the query mapped to its value.
pub type OutputRow = serde_json::Map<String, serde_json::Value>;

/// An intermediate row keyed by query keys (`ubc_avg`, or an APPLY key).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
	pub data: HashMap<String, Value>,
}

impl Row {
	pub fn new() -> Self {
		Self {
			data: HashMap::new(),
		}
	}

	/// Row holding the COLUMNS fields of a record.
	pub fn from_record(record: &Record, columns: &[Column]) -> Self {
		let mut row = Row::new();
		for column in columns {
			if let Column::Field { key, field } = column
				&& let Some(value) = record.value(*field)
			{
				row.insert(key.clone(), value);
			}
		}
		row
	}

	pub fn insert(&mut self, column: String, value: Value) {
		self.data.insert(column, value);
	}

	pub fn get(&self, column: &str) -> Option<&Value> {
		self.data.get(column)
	}

	/// Output object with exactly `columns`, in order.
	pub fn project(&self, columns: &[Column]) -> OutputRow {
		columns
			.iter()
			.map(|column| {
				let value = self
					.get(column.key())
					.map(Value::to_json)
					.unwrap_or(serde_json::Value::Null);
				(column.key().to_string(), value)
			})
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dataset::Field;
	use crate::testing::section;
	use serde_json::json;

	#[test]
	fn projection_keeps_column_order() {
		let columns = vec![
			Column::Field {
				key: "ubc_avg".into(),
				field: Field::Avg,
			},
			Column::Field {
				key: "ubc_dept".into(),
				field: Field::Dept,
			},
		];
		let row = Row::from_record(&section("1", "cpsc", 68.5), &columns);
		let out = row.project(&columns);

		let keys: Vec<_> = out.keys().cloned().collect();
		assert_eq!(keys, vec!["ubc_avg", "ubc_dept"]);
		assert_eq!(serde_json::Value::Object(out), json!({"ubc_avg": 68.5, "ubc_dept": "cpsc"}));
	}
}
