mod filter;
mod finalize;
mod result;
mod transform;

pub use filter::{evaluate, matching};
pub use finalize::{finalize, sort_rows};
pub use result::{OutputRow, Row};
pub use transform::transform;

use tracing::debug;

use crate::config::DEFAULT_MAX_RESULTS;
use crate::dataset::Record;
use crate::error::InsightResult;
use crate::query::Query;

/// Runs a validated query over a dataset's records.
pub struct Executor {
	max_results: usize,
}

impl Default for Executor {
	fn default() -> Self {
		Self::new(DEFAULT_MAX_RESULTS)
	}
}

impl Executor {
	pub fn new(max_results: usize) -> Self {
		Self { max_results }
	}

	/// WHERE, then TRANSFORMATIONS if present, then OPTIONS.
	pub fn execute(&self, query: &Query, records: &[Record]) -> InsightResult<Vec<OutputRow>> {
		let matched = matching(&query.filter, records);
		debug!(
			dataset = %query.dataset,
			scanned = records.len(),
			matched = matched.len(),
			"Filter evaluated"
		);

		let rows = match &query.transform {
			Some(t) => {
				let rows = transform(&matched, t)?;
				debug!(dataset = %query.dataset, groups = rows.len(), "Transformed");
				rows
			}
			None => {
				finalize::check_limit(matched.len(), self.max_results)?;
				matched
					.iter()
					.map(|record| Row::from_record(record, &query.options.columns))
					.collect()
			}
		};

		finalize(rows, &query.options, self.max_results)
	}
}
