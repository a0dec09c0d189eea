//! OPTIONS: result cap, ORDER, then COLUMNS projection.

use std::cmp::Ordering;

use super::result::{OutputRow, Row};
use crate::error::{InsightError, InsightResult};
use crate::query::{Direction, Options, Order};

/// Fails before sorting when `rows` exceeds `limit`.
pub fn finalize(mut rows: Vec<Row>, options: &Options, limit: usize) -> InsightResult<Vec<OutputRow>> {
	check_limit(rows.len(), limit)?;

	if let Some(order) = &options.order {
		sort_rows(&mut rows, order);
	}

	Ok(rows.iter().map(|row| row.project(&options.columns)).collect())
}

pub fn check_limit(rows: usize, limit: usize) -> InsightResult<()> {
	if rows > limit {
		return Err(InsightError::ResultTooLarge { rows, limit });
	}
	Ok(())
}

/// Stable sort; ties on every key keep input order.
pub fn sort_rows(rows: &mut [Row], order: &Order) {
	rows.sort_by(|a, b| {
		for key in &order.keys {
			let ord = match (a.get(key), b.get(key)) {
				(Some(x), Some(y)) => x.compare(y),
				(None, Some(_)) => Ordering::Less,
				(Some(_), None) => Ordering::Greater,
				(None, None) => Ordering::Equal,
			};
			if ord != Ordering::Equal {
				return match order.direction {
					Direction::Up => ord,
					Direction::Down => ord.reverse(),
				};
			}
		}
		Ordering::Equal
	});
}
