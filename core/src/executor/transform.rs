//! GROUP / APPLY.
//!
//! Groups are keyed structurally by the tuple of GROUP values, and SUM/AVG
//! accumulate in exact decimal so the result does not depend on record order.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

use super::result::Row;
use crate::dataset::{Field, Record, Value};
use crate::error::{InsightError, InsightResult};
use crate::query::{ApplyRule, ApplyToken, Transform};

/// Hashable form of a field value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyPart {
	Number(u64),
	Text(String),
}

impl KeyPart {
	fn of(record: &Record, field: Field) -> Option<KeyPart> {
		if field.is_numeric() {
			// -0.0 and 0.0 compare equal, so they must share a key
			let n = record.number(field)?;
			let n = if n == 0.0 { 0.0 } else { n };
			Some(KeyPart::Number(n.to_bits()))
		} else {
			record.text(field).map(|s| KeyPart::Text(s.to_string()))
		}
	}
}

/// One row per distinct GROUP tuple, in first-seen order.
pub fn transform(records: &[&Record], t: &Transform) -> InsightResult<Vec<Row>> {
	let mut index: HashMap<Vec<Option<KeyPart>>, usize> = HashMap::new();
	let mut groups: Vec<Vec<&Record>> = Vec::new();

	for &record in records {
		let key: Vec<_> = t.group.iter().map(|g| KeyPart::of(record, g.field)).collect();
		match index.get(&key) {
			Some(&i) => groups[i].push(record),
			None => {
				index.insert(key, groups.len());
				groups.push(vec![record]);
			}
		}
	}

	groups
		.iter()
		.map(|members| {
			let first = members[0];
			let mut row = Row::new();
			for g in &t.group {
				if let Some(value) = first.value(g.field) {
					row.insert(g.key.clone(), value);
				}
			}
			for rule in &t.apply {
				row.insert(rule.key.clone(), Value::Number(aggregate(rule, members)?));
			}
			Ok(row)
		})
		.collect()
}

fn aggregate(rule: &ApplyRule, members: &[&Record]) -> InsightResult<f64> {
	let numbers = || members.iter().filter_map(|r| r.number(rule.field));

	match rule.token {
		ApplyToken::Max => Ok(numbers().fold(f64::NEG_INFINITY, f64::max)),
		ApplyToken::Min => Ok(numbers().fold(f64::INFINITY, f64::min)),
		ApplyToken::Sum => to_f64(round2(decimal_sum(numbers())?)),
		ApplyToken::Avg => {
			let sum = decimal_sum(numbers())?;
			let avg = sum
				.checked_div(Decimal::from(members.len()))
				.ok_or_else(|| InsightError::invalid(format!("{} overflowed", rule.key)))?;
			to_f64(round2(avg))
		}
		ApplyToken::Count => {
			let distinct: HashSet<_> = members
				.iter()
				.filter_map(|r| KeyPart::of(r, rule.field))
				.collect();
			Ok(distinct.len() as f64)
		}
	}
}

fn decimal_sum(mut numbers: impl Iterator<Item = f64>) -> InsightResult<Decimal> {
	numbers.try_fold(Decimal::ZERO, |acc, n| {
		acc.checked_add(to_decimal(n)?)
			.ok_or_else(|| InsightError::invalid("sum overflowed"))
	})
}

/// Decimal from the shortest round-trip text of `n`, so 0.1 stays 0.1.
fn to_decimal(n: f64) -> InsightResult<Decimal> {
	Decimal::from_str(&n.to_string())
		.ok()
		.or_else(|| Decimal::from_f64(n))
		.ok_or_else(|| InsightError::invalid(format!("{} cannot be aggregated exactly", n)))
}

fn round2(d: Decimal) -> Decimal {
	d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn to_f64(d: Decimal) -> InsightResult<f64> {
	d.to_f64()
		.ok_or_else(|| InsightError::invalid(format!("{} is out of range", d)))
}
