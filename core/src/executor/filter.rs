//! WHERE evaluation as set algebra over natural identifiers.

use std::collections::HashSet;

use crate::dataset::Record;
use crate::query::Filter;

/// Identifiers of the records in `records` that satisfy `filter`.
pub fn evaluate<'a>(filter: &Filter, records: &'a [Record]) -> HashSet<&'a str> {
	match filter {
		Filter::All => all_ids(records),
		Filter::Compare { op, field, value } => records
			.iter()
			.filter(|r| r.number(*field).is_some_and(|n| op.holds(n, *value)))
			.map(Record::natural_id)
			.collect(),
		Filter::Is { field, pattern } => records
			.iter()
			.filter(|r| r.text(*field).is_some_and(|s| pattern.matches(s)))
			.map(Record::natural_id)
			.collect(),
		Filter::Not(inner) => {
			let excluded = evaluate(inner, records);
			all_ids(records)
				.into_iter()
				.filter(|id| !excluded.contains(id))
				.collect()
		}
		Filter::And(children) => {
			let mut sets = children.iter().map(|child| evaluate(child, records));
			let first = sets.next().unwrap_or_default();
			sets.fold(first, |acc, set| {
				acc.into_iter().filter(|id| set.contains(id)).collect()
			})
		}
		Filter::Or(children) => children
			.iter()
			.flat_map(|child| evaluate(child, records))
			.collect(),
	}
}

/// Records satisfying `filter`, in stored order.
pub fn matching<'a>(filter: &Filter, records: &'a [Record]) -> Vec<&'a Record> {
	if *filter == Filter::All {
		return records.iter().collect();
	}
	let ids = evaluate(filter, records);
	records
		.iter()
		.filter(|r| ids.contains(r.natural_id()))
		.collect()
}

fn all_ids(records: &[Record]) -> HashSet<&str> {
	records.iter().map(Record::natural_id).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dataset::Field;
	use crate::query::{Comparator, Pattern};
	use crate::testing::{room, section, section_with};

	fn ids<'a>(set: &HashSet<&'a str>) -> Vec<&'a str> {
		let mut v: Vec<_> = set.iter().copied().collect();
		v.sort();
		v
	}

	fn gt(field: Field, value: f64) -> Filter {
		Filter::Compare {
			op: Comparator::Gt,
			field,
			value,
		}
	}

	fn is(field: Field, pattern: Pattern) -> Filter {
		Filter::Is { field, pattern }
	}

	fn records() -> Vec<Record> {
		vec![
			section_with("1", "cpsc", "310", "smith", 68.0),
			section_with("2", "cpsc", "110", "jones", 95.0),
			section_with("3", "math", "100", "", 70.0),
			section_with("4", "CPSC", "3100", "lee", 70.5),
		]
	}

	#[test]
	fn comparisons_are_exact() {
		let rs = records();
		assert_eq!(ids(&evaluate(&gt(Field::Avg, 69.0), &rs)), vec!["2", "3", "4"]);

		let eq = Filter::Compare {
			op: Comparator::Eq,
			field: Field::Avg,
			value: 70.0,
		};
		assert_eq!(ids(&evaluate(&eq, &rs)), vec!["3"]);

		let lt = Filter::Compare {
			op: Comparator::Lt,
			field: Field::Avg,
			value: 68.0,
		};
		assert!(evaluate(&lt, &rs).is_empty());
	}

	#[test]
	fn wildcard_matching() {
		let rs = records();
		let all = is(Field::Instructor, Pattern::Contains("".into()));
		assert_eq!(evaluate(&all, &rs).len(), 4);

		let prefix = is(Field::Id, Pattern::Prefix("310".into()));
		assert_eq!(ids(&evaluate(&prefix, &rs)), vec!["1", "4"]);

		let suffix = is(Field::Id, Pattern::Suffix("10".into()));
		assert_eq!(ids(&evaluate(&suffix, &rs)), vec!["1", "2"]);

		let exact = is(Field::Dept, Pattern::Exact("cpsc".into()));
		assert_eq!(ids(&evaluate(&exact, &rs)), vec!["1", "2"]);

		let contains = is(Field::Title, Pattern::Contains("CPSC".into()));
		assert_eq!(ids(&evaluate(&contains, &rs)), vec!["4"]);
	}

	#[test]
	fn set_algebra() {
		let rs = records();
		let f = gt(Field::Avg, 69.0);
		let g = is(Field::Dept, Pattern::Exact("cpsc".into()));
		let ef = evaluate(&f, &rs);
		let eg = evaluate(&g, &rs);

		let both: HashSet<&str> = ef.intersection(&eg).copied().collect();
		let and = evaluate(&Filter::And(vec![f.clone(), g.clone()]), &rs);
		assert_eq!(and, both);

		let either: HashSet<&str> = ef.union(&eg).copied().collect();
		let or = evaluate(&Filter::Or(vec![f.clone(), g.clone()]), &rs);
		assert_eq!(or, either);

		let rest: HashSet<&str> = all_ids(&rs).difference(&ef).copied().collect();
		let not = evaluate(&Filter::Not(Box::new(f.clone())), &rs);
		assert_eq!(not, rest);

		let double = evaluate(&Filter::Not(Box::new(Filter::Not(Box::new(f)))), &rs);
		assert_eq!(double, ef);
	}

	#[test]
	fn fields_of_another_kind_never_match() {
		let rs = vec![room("DMP", "110", 120.0, "Tables"), section("9", "cpsc", 80.0)];
		let seats = gt(Field::Seats, 100.0);
		assert_eq!(evaluate(&seats, &rs).len(), 1);
		let not_seats = Filter::Not(Box::new(seats));
		assert_eq!(ids(&evaluate(&not_seats, &rs)), vec!["9"]);
	}

	#[test]
	fn matching_keeps_stored_order() {
		let rs = records();
		let found: Vec<_> = matching(&gt(Field::Avg, 69.0), &rs)
			.into_iter()
			.map(Record::natural_id)
			.collect();
		assert_eq!(found, vec!["2", "3", "4"]);
		assert_eq!(matching(&Filter::All, &rs).len(), 4);
	}
}
