//! Grammar validation for JSON queries.
//!
//! A single pass over the untyped value both checks the grammar and builds
//! the typed [`Query`]; the first violation found is returned.

use std::collections::HashSet;

use serde_json::{Map, Value};

use super::ast::*;
use crate::dataset::{DELIMITER, DatasetKind, Field};
use crate::error::{InsightError, InsightResult};

/// Validate `query` and return its typed form.
pub fn validate(query: &Value) -> InsightResult<Query> {
    Validator::default().validate(query)
}

/// Validate `query` and return only the dataset id it targets.
pub fn validate_dataset_name(query: &Value) -> InsightResult<String> {
    validate(query).map(|q| q.dataset)
}

/// Names and keys seen so far in one query.
#[derive(Debug, Default)]
struct KeyRegistry {
    /// Pinned by the first field key
    dataset: Option<(String, DatasetKind)>,
    group: Vec<GroupKey>,
    apply: HashSet<String>,
}

impl KeyRegistry {
    /// Resolve `<dataset>_<field>` and pin the dataset on first sight.
    fn field_key(&mut self, key: &str) -> InsightResult<Field> {
        let (name, field_name) = key
            .split_once(DELIMITER)
            .ok_or_else(|| InsightError::invalid(format!("invalid key '{}'", key)))?;

        if name.trim().is_empty() {
            return Err(InsightError::invalid(format!(
                "key '{}' has an empty dataset id",
                key
            )));
        }

        let field = Field::from_name(field_name).ok_or_else(|| {
            InsightError::invalid(format!("key '{}' names an unknown field", key))
        })?;

        match &self.dataset {
            None => {
                self.dataset = Some((name.to_string(), field.kind()));
            }
            Some((pinned, _)) if pinned != name => {
                return Err(InsightError::invalid(format!(
                    "query references multiple datasets: '{}' and '{}'",
                    pinned, name
                )));
            }
            Some((_, kind)) if *kind != field.kind() => {
                return Err(InsightError::invalid(format!(
                    "field '{}' does not belong to a {} dataset",
                    field, kind
                )));
            }
            Some(_) => {}
        }

        Ok(field)
    }

    fn add_apply_key(&mut self, key: &str) -> InsightResult<()> {
        if key.is_empty() {
            return Err(InsightError::invalid("APPLY key must not be empty"));
        }
        if key.contains(DELIMITER) {
            return Err(InsightError::invalid(format!(
                "APPLY key '{}' must not contain '{}'",
                key, DELIMITER
            )));
        }
        if self.group.iter().any(|g| g.key == key) || !self.apply.insert(key.to_string()) {
            return Err(InsightError::invalid(format!("duplicate APPLY key '{}'", key)));
        }
        Ok(())
    }

    /// COLUMNS entry under TRANSFORMATIONS: must be a GROUP or APPLY key.
    fn transformed_column(&self, key: &str) -> InsightResult<Column> {
        if let Some(g) = self.group.iter().find(|g| g.key == key) {
            return Ok(Column::Field {
                key: g.key.clone(),
                field: g.field,
            });
        }
        if self.apply.contains(key) {
            return Ok(Column::Apply {
                key: key.to_string(),
            });
        }
        Err(InsightError::invalid(format!(
            "COLUMNS key '{}' is neither a GROUP nor an APPLY key",
            key
        )))
    }
}

#[derive(Debug, Default)]
struct Validator {
    registry: KeyRegistry,
}

impl Validator {
    fn validate(mut self, query: &Value) -> InsightResult<Query> {
        let obj = as_object(query, "query")?;

        if let Some(key) = obj
            .keys()
            .find(|k| !matches!(k.as_str(), "WHERE" | "OPTIONS" | "TRANSFORMATIONS"))
        {
            return Err(InsightError::invalid(format!(
                "unexpected top-level key '{}'",
                key
            )));
        }

        let where_clause = obj
            .get("WHERE")
            .ok_or_else(|| InsightError::invalid("missing WHERE"))?;
        let options = obj
            .get("OPTIONS")
            .ok_or_else(|| InsightError::invalid("missing OPTIONS"))?;

        let filter = self.where_clause(where_clause)?;
        let transform = obj
            .get("TRANSFORMATIONS")
            .map(|t| self.transformations(t))
            .transpose()?;
        let options = self.options(options, transform.is_some())?;

        let (dataset, kind) = self
            .registry
            .dataset
            .ok_or_else(|| InsightError::invalid("query references no dataset"))?;

        Ok(Query {
            dataset,
            kind,
            filter,
            transform,
            options,
        })
    }

    fn where_clause(&mut self, value: &Value) -> InsightResult<Filter> {
        let obj = as_object(value, "WHERE")?;
        if obj.is_empty() {
            return Ok(Filter::All);
        }
        self.filter_node(obj)
    }

    fn filter(&mut self, value: &Value) -> InsightResult<Filter> {
        let obj = as_object(value, "filter")?;
        self.filter_node(obj)
    }

    fn filter_node(&mut self, obj: &Map<String, Value>) -> InsightResult<Filter> {
        let (key, body) = single_entry(obj, "filter")?;

        match key.as_str() {
            "AND" => Ok(Filter::And(self.logic(body, "AND")?)),
            "OR" => Ok(Filter::Or(self.logic(body, "OR")?)),
            "NOT" => Ok(Filter::Not(Box::new(self.filter(body)?))),
            "LT" => self.comparison(Comparator::Lt, body),
            "GT" => self.comparison(Comparator::Gt, body),
            "EQ" => self.comparison(Comparator::Eq, body),
            "IS" => self.is(body),
            other => Err(InsightError::invalid(format!(
                "invalid filter key '{}'",
                other
            ))),
        }
    }

    fn logic(&mut self, body: &Value, token: &str) -> InsightResult<Vec<Filter>> {
        let children = body
            .as_array()
            .ok_or_else(|| InsightError::invalid(format!("{} must be an array", token)))?;
        if children.is_empty() {
            return Err(InsightError::invalid(format!(
                "{} must be a non-empty array",
                token
            )));
        }
        children.iter().map(|child| self.filter(child)).collect()
    }

    fn comparison(&mut self, op: Comparator, body: &Value) -> InsightResult<Filter> {
        let obj = as_object(body, op.token())?;
        let (key, value) = single_entry(obj, op.token())?;

        let field = self.registry.field_key(key)?;
        if !field.is_numeric() {
            return Err(InsightError::invalid(format!(
                "{} needs a numeric field, got '{}'",
                op.token(),
                key
            )));
        }

        let value = value
            .as_f64()
            .ok_or_else(|| InsightError::invalid(format!("{} value must be a number", op.token())))?;

        Ok(Filter::Compare { op, field, value })
    }

    fn is(&mut self, body: &Value) -> InsightResult<Filter> {
        let obj = as_object(body, "IS")?;
        let (key, value) = single_entry(obj, "IS")?;

        let field = self.registry.field_key(key)?;
        if field.is_numeric() {
            return Err(InsightError::invalid(format!(
                "IS needs a string field, got '{}'",
                key
            )));
        }

        let pattern = value
            .as_str()
            .ok_or_else(|| InsightError::invalid("IS value must be a string"))?;

        Ok(Filter::Is {
            field,
            pattern: parse_pattern(pattern)?,
        })
    }

    fn transformations(&mut self, value: &Value) -> InsightResult<Transform> {
        let obj = as_object(value, "TRANSFORMATIONS")?;
        if obj.len() != 2 || !obj.contains_key("GROUP") || !obj.contains_key("APPLY") {
            return Err(InsightError::invalid(
                "TRANSFORMATIONS must contain exactly GROUP and APPLY",
            ));
        }

        let group = non_empty_strings(&obj["GROUP"], "GROUP")?;
        for key in group {
            let field = self.registry.field_key(key)?;
            self.registry.group.push(GroupKey {
                key: key.to_string(),
                field,
            });
        }

        let rules = obj["APPLY"]
            .as_array()
            .ok_or_else(|| InsightError::invalid("APPLY must be an array"))?;
        let apply = rules
            .iter()
            .map(|rule| self.apply_rule(rule))
            .collect::<InsightResult<Vec<_>>>()?;

        Ok(Transform {
            group: self.registry.group.clone(),
            apply,
        })
    }

    fn apply_rule(&mut self, rule: &Value) -> InsightResult<ApplyRule> {
        let obj = as_object(rule, "APPLY rule")?;
        let (key, body) = single_entry(obj, "APPLY rule")?;
        self.registry.add_apply_key(key)?;

        let body = as_object(body, "APPLY body")?;
        let (token, target) = single_entry(body, "APPLY body")?;
        let token = ApplyToken::parse(token)
            .ok_or_else(|| InsightError::invalid(format!("invalid APPLY token '{}'", token)))?;

        let target = target
            .as_str()
            .ok_or_else(|| InsightError::invalid("APPLY target must be a key string"))?;
        let field = self.registry.field_key(target)?;
        if token.needs_numeric() && !field.is_numeric() {
            return Err(InsightError::invalid(format!(
                "{:?} needs a numeric field, got '{}'",
                token, target
            )));
        }

        Ok(ApplyRule {
            key: key.clone(),
            token,
            field,
        })
    }

    fn options(&mut self, value: &Value, transformed: bool) -> InsightResult<Options> {
        let obj = as_object(value, "OPTIONS")?;

        if let Some(key) = obj.keys().find(|k| !matches!(k.as_str(), "COLUMNS" | "ORDER")) {
            return Err(InsightError::invalid(format!(
                "unexpected OPTIONS key '{}'",
                key
            )));
        }

        let keys = non_empty_strings(
            obj.get("COLUMNS")
                .ok_or_else(|| InsightError::invalid("missing COLUMNS"))?,
            "COLUMNS",
        )?;

        let columns = keys
            .into_iter()
            .map(|key| {
                if transformed {
                    self.registry.transformed_column(key)
                } else {
                    let field = self.registry.field_key(key)?;
                    Ok(Column::Field {
                        key: key.to_string(),
                        field,
                    })
                }
            })
            .collect::<InsightResult<Vec<_>>>()?;

        let order = obj
            .get("ORDER")
            .map(|order| parse_order(order, &columns))
            .transpose()?;

        Ok(Options { columns, order })
    }
}

fn parse_order(value: &Value, columns: &[Column]) -> InsightResult<Order> {
    let in_columns = |key: &str| -> InsightResult<String> {
        if columns.iter().any(|c| c.key() == key) {
            Ok(key.to_string())
        } else {
            Err(InsightError::invalid(format!(
                "ORDER key '{}' must be in COLUMNS",
                key
            )))
        }
    };

    if let Some(key) = value.as_str() {
        return Ok(Order {
            direction: Direction::Up,
            keys: vec![in_columns(key)?],
        });
    }

    let obj = value
        .as_object()
        .ok_or_else(|| InsightError::invalid("ORDER must be a string or an object"))?;

    let dir_key = if obj.contains_key("dir") { "dir" } else { "direction" };
    if obj.len() != 2 || !obj.contains_key(dir_key) || !obj.contains_key("keys") {
        return Err(InsightError::invalid("ORDER must contain exactly dir and keys"));
    }

    let direction = match obj[dir_key].as_str() {
        Some("UP") => Direction::Up,
        Some("DOWN") => Direction::Down,
        _ => return Err(InsightError::invalid("ORDER dir must be UP or DOWN")),
    };

    let keys = non_empty_strings(&obj["keys"], "ORDER keys")?
        .into_iter()
        .map(in_columns)
        .collect::<InsightResult<Vec<_>>>()?;

    Ok(Order { direction, keys })
}

/// Asterisks are allowed only as the first and/or last character.
fn parse_pattern(pattern: &str) -> InsightResult<Pattern> {
    let (leading, rest) = match pattern.strip_prefix('*') {
        Some(rest) => (true, rest),
        None => (false, pattern),
    };
    let (trailing, core) = match rest.strip_suffix('*') {
        Some(core) => (true, core),
        None => (false, rest),
    };

    if core.contains('*') {
        return Err(InsightError::invalid(format!(
            "invalid wildcard usage in '{}'",
            pattern
        )));
    }

    let core = core.to_string();
    Ok(match (leading, trailing) {
        (false, false) => Pattern::Exact(core),
        _ if core.is_empty() => Pattern::Contains(core),
        (true, false) => Pattern::Suffix(core),
        (false, true) => Pattern::Prefix(core),
        (true, true) => Pattern::Contains(core),
    })
}

fn as_object<'a>(value: &'a Value, what: &str) -> InsightResult<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| InsightError::invalid(format!("{} must be an object", what)))
}

fn single_entry<'a>(
    obj: &'a Map<String, Value>,
    what: &str,
) -> InsightResult<(&'a String, &'a Value)> {
    let mut entries = obj.iter();
    match (entries.next(), entries.next()) {
        (Some(entry), None) => Ok(entry),
        _ => Err(InsightError::invalid(format!(
            "{} must have exactly one key, found {}",
            what,
            obj.len()
        ))),
    }
}

fn non_empty_strings<'a>(value: &'a Value, what: &str) -> InsightResult<Vec<&'a str>> {
    let items = value
        .as_array()
        .ok_or_else(|| InsightError::invalid(format!("{} must be an array", what)))?;
    if items.is_empty() {
        return Err(InsightError::invalid(format!(
            "{} must be a non-empty array",
            what
        )));
    }
    items
        .iter()
        .map(|item| {
            item.as_str()
                .ok_or_else(|| InsightError::invalid(format!("{} entries must be strings", what)))
        })
        .collect()
}
