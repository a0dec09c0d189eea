//! Typed query tree produced by the validator.

use crate::dataset::{DatasetKind, Field};

/// A validated query bound to a single dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Dataset id taken from the field key prefixes
    pub dataset: String,
    /// Kind implied by the fields the query references
    pub kind: DatasetKind,
    pub filter: Filter,
    pub transform: Option<Transform>,
    pub options: Options,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Empty WHERE
    All,
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Compare {
        op: Comparator,
        field: Field,
        value: f64,
    },
    Is {
        field: Field,
        pattern: Pattern,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Lt,
    Gt,
    Eq,
}

impl Comparator {
    pub fn token(self) -> &'static str {
        match self {
            Comparator::Lt => "LT",
            Comparator::Gt => "GT",
            Comparator::Eq => "EQ",
        }
    }

    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparator::Lt => lhs < rhs,
            Comparator::Gt => lhs > rhs,
            Comparator::Eq => lhs == rhs,
        }
    }
}

/// IS pattern, classified by where its asterisks sit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// `abc`
    Exact(String),
    /// `abc*`
    Prefix(String),
    /// `*abc`
    Suffix(String),
    /// `*abc*`, including `*` and `**`
    Contains(String),
}

impl Pattern {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Pattern::Exact(p) => value == p,
            Pattern::Prefix(p) => value.starts_with(p.as_str()),
            Pattern::Suffix(p) => value.ends_with(p.as_str()),
            Pattern::Contains(p) => value.contains(p.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub group: Vec<GroupKey>,
    pub apply: Vec<ApplyRule>,
}

/// A GROUP entry: the key as written (`ubc_dept`) and the field it names.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupKey {
    pub key: String,
    pub field: Field,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApplyRule {
    pub key: String,
    pub token: ApplyToken,
    pub field: Field,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyToken {
    Max,
    Min,
    Avg,
    Sum,
    Count,
}

impl ApplyToken {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "MAX" => Some(ApplyToken::Max),
            "MIN" => Some(ApplyToken::Min),
            "AVG" => Some(ApplyToken::Avg),
            "SUM" => Some(ApplyToken::Sum),
            "COUNT" => Some(ApplyToken::Count),
            _ => None,
        }
    }

    /// COUNT works over any field; the rest need numbers.
    pub fn needs_numeric(self) -> bool {
        !matches!(self, ApplyToken::Count)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub columns: Vec<Column>,
    pub order: Option<Order>,
}

/// A COLUMNS entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Dataset-prefixed record field, e.g. `ubc_avg`
    Field { key: String, field: Field },
    /// APPLY key, only valid with TRANSFORMATIONS
    Apply { key: String },
}

impl Column {
    pub fn key(&self) -> &str {
        match self {
            Column::Field { key, .. } | Column::Apply { key } => key,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Sort keys in priority order. A bare string ORDER is `Up` with one key.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub direction: Direction,
    pub keys: Vec<String>,
}
