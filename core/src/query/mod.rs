//! Query language: the typed tree and the grammar validator that builds it.

pub mod ast;
mod validator;

pub use ast::{
    ApplyRule, ApplyToken, Column, Comparator, Direction, Filter, GroupKey, Options, Order,
    Pattern, Query, Transform,
};
pub use validator::{validate, validate_dataset_name};
