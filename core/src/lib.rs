//! Insight - embeddable query engine for course sections and campus rooms

pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod executor;
pub mod query;
pub mod storage;

#[cfg(test)]
mod testing;

pub use config::{Config, DEFAULT_MAX_RESULTS};
pub use dataset::{DatasetContent, DatasetInfo, DatasetKind, Field, Record, Room, Section, Value};
pub use engine::Engine;
pub use error::{InsightError, InsightResult};
pub use executor::{Executor, OutputRow};
pub use query::Query;
pub use storage::DatasetStore;
