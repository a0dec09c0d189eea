//! Durable dataset persistence.

mod store;

pub use store::DatasetStore;
