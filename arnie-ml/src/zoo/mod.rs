//! Model zoo: the registry of tunable estimators.

pub mod registry;

pub use registry::{ModelEntry, ModelFactory, ModelRegistry};
