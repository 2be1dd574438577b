//! Data handling: loading, splitting, scaling.

pub mod source;
pub mod split;
pub mod table;
pub mod transform;

pub use source::{CsvSource, DataSource, DataSourceInfo, LoadedDataset};
pub use split::{Split, train_test_split};
pub use table::SampleTable;
pub use transform::StandardScaler;
