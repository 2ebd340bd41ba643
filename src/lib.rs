//! # rusty-datasets: dataset selection for generative modeling
//!
//! Builds train/validation/test datasets from a dataset name and reports the
//! modality metadata (`data_type`, `dim_in`, `dim_out`, `data_size`) that
//! coordinate-based models are configured from.
//!
//! ## Usage Example
//!
//! ```no_run
//! use rusty_datasets::config::DataConfig;
//! use rusty_datasets::registry::get_dataset;
//!
//! let config = DataConfig::new("/mnt/data");
//! let splits = get_dataset(&config, "shepp_logan")?;
//!
//! let sample = splits.train.get(0)?;
//! assert_eq!(sample.key.as_str(), "img");
//! assert_eq!(splits.info.data_size, vec![3, 91, 109, 91]);
//! # Ok::<(), rusty_datasets::error::DataError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod registry;

pub use config::DataConfig;
pub use error::{DataError, Result};
pub use registry::{
    get_dataset, get_test_dataset, DataType, DatasetKind, DatasetSplits, ModalityInfo, TestSplit,
};
