// --- File: src/error.rs ---

//! Error type shared by every loader and by the dataset selector.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while selecting, listing or reading datasets.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("dataset `{0}` is not implemented")]
    NotImplemented(String),

    #[error("dataset `{dataset}` requires config field `{field}`")]
    MissingConfig {
        dataset: &'static str,
        field: &'static str,
    },

    #[error("index {index} out of bounds for dataset of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image decode error at {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("NIfTI read error at {path}: {source}")]
    Nifti {
        path: PathBuf,
        #[source]
        source: nifti::NiftiError,
    },

    #[error("NPZ read error at {path}: {source}")]
    Npz {
        path: PathBuf,
        #[source]
        source: ndarray_npy::ReadNpzError,
    },

    #[error("audio decode error at {path}: {source}")]
    Audio {
        path: PathBuf,
        #[source]
        source: symphonia::core::errors::Error,
    },

    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("invalid dataset layout at {path}: {msg}")]
    InvalidLayout { path: PathBuf, msg: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DataError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DataError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn layout(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        DataError::InvalidLayout {
            path: path.into(),
            msg: msg.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
