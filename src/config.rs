// --- File: src/config.rs ---

//! Caller-owned configuration read by the dataset selector.

use crate::error::{DataError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Options consulted while building datasets.
///
/// Only a few branches read anything besides `data_root`:
/// `imagenette2_320` reads `transfer`, `ucf101` reads `timesteps`,
/// `resolution` and `seed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory that holds every dataset subdirectory.
    pub data_root: PathBuf,
    /// Use the smaller 128px crop for transfer experiments.
    pub transfer: bool,
    /// Frames per video clip.
    pub timesteps: Option<usize>,
    /// Spatial size of video frames.
    pub resolution: Option<u32>,
    /// Seed for video clip sampling.
    pub seed: Option<u64>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data"),
            transfer: false,
            timesteps: None,
            resolution: None,
            seed: None,
        }
    }
}

impl DataConfig {
    /// Creates a config rooted at `data_root` with every option unset.
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            ..Self::default()
        }
    }

    /// Enables the transfer-learning resize (imagenette crops to 128).
    pub fn with_transfer(mut self, transfer: bool) -> Self {
        self.transfer = transfer;
        self
    }

    /// Frames per video clip.
    pub fn with_timesteps(mut self, timesteps: usize) -> Self {
        self.timesteps = Some(timesteps);
        self
    }

    /// Square frame size for video clips.
    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = Some(resolution);
        self
    }

    /// Seed for clip start sampling.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Reads a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| DataError::io(path, e))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Joins `parts` onto the data root.
    pub fn path<I, S>(&self, parts: I) -> PathBuf
    where
        I: IntoIterator<Item = S>,
        S: AsRef<Path>,
    {
        let mut path = self.data_root.clone();
        for part in parts {
            path.push(part);
        }
        path
    }
}
