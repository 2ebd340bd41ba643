// --- File: src/data/npz.rs ---

//! Datasets stored as NumPy `.npz` archives: the preloaded 2D text glyph
//! images and the ERA5 temperature grids.

use super::dataset::{check_index, Dataset, RawTensorDataset, Sample};
use super::image_folder::sorted_entries;
use crate::error::{DataError, Result};
use ndarray::{Array, Array2, Array4, Dimension};
use ndarray_npy::{NpzReader, ReadNpzError};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Lower bound of ERA5 2m temperature (Kelvin) used for scaling.
pub const ERA5_T_MIN: f64 = 202.66;
/// Upper bound of ERA5 2m temperature (Kelvin) used for scaling.
pub const ERA5_T_MAX: f64 = 320.93;

fn open_npz(path: &Path) -> Result<NpzReader<File>> {
    let file = File::open(path).map_err(|e| DataError::io(path, e))?;
    NpzReader::new(file).map_err(|source| DataError::Npz {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves `key` against the archive entries, with or without `.npy`.
fn entry_name(npz: &mut NpzReader<File>, path: &Path, key: &str) -> Result<String> {
    let names = npz.names().map_err(|source| DataError::Npz {
        path: path.to_path_buf(),
        source,
    })?;
    let stem = key.strip_suffix(".npy").unwrap_or(key);
    let candidates = [key.to_string(), format!("{}.npy", stem), stem.to_string()];
    candidates
        .into_iter()
        .find(|c| names.contains(c))
        .ok_or_else(|| DataError::layout(path, format!("archive has no entry `{}`", key)))
}

/// Reads an entry stored as `u8`, `f32` or `f64` and widens it to `f64`.
pub fn read_float_array<D: Dimension>(path: &Path, key: &str) -> Result<Array<f64, D>> {
    let mut npz = open_npz(path)?;
    let name = entry_name(&mut npz, path, key)?;

    let attempt: std::result::Result<Array<f64, D>, ReadNpzError> = npz
        .by_name::<ndarray::OwnedRepr<f64>, D>(&name)
        .or_else(|_| {
            npz.by_name::<ndarray::OwnedRepr<f32>, D>(&name)
                .map(|a| a.mapv(f64::from))
        })
        .or_else(|_| {
            npz.by_name::<ndarray::OwnedRepr<u8>, D>(&name)
                .map(|a| a.mapv(f64::from))
        });

    attempt.map_err(|source| DataError::Npz {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads one NHWC split from the text archive as NCHW `f32` scaled by `1/255`.
pub fn load_text_split(archive: &Path, key: &str) -> Result<RawTensorDataset> {
    let nhwc: Array4<f64> = read_float_array(archive, key)?;
    let nchw = nhwc
        .permuted_axes([0, 3, 1, 2])
        .as_standard_layout()
        .mapv(|v| (v / 255.0) as f32);
    tracing::debug!(archive = %archive.display(), key, shape = ?nchw.shape(), "loaded text split");
    RawTensorDataset::new(nchw.into_dyn())
}

/// ERA5 split directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Era5Split {
    Train,
    Val,
    Test,
}

impl Era5Split {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Era5Split::Train => "train",
            Era5Split::Val => "val",
            Era5Split::Test => "test",
        }
    }
}

/// Global temperature grids, one `.npz` per timestamp, emitted as
/// `{imgs: (1, lat, lon)}`.
pub struct Era5 {
    files: Vec<PathBuf>,
    normalize: bool,
}

impl Era5 {
    /// Lists `root/<split>/*.npz` in sorted order.
    pub fn new<P: AsRef<Path>>(root: P, split: Era5Split) -> Result<Self> {
        let dir = root.as_ref().join(split.dir_name());
        let files = sorted_entries(&dir, |p| p.extension().is_some_and(|e| e == "npz"))?;
        tracing::debug!(dir = %dir.display(), files = files.len(), "listed ERA5 grids");
        Ok(Self {
            files,
            normalize: true,
        })
    }

    /// Keep temperatures in Kelvin instead of scaling to `[0, 1]`.
    pub fn without_normalize(mut self) -> Self {
        self.normalize = false;
        self
    }
}

impl Dataset for Era5 {
    fn len(&self) -> usize {
        self.files.len()
    }

    fn get(&self, index: usize) -> Result<Sample> {
        check_index(index, self.files.len())?;
        let mut temperature: Array2<f64> = read_float_array(&self.files[index], "temperature")?;
        if self.normalize {
            temperature.mapv_inplace(|t| (t - ERA5_T_MIN) / (ERA5_T_MAX - ERA5_T_MIN));
        }
        let grid = temperature.mapv(|t| t as f32).insert_axis(ndarray::Axis(0));
        Ok(Sample::imgs(grid.into_dyn()))
    }
}
