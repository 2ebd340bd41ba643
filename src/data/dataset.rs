// --- File: src/data/dataset.rs ---

//! The `Dataset` trait, the single-key `Sample` record and the two generic
//! wrappers that adapt underlying sources to it.

use crate::error::{DataError, Result};
use ndarray::{ArrayD, Axis};
use std::fmt;
use std::sync::Arc;

/// Key under which a sample's tensor is exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKey {
    /// `imgs`: images, audio, manifold and video samples.
    Imgs,
    /// `img`: volumetric samples.
    Img,
}

impl SampleKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleKey::Imgs => "imgs",
            SampleKey::Img => "img",
        }
    }
}

impl fmt::Display for SampleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record produced by a dataset: exactly one key mapped to one tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub key: SampleKey,
    pub tensor: ArrayD<f32>,
}

impl Sample {
    /// A sample keyed `imgs`.
    pub fn imgs(tensor: ArrayD<f32>) -> Self {
        Self {
            key: SampleKey::Imgs,
            tensor,
        }
    }

    /// A sample keyed `img` (volumes).
    pub fn img(tensor: ArrayD<f32>) -> Self {
        Self {
            key: SampleKey::Img,
            tensor,
        }
    }

    /// Shape of the tensor.
    pub fn shape(&self) -> &[usize] {
        self.tensor.shape()
    }

    /// Returns the tensor if `key` matches this sample's key.
    pub fn get(&self, key: &str) -> Option<&ArrayD<f32>> {
        (self.key.as_str() == key).then_some(&self.tensor)
    }

    /// Consumes the sample and returns its tensor.
    pub fn into_tensor(self) -> ArrayD<f32> {
        self.tensor
    }
}

/// An indexable source of samples.
///
/// Every sample a given dataset returns carries the same [`SampleKey`].
pub trait Dataset: Send + Sync {
    /// Number of samples.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Loads the sample at `index`. Reads happen here, not at construction.
    fn get(&self, index: usize) -> Result<Sample>;
}

impl<D: Dataset + ?Sized> Dataset for Arc<D> {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn get(&self, index: usize) -> Result<Sample> {
        (**self).get(index)
    }
}

impl<D: Dataset + ?Sized> Dataset for Box<D> {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn get(&self, index: usize) -> Result<Sample> {
        (**self).get(index)
    }
}

pub(crate) fn check_index(index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(DataError::IndexOutOfBounds { index, len });
    }
    Ok(())
}

/// Source that yields `(tensor, label)` pairs, such as a labeled image folder.
pub trait LabeledSource: Send + Sync {
    type Label;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_pair(&self, index: usize) -> Result<(ArrayD<f32>, Self::Label)>;
}

/// Wrapper over a [`LabeledSource`] that drops the label and emits `imgs`.
pub struct LabeledDataset<S: LabeledSource> {
    source: S,
}

impl<S: LabeledSource> LabeledDataset<S> {
    /// Wraps a labeled source.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// The wrapped source, labels included.
    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: LabeledSource> Dataset for LabeledDataset<S> {
    fn len(&self) -> usize {
        self.source.len()
    }

    fn get(&self, index: usize) -> Result<Sample> {
        check_index(index, self.source.len())?;
        let (tensor, _label) = self.source.get_pair(index)?;
        Ok(Sample::imgs(tensor))
    }
}

/// Wrapper over a preloaded `[N, ...]` tensor. Sample `i` is slice `i` of the
/// leading axis, emitted under `imgs`.
#[derive(Debug, Clone)]
pub struct RawTensorDataset {
    data: Arc<ArrayD<f32>>,
    num_samples: usize,
}

impl RawTensorDataset {
    /// Wraps `data`, whose leading axis enumerates samples.
    pub fn new(data: ArrayD<f32>) -> Result<Self> {
        if data.ndim() == 0 {
            return Err(DataError::Shape(ndarray::ShapeError::from_kind(
                ndarray::ErrorKind::IncompatibleShape,
            )));
        }
        let num_samples = data.shape()[0];
        Ok(Self {
            data: Arc::new(data),
            num_samples,
        })
    }

    /// Shape of one sample (without the leading axis).
    pub fn sample_shape(&self) -> Vec<usize> {
        self.data.shape()[1..].to_vec()
    }
}

impl Dataset for RawTensorDataset {
    fn len(&self) -> usize {
        self.num_samples
    }

    fn get(&self, index: usize) -> Result<Sample> {
        check_index(index, self.num_samples)?;
        let sample = self.data.index_axis(Axis(0), index).to_owned();
        Ok(Sample::imgs(sample))
    }
}
