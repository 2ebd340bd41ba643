//! # Data Loading Module
//!
//! Datasets with a uniform sample contract: every `get` returns one
//! [`Sample`] whose single key is `imgs` (images, audio, manifold, video) or
//! `img` (volumes).
//!
//! ## Key Components
//!
//! - [`Dataset`]: Trait implemented by every dataset
//! - [`LabeledDataset`]: Drops labels from a [`LabeledSource`]
//! - [`RawTensorDataset`]: Slices a preloaded `[N, ...]` tensor
//! - [`Transform`]: Tensor transforms, plus the [`ImagePipeline`]
//!
//! ### Loaders
//! - [`ImageFolder`], [`CelebA`]: labeled images on disk
//! - [`SheppLoganDataset`]: T1/T2/FLAIR NIfTI volumes per subject
//! - [`LibriSpeech`]: fixed-length waveform windows
//! - [`Era5`]: temperature grids stored as `.npz`
//! - [`VideoFolderDataset`]: clips of consecutive frames
//!
//! ## Example
//!
//! ```ignore
//! use rusty_datasets::data::{Dataset, ImageFolder, ImagePipeline, LabeledDataset};
//!
//! let folder = ImageFolder::new("data/afhq-v2/train", ImagePipeline::square(512))?;
//! let dataset = LabeledDataset::new(folder);
//! let sample = dataset.get(0)?;
//! assert_eq!(sample.shape(), &[3, 512, 512]);
//! ```

pub mod audio;
pub mod dataset;
pub mod image_folder;
pub mod npz;
pub mod pooling;
pub mod transforms;
pub mod video;
pub mod volume;

pub use audio::{LibriSpeech, LibriSpeechOptions};
pub use dataset::{Dataset, LabeledDataset, LabeledSource, RawTensorDataset, Sample, SampleKey};
pub use image_folder::{CelebA, CelebASplit, ImageFolder, ImageFolderDataset};
pub use npz::{Era5, Era5Split};
pub use pooling::avg_pool3d;
pub use transforms::{min_max_scale, ImagePipeline, Transform};
pub use video::VideoFolderDataset;
pub use volume::SheppLoganDataset;
