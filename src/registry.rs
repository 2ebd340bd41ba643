// --- File: src/registry.rs ---

//! Dataset registry and selector.
//!
//! Every supported dataset name maps to a [`DatasetKind`]. A kind resolves
//! against a [`DataConfig`] into a [`RegistryEntry`] that carries the
//! modality metadata and the [`Recipe`] used to build its splits.
//!
//! ```no_run
//! use rusty_datasets::config::DataConfig;
//! use rusty_datasets::registry::get_dataset;
//!
//! let config = DataConfig::new("/mnt/data");
//! let splits = get_dataset(&config, "afhq")?;
//! println!("{} train samples, shape {:?}", splits.train.len(), splits.info.data_size);
//! # Ok::<(), rusty_datasets::error::DataError>(())
//! ```

use crate::config::DataConfig;
use crate::data::audio::LibriSpeech;
use crate::data::dataset::{Dataset, LabeledDataset};
use crate::data::image_folder::{CelebA, CelebASplit, ImageFolder};
use crate::data::npz::{load_text_split, Era5, Era5Split};
use crate::data::transforms::ImagePipeline;
use crate::data::video::VideoFolderDataset;
use crate::data::volume::SheppLoganDataset;
use crate::error::{DataError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Modality tag reported to model code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    #[serde(rename = "img")]
    Img,
    #[serde(rename = "img3d")]
    Img3d,
    #[serde(rename = "audio")]
    Audio,
    #[serde(rename = "manifold")]
    Manifold,
    #[serde(rename = "video")]
    Video,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Img => "img",
            DataType::Img3d => "img3d",
            DataType::Audio => "audio",
            DataType::Manifold => "manifold",
            DataType::Video => "video",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape and dimensionality metadata of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalityInfo {
    pub data_type: DataType,
    /// Coordinate dimensionality fed to coordinate-based models.
    pub dim_in: usize,
    /// Signal dimensionality produced per coordinate.
    pub dim_out: usize,
    /// Shape of one sample, without the batch axis.
    pub data_size: Vec<usize>,
}

impl ModalityInfo {
    fn new(data_type: DataType, dim_in: usize, dim_out: usize, data_size: &[usize]) -> Self {
        Self {
            data_type,
            dim_in,
            dim_out,
            data_size: data_size.to_vec(),
        }
    }
}

/// Every dataset the selector can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    CelebA,
    Imagenette2_320,
    Text,
    SheppLogan,
    CelebAHq1024,
    Afhq,
    LibriSpeech1,
    LibriSpeech3,
    Era5,
    Ucf101,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 10] = [
        DatasetKind::CelebA,
        DatasetKind::Imagenette2_320,
        DatasetKind::Text,
        DatasetKind::SheppLogan,
        DatasetKind::CelebAHq1024,
        DatasetKind::Afhq,
        DatasetKind::LibriSpeech1,
        DatasetKind::LibriSpeech3,
        DatasetKind::Era5,
        DatasetKind::Ucf101,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::CelebA => "celeba",
            DatasetKind::Imagenette2_320 => "imagenette2_320",
            DatasetKind::Text => "text",
            DatasetKind::SheppLogan => "shepp_logan",
            DatasetKind::CelebAHq1024 => "celebahq1024",
            DatasetKind::Afhq => "afhq",
            DatasetKind::LibriSpeech1 => "librispeech1",
            DatasetKind::LibriSpeech3 => "librispeech3",
            DatasetKind::Era5 => "era5",
            DatasetKind::Ucf101 => "ucf101",
        }
    }

    /// Resolves construction parameters and metadata for this dataset.
    ///
    /// Fails with [`DataError::MissingConfig`] when a required config field
    /// is unset.
    pub fn resolve(&self, config: &DataConfig) -> Result<RegistryEntry> {
        use DataType::*;

        let (info, recipe) = match self {
            DatasetKind::CelebA => (
                ModalityInfo::new(Img, 2, 3, &[3, 178, 178]),
                Recipe::CelebA {
                    pipeline: ImagePipeline::square(178),
                },
            ),
            DatasetKind::Imagenette2_320 => {
                let size = if config.transfer {
                    tracing::info!("transfer resize: cropping imagenette2_320 to 128");
                    128
                } else {
                    178
                };
                (
                    // data_size stays at 178 even for the transfer crop.
                    ModalityInfo::new(Img, 2, 3, &[3, 178, 178]),
                    Recipe::ImageFolder {
                        dir: "imagenette2-320",
                        train: "train",
                        test: "val",
                        pipeline: ImagePipeline::square(size),
                    },
                )
            }
            DatasetKind::Text => (
                ModalityInfo::new(Img, 2, 3, &[3, 178, 178]),
                Recipe::Text {
                    archive: "data_2d_text.npz",
                    train_key: "train_data.npy",
                    test_key: "test_data.npy",
                },
            ),
            DatasetKind::SheppLogan => (
                ModalityInfo::new(Img3d, 3, 3, &[3, 91, 109, 91]),
                Recipe::SheppLogan {
                    dir: "shepp_logan",
                    img_size: 128,
                },
            ),
            DatasetKind::CelebAHq1024 => (
                ModalityInfo::new(Img, 2, 3, &[3, 1024, 1024]),
                Recipe::ImageFolder {
                    dir: "CelebA-HQ-split",
                    train: "train",
                    test: "test",
                    pipeline: ImagePipeline::square(1024),
                },
            ),
            DatasetKind::Afhq => (
                ModalityInfo::new(Img, 2, 3, &[3, 512, 512]),
                Recipe::ImageFolder {
                    dir: "afhq-v2",
                    train: "train",
                    test: "test",
                    pipeline: ImagePipeline::square(512),
                },
            ),
            DatasetKind::LibriSpeech1 => (
                ModalityInfo::new(Audio, 1, 1, &[1, 16_000]),
                Recipe::LibriSpeech { num_secs: 1 },
            ),
            DatasetKind::LibriSpeech3 => (
                ModalityInfo::new(Audio, 1, 1, &[1, 48_000]),
                Recipe::LibriSpeech { num_secs: 3 },
            ),
            DatasetKind::Era5 => (
                ModalityInfo::new(Manifold, 3, 1, &[1, 46, 90]),
                Recipe::Era5 { dir: "era5" },
            ),
            DatasetKind::Ucf101 => {
                let name = self.as_str();
                let missing = |field| DataError::MissingConfig {
                    dataset: name,
                    field,
                };
                let n_frames = config.timesteps.ok_or_else(|| missing("timesteps"))?;
                let resolution = config.resolution.ok_or_else(|| missing("resolution"))?;
                let seed = config.seed.ok_or_else(|| missing("seed"))?;
                (
                    ModalityInfo::new(
                        Video,
                        3,
                        3,
                        &[3, n_frames, resolution as usize, resolution as usize],
                    ),
                    Recipe::VideoFolder {
                        dir: "UCF-101",
                        n_frames,
                        resolution,
                        seed,
                    },
                )
            }
        };

        Ok(RegistryEntry {
            kind: *self,
            info,
            recipe,
        })
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKind {
    type Err = DataError;

    fn from_str(name: &str) -> Result<Self> {
        DatasetKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| DataError::NotImplemented(name.to_string()))
    }
}

/// How to build a dataset's splits. Paths are relative to the data root.
#[derive(Debug, Clone, PartialEq)]
pub enum Recipe {
    CelebA {
        pipeline: ImagePipeline,
    },
    ImageFolder {
        dir: &'static str,
        train: &'static str,
        test: &'static str,
        pipeline: ImagePipeline,
    },
    Text {
        archive: &'static str,
        train_key: &'static str,
        test_key: &'static str,
    },
    SheppLogan {
        dir: &'static str,
        img_size: usize,
    },
    LibriSpeech {
        num_secs: usize,
    },
    Era5 {
        dir: &'static str,
    },
    VideoFolder {
        dir: &'static str,
        n_frames: usize,
        resolution: u32,
        seed: u64,
    },
}

fn shared<D: Dataset + 'static>(dataset: D) -> Arc<dyn Dataset> {
    Arc::new(dataset)
}

/// Raw output of a recipe before the validation fallback is applied.
pub struct BuiltSplits {
    pub train: Arc<dyn Dataset>,
    pub validation: Option<Arc<dyn Dataset>>,
    pub test: Arc<dyn Dataset>,
}

impl Recipe {
    /// Builds train and test splits. The explicit validation split is built
    /// only when `with_validation` is set and the dataset has one.
    pub fn build(&self, config: &DataConfig, with_validation: bool) -> Result<BuiltSplits> {
        let mut validation: Option<Arc<dyn Dataset>> = None;

        let (train, test): (Arc<dyn Dataset>, Arc<dyn Dataset>) = match self {
            Recipe::CelebA { pipeline } => (
                shared(LabeledDataset::new(CelebA::new(
                    &config.data_root,
                    CelebASplit::Train,
                    *pipeline,
                )?)),
                shared(LabeledDataset::new(CelebA::new(
                    &config.data_root,
                    CelebASplit::Test,
                    *pipeline,
                )?)),
            ),
            Recipe::ImageFolder {
                dir,
                train,
                test,
                pipeline,
            } => (
                shared(LabeledDataset::new(ImageFolder::new(
                    config.path([*dir, *train]),
                    *pipeline,
                )?)),
                shared(LabeledDataset::new(ImageFolder::new(
                    config.path([*dir, *test]),
                    *pipeline,
                )?)),
            ),
            Recipe::Text {
                archive,
                train_key,
                test_key,
            } => {
                let archive = config.path([*archive]);
                (
                    shared(load_text_split(&archive, train_key)?),
                    shared(load_text_split(&archive, test_key)?),
                )
            }
            Recipe::SheppLogan { dir, img_size } => (
                shared(SheppLoganDataset::new(config.path([*dir, "train"]), *img_size)?),
                shared(SheppLoganDataset::new(config.path([*dir, "test"]), *img_size)?),
            ),
            Recipe::LibriSpeech { num_secs } => (
                shared(LibriSpeech::new(
                    &config.data_root,
                    "train-clean-100",
                    Some(*num_secs),
                )?),
                shared(LibriSpeech::new(
                    &config.data_root,
                    "test-clean",
                    Some(*num_secs),
                )?),
            ),
            Recipe::Era5 { dir } => {
                let root = config.path([*dir]);
                if with_validation {
                    validation = Some(shared(Era5::new(&root, Era5Split::Val)?));
                }
                (
                    shared(Era5::new(&root, Era5Split::Train)?),
                    shared(Era5::new(&root, Era5Split::Test)?),
                )
            }
            Recipe::VideoFolder {
                dir,
                n_frames,
                resolution,
                seed,
            } => {
                let root = config.path([*dir]);
                (
                    shared(VideoFolderDataset::new(&root, true, *resolution, *n_frames, *seed)?),
                    shared(VideoFolderDataset::new(&root, false, *resolution, *n_frames, *seed)?),
                )
            }
        };

        Ok(BuiltSplits {
            train,
            validation,
            test,
        })
    }
}

/// A dataset name resolved against a config.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    pub kind: DatasetKind,
    pub info: ModalityInfo,
    pub recipe: Recipe,
}

/// Train and validation splits, plus the test split they were derived from.
///
/// When a dataset has no explicit validation split, `validation` and `test`
/// are the same shared object.
pub struct DatasetSplits {
    pub kind: DatasetKind,
    pub train: Arc<dyn Dataset>,
    pub validation: Arc<dyn Dataset>,
    pub test: Arc<dyn Dataset>,
    pub info: ModalityInfo,
}

impl DatasetSplits {
    /// True when `validation` is the test split itself, not a separate set.
    pub fn validation_is_test(&self) -> bool {
        same_dataset(&self.validation, &self.test)
    }
}

/// Result of the test-only selection path.
pub struct TestSplit {
    pub kind: DatasetKind,
    pub train: Arc<dyn Dataset>,
    pub test: Arc<dyn Dataset>,
    pub info: ModalityInfo,
}

/// True when both handles point at the same dataset object.
pub fn same_dataset(a: &Arc<dyn Dataset>, b: &Arc<dyn Dataset>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// Builds `(train, validation)` for `name`.
///
/// Datasets without an explicit validation split reuse the test split.
pub fn get_dataset(config: &DataConfig, name: &str) -> Result<DatasetSplits> {
    let entry = name.parse::<DatasetKind>()?.resolve(config)?;
    tracing::info!(
        dataset = entry.kind.as_str(),
        data_type = %entry.info.data_type,
        data_size = ?entry.info.data_size,
        "building dataset"
    );

    let built = entry.recipe.build(config, true)?;
    let validation = built
        .validation
        .unwrap_or_else(|| Arc::clone(&built.test));

    Ok(DatasetSplits {
        kind: entry.kind,
        train: built.train,
        validation,
        test: built.test,
        info: entry.info,
    })
}

/// Builds the test split for `name` without constructing a validation split.
pub fn get_test_dataset(config: &DataConfig, name: &str) -> Result<TestSplit> {
    let entry = name.parse::<DatasetKind>()?.resolve(config)?;
    tracing::info!(dataset = entry.kind.as_str(), "building test dataset");

    let built = entry.recipe.build(config, false)?;
    Ok(TestSplit {
        kind: entry.kind,
        train: built.train,
        test: built.test,
        info: entry.info,
    })
}
