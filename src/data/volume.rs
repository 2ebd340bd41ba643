// --- File: src/data/volume.rs ---

//! Multi-contrast MRI volumes (T1w, T2w, FLAIR) stored one subject per
//! directory as gzipped NIfTI files.

use super::dataset::{check_index, Dataset, Sample};
use super::pooling::avg_pool3d;
use super::transforms::{min_max_scale, Transform, MIN_MAX_EPS};
use crate::error::{DataError, Result};
use ndarray::{Array3, ArrayD, Axis, ShapeBuilder};
use nifti::{
    DataElement, InMemNiftiVolume, NiftiError, NiftiObject, NiftiType, NiftiVolume, ReaderOptions,
};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Scan files read for every subject, in channel order.
pub const MODALITY_FILES: [&str; 3] = ["T1w.nii.gz", "T2w.nii.gz", "FLAIR.nii.gz"];

/// Image size at which volumes are average-pooled by 2 on load.
pub const DOWNSAMPLE_SIZE: usize = 128;

/// Dataset of subjects, each yielding `{img: (1, 3, H, W, D)}`.
///
/// Channels are T1, T2, FLAIR. Each channel is min-max normalized on its own.
/// Volumes are read from disk on every `get`.
pub struct SheppLoganDataset {
    root_dir: PathBuf,
    subjects: Vec<OsString>,
    img_size: usize,
    transform: Option<Box<dyn Transform>>,
}

impl SheppLoganDataset {
    /// Lists subject directories under `root_dir` in sorted order.
    pub fn new<P: AsRef<Path>>(root_dir: P, img_size: usize) -> Result<Self> {
        let root_dir = root_dir.as_ref().to_path_buf();
        let entries = fs::read_dir(&root_dir).map_err(|e| DataError::io(&root_dir, e))?;

        let mut subjects = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DataError::io(&root_dir, e))?;
            subjects.push(entry.file_name());
        }
        subjects.sort();
        tracing::debug!(
            root = %root_dir.display(),
            subjects = subjects.len(),
            "listed volume subjects"
        );

        Ok(Self {
            root_dir,
            subjects,
            img_size,
            transform: None,
        })
    }

    /// Applies `transform` to every stacked `(1, 3, H, W, D)` tensor.
    pub fn with_transform<T: Transform + 'static>(mut self, transform: T) -> Self {
        self.transform = Some(Box::new(transform));
        self
    }

    /// Subject directory names, as listed on disk.
    pub fn subjects(&self) -> &[OsString] {
        &self.subjects
    }

    /// Whether volumes are pooled by 2 before normalization.
    pub fn downsamples(&self) -> bool {
        self.img_size == DOWNSAMPLE_SIZE
    }

    fn subject_dir(&self, index: usize) -> PathBuf {
        self.root_dir.join(&self.subjects[index])
    }
}

impl Dataset for SheppLoganDataset {
    fn len(&self) -> usize {
        self.subjects.len()
    }

    fn get(&self, index: usize) -> Result<Sample> {
        check_index(index, self.subjects.len())?;
        let subject = self.subject_dir(index);

        let mut volumes = Vec::with_capacity(MODALITY_FILES.len());
        for file in MODALITY_FILES {
            volumes.push(load_volume(&subject.join(file))?);
        }

        let mut stacked = stack_modalities(volumes, self.downsamples())?;
        if let Some(transform) = &self.transform {
            stacked = transform.apply(stacked);
        }
        Ok(Sample::img(stacked))
    }
}

/// Pools (optionally), normalizes and stacks volumes into `(1, C, H, W, D)`.
pub fn stack_modalities(volumes: Vec<Array3<f64>>, downsample: bool) -> Result<ArrayD<f32>> {
    let normalized: Vec<Array3<f64>> = volumes
        .into_iter()
        .map(|volume| {
            let volume = if downsample {
                avg_pool3d(&volume, 2, 2)
            } else {
                volume
            };
            min_max_scale(&volume, MIN_MAX_EPS)
        })
        .collect();

    let views: Vec<_> = normalized.iter().map(|v| v.view()).collect();
    let stacked = ndarray::stack(Axis(0), &views)?;
    Ok(stacked.mapv(|v| v as f32).insert_axis(Axis(0)).into_dyn())
}

/// Reads a 3D NIfTI volume as `f64` in `[x, y, z]` order.
///
/// Integer and float voxel types are widened to `f64`. When the header's
/// `scl_slope` is non-zero, values are rescaled to `slope * v + inter`.
/// Trailing singleton dimensions beyond the third are dropped.
pub fn load_volume(path: &Path) -> Result<Array3<f64>> {
    let nifti_err = |source| DataError::Nifti {
        path: path.to_path_buf(),
        source,
    };

    let object = ReaderOptions::new().read_file(path).map_err(nifti_err)?;
    let (slope, inter) = (object.header().scl_slope, object.header().scl_inter);
    let volume = object.into_volume();
    let dims: Vec<usize> = volume.dim().iter().map(|&d| d as usize).collect();

    if dims.len() < 3 || dims[3..].iter().any(|&d| d != 1) {
        return Err(DataError::layout(
            path,
            format!("expected a 3D volume, got dimensions {:?}", dims),
        ));
    }

    let mut data = widen_voxels(volume).map_err(nifti_err)?;
    if slope != 0.0 {
        let (slope, inter) = (f64::from(slope), f64::from(inter));
        data.iter_mut().for_each(|v| *v = slope * *v + inter);
    }
    // NIfTI stores voxels with the first axis varying fastest.
    let array = Array3::from_shape_vec((dims[0], dims[1], dims[2]).f(), data)?;
    Ok(array)
}

/// Reads voxels in their stored type and widens them to `f64`.
fn widen_voxels(volume: InMemNiftiVolume) -> nifti::Result<Vec<f64>> {
    fn typed<T: DataElement>(
        volume: InMemNiftiVolume,
        cast: fn(T) -> f64,
    ) -> nifti::Result<Vec<f64>> {
        let data = volume.into_nifti_typed_data::<T>()?;
        Ok(data.into_iter().map(cast).collect())
    }

    match volume.data_type() {
        NiftiType::Uint8 => typed::<u8>(volume, f64::from),
        NiftiType::Int8 => typed::<i8>(volume, f64::from),
        NiftiType::Uint16 => typed::<u16>(volume, f64::from),
        NiftiType::Int16 => typed::<i16>(volume, f64::from),
        NiftiType::Uint32 => typed::<u32>(volume, f64::from),
        NiftiType::Int32 => typed::<i32>(volume, f64::from),
        NiftiType::Uint64 => typed::<u64>(volume, |v| v as f64),
        NiftiType::Int64 => typed::<i64>(volume, |v| v as f64),
        NiftiType::Float32 => typed::<f32>(volume, f64::from),
        NiftiType::Float64 => typed::<f64>(volume, |v| v),
        other => Err(NiftiError::UnsupportedDataType(other)),
    }
}
