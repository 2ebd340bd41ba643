// --- File: src/data/image_folder.rs ---

//! Labeled image sources read from disk: class-per-directory folders and the
//! CelebA aligned-face layout.

use super::dataset::{check_index, LabeledDataset, LabeledSource};
use super::transforms::ImagePipeline;
use crate::error::{DataError, Result};
use ndarray::ArrayD;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions recognized as images (compared case-insensitively).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "ppm", "bmp", "tif", "tiff", "webp"];

pub(crate) fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

pub(crate) fn load_image(path: &Path, pipeline: &ImagePipeline) -> Result<ArrayD<f32>> {
    let image = image::open(path).map_err(|source| DataError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(pipeline.apply(&image).into_dyn())
}

/// Sorted directory entries of `dir`, filtered by `keep`.
pub(crate) fn sorted_entries<F>(dir: &Path, keep: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&Path) -> bool,
{
    let entries = fs::read_dir(dir).map_err(|e| DataError::io(dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| DataError::io(dir, e))?.path();
        if keep(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Images laid out as `root/<class>/<image>`.
///
/// Classes are indexed in sorted order. Files inside each class directory are
/// walked recursively and sorted.
pub struct ImageFolder {
    root: PathBuf,
    samples: Vec<(PathBuf, usize)>,
    classes: Vec<String>,
    pipeline: ImagePipeline,
}

/// The labeled image folder with its label dropped, emitting `imgs`.
pub type ImageFolderDataset = LabeledDataset<ImageFolder>;

impl ImageFolder {
    /// Scans `root/<class>/` recursively. Classes and files are sorted.
    pub fn new<P: AsRef<Path>>(root: P, pipeline: ImagePipeline) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let class_dirs = sorted_entries(&root, |p| p.is_dir())?;

        let mut classes = Vec::with_capacity(class_dirs.len());
        let mut samples = Vec::new();
        for (class_idx, class_dir) in class_dirs.iter().enumerate() {
            let name = class_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            classes.push(name);

            let mut files = Vec::new();
            collect_images(class_dir, &mut files)?;
            files.sort();
            samples.extend(files.into_iter().map(|f| (f, class_idx)));
        }

        if samples.is_empty() {
            return Err(DataError::layout(&root, "no image files found in class folders"));
        }
        tracing::debug!(
            root = %root.display(),
            classes = classes.len(),
            images = samples.len(),
            "scanned image folder"
        );

        Ok(Self {
            root,
            samples,
            classes,
            pipeline,
        })
    }

    /// Directory the classes were read from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Class names in label order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Maps each class name to its label.
    pub fn class_to_idx(&self) -> HashMap<&str, usize> {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect()
    }

    /// `(path, label)` pairs in index order.
    pub fn samples(&self) -> &[(PathBuf, usize)] {
        &self.samples
    }
}

fn collect_images(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| DataError::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| DataError::io(dir, e))?.path();
        if path.is_dir() {
            collect_images(&path, out)?;
        } else if is_image_file(&path) {
            out.push(path);
        }
    }
    Ok(())
}

impl LabeledSource for ImageFolder {
    type Label = usize;

    fn len(&self) -> usize {
        self.samples.len()
    }

    fn get_pair(&self, index: usize) -> Result<(ArrayD<f32>, usize)> {
        check_index(index, self.samples.len())?;
        let (path, target) = &self.samples[index];
        Ok((load_image(path, &self.pipeline)?, *target))
    }
}

/// CelebA split, as listed in `list_eval_partition.txt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CelebASplit {
    Train,
    Valid,
    Test,
}

impl CelebASplit {
    fn partition_id(&self) -> u8 {
        match self {
            CelebASplit::Train => 0,
            CelebASplit::Valid => 1,
            CelebASplit::Test => 2,
        }
    }
}

/// Aligned CelebA faces under `root/celeba/`, labeled by their ±1 attributes.
pub struct CelebA {
    image_dir: PathBuf,
    filenames: Vec<String>,
    attributes: Vec<Vec<i8>>,
    attribute_names: Vec<String>,
    pipeline: ImagePipeline,
}

impl CelebA {
    /// Reads the partition and attribute tables under `root/celeba/`.
    pub fn new<P: AsRef<Path>>(
        root: P,
        split: CelebASplit,
        pipeline: ImagePipeline,
    ) -> Result<Self> {
        let base = root.as_ref().join("celeba");
        let partition_path = base.join("list_eval_partition.txt");
        let partition = fs::read_to_string(&partition_path)
            .map_err(|e| DataError::io(&partition_path, e))?;

        let mut filenames = Vec::new();
        for line in partition.lines().filter(|l| !l.trim().is_empty()) {
            let mut fields = line.split_whitespace();
            let (Some(name), Some(id)) = (fields.next(), fields.next()) else {
                let msg = format!("malformed line `{}`", line);
                return Err(DataError::layout(&partition_path, msg));
            };
            let id: u8 = id.parse().map_err(|_| {
                DataError::layout(&partition_path, format!("bad partition id in `{}`", line))
            })?;
            if id == split.partition_id() {
                filenames.push(name.to_string());
            }
        }

        let attr_path = base.join("list_attr_celeba.txt");
        let (attribute_names, mut by_name) = read_attributes(&attr_path)?;
        let mut attributes = Vec::with_capacity(filenames.len());
        for name in &filenames {
            let attrs = by_name.remove(name.as_str()).ok_or_else(|| {
                DataError::layout(&attr_path, format!("no attributes for {}", name))
            })?;
            attributes.push(attrs);
        }

        Ok(Self {
            image_dir: base.join("img_align_celeba"),
            filenames,
            attributes,
            attribute_names,
            pipeline,
        })
    }

    /// Attribute names in label order.
    pub fn attribute_names(&self) -> &[String] {
        &self.attribute_names
    }
}

type AttributeTable = (Vec<String>, HashMap<String, Vec<i8>>);

/// Parses the attribute table: a count line, a header line, then one row per image.
fn read_attributes(path: &Path) -> Result<AttributeTable> {
    let text = fs::read_to_string(path).map_err(|e| DataError::io(path, e))?;
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    lines.next();
    let names: Vec<String> = lines
        .next()
        .ok_or_else(|| DataError::layout(path, "missing attribute header"))?
        .split_whitespace()
        .map(str::to_string)
        .collect();

    let mut rows = HashMap::new();
    for line in lines {
        let mut fields = line.split_whitespace();
        let Some(name) = fields.next() else { continue };
        let values = fields
            .map(|v| v.parse::<i8>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| DataError::layout(path, format!("bad attribute row for {}", name)))?;
        if values.len() != names.len() {
            return Err(DataError::layout(
                path,
                format!("{} has {} attributes, expected {}", name, values.len(), names.len()),
            ));
        }
        rows.insert(name.to_string(), values);
    }
    Ok((names, rows))
}

impl LabeledSource for CelebA {
    type Label = Vec<i8>;

    fn len(&self) -> usize {
        self.filenames.len()
    }

    fn get_pair(&self, index: usize) -> Result<(ArrayD<f32>, Vec<i8>)> {
        check_index(index, self.filenames.len())?;
        let path = self.image_dir.join(&self.filenames[index]);
        Ok((load_image(&path, &self.pipeline)?, self.attributes[index].clone()))
    }
}
