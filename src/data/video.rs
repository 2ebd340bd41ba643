// --- File: src/data/video.rs ---

//! Video clips stored as directories of frame images, split by the UCF-101
//! train/test lists.

use super::dataset::{check_index, Dataset, Sample};
use super::image_folder::{is_image_file, load_image, sorted_entries};
use super::transforms::ImagePipeline;
use crate::error::{DataError, Result};
use ndarray::{Array3, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory holding the split lists, relative to the dataset root.
pub const SPLIT_LIST_DIR: &str = "ucfTrainTestlist";

/// Split-list fold read by [`VideoFolderDataset`].
pub const FOLD: u32 = 1;

/// Clips of `n_frames` consecutive frames, emitted as
/// `{imgs: (3, n_frames, resolution, resolution)}` with values in `[0, 1]`.
///
/// Each split-list entry `Class/v_name.avi` is read from the frame directory
/// `Class/v_name/`. The first frame of a clip is drawn from an RNG seeded by
/// `seed` and the sample index, so repeated reads return the same clip.
pub struct VideoFolderDataset {
    videos: Vec<PathBuf>,
    n_frames: usize,
    pipeline: ImagePipeline,
    seed: u64,
}

impl VideoFolderDataset {
    /// Reads the fold-1 train or test list under `root/ucfTrainTestlist/`.
    pub fn new<P: AsRef<Path>>(
        root: P,
        train: bool,
        resolution: u32,
        n_frames: usize,
        seed: u64,
    ) -> Result<Self> {
        let root = root.as_ref();
        let list_name = if train {
            format!("trainlist{:02}.txt", FOLD)
        } else {
            format!("testlist{:02}.txt", FOLD)
        };
        let list_path = root.join(SPLIT_LIST_DIR).join(list_name);
        let list = fs::read_to_string(&list_path).map_err(|e| DataError::io(&list_path, e))?;

        let videos: Vec<PathBuf> = list
            .lines()
            .filter_map(|line| line.split_whitespace().next())
            .map(|entry| root.join(entry).with_extension(""))
            .collect();
        tracing::debug!(
            list = %list_path.display(),
            videos = videos.len(),
            "read video split list"
        );

        Ok(Self {
            videos,
            n_frames,
            pipeline: ImagePipeline::square(resolution),
            seed,
        })
    }

    /// Frame directories in split-list order.
    pub fn videos(&self) -> &[PathBuf] {
        &self.videos
    }

    fn clip_start(&self, index: usize, total_frames: usize) -> usize {
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(index as u64));
        rng.random_range(0..=total_frames - self.n_frames)
    }
}

impl Dataset for VideoFolderDataset {
    fn len(&self) -> usize {
        self.videos.len()
    }

    fn get(&self, index: usize) -> Result<Sample> {
        check_index(index, self.videos.len())?;
        let video = &self.videos[index];
        let frames = sorted_entries(video, is_image_file)?;

        if frames.len() < self.n_frames {
            return Err(DataError::layout(
                video,
                format!("{} frames, clip needs {}", frames.len(), self.n_frames),
            ));
        }

        let start = self.clip_start(index, frames.len());
        let mut clip = Vec::with_capacity(self.n_frames);
        for frame in &frames[start..start + self.n_frames] {
            let tensor: Array3<f32> = load_image(frame, &self.pipeline)?.into_dimensionality()?;
            clip.push(tensor);
        }

        let views: Vec<_> = clip.iter().map(|f| f.view()).collect();
        let stacked = ndarray::stack(Axis(1), &views)?;
        Ok(Sample::imgs(stacked.into_dyn()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_video(root: &Path, name: &str, frames: usize) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        for i in 0..frames {
            let shade = (i * 20) as u8;
            RgbImage::from_pixel(12, 9, Rgb([shade, shade, shade]))
                .save(dir.join(format!("{:04}.png", i)))
                .unwrap();
        }
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let lists = dir.path().join(SPLIT_LIST_DIR);
        fs::create_dir_all(&lists).unwrap();
        fs::write(
            lists.join("trainlist01.txt"),
            "Archery/v_Archery_g01_c01.avi 3\nArchery/v_Archery_g02_c01.avi 3\n",
        ).unwrap();
        fs::write(lists.join("testlist01.txt"), "Archery/v_Archery_g03_c01.avi\n").unwrap();

        write_video(dir.path(), "Archery/v_Archery_g01_c01", 6);
        write_video(dir.path(), "Archery/v_Archery_g02_c01", 2);
        dir
    }

    #[test]
    fn test_clip_shape_and_determinism() {
        let dir = fixture();
        let dataset = VideoFolderDataset::new(dir.path(), true, 8, 4, 7).unwrap();
        assert_eq!(dataset.len(), 2);
        assert!(dataset.videos()[0].ends_with("Archery/v_Archery_g01_c01"));

        let first = dataset.get(0).unwrap();
        assert_eq!(first.shape(), &[3, 4, 8, 8]);
        assert!(first.tensor.iter().all(|&v| (0.0..=1.0).contains(&v)));

        let again = dataset.get(0).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn test_frames_are_consecutive() {
        let dir = fixture();
        let dataset = VideoFolderDataset::new(dir.path(), true, 4, 3, 11).unwrap();
        let clip = dataset.get(0).unwrap().tensor;

        let step = 20.0 / 255.0;
        for t in 1..3 {
            let diff = clip[[0, t, 1, 1]] - clip[[0, t - 1, 1, 1]];
            assert!((diff - step).abs() < 1e-3);
        }
    }

    #[test]
    fn test_short_video_and_missing_video_fail_on_get() {
        let dir = fixture();
        let train = VideoFolderDataset::new(dir.path(), true, 4, 4, 0).unwrap();
        assert!(matches!(train.get(1), Err(DataError::InvalidLayout { .. })));

        let test = VideoFolderDataset::new(dir.path(), false, 4, 4, 0).unwrap();
        assert_eq!(test.len(), 1);
        assert!(matches!(test.get(0), Err(DataError::Io { .. })));
    }
}
