// --- File: src/data/transforms.rs ---

//! Tensor transforms and the resize/center-crop image pipeline.

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use ndarray::{Array, Array3, ArrayD, Dimension};

/// Epsilon added to the value range by min-max scaling.
pub const MIN_MAX_EPS: f64 = 1e-5;

/// Tensor-to-tensor transform applied after a sample is assembled.
///
/// Implemented for any `Fn(ArrayD<f32>) -> ArrayD<f32>` closure.
pub trait Transform: Send + Sync {
    fn apply(&self, data: ArrayD<f32>) -> ArrayD<f32>;
}

impl<F> Transform for F
where
    F: Fn(ArrayD<f32>) -> ArrayD<f32> + Send + Sync,
{
    fn apply(&self, data: ArrayD<f32>) -> ArrayD<f32> {
        self(data)
    }
}

/// Rescales `x` to `[0, 1]` as `(x - min) / (max - min + eps)`.
///
/// A constant input maps to all zeros. An empty input is returned unchanged.
pub fn min_max_scale<D: Dimension>(x: &Array<f64, D>, eps: f64) -> Array<f64, D> {
    if x.is_empty() {
        return x.clone();
    }
    let min = x.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = x.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let denom = max - min + eps;
    x.mapv(|v| (v - min) / denom)
}

/// `Resize(resize) -> CenterCrop(crop) -> ToTensor` for RGB images.
///
/// `Resize` scales the shorter side to `resize` with bilinear filtering and
/// truncates the longer side. `ToTensor` yields CHW values in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImagePipeline {
    pub resize: u32,
    pub crop: u32,
}

impl ImagePipeline {
    /// Resize the shorter side to `resize`, then center-crop to `crop`.
    pub fn new(resize: u32, crop: u32) -> Self {
        Self { resize, crop }
    }

    /// Resize and crop to the same square size.
    pub fn square(size: u32) -> Self {
        Self::new(size, size)
    }

    /// Runs the pipeline, returning a `(3, crop, crop)` tensor in `[0, 1]`.
    pub fn apply(&self, image: &DynamicImage) -> Array3<f32> {
        let rgb = image.to_rgb8();
        let resized = resize_shorter_side(&rgb, self.resize);
        let cropped = center_crop(&resized, self.crop);
        to_tensor(&cropped)
    }
}

fn resize_shorter_side(image: &RgbImage, size: u32) -> RgbImage {
    let (w, h) = image.dimensions();
    let (new_w, new_h) = if w <= h {
        (size, (size as u64 * h as u64 / w.max(1) as u64) as u32)
    } else {
        ((size as u64 * w as u64 / h.max(1) as u64) as u32, size)
    };
    if (new_w, new_h) == (w, h) {
        return image.clone();
    }
    imageops::resize(image, new_w, new_h, FilterType::Triangle)
}

/// Rounds `diff / 2` half-to-even.
fn half_offset(diff: u32) -> u32 {
    let floor = diff / 2;
    if diff % 2 == 1 && floor % 2 == 1 {
        floor + 1
    } else {
        floor
    }
}

/// Crops the central `size x size` window, zero-padding smaller images.
fn center_crop(image: &RgbImage, size: u32) -> RgbImage {
    let (w, h) = image.dimensions();
    if w < size || h < size {
        let mut canvas = RgbImage::new(size.max(w), size.max(h));
        let x = half_offset(canvas.width() - w);
        let y = half_offset(canvas.height() - h);
        imageops::replace(&mut canvas, image, x as i64, y as i64);
        return center_crop(&canvas, size);
    }
    let x = half_offset(w - size);
    let y = half_offset(h - size);
    imageops::crop_imm(image, x, y, size, size).to_image()
}

/// HWC `u8` image to CHW `f32` tensor in `[0, 1]`.
pub fn to_tensor(image: &RgbImage) -> Array3<f32> {
    let (w, h) = image.dimensions();
    let mut tensor = Array3::<f32>::zeros((3, h as usize, w as usize));
    for (x, y, pixel) in image.enumerate_pixels() {
        for c in 0..3 {
            tensor[[c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }
    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, IxDyn};

    #[test]
    fn test_min_max_scale_range() {
        let data = Array3::from_shape_vec((1, 2, 2), vec![2.0, 4.0, 6.0, 10.0]).unwrap();
        let scaled = min_max_scale(&data, MIN_MAX_EPS);

        assert_eq!(scaled[[0, 0, 0]], 0.0);
        assert!(scaled[[0, 1, 1]] < 1.0);
        assert!((scaled[[0, 1, 1]] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_min_max_scale_constant_is_finite() {
        let data = Array3::from_elem((2, 2, 2), 7.5);
        let scaled = min_max_scale(&data, MIN_MAX_EPS);

        assert!(scaled.iter().all(|v| v.is_finite()));
        assert!(scaled.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_closure_is_a_transform() {
        let data = ArrayD::from_shape_vec(IxDyn(&[3]), vec![1.0, 2.0, 3.0]).unwrap();
        let double = |x: ArrayD<f32>| x.mapv(|v| v * 2.0);

        let result = double.apply(data);
        assert_eq!(result.as_slice().unwrap(), &[2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_pipeline_landscape_image() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 20, image::Rgb([255, 0, 51])));
        let tensor = ImagePipeline::square(10).apply(&image);

        assert_eq!(tensor.dim(), (3, 10, 10));
        assert!((tensor[[0, 5, 5]] - 1.0).abs() < 1e-6);
        assert_eq!(tensor[[1, 5, 5]], 0.0);
        assert!((tensor[[2, 5, 5]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_pipeline_portrait_image() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(12, 30));
        let tensor = ImagePipeline::square(8).apply(&image);
        assert_eq!(tensor.dim(), (3, 8, 8));
    }

    #[test]
    fn test_center_crop_offsets() {
        assert_eq!(half_offset(0), 0);
        assert_eq!(half_offset(1), 0);
        assert_eq!(half_offset(3), 2);
        assert_eq!(half_offset(4), 2);
        assert_eq!(half_offset(5), 2);
    }

    #[test]
    fn test_center_crop_pads_small_images() {
        let image = RgbImage::from_pixel(2, 2, image::Rgb([10, 10, 10]));
        let cropped = center_crop(&image, 4);
        assert_eq!(cropped.dimensions(), (4, 4));
        assert_eq!(cropped.get_pixel(0, 0)[0], 0);
        assert_eq!(cropped.get_pixel(1, 1)[0], 10);
    }
}
