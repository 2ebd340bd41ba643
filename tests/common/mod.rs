//! On-disk fixtures shared by the integration tests.

#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use image::{Rgb, RgbImage};
use ndarray::{Array2, Array3, Array4};
use ndarray_npy::NpzWriter;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Writes a gzipped single-file NIfTI-1 volume with `float32` voxels.
pub fn write_nifti_gz(path: &Path, volume: &Array3<f32>) {
    write_nifti_raw(path, volume.dim(), (16, 32), (1.0, 0.0), |x, y, z| {
        volume[[x, y, z]].to_le_bytes().to_vec()
    });
}

/// Writes a gzipped `int16` volume with the given `scl_slope`/`scl_inter`.
pub fn write_nifti_i16_gz(path: &Path, volume: &Array3<i16>, slope: f32, inter: f32) {
    write_nifti_raw(path, volume.dim(), (4, 16), (slope, inter), |x, y, z| {
        volume[[x, y, z]].to_le_bytes().to_vec()
    });
}

fn write_nifti_raw(
    path: &Path,
    (nx, ny, nz): (usize, usize, usize),
    (datatype, bitpix): (i16, i16),
    (slope, inter): (f32, f32),
    voxel: impl Fn(usize, usize, usize) -> Vec<u8>,
) {
    let mut header = vec![0u8; 348];
    let put_i16 = |buf: &mut Vec<u8>, offset: usize, v: i16| {
        buf[offset..offset + 2].copy_from_slice(&v.to_le_bytes());
    };
    let put_f32 = |buf: &mut Vec<u8>, offset: usize, v: f32| {
        buf[offset..offset + 4].copy_from_slice(&v.to_le_bytes());
    };

    header[0..4].copy_from_slice(&348i32.to_le_bytes());
    for (i, d) in [3, nx as i16, ny as i16, nz as i16, 1, 1, 1, 1].into_iter().enumerate() {
        put_i16(&mut header, 40 + 2 * i, d);
    }
    put_i16(&mut header, 70, datatype);
    put_i16(&mut header, 72, bitpix);
    for i in 0..8 {
        put_f32(&mut header, 76 + 4 * i, 1.0);
    }
    put_f32(&mut header, 108, 352.0);
    put_f32(&mut header, 112, slope);
    put_f32(&mut header, 116, inter);
    header[344..348].copy_from_slice(b"n+1\0");

    let mut bytes = header;
    bytes.extend_from_slice(&[0u8; 4]);
    // First axis varies fastest on disk.
    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                bytes.extend_from_slice(&voxel(x, y, z));
            }
        }
    }

    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut encoder = GzEncoder::new(File::create(path).unwrap(), Compression::fast());
    encoder.write_all(&bytes).unwrap();
    encoder.finish().unwrap();
}

/// Writes the three scans of one subject.
pub fn write_subject(dir: &Path, volumes: [&Array3<f32>; 3]) {
    for (file, volume) in ["T1w.nii.gz", "T2w.nii.gz", "FLAIR.nii.gz"].iter().zip(volumes) {
        write_nifti_gz(&dir.join(file), volume);
    }
}

/// A volume whose voxels increase along every axis.
pub fn ramp(dim: (usize, usize, usize), scale: f32) -> Array3<f32> {
    Array3::from_shape_fn(dim, |(x, y, z)| scale * (x + 2 * y + 3 * z) as f32)
}

pub fn write_image(path: &Path, w: u32, h: u32, shade: u8) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbImage::from_pixel(w, h, Rgb([shade, shade / 2, 255 - shade]))
        .save(path)
        .unwrap();
}

/// `root/<split>/<class>/<n>.png` for each split and class.
pub fn write_image_folder(root: &Path, splits: &[&str], classes: &[&str], per_class: usize) {
    for split in splits {
        for class in classes {
            for i in 0..per_class {
                write_image(&root.join(split).join(class).join(format!("{}.png", i)), 24, 16, 40);
            }
        }
    }
}

pub fn write_text_archive(path: &Path, train: usize, test: usize) {
    let mut npz = NpzWriter::new(File::create(path).unwrap());
    npz.add_array("train_data.npy", &Array4::<u8>::from_elem((train, 8, 8, 3), 255))
        .unwrap();
    npz.add_array("test_data.npy", &Array4::<u8>::zeros((test, 8, 8, 3)))
        .unwrap();
    npz.finish().unwrap();
}

pub fn write_era5(root: &Path, split: &str, count: usize) {
    let dir = root.join(split);
    fs::create_dir_all(&dir).unwrap();
    for i in 0..count {
        let mut npz = NpzWriter::new(File::create(dir.join(format!("{:05}.npz", i))).unwrap());
        npz.add_array("temperature", &Array2::<f32>::from_elem((46, 90), 280.0))
            .unwrap();
        npz.finish().unwrap();
    }
}

fn crc8(bytes: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &b in bytes {
        crc ^= b;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 { (crc << 1) ^ 0x07 } else { crc << 1 };
        }
    }
    crc
}

fn crc16(bytes: &[u8]) -> u16 {
    let mut crc = 0u16;
    for &b in bytes {
        crc ^= u16::from(b) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 { (crc << 1) ^ 0x8005 } else { crc << 1 };
        }
    }
    crc
}

/// Writes a 16 kHz, 16-bit mono FLAC stream holding `n_samples` copies of
/// `value`, encoded as constant subframes in blocks of 4000 samples.
pub fn write_flac(path: &Path, n_samples: usize, value: i16) {
    const BLOCK: usize = 4000;

    let mut bytes = b"fLaC".to_vec();
    // Last metadata block, type STREAMINFO, 34 bytes.
    bytes.extend_from_slice(&[0x80, 0x00, 0x00, 34]);
    bytes.extend_from_slice(&(BLOCK as u16).to_be_bytes());
    bytes.extend_from_slice(&(BLOCK as u16).to_be_bytes());
    bytes.extend_from_slice(&[0u8; 6]);
    let packed = (16_000u64 << 44) | (15u64 << 36) | n_samples as u64;
    bytes.extend_from_slice(&packed.to_be_bytes());
    bytes.extend_from_slice(&[0u8; 16]);

    let n_blocks = n_samples.div_ceil(BLOCK);
    assert!(n_blocks < 128, "frame numbers are written as one byte");
    for frame in 0..n_blocks {
        let len = BLOCK.min(n_samples - frame * BLOCK);
        // Fixed blocking, explicit 16-bit block size, 16 kHz, mono, 16 bits.
        let mut header = vec![0xFF, 0xF8, 0x75, 0x08, frame as u8];
        header.extend_from_slice(&((len - 1) as u16).to_be_bytes());
        header.push(crc8(&header));

        let mut frame_bytes = header;
        frame_bytes.push(0x00);
        frame_bytes.extend_from_slice(&value.to_be_bytes());
        let crc = crc16(&frame_bytes);
        frame_bytes.extend_from_slice(&crc.to_be_bytes());
        bytes.extend_from_slice(&frame_bytes);
    }

    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, bytes).unwrap();
}

/// `root/celeba/` with partition and attribute tables plus one image per row.
pub fn write_celeba(root: &Path, partitions: &[(&str, u8)]) {
    let base = root.join("celeba");
    let mut partition = String::new();
    let mut attributes = format!("{}\nSmiling Young\n", partitions.len());
    for (i, (name, split)) in partitions.iter().enumerate() {
        partition.push_str(&format!("{} {}\n", name, split));
        let smiling = if i % 2 == 0 { 1 } else { -1 };
        attributes.push_str(&format!("{}  {} -1\n", name, smiling));
        write_image(&base.join("img_align_celeba").join(name), 40, 48, 120);
    }
    fs::write(base.join("list_eval_partition.txt"), partition).unwrap();
    fs::write(base.join("list_attr_celeba.txt"), attributes).unwrap();
}
