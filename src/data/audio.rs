// --- File: src/data/audio.rs ---

//! LibriSpeech utterances cut to a fixed-length waveform window.

use super::dataset::{check_index, Dataset, Sample};
use super::image_folder::sorted_entries;
use crate::error::{DataError, Result};
use ndarray::Array2;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CodecParameters, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// LibriSpeech is recorded at 16 kHz.
pub const SAMPLE_RATE: usize = 16_000;

/// Options for [`LibriSpeech`].
#[derive(Debug, Clone, PartialEq)]
pub struct LibriSpeechOptions {
    /// Audio file extension to collect.
    pub extension: String,
    /// Map waveforms from `[-1, 1]` to `[0, 1]`.
    pub normalize: bool,
}

impl Default for LibriSpeechOptions {
    fn default() -> Self {
        Self {
            extension: "flac".to_string(),
            normalize: true,
        }
    }
}

/// Utterances under `root/LibriSpeech/<subset>/<speaker>/<chapter>/`,
/// emitted as `{imgs: (1, num_secs * 16000)}`.
pub struct LibriSpeech {
    files: Vec<PathBuf>,
    window: Option<usize>,
    normalize: bool,
}

impl LibriSpeech {
    /// Lists a subset such as `train-clean-100`. With `num_secs`, clips too
    /// short to fill the window are skipped.
    pub fn new<P: AsRef<Path>>(root: P, subset: &str, num_secs: Option<usize>) -> Result<Self> {
        Self::with_options(root, subset, num_secs, LibriSpeechOptions::default())
    }

    /// Like [`LibriSpeech::new`], with a custom extension or normalization.
    pub fn with_options<P: AsRef<Path>>(
        root: P,
        subset: &str,
        num_secs: Option<usize>,
        options: LibriSpeechOptions,
    ) -> Result<Self> {
        let base = root.as_ref().join("LibriSpeech").join(subset);
        let window = num_secs.map(|secs| secs * SAMPLE_RATE);

        let mut files = Vec::new();
        for speaker in sorted_entries(&base, |p| p.is_dir())? {
            for chapter in sorted_entries(&speaker, |p| p.is_dir())? {
                let ext = options.extension.as_str();
                files.extend(sorted_entries(&chapter, |p| {
                    p.extension().is_some_and(|e| e == ext)
                })?);
            }
        }
        files.sort();

        let listed = files.len();
        if let Some(window) = window {
            files.retain(|path| match probe_frames(path) {
                Ok(Some(frames)) => frames as usize >= window,
                Ok(None) => true,
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "could not probe clip length"
                    );
                    true
                }
            });
        }
        if files.len() < listed {
            tracing::warn!(
                subset,
                skipped = listed - files.len(),
                "skipped clips shorter than the window"
            );
        }
        tracing::debug!(subset, clips = files.len(), "listed LibriSpeech clips");

        Ok(Self {
            files,
            window,
            normalize: options.normalize,
        })
    }

    /// Clip paths in sorted order, after the length filter.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

impl Dataset for LibriSpeech {
    fn len(&self) -> usize {
        self.files.len()
    }

    fn get(&self, index: usize) -> Result<Sample> {
        check_index(index, self.files.len())?;
        let path = &self.files[index];
        let mut waveform = decode_mono(path, self.window)?;

        if let Some(window) = self.window {
            if waveform.len() < window {
                return Err(DataError::layout(
                    path,
                    format!("clip has {} samples, window needs {}", waveform.len(), window),
                ));
            }
            waveform.truncate(window);
        }
        if self.normalize {
            waveform.iter_mut().for_each(|x| *x = (*x + 1.0) / 2.0);
        }

        let len = waveform.len();
        let tensor = Array2::from_shape_vec((1, len), waveform)?;
        Ok(Sample::imgs(tensor.into_dyn()))
    }
}

fn audio_err(path: &Path) -> impl Fn(SymphoniaError) -> DataError + '_ {
    move |source| DataError::Audio {
        path: path.to_path_buf(),
        source,
    }
}

fn open_track(path: &Path) -> Result<(Box<dyn FormatReader>, u32, CodecParameters)> {
    let file = File::open(path).map_err(|e| DataError::io(path, e))?;
    let stream = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, stream, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(audio_err(path))?;
    let format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| DataError::layout(path, "no decodable audio track"))?;
    let (track_id, params) = (track.id, track.codec_params.clone());
    Ok((format, track_id, params))
}

/// Number of frames declared by the container, if any.
pub fn probe_frames(path: &Path) -> Result<Option<u64>> {
    let (_, _, params) = open_track(path)?;
    Ok(params.n_frames)
}

/// Decodes the first channel as `f32` in `[-1, 1]`, stopping once `limit`
/// samples are available.
pub fn decode_mono(path: &Path, limit: Option<usize>) -> Result<Vec<f32>> {
    let (mut format, track_id, params) = open_track(path)?;
    let mut decoder = symphonia::default::get_codecs()
        .make(&params, &DecoderOptions::default())
        .map_err(audio_err(path))?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(audio_err(path)(e)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder.decode(&packet).map_err(audio_err(path))?;
        let spec = *decoded.spec();
        let channels = spec.channels.count().max(1);
        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        samples.extend(buffer.samples().iter().step_by(channels).copied());

        if limit.is_some_and(|limit| samples.len() >= limit) {
            break;
        }
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Writes a 16-bit mono PCM WAV file at 16 kHz.
    fn write_wav(path: &Path, samples: &[i16]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let data_len = (samples.len() * 2) as u32;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&16_000u32.to_le_bytes());
        bytes.extend_from_slice(&32_000u32.to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        for s in samples {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        fs::write(path, bytes).unwrap();
    }

    fn wav_options() -> LibriSpeechOptions {
        LibriSpeechOptions {
            extension: "wav".to_string(),
            ..LibriSpeechOptions::default()
        }
    }

    #[test]
    fn test_window_and_short_clip_filter() {
        let dir = tempfile::tempdir().unwrap();
        let chapter = dir.path().join("LibriSpeech/test-clean/19/198");
        write_wav(&chapter.join("19-198-0001.wav"), &vec![0i16; SAMPLE_RATE + 500]);
        write_wav(&chapter.join("19-198-0000.wav"), &vec![i16::MAX; SAMPLE_RATE * 2]);
        write_wav(&chapter.join("19-198-0002.wav"), &vec![0i16; SAMPLE_RATE / 2]);

        let dataset =
            LibriSpeech::with_options(dir.path(), "test-clean", Some(1), wav_options()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert!(dataset.files()[0].ends_with("19-198-0000.wav"));

        let loud = dataset.get(0).unwrap();
        assert_eq!(loud.shape(), &[1, SAMPLE_RATE]);
        assert!(loud.tensor.iter().all(|&v| (v - 1.0).abs() < 1e-3));

        let silent = dataset.get(1).unwrap();
        assert!(silent.tensor.iter().all(|&v| (v - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_full_clip_without_window() {
        let dir = tempfile::tempdir().unwrap();
        let chapter = dir.path().join("LibriSpeech/dev/1/2");
        write_wav(&chapter.join("1-2-0000.wav"), &vec![0i16; 1234]);

        let options = LibriSpeechOptions {
            normalize: false,
            ..wav_options()
        };
        let dataset = LibriSpeech::with_options(dir.path(), "dev", None, options).unwrap();
        let sample = dataset.get(0).unwrap();
        assert_eq!(sample.shape(), &[1, 1234]);
        assert!(sample.tensor.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_missing_subset_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = LibriSpeech::new(dir.path(), "train-clean-100", Some(1)).err().unwrap();
        assert!(matches!(err, DataError::Io { .. }));
    }
}
