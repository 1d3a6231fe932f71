//! WAV file content source.
//!
//! Reads 16-bit PCM RIFF/WAVE files from a root directory. Decoding is
//! deliberately minimal - this is the one on-disk format the crate
//! understands natively; anything richer belongs in a custom
//! [`ContentSource`] implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::GraphError;
use crate::format::i16_to_f32;
use crate::source::content::{ContentSource, DecodedAudio};

// WAV file format constants
// See: http://soundfile.sapp.org/doc/WaveFormat/

/// RIFF container magic at offset 0.
const RIFF_MAGIC: &[u8; 4] = b"RIFF";

/// WAVE form type at offset 8.
const WAVE_MAGIC: &[u8; 4] = b"WAVE";

/// Chunk ID of the format chunk.
const FMT_CHUNK_ID: &[u8; 4] = b"fmt ";

/// Chunk ID of the sample data chunk.
const DATA_CHUNK_ID: &[u8; 4] = b"data";

/// Size of the RIFF header preceding the first chunk.
const RIFF_HEADER_SIZE: usize = 12;

/// Minimum size of the fmt chunk data (PCM).
const FMT_CHUNK_MIN_SIZE: usize = 16;

/// Audio format code for PCM (uncompressed).
const WAV_FORMAT_PCM: u16 = 1;

/// The only bit depth this loader accepts.
const WAV_BITS_PER_SAMPLE: u16 = 16;

/// A [`ContentSource`] that reads 16-bit PCM WAV files.
///
/// Locators are paths relative to the configured root directory. File I/O
/// and decoding run on the blocking thread pool.
///
/// # Example
///
/// ```no_run
/// use mix_audio::WavContent;
///
/// let content = WavContent::new("assets/audio");
/// // graph.attach_music("lesson-bgm.wav", &content).await?
/// ```
pub struct WavContent {
    root: PathBuf,
}

impl WavContent {
    /// Creates a WAV content source rooted at the given directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl ContentSource for WavContent {
    async fn load(&self, locator: &str) -> Result<DecodedAudio, GraphError> {
        let path = self.root.join(locator);
        let owned_locator = locator.to_string();

        let decoded = tokio::task::spawn_blocking(move || read_wav(&path))
            .await
            .map_err(|e| GraphError::load_failed(&owned_locator, format!("load task failed: {e}")))?;

        decoded.map_err(|reason| GraphError::load_failed(locator, reason))
    }
}

/// Reads and decodes a 16-bit PCM WAV file.
fn read_wav(path: &Path) -> Result<DecodedAudio, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    decode_wav(&bytes)
}

/// Decodes WAV bytes into interleaved f32 samples.
fn decode_wav(bytes: &[u8]) -> Result<DecodedAudio, String> {
    if bytes.len() < RIFF_HEADER_SIZE {
        return Err("file too short for a RIFF header".to_string());
    }
    if &bytes[0..4] != RIFF_MAGIC || &bytes[8..12] != WAVE_MAGIC {
        return Err("not a RIFF/WAVE file".to_string());
    }

    let mut fmt: Option<(u16, u16, u32, u16)> = None;
    let mut data: Option<&[u8]> = None;

    // Walk chunks: [id:4][size:4le][body:size], bodies padded to even length
    let mut offset = RIFF_HEADER_SIZE;
    while offset + 8 <= bytes.len() {
        let id = &bytes[offset..offset + 4];
        let size = u32::from_le_bytes([
            bytes[offset + 4],
            bytes[offset + 5],
            bytes[offset + 6],
            bytes[offset + 7],
        ]) as usize;
        let body_start = offset + 8;
        let body_end = body_start
            .checked_add(size)
            .filter(|&end| end <= bytes.len())
            .ok_or_else(|| "chunk size exceeds file length".to_string())?;
        let body = &bytes[body_start..body_end];

        if id == FMT_CHUNK_ID {
            if body.len() < FMT_CHUNK_MIN_SIZE {
                return Err("fmt chunk too short".to_string());
            }
            let format = u16::from_le_bytes([body[0], body[1]]);
            let channels = u16::from_le_bytes([body[2], body[3]]);
            let sample_rate = u32::from_le_bytes([body[4], body[5], body[6], body[7]]);
            let bits = u16::from_le_bytes([body[14], body[15]]);
            fmt = Some((format, channels, sample_rate, bits));
        } else if id == DATA_CHUNK_ID {
            data = Some(body);
        }

        offset = body_end + (size & 1);
    }

    let (format, channels, sample_rate, bits) =
        fmt.ok_or_else(|| "missing fmt chunk".to_string())?;
    let data = data.ok_or_else(|| "missing data chunk".to_string())?;

    if format != WAV_FORMAT_PCM {
        return Err(format!("unsupported audio format code {format} (want PCM)"));
    }
    if bits != WAV_BITS_PER_SAMPLE {
        return Err(format!("unsupported bit depth {bits} (want 16)"));
    }
    if channels == 0 || sample_rate == 0 {
        return Err("fmt chunk declares zero channels or sample rate".to_string());
    }

    let samples: Vec<f32> = data
        .chunks_exact(2)
        .map(|pair| i16_to_f32(i16::from_le_bytes([pair[0], pair[1]])))
        .collect();

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::f32_to_i16;

    /// Builds a minimal 16-bit PCM WAV file in memory.
    fn wav_bytes(samples: &[f32], sample_rate: u32, channels: u16) -> Vec<u8> {
        let data_len = samples.len() * 2;
        let mut bytes = Vec::with_capacity(44 + data_len);

        bytes.extend_from_slice(RIFF_MAGIC);
        bytes.extend_from_slice(&(36 + data_len as u32).to_le_bytes());
        bytes.extend_from_slice(WAVE_MAGIC);

        bytes.extend_from_slice(FMT_CHUNK_ID);
        bytes.extend_from_slice(&(FMT_CHUNK_MIN_SIZE as u32).to_le_bytes());
        bytes.extend_from_slice(&WAV_FORMAT_PCM.to_le_bytes());
        bytes.extend_from_slice(&channels.to_le_bytes());
        bytes.extend_from_slice(&sample_rate.to_le_bytes());
        let byte_rate = sample_rate * u32::from(channels) * 2;
        bytes.extend_from_slice(&byte_rate.to_le_bytes());
        let block_align = channels * 2;
        bytes.extend_from_slice(&block_align.to_le_bytes());
        bytes.extend_from_slice(&WAV_BITS_PER_SAMPLE.to_le_bytes());

        bytes.extend_from_slice(DATA_CHUNK_ID);
        bytes.extend_from_slice(&(data_len as u32).to_le_bytes());
        for &s in samples {
            bytes.extend_from_slice(&f32_to_i16(s).to_le_bytes());
        }

        bytes
    }

    #[test]
    fn test_decode_wav_roundtrip() {
        let samples = vec![0.0, 0.5, -0.5, 0.25];
        let bytes = wav_bytes(&samples, 16000, 1);

        let decoded = decode_wav(&bytes).unwrap();
        assert_eq!(decoded.sample_rate, 16000);
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.samples.len(), 4);
        for (&got, &want) in decoded.samples.iter().zip(&samples) {
            assert!((got - want).abs() < 0.001);
        }
    }

    #[test]
    fn test_decode_wav_rejects_garbage() {
        assert!(decode_wav(b"not a wav").is_err());
        assert!(decode_wav(b"RIFFxxxxJUNKdata").is_err());
    }

    #[test]
    fn test_decode_wav_rejects_truncated_data_chunk() {
        let mut bytes = wav_bytes(&[0.1, 0.2, 0.3], 16000, 1);
        bytes.truncate(bytes.len() - 2);
        assert!(decode_wav(&bytes).is_err());
    }

    #[test]
    fn test_decode_wav_rejects_wrong_bit_depth() {
        let mut bytes = wav_bytes(&[0.1], 16000, 1);
        // Patch bits-per-sample (offset 34 in a canonical header) to 24
        bytes[34] = 24;
        let err = decode_wav(&bytes).unwrap_err();
        assert!(err.contains("bit depth"));
    }

    #[tokio::test]
    async fn test_wav_content_loads_file() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = wav_bytes(&[0.0, 0.5, -0.5], 22050, 1);
        std::fs::write(dir.path().join("bgm.wav"), &bytes).unwrap();

        let content = WavContent::new(dir.path());
        let decoded = content.load("bgm.wav").await.unwrap();
        assert_eq!(decoded.sample_rate, 22050);
        assert_eq!(decoded.samples.len(), 3);
    }

    #[tokio::test]
    async fn test_wav_content_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let content = WavContent::new(dir.path());

        let err = content.load("missing.wav").await.unwrap_err();
        assert!(matches!(err, GraphError::LoadFailed { .. }));
    }
}
