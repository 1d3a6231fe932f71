//! Audio data chunk with metadata.

use std::sync::Arc;
use std::time::Duration;

/// A discrete buffer of audio samples with associated metadata.
///
/// `AudioChunk` is the unit of audio flowing out of the graph's output taps.
/// Samples are 32-bit floats in the range [-1.0, 1.0], interleaved by channel.
///
/// Samples are stored in an `Arc<Vec<f32>>` so fanning a chunk out to both
/// the merged and monitor outputs never copies the sample data.
///
/// # Example
///
/// ```
/// use mix_audio::AudioChunk;
/// use std::time::Duration;
///
/// let chunk = AudioChunk::new(vec![0.0f32; 960], Duration::ZERO, 48000, 1);
/// assert_eq!(chunk.duration(), Duration::from_millis(20));
///
/// let chunk2 = chunk.clone(); // Cheap clone - shares sample data
/// ```
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// PCM audio samples as 32-bit floats in [-1.0, 1.0].
    ///
    /// Wrapped in `Arc` for zero-copy sharing between output taps.
    pub samples: Arc<Vec<f32>>,

    /// Timestamp from the start of the graph's render clock.
    pub timestamp: Duration,

    /// Sample rate in Hz (e.g., 16000, 44100, 48000).
    pub sample_rate: u32,

    /// Number of audio channels (1 = mono, 2 = stereo).
    pub channels: u16,
}

impl AudioChunk {
    /// Creates a new `AudioChunk` with the given parameters.
    pub fn new(samples: Vec<f32>, timestamp: Duration, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples: Arc::new(samples),
            timestamp,
            sample_rate,
            channels,
        }
    }

    /// Returns the duration of this audio chunk.
    ///
    /// Calculated from the number of samples, sample rate, and channel count.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 || self.channels == 0 {
            return Duration::ZERO;
        }
        let frames = self.samples.len() / self.channels as usize;
        Duration::from_secs_f64(frames as f64 / f64::from(self.sample_rate))
    }

    /// Returns the number of audio frames in this chunk.
    ///
    /// A frame contains one sample per channel.
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Returns `true` if this chunk contains no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the peak absolute amplitude in this chunk.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |peak, &s| peak.max(s.abs()))
    }
}
