//! Configuration types for the mixing graph.

use std::time::Duration;

use crate::error::GraphError;

/// Fallback default gain for the teacher (microphone) slot.
pub const DEFAULT_TEACHER_GAIN: f32 = 1.0;

/// Fallback default gain for the music slot.
pub const DEFAULT_MUSIC_GAIN: f32 = 0.3;

/// Configuration for a [`MixerGraph`](crate::MixerGraph).
///
/// Use [`MixerConfig::default()`] for sensible defaults, or customize as
/// needed.
///
/// # Example
///
/// ```
/// use mix_audio::MixerConfig;
/// use std::time::Duration;
///
/// let config = MixerConfig {
///     chunk_duration: Duration::from_millis(10),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct MixerConfig {
    /// Sample rate of the graph in Hz.
    ///
    /// Live microphone input must already be in this rate; loaded music
    /// content is resampled to it at attach time.
    /// Default: 48000
    pub sample_rate: u32,

    /// Channel count of the graph (1 = mono, 2 = stereo).
    ///
    /// Default: 1
    pub channels: u16,

    /// Duration of each rendered chunk.
    ///
    /// Smaller values reduce latency but increase overhead.
    /// Default: 20ms
    pub chunk_duration: Duration,

    /// Initial gain for the teacher (microphone) slot, clamped into [0, 1].
    ///
    /// Default: 1.0
    pub teacher_gain: f32,

    /// Initial gain for the music slot, clamped into [0, 1].
    ///
    /// Default: 0.3
    pub music_gain: f32,

    /// Per-subscriber capacity (in chunks) of each output tap.
    ///
    /// A subscriber that falls further behind than this skips ahead to the
    /// oldest retained chunk. Default: 64
    pub tap_capacity: usize,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 1,
            chunk_duration: Duration::from_millis(20),
            teacher_gain: DEFAULT_TEACHER_GAIN,
            music_gain: DEFAULT_MUSIC_GAIN,
            tap_capacity: 64,
        }
    }
}

impl MixerConfig {
    /// Returns the number of frames in one rendered chunk.
    pub(crate) fn frames_per_chunk(&self) -> usize {
        (f64::from(self.sample_rate) * self.chunk_duration.as_secs_f64()) as usize
    }

    /// Returns the number of interleaved samples in one rendered chunk.
    pub(crate) fn samples_per_chunk(&self) -> usize {
        self.frames_per_chunk() * self.channels as usize
    }

    /// Validates the configuration.
    pub(crate) fn validate(&self) -> Result<(), GraphError> {
        if self.sample_rate == 0 {
            return Err(GraphError::invalid_config("sample_rate must be non-zero"));
        }
        if self.channels == 0 || self.channels > 2 {
            return Err(GraphError::invalid_config(
                "channels must be 1 (mono) or 2 (stereo)",
            ));
        }
        if self.chunk_duration.is_zero() {
            return Err(GraphError::invalid_config(
                "chunk_duration must be non-zero",
            ));
        }
        if self.frames_per_chunk() == 0 {
            return Err(GraphError::invalid_config(
                "chunk_duration is shorter than one frame at this sample rate",
            ));
        }
        if self.tap_capacity == 0 {
            return Err(GraphError::invalid_config("tap_capacity must be non-zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixer_config_defaults() {
        let config = MixerConfig::default();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.channels, 1);
        assert_eq!(config.chunk_duration, Duration::from_millis(20));
        assert_eq!(config.teacher_gain, DEFAULT_TEACHER_GAIN);
        assert_eq!(config.music_gain, DEFAULT_MUSIC_GAIN);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_frames_per_chunk() {
        let config = MixerConfig::default();
        // 20ms at 48kHz = 960 frames
        assert_eq!(config.frames_per_chunk(), 960);
        assert_eq!(config.samples_per_chunk(), 960);
    }

    #[test]
    fn test_samples_per_chunk_stereo() {
        let config = MixerConfig {
            channels: 2,
            ..Default::default()
        };
        assert_eq!(config.samples_per_chunk(), 1920);
    }

    #[test]
    fn test_validate_rejects_zero_sample_rate() {
        let config = MixerConfig {
            sample_rate: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GraphError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_unsupported_channels() {
        let config = MixerConfig {
            channels: 6,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GraphError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_chunk_duration() {
        let config = MixerConfig {
            chunk_duration: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GraphError::InvalidConfig { .. })
        ));
    }
}
