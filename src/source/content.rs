//! Content-source collaborator: resolving locators into decodable audio.
//!
//! The graph never fetches content itself; a [`ContentSource`] does. Retry
//! and fallback policy over candidate locators is the caller's job too -
//! [`load_first`] walks a candidate list until one loads.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::GraphError;

/// Decoded PCM audio as produced by a [`ContentSource`].
///
/// Samples are interleaved f32 in [-1.0, 1.0] at the content's native
/// format; the graph adapts them to its own format at attach time.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Interleaved PCM samples.
    pub samples: Vec<f32>,
    /// Sample rate of the decoded content in Hz.
    pub sample_rate: u32,
    /// Channel count of the decoded content.
    pub channels: u16,
}

impl DecodedAudio {
    /// Returns the duration of the decoded content.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 || self.channels == 0 {
            return Duration::ZERO;
        }
        let frames = self.samples.len() / self.channels as usize;
        Duration::from_secs_f64(frames as f64 / f64::from(self.sample_rate))
    }

    /// Generates silence with the given format and duration.
    pub fn silence(duration_ms: u64, sample_rate: u32, channels: u16) -> Self {
        let frames = (u64::from(sample_rate) * duration_ms / 1000) as usize;
        Self {
            samples: vec![0.0; frames * channels as usize],
            sample_rate,
            channels,
        }
    }

    /// Generates a sine wave at the given frequency, amplitude in [0, 1],
    /// and duration.
    ///
    /// Useful for tests and demos without shipping audio assets.
    pub fn sine(
        frequency: f64,
        amplitude: f32,
        duration_ms: u64,
        sample_rate: u32,
        channels: u16,
    ) -> Self {
        let frames = (u64::from(sample_rate) * duration_ms / 1000) as usize;
        let mut samples = Vec::with_capacity(frames * channels as usize);

        for i in 0..frames {
            let t = i as f64 / f64::from(sample_rate);
            let value = (2.0 * std::f64::consts::PI * frequency * t).sin() as f32 * amplitude;
            // Write the same sample to all channels
            for _ in 0..channels {
                samples.push(value);
            }
        }

        Self {
            samples,
            sample_rate,
            channels,
        }
    }
}

/// Resolves a locator into decoded audio content.
///
/// Implementations fetch and decode; the graph treats both as one opaque
/// asynchronous step. A failed load must leave no partial state behind.
///
/// # Example
///
/// ```
/// use mix_audio::{ContentSource, DecodedAudio, GraphError};
/// use async_trait::async_trait;
///
/// struct ToneSource;
///
/// #[async_trait]
/// impl ContentSource for ToneSource {
///     async fn load(&self, locator: &str) -> Result<DecodedAudio, GraphError> {
///         let frequency: f64 = locator
///             .parse()
///             .map_err(|_| GraphError::load_failed(locator, "not a frequency"))?;
///         Ok(DecodedAudio::sine(frequency, 0.5, 1000, 48000, 1))
///     }
/// }
/// ```
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Resolves `locator` into decoded audio.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::LoadFailed`] if the content cannot be fetched
    /// or decoded.
    async fn load(&self, locator: &str) -> Result<DecodedAudio, GraphError>;
}

/// An in-memory content source keyed by locator.
///
/// Useful for tests, demos, and applications that ship their audio
/// pre-decoded.
///
/// # Example
///
/// ```
/// use mix_audio::{DecodedAudio, MemoryContent};
///
/// let content = MemoryContent::new();
/// content.insert("bgm", DecodedAudio::sine(220.0, 0.4, 500, 48000, 1));
/// ```
#[derive(Default)]
pub struct MemoryContent {
    tracks: Mutex<HashMap<String, DecodedAudio>>,
}

impl MemoryContent {
    /// Creates an empty in-memory content source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers decoded audio under a locator, replacing any previous
    /// entry.
    pub fn insert(&self, locator: impl Into<String>, audio: DecodedAudio) {
        self.tracks.lock().insert(locator.into(), audio);
    }
}

#[async_trait]
impl ContentSource for MemoryContent {
    async fn load(&self, locator: &str) -> Result<DecodedAudio, GraphError> {
        self.tracks
            .lock()
            .get(locator)
            .cloned()
            .ok_or_else(|| GraphError::load_failed(locator, "no such entry"))
    }
}

/// Tries candidate locators in order, returning the first that loads.
///
/// This is the sequential-fallback pattern ("try this URL, fall back to
/// the next on error") that lives with the content-source collaborator,
/// not inside the graph.
///
/// Returns the winning locator together with its decoded audio.
///
/// # Errors
///
/// Returns the last load error if every candidate fails, or
/// [`GraphError::LoadFailed`] if `locators` is empty.
pub async fn load_first<S>(
    source: &S,
    locators: &[&str],
) -> Result<(String, DecodedAudio), GraphError>
where
    S: ContentSource + ?Sized,
{
    let mut last_err = GraphError::load_failed("", "no candidate locators");

    for &locator in locators {
        match source.load(locator).await {
            Ok(audio) => return Ok((locator.to_string(), audio)),
            Err(err) => {
                tracing::debug!(locator, error = %err, "candidate locator failed, trying next");
                last_err = err;
            }
        }
    }

    Err(last_err)
}
