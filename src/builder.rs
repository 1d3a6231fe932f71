//! Builder for [`MixerGraph`].

use std::sync::Arc;
use std::time::Duration;

use crate::config::MixerConfig;
use crate::error::GraphError;
use crate::event::{EventCallback, GraphEvent};
use crate::graph::{GraphShared, MixerGraph};
use crate::pipeline::RenderLoop;

/// Builds a [`MixerGraph`] with validated configuration.
///
/// # Example
///
/// ```ignore
/// use mix_audio::{MixerGraph, Slot};
/// use std::time::Duration;
///
/// let graph = MixerGraph::builder()
///     .sample_rate(48000)
///     .channels(1)
///     .chunk_duration(Duration::from_millis(20))
///     .music_gain(0.25)
///     .build()?;
/// ```
#[must_use]
#[derive(Default)]
pub struct MixerGraphBuilder {
    config: MixerConfig,
    event_callback: Option<EventCallback>,
}

impl MixerGraphBuilder {
    /// Creates a builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration at once.
    pub fn with_config(mut self, config: MixerConfig) -> Self {
        self.config = config;
        self
    }

    /// Output sample rate in Hz.
    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    /// Output channel count (1 or 2).
    pub fn channels(mut self, channels: u16) -> Self {
        self.config.channels = channels;
        self
    }

    /// Duration of each rendered chunk.
    pub fn chunk_duration(mut self, duration: Duration) -> Self {
        self.config.chunk_duration = duration;
        self
    }

    /// Initial teacher (microphone) gain, clamped into [0, 1] at build.
    pub fn teacher_gain(mut self, gain: f32) -> Self {
        self.config.teacher_gain = gain;
        self
    }

    /// Initial music gain, clamped into [0, 1] at build.
    pub fn music_gain(mut self, gain: f32) -> Self {
        self.config.music_gain = gain;
        self
    }

    /// Per-subscriber chunk capacity of the output taps.
    pub fn tap_capacity(mut self, capacity: usize) -> Self {
        self.config.tap_capacity = capacity;
        self
    }

    /// Registers a callback invoked for every [`GraphEvent`].
    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(GraphEvent) + Send + Sync + 'static,
    {
        self.event_callback = Some(Arc::new(callback));
        self
    }

    /// Validates the configuration, wires the topology, and spawns the
    /// render loop.
    ///
    /// Must be called within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidConfig`] for an unusable configuration
    /// (zero sample rate, unsupported channel count, zero-length chunks).
    pub fn build(self) -> Result<MixerGraph, GraphError> {
        self.config.validate()?;

        tracing::info!(
            sample_rate = self.config.sample_rate,
            channels = self.config.channels,
            "building mixer graph"
        );

        let shared = Arc::new(GraphShared::new(self.config, self.event_callback));
        let render_handle = RenderLoop::spawn(Arc::clone(&shared));
        Ok(MixerGraph::new(shared, render_handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_with_defaults() {
        let graph = MixerGraphBuilder::new().build().unwrap();
        assert!(!graph.is_closed());
        graph.shutdown().await;
    }

    #[tokio::test]
    async fn test_build_rejects_zero_sample_rate() {
        let err = MixerGraphBuilder::new().sample_rate(0).build().unwrap_err();
        assert!(matches!(err, GraphError::InvalidConfig { .. }));
    }

    #[tokio::test]
    async fn test_build_rejects_too_many_channels() {
        let err = MixerGraphBuilder::new().channels(6).build().unwrap_err();
        assert!(matches!(err, GraphError::InvalidConfig { .. }));
    }

    #[tokio::test]
    async fn test_build_clamps_initial_gains() {
        use crate::slot::Slot;

        let graph = MixerGraphBuilder::new()
            .teacher_gain(3.0)
            .music_gain(-1.0)
            .build()
            .unwrap();
        assert_eq!(graph.gain(Slot::Teacher), 1.0);
        assert_eq!(graph.gain(Slot::Music), 0.0);
        graph.shutdown().await;
    }
}
