//! Loaded music track with playhead.

use std::sync::Arc;

/// Decoded music content bound into the graph's music slot.
///
/// Samples are already in the graph's format (channel count and sample
/// rate) by the time a track is constructed; adaptation happens once at
/// attach time. The track keeps a playhead that advances as the render
/// loop reads and wraps to the start at the end of the content, so the
/// music bed loops for as long as it plays.
pub(crate) struct MusicTrack {
    samples: Arc<Vec<f32>>,
    channels: u16,
    /// Playhead in interleaved samples (always a frame boundary).
    position: usize,
}

impl MusicTrack {
    /// Creates a track from interleaved samples in the graph format.
    pub(crate) fn new(samples: Vec<f32>, channels: u16) -> Self {
        Self {
            samples: Arc::new(samples),
            channels,
            position: 0,
        }
    }

    /// Fills `out` from the playhead, wrapping at the end of the content.
    ///
    /// An empty track fills with silence.
    pub(crate) fn read_looped(&mut self, out: &mut [f32]) {
        if self.samples.is_empty() {
            out.fill(0.0);
            return;
        }

        let len = self.samples.len();
        let mut written = 0;
        while written < out.len() {
            let run = (len - self.position).min(out.len() - written);
            out[written..written + run]
                .copy_from_slice(&self.samples[self.position..self.position + run]);
            written += run;
            self.position = (self.position + run) % len;
        }
    }

    /// Resets the playhead to the start of the content.
    pub(crate) fn rewind(&mut self) {
        self.position = 0;
    }

    /// Returns the playhead position in interleaved samples.
    pub(crate) fn position(&self) -> usize {
        self.position
    }

    /// Returns the content length in frames.
    pub(crate) fn frame_count(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }
}
