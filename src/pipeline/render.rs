//! The render loop: the background task that pulls from both slots, mixes
//! through the gain stages, and publishes to the output taps.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::chunk::AudioChunk;
use crate::event::GraphEvent;
use crate::graph::GraphShared;
use crate::slot::SlotState;

/// How many chunks between periodic progress logs.
const LOG_EVERY_CHUNKS: u64 = 256;

/// Renders fixed-size chunks on a timer until the graph closes.
///
/// One tick per chunk duration: read whatever the microphone buffered
/// (padding silence on underrun), read the music playhead if playing,
/// apply both gains, sum, clamp, publish. Missed ticks are skipped rather
/// than bursted; live audio has no use for catch-up chunks.
pub(crate) struct RenderLoop {
    shared: Arc<GraphShared>,
    /// Whether the microphone delivered a full chunk last tick. Used to
    /// report underruns on the transition instead of every starved tick.
    mic_was_flowing: bool,
}

impl RenderLoop {
    pub(crate) fn spawn(shared: Arc<GraphShared>) -> JoinHandle<()> {
        let render = Self {
            shared,
            mic_was_flowing: false,
        };
        tokio::spawn(render.run())
    }

    async fn run(mut self) {
        let chunk_duration = self.shared.config.chunk_duration;
        let mut ticker = tokio::time::interval(chunk_duration);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            sample_rate = self.shared.config.sample_rate,
            channels = self.shared.config.channels,
            chunk_ms = chunk_duration.as_millis() as u64,
            "render loop started"
        );

        loop {
            ticker.tick().await;
            if self.shared.is_closed() {
                break;
            }
            self.render_tick();
        }

        tracing::info!(
            chunks = self.shared.counters.chunks_mixed.load(Ordering::SeqCst),
            "render loop stopped"
        );
    }

    fn render_tick(&mut self) {
        let cfg = &self.shared.config;
        let samples_per_chunk = cfg.samples_per_chunk();
        let channels = cfg.channels as usize;

        let teacher_gain = self.shared.teacher_gain.get();
        let music_gain = self.shared.music_gain.get();

        let mut mic_buf = vec![0.0f32; samples_per_chunk];
        let mut music_buf = vec![0.0f32; samples_per_chunk];
        let mut mic_attached = false;
        let mut underrun_frames = 0usize;

        {
            let mut slots = self.shared.slots.lock();
            if let Some(mic) = slots.mic.as_mut() {
                mic_attached = true;
                let read = mic.source.read(&mut mic_buf);
                if read < samples_per_chunk {
                    underrun_frames = (samples_per_chunk - read) / channels;
                }
            }
            if let Some(music) = slots.music.as_mut() {
                if music.state == SlotState::Playing {
                    music.track.read_looped(&mut music_buf);
                }
            }
        }

        if mic_attached {
            if underrun_frames > 0 {
                self.shared
                    .counters
                    .mic_underruns
                    .fetch_add(1, Ordering::SeqCst);
                if self.mic_was_flowing {
                    self.shared.emit(GraphEvent::MicUnderrun {
                        missing_frames: underrun_frames,
                    });
                    tracing::warn!(missing_frames = underrun_frames, "microphone underrun");
                }
                self.mic_was_flowing = false;
            } else {
                self.mic_was_flowing = true;
            }
        } else {
            self.mic_was_flowing = false;
        }

        let mixed = mix_block(&mic_buf, &music_buf, teacher_gain, music_gain);

        let rendered = self
            .shared
            .counters
            .frames_rendered
            .fetch_add(cfg.frames_per_chunk() as u64, Ordering::SeqCst);
        let timestamp = Duration::from_secs_f64(rendered as f64 / f64::from(cfg.sample_rate));

        let chunk = AudioChunk::new(mixed, timestamp, cfg.sample_rate, cfg.channels);
        self.shared.monitor.publish(chunk.clone());
        self.shared.merged.publish(chunk);

        let chunks = self
            .shared
            .counters
            .chunks_mixed
            .fetch_add(1, Ordering::SeqCst)
            + 1;
        if chunks % LOG_EVERY_CHUNKS == 0 {
            tracing::debug!(
                chunks,
                teacher_gain,
                music_gain,
                "rendered {LOG_EVERY_CHUNKS} more chunks"
            );
        }
    }
}

/// Sums two equal-length sample blocks through their gain stages.
///
/// Output samples are clamped to [-1.0, 1.0].
pub(crate) fn mix_block(a: &[f32], b: &[f32], gain_a: f32, gain_b: f32) -> Vec<f32> {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(&sa, &sb)| (sa * gain_a + sb * gain_b).clamp(-1.0, 1.0))
        .collect()
}
