//! The mixing graph: fixed topology, slot state, and all mutating
//! operations.
//!
//! The topology is wired once at construction and never changes:
//!
//! ```text
//! MicSource ──► teacher gain ──┐
//!                              ├──► merged tap (outbound)
//! MusicTrack ──► music gain ───┤
//!                              └──► monitor tap (local)
//! ```
//!
//! Only the set of attached sources and the gain values vary. The render
//! loop (see [`pipeline`](crate::pipeline)) reads this state on every tick.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::builder::MixerGraphBuilder;
use crate::config::MixerConfig;
use crate::context::OutputContext;
use crate::error::GraphError;
use crate::event::{EventCallback, GraphEvent};
use crate::format;
use crate::gain::GainStage;
use crate::pipeline::OutputTap;
use crate::slot::{Slot, SlotState};
use crate::source::music::MusicTrack;
use crate::source::{ContentSource, MicSource};

/// The microphone binding. The graph exclusively owns the consumer half of
/// the live stream; dropping the binding severs the connection.
pub(crate) struct MicBinding {
    pub(crate) source: MicSource,
}

/// The music binding: decoded track plus playback state.
pub(crate) struct MusicBinding {
    pub(crate) track: MusicTrack,
    pub(crate) state: SlotState,
    /// Epoch this binding was created under; stale handles and stale loads
    /// are detected by comparing against the current epoch.
    pub(crate) epoch: u64,
}

/// All slot bindings, behind one mutex.
#[derive(Default)]
pub(crate) struct Slots {
    pub(crate) mic: Option<MicBinding>,
    pub(crate) music: Option<MusicBinding>,
}

/// Atomic render counters shared with the render loop.
#[derive(Default)]
pub(crate) struct GraphCounters {
    pub(crate) chunks_mixed: AtomicU64,
    pub(crate) frames_rendered: AtomicU64,
    pub(crate) mic_underruns: AtomicU64,
}

/// Snapshot of render statistics.
#[derive(Debug, Clone, Default)]
pub struct MixerStats {
    /// Total chunks rendered and published.
    pub chunks_mixed: u64,
    /// Total frames rendered.
    pub frames_rendered: u64,
    /// Number of ticks where the microphone buffer ran short and silence
    /// was padded.
    pub mic_underruns: u64,
}

/// State shared between the graph handle, music handles, and the render
/// loop task.
pub(crate) struct GraphShared {
    pub(crate) config: MixerConfig,
    pub(crate) closed: AtomicBool,
    pub(crate) teacher_gain: GainStage,
    pub(crate) music_gain: GainStage,
    pub(crate) slots: Mutex<Slots>,
    /// Bumped at the start of every `attach_music`; a load only binds if
    /// the epoch it reserved is still current when it resolves.
    pub(crate) music_epoch: AtomicU64,
    pub(crate) context: OutputContext,
    pub(crate) merged: Arc<OutputTap>,
    pub(crate) monitor: Arc<OutputTap>,
    pub(crate) counters: GraphCounters,
    pub(crate) events: Option<EventCallback>,
}

impl GraphShared {
    pub(crate) fn new(config: MixerConfig, events: Option<EventCallback>) -> Self {
        let teacher_gain = GainStage::new(Slot::Teacher, config.teacher_gain);
        let music_gain = GainStage::new(Slot::Music, config.music_gain);
        let merged = Arc::new(OutputTap::new("merged", config.tap_capacity));
        let monitor = Arc::new(OutputTap::new("monitor", config.tap_capacity));

        Self {
            config,
            closed: AtomicBool::new(false),
            teacher_gain,
            music_gain,
            slots: Mutex::new(Slots::default()),
            music_epoch: AtomicU64::new(0),
            context: OutputContext::new(),
            merged,
            monitor,
            counters: GraphCounters::default(),
            events,
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn ensure_open(&self) -> Result<(), GraphError> {
        if self.is_closed() {
            return Err(GraphError::Closed);
        }
        Ok(())
    }

    /// Emits an event via the callback if registered.
    ///
    /// Never called while holding the slots lock; the callback is free to
    /// call back into the graph.
    pub(crate) fn emit(&self, event: GraphEvent) {
        if let Some(ref callback) = self.events {
            callback(event);
        }
    }

    pub(crate) fn gain_stage(&self, slot: Slot) -> &GainStage {
        match slot {
            Slot::Teacher => &self.teacher_gain,
            Slot::Music => &self.music_gain,
        }
    }

    /// Starts music playback. `epoch` of `None` means "the current
    /// binding"; a stale epoch is a no-op.
    pub(crate) fn start_music(&self, epoch: Option<u64>) -> Result<(), GraphError> {
        self.ensure_open()?;

        let mut events = Vec::new();
        {
            let mut slots = self.slots.lock();
            let Some(music) = slots.music.as_mut() else {
                return Ok(());
            };
            if epoch.is_some_and(|e| e != music.epoch) {
                return Ok(());
            }
            if music.state == SlotState::Playing {
                return Ok(());
            }

            // A suspended context must be resumed before the play command
            // takes effect.
            if self.context.resume() {
                events.push(GraphEvent::ContextResumed);
            }
            music.state = SlotState::Playing;
            events.push(GraphEvent::PlaybackStarted);
        }

        for event in events {
            self.emit(event);
        }
        tracing::debug!("music playback started");
        Ok(())
    }

    /// Stops music playback and resets the playhead to 0.
    pub(crate) fn stop_music(&self, epoch: Option<u64>) -> Result<(), GraphError> {
        self.ensure_open()?;

        let stopped = {
            let mut slots = self.slots.lock();
            match slots.music.as_mut() {
                Some(music)
                    if !epoch.is_some_and(|e| e != music.epoch)
                        && music.state == SlotState::Playing =>
                {
                    music.state = SlotState::Stopped;
                    music.track.rewind();
                    true
                }
                _ => false,
            }
        };

        if stopped {
            self.emit(GraphEvent::PlaybackStopped);
            tracing::debug!("music playback stopped");
        }
        Ok(())
    }

    /// Removes a music binding that predates the given reserving epoch,
    /// returning whether one was removed.
    ///
    /// A racing attach that already bound a newer epoch keeps its slot;
    /// only strictly older bindings are replaced.
    pub(crate) fn take_predecessor_music(&self, reserving_epoch: u64) -> bool {
        let mut slots = self.slots.lock();
        if slots
            .music
            .as_ref()
            .is_some_and(|music| music.epoch < reserving_epoch)
        {
            slots.music = None;
            true
        } else {
            false
        }
    }

    /// Removes the music binding if `epoch` still matches (or is `None`).
    pub(crate) fn detach_music(&self, epoch: Option<u64>, reason: &str) -> Result<(), GraphError> {
        self.ensure_open()?;

        let removed = {
            let mut slots = self.slots.lock();
            let current = slots
                .music
                .as_ref()
                .is_some_and(|music| !epoch.is_some_and(|e| e != music.epoch));
            if current {
                slots.music = None;
            }
            current
        };

        if removed {
            self.emit(GraphEvent::SourceDetached {
                slot: Slot::Music,
                reason: reason.to_string(),
            });
            tracing::info!(reason, "music source detached");
        }
        Ok(())
    }
}

/// Handle to a music source bound by [`MixerGraph::attach_music`].
///
/// Operations are synchronous and idempotent. A handle whose binding was
/// superseded by a newer attach (or removed) becomes inert: its operations
/// are no-ops rather than errors.
#[derive(Clone)]
pub struct MusicHandle {
    shared: Arc<GraphShared>,
    epoch: u64,
}

impl std::fmt::Debug for MusicHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MusicHandle")
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

impl MusicHandle {
    /// Begins (or resumes) playback through the music gain stage.
    ///
    /// Resumes a suspended output context first.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Closed`] after shutdown.
    pub fn start(&self) -> Result<(), GraphError> {
        self.shared.start_music(Some(self.epoch))
    }

    /// Halts playback and resets the playhead to 0.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Closed`] after shutdown.
    pub fn stop(&self) -> Result<(), GraphError> {
        self.shared.stop_music(Some(self.epoch))
    }

    /// Severs this source's connection without affecting other sources.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Closed`] after shutdown.
    pub fn disconnect(&self) -> Result<(), GraphError> {
        self.shared.detach_music(Some(self.epoch), "disconnected")
    }

    /// Returns `true` if this handle still refers to the currently bound
    /// music source.
    pub fn is_current(&self) -> bool {
        self.shared
            .slots
            .lock()
            .music
            .as_ref()
            .is_some_and(|m| m.epoch == self.epoch)
    }
}

/// The audio routing graph.
///
/// Owns a fixed mixing topology: a live microphone slot and a loaded music
/// slot, each feeding its own gain stage, both summed into a standing
/// merged output and a local monitor output. Built via
/// [`MixerGraph::builder()`]; rendering runs on a background task until
/// [`shutdown()`](MixerGraph::shutdown).
///
/// All operations take `&self`; the graph is `Send + Sync` and can be
/// shared behind an `Arc`.
///
/// # Example
///
/// ```ignore
/// use mix_audio::{MemoryContent, MicSource, MixerGraph, Slot};
/// use std::time::Duration;
///
/// let graph = MixerGraph::builder().build()?;
///
/// let (producer, mic) = MicSource::channel(48000, 1, Duration::from_secs(1));
/// graph.attach_microphone(mic)?;
///
/// let handle = graph.attach_music("bgm", &content).await?;
/// handle.start()?;
/// graph.set_gain(Slot::Music, 0.5)?;
///
/// let mut outbound = graph.merged_output().subscribe();
/// // hand `outbound` to the transmission integration...
///
/// graph.shutdown().await;
/// ```
pub struct MixerGraph {
    shared: Arc<GraphShared>,
    render_handle: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for MixerGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MixerGraph").finish_non_exhaustive()
    }
}

impl MixerGraph {
    /// Creates a builder with default configuration.
    pub fn builder() -> MixerGraphBuilder {
        MixerGraphBuilder::new()
    }

    pub(crate) fn new(shared: Arc<GraphShared>, render_handle: JoinHandle<()>) -> Self {
        Self {
            shared,
            render_handle: Mutex::new(Some(render_handle)),
        }
    }

    /// Binds a live input stream into the teacher slot.
    ///
    /// If a microphone source is already attached, the prior one is
    /// disconnected and discarded first - afterwards the merged output
    /// carries audio only from the new stream.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidSource`] if the stream declares a zero
    /// or mismatched format, [`GraphError::Closed`] after shutdown.
    pub fn attach_microphone(&self, source: MicSource) -> Result<(), GraphError> {
        self.shared.ensure_open()?;

        if source.sample_rate() == 0 || source.channels() == 0 {
            return Err(GraphError::invalid_source(
                "stream declares zero sample rate or channels",
            ));
        }
        let cfg = &self.shared.config;
        if source.sample_rate() != cfg.sample_rate || source.channels() != cfg.channels {
            return Err(GraphError::invalid_source(format!(
                "stream format {}Hz/{}ch does not match graph format {}Hz/{}ch",
                source.sample_rate(),
                source.channels(),
                cfg.sample_rate,
                cfg.channels
            )));
        }

        let replaced = {
            let mut slots = self.shared.slots.lock();
            slots.mic.replace(MicBinding { source }).is_some()
        };

        if replaced {
            self.shared.emit(GraphEvent::SourceDetached {
                slot: Slot::Teacher,
                reason: "replaced".to_string(),
            });
        }
        self.shared.emit(GraphEvent::SourceAttached {
            slot: Slot::Teacher,
        });
        tracing::info!("microphone source attached");
        Ok(())
    }

    /// Loads content via `content` and binds it into the music slot.
    ///
    /// The prior music source (if any) is disconnected before the load
    /// begins, so a failed load leaves the slot absent rather than
    /// half-bound. The loaded audio is adapted to the graph format
    /// (channel conversion plus linear resampling) once, at attach time.
    ///
    /// The graph performs no retries; sequencing over candidate locators
    /// belongs to the caller (see [`load_first`](crate::load_first)).
    ///
    /// # Errors
    ///
    /// - [`GraphError::LoadFailed`]: content could not be fetched/decoded
    /// - [`GraphError::LoadSuperseded`]: a newer attach won the slot while
    ///   this load was in flight; the result was discarded
    /// - [`GraphError::Closed`]: the graph shut down during the load
    pub async fn attach_music<C>(
        &self,
        locator: &str,
        content: &C,
    ) -> Result<MusicHandle, GraphError>
    where
        C: ContentSource + ?Sized,
    {
        self.shared.ensure_open()?;

        // Reserve the binding epoch before awaiting so a later attach
        // supersedes this load even if this load resolves first.
        let epoch = self.shared.music_epoch.fetch_add(1, Ordering::SeqCst) + 1;

        let detached = self.shared.take_predecessor_music(epoch);
        if detached {
            self.shared.emit(GraphEvent::SourceDetached {
                slot: Slot::Music,
                reason: "replaced".to_string(),
            });
        }

        let decoded = content.load(locator).await?;

        if self.shared.is_closed() {
            return Err(GraphError::Closed);
        }
        if self.shared.music_epoch.load(Ordering::SeqCst) != epoch {
            return self.discard_stale_load(locator);
        }
        if decoded.sample_rate == 0 || decoded.channels == 0 {
            return Err(GraphError::load_failed(
                locator,
                "decoded audio declares zero sample rate or channels",
            ));
        }

        let cfg = &self.shared.config;
        let samples = format::convert_channels(&decoded.samples, decoded.channels, cfg.channels);
        let samples =
            format::resample_linear(&samples, cfg.channels, decoded.sample_rate, cfg.sample_rate);
        let track = MusicTrack::new(samples, cfg.channels);
        let frames = track.frame_count();

        {
            let mut slots = self.shared.slots.lock();
            // Re-check under the lock; a racing attach may have bumped the
            // epoch since the check above.
            if self.shared.music_epoch.load(Ordering::SeqCst) != epoch {
                drop(slots);
                return self.discard_stale_load(locator);
            }
            slots.music = Some(MusicBinding {
                track,
                state: SlotState::Attached,
                epoch,
            });
        }

        self.shared
            .emit(GraphEvent::SourceAttached { slot: Slot::Music });
        tracing::info!(locator, frames, "music source attached");

        Ok(MusicHandle {
            shared: Arc::clone(&self.shared),
            epoch,
        })
    }

    fn discard_stale_load(&self, locator: &str) -> Result<MusicHandle, GraphError> {
        self.shared.emit(GraphEvent::StaleLoadDiscarded {
            locator: locator.to_string(),
        });
        tracing::debug!(locator, "discarded load superseded by a newer attach");
        Err(GraphError::LoadSuperseded {
            locator: locator.to_string(),
        })
    }

    /// Writes a gain value for a slot, clamping it into [0, 1].
    ///
    /// Any numeric input is accepted; the change is audible in the next
    /// rendered chunk.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Closed`] after shutdown - values themselves
    /// have no error path.
    pub fn set_gain(&self, slot: Slot, value: f32) -> Result<(), GraphError> {
        self.shared.ensure_open()?;
        let stage = self.shared.gain_stage(slot);
        let applied = stage.set(value);
        self.shared.emit(GraphEvent::GainChanged {
            slot,
            value: applied,
        });
        tracing::debug!(slot = %stage.slot(), applied, "gain changed");
        Ok(())
    }

    /// Reads the current (clamped) gain value for a slot.
    pub fn gain(&self, slot: Slot) -> f32 {
        self.shared.gain_stage(slot).get()
    }

    /// Starts playback for a slot.
    ///
    /// Only the music slot has a play concept; `start(Slot::Teacher)` is a
    /// no-op (the microphone is live once attached). Starting
    /// already-playing music is a no-op. A suspended output context is
    /// resumed before playback begins.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Closed`] after shutdown.
    pub fn start(&self, slot: Slot) -> Result<(), GraphError> {
        match slot {
            Slot::Music => self.shared.start_music(None),
            Slot::Teacher => self.shared.ensure_open(),
        }
    }

    /// Stops playback for a slot, resetting the playhead to 0.
    ///
    /// No-op for the teacher slot and for already-stopped music.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Closed`] after shutdown.
    pub fn stop(&self, slot: Slot) -> Result<(), GraphError> {
        match slot {
            Slot::Music => self.shared.stop_music(None),
            Slot::Teacher => self.shared.ensure_open(),
        }
    }

    /// Returns the standing merged output tap.
    ///
    /// The same object for the graph's whole lifetime - consumers may
    /// cache the handle. Remains valid (but quiet) after shutdown and
    /// after failed attaches.
    pub fn merged_output(&self) -> Arc<OutputTap> {
        Arc::clone(&self.shared.merged)
    }

    /// Returns the standing local-monitor output tap.
    ///
    /// Carries the same post-gain mix as the merged output, with
    /// independent subscribers.
    pub fn monitor_output(&self) -> Arc<OutputTap> {
        Arc::clone(&self.shared.monitor)
    }

    /// Returns the graph's output context.
    pub fn context(&self) -> &OutputContext {
        &self.shared.context
    }

    /// Returns the state of a slot.
    pub fn slot_state(&self, slot: Slot) -> SlotState {
        let slots = self.shared.slots.lock();
        match slot {
            Slot::Teacher => {
                if slots.mic.is_some() {
                    SlotState::Attached
                } else {
                    SlotState::Absent
                }
            }
            Slot::Music => slots.music.as_ref().map_or(SlotState::Absent, |m| m.state),
        }
    }

    /// Returns the number of live connections into the merge point.
    pub fn attached_count(&self) -> usize {
        let slots = self.shared.slots.lock();
        usize::from(slots.mic.is_some()) + usize::from(slots.music.is_some())
    }

    /// Returns `true` once the graph has been shut down.
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Returns a snapshot of render statistics.
    pub fn stats(&self) -> MixerStats {
        MixerStats {
            chunks_mixed: self.shared.counters.chunks_mixed.load(Ordering::SeqCst),
            frames_rendered: self.shared.counters.frames_rendered.load(Ordering::SeqCst),
            mic_underruns: self.shared.counters.mic_underruns.load(Ordering::SeqCst),
        }
    }

    /// Shuts the graph down: detaches all sources, stops the render loop,
    /// and waits for it to finish.
    ///
    /// Idempotent - calling shutdown again (or concurrently) is harmless.
    /// All mutating operations afterwards fail with [`GraphError::Closed`].
    pub async fn shutdown(&self) {
        if !self.shared.closed.swap(true, Ordering::SeqCst) {
            let (had_mic, had_music) = {
                let mut slots = self.shared.slots.lock();
                (slots.mic.take().is_some(), slots.music.take().is_some())
            };
            if had_mic {
                self.shared.emit(GraphEvent::SourceDetached {
                    slot: Slot::Teacher,
                    reason: "shutdown".to_string(),
                });
            }
            if had_music {
                self.shared.emit(GraphEvent::SourceDetached {
                    slot: Slot::Music,
                    reason: "shutdown".to_string(),
                });
            }
            tracing::info!("mixer graph shut down");
        }

        let handle = self.render_handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

impl Drop for MixerGraph {
    fn drop(&mut self) {
        // Graph dropped without explicit shutdown() - flag the render loop
        // to stop on its next tick.
        self.shared.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{DecodedAudio, MemoryContent};
    use parking_lot::Mutex as PlMutex;
    use std::time::Duration;

    fn test_config() -> MixerConfig {
        MixerConfig {
            sample_rate: 8000,
            channels: 1,
            chunk_duration: Duration::from_millis(10),
            ..Default::default()
        }
    }

    fn test_graph() -> MixerGraph {
        MixerGraph::builder()
            .with_config(test_config())
            .build()
            .unwrap()
    }

    fn music_content() -> MemoryContent {
        let content = MemoryContent::new();
        content.insert("bgm", DecodedAudio::sine(440.0, 0.5, 200, 8000, 1));
        content
    }

    #[tokio::test]
    async fn test_default_gains() {
        let graph = test_graph();
        assert_eq!(graph.gain(Slot::Teacher), 1.0);
        assert_eq!(graph.gain(Slot::Music), 0.3);
        graph.shutdown().await;
    }

    #[tokio::test]
    async fn test_set_gain_clamps() {
        let graph = test_graph();

        graph.set_gain(Slot::Music, 1.5).unwrap();
        assert_eq!(graph.gain(Slot::Music), 1.0);

        graph.set_gain(Slot::Teacher, -0.2).unwrap();
        assert_eq!(graph.gain(Slot::Teacher), 0.0);

        graph.set_gain(Slot::Music, f32::NAN).unwrap();
        assert_eq!(graph.gain(Slot::Music), 0.0);

        graph.shutdown().await;
    }

    #[tokio::test]
    async fn test_attach_microphone_rejects_mismatched_format() {
        let graph = test_graph();

        let (_producer, source) = MicSource::channel(44100, 2, Duration::from_millis(100));
        let err = graph.attach_microphone(source).unwrap_err();
        assert!(matches!(err, GraphError::InvalidSource { .. }));
        assert_eq!(graph.slot_state(Slot::Teacher), SlotState::Absent);

        graph.shutdown().await;
    }

    #[tokio::test]
    async fn test_attach_microphone_replace_keeps_single_connection() {
        let graph = test_graph();

        let (_p1, mic1) = MicSource::channel(8000, 1, Duration::from_millis(100));
        let (_p2, mic2) = MicSource::channel(8000, 1, Duration::from_millis(100));

        graph.attach_microphone(mic1).unwrap();
        graph.attach_microphone(mic2).unwrap();

        assert_eq!(graph.slot_state(Slot::Teacher), SlotState::Attached);
        assert_eq!(graph.attached_count(), 1);

        graph.shutdown().await;
    }

    #[tokio::test]
    async fn test_attach_music_replace_keeps_single_connection() {
        let graph = test_graph();
        let content = music_content();

        graph.attach_music("bgm", &content).await.unwrap();
        graph.attach_music("bgm", &content).await.unwrap();

        assert_eq!(graph.attached_count(), 1);
        assert_eq!(graph.slot_state(Slot::Music), SlotState::Attached);

        graph.shutdown().await;
    }

    #[tokio::test]
    async fn test_failed_load_leaves_slot_absent() {
        let graph = test_graph();
        let content = music_content();

        // Attach, then fail a replacement load: the slot must end absent,
        // not keep the old binding half-alive.
        graph.attach_music("bgm", &content).await.unwrap();
        let err = graph.attach_music("missing", &content).await.unwrap_err();
        assert!(matches!(err, GraphError::LoadFailed { .. }));
        assert_eq!(graph.slot_state(Slot::Music), SlotState::Absent);

        // The graph stays usable
        graph.attach_music("bgm", &content).await.unwrap();
        assert_eq!(graph.slot_state(Slot::Music), SlotState::Attached);

        graph.shutdown().await;
    }

    #[tokio::test]
    async fn test_music_state_machine() {
        let graph = test_graph();
        let content = music_content();

        assert_eq!(graph.slot_state(Slot::Music), SlotState::Absent);

        let handle = graph.attach_music("bgm", &content).await.unwrap();
        assert_eq!(graph.slot_state(Slot::Music), SlotState::Attached);

        handle.start().unwrap();
        assert_eq!(graph.slot_state(Slot::Music), SlotState::Playing);

        // Idempotent start
        handle.start().unwrap();
        assert_eq!(graph.slot_state(Slot::Music), SlotState::Playing);

        handle.stop().unwrap();
        assert_eq!(graph.slot_state(Slot::Music), SlotState::Stopped);

        // Idempotent stop
        handle.stop().unwrap();
        assert_eq!(graph.slot_state(Slot::Music), SlotState::Stopped);

        handle.disconnect().unwrap();
        assert_eq!(graph.slot_state(Slot::Music), SlotState::Absent);

        graph.shutdown().await;
    }

    #[tokio::test]
    async fn test_start_on_teacher_slot_is_noop() {
        let graph = test_graph();
        graph.start(Slot::Teacher).unwrap();
        graph.stop(Slot::Teacher).unwrap();
        graph.shutdown().await;
    }

    #[tokio::test]
    async fn test_start_on_empty_music_slot_is_noop() {
        let graph = test_graph();
        graph.start(Slot::Music).unwrap();
        assert_eq!(graph.slot_state(Slot::Music), SlotState::Absent);
        graph.shutdown().await;
    }

    #[tokio::test]
    async fn test_start_resumes_suspended_context_first() {
        let events: Arc<PlMutex<Vec<GraphEvent>>> = Arc::new(PlMutex::new(Vec::new()));
        let sink = Arc::clone(&events);

        let graph = MixerGraph::builder()
            .with_config(test_config())
            .on_event(move |e| sink.lock().push(e))
            .build()
            .unwrap();
        let content = music_content();

        let handle = graph.attach_music("bgm", &content).await.unwrap();
        graph.context().suspend();
        assert!(!graph.context().is_running());

        handle.start().unwrap();
        assert!(graph.context().is_running());

        // ContextResumed must be ordered before PlaybackStarted
        let recorded = events.lock();
        let resumed_at = recorded
            .iter()
            .position(|e| matches!(e, GraphEvent::ContextResumed))
            .expect("ContextResumed emitted");
        let started_at = recorded
            .iter()
            .position(|e| matches!(e, GraphEvent::PlaybackStarted))
            .expect("PlaybackStarted emitted");
        assert!(resumed_at < started_at);
        drop(recorded);

        graph.shutdown().await;
    }

    #[tokio::test]
    async fn test_replace_leaves_newer_binding_alone() {
        let graph = test_graph();
        let content = music_content();

        let handle = graph.attach_music("bgm", &content).await.unwrap();
        assert!(handle.is_current());

        // The replace pass of an attach that reserved an *older* epoch
        // must not remove a binding that is already newer than it.
        assert!(!graph.shared.take_predecessor_music(handle.epoch));
        assert!(!graph.shared.take_predecessor_music(0));
        assert!(handle.is_current());
        assert_eq!(graph.slot_state(Slot::Music), SlotState::Attached);

        // A newer reservation does supersede it
        assert!(graph.shared.take_predecessor_music(handle.epoch + 1));
        assert!(!handle.is_current());
        assert_eq!(graph.slot_state(Slot::Music), SlotState::Absent);

        graph.shutdown().await;
    }

    #[tokio::test]
    async fn test_stale_handle_is_inert() {
        let graph = test_graph();
        let content = music_content();

        let old = graph.attach_music("bgm", &content).await.unwrap();
        let new = graph.attach_music("bgm", &content).await.unwrap();

        assert!(!old.is_current());
        assert!(new.is_current());

        // Stale handle operations are no-ops
        old.start().unwrap();
        assert_eq!(graph.slot_state(Slot::Music), SlotState::Attached);
        old.disconnect().unwrap();
        assert_eq!(graph.slot_state(Slot::Music), SlotState::Attached);

        graph.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let graph = test_graph();
        let content = music_content();
        graph.attach_music("bgm", &content).await.unwrap();

        graph.shutdown().await;
        assert!(graph.is_closed());
        graph.shutdown().await;
        assert!(graph.is_closed());
        assert_eq!(graph.attached_count(), 0);
    }

    #[tokio::test]
    async fn test_operations_fail_after_shutdown() {
        let graph = test_graph();
        let content = music_content();
        let handle = graph.attach_music("bgm", &content).await.unwrap();

        graph.shutdown().await;

        assert!(matches!(
            graph.set_gain(Slot::Music, 0.5),
            Err(GraphError::Closed)
        ));
        assert!(matches!(graph.start(Slot::Music), Err(GraphError::Closed)));
        assert!(matches!(handle.start(), Err(GraphError::Closed)));

        let (_p, mic) = MicSource::channel(8000, 1, Duration::from_millis(100));
        assert!(matches!(
            graph.attach_microphone(mic),
            Err(GraphError::Closed)
        ));
        assert!(matches!(
            graph.attach_music("bgm", &content).await,
            Err(GraphError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_merged_output_identity_is_stable() {
        let graph = test_graph();

        let a = graph.merged_output();
        let b = graph.merged_output();
        assert!(Arc::ptr_eq(&a, &b));

        graph.shutdown().await;

        // Still the same object after shutdown
        let c = graph.merged_output();
        assert!(Arc::ptr_eq(&a, &c));
    }

    #[tokio::test]
    async fn test_music_adapted_to_graph_format() {
        let graph = test_graph();
        let content = MemoryContent::new();
        // Stereo 16kHz content into a mono 8kHz graph
        content.insert("wide", DecodedAudio::sine(220.0, 0.5, 100, 16000, 2));

        let handle = graph.attach_music("wide", &content).await.unwrap();
        assert!(handle.is_current());
        assert_eq!(graph.slot_state(Slot::Music), SlotState::Attached);

        graph.shutdown().await;
    }
}
