//! Runtime events for monitoring graph activity.
//!
//! Events are non-fatal notifications about graph behavior. The graph
//! continues running after events are emitted - they're for logging/metrics
//! and UI status, not error handling.

use std::sync::Arc;

use crate::slot::Slot;

/// Runtime events emitted by the mixing graph.
///
/// These are informational events, not errors. Use the [`EventCallback`] to
/// log them or drive UI status.
///
/// # Example
///
/// ```
/// use mix_audio::GraphEvent;
///
/// fn handle_event(event: GraphEvent) {
///     match event {
///         GraphEvent::SourceAttached { slot } => {
///             eprintln!("source attached: {slot}");
///         }
///         GraphEvent::SourceDetached { slot, reason } => {
///             eprintln!("source detached: {slot} ({reason})");
///         }
///         GraphEvent::GainChanged { slot, value } => {
///             eprintln!("gain for {slot} is now {value}");
///         }
///         GraphEvent::PlaybackStarted => eprintln!("music playing"),
///         GraphEvent::PlaybackStopped => eprintln!("music stopped"),
///         GraphEvent::ContextResumed => eprintln!("output context resumed"),
///         GraphEvent::StaleLoadDiscarded { locator } => {
///             eprintln!("discarded stale load of {locator}");
///         }
///         GraphEvent::MicUnderrun { missing_frames } => {
///             eprintln!("mic underrun: {missing_frames} frames padded");
///         }
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub enum GraphEvent {
    /// A source was bound into a slot.
    SourceAttached {
        /// Slot that received the source.
        slot: Slot,
    },

    /// A source was removed from a slot.
    ///
    /// Emitted on explicit disconnect, on replacement by a newer attach,
    /// and on shutdown.
    SourceDetached {
        /// Slot that lost its source.
        slot: Slot,
        /// Why the source was detached.
        reason: String,
    },

    /// A gain stage was written (value already clamped into [0, 1]).
    GainChanged {
        /// Slot whose gain changed.
        slot: Slot,
        /// The applied (clamped) gain value.
        value: f32,
    },

    /// Music playback started.
    PlaybackStarted,

    /// Music playback stopped and the playhead was reset.
    PlaybackStopped,

    /// The output context was resumed from its suspended state.
    ///
    /// Always emitted before [`PlaybackStarted`] when starting playback
    /// against a suspended context.
    ///
    /// [`PlaybackStarted`]: GraphEvent::PlaybackStarted
    ContextResumed,

    /// A completed load was discarded because a newer attach superseded it.
    StaleLoadDiscarded {
        /// Locator whose load result was discarded.
        locator: String,
    },

    /// The microphone ring buffer held fewer samples than one chunk;
    /// the missing frames were rendered as silence.
    MicUnderrun {
        /// Number of frames padded with silence.
        missing_frames: usize,
    },
}

/// Callback type for receiving runtime events.
///
/// Register an event callback via [`MixerGraphBuilder::on_event()`] to
/// receive notifications about attach/detach, gain changes, and playback
/// transitions.
///
/// [`MixerGraphBuilder::on_event()`]: crate::MixerGraphBuilder::on_event
///
/// # Example
///
/// ```ignore
/// use mix_audio::MixerGraph;
///
/// let graph = MixerGraph::builder()
///     .on_event(|event| {
///         tracing::info!(?event, "graph event");
///     })
///     .build()?;
/// ```
pub type EventCallback = Arc<dyn Fn(GraphEvent) + Send + Sync>;

/// Creates an [`EventCallback`] from a closure.
///
/// This is a convenience function for creating event callbacks without
/// manually wrapping in `Arc`.
///
/// # Example
///
/// ```
/// use mix_audio::{event_callback, GraphEvent};
///
/// let callback = event_callback(|event| {
///     println!("Got event: {:?}", event);
/// });
/// ```
pub fn event_callback<F>(f: F) -> EventCallback
where
    F: Fn(GraphEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_event_debug() {
        let event = GraphEvent::GainChanged {
            slot: Slot::Music,
            value: 0.3,
        };
        let debug = format!("{:?}", event);
        assert!(debug.contains("GainChanged"));
        assert!(debug.contains("0.3"));
    }

    #[test]
    fn test_graph_event_clone() {
        let event = GraphEvent::SourceDetached {
            slot: Slot::Teacher,
            reason: "replaced".to_string(),
        };
        let cloned = event.clone();
        if let GraphEvent::SourceDetached { slot, reason } = cloned {
            assert_eq!(slot, Slot::Teacher);
            assert_eq!(reason, "replaced");
        } else {
            panic!("Expected SourceDetached variant");
        }
    }

    #[test]
    fn test_event_callback_helper() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();

        let callback = event_callback(move |_| {
            called_clone.store(true, Ordering::SeqCst);
        });

        callback(GraphEvent::PlaybackStarted);
        assert!(called.load(Ordering::SeqCst));
    }
}
