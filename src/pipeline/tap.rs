//! Output taps - standing fan-out points for rendered audio.

use tokio::sync::broadcast;

use crate::chunk::AudioChunk;

/// A standing output of the mixing graph.
///
/// The graph creates its two taps (merged and monitor) once at
/// construction; their identity never changes for the graph's lifetime, so
/// consumers may cache the handle. Consumers [`subscribe()`] and receive
/// every chunk rendered after that point; they only read, never mutate
/// graph wiring.
///
/// A subscriber that falls behind by more than the tap capacity skips
/// ahead to the oldest retained chunk (live audio is not worth backlogging
/// for a slow consumer).
///
/// [`subscribe()`]: OutputTap::subscribe
#[derive(Debug)]
pub struct OutputTap {
    name: &'static str,
    sender: broadcast::Sender<AudioChunk>,
}

impl OutputTap {
    /// Creates a tap with the given name and per-subscriber capacity.
    pub(crate) fn new(name: &'static str, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { name, sender }
    }

    /// Human-readable tap name ("merged" or "monitor").
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Subscribes to chunks rendered from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<AudioChunk> {
        self.sender.subscribe()
    }

    /// Returns the number of current subscribers.
    pub fn consumer_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes a chunk to all subscribers.
    ///
    /// Publishing with no subscribers is fine; the chunk is dropped.
    pub(crate) fn publish(&self, chunk: AudioChunk) {
        let _ = self.sender.send(chunk);
    }
}
