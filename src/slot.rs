//! Slot identifiers and per-slot source state.

/// A named position in the mixing topology.
///
/// Each slot holds at most one active source at a time. Attaching a new
/// source to an occupied slot detaches and discards the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// The live microphone input ("teacher" channel).
    Teacher,
    /// The loaded background music track.
    Music,
}

impl Slot {
    /// Returns the slot name as a string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Teacher => "teacher",
            Self::Music => "music",
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of the source bound into a slot.
///
/// Transitions: `Absent → Attached` (attach), `Attached → Playing` (start,
/// music only), `Playing → Stopped` (stop), any state `→ Absent`
/// (disconnect, replace, or shutdown).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotState {
    /// No source is bound.
    #[default]
    Absent,
    /// A source is bound but not playing.
    Attached,
    /// The source is producing audio (music slot only; the microphone is
    /// always live once attached and stays `Attached`).
    Playing,
    /// Playback was halted and the playhead reset to 0.
    Stopped,
}

impl SlotState {
    /// Returns the state name as a string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Attached => "attached",
            Self::Playing => "playing",
            Self::Stopped => "stopped",
        }
    }

    /// Returns `true` if a source is bound (any state except `Absent`).
    pub fn is_attached(&self) -> bool {
        !matches!(self, Self::Absent)
    }
}

impl std::fmt::Display for SlotState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
