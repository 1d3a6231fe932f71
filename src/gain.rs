//! Lock-free gain stages.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::slot::Slot;

/// Clamps a gain value into [0.0, 1.0].
///
/// NaN clamps to 0.0 (silent) so a bad write can never produce noise.
pub(crate) fn clamp_gain(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// A volume-control point that scales a signal by a scalar in [0, 1].
///
/// The value is stored as f32 bits in an atomic so the render loop reads it
/// without taking any lock. Every write clamps; out-of-range input is
/// silently clamped, never rejected.
#[derive(Debug)]
pub(crate) struct GainStage {
    slot: Slot,
    bits: AtomicU32,
}

impl GainStage {
    /// Creates a gain stage for a slot with a clamped initial value.
    pub(crate) fn new(slot: Slot, initial: f32) -> Self {
        Self {
            slot,
            bits: AtomicU32::new(clamp_gain(initial).to_bits()),
        }
    }

    /// Returns the slot this stage belongs to.
    pub(crate) fn slot(&self) -> Slot {
        self.slot
    }

    /// Writes a new gain value, clamping it into [0, 1].
    ///
    /// Returns the applied (clamped) value.
    pub(crate) fn set(&self, value: f32) -> f32 {
        let clamped = clamp_gain(value);
        self.bits.store(clamped.to_bits(), Ordering::Release);
        clamped
    }

    /// Reads the current gain value.
    pub(crate) fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Acquire))
    }
}
