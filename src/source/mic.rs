//! Live microphone source over a lock-free ring buffer.
//!
//! The microphone device itself is owned by an external collaborator (a
//! capture callback, a capture crate, a test harness). The collaborator
//! pushes f32 samples through a [`MicProducer`]; the graph consumes them
//! from the paired [`MicSource`]. The ring buffer keeps the producer side
//! non-blocking.

use std::time::Duration;

use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

/// Producer half of a microphone channel.
///
/// Hand this to whatever owns the capture device. Pushing never blocks;
/// samples that don't fit in the ring buffer are dropped and the number
/// actually written is returned.
pub struct MicProducer {
    producer: HeapProd<f32>,
}

impl MicProducer {
    /// Pushes interleaved f32 samples, returning how many were accepted.
    pub fn push(&mut self, samples: &[f32]) -> usize {
        self.producer.push_slice(samples)
    }

    /// Returns how many samples the ring buffer can accept right now.
    pub fn free_len(&self) -> usize {
        self.producer.vacant_len()
    }
}

/// A live audio input bound into the graph's teacher slot.
///
/// Created together with its [`MicProducer`] via [`MicSource::channel`].
/// The graph exclusively owns the consumer half once the source is
/// attached; dropping a replaced source severs the old connection.
///
/// # Example
///
/// ```
/// use mix_audio::MicSource;
/// use std::time::Duration;
///
/// let (mut producer, source) = MicSource::channel(48000, 1, Duration::from_secs(1));
/// let pushed = producer.push(&[0.1, 0.2, 0.3]);
/// assert_eq!(pushed, 3);
/// assert_eq!(source.sample_rate(), 48000);
/// ```
pub struct MicSource {
    consumer: HeapCons<f32>,
    sample_rate: u32,
    channels: u16,
}

impl MicSource {
    /// Creates a producer/source pair backed by a ring buffer holding
    /// `capacity` worth of audio.
    pub fn channel(sample_rate: u32, channels: u16, capacity: Duration) -> (MicProducer, Self) {
        let samples =
            (f64::from(sample_rate) * capacity.as_secs_f64()) as usize * channels as usize;
        let rb = HeapRb::<f32>::new(samples.max(1));
        let (producer, consumer) = rb.split();

        (
            MicProducer { producer },
            Self {
                consumer,
                sample_rate,
                channels,
            },
        )
    }

    /// Wraps an existing ring buffer consumer as a microphone source.
    ///
    /// For callers that already own a capture pipeline producing into a
    /// `ringbuf` ring.
    pub fn from_consumer(consumer: HeapCons<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            consumer,
            sample_rate,
            channels,
        }
    }

    /// Returns the sample rate this source produces.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the channel count this source produces.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Returns the number of samples currently buffered.
    pub fn available(&self) -> usize {
        self.consumer.occupied_len()
    }

    /// Pops up to `out.len()` samples into `out`, returning how many were
    /// written. The remainder of `out` is untouched; the render loop pads
    /// with silence on underrun.
    pub(crate) fn read(&mut self, out: &mut [f32]) -> usize {
        self.consumer.pop_slice(out)
    }
}
