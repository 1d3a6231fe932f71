//! Audio source abstractions.
//!
//! Two kinds of source feed the graph:
//!
//! - **Live input** ([`MicSource`]): an externally-owned capture device
//!   pushes samples through a lock-free ring buffer.
//! - **Loaded content** ([`ContentSource`] → [`DecodedAudio`]): a locator
//!   resolved asynchronously into decoded samples, bound as the music
//!   track.

mod content;
mod mic;
pub(crate) mod music;
mod wav;

pub use content::{load_first, ContentSource, DecodedAudio, MemoryContent};
pub use mic::{MicProducer, MicSource};
pub use wav::WavContent;
