//! # mix-audio
//!
//! **Note:** This crate is under active development. The API may change before 1.0.
//!
//! In-process audio mixing with a fixed routing topology.
//!
//! `mix-audio` mixes a live microphone stream with loaded music content
//! through per-source gain stages into one merged output, rendered
//! continuously on a background task. It is the mixing core for a
//! lesson/stream application: the teacher's voice stays primary, the music
//! bed sits underneath, and the merged feed goes to the outbound
//! transmission path while a monitor feed stays local.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mix_audio::{MicSource, MixerGraph, Slot, WavContent};
//! use std::time::Duration;
//!
//! let graph = MixerGraph::builder()
//!     .sample_rate(48000)
//!     .channels(1)
//!     .on_event(|e| tracing::debug!(?e, "graph event"))
//!     .build()?;
//!
//! // Wire the capture device: it pushes, the graph pulls
//! let (producer, mic) = MicSource::channel(48000, 1, Duration::from_secs(1));
//! graph.attach_microphone(mic)?;
//!
//! // Load and start background music at a low level
//! let content = WavContent::new("assets/audio");
//! let music = graph.attach_music("lesson-bgm.wav", &content).await?;
//! music.start()?;
//! graph.set_gain(Slot::Music, 0.25)?;
//!
//! // The merged feed goes out; subscribe and forward
//! let mut outbound = graph.merged_output().subscribe();
//! while let Ok(chunk) = outbound.recv().await {
//!     // hand chunk.samples to the transmission integration
//! }
//!
//! graph.shutdown().await;
//! ```
//!
//! ## Architecture
//!
//! The topology is fixed at construction and never rewired:
//!
//! - **Capture boundary**: the device callback pushes into a lock-free
//!   SPSC ring buffer; the graph side only pops
//! - **Render loop**: a Tokio task ticks once per chunk, reads both slots,
//!   applies gains, sums, and clamps
//! - **Output taps**: two standing broadcast points (merged and monitor)
//!   that consumers subscribe to without ever touching graph wiring
//!
//! Everything varies by state, not structure: which sources are attached,
//! whether music is playing, and what the gain values are.

// unsafe_code lint is configured in Cargo.toml as "deny"
#![warn(missing_docs)]
// Audio code requires intentional numeric casts between sample formats
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_lossless
)]
// unwrap/expect allowed in tests only
#![allow(clippy::unwrap_used)]
// These doc lints are too strict for internal implementation details
#![allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]

mod builder;
mod chunk;
mod config;
mod context;
mod error;
mod event;
pub mod format;
mod gain;
mod graph;
mod pipeline;
mod slot;
pub mod source;

pub use builder::MixerGraphBuilder;
pub use chunk::AudioChunk;
pub use config::{MixerConfig, DEFAULT_MUSIC_GAIN, DEFAULT_TEACHER_GAIN};
pub use context::OutputContext;
pub use error::GraphError;
pub use event::{event_callback, EventCallback, GraphEvent};
pub use graph::{MixerGraph, MixerStats, MusicHandle};
pub use pipeline::OutputTap;
pub use slot::{Slot, SlotState};
pub use source::{
    load_first, ContentSource, DecodedAudio, MemoryContent, MicProducer, MicSource, WavContent,
};
