//! Transcript ingestion, normalization, and live caption synchronization for
//! embeddable audio players.
//!
//! This crate provides:
//! - Classification and parsing of the three transcript wire formats
//!   (SubRip, WebVTT, JSON segments)
//! - Re-segmentation of timed text into speaker-grouped caption blocks
//! - A binary-search locator from an active cue to its owning block
//! - A playback sync controller that tracks the current caption, spoken
//!   flags, and scroll intent against an advancing playback clock
//!
//! The library is designed to sit behind a platform adapter (DOM, native
//! player, or a test fake): it owns no I/O, no timers, and no rendering, with
//! an emphasis on total conversion functions and recomputing state from
//! scratch per event.

// High-level API (most consumers should start here).
pub mod engine;
pub mod opts;

// Core data model.
pub mod cue;
pub mod segment;

// Timestamp codec used by every wire format.
pub mod timestamp;

// Wire-format classification, parsing, and conversion.
pub mod classify;
pub mod convert;
pub mod srt;
pub mod vtt;

// Streaming output writers.
pub mod cue_writer;
pub mod json_writer;

// Caption block derivation and lookup.
pub mod colors;
pub mod grouping;
pub mod locator;

// Playback synchronization.
pub mod sync;

// Logging configuration and control.
#[cfg(feature = "logging")]
pub mod logging;

mod error;

pub use error::{Error, Result};
