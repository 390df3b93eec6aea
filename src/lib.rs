//! reelgap - find missing movies and TV episodes
//!
//! Compares what a Plex library owns against TMDB collections and TVDB
//! series and reports the gaps.

pub mod cache;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod eta;
pub mod gaps;
pub mod sources;
pub mod stats;
pub mod ui;

pub use error::{ReelgapError, ReelgapResult};
