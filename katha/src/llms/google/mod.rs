//! Google Translate text-to-speech client.
//!
//! Uses the same `batchexecute` endpoint the Translate web page calls to read
//! text aloud. It needs no credential and always returns MP3. Long text is
//! split into short chunks, each chunk is synthesized separately, and the MP3
//! frames are concatenated in order.

mod client;
mod config;

pub use client::GoogleTts;
pub use config::GoogleTtsConfig;
