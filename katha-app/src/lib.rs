//! Katha application layer.
//!
//! Wires the `katha` story core to configuration, concrete backends and an
//! axum web form. The `katha` binary is a thin clap front end over this crate.

pub mod backend;
pub mod config;
pub mod error;
pub mod server;

pub use error::{AppError, Result};
