//! Renderforge - render and inspect media files through external tools
//!
//! This library crate exposes the configuration layer for integration testing.

pub mod config;
