//! Bookshelf application library.
//!
//! Application modules live here; the kernel, HTTP, and telemetry crates
//! provide everything else.

pub mod modules;
