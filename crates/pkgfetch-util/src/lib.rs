//! Shared utilities for pkgfetch.
//!
//! This crate provides cross-cutting concerns used by all other pkgfetch crates:
//! the run-level error type, filesystem helpers, SHA-256 hashing, external
//! process spawning, and Cargo-style terminal status output.

pub mod errors;
pub mod fs;
pub mod hash;
pub mod process;
pub mod progress;
