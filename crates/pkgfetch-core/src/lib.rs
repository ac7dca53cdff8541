//! Core data types for pkgfetch.
//!
//! This crate defines the types the resolution engine operates on: versioned
//! package specifications, the package dependency graph and its textual file
//! format, the toolchain manifest, cache snapshots, and run configuration.
//!
//! This crate does not spawn processes or touch package repositories.

pub mod config;
pub mod dot;
pub mod graph;
pub mod package;
pub mod snapshot;
pub mod toolchain;
