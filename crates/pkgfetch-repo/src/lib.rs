//! Package repository plumbing: the [`cloner::RepoCloner`] seam the resolver
//! fetches through, a dnf-backed implementation, the `rpm`-backed
//! competing-package solver, and clone cache snapshots.

pub mod cloner;
pub mod contents;
pub mod dnf;
pub mod solver;

/// File extension of binary package artifacts.
pub const ARTIFACT_EXTENSION: &str = "rpm";
