use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for run-level pkgfetch failures.
///
/// Per-node failures have their own type in `pkgfetch-resolver` and never
/// surface here except through [`PkgfetchError::CachingFailed`].
#[derive(Debug, Error, Diagnostic)]
pub enum PkgfetchError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or inconsistent configuration.
    #[error("Configuration error: {message}")]
    #[diagnostic(help("Check the config file and command-line flags"))]
    Config { message: String },

    /// The package cloner could not be set up.
    #[error("Failed to initialize package cloner: {message}")]
    ClonerInit { message: String },

    /// Reading or writing the dependency graph file failed.
    #[error("Graph I/O error on '{path}': {message}")]
    GraphIo { path: String, message: String },

    /// Restoring the clone cache from a snapshot failed.
    #[error("Failed to restore cloned repository contents from '{path}': {message}")]
    SnapshotRestore { path: String, message: String },

    /// Writing the clone cache snapshot failed.
    #[error("Failed to save cloned repository contents to '{path}': {message}")]
    SnapshotSave { path: String, message: String },

    /// Generating repository metadata over the downloaded packages failed.
    #[error("Failed to convert downloaded packages into a repository: {message}")]
    RepositoryMaterialization { message: String },

    /// One or more nodes could not be cached and stop-on-failure is set.
    #[error("Failed to cache unresolved nodes ({failed} failure(s))")]
    #[diagnostic(help("Run with -v to see which nodes failed and what depends on them"))]
    CachingFailed { failed: usize },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}
