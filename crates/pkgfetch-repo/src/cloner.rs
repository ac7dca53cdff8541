//! The package cloner abstraction.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use pkgfetch_core::package::PackageVer;
use thiserror::Error;

use crate::ARTIFACT_EXTENSION;

/// Failure reported by a cloner operation.
#[derive(Debug, Error, Diagnostic)]
pub enum ClonerError {
    /// An external tool exited unsuccessfully.
    #[error("`{program}` failed: {message}")]
    Command { program: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{message}")]
    Other { message: String },
}

/// A local clone cache filled from package repositories.
///
/// The cloner is a single non-reentrant resource for the whole run, hence
/// `&mut self` on every operation that touches the cache. Implementations
/// release their scratch state on drop.
pub trait RepoCloner {
    /// Provider identifiers (`name-version-release.arch`) satisfying `pkg`,
    /// in repository order without duplicates.
    fn what_provides(&mut self, pkg: &PackageVer) -> Result<Vec<String>, ClonerError>;

    /// Clone `pkg` into the cache, optionally with its transitive dependencies.
    ///
    /// Returns `true` if the package came from pre-built artifacts rather
    /// than an upstream repository.
    fn clone_package(&mut self, clone_deps: bool, pkg: &PackageVer) -> Result<bool, ClonerError>;

    /// Generate repository metadata over everything cloned so far.
    fn convert_downloaded_packages_into_repo(&mut self) -> Result<(), ClonerError>;

    /// Identifiers of every package currently in the cache, sorted.
    fn cloned_repo_contents(&self) -> Result<Vec<String>, ClonerError>;

    /// Directory holding the cloned artifacts.
    fn clone_dir(&self) -> &Path;
}

/// Path of the artifact for `identifier` inside `dir`.
pub fn artifact_path(dir: &Path, identifier: &str) -> PathBuf {
    dir.join(format!("{identifier}.{ARTIFACT_EXTENSION}"))
}

/// Provider identifier of an artifact path (`/out/bash-5.1-1.x86_64.rpm`
/// becomes `bash-5.1-1.x86_64`).
pub fn artifact_identifier(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    name.strip_suffix(&format!(".{ARTIFACT_EXTENSION}"))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_path_appends_extension() {
        assert_eq!(
            artifact_path(Path::new("/out"), "bash-5.1-1.x86_64"),
            PathBuf::from("/out/bash-5.1-1.x86_64.rpm")
        );
    }

    #[test]
    fn identifier_strips_directory_and_extension() {
        assert_eq!(
            artifact_identifier(Path::new("/out/bash-5.1-1.x86_64.rpm")).as_deref(),
            Some("bash-5.1-1.x86_64")
        );
        assert_eq!(artifact_identifier(Path::new("/out/readme.txt")), None);
    }
}
