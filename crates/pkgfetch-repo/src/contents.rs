//! Saving and restoring the clone cache through a [`CacheSnapshot`].

use std::path::Path;

use pkgfetch_core::package::PackageVer;
use pkgfetch_core::snapshot::{CacheSnapshot, SnapshotEntry};
use pkgfetch_util::errors::PkgfetchError;
use pkgfetch_util::hash::{checksum_mismatch, sha256_file};

use crate::cloner::{artifact_path, RepoCloner};

/// Record everything the cloner holds into a snapshot file at `path`.
pub fn save_cloned_repo_contents(cloner: &dyn RepoCloner, path: &Path) -> miette::Result<usize> {
    let save_err = |message: String| PkgfetchError::SnapshotSave {
        path: path.display().to_string(),
        message,
    };
    let contents = cloner
        .cloned_repo_contents()
        .map_err(|e| save_err(e.to_string()))?;

    let mut packages = Vec::with_capacity(contents.len());
    for name in contents {
        let artifact = artifact_path(cloner.clone_dir(), &name);
        let sha256 = if artifact.is_file() {
            Some(sha256_file(&artifact).map_err(|e| save_err(e.to_string()))?)
        } else {
            None
        };
        packages.push(SnapshotEntry { name, sha256 });
    }

    let snapshot = CacheSnapshot { packages };
    snapshot.write_to(path)?;
    tracing::info!(
        "Saved {} cloned package(s) to '{}'",
        snapshot.len(),
        path.display()
    );
    Ok(snapshot.len())
}

/// Re-clone every package listed in the snapshot at `path`.
///
/// Packages are cloned without dependency resolution since the snapshot
/// already lists the full closure. Artifacts whose checksum differs from
/// the snapshot are rejected.
pub fn restore_cloned_repo_contents(
    cloner: &mut dyn RepoCloner,
    path: &Path,
) -> miette::Result<usize> {
    const CLONE_DEPS: bool = false;
    let restore_err = |message: String| PkgfetchError::SnapshotRestore {
        path: path.display().to_string(),
        message,
    };

    let snapshot = CacheSnapshot::from_path(path)?;
    tracing::info!(
        "Restoring {} package(s) from '{}'",
        snapshot.len(),
        path.display()
    );

    for entry in &snapshot.packages {
        cloner
            .clone_package(CLONE_DEPS, &PackageVer::new(&entry.name))
            .map_err(|e| restore_err(format!("failed to clone '{}': {e}", entry.name)))?;

        let Some(ref expected) = entry.sha256 else {
            continue;
        };
        let artifact = artifact_path(cloner.clone_dir(), &entry.name);
        if !artifact.is_file() {
            continue;
        }
        let mismatch =
            checksum_mismatch(&artifact, expected).map_err(|e| restore_err(e.to_string()))?;
        if let Some(actual) = mismatch {
            return Err(restore_err(format!(
                "checksum mismatch for '{}'\n  expected: {expected}\n  actual:   {actual}",
                entry.name
            ))
            .into());
        }
    }
    Ok(snapshot.len())
}
