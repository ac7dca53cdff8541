//! Toolchain manifest: artifact filenames that ship pre-built with the toolchain.

use std::collections::HashSet;
use std::path::Path;

use pkgfetch_util::errors::PkgfetchError;

/// Set of artifact filenames (e.g. `bash-5.1-1.x86_64.rpm`) reserved as
/// pre-built toolchain components. Read once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolchainManifest {
    files: HashSet<String>,
}

impl ToolchainManifest {
    /// A manifest that reserves nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a newline-delimited manifest file.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let lines = pkgfetch_util::fs::read_lines(path).map_err(|e| PkgfetchError::Config {
            message: format!(
                "unable to read toolchain manifest file '{}': {e}",
                path.display()
            ),
        })?;
        let manifest = Self::from_lines(lines);
        tracing::debug!(
            "Loaded {} toolchain entries from '{}'",
            manifest.len(),
            path.display()
        );
        Ok(manifest)
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            files: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the artifact at `path` is a toolchain component.
    ///
    /// Only the final path component is compared.
    pub fn contains_artifact(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| self.files.contains(name))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_on_basename_only() {
        let manifest = ToolchainManifest::from_lines(["bash-5.1-1.x86_64.rpm"]);
        assert!(manifest.contains_artifact(Path::new("/out/bash-5.1-1.x86_64.rpm")));
        assert!(manifest.contains_artifact(Path::new("bash-5.1-1.x86_64.rpm")));
        assert!(!manifest.contains_artifact(Path::new("/out/bash-5.2-1.x86_64.rpm")));
        assert!(!manifest.contains_artifact(Path::new("/out/")));
    }

    #[test]
    fn empty_manifest_reserves_nothing() {
        let manifest = ToolchainManifest::empty();
        assert!(manifest.is_empty());
        assert!(!manifest.contains_artifact(Path::new("/out/bash-5.1-1.x86_64.rpm")));
    }
}
