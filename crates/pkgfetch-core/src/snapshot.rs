//! Cache snapshot: a portable record of the packages cloned during a run.

use std::path::Path;

use serde::{Deserialize, Serialize};

use pkgfetch_util::errors::PkgfetchError;

/// Manifest of a populated clone cache, enough to re-clone every package
/// without querying providers again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    #[serde(default)]
    pub packages: Vec<SnapshotEntry>,
}

/// One cloned package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Provider identifier, e.g. `bash-5.1-1.x86_64`.
    pub name: String,
    /// SHA-256 of the artifact at snapshot time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl CacheSnapshot {
    /// Load and parse a snapshot file.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PkgfetchError::SnapshotRestore {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| {
            PkgfetchError::SnapshotRestore {
                path: path.display().to_string(),
                message: format!("invalid snapshot: {e}"),
            }
            .into()
        })
    }

    /// Serialize to pretty-printed JSON and write to `path`.
    pub fn write_to(&self, path: &Path) -> miette::Result<()> {
        let save_err = |message: String| PkgfetchError::SnapshotSave {
            path: path.display().to_string(),
            message,
        };
        let json = serde_json::to_string_pretty(self).map_err(|e| save_err(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            pkgfetch_util::fs::ensure_dir(parent).map_err(|e| save_err(e.to_string()))?;
        }
        std::fs::write(path, json + "\n").map_err(|e| save_err(e.to_string()))?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
