//! Run configuration for a resolution pass.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use pkgfetch_util::errors::PkgfetchError;

/// Everything a resolution pass needs to know, loaded from an optional
/// `pkgfetch.toml` and then overridden by command-line flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FetchConfig {
    /// Graph to read unresolved nodes from.
    #[serde(default)]
    pub input_graph: PathBuf,
    /// Where the updated graph is written.
    #[serde(default)]
    pub output_graph: PathBuf,
    /// Restore the clone cache from this snapshot instead of resolving nodes.
    #[serde(default)]
    pub input_snapshot: Option<PathBuf>,
    /// Save the clone cache manifest here after the run.
    #[serde(default)]
    pub output_snapshot: Option<PathBuf>,
    #[serde(default)]
    pub toolchain_manifest: Option<PathBuf>,
    /// Directory receiving cloned packages and repository metadata.
    #[serde(default)]
    pub out_dir: PathBuf,
    /// Scratch space for the cloner and the competing-package solver.
    #[serde(default)]
    pub tmp_dir: PathBuf,
    /// Archive holding the worker environment the package manager runs in.
    #[serde(default)]
    pub worker_tar: Option<PathBuf>,
    /// Directory of already-built packages (the toolchain RPMs).
    #[serde(default)]
    pub existing_rpm_dir: Option<PathBuf>,
    /// Upstream repository definitions (`*.repo`).
    #[serde(default)]
    pub repo_files: Vec<PathBuf>,
    #[serde(default)]
    pub tls_client_cert: Option<PathBuf>,
    #[serde(default)]
    pub tls_client_key: Option<PathBuf>,
    #[serde(default)]
    pub disable_upstream_repos: bool,
    #[serde(default)]
    pub use_preview_repo: bool,
    /// Fail the run if any node could not be cached.
    #[serde(default)]
    pub stop_on_failure: bool,
}

impl FetchConfig {
    /// Load a config file, or return defaults if `path` does not exist.
    pub fn load(path: &Path) -> miette::Result<Self> {
        if !path.is_file() {
            tracing::debug!("No config file at '{}', using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| PkgfetchError::Config {
            message: format!("Failed to read config '{}': {e}", path.display()),
        })?;
        Self::from_toml_str(&content).map_err(|e| {
            PkgfetchError::Config {
                message: format!("Failed to parse config '{}': {e}", path.display()),
            }
            .into()
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Check that the required paths are present and the options are consistent.
    pub fn validate(&self) -> miette::Result<()> {
        let required = [
            ("input-graph", &self.input_graph),
            ("output-graph", &self.output_graph),
            ("out-dir", &self.out_dir),
            ("tmp-dir", &self.tmp_dir),
        ];
        for (key, value) in required {
            if value.as_os_str().is_empty() {
                return Err(PkgfetchError::Config {
                    message: format!("`{key}` is required"),
                }
                .into());
            }
        }
        if self.tls_client_cert.is_some() != self.tls_client_key.is_some() {
            return Err(PkgfetchError::Config {
                message: "`tls-client-cert` and `tls-client-key` must be given together"
                    .to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// TLS identity for upstream repositories, if upstream access is enabled.
    pub fn tls_identity(&self) -> Option<(&Path, &Path)> {
        if self.disable_upstream_repos {
            return None;
        }
        match (&self.tls_client_cert, &self.tls_client_key) {
            (Some(cert), Some(key)) => Some((cert.as_path(), key.as_path())),
            _ => None,
        }
    }
}
