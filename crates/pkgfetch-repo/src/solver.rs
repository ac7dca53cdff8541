//! Competing-package arbitration.
//!
//! When several packages provide the same capability, the solver decides
//! which of them could be installed together into an empty root.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use pkgfetch_util::process::CommandBuilder;
use thiserror::Error;

use crate::cloner::artifact_identifier;

/// Failure to run the solver at all (as opposed to "nothing installable").
#[derive(Debug, Error, Diagnostic)]
pub enum SolverError {
    #[error("`{program}` failed: {message}")]
    Command { program: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("'{0}' is not a package artifact")]
    NotAnArtifact(PathBuf),
}

/// Decides which candidate artifacts can be installed together.
pub trait CompetingSolver {
    /// Identifiers of the installable candidates, in the solver's preferred
    /// order. An empty result means none can be installed.
    fn resolve_competing(
        &self,
        scratch_dir: &Path,
        candidates: &[PathBuf],
    ) -> Result<Vec<String>, SolverError>;
}

/// Test-installs every candidate with `rpm --test` into a scratch root and
/// drops the ones whose files conflict with an earlier candidate.
#[derive(Debug, Clone, Default)]
pub struct RpmTestSolver;

impl RpmTestSolver {
    pub fn new() -> Self {
        Self
    }
}

impl CompetingSolver for RpmTestSolver {
    fn resolve_competing(
        &self,
        scratch_dir: &Path,
        candidates: &[PathBuf],
    ) -> Result<Vec<String>, SolverError> {
        let identifiers = candidates
            .iter()
            .map(|p| artifact_identifier(p).ok_or_else(|| SolverError::NotAnArtifact(p.clone())))
            .collect::<Result<Vec<_>, _>>()?;

        let root = scratch_dir.join("competing-root");
        pkgfetch_util::fs::ensure_dir(&root)?;

        // Conflict lines are matched in the C locale.
        let cmd = CommandBuilder::new("rpm")
            .env("LC_ALL", "C")
            .args(["-U", "--test", "--nodeps", "--root"])
            .arg(root.to_string_lossy())
            .args(candidates.iter().map(|p| p.to_string_lossy().into_owned()));
        // A failed run carries rpm's stderr, which names the conflicts.
        let failure = match cmd.exec_checked() {
            Ok(_) => return Ok(identifiers),
            Err(e) => e.to_string(),
        };

        let losers = conflicting_installs(&failure);
        if losers.is_empty() {
            return Err(SolverError::Command {
                program: cmd.display(),
                message: failure,
            });
        }
        tracing::debug!("Conflicting candidates: {losers:?}");
        Ok(identifiers
            .into_iter()
            .filter(|id| !losers.contains(id.as_str()))
            .collect())
    }
}

/// Packages named as the *installing* side of a file conflict in `rpm`
/// output:
///
/// ```text
/// file /usr/bin/foo from install of foo-b-1.0-1.x86_64 conflicts with file from package foo-a-1.0-1.x86_64
/// ```
pub fn conflicting_installs(stderr: &str) -> HashSet<&str> {
    const MARKER: &str = "from install of ";
    stderr
        .lines()
        .filter(|l| l.contains(" conflicts with "))
        .filter_map(|l| {
            let start = l.find(MARKER)? + MARKER.len();
            l[start..].split_whitespace().next()
        })
        .collect()
}
