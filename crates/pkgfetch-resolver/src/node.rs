//! Resolving a single graph node to a cloned artifact.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use pkgfetch_core::graph::{NodeState, NodeType, PkgNode};
use pkgfetch_core::package::PackageVer;
use pkgfetch_core::toolchain::ToolchainManifest;
use pkgfetch_repo::cloner::{ClonerError, RepoCloner};
use pkgfetch_repo::solver::CompetingSolver;
use thiserror::Error;

use crate::context::ResolutionContext;
use crate::selector::{CandidateSelector, SelectError};

/// Recoverable failure to resolve one node. The node is left untouched.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeError {
    #[error("failed to find any providers for '{spec}': {reason}")]
    ProviderNotFound { spec: PackageVer, reason: String },

    #[error("failed to clone '{provider}' (providing '{spec}'): {source}")]
    CloneFailed {
        spec: PackageVer,
        provider: String,
        #[source]
        source: ClonerError,
    },

    #[error("failed to select a provider for '{spec}': {source}")]
    Select {
        spec: PackageVer,
        #[source]
        source: SelectError,
    },
}

impl NodeError {
    /// The requirement that could not be resolved.
    pub fn spec(&self) -> &PackageVer {
        match self {
            NodeError::ProviderNotFound { spec, .. }
            | NodeError::CloneFailed { spec, .. }
            | NodeError::Select { spec, .. } => spec,
        }
    }

    pub fn is_provider_not_found(&self) -> bool {
        matches!(self, NodeError::ProviderNotFound { .. })
    }
}

/// Resolves unresolved nodes one at a time against a cloner.
pub struct NodeResolver<'a> {
    cloner: &'a mut dyn RepoCloner,
    solver: &'a dyn CompetingSolver,
    toolchain: &'a ToolchainManifest,
    out_dir: PathBuf,
    scratch_dir: &'a Path,
}

impl<'a> NodeResolver<'a> {
    /// Artifacts are expected in the cloner's [`RepoCloner::clone_dir`].
    pub fn new(
        cloner: &'a mut dyn RepoCloner,
        solver: &'a dyn CompetingSolver,
        toolchain: &'a ToolchainManifest,
        scratch_dir: &'a Path,
    ) -> Self {
        let out_dir = cloner.clone_dir().to_path_buf();
        Self {
            cloner,
            solver,
            toolchain,
            out_dir,
            scratch_dir,
        }
    }

    /// Fetch an artifact for `node` and mark it resolved.
    ///
    /// Providers already cloned in this pass (per `ctx`) are not cloned
    /// again. On error the node keeps its state, type and path.
    pub fn resolve(
        &mut self,
        ctx: &mut ResolutionContext,
        node: &mut PkgNode,
    ) -> Result<(), NodeError> {
        let providers = self.providers_for(node)?;

        for provider in &providers {
            if ctx.is_fetched(provider) {
                tracing::debug!("'{provider}' already cloned, skipping");
                continue;
            }
            self.clone_provider(ctx, &node.spec, provider)?;
        }

        let selection = CandidateSelector::new(self.solver, &self.out_dir, self.scratch_dir)
            .select(&providers)
            .map_err(|source| NodeError::Select {
                spec: node.spec.clone(),
                source,
            })?;

        if ctx.is_prebuilt(&selection.identifier)
            && self.toolchain.contains_artifact(&selection.path)
        {
            node.state = NodeState::UpToDate;
            node.node_type = NodeType::PreBuilt;
        } else {
            node.state = NodeState::Cached;
            node.node_type = NodeType::Normal;
        }
        tracing::debug!(
            "Resolved '{}' to '{}' ({})",
            node.spec,
            selection.path.display(),
            node.state
        );
        node.artifact_path = Some(selection.path);
        Ok(())
    }

    fn providers_for(&mut self, node: &PkgNode) -> Result<Vec<String>, NodeError> {
        let reason = match self.cloner.what_provides(&node.spec) {
            Ok(providers) if !providers.is_empty() => return Ok(providers),
            Ok(_) => "no package provides it".to_string(),
            Err(e) => e.to_string(),
        };

        if node.implicit {
            tracing::debug!("Could not resolve implicit node '{}': {reason}", node.spec);
        } else {
            tracing::error!("Failed to find any providers for '{}': {reason}", node.spec);
        }
        Err(NodeError::ProviderNotFound {
            spec: node.spec.clone(),
            reason,
        })
    }

    fn clone_provider(
        &mut self,
        ctx: &mut ResolutionContext,
        spec: &PackageVer,
        provider: &str,
    ) -> Result<(), NodeError> {
        const CLONE_DEPS: bool = true;
        let prebuilt = self
            .cloner
            .clone_package(CLONE_DEPS, &PackageVer::new(provider))
            .map_err(|source| NodeError::CloneFailed {
                spec: spec.clone(),
                provider: provider.to_string(),
                source,
            })?;
        tracing::debug!("Cloned '{provider}' (prebuilt: {prebuilt})");
        ctx.mark_fetched(provider, prebuilt);
        Ok(())
    }
}
