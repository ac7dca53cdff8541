//! A full resolution pass over a package graph.
//!
//! The driver either resolves every unresolved run node through a
//! [`NodeResolver`] or, when a cache snapshot is supplied, restores the
//! cloner from it instead. Afterwards the clone cache is turned into a
//! repository, optionally snapshotted, and the graph is written back out.
//! The graph is written even when the run fails.

use std::path::{Path, PathBuf};

use petgraph::graph::NodeIndex;
use pkgfetch_core::dot;
use pkgfetch_core::graph::PkgGraph;
use pkgfetch_core::toolchain::ToolchainManifest;
use pkgfetch_repo::cloner::RepoCloner;
use pkgfetch_repo::contents::{restore_cloned_repo_contents, save_cloned_repo_contents};
use pkgfetch_repo::solver::CompetingSolver;
use pkgfetch_util::errors::PkgfetchError;

use crate::context::ResolutionContext;
use crate::node::{NodeError, NodeResolver};

/// Where the driver reads and writes, and how it treats failures.
#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// Restore the clone cache from here instead of resolving nodes.
    pub input_snapshot: Option<PathBuf>,
    /// Save the clone cache contents here after a successful pass.
    pub output_snapshot: Option<PathBuf>,
    pub output_graph: PathBuf,
    /// Scratch space for the competing-package solver.
    pub scratch_dir: PathBuf,
    /// Fail the run if any node could not be cached. Evaluated after the
    /// whole scan; every node is attempted regardless.
    pub stop_on_failure: bool,
}

/// A node that could not be resolved.
#[derive(Debug)]
pub struct NodeFailure {
    pub node: NodeIndex,
    pub error: NodeError,
}

/// Outcome of the caching phase.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub resolved: usize,
    /// Failures that count against the run.
    pub failures: Vec<NodeFailure>,
    /// Implicit nodes nobody provides yet. They are expected to be satisfied
    /// later in the build and never fail the run.
    pub deferred: Vec<NodeFailure>,
    /// Packages re-cloned from the input snapshot.
    pub restored: usize,
    pub restore_error: Option<String>,
}

impl ScanReport {
    pub fn failure_count(&self) -> usize {
        self.failures.len() + usize::from(self.restore_error.is_some())
    }

    pub fn succeeded(&self) -> bool {
        self.failure_count() == 0
    }
}

/// What a completed run did.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub report: ScanReport,
    /// The graph had nothing unresolved and no snapshot was given, so only
    /// the graph was written.
    pub nothing_to_cache: bool,
    /// Entries written to the output snapshot, if one was configured.
    pub snapshot_saved: Option<usize>,
}

pub struct ResolutionDriver<'a> {
    cloner: &'a mut dyn RepoCloner,
    solver: &'a dyn CompetingSolver,
    toolchain: &'a ToolchainManifest,
    options: DriverOptions,
}

impl<'a> ResolutionDriver<'a> {
    pub fn new(
        cloner: &'a mut dyn RepoCloner,
        solver: &'a dyn CompetingSolver,
        toolchain: &'a ToolchainManifest,
        options: DriverOptions,
    ) -> Self {
        Self {
            cloner,
            solver,
            toolchain,
            options,
        }
    }

    /// Run the pass and persist `graph` to the output path.
    pub fn run(&mut self, graph: &mut PkgGraph) -> miette::Result<RunSummary> {
        let outcome = self.cache_and_finalize(graph);
        let persisted = dot::write_graph(graph, &self.options.output_graph);

        match (outcome, persisted) {
            (Ok(summary), Ok(())) => Ok(summary),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(persist_err)) => {
                tracing::error!("{persist_err}");
                Err(e)
            }
        }
    }

    fn cache_and_finalize(&mut self, graph: &mut PkgGraph) -> miette::Result<RunSummary> {
        let input_snapshot = self.options.input_snapshot.clone();
        if input_snapshot.is_none() && !graph.has_unresolved_nodes() {
            tracing::info!("Nothing to cache");
            return Ok(RunSummary {
                nothing_to_cache: true,
                ..RunSummary::default()
            });
        }

        let report = match input_snapshot {
            Some(path) => self.restore(&path),
            None => self.scan(graph),
        };

        if !report.succeeded() {
            if self.options.stop_on_failure {
                return Err(PkgfetchError::CachingFailed {
                    failed: report.failure_count(),
                }
                .into());
            }
            tracing::warn!(
                "{} node(s) could not be cached, continuing",
                report.failure_count()
            );
        }

        self.cloner
            .convert_downloaded_packages_into_repo()
            .map_err(|e| PkgfetchError::RepositoryMaterialization {
                message: e.to_string(),
            })?;

        let snapshot_saved = match &self.options.output_snapshot {
            Some(path) => Some(save_cloned_repo_contents(&*self.cloner, path)?),
            None => None,
        };

        Ok(RunSummary {
            report,
            nothing_to_cache: false,
            snapshot_saved,
        })
    }

    fn restore(&mut self, path: &Path) -> ScanReport {
        let mut report = ScanReport::default();
        match restore_cloned_repo_contents(&mut *self.cloner, path) {
            Ok(restored) => report.restored = restored,
            Err(e) => {
                tracing::error!("{e}");
                report.restore_error = Some(e.to_string());
            }
        }
        report
    }

    fn scan(&mut self, graph: &mut PkgGraph) -> ScanReport {
        let mut ctx = ResolutionContext::new();
        let mut report = ScanReport::default();
        let mut resolver = NodeResolver::new(
            &mut *self.cloner,
            self.solver,
            self.toolchain,
            &self.options.scratch_dir,
        );

        for idx in graph.unresolved_run_nodes() {
            let result = resolver.resolve(&mut ctx, graph.node_mut(idx));
            let Err(error) = result else {
                report.resolved += 1;
                continue;
            };

            let failure = NodeFailure { node: idx, error };
            if failure.error.is_provider_not_found() && graph.node(idx).implicit {
                tracing::debug!("Deferring implicit node '{}'", failure.error.spec());
                report.deferred.push(failure);
            } else {
                log_failure(graph, &failure);
                report.failures.push(failure);
            }
        }

        tracing::debug!(
            "Scan finished: {} resolved, {} failed, {} deferred, {} provider(s) cloned",
            report.resolved,
            report.failures.len(),
            report.deferred.len(),
            ctx.fetched_count()
        );
        report
    }
}

fn log_failure(graph: &PkgGraph, failure: &NodeFailure) {
    tracing::error!("Failed to cache {}: {}", graph.node(failure.node), failure.error);
    let dependents: Vec<String> = graph
        .dependents_of(failure.node)
        .into_iter()
        .map(|d| graph.node(d).to_string())
        .collect();
    if !dependents.is_empty() {
        tracing::error!(
            "'{}' is required by: {}",
            failure.error.spec(),
            dependents.join(", ")
        );
    }
}
