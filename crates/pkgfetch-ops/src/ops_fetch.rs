//! Operation: resolve every unresolved node of a graph into the clone cache.

use pkgfetch_core::config::FetchConfig;
use pkgfetch_core::dot;
use pkgfetch_core::graph::PkgGraph;
use pkgfetch_core::toolchain::ToolchainManifest;
use pkgfetch_repo::cloner::RepoCloner;
use pkgfetch_repo::dnf::{DnfCloner, DnfClonerOptions};
use pkgfetch_repo::solver::{CompetingSolver, RpmTestSolver};
use pkgfetch_resolver::driver::{DriverOptions, ResolutionDriver, RunSummary};
use pkgfetch_util::errors::PkgfetchError;
use pkgfetch_util::progress::{spinner, status, status_info, status_warn};

/// Run a full resolution pass with the dnf cloner and the `rpm` solver.
///
/// The graph and toolchain manifest are loaded before the cloner is set up,
/// so bad inputs fail fast. The cloner's scratch state is removed on return.
pub fn resolve_packages(config: &FetchConfig) -> miette::Result<RunSummary> {
    config.validate()?;
    let (mut graph, toolchain) = load_inputs(config)?;

    let sp = spinner("Preparing package cloner...");
    let cloner = DnfCloner::initialize(&cloner_options(config));
    sp.finish_and_clear();
    let mut cloner = cloner.map_err(|e| PkgfetchError::ClonerInit {
        message: e.to_string(),
    })?;

    drive(config, &mut graph, &toolchain, &mut cloner, &RpmTestSolver::new())
}

/// Like [`resolve_packages`] but with caller-supplied collaborators.
pub fn resolve_with(
    config: &FetchConfig,
    cloner: &mut dyn RepoCloner,
    solver: &dyn CompetingSolver,
) -> miette::Result<RunSummary> {
    config.validate()?;
    let (mut graph, toolchain) = load_inputs(config)?;
    drive(config, &mut graph, &toolchain, cloner, solver)
}

fn load_inputs(config: &FetchConfig) -> miette::Result<(PkgGraph, ToolchainManifest)> {
    let graph = dot::read_graph(&config.input_graph)?;
    let toolchain = match &config.toolchain_manifest {
        Some(path) => ToolchainManifest::from_path(path)?,
        None => ToolchainManifest::empty(),
    };
    Ok((graph, toolchain))
}

fn cloner_options(config: &FetchConfig) -> DnfClonerOptions {
    DnfClonerOptions {
        out_dir: config.out_dir.clone(),
        tmp_dir: config.tmp_dir.clone(),
        worker_tar: config.worker_tar.clone(),
        existing_rpm_dir: config.existing_rpm_dir.clone(),
        repo_files: config.repo_files.clone(),
        use_preview_repo: config.use_preview_repo,
        disable_upstream_repos: config.disable_upstream_repos,
        tls_identity: config
            .tls_identity()
            .map(|(cert, key)| (cert.to_path_buf(), key.to_path_buf())),
        package_manager: None,
    }
}

fn driver_options(config: &FetchConfig) -> DriverOptions {
    DriverOptions {
        input_snapshot: config.input_snapshot.clone(),
        output_snapshot: config.output_snapshot.clone(),
        output_graph: config.output_graph.clone(),
        scratch_dir: config.tmp_dir.clone(),
        stop_on_failure: config.stop_on_failure,
    }
}

fn drive(
    config: &FetchConfig,
    graph: &mut PkgGraph,
    toolchain: &ToolchainManifest,
    cloner: &mut dyn RepoCloner,
    solver: &dyn CompetingSolver,
) -> miette::Result<RunSummary> {
    let pending = graph.unresolved_run_nodes().len();
    let sp = spinner(&format!("Caching {pending} unresolved node(s)..."));
    let result =
        ResolutionDriver::new(cloner, solver, toolchain, driver_options(config)).run(graph);
    sp.finish_and_clear();
    let summary = result?;

    print_summary(config, &summary);
    Ok(summary)
}

fn print_summary(config: &FetchConfig, summary: &RunSummary) {
    let report = &summary.report;
    if summary.nothing_to_cache {
        status_info("Fresh", "no unresolved nodes, nothing to cache");
    } else if config.input_snapshot.is_some() {
        status(
            "Restored",
            &format!("{} package(s) from snapshot", report.restored),
        );
    } else {
        status(
            "Cached",
            &format!(
                "{} node(s), {} failed, {} deferred",
                report.resolved,
                report.failures.len(),
                report.deferred.len()
            ),
        );
    }

    if !report.succeeded() {
        status_warn(
            "Warning",
            &format!(
                "{} node(s) could not be cached (see `pkgfetch status`)",
                report.failure_count()
            ),
        );
    }
    if let Some(saved) = summary.snapshot_saved {
        status("Saved", &format!("{saved} package(s) to snapshot"));
    }
    status(
        "Wrote",
        &format!("graph to '{}'", config.output_graph.display()),
    );
}
