//! CLI argument definitions for pkgfetch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pkgfetch_core::config::FetchConfig;

#[derive(Parser, Debug)]
#[command(
    name = "pkgfetch",
    version,
    about = "Resolve unresolved package graph nodes into a local repository",
    long_about = "pkgfetch walks a package dependency graph, clones a provider for every \
                  unresolved run-time node, turns the clone cache into a repository and \
                  writes the updated graph back out."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Cache every unresolved node of a graph
    Fetch(FetchArgs),

    /// Show the resolution state of a graph file
    Status {
        /// Graph file to inspect
        #[arg(long)]
        graph: PathBuf,
        /// Exit with an error if any run-time node is unresolved
        #[arg(long)]
        deny_unresolved: bool,
    },
}

/// Flags for `pkgfetch fetch`. Anything given here overrides the config file.
#[derive(Args, Debug, Default)]
pub struct FetchArgs {
    /// Config file (defaults to `pkgfetch.toml` in the current directory)
    #[arg(long, env = "PKGFETCH_CONFIG")]
    pub config: Option<PathBuf>,
    /// Graph to read unresolved nodes from
    #[arg(long)]
    pub input_graph: Option<PathBuf>,
    /// Where to write the updated graph
    #[arg(long)]
    pub output_graph: Option<PathBuf>,
    /// Restore the clone cache from this snapshot instead of resolving nodes
    #[arg(long)]
    pub input_snapshot: Option<PathBuf>,
    /// Save the clone cache contents to this snapshot
    #[arg(long)]
    pub output_snapshot: Option<PathBuf>,
    /// File listing toolchain artifact names
    #[arg(long)]
    pub toolchain_manifest: Option<PathBuf>,
    /// Directory receiving cloned packages
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
    /// Scratch directory
    #[arg(long)]
    pub tmp_dir: Option<PathBuf>,
    /// Worker environment archive
    #[arg(long)]
    pub worker_tar: Option<PathBuf>,
    /// Directory of already-built packages
    #[arg(long)]
    pub existing_rpm_dir: Option<PathBuf>,
    /// Upstream repository file (repeatable)
    #[arg(long = "repo-file")]
    pub repo_files: Vec<PathBuf>,
    /// TLS client certificate for upstream repositories
    #[arg(long)]
    pub tls_client_cert: Option<PathBuf>,
    /// TLS client key for upstream repositories
    #[arg(long)]
    pub tls_client_key: Option<PathBuf>,
    /// Only use pre-built packages
    #[arg(long)]
    pub disable_upstream_repos: bool,
    /// Also use preview repositories
    #[arg(long)]
    pub use_preview_repo: bool,
    /// Fail if any node could not be cached
    #[arg(long)]
    pub stop_on_failure: bool,
}

impl FetchArgs {
    /// Overlay the given flags onto `config`.
    pub fn apply_to(self, config: &mut FetchConfig) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *slot = v;
            }
        }
        set(&mut config.input_graph, self.input_graph);
        set(&mut config.output_graph, self.output_graph);
        set(&mut config.out_dir, self.out_dir);
        set(&mut config.tmp_dir, self.tmp_dir);
        config.input_snapshot = self.input_snapshot.or(config.input_snapshot.take());
        config.output_snapshot = self.output_snapshot.or(config.output_snapshot.take());
        config.toolchain_manifest = self
            .toolchain_manifest
            .or(config.toolchain_manifest.take());
        config.worker_tar = self.worker_tar.or(config.worker_tar.take());
        config.existing_rpm_dir = self.existing_rpm_dir.or(config.existing_rpm_dir.take());
        config.tls_client_cert = self.tls_client_cert.or(config.tls_client_cert.take());
        config.tls_client_key = self.tls_client_key.or(config.tls_client_key.take());
        if !self.repo_files.is_empty() {
            config.repo_files = self.repo_files;
        }
        config.disable_upstream_repos |= self.disable_upstream_repos;
        config.use_preview_repo |= self.use_preview_repo;
        config.stop_on_failure |= self.stop_on_failure;
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_values() {
        let mut config = FetchConfig {
            input_graph: "from-file.dot".into(),
            output_graph: "out.dot".into(),
            worker_tar: Some("worker.tar.gz".into()),
            repo_files: vec!["base.repo".into()],
            ..FetchConfig::default()
        };
        let cli = Cli::parse_from([
            "pkgfetch",
            "fetch",
            "--input-graph",
            "graph.dot",
            "--repo-file",
            "a.repo",
            "--repo-file",
            "b.repo",
            "--stop-on-failure",
        ]);
        let Command::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        args.apply_to(&mut config);

        assert_eq!(config.input_graph, PathBuf::from("graph.dot"));
        assert_eq!(config.output_graph, PathBuf::from("out.dot"));
        assert_eq!(config.worker_tar, Some(PathBuf::from("worker.tar.gz")));
        assert_eq!(
            config.repo_files,
            vec![PathBuf::from("a.repo"), PathBuf::from("b.repo")]
        );
        assert!(config.stop_on_failure);
        assert!(!config.disable_upstream_repos);
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::parse_from(["pkgfetch", "status", "--graph", "g.dot", "-v"]);
        assert!(cli.verbose);
    }
}
