use std::collections::HashMap;
use std::path::{Path, PathBuf};

use pkgfetch_core::config::FetchConfig;
use pkgfetch_core::dot;
use pkgfetch_core::graph::{NodeState, NodeType};
use pkgfetch_core::package::PackageVer;
use pkgfetch_ops::ops_fetch::{resolve_packages, resolve_with};
use pkgfetch_repo::cloner::{artifact_identifier, artifact_path, ClonerError, RepoCloner};
use pkgfetch_repo::solver::{CompetingSolver, SolverError};
use tempfile::TempDir;

struct TableCloner {
    out: PathBuf,
    table: HashMap<&'static str, &'static str>,
    prebuilt: &'static [&'static str],
    conversions: usize,
}

impl RepoCloner for TableCloner {
    fn what_provides(&mut self, pkg: &PackageVer) -> Result<Vec<String>, ClonerError> {
        match self.table.get(pkg.name.as_str()) {
            Some(provider) => Ok(vec![provider.to_string()]),
            None => Ok(Vec::new()),
        }
    }

    fn clone_package(&mut self, _clone_deps: bool, pkg: &PackageVer) -> Result<bool, ClonerError> {
        std::fs::write(artifact_path(&self.out, &pkg.name), b"rpm")?;
        Ok(self.prebuilt.contains(&pkg.name.as_str()))
    }

    fn convert_downloaded_packages_into_repo(&mut self) -> Result<(), ClonerError> {
        self.conversions += 1;
        Ok(())
    }

    fn cloned_repo_contents(&self) -> Result<Vec<String>, ClonerError> {
        let mut ids: Vec<String> = std::fs::read_dir(&self.out)?
            .flatten()
            .filter_map(|e| artifact_identifier(&e.path()))
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn clone_dir(&self) -> &Path {
        &self.out
    }
}

struct NoSolver;

impl CompetingSolver for NoSolver {
    fn resolve_competing(
        &self,
        _scratch_dir: &Path,
        _candidates: &[PathBuf],
    ) -> Result<Vec<String>, SolverError> {
        panic!("solver should not be consulted for single providers");
    }
}

fn setup(tmp: &TempDir) -> (FetchConfig, TableCloner) {
    let input_graph = tmp.path().join("graph.dot");
    std::fs::write(
        &input_graph,
        r#"digraph dependencies {
	"1" [spec="bash", implicit="false", state="unresolved", type="normal", kind="run", path=""];
	"2" [spec="glibc", implicit="false", state="unresolved", type="normal", kind="run", path=""];
	"3" [spec="ghost", implicit="false", state="unresolved", type="normal", kind="run", path=""];
	"1" -> "2";
	"1" -> "3";
}
"#,
    )
    .unwrap();
    let manifest = tmp.path().join("toolchain_manifest.txt");
    std::fs::write(&manifest, "# toolchain\nglibc-2.35-1.x86_64.rpm\n").unwrap();

    let out = tmp.path().join("out");
    std::fs::create_dir_all(&out).unwrap();
    let config = FetchConfig {
        input_graph,
        output_graph: tmp.path().join("cached_graph.dot"),
        toolchain_manifest: Some(manifest),
        out_dir: out.clone(),
        tmp_dir: tmp.path().join("tmp"),
        ..FetchConfig::default()
    };
    let cloner = TableCloner {
        out,
        table: HashMap::from([
            ("bash", "bash-5.1-1.x86_64"),
            ("glibc", "glibc-2.35-1.x86_64"),
        ]),
        prebuilt: &["glibc-2.35-1.x86_64"],
        conversions: 0,
    };
    (config, cloner)
}

#[test]
fn resolves_graph_and_writes_output() {
    let tmp = TempDir::new().unwrap();
    let (config, mut cloner) = setup(&tmp);

    let summary = resolve_with(&config, &mut cloner, &NoSolver).unwrap();

    assert_eq!(summary.report.resolved, 2);
    assert_eq!(summary.report.failures.len(), 1);
    assert_eq!(cloner.conversions, 1);

    let graph = dot::read_graph(&config.output_graph).unwrap();
    let bash = graph.node(graph.find("1").unwrap());
    let glibc = graph.node(graph.find("2").unwrap());
    let ghost = graph.node(graph.find("3").unwrap());
    assert_eq!(bash.state, NodeState::Cached);
    assert_eq!(glibc.state, NodeState::UpToDate);
    assert_eq!(glibc.node_type, NodeType::PreBuilt);
    assert_eq!(ghost.state, NodeState::Unresolved);
    assert_eq!(graph.edge_count(), 2);
}

#[test]
fn stop_on_failure_fails_the_run() {
    let tmp = TempDir::new().unwrap();
    let (mut config, mut cloner) = setup(&tmp);
    config.stop_on_failure = true;

    let err = resolve_with(&config, &mut cloner, &NoSolver).unwrap_err();
    assert!(err.to_string().contains("Failed to cache"), "got: {err}");
    assert!(config.output_graph.exists());
}

#[test]
fn missing_toolchain_manifest_is_reported() {
    let tmp = TempDir::new().unwrap();
    let (mut config, mut cloner) = setup(&tmp);
    config.toolchain_manifest = Some(tmp.path().join("absent.txt"));

    let err = resolve_with(&config, &mut cloner, &NoSolver).unwrap_err();
    assert!(err.to_string().contains("toolchain manifest"), "got: {err}");
    assert!(!config.output_graph.exists());
}

#[test]
fn invalid_config_is_rejected_before_any_work() {
    let err = resolve_packages(&FetchConfig::default()).unwrap_err();
    assert!(err.to_string().contains("`input-graph` is required"), "got: {err}");
}
