use std::path::{Path, PathBuf};

use pkgfetch_core::config::FetchConfig;
use tempfile::TempDir;

fn minimal() -> FetchConfig {
    FetchConfig {
        input_graph: "graph.dot".into(),
        output_graph: "cached_graph.dot".into(),
        out_dir: "out".into(),
        tmp_dir: "tmp".into(),
        ..FetchConfig::default()
    }
}

#[test]
fn test_default_config_flags_off() {
    let config = FetchConfig::default();
    assert!(!config.stop_on_failure);
    assert!(!config.disable_upstream_repos);
    assert!(!config.use_preview_repo);
    assert!(config.repo_files.is_empty());
}

#[test]
fn test_parse_from_toml() {
    let toml = r#"
input-graph = "build/graph.dot"
output-graph = "build/cached_graph.dot"
output-snapshot = "build/repo_snapshot.json"
toolchain-manifest = "resources/manifests/toolchain_x86_64.txt"
out-dir = "build/rpm_cache/cache"
tmp-dir = "build/tmp"
existing-rpm-dir = "build/toolchain_rpms"
repo-files = ["resources/repos/base.repo", "resources/repos/preview.repo"]
tls-client-cert = "certs/client.crt"
tls-client-key = "certs/client.key"
use-preview-repo = true
stop-on-failure = true
"#;
    let config = FetchConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.input_graph, PathBuf::from("build/graph.dot"));
    assert_eq!(
        config.output_snapshot.as_deref(),
        Some(Path::new("build/repo_snapshot.json"))
    );
    assert_eq!(config.repo_files.len(), 2);
    assert!(config.use_preview_repo);
    assert!(config.stop_on_failure);
    assert!(config.input_snapshot.is_none());
    config.validate().unwrap();
}

#[test]
fn test_unknown_key_rejected() {
    assert!(FetchConfig::from_toml_str("out-dirs = \"x\"").is_err());
}

#[test]
fn test_validate_requires_paths() {
    let mut config = minimal();
    config.validate().unwrap();
    config.tmp_dir = PathBuf::new();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("`tmp-dir` is required"), "got: {err}");
}

#[test]
fn test_validate_tls_pair() {
    let mut config = minimal();
    config.tls_client_cert = Some("client.crt".into());
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("must be given together"));
}

#[test]
fn test_tls_identity_disabled_with_upstream() {
    let mut config = minimal();
    config.tls_client_cert = Some("client.crt".into());
    config.tls_client_key = Some("client.key".into());
    assert!(config.tls_identity().is_some());
    config.disable_upstream_repos = true;
    assert!(config.tls_identity().is_none());
}

#[test]
fn test_load_missing_file_gives_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = FetchConfig::load(&tmp.path().join("pkgfetch.toml")).unwrap();
    assert_eq!(config, FetchConfig::default());
}

#[test]
fn test_load_reports_parse_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("pkgfetch.toml");
    std::fs::write(&path, "stop-on-failure = \"yes\"").unwrap();
    let err = FetchConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config"));
}
