//! A [`RepoCloner`] that drives `dnf` (or `tdnf`) against an isolated
//! install root.
//!
//! Repositories are configured in a private `reposdir`:
//! - a local repository over the pre-built package directory, if any;
//! - the upstream `*.repo` files, unless upstream access is disabled, with
//!   the TLS client identity injected into every section.
//!
//! Packages are downloaded flat into the clone directory, so every artifact
//! lives at `<out_dir>/<identifier>.rpm`.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use pkgfetch_core::package::PackageVer;
use pkgfetch_util::fs::{ensure_dir, files_with_extension};
use pkgfetch_util::process::CommandBuilder;
use tempfile::TempDir;

use crate::cloner::{artifact_identifier, artifact_path, ClonerError, RepoCloner};
use crate::ARTIFACT_EXTENSION;

/// Package manager binary used when none is configured.
pub const DEFAULT_PACKAGE_MANAGER: &str = "dnf";

/// Repository id of the pre-built package directory.
pub const LOCAL_REPO_ID: &str = "pkgfetch-local-prebuilt";

const PREVIEW_MARKER: &str = "preview";

/// Settings for [`DnfCloner::initialize`].
#[derive(Debug, Clone, Default)]
pub struct DnfClonerOptions {
    pub out_dir: PathBuf,
    pub tmp_dir: PathBuf,
    pub worker_tar: Option<PathBuf>,
    pub existing_rpm_dir: Option<PathBuf>,
    pub repo_files: Vec<PathBuf>,
    pub use_preview_repo: bool,
    pub disable_upstream_repos: bool,
    /// `(cert, key)` presented to upstream repositories.
    pub tls_identity: Option<(PathBuf, PathBuf)>,
    /// Defaults to [`DEFAULT_PACKAGE_MANAGER`].
    pub package_manager: Option<String>,
}

/// dnf-backed clone cache.
///
/// The scratch install root and repository configuration live in a
/// temporary directory removed when the cloner is dropped.
pub struct DnfCloner {
    program: String,
    out_dir: PathBuf,
    install_root: PathBuf,
    repos_dir: PathBuf,
    existing_rpm_dir: Option<PathBuf>,
    work_dir: TempDir,
}

impl DnfCloner {
    /// Prepare the worker environment and repository configuration.
    pub fn initialize(options: &DnfClonerOptions) -> Result<Self, ClonerError> {
        ensure_dir(&options.out_dir)?;
        ensure_dir(&options.tmp_dir)?;
        let work_dir = tempfile::Builder::new()
            .prefix("pkgfetch-cloner-")
            .tempdir_in(&options.tmp_dir)?;
        let install_root = work_dir.path().join("root");
        let repos_dir = work_dir.path().join("repos.d");
        ensure_dir(&install_root)?;
        ensure_dir(&repos_dir)?;

        if let Some(ref tar) = options.worker_tar {
            tracing::info!("Extracting worker environment '{}'", tar.display());
            run_checked(
                CommandBuilder::new("tar")
                    .arg("-xf")
                    .arg(tar.to_string_lossy())
                    .arg("-C")
                    .arg(install_root.to_string_lossy()),
            )?;
        }

        if let Some(ref dir) = options.existing_rpm_dir {
            write_local_repo(&repos_dir, &work_dir.path().join("local-repo"), dir)?;
        }

        if options.disable_upstream_repos {
            tracing::info!("Upstream repositories disabled");
        } else {
            for repo_file in &options.repo_files {
                let is_preview = repo_file
                    .file_name()
                    .is_some_and(|n| n.to_string_lossy().contains(PREVIEW_MARKER));
                if is_preview && !options.use_preview_repo {
                    tracing::debug!("Skipping preview repository '{}'", repo_file.display());
                    continue;
                }
                install_repo_file(&repos_dir, repo_file, options.tls_identity.as_ref())?;
            }
        }

        Ok(Self {
            program: options
                .package_manager
                .clone()
                .unwrap_or_else(|| DEFAULT_PACKAGE_MANAGER.to_string()),
            out_dir: options.out_dir.clone(),
            install_root,
            repos_dir,
            existing_rpm_dir: options.existing_rpm_dir.clone(),
            work_dir,
        })
    }

    fn base_command(&self, subcommand: &str) -> CommandBuilder {
        CommandBuilder::new(&self.program)
            .env("LC_ALL", "C")
            .arg(subcommand)
            .arg("--assumeyes")
            .arg("--quiet")
            .arg(format!("--installroot={}", self.install_root.display()))
            .arg(format!("--setopt=reposdir={}", self.repos_dir.display()))
    }

    /// Whether `identifier` is present among the pre-built packages, either
    /// at the top level or in a per-architecture subdirectory.
    fn is_prebuilt(&self, identifier: &str) -> bool {
        let Some(ref dir) = self.existing_rpm_dir else {
            return false;
        };
        if artifact_path(dir, identifier).is_file() {
            return true;
        }
        std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .flatten()
                    .filter(|e| e.path().is_dir())
                    .any(|e| artifact_path(&e.path(), identifier).is_file())
            })
            .unwrap_or(false)
    }
}

impl RepoCloner for DnfCloner {
    fn what_provides(&mut self, pkg: &PackageVer) -> Result<Vec<String>, ClonerError> {
        let output = run_checked(
            self.base_command("repoquery")
                .arg("--queryformat=%{name}-%{version}-%{release}.%{arch}")
                .arg("--whatprovides")
                .arg(pkg.to_string()),
        )?;
        let mut providers: Vec<String> = Vec::new();
        for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if !providers.iter().any(|p| p == line) {
                providers.push(line.to_string());
            }
        }
        tracing::debug!("'{pkg}' is provided by {providers:?}");
        Ok(providers)
    }

    fn clone_package(&mut self, clone_deps: bool, pkg: &PackageVer) -> Result<bool, ClonerError> {
        let mut cmd = self
            .base_command("download")
            .arg(format!("--destdir={}", self.out_dir.display()));
        if clone_deps {
            cmd = cmd.arg("--resolve").arg("--alldeps");
        }
        run_checked(cmd.arg(pkg.to_string()))?;

        if !artifact_path(&self.out_dir, &pkg.name).is_file() {
            return Err(ClonerError::Other {
                message: format!(
                    "'{pkg}' was downloaded but '{}' is missing",
                    artifact_path(&self.out_dir, &pkg.name).display()
                ),
            });
        }
        Ok(self.is_prebuilt(&pkg.name))
    }

    fn convert_downloaded_packages_into_repo(&mut self) -> Result<(), ClonerError> {
        run_checked(
            CommandBuilder::new("createrepo_c")
                .arg("--compatibility")
                .arg("--update")
                .arg(self.out_dir.to_string_lossy()),
        )?;
        Ok(())
    }

    fn cloned_repo_contents(&self) -> Result<Vec<String>, ClonerError> {
        Ok(files_with_extension(&self.out_dir, ARTIFACT_EXTENSION)?
            .iter()
            .filter_map(|p| artifact_identifier(p))
            .collect())
    }

    fn clone_dir(&self) -> &Path {
        &self.out_dir
    }
}

impl Drop for DnfCloner {
    fn drop(&mut self) {
        tracing::debug!(
            "Releasing cloner work directory '{}'",
            self.work_dir.path().display()
        );
    }
}

fn run_checked(cmd: CommandBuilder) -> Result<String, ClonerError> {
    cmd.exec_checked()
        .map(|output| output.stdout)
        .map_err(|e| ClonerError::Command {
            program: cmd.display(),
            message: e.to_string(),
        })
}

/// Index the pre-built packages into `meta_dir` and register it as a
/// repository. `rpm_dir` is only read.
fn write_local_repo(repos_dir: &Path, meta_dir: &Path, rpm_dir: &Path) -> Result<(), ClonerError> {
    let rpm_dir = std::fs::canonicalize(rpm_dir)?;
    ensure_dir(meta_dir)?;
    let meta_dir = std::fs::canonicalize(meta_dir)?;
    run_checked(local_repo_command(&meta_dir, &rpm_dir))?;
    std::fs::write(
        repos_dir.join(format!("{LOCAL_REPO_ID}.repo")),
        local_repo_file(&meta_dir),
    )?;
    Ok(())
}

/// `createrepo_c` writing metadata to `meta_dir`, with package locations
/// pointing back into `rpm_dir`.
fn local_repo_command(meta_dir: &Path, rpm_dir: &Path) -> CommandBuilder {
    CommandBuilder::new("createrepo_c")
        .arg("--compatibility")
        .arg(format!("--outputdir={}", meta_dir.display()))
        .arg(format!("--baseurl=file://{}/", rpm_dir.display()))
        .arg(rpm_dir.to_string_lossy())
}

fn local_repo_file(meta_dir: &Path) -> String {
    format!(
        "[{LOCAL_REPO_ID}]\nname=Pre-built packages\nbaseurl=file://{}\nenabled=1\ngpgcheck=0\npriority=1\nskip_if_unavailable=0\n",
        meta_dir.display()
    )
}

fn install_repo_file(
    repos_dir: &Path,
    repo_file: &Path,
    tls_identity: Option<&(PathBuf, PathBuf)>,
) -> Result<(), ClonerError> {
    let content = std::fs::read_to_string(repo_file)?;
    let rendered = match tls_identity {
        Some((cert, key)) => inject_tls_identity(&content, cert, key),
        None => content,
    };
    let file_name = repo_file.file_name().ok_or_else(|| ClonerError::Other {
        message: format!("'{}' is not a repository file", repo_file.display()),
    })?;
    std::fs::write(repos_dir.join(file_name), rendered)?;
    tracing::debug!("Installed repository file '{}'", repo_file.display());
    Ok(())
}

/// Add `sslclientcert`/`sslclientkey` under every `[section]` header.
pub fn inject_tls_identity(repo_content: &str, cert: &Path, key: &Path) -> String {
    let mut out = String::with_capacity(repo_content.len());
    for line in repo_content.lines() {
        out.push_str(line);
        out.push('\n');
        let trimmed = line.trim();
        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            let _ = writeln!(out, "sslclientcert={}", cert.display());
            let _ = writeln!(out, "sslclientkey={}", key.display());
        }
    }
    out
}
