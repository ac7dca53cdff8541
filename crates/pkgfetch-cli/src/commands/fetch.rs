//! Handler for `pkgfetch fetch`.

use std::path::Path;

use miette::Result;
use pkgfetch_core::config::FetchConfig;
use pkgfetch_util::errors::PkgfetchError;

use crate::cli::FetchArgs;

const DEFAULT_CONFIG_FILE: &str = "pkgfetch.toml";

pub fn exec(mut args: FetchArgs) -> Result<()> {
    let mut config = match args.config.take() {
        Some(path) => load_explicit(&path)?,
        None => FetchConfig::load(Path::new(DEFAULT_CONFIG_FILE))?,
    };
    args.apply_to(&mut config);
    tracing::debug!("Effective configuration: {config:?}");

    pkgfetch_ops::ops_fetch::resolve_packages(&config)?;
    Ok(())
}

/// A config file named on the command line must exist.
fn load_explicit(path: &Path) -> Result<FetchConfig> {
    if !path.is_file() {
        return Err(PkgfetchError::Config {
            message: format!("config file '{}' not found", path.display()),
        }
        .into());
    }
    FetchConfig::load(path)
}
