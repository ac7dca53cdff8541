//! Handler for `pkgfetch status`.

use std::path::Path;

use miette::Result;
use pkgfetch_util::errors::PkgfetchError;

pub fn exec(graph: &Path, deny_unresolved: bool) -> Result<()> {
    let status = pkgfetch_ops::ops_status::graph_status(graph)?;
    print!("{status}");

    if deny_unresolved && status.has_unresolved() {
        return Err(PkgfetchError::Generic {
            message: format!(
                "{} run-time node(s) still unresolved in '{}'",
                status.unresolved.len(),
                graph.display()
            ),
        }
        .into());
    }
    Ok(())
}
