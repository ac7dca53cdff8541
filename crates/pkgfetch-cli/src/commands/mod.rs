//! Command dispatch and handler modules.

mod fetch;
mod status;

use miette::Result;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Fetch(args) => fetch::exec(args),
        Command::Status {
            graph,
            deny_unresolved,
        } => status::exec(&graph, deny_unresolved),
    }
}
