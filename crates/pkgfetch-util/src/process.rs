use std::collections::BTreeMap;
use std::process::Command;

use crate::errors::PkgfetchError;

/// Captured result of a finished external process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Builder for constructing and executing external processes.
///
/// The package manager, `rpm`, `createrepo_c` and `tar` are all driven
/// through this type.
pub struct CommandBuilder {
    program: String,
    args: Vec<String>,
    env: BTreeMap<String, String>,
}

impl CommandBuilder {
    /// Create a new builder for the given program.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    /// Append a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child process.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Render the command line for log output.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Execute the command and capture its output.
    ///
    /// A non-zero exit status is not an error here; use
    /// [`CommandBuilder::exec_checked`] for that.
    pub fn exec(&self) -> Result<ProcessOutput, PkgfetchError> {
        tracing::debug!("Executing: {}", self.display());
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (k, v) in &self.env {
            cmd.env(k, v);
        }
        let output = cmd.output().map_err(|e| PkgfetchError::Generic {
            message: format!("Failed to spawn `{}`: {e}", self.program),
        })?;
        Ok(ProcessOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Execute the command and fail unless it exits successfully.
    pub fn exec_checked(&self) -> Result<ProcessOutput, PkgfetchError> {
        let output = self.exec()?;
        if output.success {
            Ok(output)
        } else {
            Err(PkgfetchError::Generic {
                message: format!(
                    "`{}` exited with {}: {}",
                    self.program,
                    output
                        .code
                        .map_or_else(|| "signal".to_string(), |c| format!("status {c}")),
                    output.stderr.trim()
                ),
            })
        }
    }
}
