//! Execution backends for external tools.
//!
//! An adapter describes *what* to run as an [`Invocation`]; a [`BackendChain`] decides
//! *where* it runs by probing candidates in order and taking the first available one. The
//! simulated backend is always available, so a chain that ends with it never fails to
//! resolve.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

mod chain;
mod container;
mod host;
mod simulated;

pub use chain::{BackendChain, Probe};
pub use container::ContainerBackend;
pub use host::{LocalBackend, NOTEBOOK_MARKER_ENV, NotebookBackend};
pub use simulated::{ArtifactSynthesizer, SimulatedBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Notebook,
    Container,
    Local,
    Simulated,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BackendKind::Notebook => "notebook",
            BackendKind::Container => "container",
            BackendKind::Local => "local",
            BackendKind::Simulated => "simulated",
        };
        f.write_str(s)
    }
}

/// One external tool call: the command line, its working directory, and environment
/// overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Short tool name, used for log file names and container image lookup.
    pub tool: String,
    pub command: Vec<String>,
    pub cwd: PathBuf,
    pub env: BTreeMap<String, String>,
    /// Extra host paths a containerized run needs to see (inputs and output directories).
    pub mounts: Vec<PathBuf>,
}

impl Invocation {
    pub fn new<I, S>(tool: &str, command: I, cwd: &Path) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tool: tool.to_string(),
            command: command.into_iter().map(Into::into).collect(),
            cwd: cwd.to_path_buf(),
            env: BTreeMap::new(),
            mounts: Vec::new(),
        }
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn mount(mut self, path: &Path) -> Self {
        if !self.mounts.iter().any(|m| m == path) {
            self.mounts.push(path.to_path_buf());
        }
        self
    }

    pub fn program(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or("")
    }

    /// Value following `flag` in the command line, e.g. `--out_dir <value>`.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.command
            .iter()
            .position(|arg| arg == flag)
            .and_then(|idx| self.command.get(idx + 1))
            .map(String::as_str)
    }

    /// Value of a `key=value` style argument, as used by Hydra-configured tools.
    pub fn assignment_value(&self, key: &str) -> Option<&str> {
        self.command.iter().find_map(|arg| {
            arg.strip_prefix(key)
                .and_then(|rest| rest.strip_prefix('='))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutput {
    pub backend: BackendKind,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Writes stdout and stderr of a tool run to `path`.
    pub fn write_log(&self, invocation: &Invocation, path: &Path) -> std::io::Result<()> {
        let mut file = std::fs::File::create(path)?;
        writeln!(file, "# backend: {}", self.backend)?;
        writeln!(file, "# command: {}", invocation.command.join(" "))?;
        writeln!(
            file,
            "# exit code: {}",
            self.exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string())
        )?;
        writeln!(file, "## stdout")?;
        file.write_all(self.stdout.as_bytes())?;
        writeln!(file, "\n## stderr")?;
        file.write_all(self.stderr.as_bytes())?;
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Invocation of '{tool}' has an empty command line")]
    EmptyCommand { tool: String },

    #[error("Failed to launch '{program}' on the {backend} backend: {source}")]
    Spawn {
        backend: BackendKind,
        program: String,
        source: std::io::Error,
    },

    #[error("'{program}' exited with code {exit_code:?} on the {backend} backend: {stderr}")]
    NonZeroExit {
        backend: BackendKind,
        program: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Simulated '{tool}' could not write its outputs: {source}")]
    Synthesis {
        tool: String,
        source: std::io::Error,
    },
}

/// Every candidate in a backend chain was unavailable.
#[derive(Debug, Error)]
#[error("No execution backend available for '{tool}' ({})", reasons.join("; "))]
pub struct EnvironmentUnavailable {
    pub tool: String,
    pub reasons: Vec<String>,
}

/// A place where an [`Invocation`] can run.
pub trait ExecutionBackend {
    fn kind(&self) -> BackendKind;

    /// Probes whether the backend can run anything right now. Probe failures count as
    /// unavailable rather than errors.
    fn is_available(&self) -> bool;

    fn run(&self, invocation: &Invocation) -> Result<ExecutionOutput, ExecutionError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn invocation() -> Invocation {
        Invocation::new(
            "rfdiffusion",
            [
                "python",
                "scripts/run_inference.py",
                "inference.output_prefix=/out/rfdiffusion_out",
                "inference.num_designs=3",
                "--flag",
                "value",
            ],
            Path::new("/work"),
        )
    }

    #[test]
    fn argument_lookups_find_flags_and_assignments() {
        let inv = invocation();
        assert_eq!(inv.program(), "python");
        assert_eq!(inv.flag_value("--flag"), Some("value"));
        assert_eq!(inv.flag_value("--absent"), None);
        assert_eq!(inv.assignment_value("inference.num_designs"), Some("3"));
        assert_eq!(
            inv.assignment_value("inference.output_prefix"),
            Some("/out/rfdiffusion_out")
        );
        assert_eq!(inv.assignment_value("inference"), None);
    }

    #[test]
    fn mounts_are_deduplicated() {
        let inv = invocation()
            .mount(Path::new("/data"))
            .mount(Path::new("/data"));
        assert_eq!(inv.mounts, vec![PathBuf::from("/data")]);
    }

    #[test]
    fn tool_log_records_command_and_streams() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rfdiffusion.log");
        let output = ExecutionOutput {
            backend: BackendKind::Simulated,
            exit_code: Some(0),
            stdout: "done".to_string(),
            stderr: String::new(),
        };
        output.write_log(&invocation(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("# backend: simulated"));
        assert!(text.contains("scripts/run_inference.py"));
        assert!(text.contains("done"));
    }
}
