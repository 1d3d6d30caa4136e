use super::{BackendKind, ExecutionBackend, ExecutionError, ExecutionOutput, Invocation};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Environment variable present inside a hosted notebook runtime.
pub const NOTEBOOK_MARKER_ENV: &str = "COLAB_RELEASE_TAG";

/// Runs an invocation as a host subprocess and captures its output.
pub(super) fn run_on_host(
    backend: BackendKind,
    invocation: &Invocation,
) -> Result<ExecutionOutput, ExecutionError> {
    let (program, args) =
        invocation
            .command
            .split_first()
            .ok_or_else(|| ExecutionError::EmptyCommand {
                tool: invocation.tool.clone(),
            })?;

    debug!(%backend, tool = %invocation.tool, command = %invocation.command.join(" "), "spawning tool");
    let output = Command::new(program)
        .args(args)
        .current_dir(&invocation.cwd)
        .envs(&invocation.env)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| ExecutionError::Spawn {
            backend,
            program: program.clone(),
            source: e,
        })?;

    Ok(ExecutionOutput {
        backend,
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

fn fail_on_nonzero(
    output: ExecutionOutput,
    invocation: &Invocation,
) -> Result<ExecutionOutput, ExecutionError> {
    if output.success() {
        Ok(output)
    } else {
        Err(ExecutionError::NonZeroExit {
            backend: output.backend,
            program: invocation.program().to_string(),
            exit_code: output.exit_code,
            stderr: output.stderr,
        })
    }
}

/// Host subprocess execution. A non-zero exit is an error.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalBackend;

impl ExecutionBackend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn is_available(&self) -> bool {
        true
    }

    fn run(&self, invocation: &Invocation) -> Result<ExecutionOutput, ExecutionError> {
        let output = run_on_host(BackendKind::Local, invocation)?;
        fail_on_nonzero(output, invocation)
    }
}

/// Execution inside a hosted notebook runtime, where tools are installed on the host.
///
/// Notebook cells keep going after a failed shell command, so a non-zero exit is logged
/// and returned rather than raised; the calling adapter then detects missing outputs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotebookBackend;

impl ExecutionBackend for NotebookBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Notebook
    }

    fn is_available(&self) -> bool {
        std::env::var_os(NOTEBOOK_MARKER_ENV).is_some()
    }

    fn run(&self, invocation: &Invocation) -> Result<ExecutionOutput, ExecutionError> {
        let output = run_on_host(BackendKind::Notebook, invocation)?;
        if !output.success() {
            warn!(
                tool = %invocation.tool,
                exit_code = ?output.exit_code,
                "Notebook command exited unsuccessfully"
            );
        }
        Ok(output)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn local_backend_captures_stdout_and_env() {
        let dir = tempdir().unwrap();
        let inv = Invocation::new("echo", ["sh", "-c", "echo \"$GREETING\""], dir.path())
            .env("GREETING", "hello");
        let output = LocalBackend.run(&inv).unwrap();
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.backend, BackendKind::Local);
    }

    #[test]
    fn local_backend_fails_on_nonzero_exit() {
        let dir = tempdir().unwrap();
        let inv = Invocation::new("false", ["sh", "-c", "echo oops >&2; exit 3"], dir.path());
        match LocalBackend.run(&inv) {
            Err(ExecutionError::NonZeroExit {
                exit_code, stderr, ..
            }) => {
                assert_eq!(exit_code, Some(3));
                assert!(stderr.contains("oops"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn notebook_backend_returns_failed_output() {
        let dir = tempdir().unwrap();
        let inv = Invocation::new("false", ["sh", "-c", "exit 1"], dir.path());
        let output = NotebookBackend.run(&inv).unwrap();
        assert_eq!(output.exit_code, Some(1));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let dir = tempdir().unwrap();
        let inv = Invocation::new("ghost", ["pepforge-no-such-binary"], dir.path());
        assert!(matches!(
            LocalBackend.run(&inv),
            Err(ExecutionError::Spawn { .. })
        ));
        let empty = Invocation::new("none", Vec::<String>::new(), dir.path());
        assert!(matches!(
            LocalBackend.run(&empty),
            Err(ExecutionError::EmptyCommand { .. })
        ));
    }
}
