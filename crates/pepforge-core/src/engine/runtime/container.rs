use super::host::run_on_host;
use super::{BackendKind, ExecutionBackend, ExecutionError, ExecutionOutput, Invocation};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

/// Runs a tool inside a named container image.
///
/// The working directory and every mount are bound at identical paths inside the
/// container, so command lines built with host paths work unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerBackend {
    runtime: String,
    image: String,
}

impl ContainerBackend {
    pub fn new(runtime: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            runtime: runtime.into(),
            image: image.into(),
        }
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    /// The full host command line: `<runtime> run --rm -v .. -w .. -e .. <image> <cmd..>`.
    pub fn container_command(&self, invocation: &Invocation) -> Vec<String> {
        let mut binds: Vec<&PathBuf> = vec![&invocation.cwd];
        for mount in &invocation.mounts {
            if !binds.contains(&mount) {
                binds.push(mount);
            }
        }

        let mut argv = vec![self.runtime.clone(), "run".to_string(), "--rm".to_string()];
        for bind in binds {
            let path = bind.display();
            argv.push("-v".to_string());
            argv.push(format!("{path}:{path}"));
        }
        argv.push("-w".to_string());
        argv.push(invocation.cwd.display().to_string());
        for (key, value) in &invocation.env {
            argv.push("-e".to_string());
            argv.push(format!("{key}={value}"));
        }
        argv.push(self.image.clone());
        argv.extend(invocation.command.iter().cloned());
        argv
    }
}

impl ExecutionBackend for ContainerBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Container
    }

    fn is_available(&self) -> bool {
        match Command::new(&self.runtime)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) => status.success(),
            Err(e) => {
                debug!(runtime = %self.runtime, error = %e, "Container runtime probe failed");
                false
            }
        }
    }

    fn run(&self, invocation: &Invocation) -> Result<ExecutionOutput, ExecutionError> {
        if invocation.command.is_empty() {
            return Err(ExecutionError::EmptyCommand {
                tool: invocation.tool.clone(),
            });
        }
        let host_invocation = Invocation {
            command: self.container_command(invocation),
            env: Default::default(),
            ..invocation.clone()
        };
        let output = run_on_host(BackendKind::Container, &host_invocation)?;
        if output.success() {
            Ok(output)
        } else {
            Err(ExecutionError::NonZeroExit {
                backend: BackendKind::Container,
                program: invocation.program().to_string(),
                exit_code: output.exit_code,
                stderr: output.stderr,
            })
        }
    }
}
