use super::{BackendKind, ExecutionBackend, ExecutionError, ExecutionOutput, Invocation};
use std::io;
use tracing::info;

/// Writes the files a real tool would have produced for an invocation.
///
/// Each adapter supplies its own synthesizer, so downstream parsing sees the same file
/// names and formats whether or not the real tool ran. Implementations must be
/// deterministic for a given seed.
pub trait ArtifactSynthesizer {
    fn synthesize(&self, invocation: &Invocation) -> io::Result<()>;
}

/// Terminal fallback: performs no computation, only writes synthesized artifacts.
pub struct SimulatedBackend {
    synthesizer: Box<dyn ArtifactSynthesizer>,
}

impl SimulatedBackend {
    pub fn new(synthesizer: Box<dyn ArtifactSynthesizer>) -> Self {
        Self { synthesizer }
    }
}

impl ExecutionBackend for SimulatedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Simulated
    }

    fn is_available(&self) -> bool {
        true
    }

    fn run(&self, invocation: &Invocation) -> Result<ExecutionOutput, ExecutionError> {
        info!(tool = %invocation.tool, "Simulating tool run");
        self.synthesizer
            .synthesize(invocation)
            .map_err(|e| ExecutionError::Synthesis {
                tool: invocation.tool.clone(),
                source: e,
            })?;
        Ok(ExecutionOutput {
            backend: BackendKind::Simulated,
            exit_code: Some(0),
            stdout: format!("simulated {} run\n", invocation.tool),
            stderr: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    struct TouchOutput;

    impl ArtifactSynthesizer for TouchOutput {
        fn synthesize(&self, invocation: &Invocation) -> io::Result<()> {
            let out = invocation
                .flag_value("--out")
                .ok_or_else(|| io::Error::other("no --out"))?;
            std::fs::write(out, "synthetic")
        }
    }

    #[test]
    fn simulated_run_writes_synthesized_outputs() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("result.txt");
        let inv = Invocation::new(
            "tool",
            ["tool", "--out", out.to_str().unwrap()],
            dir.path(),
        );
        let output = SimulatedBackend::new(Box::new(TouchOutput)).run(&inv).unwrap();
        assert!(output.success());
        assert_eq!(std::fs::read_to_string(out).unwrap(), "synthetic");
    }

    #[test]
    fn synthesizer_failures_surface_as_execution_errors() {
        let inv = Invocation::new("tool", ["tool"], Path::new("."));
        assert!(matches!(
            SimulatedBackend::new(Box::new(TouchOutput)).run(&inv),
            Err(ExecutionError::Synthesis { .. })
        ));
    }
}
