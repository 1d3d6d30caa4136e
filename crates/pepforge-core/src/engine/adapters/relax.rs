//! Optional energy minimization of the cleaned target.

use crate::engine::adapters::{path_arg, require_file, run_tool};
use crate::engine::config::{ExecutionConfig, RelaxerKind};
use crate::engine::error::AdapterError;
use crate::engine::runtime::{ArtifactSynthesizer, BackendChain, Invocation};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

const RELAX_PH: f64 = 7.4;
const MAX_ITERATIONS: usize = 1000;

/// Simulated relaxation leaves the structure as it is.
struct CopySynthesizer {
    input: PathBuf,
    output: PathBuf,
}

impl ArtifactSynthesizer for CopySynthesizer {
    fn synthesize(&self, _invocation: &Invocation) -> io::Result<()> {
        std::fs::copy(&self.input, &self.output).map(|_| ())
    }
}

pub enum Relaxer {
    OpenMm(ExecutionConfig),
    Rosetta(ExecutionConfig),
}

impl Relaxer {
    /// `None` when relaxation is disabled.
    pub fn for_kind(kind: RelaxerKind, execution: &ExecutionConfig) -> Option<Self> {
        match kind {
            RelaxerKind::None => None,
            RelaxerKind::OpenMm => Some(Relaxer::OpenMm(execution.clone())),
            RelaxerKind::Rosetta => Some(Relaxer::Rosetta(execution.clone())),
        }
    }

    pub fn tool(&self) -> &'static str {
        match self {
            Relaxer::OpenMm(_) => "openmm",
            Relaxer::Rosetta(_) => "rosetta",
        }
    }

    fn command(&self, input: &Path, output: &Path) -> Vec<String> {
        match self {
            Relaxer::OpenMm(_) => vec![
                "python".to_string(),
                "relax_openmm.py".to_string(),
                "--input".to_string(),
                path_arg(input),
                "--output".to_string(),
                path_arg(output),
                "--ph".to_string(),
                RELAX_PH.to_string(),
                "--max-iterations".to_string(),
                MAX_ITERATIONS.to_string(),
            ],
            Relaxer::Rosetta(_) => vec![
                "relax.default.linuxgccrelease".to_string(),
                "-s".to_string(),
                path_arg(input),
                "-out:file:o".to_string(),
                path_arg(output),
                "-relax:quick".to_string(),
            ],
        }
    }

    /// Relaxes `input` into `output`. The caller decides whether a failure is fatal.
    #[instrument(skip_all, name = "relax", fields(tool = self.tool()))]
    pub fn relax(&self, input: &Path, output: &Path, log_dir: &Path) -> Result<PathBuf, AdapterError> {
        let (Relaxer::OpenMm(execution) | Relaxer::Rosetta(execution)) = self;
        let work_dir = output.parent().unwrap_or(log_dir);
        let invocation = Invocation::new(self.tool(), self.command(input, output), work_dir)
            .mount(work_dir)
            .mount(input.parent().unwrap_or(work_dir));
        let synthesizer = CopySynthesizer {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
        };
        let chain = BackendChain::for_tool(self.tool(), execution, Box::new(synthesizer));
        run_tool(chain, &invocation, log_dir)?;
        require_file(output)?;
        info!(output = %output.display(), "Relaxed target structure");
        Ok(output.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::ExecutionMode;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn execution(mode: ExecutionMode) -> ExecutionConfig {
        ExecutionConfig {
            mode,
            container_runtime: "docker".to_string(),
            image_overrides: BTreeMap::new(),
        }
    }

    #[test]
    fn disabled_relaxer_is_none() {
        assert!(Relaxer::for_kind(RelaxerKind::None, &execution(ExecutionMode::Auto)).is_none());
    }

    #[test]
    fn commands_name_input_and_output() {
        let exec = execution(ExecutionMode::Simulated);
        let openmm = Relaxer::for_kind(RelaxerKind::OpenMm, &exec).unwrap();
        let cmd = openmm.command(Path::new("in.pdb"), Path::new("out.pdb"));
        assert_eq!(cmd[..6], ["python", "relax_openmm.py", "--input", "in.pdb", "--output", "out.pdb"]);
        let rosetta = Relaxer::for_kind(RelaxerKind::Rosetta, &exec).unwrap();
        assert!(rosetta.command(Path::new("in.pdb"), Path::new("out.pdb")).contains(&"-relax:quick".to_string()));
    }

    #[test]
    fn simulated_relaxation_copies_the_structure() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("target_clean.pdb");
        let output = dir.path().join("target_relaxed.pdb");
        std::fs::write(&input, "END\n").unwrap();
        let relaxer = Relaxer::for_kind(RelaxerKind::OpenMm, &execution(ExecutionMode::Simulated)).unwrap();
        let relaxed = relaxer.relax(&input, &output, dir.path()).unwrap();
        assert_eq!(std::fs::read_to_string(relaxed).unwrap(), "END\n");
        assert!(dir.path().join("openmm.log").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn local_relaxation_without_the_tool_fails() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("target_clean.pdb");
        std::fs::write(&input, "END\n").unwrap();
        let relaxer = Relaxer::for_kind(RelaxerKind::Rosetta, &execution(ExecutionMode::Local)).unwrap();
        assert!(relaxer.relax(&input, &dir.path().join("out.pdb"), dir.path()).is_err());
    }
}
