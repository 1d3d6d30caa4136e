use super::{
    ArtifactSynthesizer, BackendKind, ContainerBackend, EnvironmentUnavailable, ExecutionBackend,
    LocalBackend, NotebookBackend, SimulatedBackend,
};
use crate::engine::config::{ExecutionConfig, ExecutionMode};
use tracing::{debug, info};

/// Result of probing one candidate backend.
pub enum Probe {
    Available(Box<dyn ExecutionBackend>),
    Unavailable { kind: BackendKind, reason: String },
}

impl Probe {
    /// Wraps a backend, asking it whether it can run right now.
    pub fn check(backend: Box<dyn ExecutionBackend>) -> Self {
        if backend.is_available() {
            Probe::Available(backend)
        } else {
            Probe::Unavailable {
                kind: backend.kind(),
                reason: format!("{} backend is not available", backend.kind()),
            }
        }
    }
}

type Candidate = Box<dyn FnOnce() -> Probe>;

/// Ordered candidate backends for one tool; the first available candidate wins.
///
/// Candidates are constructed and probed lazily, so nothing is checked until the chain
/// is resolved, and later candidates are never probed once one succeeds.
pub struct BackendChain {
    tool: String,
    candidates: Vec<Candidate>,
}

impl BackendChain {
    pub fn new(tool: &str) -> Self {
        Self {
            tool: tool.to_string(),
            candidates: Vec::new(),
        }
    }

    pub fn with_candidate(mut self, candidate: impl FnOnce() -> Probe + 'static) -> Self {
        self.candidates.push(Box::new(candidate));
        self
    }

    /// A chain that can only simulate, used by the stub adapters.
    pub fn simulated_only(tool: &str, synthesizer: Box<dyn ArtifactSynthesizer>) -> Self {
        Self::new(tool).with_simulated(synthesizer)
    }

    /// The standard chain for a containerized tool under the configured execution mode.
    ///
    /// `auto` tries the notebook runtime, then the tool's container image, then simulation.
    /// `local` runs on the host. `simulated` skips straight to simulation.
    pub fn for_tool(
        tool: &str,
        execution: &ExecutionConfig,
        synthesizer: Box<dyn ArtifactSynthesizer>,
    ) -> Self {
        match execution.mode {
            ExecutionMode::Simulated => Self::simulated_only(tool, synthesizer),
            ExecutionMode::Local => {
                Self::new(tool).with_candidate(|| Probe::check(Box::new(LocalBackend)))
            }
            ExecutionMode::Auto => {
                let runtime = execution.container_runtime.clone();
                let image = execution.image_for(tool);
                Self::new(tool)
                    .with_candidate(|| Probe::check(Box::new(NotebookBackend)))
                    .with_candidate(move || {
                        Probe::check(Box::new(ContainerBackend::new(runtime, image)))
                    })
                    .with_simulated(synthesizer)
            }
        }
    }

    fn with_simulated(self, synthesizer: Box<dyn ArtifactSynthesizer>) -> Self {
        self.with_candidate(move || Probe::Available(Box::new(SimulatedBackend::new(synthesizer))))
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn resolve(self) -> Result<Box<dyn ExecutionBackend>, EnvironmentUnavailable> {
        let mut reasons = Vec::new();
        for candidate in self.candidates {
            match candidate() {
                Probe::Available(backend) => {
                    info!(tool = %self.tool, backend = %backend.kind(), "Selected execution backend");
                    return Ok(backend);
                }
                Probe::Unavailable { kind, reason } => {
                    debug!(tool = %self.tool, backend = %kind, %reason, "Backend unavailable");
                    reasons.push(reason);
                }
            }
        }
        Err(EnvironmentUnavailable {
            tool: self.tool,
            reasons,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::runtime::{ExecutionError, ExecutionOutput, Invocation};
    use std::collections::BTreeMap;
    use std::io;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Offline(BackendKind);

    impl ExecutionBackend for Offline {
        fn kind(&self) -> BackendKind {
            self.0
        }
        fn is_available(&self) -> bool {
            false
        }
        fn run(&self, _: &Invocation) -> Result<ExecutionOutput, ExecutionError> {
            unreachable!("offline backends are never selected")
        }
    }

    struct Noop;

    impl ArtifactSynthesizer for Noop {
        fn synthesize(&self, _: &Invocation) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn falls_back_to_simulated_when_others_are_offline() {
        let backend = BackendChain::new("protein_mpnn")
            .with_candidate(|| Probe::check(Box::new(Offline(BackendKind::Notebook))))
            .with_candidate(|| Probe::check(Box::new(Offline(BackendKind::Container))))
            .with_simulated(Box::new(Noop))
            .resolve()
            .unwrap();
        assert_eq!(backend.kind(), BackendKind::Simulated);
    }

    #[test]
    fn exhausted_chain_reports_every_reason() {
        let err = BackendChain::new("chai1")
            .with_candidate(|| Probe::check(Box::new(Offline(BackendKind::Notebook))))
            .with_candidate(|| Probe::Unavailable {
                kind: BackendKind::Container,
                reason: "docker --version failed".to_string(),
            })
            .resolve()
            .err()
            .unwrap();
        assert_eq!(err.tool, "chai1");
        assert_eq!(err.reasons.len(), 2);
        assert!(err.to_string().contains("docker --version failed"));
    }

    #[test]
    fn later_candidates_are_not_probed_after_a_hit() {
        let probes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&probes);
        let backend = BackendChain::new("x")
            .with_simulated(Box::new(Noop))
            .with_candidate(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Probe::check(Box::new(Offline(BackendKind::Container)))
            })
            .resolve()
            .unwrap();
        assert_eq!(backend.kind(), BackendKind::Simulated);
        assert_eq!(probes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn simulated_mode_pins_the_chain() {
        let execution = ExecutionConfig {
            mode: ExecutionMode::Simulated,
            container_runtime: "docker".to_string(),
            image_overrides: BTreeMap::new(),
        };
        let backend = BackendChain::for_tool("rfdiffusion", &execution, Box::new(Noop))
            .resolve()
            .unwrap();
        assert_eq!(backend.kind(), BackendKind::Simulated);
    }
}
