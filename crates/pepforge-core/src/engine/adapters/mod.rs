//! Adapters between pipeline stages and the external tools that do the heavy lifting.
//!
//! Each adapter family is a closed enum over the supported tools, resolved once from its
//! configured kind. Adapters describe a tool call as an
//! [`Invocation`](crate::engine::runtime::Invocation), hand it to a
//! [`BackendChain`](crate::engine::runtime::BackendChain), and then inspect the files the
//! tool is expected to have written. They never ask which backend actually ran.

use crate::engine::error::AdapterError;
use crate::engine::runtime::{BackendChain, ExecutionOutput, Invocation};
use std::path::Path;
use tracing::warn;

pub mod backbone;
pub mod design;
pub mod predict;
pub mod relax;
mod synthetic;

pub use backbone::{BackboneGenerator, Generator};
pub use design::{DesignConstraints, Designer, SequenceDesigner};
pub use predict::{Predictor, StructurePredictor};
pub use relax::Relaxer;

/// Resolves a backend, runs the invocation, and records the tool log in `log_dir`.
pub(crate) fn run_tool(
    chain: BackendChain,
    invocation: &Invocation,
    log_dir: &Path,
) -> Result<ExecutionOutput, AdapterError> {
    let backend = chain.resolve()?;
    let output = backend.run(invocation)?;
    let log_path = log_dir.join(format!("{}.log", invocation.tool));
    if let Err(e) = output.write_log(invocation, &log_path) {
        warn!(path = %log_path.display(), error = %e, "Could not write tool log");
    }
    Ok(output)
}

/// Chain id used for the designed binder: `B`, or `C` when the target itself is chain `B`.
pub fn binder_chain_for(target_chain: char) -> char {
    if target_chain == 'B' { 'C' } else { 'B' }
}

pub(crate) fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

pub(crate) fn require_file(path: &Path) -> Result<(), AdapterError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(AdapterError::MissingArtifact(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binder_chain_avoids_the_target_chain() {
        assert_eq!(binder_chain_for('A'), 'B');
        assert_eq!(binder_chain_for('B'), 'C');
        assert_eq!(binder_chain_for('H'), 'B');
    }
}
