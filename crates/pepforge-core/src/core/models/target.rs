use super::binding_site::BindingSite;
use super::peptide::PeptideInfo;
use std::path::{Path, PathBuf};

/// Output of target preparation, consumed by backbone generation.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetState {
    pub clean_structure_path: PathBuf,
    pub relaxed_structure_path: Option<PathBuf>,
    pub binding_site: BindingSite,
    pub peptide_info: Option<PeptideInfo>,
}

impl TargetState {
    /// The relaxed structure when it was produced and still exists on disk, otherwise the
    /// cleaned structure. Relaxation is allowed to fail without aborting the run.
    pub fn best_structure_path(&self) -> &Path {
        match &self.relaxed_structure_path {
            Some(path) if path.exists() => path,
            _ => &self.clean_structure_path,
        }
    }
}
