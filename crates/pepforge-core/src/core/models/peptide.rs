use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The peptide already bound to the target in the input structure.
///
/// Only produced for optimize-existing runs (or de-novo runs that name a template chain).
/// It is the source of truth for reference properties and for defaulting fixed residues
/// during sequence design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeptideInfo {
    pub chain_id: char,
    pub sequence: String,
    pub residue_indices: Vec<i32>,
    pub original_structure_path: PathBuf,
}

impl PeptideInfo {
    pub fn len(&self) -> usize {
        self.sequence.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Residue at a 1-based position of the peptide sequence.
    pub fn residue_at(&self, position: usize) -> Option<char> {
        position
            .checked_sub(1)
            .and_then(|idx| self.sequence.chars().nth(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn residue_at_is_one_based_and_bounded() {
        let info = PeptideInfo {
            chain_id: 'B',
            sequence: "ETFSDLW".to_string(),
            residue_indices: (17..24).collect(),
            original_structure_path: PathBuf::from("complex.pdb"),
        };
        assert_eq!(info.residue_at(1), Some('E'));
        assert_eq!(info.residue_at(7), Some('W'));
        assert_eq!(info.residue_at(0), None);
        assert_eq!(info.residue_at(8), None);
        assert_eq!(info.len(), 7);
    }
}
