use crate::core::chemistry::properties::SequenceProperties;
use crate::core::models::peptide::PeptideInfo;
use crate::core::models::reference::ReferenceProperties;
use tracing::{info, instrument, warn};

/// Scores the original peptide so designs can be ranked relative to it.
///
/// Returns `None` (with a warning) for an empty peptide sequence; ranking then falls back
/// to the reference-free score.
#[instrument(skip_all, name = "reference_properties")]
pub fn compute_reference_properties(peptide: &PeptideInfo, ph: f64) -> Option<ReferenceProperties> {
    if peptide.is_empty() {
        warn!(chain = %peptide.chain_id, "Existing peptide has no standard residues; reference ranking disabled");
        return None;
    }
    let properties = SequenceProperties::compute(&peptide.sequence, ph);
    info!(
        sequence = %peptide.sequence,
        net_charge = properties.net_charge,
        "Computed reference properties"
    );
    Some(ReferenceProperties::from_properties(&peptide.sequence, &properties))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn peptide(sequence: &str) -> PeptideInfo {
        PeptideInfo {
            chain_id: 'P',
            sequence: sequence.to_string(),
            residue_indices: (1..=sequence.len() as i32).collect(),
            original_structure_path: PathBuf::from("complex.pdb"),
        }
    }

    #[test]
    fn reference_mirrors_sequence_properties() {
        let reference = compute_reference_properties(&peptide("WKELA"), 7.4).unwrap();
        let expected = SequenceProperties::compute("WKELA", 7.4);
        assert_eq!(reference.length, 5);
        assert_eq!(reference.net_charge, expected.net_charge);
        assert_eq!(reference.aromatic_fraction, 0.2);
    }

    #[test]
    fn empty_peptide_has_no_reference() {
        assert!(compute_reference_properties(&peptide(""), 7.4).is_none());
    }
}
