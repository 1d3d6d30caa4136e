//! Sequence designers: thread amino-acid sequences onto generated backbones.

use crate::core::io::tables;
use crate::core::models::Metadata;
use crate::core::models::design::{BackboneResult, DesignResult};
use crate::core::models::peptide::PeptideInfo;
use crate::engine::config::{DesignConfig, DesignerKind, ExecutionConfig, RunMode};
use crate::engine::error::AdapterError;
use rand::rngs::StdRng;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

mod fasta;
mod mpnn;
mod sampler;
mod stub;

pub use fasta::{FastaRecord, format_fasta, header_field, parse_fasta};
pub use mpnn::ProteinMpnnDesigner;
pub use stub::StubDesigner;

pub const SEQUENCES_FILE: &str = "sequences.csv";
/// Subdirectory of the design stage that holds one FASTA file per backbone.
pub const SEQS_DIR: &str = "seqs";

/// Constraints shared by every backbone of a run, resolved once before design starts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesignConstraints {
    /// 1-based position to its required residue. `None` keeps whatever residue the
    /// backbone already carries at that position.
    pub fixed: BTreeMap<usize, Option<char>>,
    pub disallowed: Vec<char>,
}

impl DesignConstraints {
    /// Pairs fixed positions with explicit residues. When none were given in
    /// optimize-existing mode, the original peptide's residues are used instead.
    pub fn resolve(config: &DesignConfig, peptide: Option<&PeptideInfo>, mode: RunMode) -> Self {
        let fixed = config
            .fixed_positions
            .iter()
            .enumerate()
            .map(|(idx, &position)| {
                let residue = match (&config.fixed_residues, peptide, mode) {
                    (Some(residues), _, _) => residues.get(idx).copied(),
                    (None, Some(info), RunMode::OptimizeExisting) => info.residue_at(position),
                    _ => None,
                };
                (position, residue)
            })
            .collect();
        Self {
            fixed,
            disallowed: config.disallowed_residues.clone(),
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        self.fixed.is_empty() && self.disallowed.is_empty()
    }

    /// Overwrites explicitly fixed positions in `sequence`, leaving out-of-range ones alone.
    pub fn enforce(&self, sequence: &str) -> String {
        let mut residues: Vec<char> = sequence.chars().collect();
        for (&position, residue) in &self.fixed {
            match (residue, residues.get_mut(position.wrapping_sub(1))) {
                (Some(code), Some(slot)) => *slot = *code,
                (Some(_), None) => {
                    warn!(position, length = residues.len(), "Fixed position beyond sequence end")
                }
                (None, _) => {}
            }
        }
        residues.into_iter().collect()
    }
}

pub trait SequenceDesigner {
    /// Designs sequences for every backbone and writes the designs table into
    /// `output_dir`. Safe to call with no backbones.
    fn design(
        &self,
        backbones: &[BackboneResult],
        output_dir: &Path,
        config: &DesignConfig,
        constraints: &DesignConstraints,
        rng: &mut StdRng,
    ) -> Result<Vec<DesignResult>, AdapterError>;
}

pub enum Designer {
    Stub(StubDesigner),
    ProteinMpnn(ProteinMpnnDesigner),
}

impl Designer {
    pub fn for_kind(kind: DesignerKind, execution: &ExecutionConfig) -> Self {
        match kind {
            DesignerKind::Stub => Designer::Stub(StubDesigner),
            DesignerKind::ProteinMpnn => {
                Designer::ProteinMpnn(ProteinMpnnDesigner::new(execution.clone()))
            }
        }
    }

    pub fn kind(&self) -> DesignerKind {
        match self {
            Designer::Stub(_) => DesignerKind::Stub,
            Designer::ProteinMpnn(_) => DesignerKind::ProteinMpnn,
        }
    }
}

impl SequenceDesigner for Designer {
    fn design(
        &self,
        backbones: &[BackboneResult],
        output_dir: &Path,
        config: &DesignConfig,
        constraints: &DesignConstraints,
        rng: &mut StdRng,
    ) -> Result<Vec<DesignResult>, AdapterError> {
        match self {
            Designer::Stub(d) => d.design(backbones, output_dir, config, constraints, rng),
            Designer::ProteinMpnn(d) => d.design(backbones, output_dir, config, constraints, rng),
        }
    }
}

pub(crate) fn fasta_path(seqs_dir: &Path, backbone_id: &str) -> PathBuf {
    seqs_dir.join(format!("{backbone_id}.fa"))
}

/// Reads each backbone's FASTA, skipping the leading native record, and builds design
/// records with constraints enforced. A missing FASTA is an error.
pub(crate) fn collect_designs(
    backbones: &[BackboneResult],
    seqs_dir: &Path,
    mode: DesignerKind,
    constraints: &DesignConstraints,
) -> Result<Vec<DesignResult>, AdapterError> {
    let mut designs = Vec::new();
    for backbone in backbones {
        let path = fasta_path(seqs_dir, &backbone.backbone_id);
        let text = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AdapterError::MissingArtifact(path.clone()),
            _ => AdapterError::Io(e),
        })?;
        let records = parse_fasta(&text);
        if records.is_empty() {
            return Err(AdapterError::MalformedArtifact {
                path,
                reason: "no FASTA records".to_string(),
            });
        }
        for (index, record) in records.iter().skip(1).enumerate() {
            let score = match header_field(&record.header, "score") {
                Some(raw) => Some(raw.parse::<f64>().map_err(|_| {
                    AdapterError::MalformedArtifact {
                        path: path.clone(),
                        reason: format!("invalid score '{raw}'"),
                    }
                })?),
                None => None,
            };
            let metadata = Metadata::from([
                ("mode".to_string(), mode.as_str().to_string()),
                (
                    "backbone_path".to_string(),
                    backbone.structure_path.display().to_string(),
                ),
            ]);
            designs.push(DesignResult {
                design_id: DesignResult::make_id(&backbone.backbone_id, index),
                backbone_id: backbone.backbone_id.clone(),
                sequence: constraints.enforce(&record.sequence),
                score,
                metadata,
            });
        }
    }
    Ok(designs)
}

pub(crate) fn write_designs(output_dir: &Path, designs: &[DesignResult]) -> Result<(), AdapterError> {
    tables::write_table(&output_dir.join(SEQUENCES_FILE), designs)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn design_config(fixed_positions: Vec<usize>, fixed_residues: Option<Vec<char>>) -> DesignConfig {
        DesignConfig {
            designer: DesignerKind::Stub,
            num_sequences_per_backbone: 2,
            fixed_positions,
            fixed_residues,
            disallowed_residues: vec!['C'],
        }
    }

    fn peptide() -> PeptideInfo {
        PeptideInfo {
            chain_id: 'B',
            sequence: "WKELA".to_string(),
            residue_indices: vec![1, 2, 3, 4, 5],
            original_structure_path: PathBuf::from("input.pdb"),
        }
    }

    #[test]
    fn explicit_fixed_residues_pair_with_positions() {
        let c = DesignConstraints::resolve(
            &design_config(vec![1, 3], Some(vec!['G', 'P'])),
            Some(&peptide()),
            RunMode::OptimizeExisting,
        );
        assert_eq!(c.fixed, BTreeMap::from([(1, Some('G')), (3, Some('P'))]));
        assert_eq!(c.disallowed, vec!['C']);
    }

    #[test]
    fn optimize_mode_defaults_fixed_residues_to_the_original_peptide() {
        let c = DesignConstraints::resolve(
            &design_config(vec![1, 4], None),
            Some(&peptide()),
            RunMode::OptimizeExisting,
        );
        assert_eq!(c.fixed, BTreeMap::from([(1, Some('W')), (4, Some('L'))]));
    }

    #[test]
    fn de_novo_without_residues_keeps_backbone_residues() {
        let c = DesignConstraints::resolve(&design_config(vec![2], None), None, RunMode::DeNovo);
        assert_eq!(c.fixed, BTreeMap::from([(2, None)]));
        assert_eq!(c.enforce("AAAA"), "AAAA");
    }

    #[test]
    fn enforce_overwrites_only_fixed_positions() {
        let c = DesignConstraints {
            fixed: BTreeMap::from([(1, Some('W')), (4, Some('K')), (9, Some('E'))]),
            disallowed: Vec::new(),
        };
        assert_eq!(c.enforce("AAAA"), "WAAK");
    }

    #[test]
    fn collect_skips_native_record_and_reads_scores() {
        let dir = tempfile::tempdir().unwrap();
        let backbone = BackboneResult {
            backbone_id: "backbone_0".to_string(),
            structure_path: dir.path().join("backbone_0.pdb"),
            peptide_chain_id: 'B',
            metadata: Metadata::new(),
        };
        std::fs::write(
            fasta_path(dir.path(), "backbone_0"),
            ">backbone_0, score=2.0, global_score=2.0\nAAAA\n\
             >T=0.1, sample=1, score=0.9, global_score=1.2\nWKEL\n\
             >T=0.1, sample=2, score=1.1, global_score=1.3\nRRDE\n",
        )
        .unwrap();

        let designs = collect_designs(
            &[backbone],
            dir.path(),
            DesignerKind::ProteinMpnn,
            &DesignConstraints::default(),
        )
        .unwrap();

        assert_eq!(designs.len(), 2);
        assert_eq!(designs[0].design_id, "backbone_0_seq_0");
        assert_eq!(designs[1].sequence, "RRDE");
        assert_eq!(designs[0].score, Some(0.9));
        assert_eq!(designs[0].metadata["mode"], "protein_mpnn");
    }

    #[test]
    fn missing_fasta_is_a_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let backbone = BackboneResult {
            backbone_id: "backbone_3".to_string(),
            structure_path: dir.path().join("backbone_3.pdb"),
            peptide_chain_id: 'B',
            metadata: Metadata::new(),
        };
        let err = collect_designs(
            &[backbone],
            dir.path(),
            DesignerKind::Stub,
            &DesignConstraints::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AdapterError::MissingArtifact(_)));
    }
}
