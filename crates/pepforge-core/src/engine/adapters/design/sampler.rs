use super::fasta::{FastaRecord, format_fasta};
use super::{DesignConstraints, fasta_path};
use crate::core::chemistry::residues;
use crate::core::models::design::BackboneResult;
use crate::engine::adapters::synthetic;
use crate::engine::runtime::{ArtifactSynthesizer, Invocation};
use rand::Rng;
use rand::seq::SliceRandom;
use std::io;
use std::path::PathBuf;

/// Writes ProteinMPNN-shaped FASTA files: a native record taken from the backbone's binder
/// chain, then uniformly sampled designs that honor the run constraints.
pub(super) struct SamplingSynthesizer {
    pub seed: u64,
    pub backbones: Vec<BackboneResult>,
    pub seqs_dir: PathBuf,
    pub samples_per_backbone: usize,
    pub constraints: DesignConstraints,
    pub model_name: &'static str,
}

impl SamplingSynthesizer {
    fn native_sequence(backbone: &BackboneResult) -> io::Result<String> {
        let structure = synthetic::read_structure(&backbone.structure_path)?;
        Ok(structure
            .chain_residues(backbone.peptide_chain_id)
            .iter()
            .map(|(_, name)| residues::three_to_one(name).unwrap_or('X'))
            .collect())
    }

    fn sample(&self, native: &[char], alphabet: &[char], rng: &mut impl Rng) -> String {
        native
            .iter()
            .enumerate()
            .map(|(idx, &native_code)| match self.constraints.fixed.get(&(idx + 1)) {
                Some(Some(code)) => *code,
                Some(None) => native_code,
                None => alphabet.choose(rng).copied().unwrap_or('A'),
            })
            .collect()
    }
}

impl ArtifactSynthesizer for SamplingSynthesizer {
    fn synthesize(&self, _invocation: &Invocation) -> io::Result<()> {
        std::fs::create_dir_all(&self.seqs_dir)?;
        let alphabet = residues::allowed_alphabet(&self.constraints.disallowed);
        let mut rng = synthetic::seeded_rng(self.seed);

        for backbone in &self.backbones {
            let native = Self::native_sequence(backbone)?;
            let native_chars: Vec<char> = native.chars().collect();
            let mut records = vec![FastaRecord::new(
                format!(
                    "{}, score=2.0000, global_score=2.0000, designed_chains=['{}'], model_name={}, seed={}",
                    backbone.backbone_id, backbone.peptide_chain_id, self.model_name, self.seed
                ),
                native,
            )];
            for sample in 1..=self.samples_per_backbone {
                let sequence = self.sample(&native_chars, &alphabet, &mut rng);
                let score: f64 = rng.gen_range(0.5..2.5);
                let global_score: f64 = score + rng.gen_range(0.0..0.5);
                records.push(FastaRecord::new(
                    format!(
                        "T=0.1, sample={sample}, score={score:.4}, global_score={global_score:.4}"
                    ),
                    sequence,
                ));
            }
            std::fs::write(
                fasta_path(&self.seqs_dir, &backbone.backbone_id),
                format_fasta(&records),
            )?;
        }
        Ok(())
    }
}
