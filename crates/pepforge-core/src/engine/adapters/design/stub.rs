use super::sampler::SamplingSynthesizer;
use super::{
    DesignConstraints, SEQS_DIR, SequenceDesigner, collect_designs, write_designs,
};
use crate::core::models::design::{BackboneResult, DesignResult};
use crate::engine::adapters::{path_arg, run_tool};
use crate::engine::config::{DesignConfig, DesignerKind};
use crate::engine::error::AdapterError;
use crate::engine::runtime::{BackendChain, Invocation};
use rand::RngCore;
use rand::rngs::StdRng;
use std::path::Path;
use tracing::{info, instrument};

const TOOL: &str = "stub_designer";

/// Samples residues uniformly from the allowed alphabet; never calls an external tool.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubDesigner;

impl SequenceDesigner for StubDesigner {
    #[instrument(skip_all, name = "stub_designer")]
    fn design(
        &self,
        backbones: &[BackboneResult],
        output_dir: &Path,
        config: &DesignConfig,
        constraints: &DesignConstraints,
        rng: &mut StdRng,
    ) -> Result<Vec<DesignResult>, AdapterError> {
        if backbones.is_empty() || config.num_sequences_per_backbone == 0 {
            write_designs(output_dir, &[])?;
            return Ok(Vec::new());
        }

        let seqs_dir = output_dir.join(SEQS_DIR);
        let synthesizer = SamplingSynthesizer {
            seed: rng.next_u64(),
            backbones: backbones.to_vec(),
            seqs_dir: seqs_dir.clone(),
            samples_per_backbone: config.num_sequences_per_backbone,
            constraints: constraints.clone(),
            model_name: "stub",
        };
        let invocation = Invocation::new(
            TOOL,
            [
                "pepforge-stub-designer".to_string(),
                "--out_folder".to_string(),
                path_arg(&seqs_dir),
                "--num_seq_per_target".to_string(),
                config.num_sequences_per_backbone.to_string(),
            ],
            output_dir,
        );
        run_tool(
            BackendChain::simulated_only(TOOL, Box::new(synthesizer)),
            &invocation,
            output_dir,
        )?;

        let designs = collect_designs(backbones, &seqs_dir, DesignerKind::Stub, constraints)?;
        write_designs(output_dir, &designs)?;
        info!(count = designs.len(), "Designed stub sequences");
        Ok(designs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::pdb::PdbFile;
    use crate::core::io::traits::StructureFile;
    use crate::core::models::Metadata;
    use crate::core::models::structure::{AtomRecord, Structure};
    use nalgebra::Point3;
    use rand::SeedableRng;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn backbone(dir: &Path, id: &str, length: i32) -> BackboneResult {
        let atoms = (1..=length)
            .map(|i| {
                AtomRecord::protein(i as u32, "CA", "ALA", 'B', i, Point3::new(i as f64, 0.0, 0.0))
            })
            .collect();
        let structure_path = dir.join(format!("{id}.pdb"));
        PdbFile::write_to_path(&Structure::new(atoms), &structure_path).unwrap();
        BackboneResult {
            backbone_id: id.to_string(),
            structure_path,
            peptide_chain_id: 'B',
            metadata: Metadata::new(),
        }
    }

    fn config(n: usize) -> DesignConfig {
        DesignConfig {
            designer: DesignerKind::Stub,
            num_sequences_per_backbone: n,
            fixed_positions: Vec::new(),
            fixed_residues: None,
            disallowed_residues: Vec::new(),
        }
    }

    #[test]
    fn designs_every_backbone_with_deterministic_ids() {
        let dir = tempdir().unwrap();
        let backbones = vec![backbone(dir.path(), "backbone_0", 8), backbone(dir.path(), "backbone_1", 8)];
        let mut rng = StdRng::seed_from_u64(11);

        let designs = StubDesigner
            .design(&backbones, dir.path(), &config(3), &DesignConstraints::default(), &mut rng)
            .unwrap();

        let ids: Vec<_> = designs.iter().map(|d| d.design_id.as_str()).collect();
        assert_eq!(
            ids,
            [
                "backbone_0_seq_0",
                "backbone_0_seq_1",
                "backbone_0_seq_2",
                "backbone_1_seq_0",
                "backbone_1_seq_1",
                "backbone_1_seq_2"
            ]
        );
        assert!(designs.iter().all(|d| d.sequence.len() == 8));
        assert!(designs.iter().all(|d| d.score.is_some_and(|s| (0.5..=2.5).contains(&s))));
        assert!(dir.path().join("sequences.csv").is_file());
    }

    #[test]
    fn constraints_are_honored() {
        let dir = tempdir().unwrap();
        let backbones = vec![backbone(dir.path(), "backbone_0", 6)];
        let constraints = DesignConstraints {
            fixed: BTreeMap::from([(1, Some('W')), (2, None)]),
            disallowed: "CDEFGHIKLMNPQRSTVY".chars().collect(),
        };
        let mut rng = StdRng::seed_from_u64(5);

        let designs = StubDesigner
            .design(&backbones, dir.path(), &config(4), &constraints, &mut rng)
            .unwrap();

        for design in &designs {
            assert!(design.sequence.starts_with("WA"));
            assert!(design.sequence[2..].chars().all(|c| c == 'A' || c == 'W'));
        }
    }

    #[test]
    fn no_backbones_yields_no_designs() {
        let dir = tempdir().unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let designs = StubDesigner
            .design(&[], dir.path(), &config(4), &DesignConstraints::default(), &mut rng)
            .unwrap();
        assert!(designs.is_empty());
        let header = std::fs::read_to_string(dir.path().join("sequences.csv")).unwrap();
        assert!(header.starts_with("design_id,backbone_id,sequence,score"));
    }
}
