use super::sampler::SamplingSynthesizer;
use super::{DesignConstraints, SEQS_DIR, SequenceDesigner, collect_designs, write_designs};
use crate::core::models::design::{BackboneResult, DesignResult};
use crate::engine::adapters::{path_arg, run_tool};
use crate::engine::config::{DesignConfig, DesignerKind, ExecutionConfig};
use crate::engine::error::AdapterError;
use crate::engine::runtime::{BackendChain, Invocation};
use rand::RngCore;
use rand::rngs::StdRng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tracing::{info, instrument};

const JSONL_FILE: &str = "input_pdbs.jsonl";
const FIXED_POSITIONS_FILE: &str = "fixed_positions.jsonl";

#[derive(Serialize)]
struct MpnnEntry<'a> {
    name: &'a str,
    pdb_path: String,
    chain_id: String,
}

/// ProteinMPNN inverse folding over the binder chain of each backbone.
pub struct ProteinMpnnDesigner {
    execution: ExecutionConfig,
}

impl ProteinMpnnDesigner {
    pub const TOOL: &'static str = "protein_mpnn";

    pub fn new(execution: ExecutionConfig) -> Self {
        Self { execution }
    }

    fn write_inputs(
        backbones: &[BackboneResult],
        output_dir: &Path,
        constraints: &DesignConstraints,
    ) -> Result<(), AdapterError> {
        let mut jsonl = std::fs::File::create(output_dir.join(JSONL_FILE))?;
        for backbone in backbones {
            let entry = MpnnEntry {
                name: &backbone.backbone_id,
                pdb_path: path_arg(&backbone.structure_path),
                chain_id: backbone.peptide_chain_id.to_string(),
            };
            let line = serde_json::to_string(&entry).map_err(std::io::Error::other)?;
            writeln!(jsonl, "{line}")?;
        }

        if !constraints.fixed.is_empty() {
            let positions: Vec<usize> = constraints.fixed.keys().copied().collect();
            let fixed: BTreeMap<&str, BTreeMap<String, &[usize]>> = backbones
                .iter()
                .map(|b| {
                    (
                        b.backbone_id.as_str(),
                        BTreeMap::from([(b.peptide_chain_id.to_string(), positions.as_slice())]),
                    )
                })
                .collect();
            let line = serde_json::to_string(&fixed).map_err(std::io::Error::other)?;
            std::fs::write(output_dir.join(FIXED_POSITIONS_FILE), format!("{line}\n"))?;
        }
        Ok(())
    }

    fn command(
        output_dir: &Path,
        seqs_dir: &Path,
        config: &DesignConfig,
        constraints: &DesignConstraints,
    ) -> Vec<String> {
        let mut command = vec![
            "python".to_string(),
            "protein_mpnn_run.py".to_string(),
            "--jsonl_path".to_string(),
            path_arg(&output_dir.join(JSONL_FILE)),
            "--out_folder".to_string(),
            path_arg(seqs_dir),
            "--num_seq_per_target".to_string(),
            config.num_sequences_per_backbone.to_string(),
            "--batch_size".to_string(),
            "1".to_string(),
        ];
        if !constraints.fixed.is_empty() {
            command.push("--fixed_positions_jsonl".to_string());
            command.push(path_arg(&output_dir.join(FIXED_POSITIONS_FILE)));
        }
        if !constraints.disallowed.is_empty() {
            command.push("--omit_AAs".to_string());
            command.push(constraints.disallowed.iter().collect());
        }
        command
    }
}

impl SequenceDesigner for ProteinMpnnDesigner {
    #[instrument(skip_all, name = "protein_mpnn")]
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
        std::fs::create_dir_all(&seqs_dir)?;
        Self::write_inputs(backbones, output_dir, constraints)?;

        let mut invocation = Invocation::new(
            Self::TOOL,
            Self::command(output_dir, &seqs_dir, config, constraints),
            output_dir,
        )
        .mount(output_dir);
        for backbone in backbones {
            if let Some(parent) = backbone.structure_path.parent() {
                invocation = invocation.mount(parent);
            }
        }

        let synthesizer = SamplingSynthesizer {
            seed: rng.next_u64(),
            backbones: backbones.to_vec(),
            seqs_dir: seqs_dir.clone(),
            samples_per_backbone: config.num_sequences_per_backbone,
            constraints: constraints.clone(),
            model_name: "v_48_020",
        };
        let chain = BackendChain::for_tool(Self::TOOL, &self.execution, Box::new(synthesizer));
        run_tool(chain, &invocation, output_dir)?;

        let designs =
            collect_designs(backbones, &seqs_dir, DesignerKind::ProteinMpnn, constraints)?;
        write_designs(output_dir, &designs)?;
        info!(count = designs.len(), "Collected ProteinMPNN designs");
        Ok(designs)
    }
}
