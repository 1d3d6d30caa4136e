use super::{
    PredictionQuery, Receptor, StructurePredictor, find_by_prefix, mean, synthetic_plddt,
    write_predictions, write_synthetic_complex,
};
use crate::core::io::documents;
use crate::core::models::Metadata;
use crate::core::models::design::PredictionResult;
use crate::engine::adapters::design::{FastaRecord, format_fasta};
use crate::engine::adapters::{path_arg, run_tool, synthetic};
use crate::engine::config::{ExecutionConfig, PredictionConfig};
use crate::engine::error::AdapterError;
use crate::engine::runtime::{ArtifactSynthesizer, BackendChain, Invocation};
use rand::RngCore;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

const FASTA_FILE: &str = "sequences.fasta";

#[derive(Debug, Serialize, Deserialize)]
struct ColabFoldScores {
    #[serde(default)]
    plddt: Vec<f64>,
    #[serde(default)]
    mean_plddt: Option<f64>,
    #[serde(default)]
    ptm: Option<f64>,
    #[serde(default)]
    iptm: Option<f64>,
}

/// AlphaFold2-multimer through ColabFold's `colabfold_batch`.
pub struct AlphaFold2Predictor {
    execution: ExecutionConfig,
}

fn model_prefix(design_id: &str, relaxed: bool) -> String {
    let state = if relaxed { "relaxed" } else { "unrelaxed" };
    format!("{design_id}_{state}_rank_001")
}

fn scores_prefix(design_id: &str) -> String {
    format!("{design_id}_scores_rank_001")
}

struct ColabFoldSynthesizer {
    seed: u64,
    queries: Vec<PredictionQuery>,
    receptor: Receptor,
    output_dir: PathBuf,
    relaxed: bool,
}

impl ArtifactSynthesizer for ColabFoldSynthesizer {
    fn synthesize(&self, _invocation: &Invocation) -> io::Result<()> {
        let mut rng = synthetic::seeded_rng(self.seed);
        for query in &self.queries {
            let plddt = synthetic_plddt(query.peptide_sequence.len(), &mut rng);
            let stem = "alphafold2_multimer_v3_model_1_seed_000";
            let model = self.output_dir.join(format!(
                "{}_{stem}.pdb",
                model_prefix(&query.design_id, self.relaxed)
            ));
            write_synthetic_complex(&self.receptor, query, &plddt, &model)?;
            let scores = ColabFoldScores {
                mean_plddt: mean(&plddt),
                ptm: Some(0.55),
                iptm: Some(0.5),
                plddt,
            };
            let path = self
                .output_dir
                .join(format!("{}_{stem}.json", scores_prefix(&query.design_id)));
            documents::write_json(&path, &scores).map_err(io::Error::other)?;
        }
        Ok(())
    }
}

impl AlphaFold2Predictor {
    pub const TOOL: &'static str = "colabfold";

    pub fn new(execution: ExecutionConfig) -> Self {
        Self { execution }
    }

    fn command(fasta: &Path, output_dir: &Path, config: &PredictionConfig, receptor: &Receptor) -> Vec<String> {
        let mut command = vec![
            "colabfold_batch".to_string(),
            path_arg(fasta),
            path_arg(output_dir),
            "--num-models".to_string(),
            config.num_models.to_string(),
        ];
        if config.use_templates {
            command.push("--use-templates".to_string());
            command.push("--templates".to_string());
            command.push(path_arg(&receptor.structure_path));
        } else {
            command.push("--amber".to_string());
        }
        command
    }

    fn collect(
        query: &PredictionQuery,
        output_dir: &Path,
        config: &PredictionConfig,
    ) -> Result<PredictionResult, AdapterError> {
        let model = find_by_prefix(output_dir, &model_prefix(&query.design_id, true), "pdb")
            .or_else(|| find_by_prefix(output_dir, &model_prefix(&query.design_id, false), "pdb"))
            .ok_or_else(|| {
                AdapterError::MissingArtifact(
                    output_dir.join(format!("{}.pdb", model_prefix(&query.design_id, true))),
                )
            })?;
        let scores_path = find_by_prefix(output_dir, &scores_prefix(&query.design_id), "json")
            .ok_or_else(|| {
                AdapterError::MissingArtifact(
                    output_dir.join(format!("{}.json", scores_prefix(&query.design_id))),
                )
            })?;
        let scores: ColabFoldScores = documents::read_json(&scores_path)?;

        let mut metadata = Metadata::from([
            ("predictor".to_string(), "alphafold2".to_string()),
            ("num_models".to_string(), config.num_models.to_string()),
        ]);
        if let Some(ptm) = scores.ptm {
            metadata.insert("ptm".to_string(), ptm.to_string());
        }
        if let Some(iptm) = scores.iptm {
            metadata.insert("iptm".to_string(), iptm.to_string());
        }
        Ok(PredictionResult {
            design_id: query.design_id.clone(),
            predicted_structure_path: model,
            confidence: scores.mean_plddt.or_else(|| mean(&scores.plddt)),
            metadata,
        })
    }
}

impl StructurePredictor for AlphaFold2Predictor {
    #[instrument(skip_all, name = "alphafold2")]
    fn predict(
        &self,
        queries: &[PredictionQuery],
        receptor: &Receptor,
        output_dir: &Path,
        config: &PredictionConfig,
        rng: &mut StdRng,
    ) -> Result<Vec<PredictionResult>, AdapterError> {
        if queries.is_empty() {
            write_predictions(output_dir, &[])?;
            return Ok(Vec::new());
        }

        // Receptor and peptide are joined with ':' so ColabFold folds them as a complex.
        let records: Vec<FastaRecord> = queries
            .iter()
            .map(|q| {
                FastaRecord::new(
                    q.design_id.clone(),
                    format!("{}:{}", receptor.sequence, q.peptide_sequence),
                )
            })
            .collect();
        let fasta = output_dir.join(FASTA_FILE);
        std::fs::write(&fasta, format_fasta(&records))?;

        let invocation = Invocation::new(
            Self::TOOL,
            Self::command(&fasta, output_dir, config, receptor),
            output_dir,
        )
        .mount(output_dir)
        .mount(receptor.structure_path.parent().unwrap_or(output_dir));
        let synthesizer = ColabFoldSynthesizer {
            seed: rng.next_u64(),
            queries: queries.to_vec(),
            receptor: receptor.clone(),
            output_dir: output_dir.to_path_buf(),
            relaxed: !config.use_templates,
        };
        let chain = BackendChain::for_tool(Self::TOOL, &self.execution, Box::new(synthesizer));
        run_tool(chain, &invocation, output_dir)?;

        let predictions = queries
            .iter()
            .map(|q| Self::collect(q, output_dir, config))
            .collect::<Result<Vec<_>, _>>()?;
        write_predictions(output_dir, &predictions)?;
        info!(count = predictions.len(), "Collected AlphaFold2 predictions");
        Ok(predictions)
    }
}
