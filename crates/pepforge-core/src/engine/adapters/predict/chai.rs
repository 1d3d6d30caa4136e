use super::{
    PredictionQuery, Receptor, StructurePredictor, mean, synthetic_plddt, write_predictions,
    write_synthetic_complex,
};
use crate::core::io::documents;
use crate::core::models::Metadata;
use crate::core::models::design::PredictionResult;
use crate::engine::adapters::{path_arg, require_file, run_tool, synthetic};
use crate::engine::config::{ExecutionConfig, PredictionConfig};
use crate::engine::error::AdapterError;
use crate::engine::runtime::{ArtifactSynthesizer, BackendChain, Invocation};
use rand::RngCore;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

const INPUT_FILE: &str = "input.json";

#[derive(Debug, Serialize)]
struct ChaiInput<'a> {
    id: &'a str,
    peptide_sequence: &'a str,
    receptor_pdb: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChaiScores {
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    plddt: Vec<f64>,
}

fn model_path(output_dir: &Path, design_id: &str) -> PathBuf {
    output_dir.join(format!("{design_id}_model_0.pdb"))
}

fn scores_path(output_dir: &Path, design_id: &str) -> PathBuf {
    output_dir.join(format!("{design_id}_scores.json"))
}

struct ChaiSynthesizer {
    seed: u64,
    queries: Vec<PredictionQuery>,
    receptor: Receptor,
    output_dir: PathBuf,
}

impl ArtifactSynthesizer for ChaiSynthesizer {
    fn synthesize(&self, _invocation: &Invocation) -> io::Result<()> {
        let mut rng = synthetic::seeded_rng(self.seed);
        for query in &self.queries {
            let plddt = synthetic_plddt(query.peptide_sequence.len(), &mut rng);
            write_synthetic_complex(
                &self.receptor,
                query,
                &plddt,
                &model_path(&self.output_dir, &query.design_id),
            )?;
            let scores = ChaiScores {
                confidence: mean(&plddt),
                plddt,
            };
            documents::write_json(&scores_path(&self.output_dir, &query.design_id), &scores)
                .map_err(io::Error::other)?;
        }
        Ok(())
    }
}

/// Chai-1 inference over a single batched input document.
pub struct Chai1Predictor {
    execution: ExecutionConfig,
}

impl Chai1Predictor {
    pub const TOOL: &'static str = "chai1";

    pub fn new(execution: ExecutionConfig) -> Self {
        Self { execution }
    }

    fn collect(
        query: &PredictionQuery,
        output_dir: &Path,
        config: &PredictionConfig,
    ) -> Result<PredictionResult, AdapterError> {
        let model = model_path(output_dir, &query.design_id);
        let scores_file = scores_path(output_dir, &query.design_id);
        require_file(&model)?;
        require_file(&scores_file)?;
        let scores: ChaiScores = documents::read_json(&scores_file)?;
        Ok(PredictionResult {
            design_id: query.design_id.clone(),
            predicted_structure_path: model,
            confidence: scores.confidence.or_else(|| mean(&scores.plddt)),
            metadata: Metadata::from([
                ("predictor".to_string(), "chai1".to_string()),
                ("num_models".to_string(), config.num_models.to_string()),
            ]),
        })
    }
}

impl StructurePredictor for Chai1Predictor {
    #[instrument(skip_all, name = "chai1")]
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

        let inputs: Vec<ChaiInput> = queries
            .iter()
            .map(|q| ChaiInput {
                id: &q.design_id,
                peptide_sequence: &q.peptide_sequence,
                receptor_pdb: path_arg(&receptor.structure_path),
            })
            .collect();
        let input_file = output_dir.join(INPUT_FILE);
        documents::write_json(&input_file, &inputs)?;

        let command = vec![
            "python".to_string(),
            "run_inference.py".to_string(),
            "--input".to_string(),
            path_arg(&input_file),
            "--output".to_string(),
            path_arg(output_dir),
            "--num_models".to_string(),
            config.num_models.to_string(),
        ];
        let invocation = Invocation::new(Self::TOOL, command, output_dir)
            .mount(output_dir)
            .mount(receptor.structure_path.parent().unwrap_or(output_dir));
        let synthesizer = ChaiSynthesizer {
            seed: rng.next_u64(),
            queries: queries.to_vec(),
            receptor: receptor.clone(),
            output_dir: output_dir.to_path_buf(),
        };
        let chain = BackendChain::for_tool(Self::TOOL, &self.execution, Box::new(synthesizer));
        run_tool(chain, &invocation, output_dir)?;

        let predictions = queries
            .iter()
            .map(|q| Self::collect(q, output_dir, config))
            .collect::<Result<Vec<_>, _>>()?;
        write_predictions(output_dir, &predictions)?;
        info!(count = predictions.len(), "Collected Chai-1 predictions");
        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::adapters::predict::test_support;
    use crate::engine::config::PredictorKind;
    use rand::SeedableRng;
    use tempfile::tempdir;

    #[test]
    fn simulated_run_writes_batched_input_and_models() {
        let dir = tempdir().unwrap();
        let receptor = test_support::receptor(dir.path());
        let mut rng = StdRng::seed_from_u64(13);
        let predictions = Chai1Predictor::new(test_support::simulated())
            .predict(
                &test_support::queries(),
                &receptor,
                dir.path(),
                &test_support::config(PredictorKind::Chai1),
                &mut rng,
            )
            .unwrap();

        assert_eq!(predictions.len(), 2);
        assert!(predictions.iter().all(|p| p.predicted_structure_path.is_file()));
        let input: serde_json::Value = documents::read_json(&dir.path().join(INPUT_FILE)).unwrap();
        assert_eq!(input[1]["peptide_sequence"], "GSDEKY");
    }

    #[test]
    fn missing_scores_are_an_error() {
        let dir = tempdir().unwrap();
        let query = &test_support::queries()[0];
        std::fs::write(model_path(dir.path(), &query.design_id), "END\n").unwrap();
        let err = Chai1Predictor::collect(
            query,
            dir.path(),
            &test_support::config(PredictorKind::Chai1),
        )
        .unwrap_err();
        assert!(matches!(err, AdapterError::MissingArtifact(p) if p.ends_with("backbone_0_seq_1_scores.json")));
    }
}
