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
use rand::rngs::StdRng;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

#[derive(Debug, Serialize)]
struct ProteinChain<'a> {
    id: &'a str,
    sequence: &'a str,
}

#[derive(Debug, Serialize)]
struct SequenceEntry<'a> {
    protein: ProteinChain<'a>,
}

#[derive(Debug, Serialize)]
struct FoldInput<'a> {
    name: &'a str,
    sequences: Vec<SequenceEntry<'a>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SummaryConfidences {
    #[serde(default)]
    ranking_score: Option<f64>,
    #[serde(default)]
    iptm: Option<f64>,
    #[serde(default)]
    ptm: Option<f64>,
    #[serde(default)]
    plddt: Vec<f64>,
}

fn input_path(output_dir: &Path, design_id: &str) -> PathBuf {
    output_dir.join(format!("{design_id}_input.json"))
}

fn model_path(output_dir: &Path, design_id: &str) -> PathBuf {
    output_dir.join(format!("{design_id}_model_0.pdb"))
}

fn confidences_path(output_dir: &Path, design_id: &str) -> PathBuf {
    output_dir.join(format!("{design_id}_summary_confidences.json"))
}

struct AlphaFold3Synthesizer {
    seed: u64,
    queries: Vec<PredictionQuery>,
    receptor: Receptor,
    output_dir: PathBuf,
}

impl ArtifactSynthesizer for AlphaFold3Synthesizer {
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
            let iptm: f64 = rng.gen_range(0.3..0.9);
            let ptm: f64 = rng.gen_range(0.4..0.9);
            let confidences = SummaryConfidences {
                ranking_score: Some(0.8 * iptm + 0.2 * ptm),
                iptm: Some(iptm),
                ptm: Some(ptm),
                plddt,
            };
            documents::write_json(
                &confidences_path(&self.output_dir, &query.design_id),
                &confidences,
            )
            .map_err(io::Error::other)?;
        }
        Ok(())
    }
}

/// AlphaFold3 inference through `run_alphafold.py`, one input document per design.
pub struct AlphaFold3Predictor {
    execution: ExecutionConfig,
}

impl AlphaFold3Predictor {
    pub const TOOL: &'static str = "alphafold3";

    pub fn new(execution: ExecutionConfig) -> Self {
        Self { execution }
    }

    fn write_inputs(
        queries: &[PredictionQuery],
        receptor: &Receptor,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, AdapterError> {
        queries
            .iter()
            .map(|query| {
                let input = FoldInput {
                    name: &query.design_id,
                    sequences: vec![
                        SequenceEntry {
                            protein: ProteinChain {
                                id: "receptor",
                                sequence: &receptor.sequence,
                            },
                        },
                        SequenceEntry {
                            protein: ProteinChain {
                                id: "peptide",
                                sequence: &query.peptide_sequence,
                            },
                        },
                    ],
                };
                let path = input_path(output_dir, &query.design_id);
                documents::write_json(&path, &input)?;
                Ok(path)
            })
            .collect()
    }

    fn collect(
        query: &PredictionQuery,
        output_dir: &Path,
        config: &PredictionConfig,
    ) -> Result<PredictionResult, AdapterError> {
        let model = model_path(output_dir, &query.design_id);
        let confidences_file = confidences_path(output_dir, &query.design_id);
        require_file(&model)?;
        require_file(&confidences_file)?;
        let confidences: SummaryConfidences = documents::read_json(&confidences_file)?;

        let mut metadata = Metadata::from([
            ("predictor".to_string(), "alphafold3".to_string()),
            ("num_models".to_string(), config.num_models.to_string()),
        ]);
        for (key, value) in [("iptm", confidences.iptm), ("ptm", confidences.ptm)] {
            if let Some(v) = value {
                metadata.insert(key.to_string(), v.to_string());
            }
        }
        if let Some(plddt) = mean(&confidences.plddt) {
            metadata.insert("mean_plddt".to_string(), plddt.to_string());
        }
        Ok(PredictionResult {
            design_id: query.design_id.clone(),
            predicted_structure_path: model,
            confidence: confidences.ranking_score.map(|s| s * 100.0),
            metadata,
        })
    }
}

impl StructurePredictor for AlphaFold3Predictor {
    #[instrument(skip_all, name = "alphafold3")]
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
        let model_dir = config
            .model_dir
            .as_deref()
            .ok_or(AdapterError::MissingInput("AlphaFold3 model directory"))?;

        let inputs = Self::write_inputs(queries, receptor, output_dir)?;
        let mut command = vec![
            "python".to_string(),
            "run_alphafold.py".to_string(),
            "--model_dir".to_string(),
            path_arg(model_dir),
            "--output_dir".to_string(),
            path_arg(output_dir),
            "--num_diffusion_samples".to_string(),
            config.num_models.to_string(),
            "--num_seeds".to_string(),
            "1".to_string(),
        ];
        for input in &inputs {
            command.push("--json_path".to_string());
            command.push(path_arg(input));
        }
        let invocation = Invocation::new(Self::TOOL, command, output_dir)
            .mount(output_dir)
            .mount(model_dir);
        let synthesizer = AlphaFold3Synthesizer {
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
        info!(count = predictions.len(), "Collected AlphaFold3 predictions");
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
    fn input_documents_pair_receptor_and_peptide() {
        let dir = tempdir().unwrap();
        let receptor = test_support::receptor(dir.path());
        let inputs =
            AlphaFold3Predictor::write_inputs(&test_support::queries(), &receptor, dir.path())
                .unwrap();
        assert_eq!(inputs.len(), 2);
        let doc: serde_json::Value = documents::read_json(&inputs[0]).unwrap();
        assert_eq!(doc["name"], "backbone_0_seq_1");
        assert_eq!(doc["sequences"][0]["protein"]["sequence"], "MKWE");
        assert_eq!(doc["sequences"][1]["protein"]["id"], "peptide");
    }

    #[test]
    fn confidence_is_scaled_ranking_score() {
        let dir = tempdir().unwrap();
        let receptor = test_support::receptor(dir.path());
        let mut rng = StdRng::seed_from_u64(21);
        let predictions = AlphaFold3Predictor::new(test_support::simulated())
            .predict(
                &test_support::queries(),
                &receptor,
                dir.path(),
                &test_support::config(PredictorKind::AlphaFold3),
                &mut rng,
            )
            .unwrap();

        let first = &predictions[0];
        let iptm: f64 = first.metadata["iptm"].parse().unwrap();
        let ptm: f64 = first.metadata["ptm"].parse().unwrap();
        let expected = (0.8 * iptm + 0.2 * ptm) * 100.0;
        assert!((first.confidence.unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn missing_model_dir_is_reported() {
        let dir = tempdir().unwrap();
        let receptor = test_support::receptor(dir.path());
        let mut config = test_support::config(PredictorKind::AlphaFold3);
        config.model_dir = None;
        let mut rng = StdRng::seed_from_u64(21);
        let err = AlphaFold3Predictor::new(test_support::simulated())
            .predict(&test_support::queries(), &receptor, dir.path(), &config, &mut rng)
            .unwrap_err();
        assert!(matches!(err, AdapterError::MissingInput(_)));
    }
}
