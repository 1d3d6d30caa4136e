//! Structure predictors for the top-ranked designs.

use crate::core::chemistry::residues;
use crate::core::io::pdb::PdbFile;
use crate::core::io::tables;
use crate::core::io::traits::StructureFile;
use crate::core::models::design::{PredictionResult, RankedDesign};
use crate::engine::adapters::{binder_chain_for, synthetic};
use crate::engine::config::{ExecutionConfig, PredictionConfig, PredictorKind};
use crate::engine::error::AdapterError;
use rand::Rng;
use rand::rngs::StdRng;
use std::io;
use std::path::{Path, PathBuf};

mod alphafold3;
mod chai;
mod colabfold;

pub use alphafold3::AlphaFold3Predictor;
pub use chai::Chai1Predictor;
pub use colabfold::AlphaFold2Predictor;

pub const PREDICTIONS_FILE: &str = "predictions.csv";

/// One design to fold in complex with the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionQuery {
    pub design_id: String,
    pub peptide_sequence: String,
}

impl PredictionQuery {
    pub fn from_ranked(designs: &[RankedDesign]) -> Vec<Self> {
        designs
            .iter()
            .map(|d| Self {
                design_id: d.design_id().to_string(),
                peptide_sequence: d.scored.design.sequence.clone(),
            })
            .collect()
    }
}

/// Everything a predictor needs to know about the receptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receptor {
    pub structure_path: PathBuf,
    pub chain_id: char,
    pub sequence: String,
}

impl Receptor {
    /// Reads the receptor sequence from `chain_id` of the prepared target.
    pub fn from_structure(structure_path: &Path, chain_id: char) -> Result<Self, AdapterError> {
        let structure = PdbFile::read_from_path(structure_path)?;
        let sequence = structure
            .chain_residues(chain_id)
            .iter()
            .map(|(_, name)| residues::three_to_one(name).unwrap_or('X'))
            .collect();
        Ok(Self {
            structure_path: structure_path.to_path_buf(),
            chain_id,
            sequence,
        })
    }

    pub fn binder_chain(&self) -> char {
        binder_chain_for(self.chain_id)
    }
}

pub trait StructurePredictor {
    /// Predicts a complex for every query and writes the predictions table into
    /// `output_dir`. Missing outputs for any query are an error.
    fn predict(
        &self,
        queries: &[PredictionQuery],
        receptor: &Receptor,
        output_dir: &Path,
        config: &PredictionConfig,
        rng: &mut StdRng,
    ) -> Result<Vec<PredictionResult>, AdapterError>;
}

pub enum Predictor {
    AlphaFold2(AlphaFold2Predictor),
    AlphaFold3(AlphaFold3Predictor),
    Chai1(Chai1Predictor),
}

impl Predictor {
    /// `None` for [`PredictorKind::None`], which skips the stage entirely.
    pub fn for_kind(kind: PredictorKind, execution: &ExecutionConfig) -> Option<Self> {
        match kind {
            PredictorKind::None => None,
            PredictorKind::AlphaFold2 => Some(Predictor::AlphaFold2(AlphaFold2Predictor::new(
                execution.clone(),
            ))),
            PredictorKind::AlphaFold3 => Some(Predictor::AlphaFold3(AlphaFold3Predictor::new(
                execution.clone(),
            ))),
            PredictorKind::Chai1 => Some(Predictor::Chai1(Chai1Predictor::new(execution.clone()))),
        }
    }
}

impl StructurePredictor for Predictor {
    fn predict(
        &self,
        queries: &[PredictionQuery],
        receptor: &Receptor,
        output_dir: &Path,
        config: &PredictionConfig,
        rng: &mut StdRng,
    ) -> Result<Vec<PredictionResult>, AdapterError> {
        match self {
            Predictor::AlphaFold2(p) => p.predict(queries, receptor, output_dir, config, rng),
            Predictor::AlphaFold3(p) => p.predict(queries, receptor, output_dir, config, rng),
            Predictor::Chai1(p) => p.predict(queries, receptor, output_dir, config, rng),
        }
    }
}

pub(crate) fn write_predictions(
    output_dir: &Path,
    predictions: &[PredictionResult],
) -> Result<(), AdapterError> {
    tables::write_table(&output_dir.join(PREDICTIONS_FILE), predictions)?;
    Ok(())
}

/// Writes a simulated model of the receptor with the peptide as a helical binder chain.
pub(crate) fn write_synthetic_complex(
    receptor: &Receptor,
    query: &PredictionQuery,
    plddt: &[f64],
    path: &Path,
) -> io::Result<()> {
    let target = synthetic::read_structure(&receptor.structure_path)?;
    let chain = receptor.binder_chain();
    let binder = synthetic::helical_trace(&query.peptide_sequence, chain, plddt).atoms;
    let complex = synthetic::complex_with_binder(&target, binder, chain);
    synthetic::write_structure(&complex, path)
}

/// Per-residue confidence values for simulated predictions.
pub(crate) fn synthetic_plddt(length: usize, rng: &mut impl Rng) -> Vec<f64> {
    let base: f64 = rng.gen_range(65.0..92.0);
    (0..length)
        .map(|_| (base + rng.gen_range(-5.0..5.0)).clamp(0.0, 100.0))
        .map(|v| (v * 100.0).round() / 100.0)
        .collect()
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

/// First file in `dir` (by name) that starts with `prefix` and has extension `ext`.
pub(crate) fn find_by_prefix(dir: &Path, prefix: &str, ext: &str) -> Option<PathBuf> {
    let mut matches: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(prefix))
                && path.extension().and_then(|e| e.to_str()) == Some(ext)
        })
        .collect();
    matches.sort();
    matches.into_iter().next()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::core::models::structure::{AtomRecord, Structure};
    use crate::engine::config::ExecutionMode;
    use nalgebra::Point3;
    use std::collections::BTreeMap;

    pub fn simulated() -> ExecutionConfig {
        ExecutionConfig {
            mode: ExecutionMode::Simulated,
            container_runtime: "docker".to_string(),
            image_overrides: BTreeMap::new(),
        }
    }

    pub fn receptor(dir: &Path) -> Receptor {
        let atoms = ["MET", "LYS", "TRP", "GLU"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                AtomRecord::protein(
                    i as u32 + 1,
                    "CA",
                    name,
                    'A',
                    i as i32 + 1,
                    Point3::new(i as f64 * 3.8, 0.0, 0.0),
                )
            })
            .collect();
        let path = dir.join("target_clean.pdb");
        PdbFile::write_to_path(&Structure::new(atoms), &path).unwrap();
        Receptor::from_structure(&path, 'A').unwrap()
    }

    pub fn queries() -> Vec<PredictionQuery> {
        vec![
            PredictionQuery {
                design_id: "backbone_0_seq_1".to_string(),
                peptide_sequence: "WKELAR".to_string(),
            },
            PredictionQuery {
                design_id: "backbone_1_seq_0".to_string(),
                peptide_sequence: "GSDEKY".to_string(),
            },
        ]
    }

    pub fn config(predictor: PredictorKind) -> PredictionConfig {
        PredictionConfig {
            predictor,
            num_models: 2,
            top_n: 5,
            use_templates: false,
            model_dir: Some(PathBuf::from("/models/af3")),
        }
    }
}
