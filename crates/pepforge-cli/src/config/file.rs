use crate::error::{CliError, Result};
use pepforge::engine::config::{
    DesignerKind, ExecutionMode, GeneratorKind, PredictorKind, RelaxerKind, RunMode,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The on-disk run configuration. Every field is optional here; required values are
/// enforced when the merged configuration reaches the core builder.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub global: Option<FileGlobalConfig>,
    pub target: Option<FileTargetConfig>,
    pub backbone: Option<FileBackboneConfig>,
    pub design: Option<FileDesignConfig>,
    pub scoring: Option<FileScoringConfig>,
    pub ranking: Option<FileRankingConfig>,
    pub prediction: Option<FilePredictionConfig>,
    pub execution: Option<FileExecutionConfig>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileGlobalConfig {
    pub seed: Option<u64>,
    pub output_root: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileTargetConfig {
    pub pdb_path: Option<PathBuf>,
    pub mode: Option<RunMode>,
    pub target_chain: Option<char>,
    pub peptide_chain: Option<char>,
    pub binding_site_residues: Option<Vec<i32>>,
    pub contact_cutoff: Option<f64>,
    pub keep_cofactors: Option<Vec<String>>,
    pub relaxer: Option<RelaxerKind>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileBackboneConfig {
    pub generator: Option<GeneratorKind>,
    pub num_backbones: Option<usize>,
    pub peptide_length: Option<usize>,
    pub translation_std: Option<f64>,
    pub rotation_deg: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileDesignConfig {
    pub designer: Option<DesignerKind>,
    pub num_sequences_per_backbone: Option<usize>,
    pub fixed_positions: Option<Vec<usize>>,
    pub fixed_residues: Option<String>,
    pub disallowed_residues: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileScoringConfig {
    pub ph: Option<f64>,
    pub charge_min: Option<f64>,
    pub charge_max: Option<f64>,
    pub max_hydrophobic_fraction: Option<f64>,
    pub max_cys_count: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileRankingConfig {
    pub weight_filters: Option<f64>,
    pub weight_charge: Option<f64>,
    pub weight_hydrophobic: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FilePredictionConfig {
    pub predictor: Option<PredictorKind>,
    pub num_models: Option<usize>,
    pub top_n: Option<usize>,
    pub use_templates: Option<bool>,
    pub model_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileExecutionConfig {
    pub mode: Option<ExecutionMode>,
    pub container_runtime: Option<String>,
    pub images: Option<BTreeMap<String, String>>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading configuration file from {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|e| CliError::ConfigFile {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        toml::from_str(&content).map_err(|e| CliError::ConfigFile {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn full_file_deserializes_into_sections() {
        let toml = r#"
            [global]
            seed = 7
            output-root = "runs/mdm2"

            [target]
            pdb-path = "inputs/complex.pdb"
            mode = "optimize_existing"
            target-chain = "A"
            peptide-chain = "B"
            keep-cofactors = ["ZN"]
            relaxer = "openmm"

            [backbone]
            generator = "rfdiffusion"
            num-backbones = 4

            [design]
            designer = "protein_mpnn"
            fixed-positions = [1, 3]
            disallowed-residues = "CM"

            [prediction]
            predictor = "alphafold2"
            top-n = 2

            [execution]
            mode = "simulated"
            images = { rfdiffusion = "registry.local/rfdiffusion:1.1" }
        "#;
        let config: FileConfig = toml::from_str(toml).unwrap();

        let target = config.target.unwrap();
        assert_eq!(target.mode, Some(RunMode::OptimizeExisting));
        assert_eq!(target.peptide_chain, Some('B'));
        assert_eq!(target.relaxer, Some(RelaxerKind::OpenMm));
        assert_eq!(config.backbone.unwrap().generator, Some(GeneratorKind::RfDiffusion));
        assert_eq!(config.design.unwrap().disallowed_residues.as_deref(), Some("CM"));
        let execution = config.execution.unwrap();
        assert_eq!(execution.mode, Some(ExecutionMode::Simulated));
        assert_eq!(execution.images.unwrap()["rfdiffusion"], "registry.local/rfdiffusion:1.1");
        assert!(config.scoring.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: std::result::Result<FileConfig, _> = toml::from_str("[scoring]\nph-value = 7.0\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_generator_is_rejected() {
        let result: std::result::Result<FileConfig, _> =
            toml::from_str("[backbone]\ngenerator = \"alphafold\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn missing_file_is_a_parsing_error() {
        let dir = tempdir().unwrap();
        let result = FileConfig::from_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(CliError::ConfigFile { .. })));
    }
}
