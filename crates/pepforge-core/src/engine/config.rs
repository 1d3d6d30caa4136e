use crate::core::chemistry::residues;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Highest number of models a structure predictor may be asked for.
pub const MAX_PREDICTION_MODELS: usize = 5;
/// Shortest peptide a backbone generator will build.
pub const MIN_PEPTIDE_LENGTH: usize = 3;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Mode conflict: {0}")]
    ModeConflict(String),

    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Cannot create output root '{}': {source}", path.display())]
    OutputRoot {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
}

/// Declares a closed set of string-tagged kinds with matching serde names, `Display`, and
/// `FromStr`, so config files and CLI flags share one spelling.
macro_rules! tagged_kind {
    ($(#[$meta:meta])* $name:ident, $field:literal { $($variant:ident => $tag:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $tag)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $tag),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ConfigError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($tag => Ok($name::$variant),)+
                    other => Err(invalid(
                        $field,
                        format!(
                            "unknown value '{}' (expected one of: {})",
                            other,
                            [$($tag),+].join(", ")
                        ),
                    )),
                }
            }
        }
    };
}

tagged_kind!(
    /// Whether the run designs a new binder or redesigns a bound peptide.
    RunMode, "mode" {
        DeNovo => "de_novo",
        OptimizeExisting => "optimize_existing",
    }
);

tagged_kind!(
    GeneratorKind, "generator" {
        Stub => "stub",
        RfDiffusion => "rfdiffusion",
        DiffPepBuilder => "diffpepbuilder",
    }
);

tagged_kind!(
    DesignerKind, "designer" {
        Stub => "stub",
        ProteinMpnn => "protein_mpnn",
    }
);

tagged_kind!(
    PredictorKind, "predictor" {
        None => "none",
        AlphaFold2 => "alphafold2",
        AlphaFold3 => "alphafold3",
        Chai1 => "chai1",
    }
);

tagged_kind!(
    RelaxerKind, "relaxer" {
        None => "none",
        OpenMm => "openmm",
        Rosetta => "rosetta",
    }
);

tagged_kind!(
    /// How external tools are reached. `Auto` walks the notebook, container, simulated
    /// fallback chain; `Local` runs tools directly on the host; `Simulated` pins every
    /// chain to the simulated backend.
    ExecutionMode, "execution_mode" {
        Auto => "auto",
        Local => "local",
        Simulated => "simulated",
    }
);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalConfig {
    pub seed: u64,
    pub output_root: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetConfig {
    pub pdb_path: PathBuf,
    pub mode: RunMode,
    pub target_chain: char,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peptide_chain: Option<char>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binding_site_residues: Option<Vec<i32>>,
    pub contact_cutoff: f64,
    pub keep_cofactors: Vec<String>,
    pub relaxer: RelaxerKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackboneConfig {
    pub generator: GeneratorKind,
    pub num_backbones: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peptide_length: Option<usize>,
    pub translation_std: f64,
    pub rotation_deg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignConfig {
    pub designer: DesignerKind,
    pub num_sequences_per_backbone: usize,
    /// 1-based positions in the peptide that keep a fixed residue.
    pub fixed_positions: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_residues: Option<Vec<char>>,
    pub disallowed_residues: Vec<char>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringConfig {
    pub ph: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charge_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charge_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_hydrophobic_fraction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cys_count: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankingConfig {
    pub weight_filters: f64,
    pub weight_charge: f64,
    pub weight_hydrophobic: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionConfig {
    pub predictor: PredictorKind,
    pub num_models: usize,
    pub top_n: usize,
    pub use_templates: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionConfig {
    pub mode: ExecutionMode,
    pub container_runtime: String,
    /// Tool name to container image, overriding the built-in `<tool>:latest` images.
    pub image_overrides: BTreeMap<String, String>,
}

impl ExecutionConfig {
    pub fn image_for(&self, tool: &str) -> String {
        self.image_overrides
            .get(tool)
            .cloned()
            .unwrap_or_else(|| format!("{tool}:latest"))
    }
}

/// A fully validated run configuration.
///
/// Only [`RunConfigBuilder::build`] constructs one, so every instance already satisfies
/// the mode invariants and points at an existing input structure. Sections are read
/// through accessors; a built config cannot be edited from outside the crate.
///
/// ```compile_fail
/// fn zero_out(mut config: pepforge::engine::config::RunConfig) {
///     config.design.num_sequences_per_backbone = 0;
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunConfig {
    pub(crate) global: GlobalConfig,
    pub(crate) target: TargetConfig,
    pub(crate) backbone: BackboneConfig,
    pub(crate) design: DesignConfig,
    pub(crate) scoring: ScoringConfig,
    pub(crate) ranking: RankingConfig,
    pub(crate) prediction: PredictionConfig,
    pub(crate) execution: ExecutionConfig,
}

impl RunConfig {
    pub fn global(&self) -> &GlobalConfig {
        &self.global
    }

    pub fn target(&self) -> &TargetConfig {
        &self.target
    }

    pub fn backbone(&self) -> &BackboneConfig {
        &self.backbone
    }

    pub fn design(&self) -> &DesignConfig {
        &self.design
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    pub fn ranking(&self) -> &RankingConfig {
        &self.ranking
    }

    pub fn prediction(&self) -> &PredictionConfig {
        &self.prediction
    }

    pub fn execution(&self) -> &ExecutionConfig {
        &self.execution
    }

    pub fn is_optimize_existing(&self) -> bool {
        self.target.mode == RunMode::OptimizeExisting
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}

#[derive(Default)]
pub struct RunConfigBuilder {
    seed: Option<u64>,
    output_root: Option<PathBuf>,
    pdb_path: Option<PathBuf>,
    mode: Option<RunMode>,
    target_chain: Option<char>,
    peptide_chain: Option<char>,
    binding_site_residues: Option<Vec<i32>>,
    contact_cutoff: Option<f64>,
    keep_cofactors: Vec<String>,
    relaxer: Option<RelaxerKind>,
    generator: Option<GeneratorKind>,
    num_backbones: Option<usize>,
    peptide_length: Option<usize>,
    translation_std: Option<f64>,
    rotation_deg: Option<f64>,
    designer: Option<DesignerKind>,
    num_sequences_per_backbone: Option<usize>,
    fixed_positions: Vec<usize>,
    fixed_residues: Option<Vec<char>>,
    disallowed_residues: Vec<char>,
    ph: Option<f64>,
    charge_min: Option<f64>,
    charge_max: Option<f64>,
    max_hydrophobic_fraction: Option<f64>,
    max_cys_count: Option<usize>,
    weight_filters: Option<f64>,
    weight_charge: Option<f64>,
    weight_hydrophobic: Option<f64>,
    predictor: Option<PredictorKind>,
    num_models: Option<usize>,
    top_n: Option<usize>,
    use_templates: bool,
    model_dir: Option<PathBuf>,
    execution_mode: Option<ExecutionMode>,
    container_runtime: Option<String>,
    image_overrides: BTreeMap<String, String>,
}

impl RunConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn output_root(mut self, path: PathBuf) -> Self {
        self.output_root = Some(path);
        self
    }
    pub fn pdb_path(mut self, path: PathBuf) -> Self {
        self.pdb_path = Some(path);
        self
    }
    pub fn mode(mut self, mode: RunMode) -> Self {
        self.mode = Some(mode);
        self
    }
    pub fn target_chain(mut self, chain: char) -> Self {
        self.target_chain = Some(chain);
        self
    }
    pub fn peptide_chain(mut self, chain: Option<char>) -> Self {
        self.peptide_chain = chain;
        self
    }
    pub fn binding_site_residues(mut self, residues: Option<Vec<i32>>) -> Self {
        self.binding_site_residues = residues;
        self
    }
    pub fn contact_cutoff(mut self, cutoff: f64) -> Self {
        self.contact_cutoff = Some(cutoff);
        self
    }
    pub fn keep_cofactors(mut self, names: Vec<String>) -> Self {
        self.keep_cofactors = names;
        self
    }
    pub fn relaxer(mut self, relaxer: RelaxerKind) -> Self {
        self.relaxer = Some(relaxer);
        self
    }
    pub fn generator(mut self, kind: GeneratorKind) -> Self {
        self.generator = Some(kind);
        self
    }
    pub fn num_backbones(mut self, n: usize) -> Self {
        self.num_backbones = Some(n);
        self
    }
    pub fn peptide_length(mut self, length: Option<usize>) -> Self {
        self.peptide_length = length;
        self
    }
    pub fn translation_std(mut self, std: f64) -> Self {
        self.translation_std = Some(std);
        self
    }
    pub fn rotation_deg(mut self, deg: f64) -> Self {
        self.rotation_deg = Some(deg);
        self
    }
    pub fn designer(mut self, kind: DesignerKind) -> Self {
        self.designer = Some(kind);
        self
    }
    pub fn num_sequences_per_backbone(mut self, n: usize) -> Self {
        self.num_sequences_per_backbone = Some(n);
        self
    }
    pub fn fixed_positions(mut self, positions: Vec<usize>) -> Self {
        self.fixed_positions = positions;
        self
    }
    pub fn fixed_residues(mut self, residues: Option<Vec<char>>) -> Self {
        self.fixed_residues = residues;
        self
    }
    pub fn disallowed_residues(mut self, residues: Vec<char>) -> Self {
        self.disallowed_residues = residues;
        self
    }
    pub fn ph(mut self, ph: f64) -> Self {
        self.ph = Some(ph);
        self
    }
    pub fn charge_min(mut self, value: Option<f64>) -> Self {
        self.charge_min = value;
        self
    }
    pub fn charge_max(mut self, value: Option<f64>) -> Self {
        self.charge_max = value;
        self
    }
    pub fn max_hydrophobic_fraction(mut self, value: Option<f64>) -> Self {
        self.max_hydrophobic_fraction = value;
        self
    }
    pub fn max_cys_count(mut self, value: Option<usize>) -> Self {
        self.max_cys_count = value;
        self
    }
    pub fn ranking_weights(mut self, filters: f64, charge: f64, hydrophobic: f64) -> Self {
        self.weight_filters = Some(filters);
        self.weight_charge = Some(charge);
        self.weight_hydrophobic = Some(hydrophobic);
        self
    }
    pub fn predictor(mut self, kind: PredictorKind) -> Self {
        self.predictor = Some(kind);
        self
    }
    pub fn num_models(mut self, n: usize) -> Self {
        self.num_models = Some(n);
        self
    }
    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }
    pub fn use_templates(mut self, flag: bool) -> Self {
        self.use_templates = flag;
        self
    }
    pub fn model_dir(mut self, path: Option<PathBuf>) -> Self {
        self.model_dir = path;
        self
    }
    pub fn execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.execution_mode = Some(mode);
        self
    }
    pub fn container_runtime(mut self, runtime: String) -> Self {
        self.container_runtime = Some(runtime);
        self
    }
    pub fn image_overrides(mut self, overrides: BTreeMap<String, String>) -> Self {
        self.image_overrides = overrides;
        self
    }

    /// Validates the collected parameters and creates the output root.
    ///
    /// Checks run in a fixed order: field presence and ranges, then the cross-field mode
    /// rules, then input file existence, and only then the output directory side effect.
    /// The first violation aborts the build.
    pub fn build(self) -> Result<RunConfig, ConfigError> {
        let config = self.assemble()?;
        validate_fields(&config)?;
        validate_mode(&config)?;

        if !config.target.pdb_path.is_file() {
            return Err(ConfigError::InputNotFound(config.target.pdb_path.clone()));
        }

        create_output_root(&config.global.output_root)?;
        Ok(config)
    }

    fn assemble(self) -> Result<RunConfig, ConfigError> {
        let global = GlobalConfig {
            seed: self.seed.ok_or(ConfigError::MissingParameter("seed"))?,
            output_root: self
                .output_root
                .ok_or(ConfigError::MissingParameter("output_root"))?,
        };
        let target = TargetConfig {
            pdb_path: self
                .pdb_path
                .ok_or(ConfigError::MissingParameter("pdb_path"))?,
            mode: self.mode.ok_or(ConfigError::MissingParameter("mode"))?,
            target_chain: self
                .target_chain
                .ok_or(ConfigError::MissingParameter("target_chain"))?,
            peptide_chain: self.peptide_chain,
            binding_site_residues: self.binding_site_residues,
            contact_cutoff: self
                .contact_cutoff
                .ok_or(ConfigError::MissingParameter("contact_cutoff"))?,
            keep_cofactors: self.keep_cofactors,
            relaxer: self.relaxer.unwrap_or(RelaxerKind::None),
        };
        let backbone = BackboneConfig {
            generator: self
                .generator
                .ok_or(ConfigError::MissingParameter("generator"))?,
            num_backbones: self
                .num_backbones
                .ok_or(ConfigError::MissingParameter("num_backbones"))?,
            peptide_length: self.peptide_length,
            translation_std: self
                .translation_std
                .ok_or(ConfigError::MissingParameter("translation_std"))?,
            rotation_deg: self
                .rotation_deg
                .ok_or(ConfigError::MissingParameter("rotation_deg"))?,
        };
        let design = DesignConfig {
            designer: self
                .designer
                .ok_or(ConfigError::MissingParameter("designer"))?,
            num_sequences_per_backbone: self
                .num_sequences_per_backbone
                .ok_or(ConfigError::MissingParameter("num_sequences_per_backbone"))?,
            fixed_positions: self.fixed_positions,
            fixed_residues: self
                .fixed_residues
                .map(|r| r.into_iter().map(|c| c.to_ascii_uppercase()).collect()),
            disallowed_residues: self
                .disallowed_residues
                .into_iter()
                .map(|c| c.to_ascii_uppercase())
                .collect(),
        };
        let scoring = ScoringConfig {
            ph: self.ph.ok_or(ConfigError::MissingParameter("ph"))?,
            charge_min: self.charge_min,
            charge_max: self.charge_max,
            max_hydrophobic_fraction: self.max_hydrophobic_fraction,
            max_cys_count: self.max_cys_count,
        };
        let ranking = RankingConfig {
            weight_filters: self
                .weight_filters
                .ok_or(ConfigError::MissingParameter("weight_filters"))?,
            weight_charge: self
                .weight_charge
                .ok_or(ConfigError::MissingParameter("weight_charge"))?,
            weight_hydrophobic: self
                .weight_hydrophobic
                .ok_or(ConfigError::MissingParameter("weight_hydrophobic"))?,
        };
        let prediction = PredictionConfig {
            predictor: self.predictor.unwrap_or(PredictorKind::None),
            num_models: self
                .num_models
                .ok_or(ConfigError::MissingParameter("num_models"))?,
            top_n: self.top_n.ok_or(ConfigError::MissingParameter("top_n"))?,
            use_templates: self.use_templates,
            model_dir: self.model_dir,
        };
        let execution = ExecutionConfig {
            mode: self.execution_mode.unwrap_or(ExecutionMode::Auto),
            container_runtime: self
                .container_runtime
                .unwrap_or_else(|| "docker".to_string()),
            image_overrides: self.image_overrides,
        };
        Ok(RunConfig {
            global,
            target,
            backbone,
            design,
            scoring,
            ranking,
            prediction,
            execution,
        })
    }
}

fn ensure_chain_id(field: &'static str, chain: char) -> Result<(), ConfigError> {
    if chain.is_ascii_alphanumeric() {
        Ok(())
    } else {
        Err(invalid(field, format!("'{chain}' is not a valid chain identifier")))
    }
}

fn ensure_unit_interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} is outside [0, 1]")))
    }
}

fn ensure_residue_codes(field: &'static str, codes: &[char]) -> Result<(), ConfigError> {
    match codes.iter().find(|c| !residues::is_standard(**c)) {
        Some(bad) => Err(invalid(field, format!("'{bad}' is not a standard amino acid"))),
        None => Ok(()),
    }
}

fn validate_fields(config: &RunConfig) -> Result<(), ConfigError> {
    ensure_chain_id("target_chain", config.target.target_chain)?;
    if let Some(chain) = config.target.peptide_chain {
        ensure_chain_id("peptide_chain", chain)?;
    }
    if !(config.target.contact_cutoff > 0.0) {
        return Err(invalid("contact_cutoff", "must be positive"));
    }

    let backbone = &config.backbone;
    if backbone.num_backbones == 0 {
        return Err(invalid("num_backbones", "must be at least 1"));
    }
    if let Some(length) = backbone.peptide_length {
        if length < MIN_PEPTIDE_LENGTH {
            return Err(invalid(
                "peptide_length",
                format!("must be at least {MIN_PEPTIDE_LENGTH}, got {length}"),
            ));
        }
    }
    if !(backbone.translation_std >= 0.0) {
        return Err(invalid("translation_std", "must be non-negative"));
    }
    if !(backbone.rotation_deg >= 0.0) {
        return Err(invalid("rotation_deg", "must be non-negative"));
    }

    let design = &config.design;
    if design.num_sequences_per_backbone == 0 {
        return Err(invalid("num_sequences_per_backbone", "must be at least 1"));
    }
    if design.fixed_positions.contains(&0) {
        return Err(invalid("fixed_positions", "positions are 1-based"));
    }
    if let Some(fixed) = &design.fixed_residues {
        ensure_residue_codes("fixed_residues", fixed)?;
        if fixed.len() != design.fixed_positions.len() {
            return Err(invalid(
                "fixed_residues",
                format!(
                    "{} residues given for {} fixed positions",
                    fixed.len(),
                    design.fixed_positions.len()
                ),
            ));
        }
    }
    ensure_residue_codes("disallowed_residues", &design.disallowed_residues)?;
    if residues::allowed_alphabet(&design.disallowed_residues).is_empty() {
        return Err(invalid("disallowed_residues", "every amino acid is disallowed"));
    }

    let scoring = &config.scoring;
    if !(0.0..=14.0).contains(&scoring.ph) {
        return Err(invalid("ph", format!("{} is outside [0, 14]", scoring.ph)));
    }
    if let (Some(min), Some(max)) = (scoring.charge_min, scoring.charge_max) {
        if min > max {
            return Err(invalid(
                "charge_min",
                format!("{min} is greater than charge_max {max}"),
            ));
        }
    }
    if let Some(max) = scoring.max_hydrophobic_fraction {
        ensure_unit_interval("max_hydrophobic_fraction", max)?;
    }

    let ranking = &config.ranking;
    ensure_unit_interval("weight_filters", ranking.weight_filters)?;
    ensure_unit_interval("weight_charge", ranking.weight_charge)?;
    ensure_unit_interval("weight_hydrophobic", ranking.weight_hydrophobic)?;
    let total = ranking.weight_filters + ranking.weight_charge + ranking.weight_hydrophobic;
    if total > 1.0 + 1e-9 {
        return Err(invalid(
            "ranking weights",
            format!("weights sum to {total}, which exceeds 1"),
        ));
    }

    let prediction = &config.prediction;
    if !(1..=MAX_PREDICTION_MODELS).contains(&prediction.num_models) {
        return Err(invalid(
            "num_models",
            format!("must be between 1 and {MAX_PREDICTION_MODELS}"),
        ));
    }
    if prediction.top_n == 0 {
        return Err(invalid("top_n", "must be at least 1"));
    }

    if config.execution.container_runtime.trim().is_empty() {
        return Err(invalid("container_runtime", "must not be empty"));
    }
    Ok(())
}

fn validate_mode(config: &RunConfig) -> Result<(), ConfigError> {
    let target = &config.target;
    match target.mode {
        RunMode::OptimizeExisting => {
            if target.peptide_chain.is_none() {
                return Err(ConfigError::ModeConflict(
                    "optimize_existing mode requires peptide_chain".to_string(),
                ));
            }
        }
        RunMode::DeNovo => {
            if config.backbone.peptide_length.is_none() && target.peptide_chain.is_none() {
                return Err(ConfigError::ModeConflict(
                    "de_novo mode requires peptide_length when no peptide_chain is supplied"
                        .to_string(),
                ));
            }
        }
    }
    if target.peptide_chain == Some(target.target_chain) {
        return Err(ConfigError::ModeConflict(format!(
            "peptide_chain and target_chain are both '{}'",
            target.target_chain
        )));
    }
    if let (Some(length), Some(&max_pos)) = (
        config.backbone.peptide_length,
        config.design.fixed_positions.iter().max(),
    ) {
        if max_pos > length {
            return Err(invalid(
                "fixed_positions",
                format!("position {max_pos} exceeds peptide_length {length}"),
            ));
        }
    }
    if config.prediction.predictor == PredictorKind::AlphaFold3
        && config.prediction.model_dir.is_none()
    {
        return Err(ConfigError::ModeConflict(
            "alphafold3 prediction requires model_dir".to_string(),
        ));
    }
    Ok(())
}

fn create_output_root(path: &Path) -> Result<(), ConfigError> {
    std::fs::create_dir_all(path).map_err(|e| ConfigError::OutputRoot {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn base_builder(dir: &Path) -> RunConfigBuilder {
        let pdb = dir.join("input.pdb");
        std::fs::write(&pdb, "END\n").unwrap();
        RunConfigBuilder::new()
            .seed(42)
            .output_root(dir.join("out"))
            .pdb_path(pdb)
            .mode(RunMode::DeNovo)
            .target_chain('A')
            .contact_cutoff(5.0)
            .generator(GeneratorKind::Stub)
            .num_backbones(3)
            .peptide_length(Some(8))
            .translation_std(0.5)
            .rotation_deg(5.0)
            .designer(DesignerKind::Stub)
            .num_sequences_per_backbone(2)
            .ph(7.4)
            .ranking_weights(0.4, 0.3, 0.3)
            .num_models(1)
            .top_n(5)
    }

    #[test]
    fn valid_config_builds_and_creates_output_root() {
        let dir = tempdir().unwrap();
        let config = base_builder(dir.path()).build().unwrap();
        assert!(config.global.output_root.is_dir());
        assert_eq!(config.prediction.predictor, PredictorKind::None);
        assert_eq!(config.execution.container_runtime, "docker");

        // Building twice against the same root is fine.
        base_builder(dir.path()).build().unwrap();
    }

    #[test]
    fn optimize_existing_without_peptide_chain_is_a_mode_conflict() {
        let dir = tempdir().unwrap();
        let result = base_builder(dir.path())
            .mode(RunMode::OptimizeExisting)
            .build();
        assert!(matches!(result, Err(ConfigError::ModeConflict(_))));
    }

    #[test]
    fn de_novo_without_length_or_peptide_is_a_mode_conflict() {
        let dir = tempdir().unwrap();
        let result = base_builder(dir.path()).peptide_length(None).build();
        assert!(matches!(result, Err(ConfigError::ModeConflict(_))));

        let with_template = base_builder(dir.path())
            .peptide_length(None)
            .peptide_chain(Some('B'))
            .build();
        assert!(with_template.is_ok());
    }

    #[test]
    fn missing_required_parameter_is_named() {
        let dir = tempdir().unwrap();
        let mut builder = base_builder(dir.path());
        builder.top_n = None;
        assert!(matches!(
            builder.build(),
            Err(ConfigError::MissingParameter("top_n"))
        ));
    }

    #[test]
    fn counts_must_be_positive() {
        let dir = tempdir().unwrap();
        for builder in [
            base_builder(dir.path()).num_backbones(0),
            base_builder(dir.path()).num_sequences_per_backbone(0),
            base_builder(dir.path()).num_models(0),
            base_builder(dir.path()).num_models(6),
            base_builder(dir.path()).peptide_length(Some(2)),
        ] {
            assert!(matches!(
                builder.build(),
                Err(ConfigError::InvalidValue { .. })
            ));
        }
    }

    #[test]
    fn accessors_expose_the_validated_counts() {
        let dir = tempdir().unwrap();
        let config = base_builder(dir.path()).build().unwrap();
        let copy = config.clone();
        assert_eq!(copy, config);
        assert_eq!(copy.backbone().num_backbones, 3);
        assert_eq!(copy.design().num_sequences_per_backbone, 2);
        assert_eq!(copy.prediction().num_models, 1);
        assert_eq!(copy.global().output_root, dir.path().join("out"));

        let zero = base_builder(dir.path())
            .num_sequences_per_backbone(0)
            .build();
        assert!(matches!(
            zero,
            Err(ConfigError::InvalidValue {
                field: "num_sequences_per_backbone",
                ..
            })
        ));
    }

    #[test]
    fn missing_input_structure_is_reported_before_output_creation() {
        let dir = tempdir().unwrap();
        let result = base_builder(dir.path())
            .pdb_path(dir.path().join("absent.pdb"))
            .build();
        assert!(matches!(result, Err(ConfigError::InputNotFound(_))));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn field_errors_take_precedence_over_missing_input() {
        let dir = tempdir().unwrap();
        let result = base_builder(dir.path())
            .pdb_path(dir.path().join("absent.pdb"))
            .num_backbones(0)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field: "num_backbones", .. })
        ));
    }

    #[test]
    fn ranking_weights_must_not_exceed_one() {
        let dir = tempdir().unwrap();
        let result = base_builder(dir.path())
            .ranking_weights(0.5, 0.4, 0.3)
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn alphafold3_requires_model_dir() {
        let dir = tempdir().unwrap();
        let result = base_builder(dir.path())
            .predictor(PredictorKind::AlphaFold3)
            .build();
        assert!(matches!(result, Err(ConfigError::ModeConflict(_))));
    }

    #[test]
    fn fixed_residues_must_pair_with_positions() {
        let dir = tempdir().unwrap();
        let result = base_builder(dir.path())
            .fixed_positions(vec![1, 2])
            .fixed_residues(Some(vec!['W']))
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field: "fixed_residues", .. })
        ));

        let result = base_builder(dir.path())
            .fixed_positions(vec![9])
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field: "fixed_positions", .. })
        ));
    }

    #[test]
    fn kinds_parse_from_their_tags() {
        assert_eq!("rfdiffusion".parse::<GeneratorKind>().unwrap(), GeneratorKind::RfDiffusion);
        assert_eq!("Protein_MPNN".parse::<DesignerKind>().unwrap(), DesignerKind::ProteinMpnn);
        assert_eq!(PredictorKind::Chai1.to_string(), "chai1");
        assert!("alphafold9".parse::<PredictorKind>().is_err());
        for kind in RunMode::ALL {
            assert_eq!(kind.as_str().parse::<RunMode>().unwrap(), *kind);
        }
    }

    #[test]
    fn snapshot_serializes_to_toml() {
        let dir = tempdir().unwrap();
        let config = base_builder(dir.path()).build().unwrap();
        let text = config.to_toml().unwrap();
        assert!(text.contains("[backbone]"));
        assert!(text.contains("generator = \"stub\""));
        assert!(text.contains("mode = \"de_novo\""));
    }

    #[test]
    fn image_overrides_replace_default_images() {
        let mut execution = ExecutionConfig {
            mode: ExecutionMode::Auto,
            container_runtime: "docker".to_string(),
            image_overrides: BTreeMap::new(),
        };
        assert_eq!(execution.image_for("rfdiffusion"), "rfdiffusion:latest");
        execution
            .image_overrides
            .insert("rfdiffusion".to_string(), "lab/rfd:1.1".to_string());
        assert_eq!(execution.image_for("rfdiffusion"), "lab/rfd:1.1");
    }
}
