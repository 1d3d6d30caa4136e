use pepforge::engine::config::{DesignerKind, ExecutionMode, GeneratorKind, PredictorKind};

/// Values used when neither the command line nor the config file sets a field.
pub struct DefaultsConfig {
    pub seed: u64,
    pub contact_cutoff: f64,
    pub generator: GeneratorKind,
    pub num_backbones: usize,
    pub translation_std: f64,
    pub rotation_deg: f64,
    pub designer: DesignerKind,
    pub num_sequences_per_backbone: usize,
    pub ph: f64,
    pub weight_filters: f64,
    pub weight_charge: f64,
    pub weight_hydrophobic: f64,
    pub predictor: PredictorKind,
    pub num_models: usize,
    pub top_n: usize,
    pub execution_mode: ExecutionMode,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            contact_cutoff: 5.0,
            generator: GeneratorKind::Stub,
            num_backbones: 10,
            translation_std: 0.5,
            rotation_deg: 5.0,
            designer: DesignerKind::Stub,
            num_sequences_per_backbone: 5,
            ph: 7.4,
            weight_filters: 0.4,
            weight_charge: 0.3,
            weight_hydrophobic: 0.3,
            predictor: PredictorKind::None,
            num_models: 1,
            top_n: 5,
            execution_mode: ExecutionMode::Auto,
        }
    }
}
