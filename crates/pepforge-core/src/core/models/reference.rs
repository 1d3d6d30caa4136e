use crate::core::chemistry::properties::SequenceProperties;
use serde::{Deserialize, Serialize};

/// Properties of the original bound peptide, used for reference-relative ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceProperties {
    pub sequence: String,
    pub length: usize,
    pub net_charge: f64,
    pub hydrophobic_fraction: f64,
    pub aromatic_fraction: f64,
    pub positive_fraction: f64,
    pub negative_fraction: f64,
    pub polar_fraction: f64,
}

impl ReferenceProperties {
    pub fn from_properties(sequence: &str, properties: &SequenceProperties) -> Self {
        Self {
            sequence: sequence.to_string(),
            length: sequence.chars().count(),
            net_charge: properties.net_charge,
            hydrophobic_fraction: properties.hydrophobic_fraction,
            aromatic_fraction: properties.aromatic_fraction,
            positive_fraction: properties.positive_fraction,
            negative_fraction: properties.negative_fraction,
            polar_fraction: properties.polar_fraction,
        }
    }
}
