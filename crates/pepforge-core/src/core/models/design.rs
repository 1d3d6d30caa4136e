use super::Metadata;
use crate::core::chemistry::properties::SequenceProperties;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One generated peptide backbone placed against the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackboneResult {
    pub backbone_id: String,
    pub structure_path: PathBuf,
    pub peptide_chain_id: char,
    pub metadata: Metadata,
}

/// One designed sequence threaded onto a backbone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignResult {
    pub design_id: String,
    pub backbone_id: String,
    pub sequence: String,
    /// Designer-reported score; lower is better for MPNN-style designers.
    pub score: Option<f64>,
    pub metadata: Metadata,
}

impl DesignResult {
    /// Identifier of the `index`-th sequence designed for a backbone.
    pub fn make_id(backbone_id: &str, index: usize) -> String {
        format!("{backbone_id}_seq_{index}")
    }
}

/// A design together with its computed properties and filter verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDesign {
    pub design: DesignResult,
    pub properties: SequenceProperties,
    pub passes_filters: bool,
}

/// A scored design with its composite score and 1-based rank.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedDesign {
    pub scored: ScoredDesign,
    pub composite_score: f64,
    pub rank: usize,
}

impl RankedDesign {
    pub fn design_id(&self) -> &str {
        &self.scored.design.design_id
    }

    pub fn passes_filters(&self) -> bool {
        self.scored.passes_filters
    }
}

/// A predicted complex structure for one top-ranked design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub design_id: String,
    pub predicted_structure_path: PathBuf,
    pub confidence: Option<f64>,
    pub metadata: Metadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn design_ids_follow_backbone_and_index() {
        assert_eq!(DesignResult::make_id("backbone_2", 0), "backbone_2_seq_0");
        assert_eq!(DesignResult::make_id("rfdiffusion_10", 3), "rfdiffusion_10_seq_3");
    }
}
