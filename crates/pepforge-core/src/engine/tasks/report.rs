use crate::core::io::documents;
use crate::core::models::design::{BackboneResult, DesignResult, PredictionResult, RankedDesign};
use crate::engine::config::RunConfig;
use crate::engine::context::ProjectContext;
use crate::engine::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, instrument};

/// How many of the best designs the report lists.
pub const REPORT_TOP_DESIGNS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageCounts {
    pub backbones: usize,
    pub designs: usize,
    pub passing_designs: usize,
    pub predictions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopDesign {
    pub rank: usize,
    pub design_id: String,
    pub sequence: String,
    pub composite_score: f64,
    pub passes_filters: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Machine-readable run summary written to `report.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub mode: String,
    pub seed: u64,
    pub generator: String,
    pub designer: String,
    pub predictor: String,
    pub counts: StageCounts,
    pub top_designs: Vec<TopDesign>,
    /// Artifact role to path, only for artifacts that exist.
    pub artifacts: BTreeMap<String, PathBuf>,
}

impl RunReport {
    pub fn build(
        config: &RunConfig,
        context: &ProjectContext,
        backbones: &[BackboneResult],
        designs: &[DesignResult],
        ranked: &[RankedDesign],
        predictions: &[PredictionResult],
    ) -> Self {
        let confidence_of = |id: &str| {
            predictions
                .iter()
                .find(|p| p.design_id == id)
                .and_then(|p| p.confidence)
        };
        let top_designs = ranked
            .iter()
            .take(REPORT_TOP_DESIGNS)
            .map(|r| TopDesign {
                rank: r.rank,
                design_id: r.design_id().to_string(),
                sequence: r.scored.design.sequence.clone(),
                composite_score: r.composite_score,
                passes_filters: r.passes_filters(),
                confidence: confidence_of(r.design_id()),
            })
            .collect();

        let artifacts = [
            ("clean_target", context.clean_target_pdb()),
            ("binding_site", context.binding_site_json()),
            ("existing_peptide", context.existing_peptide_json()),
            ("reference_properties", context.reference_properties_json()),
            ("backbones", context.backbone_index_csv()),
            ("designs", context.sequences_csv()),
            ("scored", context.scored_csv()),
            ("ranked", context.ranked_csv()),
            ("predictions", context.predictions_csv()),
            ("config", context.config_snapshot()),
        ]
        .into_iter()
        .filter(|(_, path)| path.exists())
        .map(|(role, path)| (role.to_string(), path))
        .collect();

        Self {
            mode: config.target.mode.to_string(),
            seed: config.global.seed,
            generator: config.backbone.generator.to_string(),
            designer: config.design.designer.to_string(),
            predictor: config.prediction.predictor.to_string(),
            counts: StageCounts {
                backbones: backbones.len(),
                designs: designs.len(),
                passing_designs: ranked.iter().filter(|r| r.passes_filters()).count(),
                predictions: predictions.len(),
            },
            top_designs,
            artifacts,
        }
    }
}

#[instrument(skip_all, name = "report")]
pub fn write_report(report: &RunReport, context: &ProjectContext) -> Result<PathBuf, PipelineError> {
    let path = context.report_json();
    documents::write_json(&path, report)?;
    info!(path = %path.display(), "Wrote run report");
    Ok(path)
}
