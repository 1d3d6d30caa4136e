use crate::core::models::design::{PredictionResult, RankedDesign};
use crate::core::models::target::TargetState;
use crate::engine::adapters::predict::{PredictionQuery, Receptor};
use crate::engine::adapters::{Predictor, StructurePredictor};
use crate::engine::config::RunConfig;
use crate::engine::error::PipelineError;
use rand::rngs::StdRng;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Passing designs in rank order, at most `top_n` of them.
pub fn select_for_prediction(ranked: &[RankedDesign], top_n: usize) -> Vec<RankedDesign> {
    let mut passing: Vec<&RankedDesign> = ranked.iter().filter(|r| r.passes_filters()).collect();
    passing.sort_by_key(|r| r.rank);
    passing.into_iter().take(top_n).cloned().collect()
}

/// Folds the top passing designs against the target with the configured predictor.
///
/// Returns an empty list when prediction is disabled or nothing passes the filters.
#[instrument(skip_all, name = "predict_structures")]
pub fn predict_structures(
    ranked: &[RankedDesign],
    target: &TargetState,
    config: &RunConfig,
    output_dir: &Path,
    rng: &mut StdRng,
) -> Result<Vec<PredictionResult>, PipelineError> {
    let Some(predictor) = Predictor::for_kind(config.prediction.predictor, &config.execution)
    else {
        return Ok(Vec::new());
    };

    let selected = select_for_prediction(ranked, config.prediction.top_n);
    if selected.is_empty() {
        warn!("No passing designs to predict");
    }
    let queries = PredictionQuery::from_ranked(&selected);
    let receptor = Receptor::from_structure(target.best_structure_path(), config.target.target_chain)
        .map_err(PipelineError::prediction)?;
    let predictions = predictor
        .predict(&queries, &receptor, output_dir, &config.prediction, rng)
        .map_err(PipelineError::prediction)?;
    info!(
        predictor = %config.prediction.predictor,
        count = predictions.len(),
        "Predicted structures"
    );
    Ok(predictions)
}
