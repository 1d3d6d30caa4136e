use super::StageTracker;
use crate::core::io::{documents, tables};
use crate::core::models::design::{BackboneResult, DesignResult, PredictionResult, RankedDesign};
use crate::core::models::reference::ReferenceProperties;
use crate::core::models::target::TargetState;
use crate::engine::adapters::{
    BackboneGenerator, DesignConstraints, Designer, Generator, SequenceDesigner,
};
use crate::engine::config::{PredictorKind, RunConfig};
use crate::engine::context::{ProjectContext, StageDir};
use crate::engine::error::PipelineError;
use crate::engine::progress::ProgressReporter;
use crate::engine::tasks::report::{RunReport, write_report};
use crate::engine::tasks::{prediction, ranking, reference, scoring, target};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use tracing::{info, instrument};

/// Everything a completed run produced, in stage order.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub output_root: PathBuf,
    pub target: TargetState,
    pub reference: Option<ReferenceProperties>,
    pub backbones: Vec<BackboneResult>,
    pub designs: Vec<DesignResult>,
    pub ranked: Vec<RankedDesign>,
    pub predictions: Vec<PredictionResult>,
    pub report_path: PathBuf,
}

impl PipelineOutcome {
    pub fn passing_count(&self) -> usize {
        self.ranked.iter().filter(|r| r.passes_filters()).count()
    }
}

fn planned_stages(config: &RunConfig) -> usize {
    let mut total = 6;
    if config.is_optimize_existing() {
        total += 1;
    }
    if config.prediction.predictor != PredictorKind::None {
        total += 1;
    }
    total
}

/// Runs every stage in order against the configured output root.
///
/// All randomness comes from one RNG seeded from `global.seed` before the first stage, so
/// identical configurations against the same backends reproduce identical artifacts. The
/// first failing stage aborts the run. Artifacts of an earlier run under the same root are
/// discarded up front, so the ranked table exists only when this run's ranking completed.
#[instrument(skip_all, name = "pipeline")]
pub fn run(config: &RunConfig, reporter: &ProgressReporter) -> Result<PipelineOutcome, PipelineError> {
    let context = ProjectContext::create_fresh(&config.global.output_root)?;
    let mut rng = StdRng::seed_from_u64(config.global.seed);
    let snapshot = config.to_toml().map_err(std::io::Error::other)?;
    std::fs::write(context.config_snapshot(), snapshot)?;
    info!(
        mode = %config.target.mode,
        seed = config.global.seed,
        output = %context.root().display(),
        "Starting design run"
    );

    let mut stages = StageTracker::new(reporter, planned_stages(config));

    // === Target preparation ===
    stages.start("Preparing target");
    let target_state = target::prepare_target(config, &context)?;
    stages.finish();

    // === Reference properties (optimize-existing only) ===
    let reference = if config.is_optimize_existing() {
        stages.start("Computing reference properties");
        let reference = target_state
            .peptide_info
            .as_ref()
            .and_then(|peptide| reference::compute_reference_properties(peptide, config.scoring.ph));
        if let Some(reference) = &reference {
            documents::write_json(&context.reference_properties_json(), reference)?;
        }
        stages.finish();
        reference
    } else {
        None
    };

    // === Backbone generation ===
    stages.start("Generating backbones");
    let generator = Generator::for_kind(config.backbone.generator, &config.execution);
    let mut backbone_config = config.backbone.clone();
    let existing_peptide = if config.is_optimize_existing() {
        target_state.peptide_info.as_ref()
    } else {
        // A de novo template peptide only supplies the length.
        if backbone_config.peptide_length.is_none() {
            backbone_config.peptide_length = target_state.peptide_info.as_ref().map(|p| p.len());
        }
        None
    };
    let backbones = generator
        .generate(
            target_state.best_structure_path(),
            &target_state.binding_site,
            &context.dir(StageDir::Backbones),
            &backbone_config,
            existing_peptide,
            &mut rng,
        )
        .map_err(PipelineError::generation)?;
    stages.finish();

    // === Sequence design ===
    stages.start("Designing sequences");
    let designer = Designer::for_kind(config.design.designer, &config.execution);
    let constraints = DesignConstraints::resolve(
        &config.design,
        target_state.peptide_info.as_ref(),
        config.target.mode,
    );
    let designs = designer
        .design(
            &backbones,
            &context.dir(StageDir::Designs),
            &config.design,
            &constraints,
            &mut rng,
        )
        .map_err(PipelineError::design)?;
    stages.finish();

    // === Scoring ===
    stages.start("Scoring sequences");
    let scored = scoring::score_sequences(&designs, &config.scoring, reporter);
    tables::write_table(&context.scored_csv(), &scored)?;
    stages.finish();

    // === Ranking ===
    stages.start("Ranking sequences");
    let ranked = ranking::rank_sequences(scored, &config.ranking, reference.as_ref());
    tables::write_table(&context.ranked_csv(), &ranked)?;
    stages.finish();

    // === Structure prediction ===
    let predictions = if config.prediction.predictor == PredictorKind::None {
        stages.skip("Predicting structures", "no predictor configured");
        Vec::new()
    } else {
        stages.start("Predicting structures");
        let predictions = prediction::predict_structures(
            &ranked,
            &target_state,
            config,
            &context.dir(StageDir::Predictions),
            &mut rng,
        )?;
        stages.finish();
        predictions
    };

    // === Report ===
    stages.start("Writing report");
    let report = RunReport::build(config, &context, &backbones, &designs, &ranked, &predictions);
    let report_path = write_report(&report, &context)?;
    stages.finish();

    let outcome = PipelineOutcome {
        output_root: context.root().to_path_buf(),
        target: target_state,
        reference,
        backbones,
        designs,
        ranked,
        predictions,
        report_path,
    };
    info!(
        backbones = outcome.backbones.len(),
        designs = outcome.designs.len(),
        passing = outcome.passing_count(),
        "Design run complete"
    );
    Ok(outcome)
}
