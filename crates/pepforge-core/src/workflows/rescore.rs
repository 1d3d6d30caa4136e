use super::StageTracker;
use crate::core::io::{documents, tables};
use crate::core::models::design::RankedDesign;
use crate::core::models::reference::ReferenceProperties;
use crate::engine::config::RunConfig;
use crate::engine::context::{ProjectContext, StageDir};
use crate::engine::error::PipelineError;
use crate::engine::progress::ProgressReporter;
use crate::engine::tasks::{ranking, scoring};
use std::path::Path;
use tracing::{info, instrument, warn};

/// Re-scores and re-ranks an existing designs table into the configured output root.
///
/// A reference-properties document left by an earlier optimize-existing run enables
/// reference-relative ranking; when it is absent or unreadable ranking is reference-free.
#[instrument(skip_all, name = "rescore")]
pub fn run(
    config: &RunConfig,
    designs_csv: &Path,
    reporter: &ProgressReporter,
) -> Result<Vec<RankedDesign>, PipelineError> {
    let context = ProjectContext::create(&config.global.output_root)?;
    let mut stages = StageTracker::new(reporter, 2);

    let designs = tables::read_design_table(designs_csv)?;
    info!(count = designs.len(), path = %designs_csv.display(), "Loaded designs table");
    context.clear(&[StageDir::Scoring, StageDir::Ranking])?;

    let reference = if config.is_optimize_existing() {
        let path = context.reference_properties_json();
        match documents::read_json::<ReferenceProperties>(&path) {
            Ok(reference) => Some(reference),
            Err(e) => {
                warn!(error = %e, "Reference properties unavailable; ranking without reference");
                None
            }
        }
    } else {
        None
    };

    stages.start("Scoring sequences");
    let scored = scoring::score_sequences(&designs, &config.scoring, reporter);
    tables::write_table(&context.scored_csv(), &scored)?;
    stages.finish();

    stages.start("Ranking sequences");
    let ranked = ranking::rank_sequences(scored, &config.ranking, reference.as_ref());
    tables::write_table(&context.ranked_csv(), &ranked)?;
    stages.finish();
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Metadata;
    use crate::core::models::design::DesignResult;
    use crate::engine::tasks::fixtures;
    use tempfile::tempdir;

    fn design(id: &str, sequence: &str) -> DesignResult {
        DesignResult {
            design_id: id.to_string(),
            backbone_id: "nb_0".to_string(),
            sequence: sequence.to_string(),
            score: Some(1.0),
            metadata: Metadata::from([("mode".to_string(), "notebook".to_string())]),
        }
    }

    #[test]
    fn external_designs_are_scored_and_ranked() {
        let dir = tempdir().unwrap();
        let config = fixtures::builder(dir.path())
            .charge_max(Some(2.0))
            .build()
            .unwrap();
        let designs_csv = dir.path().join("external.csv");
        tables::write_table(
            &designs_csv,
            &[design("nb_0_seq_0", "KKKKKK"), design("nb_0_seq_1", "GSDKGS")],
        )
        .unwrap();

        let ranked = run(&config, &designs_csv, &ProgressReporter::new()).unwrap();

        assert_eq!(ranked[0].design_id(), "nb_0_seq_1");
        assert!(!ranked[1].passes_filters());
        assert_eq!(ranked[1].composite_score, 0.0);
        let context = ProjectContext::new(&config.global.output_root);
        let ranked_csv = std::fs::read_to_string(context.ranked_csv()).unwrap();
        assert!(ranked_csv.lines().next().unwrap().ends_with(",mode"));
    }

    #[test]
    fn optimize_rescore_without_reference_still_ranks() {
        let dir = tempdir().unwrap();
        let config = fixtures::optimize_builder(dir.path()).build().unwrap();
        let designs_csv = dir.path().join("external.csv");
        tables::write_table(&designs_csv, &[design("nb_0_seq_0", "GSDKGS")]).unwrap();

        let ranked = run(&config, &designs_csv, &ProgressReporter::new()).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].rank, 1);
    }
}
