use crate::core::chemistry::properties::SequenceProperties;
use crate::core::models::design::{DesignResult, ScoredDesign};
use crate::engine::config::ScoringConfig;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Whether the properties satisfy every bound that is set. Unset bounds never reject.
pub fn evaluate_filters(properties: &SequenceProperties, config: &ScoringConfig) -> bool {
    config.charge_min.is_none_or(|min| properties.net_charge >= min)
        && config.charge_max.is_none_or(|max| properties.net_charge <= max)
        && config
            .max_hydrophobic_fraction
            .is_none_or(|max| properties.hydrophobic_fraction <= max)
        && config
            .max_cys_count
            .is_none_or(|max| properties.cysteine_count <= max)
}

/// Computes properties and filter verdicts for every design, preserving input order.
#[instrument(skip_all, name = "score_sequences")]
pub fn score_sequences(
    designs: &[DesignResult],
    config: &ScoringConfig,
    reporter: &ProgressReporter,
) -> Vec<ScoredDesign> {
    reporter.report(Progress::TaskStart {
        total_steps: designs.len() as u64,
    });

    let score_one = |design: &DesignResult| {
        let properties = SequenceProperties::compute(&design.sequence, config.ph);
        let passes_filters = evaluate_filters(&properties, config);
        reporter.report(Progress::TaskIncrement);
        ScoredDesign {
            design: design.clone(),
            properties,
            passes_filters,
        }
    };

    #[cfg(not(feature = "parallel"))]
    let scored: Vec<ScoredDesign> = designs.iter().map(score_one).collect();

    // Indexed parallel collect keeps the input order.
    #[cfg(feature = "parallel")]
    let scored: Vec<ScoredDesign> = designs.par_iter().map(score_one).collect();

    reporter.report(Progress::TaskFinish);

    let passing = scored.iter().filter(|s| s.passes_filters).count();
    info!(total = scored.len(), passing, "Scored designs");
    if passing == 0 && !scored.is_empty() {
        warn!("No designs pass the configured filters");
    }
    scored
}
