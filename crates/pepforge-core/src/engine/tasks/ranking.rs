use crate::core::models::design::{RankedDesign, ScoredDesign};
use crate::core::models::reference::ReferenceProperties;
use crate::engine::config::RankingConfig;
use tracing::{info, instrument};

const CHARGE_SCALE: f64 = 10.0;

fn closeness(delta: f64) -> f64 {
    1.0 - delta.abs().clamp(0.0, 1.0)
}

/// Weighted score in `[0, 1]` for a design; always `0.0` when it fails filters.
///
/// Without a reference, charge and hydrophobicity are rewarded for being low. With a
/// reference, the weight left after the filter term is split equally between closeness
/// to the reference charge, hydrophobic fraction, and aromatic fraction.
pub fn composite_score(
    scored: &ScoredDesign,
    weights: &RankingConfig,
    reference: Option<&ReferenceProperties>,
) -> f64 {
    if !scored.passes_filters {
        return 0.0;
    }
    let props = &scored.properties;
    match reference {
        None => {
            weights.weight_filters
                + weights.weight_charge * (1.0 - (props.net_charge.abs() / CHARGE_SCALE).min(1.0))
                + weights.weight_hydrophobic * (1.0 - props.hydrophobic_fraction.clamp(0.0, 1.0))
        }
        Some(reference) => {
            let share = (1.0 - weights.weight_filters) / 3.0;
            weights.weight_filters
                + share * closeness((props.net_charge - reference.net_charge) / CHARGE_SCALE)
                + share * closeness(props.hydrophobic_fraction - reference.hydrophobic_fraction)
                + share * closeness(props.aromatic_fraction - reference.aromatic_fraction)
        }
    }
}

/// Sorts designs by composite score, highest first, and assigns ranks `1..=n`.
///
/// The sort is stable, so equal scores keep their scoring order. Designs that fail filters
/// score zero and end up at the bottom.
#[instrument(skip_all, name = "rank_sequences")]
pub fn rank_sequences(
    scored: Vec<ScoredDesign>,
    weights: &RankingConfig,
    reference: Option<&ReferenceProperties>,
) -> Vec<RankedDesign> {
    let mut with_scores: Vec<(ScoredDesign, f64)> = scored
        .into_iter()
        .map(|s| {
            let score = composite_score(&s, weights, reference);
            (s, score)
        })
        .collect();
    with_scores.sort_by(|a, b| b.1.total_cmp(&a.1));

    let ranked: Vec<RankedDesign> = with_scores
        .into_iter()
        .enumerate()
        .map(|(idx, (scored, composite_score))| RankedDesign {
            scored,
            composite_score,
            rank: idx + 1,
        })
        .collect();
    info!(
        count = ranked.len(),
        reference = reference.is_some(),
        best = ranked.first().map(|r| r.composite_score),
        "Ranked designs"
    );
    ranked
}
