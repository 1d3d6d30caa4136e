use phf::{Map, Set, phf_map, phf_set};
use serde::{Deserialize, Serialize};

const PKA_N_TERMINUS: f64 = 9.0;
const PKA_C_TERMINUS: f64 = 2.0;

const PI_SEARCH_ITERATIONS: usize = 20;
const NEUTRAL_PH: f64 = 7.0;

/// Length of a hydrophobic stretch that flags a sequence as aggregation-prone.
const AGGREGATION_RUN_LENGTH: usize = 4;
const AGGREGATION_TRIPLETS: [&str; 3] = ["WWW", "FFF", "III"];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Ionizable {
    Acidic(f64),
    Basic(f64),
}

static SIDE_CHAIN_PKA: Map<char, Ionizable> = phf_map! {
    'D' => Ionizable::Acidic(3.9),
    'E' => Ionizable::Acidic(4.3),
    'K' => Ionizable::Basic(10.5),
    'R' => Ionizable::Basic(12.5),
    'H' => Ionizable::Basic(6.0),
};

static HYDROPHOBIC: Set<char> = phf_set! { 'A', 'V', 'I', 'L', 'M', 'F', 'W', 'Y' };
static AROMATIC: Set<char> = phf_set! { 'F', 'W', 'Y' };
static POSITIVE: Set<char> = phf_set! { 'K', 'R', 'H' };
static NEGATIVE: Set<char> = phf_set! { 'D', 'E' };
static POLAR: Set<char> = phf_set! { 'S', 'T', 'N', 'Q' };

impl Ionizable {
    fn charge(self, ph: f64) -> f64 {
        match self {
            Ionizable::Basic(pka) => 1.0 / (1.0 + 10f64.powf(ph - pka)),
            Ionizable::Acidic(pka) => -1.0 / (1.0 + 10f64.powf(pka - ph)),
        }
    }
}

fn residues(sequence: &str) -> impl Iterator<Item = char> + '_ {
    sequence
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
}

/// Henderson-Hasselbalch net charge of a peptide at the given pH.
///
/// Both termini contribute in addition to the ionizable side chains. An empty sequence
/// carries no charge.
pub fn net_charge(sequence: &str, ph: f64) -> f64 {
    let mut side_chains = residues(sequence).peekable();
    if side_chains.peek().is_none() {
        return 0.0;
    }
    let termini = Ionizable::Basic(PKA_N_TERMINUS).charge(ph)
        + Ionizable::Acidic(PKA_C_TERMINUS).charge(ph);
    side_chains
        .filter_map(|c| SIDE_CHAIN_PKA.get(&c))
        .fold(termini, |acc, group| acc + group.charge(ph))
}

/// Isoelectric point estimated by bisection over pH 0 to 14.
///
/// Runs a fixed number of halvings, which resolves the crossing to roughly 1e-5 pH units.
pub fn estimate_pi(sequence: &str) -> f64 {
    if residues(sequence).next().is_none() {
        return NEUTRAL_PH;
    }
    let (mut low, mut high) = (0.0_f64, 14.0_f64);
    for _ in 0..PI_SEARCH_ITERATIONS {
        let mid = (low + high) / 2.0;
        if net_charge(sequence, mid) > 0.0 {
            low = mid;
        } else {
            high = mid;
        }
    }
    (low + high) / 2.0
}

fn fraction_in(sequence: &str, set: &Set<char>) -> f64 {
    let (total, hits) = residues(sequence).fold((0usize, 0usize), |(total, hits), c| {
        (total + 1, hits + usize::from(set.contains(&c)))
    });
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

pub fn hydrophobic_fraction(sequence: &str) -> f64 {
    fraction_in(sequence, &HYDROPHOBIC)
}

pub fn aromatic_fraction(sequence: &str) -> f64 {
    fraction_in(sequence, &AROMATIC)
}

pub fn positive_fraction(sequence: &str) -> f64 {
    fraction_in(sequence, &POSITIVE)
}

pub fn negative_fraction(sequence: &str) -> f64 {
    fraction_in(sequence, &NEGATIVE)
}

pub fn polar_fraction(sequence: &str) -> f64 {
    fraction_in(sequence, &POLAR)
}

pub fn cysteine_count(sequence: &str) -> usize {
    residues(sequence).filter(|&c| c == 'C').count()
}

/// True for a stretch of four or more hydrophobic residues, or a homo-triplet of W, F or I.
pub fn has_aggregation_motif(sequence: &str) -> bool {
    let normalized: String = residues(sequence).collect();
    if AGGREGATION_TRIPLETS.iter().any(|t| normalized.contains(t)) {
        return true;
    }
    let mut run = 0;
    for c in normalized.chars() {
        if HYDROPHOBIC.contains(&c) {
            run += 1;
            if run >= AGGREGATION_RUN_LENGTH {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

/// The full physicochemical profile of one sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SequenceProperties {
    pub net_charge: f64,
    pub isoelectric_point: f64,
    pub hydrophobic_fraction: f64,
    pub aromatic_fraction: f64,
    pub positive_fraction: f64,
    pub negative_fraction: f64,
    pub polar_fraction: f64,
    pub cysteine_count: usize,
    pub aggregation_flag: bool,
}

impl SequenceProperties {
    pub fn compute(sequence: &str, ph: f64) -> Self {
        Self {
            net_charge: net_charge(sequence, ph),
            isoelectric_point: estimate_pi(sequence),
            hydrophobic_fraction: hydrophobic_fraction(sequence),
            aromatic_fraction: aromatic_fraction(sequence),
            positive_fraction: positive_fraction(sequence),
            negative_fraction: negative_fraction(sequence),
            polar_fraction: polar_fraction(sequence),
            cysteine_count: cysteine_count(sequence),
            aggregation_flag: has_aggregation_motif(sequence),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [&str; 6] = ["ACDEFGHIK", "KKKKRRRR", "DDDEEE", "GSGSGS", "WWWCCYH", "P"];

    #[test]
    fn empty_sequence_is_neutral_at_any_ph() {
        for ph in [0.0, 3.5, 7.4, 14.0] {
            assert_eq!(net_charge("", ph), 0.0);
        }
        assert_eq!(estimate_pi(""), 7.0);
    }

    #[test]
    fn isoelectric_point_zeroes_the_net_charge() {
        for seq in SAMPLES {
            let pi = estimate_pi(seq);
            assert!(
                net_charge(seq, pi).abs() < 0.02,
                "{seq}: charge {} at pI {pi}",
                net_charge(seq, pi)
            );
            assert!((0.0..=14.0).contains(&pi));
        }
    }

    #[test]
    fn charge_sign_follows_composition() {
        assert!(net_charge("KKKK", 7.4) > 3.0);
        assert!(net_charge("DDDD", 7.4) < -3.0);
        // Lone glycine at neutral pH is zwitterionic.
        assert!(net_charge("G", 7.0).abs() < 0.1);
    }

    #[test]
    fn fractions_stay_within_unit_interval() {
        for seq in SAMPLES.iter().chain(&["", "AVILMFWY"]) {
            for f in [
                hydrophobic_fraction(seq),
                aromatic_fraction(seq),
                positive_fraction(seq),
                negative_fraction(seq),
                polar_fraction(seq),
            ] {
                assert!((0.0..=1.0).contains(&f), "{seq}: {f}");
            }
        }
        assert_eq!(hydrophobic_fraction("AVILMFWY"), 1.0);
        assert_eq!(aromatic_fraction("FWYA"), 0.75);
        assert_eq!(hydrophobic_fraction(""), 0.0);
    }

    #[test]
    fn aggregation_motifs_are_detected() {
        assert!(has_aggregation_motif("AAAA"));
        assert!(!has_aggregation_motif("ACDEFG"));
        assert!(has_aggregation_motif("WWW"));
        assert!(has_aggregation_motif("GSIIIGS"));
        assert!(!has_aggregation_motif("AVIGLMF"));
        assert!(!has_aggregation_motif(""));
    }

    #[test]
    fn lowercase_input_is_normalized() {
        assert_eq!(cysteine_count("acCc"), 3);
        assert_eq!(net_charge("kkd", 7.4), net_charge("KKD", 7.4));
    }

    #[test]
    fn compute_bundles_every_property() {
        let props = SequenceProperties::compute("WWWCKD", 7.4);
        assert_eq!(props.cysteine_count, 1);
        assert!(props.aggregation_flag);
        assert_eq!(props.aromatic_fraction, 0.5);
        assert_eq!(props.net_charge, net_charge("WWWCKD", 7.4));
    }
}
