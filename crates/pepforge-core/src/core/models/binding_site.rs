use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// How the binding site residues were chosen during target preparation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteSource {
    /// Residues listed explicitly in the run configuration.
    Manual,
    /// Placeholder pocket taken from the middle of the target chain.
    AutoStub,
    /// Target residues in contact with an existing bound peptide.
    FromPeptide,
}

impl fmt::Display for SiteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SiteSource::Manual => "manual",
            SiteSource::AutoStub => "auto_stub",
            SiteSource::FromPeptide => "from_peptide",
        };
        f.write_str(s)
    }
}

/// Physical definition of the pocket a binder is designed against.
///
/// Created once per run by target preparation and immutable afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingSite {
    pub chain_id: char,
    pub residue_indices: BTreeSet<i32>,
    pub center: [f64; 3],
    pub radius: f64,
    pub source: SiteSource,
}

impl BindingSite {
    pub fn center_point(&self) -> Point3<f64> {
        Point3::new(self.center[0], self.center[1], self.center[2])
    }

    /// Residue labels in `<chain><number>` form (e.g. `A42`), as diffusion tools expect
    /// for hotspot lists.
    pub fn hotspot_labels(&self) -> Vec<String> {
        self.residue_indices
            .iter()
            .map(|idx| format!("{}{}", self.chain_id, idx))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> BindingSite {
        BindingSite {
            chain_id: 'A',
            residue_indices: [12, 3, 7].into_iter().collect(),
            center: [1.0, 2.0, 3.0],
            radius: 8.0,
            source: SiteSource::Manual,
        }
    }

    #[test]
    fn hotspot_labels_are_ordered_and_chain_prefixed() {
        assert_eq!(site().hotspot_labels(), vec!["A3", "A7", "A12"]);
    }

    #[test]
    fn json_document_uses_snake_case_source_and_plain_arrays() {
        let json = serde_json::to_value(site()).unwrap();
        assert_eq!(json["source"], "manual");
        assert_eq!(json["chain_id"], "A");
        assert_eq!(json["residue_indices"], serde_json::json!([3, 7, 12]));
        assert_eq!(json["center"], serde_json::json!([1.0, 2.0, 3.0]));
    }
}
