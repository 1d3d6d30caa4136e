use nalgebra::Point3;
use std::collections::BTreeSet;

/// A single `ATOM`/`HETATM` record with fixed-column PDB fields.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomRecord {
    pub hetero: bool,
    pub serial: u32,
    pub name: String,
    pub alt_loc: char,
    pub res_name: String,
    pub chain_id: char,
    pub res_seq: i32,
    pub i_code: char,
    pub position: Point3<f64>,
    pub occupancy: f64,
    pub b_factor: f64,
    pub element: String,
}

impl AtomRecord {
    /// Builds a standard protein atom with unit occupancy and a zero B-factor.
    pub fn protein(
        serial: u32,
        name: &str,
        res_name: &str,
        chain_id: char,
        res_seq: i32,
        position: Point3<f64>,
    ) -> Self {
        let element = name
            .chars()
            .find(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_string())
            .unwrap_or_default();
        Self {
            hetero: false,
            serial,
            name: name.to_string(),
            alt_loc: ' ',
            res_name: res_name.to_string(),
            chain_id,
            res_seq,
            i_code: ' ',
            position,
            occupancy: 1.0,
            b_factor: 0.0,
            element,
        }
    }

    pub fn is_water(&self) -> bool {
        matches!(self.res_name.as_str(), "HOH" | "WAT" | "DOD")
    }

    pub fn is_alpha_carbon(&self) -> bool {
        !self.hetero && self.name == "CA"
    }
}

/// A flat, ordered list of atoms as read from or written to a structure file.
///
/// The pipeline only needs chain and residue level queries, so no topology is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Structure {
    pub atoms: Vec<AtomRecord>,
}

impl Structure {
    pub fn new(atoms: Vec<AtomRecord>) -> Self {
        Self { atoms }
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Chain identifiers in order of first appearance.
    pub fn chain_ids(&self) -> Vec<char> {
        let mut seen = Vec::new();
        for atom in &self.atoms {
            if !seen.contains(&atom.chain_id) {
                seen.push(atom.chain_id);
            }
        }
        seen
    }

    pub fn has_chain(&self, chain_id: char) -> bool {
        self.atoms.iter().any(|a| a.chain_id == chain_id)
    }

    pub fn chain_atoms(&self, chain_id: char) -> impl Iterator<Item = &AtomRecord> {
        self.atoms.iter().filter(move |a| a.chain_id == chain_id)
    }

    /// Residues of a chain as `(number, residue name)` pairs in file order.
    pub fn chain_residues(&self, chain_id: char) -> Vec<(i32, String)> {
        let mut residues: Vec<(i32, String)> = Vec::new();
        for atom in self.chain_atoms(chain_id).filter(|a| !a.hetero) {
            if residues.last().map(|(n, _)| *n) != Some(atom.res_seq) {
                residues.push((atom.res_seq, atom.res_name.clone()));
            }
        }
        residues
    }

    pub fn residue_numbers(&self, chain_id: char) -> BTreeSet<i32> {
        self.chain_atoms(chain_id)
            .filter(|a| !a.hetero)
            .map(|a| a.res_seq)
            .collect()
    }

    /// Alpha-carbon coordinates of a chain, optionally restricted to a residue set.
    pub fn alpha_carbons(
        &self,
        chain_id: char,
        residues: Option<&BTreeSet<i32>>,
    ) -> Vec<Point3<f64>> {
        self.chain_atoms(chain_id)
            .filter(|a| a.is_alpha_carbon())
            .filter(|a| residues.is_none_or(|set| set.contains(&a.res_seq)))
            .map(|a| a.position)
            .collect()
    }

    /// A copy keeping only atoms accepted by `keep`.
    pub fn filtered(&self, mut keep: impl FnMut(&AtomRecord) -> bool) -> Structure {
        Structure {
            atoms: self.atoms.iter().filter(|a| keep(a)).cloned().collect(),
        }
    }

    /// Reassigns atom serial numbers sequentially from 1.
    pub fn renumber_serials(&mut self) {
        for (idx, atom) in self.atoms.iter_mut().enumerate() {
            atom.serial = idx as u32 + 1;
        }
    }
}
