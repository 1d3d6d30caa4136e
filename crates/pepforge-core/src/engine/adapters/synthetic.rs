//! Building blocks for simulated tool outputs.

use crate::core::chemistry::residues;
use crate::core::io::pdb::PdbFile;
use crate::core::io::traits::StructureFile;
use crate::core::models::structure::{AtomRecord, Structure};
use crate::core::utils::geometry;
use nalgebra::{Point3, Vector3};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io;
use std::path::Path;

const STUB_B_FACTOR: f64 = 20.0;
const HELIX_RADIUS: f64 = 2.3;
const HELIX_RISE: f64 = 1.5;
const HELIX_TWIST_DEG: f64 = 100.0;

pub(crate) fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub(crate) fn read_structure(path: &Path) -> io::Result<Structure> {
    PdbFile::read_from_path(path).map_err(io::Error::other)
}

pub(crate) fn write_structure(structure: &Structure, path: &Path) -> io::Result<()> {
    PdbFile::write_to_path(structure, path).map_err(io::Error::other)
}

/// Poly-alanine CA atoms arranged as a closed ring around `center`.
pub(crate) fn macrocycle(
    center: &Point3<f64>,
    radius: f64,
    length: usize,
    chain_id: char,
) -> Vec<AtomRecord> {
    geometry::place_on_circle(center, radius, length)
        .into_iter()
        .enumerate()
        .map(|(i, position)| {
            let mut atom = AtomRecord::protein(0, "CA", "ALA", chain_id, i as i32 + 1, position);
            atom.b_factor = STUB_B_FACTOR;
            atom
        })
        .collect()
}

/// The target with `binder` appended as its own chain, replacing any atoms already on
/// that chain. Serials are renumbered.
pub(crate) fn complex_with_binder(
    target: &Structure,
    binder: Vec<AtomRecord>,
    binder_chain: char,
) -> Structure {
    let mut complex = target.filtered(|a| a.chain_id != binder_chain);
    complex.atoms.extend(binder.into_iter().map(|mut atom| {
        atom.chain_id = binder_chain;
        atom
    }));
    complex.renumber_serials();
    complex
}

/// An idealized helical CA trace for `sequence`, one B-factor per residue.
pub(crate) fn helical_trace(sequence: &str, chain_id: char, b_factors: &[f64]) -> Structure {
    let atoms = sequence
        .chars()
        .enumerate()
        .map(|(i, code)| {
            let theta = (HELIX_TWIST_DEG * i as f64).to_radians();
            let position = Point3::from(Vector3::new(
                HELIX_RADIUS * theta.cos(),
                HELIX_RADIUS * theta.sin(),
                HELIX_RISE * i as f64,
            ));
            let res_name = residues::one_to_three(code).unwrap_or("UNK");
            let mut atom =
                AtomRecord::protein(i as u32 + 1, "CA", res_name, chain_id, i as i32 + 1, position);
            atom.b_factor = b_factors.get(i).copied().unwrap_or(0.0);
            atom
        })
        .collect();
    Structure::new(atoms)
}
