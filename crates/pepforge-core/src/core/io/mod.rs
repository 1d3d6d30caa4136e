//! File formats the pipeline reads and writes: PDB coordinates, CSV stage tables, and
//! JSON documents for single records.

pub mod documents;
pub mod pdb;
pub mod tables;
pub mod traits;
