//! Sequence-level physicochemistry: residue alphabets and the property model used for
//! filtering and ranking.

pub mod properties;
pub mod residues;
