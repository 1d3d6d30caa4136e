//! Typed records passed between pipeline stages.
//!
//! Every record is created once by its producing stage and never mutated afterward; a stage
//! consumes the previous stage's collection and emits a new one. Provenance travels in the
//! open [`Metadata`] map carried by backbone, design, and prediction records.

use std::collections::BTreeMap;

pub mod binding_site;
pub mod design;
pub mod peptide;
pub mod reference;
pub mod structure;
pub mod target;

/// Open key/value provenance attached to stage records.
///
/// A `BTreeMap` keeps key order stable so tabular artifacts get the same column order on
/// every run.
pub type Metadata = BTreeMap<String, String>;
