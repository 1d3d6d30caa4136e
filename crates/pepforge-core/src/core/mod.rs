//! # Core Module
//!
//! Stateless building blocks shared by every stage of the design workflow.
//!
//! - **Stage Records** ([`models`]) - Binding sites, peptide info, backbone/design/prediction results
//! - **Physicochemistry** ([`chemistry`]) - Net charge, isoelectric point, composition fractions
//! - **Artifact I/O** ([`io`]) - PDB coordinates, header-named CSV tables, JSON documents
//! - **Utilities** ([`utils`]) - Coordinate geometry used by the simulated generators
//!
//! Nothing in this module touches an execution backend or holds mutable run state.

pub mod chemistry;
pub mod io;
pub mod models;
pub mod utils;
