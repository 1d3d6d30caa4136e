//! One function per pipeline stage.
//!
//! Stage functions take the validated configuration and the previous stage's records and
//! return new records. Table and document writing is left to the caller so the functions
//! can be reused outside the full pipeline (for example by the rescore workflow).

pub mod prediction;
pub mod ranking;
pub mod reference;
pub mod report;
pub mod scoring;
pub mod target;
