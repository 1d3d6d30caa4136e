//! # pepforge Core Library
//!
//! Orchestration, scoring, and ranking for reproducible peptide binder design against a
//! protein target. Compute-heavy stages (backbone diffusion, sequence design, structure
//! prediction, relaxation) are delegated to external tools reached through a fixed adapter
//! contract; this crate owns everything around them.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Immutable stage records (`BindingSite`, `DesignResult`, ...),
//!   the physicochemical property math, a minimal structure model, and artifact I/O
//!   (PDB coordinates, CSV tables, JSON documents).
//!
//! - **[`engine`]: The Machinery.** Validated run configuration, the execution-backend
//!   fallback chain, the on-disk artifact layout, the backend adapters, and the individual
//!   stage tasks.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures that thread typed state through
//!   the fixed stage order, such as [`workflows::pipeline::run`].

pub mod core;
pub mod engine;
pub mod workflows;
