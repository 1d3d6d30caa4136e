//! # Engine Module
//!
//! Stateful machinery behind a design run: validated configuration, the on-disk artifact
//! layout, execution backends for external tools, the adapters that drive those tools, and
//! the individual stage functions the pipeline strings together.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - run parameters and the validating builder
//! - **Errors** ([`error`]) - the run-level failure taxonomy
//! - **Progress** ([`progress`]) - callback-based progress events for front ends
//! - **Context** ([`context`]) - stage directories and named artifact paths
//! - **Runtime** ([`runtime`]) - local, notebook, container and simulated backends with
//!   ranked fallback
//! - **Adapters** ([`adapters`]) - backbone generators, sequence designers, structure
//!   predictors and relaxers
//! - **Tasks** ([`tasks`]) - one function per pipeline stage

pub mod adapters;
pub mod config;
pub mod context;
pub mod error;
pub mod progress;
pub mod runtime;
pub mod tasks;
