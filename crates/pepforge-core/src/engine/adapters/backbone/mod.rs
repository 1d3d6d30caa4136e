//! Backbone generators: place peptide backbones against the prepared target.

use crate::core::io::tables;
use crate::core::models::binding_site::BindingSite;
use crate::core::models::design::BackboneResult;
use crate::core::models::peptide::PeptideInfo;
use crate::engine::config::{BackboneConfig, ExecutionConfig, GeneratorKind};
use crate::engine::error::AdapterError;
use rand::rngs::StdRng;
use std::path::Path;

mod diffusion;
mod stub;

pub use diffusion::{DiffPepBuilderGenerator, RfDiffusionGenerator};
pub use stub::StubGenerator;

/// Index table written by every generator next to its backbone files.
pub const INDEX_FILE: &str = "index.csv";

pub trait BackboneGenerator {
    /// Produces backbones for the target, writing structures and an index table into
    /// `output_dir`.
    ///
    /// `peptide_info` is present only when redesigning an existing peptide. Returns an
    /// empty list without running anything when zero backbones are requested. A missing
    /// expected structure after a successful tool run is an error.
    fn generate(
        &self,
        target_structure: &Path,
        binding_site: &BindingSite,
        output_dir: &Path,
        config: &BackboneConfig,
        peptide_info: Option<&PeptideInfo>,
        rng: &mut StdRng,
    ) -> Result<Vec<BackboneResult>, AdapterError>;
}

/// The supported backbone generators.
pub enum Generator {
    Stub(StubGenerator),
    RfDiffusion(RfDiffusionGenerator),
    DiffPepBuilder(DiffPepBuilderGenerator),
}

impl Generator {
    pub fn for_kind(kind: GeneratorKind, execution: &ExecutionConfig) -> Self {
        match kind {
            GeneratorKind::Stub => Generator::Stub(StubGenerator),
            GeneratorKind::RfDiffusion => {
                Generator::RfDiffusion(RfDiffusionGenerator::new(execution.clone()))
            }
            GeneratorKind::DiffPepBuilder => {
                Generator::DiffPepBuilder(DiffPepBuilderGenerator::new(execution.clone()))
            }
        }
    }

    pub fn kind(&self) -> GeneratorKind {
        match self {
            Generator::Stub(_) => GeneratorKind::Stub,
            Generator::RfDiffusion(_) => GeneratorKind::RfDiffusion,
            Generator::DiffPepBuilder(_) => GeneratorKind::DiffPepBuilder,
        }
    }
}

impl BackboneGenerator for Generator {
    fn generate(
        &self,
        target_structure: &Path,
        binding_site: &BindingSite,
        output_dir: &Path,
        config: &BackboneConfig,
        peptide_info: Option<&PeptideInfo>,
        rng: &mut StdRng,
    ) -> Result<Vec<BackboneResult>, AdapterError> {
        let inner: &dyn BackboneGenerator = match self {
            Generator::Stub(g) => g,
            Generator::RfDiffusion(g) => g,
            Generator::DiffPepBuilder(g) => g,
        };
        inner.generate(
            target_structure,
            binding_site,
            output_dir,
            config,
            peptide_info,
            rng,
        )
    }
}

/// Peptide length to generate: the configured length, else the existing peptide's.
pub(crate) fn resolve_length(
    config: &BackboneConfig,
    peptide_info: Option<&PeptideInfo>,
) -> Result<usize, AdapterError> {
    config
        .peptide_length
        .or_else(|| peptide_info.map(PeptideInfo::len).filter(|&n| n > 0))
        .ok_or(AdapterError::MissingInput("peptide length"))
}

pub(crate) fn write_index(
    output_dir: &Path,
    backbones: &[BackboneResult],
) -> Result<(), AdapterError> {
    tables::write_table(&output_dir.join(INDEX_FILE), backbones)?;
    Ok(())
}
