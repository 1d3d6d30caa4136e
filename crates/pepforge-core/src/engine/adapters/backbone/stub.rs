use super::{BackboneGenerator, resolve_length, write_index};
use crate::core::io::pdb::PdbFile;
use crate::core::io::traits::StructureFile;
use crate::core::models::Metadata;
use crate::core::models::binding_site::BindingSite;
use crate::core::models::design::BackboneResult;
use crate::core::models::peptide::PeptideInfo;
use crate::core::models::structure::AtomRecord;
use crate::core::utils::geometry;
use crate::engine::adapters::{binder_chain_for, path_arg, require_file, run_tool, synthetic};
use crate::engine::config::BackboneConfig;
use crate::engine::error::AdapterError;
use crate::engine::runtime::{ArtifactSynthesizer, BackendChain, Invocation};
use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, RngCore};
use rand_distr::{Distribution, Normal};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

const TOOL: &str = "stub_backbones";
const BASE_RADIUS: f64 = 5.0;
const RADIUS_JITTER: f64 = 0.5;

/// Places simple backbones geometrically; never calls an external tool.
///
/// De novo runs get a ring of alanine CA atoms around the binding-site center. Runs with an
/// existing peptide keep it as `backbone_0` and add rigid-body perturbations of it.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubGenerator;

pub(crate) fn backbone_file(output_dir: &Path, index: usize) -> PathBuf {
    output_dir.join(format!("backbone_{index}.pdb"))
}

enum Layout {
    Macrocycle {
        center: Point3<f64>,
        length: usize,
    },
    Perturbed {
        peptide: Vec<AtomRecord>,
        translation_std: f64,
        rotation_deg: f64,
    },
}

struct StubSynthesizer {
    seed: u64,
    target: PathBuf,
    output_dir: PathBuf,
    binder_chain: char,
    count: usize,
    layout: Layout,
}

impl StubSynthesizer {
    fn binder_for(&self, index: usize, rng: &mut StdRng) -> io::Result<Vec<AtomRecord>> {
        match &self.layout {
            Layout::Macrocycle { center, length } => {
                let radius = BASE_RADIUS + rng.gen_range(-RADIUS_JITTER..RADIUS_JITTER);
                Ok(synthetic::macrocycle(
                    center,
                    radius,
                    *length,
                    self.binder_chain,
                ))
            }
            Layout::Perturbed { peptide, .. } if index == 0 => Ok(peptide.clone()),
            Layout::Perturbed {
                peptide,
                translation_std,
                rotation_deg,
            } => {
                let angle = Normal::new(0.0, *rotation_deg).map_err(io::Error::other)?;
                let shift = Normal::new(0.0, *translation_std).map_err(io::Error::other)?;
                let rotation = geometry::rotation_from_euler_degrees([
                    angle.sample(rng),
                    angle.sample(rng),
                    angle.sample(rng),
                ]);
                let translation =
                    Vector3::new(shift.sample(rng), shift.sample(rng), shift.sample(rng));
                let positions: Vec<_> = peptide.iter().map(|a| a.position).collect();
                let moved = geometry::rigid_perturbation(&positions, &rotation, &translation);
                Ok(peptide
                    .iter()
                    .zip(moved)
                    .map(|(atom, position)| AtomRecord {
                        position,
                        ..atom.clone()
                    })
                    .collect())
            }
        }
    }
}

impl ArtifactSynthesizer for StubSynthesizer {
    fn synthesize(&self, _invocation: &Invocation) -> io::Result<()> {
        let target = synthetic::read_structure(&self.target)?;
        let mut rng = synthetic::seeded_rng(self.seed);
        for index in 0..self.count {
            let binder = self.binder_for(index, &mut rng)?;
            let complex = synthetic::complex_with_binder(&target, binder, self.binder_chain);
            synthetic::write_structure(&complex, &backbone_file(&self.output_dir, index))?;
        }
        Ok(())
    }
}

/// The existing peptide's atoms moved onto the binder chain, residues renumbered from 1.
fn existing_peptide_atoms(
    info: &PeptideInfo,
    binder_chain: char,
) -> Result<Vec<AtomRecord>, AdapterError> {
    let structure = PdbFile::read_from_path(&info.original_structure_path)?;
    let atoms: Vec<AtomRecord> = structure
        .chain_atoms(info.chain_id)
        .filter(|a| !a.hetero && info.residue_indices.contains(&a.res_seq))
        .map(|atom| {
            let position = info
                .residue_indices
                .iter()
                .position(|&r| r == atom.res_seq)
                .unwrap_or(0);
            AtomRecord {
                chain_id: binder_chain,
                res_seq: position as i32 + 1,
                i_code: ' ',
                ..atom.clone()
            }
        })
        .collect();
    if atoms.is_empty() {
        return Err(AdapterError::MissingInput("existing peptide atoms"));
    }
    Ok(atoms)
}

impl BackboneGenerator for StubGenerator {
    #[instrument(skip_all, name = "stub_backbones")]
    fn generate(
        &self,
        target_structure: &Path,
        binding_site: &BindingSite,
        output_dir: &Path,
        config: &BackboneConfig,
        peptide_info: Option<&PeptideInfo>,
        rng: &mut StdRng,
    ) -> Result<Vec<BackboneResult>, AdapterError> {
        let count = config.num_backbones;
        if count == 0 {
            write_index(output_dir, &[])?;
            return Ok(Vec::new());
        }

        let binder_chain = binder_chain_for(binding_site.chain_id);
        // Perturbed backbones keep the existing peptide, so its length wins over the config.
        let length = match peptide_info {
            Some(info) if !info.is_empty() => info.len(),
            _ => resolve_length(config, peptide_info)?,
        };
        let layout = match peptide_info {
            Some(info) => Layout::Perturbed {
                peptide: existing_peptide_atoms(info, binder_chain)?,
                translation_std: config.translation_std,
                rotation_deg: config.rotation_deg,
            },
            None => Layout::Macrocycle {
                center: binding_site.center_point(),
                length,
            },
        };

        let synthesizer = StubSynthesizer {
            seed: rng.next_u64(),
            target: target_structure.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            binder_chain,
            count,
            layout,
        };
        let invocation = Invocation::new(
            TOOL,
            [
                "pepforge-stub-backbones".to_string(),
                "--out_dir".to_string(),
                path_arg(output_dir),
                "--num".to_string(),
                count.to_string(),
            ],
            output_dir,
        );
        run_tool(
            BackendChain::simulated_only(TOOL, Box::new(synthesizer)),
            &invocation,
            output_dir,
        )?;

        let mut backbones = Vec::with_capacity(count);
        for index in 0..count {
            let structure_path = backbone_file(output_dir, index);
            require_file(&structure_path)?;
            let mut metadata = Metadata::new();
            metadata.insert("peptide_length".to_string(), length.to_string());
            match peptide_info {
                Some(info) => {
                    let mode = if index == 0 { "existing" } else { "perturbed" };
                    metadata.insert("mode".to_string(), mode.to_string());
                    metadata.insert("original_sequence".to_string(), info.sequence.clone());
                }
                None => {
                    metadata.insert("mode".to_string(), "stub".to_string());
                }
            }
            backbones.push(BackboneResult {
                backbone_id: format!("backbone_{index}"),
                structure_path,
                peptide_chain_id: binder_chain,
                metadata,
            });
        }
        write_index(output_dir, &backbones)?;
        info!(count = backbones.len(), "Generated stub backbones");
        Ok(backbones)
    }
}
