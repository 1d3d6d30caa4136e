use crate::core::chemistry::residues;
use crate::core::io::documents;
use crate::core::io::pdb::PdbFile;
use crate::core::io::traits::StructureFile;
use crate::core::models::binding_site::{BindingSite, SiteSource};
use crate::core::models::peptide::PeptideInfo;
use crate::core::models::structure::{AtomRecord, Structure};
use crate::core::models::target::TargetState;
use crate::core::utils::geometry;
use crate::engine::adapters::Relaxer;
use crate::engine::config::{ConfigError, RunConfig, RunMode, TargetConfig};
use crate::engine::context::{ProjectContext, StageDir};
use crate::engine::error::PipelineError;
use nalgebra::Point3;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, instrument, warn};

pub const BINDING_SITE_RADIUS: f64 = 8.0;
/// Residues taken from the middle of the target chain when no site is given.
const AUTO_SITE_SPAN: usize = 6;

/// Keeps the target chain's protein atoms and listed cofactors. Waters and non-primary
/// alternate locations are dropped.
pub fn clean_structure(structure: &Structure, target: &TargetConfig) -> Structure {
    let mut clean = structure.filtered(|atom| {
        let primary = matches!(atom.alt_loc, ' ' | 'A');
        let wanted = if atom.hetero {
            target.keep_cofactors.iter().any(|name| name == &atom.res_name)
        } else {
            atom.chain_id == target.target_chain
        };
        primary && wanted && !atom.is_water()
    });
    for atom in &mut clean.atoms {
        atom.alt_loc = ' ';
    }
    clean.renumber_serials();
    clean
}

/// Extracts the standard residues of `chain_id` as a peptide record.
pub fn extract_peptide(
    structure: &Structure,
    chain_id: char,
    source: &Path,
) -> Result<PeptideInfo, PipelineError> {
    if !structure.has_chain(chain_id) {
        return Err(PipelineError::TargetPreparation(format!(
            "peptide chain '{chain_id}' not found in {}",
            source.display()
        )));
    }
    let (residue_indices, sequence): (Vec<i32>, String) = structure
        .chain_residues(chain_id)
        .iter()
        .filter_map(|(number, name)| residues::three_to_one(name).map(|code| (*number, code)))
        .unzip();
    Ok(PeptideInfo {
        chain_id,
        sequence,
        residue_indices,
        original_structure_path: source.to_path_buf(),
    })
}

/// Target residues with any atom within `cutoff` of any peptide atom.
pub fn contact_residues(
    target_atoms: &[&AtomRecord],
    peptide_atoms: &[&AtomRecord],
    cutoff: f64,
) -> BTreeSet<i32> {
    let cutoff_sq = cutoff * cutoff;
    target_atoms
        .iter()
        .filter(|t| {
            peptide_atoms
                .iter()
                .any(|p| (t.position - p.position).norm_squared() <= cutoff_sq)
        })
        .map(|t| t.res_seq)
        .collect()
}

fn center_or_origin(points: &[Point3<f64>]) -> [f64; 3] {
    let center = geometry::centroid(points).unwrap_or_else(Point3::origin);
    [center.x, center.y, center.z]
}

fn site_from_peptide(
    clean: &Structure,
    raw: &Structure,
    target: &TargetConfig,
    peptide_chain: char,
) -> BindingSite {
    let target_atoms: Vec<&AtomRecord> = clean
        .chain_atoms(target.target_chain)
        .filter(|a| !a.hetero)
        .collect();
    let peptide_atoms: Vec<&AtomRecord> = raw.chain_atoms(peptide_chain).collect();
    let residue_indices = contact_residues(&target_atoms, &peptide_atoms, target.contact_cutoff);

    let mut anchor = raw.alpha_carbons(peptide_chain, None);
    if anchor.is_empty() {
        anchor = peptide_atoms.iter().map(|a| a.position).collect();
    }
    BindingSite {
        chain_id: target.target_chain,
        residue_indices,
        center: center_or_origin(&anchor),
        radius: BINDING_SITE_RADIUS,
        source: SiteSource::FromPeptide,
    }
}

fn manual_site(clean: &Structure, target: &TargetConfig, listed: &[i32]) -> BindingSite {
    let residue_indices: BTreeSet<i32> = listed.iter().copied().collect();
    let present = clean.residue_numbers(target.target_chain);
    let missing: Vec<i32> = residue_indices.difference(&present).copied().collect();
    if !missing.is_empty() {
        warn!(chain = %target.target_chain, ?missing, "Binding site residues not found in target chain");
    }
    let anchor = clean.alpha_carbons(target.target_chain, Some(&residue_indices));
    BindingSite {
        chain_id: target.target_chain,
        residue_indices,
        center: center_or_origin(&anchor),
        radius: BINDING_SITE_RADIUS,
        source: SiteSource::Manual,
    }
}

fn auto_site(clean: &Structure, target: &TargetConfig) -> BindingSite {
    let numbers: Vec<i32> = clean
        .chain_residues(target.target_chain)
        .iter()
        .map(|(n, _)| *n)
        .collect();
    let mid = numbers.len() / 2;
    let half = AUTO_SITE_SPAN / 2;
    let window = &numbers[mid.saturating_sub(half)..(mid + half).min(numbers.len())];
    let residue_indices: BTreeSet<i32> = window.iter().copied().collect();
    info!(residues = ?residue_indices, "No binding site given, using the middle of the target chain");
    let anchor = clean.alpha_carbons(target.target_chain, Some(&residue_indices));
    BindingSite {
        chain_id: target.target_chain,
        residue_indices,
        center: center_or_origin(&anchor),
        radius: BINDING_SITE_RADIUS,
        source: SiteSource::AutoStub,
    }
}

/// Rejects fixed positions past the end of the peptide whose length the design inherits.
///
/// Optimize-existing runs always design at the existing peptide's length; de novo runs do
/// so only when no explicit length was configured.
fn check_fixed_positions(config: &RunConfig, peptide: &PeptideInfo) -> Result<(), ConfigError> {
    let inherits_length = config.is_optimize_existing() || config.backbone.peptide_length.is_none();
    match config.design.fixed_positions.iter().max() {
        Some(&max_pos) if inherits_length && max_pos > peptide.len() => {
            Err(ConfigError::InvalidValue {
                field: "fixed_positions",
                reason: format!(
                    "position {max_pos} exceeds the {}-residue peptide on chain '{}'",
                    peptide.len(),
                    peptide.chain_id
                ),
            })
        }
        _ => Ok(()),
    }
}

/// Cleans the input structure, locates the binding site, extracts any existing peptide,
/// and optionally relaxes the cleaned target.
///
/// Writes `target_clean.pdb`, `binding_site.json`, and (when a peptide chain is named)
/// `existing_peptide.json` into the target stage directory. A failed relaxation is logged
/// and leaves the run on the cleaned structure.
#[instrument(skip_all, name = "prepare_target")]
pub fn prepare_target(
    config: &RunConfig,
    context: &ProjectContext,
) -> Result<TargetState, PipelineError> {
    let target = &config.target;
    let raw = PdbFile::read_from_path(&target.pdb_path)?;
    if !raw.has_chain(target.target_chain) {
        return Err(PipelineError::TargetPreparation(format!(
            "target chain '{}' not found in {}",
            target.target_chain,
            target.pdb_path.display()
        )));
    }

    let clean = clean_structure(&raw, target);
    let clean_path = context.clean_target_pdb();
    PdbFile::write_to_path(&clean, &clean_path)?;
    info!(atoms = clean.atoms.len(), path = %clean_path.display(), "Wrote cleaned target");

    let peptide_info = match target.peptide_chain {
        Some(chain) => {
            let info = extract_peptide(&raw, chain, &target.pdb_path)?;
            check_fixed_positions(config, &info)?;
            documents::write_json(&context.existing_peptide_json(), &info)?;
            info!(chain = %chain, sequence = %info.sequence, "Extracted existing peptide");
            Some(info)
        }
        None => None,
    };

    let binding_site = match (target.mode, target.peptide_chain) {
        (RunMode::OptimizeExisting, Some(chain)) => site_from_peptide(&clean, &raw, target, chain),
        _ => match &target.binding_site_residues {
            Some(listed) if !listed.is_empty() => manual_site(&clean, target, listed),
            _ => auto_site(&clean, target),
        },
    };
    documents::write_json(&context.binding_site_json(), &binding_site)?;
    info!(
        source = %binding_site.source,
        residues = binding_site.residue_indices.len(),
        "Binding site defined"
    );

    let relaxed_structure_path = Relaxer::for_kind(target.relaxer, &config.execution).and_then(
        |relaxer| {
            match relaxer.relax(
                &clean_path,
                &context.relaxed_target_pdb(),
                &context.dir(StageDir::Logs),
            ) {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!(error = %e, "Relaxation failed, continuing with the cleaned target");
                    None
                }
            }
        },
    );

    Ok(TargetState {
        clean_structure_path: clean_path,
        relaxed_structure_path,
        binding_site,
        peptide_info,
    })
}
