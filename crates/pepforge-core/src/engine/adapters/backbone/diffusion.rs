use super::{BackboneGenerator, resolve_length, write_index};
use crate::core::models::Metadata;
use crate::core::models::binding_site::BindingSite;
use crate::core::models::design::BackboneResult;
use crate::core::models::peptide::PeptideInfo;
use crate::engine::adapters::{binder_chain_for, path_arg, require_file, run_tool, synthetic};
use crate::engine::config::{BackboneConfig, ExecutionConfig};
use crate::engine::error::AdapterError;
use crate::engine::runtime::{ArtifactSynthesizer, BackendChain, Invocation};
use nalgebra::Point3;
use rand::rngs::StdRng;
use rand::{Rng, RngCore};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Writes a plausible binder ring against the target for every expected output file.
struct RingSynthesizer {
    seed: u64,
    target: PathBuf,
    center: Point3<f64>,
    length: usize,
    binder_chain: char,
    outputs: Vec<PathBuf>,
}

impl ArtifactSynthesizer for RingSynthesizer {
    fn synthesize(&self, _invocation: &Invocation) -> io::Result<()> {
        let target = synthetic::read_structure(&self.target)?;
        let mut rng = synthetic::seeded_rng(self.seed);
        for path in &self.outputs {
            let radius = 5.0 + rng.gen_range(-0.5..0.5);
            let ring = synthetic::macrocycle(&self.center, radius, self.length, self.binder_chain);
            let complex = synthetic::complex_with_binder(&target, ring, self.binder_chain);
            synthetic::write_structure(&complex, path)?;
        }
        Ok(())
    }
}

/// Collects the expected outputs into backbone records and writes the index table.
fn collect_outputs(
    output_dir: &Path,
    outputs: &[PathBuf],
    id_prefix: &str,
    binder_chain: char,
    metadata: &Metadata,
) -> Result<Vec<BackboneResult>, AdapterError> {
    let mut backbones = Vec::with_capacity(outputs.len());
    for (index, path) in outputs.iter().enumerate() {
        require_file(path)?;
        backbones.push(BackboneResult {
            backbone_id: format!("{id_prefix}_{index}"),
            structure_path: path.clone(),
            peptide_chain_id: binder_chain,
            metadata: metadata.clone(),
        });
    }
    write_index(output_dir, &backbones)?;
    info!(tool = id_prefix, count = backbones.len(), "Collected backbones");
    Ok(backbones)
}

/// RFdiffusion binder design conditioned on binding-site hotspots.
pub struct RfDiffusionGenerator {
    execution: ExecutionConfig,
}

impl RfDiffusionGenerator {
    pub const TOOL: &'static str = "rfdiffusion";

    pub fn new(execution: ExecutionConfig) -> Self {
        Self { execution }
    }

    /// Contig string: residues 1-1000 of the target chain, then a binder of fixed length.
    pub fn contig(target_chain: char, length: usize) -> String {
        format!("[{target_chain}1-1000 {length}-{length}]")
    }
}

impl BackboneGenerator for RfDiffusionGenerator {
    #[instrument(skip_all, name = "rfdiffusion")]
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

        let length = resolve_length(config, peptide_info)?;
        let binder_chain = binder_chain_for(binding_site.chain_id);
        let contig = Self::contig(binding_site.chain_id, length);
        let prefix = output_dir.join("rfdiffusion_out");
        let outputs: Vec<PathBuf> = (0..count)
            .map(|i| output_dir.join(format!("rfdiffusion_out_{i}.pdb")))
            .collect();

        let mut command = vec![
            "python".to_string(),
            "scripts/run_inference.py".to_string(),
            format!("inference.input_pdb={}", path_arg(target_structure)),
            format!("inference.output_prefix={}", path_arg(&prefix)),
            format!("contigmap.contigs={contig}"),
            format!("inference.num_designs={count}"),
        ];
        let hotspots = binding_site.hotspot_labels();
        if !hotspots.is_empty() {
            command.push(format!("ppi.hotspot_res=[{}]", hotspots.join(",")));
        }
        let invocation = Invocation::new(Self::TOOL, command, output_dir)
            .mount(output_dir)
            .mount(target_structure.parent().unwrap_or(output_dir));

        let synthesizer = RingSynthesizer {
            seed: rng.next_u64(),
            target: target_structure.to_path_buf(),
            center: binding_site.center_point(),
            length,
            binder_chain,
            outputs: outputs.clone(),
        };
        let chain = BackendChain::for_tool(Self::TOOL, &self.execution, Box::new(synthesizer));
        run_tool(chain, &invocation, output_dir)?;

        let metadata = Metadata::from([
            ("mode".to_string(), "rfdiffusion".to_string()),
            ("contig".to_string(), contig),
            ("peptide_length".to_string(), length.to_string()),
        ]);
        collect_outputs(output_dir, &outputs, "rfdiffusion", binder_chain, &metadata)
    }
}

/// DiffPepBuilder peptide generation against the receptor structure.
pub struct DiffPepBuilderGenerator {
    execution: ExecutionConfig,
}

impl DiffPepBuilderGenerator {
    pub const TOOL: &'static str = "diffpepbuilder";

    pub fn new(execution: ExecutionConfig) -> Self {
        Self { execution }
    }
}

impl BackboneGenerator for DiffPepBuilderGenerator {
    #[instrument(skip_all, name = "diffpepbuilder")]
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

        let length = resolve_length(config, peptide_info)?;
        let binder_chain = binder_chain_for(binding_site.chain_id);
        let outputs: Vec<PathBuf> = (0..count)
            .map(|i| output_dir.join(format!("generated_{i}.pdb")))
            .collect();

        let command = vec![
            "python".to_string(),
            "inference.py".to_string(),
            "--receptor".to_string(),
            path_arg(target_structure),
            "--len".to_string(),
            length.to_string(),
            "--num".to_string(),
            count.to_string(),
            "--out_dir".to_string(),
            path_arg(output_dir),
        ];
        let invocation = Invocation::new(Self::TOOL, command, output_dir)
            .mount(output_dir)
            .mount(target_structure.parent().unwrap_or(output_dir));

        let synthesizer = RingSynthesizer {
            seed: rng.next_u64(),
            target: target_structure.to_path_buf(),
            center: binding_site.center_point(),
            length,
            binder_chain,
            outputs: outputs.clone(),
        };
        let chain = BackendChain::for_tool(Self::TOOL, &self.execution, Box::new(synthesizer));
        run_tool(chain, &invocation, output_dir)?;

        let metadata = Metadata::from([
            ("mode".to_string(), "diffpepbuilder".to_string()),
            ("peptide_length".to_string(), length.to_string()),
        ]);
        collect_outputs(output_dir, &outputs, "diffpepbuilder", binder_chain, &metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::pdb::PdbFile;
    use crate::core::io::traits::StructureFile;
    use crate::core::models::binding_site::SiteSource;
    use crate::core::models::structure::{AtomRecord, Structure};
    use crate::engine::config::{ExecutionMode, GeneratorKind};
    use crate::engine::runtime::{BackendKind, ExecutionBackend, ExecutionError, ExecutionOutput};
    use rand::SeedableRng;
    use std::collections::{BTreeMap, BTreeSet};
    use tempfile::tempdir;

    fn simulated() -> ExecutionConfig {
        ExecutionConfig {
            mode: ExecutionMode::Simulated,
            container_runtime: "docker".to_string(),
            image_overrides: BTreeMap::new(),
        }
    }

    fn setup(dir: &Path) -> (PathBuf, BindingSite) {
        let atoms = (1..=6)
            .map(|i| {
                AtomRecord::protein(i as u32, "CA", "GLY", 'A', i, Point3::new(i as f64, 0.0, 0.0))
            })
            .collect();
        let path = dir.join("target_clean.pdb");
        PdbFile::write_to_path(&Structure::new(atoms), &path).unwrap();
        let site = BindingSite {
            chain_id: 'A',
            residue_indices: BTreeSet::from([2, 3]),
            center: [2.5, 0.0, 0.0],
            radius: 8.0,
            source: SiteSource::Manual,
        };
        (path, site)
    }

    fn config(generator: GeneratorKind) -> BackboneConfig {
        BackboneConfig {
            generator,
            num_backbones: 2,
            peptide_length: Some(10),
            translation_std: 0.5,
            rotation_deg: 5.0,
        }
    }

    #[test]
    fn rfdiffusion_contig_spans_target_and_binder() {
        assert_eq!(RfDiffusionGenerator::contig('A', 12), "[A1-1000 12-12]");
    }

    #[test]
    fn rfdiffusion_simulated_outputs_are_collected() {
        let dir = tempdir().unwrap();
        let (target, site) = setup(dir.path());
        let mut rng = StdRng::seed_from_u64(3);
        let backbones = RfDiffusionGenerator::new(simulated())
            .generate(
                &target,
                &site,
                dir.path(),
                &config(GeneratorKind::RfDiffusion),
                None,
                &mut rng,
            )
            .unwrap();

        assert_eq!(backbones.len(), 2);
        assert_eq!(backbones[1].backbone_id, "rfdiffusion_1");
        assert_eq!(backbones[1].metadata["contig"], "[A1-1000 10-10]");
        assert!(dir.path().join("rfdiffusion_out_1.pdb").is_file());
        let log = std::fs::read_to_string(dir.path().join("rfdiffusion.log")).unwrap();
        assert!(log.contains("ppi.hotspot_res=[A2,A3]"));
    }

    #[test]
    fn diffpepbuilder_simulated_outputs_are_collected() {
        let dir = tempdir().unwrap();
        let (target, site) = setup(dir.path());
        let mut rng = StdRng::seed_from_u64(3);
        let backbones = DiffPepBuilderGenerator::new(simulated())
            .generate(
                &target,
                &site,
                dir.path(),
                &config(GeneratorKind::DiffPepBuilder),
                None,
                &mut rng,
            )
            .unwrap();

        assert_eq!(backbones[0].backbone_id, "diffpepbuilder_0");
        let complex = PdbFile::read_from_path(&backbones[0].structure_path).unwrap();
        assert_eq!(complex.chain_residues('B').len(), 10);
    }

    struct SilentBackend;

    impl ExecutionBackend for SilentBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::Local
        }

        fn is_available(&self) -> bool {
            true
        }

        fn run(&self, _invocation: &Invocation) -> Result<ExecutionOutput, ExecutionError> {
            Ok(ExecutionOutput {
                backend: BackendKind::Local,
                exit_code: Some(0),
                stdout: String::new(),
                stderr: String::new(),
            })
        }
    }

    #[test]
    fn missing_output_after_successful_run_is_an_error() {
        let dir = tempdir().unwrap();
        let outputs = vec![dir.path().join("rfdiffusion_out_0.pdb")];
        let invocation = Invocation::new("rfdiffusion", ["python"], dir.path());
        let chain = BackendChain::new("rfdiffusion")
            .with_candidate(|| crate::engine::runtime::Probe::Available(Box::new(SilentBackend)));
        run_tool(chain, &invocation, dir.path()).unwrap();

        let err = collect_outputs(dir.path(), &outputs, "rfdiffusion", 'B', &Metadata::new())
            .unwrap_err();
        assert!(matches!(err, AdapterError::MissingArtifact(_)));
    }
}
