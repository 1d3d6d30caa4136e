use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use super::models::AppConfig;
use crate::cli::ConfigArgs;
use crate::error::{CliError, Result};
use pepforge::engine::config::{self as core_config, ExecutionMode};
use std::fmt::Display;
use std::str::FromStr;

/// Merges command-line overrides, the config file, and defaults (in that order of
/// precedence) and validates the result through the core builder.
pub fn build_config(args: &ConfigArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();
    let file_config = FileConfig::from_file(&args.config)?;
    let file_config = apply_set_values(file_config, &args.set_values)?;

    let global = file_config.global.unwrap_or_default();
    let target = file_config.target.unwrap_or_default();
    let backbone = file_config.backbone.unwrap_or_default();
    let design = file_config.design.unwrap_or_default();
    let scoring = file_config.scoring.unwrap_or_default();
    let ranking = file_config.ranking.unwrap_or_default();
    let prediction = file_config.prediction.unwrap_or_default();
    let execution = file_config.execution.unwrap_or_default();

    let mut builder = core_config::RunConfigBuilder::new()
        .seed(args.seed.or(global.seed).unwrap_or(defaults.seed))
        .contact_cutoff(target.contact_cutoff.unwrap_or(defaults.contact_cutoff))
        .peptide_chain(target.peptide_chain)
        .binding_site_residues(target.binding_site_residues)
        .keep_cofactors(target.keep_cofactors.unwrap_or_default())
        .generator(backbone.generator.unwrap_or(defaults.generator))
        .num_backbones(backbone.num_backbones.unwrap_or(defaults.num_backbones))
        .peptide_length(backbone.peptide_length)
        .translation_std(backbone.translation_std.unwrap_or(defaults.translation_std))
        .rotation_deg(backbone.rotation_deg.unwrap_or(defaults.rotation_deg))
        .designer(design.designer.unwrap_or(defaults.designer))
        .num_sequences_per_backbone(
            design
                .num_sequences_per_backbone
                .unwrap_or(defaults.num_sequences_per_backbone),
        )
        .fixed_positions(design.fixed_positions.unwrap_or_default())
        .fixed_residues(design.fixed_residues.map(|r| r.chars().collect()))
        .disallowed_residues(
            design
                .disallowed_residues
                .map(|r| r.chars().collect())
                .unwrap_or_default(),
        )
        .ph(scoring.ph.unwrap_or(defaults.ph))
        .charge_min(scoring.charge_min)
        .charge_max(scoring.charge_max)
        .max_hydrophobic_fraction(scoring.max_hydrophobic_fraction)
        .max_cys_count(scoring.max_cys_count)
        .ranking_weights(
            ranking.weight_filters.unwrap_or(defaults.weight_filters),
            ranking.weight_charge.unwrap_or(defaults.weight_charge),
            ranking.weight_hydrophobic.unwrap_or(defaults.weight_hydrophobic),
        )
        .predictor(prediction.predictor.unwrap_or(defaults.predictor))
        .num_models(prediction.num_models.unwrap_or(defaults.num_models))
        .top_n(prediction.top_n.unwrap_or(defaults.top_n))
        .use_templates(prediction.use_templates.unwrap_or(false))
        .model_dir(prediction.model_dir)
        .image_overrides(execution.images.unwrap_or_default());

    if let Some(output_root) = args.output.clone().or(global.output_root) {
        builder = builder.output_root(output_root);
    }
    if let Some(pdb_path) = target.pdb_path {
        builder = builder.pdb_path(pdb_path);
    }
    if let Some(mode) = target.mode {
        builder = builder.mode(mode);
    }
    if let Some(chain) = target.target_chain {
        builder = builder.target_chain(chain);
    }
    if let Some(relaxer) = target.relaxer {
        builder = builder.relaxer(relaxer);
    }
    if let Some(runtime) = execution.container_runtime {
        builder = builder.container_runtime(runtime);
    }

    let execution_mode = if args.simulate {
        ExecutionMode::Simulated
    } else {
        execution.mode.unwrap_or(defaults.execution_mode)
    };
    let run = builder
        .execution_mode(execution_mode)
        .build()?;

    Ok(AppConfig {
        source: args.config.clone(),
        run,
    })
}

fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| CliError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn parse_list<T>(key: &str, value: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .split(',')
        .filter(|item| !item.trim().is_empty())
        .map(|item| parse_value(key, item))
        .collect()
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value)) = kv_pair.split_once('=') else {
            return Err(CliError::MalformedOverride(kv_pair.clone()));
        };
        let key = key.trim();

        match key {
            "global.seed" => {
                config.global.get_or_insert_with(Default::default).seed =
                    Some(parse_value(key, value)?);
            }
            "global.output-root" => {
                config.global.get_or_insert_with(Default::default).output_root =
                    Some(value.trim().into());
            }
            "target.mode" => {
                config.target.get_or_insert_with(Default::default).mode =
                    Some(parse_value(key, value)?);
            }
            "target.target-chain" => {
                config.target.get_or_insert_with(Default::default).target_chain =
                    Some(parse_value(key, value)?);
            }
            "target.peptide-chain" => {
                config.target.get_or_insert_with(Default::default).peptide_chain =
                    Some(parse_value(key, value)?);
            }
            "target.binding-site-residues" => {
                config
                    .target
                    .get_or_insert_with(Default::default)
                    .binding_site_residues = Some(parse_list(key, value)?);
            }
            "target.contact-cutoff" => {
                config.target.get_or_insert_with(Default::default).contact_cutoff =
                    Some(parse_value(key, value)?);
            }
            "target.keep-cofactors" => {
                config.target.get_or_insert_with(Default::default).keep_cofactors =
                    Some(parse_list(key, value)?);
            }
            "target.relaxer" => {
                config.target.get_or_insert_with(Default::default).relaxer =
                    Some(parse_value(key, value)?);
            }
            "backbone.generator" => {
                config.backbone.get_or_insert_with(Default::default).generator =
                    Some(parse_value(key, value)?);
            }
            "backbone.num-backbones" => {
                config.backbone.get_or_insert_with(Default::default).num_backbones =
                    Some(parse_value(key, value)?);
            }
            "backbone.peptide-length" => {
                config.backbone.get_or_insert_with(Default::default).peptide_length =
                    Some(parse_value(key, value)?);
            }
            "backbone.translation-std" => {
                config.backbone.get_or_insert_with(Default::default).translation_std =
                    Some(parse_value(key, value)?);
            }
            "backbone.rotation-deg" => {
                config.backbone.get_or_insert_with(Default::default).rotation_deg =
                    Some(parse_value(key, value)?);
            }
            "design.designer" => {
                config.design.get_or_insert_with(Default::default).designer =
                    Some(parse_value(key, value)?);
            }
            "design.num-sequences-per-backbone" => {
                config
                    .design
                    .get_or_insert_with(Default::default)
                    .num_sequences_per_backbone = Some(parse_value(key, value)?);
            }
            "design.fixed-positions" => {
                config.design.get_or_insert_with(Default::default).fixed_positions =
                    Some(parse_list(key, value)?);
            }
            "design.fixed-residues" => {
                config.design.get_or_insert_with(Default::default).fixed_residues =
                    Some(value.trim().to_string());
            }
            "design.disallowed-residues" => {
                config
                    .design
                    .get_or_insert_with(Default::default)
                    .disallowed_residues = Some(value.trim().to_string());
            }
            "scoring.ph" => {
                config.scoring.get_or_insert_with(Default::default).ph =
                    Some(parse_value(key, value)?);
            }
            "scoring.charge-min" => {
                config.scoring.get_or_insert_with(Default::default).charge_min =
                    Some(parse_value(key, value)?);
            }
            "scoring.charge-max" => {
                config.scoring.get_or_insert_with(Default::default).charge_max =
                    Some(parse_value(key, value)?);
            }
            "scoring.max-hydrophobic-fraction" => {
                config
                    .scoring
                    .get_or_insert_with(Default::default)
                    .max_hydrophobic_fraction = Some(parse_value(key, value)?);
            }
            "scoring.max-cys-count" => {
                config.scoring.get_or_insert_with(Default::default).max_cys_count =
                    Some(parse_value(key, value)?);
            }
            "ranking.weight-filters" => {
                config.ranking.get_or_insert_with(Default::default).weight_filters =
                    Some(parse_value(key, value)?);
            }
            "ranking.weight-charge" => {
                config.ranking.get_or_insert_with(Default::default).weight_charge =
                    Some(parse_value(key, value)?);
            }
            "ranking.weight-hydrophobic" => {
                config
                    .ranking
                    .get_or_insert_with(Default::default)
                    .weight_hydrophobic = Some(parse_value(key, value)?);
            }
            "prediction.predictor" => {
                config.prediction.get_or_insert_with(Default::default).predictor =
                    Some(parse_value(key, value)?);
            }
            "prediction.num-models" => {
                config.prediction.get_or_insert_with(Default::default).num_models =
                    Some(parse_value(key, value)?);
            }
            "prediction.top-n" => {
                config.prediction.get_or_insert_with(Default::default).top_n =
                    Some(parse_value(key, value)?);
            }
            "prediction.use-templates" => {
                config.prediction.get_or_insert_with(Default::default).use_templates =
                    Some(parse_value(key, value)?);
            }
            "prediction.model-dir" => {
                config.prediction.get_or_insert_with(Default::default).model_dir =
                    Some(value.trim().into());
            }
            "execution.mode" => {
                config.execution.get_or_insert_with(Default::default).mode =
                    Some(parse_value(key, value)?);
            }
            "execution.container-runtime" => {
                config
                    .execution
                    .get_or_insert_with(Default::default)
                    .container_runtime = Some(value.trim().to_string());
            }
            _ => {
                return Err(CliError::UnknownKey(key.to_string()));
            }
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pepforge::engine::config::{ConfigError, GeneratorKind, PredictorKind, RunMode};
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        fs::write(dir.join("target.pdb"), "END\n").unwrap();
        let path = dir.join("run.toml");
        let header = format!(
            "[global]\noutput-root = \"{}\"\n\n[target]\npdb-path = \"{}\"\nmode = \"de_novo\"\ntarget-chain = \"A\"\n",
            dir.join("out").display(),
            dir.join("target.pdb").display()
        );
        fs::write(&path, format!("{header}\n{body}")).unwrap();
        path
    }

    fn args_for(config: PathBuf) -> ConfigArgs {
        ConfigArgs {
            config,
            output: None,
            seed: None,
            simulate: false,
            set_values: vec![],
        }
    }

    #[test]
    fn minimal_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let args = args_for(write_config(dir.path(), "[backbone]\npeptide-length = 8\n"));

        let app = build_config(&args).unwrap();
        let cfg = app.run;
        let defaults = DefaultsConfig::default();

        assert_eq!(cfg.global().seed, defaults.seed);
        assert_eq!(cfg.target().mode, RunMode::DeNovo);
        assert_eq!(cfg.backbone().generator, GeneratorKind::Stub);
        assert_eq!(cfg.backbone().num_backbones, defaults.num_backbones);
        assert_eq!(cfg.design().num_sequences_per_backbone, defaults.num_sequences_per_backbone);
        assert_eq!(cfg.scoring().ph, defaults.ph);
        assert_eq!(cfg.ranking().weight_filters, defaults.weight_filters);
        assert_eq!(cfg.prediction().predictor, PredictorKind::None);
        assert_eq!(cfg.prediction().top_n, defaults.top_n);
        assert_eq!(cfg.execution().mode, ExecutionMode::Auto);
        assert_eq!(cfg.execution().container_runtime, "docker");
        assert_eq!(app.source, args.config);
    }

    #[test]
    fn file_values_are_used() {
        let dir = tempdir().unwrap();
        let args = args_for(write_config(
            dir.path(),
            "[backbone]\nnum-backbones = 3\npeptide-length = 9\n\n[scoring]\ncharge-max = 2.5\n\n[design]\ndisallowed-residues = \"cm\"\n",
        ));

        let cfg = build_config(&args).unwrap().run;

        assert_eq!(cfg.backbone().num_backbones, 3);
        assert_eq!(cfg.backbone().peptide_length, Some(9));
        assert_eq!(cfg.scoring().charge_max, Some(2.5));
        assert_eq!(cfg.design().disallowed_residues, ['C', 'M']);
    }

    #[test]
    fn cli_overrides_file_values() {
        let dir = tempdir().unwrap();
        let mut args = args_for(write_config(
            dir.path(),
            "[backbone]\npeptide-length = 8\n\n[execution]\nmode = \"local\"\n",
        ));
        args.output = Some(dir.path().join("elsewhere"));
        args.seed = Some(99);
        args.simulate = true;

        let cfg = build_config(&args).unwrap().run;

        assert_eq!(cfg.global().seed, 99);
        assert_eq!(cfg.global().output_root, dir.path().join("elsewhere"));
        assert_eq!(cfg.execution().mode, ExecutionMode::Simulated);
        assert!(dir.path().join("elsewhere").is_dir());
    }

    #[test]
    fn set_values_override_file() {
        let dir = tempdir().unwrap();
        let mut args = args_for(write_config(dir.path(), "[scoring]\nph = 6.0\n"));
        args.set_values = vec![
            "scoring.ph=7.0".to_string(),
            "backbone.generator=diffpepbuilder".to_string(),
            "design.fixed-positions=1,3".to_string(),
            "backbone.peptide-length=6".to_string(),
            "target.binding-site-residues=10, 12".to_string(),
        ];

        let cfg = build_config(&args).unwrap().run;

        assert_eq!(cfg.scoring().ph, 7.0);
        assert_eq!(cfg.backbone().generator, GeneratorKind::DiffPepBuilder);
        assert_eq!(cfg.design().fixed_positions, [1, 3]);
        assert_eq!(cfg.target().binding_site_residues, Some(vec![10, 12]));
    }

    #[test]
    fn set_values_reach_every_section() {
        let dir = tempdir().unwrap();
        let mut args = args_for(write_config(dir.path(), "[backbone]\npeptide-length = 8\n"));
        let weights = dir.path().join("af3");
        args.set_values = vec![
            "design.fixed-positions=2,4".to_string(),
            "design.fixed-residues=WK".to_string(),
            "ranking.weight-filters=0.5".to_string(),
            "ranking.weight-charge=0.25".to_string(),
            "ranking.weight-hydrophobic=0.25".to_string(),
            "prediction.predictor=alphafold3".to_string(),
            format!("prediction.model-dir={}", weights.display()),
            "prediction.use-templates=true".to_string(),
            "target.keep-cofactors=ZN, MG".to_string(),
            "backbone.rotation-deg=12.5".to_string(),
            "execution.container-runtime=podman".to_string(),
        ];

        let cfg = build_config(&args).unwrap().run;

        assert_eq!(cfg.design().fixed_residues, Some(vec!['W', 'K']));
        assert_eq!(cfg.ranking().weight_filters, 0.5);
        assert_eq!(cfg.ranking().weight_charge, 0.25);
        assert_eq!(cfg.ranking().weight_hydrophobic, 0.25);
        assert_eq!(cfg.prediction().predictor, PredictorKind::AlphaFold3);
        assert_eq!(cfg.prediction().model_dir, Some(weights));
        assert!(cfg.prediction().use_templates);
        assert_eq!(cfg.target().keep_cofactors, ["ZN", "MG"]);
        assert_eq!(cfg.backbone().rotation_deg, 12.5);
        assert_eq!(cfg.execution().container_runtime, "podman");
    }

    #[test]
    fn malformed_set_values_are_rejected() {
        let dir = tempdir().unwrap();
        let config = write_config(dir.path(), "");
        let cases: [(&str, fn(&CliError) -> bool); 3] = [
            ("scoring.ph", |e| matches!(e, CliError::MalformedOverride(_))),
            ("scoring.ph=acidic", |e| {
                matches!(e, CliError::InvalidValue { key, value, .. }
                    if key == "scoring.ph" && value == "acidic")
            }),
            ("scoring.temperature=300", |e| {
                matches!(e, CliError::UnknownKey(k) if k == "scoring.temperature")
            }),
        ];
        for (bad, expected) in cases {
            let mut args = args_for(config.clone());
            args.set_values = vec![bad.to_string()];
            let err = build_config(&args).err().unwrap();
            assert!(expected(&err), "{bad}: {err}");
        }
    }

    #[test]
    fn core_validation_errors_surface_as_rejections() {
        let dir = tempdir().unwrap();
        let mut args = args_for(write_config(dir.path(), ""));
        args.set_values = vec!["target.mode=optimize_existing".to_string()];

        let err = build_config(&args).err().unwrap();
        assert!(matches!(err, CliError::Rejected(ConfigError::ModeConflict(_))));
        assert!(err.to_string().contains("peptide_chain"));
    }
}
