use pepforge::engine::config::ConfigError;
use pepforge::engine::error::PipelineError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

/// Failures of the `pepforge` binary, grouped by what the user has to change.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Cannot load config file '{path}': {source}", path = path.display())]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Invalid value '{value}' for '{key}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Override '{0}' is not of the form KEY=VALUE")]
    MalformedOverride(String),

    #[error("Unknown configuration key '{0}' for --set")]
    UnknownKey(String),

    /// The merged configuration failed the core validation rules.
    #[error("Run configuration rejected: {0}")]
    Rejected(#[from] ConfigError),

    #[error("Invalid peptide sequence '{sequence}': {reason}")]
    InvalidSequence { sequence: String, reason: String },

    #[error("pH {0} is outside [0, 14]")]
    PhOutOfRange(f64),

    #[error("Designs table '{path}' does not exist", path = .0.display())]
    MissingDesigns(PathBuf),

    #[error("Design run failed: {0}")]
    Run(#[from] PipelineError),

    #[error("Cannot render the resolved configuration: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("Cannot set up logging: {0}")]
    Logging(String),

    #[error("Cannot initialise the runtime: {0}")]
    Runtime(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// A follow-up suggestion for failures that usually have one obvious remedy.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            CliError::InvalidValue { .. } | CliError::UnknownKey(_) | CliError::Rejected(_) => {
                Some("run `pepforge validate` to check the merged configuration")
            }
            CliError::Run(PipelineError::EnvironmentUnavailable(_)) => {
                Some("install the tool, set execution.mode, or pass --simulate")
            }
            CliError::Run(PipelineError::TargetPreparation(_)) => {
                Some("check target.target-chain and target.peptide-chain against the input structure")
            }
            CliError::Run(
                PipelineError::Execution(_)
                | PipelineError::Generation(_)
                | PipelineError::Design(_)
                | PipelineError::Prediction(_),
            ) => Some("the tool log sits in the failing stage directory under the output root"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pepforge::engine::runtime::EnvironmentUnavailable;

    #[test]
    fn missing_tools_suggest_the_simulated_backend() {
        let err = CliError::from(PipelineError::EnvironmentUnavailable(EnvironmentUnavailable {
            tool: "rfdiffusion".to_string(),
            reasons: vec!["docker not found".to_string()],
        }));
        assert!(err.to_string().starts_with("Design run failed: "));
        assert!(err.hint().unwrap().contains("--simulate"));
    }

    #[test]
    fn override_errors_name_the_key_and_value() {
        let err = CliError::InvalidValue {
            key: "scoring.ph".to_string(),
            value: "acid".to_string(),
            reason: "invalid float literal".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value 'acid' for 'scoring.ph': invalid float literal"
        );
        assert!(err.hint().is_some());
        assert!(CliError::PhOutOfRange(15.0).hint().is_none());
    }
}
