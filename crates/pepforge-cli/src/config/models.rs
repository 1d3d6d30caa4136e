use pepforge::engine::config::RunConfig;
use std::path::PathBuf;

/// A validated run configuration together with the file it was read from.
pub struct AppConfig {
    pub source: PathBuf,
    pub run: RunConfig,
}
