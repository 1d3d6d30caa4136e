use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// The fixed per-stage subdirectories of an output root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageDir {
    Target,
    Backbones,
    Designs,
    Scoring,
    Ranking,
    Predictions,
    Logs,
}

impl StageDir {
    pub const ALL: [StageDir; 7] = [
        StageDir::Target,
        StageDir::Backbones,
        StageDir::Designs,
        StageDir::Scoring,
        StageDir::Ranking,
        StageDir::Predictions,
        StageDir::Logs,
    ];

    /// Every stage directory that holds run artifacts rather than logs.
    pub const OUTPUTS: [StageDir; 6] = [
        StageDir::Target,
        StageDir::Backbones,
        StageDir::Designs,
        StageDir::Scoring,
        StageDir::Ranking,
        StageDir::Predictions,
    ];

    pub fn dir_name(self) -> &'static str {
        match self {
            StageDir::Target => "target",
            StageDir::Backbones => "backbones",
            StageDir::Designs => "designs",
            StageDir::Scoring => "scoring",
            StageDir::Ranking => "ranking",
            StageDir::Predictions => "predictions",
            StageDir::Logs => "logs",
        }
    }
}

/// Artifact layout of one run, rooted at the configured output directory.
///
/// Stages address their files through the named accessors below so the layout is defined
/// in exactly one place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
    root: PathBuf,
}

impl ProjectContext {
    /// Computes the layout without touching the filesystem.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Computes the layout and creates every stage directory. Safe to call repeatedly.
    pub fn create(root: impl Into<PathBuf>) -> io::Result<Self> {
        let ctx = Self::new(root);
        for stage in StageDir::ALL {
            fs::create_dir_all(ctx.dir(stage))?;
        }
        Ok(ctx)
    }

    /// Creates the layout and discards every stage artifact a previous run left in it, so
    /// a ranked table under the root always belongs to the latest run. `logs/` is kept,
    /// since a log file the caller opened there may already be in use.
    pub fn create_fresh(root: impl Into<PathBuf>) -> io::Result<Self> {
        let ctx = Self::create(root)?;
        ctx.clear(&StageDir::OUTPUTS)?;
        remove_file_if_present(&ctx.report_json())?;
        Ok(ctx)
    }

    /// Empties the given stage directories, leaving them in place.
    pub fn clear(&self, stages: &[StageDir]) -> io::Result<()> {
        for &stage in stages {
            let dir = self.dir(stage);
            match fs::remove_dir_all(&dir) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, stage: StageDir) -> PathBuf {
        self.root.join(stage.dir_name())
    }

    pub fn clean_target_pdb(&self) -> PathBuf {
        self.dir(StageDir::Target).join("target_clean.pdb")
    }

    pub fn relaxed_target_pdb(&self) -> PathBuf {
        self.dir(StageDir::Target).join("target_relaxed.pdb")
    }

    pub fn binding_site_json(&self) -> PathBuf {
        self.dir(StageDir::Target).join("binding_site.json")
    }

    pub fn existing_peptide_json(&self) -> PathBuf {
        self.dir(StageDir::Target).join("existing_peptide.json")
    }

    pub fn reference_properties_json(&self) -> PathBuf {
        self.dir(StageDir::Target).join("reference_properties.json")
    }

    pub fn backbone_index_csv(&self) -> PathBuf {
        self.dir(StageDir::Backbones).join("index.csv")
    }

    pub fn sequences_csv(&self) -> PathBuf {
        self.dir(StageDir::Designs).join("sequences.csv")
    }

    pub fn scored_csv(&self) -> PathBuf {
        self.dir(StageDir::Scoring).join("scored.csv")
    }

    pub fn ranked_csv(&self) -> PathBuf {
        self.dir(StageDir::Ranking).join("ranked.csv")
    }

    pub fn predictions_csv(&self) -> PathBuf {
        self.dir(StageDir::Predictions).join("predictions.csv")
    }

    pub fn config_snapshot(&self) -> PathBuf {
        self.dir(StageDir::Logs).join("run_config.toml")
    }

    pub fn report_json(&self) -> PathBuf {
        self.root.join("report.json")
    }
}

fn remove_file_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
