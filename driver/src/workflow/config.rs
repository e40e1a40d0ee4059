use anyhow::Context;
use pirepgrid::{GridSpec, MomentFilter};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Grid layout; the origin is replaced by each row's report position.
    pub grid: GridSpec,
    pub workers: usize,
    pub cache_capacity: usize,
    pub output_dir: PathBuf,
    /// Quality threshold applied to every scan as it is loaded.
    pub quality: Option<MomentFilter>,
    /// How many of a row's radar files, nearest first, feed one grid.
    pub max_radars: usize,
    /// JSON NEXRAD site table, used for scan matching and longitude repair.
    pub sites: Option<PathBuf>,
    /// Local level-II archive searched for rows that list no radar files.
    pub archive: Option<PathBuf>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            grid: GridSpec::default(),
            workers: 4,
            cache_capacity: 8,
            output_dir: PathBuf::from("grids"),
            quality: Some(MomentFilter::default()),
            max_radars: 1,
            sites: None,
            archive: None,
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        config
            .grid
            .validate()
            .with_context(|| format!("validating grid in {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn with_overrides(mut self, output_dir: Option<PathBuf>, workers: Option<usize>) -> Self {
        if let Some(dir) = output_dir {
            self.output_dir = dir;
        }
        if let Some(workers) = workers {
            self.workers = workers;
        }
        self
    }
}
