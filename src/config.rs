//! Job configuration: which tables to load, how to join them and where the JSON goes.
//!
//! The built-in jobs from [defaults](crate::defaults) are always available. A TOML or
//! JSON file can replace any of them by name, add new ones, and set the directory that
//! relative input and output paths are resolved against.
//!
//! ```toml
//! data_dir = "data/oecd"
//!
//! [[merge]]
//! name = "health"
//! outputs = [{ group_by = "year", path = "out/health_by_year.json" }]
//!
//! [merge.left]
//! path = "Health expenditure and financing.csv"
//! key_fields = { location = "Reference area", period = "TIME_PERIOD" }
//! rename = { "Reference area" = "Country", TIME_PERIOD = "Year", OBS_VALUE = "GDP" }
//! # ...
//! ```

use crate::defaults;
use crate::error::MergeError;
use crate::merge::{FieldSelection, GroupBy, PresenceFields};
use crate::rename::RenameMap;
use crate::table::{self, KeyFields, LoadedTable};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One input table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub path: PathBuf,
    pub key_fields: KeyFields,
    /// Column whose value partitions rows sharing a key.
    #[serde(default)]
    pub category_field: Option<String>,
    #[serde(default)]
    pub rename: RenameMap,
}

impl SourceSpec {
    /// Load this source, best effort, with its path resolved against `data_dir`.
    pub fn load(&self, data_dir: &Path) -> LoadedTable {
        table::load_table(
            &data_dir.join(&self.path),
            &self.key_fields,
            self.category_field.as_deref(),
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub group_by: GroupBy,
    pub path: PathBuf,
}

/// An outer join of two sources written once per output grouping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MergeJob {
    pub name: String,
    pub left: SourceSpec,
    pub right: SourceSpec,
    pub fields: FieldSelection,
    pub outputs: Vec<OutputSpec>,
}

/// An inner join pairing the primary observations of two sources.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombineJob {
    pub name: String,
    pub left: SourceSpec,
    pub right: SourceSpec,
    pub fields: PresenceFields,
    #[serde(default = "default_group_by")]
    pub group_by: GroupBy,
    pub output: PathBuf,
}

fn default_group_by() -> GroupBy {
    GroupBy::Year
}

#[derive(Clone, Debug, PartialEq)]
pub enum Job {
    Merge(MergeJob),
    Combine(CombineJob),
}

impl Job {
    pub fn name(&self) -> &str {
        match self {
            Job::Merge(job) => &job.name,
            Job::Combine(job) => &job.name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Job::Merge(_) => "merge",
            Job::Combine(_) => "combine",
        }
    }

    pub fn sources(&self) -> [&SourceSpec; 2] {
        match self {
            Job::Merge(job) => [&job.left, &job.right],
            Job::Combine(job) => [&job.left, &job.right],
        }
    }

    /// Every output path this job writes.
    pub fn output_paths(&self) -> Vec<&Path> {
        match self {
            Job::Merge(job) => job.outputs.iter().map(|o| o.path.as_path()).collect(),
            Job::Combine(job) => vec![job.output.as_path()],
        }
    }
}

/// Contents of a TOML or JSON configuration file.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct JobConfig {
    /// Base directory for relative input and output paths.
    pub data_dir: Option<PathBuf>,

    pub merge: Option<Vec<MergeJob>>,

    pub combine: Option<Vec<CombineJob>>,
}

impl JobConfig {
    /// Load configuration from a file path (TOML or JSON based on extension)
    pub fn load_from_file(path: &Path) -> Result<Self, MergeError> {
        if !path.exists() {
            return Err(MergeError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(MergeError::IoError)?;

        if path.extension().map_or(false, |ext| ext == "json") {
            serde_json::from_str(&content)
                .map_err(|e| MergeError::ParsingError(format!("Invalid JSON config: {}", e)))
        } else {
            toml::from_str(&content)
                .map_err(|e| MergeError::ParsingError(format!("Invalid TOML config: {}", e)))
        }
    }
}

/// Registry of runnable jobs, built-ins first, with optional config file override.
#[derive(Debug, Clone)]
pub struct JobRegistry {
    jobs: Vec<Job>,
    pub data_dir: PathBuf,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl JobRegistry {
    /// Create with the built-in jobs only
    pub fn new() -> Self {
        Self {
            jobs: defaults::default_jobs(),
            data_dir: PathBuf::from("."),
        }
    }

    /// Create with optional config file override
    pub fn with_config(config_path: Option<&Path>) -> Result<Self, MergeError> {
        let mut registry = Self::new();

        if let Some(path) = config_path {
            let config = JobConfig::load_from_file(path)?;

            if let Some(data_dir) = config.data_dir {
                registry.data_dir = data_dir;
            }
            for job in config.merge.unwrap_or_default() {
                registry.insert(Job::Merge(job));
            }
            for job in config.combine.unwrap_or_default() {
                registry.insert(Job::Combine(job));
            }
        }

        Ok(registry)
    }

    /// Add a job, replacing any job of the same name in place.
    pub fn insert(&mut self, job: Job) {
        match self.jobs.iter_mut().find(|j| j.name() == job.name()) {
            Some(existing) => *existing = job,
            None => self.jobs.push(job),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.name() == name)
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// The named jobs in the order given, or every job when `names` is empty.
    pub fn select(&self, names: &[String]) -> Result<Vec<&Job>, MergeError> {
        if names.is_empty() {
            return Ok(self.jobs.iter().collect());
        }
        names
            .iter()
            .map(|name| {
                self.get(name).ok_or_else(|| {
                    let known = self.jobs.iter().map(Job::name).collect::<Vec<_>>();
                    MergeError::Msg(format!(
                        "No job named '{}', known jobs: {}",
                        name,
                        known.join(", ")
                    ))
                })
            })
            .collect()
    }

    /// Resolve a configured path against the data directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.data_dir.join(path)
    }
}
