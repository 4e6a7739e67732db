use super::workload::{Workload, WorkloadValue};
use crate::Result;
use crate::work::{DEFAULT_MIN_REMAINING, DEFAULT_REFRESH_INTERVAL, WorkSpec};
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Name of the configuration file looked up in the current directory
pub const CONFIG_FILE_NAME: &str = "runbar.toml";

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Upper bound on the time between progress updates
    #[serde(default = "default_refresh_interval", with = "humantime_serde")]
    pub refresh_interval: Duration,

    /// Remaining time shown once a run has outlasted its prediction
    #[serde(default = "default_min_remaining", with = "humantime_serde")]
    pub min_remaining: Duration,

    /// Number of actual durations remembered per job to predict the next run
    #[serde(default = "default_history_len")]
    pub history_len: usize,

    /// Jobs available from the main window
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

/// A job that can be started from the main window.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    /// Unique name of the job
    pub name: String,

    /// Window title, defaults to "<name> Progress Bar"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Initial guess at how long the job takes
    #[serde(with = "humantime_serde")]
    pub estimate: Duration,

    /// Time taken by each unit of work
    #[serde(default = "default_step", with = "humantime_serde")]
    pub step: Duration,

    /// What the job does
    pub workload: Workload,
}

const fn default_refresh_interval() -> Duration {
    DEFAULT_REFRESH_INTERVAL
}

const fn default_min_remaining() -> Duration {
    DEFAULT_MIN_REMAINING
}

const fn default_history_len() -> usize {
    crate::work::DEFAULT_HISTORY_LEN
}

const fn default_step() -> Duration {
    Duration::from_secs(1)
}

impl JobConfig {
    /// The prediction-history key shared by every run of this job.
    #[must_use]
    pub fn key(&self) -> String {
        self.workload.key()
    }

    /// Describe this job as a background run.
    ///
    /// # Errors
    ///
    /// Returns an error if the estimate is zero.
    pub fn work_spec(&self) -> Result<WorkSpec<WorkloadValue>> {
        let spec = self.workload.clone().into_work_spec(&self.name, self.estimate, self.step)?;
        Ok(match &self.title {
            Some(title) => spec.with_title(title),
            None => spec,
        })
    }
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading runbar configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(CONFIG_FILE_NAME);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    // No config file found, use defaults
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading runbar configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Find a job by name.
    #[must_use]
    pub fn job(&self, name: &str) -> Option<&JobConfig> {
        self.jobs.iter().find(|job| job.name == name)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if a value is out of range or job names are not unique
    fn validate(&self) -> Result<()> {
        if self.history_len == 0 {
            return Err(app_err!("history_len must be at least 1"));
        }

        if self.refresh_interval.is_zero() {
            return Err(app_err!("refresh_interval must be greater than zero"));
        }

        let mut names = HashSet::new();
        for job in &self.jobs {
            if job.estimate.is_zero() {
                return Err(app_err!("the estimate of job '{}' must be greater than zero", job.name));
            }

            if !names.insert(job.name.as_str()) {
                return Err(app_err!("job name '{}' is used more than once", job.name));
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}
