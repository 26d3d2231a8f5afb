use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub reference: ReferenceConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Files aligned concurrently (default: number of CPUs)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Keep the proxy and aligned timing files after the batch
    #[serde(default)]
    pub keep_temp: bool,

    /// Output directory, relative to the input directory unless absolute
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Inserted before `.sup` in output names
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("synced_sups")
}

fn default_output_suffix() -> String {
    "synced".to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            keep_temp: false,
            output_dir: default_output_dir(),
            output_suffix: default_output_suffix(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Aligner executable, a bare name is looked up on PATH
    #[serde(default = "default_program")]
    pub program: PathBuf,

    /// Per-file aligner timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Extra arguments appended to every aligner invocation
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Extension the reference media is renamed to for the batch
    #[serde(default = "default_reference_extension")]
    pub reference_extension: String,
}

fn default_program() -> PathBuf {
    PathBuf::from(supsync_av::align::DEFAULT_PROGRAM)
}

fn default_timeout() -> u64 {
    1800
}

fn default_reference_extension() -> String {
    "mkv".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            timeout_secs: default_timeout(),
            extra_args: Vec::new(),
            reference_extension: default_reference_extension(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReferenceConfig {
    /// Extensions tried, in order, when discovering the reference track
    #[serde(default = "default_reference_extensions")]
    pub extensions: Vec<String>,
}

fn default_reference_extensions() -> Vec<String> {
    supsync_common::paths::audio_extensions()
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect()
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            extensions: default_reference_extensions(),
        }
    }
}
