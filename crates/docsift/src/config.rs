use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub input_directory: String,
    pub output_directory: String,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default = "default_supported_extensions")]
    pub supported_extensions: Vec<String>,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

fn default_supported_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg", "pdf", "doc", "docx"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Polling parameters for the ingestion watcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Seconds between directory scans.
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,
    /// Milliseconds between size samples when waiting for a file to settle.
    #[serde(default = "default_stabilize_poll")]
    pub stabilize_poll_millis: u64,
    /// Seconds after which an unsettled file is given up on (until the next scan).
    #[serde(default = "default_stabilize_timeout")]
    pub stabilize_timeout_secs: u64,
}

fn default_scan_interval() -> u64 {
    2
}

fn default_stabilize_poll() -> u64 {
    250
}

fn default_stabilize_timeout() -> u64 {
    30
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: default_scan_interval(),
            stabilize_poll_millis: default_stabilize_poll(),
            stabilize_timeout_secs: default_stabilize_timeout(),
        }
    }
}

/// External command used to turn office documents into PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    #[serde(default = "default_converter_program")]
    pub program: String,
    #[serde(default = "default_converter_args")]
    pub args: Vec<String>,
}

fn default_converter_program() -> String {
    "soffice".to_string()
}

fn default_converter_args() -> Vec<String> {
    ["--headless", "--convert-to", "pdf", "--outdir"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: default_converter_program(),
            args: default_converter_args(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Fast model used for first-pass classification and extraction.
    #[serde(default = "default_classify_model")]
    pub classify_model: String,
    /// Capable model reserved for full multi-page bank statement extraction.
    #[serde(default = "default_extract_model")]
    pub extract_model: String,
    /// Character limit applied to text sent with the classification prompt.
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_classify_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_extract_model() -> String {
    "gemini-1.5-pro".to_string()
}

fn default_max_input_chars() -> usize {
    30_000
}

fn default_llm_timeout() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            classify_model: default_classify_model(),
            extract_model: default_extract_model(),
            max_input_chars: default_max_input_chars(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.input_directory.is_empty() {
            return Err(ConfigError::Validation {
                message: "input_directory must not be empty".to_string(),
            });
        }
        if self.output_directory.is_empty() {
            return Err(ConfigError::Validation {
                message: "output_directory must not be empty".to_string(),
            });
        }
        if self.worker_count == 0 {
            return Err(ConfigError::Validation {
                message: "worker_count must be at least 1".to_string(),
            });
        }
        if self.supported_extensions.is_empty() {
            return Err(ConfigError::Validation {
                message: "supported_extensions must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Returns true when `path` carries one of the configured extensions
    /// (case-insensitive).
    pub fn is_supported(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let ext = ext.to_lowercase();
        self.supported_extensions.iter().any(|s| s.eq_ignore_ascii_case(&ext))
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> std::result::Result<Config, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config: Config = serde_json::from_str(&raw)?;
    config.validate()?;
    Ok(config)
}
