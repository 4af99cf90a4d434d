use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub authority: AuthorityConfig,
    pub repository: RepositoryConfig,
    pub download: DownloadConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorityConfig {
    /// Identifier column of the authority feed.
    pub id_column: String,
    /// Column naming the accepted identifier a row defers to.
    pub accepted_id_column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Identifier column of the repository-derived taxonomy.
    pub id_column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Base URL of the authority taxonomy API.
    pub api_base_url: String,
    /// Records requested per page.
    pub page_limit: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Example asymmetric edges listed per side of a comparison report.
    pub max_edge_examples: usize,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            id_column: "taxonID".to_string(),
            accepted_id_column: "acceptedTaxonID".to_string(),
        }
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            id_column: "repo_tid".to_string(),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://data.neonscience.org/api/v0/taxonomy".to_string(),
            page_limit: 1000,
            timeout_secs: 60,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            max_edge_examples: 10,
        }
    }
}

pub fn default_config() -> Config {
    Config::default()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, crate::TaxodiffError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| crate::TaxodiffError::Config(format!("Failed to parse config: {}", e)))?;
    Ok(config)
}
