use crate::adapters::accepted_papers::DEFAULT_ACCEPTED_PAPERS_URL;
use crate::adapters::dblp::DEFAULT_DBLP_ENDPOINT;
use crate::adapters::sink::SUPPORTED_FORMATS;
use crate::core::executor::DEFAULT_CONCURRENCY;
use crate::core::identifier::MAX_BATCH_SIZE;
use crate::domain::model::VenueTag;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{HarvestError, Result};
use crate::utils::validation::{
    validate_formats, validate_path, validate_range, validate_url, validate_url_template, Validate,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_SEMANTIC_SCHOLAR_ENDPOINT: &str = "https://api.semanticscholar.org";
pub const DEFAULT_OUTPUT_PATH: &str = "./dataset";

static ENV_VAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("Failed to compile env var regex"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub run: RunConfig,
    pub sources: SourcesConfig,
    pub resolve: ResolveConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub venue: VenueTag,
    pub year: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub dblp_endpoint: String,
    pub semantic_scholar_endpoint: String,
    pub semantic_scholar_api_key: Option<String>,
    pub accepted_papers_url: String,
    pub request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    pub concurrency: usize,
    pub batch_size: usize,
    pub prefer_scrape: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
    pub formats: Vec<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            venue: VenueTag::Usenix,
            year: 2024,
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            dblp_endpoint: DEFAULT_DBLP_ENDPOINT.to_string(),
            semantic_scholar_endpoint: DEFAULT_SEMANTIC_SCHOLAR_ENDPOINT.to_string(),
            semantic_scholar_api_key: None,
            accepted_papers_url: DEFAULT_ACCEPTED_PAPERS_URL.to_string(),
            request_timeout_seconds: None,
        }
    }
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            batch_size: MAX_BATCH_SIZE,
            prefer_scrape: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_OUTPUT_PATH.to_string(),
            formats: vec!["jsonl".to_string()],
        }
    }
}

impl HarvestConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| HarvestError::ConfigParse {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// 替換環境變數 (例如 ${S2_API_KEY})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_range("run.year", self.run.year, 1980, 2100)?;
        validate_url("sources.dblp_endpoint", &self.sources.dblp_endpoint)?;
        validate_url(
            "sources.semantic_scholar_endpoint",
            &self.sources.semantic_scholar_endpoint,
        )?;
        validate_url_template("sources.accepted_papers_url", &self.sources.accepted_papers_url)?;
        if let Some(timeout) = self.sources.request_timeout_seconds {
            validate_range("sources.request_timeout_seconds", timeout, 1, 3600)?;
        }
        validate_range("resolve.concurrency", self.resolve.concurrency, 1, 64)?;
        validate_range("resolve.batch_size", self.resolve.batch_size, 1, MAX_BATCH_SIZE)?;
        validate_path("output.path", &self.output.path)?;
        validate_formats("output.formats", &self.output.formats, &SUPPORTED_FORMATS)?;
        Ok(())
    }
}

impl ConfigProvider for HarvestConfig {
    fn venue(&self) -> VenueTag {
        self.run.venue
    }

    fn year(&self) -> u16 {
        self.run.year
    }

    fn dblp_endpoint(&self) -> &str {
        &self.sources.dblp_endpoint
    }

    fn semantic_scholar_endpoint(&self) -> &str {
        &self.sources.semantic_scholar_endpoint
    }

    fn semantic_scholar_api_key(&self) -> Option<&str> {
        // 未替換的 ${VAR} 視為沒有設定
        self.sources
            .semantic_scholar_api_key
            .as_deref()
            .filter(|key| !key.is_empty() && !key.starts_with("${"))
    }

    fn accepted_papers_url(&self) -> &str {
        &self.sources.accepted_papers_url
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn output_formats(&self) -> &[String] {
        &self.output.formats
    }

    fn concurrency(&self) -> usize {
        self.resolve.concurrency
    }

    fn batch_size(&self) -> usize {
        self.resolve.batch_size
    }

    fn prefer_scrape(&self) -> bool {
        self.resolve.prefer_scrape
    }

    fn request_timeout_seconds(&self) -> Option<u64> {
        self.sources.request_timeout_seconds
    }
}

impl Validate for HarvestConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
