use crate::config::toml_config::HarvestConfig;
use crate::domain::model::VenueTag;
use crate::utils::error::{HarvestError, Result};
use clap::Parser;

/// Command line of `paper-harvest`. Flags override values from `--config`.
#[derive(Debug, Clone, Parser)]
#[command(name = "paper-harvest")]
#[command(about = "Harvest abstracts of security conference papers into a dataset")]
pub struct CliConfig {
    /// Venue to harvest: sp, ndss, uss or ccs (default uss)
    #[arg(long)]
    pub venue: Option<VenueTag>,

    /// Conference year
    #[arg(long)]
    pub year: Option<u16>,

    /// Maximum number of papers resolved at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    #[arg(long)]
    pub output_path: Option<String>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output format (jsonl or csv); repeat for both
    #[arg(long = "format")]
    pub formats: Vec<String>,

    /// Scrape every venue page by page instead of using batch lookups
    #[arg(long)]
    pub prefer_scrape: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage after each phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

impl CliConfig {
    /// 載入 TOML（若有指定）並套用命令列覆蓋
    pub fn load(&self) -> Result<HarvestConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path);
                HarvestConfig::from_file(path).map_err(|e| match e {
                    HarvestError::Io(io) => HarvestError::ConfigParse {
                        field: path.clone(),
                        message: io.to_string(),
                    },
                    other => other,
                })?
            }
            None => HarvestConfig::default(),
        };

        if let Some(venue) = self.venue {
            config.run.venue = venue;
        }
        if let Some(year) = self.year {
            config.run.year = year;
        }
        if let Some(concurrency) = self.concurrency {
            config.resolve.concurrency = concurrency;
        }
        if let Some(output_path) = &self.output_path {
            config.output.path = output_path.clone();
        }
        if !self.formats.is_empty() {
            config.output.formats = self.formats.clone();
        }
        if self.prefer_scrape {
            config.resolve.prefer_scrape = true;
        }

        Ok(config)
    }
}
