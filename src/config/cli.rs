use crate::config::toml_config::{LoggingSection, MarketConfig, PurchaseSection, ScanSection};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "market-scan")]
#[command(about = "Scan shops concurrently for the best goods on each client's shopping list")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Directory holding the shop directories
    #[arg(long)]
    pub root: Option<String>,

    #[arg(long, value_delimiter = ',')]
    pub shops: Vec<String>,

    /// Directory for the per-client activity logs
    #[arg(long)]
    pub log_dir: Option<String>,

    /// Matchers allowed in flight per category
    #[arg(long)]
    pub max_in_flight: Option<usize>,

    /// Returning-customer discount in percent
    #[arg(long)]
    pub discount_percent: Option<u8>,

    #[arg(long, help = "Read clients from the terminal")]
    pub interactive: bool,

    #[arg(long, help = "Ask for a rating of each purchased good")]
    pub rate: bool,

    #[arg(long, help = "Print purchase results as JSON")]
    pub json: bool,

    #[arg(long, help = "Emit diagnostics as JSON lines")]
    pub json_logs: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// 載入設定檔 (若有)，套用命令列覆蓋後驗證
    pub fn resolve(&self) -> Result<MarketConfig> {
        let mut config = match &self.config {
            Some(path) => MarketConfig::from_file(path)?,
            None => MarketConfig::default(),
        };

        if let Some(root) = &self.root {
            config.market.root = Some(root.clone());
        }
        if !self.shops.is_empty() {
            config.market.shops = self.shops.clone();
        }
        if let Some(max_in_flight) = self.max_in_flight {
            config.scan.get_or_insert_with(ScanSection::default).max_in_flight = Some(max_in_flight);
        }
        if let Some(discount) = self.discount_percent {
            config
                .purchase
                .get_or_insert_with(PurchaseSection::default)
                .discount_percent = Some(discount);
        }
        if let Some(dir) = &self.log_dir {
            config.logging.get_or_insert_with(LoggingSection::default).log_dir = Some(dir.clone());
        }
        if self.json_logs {
            config.logging.get_or_insert_with(LoggingSection::default).json = Some(true);
        }

        config.validate()?;
        Ok(config)
    }
}
