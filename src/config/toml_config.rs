use crate::core::context::{ScanSettings, DEFAULT_DISCOUNT_PERCENT, DEFAULT_MAX_IN_FLIGHT};
use crate::core::shop::ShopLocation;
use crate::domain::model::{Client, ShoppingListEntry};
use crate::utils::error::{Result, ScanError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_SHOPS: [&str; 3] = ["Store1", "Store2", "Store3"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    pub market: MarketSection,
    pub scan: Option<ScanSection>,
    pub purchase: Option<PurchaseSection>,
    pub logging: Option<LoggingSection>,
    #[serde(default)]
    pub clients: Vec<ClientConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSection {
    pub root: Option<String>,
    #[serde(default)]
    pub shops: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanSection {
    pub max_in_flight: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurchaseSection {
    pub discount_percent: Option<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSection {
    pub log_dir: Option<String>,
    pub json: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub name: String,
    #[serde(default)]
    pub items: Vec<ItemConfig>,
    pub price_threshold: Option<u64>,
    #[serde(default)]
    pub shopped_shops: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemConfig {
    pub item: String,
    pub quantity: u64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            market: MarketSection {
                root: Some(".".to_string()),
                shops: DEFAULT_SHOPS.iter().map(|s| s.to_string()).collect(),
            },
            scan: None,
            purchase: None,
            logging: None,
            clients: Vec::new(),
        }
    }
}

impl MarketConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ScanError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ScanError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MARKET_ROOT})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ScanError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn root(&self) -> PathBuf {
        PathBuf::from(self.market.root.as_deref().unwrap_or("."))
    }

    pub fn shops(&self) -> Vec<ShopLocation> {
        let root = self.root();
        self.market
            .shops
            .iter()
            .map(|name| ShopLocation::new(name, root.join(name)))
            .collect()
    }

    pub fn settings(&self) -> ScanSettings {
        ScanSettings {
            max_in_flight: self
                .scan
                .as_ref()
                .and_then(|s| s.max_in_flight)
                .unwrap_or(DEFAULT_MAX_IN_FLIGHT),
            discount_percent: self
                .purchase
                .as_ref()
                .and_then(|p| p.discount_percent)
                .unwrap_or(DEFAULT_DISCOUNT_PERCENT),
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(
            self.logging
                .as_ref()
                .and_then(|l| l.log_dir.as_deref())
                .unwrap_or("."),
        )
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    pub fn clients(&self) -> Vec<Client> {
        self.clients.iter().map(ClientConfig::to_client).collect()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        let root = validation::validate_required_field("market.root", &self.market.root)?;
        validation::validate_path("market.root", root)?;

        if self.market.shops.is_empty() {
            return Err(ScanError::MissingConfigError {
                field: "market.shops".to_string(),
            });
        }
        for shop in &self.market.shops {
            validation::validate_plain_name("market.shops", shop)?;
        }
        validation::validate_unique("market.shops", &self.market.shops)?;

        let settings = self.settings();
        validation::validate_positive_number("scan.max_in_flight", settings.max_in_flight, 1)?;
        validation::validate_range("purchase.discount_percent", settings.discount_percent, 0, 100)?;

        if let Some(dir) = self.logging.as_ref().and_then(|l| l.log_dir.as_deref()) {
            validation::validate_path("logging.log_dir", dir)?;
        }

        for client in &self.clients {
            client.validate()?;
        }
        let names: Vec<String> = self.clients.iter().map(|c| c.name.clone()).collect();
        validation::validate_unique("clients.name", &names)?;

        Ok(())
    }
}

impl Validate for MarketConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

impl ClientConfig {
    pub fn to_client(&self) -> Client {
        Client {
            name: self.name.clone(),
            shopping_list: self
                .items
                .iter()
                .map(|i| ShoppingListEntry::new(&i.item, i.quantity))
                .collect(),
            price_threshold: self.price_threshold,
            shopped_shops: self.shopped_shops.iter().cloned().collect(),
            total_price: 0,
        }
    }
}

impl Validate for ClientConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_plain_name("clients.name", &self.name)?;
        for item in &self.items {
            validation::validate_non_empty_string("clients.items.item", &item.item)?;
            if item.item.contains(char::is_whitespace) {
                return Err(ScanError::InvalidConfigValueError {
                    field: "clients.items.item".to_string(),
                    value: item.item.clone(),
                    reason: "Item names are single tokens".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = r#"
[market]
root = "/srv/market"
shops = ["Store1", "Store2"]

[scan]
max_in_flight = 2

[purchase]
discount_percent = 15

[logging]
log_dir = "/var/log/market"

[[clients]]
name = "john"
price_threshold = 650
shopped_shops = ["Store2"]
items = [
    { item = "lamp", quantity = 1 },
    { item = "computer", quantity = 1 },
]
"#;

    #[test]
    fn test_parse_basic_toml_config() {
        let config = MarketConfig::from_toml_str(BASIC).unwrap();
        assert!(config.validate().is_ok());

        let shops = config.shops();
        assert_eq!(shops[1], ShopLocation::new("Store2", "/srv/market/Store2"));
        assert_eq!(
            config.settings(),
            ScanSettings {
                max_in_flight: 2,
                discount_percent: 15
            }
        );
        assert_eq!(config.log_dir(), PathBuf::from("/var/log/market"));

        let clients = config.clients();
        assert_eq!(clients[0].shopping_list.len(), 2);
        assert_eq!(clients[0].price_threshold, Some(650));
        assert!(clients[0].has_shopped_at("Store2"));
    }

    #[test]
    fn test_defaults() {
        let config = MarketConfig::from_toml_str("[market]\nroot = \"data\"\nshops = [\"A\"]\n").unwrap();
        assert_eq!(config.settings(), ScanSettings::default());
        assert_eq!(config.log_dir(), PathBuf::from("."));
        assert!(config.clients().is_empty());

        let default = MarketConfig::default();
        assert_eq!(default.shops().len(), 3);
        assert!(default.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("MARKET_SCAN_TEST_ROOT", "/tmp/market-test");
        let config = MarketConfig::from_toml_str(
            "[market]\nroot = \"${MARKET_SCAN_TEST_ROOT}\"\nshops = [\"S\"]\n",
        )
        .unwrap();
        assert_eq!(config.root(), PathBuf::from("/tmp/market-test"));

        let untouched = MarketConfig::from_toml_str(
            "[market]\nroot = \"${MARKET_SCAN_UNSET_VAR}\"\nshops = [\"S\"]\n",
        )
        .unwrap();
        assert_eq!(untouched.root(), PathBuf::from("${MARKET_SCAN_UNSET_VAR}"));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = MarketConfig::from_toml_str(BASIC).unwrap();
        config.scan = Some(ScanSection {
            max_in_flight: Some(0),
        });
        assert!(config.validate().is_err());

        let mut config = MarketConfig::from_toml_str(BASIC).unwrap();
        config.market.shops.push("Store1".to_string());
        assert!(config.validate().is_err());

        let mut config = MarketConfig::from_toml_str(BASIC).unwrap();
        config.market.shops.clear();
        assert!(matches!(
            config.validate(),
            Err(ScanError::MissingConfigError { .. })
        ));

        let mut config = MarketConfig::from_toml_str(BASIC).unwrap();
        config.clients[0].items[0].item = "desk lamp".to_string();
        assert!(config.validate().is_err());

        assert!(MarketConfig::from_toml_str("[market\nroot=").is_err());
    }
}
