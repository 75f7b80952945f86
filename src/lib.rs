pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::MarketConfig;

pub use adapters::{FileActivityLog, FsGoodStore, MemoryActivityLog};
pub use crate::core::context::{ScanContext, ScanSettings};
pub use crate::core::engine::{ClientOutcome, ClientRun, MarketScan, ScanCoordinator, ScanReport};
pub use crate::core::purchase::PurchaseDecider;
pub use crate::core::shop::ShopLocation;
pub use domain::model::{Client, Good, PurchaseResult, PurchaseStatus, ShoppingListEntry};
pub use utils::error::{Result, ScanError};
