use crate::domain::model::Client;
use crate::domain::ports::{ActivityLog, GoodStore, LogEntry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DEFAULT_MAX_IN_FLIGHT: usize = 1;
pub const DEFAULT_DISCOUNT_PERCENT: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSettings {
    /// 每個分類同時執行的 matcher 數量上限
    pub max_in_flight: usize,
    /// 回頭客折扣，10 代表總價乘以 0.9
    pub discount_percent: u8,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            discount_percent: DEFAULT_DISCOUNT_PERCENT,
        }
    }
}

/// 一位顧客掃描期間共用的環境，複製後交給每個分支。
///
/// 顧客資料在掃描期間只讀；累計總價等欄位只在所有分支結束後才會修改。
pub struct ScanContext<S: GoodStore> {
    client: Arc<Client>,
    store: Arc<S>,
    log: Arc<dyn ActivityLog>,
    settings: ScanSettings,
}

impl<S: GoodStore> Clone for ScanContext<S> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            store: Arc::clone(&self.store),
            log: Arc::clone(&self.log),
            settings: self.settings,
        }
    }
}

impl<S: GoodStore> ScanContext<S> {
    pub fn new(
        client: Client,
        store: Arc<S>,
        log: Arc<dyn ActivityLog>,
        settings: ScanSettings,
    ) -> Self {
        Self {
            client: Arc::new(client),
            store,
            log,
            settings,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> ScanSettings {
        self.settings
    }

    pub fn log(&self, message: impl Into<String>) {
        self.log.record(&LogEntry::new(&self.client.name, message));
    }

    pub fn log_shop(&self, message: impl Into<String>, shop: &str) {
        self.log
            .record(&LogEntry::new(&self.client.name, message).shop(shop));
    }

    pub fn log_category(&self, message: impl Into<String>, shop: &str, category: &str) {
        self.log.record(
            &LogEntry::new(&self.client.name, message)
                .shop(shop)
                .category(category),
        );
    }
}
