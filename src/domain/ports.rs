use crate::domain::model::Good;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

/// 目錄項目的惰性序列
pub type Entries = Box<dyn Iterator<Item = PathBuf> + Send>;

/// 商品記錄的存取：目錄列舉與 load/save。
///
/// 掃描器只透過這個介面碰觸檔案系統，測試可以換成記憶體實作。
pub trait GoodStore: Send + Sync + 'static {
    /// 商店底下的分類目錄
    fn categories(&self, shop: &Path) -> Result<Entries>;

    /// 分類底下的商品記錄
    fn goods(&self, category: &Path) -> Result<Entries>;

    fn load(&self, path: &Path) -> Result<Good>;

    /// 寫回 `good.source`
    fn save(&self, good: &Good) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub client: String,
    pub message: String,
    pub shop: Option<String>,
    pub category: Option<String>,
}

impl LogEntry {
    pub fn new(client: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            message: message.into(),
            shop: None,
            category: None,
        }
    }

    pub fn shop(mut self, shop: impl Into<String>) -> Self {
        self.shop = Some(shop.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// 只能附加、可跨執行緒共享的活動日誌。實作必須保證一行不會被拆開交錯。
pub trait ActivityLog: Send + Sync {
    fn record(&self, entry: &LogEntry);
}
