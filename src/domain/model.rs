use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

pub const MAX_RATING: f32 = 5.0;

/// 商品記錄。`score` 不儲存，每次由 `price * rating` 計算，所以不會過期。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Good {
    pub name: String,
    price: u64,
    rating: f32,
    pub quantity: u64,
    pub last_modified: String,
    pub source: PathBuf,
}

impl Good {
    pub fn new(name: impl Into<String>, price: u64, rating: f32, quantity: u64) -> Self {
        Self {
            name: name.into(),
            price,
            rating,
            quantity,
            ..Default::default()
        }
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = source.into();
        self
    }

    pub fn price(&self) -> u64 {
        self.price
    }

    pub fn rating(&self) -> f32 {
        self.rating
    }

    pub fn score(&self) -> f64 {
        self.price as f64 * f64::from(self.rating)
    }

    pub fn set_price(&mut self, price: u64) {
        self.price = price;
    }

    pub fn set_rating(&mut self, rating: f32) {
        self.rating = rating;
    }

    /// 顧客評分與既有評分取平均
    pub fn apply_rating(&mut self, customer_rating: f32) {
        let customer_rating = customer_rating.clamp(0.0, MAX_RATING);
        self.rating = ((customer_rating + self.rating) / 2.0).clamp(0.0, MAX_RATING);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingListEntry {
    pub item: String,
    pub quantity: u64,
    #[serde(default)]
    pub price: u64,
}

impl ShoppingListEntry {
    pub fn new(item: impl Into<String>, quantity: u64) -> Self {
        Self {
            item: item.into(),
            quantity,
            price: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub name: String,
    pub shopping_list: Vec<ShoppingListEntry>,
    pub price_threshold: Option<u64>,
    pub shopped_shops: BTreeSet<String>,
    pub total_price: u64,
}

impl Client {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_item(mut self, item: impl Into<String>, quantity: u64) -> Self {
        self.shopping_list.push(ShoppingListEntry::new(item, quantity));
        self
    }

    pub fn with_threshold(mut self, threshold: u64) -> Self {
        self.price_threshold = Some(threshold);
        self
    }

    pub fn with_shopped_shop(mut self, shop: impl Into<String>) -> Self {
        self.shopped_shops.insert(shop.into());
        self
    }

    pub fn has_shopped_at(&self, shop: &str) -> bool {
        self.shopped_shops.contains(shop)
    }
}

/// 一個最佳結果所屬的範圍
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    Category {
        shop: String,
        category: String,
        path: PathBuf,
    },
    Shop {
        shop: String,
    },
}

impl Scope {
    pub fn shop(&self) -> &str {
        match self {
            Scope::Category { shop, .. } | Scope::Shop { shop } => shop,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Category { shop, category, .. } => write!(f, "{}/{}", shop, category),
            Scope::Shop { shop } => write!(f, "{}", shop),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestGood {
    pub scope: Scope,
    pub good: Good,
}

impl BestGood {
    pub fn score(&self) -> f64 {
        self.good.score()
    }
}

/// 沿著掃描樹往上傳遞的訊息
#[derive(Debug, Clone, PartialEq)]
pub enum ScanMessage {
    Best(BestGood),
    Done(Scope),
}

pub const DONE_SENTINEL: &str = "done";

impl fmt::Display for ScanMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanMessage::Best(best) => write!(
                f,
                "Best Good in {}: {}, Price: {}, Point: {:.2}, Score: {:.2}",
                best.scope,
                best.good.name,
                best.good.price(),
                best.good.rating(),
                best.good.score()
            ),
            ScanMessage::Done(_) => f.write_str(DONE_SENTINEL),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLine {
    pub item: String,
    pub shop: String,
    pub purchased: u64,
    pub total_price: u64,
    pub source: PathBuf,
    /// 核准後寫回的庫存；被拒絕時為 None
    pub remaining: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseResult {
    pub client: String,
    pub status: PurchaseStatus,
    pub subtotal: u64,
    pub total_price: u64,
    pub discount_applied: bool,
    pub lines: Vec<PurchaseLine>,
}

impl PurchaseResult {
    pub fn is_approved(&self) -> bool {
        self.status == PurchaseStatus::Approved
    }
}
