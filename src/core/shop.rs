use crate::core::category::CategoryScanner;
use crate::core::context::ScanContext;
use crate::domain::model::{BestGood, ScanMessage, Scope};
use crate::domain::ports::GoodStore;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// 商店名稱與其目錄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopLocation {
    pub name: String,
    pub dir: PathBuf,
}

impl ShopLocation {
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
        }
    }
}

pub struct ShopScanner<S: GoodStore> {
    ctx: ScanContext<S>,
    shop: ShopLocation,
}

impl<S: GoodStore> ShopScanner<S> {
    pub fn new(ctx: ScanContext<S>, shop: ShopLocation) -> Self {
        Self { ctx, shop }
    }

    /// 每個分類一個任務，全部結束後回傳整間店的最佳商品。
    ///
    /// 分類的訊息直接轉交給上層；本層另外送出商店層級的最佳結果與 `done`。
    pub async fn scan(self, tx: mpsc::UnboundedSender<ScanMessage>) -> Option<BestGood> {
        let name = self.shop.name.clone();
        self.ctx
            .log_shop(format!("Accessed Store {}", name), &name);

        let best = self.scan_categories(&tx).await;

        if let Some(best) = &best {
            self.ctx.log_shop(
                format!(
                    "Best Good in Store {}: {}, Price: {}, Point: {:.2}, Score: {:.2}",
                    name,
                    best.good.name,
                    best.good.price(),
                    best.good.rating(),
                    best.score()
                ),
                &name,
            );
            let _ = tx.send(ScanMessage::Best(best.clone()));
        }
        let _ = tx.send(ScanMessage::Done(Scope::Shop { shop: name }));

        best
    }

    async fn scan_categories(&self, tx: &mpsc::UnboundedSender<ScanMessage>) -> Option<BestGood> {
        let name = &self.shop.name;
        let categories = match self.ctx.store().categories(&self.shop.dir) {
            Ok(categories) => categories,
            Err(e) => {
                tracing::warn!("⚠️ Cannot open shop {}: {}", self.shop.dir.display(), e);
                self.ctx.log_shop(
                    format!("Error opening shop directory: {}", self.shop.dir.display()),
                    name,
                );
                return None;
            }
        };

        let mut branches = JoinSet::new();
        for path in categories {
            let scanner = CategoryScanner::new(self.ctx.clone(), name.clone(), path.clone());
            let handle = branches.spawn(scanner.scan(tx.clone()));
            self.ctx.log_shop(
                format!("Task {} created for category {}", handle.id(), path.display()),
                name,
            );
        }
        tracing::debug!("🏬 {}: waiting for {} categories", name, branches.len());

        // 匯合：等所有分類結束，失敗的分支不影響其他分支
        let mut best: Option<BestGood> = None;
        while let Some(joined) = branches.join_next().await {
            match joined {
                Ok(Some(candidate)) => {
                    if best
                        .as_ref()
                        .map_or(true, |b| candidate.score() > b.score())
                    {
                        best = Some(candidate);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!("❌ Category task in {} failed: {}", name, e);
                    self.ctx
                        .log_shop(format!("Category task failed: {}", e), name);
                }
            }
        }

        best.map(|b| BestGood {
            scope: Scope::Shop { shop: name.clone() },
            good: b.good,
        })
    }
}
