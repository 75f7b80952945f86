use crate::core::context::ScanContext;
use crate::core::matcher::GoodMatcher;
use crate::domain::model::{BestGood, Good, ScanMessage, Scope};
use crate::domain::ports::GoodStore;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

/// 掃描單一分類下的所有商品
pub struct CategoryScanner<S: GoodStore> {
    ctx: ScanContext<S>,
    shop: String,
    category: String,
    path: PathBuf,
}

impl<S: GoodStore> CategoryScanner<S> {
    pub fn new(ctx: ScanContext<S>, shop: impl Into<String>, path: PathBuf) -> Self {
        let category = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            ctx,
            shop: shop.into(),
            category,
            path,
        }
    }

    fn scope(&self) -> Scope {
        Scope::Category {
            shop: self.shop.clone(),
            category: self.category.clone(),
            path: self.path.clone(),
        }
    }

    /// 回傳分類內分數最高的可購買商品，並把結果與 `done` 送往上層。
    pub async fn scan(self, tx: mpsc::UnboundedSender<ScanMessage>) -> Option<BestGood> {
        let scope = self.scope();
        let label = scope.to_string();
        let best = self.scan_goods(&label).await;

        if let Some(best) = &best {
            self.ctx.log_category(
                format!(
                    "Best Good in Category {}: {}, Price: {}, Point: {:.2}, Score: {:.2}",
                    label,
                    best.good.name,
                    best.good.price(),
                    best.good.rating(),
                    best.score()
                ),
                &self.shop,
                &label,
            );
            let _ = tx.send(ScanMessage::Best(best.clone()));
        }
        let _ = tx.send(ScanMessage::Done(scope));

        best
    }

    async fn scan_goods(&self, label: &str) -> Option<BestGood> {
        let entries = match self.ctx.store().goods(&self.path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("⚠️ Cannot open category {}: {}", self.path.display(), e);
                self.ctx.log_category(
                    format!("Error opening category directory: {}", self.path.display()),
                    &self.shop,
                    label,
                );
                return None;
            }
        };

        // 完成閘門：每派出一個 matcher 拿一張許可，matcher 結束才歸還
        let gate = Arc::new(Semaphore::new(self.ctx.settings().max_in_flight.max(1)));
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Option<Good>>();
        let mut matchers = JoinSet::new();

        for good_path in entries {
            let Ok(permit) = Arc::clone(&gate).acquire_owned().await else {
                break;
            };

            let ctx = self.ctx.clone();
            let done_tx = done_tx.clone();
            let shop = self.shop.clone();
            let label = label.to_string();
            matchers.spawn_blocking(move || {
                let matched = match ctx.store().load(&good_path) {
                    Ok(mut good) => GoodMatcher::run(&ctx, &mut good, &shop, &label)
                        .is_eligible()
                        .then_some(good),
                    Err(e) => {
                        tracing::warn!("⚠️ Cannot read good {}: {}", good_path.display(), e);
                        ctx.log_category(
                            format!("Error opening good file: {}", good_path.display()),
                            &shop,
                            &label,
                        );
                        None
                    }
                };
                let _ = done_tx.send(matched);
                drop(permit);
            });
            tracing::debug!("Dispatched matcher for {} in {}", self.category, self.shop);
        }
        drop(done_tx);

        while let Some(joined) = matchers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("❌ Matcher task in {} failed: {}", label, e);
            }
        }

        // 依完成順序比較，同分時保留先到的
        let mut best: Option<Good> = None;
        while let Some(matched) = done_rx.recv().await {
            if let Some(good) = matched {
                if best.as_ref().map_or(true, |b| good.score() > b.score()) {
                    best = Some(good);
                }
            }
        }

        best.map(|good| BestGood {
            scope: self.scope(),
            good,
        })
    }
}
