use crate::core::context::ScanContext;
use crate::core::engine::ClientOutcome;
use crate::domain::model::{Client, Good, PurchaseLine, PurchaseResult, PurchaseStatus};
use crate::domain::ports::GoodStore;
use crate::utils::error::{Result, ScanError};
use std::path::Path;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// 掃描結束後的購買決策，只在單一執行緒中執行
pub struct PurchaseDecider<S: GoodStore> {
    ctx: ScanContext<S>,
}

impl<S: GoodStore> PurchaseDecider<S> {
    pub fn new(ctx: ScanContext<S>) -> Self {
        Self { ctx }
    }

    pub fn decide(&self, client: &mut Client, outcome: &ClientOutcome) -> Result<PurchaseResult> {
        let picks = outcome.picks();

        // 價格只寫回實際配對到的那一項
        for pick in picks {
            let list = &mut client.shopping_list;
            let slot = list
                .iter()
                .position(|e| e.item == pick.good.name && e.quantity == pick.good.quantity)
                .or_else(|| list.iter().position(|e| e.item == pick.good.name));
            if let Some(i) = slot {
                list[i].price = pick.good.price();
            }
        }

        let subtotal = picks
            .iter()
            .fold(0u64, |acc, p| acc.saturating_add(p.good.price()));

        // 折扣只看購物清單第一項所配對到的商店
        let discount_applied = client
            .shopping_list
            .first()
            .and_then(|first| picks.iter().find(|p| p.good.name == first.item))
            .map(|pick| client.has_shopped_at(pick.scope.shop()))
            .unwrap_or(false);
        let total_price = if discount_applied {
            apply_discount(subtotal, self.ctx.settings().discount_percent)
        } else {
            subtotal
        };
        self.ctx.log(format!(
            "Total price for client {} is {}{}",
            client.name,
            total_price,
            if discount_applied { " (returning customer discount)" } else { "" }
        ));

        let mut lines: Vec<PurchaseLine> = picks
            .iter()
            .map(|pick| PurchaseLine {
                item: pick.good.name.clone(),
                shop: pick.scope.shop().to_string(),
                purchased: pick.good.quantity,
                total_price: pick.good.price(),
                source: pick.good.source.clone(),
                remaining: None,
            })
            .collect();

        if let Some(threshold) = client.price_threshold {
            if total_price > threshold {
                self.ctx.log(format!(
                    "Total price {} exceeds client's price threshold of {}. No purchase made.",
                    total_price, threshold
                ));
                tracing::info!("🛑 {}: purchase rejected ({} > {})", client.name, total_price, threshold);
                return Ok(PurchaseResult {
                    client: client.name.clone(),
                    status: PurchaseStatus::Rejected,
                    subtotal,
                    total_price,
                    discount_applied,
                    lines,
                });
            }
            self.ctx.log(format!(
                "Total price {} is within client's price threshold of {}. Proceeding with purchase.",
                total_price, threshold
            ));
        } else {
            self.ctx.log(format!(
                "No price threshold set. Proceeding with purchase of {}.",
                total_price
            ));
        }

        for line in lines.iter_mut() {
            let remaining = self.decrement_stock(&line.source, line.purchased)?;
            line.remaining = Some(remaining);
            client.shopped_shops.insert(line.shop.clone());
        }
        client.total_price = client.total_price.saturating_add(total_price);
        tracing::info!("✅ {}: purchase approved, total {}", client.name, total_price);

        Ok(PurchaseResult {
            client: client.name.clone(),
            status: PurchaseStatus::Approved,
            subtotal,
            total_price,
            discount_applied,
            lines,
        })
    }

    /// 重新讀取記錄、扣庫存並寫回；任何 I/O 失敗都是致命錯誤
    fn decrement_stock(&self, source: &Path, purchased: u64) -> Result<u64> {
        let mut stored = self.ctx.store().load(source).map_err(|e| fatal(source, e))?;
        if stored.quantity < purchased {
            tracing::warn!(
                "⚠️ Stock for {} dropped to {} before purchase of {}",
                stored.name,
                stored.quantity,
                purchased
            );
        }
        stored.quantity = stored.quantity.saturating_sub(purchased);
        stored.last_modified = timestamp();
        self.ctx.store().save(&stored).map_err(|e| fatal(source, e))?;

        self.ctx.log(format!(
            "Goods amount updated for {}: {} left",
            stored.name, stored.quantity
        ));
        Ok(stored.quantity)
    }

    /// 把顧客評分併入記錄並寫回
    pub fn rate(&self, source: &Path, customer_rating: f32) -> Result<Good> {
        let mut stored = self.ctx.store().load(source).map_err(|e| fatal(source, e))?;
        stored.apply_rating(customer_rating);
        stored.last_modified = timestamp();
        self.ctx.store().save(&stored).map_err(|e| fatal(source, e))?;

        self.ctx.log(format!(
            "Updated file for good {} with new point {:.2}",
            stored.name,
            stored.rating()
        ));
        Ok(stored)
    }
}

pub fn apply_discount(subtotal: u64, discount_percent: u8) -> u64 {
    let keep = 100 - u64::from(discount_percent.min(100));
    subtotal.saturating_mul(keep) / 100
}

fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

fn fatal(path: &Path, err: ScanError) -> ScanError {
    let source = match err {
        ScanError::IoError(io) => io,
        other => std::io::Error::other(other.to_string()),
    };
    ScanError::FatalUpdate {
        path: path.to_path_buf(),
        source,
    }
}
