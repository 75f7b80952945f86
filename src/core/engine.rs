use crate::core::context::{ScanContext, ScanSettings};
use crate::core::purchase::PurchaseDecider;
use crate::core::shop::{ShopLocation, ShopScanner};
use crate::domain::model::{BestGood, Client, PurchaseResult, ScanMessage, Scope};
use crate::domain::ports::{ActivityLog, GoodStore};
use crate::utils::error::{Result, ScanError};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// 一位顧客掃描完所有商店後收到的訊息，依抵達順序保存
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub category_bests: Vec<BestGood>,
    pub shop_bests: Vec<BestGood>,
    pub completed: Vec<Scope>,
}

impl ScanReport {
    fn absorb(&mut self, message: ScanMessage) {
        match message {
            ScanMessage::Best(best) => match best.scope {
                Scope::Category { .. } => self.category_bests.push(best),
                Scope::Shop { .. } => self.shop_bests.push(best),
            },
            ScanMessage::Done(scope) => self.completed.push(scope),
        }
    }

    pub fn completed_shops(&self) -> usize {
        self.completed
            .iter()
            .filter(|s| matches!(s, Scope::Shop { .. }))
            .count()
    }
}

/// 顧客最後要買的商品：每個品名一件，依購物清單順序排列
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientOutcome {
    picks: Vec<BestGood>,
}

impl ClientOutcome {
    pub fn from_picks(picks: Vec<BestGood>) -> Self {
        Self { picks }
    }

    /// 同名商品取分數最高者，同分保留先抵達的
    pub fn from_report(client: &Client, report: &ScanReport) -> Self {
        let mut seen = HashSet::new();
        let mut picks = Vec::new();

        for entry in &client.shopping_list {
            if !seen.insert(entry.item.as_str()) {
                continue;
            }
            let best = report
                .category_bests
                .iter()
                .filter(|b| b.good.name == entry.item)
                .fold(None::<&BestGood>, |best, candidate| match best {
                    Some(b) if candidate.score() <= b.score() => Some(b),
                    _ => Some(candidate),
                });
            if let Some(best) = best {
                picks.push(best.clone());
            }
        }

        Self { picks }
    }

    pub fn picks(&self) -> &[BestGood] {
        &self.picks
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }
}

/// 單一顧客的掃描協調者
pub struct ScanCoordinator<S: GoodStore> {
    ctx: ScanContext<S>,
    shops: Vec<ShopLocation>,
}

impl<S: GoodStore> ScanCoordinator<S> {
    pub fn new(ctx: ScanContext<S>, shops: Vec<ShopLocation>) -> Self {
        Self { ctx, shops }
    }

    /// 每間店一個任務；全部結束後才讀取訊息通道
    pub async fn scan(&self) -> ScanReport {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let client = self.ctx.client().name.clone();

        let mut branches = JoinSet::new();
        for shop in &self.shops {
            let name = shop.name.clone();
            let scanner = ShopScanner::new(self.ctx.clone(), shop.clone());
            let handle = branches.spawn(scanner.scan(tx.clone()));
            self.ctx.log_shop(
                format!(
                    "Client {} created task for {} with id: {}",
                    client,
                    name,
                    handle.id()
                ),
                &name,
            );
        }
        drop(tx);

        while let Some(joined) = branches.join_next().await {
            if let Err(e) = joined {
                tracing::error!("❌ Shop task for {} failed: {}", client, e);
                self.ctx.log(format!("Shop task failed: {}", e));
            }
        }

        let mut report = ScanReport::default();
        while let Some(message) = rx.recv().await {
            tracing::debug!("📨 {}: {}", client, message);
            report.absorb(message);
        }
        tracing::info!(
            "🔎 {}: {} shops scanned, {} category matches",
            client,
            report.completed_shops(),
            report.category_bests.len()
        );

        report
    }
}

/// 一位顧客的完整執行結果
#[derive(Debug)]
pub struct ClientRun {
    pub client: Client,
    pub report: ScanReport,
    pub outcome: ClientOutcome,
    pub result: Result<PurchaseResult>,
}

/// 多位顧客同時掃描同一組商店
pub struct MarketScan<S: GoodStore> {
    store: Arc<S>,
    log: Arc<dyn ActivityLog>,
    shops: Vec<ShopLocation>,
    settings: ScanSettings,
}

impl<S: GoodStore> Clone for MarketScan<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            log: Arc::clone(&self.log),
            shops: self.shops.clone(),
            settings: self.settings,
        }
    }
}

impl<S: GoodStore> MarketScan<S> {
    pub fn new(
        store: Arc<S>,
        log: Arc<dyn ActivityLog>,
        shops: Vec<ShopLocation>,
        settings: ScanSettings,
    ) -> Self {
        Self {
            store,
            log,
            shops,
            settings,
        }
    }

    pub fn context(&self, client: &Client) -> ScanContext<S> {
        ScanContext::new(
            client.clone(),
            Arc::clone(&self.store),
            Arc::clone(&self.log),
            self.settings,
        )
    }

    /// 掃描後交給 PurchaseDecider；決策階段才會修改顧客資料
    pub async fn run_client(&self, mut client: Client) -> ClientRun {
        let ctx = self.context(&client);
        let report = ScanCoordinator::new(ctx.clone(), self.shops.clone())
            .scan()
            .await;
        let outcome = ClientOutcome::from_report(&client, &report);

        let name = client.name.clone();
        let decision_outcome = outcome.clone();
        let decided = tokio::task::spawn_blocking(move || {
            let result = PurchaseDecider::new(ctx).decide(&mut client, &decision_outcome);
            (client, result)
        })
        .await;

        match decided {
            Ok((client, result)) => {
                if let Err(e) = &result {
                    tracing::error!("❌ {}: {}", client.name, e);
                    self.context(&client)
                        .log(format!("Purchase update failed: {}", e));
                }
                ClientRun {
                    client,
                    report,
                    outcome,
                    result,
                }
            }
            Err(e) => ClientRun {
                client: Client::new(name),
                report,
                outcome,
                result: Err(ScanError::TaskError {
                    message: format!("purchase task failed: {}", e),
                }),
            },
        }
    }

    /// 每位顧客一個任務，結果依輸入順序回傳
    pub async fn run_all(&self, clients: Vec<Client>) -> Vec<ClientRun> {
        let mut branches = JoinSet::new();
        for (index, client) in clients.into_iter().enumerate() {
            let market = self.clone();
            tracing::info!("👤 Starting scan for client {}", client.name);
            branches.spawn(async move { (index, market.run_client(client).await) });
        }

        let mut runs = Vec::new();
        while let Some(joined) = branches.join_next().await {
            match joined {
                Ok(run) => runs.push(run),
                Err(e) => tracing::error!("❌ Client task failed: {}", e),
            }
        }
        runs.sort_by_key(|(index, _)| *index);
        runs.into_iter().map(|(_, run)| run).collect()
    }
}
