use market_scan::{
    Client, FileActivityLog, FsGoodStore, MarketScan, MemoryActivityLog, PurchaseStatus,
    ScanError, ScanSettings, ShopLocation,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn write_good(root: &Path, shop: &str, category: &str, name: &str, body: &str) -> PathBuf {
    let dir = root.join(shop).join(category);
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{}.txt", name));
    fs::write(&path, body).unwrap();
    path
}

fn shops(root: &Path, names: &[&str]) -> Vec<ShopLocation> {
    names
        .iter()
        .map(|n| ShopLocation::new(*n, root.join(n)))
        .collect()
}

fn market(root: &Path, names: &[&str]) -> (MarketScan<FsGoodStore>, Arc<MemoryActivityLog>) {
    let log = Arc::new(MemoryActivityLog::new());
    let market = MarketScan::new(
        Arc::new(FsGoodStore::new()),
        log.clone(),
        shops(root, names),
        ScanSettings::default(),
    );
    (market, log)
}

const LAMP: &str = "Name: lamp\nPrice: 100\nScore: 4.0\nEntity: 5\nLast Modified: 2024-05-01T10:00:00\n";

#[tokio::test]
async fn test_scenario_a_match_approve_and_decrement() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_good(temp_dir.path(), "Store1", "lights", "lamp", LAMP);
    let (market, _log) = market(temp_dir.path(), &["Store1"]);

    let run = market
        .run_client(Client::new("john").with_item("lamp", 1))
        .await;
    let result = run.result.unwrap();

    assert_eq!(result.status, PurchaseStatus::Approved);
    assert_eq!(result.total_price, 100);
    assert_eq!(result.lines[0].remaining, Some(4));

    let record = fs::read_to_string(&path).unwrap();
    assert!(record.contains("Entity: 4"));
    assert!(record.contains("Price: 100"));
    assert!(!record.contains("2024-05-01T10:00:00"));
    assert_eq!(run.client.total_price, 100);
    assert!(run.client.has_shopped_at("Store1"));
}

#[tokio::test]
async fn test_scenario_b_out_of_stock_is_not_purchased() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_good(
        temp_dir.path(),
        "Store1",
        "lights",
        "lamp",
        "Name: lamp\nPrice: 100\nScore: 4.0\nEntity: 0\n",
    );
    let (market, log) = market(temp_dir.path(), &["Store1"]);

    let run = market
        .run_client(Client::new("john").with_item("lamp", 1))
        .await;
    let result = run.result.unwrap();

    assert!(run.outcome.is_empty());
    assert!(result.lines.is_empty());
    assert_eq!(result.total_price, 0);
    assert!(fs::read_to_string(&path).unwrap().contains("Entity: 0"));
    assert!(log
        .messages()
        .contains(&"Not enough entity for good lamp. Required: 1, Available: 0".to_string()));
}

#[tokio::test]
async fn test_scenario_c_threshold_rejects() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_good(temp_dir.path(), "Store1", "lights", "lamp", LAMP);
    let (market, _log) = market(temp_dir.path(), &["Store1"]);

    let run = market
        .run_client(Client::new("john").with_item("lamp", 1).with_threshold(50))
        .await;
    let result = run.result.unwrap();

    assert_eq!(result.status, PurchaseStatus::Rejected);
    assert_eq!(result.total_price, 100);
    assert_eq!(fs::read_to_string(&path).unwrap(), LAMP);
}

#[tokio::test]
async fn test_scenario_d_shop_best_across_categories() {
    let temp_dir = TempDir::new().unwrap();
    write_good(
        temp_dir.path(),
        "Store1",
        "lights",
        "lamp",
        "Name: lamp\nPrice: 10\nScore: 2.0\nEntity: 3\n",
    );
    write_good(
        temp_dir.path(),
        "Store1",
        "office",
        "desk",
        "Name: desk\nPrice: 7\nScore: 5.0\nEntity: 3\n",
    );
    let (market, _log) = market(temp_dir.path(), &["Store1"]);

    let run = market
        .run_client(Client::new("john").with_item("lamp", 1).with_item("desk", 1))
        .await;

    assert_eq!(run.report.shop_bests.len(), 1);
    assert_eq!(run.report.shop_bests[0].good.name, "desk");
    assert_eq!(run.report.shop_bests[0].score(), 35.0);

    let mut category_scores: Vec<f64> = run.report.category_bests.iter().map(|b| b.score()).collect();
    category_scores.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(category_scores, vec![20.0, 35.0]);
    assert_eq!(run.result.unwrap().total_price, 17);
}

#[tokio::test]
async fn test_scenario_e_returning_customer_discount() {
    let temp_dir = TempDir::new().unwrap();
    write_good(temp_dir.path(), "Store2", "lights", "lamp", LAMP);
    let (market, _log) = market(temp_dir.path(), &["Store1", "Store2"]);

    let run = market
        .run_client(
            Client::new("john")
                .with_item("lamp", 1)
                .with_shopped_shop("Store2"),
        )
        .await;
    let result = run.result.unwrap();

    assert!(result.discount_applied);
    assert_eq!(result.subtotal, 100);
    assert_eq!(result.total_price, 90);
    assert!(result.is_approved());
}

#[tokio::test]
async fn test_missing_shop_does_not_block_siblings() {
    let temp_dir = TempDir::new().unwrap();
    write_good(temp_dir.path(), "Store1", "lights", "lamp", LAMP);
    let (market, log) = market(temp_dir.path(), &["Store1", "Ghost"]);

    let run = market
        .run_client(Client::new("john").with_item("lamp", 2))
        .await;

    assert_eq!(run.report.completed_shops(), 2);
    assert_eq!(run.result.unwrap().total_price, 200);
    assert!(log
        .messages()
        .iter()
        .any(|m| m.starts_with("Error opening shop directory")));
}

#[tokio::test]
async fn test_best_across_shops_wins() {
    let temp_dir = TempDir::new().unwrap();
    let cheap = write_good(
        temp_dir.path(),
        "Store1",
        "lights",
        "lamp",
        "Name: lamp\nPrice: 80\nScore: 3.0\nEntity: 5\n",
    );
    let rated = write_good(temp_dir.path(), "Store2", "lights", "lamp", LAMP);
    let (market, _log) = market(temp_dir.path(), &["Store1", "Store2"]);

    let run = market
        .run_client(Client::new("john").with_item("lamp", 1))
        .await;
    let result = run.result.unwrap();

    assert_eq!(result.lines.len(), 1);
    assert_eq!(result.lines[0].shop, "Store2");
    assert!(fs::read_to_string(&rated).unwrap().contains("Entity: 4"));
    assert!(fs::read_to_string(&cheap).unwrap().contains("Entity: 5"));
}

#[tokio::test]
async fn test_empty_shopping_list_approves_zero() {
    let temp_dir = TempDir::new().unwrap();
    write_good(temp_dir.path(), "Store1", "lights", "lamp", LAMP);
    let (market, _log) = market(temp_dir.path(), &["Store1"]);

    let run = market.run_client(Client::new("john").with_threshold(0)).await;
    let result = run.result.unwrap();

    assert!(run.report.category_bests.is_empty());
    assert!(result.is_approved());
    assert_eq!(result.total_price, 0);
}

#[tokio::test]
async fn test_parallel_matchers_give_same_best() {
    let temp_dir = TempDir::new().unwrap();
    for (i, price) in [10u64, 40, 30, 20].iter().enumerate() {
        write_good(
            temp_dir.path(),
            "Store1",
            "misc",
            &format!("item{}", i),
            &format!("Name: item{}\nPrice: {}\nScore: 1.0\nEntity: 1\n", i, price),
        );
    }
    let log = Arc::new(MemoryActivityLog::new());
    let market = MarketScan::new(
        Arc::new(FsGoodStore::new()),
        log,
        shops(temp_dir.path(), &["Store1"]),
        ScanSettings {
            max_in_flight: 4,
            ..Default::default()
        },
    );

    let client = (0..4).fold(Client::new("john"), |c, i| c.with_item(format!("item{}", i), 1));
    let run = market.run_client(client).await;

    assert_eq!(run.report.shop_bests[0].good.name, "item1");
    assert_eq!(run.result.unwrap().total_price, 100);
}

#[tokio::test]
async fn test_clients_write_separate_logs() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("market");
    write_good(&root, "Store1", "lights", "lamp", LAMP);
    let log = Arc::new(FileActivityLog::new(temp_dir.path().join("logs")).unwrap());
    let market = MarketScan::new(
        Arc::new(FsGoodStore::new()),
        log.clone(),
        shops(&root, &["Store1"]),
        ScanSettings::default(),
    );

    let runs = market
        .run_all(vec![
            Client::new("alice").with_item("lamp", 1),
            Client::new("bob").with_item("desk", 1),
        ])
        .await;

    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].client.name, "alice");
    assert_eq!(runs[1].client.name, "bob");

    let alice = fs::read_to_string(log.path_for("alice")).unwrap();
    let bob = fs::read_to_string(log.path_for("bob")).unwrap();
    assert!(alice.contains("Processed good lamp with total price 100 for amount 1"));
    assert!(bob.contains("Good lamp not in client's shopping list"));
    assert!(alice.lines().all(|l| l.starts_with("PID: ")));
    assert!(alice.contains("Accessed Store Store1 [Store: Store1]"));
    assert!(alice.contains("[Store: Store1] [Category: Store1/lights]"));
}

#[tokio::test]
async fn test_vanished_record_is_fatal_for_that_client_only() {
    let temp_dir = TempDir::new().unwrap();
    write_good(temp_dir.path(), "Store1", "lights", "lamp", LAMP);
    let desk = write_good(
        temp_dir.path(),
        "Store1",
        "office",
        "desk",
        "Name: desk\nPrice: 50\nScore: 1.0\nEntity: 2\n",
    );
    let (market, _log) = market(temp_dir.path(), &["Store1"]);

    // 記錄在掃描後、扣庫存前消失
    let client = Client::new("john").with_item("desk", 1);
    let ctx = market.context(&client);
    let scan = market_scan::ScanCoordinator::new(ctx.clone(), shops(temp_dir.path(), &["Store1"]))
        .scan()
        .await;
    let outcome = market_scan::ClientOutcome::from_report(&client, &scan);
    fs::remove_file(&desk).unwrap();

    let mut client = client;
    let err = market_scan::PurchaseDecider::new(ctx)
        .decide(&mut client, &outcome)
        .unwrap_err();
    assert!(matches!(err, ScanError::FatalUpdate { .. }));

    let other = market
        .run_client(Client::new("alice").with_item("lamp", 1))
        .await;
    assert!(other.result.unwrap().is_approved());
}
