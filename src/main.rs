use clap::Parser;
use market_scan::adapters::ClientReader;
use market_scan::utils::error::ErrorSeverity;
use market_scan::utils::logger;
use market_scan::{
    CliConfig, Client, ClientRun, FileActivityLog, FsGoodStore, MarketScan, PurchaseDecider,
};
use std::io::{self, BufRead, Write};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 先解析設定，`[logging] json` 才能決定日誌格式
    let resolved = cli.resolve();
    let json_logs = resolved
        .as_ref()
        .map(|config| config.json_logs())
        .unwrap_or(cli.json_logs);
    if json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting market-scan");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match resolved {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let mut clients = config.clients();
    if cli.interactive || clients.is_empty() {
        let stdin = io::stdin();
        let mut reader = ClientReader::new(stdin.lock(), io::stdout());
        match reader.read_clients() {
            Ok(read) => clients.extend(read),
            Err(e) => {
                eprintln!("❌ {}", e.user_friendly_message());
                eprintln!("💡 建議: {}", e.recovery_suggestion());
                std::process::exit(2);
            }
        }
    }

    let log = Arc::new(FileActivityLog::new(config.log_dir())?);
    let store = Arc::new(FsGoodStore::new());
    let market = MarketScan::new(store, log.clone(), config.shops(), config.settings());

    tracing::info!(
        "🏪 Scanning {} shops under {} for {} clients",
        config.market.shops.len(),
        config.root().display(),
        clients.len()
    );
    let runs = market.run_all(clients).await;

    if cli.rate {
        let stdin = io::stdin();
        let mut reader = ClientReader::new(stdin.lock(), io::stdout());
        collect_ratings(&market, &runs, &mut reader);
    }

    if cli.json {
        let results: Vec<_> = runs.iter().filter_map(|r| r.result.as_ref().ok()).collect();
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for run in &runs {
            print_summary(run);
        }
    }

    println!(
        "All processing completed. Check {} for the per-client logs.",
        log.dir().display()
    );

    // 任一顧客出現致命錯誤時以非零狀態結束，其他顧客的結果已寫入
    let worst = runs
        .iter()
        .filter_map(|r| r.result.as_ref().err())
        .map(|e| e.severity())
        .max();
    if let Some(severity) = worst {
        let exit_code = match severity {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

fn print_summary(run: &ClientRun) {
    let name = &run.client.name;
    for best in &run.report.shop_bests {
        println!(
            "Best Good in Store {}: {}, Price: {}, Point: {:.2}, Score: {:.2}",
            best.scope,
            best.good.name,
            best.good.price(),
            best.good.rating(),
            best.score()
        );
    }

    match &run.result {
        Ok(result) if result.is_approved() => {
            println!("✅ {}: purchase approved, total price {}", name, result.total_price);
            for line in &result.lines {
                println!(
                    "   {} x{} from {} for {} ({} left)",
                    line.item,
                    line.purchased,
                    line.shop,
                    line.total_price,
                    line.remaining.unwrap_or_default()
                );
            }
        }
        Ok(result) => {
            println!(
                "🛑 {}: total price {} exceeds threshold {}, no purchase made",
                name,
                result.total_price,
                run.client.price_threshold.unwrap_or_default()
            );
        }
        Err(e) => {
            eprintln!("❌ {}: {}", name, e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
        }
    }
}

fn collect_ratings<R: BufRead, W: Write>(
    market: &MarketScan<FsGoodStore>,
    runs: &[ClientRun],
    reader: &mut ClientReader<R, W>,
) {
    for run in runs {
        let Ok(result) = &run.result else { continue };
        if !result.is_approved() {
            continue;
        }
        let decider = PurchaseDecider::new(market.context(&Client::new(&run.client.name)));
        for line in &result.lines {
            match reader.read_rating(&line.item) {
                Ok(Some(rating)) => {
                    if let Err(e) = decider.rate(&line.source, rating) {
                        tracing::error!("❌ Rating update for {} failed: {}", line.item, e);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("⚠️ Skipping rating for {}: {}", line.item, e);
                    return;
                }
            }
        }
    }
}
