use clap::Parser;
use shipment_insight::utils::{logger, validation::Validate};
use shipment_insight::{CliConfig, LocalStorage, ReportEngine, ShipmentPipeline, ShipmentReport};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_log {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting shipment-insight CLI");
    tracing::debug!("CLI config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 讀寫都以工作目錄為根
    let storage = LocalStorage::new(".".to_string());
    let pipeline = ShipmentPipeline::new(storage, config);
    let engine = ReportEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output) => {
            print_summary(&output.report);
            println!("📁 報表已輸出: {}", output.output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Analysis failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}

fn print_summary(report: &ShipmentReport) {
    println!("📋 資料筆數: {} (原始 {})", report.analysed_records, report.source_records);

    if let Some(summary) = &report.ship_types {
        println!("📦 總銅重量(噸): {:.2}", summary.total_weight_ton);
        println!("① 出貨類型筆數統計");
        for row in &summary.rows {
            match row.weight_ton {
                Some(ton) => println!("  {:<12} {:>6} 筆  {:>10.2} 噸", row.ship_type, row.count, ton),
                None => println!("  {:<12} {:>6} 筆", row.ship_type, row.count),
            }
        }
    }

    if let Some(stats) = &report.on_time {
        match stats.rate_percent() {
            Some(rate) => println!(
                "🚚 準時率: {:.2}% ({}/{}，逾期 {})",
                rate, stats.on_time, stats.valid_records, stats.late
            ),
            None => println!("🚚 準時率: 無有效日期資料"),
        }
    }

    if let Some(regions) = &report.regions {
        let top: Vec<String> = regions
            .iter()
            .take(5)
            .map(|r| format!("{} {}", r.region, r.count))
            .collect();
        println!("🗺️ 縣市分佈: {}", top.join("、"));
    }

    if let Some(trips) = &report.trips {
        println!("🚛 車次數: {}", trips.len());
    }

    for warning in &report.warnings {
        println!("⚠️ {}", warning);
    }
}
