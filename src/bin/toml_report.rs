use clap::Parser;
use shipment_insight::adapters::reader;
use shipment_insight::analysis::columns::{infer_columns, ColumnRole};
use shipment_insight::core::{ConfigProvider, Storage};
use shipment_insight::utils::{logger, validation::Validate};
use shipment_insight::{LocalStorage, ReportEngine, ShipmentPipeline, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-report")]
#[command(about = "Shipment statistics driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "shipment-report.toml")]
    config: String,

    /// Override the input file from config
    #[arg(short, long)]
    input: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Dry run - show the inferred column mapping without writing reports
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 載入 TOML 配置
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if config.json_log() {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(input) = args.input.clone() {
        tracing::info!("🔧 Input file overridden to: {}", input);
        config.source.file = Some(input);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No reports will be written");
        if let Err(e) = perform_dry_run(&config).await {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(".".to_string());
    let pipeline = ShipmentPipeline::new(storage, config);
    let engine = ReportEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output) => {
            println!("✅ Report completed: {} records analysed", output.report.analysed_records);
            for warning in &output.report.warnings {
                println!("⚠️ {}", warning);
            }
            println!("📁 Output saved to: {}", output.output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Report failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Report: {}", config.report.name);
    if let Some(description) = &config.report.description {
        println!("  Description: {}", description);
    }
    println!("  Input: {}", config.input_file());
    if let Some(sheet) = config.sheet_name() {
        println!("  Sheet: {}", sheet);
    }
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", config.load.output_formats.join(", "));
    println!("  Trip prefix length: {}", config.trip_prefix_len());

    if let Some(columns) = &config.columns {
        println!("  Column overrides: {}", columns.len());
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run(config: &TomlConfig) -> shipment_insight::Result<()> {
    let storage = LocalStorage::new(".".to_string());
    let bytes = storage.read_file(config.input_file()).await?;
    let table = reader::read_table(config.input_file(), bytes, config.sheet_name())?;

    println!("🔍 Dry Run Analysis:");
    println!("  Records: {}", table.len());
    println!("  Columns: {}", table.headers.join(", "));
    println!();

    let mapping = infer_columns(&table.headers, &config.column_rules());
    println!("🔄 Column Mapping:");
    for role in ColumnRole::ALL {
        match mapping.get(role) {
            Some(column) => println!("  ✅ {} -> {}", role, column),
            None => println!("  ⚠️ {} -> (not found)", role),
        }
    }

    for warning in &table.warnings {
        println!("⚠️ {}", warning);
    }

    println!();
    println!("✅ Dry run complete. Remove --dry-run to write reports.");
    Ok(())
}
