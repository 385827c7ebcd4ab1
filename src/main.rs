use clap::Parser;
use paper_harvest::core::pipeline::build_client;
use paper_harvest::domain::ports::ConfigProvider;
use paper_harvest::utils::error::{ErrorSeverity, HarvestError};
use paper_harvest::utils::{logger, validation::Validate};
use paper_harvest::{
    AcceptedPapersPage, CliConfig, DblpClient, DirectorySink, HarvestConfig, HarvestEngine,
    LocalStorage, ResolutionPipeline,
};

const EXIT_CONFIG_ERROR: i32 = 1;
const EXIT_RUN_FAILURE: i32 = 2;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting paper-harvest");
    tracing::debug!("CLI config: {:?}", cli);

    // 載入並驗證配置
    let config = match cli.load().and_then(|config| config.validate().map(|_| config)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(EXIT_CONFIG_ERROR);
        }
    };

    if cli.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let engine = match build_engine(config, cli.monitor) {
        Ok(engine) => engine,
        Err(e) => exit_with(e),
    };

    match engine.run().await {
        Ok(summary) => {
            tracing::info!("✅ Harvest completed");
            println!(
                "✅ resolved {} of {} requested",
                summary.resolved, summary.requested
            );
            println!("📁 Output saved to: {}", summary.output_path);
        }
        Err(e) => exit_with(e),
    }
}

type Engine = HarvestEngine<
    ResolutionPipeline<DblpClient, AcceptedPapersPage, DirectorySink<LocalStorage>, HarvestConfig>,
>;

fn build_engine(config: HarvestConfig, monitor_enabled: bool) -> Result<Engine, HarvestError> {
    let client = build_client(config.request_timeout_seconds())?;
    let index = DblpClient::new(client.clone(), config.dblp_endpoint());
    let accepted = AcceptedPapersPage::new(client.clone(), config.accepted_papers_url());
    let sink = DirectorySink::new(
        LocalStorage::new(config.output_path()),
        config.output_path(),
        config.output_formats().to_vec(),
    );

    let pipeline = ResolutionPipeline::with_client(index, accepted, sink, config, client);
    Ok(HarvestEngine::new_with_monitoring(pipeline, monitor_enabled))
}

fn exit_with(e: HarvestError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ Harvest failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Critical => EXIT_CONFIG_ERROR,
        ErrorSeverity::Low | ErrorSeverity::Medium | ErrorSeverity::High => EXIT_RUN_FAILURE,
    };
    std::process::exit(exit_code);
}
