use clap::Parser;
use scalp_advisor::utils::error::{AdvisorError, ErrorCategory};
use scalp_advisor::utils::{logger, validation::Validate};
use scalp_advisor::{server, ServerConfig, TomlConfig};

fn exit_code(e: &AdvisorError) -> i32 {
    match e.category() {
        ErrorCategory::Config => 1,
        ErrorCategory::Data => 2,
        ErrorCategory::Upstream | ErrorCategory::Input => 3,
    }
}

fn fail(e: AdvisorError) -> ! {
    tracing::error!("❌ Startup failed: {} (Category: {:?})", e, e.category());
    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(exit_code(&e));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerConfig::parse();

    // 有指定設定檔時，以 TOML 取代命令列參數
    let file_config = match &args.config {
        Some(path) => match TomlConfig::from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path, e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(1);
            }
        },
        None => None,
    };

    // 初始化日誌
    let (verbose, json) = match &file_config {
        Some(c) => (args.verbose || c.logging.verbose, args.log_json || c.logging.json),
        None => (args.verbose, args.log_json),
    };
    logger::init(verbose, json);

    tracing::info!("Starting scalp-advisor v{}", env!("CARGO_PKG_VERSION"));

    match &file_config {
        Some(config) => {
            tracing::info!("📁 Using configuration file: {}", args.config.as_deref().unwrap_or_default());
            if let Err(e) = config.validate() {
                fail(e);
            }
            if let Err(e) = server::run(config).await {
                fail(e);
            }
        }
        None => {
            if verbose {
                tracing::debug!(
                    host = %args.host,
                    port = args.port,
                    model = %args.model,
                    doctors_csv = %args.doctors_csv,
                    "CLI config"
                );
            }
            if let Err(e) = args.validate() {
                fail(e);
            }
            if let Err(e) = server::run(&args).await {
                fail(e);
            }
        }
    }

    Ok(())
}
