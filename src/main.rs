use anyhow::Context;
use cellar_enrich::config::{AppConfig, Cli, Command, LogFormat};
use cellar_enrich::core::drinking::{drinking_status, drinking_status_now};
use cellar_enrich::domain::model::InlineImage;
use cellar_enrich::domain::ports::GenerativeModel;
use cellar_enrich::utils::error::{EnrichError, ErrorSeverity};
use cellar_enrich::utils::{logger, validation::Validate};
use cellar_enrich::{
    BottleSizeCatalog, GeminiClient, KnowledgeEstimator, LabelReader, LabelScanner,
    MarketplaceScraper, PairingAdvisor, PriceQuery, PriceResolver, ReadMode, WineEnricher,
    WineRecord,
};
use clap::Parser;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

struct Services {
    model: Arc<dyn GenerativeModel>,
    resolver: Arc<PriceResolver>,
}

fn build_services(config: &AppConfig, catalog: Arc<BottleSizeCatalog>) -> anyhow::Result<Services> {
    let client = reqwest::Client::new();
    let currency = config.pricing.currency.clone();

    let model: Arc<dyn GenerativeModel> = Arc::new(GeminiClient::with_client(
        client.clone(),
        config.gemini_settings()?,
    ));
    let source = Arc::new(MarketplaceScraper::with_client(
        client,
        config.marketplace_settings(),
    )?);
    let estimator = Arc::new(
        KnowledgeEstimator::new(model.clone(), catalog.clone()).with_currency(currency.as_str()),
    );
    let resolver = Arc::new(PriceResolver::new(source, estimator, catalog).with_currency(currency));

    Ok(Services { model, resolver })
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_record(path: &Path) -> anyhow::Result<WineRecord> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read wine record {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not a valid wine record", path.display()))
}

async fn run(command: Command, config: &AppConfig) -> anyhow::Result<()> {
    let catalog = Arc::new(config.bottle_size_catalog()?);

    match command {
        Command::Sizes => print_json(&catalog.all()),
        Command::DrinkingStatus { window, year } => {
            let info = match year {
                Some(year) => drinking_status(window.as_deref(), year),
                None => drinking_status_now(window.as_deref()),
            };
            print_json(&info)
        }
        Command::Price {
            producer,
            vintage,
            region,
            bottle_size,
            detailed,
        } => {
            let services = build_services(config, catalog)?;
            let query = PriceQuery::new(producer)
                .with_vintage(vintage)
                .with_region(region)
                .with_bottle_size(bottle_size);

            if detailed {
                print_json(&services.resolver.resolve_detailed(&query).await?)
            } else {
                print_json(&services.resolver.resolve(&query).await?)
            }
        }
        Command::Enrich { record, report } => {
            let wine = read_record(&record)?;
            let services = build_services(config, catalog)?;
            let enricher = WineEnricher::new(services.model, services.resolver);

            let outcome = enricher.enrich_report(&wine).await?;
            if outcome.quota_exceeded {
                tracing::warn!("Generative model quota exceeded; some fields may be missing");
            }
            tracing::info!("Enriched fields: {:?}", outcome.enriched_fields());

            if report {
                print_json(&outcome)
            } else {
                print_json(&outcome.updates)
            }
        }
        Command::Label {
            image_base64_file,
            mime,
            quick,
            bottle_size,
        } => {
            let data = std::fs::read_to_string(&image_base64_file).with_context(|| {
                format!("failed to read image data {}", image_base64_file.display())
            })?;
            let image = InlineImage {
                mime_type: mime,
                data: data.split_whitespace().collect(),
            };
            let services = build_services(config, catalog)?;

            if quick {
                let details = LabelReader::new(services.model)
                    .read(image, ReadMode::Quick)
                    .await?;
                print_json(&details)
            } else {
                let scanner = LabelScanner::new(services.model, services.resolver);
                print_json(&scanner.scan(image, &bottle_size).await?)
            }
        }
        Command::Pairings { record } => {
            let wine = read_record(&record)?;
            let services = build_services(config, catalog)?;
            let pairings = PairingAdvisor::new(services.model).suggest(&wine).await;
            print_json(&pairings)
        }
    }
}

/// Every error that reaches `main` means nothing was printed, so none maps to 0.
fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    }
}

fn load_config(cli: &Cli) -> cellar_enrich::Result<AppConfig> {
    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    let level = config.logging.level.as_deref();
    match config.logging.format {
        LogFormat::Compact => logger::init_cli_logger(cli.verbose, level),
        LogFormat::Json => logger::init_json_logger(cli.verbose, level),
    }
    tracing::debug!("Configuration: {:?}", config.marketplace);

    if let Err(e) = run(cli.command, &config).await {
        match e.downcast_ref::<EnrichError>() {
            Some(err) => {
                tracing::error!(
                    "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
                    err,
                    err.category(),
                    err.severity()
                );
                eprintln!("❌ {}", err.user_friendly_message());
                eprintln!("💡 Suggestion: {}", err.recovery_suggestion());

                std::process::exit(exit_code(err.severity()));
            }
            None => {
                tracing::error!("❌ Command failed: {:#}", e);
                eprintln!("❌ {:#}", e);
                std::process::exit(1);
            }
        }
    }
}
