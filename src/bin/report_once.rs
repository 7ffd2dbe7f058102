use clap::Parser;
use registry_stats_bot::app::presentation::render_plain;
use registry_stats_bot::utils::logger;
use registry_stats_bot::{Aggregator, CatalogConfig, CredentialStore, HttpCountSource};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "report_once")]
#[command(about = "Run one registry report and print it (exit code 2 on 401)")]
struct Args {
    /// Path to TOML catalog file (bundled catalog when omitted)
    #[arg(short, long, env = "CATALOG_PATH")]
    catalog: Option<PathBuf>,

    #[arg(long, env = "BEARER_TOKEN", hide_env_values = true, default_value = "")]
    bearer_token: String,

    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "8")]
    request_timeout_secs: u64,

    /// List the catalog without sending any request
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    logger::init_logger(args.verbose, false);

    let catalog = match CatalogConfig::load(args.catalog.as_deref())
        .and_then(CatalogConfig::into_descriptors)
    {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("❌ Failed to load catalog: {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No request will be sent");
        for (index, descriptor) in catalog.iter().enumerate() {
            println!("{}. {} -> {}", index + 1, descriptor.category, descriptor.endpoint);
        }
        return Ok(());
    }

    let timeout = std::time::Duration::from_secs(args.request_timeout_secs.clamp(1, 60));
    let credential = Arc::new(CredentialStore::new(&args.bearer_token, None));
    let aggregator = Aggregator::new(Arc::new(HttpCountSource::new(credential, timeout)))
        .with_call_timeout(timeout);

    let report = aggregator.run(&catalog).await;
    println!("{}", render_plain(&report));

    if report.any_auth_failed() {
        std::process::exit(2);
    }
    Ok(())
}
