//! One-shot importer: converts a Cookie Editor export into session cookies,
//! injects them into a live browser, checks the login signal, and persists
//! the resulting session cookies for the simulator.

use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use ytsession::cookies::{self, CRITICAL_THRESHOLD};
use ytsession::errors::SessionError;
use ytsession::{BrowserSession, Config, ExportedCookie, PageSurface, Result};

#[derive(Parser)]
#[command(
    name = "import-cookies",
    about = "Inject an exported cookie file into a browser session and persist the session cookies"
)]
struct Args {
    /// Path to the exported cookie JSON (Cookie Editor format)
    cookies_json: PathBuf,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = Config::default();

    if let Err(e) = run(&args, &config).await {
        error!("import failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: &Args, config: &Config) -> Result<()> {
    info!("input: {}", args.cookies_json.display());
    info!("output: {}", config.cookie_store.display());

    let raw = std::fs::read_to_string(&args.cookies_json).map_err(|e| {
        SessionError::CookieStore(format!(
            "cannot read export {}: {}",
            args.cookies_json.display(),
            e
        ))
    })?;
    let exported: Vec<ExportedCookie> = serde_json::from_str(&raw)?;
    info!("loaded {} exported records", exported.len());

    let session_cookies = cookies::convert(&exported, &config.target);
    info!("converted {} records", session_cookies.len());

    info!("starting browser (headless: {})", config.browser.headless);
    let browser = BrowserSession::launch(config.browser.clone()).await?;

    browser.navigate(&config.target.base_url).await?;
    tokio::time::sleep(config.timings.page_settle).await;

    let report = browser.inject_cookies(&session_cookies).await;
    info!(
        "{}/{} cookies injected ({} failed)",
        report.injected_count(),
        report.attempted,
        report.failed_count()
    );
    info!(
        "critical cookies injected: {:?}",
        report.critical_names(&config.target.critical_names)
    );
    if !report.meets_critical_threshold(&config.target.critical_names) {
        warn!("fewer than {} critical cookies injected", CRITICAL_THRESHOLD);
    }
    if report.injected_count() == 0 {
        return Err(SessionError::CookieRejected(
            "no cookie was accepted by the browser".to_string(),
        ));
    }

    if ytsession::login::quick_check(&browser, config).await {
        info!("login confirmed");
    } else {
        warn!("login not detected - saving cookies anyway");
    }

    let saved = browser.export_cookies().await?;
    if saved.is_empty() {
        return Err(SessionError::CookieStore(
            "browser session holds no cookies to save".to_string(),
        ));
    }
    ytsession::store::save(&config.cookie_store, &saved)?;
    info!(
        "{} cookies saved to {}",
        saved.len(),
        config.cookie_store.display()
    );

    let critical = cookies::critical_names(
        saved.iter().map(|c| c.name.as_str()),
        &config.target.critical_names,
    );
    info!("critical cookies saved: {:?}", critical);

    let earliest_expiry = saved
        .iter()
        .filter(|c| cookies::name_matches(&c.name, &config.target.critical_names))
        .filter_map(|c| c.expires_at())
        .min();
    if let Some(expiry) = earliest_expiry {
        info!(
            "earliest critical cookie expiry: {}",
            expiry.format("%Y-%m-%d %H:%M UTC")
        );
    }

    info!("setup finished");
    Ok(())
}
