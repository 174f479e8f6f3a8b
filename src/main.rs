use anyhow::{Context, Result};
use sheetnotes::{
    batch::{BatchDriver, BatchSettings},
    config::Config,
    gemini::GeminiClient,
    sheets::{GoogleTokenSource, SpreadsheetClient},
    util::readable_time,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("startup");

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    // ─── 2) configuration & credentials ──────────────────────────────
    let config = Config::from_env()?;
    let auth = GoogleTokenSource::from_file(&config.credentials_path).await?;

    // ─── 3) open the spreadsheet ─────────────────────────────────────
    let sheets = SpreadsheetClient::new(&config.sheet_id, Arc::new(auth));
    let info = sheets
        .load_info()
        .await
        .context("loading spreadsheet metadata")?;
    info!("Loaded doc: {}", info.title);
    let worksheet = sheets.worksheet(&info, &config.sheet_title)?;

    // ─── 4) run the batch ────────────────────────────────────────────
    let gemini = GeminiClient::from_config(&config);
    let driver = BatchDriver::new(BatchSettings::from_config(&config), &worksheet, &gemini);
    let summary = driver.run().await?;

    info!(
        rows = summary.rows_loaded,
        annotated = summary.annotated,
        empty = summary.empty_annotations,
        cleaned = summary.cleaned,
        skipped = summary.skipped,
        total = %readable_time(summary.elapsed),
        "all done"
    );
    Ok(())
}
