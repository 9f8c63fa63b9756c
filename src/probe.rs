//! Live check of the athletics pages: which template each page uses and how
//! many records the extractor finds on it.
//! Run: cargo run --bin scrape-probe [sport]

use anyhow::{Context, Result};
use athletics_scraper::{AthleticsScraper, EntityKind, SiteConfig, Sport};
use dotenv::dotenv;
use logger::{now_iso, EventLogger, ScrapeStatusEvent};
use std::env;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let sports: Vec<Sport> = match env::args().nth(1) {
        Some(arg) => vec![arg.parse().context("scrape-probe [sport]")?],
        None => Sport::ALL.to_vec(),
    };

    let config = SiteConfig::from_env();
    info!("🩺 Probing {} sport(s) on {}", sports.len(), config.base_origin);

    let scraper = AthleticsScraper::new(config)?;
    let log_dir = env::var("ATHLETICS_LOG_DIR").unwrap_or_else(|_| "logs".to_string());
    let logger = EventLogger::new(log_dir);

    let mut empty = 0usize;
    let mut failed = 0usize;

    for (i, sport) in sports.iter().enumerate() {
        if i > 0 {
            sleep(Duration::from_secs(1)).await;
        }

        for kind in EntityKind::ALL {
            let url = scraper.config().page_url(*sport, kind);
            let event = match scraper.probe(*sport, kind).await {
                Ok(probe) => {
                    let format = probe.format.map(|f| f.to_string());
                    match &format {
                        Some(tag) if probe.records > 0 => info!(
                            "{} {:<8} format={} records={} html_len={}",
                            sport, kind, tag, probe.records, probe.html_len
                        ),
                        _ => {
                            empty += 1;
                            warn!(
                                "{} {:<8} no records (format={:?}, html_len={})",
                                sport, kind, format, probe.html_len
                            );
                        }
                    }
                    ScrapeStatusEvent {
                        ts: now_iso(),
                        event: "SCRAPE_STATUS",
                        sport: sport.slug().to_string(),
                        entity: kind.as_str().to_string(),
                        url: probe.url,
                        format,
                        ok: true,
                        items: probe.records,
                        message: "ok".to_string(),
                    }
                }
                Err(e) => {
                    failed += 1;
                    warn!("{} {:<8} probe failed: {}", sport, kind, e);
                    ScrapeStatusEvent {
                        ts: now_iso(),
                        event: "SCRAPE_STATUS",
                        sport: sport.slug().to_string(),
                        entity: kind.as_str().to_string(),
                        url,
                        format: None,
                        ok: false,
                        items: 0,
                        message: e.to_string(),
                    }
                }
            };

            if let Err(e) = logger.log(&event) {
                warn!("scrape status not written: {}", e);
            }
        }
    }

    info!(
        "✅ Probe done: {} page(s), {} empty, {} failed",
        sports.len() * EntityKind::ALL.len(),
        empty,
        failed
    );
    Ok(())
}
