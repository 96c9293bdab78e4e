use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use deck_analyzer::{Config, DeckAnalyzer};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Clash Royale deck analyzer");

    let config = Config::from_env()?;
    let analyzer = DeckAnalyzer::new(&config).await?;

    // Run once immediately so the catalog is populated before the first watch tick
    if let Err(e) = analyzer.sync_cards().await {
        error!("Error during initial card sync: {}", e);
    }
    analyzer.check_watched_players(&config.watched_tags).await;

    let sched = JobScheduler::new().await?;

    let sync_analyzer = analyzer.clone();
    sched
        .add(Job::new_async(config.schedule.catalog_sync.as_str(), move |_uuid, _l| {
            let analyzer = sync_analyzer.clone();
            Box::pin(async move {
                if let Err(e) = analyzer.sync_cards().await {
                    error!("Error syncing cards: {}", e);
                }
            })
        })?)
        .await?;

    let watch_analyzer = analyzer.clone();
    let watched_tags = config.watched_tags.clone();
    sched
        .add(Job::new_async(config.schedule.watch.as_str(), move |_uuid, _l| {
            let analyzer = watch_analyzer.clone();
            let tags = watched_tags.clone();
            Box::pin(async move {
                analyzer.check_watched_players(&tags).await;
            })
        })?)
        .await?;

    info!(
        "Scheduler started - card sync \"{}\", watching {} players \"{}\"",
        config.schedule.catalog_sync,
        config.watched_tags.len(),
        config.schedule.watch
    );
    sched.start().await?;

    // Keep the program running
    loop {
        tokio::time::sleep(tokio::time::Duration::from_secs(30)).await;
    }
}
