use crate::config::Config;
use crate::db::Store;
use crate::services::{CacheSweeper, system_clock};

pub async fn cmd_sweep(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let sweeper = CacheSweeper::new(store.clone(), config.cache.clone(), system_clock());

    let report = sweeper.sweep_once().await?;

    println!("Cache sweep finished:");
    println!("  Expired cache entries removed: {}", report.expired_entries);
    println!("  Expired alerts removed:        {}", report.expired_alerts);
    if config.cache.max_entries > 0 {
        println!("  Entries trimmed to bound:      {}", report.trimmed_entries);
    }
    println!("  Cache entries remaining:       {}", store.count_cache_entries().await?);

    Ok(())
}
