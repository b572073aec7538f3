use anyhow::Context;

use crate::clients::MyDramaListClient;
use crate::config::Config;
use crate::db::DramaStore;
use crate::services::IngestService;

pub async fn cmd_sync(config: &Config) -> anyhow::Result<()> {
    let mut store = DramaStore::open(&config.general.database_path)
        .context("Failed to load drama database")?;
    let client = MyDramaListClient::new(&config.catalog)?;
    let service = IngestService::new(client);

    let today = chrono::Local::now().date_naive();
    let summary = service.run(&mut store, today).await?;

    println!();
    println!("{:-<70}", "");
    println!("Sync complete!");
    for (year, outcome) in &summary.yearly {
        println!(
            "  {year}: {} added, {} already stored",
            outcome.inserted, outcome.duplicates
        );
    }
    println!("  From episode calendar: {}", summary.new_episodes.inserted);
    println!("  Updated: {}", summary.updated);
    println!("  Stray fields removed: {}", summary.cleaned.fields_removed);
    println!("  Total dramas: {}", store.len());

    Ok(())
}
