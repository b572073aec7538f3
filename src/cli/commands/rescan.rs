use anyhow::Context;

use crate::clients::MyDramaListClient;
use crate::config::Config;
use crate::cursor::FileCursor;
use crate::db::DramaStore;
use crate::services::IngestService;

pub async fn cmd_rescan(config: &Config, window: Option<u64>) -> anyhow::Result<()> {
    let mut store = DramaStore::open(&config.general.database_path)
        .context("Failed to load drama database")?;
    let client = MyDramaListClient::new(&config.catalog)?;
    let service = IngestService::new(client);
    let mut cursor = FileCursor::new(&config.rescan.cursor_path);

    let window = window.unwrap_or(config.rescan.window);
    if window == 0 {
        println!("Window must be greater than zero.");
        return Ok(());
    }

    let outcome = service
        .rescan(&mut store, &mut cursor, config.rescan.start_id, window)
        .await?;

    println!();
    println!("{:-<70}", "");
    println!("Rescan of ids {}..={} complete!", outcome.first_id, outcome.last_id);
    println!("  Added: {}", outcome.inserted);
    println!("  Already stored: {}", outcome.already_stored);
    println!("  Not found: {}", outcome.not_found);
    println!("  Failed: {}", outcome.failed);

    Ok(())
}
