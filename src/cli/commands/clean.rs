use anyhow::Context;

use crate::config::Config;
use crate::db::DramaStore;

pub fn cmd_clean(config: &Config) -> anyhow::Result<()> {
    let mut store = DramaStore::open(&config.general.database_path)
        .context("Failed to load drama database")?;

    let outcome = store.clean()?;

    println!("Cleaned {} dramas:", store.len());
    println!("  Stray fields removed: {}", outcome.fields_removed);
    println!("  Tags flattened: {}", outcome.tags_flattened);
    println!("  Tags dropped: {}", outcome.tags_dropped);

    Ok(())
}
