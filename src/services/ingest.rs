//! Ingestion strategies that feed catalog responses into the drama store.
//!
//! Each strategy works unit by unit (a quarter, a calendar entry, an update,
//! an id) and treats a failed fetch as "no data" for that unit only. Store
//! and cursor failures are not swallowed: a database that cannot be written
//! ends the run.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::clients::CatalogClient;
use crate::cursor::{CursorError, ResumeCursor};
use crate::db::{BulkInsertOutcome, CleanOutcome, DramaStore, StoreError};
use crate::domain::{DramaId, Quarter};
use crate::models::drama::RawDrama;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cursor(#[from] CursorError),
}

/// Outcome of one [`IngestService::rescan`] window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RescanOutcome {
    pub first_id: u64,
    pub last_id: u64,
    pub already_stored: usize,
    pub inserted: usize,
    pub not_found: usize,
    pub failed: usize,
}

/// Per-strategy results of a full [`IngestService::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub yearly: Vec<(i32, BulkInsertOutcome)>,
    pub new_episodes: BulkInsertOutcome,
    pub updated: usize,
    pub cleaned: CleanOutcome,
}

pub struct IngestService<C> {
    client: C,
}

impl<C: CatalogClient> IngestService<C> {
    pub const fn new(client: C) -> Self {
        Self { client }
    }

    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Yearly load for `today`'s year and the next, then the episode and
    /// update scans, then one maintenance pass.
    #[instrument(skip(self, store))]
    pub async fn run(
        &self,
        store: &mut DramaStore,
        today: NaiveDate,
    ) -> Result<RunSummary, IngestError> {
        let current_year = today.year();
        let mut summary = RunSummary::default();

        for year in [current_year, current_year + 1] {
            let outcome = self.ingest_year(store, year).await?;
            summary.yearly.push((year, outcome));
        }

        summary.new_episodes = self.ingest_new_episodes(store).await?;
        summary.updated = self.apply_recent_updates(store, today).await?;
        summary.cleaned = store.clean()?;

        info!(
            records = store.len(),
            new_episodes = summary.new_episodes.inserted,
            updated = summary.updated,
            "Drama sync finished"
        );

        Ok(summary)
    }

    /// Fetches all four quarters of `year` and bulk-inserts whatever arrived.
    #[instrument(skip(self, store))]
    pub async fn ingest_year(
        &self,
        store: &mut DramaStore,
        year: i32,
    ) -> Result<BulkInsertOutcome, IngestError> {
        let mut dramas = Vec::new();

        for quarter in Quarter::ALL {
            match self.client.fetch_by_year_quarter(year, quarter).await {
                Ok(batch) => {
                    debug!(%quarter, count = batch.len(), "Quarter fetched");
                    dramas.extend(batch);
                }
                Err(e) => warn!(%quarter, error = %e, "Quarter fetch failed, skipping"),
            }
        }

        if dramas.is_empty() {
            info!("No dramas returned for year");
            return Ok(BulkInsertOutcome::default());
        }

        let outcome = store.insert_bulk(&dramas)?;
        record_inserted("yearly", &outcome);

        info!(
            fetched = dramas.len(),
            inserted = outcome.inserted,
            duplicates = outcome.duplicates,
            "Yearly dramas ingested"
        );

        Ok(outcome)
    }

    /// Fetches full records for titles on the upcoming-episodes calendar that
    /// are not stored yet.
    #[instrument(skip(self, store))]
    pub async fn ingest_new_episodes(
        &self,
        store: &mut DramaStore,
    ) -> Result<BulkInsertOutcome, IngestError> {
        let episodes = match self.client.fetch_upcoming_episodes().await {
            Ok(episodes) => episodes,
            Err(e) => {
                warn!(error = %e, "Upcoming episodes fetch failed, skipping");
                return Ok(BulkInsertOutcome::default());
            }
        };

        let mut requested = HashSet::new();
        let mut new_dramas = Vec::new();

        for episode in &episodes {
            let Some(id) = calendar_title_id(episode) else {
                continue;
            };

            if store.contains(id) || !requested.insert(id) {
                continue;
            }

            if let Some(drama) = self.fetch_one(id).await {
                new_dramas.push(drama);
            }
        }

        if new_dramas.is_empty() {
            debug!(entries = episodes.len(), "No new dramas on the episode calendar");
            return Ok(BulkInsertOutcome::default());
        }

        let outcome = store.insert_bulk(&new_dramas)?;
        record_inserted("new_episodes", &outcome);

        info!(inserted = outcome.inserted, "New dramas from episode calendar ingested");
        Ok(outcome)
    }

    /// Refreshes stored titles that the catalog reports as changed since the
    /// day before `today`. Returns the number of records updated.
    #[instrument(skip(self, store))]
    pub async fn apply_recent_updates(
        &self,
        store: &mut DramaStore,
        today: NaiveDate,
    ) -> Result<usize, IngestError> {
        let since = today.pred_opt().unwrap_or(today);

        let updates = match self.client.fetch_updates_since(since).await {
            Ok(updates) => updates,
            Err(e) => {
                warn!(%since, error = %e, "Title updates fetch failed, skipping");
                return Ok(0);
            }
        };

        let mut updated = 0;

        for entry in &updates {
            let Some(id) = entry.id() else {
                continue;
            };

            if !store.contains(id) {
                continue;
            }

            if let Some(drama) = self.fetch_one(id).await
                && store.update(id, &drama)?
            {
                updated += 1;
            }
        }

        metrics::counter!("dramarr_records_updated_total").increment(updated as u64);
        info!(%since, reported = updates.len(), updated, "Title updates applied");

        Ok(updated)
    }

    /// Walks `window` consecutive ids starting at the cursor position (or
    /// `default_start` when none is stored), inserting each title found and
    /// writing the cursor after every id.
    #[instrument(skip(self, store, cursor))]
    pub async fn rescan<R: ResumeCursor>(
        &self,
        store: &mut DramaStore,
        cursor: &mut R,
        default_start: u64,
        window: u64,
    ) -> Result<RescanOutcome, IngestError> {
        let first_id = cursor.read()?.unwrap_or(default_start);
        let last_id = first_id.saturating_add(window.saturating_sub(1));

        let mut outcome = RescanOutcome {
            first_id,
            last_id,
            ..RescanOutcome::default()
        };

        info!(first_id, last_id, "Starting rescan");

        for raw_id in first_id..=last_id {
            let id = DramaId::new(raw_id);

            if store.contains(id) {
                outcome.already_stored += 1;
            } else {
                match self.client.fetch_by_id(id).await {
                    Ok(Some(drama)) => {
                        let inserted = store.insert_bulk(std::iter::once(&drama))?;
                        record_inserted("rescan", &inserted);
                        outcome.inserted += inserted.inserted;
                    }
                    Ok(None) => outcome.not_found += 1,
                    Err(e) => {
                        warn!(%id, error = %e, "Title fetch failed, skipping");
                        outcome.failed += 1;
                    }
                }
            }

            cursor.write(raw_id)?;
        }

        info!(
            inserted = outcome.inserted,
            already_stored = outcome.already_stored,
            not_found = outcome.not_found,
            failed = outcome.failed,
            "Rescan window finished"
        );

        Ok(outcome)
    }

    async fn fetch_one(&self, id: DramaId) -> Option<RawDrama> {
        match self.client.fetch_by_id(id).await {
            Ok(Some(drama)) => Some(drama),
            Ok(None) => {
                debug!(%id, "Title not found in catalog");
                None
            }
            Err(e) => {
                warn!(%id, error = %e, "Title fetch failed, skipping");
                None
            }
        }
    }
}

/// Calendar entries reference their title through `rid`; `id` is the
/// episode's own id and only used when `rid` is absent.
fn calendar_title_id(entry: &RawDrama) -> Option<DramaId> {
    entry.id_field("rid").or_else(|| entry.id())
}

fn record_inserted(strategy: &'static str, outcome: &BulkInsertOutcome) {
    metrics::counter!("dramarr_records_inserted_total", "strategy" => strategy)
        .increment(outcome.inserted as u64);
    metrics::counter!("dramarr_records_skipped_total", "strategy" => strategy)
        .increment((outcome.duplicates + outcome.missing_id) as u64);
}
