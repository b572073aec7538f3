//! Remote catalog access.

pub mod mydramalist;

pub use mydramalist::MyDramaListClient;

use anyhow::Result;
use chrono::NaiveDate;

use crate::domain::{DramaId, Quarter};
use crate::models::drama::RawDrama;

/// Source of raw title records.
///
/// Any `Err` is treated by callers as "no data for this unit"; nothing is
/// retried.
#[async_trait::async_trait]
pub trait CatalogClient: Send + Sync {
    /// Full record for one title, or `None` if the catalog does not know it.
    async fn fetch_by_id(&self, id: DramaId) -> Result<Option<RawDrama>>;

    /// Titles airing in `quarter` of `year`.
    async fn fetch_by_year_quarter(&self, year: i32, quarter: Quarter) -> Result<Vec<RawDrama>>;

    /// Upcoming episodes calendar. Entries reference their title via `rid`.
    async fn fetch_upcoming_episodes(&self) -> Result<Vec<RawDrama>>;

    /// Titles whose metadata changed on or after `since`.
    async fn fetch_updates_since(&self, since: NaiveDate) -> Result<Vec<RawDrama>>;
}
