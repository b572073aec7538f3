//! JSON-file backed drama database.
//!
//! The whole collection lives in memory and is rewritten to disk on every
//! persisting operation, sorted by id with compact separators so existing
//! files stay byte-compatible.

pub(crate) mod persist;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::DramaId;
use crate::models::drama::{DramaRecord, RawDrama, Tag};
use crate::normalize::normalize;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read drama database {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Drama database {path} could not be parsed: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write drama database {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize drama database: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Raw record has no usable id")]
    MissingId,
}

/// What happened to each record of an [`DramaStore::insert_bulk`] batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkInsertOutcome {
    pub inserted: usize,
    pub duplicates: usize,
    pub missing_id: usize,
}

/// Totals from one [`DramaStore::clean`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanOutcome {
    pub fields_removed: usize,
    pub tags_flattened: usize,
    pub tags_dropped: usize,
}

/// Owner of the persisted drama collection and its id index.
///
/// Every path that adds a record goes through [`DramaStore::insert`], which
/// updates the index in the same step, so [`DramaStore::contains`] always
/// reflects the collection.
#[derive(Debug)]
pub struct DramaStore {
    path: PathBuf,
    records: Vec<DramaRecord>,
    ids: HashSet<DramaId>,
}

impl DramaStore {
    /// Loads the database at `path`.
    ///
    /// A missing file yields an empty store; it is created on the first
    /// persist. Any other read or parse failure is returned.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let records: Vec<DramaRecord> = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "Drama database not found, starting empty");
                Vec::new()
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: path.clone(),
                    source,
                });
            }
        };

        let ids: HashSet<DramaId> = records.iter().map(|r| r.id).collect();
        if ids.len() != records.len() {
            warn!(
                records = records.len(),
                unique_ids = ids.len(),
                "Drama database contains duplicate ids"
            );
        }

        info!(path = %path.display(), records = records.len(), "Drama database loaded");

        Ok(Self { path, records, ids })
    }

    /// Creates an empty store that will write to `path` without reading it.
    #[must_use]
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Vec::new(),
            ids: HashSet::new(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: DramaId) -> bool {
        self.ids.contains(&id)
    }

    #[must_use]
    pub fn get(&self, id: DramaId) -> Option<&DramaRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DramaRecord> {
        self.records.iter()
    }

    /// Normalizes `raw` and appends it without a duplicate check.
    ///
    /// Callers are expected to have checked [`DramaStore::contains`]. Nothing
    /// is written to disk.
    pub fn insert(&mut self, raw: &RawDrama) -> Result<DramaId, StoreError> {
        let id = raw.id().ok_or(StoreError::MissingId)?;
        self.records.push(normalize(id, raw));
        self.ids.insert(id);
        Ok(id)
    }

    /// Inserts every record whose id is not yet stored, then persists once.
    ///
    /// The first record seen for an id wins, including repeats within `raws`.
    pub fn insert_bulk<'a, I>(&mut self, raws: I) -> Result<BulkInsertOutcome, StoreError>
    where
        I: IntoIterator<Item = &'a RawDrama>,
    {
        let mut outcome = BulkInsertOutcome::default();

        for raw in raws {
            let Some(id) = raw.id() else {
                debug!("Skipping raw record without an id");
                outcome.missing_id += 1;
                continue;
            };

            if self.contains(id) {
                debug!(%id, "Skipping already stored drama");
                outcome.duplicates += 1;
                continue;
            }

            self.insert(raw)?;
            outcome.inserted += 1;
        }

        self.persist()?;

        debug!(
            inserted = outcome.inserted,
            duplicates = outcome.duplicates,
            missing_id = outcome.missing_id,
            "Bulk insert finished"
        );

        Ok(outcome)
    }

    /// Replaces the stored fields of `id` with those normalized from `raw`.
    ///
    /// The stored id never changes, even if `raw` carries a different one.
    /// Returns `false`, without touching the file, when `id` is unknown.
    pub fn update(&mut self, id: DramaId, raw: &RawDrama) -> Result<bool, StoreError> {
        let Some(record) = self.records.iter_mut().find(|r| r.id == id) else {
            debug!(%id, "Ignoring update for unknown drama");
            return Ok(false);
        };

        if let Some(raw_id) = raw.id()
            && raw_id != id
        {
            warn!(%id, %raw_id, "Update payload carries a different id; keeping the stored one");
        }

        record.replace_contents(normalize(id, raw));
        self.persist()?;
        Ok(true)
    }

    /// Strips non-canonical keys from every record and flattens tags to bare
    /// names, then persists. Running it again changes nothing.
    pub fn clean(&mut self) -> Result<CleanOutcome, StoreError> {
        let mut outcome = CleanOutcome::default();

        for record in &mut self.records {
            outcome.fields_removed += record.foreign.len();
            record.foreign.clear();

            if record.tags_are_flat() {
                continue;
            }

            let mut names = Vec::with_capacity(record.tags.len());
            for tag in std::mem::take(&mut record.tags) {
                let was_flat = matches!(tag, Tag::Name(_));
                match tag.into_name() {
                    Some(name) => {
                        if !was_flat {
                            outcome.tags_flattened += 1;
                        }
                        names.push(Tag::Name(name));
                    }
                    None => outcome.tags_dropped += 1,
                }
            }
            record.tags = names;
        }

        self.persist()?;

        info!(
            fields_removed = outcome.fields_removed,
            tags_flattened = outcome.tags_flattened,
            tags_dropped = outcome.tags_dropped,
            "Drama database cleaned"
        );

        Ok(outcome)
    }

    /// Sorts the collection by id and atomically rewrites the backing file.
    pub fn persist(&mut self) -> Result<(), StoreError> {
        self.records.sort_by_key(|r| r.id);

        let bytes = serde_json::to_vec(&self.records)?;
        persist::write_atomically(&self.path, &bytes).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), records = self.records.len(), "Drama database saved");
        Ok(())
    }
}
