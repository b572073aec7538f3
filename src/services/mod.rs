pub mod ingest;
pub use ingest::{IngestError, IngestService, RescanOutcome, RunSummary};
