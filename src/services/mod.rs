pub mod ingestion;

pub use ingestion::{IngestedReading, NewReading, ingest_reading, ingest_reading_at};
