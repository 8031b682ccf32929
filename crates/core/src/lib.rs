//! roomsched-core: pure domain logic, no I/O.
//!
//! Hashing, title/location parsing, domain models and configuration live
//! here so every downstream crate (`roomsched-artifact`, `roomsched-store`,
//! `roomsched-extract`, `roomsched-merge`, `roomsched-api`) shares one
//! dependency-free definition of what an event, a source, and a parsed
//! field look like.

pub mod config;
pub mod error;
pub mod hash;
pub mod models;
pub mod parser;
pub mod types;

pub use config::PipelineConfig;
pub use error::{CoreError, CoreResult};
pub use hash::source_hash;
pub use models::{
    CalendarMap, CalendarMapEntry, CalendarSource, ExtractionPhase, Fingerprint, ImportProgress,
    ManualEvent, MergedSchedule, PerCalendarArtifact, RawEvent, UNASSIGNED_ROOM,
};
pub use parser::{parse_location, parse_title, ParsedLocation, ParsedTitle};
pub use types::{SourceHash, SourceId, SOURCE_HASH_LEN};
