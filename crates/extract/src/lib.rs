//! roomsched-extract: the ICS fetcher (C3), headless-render fallback (C4),
//! per-calendar extractor (C5) and the bounded-concurrency orchestrator
//! (C6) that ties them together.

pub mod error;
pub mod extractor;
pub mod ics;
pub mod orchestrator;
pub mod render;

pub use error::{ExtractError, ExtractResult, IcsError, RenderError};
pub use extractor::{extract_one, ExtractionOutcome};
pub use orchestrator::Orchestrator;
pub use render::RenderPool;
