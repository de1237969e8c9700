//! The extraction pipeline: page relevance scanning, high-resolution row
//! extraction, and the orchestrator tying them to the PDF toolkit and the
//! vision oracle.

pub mod extract;
pub mod pipeline;
pub mod prompts;
pub mod select;

pub use extract::read_movements;
pub use pipeline::{PipelineError, StatementPipeline, StatementReport};
pub use select::{find_table_pages, ChunkFailure, PageScan};
