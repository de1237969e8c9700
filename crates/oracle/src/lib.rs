pub mod client;
pub mod mock;
pub mod reply;
pub mod schema;

pub use client::{
    OpenAiOracle, OracleError, PngImage, VisionOracle, DEFAULT_BASE_URL, DEFAULT_MODEL,
};
pub use mock::{MockOracle, RecordedCall};
pub use reply::OracleReply;
pub use schema::{movements_schema, pages_schema, MovementsReply, PagesReply, SchemaSpec};
