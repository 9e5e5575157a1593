pub mod domain;
pub mod extract;
pub mod payload;
pub mod pipeline;
pub mod ports;
pub mod prompt;
pub mod schema;
pub mod store;

pub use domain::{skill_gaps, CustomTopic, GenerationRequest, GradedAnswer, HistoryEntry};
pub use extract::{extract_document, ExtractionMode, JsonShape};
pub use pipeline::{
    GenerationMetadata, GenerationPipeline, Normalized, PipelineError, PipelineStage, RetryPolicy,
};
pub use ports::{GenerationService, KeyValueStore, PortError, PortResult, Update};
pub use schema::{Schema, SchemaContext, SchemaViolation, Violation};
pub use store::{ClientStore, HISTORY_LIMIT};
