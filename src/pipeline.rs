// src/pipeline.rs - stream transport around the query interpreter
pub mod config;
pub mod context;
pub mod stream;

pub use config::{ErrorStrategy, PipelineConfig};
pub use context::{ParseErrorInfo, ProcessingStats};
pub use stream::StreamPipeline;
