// src/lib.rs
pub mod colors;
pub mod error;
pub mod eval;
pub mod executor;
pub mod flatten;
pub mod formatters;
pub mod input_format;
pub mod output_format;
pub mod pipeline;
pub mod query;
pub mod runner;
pub mod value;
pub mod variables;

pub use error::*;
pub use executor::PassOutcome;
pub use query::{CompiledQuery, Condition, Expression, Operation, Query};
pub use runner::{run, FilteredRecords, QueryRun};
pub use value::{LogRecord, OutputRecord, Results, Value};
pub use variables::{Scope, VariableStore};

pub use pipeline::config::{ErrorStrategy, PipelineConfig};
pub use pipeline::context::{ParseErrorInfo, ProcessingStats};
pub use pipeline::stream::StreamPipeline;
