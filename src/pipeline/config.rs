use crate::input_format::InputFormat;
use crate::output_format::OutputFormat;

/// Configuration for pipeline behavior
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub error_strategy: ErrorStrategy,
    pub buffer_size: usize,
    pub max_line_length: usize,
    pub progress_interval: usize,
    pub input_format: InputFormat,
    pub output_format: OutputFormat,
    pub use_colors: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            error_strategy: ErrorStrategy::Skip,
            buffer_size: 65536,       // 64KB
            max_line_length: 1048576, // 1MB
            progress_interval: 0,     // Disabled
            input_format: InputFormat::default(),
            output_format: OutputFormat::default(),
            use_colors: false,
        }
    }
}

/// What to do with input lines that cannot become records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStrategy {
    /// Skip problematic lines and continue processing
    Skip,
    /// Stop processing on first error
    FailFast,
}
