use crate::value::LogRecord;

/// Trait for rendering records as display text
pub trait RecordFormatter {
    fn format_record(&self, record: &LogRecord) -> String;
}

pub mod logfmt;
