use crate::formatters::RecordFormatter;
use crate::value::{LogRecord, Value};
use indexmap::IndexMap;

/// Renders structured records as logfmt, in record field order
#[derive(Debug, Default)]
pub struct LogfmtFormatter;

impl LogfmtFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Format fields as standard logfmt (space-separated key=value)
    pub fn format_fields(&self, fields: &IndexMap<String, Value>) -> String {
        let pairs: Vec<String> = fields
            .iter()
            .map(|(key, value)| self.format_key_value_pair(key, &value.to_text()))
            .collect();
        pairs.join(" ")
    }

    pub fn format_key_value_pair(&self, key: &str, value: &str) -> String {
        if self.needs_quoting(value) {
            format!("{}=\"{}\"", key, self.escape(value))
        } else {
            format!("{}={}", key, value)
        }
    }

    /// Check if value needs to be quoted per logfmt rules
    fn needs_quoting(&self, value: &str) -> bool {
        value.is_empty()
            || value
                .chars()
                .any(|c| matches!(c, ' ' | '\t' | '\n' | '\r' | '"' | '=' | '\\'))
    }

    fn escape(&self, value: &str) -> String {
        let mut escaped = String::with_capacity(value.len());
        for c in value.chars() {
            match c {
                '"' => escaped.push_str("\\\""),
                '\\' => escaped.push_str("\\\\"),
                '\n' => escaped.push_str("\\n"),
                '\t' => escaped.push_str("\\t"),
                '\r' => escaped.push_str("\\r"),
                _ => escaped.push(c),
            }
        }
        escaped
    }
}

impl RecordFormatter for LogfmtFormatter {
    fn format_record(&self, record: &LogRecord) -> String {
        match record.text() {
            Some(text) => text.to_string(),
            None => self.format_fields(record.fields()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_keeps_field_order() {
        let record = LogRecord::new()
            .with_field("zebra", "last")
            .with_field("level", "info")
            .with_field("count", 42i64);
        assert_eq!(
            LogfmtFormatter::new().format_record(&record),
            "zebra=last level=info count=42"
        );
    }

    #[test]
    fn test_quoting_behavior() {
        let record = LogRecord::new()
            .with_field("simple", "value")
            .with_field("spaced", "has spaces")
            .with_field("empty", "")
            .with_field("absent", Value::Absent)
            .with_field("quoted", "has\"quotes")
            .with_field("multi", "a\nb");
        let result = LogfmtFormatter::new().format_record(&record);

        assert!(result.contains("simple=value"));
        assert!(result.contains("spaced=\"has spaces\""));
        assert!(result.contains("empty=\"\""));
        assert!(result.contains("absent=\"\""));
        assert!(result.contains("quoted=\"has\\\"quotes\""));
        assert!(result.contains("multi=\"a\\nb\""));
    }

    #[test]
    fn test_text_record_passthrough() {
        let record = LogRecord::from_text("hello world");
        assert_eq!(LogfmtFormatter::new().format_record(&record), "hello world");
    }
}
