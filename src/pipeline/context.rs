use std::time::Duration;

/// Parse error details for deferred reporting
#[derive(Debug, Clone)]
pub struct ParseErrorInfo {
    pub line_number: usize,
    pub format_name: String,
    pub error: String,
}

/// Runtime statistics
#[derive(Debug, Default, Clone)]
pub struct ProcessingStats {
    /// Input lines read, including unparseable ones
    pub lines_seen: usize,
    /// Records handed to the query
    pub records_processed: usize,
    pub records_output: usize,
    /// Records dropped by `skipRecord`
    pub records_skipped: usize,
    /// Lines that never became records
    pub errors: usize,
    pub processing_time: Duration,
    pub parse_errors: Vec<ParseErrorInfo>,
}

impl ProcessingStats {
    /// Fold the stats of one stream into a running total
    pub fn accumulate(&mut self, other: &ProcessingStats) {
        self.lines_seen += other.lines_seen;
        self.records_processed += other.records_processed;
        self.records_output += other.records_output;
        self.records_skipped += other.records_skipped;
        self.errors += other.errors;
        self.processing_time += other.processing_time;
        self.parse_errors.extend(other.parse_errors.iter().cloned());
    }

    /// Records processed per second, if any time elapsed
    pub fn rate(&self) -> Option<f64> {
        let secs = self.processing_time.as_secs_f64();
        (self.records_processed > 0 && secs > 0.0).then(|| self.records_processed as f64 / secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate() {
        let mut total = ProcessingStats::default();
        let file = ProcessingStats {
            lines_seen: 4,
            records_processed: 3,
            records_output: 2,
            records_skipped: 1,
            errors: 1,
            processing_time: Duration::from_millis(5),
            parse_errors: vec![ParseErrorInfo {
                line_number: 2,
                format_name: "jsonl".to_string(),
                error: "expected a JSON object".to_string(),
            }],
        };
        total.accumulate(&file);
        total.accumulate(&file);
        assert_eq!(total.lines_seen, 8);
        assert_eq!(total.records_output, 4);
        assert_eq!(total.parse_errors.len(), 2);
        assert_eq!(total.processing_time, Duration::from_millis(10));
    }

    #[test]
    fn test_rate_without_records() {
        assert_eq!(ProcessingStats::default().rate(), None);
    }
}
