// src/pipeline/stream.rs
use std::io::{BufRead, Write};
use std::time::Instant;

use crate::error::{ProcessingError, QueryError};
use crate::output_format::OutputFormatter;
use crate::pipeline::config::{ErrorStrategy, PipelineConfig};
use crate::pipeline::context::{ParseErrorInfo, ProcessingStats};
use crate::query::{CompiledQuery, Query};

/// Reads lines, turns them into records, runs the query over them and writes
/// what survives.
pub struct StreamPipeline {
    query: CompiledQuery,
    config: PipelineConfig,
    stats: ProcessingStats,
}

impl StreamPipeline {
    pub fn new(query: CompiledQuery, config: PipelineConfig) -> Self {
        StreamPipeline {
            query,
            config,
            stats: ProcessingStats::default(),
        }
    }

    /// Validate `query` and build a pipeline for it
    pub fn from_query(query: &Query, config: PipelineConfig) -> Result<Self, QueryError> {
        Ok(Self::new(query.compile()?, config))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process a single file/stream.
    ///
    /// Each stream is its own run: `lastVarValue` on its first record sees
    /// no bindings.
    pub fn process_stream<R: BufRead, W: Write>(
        &mut self,
        mut input: R,
        output: &mut W,
        filename: Option<&str>,
    ) -> Result<ProcessingStats, ProcessingError> {
        let start_time = Instant::now();
        let source = filename.unwrap_or("<stdin>");
        let parser = self.config.input_format.parser();
        let format_name = self.config.input_format.name();
        let mut formatter =
            OutputFormatter::new(self.config.output_format, self.config.use_colors);
        let mut run = self.query.start();

        let mut file_stats = ProcessingStats::default();

        let mut buffer = Vec::new();
        let mut line_number = 0;

        loop {
            buffer.clear();
            match input.read_until(b'\n', &mut buffer) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(ProcessingError::IoError(e)),
            }
            if buffer.last() == Some(&b'\n') {
                buffer.pop();
            }
            line_number += 1;
            file_stats.lines_seen += 1;

            if buffer.len() > self.config.max_line_length {
                let error = ProcessingError::LineTooLong {
                    length: buffer.len(),
                    max_length: self.config.max_line_length,
                };
                match self.config.error_strategy {
                    ErrorStrategy::FailFast => return Err(error),
                    ErrorStrategy::Skip => {
                        tracing::debug!(source, line = line_number, "line too long, skipping");
                        skip_line(&mut file_stats, line_number, format_name, error.to_string());
                        continue;
                    }
                }
            }

            let parsed = match std::str::from_utf8(&buffer) {
                Ok(line) => parser.parse_line(line),
                Err(e) => Err(format!("invalid UTF-8: {}", e)),
            };
            let record = match parsed {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(message) => match self.config.error_strategy {
                    ErrorStrategy::FailFast => {
                        return Err(ProcessingError::ParseError {
                            line: line_number,
                            format: format_name.to_string(),
                            message,
                        })
                    }
                    ErrorStrategy::Skip => {
                        tracing::debug!(
                            source,
                            line = line_number,
                            error = %message,
                            "unreadable line, skipping"
                        );
                        skip_line(&mut file_stats, line_number, format_name, message);
                        continue;
                    }
                },
            };

            file_stats.records_processed += 1;
            match run.process(record) {
                Some(output_record) => {
                    if let Err(e) = formatter.write_record(output, &output_record) {
                        if is_broken_pipe(&e) {
                            break;
                        }
                        return Err(e);
                    }
                    file_stats.records_output += 1;
                }
                None => file_stats.records_skipped += 1,
            }

            if self.config.progress_interval > 0
                && file_stats.records_processed % self.config.progress_interval == 0
            {
                tracing::info!(
                    source,
                    processed = file_stats.records_processed,
                    output = file_stats.records_output,
                    "progress"
                );
            }
        }

        if let Err(e) = output.flush() {
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(ProcessingError::IoError(e));
            }
        }

        file_stats.processing_time = start_time.elapsed();

        tracing::info!(
            source,
            processed = file_stats.records_processed,
            output = file_stats.records_output,
            skipped = file_stats.records_skipped,
            elapsed_ms = file_stats.processing_time.as_millis() as u64,
            "finished stream"
        );
        if file_stats.errors > 0 {
            tracing::warn!(
                source,
                lines = file_stats.errors,
                "skipped lines that could not be read as {} records",
                format_name
            );
        }

        self.stats.accumulate(&file_stats);

        Ok(file_stats)
    }

    /// Get current accumulated stats
    pub fn get_stats(&self) -> &ProcessingStats {
        &self.stats
    }
}

fn skip_line(stats: &mut ProcessingStats, line_number: usize, format_name: &str, error: String) {
    stats.errors += 1;
    stats.parse_errors.push(ParseErrorInfo {
        line_number,
        format_name: format_name.to_string(),
        error,
    });
}

fn is_broken_pipe(error: &ProcessingError) -> bool {
    matches!(error, ProcessingError::IoError(e) if e.kind() == std::io::ErrorKind::BrokenPipe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input_format::InputFormat;
    use crate::output_format::OutputFormat;
    use crate::query::{Condition, Expression, Operation};
    use std::io::Cursor;

    fn skip_matching(pattern: &str) -> Query {
        Query::new(vec![Operation::branch(
            Condition::matches(Expression::Record, pattern),
            vec![Operation::SkipRecord],
            vec![],
        )])
    }

    fn line_config() -> PipelineConfig {
        PipelineConfig {
            output_format: OutputFormat::Line,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_text_lines_filtered() {
        let mut pipeline =
            StreamPipeline::from_query(&skip_matching("DEBUG"), line_config()).unwrap();
        let input = Cursor::new("INFO start\nDEBUG noise\nINFO done\n");
        let mut output = Vec::new();

        let stats = pipeline.process_stream(input, &mut output, None).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "INFO start\nINFO done\n");
        assert_eq!(stats.records_processed, 3);
        assert_eq!(stats.records_output, 2);
        assert_eq!(stats.records_skipped, 1);
    }

    #[test]
    fn test_bad_lines_skipped_and_counted() {
        let config = PipelineConfig {
            input_format: InputFormat::Jsonl,
            ..line_config()
        };
        let mut pipeline = StreamPipeline::from_query(&Query::default(), config).unwrap();
        let input = Cursor::new("{\"msg\":\"a\"}\nnot json\n\n{\"msg\":\"b\"}\n");
        let mut output = Vec::new();

        let stats = pipeline.process_stream(input, &mut output, None).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "msg=a\nmsg=b\n");
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.parse_errors[0].line_number, 2);
        assert_eq!(stats.parse_errors[0].format_name, "jsonl");
    }

    #[test]
    fn test_invalid_utf8_line_skipped() {
        let mut pipeline = StreamPipeline::from_query(&Query::default(), line_config()).unwrap();
        let input = Cursor::new(b"first\nbad \xff byte\nthird\n".to_vec());
        let mut output = Vec::new();

        let stats = pipeline.process_stream(input, &mut output, None).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "first\nthird\n");
        assert_eq!(stats.lines_seen, 3);
        assert_eq!(stats.records_processed, 2);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.parse_errors[0].line_number, 2);
        assert!(stats.parse_errors[0].error.starts_with("invalid UTF-8"));
    }

    #[test]
    fn test_invalid_utf8_line_fails_fast() {
        let config = PipelineConfig {
            error_strategy: ErrorStrategy::FailFast,
            ..line_config()
        };
        let mut pipeline = StreamPipeline::from_query(&Query::default(), config).unwrap();
        let input = Cursor::new(b"first\n\xfe\xff\n".to_vec());
        let mut output = Vec::new();

        let err = pipeline.process_stream(input, &mut output, None).unwrap_err();
        assert!(matches!(err, ProcessingError::ParseError { line: 2, .. }));
    }

    #[test]
    fn test_fail_fast_stops_on_bad_line() {
        let config = PipelineConfig {
            input_format: InputFormat::Logfmt,
            error_strategy: ErrorStrategy::FailFast,
            ..line_config()
        };
        let mut pipeline = StreamPipeline::from_query(&Query::default(), config).unwrap();
        let input = Cursor::new("a=1\nbroken line\na=2\n");
        let mut output = Vec::new();

        let err = pipeline.process_stream(input, &mut output, None).unwrap_err();
        assert!(matches!(err, ProcessingError::ParseError { line: 2, .. }));
    }

    #[test]
    fn test_long_lines() {
        let config = PipelineConfig {
            max_line_length: 5,
            ..line_config()
        };
        let mut pipeline = StreamPipeline::from_query(&Query::default(), config).unwrap();
        let mut output = Vec::new();
        let stats = pipeline
            .process_stream(Cursor::new("short\nmuch too long\n"), &mut output, None)
            .unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "short\n");
        assert_eq!(stats.errors, 1);
    }

    #[test]
    fn test_streams_do_not_share_variables() {
        let query = Query::new(vec![
            Operation::color_by(Expression::last_var_value("prev")),
            Operation::set("prev", Expression::Record),
        ]);
        let mut pipeline = StreamPipeline::from_query(&query, PipelineConfig::default()).unwrap();

        let mut first = Vec::new();
        pipeline
            .process_stream(Cursor::new("a\nb\n"), &mut first, Some("one.log"))
            .unwrap();
        let mut second = Vec::new();
        pipeline
            .process_stream(Cursor::new("c\n"), &mut second, Some("two.log"))
            .unwrap();

        let first = String::from_utf8(first).unwrap();
        let lines: Vec<&str> = first.lines().collect();
        assert!(lines[0].contains("\"color\":\"\""));
        assert!(lines[1].contains("\"color\":\"a\""));
        assert!(String::from_utf8(second).unwrap().contains("\"color\":\"\""));

        assert_eq!(pipeline.get_stats().records_processed, 3);
    }
}
