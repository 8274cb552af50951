use crate::colors::{ColorAllocator, RESET};
use crate::error::ProcessingError;
use crate::formatters::logfmt::LogfmtFormatter;
use crate::formatters::RecordFormatter;
use crate::value::OutputRecord;
use std::io::Write;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    #[value(
        name = "jsonl",
        help = "JSON Lines: the record with its color and variables"
    )]
    Jsonl,
    #[value(name = "line", help = "Display text, colored by the record's color tag")]
    Line,
}

pub struct OutputFormatter {
    format: OutputFormat,
    use_colors: bool,
    colors: ColorAllocator,
    logfmt: LogfmtFormatter,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, use_colors: bool) -> Self {
        OutputFormatter {
            format,
            use_colors,
            colors: ColorAllocator::new(),
            logfmt: LogfmtFormatter::new(),
        }
    }

    pub fn write_record<W: Write>(
        &mut self,
        output: &mut W,
        record: &OutputRecord,
    ) -> Result<(), ProcessingError> {
        match self.format {
            OutputFormat::Jsonl => self.write_jsonl(output, record),
            OutputFormat::Line => self.write_line(output, record),
        }
    }

    fn write_jsonl<W: Write>(
        &mut self,
        output: &mut W,
        record: &OutputRecord,
    ) -> Result<(), ProcessingError> {
        let json_line = serde_json::to_string(record)
            .map_err(|e| ProcessingError::OutputError(format!("JSON encoding error: {}", e)))?;
        writeln!(output, "{}", json_line)?;
        Ok(())
    }

    fn write_line<W: Write>(
        &mut self,
        output: &mut W,
        record: &OutputRecord,
    ) -> Result<(), ProcessingError> {
        let text = self.logfmt.format_record(&record.record);
        let code = match record.color() {
            Some(tag) if self.use_colors => self.colors.code_for(tag),
            _ => None,
        };

        match code {
            Some(code) => writeln!(output, "{}{}{}", code, text, RESET)?,
            None => writeln!(output, "{}", text)?,
        }
        Ok(())
    }
}
