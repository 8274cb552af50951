// src/input_format.rs - turning input lines into log records

use crate::flatten::flatten_record;
use crate::value::LogRecord;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum InputFormat {
    #[default]
    #[value(name = "line", help = "Raw text lines")]
    Line,
    #[value(name = "jsonl", help = "JSON Lines format (one JSON object per line)")]
    Jsonl,
    #[value(name = "logfmt", help = "Logfmt format (key=value pairs)")]
    Logfmt,
}

impl InputFormat {
    pub fn name(&self) -> &'static str {
        match self {
            InputFormat::Line => "line",
            InputFormat::Jsonl => "jsonl",
            InputFormat::Logfmt => "logfmt",
        }
    }

    pub fn parser(&self) -> Box<dyn LineParser> {
        match self {
            InputFormat::Line => Box::new(TextParser),
            InputFormat::Jsonl => Box::new(JsonlParser),
            InputFormat::Logfmt => Box::new(LogfmtParser),
        }
    }
}

pub trait LineParser {
    /// `Ok(None)` for lines that carry no record (blank lines in structured
    /// formats)
    fn parse_line(&self, line: &str) -> Result<Option<LogRecord>, String>;
}

pub struct TextParser;
pub struct JsonlParser;
pub struct LogfmtParser;

impl LineParser for TextParser {
    fn parse_line(&self, line: &str) -> Result<Option<LogRecord>, String> {
        Ok(Some(LogRecord::from_text(line.trim_end_matches('\r'))))
    }
}

impl LineParser for JsonlParser {
    fn parse_line(&self, line: &str) -> Result<Option<LogRecord>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        match serde_json::from_str::<serde_json::Value>(line) {
            Ok(serde_json::Value::Object(obj)) => Ok(Some(flatten_record(&obj))),
            Ok(_) => Err("expected a JSON object".to_string()),
            Err(e) => Err(format!("Failed to parse JSONL: {}", e)),
        }
    }
}

impl LogfmtParser {
    // Parse logfmt line: key1=value1 key2="value with spaces" key3=value3
    fn parse_logfmt_pairs(&self, line: &str) -> Result<Vec<(String, String)>, String> {
        let mut pairs = Vec::new();
        let mut chars = line.chars().peekable();

        loop {
            while chars.peek() == Some(&' ') || chars.peek() == Some(&'\t') {
                chars.next();
            }
            if chars.peek().is_none() {
                break;
            }

            let mut key = String::new();
            while let Some(&ch) = chars.peek() {
                match ch {
                    '=' => break,
                    ' ' | '\t' => return Err(format!("Key '{}' is missing '='", key)),
                    _ => {
                        key.push(ch);
                        chars.next();
                    }
                }
            }

            if key.is_empty() {
                return Err("Empty key found".to_string());
            }
            if chars.next() != Some('=') {
                return Err(format!("Expected '=' after key '{}'", key));
            }

            let mut value = String::new();
            if chars.peek() == Some(&'"') {
                chars.next();
                let mut closed = false;
                while let Some(ch) = chars.next() {
                    match ch {
                        '"' => {
                            closed = true;
                            break;
                        }
                        '\\' => match chars.next() {
                            Some('n') => value.push('\n'),
                            Some('t') => value.push('\t'),
                            Some('r') => value.push('\r'),
                            Some(escaped) => value.push(escaped),
                            None => value.push('\\'),
                        },
                        _ => value.push(ch),
                    }
                }
                if !closed {
                    return Err(format!("Unclosed quote in value of '{}'", key));
                }
            } else {
                while let Some(&ch) = chars.peek() {
                    if ch == ' ' || ch == '\t' {
                        break;
                    }
                    value.push(ch);
                    chars.next();
                }
            }

            pairs.push((key, value));
        }

        Ok(pairs)
    }
}

impl LineParser for LogfmtParser {
    fn parse_line(&self, line: &str) -> Result<Option<LogRecord>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let pairs = self.parse_logfmt_pairs(line)?;
        Ok(Some(LogRecord::from_fields(pairs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_text_lines_keep_content() {
        let record = TextParser.parse_line("  hello world\r").unwrap().unwrap();
        assert_eq!(record.text(), Some("  hello world"));

        let blank = TextParser.parse_line("").unwrap().unwrap();
        assert_eq!(blank.text(), Some(""));
    }

    #[test]
    fn test_jsonl_objects_only() {
        let record = JsonlParser
            .parse_line(r#"{"level": "info", "req": {"id": 7}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(record.get("level"), &Value::from("info"));
        assert_eq!(record.get("req.id"), &Value::from(7i64));

        assert!(JsonlParser.parse_line("   ").unwrap().is_none());
        assert!(JsonlParser.parse_line("[1, 2]").is_err());
        assert!(JsonlParser.parse_line("{broken").is_err());
    }

    #[test]
    fn test_logfmt_pairs() {
        let record = LogfmtParser
            .parse_line(r#"level=warn msg="disk \"almost\" full" path=/var"#)
            .unwrap()
            .unwrap();
        assert_eq!(record.get("level"), &Value::from("warn"));
        assert_eq!(record.get("msg"), &Value::from("disk \"almost\" full"));
        assert_eq!(record.get("path"), &Value::from("/var"));
    }

    #[test]
    fn test_logfmt_errors() {
        assert!(LogfmtParser.parse_line("novalue other=1").is_err());
        assert!(LogfmtParser.parse_line("=x").is_err());
        assert!(LogfmtParser.parse_line(r#"msg="open"#).is_err());
    }

    #[test]
    fn test_format_names() {
        assert_eq!(InputFormat::default(), InputFormat::Line);
        assert_eq!(InputFormat::Logfmt.name(), "logfmt");
    }
}
