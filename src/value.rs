// src/value.rs
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Separator between `key=value` pairs when a whole record is rendered
pub const RECORD_DELIMITER: &str = " ";

/// Runtime value of a log field or variable.
///
/// Serialized untagged: strings, numbers and booleans as the matching JSON
/// scalar, `Absent` as `null`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Absent,
    Boolean(bool),
    Number(serde_json::Number),
    String(String),
}

impl Value {
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// Stringify by the single rule shared by pattern matching and coloring:
    /// strings as-is, numbers as canonical decimal text, booleans as
    /// `true`/`false`, absent as the empty string.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Value::String(s) => Cow::Borrowed(s),
            Value::Absent => Cow::Borrowed(""),
            other => Cow::Owned(other.to_string()),
        }
    }

    /// Convert a JSON scalar. Objects and arrays have no `Value` form.
    pub fn from_json(json: &serde_json::Value) -> Option<Value> {
        match json {
            serde_json::Value::Null => Some(Value::Absent),
            serde_json::Value::Bool(b) => Some(Value::Boolean(*b)),
            serde_json::Value::Number(n) => Some(Value::Number(n.clone())),
            serde_json::Value::String(s) => Some(Value::String(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Absent => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Absent => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<f64> for Value {
    /// Non-finite floats have no JSON number form and become `Absent`.
    fn from(n: f64) -> Self {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Absent)
    }
}

/// One log entry: an ordered field mapping, optionally with the raw line it
/// was read from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    fields: IndexMap<String, Value>,
}

impl LogRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for an unstructured log line
    pub fn from_text(text: impl Into<String>) -> Self {
        LogRecord {
            text: Some(text.into()),
            fields: IndexMap::new(),
        }
    }

    pub fn from_fields<K, V, I>(fields: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        fields.into_iter().collect()
    }

    /// Builder-style field insertion. A repeated key replaces the earlier value
    /// in place, so keys stay unique.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Field lookup; missing fields are `Absent`
    pub fn get(&self, name: &str) -> &Value {
        static ABSENT: Value = Value::Absent;
        self.fields.get(name).unwrap_or(&ABSENT)
    }

    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.fields
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Whole-record rendering used by the `record` expression.
    ///
    /// Text records render as their line. Structured records render as
    /// `key=value` pairs sorted by key so matching does not depend on field
    /// order.
    pub fn render(&self) -> Cow<'_, str> {
        if let Some(text) = &self.text {
            return Cow::Borrowed(text);
        }

        let mut pairs: Vec<(&String, &Value)> = self.fields.iter().collect();
        pairs.sort_by(|(a, _), (b, _)| a.cmp(b));
        let rendered: Vec<String> = pairs
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        Cow::Owned(rendered.join(RECORD_DELIMITER))
    }
}

impl<K, V> FromIterator<(K, V)> for LogRecord
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        LogRecord {
            text: None,
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A record that survived its pass, with the pass's annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    #[serde(flatten)]
    pub record: LogRecord,
    /// Last color tag set by `colorBy`, if any ran
    #[serde(default)]
    pub color: Option<String>,
    /// Transient variable bindings at the end of the pass
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, Value>,
}

impl OutputRecord {
    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }
}

/// Output of a query run: emitted records in input order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Results {
    records: Vec<OutputRecord>,
}

impl Results {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[OutputRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OutputRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<OutputRecord> {
        self.records
    }
}

impl FromIterator<OutputRecord> for Results {
    fn from_iter<I: IntoIterator<Item = OutputRecord>>(iter: I) -> Self {
        Results {
            records: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Results {
    type Item = OutputRecord;
    type IntoIter = std::vec::IntoIter<OutputRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a Results {
    type Item = &'a OutputRecord;
    type IntoIter = std::slice::Iter<'a, OutputRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
