// src/query.rs
pub mod compile;
pub mod json;
pub mod pattern;

use crate::error::QueryError;
use crate::value::Value;

pub use compile::CompiledQuery;
pub use pattern::Pattern;

/// Produces a value from the current record and variable scopes
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// The whole current record
    Record,
    /// Variable set earlier in the current record's pass
    Var(String),
    /// Variable as it stood when the previous record's pass finished
    LastVarValue(String),
    Constant(Value),
    /// Field of the current record
    Field(String),
}

impl Expression {
    pub fn var(name: impl Into<String>) -> Self {
        Expression::Var(name.into())
    }

    pub fn last_var_value(name: impl Into<String>) -> Self {
        Expression::LastVarValue(name.into())
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        Expression::Constant(value.into())
    }

    pub fn field(name: impl Into<String>) -> Self {
        Expression::Field(name.into())
    }

    /// Wire tag of this expression
    pub fn tag(&self) -> &'static str {
        match self {
            Expression::Record => "record",
            Expression::Var(_) => "var",
            Expression::LastVarValue(_) => "lastVarValue",
            Expression::Constant(_) => "constant",
            Expression::Field(_) => "field",
        }
    }
}

/// True when `pattern` matches the stringified `expression`
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub expression: Expression,
    /// Regular expression, searched anywhere in the text
    pub pattern: String,
}

impl Condition {
    pub fn matches(expression: Expression, pattern: impl Into<String>) -> Self {
        Condition {
            expression,
            pattern: pattern.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    If {
        condition: Condition,
        then_ops: Vec<Operation>,
        else_ops: Vec<Operation>,
    },
    Set {
        target: String,
        expression: Expression,
    },
    ColorBy(Expression),
    SkipRecord,
}

impl Operation {
    pub fn branch(
        condition: Condition,
        then_ops: Vec<Operation>,
        else_ops: Vec<Operation>,
    ) -> Self {
        Operation::If {
            condition,
            then_ops,
            else_ops,
        }
    }

    pub fn set(target: impl Into<String>, expression: Expression) -> Self {
        Operation::Set {
            target: target.into(),
            expression,
        }
    }

    pub fn color_by(expression: Expression) -> Self {
        Operation::ColorBy(expression)
    }

    /// Wire tag of this operation
    pub fn tag(&self) -> &'static str {
        match self {
            Operation::If { .. } => "if",
            Operation::Set { .. } => "set",
            Operation::ColorBy(_) => "colorBy",
            Operation::SkipRecord => "skipRecord",
        }
    }
}

/// Operations applied, in order, to every record
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    pub operations: Vec<Operation>,
}

impl Query {
    pub fn new(operations: Vec<Operation>) -> Self {
        Query { operations }
    }

    /// Validate the query and compile its patterns
    pub fn compile(&self) -> Result<CompiledQuery, QueryError> {
        compile::compile(self)
    }

    pub fn from_json(json: &serde_json::Value) -> Result<Self, QueryError> {
        json::read_query(json)
    }

    pub fn to_json(&self) -> serde_json::Value {
        json::write_query(self)
    }

    pub fn from_json_str(text: &str) -> Result<Self, QueryError> {
        let json: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| QueryError::invalid("query", format!("malformed JSON: {}", e)))?;
        Self::from_json(&json)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, QueryError> {
        let json: serde_json::Value = serde_yaml::from_str(text)
            .map_err(|e| QueryError::invalid("query", format!("malformed YAML: {}", e)))?;
        Self::from_json(&json)
    }
}
