// src/eval.rs
use crate::query::Expression;
use crate::value::{LogRecord, Value};
use crate::variables::Scope;
use std::borrow::Cow;

static ABSENT: Value = Value::Absent;

/// Resolve an expression against the current record and scopes.
///
/// Never fails: unknown variables and missing fields are `Absent`.
pub fn evaluate<'a>(
    expression: &'a Expression,
    record: &'a LogRecord,
    transient: &'a Scope,
    persistent: &'a Scope,
) -> Cow<'a, Value> {
    match expression {
        Expression::Record => Cow::Owned(Value::String(record.render().into_owned())),
        Expression::Var(name) => Cow::Borrowed(transient.get(name).unwrap_or(&ABSENT)),
        Expression::LastVarValue(name) => Cow::Borrowed(persistent.get(name).unwrap_or(&ABSENT)),
        Expression::Constant(value) => Cow::Borrowed(value),
        Expression::Field(name) => Cow::Borrowed(record.get(name)),
    }
}

/// [`evaluate`] followed by stringification, without copying when the
/// value is already a string.
pub fn evaluate_text<'a>(
    expression: &'a Expression,
    record: &'a LogRecord,
    transient: &'a Scope,
    persistent: &'a Scope,
) -> Cow<'a, str> {
    if let Expression::Record = expression {
        return record.render();
    }
    match evaluate(expression, record, transient, persistent) {
        Cow::Borrowed(value) => value.to_text(),
        Cow::Owned(value) => Cow::Owned(value.to_text().into_owned()),
    }
}
