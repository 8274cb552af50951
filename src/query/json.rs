// src/query/json.rs - wire format of queries
use crate::error::QueryError;
use crate::query::{Condition, Expression, Operation, Query};
use crate::value::Value;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value as Json};

type Map = serde_json::Map<String, Json>;

fn child(path: &str, key: &str) -> String {
    format!("{}.{}", path, key)
}

fn expect_object<'a>(json: &'a Json, path: &str) -> Result<&'a Map, QueryError> {
    match json {
        Json::Object(obj) => Ok(obj),
        _ => Err(QueryError::invalid(path, "expected an object")),
    }
}

fn expect_string(json: &Json, path: &str) -> Result<String, QueryError> {
    match json {
        Json::String(s) => Ok(s.clone()),
        _ => Err(QueryError::invalid(path, "expected a string")),
    }
}

fn reject_unknown_keys(obj: &Map, allowed: &[&str], path: &str) -> Result<(), QueryError> {
    match obj.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(QueryError::invalid(path, format!("unexpected key {:?}", key))),
        None => Ok(()),
    }
}

/// Tagged objects (`{"set": {...}}`) carry exactly one key
fn single_entry<'a>(obj: &'a Map, path: &str) -> Result<(&'a String, &'a Json), QueryError> {
    let mut entries = obj.iter();
    match (entries.next(), entries.next()) {
        (Some(entry), None) => Ok(entry),
        (None, _) => Err(QueryError::invalid(path, "expected exactly one key, found none")),
        (Some(_), Some(_)) => Err(QueryError::invalid(
            path,
            format!("expected exactly one key, found {}", obj.len()),
        )),
    }
}

pub(crate) fn read_query(json: &Json) -> Result<Query, QueryError> {
    let obj = expect_object(json, "query")?;
    reject_unknown_keys(obj, &["operations"], "query")?;
    let operations = match obj.get("operations") {
        Some(Json::Array(items)) => read_operations(items, "operations")?,
        Some(_) => return Err(QueryError::invalid("operations", "expected an array")),
        None => return Err(QueryError::invalid("query", "missing key \"operations\"")),
    };
    Ok(Query { operations })
}

fn read_operations(items: &[Json], path: &str) -> Result<Vec<Operation>, QueryError> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| read_operation(item, &format!("{}[{}]", path, i)))
        .collect()
}

fn read_operation(json: &Json, path: &str) -> Result<Operation, QueryError> {
    let obj = expect_object(json, path)?;
    let (tag, body) = single_entry(obj, path)?;
    let inner = child(path, tag);
    match tag.as_str() {
        "if" => read_if(body, &inner),
        "set" => read_set(body, &inner),
        "colorBy" => Ok(Operation::ColorBy(read_expression(body, &inner)?)),
        "skipRecord" | "skip" => {
            let body = expect_object(body, &inner)?;
            if !body.is_empty() {
                return Err(QueryError::invalid(inner, "expected an empty object"));
            }
            Ok(Operation::SkipRecord)
        }
        other => Err(QueryError::invalid(path, format!("unknown operation {:?}", other))),
    }
}

fn read_if(json: &Json, path: &str) -> Result<Operation, QueryError> {
    let obj = expect_object(json, path)?;
    reject_unknown_keys(obj, &["condition", "match", "then", "else"], path)?;

    let condition = match (obj.get("condition"), obj.get("match")) {
        (Some(condition), None) => read_condition(condition, &child(path, "condition"))?,
        (None, Some(body)) => read_match(body, &child(path, "match"))?,
        (Some(_), Some(_)) => {
            return Err(QueryError::invalid(
                path,
                "use either \"condition\" or \"match\", not both",
            ))
        }
        (None, None) => return Err(QueryError::invalid(path, "missing condition")),
    };

    Ok(Operation::If {
        condition,
        then_ops: read_branch(obj.get("then"), &child(path, "then"))?,
        else_ops: read_branch(obj.get("else"), &child(path, "else"))?,
    })
}

fn read_branch(json: Option<&Json>, path: &str) -> Result<Vec<Operation>, QueryError> {
    match json {
        None => Ok(Vec::new()),
        Some(Json::Array(items)) => read_operations(items, path),
        Some(_) => Err(QueryError::invalid(path, "expected an array of operations")),
    }
}

fn read_condition(json: &Json, path: &str) -> Result<Condition, QueryError> {
    let obj = expect_object(json, path)?;
    let (tag, body) = single_entry(obj, path)?;
    match tag.as_str() {
        "match" => read_match(body, &child(path, "match")),
        other => Err(QueryError::invalid(path, format!("unknown condition {:?}", other))),
    }
}

fn read_match(json: &Json, path: &str) -> Result<Condition, QueryError> {
    let obj = expect_object(json, path)?;
    reject_unknown_keys(obj, &["expression", "pattern"], path)?;
    let expression = match obj.get("expression") {
        Some(expression) => read_expression(expression, &child(path, "expression"))?,
        None => return Err(QueryError::invalid(path, "missing expression")),
    };
    let pattern = match obj.get("pattern") {
        Some(pattern) => expect_string(pattern, &child(path, "pattern"))?,
        None => return Err(QueryError::invalid(path, "missing pattern")),
    };
    Ok(Condition {
        expression,
        pattern,
    })
}

fn read_set(json: &Json, path: &str) -> Result<Operation, QueryError> {
    let obj = expect_object(json, path)?;
    reject_unknown_keys(obj, &["target", "expression"], path)?;
    let target = match obj.get("target") {
        Some(target) => expect_string(target, &child(path, "target"))?,
        None => return Err(QueryError::invalid(path, "missing target")),
    };
    let expression = match obj.get("expression") {
        Some(expression) => read_expression(expression, &child(path, "expression"))?,
        None => Expression::Constant(Value::from("")),
    };
    Ok(Operation::Set { target, expression })
}

fn read_expression(json: &Json, path: &str) -> Result<Expression, QueryError> {
    let obj = expect_object(json, path)?;
    let (tag, body) = single_entry(obj, path)?;
    let inner = child(path, tag);
    match tag.as_str() {
        "record" => match body {
            Json::Null => Ok(Expression::Record),
            Json::Object(fields) if fields.is_empty() => Ok(Expression::Record),
            _ => Err(QueryError::invalid(inner, "expected an empty object")),
        },
        "var" | "variable" => Ok(Expression::Var(expect_string(body, &inner)?)),
        "lastVarValue" | "lastVariableValue" => {
            Ok(Expression::LastVarValue(expect_string(body, &inner)?))
        }
        "field" => Ok(Expression::Field(expect_string(body, &inner)?)),
        "constant" => Value::from_json(body).map(Expression::Constant).ok_or_else(|| {
            QueryError::invalid(inner, "expected a string, number, boolean or null")
        }),
        other => Err(QueryError::invalid(path, format!("unknown expression {:?}", other))),
    }
}

pub(crate) fn write_query(query: &Query) -> Json {
    json!({ "operations": write_operations(&query.operations) })
}

fn write_operations(operations: &[Operation]) -> Json {
    Json::Array(operations.iter().map(write_operation).collect())
}

fn write_operation(operation: &Operation) -> Json {
    let body = match operation {
        Operation::If {
            condition,
            then_ops,
            else_ops,
        } => json!({
            "condition": {
                "match": {
                    "expression": write_expression(&condition.expression),
                    "pattern": condition.pattern,
                }
            },
            "then": write_operations(then_ops),
            "else": write_operations(else_ops),
        }),
        Operation::Set { target, expression } => json!({
            "target": target,
            "expression": write_expression(expression),
        }),
        Operation::ColorBy(expression) => write_expression(expression),
        Operation::SkipRecord => json!({}),
    };
    let mut obj = Map::new();
    obj.insert(operation.tag().to_string(), body);
    Json::Object(obj)
}

fn write_expression(expression: &Expression) -> Json {
    let body = match expression {
        Expression::Record => json!({}),
        Expression::Var(name) | Expression::LastVarValue(name) | Expression::Field(name) => {
            Json::String(name.clone())
        }
        Expression::Constant(value) => value.to_json(),
    };
    let mut obj = Map::new();
    obj.insert(expression.tag().to_string(), body);
    Json::Object(obj)
}

impl Serialize for Query {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        write_query(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Query {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = Json::deserialize(deserializer)?;
        read_query(&json).map_err(serde::de::Error::custom)
    }
}
