use serde_json::{Map, Number, Value};

use crate::logic::QueryError;
use crate::model::{ComparisonOp, Filter, FilterValue, RawQuery};

/// Keys that carry pagination or control data, never predicates
pub const RESERVED_KEYS: [&str; 5] = ["page", "sort", "limit", "select", "search"];

/// Compile caller input into an operator-safe filter.
///
/// Strings `"true"`/`"false"` become booleans and numeric strings become
/// numbers, recursively through objects; array elements keep their text.
/// Object keys anywhere in the structure, array elements included, that
/// are exactly a comparison token (`gt`, `in`, ...) or its `$`-prefixed
/// form become operators. Objects that mix operators
/// with plain keys, unknown `$` keys and operators without a field are
/// rejected as a whole.
pub fn compile_filter(raw: &RawQuery) -> Result<Filter, QueryError> {
    let mut filter = Filter::new();

    for (field, value) in raw.iter() {
        if RESERVED_KEYS.contains(&field.as_str()) {
            continue;
        }
        if field.is_empty() {
            return Err(QueryError::filter(field, "field name is empty"));
        }
        if field.starts_with('$') || ComparisonOp::from_key(field).is_some() {
            return Err(QueryError::filter(field, "operator is not attached to a field"));
        }

        let condition = match retype(value.clone()) {
            Value::Object(map) => match rewrite_object(field, map)? {
                Rewritten::Plain(map) => FilterValue::Literal(Value::Object(map)),
                Rewritten::Operators(ops) => FilterValue::Compare(ops),
            },
            other => FilterValue::Literal(rewrite_value(field, other)?),
        };
        filter.set(field.clone(), condition);
    }

    Ok(filter)
}

/// Coerce a single query-string value
pub fn coerce_scalar(text: String) -> Value {
    match text.as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::String(text);
    }
    if let Ok(integer) = trimmed.parse::<i64>() {
        return Value::from(integer);
    }
    match trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
        Some(number) if !trimmed.chars().any(char::is_alphabetic) || is_exponent(trimmed) => {
            Value::Number(number)
        }
        _ => Value::String(text),
    }
}

// `1e3` is a number, `inf` and `NaN` are not
fn is_exponent(text: &str) -> bool {
    text.chars().filter(|c| c.is_alphabetic()).all(|c| c == 'e' || c == 'E')
}

fn retype(value: Value) -> Value {
    match value {
        Value::String(text) => coerce_scalar(text),
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, retype(v))).collect()),
        other => other,
    }
}

enum Rewritten {
    Plain(Map<String, Value>),
    Operators(Vec<(ComparisonOp, Value)>),
}

fn rewrite_object(field: &str, map: Map<String, Value>) -> Result<Rewritten, QueryError> {
    let operator_keys = map
        .keys()
        .filter(|key| ComparisonOp::from_key(key).is_some())
        .count();

    if operator_keys == 0 {
        let mut plain = Map::new();
        for (key, value) in map {
            if key.starts_with('$') {
                return Err(QueryError::filter(field, format!("unsupported operator `{key}`")));
            }
            plain.insert(key, rewrite_value(field, value)?);
        }
        return Ok(Rewritten::Plain(plain));
    }

    if operator_keys != map.len() {
        return Err(QueryError::filter(
            field,
            "operators cannot be mixed with field names",
        ));
    }

    let mut ops: Vec<(ComparisonOp, Value)> = Vec::with_capacity(map.len());
    for (key, value) in map {
        let Some(op) = ComparisonOp::from_key(&key) else {
            continue;
        };
        if ops.iter().any(|(seen, _)| *seen == op) {
            return Err(QueryError::filter(
                field,
                format!("operator `{}` given twice", op.token()),
            ));
        }
        let value = match (op, rewrite_value(field, value)?) {
            (ComparisonOp::In, Value::Array(items)) => Value::Array(items),
            (ComparisonOp::In, Value::Object(_)) => {
                return Err(QueryError::filter(field, "`in` expects a list of values"));
            }
            (ComparisonOp::In, scalar) => Value::Array(vec![scalar]),
            (_, other) => other,
        };
        ops.push((op, value));
    }
    Ok(Rewritten::Operators(ops))
}

fn rewrite_value(field: &str, value: Value) -> Result<Value, QueryError> {
    match value {
        Value::Object(map) => match rewrite_object(field, map)? {
            Rewritten::Plain(map) => Ok(Value::Object(map)),
            Rewritten::Operators(ops) => Ok(FilterValue::Compare(ops).to_document()),
        },
        Value::Array(items) => items
            .into_iter()
            .map(|item| rewrite_value(field, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Ok(other),
    }
}
