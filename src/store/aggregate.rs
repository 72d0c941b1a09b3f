use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use crate::model::{
    ComparisonOp, FieldExpr, Filter, FilterValue, Lookup, SortDirection, SortSpec, Stage,
};

/// Where `$lookup` stages read foreign collections from
pub trait CollectionSource {
    fn documents(&self, collection: &str) -> Vec<Value>;
}

impl CollectionSource for HashMap<String, Vec<Value>> {
    fn documents(&self, collection: &str) -> Vec<Value> {
        self.get(collection).cloned().unwrap_or_default()
    }
}

/// Evaluate a pipeline over `docs` in process
pub fn run_pipeline<C: CollectionSource + ?Sized>(
    docs: Vec<Value>,
    stages: &[Stage],
    source: &C,
) -> Vec<Value> {
    stages
        .iter()
        .fold(docs, |docs, stage| run_stage(docs, stage, source))
}

/// Every collection a pipeline touches through `$lookup`, recursively
pub fn referenced_collections(stages: &[Stage]) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for stage in stages {
        if let Stage::Lookup(lookup) = stage {
            names.insert(lookup.from.clone());
            names.extend(referenced_collections(&lookup.pipeline));
        }
    }
    names
}

fn run_stage<C: CollectionSource + ?Sized>(
    docs: Vec<Value>,
    stage: &Stage,
    source: &C,
) -> Vec<Value> {
    match stage {
        Stage::Match(filter) => docs.into_iter().filter(|doc| matches(doc, filter)).collect(),
        Stage::Lookup(lookup) => exec_lookup(docs, lookup, source),
        Stage::Unwind {
            path,
            preserve_null_and_empty_arrays,
        } => exec_unwind(docs, path, *preserve_null_and_empty_arrays),
        Stage::AddFields(fields) => docs
            .into_iter()
            .map(|mut doc| {
                for (name, expr) in fields {
                    if let Some(value) = eval_expr(&doc, expr) {
                        set_field(&mut doc, name, value);
                    }
                }
                doc
            })
            .collect(),
        Stage::Project(fields) => docs.into_iter().map(|doc| project(doc, fields)).collect(),
        Stage::Sort(sort) => exec_sort(docs, sort),
        Stage::Skip(n) => docs.into_iter().skip(clamp(*n)).collect(),
        Stage::Limit(n) => docs.into_iter().take(clamp(*n)).collect(),
        Stage::Count(field) => {
            if docs.is_empty() {
                return Vec::new();
            }
            let mut row = Map::new();
            row.insert(field.clone(), Value::from(docs.len()));
            vec![Value::Object(row)]
        }
    }
}

fn clamp(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Does `doc` satisfy every clause and at least one `$or` branch?
pub fn matches(doc: &Value, filter: &Filter) -> bool {
    let clauses_hold = filter
        .clauses()
        .iter()
        .all(|(field, condition)| condition_holds(resolve_field(doc, field), condition));

    clauses_hold
        && (filter.any_of().is_empty() || filter.any_of().iter().any(|alt| matches(doc, alt)))
}

fn condition_holds(actual: Option<&Value>, condition: &FilterValue) -> bool {
    match condition {
        FilterValue::Literal(expected) => equals_or_contains(actual, expected),
        FilterValue::Compare(ops) => ops.iter().all(|(op, operand)| compare(actual, *op, operand)),
    }
}

fn compare(actual: Option<&Value>, op: ComparisonOp, operand: &Value) -> bool {
    match op {
        ComparisonOp::Eq => equals_or_contains(actual, operand),
        ComparisonOp::Ne => !equals_or_contains(actual, operand),
        ComparisonOp::In => operand
            .as_array()
            .is_some_and(|candidates| candidates.iter().any(|c| equals_or_contains(actual, c))),
        ComparisonOp::Gt | ComparisonOp::Gte | ComparisonOp::Lt | ComparisonOp::Lte => {
            let satisfies = |value: &Value| match same_type_order(value, operand) {
                Some(ordering) => match op {
                    ComparisonOp::Gt => ordering == Ordering::Greater,
                    ComparisonOp::Gte => ordering != Ordering::Less,
                    ComparisonOp::Lt => ordering == Ordering::Less,
                    _ => ordering != Ordering::Greater,
                },
                None => false,
            };
            match actual {
                Some(Value::Array(items)) => items.iter().any(satisfies),
                Some(value) => satisfies(value),
                None => false,
            }
        }
    }
}

/// Equality with array membership: a scalar matches an array field
/// holding it; a missing field matches `null`.
fn equals_or_contains(actual: Option<&Value>, expected: &Value) -> bool {
    match actual {
        None => expected.is_null(),
        Some(Value::Array(items)) if !expected.is_array() => {
            items.iter().any(|item| values_equal(item, expected))
        }
        Some(value) => values_equal(value, expected),
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => match (l.as_f64(), r.as_f64()) {
            (Some(lf), Some(rf)) => lf == rf,
            _ => l == r,
        },
        _ => left == right,
    }
}

/// Ordering between values of the same kind; `None` for mixed kinds
fn same_type_order(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.as_f64()?.partial_cmp(&r.as_f64()?),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Field access
// ---------------------------------------------------------------------------

pub(crate) fn resolve_field<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(doc, |current, part| current.as_object()?.get(part))
}

pub(crate) fn set_field(doc: &mut Value, path: &str, value: Value) {
    let (parents, leaf) = match path.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, path),
    };

    let mut current = doc;
    for part in parents.into_iter().flat_map(|parents| parents.split('.')) {
        let Value::Object(map) = current else {
            return;
        };
        let next = map
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !next.is_object() {
            *next = Value::Object(Map::new());
        }
        current = next;
    }

    if let Value::Object(map) = current {
        map.insert(leaf.to_string(), value);
    }
}

fn remove_field(doc: &mut Value, path: &str) {
    match path.rsplit_once('.') {
        None => {
            if let Value::Object(map) = doc {
                map.remove(path);
            }
        }
        Some((parent, leaf)) => {
            let parent = parent
                .split('.')
                .try_fold(doc, |current, part| current.as_object_mut()?.get_mut(part));
            if let Some(Value::Object(map)) = parent {
                map.remove(leaf);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

fn exec_lookup<C: CollectionSource + ?Sized>(
    docs: Vec<Value>,
    lookup: &Lookup,
    source: &C,
) -> Vec<Value> {
    let foreign = source.documents(&lookup.from);

    docs.into_iter()
        .map(|mut doc| {
            let local = resolve_field(&doc, &lookup.local_field);
            let joined: Vec<Value> = foreign
                .iter()
                .filter(|candidate| {
                    join_key_matches(resolve_field(candidate, &lookup.foreign_field), local)
                })
                .cloned()
                .collect();
            let joined = run_pipeline(joined, &lookup.pipeline, source);
            set_field(&mut doc, &lookup.as_field, Value::Array(joined));
            doc
        })
        .collect()
}

fn join_key_matches(foreign: Option<&Value>, local: Option<&Value>) -> bool {
    match local {
        None | Some(Value::Null) => foreign.map_or(true, Value::is_null),
        Some(Value::Array(keys)) => keys.iter().any(|key| equals_or_contains(foreign, key)),
        Some(key) => equals_or_contains(foreign, key),
    }
}

fn exec_unwind(docs: Vec<Value>, path: &str, preserve: bool) -> Vec<Value> {
    let mut result = Vec::with_capacity(docs.len());
    for mut doc in docs {
        match resolve_field(&doc, path).cloned() {
            Some(Value::Array(items)) if !items.is_empty() => {
                for item in items {
                    let mut row = doc.clone();
                    set_field(&mut row, path, item);
                    result.push(row);
                }
            }
            Some(Value::Array(_)) => {
                if preserve {
                    remove_field(&mut doc, path);
                    result.push(doc);
                }
            }
            None | Some(Value::Null) => {
                if preserve {
                    result.push(doc);
                }
            }
            Some(_) => result.push(doc),
        }
    }
    result
}

fn eval_expr(doc: &Value, expr: &FieldExpr) -> Option<Value> {
    match expr {
        FieldExpr::Path(path) => resolve_field(doc, path).cloned(),
        FieldExpr::Size(path) => {
            let size = resolve_field(doc, path)
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            Some(Value::from(size))
        }
    }
}

fn project(doc: Value, fields: &[(String, bool)]) -> Value {
    let inclusion = fields.iter().any(|(name, keep)| *keep && name != "_id");

    if !inclusion {
        let mut doc = doc;
        for (name, _) in fields {
            remove_field(&mut doc, name);
        }
        return doc;
    }

    let id_excluded = fields.iter().any(|(name, keep)| name == "_id" && !keep);
    let mut projected = Value::Object(Map::new());
    if !id_excluded {
        if let Some(id) = doc.get("_id") {
            set_field(&mut projected, "_id", id.clone());
        }
    }
    for (name, keep) in fields {
        if !keep {
            continue;
        }
        if let Some(value) = resolve_field(&doc, name) {
            set_field(&mut projected, name, value.clone());
        }
    }
    projected
}

fn exec_sort(mut docs: Vec<Value>, sort: &SortSpec) -> Vec<Value> {
    docs.sort_by(|a, b| {
        for (field, direction) in sort.fields() {
            let ordering = sort_order(resolve_field(a, field), resolve_field(b, field));
            let ordering = match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
    docs
}

/// Total order across kinds: missing/null < numbers < strings < objects
/// < arrays < booleans
fn sort_order(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Number(_)) => 1,
            Some(Value::String(_)) => 2,
            Some(Value::Object(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Bool(_)) => 5,
        }
    }

    match (left, right) {
        (Some(l), Some(r)) => same_type_order(l, r).unwrap_or_else(|| {
            rank(left)
                .cmp(&rank(right))
                .then_with(|| l.to_string().cmp(&r.to_string()))
        }),
        _ => rank(left).cmp(&rank(right)),
    }
}
