use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Comparison operators a filter may carry, in their bare query-string
/// spelling (`gt`) and their store spelling (`$gt`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl ComparisonOp {
    pub const ALL: [ComparisonOp; 7] = [
        ComparisonOp::Eq,
        ComparisonOp::Ne,
        ComparisonOp::Gt,
        ComparisonOp::Gte,
        ComparisonOp::Lt,
        ComparisonOp::Lte,
        ComparisonOp::In,
    ];

    /// Bare token as it appears in a query string, e.g. `price[gt]=10`
    pub fn token(self) -> &'static str {
        match self {
            ComparisonOp::Eq => "eq",
            ComparisonOp::Ne => "ne",
            ComparisonOp::Gt => "gt",
            ComparisonOp::Gte => "gte",
            ComparisonOp::Lt => "lt",
            ComparisonOp::Lte => "lte",
            ComparisonOp::In => "in",
        }
    }

    /// Operator key understood by the document store
    pub fn operator(self) -> &'static str {
        match self {
            ComparisonOp::Eq => "$eq",
            ComparisonOp::Ne => "$ne",
            ComparisonOp::Gt => "$gt",
            ComparisonOp::Gte => "$gte",
            ComparisonOp::Lt => "$lt",
            ComparisonOp::Lte => "$lte",
            ComparisonOp::In => "$in",
        }
    }

    /// Recognize a whole object key as an operator. Both spellings are
    /// accepted so already-normalized filters compile to themselves.
    pub fn from_key(key: &str) -> Option<Self> {
        let bare = key.strip_prefix('$').unwrap_or(key);
        Self::ALL.into_iter().find(|op| op.token() == bare)
    }
}

/// Condition attached to one field of a [`Filter`].
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Equality against a literal. Embedded documents are literals too.
    Literal(Value),
    /// One or more operator comparisons, all of which must hold.
    Compare(Vec<(ComparisonOp, Value)>),
}

impl FilterValue {
    pub fn literal(value: impl Into<Value>) -> Self {
        FilterValue::Literal(value.into())
    }

    pub fn compare(op: ComparisonOp, value: impl Into<Value>) -> Self {
        FilterValue::Compare(vec![(op, value.into())])
    }

    pub fn to_document(&self) -> Value {
        match self {
            FilterValue::Literal(value) => value.clone(),
            FilterValue::Compare(ops) => Value::Object(
                ops.iter()
                    .map(|(op, value)| (op.operator().to_string(), value.clone()))
                    .collect(),
            ),
        }
    }
}

/// Normalized, operator-safe filter handed to a `$match` stage.
///
/// Clauses keep insertion order; setting an existing field replaces its
/// condition in place. `any_of` renders as `$or` and is only ever built
/// by service code, never compiled from caller input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, FilterValue)>,
    any_of: Vec<Filter>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter matching when at least one alternative matches
    pub fn any(alternatives: Vec<Filter>) -> Self {
        Self {
            clauses: Vec::new(),
            any_of: alternatives,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty() && self.any_of.is_empty()
    }

    pub fn clauses(&self) -> &[(String, FilterValue)] {
        &self.clauses
    }

    pub fn any_of(&self) -> &[Filter] {
        &self.any_of
    }

    pub fn get(&self, field: &str) -> Option<&FilterValue> {
        self.clauses
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn set(&mut self, field: impl Into<String>, value: FilterValue) {
        let field = field.into();
        match self.clauses.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.clauses.push((field, value)),
        }
    }

    pub fn remove(&mut self, field: &str) -> Option<FilterValue> {
        let index = self.clauses.iter().position(|(name, _)| name == field)?;
        Some(self.clauses.remove(index).1)
    }

    /// Builder form of [`Filter::set`] with a literal value
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, FilterValue::literal(value));
        self
    }

    /// Builder form of [`Filter::set`] with a single comparison
    pub fn with_compare(
        mut self,
        field: impl Into<String>,
        op: ComparisonOp,
        value: impl Into<Value>,
    ) -> Self {
        self.set(field, FilterValue::compare(op, value));
        self
    }

    pub fn to_document(&self) -> Value {
        let mut document: Map<String, Value> = self
            .clauses
            .iter()
            .map(|(field, value)| (field.clone(), value.to_document()))
            .collect();

        if !self.any_of.is_empty() {
            document.insert(
                "$or".to_string(),
                Value::Array(self.any_of.iter().map(Filter::to_document).collect()),
            );
        }

        Value::Object(document)
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_document().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operator_key_recognition() {
        assert_eq!(ComparisonOp::from_key("gt"), Some(ComparisonOp::Gt));
        assert_eq!(ComparisonOp::from_key("$lte"), Some(ComparisonOp::Lte));
        assert_eq!(ComparisonOp::from_key("eqType"), None);
        assert_eq!(ComparisonOp::from_key("$$in"), None);
        assert_eq!(ComparisonOp::from_key("IN"), None);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut filter = Filter::new().with("a", 1).with("b", 2);
        filter.set("a", FilterValue::compare(ComparisonOp::Ne, 3));

        assert_eq!(filter.to_document(), json!({"a": {"$ne": 3}, "b": 2}));
        assert_eq!(filter.clauses()[0].0, "a");
    }

    #[test]
    fn test_any_renders_as_or() {
        let filter = Filter::any(vec![
            Filter::new().with("_id", "x"),
            Filter::new().with("influencerId", "x"),
        ])
        .with("suspended", false);

        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({
                "suspended": false,
                "$or": [{"_id": "x"}, {"influencerId": "x"}]
            })
        );
    }

    #[test]
    fn test_empty_filter_is_empty_document() {
        assert!(Filter::new().is_empty());
        assert_eq!(Filter::new().to_document(), json!({}));
    }
}
