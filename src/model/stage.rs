use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::model::{Filter, SortSpec};

/// Value computed by an `$addFields` stage
#[derive(Debug, Clone, PartialEq)]
pub enum FieldExpr {
    /// Copy of another field, rendered as `"$path"`
    Path(String),
    /// Length of an array field, rendered as `{"$size": "$path"}`
    Size(String),
}

impl FieldExpr {
    pub fn to_document(&self) -> Value {
        match self {
            FieldExpr::Path(path) => Value::String(format!("${path}")),
            FieldExpr::Size(path) => json!({ "$size": format!("${path}") }),
        }
    }
}

/// Left-outer join of another collection
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub from: String,
    pub local_field: String,
    pub foreign_field: String,
    pub pipeline: Vec<Stage>,
    pub as_field: String,
}

/// One aggregation stage. Rendering follows the document store's wire
/// format; evaluation lives in `store::aggregate`.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Match(Filter),
    Lookup(Lookup),
    Unwind {
        path: String,
        preserve_null_and_empty_arrays: bool,
    },
    AddFields(Vec<(String, FieldExpr)>),
    /// `true` includes a field, `false` excludes it
    Project(Vec<(String, bool)>),
    Sort(SortSpec),
    Skip(u64),
    Limit(u64),
    Count(String),
}

impl Stage {
    pub fn include(fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Stage::Project(fields.into_iter().map(|f| (f.into(), true)).collect())
    }

    pub fn exclude(fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Stage::Project(fields.into_iter().map(|f| (f.into(), false)).collect())
    }

    /// Operator name of the stage, e.g. `$lookup`
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Match(_) => "$match",
            Stage::Lookup(_) => "$lookup",
            Stage::Unwind { .. } => "$unwind",
            Stage::AddFields(_) => "$addFields",
            Stage::Project(_) => "$project",
            Stage::Sort(_) => "$sort",
            Stage::Skip(_) => "$skip",
            Stage::Limit(_) => "$limit",
            Stage::Count(_) => "$count",
        }
    }

    pub fn to_document(&self) -> Value {
        let body = match self {
            Stage::Match(filter) => filter.to_document(),
            Stage::Lookup(lookup) => json!({
                "from": lookup.from,
                "localField": lookup.local_field,
                "foreignField": lookup.foreign_field,
                "pipeline": pipeline_document(&lookup.pipeline),
                "as": lookup.as_field,
            }),
            Stage::Unwind {
                path,
                preserve_null_and_empty_arrays,
            } => json!({
                "path": format!("${path}"),
                "preserveNullAndEmptyArrays": preserve_null_and_empty_arrays,
            }),
            Stage::AddFields(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(name, expr)| (name.clone(), expr.to_document()))
                    .collect::<Map<String, Value>>(),
            ),
            Stage::Project(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(name, keep)| (name.clone(), Value::from(u8::from(*keep))))
                    .collect::<Map<String, Value>>(),
            ),
            Stage::Sort(sort) => sort.to_document(),
            Stage::Skip(n) | Stage::Limit(n) => Value::from(*n),
            Stage::Count(field) => Value::String(field.clone()),
        };

        let mut stage = Map::new();
        stage.insert(self.name().to_string(), body);
        Value::Object(stage)
    }
}

impl Serialize for Stage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_document().serialize(serializer)
    }
}

/// Render a whole pipeline as the array the store expects
pub fn pipeline_document(stages: &[Stage]) -> Value {
    Value::Array(stages.iter().map(Stage::to_document).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SortSpec;

    #[test]
    fn test_stage_rendering() {
        let stages = vec![
            Stage::Match(Filter::new().with("completed", true)),
            Stage::Unwind {
                path: "user".to_string(),
                preserve_null_and_empty_arrays: true,
            },
            Stage::AddFields(vec![
                ("jobs".to_string(), FieldExpr::Size("jobs".to_string())),
                ("firstName".to_string(), FieldExpr::Path("user.firstName".to_string())),
            ]),
            Stage::exclude(["user"]),
            Stage::Sort(SortSpec::parse("-balance")),
            Stage::Skip(5),
            Stage::Limit(5),
            Stage::Count("count".to_string()),
        ];

        assert_eq!(
            pipeline_document(&stages),
            json!([
                {"$match": {"completed": true}},
                {"$unwind": {"path": "$user", "preserveNullAndEmptyArrays": true}},
                {"$addFields": {"jobs": {"$size": "$jobs"}, "firstName": "$user.firstName"}},
                {"$project": {"user": 0}},
                {"$sort": {"balance": -1}},
                {"$skip": 5},
                {"$limit": 5},
                {"$count": "count"}
            ])
        );
    }
}
