use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::{JoinSpec, RawQuery};

/// Creation timestamp every list is ordered by last
pub const CREATED_AT: &str = "createdAt";

/// Largest skip or limit a store accepts
pub const MAX_OFFSET: u64 = i64::MAX as u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_i32(self) -> i32 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }
}

/// Ordered list of sort keys, first key highest priority
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortSpec {
    fields: Vec<(String, SortDirection)>,
}

impl SortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `price,-balance` (commas or whitespace). A leading `-` sorts
    /// descending. Later duplicates of a field are ignored.
    pub fn parse(input: &str) -> Self {
        let mut spec = Self::new();
        for token in split_field_list(input) {
            let (name, direction) = match token.strip_prefix('-') {
                Some(name) => (name, SortDirection::Descending),
                None => (token.strip_prefix('+').unwrap_or(token), SortDirection::Ascending),
            };
            if name.is_empty() || spec.contains(name) {
                continue;
            }
            spec.fields.push((name.to_string(), direction));
        }
        spec
    }

    /// Append the `createdAt` descending tiebreaker as the last key.
    /// A caller-supplied `createdAt` entry is moved there.
    pub fn with_tiebreaker(mut self) -> Self {
        self.fields.retain(|(name, _)| name != CREATED_AT);
        self.fields
            .push((CREATED_AT.to_string(), SortDirection::Descending));
        self
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == field)
    }

    pub fn fields(&self) -> &[(String, SortDirection)] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_document(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(name, direction)| (name.clone(), Value::from(direction.as_i32())))
                .collect::<Map<String, Value>>(),
        )
    }
}

/// Fallback page and page size used when callers omit or garble them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationDefaults {
    pub page: u64,
    pub limit: u64,
}

impl Default for PaginationDefaults {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

/// Page request plus the relations to populate on every result
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationSpec {
    pub page: u64,
    pub limit: u64,
    pub sort: SortSpec,
    pub select: Vec<String>,
    pub populate: Vec<JoinSpec>,
}

impl PaginationSpec {
    pub fn new(defaults: PaginationDefaults) -> Self {
        Self {
            page: defaults.page,
            limit: defaults.limit,
            sort: SortSpec::new(),
            select: Vec::new(),
            populate: Vec::new(),
        }
    }

    /// Lift `page`, `limit`, `sort` and `select` out of caller input.
    /// Non-numeric or non-positive page and limit fall back to defaults.
    pub fn from_raw(raw: &RawQuery, defaults: PaginationDefaults) -> Self {
        let mut spec = Self::new(defaults);
        spec.page = positive_integer(raw.get("page")).unwrap_or(defaults.page);
        spec.limit = positive_integer(raw.get("limit")).unwrap_or(defaults.limit);
        spec.sort = raw
            .get("sort")
            .map(|value| SortSpec::parse(&joined_text(value)))
            .unwrap_or_default();
        spec.select = raw
            .get("select")
            .map(|value| {
                split_field_list(&joined_text(value))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        spec
    }

    pub fn with_page(mut self, page: u64, limit: u64) -> Self {
        self.page = page;
        self.limit = limit;
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_populate(mut self, populate: Vec<JoinSpec>) -> Self {
        self.populate = populate;
        self
    }

    /// Documents to skip before this page starts, `None` when the offset
    /// does not fit a signed 64-bit store offset
    pub fn skip(&self) -> Option<u64> {
        self.page
            .saturating_sub(1)
            .checked_mul(self.limit)
            .filter(|skip| *skip <= MAX_OFFSET)
    }
}

impl Default for PaginationSpec {
    fn default() -> Self {
        Self::new(PaginationDefaults::default())
    }
}

/// Uniform result shape of every paginated list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEnvelope<T = Value> {
    pub docs: Vec<T>,
    pub total_docs: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub page: u64,
    pub paging_counter: u64,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    pub prev_page: Option<u64>,
    pub next_page: Option<u64>,
}

impl<T> PageEnvelope<T> {
    /// Derive the page metadata. `limit` is expected to be positive.
    pub fn new(docs: Vec<T>, total_docs: u64, page: u64, limit: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total_docs.div_ceil(limit)
        };
        let has_prev_page = page > 1;
        let has_next_page = page < total_pages;

        Self {
            docs,
            total_docs,
            limit,
            total_pages,
            page,
            paging_counter: page.saturating_sub(1).saturating_mul(limit).saturating_add(1),
            has_prev_page,
            has_next_page,
            prev_page: has_prev_page.then(|| page - 1),
            next_page: has_next_page.then(|| page + 1),
        }
    }
}

/// Split a field list on commas and whitespace, dropping empty entries
pub fn split_field_list(input: &str) -> impl Iterator<Item = &str> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
}

fn joined_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

fn positive_integer(value: Option<&Value>) -> Option<u64> {
    let parsed = match value? {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|f| f.fract() == 0.0 && *f >= 1.0).map(|f| f as u64)),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed.filter(|n| *n >= 1)
}
