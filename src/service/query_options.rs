use crate::logic::{compile_filter, QueryError};
use crate::model::{Filter, PaginationDefaults, PaginationSpec, RawQuery};

/// A raw request split into its predicate part and its page request
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    pub filter: Filter,
    pub pagination: PaginationSpec,
}

impl QueryOptions {
    /// `page`, `limit`, `sort` and `select` feed the page request,
    /// `search` is dropped and everything else is compiled as a filter.
    pub fn parse(raw: &RawQuery, defaults: PaginationDefaults) -> Result<Self, QueryError> {
        Ok(Self {
            filter: compile_filter(raw)?,
            pagination: PaginationSpec::from_raw(raw, defaults),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FilterValue;
    use serde_json::json;

    #[test]
    fn test_split_lifts_pagination_keys() {
        let raw = RawQuery::from_query_string("page=2&limit=5&sort=-price&search=bike&status=pending");
        let options = QueryOptions::parse(&raw, PaginationDefaults::default()).unwrap();

        assert_eq!(options.pagination.page, 2);
        assert_eq!(options.pagination.limit, 5);
        assert_eq!(options.filter.clauses().len(), 1);
        assert_eq!(
            options.filter.get("status"),
            Some(&FilterValue::Literal(json!("pending")))
        );
    }

    #[test]
    fn test_garbled_limit_uses_defaults() {
        let raw = RawQuery::from_query_string("limit=lots&page=-1");
        let defaults = PaginationDefaults { page: 1, limit: 25 };
        let options = QueryOptions::parse(&raw, defaults).unwrap();

        assert_eq!(options.pagination.limit, 25);
        assert_eq!(options.pagination.page, 1);
        assert!(options.filter.is_empty());
    }

    #[test]
    fn test_bad_filter_is_rejected() {
        let raw = RawQuery::from_query_string("price[gt]=5&price[label]=x");
        assert!(QueryOptions::parse(&raw, PaginationDefaults::default()).is_err());
    }
}
