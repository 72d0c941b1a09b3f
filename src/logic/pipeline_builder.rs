use itertools::Itertools;

use crate::logic::QueryError;
use crate::model::{
    pipeline_document, FieldExpr, Filter, JoinPolicy, JoinRegistry, JoinSpec, Lookup,
    PaginationSpec, Stage, UnwindMode, MAX_OFFSET,
};

/// Field written by the count pipeline's `$count` stage
pub const COUNT_FIELD: &str = "count";

/// Main list pipeline plus the filter the count pipeline reuses
#[derive(Debug, Clone, PartialEq)]
pub struct ListPipeline {
    pub match_filter: Filter,
    pub stages: Vec<Stage>,
}

impl ListPipeline {
    /// Count pipeline: the match stage only, so joins that fan out a
    /// parent never inflate the total.
    pub fn count_stages(&self) -> Vec<Stage> {
        vec![
            Stage::Match(self.match_filter.clone()),
            Stage::Count(COUNT_FIELD.to_string()),
        ]
    }
}

/// Build match -> joins -> sort -> skip/limit (-> project).
pub fn build_list_pipeline(
    registry: &JoinRegistry,
    filter: Filter,
    pagination: &PaginationSpec,
) -> Result<ListPipeline, QueryError> {
    if pagination.limit == 0 {
        return Err(QueryError::PipelineBuild(
            "limit must be a positive integer".to_string(),
        ));
    }
    if pagination.page == 0 {
        return Err(QueryError::PipelineBuild(
            "page must be at least 1".to_string(),
        ));
    }
    if pagination.limit > MAX_OFFSET {
        return Err(QueryError::PipelineBuild(format!(
            "limit {} is out of range",
            pagination.limit
        )));
    }
    let skip = pagination.skip().ok_or_else(|| {
        QueryError::PipelineBuild(format!(
            "page {} with limit {} is out of range",
            pagination.page, pagination.limit
        ))
    })?;

    let mut stages = vec![Stage::Match(filter.clone())];
    for join in &pagination.populate {
        stages.extend(join_stages(registry, join)?);
    }

    stages.push(Stage::Sort(pagination.sort.clone().with_tiebreaker()));
    stages.push(Stage::Skip(skip));
    stages.push(Stage::Limit(pagination.limit));

    if !pagination.select.is_empty() {
        let fields = pagination
            .select
            .iter()
            .map(String::as_str)
            .chain(pagination.populate.iter().map(JoinSpec::output_field))
            .unique()
            .map(str::to_string)
            .collect_vec();
        stages.push(Stage::include(fields));
    }

    log::debug!("list pipeline: {}", pipeline_document(&stages));

    Ok(ListPipeline {
        match_filter: filter,
        stages,
    })
}

/// Build match -> joins for a point query
pub fn build_single_pipeline(
    registry: &JoinRegistry,
    filter: Filter,
    joins: &[JoinSpec],
) -> Result<Vec<Stage>, QueryError> {
    let mut stages = vec![Stage::Match(filter)];
    for join in joins {
        stages.extend(join_stages(registry, join)?);
    }

    log::debug!("single pipeline: {}", pipeline_document(&stages));
    Ok(stages)
}

/// Stages contributed by one populate request. Unknown relations give
/// no stages unless the registry is strict.
pub fn join_stages(registry: &JoinRegistry, join: &JoinSpec) -> Result<Vec<Stage>, QueryError> {
    let Some(descriptor) = registry.resolve(&join.path) else {
        return match registry.policy() {
            JoinPolicy::Strict => Err(QueryError::UnknownJoin(join.path.clone())),
            JoinPolicy::Lenient => {
                log::warn!("ignoring populate of unknown relation `{}`", join.path);
                Ok(Vec::new())
            }
        };
    };

    let alias = join.output_field().to_string();

    let mut inner = Vec::with_capacity(descriptor.pipeline.len() + 2);
    if !join.select.is_empty() {
        inner.push(Stage::include(join.select.iter().cloned()));
    }
    inner.push(Stage::Match(join.filter.clone().unwrap_or_default()));
    inner.extend(descriptor.pipeline.iter().cloned());

    let mut stages = vec![Stage::Lookup(Lookup {
        from: descriptor.from.clone(),
        local_field: descriptor.local_field.clone(),
        foreign_field: descriptor.foreign_field.clone(),
        pipeline: inner,
        as_field: alias.clone(),
    })];

    if descriptor.count {
        stages.push(Stage::AddFields(vec![(
            alias.clone(),
            FieldExpr::Size(alias),
        )]));
        return Ok(stages);
    }

    if join.unwind == UnwindMode::Keep {
        return Ok(stages);
    }

    stages.push(Stage::Unwind {
        path: alias.clone(),
        preserve_null_and_empty_arrays: true,
    });

    if let Some(sort) = &join.sort {
        stages.push(Stage::Sort(sort.clone().with_tiebreaker()));
    }

    if join.unwind == UnwindMode::Splice {
        if !join.select.is_empty() {
            stages.push(Stage::AddFields(
                join.select
                    .iter()
                    .map(|field| (field.clone(), FieldExpr::Path(format!("{alias}.{field}"))))
                    .collect(),
            ));
        }
        stages.push(Stage::exclude([alias]));
    }

    Ok(stages)
}
