use influencer_service::{
    build_list_pipeline, compile_filter, execute, model::pipeline_document, service::browse_filter,
    CallerIdentity, DocumentWriter, Filter, JoinDescriptor, JoinRegistry, JoinSpec, MemoryStore,
    PaginationDefaults, PaginationSpec, RawQuery, Stage,
};
use serde_json::json;

/// Registry holding only the two relations the scenario names
fn scenario_registry() -> JoinRegistry {
    JoinRegistry::new()
        .register("user", JoinDescriptor::new("users", "userId", "userId"))
        .register(
            "jobsCompleted",
            JoinDescriptor::new("jobs", "influencerId", "influencerId")
                .with_pipeline(vec![Stage::Match(Filter::new().with("completed", true))])
                .count_only(),
        )
}

fn scenario_query() -> RawQuery {
    RawQuery::from_query_string("niche[]=tech&niche[]=fashion&page=2&limit=5&sort=-balance")
}

fn scenario_populate() -> Vec<JoinSpec> {
    vec![
        JoinSpec::new("user").select(["firstName"]),
        JoinSpec::new("jobsCompleted"),
    ]
}

#[test]
fn test_browse_pipeline_golden() {
    let raw = scenario_query();
    let filter = browse_filter(compile_filter(&raw).unwrap(), &CallerIdentity::new("visitor"));
    let pagination = PaginationSpec::from_raw(&raw, PaginationDefaults::default())
        .with_populate(scenario_populate());

    let pipeline = build_list_pipeline(&scenario_registry(), filter, &pagination).unwrap();

    assert_eq!(
        pipeline_document(&pipeline.stages),
        json!([
            {"$match": {"niche": {"$in": ["tech", "fashion"]}, "suspended": false}},
            {"$lookup": {
                "from": "users",
                "localField": "userId",
                "foreignField": "userId",
                "pipeline": [{"$project": {"firstName": 1}}, {"$match": {}}],
                "as": "user"
            }},
            {"$lookup": {
                "from": "jobs",
                "localField": "influencerId",
                "foreignField": "influencerId",
                "pipeline": [{"$match": {}}, {"$match": {"completed": true}}],
                "as": "jobsCompleted"
            }},
            {"$addFields": {"jobsCompleted": {"$size": "$jobsCompleted"}}},
            {"$sort": {"balance": -1, "createdAt": -1}},
            {"$skip": 5},
            {"$limit": 5}
        ])
    );
}

#[test]
fn test_unknown_join_leaves_pipeline_unchanged() {
    let raw = scenario_query();
    let filter = compile_filter(&raw).unwrap();
    let base = PaginationSpec::from_raw(&raw, PaginationDefaults::default());

    let without = build_list_pipeline(&scenario_registry(), filter.clone(), &base).unwrap();
    let with_unknown = build_list_pipeline(
        &scenario_registry(),
        filter,
        &base.clone().with_populate(vec![JoinSpec::new("doesNotExist")]),
    )
    .unwrap();

    assert_eq!(with_unknown.stages.len(), without.stages.len());
}

#[test]
fn test_reserved_keys_never_reach_the_filter() {
    let raw = RawQuery::from_query_string("page=1&limit=2&select=bio&sort=name&search=ada&age=25&active=true&name=bob");
    let filter = compile_filter(&raw).unwrap();

    assert_eq!(
        filter.to_document(),
        json!({"age": 25, "active": true, "name": "bob"})
    );
}

#[tokio::test]
async fn test_browse_scenario_against_memory_store() {
    let store = MemoryStore::new();
    let influencers = (0..12)
        .map(|i| {
            json!({
                "influencerId": format!("inf-{i}"),
                "userId": format!("u-{i}"),
                "niche": if i % 3 == 0 { vec!["music"] } else { vec!["tech"] },
                "balance": i * 10,
                "suspended": false,
                "createdAt": format!("2024-03-{:02}T00:00:00Z", i + 1)
            })
        })
        .collect();
    store.insert_many("influencers", influencers).await.unwrap();
    store
        .insert_many(
            "users",
            (0..12)
                .map(|i| json!({"userId": format!("u-{i}"), "firstName": format!("Name {i}")}))
                .collect(),
        )
        .await
        .unwrap();
    store
        .insert_many(
            "jobs",
            vec![
                json!({"influencerId": "inf-11", "completed": true}),
                json!({"influencerId": "inf-11", "completed": true}),
                json!({"influencerId": "inf-10", "completed": false}),
            ],
        )
        .await
        .unwrap();

    let raw = scenario_query();
    let filter = browse_filter(compile_filter(&raw).unwrap(), &CallerIdentity::new("visitor"));
    let pagination = PaginationSpec::from_raw(&raw, PaginationDefaults::default())
        .with_populate(scenario_populate());
    let pipeline = build_list_pipeline(&scenario_registry(), filter, &pagination).unwrap();

    let page = execute(&store, "influencers", &pipeline, &pagination)
        .await
        .unwrap();

    // 8 tech influencers by balance descending: 11, 10, 8, 7, 5 | 4, 2, 1
    assert_eq!(page.total_docs, 8);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.paging_counter, 6);
    assert_eq!(page.prev_page, Some(1));
    assert!(!page.has_next_page);

    let ids: Vec<_> = page.docs.iter().map(|doc| doc["influencerId"].clone()).collect();
    assert_eq!(ids, vec![json!("inf-4"), json!("inf-2"), json!("inf-1")]);

    for doc in &page.docs {
        assert!(doc["jobsCompleted"].is_u64());
        assert_eq!(doc["user"].as_array().map(Vec::len), Some(1));
    }
}
