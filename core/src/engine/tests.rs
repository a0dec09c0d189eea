//! End-to-end tests for the engine over a temporary data directory.

use serde_json::{Value, json};
use tempfile::{TempDir, tempdir};

use super::*;
use crate::dataset::{DatasetKind, Record};
use crate::testing::{many_sections, room, section, section_with};

// Helpers

async fn engine() -> (TempDir, Engine) {
    let dir = tempdir().unwrap();
    let engine = Engine::new(&Config::with_data_dir(dir.path())).await.unwrap();
    (dir, engine)
}

fn sections(records: Vec<Record>) -> DatasetContent {
    DatasetContent::new(DatasetKind::Sections, records)
}

fn rows(result: Vec<OutputRow>) -> Value {
    Value::Array(result.into_iter().map(Value::Object).collect())
}

async fn query(engine: &Engine, q: Value) -> Value {
    rows(engine.perform_query(&q).await.unwrap())
}

async fn query_err(engine: &Engine, q: Value) -> InsightError {
    engine.perform_query(&q).await.unwrap_err()
}

mod datasets {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn add_returns_all_ids() {
        let (_dir, engine) = engine().await;

        let ids = engine
            .add_dataset("ubc", sections(vec![section("1", "cpsc", 70.0)]))
            .await
            .unwrap();
        assert_eq!(ids, vec!["ubc"]);

        let content = DatasetContent::new(DatasetKind::Rooms, vec![room("DMP", "110", 120.0, "Tables")]);
        let mut ids = engine.add_dataset("campus", content).await.unwrap();
        ids.sort();
        assert_eq!(ids, vec!["campus", "ubc"]);
    }

    #[tokio::test]
    async fn invalid_ids_are_rejected() {
        let (_dir, engine) = engine().await;
        for id in ["", "  ", "ubc_1"] {
            let err = engine
                .add_dataset(id, sections(vec![section("1", "cpsc", 70.0)]))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), "invalid_request", "id {:?}", id);

            let err = engine.remove_dataset(id).await.unwrap_err();
            assert_eq!(err.kind(), "invalid_request", "id {:?}", id);
        }
    }

    #[tokio::test]
    async fn long_ids_are_stored_and_listed() {
        let (_dir, engine) = engine().await;
        let id = "x".repeat(200);

        let ids = engine
            .add_dataset(&id, sections(vec![section("1", "cpsc", 70.0)]))
            .await
            .unwrap();
        assert_eq!(ids, vec![id.clone()]);
        assert_eq!(engine.list_datasets().await.unwrap()[0].id, id);
        assert_eq!(engine.remove_dataset(&id).await.unwrap(), id);
    }

    #[tokio::test]
    async fn duplicate_add_conflicts() {
        let (_dir, engine) = engine().await;
        engine
            .add_dataset("ubc", sections(vec![section("1", "cpsc", 70.0)]))
            .await
            .unwrap();

        let err = engine
            .add_dataset("ubc", sections(vec![section("2", "math", 80.0)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "conflict");
        assert_eq!(engine.list_datasets().await.unwrap()[0].num_rows, 1);
    }

    #[tokio::test]
    async fn empty_content_is_rejected() {
        let (_dir, engine) = engine().await;
        let err = engine.add_dataset("ubc", sections(vec![])).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_request");

        let wrong = DatasetContent::new(DatasetKind::Rooms, vec![section("1", "cpsc", 70.0)]);
        let err = engine.add_dataset("ubc", wrong).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_request");
        assert!(engine.list_datasets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_then_query_is_not_found() {
        let (_dir, engine) = engine().await;
        engine
            .add_dataset("ubc", sections(vec![section("1", "cpsc", 70.0)]))
            .await
            .unwrap();

        assert_eq!(engine.remove_dataset("ubc").await.unwrap(), "ubc");
        assert!(engine.list_datasets().await.unwrap().is_empty());

        let err = engine.remove_dataset("ubc").await.unwrap_err();
        assert_eq!(err.kind(), "not_found");

        let err = query_err(
            &engine,
            json!({ "WHERE": {}, "OPTIONS": { "COLUMNS": ["ubc_avg"] } }),
        )
        .await;
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn recovery_in_a_fresh_engine() {
        let dir = tempdir().unwrap();
        let config = Config::with_data_dir(dir.path());

        {
            let first = Engine::new(&config).await.unwrap();
            first
                .add_dataset("ubc", sections(many_sections(42)))
                .await
                .unwrap();
            first
                .add_dataset("gone", sections(many_sections(3)))
                .await
                .unwrap();
            first.remove_dataset("gone").await.unwrap();
        }

        let second = Engine::new(&config).await.unwrap();
        assert_eq!(
            second.list_datasets().await.unwrap(),
            vec![DatasetInfo {
                id: "ubc".into(),
                kind: DatasetKind::Sections,
                num_rows: 42
            }]
        );

        let result = query(
            &second,
            json!({
                "WHERE": { "IS": { "ubc_uuid": "41" } },
                "OPTIONS": { "COLUMNS": ["ubc_uuid"] }
            }),
        )
        .await;
        assert_eq!(result, json!([{ "ubc_uuid": "41" }]));
    }
}

mod queries {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn scenario() -> (TempDir, Engine) {
        let (dir, engine) = engine().await;
        engine
            .add_dataset(
                "sections",
                sections(vec![
                    section("1", "cpsc", 68.0),
                    section("2", "cpsc", 95.0),
                    section("3", "math", 70.0),
                ]),
            )
            .await
            .unwrap();
        (dir, engine)
    }

    #[tokio::test]
    async fn end_to_end_scenario() {
        let (_dir, engine) = scenario().await;
        let result = query(
            &engine,
            json!({
                "WHERE": { "GT": { "sections_avg": 69 } },
                "OPTIONS": {
                    "COLUMNS": ["sections_dept", "sections_avg"],
                    "ORDER": "sections_avg"
                }
            }),
        )
        .await;

        assert_eq!(
            result,
            json!([
                { "sections_dept": "math", "sections_avg": 70 },
                { "sections_dept": "cpsc", "sections_avg": 95 }
            ])
        );
        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"[{"sections_dept":"math","sections_avg":70},{"sections_dept":"cpsc","sections_avg":95}]"#
        );
    }

    #[tokio::test]
    async fn invalid_query_fails_before_loading() {
        let (_dir, engine) = scenario().await;
        let err = query_err(
            &engine,
            json!({ "WHERE": { "GT": { "missing_avg": "x" } }, "OPTIONS": { "COLUMNS": ["missing_avg"] } }),
        )
        .await;
        assert_eq!(err.kind(), "invalid_request");
    }

    #[tokio::test]
    async fn kind_mismatch_is_invalid() {
        let (_dir, engine) = scenario().await;
        let err = query_err(
            &engine,
            json!({ "WHERE": {}, "OPTIONS": { "COLUMNS": ["sections_seats"] } }),
        )
        .await;
        assert_eq!(err.kind(), "invalid_request");
    }

    #[tokio::test]
    async fn grouped_query_with_order() {
        let (_dir, engine) = engine().await;
        engine
            .add_dataset(
                "ubc",
                sections(vec![
                    section_with("1", "cpsc", "310", "smith", 70.0),
                    section_with("2", "cpsc", "310", "smith", 80.0),
                    section_with("3", "cpsc", "110", "jones", 90.0),
                    section_with("4", "math", "100", "lee", 60.0),
                    section_with("5", "math", "100", "kim", 65.5),
                ]),
            )
            .await
            .unwrap();

        let result = query(
            &engine,
            json!({
                "WHERE": { "NOT": { "IS": { "ubc_instructor": "k*" } } },
                "OPTIONS": {
                    "COLUMNS": ["ubc_dept", "overall", "profs", "sections"],
                    "ORDER": { "dir": "DOWN", "keys": ["overall", "ubc_dept"] }
                },
                "TRANSFORMATIONS": {
                    "GROUP": ["ubc_dept"],
                    "APPLY": [
                        { "overall": { "AVG": "ubc_avg" } },
                        { "profs": { "COUNT": "ubc_instructor" } },
                        { "sections": { "COUNT": "ubc_uuid" } }
                    ]
                }
            }),
        )
        .await;

        assert_eq!(
            result,
            json!([
                { "ubc_dept": "cpsc", "overall": 80, "profs": 2, "sections": 3 },
                { "ubc_dept": "math", "overall": 60, "profs": 1, "sections": 1 }
            ])
        );
    }

    #[tokio::test]
    async fn rooms_query() {
        let (_dir, engine) = engine().await;
        engine
            .add_dataset(
                "campus",
                DatasetContent::new(
                    DatasetKind::Rooms,
                    vec![
                        room("DMP", "110", 120.0, "Classroom-Fixed Tables"),
                        room("DMP", "101", 40.0, "Classroom-Movable Tables"),
                        room("ANGU", "098", 260.0, "Classroom-Fixed Tablets"),
                    ],
                ),
            )
            .await
            .unwrap();

        let result = query(
            &engine,
            json!({
                "WHERE": {
                    "AND": [
                        { "IS": { "campus_furniture": "*Tables" } },
                        { "GT": { "campus_seats": 50 } }
                    ]
                },
                "OPTIONS": { "COLUMNS": ["campus_name", "campus_seats"] }
            }),
        )
        .await;
        assert_eq!(result, json!([{ "campus_name": "DMP_110", "campus_seats": 120 }]));
    }
}

mod limits {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn five_thousand_is_the_cap() {
        let (_dir, engine) = engine().await;
        engine
            .add_dataset("big", sections(many_sections(5001)))
            .await
            .unwrap();

        let exactly = engine
            .perform_query(&json!({
                "WHERE": { "NOT": { "IS": { "big_uuid": "0" } } },
                "OPTIONS": { "COLUMNS": ["big_uuid"] }
            }))
            .await
            .unwrap();
        assert_eq!(exactly.len(), 5000);

        for order in [None, Some(json!("big_avg"))] {
            let mut options = json!({ "COLUMNS": ["big_uuid", "big_avg"] });
            if let Some(order) = order {
                options["ORDER"] = order;
            }
            let err = query_err(&engine, json!({ "WHERE": {}, "OPTIONS": options })).await;
            assert!(
                matches!(err, InsightError::ResultTooLarge { rows: 5001, limit: 5000 }),
                "{}",
                err
            );
        }
    }

    #[tokio::test]
    async fn grouping_below_the_cap_succeeds() {
        let (_dir, engine) = engine().await;
        engine
            .add_dataset("big", sections(many_sections(5001)))
            .await
            .unwrap();

        let result = engine
            .perform_query(&json!({
                "WHERE": {},
                "OPTIONS": { "COLUMNS": ["big_avg", "n"], "ORDER": "big_avg" },
                "TRANSFORMATIONS": {
                    "GROUP": ["big_avg"],
                    "APPLY": [{ "n": { "COUNT": "big_uuid" } }]
                }
            }))
            .await
            .unwrap();
        assert_eq!(result.len(), 50);
        assert_eq!(result[0]["big_avg"], json!(50));
        assert_eq!(result[0]["n"], json!(101));
    }

    #[tokio::test]
    async fn configured_limit() {
        let dir = tempdir().unwrap();
        let config = Config {
            max_results: 2,
            ..Config::with_data_dir(dir.path())
        };
        let engine = Engine::new(&config).await.unwrap();
        engine
            .add_dataset("ubc", sections(many_sections(3)))
            .await
            .unwrap();

        let err = query_err(
            &engine,
            json!({ "WHERE": {}, "OPTIONS": { "COLUMNS": ["ubc_avg"] } }),
        )
        .await;
        assert_eq!(err.kind(), "result_too_large");
    }
}
