//! End-to-end query tests against an in-memory archive

mod common;

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use argo_broker::app::dataset::Values;
use argo_broker::constants::queries;
use argo_broker::errors::{AppError, QueryError, RetrievalError, ValidationError};
use serde_json::json;
use tempfile::TempDir;

use common::{params, stub_broker, RecordingReader, StubArchive, META_URL};

fn file_names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect()
}

#[tokio::test]
async fn meta_query_reads_metadata_without_listing() {
    let temp_dir = TempDir::new().unwrap();
    let archive = Arc::new(StubArchive::float_1900722(&["R1900722_001.nc"]));
    let reader = Arc::new(RecordingReader::default());
    let broker = stub_broker(&temp_dir, archive.clone(), reader.clone()).await;

    let result = broker
        .execute(
            queries::META,
            Some(&params(json!({"dac": "aoml", "float": "1900722"}))),
        )
        .await
        .unwrap();

    assert_eq!(result.query.name, queries::META);
    let meta = result.metadata().unwrap();
    assert_eq!(meta.institution.as_deref(), Some("AOML"));
    assert_eq!(meta.title.as_deref(), Some("Argo float metadata file"));
    assert_eq!(meta.source.as_deref(), Some("Argo float"));
    assert_eq!(
        meta.references.as_deref(),
        Some("http://www.argodatamgt.org/Documentation")
    );
    assert_eq!(meta.dimensions, vec!["STRING8"]);
    assert_eq!(meta.variables, vec!["PLATFORM_NUMBER", "LAUNCH_LATITUDE"]);

    assert_eq!(archive.page_requests.load(Ordering::SeqCst), 0);
    assert_eq!(archive.downloads.load(Ordering::SeqCst), 1);
    assert_eq!(
        reader.opened(),
        vec![temp_dir
            .path()
            .join("argo/dac/aoml/1900722/1900722_meta.nc")]
    );
}

#[tokio::test]
async fn data_query_merges_profiles_then_metadata() {
    let temp_dir = TempDir::new().unwrap();
    let archive = Arc::new(StubArchive::float_1900722(&[
        "R1900722_001.nc",
        "BR1900722_001.nc",
        "R1900722_002.nc",
        "R1900722_002D.nc",
        "D1900722_003.nc",
    ]));
    let reader = Arc::new(RecordingReader::default());
    let broker = stub_broker(&temp_dir, archive.clone(), reader.clone()).await;

    let result = broker
        .execute(
            queries::DATA,
            Some(&params(json!({
                "dac": "aoml",
                "float": "1900722",
                "float_mode": "R",
                "float_type": "",
                "descending_cycles": false
            }))),
        )
        .await
        .unwrap();

    let opened = reader.opened();
    assert_eq!(
        file_names(&opened),
        vec!["R1900722_001.nc", "R1900722_002.nc", "1900722_meta.nc"]
    );
    assert!(opened[0].ends_with("argo/dac/aoml/1900722/profiles/R1900722_001.nc"));
    assert!(opened[2].ends_with("argo/dac/aoml/1900722/1900722_meta.nc"));

    let dataset = result.dataset().unwrap();
    assert_eq!(dataset.dimension("N_PROF").unwrap().len, 2);
    match &dataset.variable("CYCLE_NUMBER").unwrap().values {
        Values::Int(cycles) => assert_eq!(cycles.iter().copied().collect::<Vec<_>>(), vec![1, 2]),
        other => panic!("Expected integer cycles, got {}", other.kind()),
    }
    let platform = dataset.variable("PLATFORM_NUMBER").unwrap();
    assert_eq!(platform.dimensions, vec!["N_PROF", "STRING8"]);
    assert_eq!(platform.values.shape(), &[2, 8]);
    assert!(dataset.variable("LAUNCH_LATITUDE").is_some());
    assert_eq!(archive.page_requests.load(Ordering::SeqCst), 1);
    assert_eq!(archive.downloads.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn data_query_defaults_select_every_profile() {
    let temp_dir = TempDir::new().unwrap();
    let archive = Arc::new(StubArchive::float_1900722(&[
        "R1900722_001.nc",
        "BD1900722_001D.nc",
        "SA1900722_002.nc",
        "MR1900722_002.nc",
        "1900722_Rtraj.nc",
    ]));
    let reader = Arc::new(RecordingReader::default());
    let broker = stub_broker(&temp_dir, archive.clone(), reader.clone()).await;

    broker
        .execute(
            queries::DATA,
            Some(&params(json!({"dac": "aoml", "float": "1900722"}))),
        )
        .await
        .unwrap();

    assert_eq!(
        file_names(&reader.opened()),
        vec![
            "R1900722_001.nc",
            "BD1900722_001D.nc",
            "SA1900722_002.nc",
            "MR1900722_002.nc",
            "1900722_meta.nc"
        ]
    );
}

#[tokio::test]
async fn repeated_queries_download_each_file_once() {
    let temp_dir = TempDir::new().unwrap();
    let archive = Arc::new(StubArchive::float_1900722(&[
        "D1900722_001.nc",
        "D1900722_002.nc",
    ]));
    let reader = Arc::new(RecordingReader::default());
    let broker = stub_broker(&temp_dir, archive.clone(), reader.clone()).await;
    let query = params(json!({"dac": "aoml", "float": "1900722"}));

    broker.execute(queries::DATA, Some(&query)).await.unwrap();
    broker.execute(queries::DATA, Some(&query)).await.unwrap();
    broker.execute(queries::META, Some(&query)).await.unwrap();

    assert_eq!(archive.downloads.load(Ordering::SeqCst), 3);
    assert_eq!(archive.page_requests.load(Ordering::SeqCst), 2);

    let stats = broker.cache().stats();
    assert_eq!(stats.downloads, 3);
    assert_eq!(stats.hits, 4);
    assert_eq!(stats.active_sessions, 0);
}

#[tokio::test]
async fn concurrent_queries_share_downloads() {
    let temp_dir = TempDir::new().unwrap();
    let archive = Arc::new(StubArchive::float_1900722(&[
        "D1900722_001.nc",
        "D1900722_002.nc",
        "D1900722_003.nc",
    ]));
    let reader = Arc::new(RecordingReader::default());
    let broker = Arc::new(stub_broker(&temp_dir, archive.clone(), reader).await);

    let mut handles = Vec::new();
    for _ in 0..4 {
        let broker = Arc::clone(&broker);
        handles.push(tokio::spawn(async move {
            let query = params(json!({"dac": "aoml", "float": "1900722"}));
            broker.execute(queries::DATA, Some(&query)).await.map(|_| ())
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(archive.downloads.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn missing_float_fails_before_network() {
    let temp_dir = TempDir::new().unwrap();
    let archive = Arc::new(StubArchive::float_1900722(&["R1900722_001.nc"]));
    let broker = stub_broker(
        &temp_dir,
        archive.clone(),
        Arc::new(RecordingReader::default()),
    )
    .await;

    for (name, query, field) in [
        (queries::META, json!({"float": "1900722"}), "dac"),
        (queries::META, json!({"dac": "aoml"}), "float"),
        (queries::DATA, json!({"float": "1900722"}), "dac"),
        (queries::DATA, json!({}), "dac"),
    ] {
        match broker.execute(name, Some(&params(query))).await {
            Err(AppError::Validation(ValidationError::MissingField { field: missing })) => {
                assert_eq!(missing, field);
            }
            other => panic!("Expected missing {}, got {:?}", field, other),
        }
    }

    let no_params = broker.execute(queries::DATA, None).await;
    assert!(matches!(
        no_params,
        Err(AppError::Validation(ValidationError::MissingField { .. }))
    ));
    assert_eq!(archive.network_calls(), 0);
}

#[tokio::test]
async fn unknown_and_unsupported_query_names_differ() {
    let temp_dir = TempDir::new().unwrap();
    let broker = stub_broker(
        &temp_dir,
        Arc::new(StubArchive::default()),
        Arc::new(RecordingReader::default()),
    )
    .await;

    let unknown = broker.execute("urn:pokapok:udal:argo:nothing", None).await;
    let unsupported = broker.execute(queries::WOA23, None).await;

    let unknown = unknown.unwrap_err();
    let unsupported = unsupported.unwrap_err();
    assert!(matches!(unknown, AppError::Query(QueryError::Unknown { .. })));
    assert!(matches!(
        unsupported,
        AppError::Query(QueryError::Unsupported { .. })
    ));
    assert!(unknown.to_string().starts_with("unknown query name"));
    assert!(unsupported.to_string().starts_with("unsupported query name"));
}

#[tokio::test]
async fn failed_metadata_download_names_url() {
    let temp_dir = TempDir::new().unwrap();
    let broker = stub_broker(
        &temp_dir,
        Arc::new(StubArchive::default()),
        Arc::new(RecordingReader::default()),
    )
    .await;

    let err = broker
        .execute(
            queries::META,
            Some(&params(json!({"dac": "aoml", "float": "1900722"}))),
        )
        .await
        .unwrap_err();

    match err {
        AppError::Retrieval(RetrievalError::ServerError { url, status }) => {
            assert_eq!(url, META_URL);
            assert_eq!(status, 404);
        }
        other => panic!("Expected ServerError, got {:?}", other),
    }
    let float_dir = temp_dir.path().join("argo/dac/aoml/1900722");
    assert_eq!(std::fs::read_dir(float_dir).unwrap().count(), 0);
}

#[tokio::test]
async fn query_result_json_report() {
    let temp_dir = TempDir::new().unwrap();
    let archive = Arc::new(StubArchive::float_1900722(&["D1900722_001.nc"]));
    let broker = stub_broker(&temp_dir, archive, Arc::new(RecordingReader::default())).await;
    let query = params(json!({"dac": "aoml", "float": "1900722"}));

    let meta = broker.execute(queries::META, Some(&query)).await.unwrap();
    let json = meta.to_json().unwrap();
    assert_eq!(json["query"]["name"], queries::META);
    assert_eq!(json["metadata"]["institution"], "AOML");
    assert!(json.get("data").is_none());

    let data = broker.execute(queries::DATA, Some(&query)).await.unwrap();
    let json = data.to_json().unwrap();
    assert_eq!(json["query"]["name"], queries::DATA);
    assert_eq!(json["data"]["dimensions"][0]["name"], "N_PROF");
}
