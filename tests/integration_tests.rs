use ami_kafka::{
    identity::{EntityId, SystemIdentity},
    pipeline::{producer::memory::MemoryProducerFactory, PublishPipeline},
    server::routes::create_router,
};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

const SAMPLE_BODY: &str = "Event: Newchannel\r\n\
    Privilege: call,all\r\n\
    Channel: PJSIP/100-00000001\r\n\
    ChannelState: 6\r\n\
    CallerIDNum: 100\r\n\
    Context: from-internal\r\n";

fn write_config(path: &Path, filters: &str) {
    let content = format!(
        r#"{{
            "general": {{ "enabled": true, "format": "json", "eventfilter": {} }},
            "kafka": {{ "connection": "main", "topic": "pbx.ami" }},
            "connections": {{ "main": {{ "brokers": "localhost:9092" }} }}
        }}"#,
        filters
    );
    let mut file = std::fs::File::create(path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
}

fn setup(dir: &tempfile::TempDir) -> (Router, Arc<PublishPipeline>, Arc<MemoryProducerFactory>) {
    let path = dir.path().join("ami_kafka.json");
    write_config(
        &path,
        r#"[
            { "criteria": "eventfilter(action(include),header(Channel),method(starts_with))", "pattern": "PJSIP/" },
            "!Context: default"
        ]"#,
    );

    let factory = Arc::new(MemoryProducerFactory::new());
    let identity = SystemIdentity::new(
        EntityId::new([0x02, 0x00, 0x5e, 0x10, 0x00, 0x01]),
        Some("pbx-test".to_string()),
    );
    let pipeline = Arc::new(PublishPipeline::new(Arc::new(identity), factory.clone()));
    pipeline.reload_from_file(&path).unwrap();

    let router = create_router(Arc::clone(&pipeline), path, "/ami/events");
    (router, pipeline, factory)
}

async fn post(app: &Router, uri: &str, body: &str) -> StatusCode {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
}

async fn get(app: &Router, uri: &str) -> StatusCode {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_end_to_end_publish() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _, factory) = setup(&dir);

    assert_eq!(get(&app, "/-/healthz").await, StatusCode::OK);
    assert_eq!(get(&app, "/-/ready").await, StatusCode::OK);

    assert_eq!(post(&app, "/ami/events", SAMPLE_BODY).await, StatusCode::ACCEPTED);
    assert_eq!(
        post(&app, "/ami/events", "Event: Newchannel\r\nChannel: SIP/200-00000003\r\n").await,
        StatusCode::ACCEPTED
    );
    assert_eq!(
        post(&app, "/ami/events", "Event: Newchannel\r\nChannel: PJSIP/1\r\nContext: default\r\n").await,
        StatusCode::ACCEPTED
    );

    let records = factory.producer().records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].topic, "pbx.ami");
    assert_eq!(records[0].key, "Newchannel");

    let value: serde_json::Value = serde_json::from_slice(&records[0].payload).unwrap();
    assert_eq!(value["Event"], "Newchannel");
    assert_eq!(value["Channel"], "PJSIP/100-00000001");
    assert_eq!(value["ChannelState"], "6");
    assert_eq!(value["EntityID"], "02:00:5e:10:00:01");
    assert_eq!(value["SystemName"], "pbx-test");
}

#[tokio::test]
async fn test_reload_applies_new_filters() {
    let dir = tempfile::tempdir().unwrap();
    let (app, pipeline, factory) = setup(&dir);
    let version = pipeline.snapshot().unwrap().version;

    write_config(&dir.path().join("ami_kafka.json"), r#"["Channel: SIP/"]"#);
    assert_eq!(post(&app, "/-/reload", "").await, StatusCode::OK);
    assert!(pipeline.snapshot().unwrap().version > version);

    post(&app, "/ami/events", SAMPLE_BODY).await;
    post(&app, "/ami/events", "Event: Hangup\r\nChannel: SIP/200-00000003\r\n").await;

    let records = factory.producer().records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].key, "Hangup");
    assert_eq!(factory.created().len(), 1);
}

#[tokio::test]
async fn test_failed_reload_keeps_previous_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let (app, pipeline, factory) = setup(&dir);
    let before = pipeline.snapshot().unwrap();

    write_config(
        &dir.path().join("ami_kafka.json"),
        r#"[{ "criteria": "eventfilter(name(Hangup),method(none))", "pattern": "x" }]"#,
    );
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/-/reload")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let message = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(message.contains("eventfilter(name(Hangup),method(none)) = x"));
    assert!(message.contains("'none' with a filter pattern"));

    assert!(Arc::ptr_eq(&before, &pipeline.snapshot().unwrap()));
    post(&app, "/ami/events", SAMPLE_BODY).await;
    assert_eq!(factory.producer().records().len(), 1);
}

#[tokio::test]
async fn test_not_ready_without_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let factory = Arc::new(MemoryProducerFactory::new());
    let identity = SystemIdentity::new(EntityId::new([2, 0, 0, 0, 0, 1]), None);
    let pipeline = Arc::new(PublishPipeline::new(Arc::new(identity), factory.clone()));
    let app = create_router(pipeline, dir.path().join("missing.json"), "/ami/events");

    assert_eq!(get(&app, "/-/ready").await, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(post(&app, "/ami/events", SAMPLE_BODY).await, StatusCode::ACCEPTED);
    assert_eq!(post(&app, "/-/reload", "").await, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(factory.producer().records().is_empty());
}
