use freshness_tracker::config::ClientOptions;
use freshness_tracker::freshness::{FreshnessBucket, FreshnessResolver, ReportState};
use serde_json::{json, Value};
use tokio_test::assert_ok;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn resolver_for(server: &MockServer) -> FreshnessResolver {
    let options = ClientOptions::new(&server.uri(), "http://shop.local:3000").unwrap();
    FreshnessResolver::new(options, reqwest::Client::new())
}

fn report_json(id: i64, days_on_shelf: i64) -> Value {
    json!({
        "id": id,
        "product": "Beef",
        "batch_identifier": format!("B-{}", id),
        "butcher_date": "2024-01-01",
        "arrival_date": "2024-01-03",
        "created_at": "2024-01-03T09:00:00",
        "days_on_shelf": days_on_shelf
    })
}

#[tokio::test]
async fn test_four_days_is_caution() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/batches/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(report_json(4, 4)))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = resolver_for(&server);
    let report = assert_ok!(resolver.fetch_batch("4").await);

    assert_eq!(report.bucket, FreshnessBucket::Caution);
    assert_eq!(report.days_on_shelf, 4);
    assert_eq!(resolver.state(), ReportState::Ready(report));
}

#[tokio::test]
async fn test_five_days_is_expired() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/batches/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(report_json(5, 5)))
        .mount(&server)
        .await;

    let resolver = resolver_for(&server);
    let report = assert_ok!(resolver.fetch_batch("5").await);

    assert_eq!(report.bucket, FreshnessBucket::Expired);
    assert_eq!(report.bucket.label(), "Expired");
}

#[tokio::test]
async fn test_two_days_is_fresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/batches/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(report_json(2, 2)))
        .mount(&server)
        .await;

    let resolver = resolver_for(&server);
    let report = assert_ok!(resolver.fetch_batch("2").await);
    assert_eq!(report.bucket, FreshnessBucket::Fresh);
}

#[tokio::test]
async fn test_missing_batch_reports_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/batches/999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Batch not found"})))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = resolver_for(&server);
    let err = resolver.fetch_batch("999").await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(resolver.state(), ReportState::Failed("Batch not found".to_string()));
}

#[tokio::test]
async fn test_other_failures_show_server_detail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/batches/1"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "Database unavailable"})))
        .mount(&server)
        .await;

    let resolver = resolver_for(&server);
    assert!(resolver.fetch_batch("1").await.is_err());
    assert_eq!(resolver.state(), ReportState::Failed("Database unavailable".to_string()));
}

#[tokio::test]
async fn test_validation_detail_is_joined() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/batches/abc"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [{"loc": ["path", "batch_id"], "msg": "value is not a valid integer"}]
        })))
        .mount(&server)
        .await;

    let resolver = resolver_for(&server);
    assert!(resolver.fetch_batch("abc").await.is_err());
    assert_eq!(
        resolver.state(),
        ReportState::Failed("value is not a valid integer".to_string())
    );
}

#[tokio::test]
async fn test_failure_without_detail_is_generic() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/batches/2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let resolver = resolver_for(&server);
    assert!(resolver.fetch_batch("2").await.is_err());
    assert_eq!(
        resolver.state(),
        ReportState::Failed("Failed to fetch batch details".to_string())
    );
}
