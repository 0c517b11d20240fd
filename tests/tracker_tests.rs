use std::sync::Arc;

use freshness_tracker::auth::{MemoryTokenStorage, TokenStorage, TOKEN_KEY};
use freshness_tracker::config::ClientOptions;
use freshness_tracker::routes::{nav_links, GuardDecision, NavItem, Route};
use freshness_tracker::FreshnessTracker;
use serde_json::json;
use tokio_test::assert_ok;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn tracker_for(server: &MockServer, storage: &MemoryTokenStorage) -> FreshnessTracker {
    let options = ClientOptions::new(&server.uri(), "http://shop.local:3000").unwrap();
    FreshnessTracker::new(options, Arc::new(storage.clone()))
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-1",
            "user": {"id": 1, "email": "staff@shop.local", "full_name": "Staff"}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_guard_blocks_until_session_resolves() {
    let server = MockServer::start().await;
    let tracker = tracker_for(&server, &MemoryTokenStorage::new());
    let guard = tracker.route_guard();

    assert_eq!(guard.evaluate(&Route::Admin), GuardDecision::Pending);
    assert_eq!(guard.evaluate(&Route::Profile), GuardDecision::Pending);
    assert_eq!(guard.evaluate(&Route::Landing), GuardDecision::Allowed);
    assert_eq!(
        guard.evaluate(&Route::BatchReport("1".to_string())),
        GuardDecision::Allowed
    );

    tracker.start().await;
    assert_eq!(
        guard.evaluate(&Route::Admin),
        GuardDecision::Redirected(Route::Login)
    );
}

#[tokio::test]
async fn test_guard_is_reevaluated_on_every_entry() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let tracker = tracker_for(&server, &MemoryTokenStorage::new());
    tracker.start().await;
    let guard = tracker.route_guard();

    assert_eq!(
        guard.evaluate(&Route::Profile),
        GuardDecision::Redirected(Route::Login)
    );

    assert_ok!(tracker.session().login("staff@shop.local", "secret").await);
    assert_eq!(guard.evaluate(&Route::Profile), GuardDecision::Allowed);
    assert_eq!(guard.evaluate(&Route::Admin), GuardDecision::Allowed);

    assert_ok!(tracker.session().logout());
    assert_eq!(
        guard.evaluate(&Route::Admin),
        GuardDecision::Redirected(Route::Login)
    );
}

#[tokio::test]
async fn test_start_with_rejected_token_redirects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let storage = MemoryTokenStorage::new();
    storage.set(TOKEN_KEY, "expired").unwrap();
    let tracker = tracker_for(&server, &storage);
    tracker.start().await;

    assert_eq!(
        tracker.route_guard().evaluate(&Route::Admin),
        GuardDecision::Redirected(Route::Login)
    );
    assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_nav_links_follow_session() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let tracker = tracker_for(&server, &MemoryTokenStorage::new());
    tracker.start().await;

    let signed_out = nav_links(tracker.session());
    assert!(signed_out.contains(&NavItem::Link { label: "Sign In", route: Route::Login }));
    assert!(!signed_out.contains(&NavItem::Logout));

    assert_ok!(tracker.session().login("staff@shop.local", "secret").await);
    let signed_in = nav_links(tracker.session());
    assert!(signed_in.contains(&NavItem::Link { label: "Admin Portal", route: Route::Admin }));
    assert!(signed_in.contains(&NavItem::Logout));
}

#[tokio::test]
async fn test_view_models_share_configuration() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/batches/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 3,
            "product": "Seafood",
            "batch_identifier": "S-3",
            "butcher_date": "2024-04-01",
            "arrival_date": "2024-04-02"
        }])))
        .mount(&server)
        .await;

    let tracker = tracker_for(&server, &MemoryTokenStorage::new());
    let registry = tracker.batch_registry();
    assert_ok!(registry.fetch_batches().await);

    let targets = assert_ok!(registry.scan_targets());
    let route = Route::from_url(&targets[0].url);
    assert_eq!(route, Some(Route::BatchReport("3".to_string())));
}

#[tokio::test]
async fn test_public_config_discovery() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/config/public"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "public_host": "192.168.1.20",
            "public_port": 3000,
            "public_url": "http://192.168.1.20:3000",
            "api_host": "0.0.0.0",
            "api_port": 8000,
            "api_url": "http://192.168.1.20:8000"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = tracker_for(&server, &MemoryTokenStorage::new());
    let advertised = assert_ok!(tracker.public_config().await);
    let options = assert_ok!(advertised.apply_to(tracker.options.clone()));

    assert_eq!(options.public_url.as_str(), "http://192.168.1.20:3000/");
    assert_eq!(options.api_url, tracker.options.api_url);
}
