//! HTTP-level tests of the admin API client against a mock server

use serde_json::json;
use wiremock::{
    matchers::{bearer_token, body_json, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use sonata_admin::{
    api::{list_records, ApiClient, ApiResponse, ResourceApi},
    catalog,
    dashboard::{load_summary, TileValue},
    form::{SubmitBlocked, SubmitOutcome},
    models::{Grade, Instrument, ListQuery, Resource},
    notify::NotificationQueue,
    page::ResourcePage,
};

/// Mock admin API plus a client pointed at it
struct AdminMockServer {
    server: MockServer,
    notifications: NotificationQueue,
    api: ApiClient,
}

impl AdminMockServer {
    async fn new() -> Self {
        let server = MockServer::start().await;
        let notifications = NotificationQueue::new();
        let api = ApiClient::with_client(reqwest::Client::new(), server.uri(), notifications.clone())
            .unwrap()
            .with_token(Some("secret-token".to_string()));
        Self {
            server,
            notifications,
            api,
        }
    }
}

#[tokio::test]
async fn test_list_reads_pagination() {
    let mock = AdminMockServer::new().await;
    Mock::given(method("GET"))
        .and(path("/admin/instruments"))
        .and(query_param("page", "2"))
        .and(query_param("resultsPerPage", "2"))
        .and(bearer_token("secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "id": 3, "name": "Cello" }, { "id": 4, "name": "Flute" }],
            "currentPage": 2,
            "totalPages": 3,
            "totalResults": 6
        })))
        .expect(1)
        .mount(&mock.server)
        .await;

    let response = list_records::<Instrument>(&mock.api, &ListQuery::new(2, 2)).await;
    let pagination = response.pagination().cloned().unwrap();
    assert_eq!(pagination.current_page, 2);
    assert_eq!(pagination.total_pages, 3);
    assert_eq!(pagination.total_results, 6);

    let rows = response.into_rows().unwrap();
    assert_eq!(rows.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(), ["Cello", "Flute"]);
}

#[tokio::test]
async fn test_insert_sends_data_envelope() {
    let mock = AdminMockServer::new().await;
    Mock::given(method("POST"))
        .and(path("/admin/grades"))
        .and(body_json(json!({ "data": [{ "name": "Grade 1" }] })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "results": [{ "id": 7, "name": "Grade 1" }]
        })))
        .expect(1)
        .mount(&mock.server)
        .await;

    let mut page = ResourcePage::<Grade>::new(ListQuery::default());
    let response = page.insert(&mock.api, vec![json!({ "name": "Grade 1" })]).await;

    assert!(response.is_success());
    assert_eq!(page.get(7).map(|g| g.name.as_str()), Some("Grade 1"));
}

#[tokio::test]
async fn test_delete_sends_ids() {
    let mock = AdminMockServer::new().await;
    Mock::given(method("DELETE"))
        .and(path("/admin/classes"))
        .and(body_json(json!({ "data": [{ "id": 3 }, { "id": 4 }] })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock.server)
        .await;

    let response = mock.api.delete(Resource::Class, vec![3, 4]).await;
    assert!(response.is_success());
}

#[tokio::test]
async fn test_validation_errors_reach_form_fields() {
    let mock = AdminMockServer::new().await;
    Mock::given(method("POST"))
        .and(path("/admin/students"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Validation failed",
            "errors": { "user.email": ["Email already registered"] }
        })))
        .expect(1)
        .mount(&mock.server)
        .await;

    let mut form = catalog::spec(Resource::Student).form();
    form.input("email", "ana@example.com");
    form.input("firstName", "Ana");

    let api = &mock.api;
    let payload = form.payload();
    let outcome = form
        .submit(|_| async move { Ok::<_, SubmitBlocked>(api.insert(Resource::Student, vec![payload]).await) })
        .await;

    match outcome {
        SubmitOutcome::Rejected(failed) => {
            assert_eq!(failed.status, Some(422));
            assert_eq!(failed.message, "Validation failed");
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    assert_eq!(form.state().error("email"), Some("Email already registered"));
    assert_eq!(form.state().form_error(), Some("Validation failed"));
    assert_eq!(mock.notifications.len(), 1);
}

#[tokio::test]
async fn test_failed_refetch_keeps_rows() {
    let mock = AdminMockServer::new().await;
    Mock::given(method("GET"))
        .and(path("/admin/grades"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "id": 1, "name": "Grade 1" }]
        })))
        .up_to_n_times(1)
        .mount(&mock.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/grades"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock.server)
        .await;

    let mut page = ResourcePage::<Grade>::new(ListQuery::default());
    assert!(page.fetch(&mock.api).await);
    assert!(!page.fetch(&mock.api).await);

    assert_eq!(page.rows().len(), 1);
    assert_eq!(page.last_error().and_then(|f| f.status), Some(500));
    assert_eq!(page.last_error().map(|f| f.message.as_str()), Some("Internal Server Error"));
}

#[tokio::test]
async fn test_malformed_body_is_failure() {
    let mock = AdminMockServer::new().await;
    Mock::given(method("GET"))
        .and(path("/admin/instruments"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&mock.server)
        .await;

    let response = mock.api.list(Resource::Instrument, &ListQuery::default()).await;
    assert_eq!(response.failure().and_then(|f| f.status), Some(200));
}

#[tokio::test]
async fn test_login_and_current_user() {
    let mock = AdminMockServer::new().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({ "email": "admin@school.id", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "fresh-token" })))
        .mount(&mock.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(bearer_token("fresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "email": "admin@school.id",
            "userType": "ADMIN"
        })))
        .mount(&mock.server)
        .await;

    let session = match mock.api.login("admin@school.id", "pw").await {
        ApiResponse::Single(session) => session,
        other => panic!("expected a session, got {:?}", other),
    };
    assert_eq!(session.token, "fresh-token");

    let api = mock.api.clone().with_token(Some(session.token));
    match api.current_user().await {
        ApiResponse::Single(user) => assert_eq!(user.email, "admin@school.id"),
        other => panic!("expected the current user, got {:?}", other),
    }
}

#[tokio::test]
async fn test_dashboard_tiles_fail_independently() {
    let mock = AdminMockServer::new().await;
    Mock::given(method("GET"))
        .and(path("/admin/students"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [],
            "totalResults": 120
        })))
        .mount(&mock.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/teachers"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock.server)
        .await;

    let tiles = load_summary(&mock.api, &[Resource::Student, Resource::Teacher]).await;
    assert_eq!(tiles[0].value, TileValue::Count(120));
    assert!(matches!(tiles[1].value, TileValue::Unavailable(_)));
}
