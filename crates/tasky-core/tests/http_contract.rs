use chrono::{TimeZone, Utc};
use serde_json::{Value, json};
use tasky_core::api::{ApiConfig, ApiError, TaskApi};
use tasky_core::http::HttpTaskApi;
use tasky_core::query::LaneQuery;
use tasky_shared::{Lane, PriorityCode, StatusCode, TaskFields};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn task_json(id: u64, title: &str, status: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": "",
        "status": status,
        "priority": "HI",
        "due_date": "2024-06-01T12:00:00Z",
        "category": "home",
        "assigned_to": 1
    })
}

fn client(server: &MockServer) -> HttpTaskApi {
    let config = ApiConfig::new(&server.uri())
        .expect("config")
        .with_cookie("sessionid=s1; csrftoken=tok123");
    HttpTaskApi::new(config).expect("client")
}

#[tokio::test]
async fn lane_listing_reads_tasks_and_count_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks/overdue/"))
        .and(query_param("category", "home"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tasks": [task_json(7, "Pay rent", "OV")],
            "overdue_count": 4
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = LaneQuery {
        category: Some("home".to_string()),
        ..LaneQuery::default()
    };
    let page = client(&server)
        .list_by_status(Lane::Overdue, &query)
        .await
        .expect("lane page");

    assert_eq!(page.count, 4);
    assert_eq!(page.tasks.len(), 1);
    assert_eq!(page.tasks[0].status, StatusCode::Overdue);
    assert_eq!(page.tasks[0].assigned_to, Some(1));
}

#[tokio::test]
async fn status_patch_sends_csrf_header_and_status_body() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/tasks/7/update/"))
        .and(header("X-CSRFToken", "tok123"))
        .and(body_json(json!({ "status": "CO" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_json(7, "Pay rent", "CO")))
        .expect(1)
        .mount(&server)
        .await;

    let task = client(&server)
        .patch_status(7, &StatusCode::Completed)
        .await
        .expect("patched");
    assert_eq!(task.status, StatusCode::Completed);
}

#[tokio::test]
async fn create_posts_to_collection_and_surfaces_validation_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tasks/"))
        .and(header("X-CSRFToken", "tok123"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!(["You already have a task with this title."])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let draft = TaskFields {
        title: "Pay rent".to_string(),
        description: String::new(),
        status: StatusCode::InProgress,
        priority: PriorityCode::High,
        due_date: Utc
            .with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
            .single()
            .expect("valid due"),
        category: "home".to_string(),
    };
    let err = client(&server).create(&draft).await.expect_err("rejected");

    assert_eq!(err.status(), Some(400));
    assert_eq!(err.banner_text(), "You already have a task with this title.");
}

#[tokio::test]
async fn delete_and_replace_use_their_own_routes() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/tasks/3/delete/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/tasks/3/update/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_json(3, "Renamed", "IP")))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server);
    let current = tasky_shared::Task {
        id: 3,
        title: "Renamed".to_string(),
        description: String::new(),
        status: StatusCode::InProgress,
        priority: PriorityCode::High,
        due_date: Utc
            .with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
            .single()
            .expect("valid due"),
        category: "home".to_string(),
        assigned_to: None,
    };
    let replaced = api.replace(3, &current.fields()).await.expect("replaced");
    assert_eq!(replaced.title, "Renamed");
    api.remove(3).await.expect("deleted");
}

#[tokio::test]
async fn single_fetch_and_search_decode_task_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks/9/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_json(9, "Pay rent", "ZZ")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/"))
        .and(query_param("q", "pay rent"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([task_json(9, "Pay rent", "IP")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server);
    let task = api.get_one(9).await.expect("task");
    assert_eq!(task.status, StatusCode::Other("ZZ".to_string()));
    assert_eq!(task.status.label(), "ZZ");

    let found = api.search("pay rent").await.expect("search");
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn missing_task_and_bad_body_map_to_typed_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks/404/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Not found." })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tasks/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let api = client(&server);
    let missing = api.get_one(404).await.expect_err("missing");
    assert_eq!(missing.banner_text(), "Not found.");

    let garbled = api.list_all().await.expect_err("garbled");
    assert!(matches!(garbled, ApiError::Decode { .. }));
}
