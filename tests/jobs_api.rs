mod common;

use axum::http::{Method, StatusCode};
use common::{get, send, test_app, ADMIN_TOKEN, USER_TOKEN};
use pretty_assertions::assert_eq;
use serde_json::json;

fn titles(body: &serde_json::Value) -> Vec<String> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|j| j["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_list_all() {
    let app = test_app().await;
    let res = get(&app, "/jobs").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(titles(&res.body), vec!["Job1", "Job2", "Job3", "Job4"]);
    assert_eq!(
        res.body["data"][0],
        json!({ "id": 1, "title": "Job1", "salary": 100, "equity": 0.1, "companyHandle": "c1" })
    );
    assert_eq!(res.body["data"][3]["salary"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_list_filters() {
    let app = test_app().await;
    let res = get(&app, "/jobs?hasEquity=true").await;
    assert_eq!(titles(&res.body), vec!["Job1", "Job2"]);

    let res = get(&app, "/jobs?hasEquity=false").await;
    assert_eq!(res.body["meta"]["count"], 4);

    let res = get(&app, "/jobs?minSalary=150").await;
    assert_eq!(titles(&res.body), vec!["Job2", "Job3"]);

    let res = get(&app, "/jobs?title=job1").await;
    assert_eq!(titles(&res.body), vec!["Job1"]);

    let res = get(&app, "/jobs?minSalary=150&hasEquity=true").await;
    assert_eq!(titles(&res.body), vec!["Job2"]);
}

#[tokio::test]
async fn test_list_rejects_bad_query() {
    let app = test_app().await;
    let res = get(&app, "/jobs?companyHandle=c1").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error_code(), "validation_error");

    let res = get(&app, "/jobs?hasEquity=maybe").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_read() {
    let app = test_app().await;
    let res = get(&app, "/jobs/2").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["title"], "Job2");
    assert_eq!(res.body["data"]["company"]["handle"], "c1");
    assert!(res.body["data"].get("companyHandle").is_none());

    let res = get(&app, "/jobs/999").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = get(&app, "/jobs/abc").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error_code(), "bad_request");
}

#[tokio::test]
async fn test_create() {
    let app = test_app().await;
    let body = json!({ "title": "New", "salary": 10, "equity": 0.99, "companyHandle": "c2" });

    let res = send(&app, Method::POST, "/jobs", Some(USER_TOKEN), Some(body.clone())).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.error_code(), "forbidden");

    let res = send(&app, Method::POST, "/jobs", Some(ADMIN_TOKEN), Some(body)).await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(
        res.body["data"],
        json!({ "id": 5, "title": "New", "salary": 10, "equity": 0.99, "companyHandle": "c2" })
    );

    let res = get(&app, "/companies/c2").await;
    assert_eq!(res.body["data"]["jobs"][0]["title"], "New");
}

#[tokio::test]
async fn test_create_rejects_bad_input() {
    let app = test_app().await;
    let full_equity = json!({ "title": "New", "equity": 1, "companyHandle": "c1" });
    let res = send(&app, Method::POST, "/jobs", Some(ADMIN_TOKEN), Some(full_equity)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error_code(), "validation_error");

    let negative_salary = json!({ "title": "New", "salary": -1, "companyHandle": "c1" });
    let res = send(&app, Method::POST, "/jobs", Some(ADMIN_TOKEN), Some(negative_salary)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let no_company = json!({ "title": "New", "companyHandle": "nope" });
    let res = send(&app, Method::POST, "/jobs", Some(ADMIN_TOKEN), Some(no_company)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error_code(), "validation_error");

    let no_title = json!({ "companyHandle": "c1" });
    let res = send(&app, Method::POST, "/jobs", Some(ADMIN_TOKEN), Some(no_title)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_keeps_unsent_fields() {
    let app = test_app().await;
    let res = send(
        &app,
        Method::PATCH,
        "/jobs/1",
        Some(ADMIN_TOKEN),
        Some(json!({ "title": "X", "salary": 5 })),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.body["data"],
        json!({ "id": 1, "title": "X", "salary": 5, "equity": 0.1, "companyHandle": "c1" })
    );

    let res = send(&app, Method::PATCH, "/jobs/1", Some(ADMIN_TOKEN), Some(json!({ "equity": null }))).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["equity"], serde_json::Value::Null);
    assert_eq!(res.body["data"]["salary"], 5);
}

#[tokio::test]
async fn test_update_rejects_bad_input() {
    let app = test_app().await;
    for field in ["id", "companyHandle", "handle"] {
        let mut body = serde_json::Map::new();
        body.insert(field.to_string(), json!("c2"));
        let res = send(&app, Method::PATCH, "/jobs/1", Some(ADMIN_TOKEN), Some(body.into())).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{field}");
        assert_eq!(res.error_code(), "validation_error", "{field}");
    }

    let res = send(&app, Method::PATCH, "/jobs/1", Some(ADMIN_TOKEN), Some(json!({}))).await;
    assert_eq!(res.error_code(), "no_update_data");

    let res = send(&app, Method::PATCH, "/jobs/1", Some(ADMIN_TOKEN), Some(json!({ "equity": 1.5 }))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = send(&app, Method::PATCH, "/jobs/999", Some(ADMIN_TOKEN), Some(json!({ "title": "X" }))).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = send(&app, Method::PATCH, "/jobs/1", None, Some(json!({ "title": "X" }))).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_delete() {
    let app = test_app().await;
    let res = send(&app, Method::DELETE, "/jobs/1", Some(USER_TOKEN), None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = send(&app, Method::DELETE, "/jobs/1", Some(ADMIN_TOKEN), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"], json!({ "deleted": 1 }));

    let res = get(&app, "/jobs/1").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = send(&app, Method::DELETE, "/jobs/1", Some(ADMIN_TOKEN), None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let app = test_app().await;
    let res = get(&app, "/jobs").await;
    let id = res.headers.get("x-request-id").unwrap().to_str().unwrap();
    assert!(!id.is_empty());
}
