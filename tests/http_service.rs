use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use cet_recommender::AppState;
use cet_recommender::data::model::{AdmissionRecord, DatasetStore, HistoricalRecord};
use cet_recommender::data::stats::TrendConfig;
use cet_recommender::predict::ForestPredictor;
use cet_recommender::server::build_router;

const MODEL: &str = r#"{
    "encoder": {
        "categorical": [
            {"feature": "branch", "categories": ["CS", "IT"]},
            {"feature": "gender", "categories": ["Female", "Male"]}
        ],
        "numeric": ["percentile", "rank"],
        "handle_unknown": "error"
    },
    "classes": ["ABC College, Pune", "Delta Institute, Mumbai"],
    "trees": [
        {"nodes": [
            {"feature": 4, "threshold": 92.0, "left": 1, "right": 2},
            {"value": [5.0, 1.0]},
            {"value": [1.0, 5.0]}
        ]}
    ]
}"#;

fn fixture_state() -> AppState {
    let store = DatasetStore::from_records(
        vec![
            AdmissionRecord::new("ABC College, Pune", "CS", "General", "MHT-CET", 90.0),
            AdmissionRecord::new("Delta Institute, Mumbai", "IT", "GOPENS", "MHT-CET", 95.5),
            AdmissionRecord::new("Gamma College, Pune", "CS", "GOPENS", "JEE", 85.0),
        ],
        vec![
            HistoricalRecord::new("X College", "CS", "GOPENS", 90.0),
            HistoricalRecord::new("X College", "CS", "LOPENS", 80.0),
            HistoricalRecord::new("X College", "IT", "GOPENS", 70.0),
        ],
    );
    let model = ForestPredictor::from_json(MODEL).expect("fixture model");
    AppState::new(store, Arc::new(model), TrendConfig::default())
}

async fn spawn_app() -> SocketAddr {
    let app = build_router(fixture_state());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    addr
}

async fn send_raw(addr: SocketAddr, method: &str, path: &str, body: Option<&str>) -> (u16, String, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let body = body.unwrap_or("");
    let req = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    );
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("status");
    (status, head.to_string(), body.to_string())
}

fn parse(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("invalid json {body}: {e}"))
}

#[tokio::test]
async fn home_and_filters() {
    let addr = spawn_app().await;

    let (status, head, body) = send_raw(addr, "GET", "/", None).await;
    assert_eq!(status, 200);
    assert!(body.contains("API is running"));
    assert!(head.to_ascii_lowercase().contains("access-control-allow-origin: *"));

    let (status, _, body) = send_raw(addr, "GET", "/filters", None).await;
    assert_eq!(status, 200);
    assert_eq!(
        parse(&body),
        json!({
            "cities": ["Mumbai", "Pune"],
            "branches": ["CS", "IT"],
            "seat_types": ["GOPENS", "General"]
        })
    );
}

#[tokio::test]
async fn recommend_ranks_and_validates() {
    let addr = spawn_app().await;

    let (status, _, body) =
        send_raw(addr, "POST", "/recommend", Some(r#"{"percentile": 96}"#)).await;
    assert_eq!(status, 200);
    let rows = parse(&body);
    assert_eq!(rows.as_array().map(Vec::len), Some(2));
    assert_eq!(rows[0]["college_name"], "Delta Institute, Mumbai");
    assert_eq!(rows[1]["city_guess"], "Pune");
    assert_eq!(rows[1]["min"], 90.0);

    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/recommend",
        Some(r#"{"percentile": "99", "score_type": "jee", "cities": ["Pune"]}"#),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(parse(&body)[0]["college_name"], "Gamma College, Pune");

    let (status, _, body) =
        send_raw(addr, "POST", "/recommend", Some(r#"{"percentile": 88}"#)).await;
    assert_eq!(status, 200);
    assert_eq!(parse(&body), json!([]));

    let (status, _, body) =
        send_raw(addr, "POST", "/recommend", Some(r#"{"percentile": "abc"}"#)).await;
    assert_eq!(status, 400);
    assert_eq!(parse(&body)["fields"], json!(["percentile"]));

    let (status, _, _) = send_raw(addr, "POST", "/recommend", Some("not json")).await;
    assert_eq!(status, 400);

    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/recommend",
        Some(r#"{"percentile": 90, "score_type": ["JEE"]}"#),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(parse(&body)["fields"], json!(["score_type"]));

    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/recommend",
        Some(r#"{"percentile": 90, "cities": "Pune"}"#),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(parse(&body)["fields"], json!(["cities"]));
}

#[tokio::test]
async fn college_stats_and_trend() {
    let addr = spawn_app().await;

    let (status, _, body) = send_raw(
        addr,
        "GET",
        "/college-stats?college=X%20College&branch=CS&percentile=86",
        None,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(
        parse(&body),
        json!([{"branch": "CS", "percentile": 90.0, "seat_type": "GOPENS"}])
    );

    let (status, _, _) = send_raw(addr, "GET", "/college-stats?branch=CS", None).await;
    assert_eq!(status, 400);

    let (status, _, _) =
        send_raw(addr, "GET", "/college-stats?college=X%20College&percentile=high", None).await;
    assert_eq!(status, 400);

    // Seed 42 assigns 2023, 2021, 2023 to the three rows.
    let (status, _, body) =
        send_raw(addr, "GET", "/branch-trend?college=X%20College&branch=CS", None).await;
    assert_eq!(status, 200);
    assert_eq!(
        parse(&body),
        json!([
            {"year": 2021, "average_percentile": 80.0},
            {"year": 2023, "average_percentile": 90.0}
        ])
    );

    let (status, _, body) =
        send_raw(addr, "GET", "/branch-trend?college=X%20College&branch=Civil", None).await;
    assert_eq!(status, 404);
    assert!(parse(&body)["error"].as_str().is_some());

    let (status, _, _) = send_raw(addr, "GET", "/branch-trend?college=X%20College", None).await;
    assert_eq!(status, 400);

    let (status, _, body) = send_raw(addr, "GET", "/debug-columns", None).await;
    assert_eq!(status, 200);
    assert_eq!(
        parse(&body)["columns"],
        json!(["college_name", "branch", "seat_type", "percentile"])
    );
}

#[tokio::test]
async fn predict_statuses() {
    let addr = spawn_app().await;
    let profile = json!({
        "percentile": 95.0,
        "rank": 2100,
        "branch": "CS",
        "seat_type": "GOPENS",
        "category": "OPEN",
        "score_type": "MHT-CET",
        "gender": "Male"
    });

    let (status, _, body) =
        send_raw(addr, "POST", "/predict", Some(&profile.to_string())).await;
    assert_eq!(status, 200);
    assert_eq!(parse(&body), json!({"predicted_college": "Delta Institute, Mumbai"}));

    let mut missing = profile.clone();
    missing["branch"] = Value::Null;
    let (status, _, body) =
        send_raw(addr, "POST", "/predict", Some(&missing.to_string())).await;
    assert_eq!(status, 400);
    assert_eq!(parse(&body)["fields"], json!(["branch"]));

    // Recommendation-only fields do not affect prediction.
    let mut with_filters = profile.clone();
    with_filters["cities"] = json!("Pune");
    let (status, _, body) =
        send_raw(addr, "POST", "/predict", Some(&with_filters.to_string())).await;
    assert_eq!(status, 200);
    assert_eq!(parse(&body), json!({"predicted_college": "Delta Institute, Mumbai"}));

    let mut unseen = profile.clone();
    unseen["gender"] = json!("Other");
    let (status, _, body) =
        send_raw(addr, "POST", "/predict", Some(&unseen.to_string())).await;
    assert_eq!(status, 422);
    assert_eq!(parse(&body)["error"], "Prediction failed");
}

#[tokio::test]
async fn preflight_is_answered() {
    let addr = spawn_app().await;
    let (status, head, _) = send_raw(addr, "OPTIONS", "/predict", None).await;
    assert_eq!(status, 204);
    assert!(head.to_ascii_lowercase().contains("access-control-allow-methods"));
}
