mod common;

use chrono::{
    TimeZone as _,
    Utc,
};
use common::*;
use pretty_assertions::assert_eq;
use sbercdn_api_client::{
    ApiError,
    CdnApiClient,
    MetricGroup,
    StatQuery,
    TimeWindow,
};
use serde_json::json;
use std::time::Duration;
use wiremock::{
    matchers::{
        header,
        method,
        path,
        query_param,
    },
    Mock,
    MockServer,
    ResponseTemplate,
};

fn query(group: MetricGroup) -> StatQuery {
    let trigger = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 42).unwrap();
    StatQuery {
        account: "acc1".to_string(),
        group,
        window: TimeWindow::ending_at(trigger, Duration::from_secs(60), Duration::ZERO),
    }
}

#[tokio::test]
async fn statistic_query_carries_token_and_window() {
    let server = MockServer::start().await;
    auth_ok("t1").mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/app/statistic/v3/codes"))
        .and(header("Cdn-Auth-Token", "t1"))
        .and(query_param("account", "acc1"))
        .and(query_param("start", "2024-03-01T12:29:00"))
        .and(query_param("end", "2024-03-01T12:30:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": [{ "code": 200.0, "hits": 50.0 }] })))
        .expect(1)
        .mount(&server)
        .await;

    let client = CdnApiClient::connect(&client_config(&server)).await.unwrap();
    let payload = client.stats().fetch(&query(MetricGroup::Code)).await.unwrap();
    assert_eq!(payload["result"][0]["hits"], json!(50.0));
}

#[tokio::test]
async fn server_errors_are_not_retried() {
    let server = MockServer::start().await;
    auth_ok("t1").mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/app/statistic/v3/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = CdnApiClient::connect(&client_config(&server)).await.unwrap();
    let err = client.stats().fetch(&query(MetricGroup::Summary)).await.unwrap_err();
    assert!(matches!(err, ApiError::Network { .. }), "{err}");
    assert_eq!(err.status(), Some(reqwest::StatusCode::INTERNAL_SERVER_ERROR));
}

#[tokio::test]
async fn rejected_token_is_renewed_once() {
    let server = MockServer::start().await;
    auth_ok("t1").up_to_n_times(1).expect(1).mount(&server).await;
    auth_ok("t2").expect(1).mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/app/statistic/v3/"))
        .and(header("Cdn-Auth-Token", "t1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/app/statistic/v3/"))
        .and(header("Cdn-Auth-Token", "t2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "hits": 100.0 })))
        .expect(1)
        .mount(&server)
        .await;

    let client = CdnApiClient::connect(&client_config(&server)).await.unwrap();
    let payload = client.stats().fetch(&query(MetricGroup::Summary)).await.unwrap();
    assert_eq!(payload["hits"], json!(100.0));
}

#[tokio::test]
async fn second_rejection_surfaces() {
    let server = MockServer::start().await;
    auth_ok("t1").expect(2).mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/app/statistic/v3/resources"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let client = CdnApiClient::connect(&client_config(&server)).await.unwrap();
    let err = client.stats().fetch(&query(MetricGroup::Resource)).await.unwrap_err();
    assert_eq!(err.status(), Some(reqwest::StatusCode::UNAUTHORIZED));
}

#[tokio::test]
async fn statistic_payload_must_be_an_object() {
    let server = MockServer::start().await;
    auth_ok("t1").mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/app/statistic/v3/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[1, 2, 3]"))
        .mount(&server)
        .await;

    let client = CdnApiClient::connect(&client_config(&server)).await.unwrap();
    let err = client.stats().fetch(&query(MetricGroup::Summary)).await.unwrap_err();
    assert!(matches!(err, ApiError::Decode { .. }), "{err}");
}

#[tokio::test]
async fn slow_requests_hit_the_deadline() {
    let server = MockServer::start().await;
    auth_ok("t1").mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/app/statistic/v3/"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let mut config = client_config(&server);
    config.max_query_time = Duration::from_millis(200);
    let client = CdnApiClient::connect(&config).await.unwrap();
    let err = client.stats().fetch(&query(MetricGroup::Summary)).await.unwrap_err();
    assert!(matches!(err, ApiError::Network { .. }), "{err}");
}

#[tokio::test]
async fn certificates_of_an_account() {
    let server = MockServer::start().await;
    auth_ok("t1").mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/app/ssl/v1/account/acc1/certificate/"))
        .and(header("Cdn-Auth-Token", "t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "",
            "status": 200,
            "data": [{
                "alt": "a.example.com,b.example.com",
                "cn": "a.example.com",
                "issuer": "CA",
                "comment": "main",
                "start": 1700000000,
                "end": 1710000000,
            }],
        })))
        .mount(&server)
        .await;

    let client = CdnApiClient::connect(&client_config(&server)).await.unwrap();
    let records = client.certificates().fetch("acc1").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].common_name, "a.example.com");
    assert_eq!(records[0].alternate_names, ["a.example.com", "b.example.com"]);
    assert_eq!(records[0].not_after, 1_710_000_000.0);
}
