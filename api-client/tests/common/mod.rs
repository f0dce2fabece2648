#![allow(dead_code)]

use sbercdn_exporter_config::{
    ClientConfig,
    Config,
};
use serde_json::json;
use std::time::Duration;
use wiremock::{
    matchers::{
        body_string_contains,
        method,
        path,
    },
    Mock,
    MockServer,
    ResponseTemplate,
};

pub const AUTH_PATH: &str = "/app/oauth/v1/token/";
pub const ACCOUNTS_PATH: &str = "/app/inventory/v1/accounts/";

pub fn client_config(server: &MockServer) -> ClientConfig {
    let mut config = Config::default().api;
    config.url = server.uri().parse().unwrap();
    config.username = "user".to_string();
    config.password = "secret".to_string();
    config.max_query_time = Duration::from_secs(2);
    config
}

pub fn auth_ok(token: &str) -> Mock {
    Mock::given(method("POST"))
        .and(path(AUTH_PATH))
        .and(body_string_contains("username=user"))
        .and(body_string_contains("password=secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": token })))
}

pub fn accounts(body: serde_json::Value) -> Mock {
    Mock::given(method("GET"))
        .and(path(ACCOUNTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
}
