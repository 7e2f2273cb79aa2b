/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use std::sync::Arc;

use actix_web::{
    http::{header::AUTHORIZATION, StatusCode},
    middleware::NormalizePath,
    test,
    web::Data,
    App, HttpServer,
};
use chrono::Utc;
use driver_registry_service::{domain::api as registry_api, storage::memory::InMemoryDriverStore};
use gateway::{
    common::types::*,
    domain::{
        action::auth::{issue_token, verify_token},
        api,
    },
    environment::{AppConfig, AppState},
    middleware::RateLimit,
};
use serde_json::{json, Value};
use shared::utils::logger::{LogLevel, LoggerConfig};

use crate::driver_registry::app_state as registry_state;

const SECRET: &str = "integration-test-secret";

fn gateway_config(driver_service_url: &str, rate_limit_hits: usize) -> AppConfig {
    AppConfig {
        port: 0,
        workers: 1,
        logger_cfg: LoggerConfig {
            level: LogLevel::INFO,
            log_to_file: false,
        },
        driver_service_url: driver_service_url.to_string(),
        jwt_secret: SECRET.to_string(),
        auth_token_expiry: 14400,
        auth_token_user: "taxihub".to_string(),
        rate_limit_hits,
        rate_limit_window: 30,
        request_timeout: 5000,
        max_allowed_req_size: 512_000,
    }
}

macro_rules! gateway_app {
    ($config:expr) => {
        test::init_service(
            App::new()
                .app_data(Data::new(
                    AppState::new($config).expect("valid gateway config"),
                ))
                .wrap(RateLimit)
                .configure(api::handler),
        )
        .await
    };
}

/// Starts a driver registry backed by an in-memory store on an ephemeral port.
fn spawn_registry() -> std::io::Result<String> {
    let data = Data::new(registry_state(Arc::new(InMemoryDriverStore::new())));
    let server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(NormalizePath::trim())
            .configure(registry_api::handler)
    })
    .workers(1)
    .bind(("127.0.0.1", 0))?;

    let port = server.addrs()[0].port();
    actix_web::rt::spawn(server.run());

    Ok(format!("http://127.0.0.1:{port}"))
}

fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {token}"))
}

#[actix_web::test]
async fn login_issues_a_token_for_the_configured_user() {
    let app = gateway_app!(gateway_config("http://127.0.0.1:9", 100));

    let req = test::TestRequest::post().uri("/login").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: LoginResponse = test::read_body_json(resp).await;

    let claims = verify_token(SECRET, &body.token).expect("token signed with the gateway secret");
    assert_eq!(claims.user, "taxihub");
    assert_eq!(claims.exp - claims.iat, 14400);
}

#[actix_web::test]
async fn driver_routes_require_a_valid_bearer_token() {
    let app = gateway_app!(gateway_config("http://127.0.0.1:9", 100));
    let foreign_token =
        issue_token("some-other-secret", "taxihub", 14400, Utc::now().timestamp()).unwrap();
    let expired_token = issue_token(SECRET, "taxihub", 60, Utc::now().timestamp() - 3600).unwrap();

    let cases = [
        (None, "Token is required"),
        (Some("Basic dXNlcjpwYXNz".to_string()), "Token is required"),
        (Some("Bearer not-a-jwt".to_string()), "Invalid or expired token"),
        (Some(format!("Bearer {foreign_token}")), "Invalid or expired token"),
        (Some(format!("Bearer {expired_token}")), "Invalid or expired token"),
    ];

    for (authorization, message) in cases {
        for uri in ["/api/v1/drivers", "/api/v1/drivers/nearby?lat=41&lon=29&taxiType=sari"] {
            let mut req = test::TestRequest::get().uri(uri);
            if let Some(authorization) = &authorization {
                req = req.insert_header((AUTHORIZATION, authorization.as_str()));
            }
            let resp = test::call_service(&app, req.to_request()).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["errorMessage"], message);
        }
    }
}

#[actix_web::test]
async fn requests_over_the_rate_limit_are_rejected() {
    let app = gateway_app!(gateway_config("http://127.0.0.1:9", 3));

    for _ in 0..3 {
        let req = test::TestRequest::get().uri("/healthcheck").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let req = test::TestRequest::get().uri("/healthcheck").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errorMessage"], "too many request, please wait");
}

#[actix_web::test]
async fn unreachable_driver_service_is_a_bad_gateway() {
    let app = gateway_app!(gateway_config("http://127.0.0.1:9", 100));
    let token = issue_token(SECRET, "taxihub", 14400, Utc::now().timestamp()).unwrap();

    let req = test::TestRequest::get()
        .uri("/api/v1/drivers")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errorCode"], "EXTERNAL_API_CALL_ERROR");
}

#[actix_web::test]
async fn paths_escaping_the_driver_scope_are_not_forwarded() {
    let app = gateway_app!(gateway_config("http://127.0.0.1:9", 100));
    let token = issue_token(SECRET, "taxihub", 14400, Utc::now().timestamp()).unwrap();

    for uri in [
        "/api/v1/drivers/../../../metrics",
        "/api/v1/drivers/%2e%2e/%2E%2E/%2e%2e/healthcheck",
        "/api/v1/drivers/./nearby?lat=41&lon=29&taxiType=sari",
    ] {
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header(bearer(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["errorCode"], "INVALID_REQUEST");
    }
}

#[actix_web::test]
async fn authorized_requests_are_forwarded_to_the_driver_service() {
    let driver_service_url = spawn_registry().expect("registry server starts");
    let app = gateway_app!(gateway_config(&driver_service_url, 100));

    let req = test::TestRequest::post().uri("/login").to_request();
    let login: LoginResponse = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/drivers")
        .insert_header(bearer(&login.token))
        .set_json(json!({
            "firstName": "Mehmet",
            "lastName": "Yildiz",
            "plate": "34 TX 001",
            "taxiType": "sari",
            "carBrand": "Fiat",
            "carModel": "Doblo",
            "lat": 41.0,
            "lon": 29.0
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["message"], "saved successfully");

    let req = test::TestRequest::get()
        .uri("/api/v1/drivers/nearby?lat=41.0&lon=29.01&taxiType=sari")
        .insert_header(bearer(&login.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let nearby: Value = test::read_body_json(resp).await;
    assert_eq!(nearby[0]["plate"], "34 TX 001");
    assert_eq!(nearby[0]["distanceKm"], 0.84);

    let req = test::TestRequest::get()
        .uri("/api/v1/drivers/?page=1&pageSize=10")
        .insert_header(bearer(&login.token))
        .to_request();
    let drivers: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(drivers.as_array().map(Vec::len), Some(1));

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/drivers/{}", uuid::Uuid::new_v4()))
        .insert_header(bearer(&login.token))
        .set_json(json!({ "plate": "34 TX 002" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn gateway_refuses_to_start_without_a_secret_or_with_a_bad_url() {
    let mut config = gateway_config("http://127.0.0.1:5001", 20);
    config.jwt_secret = "  ".to_string();
    assert!(AppState::new(config).is_err());

    let config = gateway_config("not a url", 20);
    assert!(AppState::new(config).is_err());
}
