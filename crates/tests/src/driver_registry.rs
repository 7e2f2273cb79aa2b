/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use std::{sync::Arc, time::Duration};

use actix_web::{
    http::StatusCode,
    middleware::NormalizePath,
    test,
    web::Data,
    App,
};
use async_trait::async_trait;
use chrono::Utc;
use driver_registry_service::{
    common::{types::*, utils::distance_between_in_km},
    domain::{api, types::driver::*},
    storage::{memory::InMemoryDriverStore, DriverStore, StoreError},
};
use serde_json::{json, Value};
use shared::utils::middleware::CheckContentLength;

pub fn app_state(store: Arc<dyn DriverStore>) -> AppState {
    AppState {
        store,
        store_timeout: Duration::from_secs(10),
        request_timeout: 15_000,
        nearby_radius: Kilometers(6.0),
        default_page_size: 20,
        max_page_size: 100,
        max_allowed_req_size: 512_000,
    }
}

macro_rules! registry_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(Data::new($state))
                .wrap(NormalizePath::trim())
                .configure(api::handler),
        )
        .await
    };
}

fn driver_body(first_name: &str, taxi_type: &str, lat: f64, lon: f64) -> Value {
    json!({
        "firstName": first_name,
        "lastName": "Yildiz",
        "plate": format!("34 TX {first_name}"),
        "taxiType": taxi_type,
        "carBrand": "Fiat",
        "carModel": "Doblo",
        "lat": lat,
        "lon": lon
    })
}

fn record(first_name: &str, taxi_type: TaxiType, lat: f64, lon: f64) -> DriverRecord {
    let now = TimeStamp(Utc::now());
    DriverRecord {
        id: DriverId(uuid::Uuid::new_v4().to_string()),
        first_name: first_name.to_string(),
        last_name: "Yildiz".to_string(),
        plate: format!("34 TX {first_name}"),
        taxi_type,
        car_brand: "Fiat".to_string(),
        car_model: "Doblo".to_string(),
        location: Point {
            lat: Latitude(lat),
            lon: Longitude(lon),
        },
        created_at: now,
        updated_at: now,
    }
}

struct FailingStore;

#[async_trait]
impl DriverStore for FailingStore {
    async fn insert(&self, _driver: DriverRecord) -> Result<(), StoreError> {
        Err(StoreError::ConnectionError("connection refused".to_string()))
    }

    async fn find_by_category(&self, _taxi_type: TaxiType) -> Result<Vec<DriverRecord>, StoreError> {
        Err(StoreError::ConnectionError("connection refused".to_string()))
    }

    async fn update_fields(
        &self,
        _id: &DriverId,
        _patch: DriverPatch,
        _updated_at: TimeStamp,
    ) -> Result<u64, StoreError> {
        Err(StoreError::ConnectionError("connection refused".to_string()))
    }

    async fn list(&self, _offset: usize, _limit: usize) -> Result<Vec<DriverRecord>, StoreError> {
        Err(StoreError::ConnectionError("connection refused".to_string()))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Err(StoreError::ConnectionError("connection refused".to_string()))
    }
}

struct SlowStore(InMemoryDriverStore);

#[async_trait]
impl DriverStore for SlowStore {
    async fn insert(&self, driver: DriverRecord) -> Result<(), StoreError> {
        self.0.insert(driver).await
    }

    async fn find_by_category(&self, taxi_type: TaxiType) -> Result<Vec<DriverRecord>, StoreError> {
        tokio::time::sleep(Duration::from_secs(2)).await;
        self.0.find_by_category(taxi_type).await
    }

    async fn update_fields(
        &self,
        id: &DriverId,
        patch: DriverPatch,
        updated_at: TimeStamp,
    ) -> Result<u64, StoreError> {
        self.0.update_fields(id, patch, updated_at).await
    }

    async fn list(&self, offset: usize, limit: usize) -> Result<Vec<DriverRecord>, StoreError> {
        self.0.list(offset, limit).await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.0.health_check().await
    }
}

#[actix_web::test]
async fn nearby_scenario_for_a_single_driver() {
    let app = registry_app!(app_state(Arc::new(InMemoryDriverStore::new())));

    let req = test::TestRequest::post()
        .uri("/api/v1/drivers")
        .set_json(driver_body("Mehmet", "sari", 41.0, 29.0))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: CreateDriverResponse = test::read_body_json(resp).await;
    assert_eq!(created.message, "saved successfully");

    let req = test::TestRequest::get()
        .uri("/api/v1/drivers/nearby?lat=41.0&lon=29.01&taxiType=sari")
        .to_request();
    let nearby: Vec<NearbyDriver> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        nearby,
        vec![NearbyDriver {
            first_name: "Mehmet".to_string(),
            last_name: "Yildiz".to_string(),
            plate: "34 TX Mehmet".to_string(),
            distance_km: 0.84,
        }]
    );

    let req = test::TestRequest::get()
        .uri("/api/v1/drivers/nearby?lat=41.0&lon=29.01&taxiType=turkuaz")
        .to_request();
    let nearby: Vec<NearbyDriver> = test::call_and_read_body_json(&app, req).await;
    assert!(nearby.is_empty());

    let req = test::TestRequest::get()
        .uri("/api/v1/drivers/nearby?lat=42.0&lon=30.0&taxiType=sari")
        .to_request();
    let nearby: Vec<NearbyDriver> = test::call_and_read_body_json(&app, req).await;
    assert!(nearby.is_empty());
}

#[actix_web::test]
async fn nearby_results_are_sorted_complete_and_within_radius() {
    let store = Arc::new(InMemoryDriverStore::new());
    let origin = Point {
        lat: Latitude(41.0),
        lon: Longitude(29.0),
    };

    let mut expected_within = 0;
    for step in 0..30 {
        let lat = 41.0 + (step as f64 - 15.0) * 0.006;
        let lon = 29.0 + ((step * 7) % 11) as f64 * 0.004;
        let taxi_type = if step % 3 == 0 {
            TaxiType::Siyah
        } else {
            TaxiType::Sari
        };
        let driver = record(&format!("Driver{step}"), taxi_type, lat, lon);
        if taxi_type == TaxiType::Sari && distance_between_in_km(&origin, &driver.location) <= 6.0 {
            expected_within += 1;
        }
        store.insert(driver).await.unwrap();
    }
    assert!(expected_within > 0);

    let app = registry_app!(app_state(store));
    let req = test::TestRequest::get()
        .uri("/api/v1/drivers/nearby?lat=41.0&lon=29.0&taxiType=sari")
        .to_request();
    let nearby: Vec<NearbyDriver> = test::call_and_read_body_json(&app, req).await;

    assert_eq!(nearby.len(), expected_within);
    assert!(nearby.iter().all(|driver| driver.distance_km <= 6.0));
    assert!(nearby
        .windows(2)
        .all(|pair| pair[0].distance_km <= pair[1].distance_km));
}

#[actix_web::test]
async fn created_driver_is_listed_with_the_same_fields() {
    let app = registry_app!(app_state(Arc::new(InMemoryDriverStore::new())));

    let req = test::TestRequest::post()
        .uri("/api/v1/drivers")
        .set_json(driver_body("Zeynep", "siyah", 41.02, 28.97))
        .to_request();
    let created: CreateDriverResponse = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::get().uri("/api/v1/drivers").to_request();
    let drivers: Vec<DriverRecord> = test::call_and_read_body_json(&app, req).await;

    assert_eq!(drivers.len(), 1);
    let driver = &drivers[0];
    assert_eq!(driver.id, created.id);
    assert_eq!(driver.first_name, "Zeynep");
    assert_eq!(driver.last_name, "Yildiz");
    assert_eq!(driver.plate, "34 TX Zeynep");
    assert_eq!(driver.taxi_type, TaxiType::Siyah);
    assert_eq!(driver.car_brand, "Fiat");
    assert_eq!(driver.car_model, "Doblo");
    assert_eq!(driver.location.lat, Latitude(41.02));
    assert_eq!(driver.location.lon, Longitude(28.97));
    assert!(driver.updated_at >= driver.created_at);
}

#[actix_web::test]
async fn pages_of_one_return_each_driver_once() {
    let app = registry_app!(app_state(Arc::new(InMemoryDriverStore::new())));

    let mut created_ids = Vec::new();
    for name in ["Emre", "Selin"] {
        let req = test::TestRequest::post()
            .uri("/api/v1/drivers")
            .set_json(driver_body(name, "turkuaz", 41.0, 29.0))
            .to_request();
        let created: CreateDriverResponse = test::call_and_read_body_json(&app, req).await;
        created_ids.push(created.id);
    }

    let mut listed_ids = Vec::new();
    for page in [1, 2] {
        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/drivers/?page={page}&pageSize=1"))
            .to_request();
        let drivers: Vec<DriverRecord> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(drivers.len(), 1);
        listed_ids.push(drivers[0].id.clone());
    }
    assert_eq!(listed_ids, created_ids);

    let req = test::TestRequest::get()
        .uri("/api/v1/drivers?page=3&pageSize=1")
        .to_request();
    let drivers: Vec<DriverRecord> = test::call_and_read_body_json(&app, req).await;
    assert!(drivers.is_empty());

    let req = test::TestRequest::get()
        .uri("/api/v1/drivers?page=zero&pageSize=-5")
        .to_request();
    let drivers: Vec<DriverRecord> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(drivers.len(), 2);
}

#[actix_web::test]
async fn partial_update_changes_only_the_given_fields() {
    let store = Arc::new(InMemoryDriverStore::new());
    let original = record("Can", TaxiType::Sari, 41.0, 29.0);
    store.insert(original.clone()).await.unwrap();
    let app = registry_app!(app_state(store));

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/drivers/{}", original.id.0))
        .set_json(json!({ "plate": "34 NEW 001", "taxiType": "turkuaz" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: APISuccess = test::read_body_json(resp).await;
    assert_eq!(body.message, "drivers updated successfully");

    let req = test::TestRequest::get().uri("/api/v1/drivers").to_request();
    let drivers: Vec<DriverRecord> = test::call_and_read_body_json(&app, req).await;
    let updated = &drivers[0];

    assert_eq!(updated.plate, "34 NEW 001");
    assert_eq!(updated.taxi_type, TaxiType::Turkuaz);
    assert_eq!(updated.first_name, original.first_name);
    assert_eq!(updated.location, original.location);
    assert_eq!(updated.created_at, original.created_at);
    assert!(updated.updated_at >= original.updated_at);

    let req = test::TestRequest::get()
        .uri("/api/v1/drivers/nearby?lat=41.0&lon=29.0&taxiType=turkuaz")
        .to_request();
    let nearby: Vec<NearbyDriver> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(nearby.len(), 1);
}

#[actix_web::test]
async fn update_rejections() {
    let store = Arc::new(InMemoryDriverStore::new());
    let existing = record("Deniz", TaxiType::Sari, 41.0, 29.0);
    store.insert(existing.clone()).await.unwrap();
    let app = registry_app!(app_state(store));

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/drivers/{}", uuid::Uuid::new_v4()))
        .set_json(json!({ "plate": "34 NEW 002" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errorCode"], "DRIVER_NOT_FOUND");

    let req = test::TestRequest::put()
        .uri("/api/v1/drivers/12345")
        .set_json(json!({ "plate": "34 NEW 002" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errorMessage"], "Invalid ID format");

    for body in [
        json!({ "id": "overwritten" }),
        json!({ "taxiType": "mor" }),
        json!({ "lat": "north" }),
    ] {
        let req = test::TestRequest::put()
            .uri(&format!("/api/v1/drivers/{}", existing.id.0))
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

#[actix_web::test]
async fn invalid_create_requests_are_rejected() {
    let app = registry_app!(app_state(Arc::new(InMemoryDriverStore::new())));

    let mut missing_plate = driver_body("Burak", "sari", 41.0, 29.0);
    missing_plate.as_object_mut().unwrap().remove("plate");

    for body in [
        missing_plate,
        driver_body("Burak", "mor", 41.0, 29.0),
        driver_body("B", "sari", 41.0, 29.0),
        driver_body("Burak", "sari", 0.0, 29.0),
        driver_body("Burak", "sari", 41.0, 200.0),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/v1/drivers")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["errorCode"], "INVALID_REQUEST");
    }

    let req = test::TestRequest::get().uri("/api/v1/drivers").to_request();
    let drivers: Vec<DriverRecord> = test::call_and_read_body_json(&app, req).await;
    assert!(drivers.is_empty());
}

#[actix_web::test]
async fn drivers_near_the_poles_are_accepted_and_found() {
    let app = registry_app!(app_state(Arc::new(InMemoryDriverStore::new())));

    let req = test::TestRequest::post()
        .uri("/api/v1/drivers")
        .set_json(driver_body("Aurora", "siyah", 88.5, 15.0))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::get()
        .uri("/api/v1/drivers/nearby?lat=88.52&lon=15.0&taxiType=siyah")
        .to_request();
    let nearby: Vec<NearbyDriver> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(nearby.len(), 1);
    assert_eq!(nearby[0].first_name, "Aurora");
}

#[actix_web::test]
async fn invalid_nearby_queries_are_rejected() {
    let app = registry_app!(app_state(Arc::new(InMemoryDriverStore::new())));

    for query in [
        "lon=29.0&taxiType=sari",
        "lat=41.0&lon=abc&taxiType=sari",
        "lat=41.0&lon=29.0&taxiType=mor",
        "lat=41.0&lon=29.0",
        "lat=95.0&lon=29.0&taxiType=sari",
    ] {
        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/drivers/nearby?{query}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "query {query}");
    }
}

#[actix_web::test]
async fn store_failures_surface_as_internal_errors() {
    let app = registry_app!(app_state(Arc::new(FailingStore)));

    for req in [
        test::TestRequest::get()
            .uri("/api/v1/drivers/nearby?lat=41.0&lon=29.0&taxiType=sari")
            .to_request(),
        test::TestRequest::get().uri("/api/v1/drivers").to_request(),
        test::TestRequest::post()
            .uri("/api/v1/drivers")
            .set_json(driver_body("Ece", "sari", 41.0, 29.0))
            .to_request(),
        test::TestRequest::get().uri("/healthcheck").to_request(),
    ] {
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["errorCode"], "STORE_ERROR");
        assert!(!body["errorMessage"]
            .as_str()
            .unwrap_or_default()
            .contains("connection refused"));
    }
}

#[actix_web::test]
async fn slow_store_times_out() {
    let mut state = app_state(Arc::new(SlowStore(InMemoryDriverStore::new())));
    state.store_timeout = Duration::from_millis(50);
    let app = registry_app!(state);

    let req = test::TestRequest::get()
        .uri("/api/v1/drivers/nearby?lat=41.0&lon=29.0&taxiType=sari")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errorCode"], "STORE_TIMEOUT");
}

#[actix_web::test]
async fn healthcheck_reports_service_up() {
    let app = registry_app!(app_state(Arc::new(InMemoryDriverStore::new())));
    let req = test::TestRequest::get().uri("/healthcheck").to_request();
    let body: ResponseData = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.result, "Service Is Up");
}

#[actix_web::test]
async fn openapi_document_is_served() {
    let app = registry_app!(app_state(Arc::new(InMemoryDriverStore::new())));
    let req = test::TestRequest::get().uri("/api-docs/openapi.json").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let document: Value = test::read_body_json(resp).await;
    assert!(document["openapi"].as_str().unwrap_or_default().starts_with("3."));
    assert!(document["paths"]["/api/v1/drivers/{driverId}"]["put"].is_object());
    assert!(document["components"]["schemas"]["TaxiType"].is_object());
}

#[actix_web::test]
async fn oversized_payloads_are_rejected() {
    let app = test::init_service(
        App::new()
            .app_data(Data::new(app_state(Arc::new(InMemoryDriverStore::new()))))
            .wrap(CheckContentLength(16))
            .configure(api::handler),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/drivers")
        .set_json(driver_body("Hakan", "sari", 41.0, 29.0))
        .to_request();
    let resp = test::try_call_service(&app, req).await;
    let status = match resp {
        Ok(resp) => resp.status(),
        Err(err) => err.as_response_error().status_code(),
    };
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}
