/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use std::str::FromStr;

use crate::{
    common::{types::*, utils::*},
    domain::types::driver::*,
    tools::{
        error::AppError,
        prometheus::{DRIVER_REGISTRATIONS, NEARBY_DRIVERS_RETURNED},
    },
};
use actix_web::web::Data;
use chrono::Utc;
use shared::utils::logger::*;
use uuid::Uuid;

// Redis geo indexes only accept latitudes inside the Web Mercator range.
const MAX_LATITUDE: f64 = 90.0;
const MAX_LONGITUDE: f64 = 180.0;
const MIN_NAME_LENGTH: usize = 2;
const DEFAULT_PAGE: usize = 1;

fn validate_name(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.chars().count() < MIN_NAME_LENGTH {
        return Err(AppError::InvalidRequest(format!(
            "{field} must be at least {MIN_NAME_LENGTH} characters"
        )));
    }
    Ok(value.to_string())
}

fn validate_required(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::InvalidRequest(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn validate_taxi_type(value: &str) -> Result<TaxiType, AppError> {
    TaxiType::from_str(value.trim()).map_err(|_| {
        AppError::InvalidRequest(format!(
            "taxiType must be one of sari, turkuaz, siyah, got : {value}"
        ))
    })
}

fn validate_lat(lat: f64) -> Result<Latitude, AppError> {
    if !lat.is_finite() || lat.abs() > MAX_LATITUDE {
        return Err(AppError::InvalidRequest(format!(
            "lat must be between -{MAX_LATITUDE} and {MAX_LATITUDE}, got : {lat}"
        )));
    }
    Ok(Latitude(lat))
}

fn validate_lon(lon: f64) -> Result<Longitude, AppError> {
    if !lon.is_finite() || lon.abs() > MAX_LONGITUDE {
        return Err(AppError::InvalidRequest(format!(
            "lon must be between -{MAX_LONGITUDE} and {MAX_LONGITUDE}, got : {lon}"
        )));
    }
    Ok(Longitude(lon))
}

fn validate_driver_id(driver_id: &str) -> Result<DriverId, AppError> {
    Uuid::parse_str(driver_id)
        .map(|uuid| DriverId(uuid.to_string()))
        .map_err(|_| AppError::InvalidDriverId(driver_id.to_string()))
}

/// Parses a pagination parameter, falling back to `default` when it is absent, unparsable or
/// below 1.
fn parse_page_param(value: Option<&str>, default: usize) -> usize {
    value
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|value| *value >= 1)
        .unwrap_or(default)
}

/// Resolves `page` and `pageSize` into a store `(offset, limit)`.
pub fn page_window(
    request: &ListDriversRequest,
    default_page_size: usize,
    max_page_size: usize,
) -> (usize, usize) {
    let page = parse_page_param(request.page.as_deref(), DEFAULT_PAGE);
    let page_size =
        parse_page_param(request.page_size.as_deref(), default_page_size).min(max_page_size);
    ((page - 1).saturating_mul(page_size), page_size)
}

/// Ranks `candidates` by distance from `origin`.
///
/// Drivers of another taxi type and drivers further than `radius` are dropped. The radius is
/// compared against the exact distance, the returned distance is rounded to two decimals, and
/// equally distant drivers keep their relative order from `candidates`.
pub fn rank_nearby_drivers(
    origin: &Point,
    taxi_type: TaxiType,
    Kilometers(radius): Kilometers,
    candidates: Vec<DriverRecord>,
) -> Vec<NearbyDriver> {
    let mut nearby: Vec<NearbyDriver> = candidates
        .into_iter()
        .filter(|driver| driver.taxi_type == taxi_type)
        .filter_map(|driver| {
            let distance = distance_between_in_km(origin, &driver.location);
            (distance <= radius).then(|| NearbyDriver {
                first_name: driver.first_name,
                last_name: driver.last_name,
                plate: driver.plate,
                distance_km: round_to_two_decimals(distance),
            })
        })
        .collect();

    nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    nearby
}

pub async fn create_driver(
    data: Data<AppState>,
    request_body: CreateDriverRequest,
) -> Result<CreateDriverResponse, AppError> {
    let first_name = validate_name("firstName", &request_body.first_name)?;
    let last_name = validate_name("lastName", &request_body.last_name)?;
    let plate = validate_required("plate", &request_body.plate)?;
    let taxi_type = validate_taxi_type(&request_body.taxi_type)?;
    let car_brand = validate_required("carBrand", &request_body.car_brand)?;
    let car_model = validate_required("carModel", &request_body.car_model)?;

    if request_body.lat == 0.0 || request_body.lon == 0.0 {
        return Err(AppError::InvalidRequest(
            "lat and lon are required".to_string(),
        ));
    }
    let location = Point {
        lat: validate_lat(request_body.lat)?,
        lon: validate_lon(request_body.lon)?,
    };

    let now = TimeStamp(Utc::now());
    let driver = DriverRecord {
        id: DriverId(Uuid::new_v4().to_string()),
        first_name,
        last_name,
        plate,
        taxi_type,
        car_brand,
        car_model,
        location,
        created_at: now,
        updated_at: now,
    };
    let driver_id = driver.id.to_owned();

    with_store_timeout(data.store_timeout, data.store.insert(driver)).await?;

    DRIVER_REGISTRATIONS.inc();
    info!(tag = "[Driver Registered]", driver_id = %driver_id.0, taxi_type = %taxi_type);

    Ok(CreateDriverResponse {
        message: "saved successfully".to_string(),
        id: driver_id,
    })
}

pub async fn list_drivers(
    data: Data<AppState>,
    request: ListDriversRequest,
) -> Result<Vec<DriverRecord>, AppError> {
    let (offset, limit) = page_window(&request, data.default_page_size, data.max_page_size);

    with_store_timeout(data.store_timeout, data.store.list(offset, limit)).await
}

pub async fn update_driver(
    data: Data<AppState>,
    driver_id: String,
    request_body: UpdateDriverRequest,
) -> Result<APISuccess, AppError> {
    let driver_id = validate_driver_id(&driver_id)?;

    let patch = DriverPatch {
        first_name: request_body
            .first_name
            .map(|value| validate_name("firstName", &value))
            .transpose()?,
        last_name: request_body
            .last_name
            .map(|value| validate_name("lastName", &value))
            .transpose()?,
        plate: request_body
            .plate
            .map(|value| validate_required("plate", &value))
            .transpose()?,
        taxi_type: request_body
            .taxi_type
            .map(|value| validate_taxi_type(&value))
            .transpose()?,
        car_brand: request_body
            .car_brand
            .map(|value| validate_required("carBrand", &value))
            .transpose()?,
        car_model: request_body
            .car_model
            .map(|value| validate_required("carModel", &value))
            .transpose()?,
        lat: request_body.lat.map(validate_lat).transpose()?,
        lon: request_body.lon.map(validate_lon).transpose()?,
    };

    let matched = with_store_timeout(
        data.store_timeout,
        data.store
            .update_fields(&driver_id, patch, TimeStamp(Utc::now())),
    )
    .await?;

    if matched == 0 {
        return Err(AppError::DriverNotFound(driver_id.0));
    }

    info!(tag = "[Driver Updated]", driver_id = %driver_id.0);

    Ok(APISuccess {
        message: "drivers updated successfully".to_string(),
    })
}

pub async fn get_nearby_drivers(
    data: Data<AppState>,
    request: NearbyDriversRequest,
) -> Result<Vec<NearbyDriver>, AppError> {
    let origin = Point {
        lat: validate_lat(request.lat)?,
        lon: validate_lon(request.lon)?,
    };

    let candidates = with_store_timeout(
        data.store_timeout,
        data.store
            .find_by_category_near(request.taxi_type, origin, data.nearby_radius),
    )
    .await?;

    let nearby = rank_nearby_drivers(&origin, request.taxi_type, data.nearby_radius, candidates);

    NEARBY_DRIVERS_RETURNED
        .with_label_values(&[request.taxi_type.to_string().as_str()])
        .observe(nearby.len() as f64);
    debug!(tag = "[Nearby Drivers]", taxi_type = %request.taxi_type, count = nearby.len());

    Ok(nearby)
}
