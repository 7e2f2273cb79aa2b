/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use super::types::*;
use crate::{storage::StoreError, tools::error::AppError};
use futures::Future;
use std::f64::consts::PI;
use std::time::Duration;
use tokio::time::timeout;

// Radius of Earth in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

fn deg2rad(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

/// Great-circle distance between two points in kilometers, using the haversine formula.
///
/// Inputs are not validated; a NaN coordinate yields NaN.
pub fn distance_between_in_km(latlong1: &Point, latlong2: &Point) -> f64 {
    let Latitude(lat1) = latlong1.lat;
    let Longitude(lon1) = latlong1.lon;
    let Latitude(lat2) = latlong2.lat;
    let Longitude(lon2) = latlong2.lon;

    let dlat = deg2rad(lat2 - lat1);
    let dlon = deg2rad(lon2 - lon1);

    let rlat1 = deg2rad(lat1);
    let rlat2 = deg2rad(lat2);

    let sq = |x: f64| x * x;

    let h = sq((dlat / 2.0).sin()) + rlat1.cos() * rlat2.cos() * sq((dlon / 2.0).sin());

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Rounds half away from zero to two decimal places.
pub fn round_to_two_decimals(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Bounds a single driver store operation by `store_timeout`.
///
/// Both a store failure and an elapsed timeout fail the request; nothing is retried.
pub async fn with_store_timeout<T, F>(store_timeout: Duration, operation: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match timeout(store_timeout, operation).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(AppError::StoreTimeout),
    }
}
