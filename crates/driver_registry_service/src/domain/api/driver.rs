/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use actix_web::{
    get, post, put,
    web::{Data, Json, Path, Query},
    HttpResponse,
};

use crate::{
    common::types::*,
    domain::{action::driver, types::driver::*},
    tools::error::{AppError, ErrorBody},
};

#[utoipa::path(
    get,
    path = "/api/v1/drivers/nearby",
    tag = "drivers",
    params(NearbyDriversRequest),
    responses(
        (status = 200, description = "Drivers of the taxi type within the search radius, nearest first", body = Vec<NearbyDriver>),
        (status = 400, description = "Missing or invalid query parameter", body = ErrorBody),
        (status = 500, description = "Driver store failed or timed out", body = ErrorBody)
    )
)]
#[get("/api/v1/drivers/nearby")]
pub async fn get_nearby_drivers(
    data: Data<AppState>,
    param_obj: Query<NearbyDriversRequest>,
) -> Result<Json<Vec<NearbyDriver>>, AppError> {
    Ok(Json(
        driver::get_nearby_drivers(data, param_obj.into_inner()).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/drivers",
    tag = "drivers",
    request_body = CreateDriverRequest,
    responses(
        (status = 201, description = "Driver registered", body = CreateDriverResponse),
        (status = 400, description = "Missing or invalid field", body = ErrorBody),
        (status = 413, description = "Body larger than the configured limit", body = ErrorBody),
        (status = 500, description = "Driver store failed or timed out", body = ErrorBody)
    )
)]
#[post("/api/v1/drivers")]
pub async fn create_driver(
    data: Data<AppState>,
    param_obj: Json<CreateDriverRequest>,
) -> Result<HttpResponse, AppError> {
    let response = driver::create_driver(data, param_obj.into_inner()).await?;

    Ok(HttpResponse::Created().json(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/drivers",
    tag = "drivers",
    params(ListDriversRequest),
    responses(
        (status = 200, description = "One page of drivers in registration order", body = Vec<DriverRecord>),
        (status = 500, description = "Driver store failed or timed out", body = ErrorBody)
    )
)]
#[get("/api/v1/drivers")]
pub async fn list_drivers(
    data: Data<AppState>,
    param_obj: Query<ListDriversRequest>,
) -> Result<Json<Vec<DriverRecord>>, AppError> {
    Ok(Json(driver::list_drivers(data, param_obj.into_inner()).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/drivers/{driverId}",
    tag = "drivers",
    params(("driverId" = String, Path, description = "Driver id, a UUID")),
    request_body = UpdateDriverRequest,
    responses(
        (status = 200, description = "Given fields replaced", body = APISuccess),
        (status = 400, description = "Invalid id or field", body = ErrorBody),
        (status = 404, description = "No driver with this id", body = ErrorBody),
        (status = 500, description = "Driver store failed or timed out", body = ErrorBody)
    )
)]
#[put("/api/v1/drivers/{driverId}")]
pub async fn update_driver(
    data: Data<AppState>,
    path: Path<String>,
    param_obj: Json<UpdateDriverRequest>,
) -> Result<Json<APISuccess>, AppError> {
    let driver_id = path.into_inner();

    Ok(Json(
        driver::update_driver(data, driver_id, param_obj.into_inner()).await?,
    ))
}
