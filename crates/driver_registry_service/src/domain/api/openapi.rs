/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use actix_web::{get, web::Json};
use utoipa::OpenApi;

use crate::{
    common::types::*,
    domain::{api::driver, api::healthcheck, types::driver::*},
    tools::error::ErrorBody,
};

#[derive(OpenApi)]
#[openapi(
    info(title = "Driver Registry Service", description = "Taxi driver registration and nearby search"),
    paths(
        driver::get_nearby_drivers,
        driver::create_driver,
        driver::list_drivers,
        driver::update_driver,
        healthcheck::health_check,
    ),
    components(schemas(
        DriverId,
        Latitude,
        Longitude,
        TimeStamp,
        Point,
        TaxiType,
        DriverRecord,
        CreateDriverRequest,
        CreateDriverResponse,
        UpdateDriverRequest,
        NearbyDriver,
        APISuccess,
        ResponseData,
        ErrorBody,
    )),
    tags(
        (name = "drivers", description = "Driver registration, listing and nearby search"),
        (name = "health", description = "Liveness of the service and its store")
    )
)]
pub struct ApiDoc;

#[get("/api-docs/openapi.json")]
pub async fn openapi_document() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
