/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
pub mod driver;
pub mod healthcheck;
pub mod openapi;

use crate::tools::error::AppError;
use actix_web::web::{JsonConfig, PathConfig, QueryConfig, ServiceConfig};

pub fn handler(config: &mut ServiceConfig) {
    config
        .app_data(
            JsonConfig::default()
                .error_handler(|err, _| AppError::InvalidRequest(err.to_string()).into()),
        )
        .app_data(
            QueryConfig::default()
                .error_handler(|err, _| AppError::InvalidRequest(err.to_string()).into()),
        )
        .app_data(
            PathConfig::default()
                .error_handler(|err, _| AppError::InvalidRequest(err.to_string()).into()),
        )
        .service(driver::get_nearby_drivers)
        .service(driver::create_driver)
        .service(driver::list_drivers)
        .service(driver::update_driver)
        .service(healthcheck::health_check)
        .service(openapi::openapi_document);
}
