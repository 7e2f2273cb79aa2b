/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::storage::StoreError;
use actix_web::{
    http::{header::ContentType, StatusCode},
    HttpResponse, ResponseError,
};
use serde::{Deserialize, Serialize};
use shared::utils::logger::*;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error_message: String,
    pub error_code: String,
}

// Display carries the error code, which is what the request metrics are labelled with.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AppError {
    #[error("INVALID_REQUEST")]
    InvalidRequest(String),
    #[error("INVALID_DRIVER_ID")]
    InvalidDriverId(String),
    #[error("DRIVER_NOT_FOUND")]
    DriverNotFound(String),
    #[error("STORE_ERROR")]
    StoreError(String),
    #[error("STORE_TIMEOUT")]
    StoreTimeout,
}

impl AppError {
    fn error_message(&self) -> ErrorBody {
        ErrorBody {
            error_message: self.message(),
            error_code: self.code(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            AppError::InvalidRequest(err) => err.to_string(),
            AppError::InvalidDriverId(_) => "Invalid ID format".to_string(),
            AppError::DriverNotFound(driver_id) => format!("Driver not found : {driver_id}"),
            AppError::StoreError(_) | AppError::StoreTimeout => {
                "Driver store is unavailable".to_string()
            }
        }
    }

    pub fn code(&self) -> String {
        self.to_string()
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(self.error_message())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidDriverId(_) => StatusCode::BAD_REQUEST,
            AppError::DriverNotFound(_) => StatusCode::NOT_FOUND,
            AppError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::StoreTimeout => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        error!(tag = "[Driver Store Error]", "{}", err);
        AppError::StoreError(err.to_string())
    }
}
