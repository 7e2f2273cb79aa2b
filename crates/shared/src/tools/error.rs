/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use actix_web::{
    http::{header::ContentType, StatusCode},
    HttpResponse, ResponseError,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error_message: String,
    pub error_code: String,
}

/// Failures raised by the shared request middleware, before a request reaches a service.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RequestError {
    #[error("REQUEST_TIMEOUT")]
    RequestTimeout,
    #[error("LARGE_PAYLOAD_SIZE")]
    LargePayloadSize(usize, usize),
}

impl RequestError {
    pub fn message(&self) -> String {
        match self {
            RequestError::RequestTimeout => "Request timed out".to_string(),
            RequestError::LargePayloadSize(length, limit) => {
                format!("Content length ({length} Bytes) greater than allowed maximum limit : ({limit} Bytes)")
            }
        }
    }
}

impl ResponseError for RequestError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(ErrorBody {
                error_message: self.message(),
                error_code: self.to_string(),
            })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            RequestError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            RequestError::LargePayloadSize(_, _) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}
