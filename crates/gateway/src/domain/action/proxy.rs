/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::{common::types::*, outbound::external::forward_request, tools::error::AppError};
use actix_web::{
    http::StatusCode,
    web::{Bytes, Data},
    HttpRequest, HttpResponse,
};
use shared::utils::logger::*;

// `.` and `..` would be resolved when the upstream url is joined, escaping the forwarded
// scope. Http urls also treat `\` as a separator and `%2e` as a dot.
fn is_dot_segment(segment: &str) -> bool {
    let segment = segment.to_ascii_lowercase().replace("%2e", ".");
    segment == "." || segment == ".."
}

pub fn has_dot_segments(path: &str) -> bool {
    path.split(['/', '\\']).any(is_dot_segment)
}

/// Relays `req` to the driver registry and its answer back to the caller.
pub async fn forward_to_driver_service(
    data: Data<AppState>,
    req: HttpRequest,
    body: Bytes,
) -> Result<HttpResponse, AppError> {
    if has_dot_segments(req.path()) {
        warn!(tag = "[Routing]", path = %req.path(), "Rejected path with dot segments");
        return Err(AppError::InvalidRequest(
            "Path must not contain . or .. segments".to_string(),
        ));
    }

    let path_and_query = match req.query_string() {
        "" => req.path().to_string(),
        query_string => format!("{}?{}", req.path(), query_string),
    };

    info!(
        tag = "[Routing]",
        "Routing: {}{}",
        data.driver_service_url.as_str().trim_end_matches('/'),
        path_and_query
    );

    let headers = req
        .headers()
        .iter()
        .map(|(header_name, header_value)| {
            (header_name.to_string(), header_value.as_bytes().to_vec())
        })
        .collect();

    let upstream = forward_request(
        &data.http_client,
        &data.driver_service_url,
        req.method().as_str(),
        &path_and_query,
        headers,
        body.to_vec(),
    )
    .await?;

    let status = StatusCode::from_u16(upstream.status).map_err(|_| {
        AppError::ExternalAPICallError(format!("Invalid upstream status : {}", upstream.status))
    })?;

    let mut response = HttpResponse::build(status);
    for (header_name, header_value) in upstream.headers {
        response.append_header((header_name, header_value));
    }

    Ok(response.body(upstream.body))
}
