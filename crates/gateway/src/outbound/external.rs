/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use super::types::UpstreamResponse;
use crate::tools::error::AppError;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client, Method, Url,
};
use shared::{call_external_api, utils::logger::*};
use std::str::FromStr;

// Connection scoped headers, never copied between the two legs of a forwarded call.
const HOP_BY_HOP_HEADERS: [&str; 10] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

pub fn is_hop_by_hop(header_name: &str) -> bool {
    HOP_BY_HOP_HEADERS
        .iter()
        .any(|hop_by_hop| hop_by_hop.eq_ignore_ascii_case(header_name))
}

/// Sends `method path_and_query` with `headers` and `body` to `base_url` and returns the
/// upstream response whatever its status.
///
/// Fails with `ExternalAPICallError` only when no response was received.
pub async fn forward_request(
    client: &Client,
    base_url: &Url,
    method: &str,
    path_and_query: &str,
    headers: Vec<(String, Vec<u8>)>,
    body: Vec<u8>,
) -> Result<UpstreamResponse, AppError> {
    let start_time = std::time::Instant::now();

    let url = base_url
        .join(path_and_query)
        .map_err(|err| AppError::InvalidRequest(format!("Invalid path {path_and_query} : {err}")))?;

    let method = Method::from_str(method)
        .map_err(|_| AppError::InvalidRequest(format!("Invalid Method : {method}")))?;

    let mut header_map = HeaderMap::new();
    for (header_key, header_value) in headers {
        if is_hop_by_hop(&header_key) {
            continue;
        }
        let header_name = HeaderName::from_str(&header_key)
            .map_err(|_| AppError::InvalidRequest(format!("Invalid Header Name : {header_key}")))?;
        let header_value = HeaderValue::from_bytes(&header_value)
            .map_err(|_| AppError::InvalidRequest(format!("Invalid Header Value for : {header_key}")))?;
        header_map.append(header_name, header_value);
    }

    let resp = client
        .request(method.to_owned(), url.to_owned())
        .headers(header_map)
        .body(body)
        .send()
        .await;

    let url_str = format!(
        "{}://{}:{}",
        url.scheme(),
        url.host_str().unwrap_or(""),
        url.port_or_known_default().unwrap_or(80)
    );

    let status = match resp.as_ref() {
        Ok(resp) => resp.status().as_str().to_string(),
        Err(err) => err
            .status()
            .map(|status| status.to_string())
            .unwrap_or("UNKNOWN".to_string()),
    };

    call_external_api!(
        method.as_str(),
        url_str.as_str(),
        url.path(),
        status.as_str(),
        start_time
    );

    match resp {
        Ok(resp) => {
            info!(tag = "[OUTGOING API]", request_method = %method, request_url = %url, response_status = resp.status().as_str(), latency = format!("{:?}ms", start_time.elapsed().as_millis()));

            let status = resp.status().as_u16();
            let headers = resp
                .headers()
                .iter()
                .filter(|(header_name, _)| !is_hop_by_hop(header_name.as_str()))
                .map(|(header_name, header_value)| {
                    (header_name.to_string(), header_value.as_bytes().to_vec())
                })
                .collect();
            let body = resp
                .bytes()
                .await
                .map_err(|err| AppError::ExternalAPICallError(err.to_string()))?
                .to_vec();

            Ok(UpstreamResponse {
                status,
                headers,
                body,
            })
        }
        Err(err) => {
            error!(tag = "[OUTGOING API - ERROR]", request_method = %method, request_url = %url, error = format!("{:?}", err), latency = format!("{:?}ms", start_time.elapsed().as_millis()));
            Err(AppError::ExternalAPICallError(err.to_string()))
        }
    }
}
