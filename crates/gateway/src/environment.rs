/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use std::{sync::Arc, time::Duration};

use crate::{
    common::sliding_window_rate_limiter::SlidingWindowRateLimiter, tools::error::AppError,
};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use shared::utils::logger::*;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub workers: usize,
    pub logger_cfg: LoggerConfig,
    pub driver_service_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds
    pub auth_token_expiry: u32,
    pub auth_token_user: String,
    pub rate_limit_hits: usize,
    /// Rate limit window in seconds
    pub rate_limit_window: u32,
    /// Milliseconds allowed for a whole request, forwarding included
    pub request_timeout: u64,
    pub max_allowed_req_size: usize,
}

#[derive(Clone)]
pub struct AppState {
    pub driver_service_url: Url,
    pub jwt_secret: String,
    pub auth_token_expiry: u32,
    pub auth_token_user: String,
    pub rate_limiter: Arc<SlidingWindowRateLimiter>,
    pub http_client: Client,
    pub request_timeout: u64,
    pub max_allowed_req_size: usize,
}

impl AppState {
    pub fn new(app_config: AppConfig) -> Result<AppState, AppError> {
        if app_config.jwt_secret.trim().is_empty() {
            return Err(AppError::InvalidConfiguration(
                "jwt_secret must be set (JWT_SECRET_KEY)".to_string(),
            ));
        }

        let driver_service_url = Url::parse(&app_config.driver_service_url).map_err(|err| {
            AppError::InvalidConfiguration(format!(
                "driver_service_url {} is not a valid url : {err}",
                app_config.driver_service_url
            ))
        })?;

        let http_client = Client::builder()
            .timeout(Duration::from_millis(app_config.request_timeout))
            .build()
            .map_err(|err| AppError::InvalidConfiguration(err.to_string()))?;

        info!(
            tag = "[Gateway Config]",
            "Forwarding driver requests to {}", driver_service_url
        );

        Ok(AppState {
            driver_service_url,
            jwt_secret: app_config.jwt_secret,
            auth_token_expiry: app_config.auth_token_expiry,
            auth_token_user: app_config.auth_token_user,
            rate_limiter: Arc::new(SlidingWindowRateLimiter::new(
                app_config.rate_limit_hits,
                app_config.rate_limit_window,
            )),
            http_client,
            request_timeout: app_config.request_timeout,
            max_allowed_req_size: app_config.max_allowed_req_size,
        })
    }
}
