/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
#![allow(clippy::expect_used)]

use actix_web_prom::PrometheusMetrics;
use prometheus::{register_int_counter, IntCounter};
use shared::utils::prometheus::init_prometheus_metrics;

pub static RATE_LIMITED_REQUESTS: once_cell::sync::Lazy<IntCounter> =
    once_cell::sync::Lazy::new(|| {
        register_int_counter!(
            "rate_limited_requests_total",
            "Requests rejected by the rate limiter"
        )
        .expect("Failed to register rate limited requests metrics")
    });

pub static AUTH_TOKENS_ISSUED: once_cell::sync::Lazy<IntCounter> =
    once_cell::sync::Lazy::new(|| {
        register_int_counter!("auth_tokens_issued_total", "Access tokens issued")
            .expect("Failed to register auth tokens metrics")
    });

/// Initializes and returns a `PrometheusMetrics` instance configured with the gateway's metrics.
pub fn prometheus_metrics() -> PrometheusMetrics {
    let prometheus = init_prometheus_metrics();

    prometheus
        .registry
        .register(Box::new(RATE_LIMITED_REQUESTS.to_owned()))
        .expect("Failed to register rate limited requests metrics");

    prometheus
        .registry
        .register(Box::new(AUTH_TOKENS_ISSUED.to_owned()))
        .expect("Failed to register auth tokens metrics");

    prometheus
}
