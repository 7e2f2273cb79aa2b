/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
#![allow(clippy::expect_used)]

use actix_web_prom::PrometheusMetrics;
use prometheus::{
    histogram_opts, register_histogram_vec, register_int_counter, HistogramVec, IntCounter,
};
use shared::utils::prometheus::init_prometheus_metrics;

pub static DRIVER_REGISTRATIONS: once_cell::sync::Lazy<IntCounter> =
    once_cell::sync::Lazy::new(|| {
        register_int_counter!("driver_registrations_total", "Drivers registered")
            .expect("Failed to register driver registrations metrics")
    });

pub static NEARBY_DRIVERS_RETURNED: once_cell::sync::Lazy<HistogramVec> =
    once_cell::sync::Lazy::new(|| {
        register_histogram_vec!(
            histogram_opts!(
                "nearby_drivers_returned",
                "Drivers returned per nearby query",
                vec![0.0, 1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0]
            ),
            &["taxi_type"]
        )
        .expect("Failed to register nearby drivers metrics")
    });

/// Initializes and returns a `PrometheusMetrics` instance configured with the registry's metrics.
///
/// # Panics
///
/// * If a collector fails to register.
pub fn prometheus_metrics() -> PrometheusMetrics {
    let prometheus = init_prometheus_metrics();

    prometheus
        .registry
        .register(Box::new(DRIVER_REGISTRATIONS.to_owned()))
        .expect("Failed to register driver registrations metrics");

    prometheus
        .registry
        .register(Box::new(NEARBY_DRIVERS_RETURNED.to_owned()))
        .expect("Failed to register nearby drivers metrics");

    prometheus
}
