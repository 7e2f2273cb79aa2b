/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use std::{sync::Arc, time::Duration};

use crate::{
    common::types::*,
    redis::types::{RedisConnectionPool, RedisSettings},
    storage::{memory::InMemoryDriverStore, DriverStore, StoreError},
};
use serde::{Deserialize, Serialize};
use shared::utils::logger::*;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub workers: usize,
    pub logger_cfg: LoggerConfig,
    pub store_backend: StoreBackend,
    pub redis_cfg: RedisConfig,
    /// Milliseconds allowed for a single store operation
    pub store_timeout: u64,
    /// Milliseconds allowed for a whole request
    pub request_timeout: u64,
    pub nearby_radius_km: f64,
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub max_allowed_req_size: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    InMemory,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RedisConfig {
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_pool_size: usize,
    pub redis_partition: usize,
    pub reconnect_max_attempts: u32,
    pub reconnect_delay: u32,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DriverStore>,
    pub store_timeout: Duration,
    pub request_timeout: u64,
    pub nearby_radius: Kilometers,
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub max_allowed_req_size: usize,
}

impl AppState {
    pub async fn new(app_config: AppConfig) -> Result<AppState, StoreError> {
        let store: Arc<dyn DriverStore> = match app_config.store_backend {
            StoreBackend::Redis => {
                let redis_cfg = app_config.redis_cfg;
                let pool = RedisConnectionPool::new(RedisSettings {
                    host: redis_cfg.redis_host,
                    port: redis_cfg.redis_port,
                    partition: redis_cfg.redis_partition,
                    pool_size: redis_cfg.redis_pool_size,
                    reconnect_max_attempts: redis_cfg.reconnect_max_attempts,
                    reconnect_delay: redis_cfg.reconnect_delay,
                    ..Default::default()
                })
                .await?;
                info!(tag = "[Driver Store]", "Connected to Redis driver store");
                Arc::new(pool)
            }
            StoreBackend::InMemory => {
                warn!(
                    tag = "[Driver Store]",
                    "Using in-memory driver store, records are lost on restart"
                );
                Arc::new(InMemoryDriverStore::new())
            }
        };

        Ok(AppState {
            store,
            store_timeout: Duration::from_millis(app_config.store_timeout),
            request_timeout: app_config.request_timeout,
            nearby_radius: Kilometers(app_config.nearby_radius_km),
            default_page_size: app_config.default_page_size,
            max_page_size: app_config.max_page_size,
            max_allowed_req_size: app_config.max_allowed_req_size,
        })
    }
}
