/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::storage::StoreError;
use fred::{
    interfaces::ClientLike,
    prelude::{Builder, RedisPool},
    types::{ReconnectPolicy, RedisConfig, RespVersion},
};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RedisSettings {
    pub host: String,
    pub port: u16,
    pub partition: usize,
    pub pool_size: usize,
    pub reconnect_max_attempts: u32,
    /// Reconnect delay in milliseconds
    pub reconnect_delay: u32,
    pub use_legacy_version: bool,
}

impl Default for RedisSettings {
    fn default() -> Self {
        RedisSettings {
            host: String::from("localhost"),
            port: 6379,
            partition: 0,
            pool_size: 10,
            reconnect_max_attempts: 5,
            reconnect_delay: 1000,
            use_legacy_version: false,
        }
    }
}

pub struct RedisConnectionPool {
    pub pool: RedisPool,
}

impl RedisConnectionPool {
    /// Connects the pool and waits until every client is ready.
    pub async fn new(conf: RedisSettings) -> Result<Self, StoreError> {
        let redis_connection_url = format!(
            "redis://{}:{}/{}", //URI Schema
            conf.host, conf.port, conf.partition
        );
        let mut config = RedisConfig::from_url(&redis_connection_url)
            .map_err(|err| StoreError::ConnectionError(err.to_string()))?;

        if !conf.use_legacy_version {
            config.version = RespVersion::RESP3;
        }

        let reconnect_policy =
            ReconnectPolicy::new_constant(conf.reconnect_max_attempts, conf.reconnect_delay);

        let pool = Builder::from_config(config)
            .set_policy(reconnect_policy)
            .build_pool(conf.pool_size)
            .map_err(|err| StoreError::ConnectionError(err.to_string()))?;

        pool.init()
            .await
            .map_err(|err| StoreError::ConnectionError(err.to_string()))?;

        Ok(Self { pool })
    }
}

impl From<fred::error::RedisError> for StoreError {
    fn from(err: fred::error::RedisError) -> Self {
        StoreError::CommandFailed(err.to_string())
    }
}
