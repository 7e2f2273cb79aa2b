/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use super::{DriverStore, StoreError};
use crate::common::types::*;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Process-local driver store, used for tests and single-node development runs.
#[derive(Default)]
pub struct InMemoryDriverStore {
    drivers: RwLock<Vec<DriverRecord>>,
}

impl InMemoryDriverStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DriverStore for InMemoryDriverStore {
    async fn insert(&self, driver: DriverRecord) -> Result<(), StoreError> {
        self.drivers.write().await.push(driver);
        Ok(())
    }

    async fn find_by_category(&self, taxi_type: TaxiType) -> Result<Vec<DriverRecord>, StoreError> {
        Ok(self
            .drivers
            .read()
            .await
            .iter()
            .filter(|driver| driver.taxi_type == taxi_type)
            .cloned()
            .collect())
    }

    async fn update_fields(
        &self,
        id: &DriverId,
        patch: DriverPatch,
        updated_at: TimeStamp,
    ) -> Result<u64, StoreError> {
        let mut drivers = self.drivers.write().await;
        match drivers.iter_mut().find(|driver| &driver.id == id) {
            Some(driver) => {
                driver.apply_patch(patch, updated_at);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn list(&self, offset: usize, limit: usize) -> Result<Vec<DriverRecord>, StoreError> {
        Ok(self
            .drivers
            .read()
            .await
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
