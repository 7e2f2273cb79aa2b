/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::common::types::*;
use async_trait::async_trait;

pub mod memory;

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("STORE_CONNECTION_ERROR: {0}")]
    ConnectionError(String),
    #[error("STORE_COMMAND_FAILED: {0}")]
    CommandFailed(String),
    #[error("STORE_DESERIALIZATION_ERROR: {0}")]
    DeserializationError(String),
}

/// Persistence seam for driver records.
///
/// Implementations keep insertion order for `find_by_category` and `list`, so that
/// callers relying on a stable sort see equally distant drivers in registration order.
#[async_trait]
pub trait DriverStore: Send + Sync {
    async fn insert(&self, driver: DriverRecord) -> Result<(), StoreError>;

    async fn find_by_category(&self, taxi_type: TaxiType) -> Result<Vec<DriverRecord>, StoreError>;

    /// Candidates of `taxi_type` that may lie within `radius` of `origin`.
    ///
    /// The result is a superset of the drivers actually inside the radius; the exact
    /// distance check stays with the caller.
    async fn find_by_category_near(
        &self,
        taxi_type: TaxiType,
        _origin: Point,
        _radius: Kilometers,
    ) -> Result<Vec<DriverRecord>, StoreError> {
        self.find_by_category(taxi_type).await
    }

    /// Applies `patch` to the record with `id`. Returns the number of records matched,
    /// which is 0 when no such driver exists.
    async fn update_fields(
        &self,
        id: &DriverId,
        patch: DriverPatch,
        updated_at: TimeStamp,
    ) -> Result<u64, StoreError>;

    async fn list(&self, offset: usize, limit: usize) -> Result<Vec<DriverRecord>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
