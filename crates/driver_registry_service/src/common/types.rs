/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

pub use crate::environment::AppState;

#[derive(Deserialize, Serialize, Clone, Debug, Eq, Hash, PartialEq, ToSchema)]
pub struct DriverId(pub String);
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Copy, ToSchema)]
pub struct Latitude(pub f64);
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Copy, ToSchema)]
pub struct Longitude(pub f64);
#[derive(
    Deserialize, Serialize, Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Hash, Ord, ToSchema,
)]
pub struct TimeStamp(pub DateTime<Utc>);
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, PartialOrd, Copy)]
pub struct Kilometers(pub f64);

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Copy, ToSchema)]
pub struct Point {
    pub lat: Latitude,
    pub lon: Longitude,
}

/// Service class a taxi is registered under.
#[derive(
    Debug, Clone, EnumString, EnumIter, Display, Serialize, Deserialize, Eq, Hash, PartialEq, Copy,
    ToSchema,
)]
pub enum TaxiType {
    #[strum(serialize = "sari")]
    #[serde(rename = "sari")]
    Sari,
    #[strum(serialize = "turkuaz")]
    #[serde(rename = "turkuaz")]
    Turkuaz,
    #[strum(serialize = "siyah")]
    #[serde(rename = "siyah")]
    Siyah,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DriverRecord {
    pub id: DriverId,
    pub first_name: String,
    pub last_name: String,
    pub plate: String,
    pub taxi_type: TaxiType,
    pub car_brand: String,
    pub car_model: String,
    pub location: Point,
    pub created_at: TimeStamp,
    pub updated_at: TimeStamp,
}

/// Fields of a driver record that a partial update may replace. Absent fields are left as
/// they are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub plate: Option<String>,
    pub taxi_type: Option<TaxiType>,
    pub car_brand: Option<String>,
    pub car_model: Option<String>,
    pub lat: Option<Latitude>,
    pub lon: Option<Longitude>,
}

impl DriverRecord {
    pub fn apply_patch(&mut self, patch: DriverPatch, updated_at: TimeStamp) {
        let DriverPatch {
            first_name,
            last_name,
            plate,
            taxi_type,
            car_brand,
            car_model,
            lat,
            lon,
        } = patch;

        if let Some(first_name) = first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = last_name {
            self.last_name = last_name;
        }
        if let Some(plate) = plate {
            self.plate = plate;
        }
        if let Some(taxi_type) = taxi_type {
            self.taxi_type = taxi_type;
        }
        if let Some(car_brand) = car_brand {
            self.car_brand = car_brand;
        }
        if let Some(car_model) = car_model {
            self.car_model = car_model;
        }
        if let Some(lat) = lat {
            self.location.lat = lat;
        }
        if let Some(lon) = lon {
            self.location.lon = lon;
        }
        self.updated_at = updated_at;
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, ToSchema)]
pub struct APISuccess {
    pub message: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, ToSchema)]
pub struct ResponseData {
    pub result: String,
}
