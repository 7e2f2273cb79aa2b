/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::common::types::*;

pub fn driver_key(DriverId(driver_id): &DriverId) -> String {
    format!("drs:driver:{driver_id}")
}

// Every driver id, in registration order
pub fn all_drivers_key() -> String {
    "drs:drivers".to_string()
}

// Driver ids of one taxi type, in registration order
pub fn category_drivers_key(taxi_type: &TaxiType) -> String {
    format!("drs:drivers:{taxi_type}")
}

pub fn category_geo_key(taxi_type: &TaxiType) -> String {
    format!("drs:drivers:geo:{taxi_type}")
}

pub fn health_check_key() -> String {
    "drs:health_check".to_string()
}
