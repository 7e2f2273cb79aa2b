/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::common::types::*;
use crate::redis::{keys::*, types::RedisConnectionPool};
use crate::storage::{DriverStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fred::{
    error::RedisError,
    interfaces::{GeoInterface, HashesInterface, KeysInterface, ListInterface, LuaInterface},
    types::{GeoPosition, GeoRadiusInfo, GeoUnit, RedisValue},
};
use shared::utils::logger::*;
use std::{
    collections::{HashMap, HashSet},
    str::FromStr,
};
use strum::IntoEnumIterator;

/// Redis geo indexes only accept positions inside the Web Mercator latitude band. Drivers
/// outside it are stored and listed but not geo indexed.
pub const MAX_GEO_LATITUDE: f64 = 85.05112878;

// Geo index positions are stored as 52 bit geohashes, so a member exactly on the radius
// may be reported slightly outside it. Searching a little wider keeps those candidates.
const GEO_SEARCH_SLACK: f64 = 1.05;

// 6371 km * PI / 180
const KM_PER_DEGREE_OF_LATITUDE: f64 = 111.194_926_644_558_73;

const FIRST_NAME: &str = "firstName";
const LAST_NAME: &str = "lastName";
const PLATE: &str = "plate";
const TAXI_TYPE: &str = "taxiType";
const CAR_BRAND: &str = "carBrand";
const CAR_MODEL: &str = "carModel";
const LAT: &str = "lat";
const LON: &str = "lon";
const CREATED_AT: &str = "createdAt";
const UPDATED_AT: &str = "updatedAt";

// KEYS: driver hash, all drivers list, category list, category geo index
// ARGV: id, lon, lat, max geo latitude, field value pairs
// GEOADD is the only command that can reject its input, so it runs before any write.
const INSERT_DRIVER_SCRIPT: &str = r#"
if math.abs(tonumber(ARGV[3])) <= tonumber(ARGV[4]) then
  redis.call('GEOADD', KEYS[4], ARGV[2], ARGV[3], ARGV[1])
end
redis.call('HSET', KEYS[1], unpack(ARGV, 5))
redis.call('RPUSH', KEYS[2], ARGV[1])
redis.call('RPUSH', KEYS[3], ARGV[1])
return 1
"#;

// KEYS[1]: driver hash, KEYS[2i] and KEYS[2i + 1]: list and geo index of category i
// ARGV: id, max geo latitude, category count n, n category names, field value pairs
// Returns the number of drivers matched.
const UPDATE_DRIVER_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
  return 0
end

local id = ARGV[1]
local category_count = tonumber(ARGV[3])
local function category_keys(name)
  for i = 1, category_count do
    if ARGV[3 + i] == name then
      return KEYS[2 * i], KEYS[2 * i + 1]
    end
  end
  error('unknown taxi type ' .. tostring(name))
end

local previous_taxi_type = redis.call('HGET', KEYS[1], 'taxiType')
local taxi_type = previous_taxi_type
local lat = redis.call('HGET', KEYS[1], 'lat')
local lon = redis.call('HGET', KEYS[1], 'lon')
local fields = {}
for i = 4 + category_count, #ARGV, 2 do
  local field, value = ARGV[i], ARGV[i + 1]
  if field == 'taxiType' then
    taxi_type = value
  elseif field == 'lat' then
    lat = value
  elseif field == 'lon' then
    lon = value
  end
  fields[#fields + 1] = field
  fields[#fields + 1] = value
end

local previous_list, previous_geo = category_keys(previous_taxi_type)
local list, geo = category_keys(taxi_type)

redis.call('HSET', KEYS[1], unpack(fields))
if previous_taxi_type ~= taxi_type then
  redis.call('LREM', previous_list, 0, id)
  redis.call('ZREM', previous_geo, id)
  redis.call('RPUSH', list, id)
end
if math.abs(tonumber(lat)) <= tonumber(ARGV[2]) then
  redis.call('GEOADD', geo, lon, lat, id)
else
  redis.call('ZREM', geo, id)
end
return 1
"#;

fn encode_timestamp(TimeStamp(timestamp): TimeStamp) -> String {
    timestamp.to_rfc3339()
}

fn driver_fields(driver: &DriverRecord) -> Vec<(&'static str, String)> {
    let Latitude(lat) = driver.location.lat;
    let Longitude(lon) = driver.location.lon;
    vec![
        (FIRST_NAME, driver.first_name.to_owned()),
        (LAST_NAME, driver.last_name.to_owned()),
        (PLATE, driver.plate.to_owned()),
        (TAXI_TYPE, driver.taxi_type.to_string()),
        (CAR_BRAND, driver.car_brand.to_owned()),
        (CAR_MODEL, driver.car_model.to_owned()),
        (LAT, lat.to_string()),
        (LON, lon.to_string()),
        (CREATED_AT, encode_timestamp(driver.created_at)),
        (UPDATED_AT, encode_timestamp(driver.updated_at)),
    ]
}

/// Hash fields written by a partial update: the fields present in `patch` and `updatedAt`.
fn patch_fields(patch: DriverPatch, updated_at: TimeStamp) -> Vec<(&'static str, String)> {
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

    [
        first_name.map(|value| (FIRST_NAME, value)),
        last_name.map(|value| (LAST_NAME, value)),
        plate.map(|value| (PLATE, value)),
        taxi_type.map(|value| (TAXI_TYPE, value.to_string())),
        car_brand.map(|value| (CAR_BRAND, value)),
        car_model.map(|value| (CAR_MODEL, value)),
        lat.map(|Latitude(value)| (LAT, value.to_string())),
        lon.map(|Longitude(value)| (LON, value.to_string())),
        Some((UPDATED_AT, encode_timestamp(updated_at))),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn flatten_fields(fields: Vec<(&'static str, String)>) -> impl Iterator<Item = String> {
    fields
        .into_iter()
        .flat_map(|(field, value)| [field.to_string(), value])
}

fn decode_driver(id: &str, mut fields: HashMap<String, String>) -> Result<DriverRecord, StoreError> {
    let mut take = |field: &str| {
        fields.remove(field).ok_or_else(|| {
            StoreError::DeserializationError(format!("driver {id} has no {field}"))
        })
    };
    let invalid = |field: &str, err: String| {
        StoreError::DeserializationError(format!("driver {id} has an invalid {field} : {err}"))
    };
    let parse_coordinate = |field: &str, value: String| {
        value
            .parse::<f64>()
            .map_err(|err| invalid(field, err.to_string()))
    };
    let parse_timestamp = |field: &str, value: String| {
        DateTime::parse_from_rfc3339(&value)
            .map(|timestamp| TimeStamp(timestamp.with_timezone(&Utc)))
            .map_err(|err| invalid(field, err.to_string()))
    };

    Ok(DriverRecord {
        id: DriverId(id.to_string()),
        first_name: take(FIRST_NAME)?,
        last_name: take(LAST_NAME)?,
        plate: take(PLATE)?,
        taxi_type: TaxiType::from_str(&take(TAXI_TYPE)?)
            .map_err(|err| invalid(TAXI_TYPE, err.to_string()))?,
        car_brand: take(CAR_BRAND)?,
        car_model: take(CAR_MODEL)?,
        location: Point {
            lat: Latitude(parse_coordinate(LAT, take(LAT)?)?),
            lon: Longitude(parse_coordinate(LON, take(LON)?)?),
        },
        created_at: parse_timestamp(CREATED_AT, take(CREATED_AT)?)?,
        updated_at: parse_timestamp(UPDATED_AT, take(UPDATED_AT)?)?,
    })
}

impl RedisConnectionPool {
    /// Loads records for `ids`, preserving their order. Ids whose record is gone are skipped.
    #[instrument(level = "DEBUG", skip(self))]
    async fn get_drivers(&self, ids: Vec<String>) -> Result<Vec<DriverRecord>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let pipeline = self.pool.next().pipeline();
        for id in ids.iter() {
            let _: () = pipeline
                .hgetall(driver_key(&DriverId(id.to_owned())))
                .await?;
        }
        let records: Vec<Result<HashMap<String, String>, RedisError>> = pipeline.try_all().await;

        let mut drivers = Vec::with_capacity(records.len());
        for (id, record) in ids.iter().zip(records) {
            let fields = record?;
            if fields.is_empty() {
                warn!(tag = "[Driver Record Missing]", "Indexed driver {} has no record", id);
                continue;
            }
            drivers.push(decode_driver(id, fields)?);
        }
        Ok(drivers)
    }
}

#[async_trait]
impl DriverStore for RedisConnectionPool {
    #[instrument(level = "DEBUG", skip(self))]
    async fn insert(&self, driver: DriverRecord) -> Result<(), StoreError> {
        let Latitude(lat) = driver.location.lat;
        let Longitude(lon) = driver.location.lon;

        let keys = vec![
            driver_key(&driver.id),
            all_drivers_key(),
            category_drivers_key(&driver.taxi_type),
            category_geo_key(&driver.taxi_type),
        ];
        let mut args = vec![
            driver.id.0.to_owned(),
            lon.to_string(),
            lat.to_string(),
            MAX_GEO_LATITUDE.to_string(),
        ];
        args.extend(flatten_fields(driver_fields(&driver)));

        let _: i64 = self.pool.eval(INSERT_DRIVER_SCRIPT, keys, args).await?;
        Ok(())
    }

    #[instrument(level = "DEBUG", skip(self))]
    async fn find_by_category(&self, taxi_type: TaxiType) -> Result<Vec<DriverRecord>, StoreError> {
        let ids: Vec<String> = self
            .pool
            .lrange(category_drivers_key(&taxi_type), 0, -1)
            .await?;
        self.get_drivers(ids).await
    }

    #[instrument(level = "DEBUG", skip(self))]
    async fn find_by_category_near(
        &self,
        taxi_type: TaxiType,
        origin: Point,
        radius: Kilometers,
    ) -> Result<Vec<DriverRecord>, StoreError> {
        let Kilometers(radius) = radius;
        let Latitude(lat) = origin.lat;
        let Longitude(lon) = origin.lon;
        let search_radius = radius * GEO_SEARCH_SLACK;

        // Drivers outside the geo band are not indexed, so circles reaching past it scan.
        if lat.abs() + search_radius / KM_PER_DEGREE_OF_LATITUDE > MAX_GEO_LATITUDE {
            return self.find_by_category(taxi_type).await;
        }

        let members: RedisValue = self
            .pool
            .geosearch(
                category_geo_key(&taxi_type),
                None,
                Some(GeoPosition::from((lon, lat))),
                Some((search_radius, GeoUnit::Kilometers)),
                None,
                None,
                None,
                false,
                false,
                false,
            )
            .await?;

        let nearby: HashSet<String> = members
            .into_geo_radius_result(false, false, false)?
            .into_iter()
            .filter_map(|GeoRadiusInfo { member, .. }| member.as_string())
            .collect();

        if nearby.is_empty() {
            return Ok(Vec::new());
        }

        // Geo search order is by geohash; registration order comes from the category list.
        let ordered: Vec<String> = self
            .pool
            .lrange::<Vec<String>, _>(category_drivers_key(&taxi_type), 0, -1)
            .await?
            .into_iter()
            .filter(|id| nearby.contains(id))
            .collect();

        self.get_drivers(ordered).await
    }

    #[instrument(level = "DEBUG", skip(self, patch))]
    async fn update_fields(
        &self,
        id: &DriverId,
        patch: DriverPatch,
        updated_at: TimeStamp,
    ) -> Result<u64, StoreError> {
        let mut keys = vec![driver_key(id)];
        let mut args = vec![
            id.0.to_owned(),
            MAX_GEO_LATITUDE.to_string(),
            TaxiType::iter().count().to_string(),
        ];
        for taxi_type in TaxiType::iter() {
            keys.push(category_drivers_key(&taxi_type));
            keys.push(category_geo_key(&taxi_type));
            args.push(taxi_type.to_string());
        }
        args.extend(flatten_fields(patch_fields(patch, updated_at)));

        let matched: u64 = self.pool.eval(UPDATE_DRIVER_SCRIPT, keys, args).await?;
        Ok(matched)
    }

    #[instrument(level = "DEBUG", skip(self))]
    async fn list(&self, offset: usize, limit: usize) -> Result<Vec<DriverRecord>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let start = i64::try_from(offset).unwrap_or(i64::MAX);
        let stop = start.saturating_add(i64::try_from(limit).unwrap_or(i64::MAX) - 1);

        let ids: Vec<String> = self.pool.lrange(all_drivers_key(), start, stop).await?;
        self.get_drivers(ids).await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        let _: () = self
            .pool
            .set(
                health_check_key(),
                "driver-registry-service-health-check",
                None,
                None,
                false,
            )
            .await?;
        let value: Option<String> = self.pool.get(health_check_key()).await?;
        match value {
            Some(_) => Ok(()),
            None => Err(StoreError::CommandFailed(
                "health check key was not readable after write".to_string(),
            )),
        }
    }
}
