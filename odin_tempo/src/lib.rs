/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

//! crate to serve simplified NO2 measurement summaries from the TEMPO (Tropospheric Emissions:
//! Monitoring of Pollution) instrument. The single end point is
//!
//!    GET <host>:<port>/tempo/data
//!
//! which logs into NASA Earthdata, searches the CMR granule catalog for `TEMPO_L2_NO2` granules
//! of the last 24 hours and returns (at most) the first 10 of them as
//!
//!    { "timestamp": "...", "measurements": [ {"parameter":"NO2", "value":.., "unit":"ppb", "location":{..}}, .. ] }
//!
//! Every failure is reported as `{ "error": "..." }` with status 500

use std::{fs, path::Path};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use async_trait::async_trait;
use tracing::debug;

pub mod errors;
use errors::{Result, OdinTempoError, malformed_granule};

pub mod earthdata;
pub use earthdata::*;

pub mod server;
pub use server::*;

/// CMR short name of the TEMPO level 2 NO2 product
pub const TEMPO_NO2_SHORT_NAME: &str = "TEMPO_L2_NO2";

pub const NO2_PARAMETER: &str = "NO2";
pub const NO2_UNIT: &str = "ppb";

/// upper bound for the number of measurements we report per request
pub const MAX_MEASUREMENTS: usize = 10;

pub const SEARCH_WINDOW_HOURS: i64 = 24;

/// the temporal format CMR expects for search ranges
const CMR_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/* #region types  **********************************************************************************/

/// a closed UTC time range that bounds the catalog search
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub struct SearchWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl SearchWindow {
    pub fn trailing_hours (end: DateTime<Utc>, hours: i64)->Self {
        SearchWindow { start: end - TimeDelta::hours(hours), end }
    }

    /// the default window: the last 24 hours up to now
    pub fn ending_now ()->Self {
        Self::trailing_hours( Utc::now(), SEARCH_WINDOW_HOURS)
    }

    pub fn start_str (&self)->String { self.start.format(CMR_TIME_FORMAT).to_string() }
    pub fn end_str (&self)->String { self.end.format(CMR_TIME_FORMAT).to_string() }

    /// the `temporal` query value as understood by CMR
    pub fn cmr_temporal (&self)->String {
        format!("{},{}", self.start_str(), self.end_str())
    }
}

/// an opaque catalog record. We only ever look at its `value` and `location` fields
pub type Granule = Map<String,Value>;

#[derive(Debug,Clone,Serialize,Deserialize,PartialEq)]
pub struct Measurement {
    pub parameter: String,
    pub value: Option<Number>, // None is a stored null
    pub unit: String,
    pub location: Option<Map<String,Value>>,
}

impl Measurement {
    /// missing fields default to `0` and `{}`, stored nulls are kept, fields of the wrong JSON type are errors
    pub fn from_granule (granule: &Granule)->Result<Self> {
        let value = match granule.get("value") {
            None => Some( Number::from(0)),
            Some(Value::Null) => None,
            Some(Value::Number(n)) => Some( n.clone()),
            Some(other) => return Err( malformed_granule!("non-numeric value {other}"))
        };

        let location = match granule.get("location") {
            None => Some( Map::new()),
            Some(Value::Null) => None,
            Some(Value::Object(loc)) => Some( loc.clone()),
            Some(other) => return Err( malformed_granule!("location is not an object: {other}"))
        };

        Ok( Measurement { parameter: NO2_PARAMETER.to_string(), value, unit: NO2_UNIT.to_string(), location } )
    }
}

/// the response envelope of a successful request
#[derive(Debug,Clone,Serialize,Deserialize,PartialEq)]
pub struct MeasurementsResponse {
    pub timestamp: String,
    pub measurements: Vec<Measurement>,
}

impl MeasurementsResponse {
    /// note the timestamp is taken here and not from the search window
    pub fn new (measurements: Vec<Measurement>)->Self {
        let timestamp = Utc::now().to_rfc3339_opts( SecondsFormat::Micros, true);
        MeasurementsResponse { timestamp, measurements }
    }
}

#[derive(Debug,Clone,Serialize,Deserialize)]
pub struct ErrorResponse {
    pub error: String
}

/* #endregion types */

/* #region connector ******************************************************************************/

/// what we get from a successful Earthdata login. Only valid for the request that created it.
/// Note this holds the bearer token and hence is not `Debug`
#[derive(Clone)]
pub struct EarthdataSession {
    access_token: String,
    pub expiration: Option<String>,
}

impl EarthdataSession {
    pub fn new (access_token: impl ToString, expiration: Option<String>)->Self {
        EarthdataSession { access_token: access_token.to_string(), expiration }
    }

    pub fn access_token (&self)->&str { self.access_token.as_str() }
}

/// the interface to the Earthdata portal. This is our seam for injecting non-live connectors
#[async_trait]
pub trait EarthdataConnector: Send + Sync {
    async fn authenticate (&self)->Result<EarthdataSession>;

    async fn search (&self, session: &EarthdataSession, short_name: &str, window: &SearchWindow, page_size: usize)->Result<Vec<Granule>>;
}

/* #endregion connector */

/* #region config *********************************************************************************/

#[derive(Deserialize,Serialize,Debug,Clone,Default)]
#[serde(default)]
pub struct TempoConfig {
    pub server: ServerConfig,
    pub earthdata: EarthdataConfig,
}

impl TempoConfig {
    /// the config from `path` if one is given, the defaults otherwise
    pub fn load_or_default (path: Option<&Path>)->Result<Self> {
        match path {
            Some(path) => load_config( path),
            None => Ok( TempoConfig::default() )
        }
    }
}

pub fn load_config<C,P> (path: P)->Result<C> where C: DeserializeOwned, P: AsRef<Path> {
    let data = fs::read( path.as_ref())?;
    Ok( ron::de::from_bytes( data.as_slice())? )
}

/* #endregion config */

/// one complete request cycle: login, search the last 24h and map the first granules.
/// Nothing is cached between calls
pub async fn get_tempo_data (connector: &dyn EarthdataConnector, page_size: usize)->Result<MeasurementsResponse> {
    let session = connector.authenticate().await?;

    let window = SearchWindow::ending_now();
    let page_size = page_size.max( MAX_MEASUREMENTS);
    let granules = connector.search( &session, TEMPO_NO2_SHORT_NAME, &window, page_size).await?;
    debug!("found {} {} granules in {}", granules.len(), TEMPO_NO2_SHORT_NAME, window.cmr_temporal());

    let measurements = granules.iter()
        .take( MAX_MEASUREMENTS)
        .map( Measurement::from_granule)
        .collect::<Result<Vec<Measurement>>>()?;

    Ok( MeasurementsResponse::new( measurements) )
}
