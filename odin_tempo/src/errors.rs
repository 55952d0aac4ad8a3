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

use thiserror::Error;

pub type Result<T> = std::result::Result<T,OdinTempoError>;

#[derive(Error,Debug)]
pub enum OdinTempoError {

    #[error("Earthdata authentication failed: {0}")]
    AuthenticationError(String),

    #[error("CMR granule search failed: {0}")]
    SearchError(String),

    #[error("malformed granule: {0}")]
    MalformedGranuleError(String),

    #[error("malformed CMR response: {0}")]
    MalformedResponseError(String),

    #[error("http error {0}")]
    HttpError( #[from] reqwest::Error),

    #[error("header error {0}")]
    InvalidHeaderError( #[from] http::header::InvalidHeaderValue),

    #[error("config RON error {0}")]
    RonError( #[from] ron::error::SpannedError),

    #[error("IO error {0}")]
    IOError( #[from] std::io::Error),
}

pub fn auth_failed (msg: impl ToString)->OdinTempoError {
    OdinTempoError::AuthenticationError(msg.to_string())
}

pub fn search_failed (msg: impl ToString)->OdinTempoError {
    OdinTempoError::SearchError(msg.to_string())
}

macro_rules! malformed_granule {
    ($fmt:literal $(, $arg:expr )* ) => {
        OdinTempoError::MalformedGranuleError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use malformed_granule;
