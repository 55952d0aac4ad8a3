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

//! the live [`EarthdataConnector`], talking to Earthdata Login (URS) for bearer tokens and
//! to the Common Metadata Repository (CMR) for granule searches.
//! see https://urs.earthdata.nasa.gov/documentation/for_users/user_token and
//! https://cmr.earthdata.nasa.gov/search/site/docs/search/api.html

use std::{fmt, fs::File, io::BufReader, path::{Path, PathBuf}};
use netrc::Netrc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::{Client, Response, Url, header::{HeaderValue, ACCEPT}};
use tracing::{debug, info, warn};

use crate::{EarthdataConnector, EarthdataSession, Granule, SearchWindow};
use crate::errors::{Result, OdinTempoError, auth_failed, search_failed};

pub const EARTHDATA_TOKEN_ENV: &str = "EARTHDATA_TOKEN";
pub const EARTHDATA_USERNAME_ENV: &str = "EARTHDATA_USERNAME";
pub const EARTHDATA_PASSWORD_ENV: &str = "EARTHDATA_PASSWORD";
pub const NETRC_ENV: &str = "NETRC";

#[derive(Deserialize,Serialize,Debug,Clone)]
#[serde(default)]
pub struct EarthdataConfig {
    pub urs_url: String,
    pub cmr_url: String,
    pub client_id: String,
    pub page_size: usize, // CMR caps this at 2000

    // keep those private - if not set we fall back to EARTHDATA_.. env vars and ~/.netrc
    pub(crate) token: Option<String>,
    pub(crate) username: Option<String>,
    pub(crate) password: Option<String>,
}

impl Default for EarthdataConfig {
    fn default()->Self {
        EarthdataConfig {
            urs_url: "https://urs.earthdata.nasa.gov".to_string(),
            cmr_url: "https://cmr.earthdata.nasa.gov".to_string(),
            client_id: "odin_tempo".to_string(),
            page_size: 2000,
            token: None,
            username: None,
            password: None,
        }
    }
}

impl EarthdataConfig {
    pub fn with_token (mut self, token: impl ToString)->Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn with_login (mut self, username: impl ToString, password: impl ToString)->Self {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self
    }

    /// credentials from the process environment, looked up on each call
    pub fn credentials (&self)->Option<EarthdataCredentials> {
        self.resolve_credentials( |key| std::env::var(key).ok())
    }

    /// configured token, configured login, env token, env login, netrc login - in this order
    pub fn resolve_credentials<F> (&self, lookup: F)->Option<EarthdataCredentials> where F: Fn(&str)->Option<String> {
        if let Some(token) = &self.token {
            return Some( EarthdataCredentials::Token(token.clone()))
        }
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            return Some( EarthdataCredentials::Login{ username: username.clone(), password: password.clone() })
        }
        if let Some(token) = lookup(EARTHDATA_TOKEN_ENV) {
            return Some( EarthdataCredentials::Token(token))
        }
        if let (Some(username), Some(password)) = (lookup(EARTHDATA_USERNAME_ENV), lookup(EARTHDATA_PASSWORD_ENV)) {
            return Some( EarthdataCredentials::Login{ username, password })
        }
        netrc_path( &lookup).and_then( |path| self.netrc_credentials( &path))
    }

    /// login and password of the netrc `machine` entry for our URS host. Missing files or entries are no error
    pub fn netrc_credentials (&self, path: &Path)->Option<EarthdataCredentials> {
        let url = Url::parse( &self.urs_url).ok()?;
        let host = url.host_str()?;
        let file = File::open( path).ok()?;

        let netrc = match Netrc::parse( BufReader::new(file)) {
            Ok(netrc) => netrc,
            Err(e) => {
                warn!("ignoring unparsable netrc file {path:?}: {e:?}");
                return None
            }
        };

        netrc.hosts.into_iter()
            .find( |(name,_)| name == host)
            .and_then( |(_,machine)| machine.password.map( |password| EarthdataCredentials::Login{ username: machine.login, password }))
    }

    pub fn token_url (&self)->String {
        format!("{}/api/users/find_or_create_token", self.urs_url.trim_end_matches('/'))
    }

    pub fn search_url (&self)->String {
        format!("{}/search/granules.umm_json", self.cmr_url.trim_end_matches('/'))
    }
}

/// $NETRC if set, otherwise `.netrc` in the home directory
fn netrc_path<F> (lookup: &F)->Option<PathBuf> where F: Fn(&str)->Option<String> {
    if let Some(path) = lookup(NETRC_ENV) {
        return Some( PathBuf::from(path))
    }
    lookup("HOME").or_else( || lookup("USERPROFILE")).map( |home| Path::new(&home).join(".netrc"))
}

pub enum EarthdataCredentials {
    Token(String),
    Login { username: String, password: String }
}

// don't leak secrets into logs
impl fmt::Debug for EarthdataCredentials {
    fn fmt (&self, f: &mut fmt::Formatter<'_>)->fmt::Result {
        match self {
            EarthdataCredentials::Token(_) => write!(f, "Token(..)"),
            EarthdataCredentials::Login{username,..} => write!(f, "Login{{username: {username:?}, ..}}"),
        }
    }
}

/// the URS reply for a token request
#[derive(Deserialize,Debug)]
struct TokenResponse {
    access_token: String,
    token_type: Option<String>,
    expiration_date: Option<String>,
}

pub fn session_from_token_response (body: &[u8])->Result<EarthdataSession> {
    let response: TokenResponse = serde_json::from_slice(body).map_err(|e| auth_failed( format!("invalid token response: {e}")))?;
    if let Some(token_type) = &response.token_type {
        if !token_type.eq_ignore_ascii_case("bearer") {
            return Err( auth_failed( format!("unsupported token type {token_type}")))
        }
    }
    Ok( EarthdataSession::new( response.access_token, response.expiration_date) )
}

/// extract the granule records from a CMR `granules.umm_json` reply. A reply without `items` has no granules
pub fn granules_from_cmr_response (body: &[u8])->Result<Vec<Granule>> {
    let mut reply: Map<String,Value> = serde_json::from_slice(body)
        .map_err(|e| OdinTempoError::MalformedResponseError( e.to_string()))?;

    match reply.remove("items") {
        None | Some(Value::Null) => Ok( Vec::new() ),
        Some(Value::Array(items)) => {
            items.into_iter().map( |item| match item {
                Value::Object(granule) => Ok(granule),
                other => Err( OdinTempoError::MalformedResponseError( format!("granule is not an object: {other}")))
            }).collect()
        }
        Some(other) => Err( OdinTempoError::MalformedResponseError( format!("items is not an array: {other}")))
    }
}

/// http based EarthdataConnector. The reqwest `Client` is only kept for its connection pool,
/// there is no session state between requests
pub struct LiveEarthdataConnector {
    config: EarthdataConfig,
    client: Client,
}

impl LiveEarthdataConnector {
    pub fn new (config: EarthdataConfig)->Self {
        LiveEarthdataConnector { config, client: Client::new() }
    }

    pub fn with_client (config: EarthdataConfig, client: Client)->Self {
        LiveEarthdataConnector { config, client }
    }

    pub fn config (&self)->&EarthdataConfig { &self.config }

    async fn request_token (&self, username: &str, password: &str)->Result<EarthdataSession> {
        let url = self.config.token_url();
        let response = self.client.post( &url)
            .basic_auth( username, Some(password))
            .header( ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await
            .map_err( |e| auth_failed(e))?;

        let status = response.status();
        if status.is_success() {
            let body = response.bytes().await?;
            session_from_token_response( &body)
        } else {
            Err( auth_failed( format!("login for {username} rejected with status {status}")))
        }
    }
}

#[async_trait]
impl EarthdataConnector for LiveEarthdataConnector {
    async fn authenticate (&self)->Result<EarthdataSession> {
        match self.config.credentials() {
            Some(EarthdataCredentials::Token(token)) => Ok( EarthdataSession::new( token, None) ),
            Some(EarthdataCredentials::Login{username,password}) => {
                let session = self.request_token( &username, &password).await?;
                info!("logged into Earthdata as {username}");
                Ok(session)
            }
            None => Err( auth_failed( format!("no Earthdata credentials (set {EARTHDATA_TOKEN_ENV}, {EARTHDATA_USERNAME_ENV}/{EARTHDATA_PASSWORD_ENV} or a netrc entry for {})", self.config.urs_url)))
        }
    }

    async fn search (&self, session: &EarthdataSession, short_name: &str, window: &SearchWindow, page_size: usize)->Result<Vec<Granule>> {
        let temporal = window.cmr_temporal();
        let page_size = page_size.to_string();
        let response = self.client.get( self.config.search_url())
            .query( &[("short_name", short_name), ("temporal", temporal.as_str()), ("page_size", page_size.as_str())])
            .header( ACCEPT, HeaderValue::from_static("application/json"))
            .header( "Client-Id", HeaderValue::from_str( self.config.client_id.as_str())?)
            .bearer_auth( session.access_token())
            .send()
            .await
            .map_err( |e| search_failed(e))?;

        let body = checked_body( response).await?;
        let granules = granules_from_cmr_response( &body)?;
        debug!("CMR returned {} granules for {short_name}", granules.len());
        Ok(granules)
    }
}

async fn checked_body (response: Response)->Result<Bytes> {
    let status = response.status();
    if status.is_success() {
        Ok( response.bytes().await? )
    } else {
        let msg = response.text().await.unwrap_or_default();
        Err( search_failed( format!("response status {status}: {}", msg.trim())))
    }
}
