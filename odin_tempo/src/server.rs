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

use std::{net::SocketAddr, sync::Arc};
use axum::{
    extract::State,
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, task::JoinHandle};
use tower_http::{cors::{AllowOrigin, CorsLayer}, trace::TraceLayer};
use tracing::{debug, warn};

use crate::{get_tempo_data, EarthdataConnector, ErrorResponse, MeasurementsResponse};
use crate::errors::{OdinTempoError, Result};

pub const TEMPO_DATA_ROUTE: &str = "/tempo/data";

#[derive(Deserialize,Serialize,Debug,Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub sock_addr: SocketAddr,
    pub cors_origins: Vec<String>, // if empty we don't add a CORS layer
}

impl Default for ServerConfig {
    fn default()->Self {
        ServerConfig { sock_addr: SocketAddr::from(([127,0,0,1], 5000)), cors_origins: Vec::new() }
    }
}

impl ServerConfig {
    pub fn url (&self)->String {
        format!("http://{}", self.sock_addr)
    }
}

/// the (immutable) state shared by all request handlers
pub struct TempoState {
    connector: Box<dyn EarthdataConnector>,
    page_size: usize,
}

impl TempoState {
    pub fn new (connector: impl EarthdataConnector + 'static, page_size: usize)->Self {
        TempoState { connector: Box::new(connector), page_size }
    }
}

/// this is called once at startup - the router is then handed to [`spawn_server_task`]
pub fn build_router (config: &ServerConfig, state: Arc<TempoState>)->Result<Router> {
    let mut router = Router::new()
        .route( TEMPO_DATA_ROUTE, get( tempo_data_handler))
        .with_state( state)
        .layer( TraceLayer::new_for_http());

    if !config.cors_origins.is_empty() {
        let origins = config.cors_origins.iter()
            .map( |o| HeaderValue::from_str(o))
            .collect::<std::result::Result<Vec<HeaderValue>,_>>()?;

        router = router.layer( CorsLayer::new()
            .allow_origin( AllowOrigin::list(origins))
            .allow_methods( [Method::GET]));
    }

    Ok(router)
}

async fn tempo_data_handler (State(state): State<Arc<TempoState>>)->Result<Json<MeasurementsResponse>> {
    let response = get_tempo_data( state.connector.as_ref(), state.page_size).await?;
    debug!("returning {} measurements", response.measurements.len());
    Ok( Json(response) )
}

/// all failures end up here, regardless of where they originated
impl IntoResponse for OdinTempoError {
    fn into_response (self)->Response {
        warn!("TEMPO data request failed: {self}");
        let body = ErrorResponse { error: self.to_string() };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

pub fn spawn_server_task (config: &ServerConfig, router: Router)->JoinHandle<Result<()>> {
    let sock_addr = config.sock_addr;

    tokio::spawn( async move {
        let listener = TcpListener::bind( sock_addr).await?;
        axum::serve( listener, router).await?;
        Ok(())
    })
}
