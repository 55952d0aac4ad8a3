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

use std::{path::PathBuf, sync::Arc};
use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use odin_tempo::{build_router, spawn_server_task, LiveEarthdataConnector, TempoConfig, TempoState, TEMPO_DATA_ROUTE};

#[derive(Parser, Debug)]
#[command(version, about, long_about = "serve TEMPO NO2 measurement summaries retrieved from NASA Earthdata")]
pub struct Args {
    /// RON config file (if not set we use defaults and EARTHDATA_.. env vars)
    #[arg(short,long)]
    pub config: Option<PathBuf>,
}

#[tokio::main]
async fn main()->Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter( EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))  // use RUST_LOG to override
        .init();

    let args = Args::parse();
    let config = TempoConfig::load_or_default( args.config.as_deref())?;

    let connector = LiveEarthdataConnector::new( config.earthdata.clone());
    let state = Arc::new( TempoState::new( connector, config.earthdata.page_size));
    let router = build_router( &config.server, state)?;

    info!("serving TEMPO data on {}{}", config.server.url(), TEMPO_DATA_ROUTE);
    spawn_server_task( &config.server, router).await??;

    Ok(())
}
