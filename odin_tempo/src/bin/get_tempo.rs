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

use std::path::PathBuf;
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use odin_tempo::{get_tempo_data, ErrorResponse, LiveEarthdataConnector, TempoConfig};

#[derive(Parser, Debug)]
#[command(version, about, long_about = "retrieve the current TEMPO NO2 measurement summary and print it as JSON")]
pub struct Args {
    /// RON config file (if not set we use defaults and EARTHDATA_.. env vars)
    #[arg(short,long)]
    pub config: Option<PathBuf>,

    /// pretty print JSON output
    #[arg(short,long)]
    pub pretty: bool,
}

#[tokio::main]
async fn main()->Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter( EnvFilter::from_default_env())
        .with_writer( std::io::stderr)
        .init();

    let args = Args::parse();
    let config = TempoConfig::load_or_default( args.config.as_deref())?;

    let connector = LiveEarthdataConnector::new( config.earthdata.clone());
    match get_tempo_data( &connector, config.earthdata.page_size).await {
        Ok(response) => {
            let json = if args.pretty { serde_json::to_string_pretty(&response)? } else { serde_json::to_string(&response)? };
            println!("{json}");
            Ok(())
        }
        Err(e) => {
            println!("{}", serde_json::to_string( &ErrorResponse{ error: e.to_string() })?);
            Err(e.into())
        }
    }
}
