/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

mod config;
mod stdout_endpoint;

use crate::config::Config;
use crate::stdout_endpoint::StdoutEndpoint;
use clap::Parser;
use dynamic_router::{DynamicRouter, Message, CONTROL_SCHEME};
use std::error::Error;
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[derive(Parser)]
#[command()]
struct RouterArgs {
    #[arg(short, long, value_name = "FILE")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let _ = tracing_subscriber::fmt::try_init();

    info!("Started configurable-router");

    // Get the config file.
    let args = RouterArgs::parse();
    let contents = tokio::fs::read_to_string(&args.config)
        .await
        .map_err(|e| format!("Unable to read config file {}: {e}", args.config))?;
    let config: Config = json5::from_str(&contents)
        .map_err(|e| format!("Unable to parse config file {}: {e}", args.config))?;

    let router = DynamicRouter::new(config.router.name.clone(), config.router.routing.clone());
    let endpoints = router
        .endpoints()
        .ok_or("Router was built without an endpoint registry")?;

    let stdout = Arc::new(StdoutEndpoint::new());
    for uri in &config.stdout_endpoints {
        if endpoints.register(uri.as_str(), stdout.clone()).is_some() {
            return Err(format!("Duplicate endpoint uri found: {uri}").into());
        }
    }

    router.start();

    for subscription in &config.subscriptions {
        router
            .control(subscription.to_control_message())
            .map_err(|e| format!("Could not apply subscription on {}: {e}", subscription.channel))?;
    }

    let interrupted = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Unable to listen for interrupts: {e}");
            std::future::pending::<()>().await;
        }
    };
    run(
        &router,
        &config.input_channel,
        BufReader::new(tokio::io::stdin()),
        interrupted,
    )
    .await?;

    let removed = router.stop();
    info!("Stopped configurable-router, removed {removed} subscriptions");

    Ok(())
}

/// Feeds `input` into `router` line by line until end of input or `shutdown` completes.
async fn run<R, S>(
    router: &DynamicRouter,
    input_channel: &str,
    input: R,
    shutdown: S,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    let mut lines = input.lines();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                handle_line(router, input_channel, line.trim()).await;
            }
            () = &mut shutdown => {
                info!("Received interrupt");
                break;
            }
        }
    }
    Ok(())
}

async fn handle_line(router: &DynamicRouter, input_channel: &str, line: &str) {
    if line.is_empty() {
        return;
    }
    if line.starts_with(CONTROL_SCHEME) {
        match router.control_uri(line, None) {
            Ok(reply) => info!("{}", reply.to_body()),
            Err(e) => warn!("Control request rejected: {e}"),
        }
    } else if let Err(e) = router.route(input_channel, Message::new(line)).await {
        warn!("Routing failed: {e}");
    }
}
