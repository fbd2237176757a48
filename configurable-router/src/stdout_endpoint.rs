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

use async_trait::async_trait;
use dynamic_router::{Endpoint, ForwardingError, Message};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// Writes `<destination> <body>` lines for every forwarded message.
pub struct StdoutEndpoint<W = tokio::io::Stdout> {
    writer: Mutex<W>,
}

impl StdoutEndpoint {
    pub fn new() -> Self {
        Self::with_writer(tokio::io::stdout())
    }
}

impl Default for StdoutEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> StdoutEndpoint<W> {
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

#[async_trait]
impl<W> Endpoint for StdoutEndpoint<W>
where
    W: AsyncWrite + Send + Unpin,
{
    async fn send(&self, destination_uri: &str, message: Message) -> Result<(), ForwardingError> {
        let line = format!("{destination_uri} {}\n", message.body());
        let mut writer = self.writer.lock().await;
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| ForwardingError::send_failed(destination_uri, e.to_string()))?;
        writer
            .flush()
            .await
            .map_err(|e| ForwardingError::send_failed(destination_uri, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_one_line_per_message() {
        let endpoint = StdoutEndpoint::with_writer(Vec::new());

        endpoint.send("stdout:even", Message::new("4")).await.unwrap();
        endpoint.send("stdout:odd", Message::new("5")).await.unwrap();

        let written = endpoint.writer.into_inner();
        assert_eq!(
            String::from_utf8(written).unwrap(),
            "stdout:even 4\nstdout:odd 5\n"
        );
    }
}
