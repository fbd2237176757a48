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
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Keeps every message it receives, in arrival order.
#[derive(Default)]
pub struct RecordingEndpoint {
    received: Mutex<Vec<(String, Message)>>,
}

impl RecordingEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.received.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.received.lock().await.is_empty()
    }

    pub async fn bodies(&self) -> Vec<String> {
        self.received
            .lock()
            .await
            .iter()
            .map(|(_, message)| message.body().to_string())
            .collect()
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.received
            .lock()
            .await
            .iter()
            .map(|(_, message)| message.clone())
            .collect()
    }

    /// Destination URIs the messages were addressed to.
    pub async fn destinations(&self) -> Vec<String> {
        self.received
            .lock()
            .await
            .iter()
            .map(|(uri, _)| uri.clone())
            .collect()
    }
}

#[async_trait]
impl Endpoint for RecordingEndpoint {
    async fn send(&self, destination_uri: &str, message: Message) -> Result<(), ForwardingError> {
        debug!(destination_uri, msg_id = message.id(), "recording endpoint received message");
        self.received
            .lock()
            .await
            .push((destination_uri.to_string(), message));
        Ok(())
    }
}

/// Rejects every message.
#[derive(Clone, Debug, Default)]
pub struct FailingEndpoint {
    pub reason: String,
}

#[async_trait]
impl Endpoint for FailingEndpoint {
    async fn send(&self, destination_uri: &str, _message: Message) -> Result<(), ForwardingError> {
        Err(ForwardingError::send_failed(destination_uri, self.reason.clone()))
    }
}

/// Accepts messages after a fixed delay.
#[derive(Clone, Copy, Debug)]
pub struct SlowEndpoint(pub Duration);

#[async_trait]
impl Endpoint for SlowEndpoint {
    async fn send(&self, _destination_uri: &str, _message: Message) -> Result<(), ForwardingError> {
        tokio::time::sleep(self.0).await;
        Ok(())
    }
}
