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

use crate::message::Message;
use crate::observability::{events, fields};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::info;

/// Failures delivering a message to a destination.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ForwardingError {
    UnknownEndpoint { uri: String },
    SendFailed { uri: String, reason: String },
    Timeout { uri: String, timeout: Duration },
}

impl ForwardingError {
    pub fn send_failed(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        ForwardingError::SendFailed {
            uri: uri.into(),
            reason: reason.into(),
        }
    }

    pub fn uri(&self) -> &str {
        match self {
            ForwardingError::UnknownEndpoint { uri }
            | ForwardingError::SendFailed { uri, .. }
            | ForwardingError::Timeout { uri, .. } => uri,
        }
    }
}

impl Display for ForwardingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ForwardingError::UnknownEndpoint { uri } => {
                write!(f, "no endpoint registered for '{uri}'")
            }
            ForwardingError::SendFailed { uri, reason } => {
                write!(f, "sending to '{uri}' failed: {reason}")
            }
            ForwardingError::Timeout { uri, timeout } => {
                write!(f, "sending to '{uri}' timed out after {timeout:?}")
            }
        }
    }
}

impl Error for ForwardingError {}

///
/// [`Endpoint`] is a destination the router can forward messages to. An endpoint is
/// registered under an exact destination URI or under a URI scheme, and receives the
/// full destination URI with every message.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use dynamic_router::{Endpoint, ForwardingError, Message};
///
/// struct Discard;
///
/// #[async_trait]
/// impl Endpoint for Discard {
///     async fn send(
///         &self,
///         _destination_uri: &str,
///         _message: Message,
///     ) -> Result<(), ForwardingError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Endpoint: Send + Sync {
    async fn send(&self, destination_uri: &str, message: Message) -> Result<(), ForwardingError>;
}

/// The `send(destinationUri, message)` capability the routing processor forwards through.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, destination_uri: &str, message: Message) -> Result<(), ForwardingError>;

    /// Whether `destination_uri` can be delivered to at all. Used to skip unknown
    /// destinations when the router is configured to ignore them.
    fn can_resolve(&self, _destination_uri: &str) -> bool {
        true
    }
}

/// Built-in endpoint behind the `log:` scheme.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogEndpoint;

#[async_trait]
impl Endpoint for LogEndpoint {
    async fn send(&self, destination_uri: &str, message: Message) -> Result<(), ForwardingError> {
        info!(
            event = events::LOG_ENDPOINT_MESSAGE,
            component = "log_endpoint",
            destination_uri,
            msg_id = fields::format_message_id(&message),
            body = %fields::format_body_preview(&message),
            "message reached log endpoint"
        );
        Ok(())
    }
}
