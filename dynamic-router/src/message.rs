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

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Well-known header names understood by the router.
pub mod headers {
    /// Channel a data-plane message should be routed on.
    pub const CHANNEL: &str = "DynamicRouterChannel";

    pub const CONTROL_ACTION: &str = "DynamicRouterControlAction";
    pub const CONTROL_SUBSCRIBE_CHANNEL: &str = "DynamicRouterSubscribeChannel";
    pub const CONTROL_SUBSCRIPTION_ID: &str = "DynamicRouterSubscriptionId";
    pub const CONTROL_DESTINATION_URI: &str = "DynamicRouterDestinationUri";
    pub const CONTROL_PRIORITY: &str = "DynamicRouterPriority";
    pub const CONTROL_PREDICATE: &str = "DynamicRouterPredicate";
    pub const CONTROL_EXPRESSION_LANGUAGE: &str = "DynamicRouterExpressionLanguage";
    pub const CONTROL_PREDICATE_BEAN: &str = "DynamicRouterPredicateBean";
    pub const CONTROL_UPDATE: &str = "DynamicRouterUpdate";
}

///
/// [`Message`] is the unit of traffic on both the data plane and the control plane:
/// a text body plus string headers, identified by a unique id.
///
/// # Examples
///
/// ```
/// use dynamic_router::{headers, Message};
///
/// let message = Message::new("42").with_header(headers::CHANNEL, "numbers");
///
/// assert_eq!(message.body(), "42");
/// assert_eq!(message.header(headers::CHANNEL), Some("numbers"));
/// ```
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Message {
    id: String,
    body: String,
    #[serde(default)]
    headers: BTreeMap<String, String>,
}

impl Message {
    /// Creates a message with a freshly generated id.
    pub fn new(body: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().hyphenated().to_string(), body)
    }

    pub fn with_id(id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
            headers: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        self.headers.remove(name)
    }
}
