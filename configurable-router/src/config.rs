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

use dynamic_router::{ControlMessage, DynamicRouterConfig};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub(crate) router: RouterConfig,
    pub(crate) input_channel: String,
    #[serde(default)]
    pub(crate) stdout_endpoints: Vec<String>,
    #[serde(default)]
    pub(crate) subscriptions: Vec<StaticSubscription>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct RouterConfig {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) routing: DynamicRouterConfig,
}

/// A subscription applied through the control handler at startup.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct StaticSubscription {
    pub(crate) channel: String,
    #[serde(default)]
    pub(crate) id: Option<String>,
    pub(crate) destination_uri: String,
    #[serde(default)]
    pub(crate) priority: Option<i32>,
    pub(crate) predicate: String,
    #[serde(default)]
    pub(crate) expression_language: Option<String>,
    #[serde(default)]
    pub(crate) update: Option<bool>,
}

impl StaticSubscription {
    pub(crate) fn to_control_message(&self) -> ControlMessage {
        let mut request = ControlMessage::subscribe(self.channel.as_str())
            .with_destination_uri(self.destination_uri.as_str())
            .with_predicate(self.predicate.as_str());
        if let Some(id) = &self.id {
            request = request.with_subscription_id(id.as_str());
        }
        if let Some(priority) = self.priority {
            request = request.with_priority(priority);
        }
        if let Some(language) = &self.expression_language {
            request = request.with_expression_language(language.as_str());
        }
        if let Some(update) = self.update {
            request = request.with_update(update);
        }
        request
    }
}
