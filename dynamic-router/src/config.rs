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
use std::time::Duration;

/// How many matching filters receive a message.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientMode {
    /// Only the highest-precedence matching filter.
    #[default]
    FirstMatch,
    /// Every matching filter, in precedence order.
    AllMatch,
}

/// What happens to a message no filter matched.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    Drop,
    #[default]
    DefaultDestination,
    Fail,
}

/// Routing behaviour of one [`DynamicRouter`](crate::DynamicRouter).
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DynamicRouterConfig {
    pub recipient_mode: RecipientMode,
    pub unmatched_policy: UnmatchedPolicy,
    /// Overrides `log:DynamicRouter:<channel>` as the unmatched destination.
    pub default_destination: Option<String>,
    pub warn_dropped_messages: bool,
    /// In all-match mode, stop at the first forwarding failure.
    pub stop_on_error: bool,
    /// In all-match mode, forward to matched recipients concurrently.
    pub parallel_processing: bool,
    /// Per-send timeout; absent or `0` disables it.
    pub send_timeout_ms: Option<u64>,
    /// Skip destinations no endpoint is registered for instead of failing.
    pub ignore_invalid_endpoints: bool,
    /// Priority given to subscriptions that omit one.
    pub default_priority: i32,
}

impl Default for DynamicRouterConfig {
    fn default() -> Self {
        Self {
            recipient_mode: RecipientMode::default(),
            unmatched_policy: UnmatchedPolicy::default(),
            default_destination: None,
            warn_dropped_messages: true,
            stop_on_error: false,
            parallel_processing: false,
            send_timeout_ms: None,
            ignore_invalid_endpoints: false,
            default_priority: i32::MAX,
        }
    }
}

impl DynamicRouterConfig {
    pub fn send_timeout(&self) -> Option<Duration> {
        self.send_timeout_ms
            .filter(|millis| *millis > 0)
            .map(Duration::from_millis)
    }

    pub fn default_destination_for(&self, channel: &str) -> String {
        match &self.default_destination {
            Some(uri) if !uri.trim().is_empty() => uri.trim().to_string(),
            _ => format!("log:DynamicRouter:{channel}"),
        }
    }
}
