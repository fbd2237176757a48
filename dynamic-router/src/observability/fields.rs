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

//! Canonical structured field keys and value-format helpers.

use crate::message::Message;

pub const EVENT: &str = "event";
pub const COMPONENT: &str = "component";
pub const ROUTER: &str = "router";

pub const MSG_ID: &str = "msg_id";
pub const CHANNEL: &str = "channel";
pub const FILTER_ID: &str = "filter_id";
pub const PRIORITY: &str = "priority";
pub const DESTINATION_URI: &str = "destination_uri";
pub const ACTION: &str = "action";
pub const RECIPIENTS: &str = "recipients";
pub const SNAPSHOT_VERSION: &str = "snapshot_version";

pub const REASON: &str = "reason";
pub const ERR: &str = "err";

pub const NONE: &str = "none";
pub const REASON_NO_MATCHING_FILTER: &str = "no_matching_filter";
pub const REASON_UNRESOLVED_ENDPOINT: &str = "unresolved_endpoint";
pub const REASON_ROUTER_STOPPED: &str = "router_stopped";
pub const BODY_PREVIEW_MAX_CHARS: usize = 64;

pub fn format_message_id(message: &Message) -> &str {
    if message.id().is_empty() {
        NONE
    } else {
        message.id()
    }
}

pub fn format_optional(value: Option<&str>) -> &str {
    value.filter(|value| !value.is_empty()).unwrap_or(NONE)
}

/// Joins filter ids for a single structured field.
pub fn format_recipients<'a>(filter_ids: impl IntoIterator<Item = &'a str>) -> String {
    let joined = filter_ids.into_iter().collect::<Vec<_>>().join(",");
    if joined.is_empty() {
        NONE.to_string()
    } else {
        joined
    }
}

/// Truncates a message body for log output on a character boundary.
pub fn format_body_preview(message: &Message) -> String {
    let body = message.body();
    match body.char_indices().nth(BODY_PREVIEW_MAX_CHARS) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        format_body_preview, format_message_id, format_optional, format_recipients,
        BODY_PREVIEW_MAX_CHARS, NONE,
    };
    use crate::message::Message;

    #[test]
    fn format_message_id_returns_id_when_present() {
        let message = Message::new("payload");

        assert_eq!(format_message_id(&message), message.id());
    }

    #[test]
    fn format_message_id_returns_none_when_blank() {
        let message = Message::with_id("", "payload");

        assert_eq!(format_message_id(&message), NONE);
    }

    #[test]
    fn format_optional_falls_back_for_missing_and_blank_values() {
        assert_eq!(format_optional(None), NONE);
        assert_eq!(format_optional(Some("")), NONE);
        assert_eq!(format_optional(Some("test")), "test");
    }

    #[test]
    fn format_recipients_joins_ids_in_order() {
        assert_eq!(format_recipients(["all", "even"]), "all,even");
        assert_eq!(format_recipients(Vec::<&str>::new()), NONE);
    }

    #[test]
    fn format_body_preview_truncates_long_bodies() {
        let long_body = "x".repeat(BODY_PREVIEW_MAX_CHARS + 10);
        let preview = format_body_preview(&Message::new(long_body));

        assert_eq!(preview.len(), BODY_PREVIEW_MAX_CHARS + 3);
        assert!(preview.ends_with("..."));
        assert_eq!(format_body_preview(&Message::new("short")), "short");
    }
}
