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

use dynamic_router::{headers, Message};
use std::ops::Range;

/// One message per number, with the number as body.
pub fn number_messages(numbers: Range<u64>) -> Vec<Message> {
    numbers.map(|number| Message::new(number.to_string())).collect()
}

/// A message carrying the `DynamicRouterChannel` header.
pub fn message_on_channel(channel: &str, body: impl Into<String>) -> Message {
    Message::new(body).with_header(headers::CHANNEL, channel)
}
