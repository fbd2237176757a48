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

mod integration_test_utils;
pub use integration_test_utils::init_logging;

mod integration_test_endpoints;
pub use integration_test_endpoints::{FailingEndpoint, RecordingEndpoint, SlowEndpoint};

mod integration_test_predicates;
pub use integration_test_predicates::{
    is_even_number, ALL_NUMBERS_EXPRESSION, EVEN_NUMBERS_EXPRESSION, ODD_NUMBERS_EXPRESSION,
};

mod integration_test_messages;
pub use integration_test_messages::{message_on_channel, number_messages};
