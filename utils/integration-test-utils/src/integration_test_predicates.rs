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

use dynamic_router::{predicate_fn, Predicate};
use std::sync::Arc;

// Scenario predicates in the `simple` language.
pub const EVEN_NUMBERS_EXPRESSION: &str = r"${body} regex '^\d*[02468]$'";
pub const ODD_NUMBERS_EXPRESSION: &str = r"${body} regex '^\d*[13579]$'";
pub const ALL_NUMBERS_EXPRESSION: &str = r"${body} regex '^\d+$'";

/// Predicate instance equivalent of [`EVEN_NUMBERS_EXPRESSION`].
pub fn is_even_number() -> Arc<dyn Predicate> {
    predicate_fn(|message| {
        message
            .body()
            .parse::<u64>()
            .map(|number| number % 2 == 0)
            .unwrap_or(false)
    })
}
