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

mod support;

use dynamic_router::{ControlMessage, DynamicRouterConfig, UnmatchedPolicy};
use integration_test_utils::{number_messages, ALL_NUMBERS_EXPRESSION};
use std::sync::Arc;
use support::{make_router, subscribe_expression, CHANNEL};

const ROUTING_TASKS: u64 = 8;
const MESSAGES_PER_TASK: u64 = 250;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn statistics_are_exact_under_concurrent_routing() {
    let (router, mocks) = make_router(
        "concurrent-routing",
        DynamicRouterConfig::default(),
        &["three"],
    );
    subscribe_expression(&router, "all", 1, "three", ALL_NUMBERS_EXPRESSION);
    let router = Arc::new(router);

    let tasks: Vec<_> = (0..ROUTING_TASKS)
        .map(|task| {
            let router = router.clone();
            tokio::spawn(async move {
                let start = task * MESSAGES_PER_TASK;
                for message in number_messages(start..start + MESSAGES_PER_TASK) {
                    router
                        .route(CHANNEL, message)
                        .await
                        .expect("routing should succeed");
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.expect("routing task should finish");
    }

    let total = (ROUTING_TASKS * MESSAGES_PER_TASK) as usize;
    assert_eq!(mocks["three"].len().await, total);
    let statistics = router.management().subscriptions_statistics_map();
    assert_eq!(statistics[CHANNEL][0].count, total as u64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn subscriptions_change_safely_while_messages_flow() {
    let (router, mocks) = make_router(
        "concurrent-control",
        DynamicRouterConfig {
            unmatched_policy: UnmatchedPolicy::Drop,
            warn_dropped_messages: false,
            ..DynamicRouterConfig::default()
        },
        &["stable", "churn"],
    );
    subscribe_expression(&router, "stable", 100, "stable", ALL_NUMBERS_EXPRESSION);
    let router = Arc::new(router);

    let churn = {
        let router = router.clone();
        tokio::spawn(async move {
            for round in 0..200 {
                let id = format!("churn-{round}");
                router
                    .control(
                        ControlMessage::subscribe(CHANNEL)
                            .with_subscription_id(id.as_str())
                            .with_destination_uri("mock:churn")
                            .with_priority(round % 5)
                            .with_predicate(ALL_NUMBERS_EXPRESSION),
                    )
                    .expect("subscribe should succeed");
                tokio::task::yield_now().await;
                router
                    .control(ControlMessage::unsubscribe(CHANNEL, id))
                    .expect("unsubscribe should succeed");
            }
        })
    };
    let routing = {
        let router = router.clone();
        tokio::spawn(async move {
            for message in number_messages(0..500) {
                let outcome = router
                    .route(CHANNEL, message)
                    .await
                    .expect("routing should succeed");
                assert_eq!(outcome.delivered.len(), 1);
            }
        })
    };
    churn.await.expect("churn task should finish");
    routing.await.expect("routing task should finish");

    assert_eq!(
        mocks["stable"].len().await + mocks["churn"].len().await,
        500
    );
    assert_eq!(router.subscriptions().len(), 1);
}
