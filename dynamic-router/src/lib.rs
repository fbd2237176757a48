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

//! # dynamic-router
//!
//! `dynamic-router` is an in-process routing service. Subscribers register
//! prioritized, predicated destinations on named channels over a control plane, and
//! messages sent to a channel are forwarded to the destination(s) whose predicates
//! match, evaluated in priority order.
//!
//! Typical usage is centered on [`DynamicRouter`], [`ControlMessage`] and the
//! [`Endpoint`] implementations destinations are reached through.
//!
//! ## Quick start
//!
//! ```
//! use std::sync::Arc;
//! use dynamic_router::{
//!     predicate_fn, ControlMessage, DynamicRouter, DynamicRouterConfig, Message,
//! };
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let router = DynamicRouter::new("quick-start", DynamicRouterConfig::default());
//! router
//!     .predicate_beans()
//!     .register("small", predicate_fn(|m| m.body().len() < 3));
//! router.start();
//!
//! // Expression, bean and instance predicates share one channel.
//! router
//!     .control(
//!         ControlMessage::subscribe("numbers")
//!             .with_subscription_id("even")
//!             .with_destination_uri("log:even")
//!             .with_priority(2)
//!             .with_predicate("${body} regex '\\d*[02468]'"),
//!     )
//!     .unwrap();
//! router
//!     .control(
//!         ControlMessage::subscribe("numbers")
//!             .with_subscription_id("small")
//!             .with_destination_uri("log:small")
//!             .with_priority(3)
//!             .with_predicate_bean("small"),
//!     )
//!     .unwrap();
//!
//! let even = router.route("numbers", Message::new("10")).await.unwrap();
//! let small = router.route("numbers", Message::new("7")).await.unwrap();
//! assert_eq!(even.delivered_filter_ids(), vec!["even"]);
//! assert_eq!(small.delivered_filter_ids(), vec!["small"]);
//!
//! let statistics = router.management().subscriptions_statistics_map();
//! assert_eq!(statistics["numbers"][0].count, 1);
//! # });
//! ```
//!
//! ## Control surfaces
//!
//! The same requests can be sent as a [`ControlMessage`], as `DynamicRouter*`
//! headers or a JSON body on a [`Message`] (see [`headers`]), or as a
//! `dynamic-router-control:<action>/<channel>?..` URI. All of them end in the same
//! control handler, including the operations of [`DynamicRouterManagement`].
//!
//! ## Internal architecture map
//!
//! - API facade: outward `DynamicRouter`/`ControlMessage`/`Endpoint` surface
//! - Control plane: request decoding and registry mutation
//! - Routing: prioritized filters, predicates, expression languages and statistics
//! - Data plane: filter evaluation, dispatch and destination resolution
//! - Management: serializable subscription and statistics views
//!
//! ## Observability model
//!
//! The workspace uses `tracing` for logs/events.
//! Library code emits events and does not initialize a global subscriber.
//! Binaries and tests are responsible for one-time `tracing_subscriber`
//! initialization at process boundaries.

mod config;
pub use config::{DynamicRouterConfig, RecipientMode, UnmatchedPolicy};

mod control_plane;
pub use control_plane::control_handler::{ControlChannelHandler, ControlReply};
pub use control_plane::control_message::{ControlAction, ControlError, ControlMessage};
pub use control_plane::control_uri::{parse_control_uri, CONTROL_SCHEME};
pub use control_plane::subscription_handle::SubscriptionHandle;

mod data_plane;
pub use data_plane::endpoint_registry::{EndpointRegistry, LOG_SCHEME};
pub use data_plane::routing_processor::{Delivery, RoutingError, RoutingOutcome, Unmatched};

mod dynamic_router;
pub use dynamic_router::DynamicRouter;

mod endpoint;
pub use endpoint::{Endpoint, ForwardingError, LogEndpoint, MessageSender};

mod management;
pub use management::management_facade::{
    DynamicRouterManagement, SubscriptionsMap, SubscriptionsStatisticsMap,
};

mod message;
pub use message::{headers, Message};

#[doc(hidden)]
pub mod observability;

mod routing;
pub use routing::expression::{CONSTANT, DEFAULT_LANGUAGE, HEADER, REGEX, SIMPLE};
pub use routing::filter_statistics::{FilterStatisticsSnapshot, PrioritizedFilterStatistics};
pub use routing::predicate::{
    predicate_fn, ConstantPredicate, FnPredicate, Predicate, PredicateError, PredicateRef,
    PredicateResolveError, PredicateSource,
};
pub use routing::predicate_bean_registry::PredicateBeanRegistry;
pub use routing::prioritized_filter::{FilterRegistration, FilterView, PrioritizedFilter};
pub use routing::subscriptions_registry::{FilterSnapshot, SubscriptionError, SubscriptionsRegistry};
