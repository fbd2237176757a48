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

use crate::config::DynamicRouterConfig;
use crate::control_plane::control_handler::{ControlChannelHandler, ControlReply};
use crate::control_plane::control_message::{ControlError, ControlMessage};
use crate::control_plane::subscription_handle::SubscriptionHandle;
use crate::data_plane::endpoint_registry::EndpointRegistry;
use crate::data_plane::routing_processor::{RoutingError, RoutingOutcome, RoutingProcessor};
use crate::endpoint::MessageSender;
use crate::management::management_facade::DynamicRouterManagement;
use crate::message::Message;
use crate::observability::events;
use crate::routing::predicate::Predicate;
use crate::routing::predicate_bean_registry::PredicateBeanRegistry;
use crate::routing::subscriptions_registry::SubscriptionsRegistry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

const COMPONENT: &str = "dynamic_router";

///
/// [`DynamicRouter`] owns one set of channel subscriptions together with the control
/// handler that mutates them, the routing processor that reads them and the
/// management view over them. Routers are independent; several can live in one
/// process.
///
/// Routing and control requests fail with `NotStarted` until [`start`](Self::start)
/// is called. [`stop`](Self::stop) removes every subscription.
///
/// # Examples
///
/// ```
/// use dynamic_router::{DynamicRouter, DynamicRouterConfig, Message};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let router = DynamicRouter::new("numbers-router", DynamicRouterConfig::default());
/// router.start();
///
/// router
///     .management()
///     .subscribe_with_predicate_expression(
///         "numbers", Some("even"), "log:even", 2, "${body} regex '\\d*[02468]'", "simple", true,
///     )
///     .unwrap();
///
/// let outcome = router.route("numbers", Message::new("42")).await.unwrap();
/// assert_eq!(outcome.delivered_filter_ids(), vec!["even"]);
/// # });
/// ```
pub struct DynamicRouter {
    name: String,
    started: Arc<AtomicBool>,
    registry: Arc<SubscriptionsRegistry>,
    beans: Arc<PredicateBeanRegistry>,
    endpoints: Option<Arc<EndpointRegistry>>,
    control: Arc<ControlChannelHandler>,
    processor: RoutingProcessor,
    management: DynamicRouterManagement,
}

impl DynamicRouter {
    /// Creates a stopped router that forwards through its own [`EndpointRegistry`].
    pub fn new(name: impl Into<String>, config: DynamicRouterConfig) -> Self {
        let endpoints = Arc::new(EndpointRegistry::default());
        Self::build(name.into(), config, Some(endpoints.clone()), endpoints)
    }

    /// Creates a stopped router that forwards through `sender`. Such a router has
    /// no [`EndpointRegistry`]; [`endpoints`](Self::endpoints) returns `None`.
    pub fn with_message_sender(
        name: impl Into<String>,
        config: DynamicRouterConfig,
        sender: Arc<dyn MessageSender>,
    ) -> Self {
        Self::build(name.into(), config, None, sender)
    }

    fn build(
        name: String,
        config: DynamicRouterConfig,
        endpoints: Option<Arc<EndpointRegistry>>,
        sender: Arc<dyn MessageSender>,
    ) -> Self {
        let started = Arc::new(AtomicBool::new(false));
        let registry = Arc::new(SubscriptionsRegistry::new());
        let beans = Arc::new(PredicateBeanRegistry::default());
        let control = Arc::new(ControlChannelHandler::new(
            registry.clone(),
            beans.clone(),
            config.default_priority,
            started.clone(),
        ));
        let management = DynamicRouterManagement::new(control.clone(), registry.clone());
        let processor = RoutingProcessor::new(registry.clone(), sender, config, started.clone());

        Self {
            name,
            started,
            registry,
            beans,
            endpoints,
            control,
            processor,
            management,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Starts accepting control and data-plane requests. Returns `false` when the
    /// router was already started.
    pub fn start(&self) -> bool {
        let changed = !self.started.swap(true, Ordering::AcqRel);
        if changed {
            info!(
                event = events::ROUTER_START,
                component = COMPONENT,
                router = self.name.as_str(),
                "router started"
            );
        }
        changed
    }

    /// Stops the router and removes every subscription. Returns how many were removed.
    pub fn stop(&self) -> usize {
        let was_started = self.started.swap(false, Ordering::AcqRel);
        let removed = self.registry.clear();
        if was_started {
            info!(
                event = events::ROUTER_STOP,
                component = COMPONENT,
                router = self.name.as_str(),
                removed,
                "router stopped"
            );
        }
        removed
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub fn subscriptions(&self) -> &Arc<SubscriptionsRegistry> {
        &self.registry
    }

    pub fn predicate_beans(&self) -> &PredicateBeanRegistry {
        &self.beans
    }

    /// The registry destinations resolve through, or `None` when the router was
    /// built [`with_message_sender`](Self::with_message_sender).
    pub fn endpoints(&self) -> Option<&EndpointRegistry> {
        self.endpoints.as_deref()
    }

    pub fn control_handler(&self) -> &ControlChannelHandler {
        &self.control
    }

    pub fn management(&self) -> &DynamicRouterManagement {
        &self.management
    }

    pub async fn route(
        &self,
        channel: &str,
        message: Message,
    ) -> Result<RoutingOutcome, RoutingError> {
        self.processor.route(channel, message).await
    }

    /// Routes on the channel named by the `DynamicRouterChannel` header.
    pub async fn route_message(&self, message: Message) -> Result<RoutingOutcome, RoutingError> {
        self.processor.route_message(message).await
    }

    pub fn control(&self, request: ControlMessage) -> Result<ControlReply, ControlError> {
        self.control.handle(request)
    }

    pub fn control_uri(
        &self,
        uri: &str,
        predicate: Option<Arc<dyn Predicate>>,
    ) -> Result<ControlReply, ControlError> {
        self.control.handle_uri(uri, predicate)
    }

    pub fn control_message(&self, message: &Message) -> Result<Message, ControlError> {
        self.control.handle_message(message)
    }

    /// Subscribes and returns a handle that unsubscribes when dropped.
    pub fn subscribe_scoped(
        &self,
        request: ControlMessage,
    ) -> Result<SubscriptionHandle, ControlError> {
        let channel = request
            .channel
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        let subscription_id = self.control.subscribe(request)?;
        Ok(SubscriptionHandle::new(
            Arc::downgrade(&self.registry),
            channel,
            subscription_id,
        ))
    }
}
