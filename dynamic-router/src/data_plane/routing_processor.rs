//! Routing of data-plane messages through a channel's prioritized filters.

use crate::config::{DynamicRouterConfig, RecipientMode, UnmatchedPolicy};
use crate::endpoint::{ForwardingError, MessageSender};
use crate::message::{headers, Message};
use crate::observability::{events, fields};
use crate::routing::predicate::PredicateError;
use crate::routing::prioritized_filter::PrioritizedFilter;
use crate::routing::subscriptions_registry::SubscriptionsRegistry;
use futures::future::join_all;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

const COMPONENT: &str = "routing_processor";

/// Failures for routing one message.
#[derive(Debug)]
pub enum RoutingError {
    NotStarted,
    /// The message carries no `DynamicRouterChannel` header.
    MissingChannel,
    PredicateEvaluation {
        channel: String,
        filter_id: String,
        source: PredicateError,
    },
    /// No filter matched and the unmatched policy is `fail`.
    Unroutable { channel: String },
    /// Sending failed. `filter_id` is `None` for the default destination.
    Forwarding {
        channel: String,
        filter_id: Option<String>,
        source: ForwardingError,
    },
    /// Several recipients failed in all-match mode.
    Multiple(Vec<RoutingError>),
}

impl Display for RoutingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutingError::NotStarted => write!(f, "router is not started"),
            RoutingError::MissingChannel => {
                write!(f, "message has no {} header", headers::CHANNEL)
            }
            RoutingError::PredicateEvaluation {
                channel,
                filter_id,
                source,
            } => write!(
                f,
                "predicate of filter '{filter_id}' on channel '{channel}' failed: {source}"
            ),
            RoutingError::Unroutable { channel } => {
                write!(f, "no filter on channel '{channel}' matched the message")
            }
            RoutingError::Forwarding {
                channel, source, ..
            } => write!(f, "forwarding on channel '{channel}' failed: {source}"),
            RoutingError::Multiple(errors) => {
                write!(f, "{} recipients failed", errors.len())?;
                for err in errors {
                    write!(f, "; {err}")?;
                }
                Ok(())
            }
        }
    }
}

impl Error for RoutingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RoutingError::PredicateEvaluation { source, .. } => Some(source),
            RoutingError::Forwarding { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// One message handed to one destination.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Delivery {
    pub filter_id: String,
    pub destination_uri: String,
}

impl Delivery {
    fn of(filter: &PrioritizedFilter) -> Self {
        Self {
            filter_id: filter.id().to_string(),
            destination_uri: filter.destination_uri().to_string(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Unmatched {
    Dropped,
    DefaultDestination(String),
}

/// What happened to a routed message.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RoutingOutcome {
    pub channel: String,
    /// Deliveries in filter precedence order.
    pub delivered: Vec<Delivery>,
    /// Matched filters whose destination could not be resolved.
    pub skipped: Vec<Delivery>,
    pub unmatched: Option<Unmatched>,
}

impl RoutingOutcome {
    fn new(channel: &str) -> Self {
        Self {
            channel: channel.to_string(),
            ..Default::default()
        }
    }

    pub fn delivered_filter_ids(&self) -> Vec<&str> {
        self.delivered
            .iter()
            .map(|delivery| delivery.filter_id.as_str())
            .collect()
    }
}

pub struct RoutingProcessor {
    registry: Arc<SubscriptionsRegistry>,
    sender: Arc<dyn MessageSender>,
    config: DynamicRouterConfig,
    started: Arc<AtomicBool>,
}

impl RoutingProcessor {
    pub(crate) fn new(
        registry: Arc<SubscriptionsRegistry>,
        sender: Arc<dyn MessageSender>,
        config: DynamicRouterConfig,
        started: Arc<AtomicBool>,
    ) -> Self {
        Self {
            registry,
            sender,
            config,
            started,
        }
    }

    /// Routes a message on the channel named by its `DynamicRouterChannel` header.
    pub async fn route_message(&self, message: Message) -> Result<RoutingOutcome, RoutingError> {
        let channel = message
            .header(headers::CHANNEL)
            .map(str::trim)
            .filter(|channel| !channel.is_empty())
            .map(str::to_string)
            .ok_or(RoutingError::MissingChannel)?;
        self.route(&channel, message).await
    }

    /// Evaluates the channel's filters in precedence order and forwards the message
    /// to the first match, or to every match in all-match mode.
    ///
    /// A failing predicate aborts the message before anything is forwarded.
    pub async fn route(
        &self,
        channel: &str,
        message: Message,
    ) -> Result<RoutingOutcome, RoutingError> {
        if !self.started.load(Ordering::Acquire) {
            debug!(
                event = events::ROUTER_NOT_STARTED,
                component = COMPONENT,
                channel,
                msg_id = fields::format_message_id(&message),
                reason = fields::REASON_ROUTER_STOPPED,
                "message refused"
            );
            return Err(RoutingError::NotStarted);
        }

        let (version, filters) = self.registry.snapshot_with_version(channel);
        debug!(
            event = events::ROUTE_RECEIVE,
            component = COMPONENT,
            channel,
            msg_id = fields::format_message_id(&message),
            snapshot_version = version,
            filters = filters.len(),
            "routing message"
        );

        let selected = self.select(channel, &message, &filters)?;
        if selected.is_empty() {
            return self.route_unmatched(channel, message).await;
        }

        let mut outcome = RoutingOutcome::new(channel);
        let mut recipients = Vec::with_capacity(selected.len());
        for filter in selected {
            if self.config.ignore_invalid_endpoints
                && !self.sender.can_resolve(filter.destination_uri())
            {
                warn!(
                    event = events::ROUTE_ENDPOINT_SKIPPED,
                    component = COMPONENT,
                    channel,
                    msg_id = fields::format_message_id(&message),
                    filter_id = filter.id(),
                    destination_uri = filter.destination_uri(),
                    reason = fields::REASON_UNRESOLVED_ENDPOINT,
                    "skipping unresolvable destination"
                );
                outcome.skipped.push(Delivery::of(filter));
                continue;
            }
            recipients.push(filter);
        }

        self.dispatch(channel, &message, &recipients, &mut outcome)
            .await?;
        Ok(outcome)
    }

    fn select<'a>(
        &self,
        channel: &str,
        message: &Message,
        filters: &'a [Arc<PrioritizedFilter>],
    ) -> Result<Vec<&'a PrioritizedFilter>, RoutingError> {
        let mut selected = Vec::new();
        for filter in filters {
            let matched = filter.matches(message).map_err(|source| {
                warn!(
                    event = events::ROUTE_PREDICATE_FAILED,
                    component = COMPONENT,
                    channel,
                    msg_id = fields::format_message_id(message),
                    filter_id = filter.id(),
                    err = %source,
                    "predicate evaluation failed"
                );
                RoutingError::PredicateEvaluation {
                    channel: channel.to_string(),
                    filter_id: filter.id().to_string(),
                    source,
                }
            })?;
            if !matched {
                continue;
            }

            debug!(
                event = events::ROUTE_FILTER_MATCHED,
                component = COMPONENT,
                channel,
                msg_id = fields::format_message_id(message),
                filter_id = filter.id(),
                priority = filter.priority(),
                "filter matched"
            );
            selected.push(filter.as_ref());
            if self.config.recipient_mode == RecipientMode::FirstMatch {
                break;
            }
        }
        Ok(selected)
    }

    async fn dispatch(
        &self,
        channel: &str,
        message: &Message,
        recipients: &[&PrioritizedFilter],
        outcome: &mut RoutingOutcome,
    ) -> Result<(), RoutingError> {
        debug!(
            event = events::ROUTE_DISPATCH,
            component = COMPONENT,
            channel,
            msg_id = fields::format_message_id(message),
            recipients = %fields::format_recipients(recipients.iter().map(|filter| filter.id())),
            "dispatching to recipients"
        );

        let mut failures = Vec::new();
        if self.config.parallel_processing && recipients.len() > 1 {
            let sends = recipients.iter().map(|filter| {
                filter.statistics().record_match();
                self.send(
                    channel,
                    Some(filter.id()),
                    filter.destination_uri(),
                    message.clone(),
                )
            });
            for (filter, result) in recipients.iter().zip(join_all(sends).await) {
                match result {
                    Ok(()) => outcome.delivered.push(Delivery::of(filter)),
                    Err(err) => failures.push(err),
                }
            }
        } else {
            for filter in recipients {
                filter.statistics().record_match();
                match self
                    .send(
                        channel,
                        Some(filter.id()),
                        filter.destination_uri(),
                        message.clone(),
                    )
                    .await
                {
                    Ok(()) => outcome.delivered.push(Delivery::of(filter)),
                    Err(err) if self.config.stop_on_error => return Err(err),
                    Err(err) => failures.push(err),
                }
            }
        }

        match failures.len() {
            0 => Ok(()),
            1 => Err(failures.remove(0)),
            _ => Err(RoutingError::Multiple(failures)),
        }
    }

    async fn route_unmatched(
        &self,
        channel: &str,
        message: Message,
    ) -> Result<RoutingOutcome, RoutingError> {
        let mut outcome = RoutingOutcome::new(channel);
        match self.config.unmatched_policy {
            UnmatchedPolicy::Drop => {
                if self.config.warn_dropped_messages {
                    warn!(
                        event = events::ROUTE_UNMATCHED_DROPPED,
                        component = COMPONENT,
                        channel,
                        msg_id = fields::format_message_id(&message),
                        reason = fields::REASON_NO_MATCHING_FILTER,
                        "dropping message"
                    );
                } else {
                    debug!(
                        event = events::ROUTE_UNMATCHED_DROPPED,
                        component = COMPONENT,
                        channel,
                        msg_id = fields::format_message_id(&message),
                        reason = fields::REASON_NO_MATCHING_FILTER,
                        "dropping message"
                    );
                }
                outcome.unmatched = Some(Unmatched::Dropped);
                Ok(outcome)
            }
            UnmatchedPolicy::DefaultDestination => {
                let destination_uri = self.config.default_destination_for(channel);
                debug!(
                    event = events::ROUTE_UNMATCHED_DEFAULT,
                    component = COMPONENT,
                    channel,
                    msg_id = fields::format_message_id(&message),
                    destination_uri = destination_uri.as_str(),
                    reason = fields::REASON_NO_MATCHING_FILTER,
                    "forwarding to default destination"
                );
                self.send(channel, None, &destination_uri, message).await?;
                outcome.unmatched = Some(Unmatched::DefaultDestination(destination_uri));
                Ok(outcome)
            }
            UnmatchedPolicy::Fail => {
                warn!(
                    event = events::ROUTE_UNMATCHED_FAILED,
                    component = COMPONENT,
                    channel,
                    msg_id = fields::format_message_id(&message),
                    reason = fields::REASON_NO_MATCHING_FILTER,
                    "message is unroutable"
                );
                Err(RoutingError::Unroutable {
                    channel: channel.to_string(),
                })
            }
        }
    }

    async fn send(
        &self,
        channel: &str,
        filter_id: Option<&str>,
        destination_uri: &str,
        message: Message,
    ) -> Result<(), RoutingError> {
        let msg_id = message.id().to_string();
        debug!(
            event = events::FORWARD_SEND_ATTEMPT,
            component = COMPONENT,
            channel,
            msg_id = msg_id.as_str(),
            filter_id = fields::format_optional(filter_id),
            destination_uri,
            "forwarding message"
        );

        let send = self.sender.send(destination_uri, message);
        let result = match self.config.send_timeout() {
            Some(timeout) => match tokio::time::timeout(timeout, send).await {
                Ok(result) => result,
                Err(_) => Err(ForwardingError::Timeout {
                    uri: destination_uri.to_string(),
                    timeout,
                }),
            },
            None => send.await,
        };

        match result {
            Ok(()) => {
                debug!(
                    event = events::FORWARD_SEND_OK,
                    component = COMPONENT,
                    channel,
                    msg_id = msg_id.as_str(),
                    filter_id = fields::format_optional(filter_id),
                    destination_uri,
                    "message forwarded"
                );
                Ok(())
            }
            Err(source) => {
                warn!(
                    event = events::FORWARD_SEND_FAILED,
                    component = COMPONENT,
                    channel,
                    msg_id = msg_id.as_str(),
                    filter_id = fields::format_optional(filter_id),
                    destination_uri,
                    err = %source,
                    "forwarding failed"
                );
                Err(RoutingError::Forwarding {
                    channel: channel.to_string(),
                    filter_id: filter_id.map(str::to_string),
                    source,
                })
            }
        }
    }
}
