//! Applies control requests to the subscriptions registry.

use crate::control_plane::control_message::{ControlAction, ControlError, ControlMessage};
use crate::control_plane::control_uri::parse_control_uri;
use crate::message::{headers, Message};
use crate::observability::events;
use crate::routing::expression::DEFAULT_LANGUAGE;
use crate::routing::filter_statistics::FilterStatisticsSnapshot;
use crate::routing::predicate::{Predicate, PredicateResolveError, PredicateSource};
use crate::routing::predicate_bean_registry::PredicateBeanRegistry;
use crate::routing::prioritized_filter::{FilterRegistration, FilterView};
use crate::routing::subscriptions_registry::SubscriptionsRegistry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

const COMPONENT: &str = "control_handler";

/// Result of a successful control request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ControlReply {
    Subscribed { subscription_id: String },
    Unsubscribed(bool),
    Listing(Vec<FilterView>),
    Statistics(Vec<FilterStatisticsSnapshot>),
}

impl ControlReply {
    /// Reply body: the subscription id, `true`/`false`, or a JSON array.
    pub fn to_body(&self) -> String {
        match self {
            ControlReply::Subscribed { subscription_id } => subscription_id.clone(),
            ControlReply::Unsubscribed(removed) => removed.to_string(),
            ControlReply::Listing(filters) => serde_json::to_string(filters).unwrap_or_default(),
            ControlReply::Statistics(statistics) => {
                serde_json::to_string(statistics).unwrap_or_default()
            }
        }
    }
}

pub struct ControlChannelHandler {
    registry: Arc<SubscriptionsRegistry>,
    beans: Arc<PredicateBeanRegistry>,
    default_priority: i32,
    started: Arc<AtomicBool>,
}

impl ControlChannelHandler {
    pub(crate) fn new(
        registry: Arc<SubscriptionsRegistry>,
        beans: Arc<PredicateBeanRegistry>,
        default_priority: i32,
        started: Arc<AtomicBool>,
    ) -> Self {
        Self {
            registry,
            beans,
            default_priority,
            started,
        }
    }

    pub fn handle(&self, request: ControlMessage) -> Result<ControlReply, ControlError> {
        let action = request.action.ok_or_else(|| ControlError::missing("action"))?;
        match action {
            ControlAction::Subscribe | ControlAction::Update => self
                .subscribe(request)
                .map(|subscription_id| ControlReply::Subscribed { subscription_id }),
            ControlAction::Unsubscribe => self.unsubscribe(request).map(ControlReply::Unsubscribed),
            ControlAction::List => {
                let channel = required(request.channel, "channel")?;
                self.observe(action, &channel, || {
                    Ok(ControlReply::Listing(
                        self.registry
                            .snapshot(&channel)
                            .iter()
                            .map(|filter| filter.view())
                            .collect(),
                    ))
                })
            }
            ControlAction::Statistics => {
                let channel = required(request.channel, "channel")?;
                self.observe(action, &channel, || {
                    Ok(ControlReply::Statistics(
                        self.registry
                            .snapshot(&channel)
                            .iter()
                            .map(|filter| filter.statistics_snapshot())
                            .collect(),
                    ))
                })
            }
        }
    }

    /// Decodes a `dynamic-router-control:` URI, attaching `predicate` when one is
    /// carried alongside the request.
    pub fn handle_uri(
        &self,
        uri: &str,
        predicate: Option<Arc<dyn Predicate>>,
    ) -> Result<ControlReply, ControlError> {
        let mut request = parse_control_uri(uri)?;
        if let Some(predicate) = predicate {
            request = request.with_predicate_instance(predicate);
        }
        self.handle(request)
    }

    /// Handles a control message sent on the control channel, either as
    /// `DynamicRouter*` headers or as a JSON body. The reply keeps the request's
    /// headers; subscribe replies also carry the effective subscription id header.
    pub fn handle_message(&self, message: &Message) -> Result<Message, ControlError> {
        let request = if message.header(headers::CONTROL_ACTION).is_some() {
            ControlMessage::from_headers(message)?
        } else if message.body().trim_start().starts_with('{') {
            ControlMessage::from_json(message.body())?
        } else {
            return Err(ControlError::missing("action"));
        };

        let reply = self.handle(request)?;
        let mut response = message.clone();
        response.set_body(reply.to_body());
        if let ControlReply::Subscribed { subscription_id } = &reply {
            response.set_header(headers::CONTROL_SUBSCRIPTION_ID, subscription_id.as_str());
        }
        Ok(response)
    }

    /// Adds or replaces a subscription. Returns the effective subscription id.
    ///
    /// Replaces an existing subscription with the same id unless the request sets
    /// `update` to `false`, in which case a duplicate id is rejected.
    pub fn subscribe(&self, request: ControlMessage) -> Result<String, ControlError> {
        let action = request.action.unwrap_or(ControlAction::Subscribe);
        let channel = required(request.channel.clone(), "channel")?;
        self.observe(action, &channel, || {
            let replace = action == ControlAction::Update || request.update.unwrap_or(true);
            let destination_uri = required(request.destination_uri.clone(), "destinationUri")?;
            let source = predicate_source(&request)?;
            let predicate = source.resolve(&self.beans).map_err(resolve_error)?;

            let registration = FilterRegistration {
                channel: channel.clone(),
                id: non_blank(request.subscription_id.clone()),
                priority: request.priority.unwrap_or(self.default_priority),
                destination_uri,
                predicate: Some(predicate),
                description: source.describe(),
            };
            let subscription_id = if replace {
                self.registry.subscribe(registration)?
            } else {
                self.registry.add(registration)?
            };
            Ok(subscription_id)
        })
    }

    /// Removes a subscription. Unknown ids are not an error and yield `false`.
    pub fn unsubscribe(&self, request: ControlMessage) -> Result<bool, ControlError> {
        let channel = required(request.channel, "channel")?;
        self.observe(ControlAction::Unsubscribe, &channel, || {
            let subscription_id = required(request.subscription_id.clone(), "subscriptionId")?;
            Ok(self.registry.unsubscribe(&channel, &subscription_id))
        })
    }

    fn observe<T>(
        &self,
        action: ControlAction,
        channel: &str,
        apply: impl FnOnce() -> Result<T, ControlError>,
    ) -> Result<T, ControlError> {
        debug!(
            event = events::CONTROL_REQUEST_RECEIVE,
            component = COMPONENT,
            action = action.as_str(),
            channel,
            "control request received"
        );

        let result = if self.started.load(Ordering::Acquire) {
            apply()
        } else {
            Err(ControlError::NotStarted)
        };

        match &result {
            Ok(_) => debug!(
                event = events::CONTROL_REQUEST_OK,
                component = COMPONENT,
                action = action.as_str(),
                channel,
                "control request applied"
            ),
            Err(err) => warn!(
                event = events::CONTROL_REQUEST_FAILED,
                component = COMPONENT,
                action = action.as_str(),
                channel,
                err = %err,
                "control request rejected"
            ),
        }
        result
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ControlError> {
    non_blank(value).ok_or_else(|| ControlError::missing(field))
}

// Instance, then bean, then expression.
fn predicate_source(request: &ControlMessage) -> Result<PredicateSource, ControlError> {
    if let Some(instance) = &request.predicate_instance {
        return Ok(PredicateSource::Instance(instance.0.clone()));
    }
    if let Some(bean) = non_blank(request.predicate_bean.clone()) {
        return Ok(PredicateSource::Bean(bean));
    }
    if let Some(expression) = non_blank(request.predicate.clone()) {
        let language = non_blank(request.expression_language.clone())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        return Ok(PredicateSource::Expression {
            expression,
            language,
        });
    }
    Err(ControlError::invalid(
        "predicate",
        "one of predicate, predicateBean or a predicate instance is required",
    ))
}

fn resolve_error(err: PredicateResolveError) -> ControlError {
    let field = match &err {
        PredicateResolveError::UnknownLanguage(_) => "expressionLanguage",
        PredicateResolveError::InvalidExpression { .. } => "predicate",
        PredicateResolveError::UnknownBean(_) => "predicateBean",
    };
    ControlError::invalid(field, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::{ControlChannelHandler, ControlReply};
    use crate::control_plane::control_message::{ControlError, ControlMessage};
    use crate::message::{headers, Message};
    use crate::routing::predicate::predicate_fn;
    use crate::routing::predicate_bean_registry::PredicateBeanRegistry;
    use crate::routing::subscriptions_registry::{SubscriptionError, SubscriptionsRegistry};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use uuid::Uuid;

    fn handler() -> (ControlChannelHandler, Arc<SubscriptionsRegistry>) {
        let registry = Arc::new(SubscriptionsRegistry::new());
        let beans = Arc::new(PredicateBeanRegistry::default());
        beans.register("even", predicate_fn(|m| m.body().ends_with(['0', '2', '4', '6', '8'])));
        let handler = ControlChannelHandler::new(
            registry.clone(),
            beans,
            i32::MAX,
            Arc::new(AtomicBool::new(true)),
        );
        (handler, registry)
    }

    fn invalid_field(result: Result<ControlReply, ControlError>) -> &'static str {
        match result {
            Err(ControlError::InvalidControlRequest { field, .. }) => field,
            other => panic!("expected an invalid request, got {other:?}"),
        }
    }

    #[test]
    fn subscribe_applies_defaults() {
        let (handler, registry) = handler();

        let reply = handler
            .handle(
                ControlMessage::subscribe("numbers")
                    .with_destination_uri("mock:all")
                    .with_predicate("true")
                    .with_expression_language("constant"),
            )
            .unwrap();

        let ControlReply::Subscribed { subscription_id } = reply else {
            panic!("expected a subscribe reply");
        };
        assert!(Uuid::parse_str(&subscription_id).is_ok());
        let filter = registry.filter("numbers", &subscription_id).unwrap();
        assert_eq!(filter.priority(), i32::MAX);
        assert_eq!(filter.description(), "constant: true");
    }

    #[test]
    fn expression_defaults_to_the_simple_language() {
        let (handler, registry) = handler();

        handler
            .handle(
                ControlMessage::subscribe("numbers")
                    .with_subscription_id("big")
                    .with_destination_uri("mock:big")
                    .with_predicate("${body} > 100"),
            )
            .unwrap();

        let filter = registry.filter("numbers", "big").unwrap();
        assert_eq!(filter.description(), "simple: ${body} > 100");
        assert!(filter.matches(&Message::new("101")).unwrap());
        assert!(!filter.matches(&Message::new("99")).unwrap());
    }

    #[test]
    fn missing_and_invalid_fields_are_named() {
        let (handler, registry) = handler();
        let base = || {
            ControlMessage::subscribe("numbers")
                .with_destination_uri("mock:x")
                .with_predicate("true")
        };

        assert_eq!(
            invalid_field(handler.handle(ControlMessage::default())),
            "action"
        );
        assert_eq!(
            invalid_field(handler.handle(ControlMessage::subscribe(" ").with_predicate("true"))),
            "channel"
        );
        assert_eq!(
            invalid_field(
                handler.handle(ControlMessage::subscribe("numbers").with_predicate("true"))
            ),
            "destinationUri"
        );
        assert_eq!(
            invalid_field(handler.handle(
                ControlMessage::subscribe("numbers").with_destination_uri("mock:x")
            )),
            "predicate"
        );
        assert_eq!(
            invalid_field(handler.handle(base().with_expression_language("groovy"))),
            "expressionLanguage"
        );
        assert_eq!(
            invalid_field(handler.handle(base().with_predicate("${body} ==="))),
            "predicate"
        );
        assert_eq!(
            invalid_field(handler.handle(base().with_predicate_bean("missing"))),
            "predicateBean"
        );
        assert_eq!(
            invalid_field(handler.handle(ControlMessage::new(
                crate::control_plane::control_message::ControlAction::Unsubscribe,
                "numbers"
            ))),
            "subscriptionId"
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn update_false_rejects_duplicate_ids() {
        let (handler, _) = handler();
        let request = ControlMessage::subscribe("numbers")
            .with_subscription_id("even")
            .with_destination_uri("mock:even")
            .with_predicate_bean("even");

        handler.handle(request.clone()).unwrap();
        let duplicate = handler.handle(request.clone().with_update(false));
        let replaced = handler.handle(request.with_update(true).with_priority(1));

        assert_eq!(
            duplicate,
            Err(ControlError::Subscription(SubscriptionError::SubscriptionExists {
                channel: "numbers".to_string(),
                id: "even".to_string()
            }))
        );
        assert!(replaced.is_ok());
    }

    #[test]
    fn predicate_instance_travels_with_a_uri() {
        let (handler, registry) = handler();

        handler
            .handle_uri(
                "dynamic-router-control:subscribe/numbers?subscriptionId=odd\
                 &destinationUri=mock:odd",
                Some(predicate_fn(|m| m.body().ends_with('1'))),
            )
            .unwrap();

        let filter = registry.filter("numbers", "odd").unwrap();
        assert_eq!(filter.description(), "predicate instance");
        assert!(filter.matches(&Message::new("11")).unwrap());
    }

    #[test]
    fn header_messages_get_the_subscription_id_back() {
        let (handler, _) = handler();
        let request = Message::new("")
            .with_header(headers::CONTROL_ACTION, "subscribe")
            .with_header(headers::CONTROL_SUBSCRIBE_CHANNEL, "numbers")
            .with_header(headers::CONTROL_DESTINATION_URI, "mock:even")
            .with_header(headers::CONTROL_PREDICATE_BEAN, "even");

        let reply = handler.handle_message(&request).unwrap();

        let id = reply
            .header(headers::CONTROL_SUBSCRIPTION_ID)
            .expect("id header set");
        assert_eq!(reply.body(), id);
        assert_eq!(reply.id(), request.id());
    }

    #[test]
    fn list_and_statistics_reply_with_json() {
        let (handler, _) = handler();
        handler
            .handle(
                ControlMessage::subscribe("numbers")
                    .with_subscription_id("even")
                    .with_destination_uri("mock:even")
                    .with_priority(2)
                    .with_predicate_bean("even"),
            )
            .unwrap();

        let listing = handler.handle(ControlMessage::list("numbers")).unwrap();
        let statistics = handler.handle(ControlMessage::statistics("numbers")).unwrap();

        let listing: serde_json::Value = serde_json::from_str(&listing.to_body()).unwrap();
        assert_eq!(listing[0]["id"], "even");
        assert_eq!(listing[0]["destinationUri"], "mock:even");
        assert_eq!(listing[0]["predicate"], "bean: even");
        let statistics: serde_json::Value = serde_json::from_str(&statistics.to_body()).unwrap();
        assert_eq!(statistics[0]["count"], 0);
    }

    #[test]
    fn stopped_handler_refuses_requests() {
        let registry = Arc::new(SubscriptionsRegistry::new());
        let handler = ControlChannelHandler::new(
            registry,
            Arc::new(PredicateBeanRegistry::default()),
            0,
            Arc::new(AtomicBool::new(false)),
        );

        assert_eq!(
            handler.handle(ControlMessage::list("numbers")),
            Err(ControlError::NotStarted)
        );
    }
}
