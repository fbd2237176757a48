//! Structured control requests and their header and JSON encodings.

use crate::message::{headers, Message};
use crate::routing::predicate::{Predicate, PredicateRef};
use crate::routing::subscriptions_registry::SubscriptionError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

/// Failures for control-plane requests.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ControlError {
    /// A request field is missing or cannot be interpreted.
    InvalidControlRequest { field: &'static str, reason: String },
    Subscription(SubscriptionError),
    NotStarted,
}

impl ControlError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ControlError::InvalidControlRequest {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(field: &'static str) -> Self {
        Self::invalid(field, "missing or empty")
    }
}

impl Display for ControlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlError::InvalidControlRequest { field, reason } => {
                write!(f, "invalid control request, {field}: {reason}")
            }
            ControlError::Subscription(err) => write!(f, "{err}"),
            ControlError::NotStarted => write!(f, "router is not started"),
        }
    }
}

impl Error for ControlError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ControlError::Subscription(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SubscriptionError> for ControlError {
    fn from(err: SubscriptionError) -> Self {
        ControlError::Subscription(err)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
    Subscribe,
    Unsubscribe,
    /// Subscribe that always replaces an existing subscription with the same id.
    Update,
    List,
    Statistics,
}

impl ControlAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlAction::Subscribe => "subscribe",
            ControlAction::Unsubscribe => "unsubscribe",
            ControlAction::Update => "update",
            ControlAction::List => "list",
            ControlAction::Statistics => "statistics",
        }
    }
}

impl Display for ControlAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlAction {
    type Err = ControlError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "subscribe" => Ok(ControlAction::Subscribe),
            "unsubscribe" => Ok(ControlAction::Unsubscribe),
            "update" => Ok(ControlAction::Update),
            "list" => Ok(ControlAction::List),
            "statistics" => Ok(ControlAction::Statistics),
            "" => Err(ControlError::missing("action")),
            other => Err(ControlError::invalid(
                "action",
                format!("unknown action '{other}'"),
            )),
        }
    }
}

///
/// [`ControlMessage`] is a subscribe, unsubscribe, or query request for one channel.
///
/// Every surface form (structured, headers, JSON body, control URI) is decoded into
/// this type before the control handler acts on it.
///
/// # Examples
///
/// ```
/// use dynamic_router::{ControlAction, ControlMessage};
///
/// let request = ControlMessage::subscribe("numbers")
///     .with_subscription_id("even")
///     .with_destination_uri("mock:even")
///     .with_priority(2)
///     .with_predicate("${body} regex '\\d*[02468]'");
///
/// assert_eq!(request.action, Some(ControlAction::Subscribe));
/// assert_eq!(request.priority, Some(2));
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ControlMessage {
    #[serde(default)]
    pub action: Option<ControlAction>,
    #[serde(default, alias = "subscribeChannel")]
    pub channel: Option<String>,
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub destination_uri: Option<String>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub predicate: Option<String>,
    #[serde(default)]
    pub expression_language: Option<String>,
    #[serde(default)]
    pub predicate_bean: Option<String>,
    /// Replace an existing subscription with the same id. Defaults to `true`.
    #[serde(default)]
    pub update: Option<bool>,
    #[serde(skip)]
    pub predicate_instance: Option<PredicateRef>,
}

impl ControlMessage {
    pub fn new(action: ControlAction, channel: impl Into<String>) -> Self {
        Self {
            action: Some(action),
            channel: Some(channel.into()),
            ..Default::default()
        }
    }

    pub fn subscribe(channel: impl Into<String>) -> Self {
        Self::new(ControlAction::Subscribe, channel)
    }

    pub fn unsubscribe(channel: impl Into<String>, subscription_id: impl Into<String>) -> Self {
        Self::new(ControlAction::Unsubscribe, channel).with_subscription_id(subscription_id)
    }

    pub fn list(channel: impl Into<String>) -> Self {
        Self::new(ControlAction::List, channel)
    }

    pub fn statistics(channel: impl Into<String>) -> Self {
        Self::new(ControlAction::Statistics, channel)
    }

    pub fn with_subscription_id(mut self, subscription_id: impl Into<String>) -> Self {
        self.subscription_id = Some(subscription_id.into());
        self
    }

    pub fn with_destination_uri(mut self, destination_uri: impl Into<String>) -> Self {
        self.destination_uri = Some(destination_uri.into());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_predicate(mut self, expression: impl Into<String>) -> Self {
        self.predicate = Some(expression.into());
        self
    }

    pub fn with_expression_language(mut self, language: impl Into<String>) -> Self {
        self.expression_language = Some(language.into());
        self
    }

    pub fn with_predicate_bean(mut self, bean: impl Into<String>) -> Self {
        self.predicate_bean = Some(bean.into());
        self
    }

    pub fn with_predicate_instance(mut self, predicate: Arc<dyn Predicate>) -> Self {
        self.predicate_instance = Some(PredicateRef(predicate));
        self
    }

    pub fn with_update(mut self, update: bool) -> Self {
        self.update = Some(update);
        self
    }

    /// Decodes a JSON control body.
    pub fn from_json(body: &str) -> Result<Self, ControlError> {
        serde_json::from_str(body).map_err(|err| ControlError::invalid("body", err.to_string()))
    }

    /// Decodes the `DynamicRouter*` control headers of a message.
    pub fn from_headers(message: &Message) -> Result<Self, ControlError> {
        let header = |name: &str| message.header(name).map(str::to_string);

        let action = header(headers::CONTROL_ACTION)
            .ok_or_else(|| ControlError::missing("action"))?
            .parse()?;
        let priority = header(headers::CONTROL_PRIORITY)
            .map(|value| parse_priority(&value))
            .transpose()?;
        let update = header(headers::CONTROL_UPDATE)
            .map(|value| parse_flag("update", &value))
            .transpose()?;

        Ok(Self {
            action: Some(action),
            channel: header(headers::CONTROL_SUBSCRIBE_CHANNEL),
            subscription_id: header(headers::CONTROL_SUBSCRIPTION_ID),
            destination_uri: header(headers::CONTROL_DESTINATION_URI),
            priority,
            predicate: header(headers::CONTROL_PREDICATE),
            expression_language: header(headers::CONTROL_EXPRESSION_LANGUAGE),
            predicate_bean: header(headers::CONTROL_PREDICATE_BEAN),
            update,
            predicate_instance: None,
        })
    }
}

pub(crate) fn parse_priority(value: &str) -> Result<i32, ControlError> {
    value
        .trim()
        .parse()
        .map_err(|_| ControlError::invalid("priority", format!("'{value}' is not an integer")))
}

pub(crate) fn parse_flag(field: &'static str, value: &str) -> Result<bool, ControlError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ControlError::invalid(
            field,
            format!("'{value}' is not true or false"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::{ControlAction, ControlError, ControlMessage};
    use crate::message::{headers, Message};

    #[test]
    fn actions_parse_case_insensitively() {
        assert_eq!(
            "SUBSCRIBE".parse::<ControlAction>(),
            Ok(ControlAction::Subscribe)
        );
        assert_eq!(
            " statistics ".parse::<ControlAction>(),
            Ok(ControlAction::Statistics)
        );
        assert!(matches!(
            "publish".parse::<ControlAction>(),
            Err(ControlError::InvalidControlRequest { field: "action", .. })
        ));
    }

    #[test]
    fn headers_decode_into_a_request() {
        let message = Message::new("")
            .with_header(headers::CONTROL_ACTION, "subscribe")
            .with_header(headers::CONTROL_SUBSCRIBE_CHANNEL, "numbers")
            .with_header(headers::CONTROL_SUBSCRIPTION_ID, "even")
            .with_header(headers::CONTROL_DESTINATION_URI, "mock:even")
            .with_header(headers::CONTROL_PRIORITY, "2")
            .with_header(headers::CONTROL_PREDICATE, "${body} regex '\\d*[02468]'")
            .with_header(headers::CONTROL_UPDATE, "false");

        let request = ControlMessage::from_headers(&message).unwrap();

        assert_eq!(request.action, Some(ControlAction::Subscribe));
        assert_eq!(request.channel.as_deref(), Some("numbers"));
        assert_eq!(request.priority, Some(2));
        assert_eq!(request.update, Some(false));
        assert!(request.expression_language.is_none());
    }

    #[test]
    fn bad_header_priority_names_the_field() {
        let message = Message::new("")
            .with_header(headers::CONTROL_ACTION, "subscribe")
            .with_header(headers::CONTROL_PRIORITY, "high");

        assert!(matches!(
            ControlMessage::from_headers(&message),
            Err(ControlError::InvalidControlRequest {
                field: "priority",
                ..
            })
        ));
    }

    #[test]
    fn json_body_uses_camel_case_and_accepts_the_channel_alias() {
        let request = ControlMessage::from_json(
            r#"{"action":"unsubscribe","subscribeChannel":"numbers","subscriptionId":"odd"}"#,
        )
        .unwrap();

        assert_eq!(request.action, Some(ControlAction::Unsubscribe));
        assert_eq!(request.channel.as_deref(), Some("numbers"));
        assert_eq!(request.subscription_id.as_deref(), Some("odd"));
    }

    #[test]
    fn json_body_rejects_unknown_fields() {
        assert!(matches!(
            ControlMessage::from_json(r#"{"action":"list","channel":"n","colour":"red"}"#),
            Err(ControlError::InvalidControlRequest { field: "body", .. })
        ));
    }
}
