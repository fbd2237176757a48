//! `dynamic-router-control:` URI decoding.
//!
//! Form: `dynamic-router-control:<action>/<channel>?subscriptionId=..&destinationUri=..`
//! with optional `priority`, `predicate`, `expressionLanguage`, `predicateBean` and
//! `update` parameters. Values are percent-decoded; `+` is kept literally so regular
//! expressions survive unescaped.

use crate::control_plane::control_message::{
    parse_flag, parse_priority, ControlError, ControlMessage,
};

pub const CONTROL_SCHEME: &str = "dynamic-router-control";

pub fn parse_control_uri(uri: &str) -> Result<ControlMessage, ControlError> {
    let rest = uri
        .trim()
        .strip_prefix(CONTROL_SCHEME)
        .and_then(|rest| rest.strip_prefix(':'))
        .ok_or_else(|| {
            ControlError::invalid(
                "uri",
                format!("expected '{CONTROL_SCHEME}:<action>/<channel>', got '{uri}'"),
            )
        })?;
    let rest = rest.trim_start_matches('/');

    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, query),
        None => (rest, ""),
    };
    let (action, channel) = path
        .split_once('/')
        .ok_or_else(|| ControlError::missing("channel"))?;

    let mut request = ControlMessage {
        action: Some(action.parse()?),
        channel: Some(decode("channel", channel)?),
        ..Default::default()
    };

    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        match key {
            "subscriptionId" => request.subscription_id = Some(decode("subscriptionId", value)?),
            "destinationUri" => request.destination_uri = Some(decode("destinationUri", value)?),
            "priority" => request.priority = Some(parse_priority(&decode("priority", value)?)?),
            "predicate" => request.predicate = Some(decode("predicate", value)?),
            "expressionLanguage" => {
                request.expression_language = Some(decode("expressionLanguage", value)?)
            }
            "predicateBean" => request.predicate_bean = Some(decode("predicateBean", value)?),
            "update" => request.update = Some(parse_flag("update", &decode("update", value)?)?),
            other => {
                return Err(ControlError::invalid(
                    "uri",
                    format!("unknown parameter '{other}'"),
                ))
            }
        }
    }

    Ok(request)
}

fn decode(field: &'static str, value: &str) -> Result<String, ControlError> {
    urlencoding::decode(value)
        .map(|decoded| decoded.into_owned())
        .map_err(|err| ControlError::invalid(field, err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::parse_control_uri;
    use crate::control_plane::control_message::{ControlAction, ControlError};

    #[test]
    fn subscribe_uri_decodes_every_parameter() {
        let request = parse_control_uri(
            "dynamic-router-control:subscribe/numbers?subscriptionId=even\
             &destinationUri=mock%3Aeven&priority=-2\
             &predicate=%24%7Bbody%7D%20regex%20%27%5Cd+%27\
             &expressionLanguage=simple&update=false",
        )
        .unwrap();

        assert_eq!(request.action, Some(ControlAction::Subscribe));
        assert_eq!(request.channel.as_deref(), Some("numbers"));
        assert_eq!(request.subscription_id.as_deref(), Some("even"));
        assert_eq!(request.destination_uri.as_deref(), Some("mock:even"));
        assert_eq!(request.priority, Some(-2));
        assert_eq!(request.predicate.as_deref(), Some("${body} regex '\\d+'"));
        assert_eq!(request.expression_language.as_deref(), Some("simple"));
        assert_eq!(request.update, Some(false));
    }

    #[test]
    fn double_slash_form_is_accepted() {
        let request =
            parse_control_uri("dynamic-router-control://unsubscribe/numbers?subscriptionId=odd")
                .unwrap();

        assert_eq!(request.action, Some(ControlAction::Unsubscribe));
        assert_eq!(request.subscription_id.as_deref(), Some("odd"));
    }

    #[test]
    fn malformed_uris_name_the_offending_field() {
        let field_of = |uri: &str| match parse_control_uri(uri) {
            Err(ControlError::InvalidControlRequest { field, .. }) => field,
            other => panic!("expected an invalid request for {uri}, got {other:?}"),
        };

        assert_eq!(field_of("mock:subscribe/numbers"), "uri");
        assert_eq!(field_of("dynamic-router-control:subscribe"), "channel");
        assert_eq!(field_of("dynamic-router-control:publish/numbers"), "action");
        assert_eq!(
            field_of("dynamic-router-control:subscribe/numbers?priority=high"),
            "priority"
        );
        assert_eq!(
            field_of("dynamic-router-control:subscribe/numbers?colour=red"),
            "uri"
        );
    }
}
