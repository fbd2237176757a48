//! Management view of one router: read-only attributes plus subscribe/unsubscribe
//! operations that go through the control handler.

use crate::control_plane::control_handler::ControlChannelHandler;
use crate::control_plane::control_message::{ControlError, ControlMessage};
use crate::routing::filter_statistics::FilterStatisticsSnapshot;
use crate::routing::predicate::Predicate;
use crate::routing::prioritized_filter::FilterView;
use crate::routing::subscriptions_registry::SubscriptionsRegistry;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Channel name to filters in precedence order.
pub type SubscriptionsMap = BTreeMap<String, Vec<FilterView>>;

/// Channel name to per-filter statistics in precedence order.
pub type SubscriptionsStatisticsMap = BTreeMap<String, Vec<FilterStatisticsSnapshot>>;

/// Both maps serialize to JSON through `serde_json::to_value`.
pub struct DynamicRouterManagement {
    handler: Arc<ControlChannelHandler>,
    registry: Arc<SubscriptionsRegistry>,
}

impl DynamicRouterManagement {
    pub(crate) fn new(
        handler: Arc<ControlChannelHandler>,
        registry: Arc<SubscriptionsRegistry>,
    ) -> Self {
        Self { handler, registry }
    }

    pub fn subscriptions_map(&self) -> SubscriptionsMap {
        self.registry
            .all()
            .into_iter()
            .map(|(channel, filters)| {
                let views = filters.iter().map(|filter| filter.view()).collect();
                (channel, views)
            })
            .collect()
    }

    pub fn subscriptions_statistics_map(&self) -> SubscriptionsStatisticsMap {
        self.registry
            .all()
            .into_iter()
            .map(|(channel, filters)| {
                let statistics = filters
                    .iter()
                    .map(|filter| filter.statistics_snapshot())
                    .collect();
                (channel, statistics)
            })
            .collect()
    }

    /// Subscribes with an expression in `language`. `update = false` rejects an id
    /// that is already subscribed on the channel.
    #[allow(clippy::too_many_arguments)]
    pub fn subscribe_with_predicate_expression(
        &self,
        channel: &str,
        subscription_id: Option<&str>,
        destination_uri: &str,
        priority: i32,
        expression: &str,
        language: &str,
        update: bool,
    ) -> Result<String, ControlError> {
        let request = base_request(channel, subscription_id, destination_uri, priority, update)
            .with_predicate(expression)
            .with_expression_language(language);
        self.handler.subscribe(request)
    }

    pub fn subscribe_with_predicate_bean(
        &self,
        channel: &str,
        subscription_id: Option<&str>,
        destination_uri: &str,
        priority: i32,
        bean_name: &str,
        update: bool,
    ) -> Result<String, ControlError> {
        let request = base_request(channel, subscription_id, destination_uri, priority, update)
            .with_predicate_bean(bean_name);
        self.handler.subscribe(request)
    }

    pub fn subscribe_with_predicate_instance(
        &self,
        channel: &str,
        subscription_id: Option<&str>,
        destination_uri: &str,
        priority: i32,
        predicate: Arc<dyn Predicate>,
        update: bool,
    ) -> Result<String, ControlError> {
        let request = base_request(channel, subscription_id, destination_uri, priority, update)
            .with_predicate_instance(predicate);
        self.handler.subscribe(request)
    }

    pub fn remove_subscription(
        &self,
        channel: &str,
        subscription_id: &str,
    ) -> Result<bool, ControlError> {
        self.handler
            .unsubscribe(ControlMessage::unsubscribe(channel, subscription_id))
    }
}

fn base_request(
    channel: &str,
    subscription_id: Option<&str>,
    destination_uri: &str,
    priority: i32,
    update: bool,
) -> ControlMessage {
    let request = ControlMessage::subscribe(channel)
        .with_destination_uri(destination_uri)
        .with_priority(priority)
        .with_update(update);
    match subscription_id {
        Some(id) => request.with_subscription_id(id),
        None => request,
    }
}

#[cfg(test)]
mod tests {
    use super::DynamicRouterManagement;
    use crate::control_plane::control_handler::ControlChannelHandler;
    use crate::control_plane::control_message::ControlError;
    use crate::routing::predicate::{predicate_fn, ConstantPredicate};
    use crate::routing::predicate_bean_registry::PredicateBeanRegistry;
    use crate::routing::subscriptions_registry::SubscriptionsRegistry;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn management() -> DynamicRouterManagement {
        let registry = Arc::new(SubscriptionsRegistry::new());
        let beans = Arc::new(PredicateBeanRegistry::default());
        beans.register("yes", Arc::new(ConstantPredicate(true)));
        let handler = Arc::new(ControlChannelHandler::new(
            registry.clone(),
            beans,
            i32::MAX,
            Arc::new(AtomicBool::new(true)),
        ));
        DynamicRouterManagement::new(handler, registry)
    }

    #[test]
    fn every_operation_is_reflected_in_the_maps() {
        let management = management();

        management
            .subscribe_with_predicate_expression(
                "numbers",
                Some("odd"),
                "mock:odd",
                2,
                "${body} regex '\\d*[13579]'",
                "simple",
                true,
            )
            .unwrap();
        management
            .subscribe_with_predicate_bean("numbers", Some("all"), "mock:all", 1, "yes", true)
            .unwrap();
        let generated = management
            .subscribe_with_predicate_instance(
                "letters",
                None,
                "mock:letters",
                0,
                predicate_fn(|m| m.body().chars().all(char::is_alphabetic)),
                true,
            )
            .unwrap();

        let map = management.subscriptions_map();
        let numbers: Vec<&str> = map["numbers"].iter().map(|view| view.id.as_str()).collect();
        assert_eq!(numbers, vec!["all", "odd"]);
        assert_eq!(map["letters"][0].id, generated);
        assert_eq!(map["letters"][0].predicate, "predicate instance");

        let statistics = management.subscriptions_statistics_map();
        assert_eq!(statistics["numbers"].len(), 2);
        assert_eq!(statistics["numbers"][0].count, 0);

        assert_eq!(management.remove_subscription("numbers", "odd"), Ok(true));
        assert_eq!(management.remove_subscription("numbers", "odd"), Ok(false));
        assert_eq!(management.subscriptions_map()["numbers"].len(), 1);
    }

    #[test]
    fn update_false_keeps_the_existing_subscription() {
        let management = management();
        management
            .subscribe_with_predicate_bean("numbers", Some("all"), "mock:first", 1, "yes", false)
            .unwrap();

        let duplicate = management.subscribe_with_predicate_bean(
            "numbers",
            Some("all"),
            "mock:second",
            1,
            "yes",
            false,
        );

        assert!(matches!(duplicate, Err(ControlError::Subscription(_))));
        assert_eq!(
            management.subscriptions_map()["numbers"][0].destination_uri,
            "mock:first"
        );
    }

    #[test]
    fn maps_serialize_to_json() {
        let management = management();
        management
            .subscribe_with_predicate_bean("numbers", Some("all"), "mock:all", 1, "yes", true)
            .unwrap();

        let json = serde_json::to_value(management.subscriptions_map()).unwrap();

        assert_eq!(json["numbers"][0]["destinationUri"], "mock:all");
    }
}
