use dynamic_router::{DynamicRouter, DynamicRouterConfig, EndpointRegistry, Message, RoutingOutcome};
use integration_test_utils::{init_logging, number_messages, RecordingEndpoint};
use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;

#[allow(dead_code)]
pub(crate) const CHANNEL: &str = "test";

/// The router's own endpoint registry.
pub(crate) fn endpoints_of(router: &DynamicRouter) -> &EndpointRegistry {
    router
        .endpoints()
        .expect("router should own an endpoint registry")
}

/// Started router with one [`RecordingEndpoint`] per `mock:<name>` destination.
pub(crate) fn make_router(
    name: &str,
    config: DynamicRouterConfig,
    mocks: &[&str],
) -> (DynamicRouter, BTreeMap<String, Arc<RecordingEndpoint>>) {
    init_logging();
    let router = DynamicRouter::new(name, config);
    let mut recorders = BTreeMap::new();
    for mock in mocks {
        let endpoint = Arc::new(RecordingEndpoint::new());
        endpoints_of(&router).register(format!("mock:{mock}"), endpoint.clone());
        recorders.insert(mock.to_string(), endpoint);
    }
    assert!(router.start());
    (router, recorders)
}

#[allow(dead_code)]
pub(crate) fn subscribe_expression(
    router: &DynamicRouter,
    id: &str,
    priority: i32,
    mock: &str,
    expression: &str,
) {
    router
        .management()
        .subscribe_with_predicate_expression(
            CHANNEL,
            Some(id),
            &format!("mock:{mock}"),
            priority,
            expression,
            "simple",
            true,
        )
        .expect("subscribe should succeed");
}

#[allow(dead_code)]
pub(crate) async fn send_numbers(
    router: &DynamicRouter,
    numbers: Range<u64>,
) -> Vec<RoutingOutcome> {
    let mut outcomes = Vec::new();
    for message in number_messages(numbers) {
        outcomes.push(route_ok(router, message).await);
    }
    outcomes
}

#[allow(dead_code)]
pub(crate) async fn route_ok(router: &DynamicRouter, message: Message) -> RoutingOutcome {
    router
        .route(CHANNEL, message)
        .await
        .expect("routing should succeed")
}

#[allow(dead_code)]
pub(crate) fn bodies(numbers: impl IntoIterator<Item = u64>) -> Vec<String> {
    numbers.into_iter().map(|number| number.to_string()).collect()
}

#[allow(dead_code)]
pub(crate) fn filter_ids(router: &DynamicRouter, channel: &str) -> Vec<String> {
    router
        .subscriptions()
        .snapshot(channel)
        .iter()
        .map(|filter| filter.id().to_string())
        .collect()
}
