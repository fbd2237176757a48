//! Canonical structured event names used across `dynamic-router`.

// Registry events.
pub const SUBSCRIPTION_ADDED: &str = "subscription_added";
pub const SUBSCRIPTION_REPLACED: &str = "subscription_replaced";
pub const SUBSCRIPTION_REJECTED: &str = "subscription_rejected";
pub const SUBSCRIPTION_REMOVED: &str = "subscription_removed";
pub const SUBSCRIPTION_REMOVE_MISSING: &str = "subscription_remove_missing";
pub const SUBSCRIPTIONS_CLEARED: &str = "subscriptions_cleared";
pub const SUBSCRIPTION_HANDLE_RELEASED: &str = "subscription_handle_released";

// Control-plane events.
pub const CONTROL_REQUEST_RECEIVE: &str = "control_request_receive";
pub const CONTROL_REQUEST_OK: &str = "control_request_ok";
pub const CONTROL_REQUEST_FAILED: &str = "control_request_failed";
pub const PREDICATE_BEAN_REGISTERED: &str = "predicate_bean_registered";
pub const PREDICATE_BEAN_UNREGISTERED: &str = "predicate_bean_unregistered";

// Data-plane events.
pub const ROUTE_RECEIVE: &str = "route_receive";
pub const ROUTE_FILTER_MATCHED: &str = "route_filter_matched";
pub const ROUTE_DISPATCH: &str = "route_dispatch";
pub const ROUTE_PREDICATE_FAILED: &str = "route_predicate_failed";
pub const ROUTE_UNMATCHED_DROPPED: &str = "route_unmatched_dropped";
pub const ROUTE_UNMATCHED_DEFAULT: &str = "route_unmatched_default";
pub const ROUTE_UNMATCHED_FAILED: &str = "route_unmatched_failed";
pub const ROUTE_ENDPOINT_SKIPPED: &str = "route_endpoint_skipped";
pub const FORWARD_SEND_ATTEMPT: &str = "forward_send_attempt";
pub const FORWARD_SEND_OK: &str = "forward_send_ok";
pub const FORWARD_SEND_FAILED: &str = "forward_send_failed";
pub const LOG_ENDPOINT_MESSAGE: &str = "log_endpoint_message";

// Service lifecycle events.
pub const ROUTER_START: &str = "router_start";
pub const ROUTER_STOP: &str = "router_stop";
pub const ROUTER_NOT_STARTED: &str = "router_not_started";
