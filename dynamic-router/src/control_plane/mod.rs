//! Control-plane layer.
//!
//! Decodes subscribe, unsubscribe and query requests from every surface form
//! (structured [`ControlMessage`](crate::ControlMessage), `DynamicRouter*` headers,
//! JSON bodies and `dynamic-router-control:` URIs) and applies them to the
//! subscriptions registry. Each mutation is all-or-nothing.
//!
//! ```
//! use dynamic_router::{ControlMessage, ControlReply, DynamicRouter, DynamicRouterConfig};
//!
//! let router = DynamicRouter::new("control-plane-doc", DynamicRouterConfig::default());
//! router.start();
//!
//! // Both forms land in the same handler.
//! router
//!     .control(
//!         ControlMessage::subscribe("numbers")
//!             .with_subscription_id("all")
//!             .with_destination_uri("log:all")
//!             .with_predicate("true")
//!             .with_expression_language("constant"),
//!     )
//!     .unwrap();
//! let reply = router
//!     .control_uri("dynamic-router-control:unsubscribe/numbers?subscriptionId=all", None)
//!     .unwrap();
//! assert_eq!(reply, ControlReply::Unsubscribed(true));
//! ```

pub(crate) mod control_handler;
pub(crate) mod control_message;
pub(crate) mod control_uri;
pub(crate) mod subscription_handle;
