//! Data-plane layer.
//!
//! Evaluates a channel's filters for each message and forwards it through the
//! `send(destinationUri, message)` capability, applying the configured recipient
//! mode, unmatched policy, send timeout and error handling.
//!
//! ```
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use dynamic_router::{DynamicRouter, DynamicRouterConfig, Endpoint, ForwardingError, Message};
//!
//! struct Discard;
//!
//! #[async_trait]
//! impl Endpoint for Discard {
//!     async fn send(&self, _uri: &str, _message: Message) -> Result<(), ForwardingError> {
//!         Ok(())
//!     }
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let router = DynamicRouter::new("data-plane-doc", DynamicRouterConfig::default());
//! router
//!     .endpoints()
//!     .unwrap()
//!     .register("mock:discard", Arc::new(Discard));
//! router.start();
//! router
//!     .control_uri(
//!         "dynamic-router-control:subscribe/numbers?subscriptionId=all\
//!          &destinationUri=mock:discard&predicate=true&expressionLanguage=constant",
//!         None,
//!     )
//!     .unwrap();
//!
//! let outcome = router.route("numbers", Message::new("7")).await.unwrap();
//! assert_eq!(outcome.delivered[0].destination_uri, "mock:discard");
//! # });
//! ```

pub(crate) mod endpoint_registry;
pub(crate) mod routing_processor;
