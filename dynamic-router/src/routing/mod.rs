//! Routing and subscription layer.
//!
//! Holds the per-channel prioritized filters, the predicates they evaluate, and the
//! statistics recorded when a filter forwards a message. Filters are ordered by
//! `(priority, id)`; lower priorities win and the id breaks ties, so overlapping
//! predicates of the same priority resolve deterministically but should not be
//! relied on to express intent.
//!
//! ```
//! use dynamic_router::{ControlMessage, DynamicRouter, DynamicRouterConfig};
//!
//! let router = DynamicRouter::new("routing-doc", DynamicRouterConfig::default());
//! router.start();
//!
//! for (id, priority) in [("odd", 2), ("even", 2), ("all", 1)] {
//!     router
//!         .control(
//!             ControlMessage::subscribe("numbers")
//!                 .with_subscription_id(id)
//!                 .with_destination_uri(format!("log:{id}"))
//!                 .with_priority(priority)
//!                 .with_predicate("true")
//!                 .with_expression_language("constant"),
//!         )
//!         .unwrap();
//! }
//!
//! let order: Vec<String> = router
//!     .subscriptions()
//!     .snapshot("numbers")
//!     .iter()
//!     .map(|filter| filter.id().to_string())
//!     .collect();
//! assert_eq!(order, vec!["all", "even", "odd"]);
//! ```

pub(crate) mod expression;
pub(crate) mod filter_statistics;
pub(crate) mod predicate;
pub(crate) mod predicate_bean_registry;
pub(crate) mod prioritized_filter;
pub(crate) mod subscriptions_registry;
