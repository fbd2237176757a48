//! Management layer.
//!
//! Exposes the subscriptions of a router and their statistics as serializable
//! attributes, and subscribe/unsubscribe operations that share the control-plane
//! path with every other control surface.

pub(crate) mod management_facade;
