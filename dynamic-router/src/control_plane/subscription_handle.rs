//! Subscriptions tied to the lifetime of a consumer.

use crate::observability::events;
use crate::routing::subscriptions_registry::SubscriptionsRegistry;
use std::sync::Weak;
use tracing::debug;

const COMPONENT: &str = "subscription_handle";

/// Removes its subscription when dropped, unless [`detach`](Self::detach)ed.
///
/// The handle does not keep the registry alive; dropping it after the router is gone
/// is a no-op.
#[derive(Debug)]
pub struct SubscriptionHandle {
    registry: Weak<SubscriptionsRegistry>,
    channel: String,
    subscription_id: String,
    detached: bool,
}

impl SubscriptionHandle {
    pub(crate) fn new(
        registry: Weak<SubscriptionsRegistry>,
        channel: String,
        subscription_id: String,
    ) -> Self {
        Self {
            registry,
            channel,
            subscription_id,
            detached: false,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Keeps the subscription registered past the handle and returns its id.
    pub fn detach(mut self) -> String {
        self.detached = true;
        std::mem::take(&mut self.subscription_id)
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if self.detached {
            return;
        }
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let removed = registry.unsubscribe(&self.channel, &self.subscription_id);
        debug!(
            event = events::SUBSCRIPTION_HANDLE_RELEASED,
            component = COMPONENT,
            channel = self.channel.as_str(),
            filter_id = self.subscription_id.as_str(),
            removed,
            "subscription handle released"
        );
    }
}
