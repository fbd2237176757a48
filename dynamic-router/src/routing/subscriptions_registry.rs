//! Channel-partitioned subscription registry.
//!
//! Readers load an immutable snapshot and never block; writers publish a new snapshot
//! with a compare-and-swap loop, so a reader sees a mutation entirely or not at all.

use arc_swap::ArcSwap;
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::observability::events;
use crate::routing::prioritized_filter::{FilterRegistration, PrioritizedFilter};

const COMPONENT: &str = "subscriptions_registry";

/// Filters of one channel, highest precedence first.
pub type FilterSnapshot = Arc<Vec<Arc<PrioritizedFilter>>>;

/// Failures for registry inserts.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SubscriptionError {
    InvalidSubscription { field: &'static str },
    SubscriptionExists { channel: String, id: String },
}

impl Display for SubscriptionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionError::InvalidSubscription { field } => {
                write!(f, "invalid subscription: missing or empty {field}")
            }
            SubscriptionError::SubscriptionExists { channel, id } => {
                write!(f, "subscription '{id}' already exists on channel '{channel}'")
            }
        }
    }
}

impl Error for SubscriptionError {}

struct RegistrySnapshot {
    version: u64,
    channels: HashMap<String, FilterSnapshot>,
}

pub struct SubscriptionsRegistry {
    snapshot: ArcSwap<RegistrySnapshot>,
}

impl Default for SubscriptionsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionsRegistry {
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(RegistrySnapshot {
                version: 0,
                channels: HashMap::new(),
            }),
        }
    }

    /// Inserts a filter, replacing any filter with the same id on the channel.
    /// Returns the effective id.
    pub fn subscribe(&self, registration: FilterRegistration) -> Result<String, SubscriptionError> {
        self.insert(registration, true)
    }

    /// Inserts a filter only when its id is not yet taken on the channel.
    pub fn add(&self, registration: FilterRegistration) -> Result<String, SubscriptionError> {
        self.insert(registration, false)
    }

    /// Removes one filter. Returns `true` only when it was present.
    pub fn unsubscribe(&self, channel: &str, id: &str) -> bool {
        let mut removed = false;
        let mut version = 0;

        self.snapshot.rcu(|current| {
            removed = false;
            let Some(filters) = current.channels.get(channel) else {
                return Arc::clone(current);
            };
            if !filters.iter().any(|filter| filter.id() == id) {
                return Arc::clone(current);
            }

            removed = true;
            version = current.version + 1;
            let remaining: Vec<Arc<PrioritizedFilter>> = filters
                .iter()
                .filter(|filter| filter.id() != id)
                .cloned()
                .collect();
            let mut channels = current.channels.clone();
            if remaining.is_empty() {
                channels.remove(channel);
            } else {
                channels.insert(channel.to_string(), Arc::new(remaining));
            }
            Arc::new(RegistrySnapshot { version, channels })
        });

        if removed {
            debug!(
                event = events::SUBSCRIPTION_REMOVED,
                component = COMPONENT,
                channel,
                filter_id = id,
                snapshot_version = version,
                "subscription removed"
            );
        } else {
            debug!(
                event = events::SUBSCRIPTION_REMOVE_MISSING,
                component = COMPONENT,
                channel,
                filter_id = id,
                "no subscription to remove"
            );
        }
        removed
    }

    /// Ordered filters of a channel; empty when the channel has no subscribers.
    pub fn snapshot(&self, channel: &str) -> FilterSnapshot {
        self.snapshot_with_version(channel).1
    }

    /// Ordered filters plus the registry version they were taken from.
    pub fn snapshot_with_version(&self, channel: &str) -> (u64, FilterSnapshot) {
        let snapshot = self.snapshot.load();
        let filters = snapshot
            .channels
            .get(channel)
            .cloned()
            .unwrap_or_else(|| Arc::new(Vec::new()));
        (snapshot.version, filters)
    }

    pub fn filter(&self, channel: &str, id: &str) -> Option<Arc<PrioritizedFilter>> {
        self.snapshot
            .load()
            .channels
            .get(channel)
            .and_then(|filters| filters.iter().find(|filter| filter.id() == id).cloned())
    }

    /// Every non-empty channel, sorted by name.
    pub fn channels(&self) -> Vec<String> {
        self.all().into_keys().collect()
    }

    pub fn all(&self) -> BTreeMap<String, FilterSnapshot> {
        self.snapshot
            .load()
            .channels
            .iter()
            .map(|(channel, filters)| (channel.clone(), filters.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot
            .load()
            .channels
            .values()
            .map(|filters| filters.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.load().channels.is_empty()
    }

    /// Drops every subscription. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let previous = self.snapshot.rcu(|current| RegistrySnapshot {
            version: current.version + 1,
            channels: HashMap::new(),
        });
        let removed = previous.channels.values().map(|filters| filters.len()).sum();

        debug!(
            event = events::SUBSCRIPTIONS_CLEARED,
            component = COMPONENT,
            removed,
            "subscriptions cleared"
        );
        removed
    }

    #[cfg(test)]
    pub(crate) fn current_version(&self) -> u64 {
        self.snapshot.load().version
    }

    fn validate(registration: FilterRegistration) -> Result<PrioritizedFilter, SubscriptionError> {
        let channel = registration.channel.trim();
        if channel.is_empty() {
            return Err(SubscriptionError::InvalidSubscription { field: "channel" });
        }
        let destination_uri = registration.destination_uri.trim();
        if destination_uri.is_empty() {
            return Err(SubscriptionError::InvalidSubscription {
                field: "destinationUri",
            });
        }
        let Some(predicate) = registration.predicate else {
            return Err(SubscriptionError::InvalidSubscription { field: "predicate" });
        };
        let id = match registration.id {
            Some(id) if id.trim().is_empty() => {
                return Err(SubscriptionError::InvalidSubscription {
                    field: "subscriptionId",
                })
            }
            Some(id) => id.trim().to_string(),
            None => Uuid::new_v4().hyphenated().to_string(),
        };

        Ok(PrioritizedFilter::new(
            id,
            channel.to_string(),
            registration.priority,
            destination_uri.to_string(),
            predicate,
            registration.description,
        ))
    }

    fn insert(
        &self,
        registration: FilterRegistration,
        replace: bool,
    ) -> Result<String, SubscriptionError> {
        let filter = Arc::new(Self::validate(registration)?);
        let mut existed = false;
        let mut version = 0;

        self.snapshot.rcu(|current| {
            let existing = current.channels.get(filter.channel());
            existed = existing.map_or(false, |filters| {
                filters.iter().any(|other| other.id() == filter.id())
            });
            if existed && !replace {
                return Arc::clone(current);
            }

            version = current.version + 1;
            let mut filters: Vec<Arc<PrioritizedFilter>> = existing
                .map(|filters| {
                    filters
                        .iter()
                        .filter(|other| other.id() != filter.id())
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            let position = filters.partition_point(|other| other.as_ref() < filter.as_ref());
            filters.insert(position, filter.clone());

            let mut channels = current.channels.clone();
            channels.insert(filter.channel().to_string(), Arc::new(filters));
            Arc::new(RegistrySnapshot { version, channels })
        });

        if existed && !replace {
            warn!(
                event = events::SUBSCRIPTION_REJECTED,
                component = COMPONENT,
                channel = filter.channel(),
                filter_id = filter.id(),
                "subscription id already in use"
            );
            return Err(SubscriptionError::SubscriptionExists {
                channel: filter.channel().to_string(),
                id: filter.id().to_string(),
            });
        }

        debug!(
            event = if existed {
                events::SUBSCRIPTION_REPLACED
            } else {
                events::SUBSCRIPTION_ADDED
            },
            component = COMPONENT,
            channel = filter.channel(),
            filter_id = filter.id(),
            priority = filter.priority(),
            destination_uri = filter.destination_uri(),
            snapshot_version = version,
            "subscription stored"
        );
        Ok(filter.id().to_string())
    }
}
