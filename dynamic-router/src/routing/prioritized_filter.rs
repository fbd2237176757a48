//! Subscription records and their total `(priority, id)` order.

use crate::message::Message;
use crate::routing::filter_statistics::{FilterStatisticsSnapshot, PrioritizedFilterStatistics};
use crate::routing::predicate::{Predicate, PredicateError};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Input for a registry insert. Validated by the registry, which also assigns an id
/// when none is supplied.
#[derive(Clone, Default)]
pub struct FilterRegistration {
    pub channel: String,
    pub id: Option<String>,
    pub priority: i32,
    pub destination_uri: String,
    pub predicate: Option<Arc<dyn Predicate>>,
    pub description: String,
}

impl Debug for FilterRegistration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterRegistration")
            .field("channel", &self.channel)
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("destination_uri", &self.destination_uri)
            .field("has_predicate", &self.predicate.is_some())
            .field("description", &self.description)
            .finish()
    }
}

/// One subscriber's routing rule on a channel.
///
/// Lower `priority` values take precedence; equal priorities fall back to the id in
/// ascending byte order, so every channel has a deterministic evaluation order.
pub struct PrioritizedFilter {
    id: String,
    channel: String,
    priority: i32,
    destination_uri: String,
    predicate: Arc<dyn Predicate>,
    description: String,
    statistics: PrioritizedFilterStatistics,
}

impl PrioritizedFilter {
    pub(crate) fn new(
        id: String,
        channel: String,
        priority: i32,
        destination_uri: String,
        predicate: Arc<dyn Predicate>,
        description: String,
    ) -> Self {
        Self {
            id,
            channel,
            priority,
            destination_uri,
            predicate,
            description,
            statistics: PrioritizedFilterStatistics::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn destination_uri(&self) -> &str {
        &self.destination_uri
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn statistics(&self) -> &PrioritizedFilterStatistics {
        &self.statistics
    }

    pub fn matches(&self, message: &Message) -> Result<bool, PredicateError> {
        self.predicate.matches(message)
    }

    pub fn view(&self) -> FilterView {
        FilterView {
            id: self.id.clone(),
            channel: self.channel.clone(),
            priority: self.priority,
            destination_uri: self.destination_uri.clone(),
            predicate: self.description.clone(),
        }
    }

    pub fn statistics_snapshot(&self) -> FilterStatisticsSnapshot {
        self.statistics.snapshot(&self.id)
    }

    fn sort_key(&self) -> (i32, &str, &str) {
        (self.priority, self.id.as_str(), self.channel.as_str())
    }
}

impl Debug for PrioritizedFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrioritizedFilter")
            .field("id", &self.id)
            .field("channel", &self.channel)
            .field("priority", &self.priority)
            .field("destination_uri", &self.destination_uri)
            .field("predicate", &self.description)
            .finish()
    }
}

impl PartialEq for PrioritizedFilter {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for PrioritizedFilter {}

impl PartialOrd for PrioritizedFilter {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PrioritizedFilter {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// Serializable description of a registered filter.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterView {
    pub id: String,
    pub channel: String,
    pub priority: i32,
    pub destination_uri: String,
    pub predicate: String,
}
