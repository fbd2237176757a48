//! Destination URI resolution for forwarded messages.

use crate::endpoint::{Endpoint, ForwardingError, LogEndpoint, MessageSender};
use crate::message::Message;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

type EndpointMap = HashMap<String, Arc<dyn Endpoint>>;

/// Scheme served by [`LogEndpoint`] on every registry.
pub const LOG_SCHEME: &str = "log";

/// Maps destination URIs to endpoints.
///
/// Exact URI registrations win over scheme registrations; the scheme is the part of
/// the URI before the first `:`.
pub struct EndpointRegistry {
    by_uri: ArcSwap<EndpointMap>,
    by_scheme: ArcSwap<EndpointMap>,
}

impl Default for EndpointRegistry {
    fn default() -> Self {
        let mut schemes = EndpointMap::new();
        schemes.insert(LOG_SCHEME.to_string(), Arc::new(LogEndpoint));
        Self {
            by_uri: ArcSwap::from_pointee(EndpointMap::new()),
            by_scheme: ArcSwap::from_pointee(schemes),
        }
    }
}

impl EndpointRegistry {
    pub fn register(
        &self,
        uri: impl Into<String>,
        endpoint: Arc<dyn Endpoint>,
    ) -> Option<Arc<dyn Endpoint>> {
        insert(&self.by_uri, uri.into(), endpoint)
    }

    pub fn register_scheme(
        &self,
        scheme: impl Into<String>,
        endpoint: Arc<dyn Endpoint>,
    ) -> Option<Arc<dyn Endpoint>> {
        insert(&self.by_scheme, scheme.into(), endpoint)
    }

    pub fn unregister(&self, uri: &str) -> bool {
        let previous = self.by_uri.rcu(|current| {
            let mut next = EndpointMap::clone(current);
            next.remove(uri);
            next
        });
        previous.contains_key(uri)
    }

    pub fn resolve(&self, uri: &str) -> Option<Arc<dyn Endpoint>> {
        if let Some(endpoint) = self.by_uri.load().get(uri) {
            return Some(endpoint.clone());
        }
        let (scheme, _) = uri.split_once(':')?;
        self.by_scheme.load().get(scheme).cloned()
    }

    /// Exactly registered URIs, sorted.
    pub fn uris(&self) -> Vec<String> {
        let mut uris: Vec<String> = self.by_uri.load().keys().cloned().collect();
        uris.sort();
        uris
    }
}

fn insert(
    map: &ArcSwap<EndpointMap>,
    key: String,
    endpoint: Arc<dyn Endpoint>,
) -> Option<Arc<dyn Endpoint>> {
    let previous = map.rcu(|current| {
        let mut next = EndpointMap::clone(current);
        next.insert(key.clone(), endpoint.clone());
        next
    });
    previous.get(&key).cloned()
}

#[async_trait]
impl MessageSender for EndpointRegistry {
    async fn send(&self, destination_uri: &str, message: Message) -> Result<(), ForwardingError> {
        let endpoint = self
            .resolve(destination_uri)
            .ok_or_else(|| ForwardingError::UnknownEndpoint {
                uri: destination_uri.to_string(),
            })?;
        endpoint.send(destination_uri, message).await
    }

    fn can_resolve(&self, destination_uri: &str) -> bool {
        self.resolve(destination_uri).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::EndpointRegistry;
    use crate::endpoint::{Endpoint, ForwardingError, MessageSender};
    use crate::message::Message;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Counting(AtomicUsize);

    #[async_trait]
    impl Endpoint for Counting {
        async fn send(&self, _uri: &str, _message: Message) -> Result<(), ForwardingError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn exact_uri_wins_over_scheme() {
        let registry = EndpointRegistry::default();
        let exact = Arc::new(Counting::default());
        let scheme = Arc::new(Counting::default());
        registry.register("mock:even", exact.clone());
        registry.register_scheme("mock", scheme.clone());

        registry.send("mock:even", Message::new("2")).await.unwrap();
        registry.send("mock:odd", Message::new("3")).await.unwrap();

        assert_eq!(exact.0.load(Ordering::SeqCst), 1);
        assert_eq!(scheme.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn log_scheme_is_built_in_and_unknown_uris_fail() {
        let registry = EndpointRegistry::default();

        assert!(registry.can_resolve("log:DynamicRouter:numbers"));
        assert!(!registry.can_resolve("mock:missing"));
        assert!(!registry.can_resolve("no-scheme"));
        assert_eq!(
            registry.send("mock:missing", Message::new("1")).await,
            Err(ForwardingError::UnknownEndpoint {
                uri: "mock:missing".to_string()
            })
        );
    }

    #[test]
    fn unregister_reports_presence() {
        let registry = EndpointRegistry::default();
        registry.register("mock:a", Arc::new(Counting::default()));

        assert_eq!(registry.uris(), vec!["mock:a".to_string()]);
        assert!(registry.unregister("mock:a"));
        assert!(!registry.unregister("mock:a"));
    }
}
