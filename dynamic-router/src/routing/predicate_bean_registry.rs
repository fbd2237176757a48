//! Named predicate instances that control requests can reference by bean name.

use crate::observability::events;
use crate::routing::predicate::Predicate;
use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

const COMPONENT: &str = "predicate_bean_registry";

type BeanMap = HashMap<String, Arc<dyn Predicate>>;

#[derive(Default)]
pub struct PredicateBeanRegistry {
    beans: ArcSwap<BeanMap>,
}

impl PredicateBeanRegistry {
    /// Registers a predicate under `name`, returning any predicate it replaced.
    pub fn register(
        &self,
        name: impl Into<String>,
        predicate: Arc<dyn Predicate>,
    ) -> Option<Arc<dyn Predicate>> {
        let name = name.into();
        let previous = self.beans.rcu(|current| {
            let mut next = BeanMap::clone(current);
            next.insert(name.clone(), predicate.clone());
            next
        });

        debug!(
            event = events::PREDICATE_BEAN_REGISTERED,
            component = COMPONENT,
            bean = name.as_str(),
            "predicate bean registered"
        );
        previous.get(&name).cloned()
    }

    /// Removes a bean. Filters already resolved from it keep their predicate.
    pub fn unregister(&self, name: &str) -> bool {
        let previous = self.beans.rcu(|current| {
            let mut next = BeanMap::clone(current);
            next.remove(name);
            next
        });
        let removed = previous.contains_key(name);

        if removed {
            debug!(
                event = events::PREDICATE_BEAN_UNREGISTERED,
                component = COMPONENT,
                bean = name,
                "predicate bean unregistered"
            );
        }
        removed
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Predicate>> {
        self.beans.load().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.beans.load().keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::PredicateBeanRegistry;
    use crate::message::Message;
    use crate::routing::predicate::ConstantPredicate;
    use std::sync::Arc;

    #[test]
    fn register_replaces_and_returns_previous_bean() {
        let beans = PredicateBeanRegistry::default();

        assert!(beans
            .register("flag", Arc::new(ConstantPredicate(false)))
            .is_none());
        let previous = beans
            .register("flag", Arc::new(ConstantPredicate(true)))
            .expect("first bean should be returned");

        assert!(!previous.matches(&Message::new("x")).unwrap());
        let current = beans.lookup("flag").expect("bean should resolve");
        assert!(current.matches(&Message::new("x")).unwrap());
    }

    #[test]
    fn unregister_reports_presence() {
        let beans = PredicateBeanRegistry::default();
        beans.register("b", Arc::new(ConstantPredicate(true)));
        beans.register("a", Arc::new(ConstantPredicate(true)));

        assert_eq!(beans.names(), vec!["a".to_string(), "b".to_string()]);
        assert!(beans.unregister("a"));
        assert!(!beans.unregister("a"));
        assert!(beans.lookup("a").is_none());
    }
}
