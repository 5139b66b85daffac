use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use super::AuthenticationLogFactory;
use crate::error::{AuthLogError, Result};

/// Lookup table from kind to factory
///
/// The index is built on the first lookup and reused afterwards, so
/// `supports()` is called once per factory for the lifetime of the registry.
/// Concurrent first lookups converge on a single build.
pub struct FactoryRegistry {
    factories: Vec<Arc<dyn AuthenticationLogFactory>>,
    factory_map: OnceLock<HashMap<String, Arc<dyn AuthenticationLogFactory>>>,
}

impl FactoryRegistry {
    pub fn new(factories: Vec<Arc<dyn AuthenticationLogFactory>>) -> Self {
        FactoryRegistry {
            factories,
            factory_map: OnceLock::new(),
        }
    }

    /// Resolve the factory registered for `kind`
    pub fn create_from(&self, kind: &str) -> Result<Arc<dyn AuthenticationLogFactory>> {
        self.factory_map
            .get_or_init(|| self.build_factory_map())
            .get(kind)
            .cloned()
            .ok_or_else(|| AuthLogError::FactoryNotFound(kind.to_string()))
    }

    /// Registered kinds, sorted
    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self
            .factory_map
            .get_or_init(|| self.build_factory_map())
            .keys()
            .cloned()
            .collect();
        kinds.sort();
        kinds
    }

    fn build_factory_map(&self) -> HashMap<String, Arc<dyn AuthenticationLogFactory>> {
        let mut map = HashMap::with_capacity(self.factories.len());
        for factory in &self.factories {
            let kind = factory.supports().to_string();
            // Last registration wins
            if map.insert(kind.clone(), Arc::clone(factory)).is_some() {
                log::warn!("Duplicate authentication log factory for kind '{}'", kind);
            }
        }
        log::debug!("Indexed {} authentication log factories", map.len());
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFactory {
        kind: String,
        supports_calls: AtomicUsize,
    }

    impl CountingFactory {
        fn new(kind: &str) -> Arc<Self> {
            Arc::new(CountingFactory {
                kind: kind.to_string(),
                supports_calls: AtomicUsize::new(0),
            })
        }
    }

    impl AuthenticationLogFactory for CountingFactory {
        fn supports(&self) -> &str {
            self.supports_calls.fetch_add(1, Ordering::SeqCst);
            &self.kind
        }
    }

    fn registry_of(factories: &[Arc<CountingFactory>]) -> FactoryRegistry {
        FactoryRegistry::new(
            factories
                .iter()
                .map(|f| Arc::clone(f) as Arc<dyn AuthenticationLogFactory>)
                .collect(),
        )
    }

    #[test]
    fn test_create_from_returns_correct_factory() {
        let type1 = CountingFactory::new("type1");
        let type2 = CountingFactory::new("type2");
        let registry = registry_of(&[type1.clone(), type2.clone()]);

        let result = registry.create_from("type2").unwrap();
        assert_eq!(result.supports(), "type2");

        let result = registry.create_from("type1").unwrap();
        assert_eq!(result.supports(), "type1");
    }

    #[test]
    fn test_create_from_fails_when_factory_not_found() {
        let registry = registry_of(&[CountingFactory::new("type1")]);

        let err = registry.create_from("unknown").err().unwrap();
        assert!(matches!(err, AuthLogError::FactoryNotFound(ref kind) if kind == "unknown"));
        assert_eq!(
            err.to_string(),
            "There is no authentication log factory available named unknown"
        );
    }

    #[test]
    fn test_create_from_caches_factory_map() {
        let type1 = CountingFactory::new("type1");
        let type2 = CountingFactory::new("type2");
        let registry = registry_of(&[type1.clone(), type2.clone()]);

        registry.create_from("type1").unwrap();
        assert_eq!(type1.supports_calls.load(Ordering::SeqCst), 1);
        assert_eq!(type2.supports_calls.load(Ordering::SeqCst), 1);

        for _ in 0..10 {
            registry.create_from("type1").unwrap();
            let _ = registry.create_from("missing");
        }

        assert_eq!(type1.supports_calls.load(Ordering::SeqCst), 1);
        assert_eq!(type2.supports_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_registry_builds_once() {
        let registry = FactoryRegistry::new(Vec::new());
        assert!(registry.create_from("any").is_err());
        assert!(registry.create_from("any").is_err());
        assert!(registry.kinds().is_empty());
    }

    #[test]
    fn test_duplicate_kind_last_registration_wins() {
        let first = CountingFactory::new("account");
        let second = CountingFactory::new("account");
        let registry = registry_of(&[first.clone(), second.clone()]);

        let resolved = registry.create_from("account").unwrap();
        let expected: Arc<dyn AuthenticationLogFactory> = second.clone();
        assert!(Arc::ptr_eq(&resolved, &expected));
        assert_eq!(registry.kinds(), vec!["account".to_string()]);
    }

    #[test]
    fn test_concurrent_first_lookups_build_once() {
        let type1 = CountingFactory::new("type1");
        let registry = Arc::new(registry_of(&[type1.clone()]));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.create_from("type1").is_ok())
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(type1.supports_calls.load(Ordering::SeqCst), 1);
    }
}
