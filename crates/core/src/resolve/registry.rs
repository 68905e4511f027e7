//! Resolver registry.

use std::sync::Arc;

use super::resolver::SourceResolver;
use crate::process::SourceType;

/// Collection of registered source resolvers, looked up by source type.
#[derive(Default)]
pub struct ResolverRegistry {
    resolvers: Vec<Arc<dyn SourceResolver>>,
}

impl ResolverRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resolver.
    pub fn register<R: SourceResolver + 'static>(&mut self, resolver: R) {
        self.resolvers.push(Arc::new(resolver));
    }

    /// Register a resolver wrapped in `Arc`.
    pub fn register_arc(&mut self, resolver: Arc<dyn SourceResolver>) {
        self.resolvers.push(resolver);
    }

    /// Find the resolver handling the given source type.
    #[must_use]
    pub fn find_for(&self, source_type: SourceType) -> Option<&Arc<dyn SourceResolver>> {
        self.resolvers.iter().find(|r| r.can_handle(source_type))
    }

    /// Number of registered resolvers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Names of all registered resolvers.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }
}

impl std::fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverRegistry")
            .field("resolvers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformTag;
    use crate::process::ProcessSpec;
    use crate::resolve::Resolution;
    use crate::state::SharedState;
    use async_trait::async_trait;
    use std::path::Path;

    struct StubResolver {
        name: &'static str,
        handles: SourceType,
    }

    #[async_trait]
    impl SourceResolver for StubResolver {
        fn name(&self) -> &'static str {
            self.name
        }

        fn can_handle(&self, source_type: SourceType) -> bool {
            source_type == self.handles
        }

        async fn resolve(
            &self,
            _spec: &ProcessSpec,
            _platform: PlatformTag,
            _install_dir: &Path,
            _state: &SharedState,
        ) -> crate::Result<Resolution> {
            Ok(Resolution::fetched("stub"))
        }
    }

    #[test]
    fn dispatches_by_source_type() {
        let mut registry = ResolverRegistry::new();
        registry.register(StubResolver {
            name: "github",
            handles: SourceType::Github,
        });
        registry.register(StubResolver {
            name: "local",
            handles: SourceType::Local,
        });

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.find_for(SourceType::Github).unwrap().name(),
            "github"
        );
        assert_eq!(
            registry.find_for(SourceType::Local).unwrap().name(),
            "local"
        );
    }

    #[test]
    fn empty_registry_finds_nothing() {
        let registry = ResolverRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.find_for(SourceType::Github).is_none());
    }
}
