//! Declared-dependency access for a resolving component.
//!
//! # Responsibilities
//! - Resolve every declared requirement before construction returns
//! - Restrict lookups to the declared names
//!
//! # Design Decisions
//! - Construction is synchronous and recursive: requirements of
//!   requirements resolve first
//! - Lookups go through the shared registry cache, but only for names the
//!   owner declared

use std::sync::Arc;

use crate::components::registry::Registry;
use crate::components::{downcast, ComponentError, Resolved};
use crate::config::AppConfig;

/// The resolved requirements of one component.
pub struct Requirements<'a> {
    registry: &'a Registry,
    declared: Vec<String>,
}

impl<'a> Requirements<'a> {
    /// Resolve `names` in `registry`; returns once every name is cached.
    pub fn new<I, S>(registry: &'a Registry, names: I) -> Result<Self, ComponentError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut stack = Vec::new();
        Self::with_stack(
            registry,
            names.into_iter().map(Into::into).collect(),
            &mut stack,
        )
    }

    pub(crate) fn with_stack(
        registry: &'a Registry,
        declared: Vec<String>,
        stack: &mut Vec<String>,
    ) -> Result<Self, ComponentError> {
        for name in &declared {
            registry.resolve_with_stack(name, stack)?;
        }
        Ok(Self { registry, declared })
    }

    /// Value of a declared requirement.
    pub fn get(&self, name: &str) -> Result<Resolved, ComponentError> {
        if !self.declared.iter().any(|n| n == name) {
            return Err(ComponentError::Undeclared {
                name: name.to_string(),
                declared: self.declared.clone(),
            });
        }
        self.registry.get(name)
    }

    /// Value of a declared requirement, downcast to `T`.
    pub fn get_as<T>(&self, name: &str) -> Result<Arc<T>, ComponentError>
    where
        T: Send + Sync + 'static,
    {
        downcast(name, self.get(name)?)
    }

    /// Configuration the owning component resolves against.
    pub fn config(&self) -> &Arc<AppConfig> {
        self.registry.config()
    }

    /// Declared names, in declaration order.
    pub fn names(&self) -> &[String] {
        &self.declared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn registry() -> Registry {
        Registry::new(Arc::new(AppConfig::default()))
    }

    #[test]
    fn test_construction_resolves_everything() {
        let registry = registry();
        registry.register_fn("a", Vec::<String>::new(), |_| Ok(Arc::new("a") as Resolved));
        registry.register_fn("b", Vec::<String>::new(), |_| Ok(Arc::new("b") as Resolved));
        registry.register_fn("unrelated", Vec::<String>::new(), |_| Ok(Arc::new(()) as Resolved));

        let deps = Requirements::new(&registry, ["a", "b"]).unwrap();

        assert!(registry.is_resolved("a"));
        assert!(registry.is_resolved("b"));
        assert!(!registry.is_resolved("unrelated"));
        assert_eq!(deps.names(), ["a".to_string(), "b".to_string()]);
        assert_eq!(*deps.get_as::<&'static str>("b").unwrap(), "b");
    }

    #[test]
    fn test_lookup_is_strict() {
        let registry = registry();
        registry.register_fn("a", Vec::<String>::new(), |_| Ok(Arc::new(1u8) as Resolved));
        registry.register_fn("b", Vec::<String>::new(), |_| Ok(Arc::new(2u8) as Resolved));
        registry.resolve(["b"]).unwrap();

        let deps = Requirements::new(&registry, ["a"]).unwrap();
        let err = deps.get("b").unwrap_err();
        assert!(matches!(err, ComponentError::Undeclared { ref name, .. } if name == "b"));
    }

    #[test]
    fn test_nested_requirements_inside_resolve() {
        let registry = registry();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        registry.register_fn("settings", Vec::<String>::new(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(String::from("postgres://")) as Resolved)
        });
        registry.register_fn("persistence", ["settings"], |deps| {
            let url = deps.get_as::<String>("settings")?;
            Ok(Arc::new(format!("pool({url})")) as Resolved)
        });
        registry.register_fn("repo", ["persistence", "settings"], |deps| {
            let pool = deps.get_as::<String>("persistence")?;
            Ok(Arc::new(format!("repo[{pool}]")) as Resolved)
        });

        let deps = Requirements::new(&registry, ["repo"]).unwrap();
        assert_eq!(*deps.get_as::<String>("repo").unwrap(), "repo[pool(postgres://)]");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_requirement_fails_construction() {
        let registry = registry();
        let err = Requirements::new(&registry, ["nope"]).err().unwrap();
        assert!(matches!(err, ComponentError::NotRegistered { .. }));
    }
}
