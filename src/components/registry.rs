//! Named component registry and resolved-value cache.
//!
//! # Responsibilities
//! - Map dotted names to component implementations
//! - Resolve a name at most once and cache the value
//! - Report lookups of unresolved names with the keys that are resolved
//!
//! # Design Decisions
//! - Both maps are `DashMap`; readers never block each other
//! - Re-registration is allowed, last writer wins
//! - Two threads racing on a first resolution may both compute; the first
//!   insert wins and both receive the cached value

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;

use crate::components::requirements::Requirements;
use crate::components::{downcast, Component, ComponentError, FnComponent, Resolved};
use crate::config::AppConfig;

/// Registry of named components shared by one application.
pub struct Registry {
    config: Arc<AppConfig>,
    components: DashMap<String, Arc<dyn Component>>,
    resolved: DashMap<String, Resolved>,
}

impl Registry {
    /// Create an empty registry resolving against `config`.
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            config,
            components: DashMap::new(),
            resolved: DashMap::new(),
        }
    }

    /// Configuration every component resolves against.
    pub fn config(&self) -> &Arc<AppConfig> {
        &self.config
    }

    /// Register `component` under `name`, replacing any previous registration.
    pub fn register(&self, name: impl Into<String>, component: impl Component) {
        self.register_arc(name, Arc::new(component));
    }

    /// Register an already shared component.
    pub fn register_arc(&self, name: impl Into<String>, component: Arc<dyn Component>) {
        let name = name.into();
        if self.components.insert(name.clone(), component).is_some() {
            tracing::warn!(component = %name, "Component re-registered, replacing previous");
        } else {
            tracing::debug!(component = %name, "Component registered");
        }
    }

    /// Register a closure as a component.
    pub fn register_fn<I, S, F>(&self, name: impl Into<String>, requires: I, resolve: F)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Requirements<'_>) -> Result<Resolved, ComponentError> + Send + Sync + 'static,
    {
        self.register(name, FnComponent::new(requires, resolve));
    }

    /// Resolve every name in order, skipping names already cached.
    pub fn resolve<I, S>(&self, names: I) -> Result<(), ComponentError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut stack = Vec::new();
        for name in names {
            self.resolve_with_stack(name.as_ref(), &mut stack)?;
        }
        Ok(())
    }

    /// Resolve every registered name equal to `prefix` or below `prefix.`.
    ///
    /// Returns the resolved names, sorted.
    pub fn resolve_group(&self, prefix: &str) -> Result<Vec<String>, ComponentError> {
        let names = self.group_names(prefix);
        self.resolve(&names)?;
        Ok(names)
    }

    /// Registered names in `prefix`'s group, sorted.
    pub fn group_names(&self, prefix: &str) -> Vec<String> {
        let nested = format!("{prefix}.");
        let mut names: Vec<String> = self
            .components
            .iter()
            .map(|entry| entry.key().clone())
            .filter(|name| name == prefix || name.starts_with(&nested))
            .collect();
        names.sort();
        names
    }

    pub(crate) fn resolve_with_stack(
        &self,
        name: &str,
        stack: &mut Vec<String>,
    ) -> Result<Resolved, ComponentError> {
        if let Some(value) = self.resolved.get(name) {
            return Ok(value.value().clone());
        }

        if let Some(pos) = stack.iter().position(|n| n == name) {
            let mut path = stack[pos..].to_vec();
            path.push(name.to_string());
            return Err(ComponentError::Cycle { path });
        }

        let component = self
            .components
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ComponentError::NotRegistered {
                name: name.to_string(),
            })?;

        let start = Instant::now();
        stack.push(name.to_string());
        let result = Self::invoke(self, component.as_ref(), stack);
        stack.pop();
        let value = result?;

        let cached = self
            .resolved
            .entry(name.to_string())
            .or_insert(value)
            .value()
            .clone();

        tracing::debug!(
            component = %name,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Component resolved"
        );
        Ok(cached)
    }

    fn invoke(
        registry: &Registry,
        component: &dyn Component,
        stack: &mut Vec<String>,
    ) -> Result<Resolved, ComponentError> {
        let deps = Requirements::with_stack(registry, component.requires(), stack)?;
        component.resolve(&deps)
    }

    /// Cached value for `name`.
    pub fn get(&self, name: &str) -> Result<Resolved, ComponentError> {
        self.resolved
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ComponentError::NotResolved {
                name: name.to_string(),
                resolved: self.resolved_keys(),
            })
    }

    /// Cached value for `name`, downcast to `T`.
    pub fn get_as<T>(&self, name: &str) -> Result<Arc<T>, ComponentError>
    where
        T: Send + Sync + 'static,
    {
        downcast(name, self.get(name)?)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    pub fn is_resolved(&self, name: &str) -> bool {
        self.resolved.contains_key(name)
    }

    /// Requirements declared by a registered component.
    pub fn requirements_of(&self, name: &str) -> Option<Vec<String>> {
        self.components.get(name).map(|entry| entry.value().requires())
    }

    /// Every registered name, sorted.
    pub fn registered_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.components.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Every resolved name, sorted.
    pub fn resolved_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.resolved.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }
}
