//! Boot-time dependency container.
//!
//! # Responsibilities
//! - Check the whole component graph before anything resolves
//! - Compute a deterministic resolution order
//! - Freeze resolved values behind typed accessors
//!
//! # Design Decisions
//! - Dependencies first, in each dependent's declared order
//! - Components nothing depends on are walked first, by name
//! - A missing requirement or a cycle fails boot, no partial container

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::components::registry::Registry;
use crate::components::{downcast, ComponentError, Resolved};

/// Immutable snapshot of every resolved component.
#[derive(Clone)]
pub struct Container {
    values: Arc<HashMap<String, Resolved>>,
    order: Arc<Vec<String>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

impl Container {
    /// Resolve every component registered in `registry` in dependency order.
    pub fn boot(registry: &Registry) -> Result<Self, ComponentError> {
        let order = resolution_order(registry)?;
        tracing::debug!(components = order.len(), "Component graph checked");

        registry.resolve(&order)?;

        let values = order
            .iter()
            .map(|name| Ok((name.clone(), registry.get(name)?)))
            .collect::<Result<HashMap<_, _>, ComponentError>>()?;

        tracing::info!(order = ?order, "Components resolved");
        Ok(Self {
            values: Arc::new(values),
            order: Arc::new(order),
        })
    }

    pub fn get(&self, name: &str) -> Result<Resolved, ComponentError> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| ComponentError::NotResolved {
                name: name.to_string(),
                resolved: self.order.to_vec(),
            })
    }

    /// Typed lookup.
    pub fn get_as<T>(&self, name: &str) -> Result<Arc<T>, ComponentError>
    where
        T: Send + Sync + 'static,
    {
        downcast(name, self.get(name)?)
    }

    /// Every value below `prefix.`, in resolution order.
    pub fn group<T>(&self, prefix: &str) -> Result<Vec<(String, Arc<T>)>, ComponentError>
    where
        T: Send + Sync + 'static,
    {
        let nested = format!("{prefix}.");
        self.order
            .iter()
            .filter(|name| name.starts_with(&nested))
            .map(|name| Ok((name.clone(), self.get_as::<T>(name)?)))
            .collect()
    }

    /// Component names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.order.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Names in the order they were resolved.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

/// Topological order of every registered component.
pub fn resolution_order(registry: &Registry) -> Result<Vec<String>, ComponentError> {
    let mut graph: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for name in registry.registered_names() {
        let requires = registry.requirements_of(&name).unwrap_or_default();
        for requirement in &requires {
            if !registry.is_registered(requirement) {
                return Err(ComponentError::MissingDependency {
                    component: name.clone(),
                    requirement: requirement.clone(),
                });
            }
        }
        graph.insert(name, requires);
    }

    let required: HashSet<&String> = graph.values().flatten().collect();
    let roots = graph.keys().filter(|name| !required.contains(name));

    let mut marks: HashMap<String, Mark> = HashMap::new();
    let mut order = Vec::with_capacity(graph.len());
    let mut path = Vec::new();
    // Whatever is left after the roots only sits on cycles.
    for name in roots.chain(graph.keys()) {
        visit(name, &graph, &mut marks, &mut path, &mut order)?;
    }
    Ok(order)
}

fn visit(
    name: &str,
    graph: &BTreeMap<String, Vec<String>>,
    marks: &mut HashMap<String, Mark>,
    path: &mut Vec<String>,
    order: &mut Vec<String>,
) -> Result<(), ComponentError> {
    match marks.get(name) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            let start = path.iter().position(|n| n == name).unwrap_or(0);
            let mut cycle = path[start..].to_vec();
            cycle.push(name.to_string());
            return Err(ComponentError::Cycle { path: cycle });
        }
        None => {}
    }

    marks.insert(name.to_string(), Mark::Visiting);
    path.push(name.to_string());

    for requirement in graph.get(name).into_iter().flatten() {
        visit(requirement, graph, marks, path, order)?;
    }

    path.pop();
    marks.insert(name.to_string(), Mark::Done);
    order.push(name.to_string());
    Ok(())
}
