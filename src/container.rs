//! Container definitions and the link graph between them.
//!
//! Definitions are immutable once loaded from configuration. The
//! [`ContainerSet`] arena indexes them by stable [`ContainerId`]s and keeps
//! the link relation as adjacency lists so dependency closures and layered
//! topological orders never recurse over the object graph.

use crate::error::{BayError, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Stable index of a container inside a [`ContainerSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(usize);

/// An immutable container definition. `links` names the containers this one
/// depends on; `system` marks infrastructure containers that blanket
/// stop-all operations leave alone.
#[derive(Debug, Clone)]
pub struct Container {
    pub name: String,
    pub image: String,
    pub system: bool,
    pub links: Vec<String>,
}

#[derive(Debug)]
pub struct ContainerSet {
    containers: Vec<Container>,
    by_name: HashMap<String, ContainerId>,
    links: Vec<Vec<ContainerId>>,
    linked_by: Vec<Vec<ContainerId>>,
}

impl ContainerSet {
    /// Builds the arena, resolving every link to an id. Duplicate names and
    /// links to undefined containers are configuration errors.
    pub fn new(containers: Vec<Container>) -> Result<Self> {
        let mut by_name = HashMap::new();
        for (index, container) in containers.iter().enumerate() {
            if by_name
                .insert(container.name.clone(), ContainerId(index))
                .is_some()
            {
                return Err(BayError::Config(format!(
                    "duplicate container `{}`",
                    container.name
                )));
            }
        }
        let mut links = vec![Vec::new(); containers.len()];
        let mut linked_by = vec![Vec::new(); containers.len()];
        for (index, container) in containers.iter().enumerate() {
            for target in &container.links {
                let Some(&dependency) = by_name.get(target.as_str()) else {
                    return Err(BayError::Config(format!(
                        "container `{}` links to undefined container `{}`",
                        container.name, target
                    )));
                };
                links[index].push(dependency);
                linked_by[dependency.0].push(ContainerId(index));
            }
        }
        Ok(Self {
            containers,
            by_name,
            links,
            linked_by,
        })
    }

    pub fn get(&self, id: ContainerId) -> &Container {
        &self.containers[id.0]
    }

    pub fn id_of(&self, name: &str) -> Result<ContainerId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| BayError::UnknownContainer(name.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = ContainerId> + '_ {
        (0..self.containers.len()).map(ContainerId)
    }

    /// The container plus everything it transitively links to. The requested
    /// id comes first; the traversal tolerates cycles.
    pub fn link_closure(&self, id: ContainerId) -> Vec<ContainerId> {
        self.walk(id, &self.links)
    }

    /// Every container that transitively links to `id`, excluding `id`.
    pub fn dependents_of(&self, id: ContainerId) -> Vec<ContainerId> {
        self.walk(id, &self.linked_by)
            .into_iter()
            .filter(|&dependent| dependent != id)
            .collect()
    }

    fn walk(&self, start: ContainerId, edges: &[Vec<ContainerId>]) -> Vec<ContainerId> {
        let mut seen = BTreeSet::from([start]);
        let mut queue = vec![start];
        let mut order = Vec::new();
        while let Some(id) = queue.pop() {
            order.push(id);
            for &next in &edges[id.0] {
                if seen.insert(next) {
                    queue.push(next);
                }
            }
        }
        order
    }

    /// Layered topological order over the link relation restricted to `ids`:
    /// every container in a layer only links to containers in earlier
    /// layers. A cycle is a fatal configuration error.
    pub fn topo_layers(&self, ids: &BTreeSet<ContainerId>) -> Result<Vec<Vec<ContainerId>>> {
        let mut pending: BTreeMap<ContainerId, usize> = ids
            .iter()
            .map(|&id| {
                let in_scope = self.links[id.0]
                    .iter()
                    .filter(|dependency| ids.contains(dependency))
                    .count();
                (id, in_scope)
            })
            .collect();
        let mut layers = Vec::new();
        while !pending.is_empty() {
            let layer: Vec<ContainerId> = pending
                .iter()
                .filter(|&(_, &unmet)| unmet == 0)
                .map(|(&id, _)| id)
                .collect();
            if layer.is_empty() {
                let Some((&stuck, _)) = pending.iter().next() else {
                    break;
                };
                return Err(BayError::LinkCycle(self.get(stuck).name.clone()));
            }
            for &id in &layer {
                pending.remove(&id);
                for dependent in &self.linked_by[id.0] {
                    if let Some(unmet) = pending.get_mut(dependent) {
                        *unmet -= 1;
                    }
                }
            }
            layers.push(layer);
        }
        Ok(layers)
    }
}
