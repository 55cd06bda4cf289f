//! The formation: desired or observed container instances for one host.

use crate::container::{ContainerId, ContainerSet};
use crate::error::{BayError, Result};
use log::debug;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

/// A target docker daemon. Hosts without a URL use the local daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    name: String,
    url: Option<String>,
}

impl Host {
    pub fn new(name: impl Into<String>, url: Option<String>) -> Self {
        Self {
            name: name.into(),
            url,
        }
    }

    pub fn default_host() -> Self {
        Self::new("default", None)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

/// A runtime binding of a container definition to the formation's host.
/// `foreground` and `command` are the only mutable overrides.
#[derive(Debug, Clone)]
pub struct Instance {
    pub container: ContainerId,
    pub name: String,
    pub image: String,
    pub system: bool,
    pub foreground: bool,
    pub command: Option<Vec<String>>,
}

impl Instance {
    fn from_definition(id: ContainerId, containers: &ContainerSet) -> Self {
        let definition = containers.get(id);
        Self {
            container: id,
            name: definition.name.clone(),
            image: definition.image.clone(),
            system: definition.system,
            foreground: false,
            command: None,
        }
    }
}

/// An ordered collection of instances for one host, along with the image
/// catalog the host reported at introspection time. Rebuilt fresh at the
/// start of every command; nothing survives across invocations.
#[derive(Debug, Clone)]
pub struct Formation {
    host: Host,
    containers: Arc<ContainerSet>,
    images: HashSet<String>,
    instances: BTreeMap<ContainerId, Instance>,
}

impl Formation {
    pub fn new(host: Host, containers: Arc<ContainerSet>, images: HashSet<String>) -> Self {
        Self {
            host,
            containers,
            images,
            instances: BTreeMap::new(),
        }
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn container_set(&self) -> &Arc<ContainerSet> {
        &self.containers
    }

    /// Adds the container and its full link closure as instances.
    ///
    /// Every image in the closure is verified before anything is added, so a
    /// missing image leaves the formation untouched. A missing image of a
    /// linked dependency carries the requested container's name so the
    /// message can point at the right definition.
    pub fn add_container(&mut self, name: &str) -> Result<ContainerId> {
        let id = self.containers.id_of(name)?;
        let closure = self.containers.link_closure(id);
        for &member in &closure {
            let definition = self.containers.get(member);
            if !self.images.contains(&definition.image) {
                return Err(BayError::ImageNotFound {
                    image: definition.image.clone(),
                    dependent: (member != id).then(|| name.to_string()),
                });
            }
        }
        for &member in &closure {
            self.insert_instance(member);
        }
        Ok(id)
    }

    /// Removes the instance together with every instance that transitively
    /// links to it, keeping the dependency closure consistent. Removing an
    /// id that is already gone is a no-op.
    pub fn remove_instance(&mut self, id: ContainerId) {
        if self.instances.remove(&id).is_none() {
            debug!(
                "instance `{}` already removed, skipping",
                self.containers.get(id).name
            );
            return;
        }
        for dependent in self.containers.dependents_of(id) {
            if self.instances.remove(&dependent).is_some() {
                debug!(
                    "removed `{}`, which links to `{}`",
                    self.containers.get(dependent).name,
                    self.containers.get(id).name
                );
            }
        }
    }

    /// Inserts an instance for an already-verified or observed container.
    /// Existing instances keep their overrides.
    pub fn insert_instance(&mut self, id: ContainerId) {
        self.instances
            .entry(id)
            .or_insert_with(|| Instance::from_definition(id, &self.containers));
    }

    pub fn contains(&self, id: ContainerId) -> bool {
        self.instances.contains_key(&id)
    }

    pub fn get(&self, id: ContainerId) -> Option<&Instance> {
        self.instances.get(&id)
    }

    pub fn get_mut(&mut self, id: ContainerId) -> Option<&mut Instance> {
        self.instances.get_mut(&id)
    }

    pub fn instances(&self) -> impl Iterator<Item = &Instance> {
        self.instances.values()
    }

    pub fn instance_ids(&self) -> BTreeSet<ContainerId> {
        self.instances.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
