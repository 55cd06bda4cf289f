//! Builds a formation reflecting the actual running state of a host.

use crate::container::ContainerSet;
use crate::error::Result;
use crate::formation::{Formation, Host};
use crate::gateway::Gateway;
use log::debug;
use std::sync::Arc;

pub struct FormationIntrospector<'a, G> {
    gateway: &'a G,
    containers: Arc<ContainerSet>,
}

impl<'a, G: Gateway> FormationIntrospector<'a, G> {
    pub fn new(gateway: &'a G, containers: Arc<ContainerSet>) -> Self {
        Self {
            gateway,
            containers,
        }
    }

    /// Snapshots the currently running instances on the host, matched
    /// against the known definitions. Running containers without a
    /// definition are left alone. Gateway failures propagate unmodified;
    /// retries, if any, belong to the gateway.
    pub async fn introspect(&self, host: &Host) -> Result<Formation> {
        let images = self.gateway.available_images().await?;
        let running = self.gateway.running_containers().await?;
        let mut formation = Formation::new(host.clone(), self.containers.clone(), images);
        for container in running {
            match self.containers.id_of(&container.name) {
                Ok(id) => formation.insert_instance(id),
                Err(_) => debug!("ignoring unmanaged container `{}`", container.name),
            }
        }
        debug!(
            "introspected {} running instances on `{}`",
            formation.len(),
            host.name()
        );
        Ok(formation)
    }
}
