//! Reconciles a target formation against the observed state of a host.

use crate::error::Result;
use crate::formation::Formation;
use crate::gateway::Gateway;
use futures_util::future::try_join_all;
use log::info;
use std::collections::BTreeSet;

/// Progress handle for one reconciliation run. Finishing with a "Done"
/// status is the only state the runner mutates beyond the formation itself.
#[derive(Debug)]
pub struct Task {
    name: String,
    status: String,
    done: bool,
}

impl Task {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: "Pending".to_string(),
            done: false,
        }
    }

    pub fn update(&mut self, status: impl Into<String>) {
        self.status = status.into();
        info!("{}: {}", self.name, self.status);
    }

    pub fn finish(&mut self) {
        self.done = true;
        self.update("Done");
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn status(&self) -> &str {
        &self.status
    }
}

pub struct FormationRunner<'a, G> {
    gateway: &'a G,
}

impl<'a, G: Gateway> FormationRunner<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }

    /// Issues the stop and start operations that take `actual` to `target`.
    ///
    /// Stops run first, dependents before the containers they link to;
    /// starts follow, dependencies first. Within one dependency layer the
    /// operations run concurrently and the whole layer is awaited before the
    /// next begins. A failure aborts the remaining layers; containers
    /// already started stay running so their logs can be inspected.
    pub async fn run_formation(
        &self,
        actual: &Formation,
        target: &Formation,
        task: &mut Task,
    ) -> Result<()> {
        let containers = target.container_set();
        let actual_ids = actual.instance_ids();
        let target_ids = target.instance_ids();
        let to_stop: BTreeSet<_> = actual_ids.difference(&target_ids).copied().collect();
        let to_start: BTreeSet<_> = target_ids.difference(&actual_ids).copied().collect();

        // Any cycle is fatal before a single operation goes out.
        let stop_layers = containers.topo_layers(&actual_ids)?;
        let start_layers = containers.topo_layers(&target_ids)?;

        if !to_stop.is_empty() {
            task.update("Stopping");
        }
        for layer in stop_layers.iter().rev() {
            let mut ops = Vec::new();
            for id in layer {
                if !to_stop.contains(id) {
                    continue;
                }
                let name = containers.get(*id).name.clone();
                ops.push(async move {
                    info!("stopping `{name}`");
                    self.gateway.stop_instance(&name).await
                });
            }
            try_join_all(ops).await?;
        }

        if !to_start.is_empty() {
            task.update("Starting");
        }
        for layer in &start_layers {
            let mut ops = Vec::new();
            for id in layer {
                if !to_start.contains(id) {
                    continue;
                }
                let Some(instance) = target.get(*id) else {
                    continue;
                };
                ops.push(async move {
                    info!("starting `{}`", instance.name);
                    self.gateway.start_instance(instance).await
                });
            }
            try_join_all(ops).await?;
        }

        task.finish();
        Ok(())
    }
}
