//! Command compositions: introspect, mutate the formation, reconcile.
//!
//! Formation-mutation errors are caught per `add_container` call so one
//! missing image does not suppress reports for the other containers named
//! in the same command; runner errors surface once around the whole
//! reconciliation.

use crate::container::ContainerSet;
use crate::error::{BayError, Result};
use crate::formation::{Formation, Host};
use crate::gateway::Gateway;
use crate::introspect::FormationIntrospector;
use crate::runner::{FormationRunner, Task};
use std::sync::Arc;

pub struct CommandContext<'a, G> {
    pub gateway: &'a G,
    pub containers: Arc<ContainerSet>,
    pub host: Host,
}

impl<'a, G: Gateway> CommandContext<'a, G> {
    async fn introspect(&self) -> Result<Formation> {
        FormationIntrospector::new(self.gateway, self.containers.clone())
            .introspect(&self.host)
            .await
    }

    async fn reconcile(&self, actual: &Formation, target: &Formation, name: &str) -> Result<()> {
        let mut task = Task::new(name);
        FormationRunner::new(self.gateway)
            .run_formation(actual, target, &mut task)
            .await
    }
}

/// Reports an error on stderr, in red.
pub fn report_error(error: &BayError) {
    eprintln!("\x1b[31m{error}\x1b[0m");
}

/// Reports all but the last collected error and returns the last one, so
/// every failure is surfaced exactly once.
fn drain_errors(mut errors: Vec<BayError>) -> Result<()> {
    let Some(last) = errors.pop() else {
        return Ok(());
    };
    for error in errors {
        report_error(&error);
    }
    Err(last)
}

pub async fn run<G: Gateway>(
    ctx: &CommandContext<'_, G>,
    names: &[String],
    tail_boot: bool,
) -> Result<()> {
    if tail_boot && names.len() > 1 {
        return Err(BayError::Usage(
            "--tail only works with a single container".to_string(),
        ));
    }
    let actual = ctx.introspect().await?;
    let mut target = actual.clone();
    let mut errors = Vec::new();
    for name in names {
        if let Err(e) = target.add_container(name) {
            errors.push(e);
        }
    }
    drain_errors(errors)?;
    ctx.reconcile(&actual, &target, "run").await?;
    if tail_boot && let Some(name) = names.first() {
        tail(ctx, name, true).await?;
    }
    Ok(())
}

/// With no names, removes every non-system instance; otherwise removes the
/// named ones. Instances already gone through a dependent's closure are
/// skipped silently.
pub async fn stop<G: Gateway>(ctx: &CommandContext<'_, G>, names: &[String]) -> Result<()> {
    let actual = ctx.introspect().await?;
    let mut target = actual.clone();
    if names.is_empty() {
        let ids: Vec<_> = target
            .instances()
            .filter(|instance| !instance.system)
            .map(|instance| instance.container)
            .collect();
        for id in ids {
            target.remove_instance(id);
        }
    } else {
        for name in names {
            let id = ctx.containers.id_of(name)?;
            target.remove_instance(id);
        }
    }
    ctx.reconcile(&actual, &target, "stop").await
}

pub async fn shell<G: Gateway>(
    ctx: &CommandContext<'_, G>,
    names: &[String],
    command: &[String],
) -> Result<()> {
    if names.len() != 1 {
        return Err(BayError::Usage(
            "shell takes exactly one container".to_string(),
        ));
    }
    let actual = ctx.introspect().await?;
    let mut target = actual.clone();
    let id = target.add_container(&names[0])?;
    if let Some(instance) = target.get_mut(id) {
        instance.foreground = true;
        instance.command = Some(if command.is_empty() {
            vec!["/bin/sh".to_string()]
        } else {
            command.to_vec()
        });
    }
    ctx.reconcile(&actual, &target, "shell").await?;
    ctx.gateway.attach_instance(&names[0]).await
}

/// Purely `stop` followed by `run`, or by `up` when no containers are named.
pub async fn restart<G: Gateway>(ctx: &CommandContext<'_, G>, names: &[String]) -> Result<()> {
    stop(ctx, names).await?;
    if names.is_empty() {
        up(ctx).await
    } else {
        run(ctx, names, false).await
    }
}

/// Reconciles towards every defined non-system container.
pub async fn up<G: Gateway>(ctx: &CommandContext<'_, G>) -> Result<()> {
    let actual = ctx.introspect().await?;
    let mut target = actual.clone();
    let mut errors = Vec::new();
    for id in ctx.containers.ids() {
        let container = ctx.containers.get(id);
        if container.system {
            continue;
        }
        if let Err(e) = target.add_container(&container.name) {
            errors.push(e);
        }
    }
    drain_errors(errors)?;
    ctx.reconcile(&actual, &target, "up").await
}

pub async fn tail<G: Gateway>(
    ctx: &CommandContext<'_, G>,
    name: &str,
    follow: bool,
) -> Result<()> {
    ctx.containers.id_of(name)?;
    ctx.gateway.tail_logs(name, follow).await
}
