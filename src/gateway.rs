//! Container runtime gateway: the seam between the reconciler and docker.
//!
//! [`Gateway`] is the narrow surface the introspector and runner drive;
//! [`DockerGateway`] implements it over bollard. All mutation of running
//! containers funnels through here.

use crate::error::{BayError, BootCode, Result};
use crate::formation::{Host, Instance};
use bollard::Docker;
use bollard::container::AttachContainerResults;
use bollard::errors::Error as BollardError;
use bollard::models::{ContainerCreateBody, HealthStatusEnum};
use bollard::query_parameters::{
    AttachContainerOptionsBuilder, CreateContainerOptions, InspectContainerOptions,
    ListContainersOptions, ListImagesOptions, LogsOptionsBuilder, RemoveContainerOptions,
    StartContainerOptions, StopContainerOptionsBuilder,
};
use futures_util::StreamExt;
use log::{debug, error, info};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::time::Duration;

/// Label key attached to every container bay creates; introspection only
/// considers containers carrying it.
pub const MANAGED_LABEL: &str = "bay.managed";

const BOOT_POLL_ATTEMPTS: u32 = 10;
const BOOT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const STOP_GRACE_SECONDS: i32 = 30;

const REMOVE_OPTIONS: RemoveContainerOptions = RemoveContainerOptions {
    v: false,
    force: false,
    link: false,
};

/// A container the runtime reports as currently running.
#[derive(Debug, Clone)]
pub struct RunningContainer {
    pub name: String,
    pub image: String,
}

#[allow(async_fn_in_trait)]
pub trait Gateway {
    async fn running_containers(&self) -> Result<Vec<RunningContainer>>;
    async fn available_images(&self) -> Result<HashSet<String>>;
    /// Creates and starts the instance, then waits for it to reach a ready
    /// state. A container that never becomes ready is a boot failure.
    async fn start_instance(&self, instance: &Instance) -> Result<()>;
    /// Stops the named container with a grace period and removes it.
    async fn stop_instance(&self, name: &str) -> Result<()>;
    /// Attaches the caller's terminal to a running container, pumping stdio
    /// until the session ends.
    async fn attach_instance(&self, name: &str) -> Result<()>;
    async fn tail_logs(&self, name: &str, follow: bool) -> Result<()>;
}

/// The daemon responding at all, even with an error status, means the
/// runtime is reachable; any other failure on a read is a transport fault.
fn connection_error(error: BollardError) -> BayError {
    if matches!(error, BollardError::DockerResponseServerError { .. }) {
        BayError::Docker(error)
    } else {
        BayError::RuntimeUnavailable(error.to_string())
    }
}

pub struct DockerGateway {
    docker: Docker,
}

impl DockerGateway {
    /// Connection failures surface as `RuntimeUnavailable`; other docker
    /// errors pass through untouched.
    pub fn connect(host: &Host) -> Result<Self> {
        let docker = match host.url() {
            Some(url) => Docker::connect_with_http(url, 30, bollard::API_DEFAULT_VERSION),
            None => Docker::connect_with_local_defaults(),
        }
        .map_err(|e| BayError::RuntimeUnavailable(e.to_string()))?;
        debug!("connected to docker host `{}`", host.name());
        Ok(Self { docker })
    }

    async fn wait_ready(&self, name: &str) -> Result<()> {
        for _ in 0..BOOT_POLL_ATTEMPTS {
            tokio::time::sleep(BOOT_POLL_INTERVAL).await;
            let details = self
                .docker
                .inspect_container(name, None::<InspectContainerOptions>)
                .await?;
            debug!(
                "container state of {name}: {}",
                serde_json::to_string_pretty(&details.state).unwrap_or_default()
            );
            if let Some(state) = details.state {
                if !state.running.unwrap_or(false) {
                    // already exited, no point polling further
                    break;
                }
                match state.health.and_then(|health| health.status) {
                    None | Some(HealthStatusEnum::NONE) | Some(HealthStatusEnum::HEALTHY) => {
                        return Ok(());
                    }
                    Some(HealthStatusEnum::STARTING) => continue,
                    Some(_) => break,
                }
            }
        }
        Err(BayError::BootFailure {
            instance: name.to_string(),
            code: BootCode::BootFail,
        })
    }
}

impl Gateway for DockerGateway {
    async fn running_containers(&self) -> Result<Vec<RunningContainer>> {
        let mut filters = HashMap::new();
        filters.insert("label".to_string(), vec![format!("{MANAGED_LABEL}=true")]);
        let options = ListContainersOptions {
            filters: Some(filters),
            ..Default::default()
        };
        let summaries = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(connection_error)?;
        debug!("found {} managed containers", summaries.len());
        let mut running = Vec::new();
        for summary in summaries {
            let Some(name) = summary.names.unwrap_or_default().into_iter().next() else {
                continue;
            };
            running.push(RunningContainer {
                name: name.trim_start_matches('/').to_string(),
                image: summary.image.unwrap_or_default(),
            });
        }
        Ok(running)
    }

    async fn available_images(&self) -> Result<HashSet<String>> {
        let images = self
            .docker
            .list_images(None::<ListImagesOptions>)
            .await
            .map_err(connection_error)?;
        let mut catalog = HashSet::new();
        for image in images {
            catalog.extend(image.repo_tags);
        }
        Ok(catalog)
    }

    async fn start_instance(&self, instance: &Instance) -> Result<()> {
        let labels = HashMap::from([(MANAGED_LABEL.to_string(), "true".to_string())]);
        let mut config = ContainerCreateBody {
            image: Some(instance.image.clone()),
            labels: Some(labels),
            cmd: instance.command.clone(),
            ..Default::default()
        };
        if instance.foreground {
            config.tty = Some(true);
            config.open_stdin = Some(true);
            config.attach_stdin = Some(true);
            config.attach_stdout = Some(true);
            config.attach_stderr = Some(true);
        }
        let options = CreateContainerOptions {
            name: Some(instance.name.clone()),
            ..Default::default()
        };
        let created = self.docker.create_container(Some(options), config).await?;
        debug!("created container {} ({})", instance.name, created.id);
        self.docker
            .start_container(&created.id, None::<StartContainerOptions>)
            .await?;
        info!("started container {}", instance.name);
        self.wait_ready(&instance.name).await
    }

    async fn stop_instance(&self, name: &str) -> Result<()> {
        let options = StopContainerOptionsBuilder::new().t(STOP_GRACE_SECONDS).build();
        self.docker.stop_container(name, Some(options)).await?;
        self.docker.remove_container(name, Some(REMOVE_OPTIONS)).await?;
        info!("stopped container {name}");
        Ok(())
    }

    async fn attach_instance(&self, name: &str) -> Result<()> {
        let options = AttachContainerOptionsBuilder::new()
            .stream(true)
            .stdin(true)
            .stdout(true)
            .stderr(true)
            .build();
        let AttachContainerResults {
            mut output,
            mut input,
        } = self.docker.attach_container(name, Some(options)).await?;
        let stdin_pump = tokio::spawn(async move {
            let mut stdin = tokio::io::stdin();
            let _ = tokio::io::copy(&mut stdin, &mut input).await;
        });
        while let Some(chunk) = output.next().await {
            match chunk {
                Ok(data) => {
                    print!("{data}");
                    let _ = std::io::stdout().flush();
                }
                Err(e) => error!("error reading attach stream for {name}: {e:?}"),
            }
        }
        stdin_pump.abort();
        debug!("detached from container {name}");
        Ok(())
    }

    async fn tail_logs(&self, name: &str, follow: bool) -> Result<()> {
        let options = LogsOptionsBuilder::new()
            .follow(follow)
            .stdout(true)
            .stderr(true)
            .build();
        let mut log_stream = self.docker.logs(name, Some(options));
        while let Some(chunk) = log_stream.next().await {
            match chunk {
                Ok(output) => print!("{output}"),
                Err(e) => error!("error reading logs for {name}: {e:?}"),
            }
        }
        Ok(())
    }
}
