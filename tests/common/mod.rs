//! In-memory gateway used by the integration tests. Stateful: starts and
//! stops mutate the running list so command sequences behave like a daemon.
#![allow(dead_code)]

use bay::container::{Container, ContainerSet};
use bay::error::{BayError, BootCode, Result};
use bay::formation::Instance;
use bay::gateway::{Gateway, RunningContainer};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Start(String),
    Stop(String),
    Attach(String),
    Tail(String, bool),
}

#[derive(Default)]
pub struct MockGateway {
    pub running: Mutex<Vec<RunningContainer>>,
    pub images: HashSet<String>,
    pub fail_boot: HashSet<String>,
    pub unreachable: bool,
    pub ops: Mutex<Vec<Op>>,
    pub starts: Mutex<Vec<Instance>>,
    pub calls: Mutex<usize>,
}

impl MockGateway {
    pub fn new(images: &[&str], running: &[(&str, &str)]) -> Self {
        Self {
            running: Mutex::new(
                running
                    .iter()
                    .map(|(name, image)| RunningContainer {
                        name: name.to_string(),
                        image: image.to_string(),
                    })
                    .collect(),
            ),
            images: images.iter().map(|image| image.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn ops(&self) -> Vec<Op> {
        self.ops.lock().unwrap().clone()
    }

    pub fn starts(&self) -> Vec<Instance> {
        self.starts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    fn track(&self) -> Result<()> {
        *self.calls.lock().unwrap() += 1;
        if self.unreachable {
            return Err(BayError::RuntimeUnavailable(
                "mock gateway down".to_string(),
            ));
        }
        Ok(())
    }
}

impl Gateway for MockGateway {
    async fn running_containers(&self) -> Result<Vec<RunningContainer>> {
        self.track()?;
        Ok(self.running.lock().unwrap().clone())
    }

    async fn available_images(&self) -> Result<HashSet<String>> {
        self.track()?;
        Ok(self.images.clone())
    }

    async fn start_instance(&self, instance: &Instance) -> Result<()> {
        self.track()?;
        if self.fail_boot.contains(&instance.name) {
            return Err(BayError::BootFailure {
                instance: instance.name.clone(),
                code: BootCode::BootFail,
            });
        }
        self.ops.lock().unwrap().push(Op::Start(instance.name.clone()));
        self.starts.lock().unwrap().push(instance.clone());
        self.running.lock().unwrap().push(RunningContainer {
            name: instance.name.clone(),
            image: instance.image.clone(),
        });
        Ok(())
    }

    async fn stop_instance(&self, name: &str) -> Result<()> {
        self.track()?;
        self.ops.lock().unwrap().push(Op::Stop(name.to_string()));
        self.running.lock().unwrap().retain(|c| c.name != name);
        Ok(())
    }

    async fn attach_instance(&self, name: &str) -> Result<()> {
        self.track()?;
        self.ops.lock().unwrap().push(Op::Attach(name.to_string()));
        Ok(())
    }

    async fn tail_logs(&self, name: &str, follow: bool) -> Result<()> {
        self.track()?;
        self.ops
            .lock()
            .unwrap()
            .push(Op::Tail(name.to_string(), follow));
        Ok(())
    }
}

pub fn container(name: &str, image: &str, system: bool, links: &[&str]) -> Container {
    Container {
        name: name.to_string(),
        image: image.to_string(),
        system,
        links: links.iter().map(|link| link.to_string()).collect(),
    }
}

/// web and worker both link to db; proxy is a system container.
pub fn demo_set() -> Arc<ContainerSet> {
    Arc::new(
        ContainerSet::new(vec![
            container("web", "web:latest", false, &["db"]),
            container("db", "db:latest", false, &[]),
            container("worker", "worker:latest", false, &["db"]),
            container("proxy", "proxy:latest", true, &[]),
        ])
        .unwrap(),
    )
}
