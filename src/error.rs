//! Error taxonomy for formation reconciliation.

use bollard::errors::Error as BollardError;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BayError>;

/// Machine-readable cause attached to a runtime failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootCode {
    BootFail,
}

impl fmt::Display for BootCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootCode::BootFail => write!(f, "BOOT_FAIL"),
        }
    }
}

#[derive(Debug, Error)]
pub enum BayError {
    /// An image referenced directly or through a link does not exist on the
    /// host. `dependent` names the requested container when the missing
    /// image belongs to one of its linked dependencies.
    #[error("image `{image}` not found{}", dependent_context(.dependent))]
    ImageNotFound {
        image: String,
        dependent: Option<String>,
    },

    /// A container failed to reach a ready state after being started.
    #[error("container `{instance}` failed to boot ({code})")]
    BootFailure { instance: String, code: BootCode },

    /// The container runtime could not be reached. Fatal, never retried.
    #[error("container runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    /// The link relation between the involved containers contains a cycle.
    #[error("dependency cycle involving container `{0}`")]
    LinkCycle(String),

    /// A container name that is not part of the configured universe.
    #[error("unknown container `{0}`")]
    UnknownContainer(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Docker(#[from] BollardError),
}

fn dependent_context(dependent: &Option<String>) -> String {
    match dependent {
        Some(name) => format!(", required by a link of container `{name}`"),
        None => String::new(),
    }
}
