//! Error types for cluster access and port-forwarding

use std::time::Duration;
use thiserror::Error;

/// Errors that fail a port-forward session
#[derive(Error, Debug)]
pub enum ForwardError {
    #[error("No forward targets given")]
    NoTargets,

    #[error("Invalid forward target '{reference}': {reason}")]
    InvalidTarget { reference: String, reason: String },

    #[error("Target #{index} ({target}) not found: {reason}")]
    TargetNotFound {
        index: usize,
        target: String,
        reason: String,
    },

    #[error("Failed to look up target #{index} ({target}): {source}")]
    Lookup {
        index: usize,
        target: String,
        #[source]
        source: kube::Error,
    },

    #[error("Failed to bind local port {port} for {target}: {source}")]
    Bind {
        target: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open tunnel to {target}: {message}")]
    Tunnel { target: String, message: String },

    #[error("Tunnel to {target} was not ready within {timeout:?}")]
    ReadyTimeout { target: String, timeout: Duration },

    #[error("Port-forward cancelled before all tunnels were ready")]
    Cancelled,

    #[error("Kubeconfig error: {0}")]
    KubeConfig(String),

    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),
}

impl ForwardError {
    /// True when the error means the requested object could not be found
    pub fn is_not_found(&self) -> bool {
        matches!(self, ForwardError::TargetNotFound { .. })
    }
}

/// Errors of a single target resolution
///
/// Turned into a [`ForwardError`] carrying the target's index once the
/// session knows which input failed.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Kube(#[from] kube::Error),
}

impl ResolveError {
    pub(crate) fn into_forward_error(self, index: usize, target: String) -> ForwardError {
        match self {
            ResolveError::NotFound(reason) => ForwardError::TargetNotFound {
                index,
                target,
                reason,
            },
            ResolveError::Kube(source) => ForwardError::Lookup {
                index,
                target,
                source,
            },
        }
    }
}
